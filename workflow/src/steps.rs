use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use flatten::directive::IncludeDirective;
use flatten::normalize::normalize;
use flatten::reference::{SanitizedReference, sanitize};

/// A step pulled in by an include directive of the workflow document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRef {
    /// 1-based position among the workflow's steps.
    pub number: usize,
    pub include_path: SanitizedReference,
    pub raw_target: String,
    /// 1-based source line of the directive.
    pub line: usize,
}

/// Every include directive in `source`, in document order.
pub fn discover_steps(source: &str) -> Vec<StepRef> {
    normalize(source)
        .split('\n')
        .enumerate()
        .filter_map(|(idx, line)| {
            IncludeDirective::parse(line).map(|d| (idx, d.raw_target.to_string()))
        })
        .enumerate()
        .map(|(n, (idx, raw_target))| StepRef {
            number: n + 1,
            include_path: sanitize(&raw_target),
            raw_target,
            line: idx + 1,
        })
        .collect()
}

/// Contents of a step file. Unknown keys are ignored; descriptive fields
/// accept any YAML value and keep its text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepSpec {
    #[serde(default, deserialize_with = "text_field")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "text_field")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub desc: Option<String>,
    #[serde(default)]
    pub branches: Option<Value>,
}

fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(render_inline(&other)),
    })
}

/// Single-line flow rendering of a YAML value, e.g. `{found: respond, empty: [a, b]}`.
pub fn render_inline(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().map(render_inline).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Mapping(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", render_inline(k), render_inline(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Tagged(tagged) => format!("{} {}", tagged.tag, render_inline(&tagged.value)),
    }
}

impl StepSpec {
    pub fn step_kind(&self) -> StepKind {
        self.kind.as_deref().map_or(StepKind::Generic, StepKind::from_type)
    }
}

/// Category a step is simulated as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Business,
    Db,
    Vendor,
    Generic,
}

impl StepKind {
    pub fn from_type(ty: &str) -> Self {
        match ty.trim() {
            "business" => StepKind::Business,
            "db" => StepKind::Db,
            "vendor" => StepKind::Vendor,
            _ => StepKind::Generic,
        }
    }

    /// Simulated duration at pace 1.0.
    pub fn base_millis(self) -> u64 {
        match self {
            StepKind::Business => 500,
            StepKind::Db => 1000,
            StepKind::Vendor => 1500,
            StepKind::Generic => 300,
        }
    }

    pub fn activity(self) -> &'static str {
        match self {
            StepKind::Business => "business logic",
            StepKind::Db => "database operation",
            StepKind::Vendor => "vendor API call",
            StepKind::Generic => "generic step",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Business => "business",
            StepKind::Db => "db",
            StepKind::Vendor => "vendor",
            StepKind::Generic => "generic",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_directives_in_order() {
        let source = "\
steps:
  - !include file: steps/a.yaml?v=1
    args:
      x: 1
  - name: inline
  - !include steps/b.yml # second
";
        let steps = discover_steps(source);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].number, 1);
        assert_eq!(steps[0].include_path.as_str(), "steps/a.yaml");
        assert_eq!(steps[0].line, 2);
        assert_eq!(steps[1].number, 2);
        assert_eq!(steps[1].include_path.as_str(), "steps/b.yml");
        assert_eq!(steps[1].raw_target, "steps/b.yml # second");
        assert_eq!(steps[1].line, 6);
    }

    #[test]
    fn step_kind_mapping() {
        assert_eq!(StepKind::from_type("db"), StepKind::Db);
        assert_eq!(StepKind::from_type("vendor"), StepKind::Vendor);
        assert_eq!(StepKind::from_type("business"), StepKind::Business);
        assert_eq!(StepKind::from_type("cron"), StepKind::Generic);
        assert_eq!(StepSpec::default().step_kind(), StepKind::Generic);
    }

    #[test]
    fn non_string_fields_keep_their_text() {
        let spec: StepSpec =
            serde_yaml::from_str("id: 7\nname: true\ntype: db\ndesc: 4.5\n").unwrap();
        assert_eq!(spec.id.as_deref(), Some("7"));
        assert_eq!(spec.name.as_deref(), Some("true"));
        assert_eq!(spec.desc.as_deref(), Some("4.5"));
        assert_eq!(spec.step_kind(), StepKind::Db);

        let spec: StepSpec = serde_yaml::from_str("id: ~\nname: [a, b]\n").unwrap();
        assert!(spec.id.is_none());
        assert_eq!(spec.name.as_deref(), Some("[a, b]"));
    }

    #[test]
    fn render_inline_is_one_line() {
        let value: Value =
            serde_yaml::from_str("found: respond\nempty:\n  - retry\n  - 3\nnone: null\n").unwrap();
        assert_eq!(render_inline(&value), "{found: respond, empty: [retry, 3], none: null}");
    }

    #[test]
    fn step_spec_ignores_unknown_keys() {
        let spec: StepSpec =
            serde_yaml::from_str("id: s1\ntype: vendor\nretries: 3\nbranches:\n  ok: next\n")
                .unwrap();
        assert_eq!(spec.id.as_deref(), Some("s1"));
        assert_eq!(spec.step_kind(), StepKind::Vendor);
        assert!(spec.branches.is_some());
        assert!(spec.name.is_none());
    }
}
