use flatten::normalize::normalize;

use crate::error::WorkflowError;

/// Top-level fields of a workflow route document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub path: Option<String>,
    pub method: Option<String>,
    pub response: ResponseSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseSpec {
    pub message: Option<String>,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Path,
    Method,
    Message,
    StatusCode,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "path" => Some(Field::Path),
            "method" => Some(Field::Method),
            "message" => Some(Field::Message),
            "statusCode" => Some(Field::StatusCode),
            _ => None,
        }
    }
}

/// Read the recognized scalar fields from a workflow document.
///
/// Works line by line so documents with unresolved `!include` tags still
/// yield their fields. The first occurrence of each field wins; empty
/// values count as absent.
pub fn read_schema(source: &str) -> Result<WorkflowConfig, WorkflowError> {
    let normalized = normalize(source);
    let mut config = WorkflowConfig::default();

    for (idx, line) in normalized.split('\n').enumerate() {
        let entry = line.trim();
        let entry = entry.strip_prefix("- ").unwrap_or(entry);
        if entry.starts_with('#') {
            continue;
        }
        let Some((key, value)) = entry.split_once(':') else {
            continue;
        };
        let Some(field) = Field::from_key(key.trim()) else {
            continue;
        };
        let Some(value) = scalar_value(value) else {
            continue;
        };

        match field {
            Field::Path => {
                config.path.get_or_insert(value);
            }
            Field::Method => {
                config.method.get_or_insert(value);
            }
            Field::Message => {
                config.response.message.get_or_insert(value);
            }
            Field::StatusCode => {
                if config.response.status_code.is_none() {
                    let code = value.parse::<u16>().map_err(|_| WorkflowError::InvalidField {
                        field: "statusCode",
                        line: idx + 1,
                        value: value.clone(),
                    })?;
                    config.response.status_code = Some(code);
                }
            }
        }
    }

    Ok(config)
}

/// Trim, drop a trailing ` # comment` and strip one pair of quotes.
fn scalar_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = match raw.find(" #") {
        Some(pos) if !raw.starts_with(['"', '\'']) => raw[..pos].trim_end(),
        _ => raw,
    };
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(raw);
    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_route_fields() {
        let source = "\
path: /fetch/br
method: GET
steps:
  - !include steps/a.yaml
response:
  message: \"Fetched\"
  statusCode: 201
";
        let config = read_schema(source).unwrap();
        assert_eq!(config.path.as_deref(), Some("/fetch/br"));
        assert_eq!(config.method.as_deref(), Some("GET"));
        assert_eq!(config.response.message.as_deref(), Some("Fetched"));
        assert_eq!(config.response.status_code, Some(201));
    }

    #[test]
    fn first_occurrence_wins() {
        let config = read_schema("path: /a\nsteps:\n  - path: /b\n").unwrap();
        assert_eq!(config.path.as_deref(), Some("/a"));
    }

    #[test]
    fn missing_fields_are_none() {
        let config = read_schema("steps: []\n").unwrap();
        assert_eq!(config, WorkflowConfig::default());
    }

    #[test]
    fn nested_parents_are_not_fields() {
        let config = read_schema("response:\n  message: ok\n").unwrap();
        assert_eq!(config.response.message.as_deref(), Some("ok"));
        assert_eq!(config.path, None);
    }

    #[test]
    fn values_keep_inner_colons() {
        let config = read_schema("path: /v1/items:batch\n").unwrap();
        assert_eq!(config.path.as_deref(), Some("/v1/items:batch"));
    }

    #[test]
    fn comments_are_skipped() {
        let config = read_schema("# path: /commented\nmethod: POST # create\n").unwrap();
        assert_eq!(config.path, None);
        assert_eq!(config.method.as_deref(), Some("POST"));
    }

    #[test]
    fn quoted_message_keeps_hash() {
        let config = read_schema("message: 'ticket #4 done'\n").unwrap();
        assert_eq!(config.response.message.as_deref(), Some("ticket #4 done"));
    }

    #[test]
    fn bad_status_code_reports_line() {
        let err = read_schema("path: /x\nstatusCode: two hundred\n").unwrap_err();
        match err {
            WorkflowError::InvalidField { field, line, value } => {
                assert_eq!(field, "statusCode");
                assert_eq!(line, 2);
                assert_eq!(value, "two hundred");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn exotic_spaces_are_normalized() {
        let config = read_schema("method:\u{00A0}PUT\r\n").unwrap();
        assert_eq!(config.method.as_deref(), Some("PUT"));
    }
}
