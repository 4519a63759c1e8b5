mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use flatten::config::{default_normalized_path, default_output_path};
use flatten::{FlattenConfig, FlattenDiagnostic, Flattened};
use workflow::WorkflowRunner;

const SUBCOMMANDS: &[&str] = &["flatten", "normalize", "run", "test", "help"];

/// Global options that take a separate value.
const VALUE_OPTIONS: &[&str] = &["--log-level"];

#[derive(Parser)]
#[command(name = "yamlflat", version, about = "Flatten !include directives into one YAML document")]
struct Cli {
    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// Log filter (e.g. "debug", "flatten=trace")
    #[arg(long, global = true, default_value = "error")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inline every resolvable include into a single document
    Flatten(FlattenArgs),

    /// Clean exotic spaces, line endings and trailing whitespace
    Normalize(NormalizeArgs),

    /// Simulate the steps of a workflow document
    Run(RunArgs),

    /// Run .test.yaml golden cases
    Test(TestArgs),
}

#[derive(clap::Args)]
struct FlattenArgs {
    /// Root document (falls back to `input` in the config file)
    input: Option<PathBuf>,

    /// Destination file [default: dist/<stem>_flat.yaml]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory include references are resolved against [default: current dir]
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Also expand includes inside included fragments
    #[arg(short, long)]
    recursive: bool,

    /// Config file [default: ./yamlflat.toml when present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Exit with status 1 when any include stays unresolved
    #[arg(long)]
    strict: bool,

    /// Print the flattened document to stdout as well
    #[arg(long)]
    print: bool,
}

#[derive(clap::Args)]
struct NormalizeArgs {
    /// Document to normalize
    input: PathBuf,

    /// Destination file [default: <stem>_norm.yaml next to the input]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Workflow document
    #[arg(default_value = "routes/fetch_br.yaml")]
    workflow: PathBuf,

    /// Directory step references are resolved against [default: current dir]
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Multiplier on simulated step durations (0 disables waiting)
    #[arg(long, default_value_t = 1.0)]
    pace: f64,

    /// Suppress step progress, print only the summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.yaml file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `yamlflat routes/x.yaml` means `yamlflat flatten routes/x.yaml`.
    let args = inject_default_subcommand(std::env::args().collect());
    let cli = Cli::parse_from(&args);

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let exit_code = match cli.command {
        Command::Flatten(args) => do_flatten(args, cli.no_color),
        Command::Normalize(args) => do_normalize(args),
        Command::Run(args) => do_run(args),
        Command::Test(args) => {
            if args.list_categories {
                test_runner::list_categories(&args.path);
                0
            } else {
                test_runner::run_tests(&args.path, cli.no_color, &args.category)
            }
        }
    };
    process::exit(exit_code);
}

/// Insert `flatten` right after the program name when the first positional
/// argument is not a known subcommand.
fn inject_default_subcommand(mut args: Vec<String>) -> Vec<String> {
    let mut skip_value = false;
    let mut first_positional = None;
    for arg in args.iter().skip(1) {
        if skip_value {
            skip_value = false;
            continue;
        }
        if arg.starts_with('-') {
            skip_value = VALUE_OPTIONS.contains(&arg.as_str());
            continue;
        }
        first_positional = Some(arg.as_str());
        break;
    }

    if let Some(first) = first_positional {
        if !SUBCOMMANDS.contains(&first) {
            args.insert(1.min(args.len()), "flatten".to_string());
        }
    }
    args
}

fn color_choice(no_color: bool) -> ColorChoice {
    if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn do_flatten(args: FlattenArgs, no_color: bool) -> i32 {
    let file_config = match config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let Some(input) = args.input.or(file_config.input) else {
        eprintln!(
            "error: no input document (pass a path or set `input` in {})",
            config::DEFAULT_CONFIG_FILE
        );
        return 1;
    };
    let output = args
        .output
        .or(file_config.output)
        .unwrap_or_else(|| default_output_path(&input));

    let mut flatten_config = FlattenConfig::new(&input, &output)
        .with_recursive(args.recursive || file_config.recursive.unwrap_or(false));
    if let Some(base_dir) = args.base_dir.or(file_config.base_dir) {
        flatten_config = flatten_config.with_base_dir(base_dir);
    }

    debug!(config = ?flatten_config, "flattening");
    let flattened = match flatten::flatten_file(&flatten_config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    emit_diagnostics(&input, &flattened, no_color);

    if args.print {
        println!("{}", flattened.output);
    }

    let unresolved = flattened.unresolved().count();
    eprintln!(
        "ok: {} -> {} ({} inlined, {} unresolved)",
        input.display(),
        output.display(),
        flattened.inlined_count(),
        unresolved
    );
    if args.strict && unresolved > 0 {
        eprintln!("error: {} include(s) left unresolved (--strict)", unresolved);
        return 1;
    }
    0
}

fn emit_diagnostics(input: &Path, flattened: &Flattened, no_color: bool) {
    if flattened.diagnostics.is_empty() {
        return;
    }
    let mut files = SimpleFiles::new();
    let file_id = files.add(input.display().to_string(), flattened.source.clone());

    let writer = StandardStream::stderr(color_choice(no_color));
    let config = term::Config::default();
    for diag in &flattened.diagnostics {
        let diag = FlattenDiagnostic {
            file_id,
            ..diag.clone()
        };
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diag.to_diagnostic());
    }
}

fn do_normalize(args: NormalizeArgs) -> i32 {
    let output = args
        .output
        .unwrap_or_else(|| default_normalized_path(&args.input));
    match flatten::normalize_file(&args.input, &output) {
        Ok(()) => {
            eprintln!("ok: normalized {} -> {}", args.input.display(), output.display());
            0
        }
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

fn do_run(args: RunArgs) -> i32 {
    let base_dir = args
        .base_dir
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let runner = match WorkflowRunner::from_file(&args.workflow, base_dir) {
        Ok(r) => r.with_pace(args.pace),
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    let result = if args.quiet {
        let mut sink = std::io::sink();
        runner.run(&mut sink)
    } else {
        let mut stdout = std::io::stdout();
        runner.run(&mut stdout)
    };

    match result {
        Ok(summary) => match serde_json::to_string_pretty(&summary) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("error: cannot serialize summary: {}", e);
                1
            }
        },
        Err(e) => {
            eprintln!("error: workflow run failed: {}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_file_means_flatten() {
        assert_eq!(
            inject_default_subcommand(args(&["yamlflat", "routes/a.yaml"])),
            args(&["yamlflat", "flatten", "routes/a.yaml"])
        );
    }

    #[test]
    fn flags_before_file_stay_with_flatten() {
        assert_eq!(
            inject_default_subcommand(args(&["yamlflat", "-o", "out.yaml", "in.yaml"])),
            args(&["yamlflat", "flatten", "-o", "out.yaml", "in.yaml"])
        );
    }

    #[test]
    fn log_level_value_is_not_a_positional() {
        assert_eq!(
            inject_default_subcommand(args(&["yamlflat", "--log-level", "debug", "run"])),
            args(&["yamlflat", "--log-level", "debug", "run"])
        );
    }

    #[test]
    fn known_subcommands_untouched() {
        for sub in ["flatten", "normalize", "run", "test", "help"] {
            let given = args(&["yamlflat", sub, "x.yaml"]);
            assert_eq!(inject_default_subcommand(given.clone()), given);
        }
        let bare = args(&["yamlflat", "--version"]);
        assert_eq!(inject_default_subcommand(bare.clone()), bare);
    }

    #[test]
    fn cli_parses_flatten_flags() {
        let cli = Cli::parse_from(args(&[
            "yamlflat", "flatten", "in.yaml", "-o", "out.yaml", "-b", "base", "-r", "--strict",
        ]));
        match cli.command {
            Command::Flatten(f) => {
                assert_eq!(f.input, Some(PathBuf::from("in.yaml")));
                assert_eq!(f.output, Some(PathBuf::from("out.yaml")));
                assert_eq!(f.base_dir, Some(PathBuf::from("base")));
                assert!(f.recursive);
                assert!(f.strict);
            }
            _ => panic!("expected flatten"),
        }
    }
}
