mod report;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use erlisp_core::CompileError;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// ER diagram DSL compiler.
#[derive(Parser)]
#[command(name = "erlisp", version, about = "ER diagram DSL compiler")]
struct Cli {
    /// Path to the ER source file
    file: PathBuf,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress diagnostics in text mode
    #[arg(long)]
    quiet: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too and go to stdout.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };
    init_tracing();
    cmd_compile(&cli.file, cli.output, cli.quiet);
}

fn cmd_compile(file: &Path, output: OutputFormat, quiet: bool) {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", file.display(), e);
            report_error(&msg, output);
            process::exit(1);
        }
    };
    tracing::debug!(file = %file.display(), bytes = source.len(), "compiling");

    match erlisp_core::parse(&source) {
        Ok(graph) => match output {
            OutputFormat::Text => print!("{}", report::render(&graph)),
            OutputFormat::Json => match to_pretty_json(&graph) {
                Ok(pretty) => println!("{}", pretty),
                Err(msg) => {
                    report_error(&msg, output);
                    process::exit(1);
                }
            },
        },
        Err(CompileError::Rejected(diagnostics)) => {
            match output {
                OutputFormat::Json => {
                    let values: Vec<serde_json::Value> =
                        diagnostics.iter().map(|d| d.to_json_value()).collect();
                    let err_json = serde_json::to_string_pretty(&values)
                        .unwrap_or_else(|_| format!("{:?}", diagnostics));
                    eprintln!("{}", err_json);
                }
                OutputFormat::Text => {
                    if !quiet {
                        for diagnostic in &diagnostics {
                            eprintln!("{}", diagnostic);
                        }
                    }
                }
            }
            process::exit(1);
        }
        Err(e @ CompileError::Internal(_)) => {
            report_error(&e.to_string(), output);
            process::exit(1);
        }
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("serialization error: {}", e))
}

fn report_error(msg: &str, output: OutputFormat) {
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("node table is corrupt"))
        }
    }

    #[test]
    fn serialization_failure_is_an_error() {
        let err = to_pretty_json(&Unserializable).unwrap_err();
        assert_eq!(err, "serialization error: node table is corrupt");
    }

    #[test]
    fn graph_serializes_to_array() {
        let graph = erlisp_core::parse("(entity A)").unwrap();
        let pretty = to_pretty_json(&graph).unwrap();
        assert!(pretty.trim_start().starts_with('['));
    }
}
