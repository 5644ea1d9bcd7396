//! Thin CLI wrapper around `css_engine::api::process`.
//!
//! Strict separation of concerns: this binary only handles argument
//! parsing and I/O; all processing logic lives in the library crate.

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use css_engine::{ErrorManager, ProcessArgs, WriteMode};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Verbose,
    Inline,
    Compressed,
}

impl From<ModeArg> for WriteMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Verbose => WriteMode::Verbose,
            ModeArg::Inline => WriteMode::Inline,
            ModeArg::Compressed => WriteMode::Compressed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorPolicyArg {
    FailFast,
    Collect,
}

impl From<ErrorPolicyArg> for ErrorManager {
    fn from(value: ErrorPolicyArg) -> Self {
        match value {
            ErrorPolicyArg::FailFast => ErrorManager::FailFast,
            ErrorPolicyArg::Collect => ErrorManager::Collect,
        }
    }
}

/// Parses and re-renders a CSS stylesheet.
#[derive(Debug, Parser)]
#[command(name = "cssfmt", version, about)]
struct Cli {
    /// Path to a .css file. Reads stdin when omitted.
    input: Option<String>,

    /// Output rendering mode.
    #[arg(long, value_enum, default_value_t = ModeArg::Verbose)]
    mode: ModeArg,

    /// Whether to abort on the first error or collect and report all of them.
    #[arg(long, value_enum, default_value_t = ErrorPolicyArg::FailFast)]
    errors: ErrorPolicyArg,

    /// Dump the raw parse tree as JSON instead of rendering CSS.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let source_path = cli.input.clone().unwrap_or_else(|| "<stdin>".to_string());
    let content = match read_input(cli.input.as_deref()) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        return match css_engine::api::parse(&content) {
            Ok(sheet) => match css_engine::ast::json::to_json_string(&sheet) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    ExitCode::FAILURE
                }
            },
            Err(err) => {
                eprintln!("Error: {err}");
                ExitCode::FAILURE
            }
        };
    }

    let mut args = ProcessArgs::new(content);
    args.source_path = source_path;
    args.mode = cli.mode.into();
    args.error_manager = cli.errors.into();

    let mut scheduler = css_engine::plugin::Scheduler::new();
    match css_engine::process(args, &mut scheduler) {
        Ok(output) => {
            print!("{}", output.css);
            for err in &output.errors {
                eprintln!("warning: {err}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
