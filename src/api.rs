//! Pure processing API: source text in, rendered stylesheet (and any
//! collected errors) out. No I/O, no CLI handling — a `*Args` struct in, a
//! `Result<ProcessOutput, Error>` out, with a configurable writer mode and
//! a caller-supplied plugin scheduler.

use crate::ast::Stylesheet;
use crate::error::{Error, ErrorManager};
use crate::plugin::Scheduler;
use crate::raw::parse_stylesheet;
use crate::refine::RefinementRegistry;
use crate::writer::{WriteMode, Writer};

#[derive(Debug, Clone)]
pub struct ProcessArgs {
    pub content: String,
    pub source_path: String,
    pub mode: WriteMode,
    pub error_manager: ErrorManager,
}

impl ProcessArgs {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_path: "<memory>".to_string(),
            mode: WriteMode::Verbose,
            error_manager: ErrorManager::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub css: String,
    /// Errors collected under `ErrorManager::Collect` (always empty under
    /// `FailFast`, since the first error there aborts `process` instead).
    pub errors: Vec<Error>,
}

/// Runs the full pipeline: raw parse → plugin schedule → write. Refinement
/// is not a separate pass here — the writer refines each unit on demand,
/// right before rendering it, the same on-demand discipline plugin
/// subscribers already use when a phase needs a unit's structured data.
/// Raw parsing errors (malformed braces, unterminated strings) always abort
/// immediately regardless of `error_manager`, since there is no well-formed
/// tree left to keep going on; refinement errors surfaced while writing are
/// routed through `error_manager` since each refinable unit fails
/// independently of its siblings.
pub fn process(args: ProcessArgs, scheduler: &mut Scheduler) -> Result<ProcessOutput, Error> {
    let mut sheet = parse_stylesheet(&args.content)?;
    let registry = RefinementRegistry::new();

    scheduler.process(&mut sheet, &registry)?;

    let mut collected = Vec::new();
    let css = Writer::new(args.mode).write_stylesheet(&mut sheet, &registry, &args.error_manager, &mut collected)?;
    tracing::debug!(source = %args.source_path, errors = collected.len(), "processed stylesheet");

    Ok(ProcessOutput { css, errors: collected })
}

/// Parses without refining or running plugins — useful for callers that
/// only want the raw structural tree.
pub fn parse(content: &str) -> Result<Stylesheet, Error> {
    parse_stylesheet(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn simple_rule_round_trips() {
        let mut scheduler = Scheduler::new();
        let out = process(ProcessArgs::new("div { color: red; }"), &mut scheduler).unwrap();
        assert!(out.css.contains("color: red;"));
        assert!(out.errors.is_empty());
    }

    #[test]
    fn collect_mode_gathers_unknown_at_rule_as_advisory() {
        let mut args = ProcessArgs::new("@made-up-thing foo;");
        args.error_manager = ErrorManager::Collect;
        let mut scheduler = Scheduler::new();
        let out = process(args, &mut scheduler).unwrap();
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].kind, ErrorKind::UnknownAtRule);
    }

    #[test]
    fn fail_fast_mode_still_tolerates_advisory_errors() {
        let mut args = ProcessArgs::new("@made-up-thing foo;");
        args.error_manager = ErrorManager::FailFast;
        let mut scheduler = Scheduler::new();
        let out = process(args, &mut scheduler).unwrap();
        assert_eq!(out.errors.len(), 1);
    }

    #[test]
    fn lone_colon_selector_reports_missing_pseudo_name() {
        let mut args = ProcessArgs::new("div: { color: red; }");
        args.error_manager = ErrorManager::Collect;
        let mut scheduler = Scheduler::new();
        let out = process(args, &mut scheduler).unwrap();
        assert!(out.errors.iter().any(|e| e.kind == ErrorKind::MissingPseudoName));
    }

    #[test]
    fn unclosed_paren_reports_error() {
        let mut args = ProcessArgs::new("a:not(div { color: red; }");
        args.error_manager = ErrorManager::FailFast;
        let mut scheduler = Scheduler::new();
        let result = process(args, &mut scheduler);
        assert!(result.is_err() || result.unwrap().errors.iter().any(|e| e.kind == ErrorKind::UnclosedParen));
    }
}
