//! End-to-end scenario tests exercising the full parse → refine → plugin →
//! write pipeline through the public API.

use css_engine::error::ErrorKind;
use css_engine::plugin::prefix_mirror::{PrefixMirrorPlugin, PrefixPrunePlugin, PseudoElementMirrorPlugin};
use css_engine::plugin::Scheduler;
use css_engine::prefix::BuiltinPrefixData;
use css_engine::writer::WriteMode;
use css_engine::{process, ErrorManager, ProcessArgs};
use rstest::rstest;
use std::cell::RefCell;
use std::rc::Rc;

fn run(source: &str, mode: WriteMode, errors: ErrorManager) -> css_engine::ProcessOutput {
    let mut args = ProcessArgs::new(source);
    args.mode = mode;
    args.error_manager = errors;
    let mut scheduler = Scheduler::new();
    process(args, &mut scheduler).expect("process should not hard-fail")
}

#[rstest]
#[case("div { color: red; }", "color: red;")]
#[case("a, b { margin: 0; }", "margin: 0;")]
fn simple_rule_round_trip(#[case] source: &str, #[case] expect_fragment: &str) {
    let out = run(source, WriteMode::Verbose, ErrorManager::FailFast);
    assert!(out.css.contains(expect_fragment));
    assert!(out.errors.is_empty());
}

#[test]
fn vendor_prefix_mirror_rework_emits_every_vendor() {
    let mut args = ProcessArgs::new("div { transform: scale(2); }");
    args.mode = WriteMode::Compressed;
    let mut scheduler = Scheduler::new();
    scheduler.register(Rc::new(RefCell::new(PrefixMirrorPlugin::new(BuiltinPrefixData))));
    let out = process(args, &mut scheduler).unwrap();
    assert!(out.css.contains("-webkit-transform:scale(2)"));
    assert!(out.css.contains("-ms-transform:scale(2)"));
    assert!(out.css.contains("transform:scale(2)"));
}

#[test]
fn prefix_pruning_drops_declarations_no_longer_required() {
    let mut args = ProcessArgs::new("div { -moz-box-sizing: border-box; box-sizing: border-box; }");
    args.mode = WriteMode::Compressed;
    let mut scheduler = Scheduler::new();
    scheduler.register(Rc::new(RefCell::new(PrefixMirrorPlugin::new(BuiltinPrefixData))));
    scheduler.register(Rc::new(RefCell::new(PrefixPrunePlugin::new(BuiltinPrefixData, "90"))));
    let out = process(args, &mut scheduler).unwrap();
    assert!(!out.css.contains("-moz-box-sizing"));
    assert!(out.css.contains("box-sizing:border-box"));
}

#[test]
fn pseudo_element_mirror_rework_lands_mirrored_rule_ahead_of_original() {
    let mut args = ProcessArgs::new("::selection { color: red; }");
    args.mode = WriteMode::Compressed;
    let mut scheduler = Scheduler::new();
    scheduler.register(Rc::new(RefCell::new(PseudoElementMirrorPlugin::new(BuiltinPrefixData))));
    let out = process(args, &mut scheduler).unwrap();
    let moz_pos = out.css.find("::-moz-selection").expect("mirrored rule present");
    let orig_pos = out.css.find("::selection{").expect("original rule present");
    assert!(moz_pos < orig_pos);
    assert!(out.css.contains("::-moz-selection{color:red}"));
}

#[test]
fn nth_child_pseudo_class_arguments_are_captured() {
    let sheet = css_engine::api::parse("li:nth-child(2n+1) { color: red; }").unwrap();
    let rule = sheet.arena.children(sheet.root())[0];
    let group = sheet.arena.children(rule)[0];
    let registry = css_engine::refine::RefinementRegistry::new();
    let mut arena = sheet.arena;
    registry.refine(&mut arena, group).unwrap();
    let part = arena.children(group)[0];
    registry.refine(&mut arena, part).unwrap();
    match &arena.get(part).unwrap().value().data {
        css_engine::ast::AstNodeData::SelectorPart(d) => {
            assert_eq!(d.pseudo_clauses[0].name, "nth-child");
            assert_eq!(d.pseudo_clauses[0].args.as_deref(), Some("2n+1"));
        }
        _ => panic!("expected selector part"),
    }
}

#[test]
fn legacy_single_colon_pseudo_element_is_coerced() {
    let sheet = css_engine::api::parse("p:before { content: \"x\"; }").unwrap();
    let rule = sheet.arena.children(sheet.root())[0];
    let group = sheet.arena.children(rule)[0];
    let registry = css_engine::refine::RefinementRegistry::new();
    let mut arena = sheet.arena;
    registry.refine(&mut arena, group).unwrap();
    let part = arena.children(group)[0];
    registry.refine(&mut arena, part).unwrap();
    match &arena.get(part).unwrap().value().data {
        css_engine::ast::AstNodeData::SelectorPart(d) => {
            assert!(d.pseudo_clauses[0].is_element);
        }
        _ => panic!("expected selector part"),
    }
}

#[test]
fn unquoted_ie_filter_declaration_survives_round_trip() {
    let out = run(
        "div { filter: progid:DXImageTransform.Microsoft.gradient(startColorstr='#fff', endColorstr='#000'); }",
        WriteMode::Verbose,
        ErrorManager::FailFast,
    );
    assert!(out.css.contains("progid:DXImageTransform"));
    assert!(out.errors.is_empty());
}

#[test]
fn lone_colon_reports_missing_pseudo_name() {
    let out = run("div: { color: red; }", WriteMode::Verbose, ErrorManager::Collect);
    assert!(out.errors.iter().any(|e| e.kind == ErrorKind::MissingPseudoName));
}

#[test]
fn unclosed_pseudo_class_paren_reports_error() {
    let mut args = ProcessArgs::new("li:nth-child(2n+1 { color: red; }");
    args.error_manager = ErrorManager::Collect;
    let mut scheduler = Scheduler::new();
    let result = process(args, &mut scheduler);
    let saw_error = match result {
        Err(e) => matches!(e.kind, ErrorKind::UnclosedBlock | ErrorKind::UnclosedParen),
        Ok(out) => out.errors.iter().any(|e| matches!(e.kind, ErrorKind::UnclosedParen)),
    };
    assert!(saw_error);
}
