//! Ambiguous control flow: unknown tests, writes made inside ambiguous blocks and exits that
//! may or may not happen.

extern crate codeprocessor;

mod processor_util;

use codeprocessor::runner::api::{CodeProcessor, ProcessResults};
use codeprocessor::runner::ds::object_property::PropertyDescriptor;
use codeprocessor::runner::ds::value::JsValue;
use codeprocessor::runner::eval::rule_processor::NodeKind;
use codeprocessor::runner::runtime::DiagnosticKind;
use pretty_assertions::assert_eq;
use processor_util::{count_diagnostics, count_visits, run, run_recording, test_options};

fn run_with_unknown(unknown: &str, code: &str) -> ProcessResults {
    let mut processor = CodeProcessor::new(test_options()).unwrap();
    processor.define_unknown_global(unknown);
    processor.process_source("test.js", code).unwrap()
}

#[test]
fn known_branches_are_not_ambiguous() {
    let results = run("var a; if (1 < 2) { a = 'yes'; } else { a = 'no'; }");
    assert_eq!(results.global("a"), Some(JsValue::from_str("yes")));
    assert!(results.unknown_conditions.is_empty());
    assert!(results.ambiguous_blocks.is_empty());
}

#[test]
fn unknown_if_visits_both_branches() {
    let results = run_with_unknown(
        "flag",
        "var a = 0; var b = 0; if (flag) { a = 1; } else { b = 1; } var c = 5;",
    );
    assert_eq!(results.global("a"), Some(JsValue::Unknown));
    assert_eq!(results.global("b"), Some(JsValue::Unknown));
    assert_eq!(results.global("c"), Some(JsValue::Number(5.0)));
    assert_eq!(results.unknown_conditions.len(), 1);
    assert_eq!(results.ambiguous_blocks.len(), 1);
}

#[test]
fn events_carry_the_ambiguous_depth() {
    let (_, visits) = run_recording(test_options(), "var x = 1; if (x) { x = 2; }");
    assert_eq!(count_visits(&visits, NodeKind::AssignmentExpression, 0), 1);
    assert_eq!(count_visits(&visits, NodeKind::AssignmentExpression, 1), 0);
}

#[test]
fn writes_to_outer_objects_store_unknown() {
    let results = run_with_unknown(
        "flag",
        "var inner; var outer = { n: 1 }; if (flag) { inner = 2; outer.n = 2; outer.m = 3; }",
    );
    assert_eq!(results.global("inner"), Some(JsValue::Unknown));
    let realm = &results.context.realm;
    let outer = results.global("outer").and_then(|v| v.as_object()).unwrap();
    for name in ["n", "m"] {
        match realm.get_object(outer).get_own_property(name) {
            Some(PropertyDescriptor::Data { value, .. }) => assert_eq!(value, &JsValue::Unknown),
            other => panic!("outer.{} is {:?}", name, other),
        }
    }
}

#[test]
fn objects_created_inside_the_block_stay_precise() {
    let results = run_with_unknown(
        "flag",
        "function build() { var o = { n: 1 }; o.n = 2; return o.n; }
         var r; if (flag) { r = build(); }
         var precise = build();",
    );
    assert_eq!(results.global("precise"), Some(JsValue::Number(2.0)));
    assert_eq!(results.global("r"), Some(JsValue::Unknown));
}

#[test]
fn conditional_and_logical_operators_with_unknown_tests() {
    let results = run_with_unknown(
        "u",
        "var calls = 0;
         function hit() { calls = calls + 1; return 7; }
         var c = u ? hit() : 3;
         var d = u && hit();
         var e = u || 4;
         var f = true || u;",
    );
    assert_eq!(results.global("c"), Some(JsValue::Unknown));
    assert_eq!(results.global("d"), Some(JsValue::Unknown));
    assert_eq!(results.global("e"), Some(JsValue::Unknown));
    assert_eq!(results.global("f"), Some(JsValue::Boolean(true)));
    assert_eq!(results.global("calls"), Some(JsValue::Unknown));
    assert_eq!(results.unknown_conditions.len(), 3);
}

#[test]
fn switch_on_unknown_visits_every_case() {
    let results = run_with_unknown(
        "mode",
        "var seen = '';
         switch (mode) {
             case 'a': seen = 'a'; break;
             case 'b': seen = 'b'; break;
             default: seen = 'none';
         }",
    );
    assert_eq!(results.global("seen"), Some(JsValue::Unknown));
    assert_eq!(results.ambiguous_blocks.len(), 1);
}

#[test]
fn switch_on_known_value_falls_through() {
    let results = run(
        "var log = '';
         switch (2) {
             case 1: log += 'one';
             case 2: log += 'two';
             case 3: log += 'three'; break;
             default: log += 'default';
         }",
    );
    assert_eq!(results.global("log"), Some(JsValue::from_str("twothree")));
}

#[test]
fn return_inside_an_ambiguous_block_makes_the_call_unknown() {
    let results = run_with_unknown(
        "flag",
        "function pick() { if (flag) { return 1; } return 2; }
         function fixed() { if (true) { return 1; } return 2; }
         var r = pick();
         var s = fixed();",
    );
    assert_eq!(results.global("r"), Some(JsValue::Unknown));
    assert_eq!(results.global("s"), Some(JsValue::Number(1.0)));
}

#[test]
fn possible_throw_makes_what_follows_ambiguous() {
    let results = run_with_unknown(
        "flag",
        "var after = false; if (flag) { throw new TypeError('boom'); } after = true;",
    );
    assert!(results.is_normal());
    assert_eq!(results.global("after"), Some(JsValue::Unknown));
    assert_eq!(results.diagnostics.len(), 1);
    let diagnostic = &results.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::PossiblyUncaughtException);
    assert_eq!(diagnostic.message, "Possibly uncaught TypeError: boom");
    assert!(diagnostic.location.is_some());
}

#[test]
fn possible_throw_runs_the_catch_block_ambiguously() {
    let results = run_with_unknown(
        "u",
        "var caught = false; var message = '';
         try { if (u) { throw new Error('x'); } }
         catch (e) { caught = true; message = e.message; }
         var after = 1;",
    );
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("caught"), Some(JsValue::Unknown));
    assert_eq!(results.global("message"), Some(JsValue::Unknown));
    assert_eq!(results.global("after"), Some(JsValue::Number(1.0)));
}

#[test]
fn finally_runs_after_a_possible_throw() {
    let results = run_with_unknown(
        "u",
        "var cleaned = false;
         try { if (u) { throw new Error('x'); } } finally { cleaned = true; }
         var after = 1;",
    );
    assert_eq!(results.global("cleaned"), Some(JsValue::Boolean(true)));
    assert_eq!(results.global("after"), Some(JsValue::Unknown));
    assert_eq!(
        count_diagnostics(&results, DiagnosticKind::PossiblyUncaughtException),
        1
    );
}

#[test]
fn possible_throw_from_a_callee_reaches_the_callers_catch() {
    let results = run_with_unknown(
        "u",
        "function check() { if (u) { throw new RangeError('bad'); } return 1; }
         var handled = false; var r;
         try { r = check(); } catch (e) { handled = true; }",
    );
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("r"), Some(JsValue::Unknown));
    assert_eq!(results.global("handled"), Some(JsValue::Unknown));
}

#[test]
fn possible_break_leaves_the_loop_state_unknown() {
    let results = run_with_unknown(
        "u",
        "var i; var hits = 0;
         for (i = 0; i < 3; i++) { if (u) break; hits++; }
         var after = 1;",
    );
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("i"), Some(JsValue::Unknown));
    assert_eq!(results.global("hits"), Some(JsValue::Unknown));
    assert_eq!(results.global("after"), Some(JsValue::Number(1.0)));
}

#[test]
fn possible_break_in_a_switch_case_makes_fallthrough_ambiguous() {
    let results = run_with_unknown(
        "u",
        "var log = '';
         switch (1) {
             case 1: log += 'one'; if (u) break;
             case 2: log += 'two';
         }
         var after = 1;",
    );
    assert_eq!(results.global("log"), Some(JsValue::Unknown));
    assert_eq!(results.global("after"), Some(JsValue::Number(1.0)));
}

#[test]
fn possible_break_out_of_a_labeled_block() {
    let results = run_with_unknown(
        "u",
        "var x = 0; var y = 0; done: { if (u) break done; x = 1; } y = 2;",
    );
    assert_eq!(results.global("x"), Some(JsValue::Unknown));
    assert_eq!(results.global("y"), Some(JsValue::Number(2.0)));
    assert!(results.diagnostics.is_empty());
}

#[test]
fn unknown_operands_short_circuit_native_calls() {
    let results = run_with_unknown(
        "u",
        "var o = {}; var r = Object.defineProperty(o, 'x', u); var has = o.hasOwnProperty('x');",
    );
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("r"), Some(JsValue::Unknown));
    assert_eq!(results.global("has"), Some(JsValue::Boolean(false)));
}

#[test]
fn unknown_member_access_is_unknown() {
    let results = run_with_unknown("api", "var v = api.settings.value; var t = typeof api;");
    assert_eq!(results.global("v"), Some(JsValue::Unknown));
    assert_eq!(results.global("t"), Some(JsValue::Unknown));
    assert!(results.diagnostics.is_empty());
}
