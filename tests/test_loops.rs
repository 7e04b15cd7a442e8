//! Loop processing: concrete iteration, the iteration bound (native loops included), labels
//! and the `evaluateLoops=false` mode.

extern crate codeprocessor;

mod processor_util;

use codeprocessor::runner::ds::value::JsValue;
use codeprocessor::runner::eval::rule_processor::NodeKind;
use codeprocessor::runner::runtime::{DiagnosticKind, RuntimeOptions};
use pretty_assertions::assert_eq;
use processor_util::{count_diagnostics, count_visits, run, run_recording, run_with, test_options};

#[test]
fn counting_loop_runs_concretely() {
    let results = run("var sum = 0; for (var i = 0; i < 5; i++) { sum += i; }");
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("sum"), Some(JsValue::Number(10.0)));
    assert_eq!(results.global("i"), Some(JsValue::Number(5.0)));
    assert!(results.ambiguous_blocks.is_empty());
}

#[test]
fn exceeding_the_bound_ends_with_one_ambiguous_pass() {
    let options = RuntimeOptions {
        max_loop_iterations: 3,
        ..test_options()
    };
    let (results, visits) = run_recording(options, "var n = 0; while (true) { n++; }");

    assert_eq!(count_visits(&visits, NodeKind::UpdateExpression, 0), 3);
    assert_eq!(count_visits(&visits, NodeKind::UpdateExpression, 1), 1);
    assert_eq!(
        count_diagnostics(&results, DiagnosticKind::MaxIterationsExceeded),
        1
    );
    assert_eq!(results.global("n"), Some(JsValue::Unknown));
    assert_eq!(results.ambiguous_blocks.len(), 1);
    assert!(results.is_normal());
}

#[test]
fn do_while_body_runs_before_the_first_test() {
    let results = run("var n = 0; do { n++; } while (false);");
    assert_eq!(results.global("n"), Some(JsValue::Number(1.0)));
}

#[test]
fn break_leaves_after_one_pass() {
    let results = run("var c = 0; while (true) { c++; break; }");
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("c"), Some(JsValue::Number(1.0)));
}

#[test]
fn labeled_continue_targets_the_outer_loop() {
    let results = run(
        "var hits = 0;
         outer: for (var i = 0; i < 3; i++) {
             for (var j = 0; j < 3; j++) {
                 if (j == 1) continue outer;
                 hits++;
             }
         }",
    );
    assert_eq!(results.global("hits"), Some(JsValue::Number(3.0)));
    assert_eq!(results.global("j"), Some(JsValue::Number(1.0)));
}

#[test]
fn disabled_loop_evaluation_visits_the_body_once() {
    let options = RuntimeOptions {
        evaluate_loops: false,
        ..test_options()
    };
    let (results, visits) = run_recording(
        options,
        "var i = 0; var touched = false; for (; i < 10; i++) { touched = true; }",
    );
    assert_eq!(count_visits(&visits, NodeKind::AssignmentExpression, 1), 1);
    assert_eq!(count_visits(&visits, NodeKind::UpdateExpression, 1), 1);
    assert_eq!(results.global("i"), Some(JsValue::Unknown));
    assert_eq!(results.global("touched"), Some(JsValue::Unknown));
    assert_eq!(results.unknown_conditions.len(), 1);
    assert!(results.diagnostics.is_empty());
}

#[test]
fn unknown_loop_test_is_an_unknown_condition() {
    let mut processor =
        codeprocessor::runner::api::CodeProcessor::new(test_options()).unwrap();
    processor.define_unknown_global("items");
    let results = processor
        .process_source(
            "test.js",
            "var seen = 0; var i = 0; while (i < items.length) { seen = 1; i++; }",
        )
        .unwrap();
    assert_eq!(results.unknown_conditions.len(), 1);
    assert_eq!(results.global("seen"), Some(JsValue::Unknown));
}

#[test]
fn for_in_visits_enumerable_names() {
    let results = run(
        "var o = { a: 1, b: 2 }; var names = '';
         Object.defineProperty(o, 'hidden', { value: 3 });
         for (var k in o) { names += k; }",
    );
    assert_eq!(results.global("names"), Some(JsValue::from_str("ab")));
}

#[test]
fn for_in_over_unknown_is_one_ambiguous_pass() {
    let mut processor =
        codeprocessor::runner::api::CodeProcessor::new(test_options()).unwrap();
    processor.define_unknown_global("data");
    let results = processor
        .process_source("test.js", "var last; for (var k in data) { last = k; }")
        .unwrap();
    assert_eq!(results.global("last"), Some(JsValue::Unknown));
    assert_eq!(results.ambiguous_blocks.len(), 1);
}

#[test]
fn default_bound_is_large_enough_for_ordinary_loops() {
    let results = run_with(
        RuntimeOptions::default(),
        "var n = 0; for (var i = 0; i < 500; i++) { n = n + 2; }",
    );
    assert_eq!(results.global("n"), Some(JsValue::Number(1000.0)));
}

#[test]
fn disabled_loop_evaluation_covers_for_in() {
    let options = RuntimeOptions {
        evaluate_loops: false,
        ..test_options()
    };
    let (results, visits) = run_recording(
        options,
        "var o = { a: 1, b: 2 }; var last = ''; var count = 0;
         for (var k in o) { last = k; count++; }",
    );
    assert_eq!(count_visits(&visits, NodeKind::AssignmentExpression, 1), 1);
    assert_eq!(count_visits(&visits, NodeKind::UpdateExpression, 1), 1);
    assert_eq!(results.global("last"), Some(JsValue::Unknown));
    assert_eq!(results.global("count"), Some(JsValue::Unknown));
    assert_eq!(results.ambiguous_blocks.len(), 1);
    assert!(results.diagnostics.is_empty());
}

#[test]
fn for_in_bound_counts_only_visited_names() {
    let options = RuntimeOptions {
        max_loop_iterations: 2,
        ..test_options()
    };
    let results = run_with(
        options,
        "var o = { a: 1, b: 2, c: 3 }; var seen = '';
         for (var k in o) { seen += k; delete o.b; }",
    );
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("seen"), Some(JsValue::from_str("ac")));
}

#[test]
fn native_loops_respect_the_bound() {
    let results = run(
        "var o = { length: 4294967295, join: Array.prototype.join };
         var s = o.join();
         var t = new Array(4294967295).join();
         var small = [1, 2].join('+');",
    );
    assert_eq!(results.global("s"), Some(JsValue::Unknown));
    assert_eq!(results.global("t"), Some(JsValue::Unknown));
    assert_eq!(results.global("small"), Some(JsValue::from_str("1+2")));
    assert_eq!(
        count_diagnostics(&results, DiagnosticKind::MaxIterationsExceeded),
        2
    );
}
