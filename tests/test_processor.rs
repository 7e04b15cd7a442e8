//! The processor surface: events, limits, the unvisited-code pass, host built-ins, custom
//! rules and the serialized report.

extern crate codeprocessor;

mod processor_util;

use std::cell::RefCell;
use std::rc::Rc;

use codeprocessor::parser::ast::{
    AssignmentOperator, ExpressionType, IdentifierData, LiteralData, LiteralType, Meta,
    ProgramData, StatementType,
};
use codeprocessor::runner::api::CodeProcessor;
use codeprocessor::runner::ds::error::{ErrorKind, FatalError, JErrorType};
use codeprocessor::runner::ds::realm::Realm;
use codeprocessor::runner::ds::value::JsValue;
use codeprocessor::runner::eval::rule_processor::{NodeKind, RuleRegistry};
use codeprocessor::runner::eval::types::Completion;
use codeprocessor::runner::plugin::events::Event;
use codeprocessor::runner::plugin::registry::BuiltInRegistry;
use codeprocessor::runner::plugin::types::BuiltInObject;
use codeprocessor::runner::runtime::{DiagnosticKind, Location, RuntimeOptions};
use pretty_assertions::assert_eq;
use processor_util::{count_diagnostics, count_visits, run, run_recording, run_with, test_options};

#[test]
fn every_call_fires_a_rule_event() {
    let (results, visits) = run_recording(test_options(), "function f() {} f(); f();");
    assert!(results.is_normal());
    assert_eq!(count_visits(&visits, NodeKind::CallExpression, 0), 2);
    assert_eq!(count_visits(&visits, NodeKind::Program, 0), 1);
}

#[test]
fn subscribers_survive_between_runs() {
    let seen = Rc::new(RefCell::new(vec![]));
    let sink = seen.clone();
    let mut processor = CodeProcessor::new(test_options()).unwrap();
    processor.subscribe(Box::new(move |event: &Event<'_>, _: &Realm| {
        sink.borrow_mut().push(event.name());
    }));
    processor.process_source("a.js", "1;").unwrap();
    let first = seen.borrow().len();
    processor.process_source("b.js", "1;").unwrap();
    assert!(first > 0);
    assert_eq!(seen.borrow().len(), first * 2);
}

#[test]
fn error_events_carry_the_diagnostic() {
    let messages = Rc::new(RefCell::new(vec![]));
    let sink = messages.clone();
    let mut processor = CodeProcessor::new(test_options()).unwrap();
    processor.subscribe(Box::new(move |event: &Event<'_>, _: &Realm| {
        if let Event::Error { diagnostic } = event {
            sink.borrow_mut().push(diagnostic.message.clone());
        }
    }));
    processor
        .process_source("a.js", "var v = missing;")
        .unwrap();
    assert_eq!(*messages.borrow(), vec!["missing is not defined".to_string()]);
}

#[test]
fn runaway_recursion_is_cut_off() {
    let results = run("function r(n) { return r(n + 1); } var v = r(0); var after = 1;");
    assert!(results.is_normal());
    assert_eq!(results.global("v"), Some(JsValue::Unknown));
    assert_eq!(results.global("after"), Some(JsValue::Number(1.0)));
    assert_eq!(
        count_diagnostics(&results, DiagnosticKind::MaxRecursionLimitReached),
        1
    );
    let diagnostic = &results.diagnostics[0];
    assert!(diagnostic.message.contains("recursion limit of 50"));
    assert!(!diagnostic.stack_trace.is_empty());
}

#[test]
fn default_recursion_limit_fits_the_stack() {
    let results = run_with(
        RuntimeOptions::default(),
        "function f(n) { return f(n + 1); } var x = f(0);",
    );
    assert!(results.is_normal());
    assert_eq!(results.global("x"), Some(JsValue::Unknown));
    assert_eq!(results.diagnostics.len(), 1);
    assert!(results.diagnostics[0].message.contains("recursion limit of 500"));
}

#[test]
fn unvisited_functions_are_processed_when_enabled() {
    let code = "var seen = 0; function later(x) { seen = x ? 1 : 2; }";
    let enabled = run_with(
        RuntimeOptions {
            process_unvisited_code: true,
            ..test_options()
        },
        code,
    );
    assert_eq!(enabled.global("seen"), Some(JsValue::Unknown));
    assert_eq!(enabled.unknown_conditions.len(), 1);

    let disabled = run(code);
    assert_eq!(disabled.global("seen"), Some(JsValue::Number(0.0)));
    assert!(disabled.unknown_conditions.is_empty());
}

#[test]
fn throws_from_unvisited_functions_are_reported() {
    let results = run_with(
        RuntimeOptions {
            process_unvisited_code: true,
            ..test_options()
        },
        "function later() { throw new Error('late'); }",
    );
    assert!(results.is_normal());
    assert_eq!(
        count_diagnostics(&results, DiagnosticKind::PossiblyUncaughtException),
        1
    );
    assert_eq!(results.diagnostics[0].message, "Possibly uncaught Error: late");
}

#[test]
fn invoked_functions_are_not_revisited() {
    let (_, visits) = run_recording(
        RuntimeOptions {
            process_unvisited_code: true,
            ..test_options()
        },
        "var n = 0; function once() { n = n + 1; } once();",
    );
    assert_eq!(count_visits(&visits, NodeKind::AssignmentExpression, 0), 1);
    assert_eq!(count_visits(&visits, NodeKind::AssignmentExpression, 1), 0);
}

#[test]
fn uncaught_exceptions_end_the_program() {
    let results = run("var a = 1; throw new TypeError('x'); a = 2;");
    assert!(!results.is_normal());
    assert_eq!(results.global("a"), Some(JsValue::Number(1.0)));
    assert_eq!(results.diagnostics.len(), 1);
    assert_eq!(results.diagnostics[0].kind, DiagnosticKind::UncaughtException);
    assert_eq!(results.diagnostics[0].message, "Uncaught TypeError: x");
}

#[test]
fn undeclared_reads_are_reported_and_unknown() {
    let results = run("var v = missing; var caught = false; try { missing; } catch (e) { caught = true; }");
    assert_eq!(
        count_diagnostics(&results, DiagnosticKind::NativeException(ErrorKind::ReferenceError)),
        2
    );
    assert_eq!(results.global("v"), Some(JsValue::Unknown));
    assert_eq!(results.global("caught"), Some(JsValue::Boolean(false)));
    assert!(results.diagnostics.iter().all(|d| d.location.is_some()));
}

#[test]
fn try_catch_finally() {
    let results = run(
        "var log = '';
         function risky() { throw new Error('boom'); }
         try { risky(); log += 'unreachable'; }
         catch (e) { log += e.message; }
         finally { log += '!'; }
         function early() { try { return 'try'; } finally { log += '?'; } }
         var r = early();",
    );
    assert!(results.diagnostics.is_empty());
    assert_eq!(results.global("log"), Some(JsValue::from_str("boom!?")));
    assert_eq!(results.global("r"), Some(JsValue::from_str("try")));
    assert_eq!(results.global("e"), None);
}

#[test]
fn unknown_conditions_are_located() {
    let mut processor = CodeProcessor::new(test_options()).unwrap();
    processor.define_unknown_global("flag");
    let results = processor
        .process_source("cond.js", "var a;\nif (flag) { a = 1; }")
        .unwrap();
    assert_eq!(
        results.unknown_conditions,
        vec![Location {
            file: "cond.js".to_string(),
            line: 2,
            column: 5,
        }]
    );
}

#[test]
fn host_objects_extend_the_global_scope() {
    let mut builtins = BuiltInRegistry::with_core();
    builtins.register_object(
        BuiltInObject::new("host")
            .add_plugin_method("answer", |_, _, _| Ok(JsValue::Number(42.0)))
            .add_plugin_method("fail", |_, _, _| {
                Err(JErrorType::TypeError("host refused".to_string()))
            }),
    );
    let mut processor = CodeProcessor::new(test_options())
        .unwrap()
        .with_builtins(builtins);
    let results = processor
        .process_source("host.js", "var a = host.answer(); var b = host.fail(); var c = 1;")
        .unwrap();
    assert_eq!(results.global("a"), Some(JsValue::Number(42.0)));
    assert_eq!(results.global("b"), Some(JsValue::Unknown));
    assert_eq!(results.global("c"), Some(JsValue::Number(1.0)));
    assert_eq!(results.diagnostics.len(), 1);
    assert_eq!(results.diagnostics[0].message, "host refused");
}

fn skip_debugger(
    _: codeprocessor::runner::eval::rule_processor::NodeRef<'_>,
    _: &mut codeprocessor::runner::plugin::types::EvalContext,
) -> Result<Completion, FatalError> {
    Ok(Completion::normal())
}

#[test]
fn rules_can_be_replaced_and_must_be_present() {
    let mut rules = RuleRegistry::with_core();
    assert!(matches!(
        rules.register(NodeKind::DebuggerStatement, skip_debugger),
        Err(FatalError::DuplicateRule(NodeKind::DebuggerStatement))
    ));
    assert!(rules.unregister(NodeKind::DebuggerStatement).is_some());

    let mut missing = CodeProcessor::new(test_options())
        .unwrap()
        .with_rules(rules.clone());
    assert!(matches!(
        missing.process_source("a.js", "debugger;"),
        Err(FatalError::MissingRule(NodeKind::DebuggerStatement))
    ));

    rules
        .register(NodeKind::DebuggerStatement, skip_debugger)
        .unwrap();
    let mut replaced = CodeProcessor::new(test_options())
        .unwrap()
        .with_rules(rules);
    let results = replaced.process_source("a.js", "debugger; var x = 1;").unwrap();
    assert_eq!(results.global("x"), Some(JsValue::Number(1.0)));
}

#[test]
fn hand_built_programs_can_be_processed() {
    let meta = Meta {
        start_index: 0,
        end_index: 6,
        line: 1,
        column: 1,
    };
    let program = ProgramData {
        meta: meta.clone(),
        file: "built.js".to_string(),
        body: vec![StatementType::ExpressionStatement {
            meta: meta.clone(),
            expression: Box::new(ExpressionType::AssignmentExpression {
                meta: meta.clone(),
                operator: AssignmentOperator::Equals,
                left: Box::new(ExpressionType::Identifier(IdentifierData {
                    name: "answer".to_string(),
                    meta: meta.clone(),
                })),
                right: Box::new(ExpressionType::Literal(LiteralData {
                    meta,
                    value: LiteralType::NumberLiteral(42.0),
                })),
            }),
        }],
    };
    let mut processor = CodeProcessor::new(test_options()).unwrap();
    let results = processor.process(&program).unwrap();
    assert_eq!(results.global("answer"), Some(JsValue::Number(42.0)));
}

#[test]
fn results_serialize_to_camel_case_json() {
    let mut processor = CodeProcessor::new(test_options()).unwrap();
    processor.define_unknown_global("flag");
    let results = processor
        .process_source("report.js", "if (flag) { missing; }")
        .unwrap();
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json["runId"], serde_json::Value::String(results.run_id.to_string()));
    assert_eq!(json["completion"]["completion_type"], "Normal");
    assert_eq!(json["unknownConditions"][0]["file"], "report.js");
    assert_eq!(json["ambiguousBlocks"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(json["diagnostics"][0]["message"], "missing is not defined");
    assert!(json.get("context").is_none());
}

#[test]
fn options_come_from_key_value_pairs() {
    let options =
        RuntimeOptions::from_pairs(["maxLoopIterations=5", "evaluateLoops=false"]).unwrap();
    assert_eq!(options.max_loop_iterations, 5);
    assert!(!options.evaluate_loops);
    assert!(matches!(
        RuntimeOptions::from_pairs(["loops=1"]),
        Err(FatalError::InvalidConfig(_))
    ));
}
