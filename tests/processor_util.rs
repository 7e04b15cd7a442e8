//! Helpers shared by the integration tests.

#![allow(dead_code)]

extern crate codeprocessor;

use codeprocessor::runner::api::{CodeProcessor, ProcessResults};
use codeprocessor::runner::ds::realm::Realm;
use codeprocessor::runner::eval::rule_processor::NodeKind;
use codeprocessor::runner::plugin::events::Event;
use codeprocessor::runner::runtime::{DiagnosticKind, RuntimeOptions};
use std::cell::RefCell;
use std::rc::Rc;

/// A rule that was entered: its kind and the ambiguous depth at the time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    pub kind: NodeKind,
    pub ambiguous_depth: usize,
}

pub type Visits = Rc<RefCell<Vec<Visit>>>;

/// Small limits keep the recursion of the processor itself shallow in debug builds.
pub fn test_options() -> RuntimeOptions {
    RuntimeOptions {
        max_recursion_limit: 50,
        ..RuntimeOptions::default()
    }
}

pub fn run_with(options: RuntimeOptions, code: &str) -> ProcessResults {
    let mut processor = CodeProcessor::new(options).unwrap();
    processor
        .process_source("test.js", code)
        .unwrap_or_else(|e| panic!("processing failed: {}", e))
}

pub fn run(code: &str) -> ProcessResults {
    run_with(test_options(), code)
}

/// Runs `code` while recording every `RulePre` event.
pub fn run_recording(options: RuntimeOptions, code: &str) -> (ProcessResults, Visits) {
    let visits: Visits = Rc::new(RefCell::new(vec![]));
    let sink = visits.clone();
    let mut processor = CodeProcessor::new(options).unwrap();
    processor.subscribe(Box::new(move |event: &Event<'_>, _: &Realm| {
        if let Event::RulePre {
            kind,
            ambiguous_depth,
            ..
        } = event
        {
            sink.borrow_mut().push(Visit {
                kind: *kind,
                ambiguous_depth: *ambiguous_depth,
            });
        }
    }));
    let results = processor.process_source("test.js", code).unwrap();
    (results, visits)
}

pub fn count_visits(visits: &Visits, kind: NodeKind, ambiguous_depth: usize) -> usize {
    visits
        .borrow()
        .iter()
        .filter(|v| v.kind == kind && v.ambiguous_depth == ambiguous_depth)
        .count()
}

pub fn count_diagnostics(results: &ProcessResults, kind: DiagnosticKind) -> usize {
    results
        .diagnostics
        .iter()
        .filter(|d| d.kind == kind)
        .count()
}
