//! Run configuration and the reporting sink shared by every rule.
//!
//! [`Runtime`] is owned by the evaluation context of a single run. It holds the options, the
//! stack of rules currently being processed (used for source locations and stack traces), the
//! diagnostics and annotations collected so far, and the event subscribers.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::parser::ast::Meta;
use crate::runner::ds::error::{ErrorKind, FatalError, JErrorType};
use crate::runner::ds::realm::Realm;
use crate::runner::eval::rule_processor::NodeKind;
use crate::runner::plugin::events::{Event, EventSubscriber};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct RuntimeOptions {
    /// Iterate loops concretely. When off every loop body is visited once, ambiguously.
    pub evaluate_loops: bool,
    pub max_loop_iterations: u32,
    pub max_recursion_limit: u32,
    /// Call every function that was created but never invoked once the program finishes.
    pub process_unvisited_code: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        RuntimeOptions {
            evaluate_loops: true,
            max_loop_iterations: 10_000,
            max_recursion_limit: 500,
            process_unvisited_code: false,
        }
    }
}

impl RuntimeOptions {
    pub fn from_json_str(json: &str) -> Result<Self, FatalError> {
        let options: RuntimeOptions =
            serde_json::from_str(json).map_err(|e| FatalError::InvalidConfig(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Parses `key=value` pairs such as `maxLoopIterations=100`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, FatalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = serde_json::Map::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                FatalError::InvalidConfig(format!("expected key=value, got '{}'", pair))
            })?;
            let value = match value.trim() {
                "true" => serde_json::Value::Bool(true),
                "false" => serde_json::Value::Bool(false),
                v => match v.parse::<u64>() {
                    Ok(n) => serde_json::Value::from(n),
                    Err(_) => {
                        return Err(FatalError::InvalidConfig(format!(
                            "invalid value '{}' for {}",
                            v, key
                        )))
                    }
                },
            };
            map.insert(key.trim().to_string(), value);
        }
        let options: RuntimeOptions = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| FatalError::InvalidConfig(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), FatalError> {
        if self.max_loop_iterations == 0 {
            return Err(FatalError::InvalidConfig(
                "maxLoopIterations must be greater than 0".to_string(),
            ));
        }
        if self.max_recursion_limit == 0 {
            return Err(FatalError::InvalidConfig(
                "maxRecursionLimit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    NativeException(ErrorKind),
    MaxIterationsExceeded,
    MaxRecursionLimitReached,
    UncaughtException,
    /// A throw reached inside an ambiguous block that no enclosing `try` handles.
    PossiblyUncaughtException,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Option<Location>,
    pub stack_trace: Vec<String>,
}

struct RuleFrame {
    kind: NodeKind,
    location: Location,
}

pub struct Runtime {
    pub options: RuntimeOptions,
    pub run_id: Uuid,
    pub file: String,
    rule_stack: Vec<RuleFrame>,
    diagnostics: Vec<Diagnostic>,
    unknown_conditions: Vec<Location>,
    ambiguous_blocks: Vec<Location>,
    subscribers: Vec<Box<dyn EventSubscriber>>,
}

impl Runtime {
    pub fn new(options: RuntimeOptions, file: impl Into<String>) -> Self {
        Runtime {
            options,
            run_id: Uuid::new_v4(),
            file: file.into(),
            rule_stack: vec![],
            diagnostics: vec![],
            unknown_conditions: vec![],
            ambiguous_blocks: vec![],
            subscribers: vec![],
        }
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub(crate) fn take_subscribers(&mut self) -> Vec<Box<dyn EventSubscriber>> {
        std::mem::take(&mut self.subscribers)
    }

    pub fn fire_event(&mut self, event: &Event<'_>, realm: &Realm) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_event(event, realm);
        }
    }

    pub fn location_of(&self, meta: &Meta) -> Location {
        Location {
            file: self.file.clone(),
            line: meta.line,
            column: meta.column,
        }
    }

    pub fn current_location(&self) -> Option<Location> {
        self.rule_stack.last().map(|f| f.location.clone())
    }

    pub(crate) fn push_rule(&mut self, kind: NodeKind, location: Location) {
        self.rule_stack.push(RuleFrame { kind, location });
    }

    pub(crate) fn pop_rule(&mut self) {
        self.rule_stack.pop();
    }

    /// Innermost rule first.
    pub fn stack_trace(&self) -> Vec<String> {
        self.rule_stack
            .iter()
            .rev()
            .map(|f| format!("{} ({})", f.kind, f.location))
            .collect()
    }

    fn report(&mut self, kind: DiagnosticKind, message: String, realm: &Realm) {
        let diagnostic = Diagnostic {
            kind,
            message,
            location: self.current_location(),
            stack_trace: self.stack_trace(),
        };
        self.emit(diagnostic, realm);
    }

    fn emit(&mut self, diagnostic: Diagnostic, realm: &Realm) {
        let kind = diagnostic.kind;
        match &diagnostic.location {
            Some(location) => warn!(kind = ?kind, %location, "{}", diagnostic.message),
            None => warn!(kind = ?kind, "{}", diagnostic.message),
        }
        let event = match kind {
            DiagnosticKind::MaxIterationsExceeded => Event::MaxIterationsExceeded {
                description: &diagnostic.message,
                stack_trace: &diagnostic.stack_trace,
            },
            DiagnosticKind::MaxRecursionLimitReached => Event::MaxRecursionLimitReached {
                description: &diagnostic.message,
                stack_trace: &diagnostic.stack_trace,
            },
            _ => Event::Error {
                diagnostic: &diagnostic,
            },
        };
        self.fire_event(&event, realm);
        self.diagnostics.push(diagnostic);
    }

    /// Reports a recoverable native exception at the current location.
    pub fn report_error(&mut self, error: &JErrorType, realm: &Realm) {
        self.report(
            DiagnosticKind::NativeException(error.kind()),
            error.message().to_string(),
            realm,
        );
    }

    pub fn report_max_iterations(&mut self, realm: &Realm) {
        let message = format!(
            "Maximum application loop iteration limit of {} reached, could not fully process code",
            self.options.max_loop_iterations
        );
        self.report(DiagnosticKind::MaxIterationsExceeded, message, realm);
    }

    pub fn report_max_recursion(&mut self, realm: &Realm) {
        let message = format!(
            "Maximum application recursion limit of {} reached, could not fully process code",
            self.options.max_recursion_limit
        );
        self.report(DiagnosticKind::MaxRecursionLimitReached, message, realm);
    }

    pub fn report_uncaught_exception(&mut self, message: String, realm: &Realm) {
        self.report(DiagnosticKind::UncaughtException, message, realm);
    }

    /// Reports a possible throw where it was reached, not where the run ended.
    pub fn report_possibly_uncaught(
        &mut self,
        message: String,
        location: Option<Location>,
        stack_trace: Vec<String>,
        realm: &Realm,
    ) {
        let diagnostic = Diagnostic {
            kind: DiagnosticKind::PossiblyUncaughtException,
            message,
            location,
            stack_trace,
        };
        self.emit(diagnostic, realm);
    }

    pub fn mark_unknown(&mut self, meta: &Meta) {
        let location = self.location_of(meta);
        if !self.unknown_conditions.contains(&location) {
            self.unknown_conditions.push(location);
        }
    }

    pub fn mark_ambiguous_block(&mut self, meta: &Meta) {
        let location = self.location_of(meta);
        if !self.ambiguous_blocks.contains(&location) {
            self.ambiguous_blocks.push(location);
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn unknown_conditions(&self) -> &[Location] {
        &self.unknown_conditions
    }

    pub fn ambiguous_blocks(&self) -> &[Location] {
        &self.ambiguous_blocks
    }

    /// Moves the collected report out, leaving the runtime ready for another program.
    pub(crate) fn take_report(&mut self) -> (Vec<Diagnostic>, Vec<Location>, Vec<Location>) {
        (
            std::mem::take(&mut self.diagnostics),
            std::mem::take(&mut self.unknown_conditions),
            std::mem::take(&mut self.ambiguous_blocks),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let options = RuntimeOptions::default();
        assert!(options.evaluate_loops);
        assert_eq!(options.max_loop_iterations, 10_000);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn parses_json_with_camel_case_keys() {
        let options =
            RuntimeOptions::from_json_str(r#"{"evaluateLoops": false, "maxLoopIterations": 5}"#)
                .unwrap();
        assert_eq!(
            options,
            RuntimeOptions {
                evaluate_loops: false,
                max_loop_iterations: 5,
                ..RuntimeOptions::default()
            }
        );
    }

    #[test]
    fn parses_key_value_pairs() {
        let options =
            RuntimeOptions::from_pairs(["maxLoopIterations=3", "processUnvisitedCode=true"])
                .unwrap();
        assert_eq!(options.max_loop_iterations, 3);
        assert!(options.process_unvisited_code);
    }

    #[test]
    fn rejects_bad_configuration() {
        for bad in [
            vec!["maxLoopIterations=0"],
            vec!["maxRecursionLimit=0"],
            vec!["noSuchOption=true"],
            vec!["evaluateLoops"],
            vec!["maxLoopIterations=lots"],
            vec!["evaluateLoops=3"],
        ] {
            assert!(
                matches!(
                    RuntimeOptions::from_pairs(bad.clone()),
                    Err(FatalError::InvalidConfig(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(RuntimeOptions::from_json_str("{").is_err());
    }
}
