//! Processor entry point.
//!
//! [`CodeProcessor`] owns the configuration of a run (options, built-ins, rules, subscribers)
//! and turns a program into [`ProcessResults`]. Every call to [`CodeProcessor::process`] starts
//! from a fresh realm.

use serde::Serialize;
use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::parser::ast::ProgramData;
use crate::parser::JsParser;
use crate::runner::ds::error::FatalError;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::operations::object::create_data_property;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ambiguous::ambiguous_pass;
use crate::runner::eval::function::{call_function, report_possible_throws};
use crate::runner::eval::rule_processor::{process_rule, NodeRef, RuleRegistry};
use crate::runner::eval::types::Completion;
use crate::runner::plugin::events::EventSubscriber;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;
use crate::runner::runtime::{Diagnostic, Location, Runtime, RuntimeOptions};

/// Outcome of one processed program.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResults {
    pub run_id: Uuid,
    pub completion: Completion,
    pub diagnostics: Vec<Diagnostic>,
    pub unknown_conditions: Vec<Location>,
    pub ambiguous_blocks: Vec<Location>,
    /// The final state of the run.
    #[serde(skip)]
    pub context: EvalContext,
}

impl ProcessResults {
    /// Value of a global data property after the run. Accessors are reported as Unknown.
    pub fn global(&self, name: &str) -> Option<JsValue> {
        let realm = &self.context.realm;
        match realm.get_object(realm.global_object()).get_own_property(name) {
            Some(PropertyDescriptor::Data { value, .. }) => Some(value.clone()),
            Some(PropertyDescriptor::Accessor { .. }) => Some(JsValue::Unknown),
            None => None,
        }
    }

    /// True if the program ran to the end without an uncaught exception.
    pub fn is_normal(&self) -> bool {
        self.completion.is_normal()
    }
}

pub struct CodeProcessor {
    options: RuntimeOptions,
    builtins: BuiltInRegistry,
    rules: RuleRegistry,
    subscribers: Vec<Box<dyn EventSubscriber>>,
    unknown_globals: Vec<String>,
}

impl CodeProcessor {
    pub fn new(options: RuntimeOptions) -> Result<Self, FatalError> {
        options.validate()?;
        Ok(CodeProcessor {
            options,
            builtins: BuiltInRegistry::with_core(),
            rules: RuleRegistry::with_core(),
            subscribers: vec![],
            unknown_globals: vec![],
        })
    }

    pub fn with_builtins(mut self, builtins: BuiltInRegistry) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn with_rules(mut self, rules: RuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Declares a global whose value comes from outside the program, such as host
    /// configuration. It is bound to Unknown in every run.
    pub fn define_unknown_global(&mut self, name: impl Into<String>) {
        self.unknown_globals.push(name.into());
    }

    pub fn process_source(
        &mut self,
        file: &str,
        source: &str,
    ) -> Result<ProcessResults, FatalError> {
        let program = JsParser::parse_to_ast(file, source)?;
        self.process(&program)
    }

    pub fn process(&mut self, program: &ProgramData) -> Result<ProcessResults, FatalError> {
        let mut runtime = Runtime::new(self.options.clone(), program.file.clone());
        for subscriber in self.subscribers.drain(..) {
            runtime.subscribe(subscriber);
        }
        let run_id = runtime.run_id;
        let span = info_span!("process", run_id = %run_id, file = %program.file);
        let _guard = span.enter();

        let mut ctx = EvalContext::new(runtime, self.rules.clone(), &self.builtins);
        let result = run(&mut ctx, program, &self.unknown_globals);
        self.subscribers = ctx.runtime.take_subscribers();
        let completion = result?;

        let (diagnostics, unknown_conditions, ambiguous_blocks) = ctx.runtime.take_report();
        info!(
            completion = ?completion.completion_type,
            diagnostics = diagnostics.len(),
            unknown_conditions = unknown_conditions.len(),
            ambiguous_blocks = ambiguous_blocks.len(),
            "processing finished"
        );
        Ok(ProcessResults {
            run_id,
            completion,
            diagnostics,
            unknown_conditions,
            ambiguous_blocks,
            context: ctx,
        })
    }
}

fn run(
    ctx: &mut EvalContext,
    program: &ProgramData,
    unknown_globals: &[String],
) -> Result<Completion, FatalError> {
    let global = ctx.realm.global_object();
    for name in unknown_globals {
        if let Err(e) = create_data_property(ctx, global, name, JsValue::Unknown) {
            ctx.report_error(&e);
        }
    }
    let completion = process_rule(NodeRef::Program(program), ctx)?;
    if ctx.runtime.options.process_unvisited_code {
        process_unvisited_functions(ctx)?;
    }
    report_possible_throws(ctx);
    Ok(completion)
}

/// Calls every script function that was created but never invoked, once, inside an ambiguous
/// block with Unknown `this` and arguments. Functions created during this pass are visited too.
fn process_unvisited_functions(ctx: &mut EvalContext) -> Result<(), FatalError> {
    let mut index = 0;
    while index < ctx.script_functions.len() {
        let f = ctx.script_functions[index];
        index += 1;
        if ctx.invoked_functions.contains(&f) {
            continue;
        }
        let (meta, arity) = match &ctx.realm.get_object(f).callable {
            Some(FunctionKind::Script(script)) => {
                (script.data.meta.clone(), script.data.params.len())
            }
            _ => continue,
        };
        debug!(line = meta.line, column = meta.column, "process unvisited function");
        ambiguous_pass(ctx, &meta, |ctx| {
            call_function(ctx, f, JsValue::Unknown, vec![JsValue::Unknown; arity])
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_invalid_options() {
        let options = RuntimeOptions {
            max_loop_iterations: 0,
            ..RuntimeOptions::default()
        };
        assert!(matches!(
            CodeProcessor::new(options),
            Err(FatalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_globals_are_bound() {
        let mut processor = CodeProcessor::new(RuntimeOptions::default()).unwrap();
        processor.define_unknown_global("config");
        let results = processor
            .process_source("a.js", "var debug = config.debug;")
            .unwrap();
        assert!(results.is_normal());
        assert_eq!(results.global("debug"), Some(JsValue::Unknown));
    }

    #[test]
    fn parse_errors_are_fatal() {
        let mut processor = CodeProcessor::new(RuntimeOptions::default()).unwrap();
        assert!(matches!(
            processor.process_source("a.js", "var = ;"),
            Err(FatalError::Parse(_))
        ));
    }
}
