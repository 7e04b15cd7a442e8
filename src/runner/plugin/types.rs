//! Core types shared by the rules and the built-ins.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::runner::ds::env_record::EnvId;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::{ExecutionContext, ExecutionContextStack};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::{JsValue, ObjectId};
use crate::runner::eval::ambiguous::PossibleExit;
use crate::runner::eval::rule_processor::RuleRegistry;
use crate::runner::eval::types::Completion;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::runtime::Runtime;

/// Everything a rule or a native function can reach during a run.
pub struct EvalContext {
    pub realm: Realm,
    pub runtime: Runtime,
    pub(crate) rules: RuleRegistry,
    ctx_stack: ExecutionContextStack,
    /// Labels of the statement currently being entered, consumed by the next loop or switch.
    pub(crate) label_set: Vec<String>,
    /// Script functions in creation order.
    pub(crate) script_functions: Vec<ObjectId>,
    pub(crate) invoked_functions: HashSet<ObjectId>,
    /// Abrupt completions reached inside ambiguous blocks and not yet claimed by a target.
    pub(crate) possible_exits: Vec<PossibleExit>,
}

impl EvalContext {
    pub fn new(runtime: Runtime, rules: RuleRegistry, builtins: &BuiltInRegistry) -> Self {
        let mut realm = Realm::new();
        builtins.install(&mut realm);
        let global_env = realm.global_env();
        let global_this = JsValue::Object(realm.global_object());
        let mut ctx_stack = ExecutionContextStack::new();
        ctx_stack.push_execution_ctx(ExecutionContext::new(None, global_env, global_this));
        EvalContext {
            realm,
            runtime,
            rules,
            ctx_stack,
            label_set: vec![],
            script_functions: vec![],
            invoked_functions: HashSet::new(),
            possible_exits: vec![],
        }
    }

    pub fn global_this(&self) -> JsValue {
        JsValue::Object(self.realm.global_object())
    }

    pub fn lex_env(&self) -> EnvId {
        self.ctx_stack
            .get_running_execution_ctx()
            .map(|c| c.lex_env)
            .unwrap_or_else(|| self.realm.global_env())
    }

    pub fn var_env(&self) -> EnvId {
        self.ctx_stack
            .get_running_execution_ctx()
            .map(|c| c.var_env)
            .unwrap_or_else(|| self.realm.global_env())
    }

    pub fn set_lex_env(&mut self, env: EnvId) {
        if let Some(c) = self.ctx_stack.get_running_execution_ctx_mut() {
            c.lex_env = env;
        }
    }

    pub fn this_binding(&self) -> JsValue {
        self.ctx_stack
            .get_running_execution_ctx()
            .map(|c| c.this_binding.clone())
            .unwrap_or_else(|| self.global_this())
    }

    pub fn context_depth(&self) -> usize {
        self.ctx_stack.len()
    }

    pub fn push_context(&mut self, ctx: ExecutionContext) {
        debug!(depth = self.ctx_stack.len() + 1, "push execution context");
        self.ctx_stack.push_execution_ctx(ctx);
        self.sync_ambiguity();
    }

    pub fn pop_context(&mut self) -> Option<ExecutionContext> {
        let ctx = self.ctx_stack.pop_running_execution_ctx();
        debug!(depth = self.ctx_stack.len(), "pop execution context");
        self.sync_ambiguity();
        ctx
    }

    /// Ambiguous depth of the running context.
    pub fn ambiguous_depth(&self) -> usize {
        self.ctx_stack
            .get_running_execution_ctx()
            .map(|c| c.ambiguous_depth)
            .unwrap_or(0)
    }

    pub fn is_ambiguous_block(&self) -> bool {
        self.ctx_stack.is_ambiguous_block()
    }

    pub fn ambiguity_level(&self) -> usize {
        self.ctx_stack.ambiguity_level()
    }

    /// True if a write to something created at `created_ambiguity` may or may not happen.
    pub fn is_ambiguous_write(&self, created_ambiguity: usize) -> bool {
        self.ambiguity_level() > created_ambiguity
    }

    pub(crate) fn enter_ambiguous_block(&mut self) -> Option<usize> {
        let index = self.ctx_stack.enter_ambiguous_block();
        self.sync_ambiguity();
        index
    }

    pub(crate) fn exit_ambiguous_block(&mut self, index: usize) {
        self.ctx_stack.exit_ambiguous_block(index);
        self.sync_ambiguity();
    }

    pub fn return_is_unknown(&self) -> bool {
        self.ctx_stack
            .get_running_execution_ctx()
            .map(|c| c.return_is_unknown)
            .unwrap_or(false)
    }

    /// A return was reached inside an ambiguous block of the running context.
    pub(crate) fn mark_return_unknown(&mut self) {
        if let Some(c) = self.ctx_stack.get_running_execution_ctx_mut() {
            c.return_is_unknown = true;
            let env = c.var_env;
            self.realm.get_environment_mut(env).ambiguous_context = true;
        }
        self.sync_ambiguity();
    }

    fn sync_ambiguity(&mut self) {
        self.realm.ambiguity_level = self.ctx_stack.ambiguity_level();
    }

    pub fn report_error(&mut self, error: &JErrorType) {
        self.runtime.report_error(error, &self.realm);
    }

    /// Reports `error` and continues with an unknown value.
    pub fn recover(&mut self, error: JErrorType) -> Completion {
        self.report_error(&error);
        Completion::normal_with_value(JsValue::Unknown)
    }
}

/// Function signature for built-in methods: the context, `this` and the arguments.
pub type NativeFn =
    fn(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType>;

pub type PluginFn = dyn Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType>;

/// Built-in function - either compiled-in or plugin-provided.
#[derive(Clone)]
pub enum BuiltInFn {
    Native(NativeFn),
    Plugin(Rc<PluginFn>),
}

impl BuiltInFn {
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, JErrorType> {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

/// Description of a built-in object installed into every new realm.
///
/// Objects named after an intrinsic constructor (`Object`, `Array`, ...) or `global` extend
/// the existing intrinsic. Any other name creates a new host object bound as a global.
pub struct BuiltInObject {
    pub name: String,
    /// Methods on the object itself.
    pub methods: Vec<(String, BuiltInFn)>,
    /// Methods on the object's `prototype`.
    pub prototype_methods: Vec<(String, BuiltInFn)>,
    /// Read-only value properties.
    pub properties: Vec<(String, JsValue)>,
    /// Writable, non-enumerable value properties on the object's `prototype`.
    pub prototype_properties: Vec<(String, JsValue)>,
    /// Behaviour when called as a function.
    pub call: Option<BuiltInFn>,
    /// Behaviour when used with `new`.
    pub constructor: Option<BuiltInFn>,
}

impl BuiltInObject {
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            methods: vec![],
            prototype_methods: vec![],
            properties: vec![],
            prototype_properties: vec![],
            call: None,
            constructor: None,
        }
    }

    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.methods.push((name.into(), BuiltInFn::Native(func)));
        self
    }

    pub fn add_plugin_method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut EvalContext, JsValue, Vec<JsValue>) -> Result<JsValue, JErrorType> + 'static,
    {
        self.methods.push((name.into(), BuiltInFn::Plugin(Rc::new(func))));
        self
    }

    pub fn add_prototype_method(mut self, name: impl Into<String>, func: NativeFn) -> Self {
        self.prototype_methods
            .push((name.into(), BuiltInFn::Native(func)));
        self
    }

    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn add_prototype_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.prototype_properties.push((name.into(), value));
        self
    }

    pub fn with_call(mut self, call: NativeFn) -> Self {
        self.call = Some(BuiltInFn::Native(call));
        self
    }

    pub fn with_constructor(mut self, constructor: NativeFn) -> Self {
        self.constructor = Some(BuiltInFn::Native(constructor));
        self
    }
}
