use crate::runner::ds::env_record::EnvId;
use crate::runner::ds::value::{JsValue, ObjectId};

pub struct ExecutionContext {
    pub function: Option<ObjectId>,
    pub lex_env: EnvId,
    pub var_env: EnvId,
    pub this_binding: JsValue,
    /// Number of ambiguous blocks currently entered in this context.
    pub ambiguous_depth: usize,
    /// A return was reached inside an ambiguous block, so the context's result is unknown.
    pub return_is_unknown: bool,
}

impl ExecutionContext {
    pub fn new(function: Option<ObjectId>, env: EnvId, this_binding: JsValue) -> Self {
        ExecutionContext {
            function,
            lex_env: env,
            var_env: env,
            this_binding,
            ambiguous_depth: 0,
            return_is_unknown: false,
        }
    }

    fn ambiguity(&self) -> usize {
        self.ambiguous_depth + usize::from(self.return_is_unknown)
    }
}

#[derive(Default)]
pub struct ExecutionContextStack {
    stack: Vec<ExecutionContext>,
}

impl ExecutionContextStack {
    pub fn new() -> Self {
        ExecutionContextStack { stack: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn get_running_execution_ctx(&self) -> Option<&ExecutionContext> {
        self.stack.last()
    }

    pub fn get_running_execution_ctx_mut(&mut self) -> Option<&mut ExecutionContext> {
        self.stack.last_mut()
    }

    pub fn pop_running_execution_ctx(&mut self) -> Option<ExecutionContext> {
        self.stack.pop()
    }

    pub fn push_execution_ctx(&mut self, ctx: ExecutionContext) {
        self.stack.push(ctx)
    }

    /// Increments the running context's ambiguous depth and returns its stack index, which must
    /// be handed back to [`ExecutionContextStack::exit_ambiguous_block`].
    pub fn enter_ambiguous_block(&mut self) -> Option<usize> {
        let index = self.stack.len().checked_sub(1)?;
        self.stack[index].ambiguous_depth += 1;
        Some(index)
    }

    pub fn exit_ambiguous_block(&mut self, index: usize) {
        if let Some(ctx) = self.stack.get_mut(index) {
            ctx.ambiguous_depth = ctx.ambiguous_depth.saturating_sub(1);
        }
    }

    /// True if the running context is inside at least one ambiguous block.
    pub fn is_ambiguous_block(&self) -> bool {
        self.stack
            .last()
            .map(|ctx| ctx.ambiguous_depth > 0)
            .unwrap_or(false)
    }

    /// Total ambiguity across every active context. Code running at a non-zero level may or may
    /// not execute for real.
    pub fn ambiguity_level(&self) -> usize {
        self.stack.iter().map(ExecutionContext::ambiguity).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionContext> {
        self.stack.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(None, EnvId(0), JsValue::Undefined)
    }

    #[test]
    fn ambiguous_blocks_nest() {
        let mut stack = ExecutionContextStack::new();
        assert_eq!(stack.enter_ambiguous_block(), None);
        stack.push_execution_ctx(ctx());
        let outer = stack.enter_ambiguous_block().unwrap();
        let inner = stack.enter_ambiguous_block().unwrap();
        assert_eq!(stack.ambiguity_level(), 2);
        stack.exit_ambiguous_block(inner);
        assert!(stack.is_ambiguous_block());
        stack.exit_ambiguous_block(outer);
        assert!(!stack.is_ambiguous_block());
        assert_eq!(stack.ambiguity_level(), 0);
    }

    #[test]
    fn ambiguity_level_spans_contexts() {
        let mut stack = ExecutionContextStack::new();
        stack.push_execution_ctx(ctx());
        stack.enter_ambiguous_block();
        let mut callee = ctx();
        callee.return_is_unknown = true;
        stack.push_execution_ctx(callee);
        assert!(!stack.is_ambiguous_block());
        assert_eq!(stack.ambiguity_level(), 2);
        stack.pop_running_execution_ctx();
        assert_eq!(stack.ambiguity_level(), 1);
    }
}
