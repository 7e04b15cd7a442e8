//! Ambiguous blocks.
//!
//! Code whose execution cannot be decided statically (a branch behind an Unknown test, a loop
//! abandoned at the iteration bound) is still evaluated once, inside an ambiguous block.
//! [`AmbiguousBlock`] is a guard: the block is exited when the guard drops, on every path out
//! of the evaluation including `?`.
//!
//! Abrupt completions inside such a pass are only possible. They are kept as [`PossibleExit`]s
//! until the statement they target claims them; whatever follows a possible exit is itself
//! evaluated ambiguously.

use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::parser::ast::Meta;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::{Completion, CompletionType, EvalResult};
use crate::runner::plugin::types::EvalContext;
use crate::runner::runtime::Location;

pub struct AmbiguousBlock<'a> {
    ctx: &'a mut EvalContext,
    index: Option<usize>,
}

impl<'a> AmbiguousBlock<'a> {
    pub fn enter(ctx: &'a mut EvalContext, meta: &Meta) -> Self {
        ctx.runtime.mark_ambiguous_block(meta);
        let index = ctx.enter_ambiguous_block();
        debug!(
            depth = ctx.ambiguous_depth(),
            line = meta.line,
            column = meta.column,
            "enter ambiguous block"
        );
        AmbiguousBlock { ctx, index }
    }
}

impl Deref for AmbiguousBlock<'_> {
    type Target = EvalContext;

    fn deref(&self) -> &EvalContext {
        &*self.ctx
    }
}

impl DerefMut for AmbiguousBlock<'_> {
    fn deref_mut(&mut self) -> &mut EvalContext {
        &mut *self.ctx
    }
}

impl Drop for AmbiguousBlock<'_> {
    fn drop(&mut self) {
        if let Some(index) = self.index.take() {
            self.ctx.exit_ambiguous_block(index);
            debug!(depth = self.ctx.ambiguous_depth(), "exit ambiguous block");
        }
    }
}

/// An abrupt completion reached inside an ambiguous block. It may or may not have happened,
/// so it cannot redirect control; it waits in [`EvalContext`] for the `try`, loop, switch or
/// label it targets to account for it.
#[derive(Debug, Clone)]
pub struct PossibleExit {
    pub completion: Completion,
    pub location: Option<Location>,
    pub stack_trace: Vec<String>,
}

/// Runs `body` once inside an ambiguous block anchored at `meta`.
///
/// A return marks the running context's return value as unknown. Any other abrupt completion
/// is recorded as a [`PossibleExit`]. The result is always a normal completion.
pub fn ambiguous_pass<F>(ctx: &mut EvalContext, meta: &Meta, body: F) -> EvalResult
where
    F: FnOnce(&mut EvalContext) -> EvalResult,
{
    let mut block = AmbiguousBlock::enter(ctx, meta);
    let completion = body(&mut *block)?;
    let returned = completion.completion_type == CompletionType::Return;
    note_possible_exit(&mut *block, completion);
    Ok(if returned {
        Completion::normal_with_value(JsValue::Undefined)
    } else {
        Completion::normal()
    })
}

/// Records the outcome of one branch of an ambiguous pass.
pub fn note_possible_exit(ctx: &mut EvalContext, completion: Completion) {
    match completion.completion_type {
        CompletionType::Normal => {}
        CompletionType::Return => ctx.mark_return_unknown(),
        CompletionType::Break | CompletionType::Continue | CompletionType::Throw => {
            debug!(kind = ?completion.completion_type, "possible exit");
            let location = ctx.runtime.current_location();
            let stack_trace = ctx.runtime.stack_trace();
            ctx.possible_exits.push(PossibleExit {
                completion,
                location,
                stack_trace,
            });
        }
    }
}

pub fn possible_exit_mark(ctx: &EvalContext) -> usize {
    ctx.possible_exits.len()
}

pub fn has_possible_exits_since(ctx: &EvalContext, mark: usize) -> bool {
    ctx.possible_exits.len() > mark
}

/// Removes the exits recorded since `mark` that satisfy `claimed`. Returns the removed ones.
pub fn claim_possible_exits<F>(ctx: &mut EvalContext, mark: usize, claimed: F) -> Vec<PossibleExit>
where
    F: Fn(&Completion) -> bool,
{
    let mark = mark.min(ctx.possible_exits.len());
    let recent = ctx.possible_exits.split_off(mark);
    let (taken, kept): (Vec<_>, Vec<_>) = recent
        .into_iter()
        .partition(|exit| claimed(&exit.completion));
    ctx.possible_exits.extend(kept);
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::eval::rule_processor::RuleRegistry;
    use crate::runner::plugin::registry::BuiltInRegistry;
    use crate::runner::runtime::{Runtime, RuntimeOptions};

    fn context() -> EvalContext {
        EvalContext::new(
            Runtime::new(RuntimeOptions::default(), "test.js"),
            RuleRegistry::with_core(),
            &BuiltInRegistry::new(),
        )
    }

    #[test]
    fn guard_restores_depth_on_every_exit() {
        let mut ctx = context();
        let meta = Meta::default();
        {
            let mut outer = AmbiguousBlock::enter(&mut ctx, &meta);
            assert_eq!(outer.ambiguous_depth(), 1);
            {
                let inner = AmbiguousBlock::enter(&mut *outer, &meta);
                assert_eq!(inner.ambiguous_depth(), 2);
            }
            assert_eq!(outer.ambiguous_depth(), 1);
        }
        assert_eq!(ctx.ambiguous_depth(), 0);

        let result = ambiguous_pass(&mut ctx, &meta, |ctx| {
            assert!(ctx.is_ambiguous_block());
            Err(crate::runner::ds::error::FatalError::InvalidConfig("x".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(ctx.ambiguous_depth(), 0);
    }

    #[test]
    fn abrupt_completions_become_possible_exits() {
        let mut ctx = context();
        let meta = Meta::default();
        let thrown = ambiguous_pass(&mut ctx, &meta, |_| {
            Ok(Completion::throw(JsValue::from_str("boom")))
        })
        .unwrap();
        assert!(thrown.is_normal());
        assert!(!ctx.return_is_unknown());
        assert_eq!(ctx.possible_exits.len(), 1);
        assert!(ctx.possible_exits[0].completion.is_throw());

        let returned = ambiguous_pass(&mut ctx, &meta, |_| {
            Ok(Completion::return_value(JsValue::Number(1.0)))
        })
        .unwrap();
        assert!(returned.is_normal());
        assert!(ctx.return_is_unknown());
        assert_eq!(ctx.possible_exits.len(), 1);
        assert_eq!(ctx.runtime.ambiguous_blocks().len(), 1);
    }

    #[test]
    fn claiming_only_takes_matching_recent_exits() {
        let mut ctx = context();
        let meta = Meta::default();
        ambiguous_pass(&mut ctx, &meta, |_| Ok(Completion::break_completion(None))).unwrap();
        let mark = possible_exit_mark(&ctx);
        ambiguous_pass(&mut ctx, &meta, |_| Ok(Completion::break_completion(None))).unwrap();
        ambiguous_pass(&mut ctx, &meta, |_| {
            Ok(Completion::throw(JsValue::Undefined))
        })
        .unwrap();
        assert!(has_possible_exits_since(&ctx, mark));

        let breaks = claim_possible_exits(&mut ctx, mark, |c| {
            c.completion_type == CompletionType::Break
        });
        assert_eq!(breaks.len(), 1);
        assert_eq!(ctx.possible_exits.len(), 2);
        assert!(ctx.possible_exits[1].completion.is_throw());
    }
}
