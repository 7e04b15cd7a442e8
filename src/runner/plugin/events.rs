//! Events fired while a program is processed.

use crate::runner::ds::realm::Realm;
use crate::runner::eval::rule_processor::{NodeKind, NodeRef};
use crate::runner::eval::types::Completion;
use crate::runner::runtime::{Diagnostic, Location};

pub enum Event<'a> {
    /// A rule is about to be processed.
    RulePre {
        kind: NodeKind,
        location: &'a Location,
        node: NodeRef<'a>,
        ambiguous_depth: usize,
    },
    /// A rule finished with `result`.
    RulePost {
        kind: NodeKind,
        location: &'a Location,
        node: NodeRef<'a>,
        ambiguous_depth: usize,
        result: &'a Completion,
    },
    MaxIterationsExceeded {
        description: &'a str,
        stack_trace: &'a [String],
    },
    MaxRecursionLimitReached {
        description: &'a str,
        stack_trace: &'a [String],
    },
    Error {
        diagnostic: &'a Diagnostic,
    },
}

impl<'a> Event<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            Event::RulePre { .. } => "rule.pre",
            Event::RulePost { .. } => "rule.post",
            Event::MaxIterationsExceeded { .. } => "maxIterationsExceeded",
            Event::MaxRecursionLimitReached { .. } => "maxRecursionLimitReached",
            Event::Error { .. } => "error",
        }
    }
}

/// Receives every [`Event`] of a run. Subscribers observe; nothing they do flows back into
/// evaluation.
pub trait EventSubscriber {
    fn on_event(&mut self, event: &Event<'_>, realm: &Realm);
}

impl<F> EventSubscriber for F
where
    F: FnMut(&Event<'_>, &Realm),
{
    fn on_event(&mut self, event: &Event<'_>, realm: &Realm) {
        self(event, realm)
    }
}
