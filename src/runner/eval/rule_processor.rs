//! Dispatch from syntax-node kind to the rule that evaluates it.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::parser::ast::{
    ExpressionType, HasMeta, Meta, ProgramData, StatementType,
};
use crate::runner::ds::error::FatalError;
use crate::runner::eval::expression;
use crate::runner::eval::function;
use crate::runner::eval::statement;
use crate::runner::eval::types::{Completion, EvalResult, ReferenceResult};
use crate::runner::plugin::events::Event;
use crate::runner::plugin::types::EvalContext;
use crate::runner::runtime::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Program,
    ExpressionStatement,
    BlockStatement,
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    LabeledStatement,
    IfStatement,
    SwitchStatement,
    ThrowStatement,
    TryStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    VariableDeclaration,
    FunctionDeclaration,
    Literal,
    Identifier,
    ThisExpression,
    ArrayExpression,
    ObjectExpression,
    FunctionExpression,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    AssignmentExpression,
    LogicalExpression,
    ConditionalExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    SequenceExpression,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl NodeKind {
    pub fn of_statement(stmt: &StatementType) -> NodeKind {
        match stmt {
            StatementType::ExpressionStatement { .. } => NodeKind::ExpressionStatement,
            StatementType::BlockStatement(_) => NodeKind::BlockStatement,
            StatementType::EmptyStatement { .. } => NodeKind::EmptyStatement,
            StatementType::DebuggerStatement { .. } => NodeKind::DebuggerStatement,
            StatementType::ReturnStatement { .. } => NodeKind::ReturnStatement,
            StatementType::BreakStatement { .. } => NodeKind::BreakStatement,
            StatementType::ContinueStatement { .. } => NodeKind::ContinueStatement,
            StatementType::LabeledStatement { .. } => NodeKind::LabeledStatement,
            StatementType::IfStatement { .. } => NodeKind::IfStatement,
            StatementType::SwitchStatement { .. } => NodeKind::SwitchStatement,
            StatementType::ThrowStatement { .. } => NodeKind::ThrowStatement,
            StatementType::TryStatement { .. } => NodeKind::TryStatement,
            StatementType::WhileStatement { .. } => NodeKind::WhileStatement,
            StatementType::DoWhileStatement { .. } => NodeKind::DoWhileStatement,
            StatementType::ForStatement { .. } => NodeKind::ForStatement,
            StatementType::ForInStatement(_) => NodeKind::ForInStatement,
            StatementType::VariableDeclaration(_) => NodeKind::VariableDeclaration,
            StatementType::FunctionDeclaration(_) => NodeKind::FunctionDeclaration,
        }
    }

    pub fn of_expression(expr: &ExpressionType) -> NodeKind {
        match expr {
            ExpressionType::Literal(_) => NodeKind::Literal,
            ExpressionType::Identifier(_) => NodeKind::Identifier,
            ExpressionType::ThisExpression { .. } => NodeKind::ThisExpression,
            ExpressionType::ArrayExpression { .. } => NodeKind::ArrayExpression,
            ExpressionType::ObjectExpression { .. } => NodeKind::ObjectExpression,
            ExpressionType::FunctionExpression(_) => NodeKind::FunctionExpression,
            ExpressionType::UnaryExpression { .. } => NodeKind::UnaryExpression,
            ExpressionType::UpdateExpression { .. } => NodeKind::UpdateExpression,
            ExpressionType::BinaryExpression { .. } => NodeKind::BinaryExpression,
            ExpressionType::AssignmentExpression { .. } => NodeKind::AssignmentExpression,
            ExpressionType::LogicalExpression { .. } => NodeKind::LogicalExpression,
            ExpressionType::ConditionalExpression { .. } => NodeKind::ConditionalExpression,
            ExpressionType::CallExpression { .. } => NodeKind::CallExpression,
            ExpressionType::NewExpression { .. } => NodeKind::NewExpression,
            ExpressionType::MemberExpression(_) => NodeKind::MemberExpression,
            ExpressionType::SequenceExpression { .. } => NodeKind::SequenceExpression,
        }
    }
}

/// The node a rule is evaluating.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Program(&'a ProgramData),
    Statement(&'a StatementType),
    Expression(&'a ExpressionType),
}

impl<'a> NodeRef<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Program(_) => NodeKind::Program,
            NodeRef::Statement(s) => NodeKind::of_statement(s),
            NodeRef::Expression(e) => NodeKind::of_expression(e),
        }
    }

    pub fn meta(&self) -> &'a Meta {
        match self {
            NodeRef::Program(p) => &p.meta,
            NodeRef::Statement(s) => s.get_meta(),
            NodeRef::Expression(e) => e.get_meta(),
        }
    }

    /// The error for a rule registered under `expected` that was handed this node.
    pub fn malformed(&self, expected: NodeKind) -> FatalError {
        let meta = self.meta();
        FatalError::MalformedNode {
            kind: expected,
            line: meta.line,
            column: meta.column,
        }
    }
}

pub type RuleHandler = fn(NodeRef<'_>, &mut EvalContext) -> EvalResult;

lazy_static! {
    static ref CORE_RULES: HashMap<NodeKind, RuleHandler> = {
        let mut rules: HashMap<NodeKind, RuleHandler> = HashMap::new();
        rules.insert(NodeKind::Program, function::process_program);
        rules.insert(NodeKind::ExpressionStatement, statement::process_expression_statement);
        rules.insert(NodeKind::BlockStatement, statement::process_block_statement);
        rules.insert(NodeKind::EmptyStatement, statement::process_empty_statement);
        rules.insert(NodeKind::DebuggerStatement, statement::process_empty_statement);
        rules.insert(NodeKind::ReturnStatement, statement::process_return_statement);
        rules.insert(NodeKind::BreakStatement, statement::process_break_statement);
        rules.insert(NodeKind::ContinueStatement, statement::process_continue_statement);
        rules.insert(NodeKind::LabeledStatement, statement::process_labeled_statement);
        rules.insert(NodeKind::IfStatement, statement::process_if_statement);
        rules.insert(NodeKind::SwitchStatement, statement::process_switch_statement);
        rules.insert(NodeKind::ThrowStatement, statement::process_throw_statement);
        rules.insert(NodeKind::TryStatement, statement::process_try_statement);
        rules.insert(NodeKind::WhileStatement, statement::process_while_statement);
        rules.insert(NodeKind::DoWhileStatement, statement::process_do_while_statement);
        rules.insert(NodeKind::ForStatement, statement::process_for_statement);
        rules.insert(NodeKind::ForInStatement, statement::process_for_in_statement);
        rules.insert(NodeKind::VariableDeclaration, statement::process_variable_declaration);
        rules.insert(NodeKind::FunctionDeclaration, function::process_function_declaration);
        rules.insert(NodeKind::Literal, expression::process_literal);
        rules.insert(NodeKind::Identifier, expression::process_identifier);
        rules.insert(NodeKind::ThisExpression, expression::process_this_expression);
        rules.insert(NodeKind::ArrayExpression, expression::process_array_expression);
        rules.insert(NodeKind::ObjectExpression, expression::process_object_expression);
        rules.insert(NodeKind::FunctionExpression, function::process_function_expression);
        rules.insert(NodeKind::UnaryExpression, expression::process_unary_expression);
        rules.insert(NodeKind::UpdateExpression, expression::process_update_expression);
        rules.insert(NodeKind::BinaryExpression, expression::process_binary_expression);
        rules.insert(NodeKind::AssignmentExpression, expression::process_assignment_expression);
        rules.insert(NodeKind::LogicalExpression, expression::process_logical_expression);
        rules.insert(NodeKind::ConditionalExpression, expression::process_conditional_expression);
        rules.insert(NodeKind::CallExpression, function::process_call_expression);
        rules.insert(NodeKind::NewExpression, function::process_new_expression);
        rules.insert(NodeKind::MemberExpression, expression::process_member_expression);
        rules.insert(NodeKind::SequenceExpression, expression::process_sequence_expression);
        rules
    };
}

/// One handler per node kind.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    handlers: HashMap<NodeKind, RuleHandler>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        RuleRegistry {
            handlers: HashMap::new(),
        }
    }

    /// A registry holding a rule for every node kind.
    pub fn with_core() -> Self {
        RuleRegistry {
            handlers: CORE_RULES.clone(),
        }
    }

    pub fn register(&mut self, kind: NodeKind, handler: RuleHandler) -> Result<(), FatalError> {
        if self.handlers.contains_key(&kind) {
            return Err(FatalError::DuplicateRule(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Removes the rule for `kind`, returning it. Used to wrap a core rule with another.
    pub fn unregister(&mut self, kind: NodeKind) -> Option<RuleHandler> {
        self.handlers.remove(&kind)
    }

    pub fn get(&self, kind: NodeKind) -> Option<RuleHandler> {
        self.handlers.get(&kind).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn enter_rule(node: NodeRef<'_>, ctx: &mut EvalContext) -> Location {
    let kind = node.kind();
    let location = ctx.runtime.location_of(node.meta());
    trace!(%kind, line = location.line, column = location.column, "rule");
    let ambiguous_depth = ctx.ambiguous_depth();
    ctx.runtime.push_rule(kind, location.clone());
    ctx.runtime.fire_event(
        &Event::RulePre {
            kind,
            location: &location,
            node,
            ambiguous_depth,
        },
        &ctx.realm,
    );
    location
}

fn exit_rule(node: NodeRef<'_>, location: &Location, result: &Completion, ctx: &mut EvalContext) {
    ctx.runtime.pop_rule();
    let ambiguous_depth = ctx.ambiguous_depth();
    ctx.runtime.fire_event(
        &Event::RulePost {
            kind: node.kind(),
            location,
            node,
            ambiguous_depth,
            result,
        },
        &ctx.realm,
    );
}

/// Rules recurse through [`process_rule`] for every nested node and script call, so the stack
/// is grown on demand once less than the red zone remains.
const RED_ZONE: usize = 100 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Evaluates `node` with the rule registered for its kind, firing the pre and post events.
pub fn process_rule(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let kind = node.kind();
    let handler = ctx.rules.get(kind).ok_or(FatalError::MissingRule(kind))?;
    let location = enter_rule(node, ctx);
    let result = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || handler(node, ctx));
    match result {
        Ok(completion) => {
            exit_rule(node, &location, &completion, ctx);
            Ok(completion)
        }
        Err(e) => {
            ctx.runtime.pop_rule();
            Err(e)
        }
    }
}

pub fn process_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    process_rule(NodeRef::Statement(stmt), ctx)
}

pub fn process_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> EvalResult {
    process_rule(NodeRef::Expression(expr), ctx)
}

/// Evaluates an identifier or member expression to a reference instead of a value. The same
/// events are fired as for [`process_rule`]; the post event carries an empty completion.
pub fn process_reference(expr: &ExpressionType, ctx: &mut EvalContext) -> ReferenceResult {
    let node = NodeRef::Expression(expr);
    let location = enter_rule(node, ctx);
    let result = match expr {
        ExpressionType::Identifier(id) => Ok(Ok(expression::resolve_binding(ctx, &id.name))),
        ExpressionType::MemberExpression(m) => expression::member_reference(m, ctx),
        _ => Err(node.malformed(NodeKind::of_expression(expr))),
    };
    match result {
        Ok(reference) => {
            let completion = match &reference {
                Ok(_) => Completion::normal(),
                Err(abrupt) => abrupt.clone(),
            };
            exit_rule(node, &location, &completion, ctx);
            Ok(reference)
        }
        Err(e) => {
            ctx.runtime.pop_rule();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_node: NodeRef<'_>, _ctx: &mut EvalContext) -> EvalResult {
        Ok(Completion::normal())
    }

    #[test]
    fn core_registry_covers_every_kind() {
        assert_eq!(RuleRegistry::with_core().len(), 35);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register(NodeKind::Literal, noop).unwrap();
        assert!(matches!(
            registry.register(NodeKind::Literal, noop),
            Err(FatalError::DuplicateRule(NodeKind::Literal))
        ));
        assert!(registry.unregister(NodeKind::Literal).is_some());
        assert!(registry.register(NodeKind::Literal, noop).is_ok());
    }
}
