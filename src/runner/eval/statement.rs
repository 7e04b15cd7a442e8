//! Statement rules.
//!
//! Loops share one driver, [`run_loop`]: concrete iterations while the test is decidable and
//! the iteration bound holds, and a single ambiguous pass over the body otherwise. An iteration
//! that may have left the loop ends concrete evaluation the same way.

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, ExpressionType, ForIteratorData, HasMeta, Meta,
    StatementType, SwitchCaseData, VariableDeclarationData, VariableDeclarationOrExpression,
};
use crate::runner::ds::env_record::LexEnvironment;
use crate::runner::ds::error::FatalError;
use crate::runner::ds::operations::lex_env::{create_mutable_binding, set_mutable_binding};
use crate::runner::ds::operations::test_and_comparison::strict_equality;
use crate::runner::ds::operations::type_conversion::{to_boolean, to_object};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::ambiguous::{
    ambiguous_pass, claim_possible_exits, has_possible_exits_since, note_possible_exit,
    possible_exit_mark,
};
use crate::runner::eval::expression::{put_value, resolve_binding};
use crate::runner::eval::rule_processor::{
    process_expression, process_reference, process_statement, NodeKind, NodeRef,
};
use crate::runner::eval::types::{Completion, CompletionType, EvalResult, Reference};
use crate::runner::plugin::types::EvalContext;

/// Evaluates statements in order, stopping at the first abrupt completion. The value of the
/// list is the value of the last statement that produced one.
///
/// Once a statement may have exited, the statements after it run in one ambiguous pass.
pub(crate) fn evaluate_statement_list(
    statements: &[StatementType],
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut value = None;
    for (index, stmt) in statements.iter().enumerate() {
        let mark = possible_exit_mark(ctx);
        let completion = process_statement(stmt, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion.update_empty(value));
        }
        if completion.value.is_some() {
            value = completion.value;
        }
        if has_possible_exits_since(ctx, mark) {
            let rest = &statements[index + 1..];
            if let Some(next) = rest.first() {
                ambiguous_pass(ctx, next.get_meta(), |ctx| evaluate_statement_list(rest, ctx))?;
            }
            break;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value,
        target: None,
    })
}

fn evaluate_block(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    evaluate_statement_list(&block.body, ctx)
}

pub fn process_expression_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let expression = match node {
        NodeRef::Statement(StatementType::ExpressionStatement { expression, .. }) => expression,
        _ => return Err(node.malformed(NodeKind::ExpressionStatement)),
    };
    let value = value!(ctx, expression);
    Ok(Completion::normal_with_value(value))
}

pub fn process_block_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    match node {
        NodeRef::Statement(StatementType::BlockStatement(block)) => evaluate_block(block, ctx),
        _ => Err(node.malformed(NodeKind::BlockStatement)),
    }
}

/// Empty and `debugger` statements.
pub fn process_empty_statement(_node: NodeRef<'_>, _ctx: &mut EvalContext) -> EvalResult {
    Ok(Completion::normal())
}

pub fn process_return_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let argument = match node {
        NodeRef::Statement(StatementType::ReturnStatement { argument, .. }) => argument,
        _ => return Err(node.malformed(NodeKind::ReturnStatement)),
    };
    let value = match argument {
        Some(argument) => value!(ctx, argument),
        None => JsValue::Undefined,
    };
    if ctx.is_ambiguous_block() {
        // The return may or may not be taken.
        ctx.mark_return_unknown();
        return Ok(Completion::normal_with_value(JsValue::Undefined));
    }
    Ok(Completion::return_value(value))
}

pub fn process_break_statement(node: NodeRef<'_>, _ctx: &mut EvalContext) -> EvalResult {
    match node {
        NodeRef::Statement(StatementType::BreakStatement { label, .. }) => Ok(
            Completion::break_completion(label.as_ref().map(|l| l.name.clone())),
        ),
        _ => Err(node.malformed(NodeKind::BreakStatement)),
    }
}

pub fn process_continue_statement(node: NodeRef<'_>, _ctx: &mut EvalContext) -> EvalResult {
    match node {
        NodeRef::Statement(StatementType::ContinueStatement { label, .. }) => Ok(
            Completion::continue_completion(label.as_ref().map(|l| l.name.clone())),
        ),
        _ => Err(node.malformed(NodeKind::ContinueStatement)),
    }
}

pub fn process_labeled_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (label, body) = match node {
        NodeRef::Statement(StatementType::LabeledStatement { label, body, .. }) => (label, body),
        _ => return Err(node.malformed(NodeKind::LabeledStatement)),
    };
    let passes_labels = body.is_iteration_statement()
        || matches!(
            body.as_ref(),
            StatementType::SwitchStatement { .. } | StatementType::LabeledStatement { .. }
        );
    if passes_labels {
        ctx.label_set.push(label.name.clone());
    } else {
        ctx.label_set.clear();
    }
    let mark = possible_exit_mark(ctx);
    let completion = process_statement(body, ctx)?;
    let aimed_here = |c: &Completion| {
        c.completion_type == CompletionType::Break
            && c.target.as_deref() == Some(label.name.as_str())
    };
    claim_possible_exits(ctx, mark, aimed_here);
    match completion.completion_type {
        CompletionType::Break if aimed_here(&completion) => {
            Ok(Completion {
                completion_type: CompletionType::Normal,
                value: completion.value,
                target: None,
            })
        }
        _ => Ok(completion),
    }
}

pub fn process_if_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (test, consequent, alternate) = match node {
        NodeRef::Statement(StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        }) => (test, consequent, alternate),
        _ => return Err(node.malformed(NodeKind::IfStatement)),
    };
    let test_value = value!(ctx, test);
    match to_boolean(&test_value) {
        Some(true) => process_statement(consequent, ctx),
        Some(false) => match alternate {
            Some(alternate) => process_statement(alternate, ctx),
            None => Ok(Completion::normal()),
        },
        None => {
            ctx.runtime.mark_unknown(test.get_meta());
            ambiguous_pass(ctx, node.meta(), |ctx| {
                let completion = process_statement(consequent, ctx)?;
                note_possible_exit(ctx, completion);
                match alternate {
                    Some(alternate) => process_statement(alternate, ctx),
                    None => Ok(Completion::normal()),
                }
            })
        }
    }
}

pub fn process_switch_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (discriminant, cases) = match node {
        NodeRef::Statement(StatementType::SwitchStatement {
            discriminant,
            cases,
            ..
        }) => (discriminant, cases),
        _ => return Err(node.malformed(NodeKind::SwitchStatement)),
    };
    let labels = std::mem::take(&mut ctx.label_set);
    let input = value!(ctx, discriminant);
    if input.is_unknown() {
        ctx.runtime.mark_unknown(discriminant.get_meta());
        return every_case_ambiguously(cases, node.meta(), &labels, ctx);
    }

    let mut start = None;
    for (index, case) in cases.iter().enumerate() {
        let test = match &case.test {
            Some(test) => test,
            None => continue,
        };
        let case_value = value!(ctx, test);
        match strict_equality(&input, &case_value) {
            Some(true) => {
                start = Some(index);
                break;
            }
            Some(false) => {}
            None => {
                ctx.runtime.mark_unknown(test.get_meta());
                return every_case_ambiguously(cases, node.meta(), &labels, ctx);
            }
        }
    }
    let start = match start.or_else(|| cases.iter().position(|c| c.test.is_none())) {
        Some(start) => start,
        None => return Ok(Completion::normal()),
    };

    let mut value = None;
    for (index, case) in cases.iter().enumerate().skip(start) {
        let mark = possible_exit_mark(ctx);
        let completion = evaluate_statement_list(&case.consequent, ctx)?;
        if completion.value.is_some() {
            value = completion.value.clone();
        }
        match completion.completion_type {
            CompletionType::Normal => {}
            CompletionType::Break if targets(&completion, &labels) => {
                claim_possible_exits(ctx, mark, breaks_out_of(&labels));
                return Ok(normal_completion(value));
            }
            _ => return Ok(completion.update_empty(value)),
        }
        if !claim_possible_exits(ctx, mark, breaks_out_of(&labels)).is_empty() {
            // The cases below may or may not be fallen into.
            let rest = &cases[index + 1..];
            if !rest.is_empty() {
                every_case_ambiguously(rest, node.meta(), &labels, ctx)?;
            }
            return Ok(normal_completion(value));
        }
    }
    Ok(normal_completion(value))
}

fn every_case_ambiguously(
    cases: &[SwitchCaseData],
    meta: &Meta,
    labels: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    let mark = possible_exit_mark(ctx);
    ambiguous_pass(ctx, meta, |ctx| {
        for case in cases {
            let completion = evaluate_statement_list(&case.consequent, ctx)?;
            note_possible_exit(ctx, completion);
        }
        Ok(Completion::normal())
    })?;
    claim_possible_exits(ctx, mark, breaks_out_of(labels));
    Ok(Completion::normal())
}

pub fn process_throw_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let argument = match node {
        NodeRef::Statement(StatementType::ThrowStatement { argument, .. }) => argument,
        _ => return Err(node.malformed(NodeKind::ThrowStatement)),
    };
    let value = value!(ctx, argument);
    Ok(Completion::throw(value))
}

pub fn process_try_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (block, handler, finalizer) = match node {
        NodeRef::Statement(StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        }) => (block, handler, finalizer),
        _ => return Err(node.malformed(NodeKind::TryStatement)),
    };
    let mark = possible_exit_mark(ctx);
    let mut completion = evaluate_block(block, ctx)?;
    if let Some(handler) = handler {
        let possible_throws = claim_possible_exits(ctx, mark, Completion::is_throw);
        if completion.is_throw() {
            completion = evaluate_catch(handler, completion.get_value(), ctx)?;
        } else if !possible_throws.is_empty() {
            ambiguous_pass(ctx, &handler.meta, |ctx| {
                evaluate_catch(handler, JsValue::Unknown, ctx)
            })?;
        }
    }
    if let Some(finalizer) = finalizer {
        let finally = evaluate_block(finalizer, ctx)?;
        if finally.is_abrupt() {
            completion = finally;
        }
    }
    Ok(completion)
}

fn evaluate_catch(
    handler: &CatchClauseData,
    thrown: JsValue,
    ctx: &mut EvalContext,
) -> EvalResult {
    let old_env = ctx.lex_env();
    let catch_env = ctx
        .realm
        .new_environment(LexEnvironment::new_declarative(Some(old_env)));
    recoverable!(
        ctx,
        create_mutable_binding(ctx, catch_env, &handler.param.name, false)
    );
    recoverable!(
        ctx,
        set_mutable_binding(ctx, catch_env, &handler.param.name, thrown)
    );
    ctx.set_lex_env(catch_env);
    let result = evaluate_block(&handler.body, ctx);
    ctx.set_lex_env(old_env);
    result
}

pub fn process_while_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (test, body) = match node {
        NodeRef::Statement(StatementType::WhileStatement { test, body, .. }) => (test, body),
        _ => return Err(node.malformed(NodeKind::WhileStatement)),
    };
    let labels = std::mem::take(&mut ctx.label_set);
    run_loop(
        LoopParts {
            meta: node.meta(),
            test: Some(test),
            update: None,
            body,
            test_first: true,
        },
        &labels,
        ctx,
    )
}

pub fn process_do_while_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (test, body) = match node {
        NodeRef::Statement(StatementType::DoWhileStatement { test, body, .. }) => (test, body),
        _ => return Err(node.malformed(NodeKind::DoWhileStatement)),
    };
    let labels = std::mem::take(&mut ctx.label_set);
    run_loop(
        LoopParts {
            meta: node.meta(),
            test: Some(test),
            update: None,
            body,
            test_first: false,
        },
        &labels,
        ctx,
    )
}

pub fn process_for_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (init, test, update, body) = match node {
        NodeRef::Statement(StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        }) => (init, test, update, body),
        _ => return Err(node.malformed(NodeKind::ForStatement)),
    };
    let labels = std::mem::take(&mut ctx.label_set);
    match init {
        Some(VariableDeclarationOrExpression::VariableDeclaration(decl)) => {
            let completion = evaluate_variable_declaration(decl, ctx)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
        }
        Some(VariableDeclarationOrExpression::Expression(expr)) => {
            value!(ctx, expr);
        }
        None => {}
    }
    run_loop(
        LoopParts {
            meta: node.meta(),
            test: test.as_deref(),
            update: update.as_deref(),
            body,
            test_first: true,
        },
        &labels,
        ctx,
    )
}

/// The pieces of a `while`, `do-while` or `for` loop.
struct LoopParts<'a> {
    meta: &'a Meta,
    /// `None` for a `for` loop without a test, which always continues.
    test: Option<&'a ExpressionType>,
    update: Option<&'a ExpressionType>,
    body: &'a StatementType,
    test_first: bool,
}

enum LoopTest {
    Continue,
    Stop,
    Unknown,
    Abrupt(Completion),
}

fn evaluate_loop_test(
    test: Option<&ExpressionType>,
    ctx: &mut EvalContext,
) -> Result<LoopTest, FatalError> {
    let test = match test {
        Some(test) => test,
        None => return Ok(LoopTest::Continue),
    };
    let completion = process_expression(test, ctx)?;
    if completion.is_abrupt() {
        return Ok(LoopTest::Abrupt(completion));
    }
    Ok(match to_boolean(&completion.get_value()) {
        Some(true) => LoopTest::Continue,
        Some(false) => LoopTest::Stop,
        None => {
            ctx.runtime.mark_unknown(test.get_meta());
            LoopTest::Unknown
        }
    })
}

/// One representative pass over a loop body (and its update) that may or may not happen.
fn loop_body_ambiguously(
    parts: &LoopParts<'_>,
    labels: &[String],
    ctx: &mut EvalContext,
) -> Result<(), FatalError> {
    let mark = possible_exit_mark(ctx);
    ambiguous_pass(ctx, parts.meta, |ctx| {
        let completion = process_statement(parts.body, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        if let Some(update) = parts.update {
            process_expression(update, ctx)?;
        }
        Ok(Completion::normal())
    })?;
    claim_possible_exits(ctx, mark, leaves_or_continues(labels));
    Ok(())
}

/// The rest of a loop whose current iteration may have exited: the update and test, then one
/// more body pass, all uncertain.
fn loop_rest_ambiguously(
    parts: &LoopParts<'_>,
    labels: &[String],
    ctx: &mut EvalContext,
) -> Result<(), FatalError> {
    ambiguous_pass(ctx, parts.meta, |ctx| {
        for expr in parts.update.into_iter().chain(parts.test) {
            let completion = process_expression(expr, ctx)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
        }
        Ok(Completion::normal())
    })?;
    loop_body_ambiguously(parts, labels, ctx)
}

fn run_loop(parts: LoopParts<'_>, labels: &[String], ctx: &mut EvalContext) -> EvalResult {
    if !ctx.runtime.options.evaluate_loops {
        if let Some(test) = parts.test {
            let completion = process_expression(test, ctx)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
            ctx.runtime.mark_unknown(test.get_meta());
        }
        loop_body_ambiguously(&parts, labels, ctx)?;
        return Ok(Completion::normal());
    }

    let max_iterations = ctx.runtime.options.max_loop_iterations as usize;
    let mut value: Option<JsValue> = None;
    let mut iterations = 0usize;
    loop {
        let mark = possible_exit_mark(ctx);
        if parts.test_first || iterations > 0 {
            match evaluate_loop_test(parts.test, ctx)? {
                LoopTest::Continue => {}
                LoopTest::Stop => return Ok(normal_completion(value)),
                LoopTest::Unknown => {
                    loop_body_ambiguously(&parts, labels, ctx)?;
                    return Ok(normal_completion(value));
                }
                LoopTest::Abrupt(completion) => return Ok(completion),
            }
        }

        iterations += 1;
        if iterations > max_iterations {
            ctx.runtime.report_max_iterations(&ctx.realm);
            loop_body_ambiguously(&parts, labels, ctx)?;
            return Ok(normal_completion(value));
        }

        let completion = process_statement(parts.body, ctx)?;
        if completion.value.is_some() {
            value = completion.value.clone();
        }
        match completion.completion_type {
            CompletionType::Normal => {}
            CompletionType::Continue if targets(&completion, labels) => {}
            CompletionType::Break if targets(&completion, labels) => {
                claim_possible_exits(ctx, mark, leaves_or_continues(labels));
                return Ok(normal_completion(value));
            }
            _ => return Ok(completion.update_empty(value)),
        }
        if has_possible_exits_since(ctx, mark) {
            claim_possible_exits(ctx, mark, leaves_or_continues(labels));
            loop_rest_ambiguously(&parts, labels, ctx)?;
            return Ok(normal_completion(value));
        }

        if let Some(update) = parts.update {
            let completion = process_expression(update, ctx)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
        }
    }
}

pub fn process_for_in_statement(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let data = match node {
        NodeRef::Statement(StatementType::ForInStatement(data)) => data,
        _ => return Err(node.malformed(NodeKind::ForInStatement)),
    };
    let labels = std::mem::take(&mut ctx.label_set);
    if let VariableDeclarationOrExpression::VariableDeclaration(decl) = &data.left {
        let completion = evaluate_variable_declaration(decl, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
    }
    let object_value = value!(ctx, &data.right);
    if !ctx.runtime.options.evaluate_loops {
        for_in_body_ambiguously(data, node.meta(), &labels, ctx)?;
        return Ok(Completion::normal());
    }
    let object = match &object_value {
        JsValue::Undefined | JsValue::Null => return Ok(Completion::normal()),
        JsValue::Unknown => {
            ctx.runtime.mark_unknown(data.right.get_meta());
            for_in_body_ambiguously(data, node.meta(), &labels, ctx)?;
            return Ok(Completion::normal());
        }
        _ => match recoverable!(ctx, to_object(&mut ctx.realm, &object_value)) {
            Some(object) => object,
            None => return Ok(Completion::normal()),
        },
    };

    let max_iterations = ctx.runtime.options.max_loop_iterations as usize;
    let mut value: Option<JsValue> = None;
    let names = ctx.realm.enumerable_property_names(object);
    let mut passes = 0usize;
    for name in names {
        // Properties deleted before being visited are skipped.
        if !ctx.realm.has_property(object, &name) {
            continue;
        }
        if passes >= max_iterations {
            ctx.runtime.report_max_iterations(&ctx.realm);
            for_in_body_ambiguously(data, node.meta(), &labels, ctx)?;
            return Ok(normal_completion(value));
        }
        passes += 1;
        let mark = possible_exit_mark(ctx);
        let completion = assign_loop_variable(data, JsValue::String(name), ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        let completion = process_statement(&data.body, ctx)?;
        if completion.value.is_some() {
            value = completion.value.clone();
        }
        match completion.completion_type {
            CompletionType::Normal => {}
            CompletionType::Continue if targets(&completion, &labels) => {}
            CompletionType::Break if targets(&completion, &labels) => {
                claim_possible_exits(ctx, mark, leaves_or_continues(&labels));
                return Ok(normal_completion(value));
            }
            _ => return Ok(completion.update_empty(value)),
        }
        if has_possible_exits_since(ctx, mark) {
            claim_possible_exits(ctx, mark, leaves_or_continues(&labels));
            for_in_body_ambiguously(data, node.meta(), &labels, ctx)?;
            return Ok(normal_completion(value));
        }
    }
    Ok(normal_completion(value))
}

/// One uncertain pass over a `for-in` body with an Unknown loop variable.
fn for_in_body_ambiguously(
    data: &ForIteratorData,
    meta: &Meta,
    labels: &[String],
    ctx: &mut EvalContext,
) -> Result<(), FatalError> {
    let mark = possible_exit_mark(ctx);
    ambiguous_pass(ctx, meta, |ctx| {
        let completion = assign_loop_variable(data, JsValue::Unknown, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        process_statement(&data.body, ctx)
    })?;
    claim_possible_exits(ctx, mark, leaves_or_continues(labels));
    Ok(())
}

fn assign_loop_variable(
    data: &ForIteratorData,
    value: JsValue,
    ctx: &mut EvalContext,
) -> EvalResult {
    let reference: Reference = match &data.left {
        VariableDeclarationOrExpression::VariableDeclaration(decl) => {
            match decl.declarations.first() {
                Some(declarator) => resolve_binding(ctx, &declarator.id.name),
                None => {
                    return Err(FatalError::MalformedNode {
                        kind: NodeKind::ForInStatement,
                        line: decl.meta.line,
                        column: decl.meta.column,
                    })
                }
            }
        }
        VariableDeclarationOrExpression::Expression(expr) => {
            match process_reference(expr, ctx)? {
                Ok(reference) => reference,
                Err(abrupt) => return Ok(abrupt),
            }
        }
    };
    recoverable!(ctx, put_value(ctx, &reference, value));
    Ok(Completion::normal())
}

pub fn process_variable_declaration(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    match node {
        NodeRef::Statement(StatementType::VariableDeclaration(decl)) => {
            evaluate_variable_declaration(decl, ctx)
        }
        _ => Err(node.malformed(NodeKind::VariableDeclaration)),
    }
}

/// Assigns the initialisers of a `var` declaration. The names themselves were bound when the
/// enclosing body was entered.
fn evaluate_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> EvalResult {
    for declarator in &decl.declarations {
        if let Some(init) = &declarator.init {
            let reference = resolve_binding(ctx, &declarator.id.name);
            let value = value!(ctx, init);
            recoverable!(ctx, put_value(ctx, &reference, value));
        }
    }
    Ok(Completion::normal())
}

/// True if a break or continue is aimed at the current statement.
fn targets(completion: &Completion, labels: &[String]) -> bool {
    match &completion.target {
        None => true,
        Some(target) => labels.iter().any(|l| l == target),
    }
}

/// Possible exits a loop carrying `labels` accounts for.
fn leaves_or_continues(labels: &[String]) -> impl Fn(&Completion) -> bool + '_ {
    move |c: &Completion| {
        matches!(
            c.completion_type,
            CompletionType::Break | CompletionType::Continue
        ) && targets(c, labels)
    }
}

fn breaks_out_of(labels: &[String]) -> impl Fn(&Completion) -> bool + '_ {
    move |c: &Completion| c.completion_type == CompletionType::Break && targets(c, labels)
}

fn normal_completion(value: Option<JsValue>) -> Completion {
    Completion {
        completion_type: CompletionType::Normal,
        value,
        target: None,
    }
}
