use std::rc::Rc;
use std::time::Instant;

use pest::error::{Error, ErrorVariant, LineColLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use super::ast::*;
use crate::runner::ds::operations::type_conversion::number_to_string;

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

const TAB_WIDTH: usize = 2;

/// A syntax error in the processed source.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({line}:{column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<Error<Rule>> for ParseError {
    fn from(e: Error<Rule>) -> Self {
        let (line, column) = match e.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        ParseError {
            message: e.variant.message().to_string(),
            line,
            column,
        }
    }
}

impl JsParser {
    /// Parses `script` into a program tagged with the `file` it was read from.
    pub fn parse_to_ast(file: &str, script: &str) -> Result<ProgramData, ParseError> {
        let start = Instant::now();
        let mut pairs = JsParser::parse(Rule::script, script)?;
        let program = match pairs.next() {
            Some(pair) => build_ast_from_script(file, pair)?,
            None => {
                return Err(ParseError {
                    message: "Empty parse result".to_string(),
                    line: 1,
                    column: 1,
                })
            }
        };
        tracing::debug!(
            file,
            elapsed_ms = start.elapsed().as_millis() as u64,
            statements = program.body.len(),
            "parsed source"
        );
        Ok(program)
    }

    pub fn parse_to_ast_from_str(script: &str) -> Result<ProgramData, ParseError> {
        Self::parse_to_ast("<anonymous>", script)
    }

    /// Renders the raw pest token tree, one rule per line, for grammar debugging.
    pub fn parse_to_token_tree(script: &str) -> Result<String, ParseError> {
        let mut tree = vec![];
        for pair in JsParser::parse(Rule::script, script)? {
            tree.push(pair_to_string(pair, 0).join("\n"));
        }
        Ok(tree.join("\n"))
    }
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    let rule_name = format!(
        "{:?} => ({},{}) #{:?}",
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    );
    let string_pads = " ".repeat(level * TAB_WIDTH);
    tree.push(format!("{}{}", string_pads, rule_name));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn get_validation_error(message: &str, pair: &Pair<Rule>) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        pair.as_span(),
    )
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    let (line, column) = span.start_pos().line_col();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
        line,
        column,
    }
}

fn span_meta(start: &Meta, end: &Meta) -> Meta {
    Meta {
        start_index: start.start_index,
        end_index: end.end_index,
        line: start.line,
        column: start.column,
    }
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_break
            | Rule::kw_case
            | Rule::kw_catch
            | Rule::kw_continue
            | Rule::kw_debugger
            | Rule::kw_default
            | Rule::kw_delete
            | Rule::kw_do
            | Rule::kw_else
            | Rule::kw_finally
            | Rule::kw_for
            | Rule::kw_function
            | Rule::kw_if
            | Rule::kw_in
            | Rule::kw_instanceof
            | Rule::kw_new
            | Rule::kw_return
            | Rule::kw_switch
            | Rule::kw_this
            | Rule::kw_throw
            | Rule::kw_try
            | Rule::kw_typeof
            | Rule::kw_var
            | Rule::kw_void
            | Rule::kw_while
            | Rule::kw_null
            | Rule::kw_true
            | Rule::kw_false
    )
}

/// Children of `pair` with the structural keyword tokens dropped.
fn inner_pairs(pair: Pair<Rule>) -> Vec<Pair<Rule>> {
    pair.into_inner()
        .filter(|p| !is_keyword(p.as_rule()))
        .collect()
}

fn take_next<'i>(
    iter: &mut std::vec::IntoIter<Pair<'i, Rule>>,
    id: i32,
    parent: &Pair<'i, Rule>,
) -> Result<Pair<'i, Rule>, Error<Rule>> {
    match iter.next() {
        Some(p) => Ok(p),
        None => Err(get_unexpected_error(id, parent)),
    }
}

fn build_ast_from_script(file: &str, pair: Pair<Rule>) -> Result<ProgramData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut body = vec![];
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::EOI => { /* Do nothing */ }
            _ => body.push(build_ast_from_source_element(inner_pair)?),
        }
    }
    Ok(ProgramData {
        meta,
        file: file.to_string(),
        body,
    })
}

fn build_ast_from_source_element(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    if pair.as_rule() == Rule::function_declaration {
        Ok(StatementType::FunctionDeclaration(Rc::new(
            build_ast_from_function(pair)?,
        )))
    } else {
        build_ast_from_statement(pair)
    }
}

fn build_ast_from_source_elements(pairs: Vec<Pair<Rule>>) -> Result<Vec<StatementType>, Error<Rule>> {
    let mut body = vec![];
    for p in pairs {
        body.push(build_ast_from_source_element(p)?);
    }
    Ok(body)
}

fn build_ast_from_block(pair: Pair<Rule>) -> Result<BlockStatementData, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(BlockStatementData {
        meta,
        body: build_ast_from_source_elements(inner_pairs(pair))?,
    })
}

fn build_ast_from_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let rule = pair.as_rule();
    Ok(match rule {
        Rule::block => StatementType::BlockStatement(build_ast_from_block(pair)?),
        Rule::variable_statement => {
            let list = take_next(&mut inner_pairs(pair.clone()).into_iter(), 1, &pair)?;
            StatementType::VariableDeclaration(build_ast_from_variable_declaration_list(
                meta, list,
            )?)
        }
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::debugger_statement => StatementType::DebuggerStatement { meta },
        Rule::expression_statement => {
            let expr = take_next(&mut inner_pairs(pair.clone()).into_iter(), 2, &pair)?;
            StatementType::ExpressionStatement {
                meta,
                expression: Box::new(build_ast_from_expression(expr)?),
            }
        }
        Rule::if_statement => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let test = build_ast_from_expression(take_next(&mut iter, 3, &pair)?)?;
            let consequent = build_ast_from_statement(take_next(&mut iter, 4, &pair)?)?;
            let alternate = match iter.next() {
                Some(p) => Some(Box::new(build_ast_from_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::do_while_statement => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let body = build_ast_from_statement(take_next(&mut iter, 5, &pair)?)?;
            let test = build_ast_from_expression(take_next(&mut iter, 6, &pair)?)?;
            StatementType::DoWhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::while_statement => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let test = build_ast_from_expression(take_next(&mut iter, 7, &pair)?)?;
            let body = build_ast_from_statement(take_next(&mut iter, 8, &pair)?)?;
            StatementType::WhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::for_in_statement => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let left_pair = take_next(&mut iter, 9, &pair)?;
            let left = if left_pair.as_rule() == Rule::for_in_var {
                let var_meta = get_meta(&left_pair);
                let id_pair = take_next(&mut inner_pairs(left_pair.clone()).into_iter(), 10, &left_pair)?;
                let id = build_ast_from_identifier(id_pair);
                VariableDeclarationOrExpression::VariableDeclaration(VariableDeclarationData {
                    meta: var_meta.clone(),
                    declarations: vec![VariableDeclaratorData {
                        meta: var_meta,
                        id,
                        init: None,
                    }],
                })
            } else {
                let target = build_ast_from_expression(left_pair.clone())?;
                if !target.is_valid_simple_assignment_target() {
                    return Err(get_validation_error(
                        "Invalid left-hand side in for-in",
                        &left_pair,
                    ));
                }
                VariableDeclarationOrExpression::Expression(Box::new(target))
            };
            let right = build_ast_from_expression(take_next(&mut iter, 11, &pair)?)?;
            let body = build_ast_from_statement(take_next(&mut iter, 12, &pair)?)?;
            StatementType::ForInStatement(ForIteratorData {
                meta,
                left,
                right: Box::new(right),
                body: Box::new(body),
            })
        }
        Rule::for_statement => {
            let mut init = None;
            let mut test = None;
            let mut update = None;
            let mut body = None;
            for part in inner_pairs(pair.clone()) {
                match part.as_rule() {
                    Rule::for_init => {
                        let init_meta = get_meta(&part);
                        let inner = take_next(&mut inner_pairs(part.clone()).into_iter(), 13, &part)?;
                        init = Some(if inner.as_rule() == Rule::variable_declaration_list {
                            VariableDeclarationOrExpression::VariableDeclaration(
                                build_ast_from_variable_declaration_list(init_meta, inner)?,
                            )
                        } else {
                            VariableDeclarationOrExpression::Expression(Box::new(
                                build_ast_from_expression(inner)?,
                            ))
                        });
                    }
                    Rule::for_test => {
                        let inner = take_next(&mut inner_pairs(part.clone()).into_iter(), 14, &part)?;
                        test = Some(Box::new(build_ast_from_expression(inner)?));
                    }
                    Rule::for_update => {
                        let inner = take_next(&mut inner_pairs(part.clone()).into_iter(), 15, &part)?;
                        update = Some(Box::new(build_ast_from_expression(inner)?));
                    }
                    _ => body = Some(build_ast_from_statement(part)?),
                }
            }
            match body {
                Some(body) => StatementType::ForStatement {
                    meta,
                    init,
                    test,
                    update,
                    body: Box::new(body),
                },
                None => return Err(get_unexpected_error(16, &pair)),
            }
        }
        Rule::continue_statement => StatementType::ContinueStatement {
            meta,
            label: inner_pairs(pair).into_iter().next().map(build_ast_from_identifier),
        },
        Rule::break_statement => StatementType::BreakStatement {
            meta,
            label: inner_pairs(pair).into_iter().next().map(build_ast_from_identifier),
        },
        Rule::return_statement => StatementType::ReturnStatement {
            meta,
            argument: match inner_pairs(pair).into_iter().next() {
                Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
                None => None,
            },
        },
        Rule::throw_statement => {
            let expr = take_next(&mut inner_pairs(pair.clone()).into_iter(), 17, &pair)?;
            StatementType::ThrowStatement {
                meta,
                argument: Box::new(build_ast_from_expression(expr)?),
            }
        }
        Rule::switch_statement => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let discriminant = build_ast_from_expression(take_next(&mut iter, 18, &pair)?)?;
            let mut cases = vec![];
            for case_pair in iter {
                let case_meta = get_meta(&case_pair);
                let is_default = case_pair.as_rule() == Rule::default_clause;
                let mut case_iter = inner_pairs(case_pair).into_iter();
                let test = if is_default {
                    None
                } else {
                    match case_iter.next() {
                        Some(p) => Some(build_ast_from_expression(p)?),
                        None => return Err(get_unexpected_error(19, &pair)),
                    }
                };
                cases.push(SwitchCaseData {
                    meta: case_meta,
                    test,
                    consequent: build_ast_from_source_elements(case_iter.collect())?,
                });
            }
            StatementType::SwitchStatement {
                meta,
                discriminant: Box::new(discriminant),
                cases,
            }
        }
        Rule::labelled_statement => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let label = build_ast_from_identifier(take_next(&mut iter, 20, &pair)?);
            let body = build_ast_from_statement(take_next(&mut iter, 21, &pair)?)?;
            StatementType::LabeledStatement {
                meta,
                label,
                body: Box::new(body),
            }
        }
        Rule::try_statement => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let block = build_ast_from_block(take_next(&mut iter, 22, &pair)?)?;
            let mut handler = None;
            let mut finalizer = None;
            for clause in iter {
                match clause.as_rule() {
                    Rule::catch_clause => {
                        let clause_meta = get_meta(&clause);
                        let mut clause_iter = inner_pairs(clause.clone()).into_iter();
                        let param = build_ast_from_identifier(take_next(&mut clause_iter, 23, &clause)?);
                        let body = build_ast_from_block(take_next(&mut clause_iter, 24, &clause)?)?;
                        handler = Some(CatchClauseData {
                            meta: clause_meta,
                            param,
                            body,
                        });
                    }
                    Rule::finally_clause => {
                        let block_pair = take_next(&mut inner_pairs(clause.clone()).into_iter(), 25, &clause)?;
                        finalizer = Some(build_ast_from_block(block_pair)?);
                    }
                    _ => return Err(get_unexpected_error(26, &clause)),
                }
            }
            StatementType::TryStatement {
                meta,
                block,
                handler,
                finalizer,
            }
        }
        _ => return Err(get_unexpected_error(27, &pair)),
    })
}

fn build_ast_from_variable_declaration_list(
    meta: Meta,
    pair: Pair<Rule>,
) -> Result<VariableDeclarationData, Error<Rule>> {
    let mut declarations = vec![];
    for var_pair in inner_pairs(pair) {
        if var_pair.as_rule() != Rule::variable_declaration {
            return Err(get_unexpected_error(28, &var_pair));
        }
        let declarator_meta = get_meta(&var_pair);
        let mut iter = inner_pairs(var_pair.clone()).into_iter();
        let id = build_ast_from_identifier(take_next(&mut iter, 29, &var_pair)?);
        let init = match iter.next() {
            Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
            None => None,
        };
        declarations.push(VariableDeclaratorData {
            meta: declarator_meta,
            id,
            init,
        });
    }
    Ok(VariableDeclarationData { meta, declarations })
}

fn build_ast_from_identifier(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        meta: get_meta(&pair),
        name: pair.as_str().to_string(),
    }
}

fn build_ast_from_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for part in inner_pairs(pair.clone()) {
        match part.as_rule() {
            Rule::identifier => id = Some(build_ast_from_identifier(part)),
            Rule::formal_parameters => {
                params = inner_pairs(part)
                    .into_iter()
                    .map(build_ast_from_identifier)
                    .collect()
            }
            Rule::function_body => body = Some(build_ast_from_function_body(part)?),
            _ => return Err(get_unexpected_error(30, &part)),
        }
    }
    match body {
        Some(body) => Ok(FunctionData {
            meta,
            id,
            params,
            body,
        }),
        None => Err(get_unexpected_error(31, &pair)),
    }
}

fn build_ast_from_function_body(pair: Pair<Rule>) -> Result<FunctionBodyData, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(FunctionBodyData {
        meta,
        body: build_ast_from_source_elements(inner_pairs(pair))?,
    })
}

fn build_ast_from_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    match pair.as_rule() {
        Rule::expression => {
            let mut expressions = vec![];
            for p in inner_pairs(pair) {
                expressions.push(build_ast_from_expression(p)?);
            }
            if expressions.len() == 1 {
                Ok(expressions.remove(0))
            } else {
                Ok(ExpressionType::SequenceExpression { meta, expressions })
            }
        }
        Rule::assignment_expression => build_ast_from_assignment_expression(pair),
        Rule::conditional_expression => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let test = build_ast_from_expression(take_next(&mut iter, 32, &pair)?)?;
            match iter.next() {
                None => Ok(test),
                Some(consequent) => {
                    let consequent = build_ast_from_expression(consequent)?;
                    let alternate = build_ast_from_expression(take_next(&mut iter, 33, &pair)?)?;
                    Ok(ExpressionType::ConditionalExpression {
                        meta,
                        test: Box::new(test),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                    })
                }
            }
        }
        Rule::logical_or_expression
        | Rule::logical_and_expression
        | Rule::bitwise_or_expression
        | Rule::bitwise_xor_expression
        | Rule::bitwise_and_expression
        | Rule::equality_expression
        | Rule::relational_expression
        | Rule::shift_expression
        | Rule::additive_expression
        | Rule::multiplicative_expression => build_ast_from_binary_expression(pair),
        Rule::unary_expression => build_ast_from_unary_expression(pair),
        Rule::postfix_expression => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let argument_pair = take_next(&mut iter, 34, &pair)?;
            let argument = build_ast_from_expression(argument_pair.clone())?;
            match iter.next() {
                None => Ok(argument),
                Some(op) => {
                    if !argument.is_valid_simple_assignment_target() {
                        return Err(get_validation_error(
                            "Invalid left-hand side expression in postfix operation",
                            &argument_pair,
                        ));
                    }
                    Ok(ExpressionType::UpdateExpression {
                        meta,
                        operator: get_update_operator(&op)?,
                        argument: Box::new(argument),
                        prefix: false,
                    })
                }
            }
        }
        Rule::left_hand_side_expression | Rule::member_expression => {
            let mut iter = pair.clone().into_inner();
            let head = match iter.next() {
                Some(p) => p,
                None => return Err(get_unexpected_error(35, &pair)),
            };
            let mut object = build_ast_from_expression(head)?;
            for suffix in iter {
                object = apply_suffix(object, suffix)?;
            }
            Ok(object)
        }
        Rule::new_member_expression => {
            let mut iter = inner_pairs(pair.clone()).into_iter();
            let callee = build_ast_from_expression(take_next(&mut iter, 36, &pair)?)?;
            let arguments = match iter.next() {
                Some(args) => build_ast_from_arguments(args)?,
                None => vec![],
            };
            Ok(ExpressionType::NewExpression {
                meta,
                callee: Box::new(callee),
                arguments,
            })
        }
        Rule::primary_expression => {
            let inner = take_next(&mut pair.clone().into_inner().collect::<Vec<_>>().into_iter(), 37, &pair)?;
            if inner.as_rule() == Rule::kw_this {
                Ok(ExpressionType::ThisExpression { meta })
            } else {
                build_ast_from_expression(inner)
            }
        }
        Rule::parenthesized_expression => {
            let inner = take_next(&mut inner_pairs(pair.clone()).into_iter(), 38, &pair)?;
            build_ast_from_expression(inner)
        }
        Rule::literal => build_ast_from_literal(pair),
        Rule::identifier => Ok(ExpressionType::Identifier(build_ast_from_identifier(pair))),
        Rule::array_literal => {
            let mut elements = vec![];
            let mut last_was_element = false;
            for p in pair.into_inner() {
                if p.as_rule() == Rule::array_comma {
                    if !last_was_element {
                        elements.push(None);
                    }
                    last_was_element = false;
                } else {
                    if last_was_element {
                        return Err(get_validation_error("Expected ',' in array literal", &p));
                    }
                    elements.push(Some(build_ast_from_expression(p)?));
                    last_was_element = true;
                }
            }
            Ok(ExpressionType::ArrayExpression { meta, elements })
        }
        Rule::object_literal => {
            let mut properties = vec![];
            for p in pair.into_inner() {
                properties.push(build_ast_from_property(p)?);
            }
            Ok(ExpressionType::ObjectExpression { meta, properties })
        }
        Rule::function_expression => Ok(ExpressionType::FunctionExpression(Rc::new(
            build_ast_from_function(pair)?,
        ))),
        _ => Err(get_unexpected_error(39, &pair)),
    }
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut iter = inner_pairs(pair.clone()).into_iter();
    let left_pair = take_next(&mut iter, 40, &pair)?;
    let left = build_ast_from_expression(left_pair.clone())?;
    match iter.next() {
        None => Ok(left),
        Some(op) => {
            if !left.is_valid_simple_assignment_target() {
                return Err(get_validation_error(
                    "Invalid left-hand side in assignment",
                    &left_pair,
                ));
            }
            let operator = match op.as_str() {
                "=" => AssignmentOperator::Equals,
                "+=" => AssignmentOperator::AddEquals,
                "-=" => AssignmentOperator::SubtractEquals,
                "*=" => AssignmentOperator::MultiplyEquals,
                "/=" => AssignmentOperator::DivideEquals,
                "%=" => AssignmentOperator::ModuloEquals,
                "<<=" => AssignmentOperator::BitwiseLeftShiftEquals,
                ">>=" => AssignmentOperator::BitwiseRightShiftEquals,
                ">>>=" => AssignmentOperator::BitwiseUnsignedRightShiftEquals,
                "|=" => AssignmentOperator::BitwiseOrEquals,
                "&=" => AssignmentOperator::BitwiseAndEquals,
                "^=" => AssignmentOperator::BitwiseXorEquals,
                _ => return Err(get_unexpected_error(41, &op)),
            };
            let right = build_ast_from_expression(take_next(&mut iter, 42, &pair)?)?;
            Ok(ExpressionType::AssignmentExpression {
                meta,
                operator,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
    }
}

fn build_ast_from_binary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let mut iter = pair.clone().into_inner();
    let first = match iter.next() {
        Some(p) => p,
        None => return Err(get_unexpected_error(43, &pair)),
    };
    let mut left = build_ast_from_expression(first)?;
    while let Some(op) = iter.next() {
        let right = match iter.next() {
            Some(p) => build_ast_from_expression(p)?,
            None => return Err(get_unexpected_error(44, &op)),
        };
        let meta = span_meta(left.get_meta(), right.get_meta());
        left = match op.as_rule() {
            Rule::logical_or_operator | Rule::logical_and_operator => {
                ExpressionType::LogicalExpression {
                    meta,
                    operator: if op.as_rule() == Rule::logical_or_operator {
                        LogicalOperator::Or
                    } else {
                        LogicalOperator::And
                    },
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            _ => ExpressionType::BinaryExpression {
                meta,
                operator: get_binary_operator(&op)?,
                left: Box::new(left),
                right: Box::new(right),
            },
        };
    }
    Ok(left)
}

fn get_binary_operator(op: &Pair<Rule>) -> Result<BinaryOperator, Error<Rule>> {
    Ok(match op.as_str() {
        "==" => BinaryOperator::LooselyEqual,
        "!=" => BinaryOperator::LooselyUnequal,
        "===" => BinaryOperator::StrictlyEqual,
        "!==" => BinaryOperator::StrictlyUnequal,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanEqual,
        "<<" => BinaryOperator::BitwiseLeftShift,
        ">>" => BinaryOperator::BitwiseRightShift,
        ">>>" => BinaryOperator::BitwiseUnsignedRightShift,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        "|" => BinaryOperator::BitwiseOr,
        "&" => BinaryOperator::BitwiseAnd,
        "^" => BinaryOperator::BitwiseXor,
        "in" => BinaryOperator::In,
        "instanceof" => BinaryOperator::InstanceOf,
        _ => return Err(get_unexpected_error(45, op)),
    })
}

fn get_update_operator(op: &Pair<Rule>) -> Result<UpdateOperator, Error<Rule>> {
    match op.as_str() {
        "++" => Ok(UpdateOperator::PlusPlus),
        "--" => Ok(UpdateOperator::MinusMinus),
        _ => Err(get_unexpected_error(46, op)),
    }
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut iter = inner_pairs(pair.clone()).into_iter();
    let first = take_next(&mut iter, 47, &pair)?;
    if first.as_rule() != Rule::unary_operator {
        return build_ast_from_expression(first);
    }
    let argument_pair = take_next(&mut iter, 48, &pair)?;
    let argument = build_ast_from_expression(argument_pair.clone())?;
    let operator = match first.as_str() {
        "++" | "--" => {
            if !argument.is_valid_simple_assignment_target() {
                return Err(get_validation_error(
                    "Invalid left-hand side expression in prefix operation",
                    &argument_pair,
                ));
            }
            return Ok(ExpressionType::UpdateExpression {
                meta,
                operator: get_update_operator(&first)?,
                argument: Box::new(argument),
                prefix: true,
            });
        }
        "delete" => UnaryOperator::Delete,
        "void" => UnaryOperator::Void,
        "typeof" => UnaryOperator::TypeOf,
        "+" => UnaryOperator::Plus,
        "-" => UnaryOperator::Minus,
        "~" => UnaryOperator::BitwiseNot,
        "!" => UnaryOperator::LogicalNot,
        _ => return Err(get_unexpected_error(49, &first)),
    };
    Ok(ExpressionType::UnaryExpression {
        meta,
        operator,
        argument: Box::new(argument),
    })
}

fn apply_suffix(object: ExpressionType, suffix: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let suffix_meta = get_meta(&suffix);
    let meta = span_meta(object.get_meta(), &suffix_meta);
    Ok(match suffix.as_rule() {
        Rule::arguments => ExpressionType::CallExpression {
            meta,
            callee: Box::new(object),
            arguments: build_ast_from_arguments(suffix)?,
        },
        Rule::property_access => {
            let name = take_next(&mut inner_pairs(suffix.clone()).into_iter(), 50, &suffix)?;
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                meta,
                object: Box::new(object),
                property: build_ast_from_identifier(name),
            })
        }
        Rule::computed_access => {
            let property = take_next(&mut inner_pairs(suffix.clone()).into_iter(), 51, &suffix)?;
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                meta,
                object: Box::new(object),
                property: Box::new(build_ast_from_expression(property)?),
            })
        }
        _ => return Err(get_unexpected_error(52, &suffix)),
    })
}

fn build_ast_from_arguments(pair: Pair<Rule>) -> Result<Vec<ExpressionType>, Error<Rule>> {
    let mut arguments = vec![];
    for p in inner_pairs(pair) {
        arguments.push(build_ast_from_expression(p)?);
    }
    Ok(arguments)
}

fn build_ast_from_literal(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let inner = take_next(&mut pair.clone().into_inner().collect::<Vec<_>>().into_iter(), 53, &pair)?;
    let value = match inner.as_rule() {
        Rule::kw_null => LiteralType::NullLiteral,
        Rule::kw_true => LiteralType::BooleanLiteral(true),
        Rule::kw_false => LiteralType::BooleanLiteral(false),
        Rule::numeric_literal => LiteralType::NumberLiteral(parse_numeric_literal(&inner)?),
        Rule::string_literal => LiteralType::StringLiteral(parse_string_literal(&inner)?),
        _ => return Err(get_unexpected_error(54, &inner)),
    };
    Ok(ExpressionType::Literal(LiteralData { meta, value }))
}

fn build_ast_from_property(pair: Pair<Rule>) -> Result<PropertyData, Error<Rule>> {
    let meta = get_meta(&pair);
    let rule = pair.as_rule();
    let mut iter = inner_pairs(pair.clone()).into_iter();
    let key = get_property_name(take_next(&mut iter, 55, &pair)?)?;
    let kind = match rule {
        Rule::property_init => {
            PropertyKind::Init(build_ast_from_expression(take_next(&mut iter, 56, &pair)?)?)
        }
        Rule::property_getter => {
            let body = build_ast_from_function_body(take_next(&mut iter, 57, &pair)?)?;
            PropertyKind::Get(Rc::new(FunctionData {
                meta: meta.clone(),
                id: None,
                params: vec![],
                body,
            }))
        }
        Rule::property_setter => {
            let param = build_ast_from_identifier(take_next(&mut iter, 58, &pair)?);
            let body = build_ast_from_function_body(take_next(&mut iter, 59, &pair)?)?;
            PropertyKind::Set(Rc::new(FunctionData {
                meta: meta.clone(),
                id: None,
                params: vec![param],
                body,
            }))
        }
        _ => return Err(get_unexpected_error(60, &pair)),
    };
    Ok(PropertyData { meta, key, kind })
}

fn get_property_name(pair: Pair<Rule>) -> Result<String, Error<Rule>> {
    let inner = take_next(&mut pair.clone().into_inner().collect::<Vec<_>>().into_iter(), 61, &pair)?;
    match inner.as_rule() {
        Rule::string_literal => parse_string_literal(&inner),
        Rule::numeric_literal => Ok(number_to_string(parse_numeric_literal(&inner)?)),
        _ => Ok(inner.as_str().to_string()),
    }
}

fn parse_numeric_literal(pair: &Pair<Rule>) -> Result<f64, Error<Rule>> {
    let text = pair.as_str();
    if text.starts_with("0x") || text.starts_with("0X") {
        let mut value = 0f64;
        for c in text[2..].chars() {
            match c.to_digit(16) {
                Some(d) => value = value * 16.0 + d as f64,
                None => return Err(get_unexpected_error(62, pair)),
            }
        }
        Ok(value)
    } else {
        text.parse::<f64>()
            .map_err(|_| get_validation_error("Invalid numeric literal", pair))
    }
}

fn parse_string_literal(pair: &Pair<Rule>) -> Result<String, Error<Rule>> {
    let text = pair.as_str();
    if text.len() < 2 {
        return Err(get_unexpected_error(63, pair));
    }
    unescape_string(&text[1..text.len() - 1])
        .map_err(|message| get_validation_error(&message, pair))
}

fn read_hex(chars: &mut std::iter::Peekable<std::str::Chars>, count: usize) -> Result<u32, String> {
    let mut value = 0;
    for _ in 0..count {
        match chars.next().and_then(|c| c.to_digit(16)) {
            Some(d) => value = value * 16 + d,
            None => return Err("Invalid hexadecimal escape sequence".to_string()),
        }
    }
    Ok(value)
}

/// Resolves the escape sequences of a string literal body.
pub(crate) fn unescape_string(raw: &str) -> Result<String, String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => return Err("Unterminated escape sequence".to_string()),
        };
        match escaped {
            'n' => result.push('\n'),
            't' => result.push('\t'),
            'r' => result.push('\r'),
            'b' => result.push('\u{0008}'),
            'f' => result.push('\u{000C}'),
            'v' => result.push('\u{000B}'),
            '0' if !matches!(chars.peek(), Some(d) if d.is_ascii_digit()) => result.push('\0'),
            'x' => {
                let code = read_hex(&mut chars, 2)?;
                result.push(std::char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'u' => {
                let code = read_hex(&mut chars, 4)?;
                if (0xD800..0xDC00).contains(&code) {
                    let mut lookahead = chars.clone();
                    let low = if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                        read_hex(&mut lookahead, 4).ok()
                    } else {
                        None
                    };
                    match low {
                        Some(low) if (0xDC00..0xE000).contains(&low) => {
                            chars = lookahead;
                            let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                            result.push(std::char::from_u32(combined).unwrap_or('\u{FFFD}'));
                        }
                        _ => result.push('\u{FFFD}'),
                    }
                } else {
                    result.push(std::char::from_u32(code).unwrap_or('\u{FFFD}'));
                }
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => result.push(other),
        }
    }
    Ok(result)
}
