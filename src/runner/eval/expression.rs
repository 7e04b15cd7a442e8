//! Expression rules.
//!
//! Every operator short-circuits on an Unknown operand: the result is Unknown and the
//! operation has no side effects. Native failures (a TypeError from `in` on a primitive, a
//! ReferenceError for an undeclared name) are reported and the expression yields Unknown.

use std::cmp::Ordering;

use crate::parser::ast::{
    BinaryOperator, ExpressionType, HasMeta, LiteralType, LogicalOperator, MemberExpressionType,
    PropertyKind, UnaryOperator, UpdateOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object_property::PropertyDescriptorSetter;
use crate::runner::ds::operations::lex_env::{
    delete_binding, get_binding_value, get_identifier_reference, set_mutable_binding,
};
use crate::runner::ds::operations::object::{define_own_property, delete, get, get_v, put};
use crate::runner::ds::operations::test_and_comparison::{
    abstract_equality, abstract_relational_comparison, strict_equality,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, to_boolean, to_int32, to_number, to_primitive, to_string, to_uint32,
    PreferredType,
};
use crate::runner::ds::value::{any_unknown, JsValue};
use crate::runner::eval::ambiguous::ambiguous_pass;
use crate::runner::eval::function::create_function_object;
use crate::runner::eval::rule_processor::{process_expression, NodeKind, NodeRef};
use crate::runner::eval::types::{Completion, EvalResult, Reference, ReferenceBase, ReferenceResult};
use crate::runner::plugin::types::EvalContext;

/// Resolves `name` against the running lexical environment.
pub fn resolve_binding(ctx: &EvalContext, name: &str) -> Reference {
    get_identifier_reference(&ctx.realm, Some(ctx.lex_env()), name)
}

/// `GetValue`.
pub fn get_value(ctx: &mut EvalContext, reference: &Reference) -> Result<JsValue, JErrorType> {
    match &reference.base {
        ReferenceBase::Value(base) => get_v(ctx, base, &reference.referenced_name),
        ReferenceBase::Environment(env) => {
            get_binding_value(ctx, *env, &reference.referenced_name)
        }
        ReferenceBase::Unresolvable => Err(JErrorType::ReferenceError(format!(
            "{} is not defined",
            reference.referenced_name
        ))),
        ReferenceBase::Unknown => Ok(JsValue::Unknown),
    }
}

/// `PutValue`. Assignments to undeclared names create a global property.
pub fn put_value(
    ctx: &mut EvalContext,
    reference: &Reference,
    value: JsValue,
) -> Result<(), JErrorType> {
    let name = &reference.referenced_name;
    match &reference.base {
        ReferenceBase::Unresolvable => {
            let global = ctx.realm.global_object();
            put(ctx, global, name, value, false)
        }
        ReferenceBase::Environment(env) => set_mutable_binding(ctx, *env, name, value),
        ReferenceBase::Value(JsValue::Object(o)) => put(ctx, *o, name, value, false),
        ReferenceBase::Value(JsValue::Undefined | JsValue::Null) => Err(JErrorType::TypeError(
            format!("Cannot set property '{}' of {}", name, reference.get_this_value()),
        )),
        // Writes to primitives and unknown bases are lost.
        ReferenceBase::Value(_) | ReferenceBase::Unknown => Ok(()),
    }
}

/// Evaluates a member expression to a property reference.
pub fn member_reference(member: &MemberExpressionType, ctx: &mut EvalContext) -> ReferenceResult {
    let (object, name) = match member {
        MemberExpressionType::SimpleMemberExpression {
            object, property, ..
        } => {
            let base = process_expression(object, ctx)?;
            if base.is_abrupt() {
                return Ok(Err(base));
            }
            (base.get_value(), Some(property.name.clone()))
        }
        MemberExpressionType::ComputedMemberExpression {
            object, property, ..
        } => {
            let base = process_expression(object, ctx)?;
            if base.is_abrupt() {
                return Ok(Err(base));
            }
            let key = process_expression(property, ctx)?;
            if key.is_abrupt() {
                return Ok(Err(key));
            }
            let name = match to_string(ctx, &key.get_value()) {
                Ok(name) => name,
                Err(e) => {
                    ctx.report_error(&e);
                    None
                }
            };
            (base.get_value(), name)
        }
    };
    if object.is_undefined_or_null() {
        ctx.report_error(&JErrorType::TypeError(format!(
            "Cannot read property '{}' of {}",
            name.as_deref().unwrap_or("?"),
            object
        )));
        return Ok(Ok(Reference::unknown()));
    }
    Ok(Ok(match name {
        Some(name) => Reference::property(object, name),
        None => Reference::unknown(),
    }))
}

pub fn process_literal(node: NodeRef<'_>, _ctx: &mut EvalContext) -> EvalResult {
    let literal = match node {
        NodeRef::Expression(ExpressionType::Literal(literal)) => literal,
        _ => return Err(node.malformed(NodeKind::Literal)),
    };
    let value = match &literal.value {
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::NumberLiteral(n) => JsValue::Number(*n),
    };
    Ok(Completion::normal_with_value(value))
}

pub fn process_identifier(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let id = match node {
        NodeRef::Expression(ExpressionType::Identifier(id)) => id,
        _ => return Err(node.malformed(NodeKind::Identifier)),
    };
    let reference = resolve_binding(ctx, &id.name);
    let value = recoverable!(ctx, get_value(ctx, &reference));
    Ok(Completion::normal_with_value(value))
}

pub fn process_this_expression(_node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    Ok(Completion::normal_with_value(ctx.this_binding()))
}

pub fn process_array_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let elements = match node {
        NodeRef::Expression(ExpressionType::ArrayExpression { elements, .. }) => elements,
        _ => return Err(node.malformed(NodeKind::ArrayExpression)),
    };
    let mut values = Vec::with_capacity(elements.len());
    let mut holes = vec![];
    for (index, element) in elements.iter().enumerate() {
        match element {
            Some(element) => values.push(value!(ctx, element)),
            None => {
                holes.push(index);
                values.push(JsValue::Undefined);
            }
        }
    }
    let array = ctx.realm.create_array(values);
    for index in holes {
        recoverable!(ctx, delete(ctx, array, &index.to_string(), false));
    }
    Ok(Completion::normal_with_value(JsValue::Object(array)))
}

pub fn process_object_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let properties = match node {
        NodeRef::Expression(ExpressionType::ObjectExpression { properties, .. }) => properties,
        _ => return Err(node.malformed(NodeKind::ObjectExpression)),
    };
    let object = ctx.realm.create_ordinary_object();
    for property in properties {
        let desc = match &property.kind {
            PropertyKind::Init(expr) => {
                PropertyDescriptorSetter::new_default_data(value!(ctx, expr))
            }
            PropertyKind::Get(f) => {
                let scope = ctx.lex_env();
                let getter = create_function_object(ctx, f, scope);
                PropertyDescriptorSetter::empty()
                    .with_get(Some(getter))
                    .with_enumerable(true)
                    .with_configurable(true)
            }
            PropertyKind::Set(f) => {
                let scope = ctx.lex_env();
                let setter = create_function_object(ctx, f, scope);
                PropertyDescriptorSetter::empty()
                    .with_set(Some(setter))
                    .with_enumerable(true)
                    .with_configurable(true)
            }
        };
        recoverable!(
            ctx,
            define_own_property(ctx, object, &property.key, desc, false)
        );
    }
    Ok(Completion::normal_with_value(JsValue::Object(object)))
}

pub fn process_unary_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (operator, argument) = match node {
        NodeRef::Expression(ExpressionType::UnaryExpression {
            operator, argument, ..
        }) => (*operator, argument),
        _ => return Err(node.malformed(NodeKind::UnaryExpression)),
    };
    let value = match operator {
        UnaryOperator::Delete => return evaluate_delete(argument, ctx),
        UnaryOperator::TypeOf => {
            let value = if argument.is_valid_simple_assignment_target() {
                let reference = reference!(ctx, argument);
                if reference.is_unresolvable() {
                    return Ok(Completion::normal_with_value(JsValue::from_str("undefined")));
                }
                recoverable!(ctx, get_value(ctx, &reference))
            } else {
                value!(ctx, argument)
            };
            match get_type(&ctx.realm, &value) {
                Some(t) => JsValue::from_str(t),
                None => JsValue::Unknown,
            }
        }
        UnaryOperator::Void => {
            value!(ctx, argument);
            JsValue::Undefined
        }
        UnaryOperator::LogicalNot => {
            let value = value!(ctx, argument);
            match to_boolean(&value) {
                Some(b) => JsValue::Boolean(!b),
                None => JsValue::Unknown,
            }
        }
        UnaryOperator::Minus | UnaryOperator::Plus | UnaryOperator::BitwiseNot => {
            let value = value!(ctx, argument);
            match recoverable!(ctx, to_number(ctx, &value)) {
                None => JsValue::Unknown,
                Some(n) => JsValue::Number(match operator {
                    UnaryOperator::Minus => -n,
                    UnaryOperator::Plus => n,
                    _ => !to_int32(n) as f64,
                }),
            }
        }
    };
    Ok(Completion::normal_with_value(value))
}

fn evaluate_delete(argument: &ExpressionType, ctx: &mut EvalContext) -> EvalResult {
    if !argument.is_valid_simple_assignment_target() {
        value!(ctx, argument);
        return Ok(Completion::normal_with_value(JsValue::Boolean(true)));
    }
    let reference = reference!(ctx, argument);
    let name = reference.referenced_name.clone();
    let deleted = match &reference.base {
        ReferenceBase::Unresolvable => JsValue::Boolean(true),
        ReferenceBase::Unknown | ReferenceBase::Value(JsValue::Unknown) => JsValue::Unknown,
        ReferenceBase::Value(JsValue::Object(o)) => {
            let o = *o;
            if ctx.is_ambiguous_write(ctx.realm.get_object(o).created_ambiguity) {
                // The property may or may not still exist afterwards.
                if ctx.realm.get_object(o).has_own_property(&name) {
                    recoverable!(ctx, put(ctx, o, &name, JsValue::Unknown, false));
                }
                JsValue::Unknown
            } else {
                JsValue::Boolean(recoverable!(ctx, delete(ctx, o, &name, false)))
            }
        }
        ReferenceBase::Value(_) => JsValue::Boolean(true),
        ReferenceBase::Environment(env) => {
            JsValue::Boolean(recoverable!(ctx, delete_binding(ctx, *env, &name)))
        }
    };
    Ok(Completion::normal_with_value(deleted))
}

pub fn process_update_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (operator, argument, prefix) = match node {
        NodeRef::Expression(ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        }) => (*operator, argument, *prefix),
        _ => return Err(node.malformed(NodeKind::UpdateExpression)),
    };
    let reference = reference!(ctx, argument);
    let old_value = recoverable!(ctx, get_value(ctx, &reference));
    let old = match recoverable!(ctx, to_number(ctx, &old_value)) {
        Some(n) => n,
        None => return Ok(Completion::normal_with_value(JsValue::Unknown)),
    };
    let new = match operator {
        UpdateOperator::PlusPlus => old + 1.0,
        UpdateOperator::MinusMinus => old - 1.0,
    };
    recoverable!(ctx, put_value(ctx, &reference, JsValue::Number(new)));
    Ok(Completion::normal_with_value(JsValue::Number(if prefix {
        new
    } else {
        old
    })))
}

pub fn process_binary_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (operator, left, right) = match node {
        NodeRef::Expression(ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        }) => (*operator, left, right),
        _ => return Err(node.malformed(NodeKind::BinaryExpression)),
    };
    let lval = value!(ctx, left);
    let rval = value!(ctx, right);
    let value = recoverable!(ctx, apply_binary_operator(ctx, operator, &lval, &rval));
    Ok(Completion::normal_with_value(value))
}

/// Applies a binary operator to two evaluated operands.
pub fn apply_binary_operator(
    ctx: &mut EvalContext,
    operator: BinaryOperator,
    lval: &JsValue,
    rval: &JsValue,
) -> Result<JsValue, JErrorType> {
    if any_unknown([lval, rval]) {
        return Ok(JsValue::Unknown);
    }
    let from_bool = |b: Option<bool>| match b {
        Some(b) => JsValue::Boolean(b),
        None => JsValue::Unknown,
    };
    Ok(match operator {
        BinaryOperator::StrictlyEqual => from_bool(strict_equality(lval, rval)),
        BinaryOperator::StrictlyUnequal => from_bool(strict_equality(lval, rval).map(|b| !b)),
        BinaryOperator::LooselyEqual => from_bool(abstract_equality(ctx, lval, rval)?),
        BinaryOperator::LooselyUnequal => {
            from_bool(abstract_equality(ctx, lval, rval)?.map(|b| !b))
        }
        BinaryOperator::LessThan
        | BinaryOperator::LessThanEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanEqual => {
            match abstract_relational_comparison(ctx, lval, rval)? {
                None => JsValue::Unknown,
                Some(None) => JsValue::Boolean(false),
                Some(Some(ordering)) => JsValue::Boolean(match operator {
                    BinaryOperator::LessThan => ordering == Ordering::Less,
                    BinaryOperator::LessThanEqual => ordering != Ordering::Greater,
                    BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }),
            }
        }
        BinaryOperator::Add => {
            let lprim = to_primitive(ctx, lval, PreferredType::Default)?;
            let rprim = to_primitive(ctx, rval, PreferredType::Default)?;
            if any_unknown([&lprim, &rprim]) {
                return Ok(JsValue::Unknown);
            }
            if matches!(lprim, JsValue::String(_)) || matches!(rprim, JsValue::String(_)) {
                match (to_string(ctx, &lprim)?, to_string(ctx, &rprim)?) {
                    (Some(l), Some(r)) => JsValue::String(l + &r),
                    _ => JsValue::Unknown,
                }
            } else {
                numeric(ctx, &lprim, &rprim, |l, r| l + r)?
            }
        }
        BinaryOperator::Subtract => numeric(ctx, lval, rval, |l, r| l - r)?,
        BinaryOperator::Multiply => numeric(ctx, lval, rval, |l, r| l * r)?,
        BinaryOperator::Divide => numeric(ctx, lval, rval, |l, r| l / r)?,
        BinaryOperator::Modulo => numeric(ctx, lval, rval, |l, r| l % r)?,
        BinaryOperator::BitwiseLeftShift => numeric(ctx, lval, rval, |l, r| {
            to_int32(l).wrapping_shl(to_uint32(r) & 0x1f) as f64
        })?,
        BinaryOperator::BitwiseRightShift => numeric(ctx, lval, rval, |l, r| {
            to_int32(l).wrapping_shr(to_uint32(r) & 0x1f) as f64
        })?,
        BinaryOperator::BitwiseUnsignedRightShift => numeric(ctx, lval, rval, |l, r| {
            to_uint32(l).wrapping_shr(to_uint32(r) & 0x1f) as f64
        })?,
        BinaryOperator::BitwiseAnd => {
            numeric(ctx, lval, rval, |l, r| (to_int32(l) & to_int32(r)) as f64)?
        }
        BinaryOperator::BitwiseOr => {
            numeric(ctx, lval, rval, |l, r| (to_int32(l) | to_int32(r)) as f64)?
        }
        BinaryOperator::BitwiseXor => {
            numeric(ctx, lval, rval, |l, r| (to_int32(l) ^ to_int32(r)) as f64)?
        }
        BinaryOperator::In => {
            let o = match rval {
                JsValue::Object(o) => *o,
                _ => {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        lval, rval
                    )))
                }
            };
            match to_string(ctx, lval)? {
                Some(name) => JsValue::Boolean(ctx.realm.has_property(o, &name)),
                None => JsValue::Unknown,
            }
        }
        BinaryOperator::InstanceOf => {
            let f = match rval {
                JsValue::Object(f) if ctx.realm.get_object(*f).is_callable() => *f,
                _ => {
                    return Err(JErrorType::TypeError(
                        "Right-hand side of 'instanceof' is not callable".to_string(),
                    ))
                }
            };
            let o = match lval {
                JsValue::Object(o) => *o,
                _ => return Ok(JsValue::Boolean(false)),
            };
            match get(ctx, f, "prototype")? {
                JsValue::Object(proto) => JsValue::Boolean(ctx.realm.inherits_from(o, proto)),
                JsValue::Unknown => JsValue::Unknown,
                _ => {
                    return Err(JErrorType::TypeError(
                        "Function has non-object prototype in instanceof check".to_string(),
                    ))
                }
            }
        }
    })
}

fn numeric<F>(
    ctx: &mut EvalContext,
    lval: &JsValue,
    rval: &JsValue,
    op: F,
) -> Result<JsValue, JErrorType>
where
    F: FnOnce(f64, f64) -> f64,
{
    Ok(match (to_number(ctx, lval)?, to_number(ctx, rval)?) {
        (Some(l), Some(r)) => JsValue::Number(op(l, r)),
        _ => JsValue::Unknown,
    })
}

pub fn process_assignment_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (operator, left, right) = match node {
        NodeRef::Expression(ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        }) => (*operator, left, right),
        _ => return Err(node.malformed(NodeKind::AssignmentExpression)),
    };
    let reference = reference!(ctx, left);
    let value = match operator.binary_operator() {
        None => value!(ctx, right),
        Some(binary) => {
            let old = recoverable!(ctx, get_value(ctx, &reference));
            let rval = value!(ctx, right);
            recoverable!(ctx, apply_binary_operator(ctx, binary, &old, &rval))
        }
    };
    recoverable!(ctx, put_value(ctx, &reference, value.clone()));
    Ok(Completion::normal_with_value(value))
}

pub fn process_logical_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (operator, left, right) = match node {
        NodeRef::Expression(ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        }) => (*operator, left, right),
        _ => return Err(node.malformed(NodeKind::LogicalExpression)),
    };
    let lval = value!(ctx, left);
    let short_circuit = match to_boolean(&lval) {
        Some(b) => match operator {
            LogicalOperator::And => !b,
            LogicalOperator::Or => b,
        },
        None => {
            ctx.runtime.mark_unknown(left.get_meta());
            ambiguous_pass(ctx, node.meta(), |ctx| process_expression(right, ctx))?;
            return Ok(Completion::normal_with_value(JsValue::Unknown));
        }
    };
    if short_circuit {
        Ok(Completion::normal_with_value(lval))
    } else {
        let rval = value!(ctx, right);
        Ok(Completion::normal_with_value(rval))
    }
}

pub fn process_conditional_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (test, consequent, alternate) = match node {
        NodeRef::Expression(ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        }) => (test, consequent, alternate),
        _ => return Err(node.malformed(NodeKind::ConditionalExpression)),
    };
    let test_value = value!(ctx, test);
    match to_boolean(&test_value) {
        Some(true) => process_expression(consequent, ctx),
        Some(false) => process_expression(alternate, ctx),
        None => {
            ctx.runtime.mark_unknown(test.get_meta());
            ambiguous_pass(ctx, node.meta(), |ctx| {
                process_expression(consequent, ctx)?;
                process_expression(alternate, ctx)
            })?;
            Ok(Completion::normal_with_value(JsValue::Unknown))
        }
    }
}

pub fn process_member_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let member = match node {
        NodeRef::Expression(ExpressionType::MemberExpression(member)) => member,
        _ => return Err(node.malformed(NodeKind::MemberExpression)),
    };
    let reference = match member_reference(member, ctx)? {
        Ok(reference) => reference,
        Err(abrupt) => return Ok(abrupt),
    };
    let value = recoverable!(ctx, get_value(ctx, &reference));
    Ok(Completion::normal_with_value(value))
}

pub fn process_sequence_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let expressions = match node {
        NodeRef::Expression(ExpressionType::SequenceExpression { expressions, .. }) => expressions,
        _ => return Err(node.malformed(NodeKind::SequenceExpression)),
    };
    let mut value = JsValue::Undefined;
    for expr in expressions {
        value = value!(ctx, expr);
    }
    Ok(Completion::normal_with_value(value))
}
