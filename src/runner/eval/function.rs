//! Programs, function objects, calls and `new`.

use std::rc::Rc;

use tracing::debug;

use crate::parser::ast::{ExpressionType, FunctionData, MemberExpressionType, StatementType};
use crate::parser::static_semantics::{function_declarations, var_declared_names};
use crate::runner::ds::env_record::{EnvId, LexEnvironment};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::function_object::{FunctionKind, ScriptFunction};
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::lex_env::{
    create_mutable_binding, has_binding, implicit_this_value, set_mutable_binding,
};
use crate::runner::ds::operations::object::{define_own_property, get};
use crate::runner::ds::operations::type_conversion::to_object;
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::{any_unknown, JsValue, ObjectId};
use crate::runner::eval::ambiguous::{claim_possible_exits, possible_exit_mark};
use crate::runner::eval::expression::get_value;
use crate::runner::eval::rule_processor::{NodeKind, NodeRef};
use crate::runner::eval::statement::evaluate_statement_list;
use crate::runner::eval::types::{Completion, CompletionType, EvalResult, ReferenceBase};
use crate::runner::plugin::types::EvalContext;

pub fn process_program(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let program = match node {
        NodeRef::Program(program) => program,
        _ => return Err(node.malformed(NodeKind::Program)),
    };
    let env = ctx.var_env();
    if let Err(e) = instantiate_declarations(ctx, &program.body, env, None) {
        ctx.report_error(&e);
    }
    let completion = evaluate_statement_list(&program.body, ctx)?;
    if completion.is_throw() {
        let message = format!("Uncaught {}", describe_exception(ctx, &completion.get_value()));
        ctx.runtime.report_uncaught_exception(message, &ctx.realm);
    }
    Ok(completion)
}

/// Reports every possible throw that no `try` claimed.
pub(crate) fn report_possible_throws(ctx: &mut EvalContext) {
    for exit in std::mem::take(&mut ctx.possible_exits) {
        if !exit.completion.is_throw() {
            continue;
        }
        let message = format!(
            "Possibly uncaught {}",
            describe_exception(ctx, &exit.completion.get_value())
        );
        ctx.runtime
            .report_possibly_uncaught(message, exit.location, exit.stack_trace, &ctx.realm);
    }
}

/// Binds the function declarations, the `arguments` object (for function bodies) and the
/// `var` names of `body` in `env`.
fn instantiate_declarations(
    ctx: &mut EvalContext,
    body: &[StatementType],
    env: EnvId,
    arguments: Option<ObjectId>,
) -> Result<(), JErrorType> {
    for f in function_declarations(body) {
        let scope = ctx.lex_env();
        let fo = create_function_object(ctx, &f, scope);
        let name = f.name();
        if !has_binding(&ctx.realm, env, name) {
            create_mutable_binding(ctx, env, name, false)?;
        }
        set_mutable_binding(ctx, env, name, JsValue::Object(fo))?;
    }
    if let Some(arguments) = arguments {
        if !has_binding(&ctx.realm, env, "arguments") {
            create_mutable_binding(ctx, env, "arguments", false)?;
            set_mutable_binding(ctx, env, "arguments", JsValue::Object(arguments))?;
        }
    }
    for name in var_declared_names(body) {
        if !has_binding(&ctx.realm, env, &name) {
            create_mutable_binding(ctx, env, &name, false)?;
        }
    }
    Ok(())
}

fn describe_exception(ctx: &EvalContext, value: &JsValue) -> String {
    let o = match value {
        JsValue::Object(o) => *o,
        other => return other.to_string(),
    };
    let read = |name: &str| match ctx.realm.get_property(o, name) {
        Some(PropertyDescriptor::Data {
            value: JsValue::String(s),
            ..
        }) => Some(s.clone()),
        _ => None,
    };
    match (read("name"), read("message")) {
        (Some(name), Some(message)) if !message.is_empty() => format!("{}: {}", name, message),
        (Some(name), _) => name,
        (None, Some(message)) => message,
        (None, None) => "exception".to_string(),
    }
}

/// Creates a closure over `scope` with its `length` and `prototype` properties.
pub fn create_function_object(
    ctx: &mut EvalContext,
    data: &Rc<FunctionData>,
    scope: EnvId,
) -> ObjectId {
    let f = ctx
        .realm
        .create_function_object(FunctionKind::Script(ScriptFunction {
            data: data.clone(),
            scope,
        }));
    let proto = ctx.realm.create_ordinary_object();
    let properties = [
        (
            f,
            "length",
            PropertyDescriptor::Data {
                value: JsValue::Number(data.params.len() as f64),
                writable: false,
                enumerable: false,
                configurable: false,
            },
        ),
        (
            f,
            "prototype",
            PropertyDescriptor::Data {
                value: JsValue::Object(proto),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        ),
        (
            proto,
            "constructor",
            PropertyDescriptor::Data {
                value: JsValue::Object(f),
                writable: true,
                enumerable: false,
                configurable: true,
            },
        ),
    ];
    for (target, name, desc) in properties {
        // Fresh objects accept any definition.
        let _ = define_own_property(
            ctx,
            target,
            name,
            PropertyDescriptorSetter::new_from_property_descriptor(desc),
            false,
        );
    }
    ctx.script_functions.push(f);
    f
}

/// Function declarations were bound when their body was entered.
pub fn process_function_declaration(node: NodeRef<'_>, _ctx: &mut EvalContext) -> EvalResult {
    match node {
        NodeRef::Statement(StatementType::FunctionDeclaration(_)) => Ok(Completion::normal()),
        _ => Err(node.malformed(NodeKind::FunctionDeclaration)),
    }
}

pub fn process_function_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let data = match node {
        NodeRef::Expression(ExpressionType::FunctionExpression(data)) => data,
        _ => return Err(node.malformed(NodeKind::FunctionExpression)),
    };
    let outer = ctx.lex_env();
    let f = match &data.id {
        None => create_function_object(ctx, data, outer),
        Some(id) => {
            // A named function expression can refer to itself by name.
            let env = ctx
                .realm
                .new_environment(LexEnvironment::new_declarative(Some(outer)));
            let f = create_function_object(ctx, data, env);
            if let Some(record) = ctx.realm.get_environment_mut(env).as_declarative_mut() {
                record.create_immutable_binding(&id.name);
                record.initialize_immutable_binding(&id.name, JsValue::Object(f));
            }
            f
        }
    };
    Ok(Completion::normal_with_value(JsValue::Object(f)))
}

fn callee_name(callee: &ExpressionType) -> String {
    match callee {
        ExpressionType::Identifier(id) => id.name.clone(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            property,
            ..
        }) => format!("{}.{}", callee_name(object), property.name),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => format!("{}[...]", callee_name(object)),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        _ => "expression".to_string(),
    }
}

pub fn process_call_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (callee, arguments) = match node {
        NodeRef::Expression(ExpressionType::CallExpression {
            callee, arguments, ..
        }) => (callee, arguments),
        _ => return Err(node.malformed(NodeKind::CallExpression)),
    };
    let (func, this) = if callee.is_valid_simple_assignment_target() {
        let reference = reference!(ctx, callee);
        let func = recoverable!(ctx, get_value(ctx, &reference));
        let this = match &reference.base {
            ReferenceBase::Value(base) => base.clone(),
            ReferenceBase::Environment(env) => implicit_this_value(&ctx.realm, *env),
            ReferenceBase::Unknown => JsValue::Unknown,
            ReferenceBase::Unresolvable => JsValue::Undefined,
        };
        (func, this)
    } else {
        (value!(ctx, callee), JsValue::Undefined)
    };
    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(value!(ctx, argument));
    }
    match func {
        JsValue::Unknown => Ok(Completion::normal_with_value(JsValue::Unknown)),
        JsValue::Object(f) if ctx.realm.get_object(f).is_callable() => {
            call_function(ctx, f, this, args)
        }
        _ => Ok(ctx.recover(JErrorType::TypeError(format!(
            "{} is not a function",
            callee_name(callee)
        )))),
    }
}

/// `[[Call]]`. Returns a normal completion with the result, or the Throw completion of the
/// callee's body.
pub fn call_function(
    ctx: &mut EvalContext,
    f: ObjectId,
    this: JsValue,
    args: Vec<JsValue>,
) -> EvalResult {
    ctx.invoked_functions.insert(f);
    match ctx.realm.get_object(f).callable.clone() {
        Some(FunctionKind::Native {
            call: Some(call), ..
        }) => {
            if this.is_unknown() || any_unknown(&args) {
                return Ok(Completion::normal_with_value(JsValue::Unknown));
            }
            let value = recoverable!(ctx, call.call(ctx, this, args));
            Ok(Completion::normal_with_value(value))
        }
        Some(FunctionKind::Script(script)) => call_script_function(ctx, f, &script, this, args),
        Some(FunctionKind::Native { name, .. }) => Ok(ctx.recover(JErrorType::TypeError(
            format!("{} is not a function", name),
        ))),
        None => Ok(ctx.recover(JErrorType::TypeError("Value is not a function".to_string()))),
    }
}

fn call_script_function(
    ctx: &mut EvalContext,
    f: ObjectId,
    script: &ScriptFunction,
    this: JsValue,
    args: Vec<JsValue>,
) -> EvalResult {
    if ctx.context_depth() >= ctx.runtime.options.max_recursion_limit as usize {
        ctx.runtime.report_max_recursion(&ctx.realm);
        return Ok(Completion::normal_with_value(JsValue::Unknown));
    }
    let this_binding = match &this {
        JsValue::Undefined | JsValue::Null => ctx.global_this(),
        JsValue::Unknown | JsValue::Object(_) => this,
        _ => match to_object(&mut ctx.realm, &this) {
            Ok(Some(o)) => JsValue::Object(o),
            _ => JsValue::Unknown,
        },
    };
    let env = ctx
        .realm
        .new_environment(LexEnvironment::new_declarative(Some(script.scope)));
    debug!(name = script.data.name(), "call");
    let mark = possible_exit_mark(ctx);
    ctx.push_context(ExecutionContext::new(Some(f), env, this_binding));
    let result = run_function_body(ctx, script, args, env);
    let return_is_unknown = ctx.return_is_unknown();
    ctx.pop_context();
    // Only throws cross a function boundary.
    claim_possible_exits(ctx, mark, |c| !c.is_throw());

    let completion = result?;
    let value = match completion.completion_type {
        CompletionType::Throw => return Ok(completion),
        _ if return_is_unknown => JsValue::Unknown,
        CompletionType::Return => completion.get_value(),
        _ => JsValue::Undefined,
    };
    Ok(Completion::normal_with_value(value))
}

fn run_function_body(
    ctx: &mut EvalContext,
    script: &ScriptFunction,
    args: Vec<JsValue>,
    env: EnvId,
) -> EvalResult {
    let arguments = create_arguments_object(ctx, &args);
    let bound = bind_parameters(ctx, &script.data, args, env)
        .and_then(|_| instantiate_declarations(ctx, &script.data.body.body, env, Some(arguments)));
    if let Err(e) = bound {
        ctx.report_error(&e);
    }
    evaluate_statement_list(&script.data.body.body, ctx)
}

fn bind_parameters(
    ctx: &mut EvalContext,
    data: &FunctionData,
    args: Vec<JsValue>,
    env: EnvId,
) -> Result<(), JErrorType> {
    let mut args = args.into_iter();
    for param in &data.params {
        let value = args.next().unwrap_or(JsValue::Undefined);
        if !has_binding(&ctx.realm, env, &param.name) {
            create_mutable_binding(ctx, env, &param.name, false)?;
        }
        set_mutable_binding(ctx, env, &param.name, value)?;
    }
    Ok(())
}

fn create_arguments_object(ctx: &mut EvalContext, args: &[JsValue]) -> ObjectId {
    let proto = ctx.realm.get_intrinsic(WellKnownIntrinsics::ObjectPrototype);
    let arguments = ctx.realm.create_object(ObjectClass::Arguments, Some(proto));
    for (index, value) in args.iter().enumerate() {
        let _ = define_own_property(
            ctx,
            arguments,
            &index.to_string(),
            PropertyDescriptorSetter::new_default_data(value.clone()),
            false,
        );
    }
    let _ = define_own_property(
        ctx,
        arguments,
        "length",
        PropertyDescriptorSetter::new_default_data(JsValue::Number(args.len() as f64))
            .with_enumerable(false),
        false,
    );
    arguments
}

pub fn process_new_expression(node: NodeRef<'_>, ctx: &mut EvalContext) -> EvalResult {
    let (callee, arguments) = match node {
        NodeRef::Expression(ExpressionType::NewExpression {
            callee, arguments, ..
        }) => (callee, arguments),
        _ => return Err(node.malformed(NodeKind::NewExpression)),
    };
    let constructor = value!(ctx, callee);
    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(value!(ctx, argument));
    }
    match constructor {
        JsValue::Unknown => Ok(Completion::normal_with_value(JsValue::Unknown)),
        JsValue::Object(f)
            if ctx
                .realm
                .get_object(f)
                .callable
                .as_ref()
                .map(|k| k.is_constructor())
                .unwrap_or(false) =>
        {
            construct(ctx, f, args)
        }
        _ => Ok(ctx.recover(JErrorType::TypeError(format!(
            "{} is not a constructor",
            callee_name(callee)
        )))),
    }
}

/// `[[Construct]]`.
pub fn construct(ctx: &mut EvalContext, f: ObjectId, args: Vec<JsValue>) -> EvalResult {
    ctx.invoked_functions.insert(f);
    match ctx.realm.get_object(f).callable.clone() {
        Some(FunctionKind::Native {
            construct: Some(construct),
            ..
        }) => {
            if any_unknown(&args) {
                return Ok(Completion::normal_with_value(JsValue::Unknown));
            }
            let value = recoverable!(ctx, construct.call(ctx, JsValue::Undefined, args));
            Ok(Completion::normal_with_value(value))
        }
        Some(FunctionKind::Script(script)) => {
            let proto = match recoverable!(ctx, get(ctx, f, "prototype")) {
                JsValue::Object(proto) => proto,
                _ => ctx.realm.get_intrinsic(WellKnownIntrinsics::ObjectPrototype),
            };
            let object = ctx.realm.create_object(ObjectClass::Object, Some(proto));
            let completion =
                call_script_function(ctx, f, &script, JsValue::Object(object), args)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
            Ok(Completion::normal_with_value(match completion.get_value() {
                JsValue::Object(result) => JsValue::Object(result),
                _ => JsValue::Object(object),
            }))
        }
        _ => Ok(ctx.recover(JErrorType::TypeError("Value is not a constructor".to_string()))),
    }
}
