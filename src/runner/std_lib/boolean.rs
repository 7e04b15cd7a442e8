//! Boolean wrapper.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::{argument, this_primitive, wrap};

pub fn register(registry: &mut BuiltInRegistry) {
    let boolean = BuiltInObject::new("Boolean")
        .with_call(boolean_call)
        .with_constructor(boolean_construct)
        .add_prototype_method("toString", boolean_to_string)
        .add_prototype_method("valueOf", boolean_value_of);
    registry.register_object(boolean);
}

fn convert(args: &[JsValue]) -> JsValue {
    match to_boolean(&argument(args, 0)) {
        Some(b) => JsValue::Boolean(b),
        None => JsValue::Unknown,
    }
}

fn boolean_call(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(convert(&args))
}

fn boolean_construct(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    wrap(&mut ctx.realm, &convert(&args))
}

fn boolean_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match this_primitive(&ctx.realm, &this, ObjectClass::Boolean)? {
        Some(JsValue::Boolean(b)) => JsValue::String(b.to_string()),
        _ => JsValue::Unknown,
    })
}

fn boolean_value_of(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this_primitive(&ctx.realm, &this, ObjectClass::Boolean)?.unwrap_or(JsValue::Unknown))
}
