//! Core built-ins registration and the global object's own properties.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::{argument, array, boolean, error, function, number, object, string};

/// Register all core built-in objects with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    register_global(registry);
    object::register(registry);
    function::register(registry);
    array::register(registry);
    boolean::register(registry);
    number::register(registry);
    string::register(registry);
    error::register(registry);
}

fn register_global(registry: &mut BuiltInRegistry) {
    let global = BuiltInObject::new("global")
        .add_property("undefined", JsValue::Undefined)
        .add_property("NaN", JsValue::Number(f64::NAN))
        .add_property("Infinity", JsValue::Number(f64::INFINITY))
        .add_method("isNaN", is_nan)
        .add_method("isFinite", is_finite);
    registry.register_object(global);
}

fn is_nan(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(match to_number(ctx, &argument(&args, 0))? {
        Some(n) => JsValue::Boolean(n.is_nan()),
        None => JsValue::Unknown,
    })
}

fn is_finite(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match to_number(ctx, &argument(&args, 0))? {
        Some(n) => JsValue::Boolean(n.is_finite()),
        None => JsValue::Unknown,
    })
}
