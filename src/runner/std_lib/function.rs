//! Function built-in.
//!
//! `Function(...)` compiles source text at run time, which cannot be followed statically: both
//! the call and the construct behaviour produce Unknown.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

pub fn register(registry: &mut BuiltInRegistry) {
    let function = BuiltInObject::new("Function")
        .with_call(dynamic_function)
        .with_constructor(dynamic_function)
        .add_prototype_method("toString", function_to_string);
    registry.register_object(function);
}

fn dynamic_function(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Unknown)
}

/// `Function.prototype.toString`. Native functions print a placeholder body; script functions
/// print their name with an elided body.
fn function_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let f = match &this {
        JsValue::Object(o) => *o,
        JsValue::Unknown => return Ok(JsValue::Unknown),
        _ => return Err(JErrorType::TypeError("Value is not a function".to_string())),
    };
    let kind = match &ctx.realm.get_object(f).callable {
        Some(kind) => kind,
        None => return Err(JErrorType::TypeError("Value is not a function".to_string())),
    };
    let text = match kind {
        FunctionKind::Native { name, .. } => {
            format!("function {}() {{ [native code] }}", name)
        }
        FunctionKind::Script(_) => {
            format!("function {}() {{ ... }}", kind.name())
        }
    };
    Ok(JsValue::String(text))
}
