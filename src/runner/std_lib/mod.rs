//! Standard library built-in objects.
//!
//! Each submodule registers one family of built-ins with a [`BuiltInRegistry`]:
//! `Object`, `Function`, `Array`, the `Boolean`/`Number`/`String` wrappers, the error
//! constructors, and the global value properties and functions.
//!
//! [`BuiltInRegistry`]: crate::runner::plugin::registry::BuiltInRegistry

pub mod array;
pub mod boolean;
pub mod core;
pub mod error;
pub mod function;
pub mod number;
pub mod object;
pub mod string;

pub use self::core::register_core_builtins;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::operations::type_conversion::to_object;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::{JsValue, ObjectId};
use crate::runner::plugin::types::EvalContext;

/// The argument at `index`, or undefined if it was not passed.
pub(crate) fn argument(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}

/// `len` if a native loop over that many elements stays within the loop iteration bound.
/// Otherwise the bound is reported and the caller's result is Unknown.
pub(crate) fn bounded_length(ctx: &mut EvalContext, len: u32) -> Option<u32> {
    if len > ctx.runtime.options.max_loop_iterations {
        ctx.runtime.report_max_iterations(&ctx.realm);
        return None;
    }
    Some(len)
}

/// Precondition shared by the reflective operations.
pub(crate) fn require_object(value: &JsValue) -> Result<ObjectId, JErrorType> {
    match value {
        JsValue::Object(o) => Ok(*o),
        _ => Err(JErrorType::TypeError("Value is not an object".to_string())),
    }
}

/// The primitive a wrapper method operates on: `this` itself when it is a primitive of
/// `class`, or the `[[PrimitiveValue]]` of a wrapper object of `class`. `Ok(None)` for an
/// unknown `this`.
pub(crate) fn this_primitive(
    realm: &Realm,
    this: &JsValue,
    class: ObjectClass,
) -> Result<Option<JsValue>, JErrorType> {
    let matches_class = |v: &JsValue| {
        matches!(
            (v, class),
            (JsValue::Boolean(_), ObjectClass::Boolean)
                | (JsValue::Number(_), ObjectClass::Number)
                | (JsValue::String(_), ObjectClass::String)
        )
    };
    match this {
        JsValue::Unknown => Ok(None),
        v if matches_class(v) => Ok(Some(v.clone())),
        JsValue::Object(o) if realm.get_object(*o).class == class => {
            Ok(realm.get_object(*o).primitive_value.clone())
        }
        _ => Err(JErrorType::TypeError(format!(
            "{}.prototype method called on incompatible receiver",
            class
        ))),
    }
}

/// Wraps `value` in a fresh object of its wrapper class.
pub(crate) fn wrap(realm: &mut Realm, value: &JsValue) -> Result<JsValue, JErrorType> {
    Ok(match to_object(realm, value)? {
        Some(o) => JsValue::Object(o),
        None => JsValue::Unknown,
    })
}
