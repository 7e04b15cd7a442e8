//! Error built-in objects: `Error` and its `TypeError`, `RangeError`, `ReferenceError` and
//! `SyntaxError` subtypes.
//!
//! The subtype prototypes inherit from `Error.prototype`, so `toString` is defined once.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::object_property::PropertyDescriptorSetter;
use crate::runner::ds::operations::object::{define_own_property, get};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeFn};

use super::argument;

pub fn register(registry: &mut BuiltInRegistry) {
    let subtypes: [(&str, NativeFn); 4] = [
        ("TypeError", type_error),
        ("RangeError", range_error),
        ("ReferenceError", reference_error),
        ("SyntaxError", syntax_error),
    ];
    registry.register_object(
        BuiltInObject::new("Error")
            .with_call(error)
            .with_constructor(error)
            .add_prototype_property("name", JsValue::from_str("Error"))
            .add_prototype_property("message", JsValue::String(String::new()))
            .add_prototype_method("toString", error_to_string),
    );
    for (name, ctor) in subtypes {
        registry.register_object(
            BuiltInObject::new(name)
                .with_call(ctor)
                .with_constructor(ctor)
                .add_prototype_property("name", JsValue::from_str(name)),
        );
    }
}

fn error(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    create_error(ctx, WellKnownIntrinsics::ErrorPrototype, &args)
}

fn type_error(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    create_error(ctx, WellKnownIntrinsics::TypeErrorPrototype, &args)
}

fn range_error(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    create_error(ctx, WellKnownIntrinsics::RangeErrorPrototype, &args)
}

fn reference_error(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    create_error(ctx, WellKnownIntrinsics::ReferenceErrorPrototype, &args)
}

fn syntax_error(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    create_error(ctx, WellKnownIntrinsics::SyntaxErrorPrototype, &args)
}

/// An object of class Error. The message becomes an own property only when one is passed.
fn create_error(
    ctx: &mut EvalContext,
    prototype: WellKnownIntrinsics,
    args: &[JsValue],
) -> Result<JsValue, JErrorType> {
    let proto = ctx.realm.get_intrinsic(prototype);
    let o = ctx.realm.create_object(ObjectClass::Error, Some(proto));
    let message = argument(args, 0);
    if !matches!(message, JsValue::Undefined) {
        let message = match to_string(ctx, &message)? {
            Some(m) => JsValue::String(m),
            None => JsValue::Unknown,
        };
        define_own_property(
            ctx,
            o,
            "message",
            PropertyDescriptorSetter::new_default_data(message).with_enumerable(false),
            true,
        )?;
    }
    Ok(JsValue::Object(o))
}

/// `Error.prototype.toString`: `name: message`, leaving out whichever part is empty.
fn error_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = match this {
        JsValue::Object(o) => o,
        JsValue::Unknown => return Ok(JsValue::Unknown),
        _ => {
            return Err(JErrorType::TypeError(
                "Error.prototype.toString called on non-object".to_string(),
            ))
        }
    };
    let name = match get(ctx, o, "name")? {
        JsValue::Undefined => Some("Error".to_string()),
        other => to_string(ctx, &other)?,
    };
    let message = match get(ctx, o, "message")? {
        JsValue::Undefined => Some(String::new()),
        other => to_string(ctx, &other)?,
    };
    Ok(match (name, message) {
        (Some(name), Some(message)) if message.is_empty() => JsValue::String(name),
        (Some(name), Some(message)) if name.is_empty() => JsValue::String(message),
        (Some(name), Some(message)) => JsValue::String(format!("{}: {}", name, message)),
        _ => JsValue::Unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::eval::rule_processor::RuleRegistry;
    use crate::runner::runtime::{Runtime, RuntimeOptions};

    fn context() -> EvalContext {
        EvalContext::new(
            Runtime::new(RuntimeOptions::default(), "test.js"),
            RuleRegistry::with_core(),
            &BuiltInRegistry::with_core(),
        )
    }

    #[test]
    fn subtypes_inherit_from_error_prototype() {
        let mut ctx = context();
        let e = type_error(&mut ctx, JsValue::Undefined, vec![JsValue::from_str("bad")]).unwrap();
        let o = e.as_object().unwrap();
        let error_proto = ctx.realm.get_intrinsic(WellKnownIntrinsics::ErrorPrototype);
        assert!(ctx.realm.inherits_from(o, error_proto));
        assert_eq!(ctx.realm.get_object(o).class, ObjectClass::Error);
        assert_eq!(
            error_to_string(&mut ctx, e, vec![]).unwrap(),
            JsValue::from_str("TypeError: bad")
        );
    }

    #[test]
    fn empty_message_prints_only_the_name() {
        let mut ctx = context();
        let e = error(&mut ctx, JsValue::Undefined, vec![]).unwrap();
        assert!(!ctx
            .realm
            .get_object(e.as_object().unwrap())
            .has_own_property("message"));
        assert_eq!(
            error_to_string(&mut ctx, e, vec![]).unwrap(),
            JsValue::from_str("Error")
        );
    }
}
