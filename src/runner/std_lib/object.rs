//! Object built-in.
//!
//! The constructor, the reflective operations on `Object` and the methods of
//! `Object.prototype`. Every operation except `create` requires an object as its first
//! argument and reports a TypeError otherwise.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::object_property::PropertyDescriptorSetter;
use crate::runner::ds::operations::object::{
    define_own_property, from_property_descriptor, get, own_enumerable_keys,
    to_property_descriptor,
};
use crate::runner::ds::operations::type_conversion::{to_object, to_string};
use crate::runner::ds::value::{JsValue, ObjectId};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::{argument, require_object};

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_call(object_call)
        .with_constructor(object_construct)
        .add_method("getPrototypeOf", get_prototype_of)
        .add_method("getOwnPropertyDescriptor", get_own_property_descriptor)
        .add_method("getOwnPropertyNames", get_own_property_names)
        .add_method("create", create)
        .add_method("defineProperty", define_property)
        .add_method("defineProperties", define_properties)
        .add_method("seal", seal)
        .add_method("freeze", freeze)
        .add_method("preventExtensions", prevent_extensions)
        .add_method("isSealed", is_sealed)
        .add_method("isFrozen", is_frozen)
        .add_method("isExtensible", is_extensible)
        .add_method("keys", keys)
        .add_prototype_method("toString", object_to_string)
        .add_prototype_method("valueOf", object_value_of)
        .add_prototype_method("hasOwnProperty", has_own_property)
        .add_prototype_method("isPrototypeOf", is_prototype_of)
        .add_prototype_method("propertyIsEnumerable", property_is_enumerable);
    registry.register_object(object);
}

/// `Object(value)`: wraps primitives, returns objects unchanged, and creates a fresh object for
/// undefined and null.
fn object_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = argument(&args, 0);
    if value.is_undefined_or_null() {
        return Ok(JsValue::Object(ctx.realm.create_ordinary_object()));
    }
    Ok(match to_object(&mut ctx.realm, &value)? {
        Some(o) => JsValue::Object(o),
        None => JsValue::Unknown,
    })
}

/// `new Object(value)`.
fn object_construct(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match argument(&args, 0) {
        value @ JsValue::Object(_) => Ok(value),
        _ => object_call(ctx, this, args),
    }
}

fn get_prototype_of(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    Ok(match ctx.realm.get_object(o).get_prototype_of() {
        Some(proto) => JsValue::Object(proto),
        None => JsValue::Null,
    })
}

fn get_own_property_descriptor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    let name = match to_string(ctx, &argument(&args, 1))? {
        Some(name) => name,
        None => return Ok(JsValue::Unknown),
    };
    let desc = ctx.realm.get_object(o).get_own_property(&name).cloned();
    from_property_descriptor(ctx, desc)
}

fn get_own_property_names(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    let names = ctx
        .realm
        .get_object(o)
        .own_property_keys()
        .into_iter()
        .map(JsValue::String)
        .collect();
    Ok(JsValue::Object(ctx.realm.create_array(names)))
}

/// `Object.create(proto, properties)`. A null prototype creates an object with none.
fn create(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let proto = match argument(&args, 0) {
        JsValue::Object(proto) => Some(proto),
        JsValue::Null => None,
        _ => {
            return Err(JErrorType::TypeError(
                "Object prototype may only be an Object or null".to_string(),
            ))
        }
    };
    let o = ctx.realm.create_object(ObjectClass::Object, proto);
    let properties = argument(&args, 1);
    if !matches!(properties, JsValue::Undefined) {
        return apply_properties(ctx, o, &properties);
    }
    Ok(JsValue::Object(o))
}

fn define_property(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    let name = match to_string(ctx, &argument(&args, 1))? {
        Some(name) => name,
        None => return Ok(JsValue::Unknown),
    };
    let desc = match to_property_descriptor(ctx, &argument(&args, 2))? {
        Some(desc) => desc,
        None => return Ok(JsValue::Unknown),
    };
    define_own_property(ctx, o, &name, desc, true)?;
    Ok(JsValue::Object(o))
}

fn define_properties(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    apply_properties(ctx, o, &argument(&args, 1))
}

/// Reads every descriptor of an enumerable property bag first, then defines them in order.
fn apply_properties(
    ctx: &mut EvalContext,
    o: ObjectId,
    properties: &JsValue,
) -> Result<JsValue, JErrorType> {
    let bag = match to_object(&mut ctx.realm, properties)? {
        Some(bag) => bag,
        None => return Ok(JsValue::Unknown),
    };
    let mut descriptors = vec![];
    for name in own_enumerable_keys(ctx, bag) {
        let desc_object = get(ctx, bag, &name)?;
        match to_property_descriptor(ctx, &desc_object)? {
            Some(desc) => descriptors.push((name, desc)),
            None => return Ok(JsValue::Unknown),
        }
    }
    for (name, desc) in descriptors {
        define_own_property(ctx, o, &name, desc, true)?;
    }
    Ok(JsValue::Object(o))
}

fn seal(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    for name in ctx.realm.get_object(o).own_property_keys() {
        define_own_property(
            ctx,
            o,
            &name,
            PropertyDescriptorSetter::empty().with_configurable(false),
            true,
        )?;
    }
    ctx.realm.get_object_mut(o).prevent_extensions();
    Ok(JsValue::Object(o))
}

/// Like `seal`, and data properties also become read-only. Accessors keep their functions.
fn freeze(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    for name in ctx.realm.get_object(o).own_property_keys() {
        let is_data = ctx
            .realm
            .get_object(o)
            .get_own_property(&name)
            .map(|d| d.is_data_descriptor())
            .unwrap_or(false);
        let mut desc = PropertyDescriptorSetter::empty().with_configurable(false);
        if is_data {
            desc = desc.with_writable(false);
        }
        define_own_property(ctx, o, &name, desc, true)?;
    }
    ctx.realm.get_object_mut(o).prevent_extensions();
    Ok(JsValue::Object(o))
}

fn prevent_extensions(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    ctx.realm.get_object_mut(o).prevent_extensions();
    Ok(JsValue::Object(o))
}

fn is_sealed(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    let record = ctx.realm.get_object(o);
    let any_configurable = record
        .own_property_keys()
        .iter()
        .filter_map(|name| record.get_own_property(name))
        .any(|desc| desc.is_configurable());
    Ok(JsValue::Boolean(!any_configurable && !record.is_extensible()))
}

fn is_frozen(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    let record = ctx.realm.get_object(o);
    let any_mutable = record
        .own_property_keys()
        .iter()
        .filter_map(|name| record.get_own_property(name))
        .any(|desc| desc.is_configurable() || (desc.is_data_descriptor() && desc.is_writable()));
    Ok(JsValue::Boolean(!any_mutable && !record.is_extensible()))
}

fn is_extensible(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    Ok(JsValue::Boolean(ctx.realm.get_object(o).is_extensible()))
}

fn keys(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let o = require_object(&argument(&args, 0))?;
    let names = own_enumerable_keys(ctx, o)
        .into_iter()
        .map(JsValue::String)
        .collect();
    Ok(JsValue::Object(ctx.realm.create_array(names)))
}

/// `Object.prototype.toString`: `[object Class]`.
fn object_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let class = match &this {
        JsValue::Undefined => "Undefined".to_string(),
        JsValue::Null => "Null".to_string(),
        _ => match to_object(&mut ctx.realm, &this)? {
            Some(o) => ctx.realm.get_object(o).class.to_string(),
            None => return Ok(JsValue::Unknown),
        },
    };
    Ok(JsValue::String(format!("[object {}]", class)))
}

fn object_value_of(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(match to_object(&mut ctx.realm, &this)? {
        Some(o) => JsValue::Object(o),
        None => JsValue::Unknown,
    })
}

fn has_own_property(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let name = match to_string(ctx, &argument(&args, 0))? {
        Some(name) => name,
        None => return Ok(JsValue::Unknown),
    };
    Ok(match to_object(&mut ctx.realm, &this)? {
        Some(o) => JsValue::Boolean(ctx.realm.get_object(o).has_own_property(&name)),
        None => JsValue::Unknown,
    })
}

fn is_prototype_of(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let v = match argument(&args, 0) {
        JsValue::Object(v) => v,
        _ => return Ok(JsValue::Boolean(false)),
    };
    Ok(match to_object(&mut ctx.realm, &this)? {
        Some(o) => JsValue::Boolean(ctx.realm.inherits_from(v, o)),
        None => JsValue::Unknown,
    })
}

fn property_is_enumerable(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let name = match to_string(ctx, &argument(&args, 0))? {
        Some(name) => name,
        None => return Ok(JsValue::Unknown),
    };
    Ok(match to_object(&mut ctx.realm, &this)? {
        Some(o) => JsValue::Boolean(
            ctx.realm
                .get_object(o)
                .get_own_property(&name)
                .map(|d| d.is_enumerable())
                .unwrap_or(false),
        ),
        None => JsValue::Unknown,
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

    fn data(ctx: &mut EvalContext, o: ObjectId, name: &str, value: JsValue) {
        define_own_property(
            ctx,
            o,
            name,
            PropertyDescriptorSetter::new_default_data(value),
            true,
        )
        .unwrap();
    }

    #[test]
    fn freeze_implies_sealed_but_not_conversely() {
        let mut ctx = context();
        let sealed = ctx.realm.create_ordinary_object();
        data(&mut ctx, sealed, "a", JsValue::Number(1.0));
        seal(&mut ctx, JsValue::Undefined, vec![JsValue::Object(sealed)]).unwrap();
        let args = || vec![JsValue::Object(sealed)];
        assert_eq!(
            is_sealed(&mut ctx, JsValue::Undefined, args()).unwrap(),
            JsValue::Boolean(true)
        );
        assert_eq!(
            is_frozen(&mut ctx, JsValue::Undefined, args()).unwrap(),
            JsValue::Boolean(false)
        );

        let frozen = ctx.realm.create_ordinary_object();
        data(&mut ctx, frozen, "a", JsValue::Number(1.0));
        freeze(&mut ctx, JsValue::Undefined, vec![JsValue::Object(frozen)]).unwrap();
        let args = || vec![JsValue::Object(frozen)];
        assert_eq!(
            is_frozen(&mut ctx, JsValue::Undefined, args()).unwrap(),
            JsValue::Boolean(true)
        );
        assert_eq!(
            is_sealed(&mut ctx, JsValue::Undefined, args()).unwrap(),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn reflective_operations_require_objects() {
        let mut ctx = context();
        let err = keys(&mut ctx, JsValue::Undefined, vec![JsValue::Number(1.0)]).unwrap_err();
        assert_eq!(err, JErrorType::TypeError("Value is not an object".to_string()));
        assert!(create(&mut ctx, JsValue::Undefined, vec![JsValue::Null]).is_ok());
        assert!(create(&mut ctx, JsValue::Undefined, vec![JsValue::Boolean(true)]).is_err());
    }

    #[test]
    fn object_called_with_an_object_returns_it() {
        let mut ctx = context();
        let o = ctx.realm.create_ordinary_object();
        assert_eq!(
            object_call(&mut ctx, JsValue::Undefined, vec![JsValue::Object(o)]).unwrap(),
            JsValue::Object(o)
        );
        assert_eq!(
            object_construct(&mut ctx, JsValue::Undefined, vec![JsValue::Object(o)]).unwrap(),
            JsValue::Object(o)
        );
        let wrapped = object_call(&mut ctx, JsValue::Undefined, vec![JsValue::Boolean(true)])
            .unwrap()
            .as_object()
            .unwrap();
        assert_eq!(ctx.realm.get_object(wrapped).class, ObjectClass::Boolean);
    }

    #[test]
    fn create_with_null_has_no_prototype() {
        let mut ctx = context();
        let o = create(&mut ctx, JsValue::Undefined, vec![JsValue::Null]).unwrap();
        assert_eq!(
            get_prototype_of(&mut ctx, JsValue::Undefined, vec![o]).unwrap(),
            JsValue::Null
        );
    }
}
