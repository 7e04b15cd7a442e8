use crate::runner::ds::env_record::{EnvId, EnvironmentRecord};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::object::{define_own_property, get, put};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::Reference;
use crate::runner::plugin::types::EvalContext;

pub fn has_binding(realm: &Realm, env: EnvId, name: &str) -> bool {
    match &realm.get_environment(env).record {
        EnvironmentRecord::Declarative(d) => d.has_binding(name),
        EnvironmentRecord::Object(o) => realm.has_property(o.binding_object, name),
    }
}

/// `GetIdentifierReference`: walks the environment chain outwards from `env`.
pub fn get_identifier_reference(realm: &Realm, env: Option<EnvId>, name: &str) -> Reference {
    let mut current = env;
    while let Some(e) = current {
        if has_binding(realm, e, name) {
            return Reference::environment(e, name);
        }
        current = realm.get_environment(e).outer;
    }
    Reference::unresolvable(name)
}

pub fn get_binding_value(
    ctx: &mut EvalContext,
    env: EnvId,
    name: &str,
) -> Result<JsValue, JErrorType> {
    let binding_object = match &ctx.realm.get_environment(env).record {
        EnvironmentRecord::Declarative(d) => return d.get_binding_value(name),
        EnvironmentRecord::Object(o) => o.binding_object,
    };
    get(ctx, binding_object, name)
}

/// Assigns to an existing binding. A write that may or may not happen stores Unknown.
pub fn set_mutable_binding(
    ctx: &mut EvalContext,
    env: EnvId,
    name: &str,
    value: JsValue,
) -> Result<(), JErrorType> {
    let created = ctx.realm.get_environment(env).created_ambiguity;
    let value = if ctx.is_ambiguous_write(created) {
        JsValue::Unknown
    } else {
        value
    };
    let binding_object = match &mut ctx.realm.get_environment_mut(env).record {
        EnvironmentRecord::Declarative(d) => return d.set_mutable_binding(name, value),
        EnvironmentRecord::Object(o) => o.binding_object,
    };
    put(ctx, binding_object, name, value, false)
}

pub fn create_mutable_binding(
    ctx: &mut EvalContext,
    env: EnvId,
    name: &str,
    deletable: bool,
) -> Result<(), JErrorType> {
    let binding_object = match &mut ctx.realm.get_environment_mut(env).record {
        EnvironmentRecord::Declarative(d) => {
            d.create_mutable_binding(name, deletable);
            return Ok(());
        }
        EnvironmentRecord::Object(o) => o.binding_object,
    };
    define_own_property(
        ctx,
        binding_object,
        name,
        PropertyDescriptorSetter::new_from_property_descriptor(
            PropertyDescriptor::Data {
                value: JsValue::Undefined,
                writable: true,
                enumerable: true,
                configurable: deletable,
            },
        ),
        true,
    )?;
    Ok(())
}

pub fn delete_binding(ctx: &mut EvalContext, env: EnvId, name: &str) -> Result<bool, JErrorType> {
    let binding_object = match &mut ctx.realm.get_environment_mut(env).record {
        EnvironmentRecord::Declarative(d) => return Ok(d.delete_binding(name)),
        EnvironmentRecord::Object(o) => o.binding_object,
    };
    ctx.realm.get_object_mut(binding_object).delete(name, false)
}

/// `this` supplied by a binding found in `env`: the binding object when it provides one.
pub fn implicit_this_value(realm: &Realm, env: EnvId) -> JsValue {
    match &realm.get_environment(env).record {
        EnvironmentRecord::Object(o) if o.provide_this => JsValue::Object(o.binding_object),
        _ => JsValue::Undefined,
    }
}
