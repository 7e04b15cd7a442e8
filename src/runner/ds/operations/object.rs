use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::type_conversion::{
    to_array_index, to_boolean, to_number, to_object, to_uint32,
};
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::{JsValue, ObjectId};
use crate::runner::plugin::types::EvalContext;

/// Calls a getter or setter without running user code. Script accessors produce Unknown.
fn call_accessor(
    ctx: &mut EvalContext,
    f: ObjectId,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match ctx.realm.get_object(f).callable.clone() {
        Some(FunctionKind::Native {
            call: Some(call), ..
        }) => call.call(ctx, this, args),
        _ => Ok(JsValue::Unknown),
    }
}

/// `[[Get]]`.
pub fn get(ctx: &mut EvalContext, o: ObjectId, name: &str) -> Result<JsValue, JErrorType> {
    match ctx.realm.get_property(o, name).cloned() {
        None => Ok(JsValue::Undefined),
        Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
        Some(PropertyDescriptor::Accessor { get: None, .. }) => Ok(JsValue::Undefined),
        Some(PropertyDescriptor::Accessor { get: Some(f), .. }) => {
            call_accessor(ctx, f, JsValue::Object(o), vec![])
        }
    }
}

/// `GetValue` on a property of an arbitrary base value. String length and indices are read
/// without allocating a wrapper object.
pub fn get_v(ctx: &mut EvalContext, v: &JsValue, name: &str) -> Result<JsValue, JErrorType> {
    match v {
        JsValue::Unknown => Ok(JsValue::Unknown),
        JsValue::Object(o) => get(ctx, *o, name),
        JsValue::String(s) => {
            if name == "length" {
                return Ok(JsValue::Number(s.encode_utf16().count() as f64));
            }
            if let Some(index) = to_array_index(name) {
                let units: Vec<u16> = s.encode_utf16().collect();
                if let Some(unit) = units.get(index as usize) {
                    return Ok(JsValue::String(String::from_utf16_lossy(&[*unit])));
                }
            }
            let proto = ctx.realm.get_intrinsic(WellKnownIntrinsics::StringPrototype);
            get_with_this(ctx, proto, name, v.clone())
        }
        _ => match to_object(&mut ctx.realm, v)? {
            Some(o) => get_with_this(ctx, o, name, v.clone()),
            None => Ok(JsValue::Unknown),
        },
    }
}

fn get_with_this(
    ctx: &mut EvalContext,
    o: ObjectId,
    name: &str,
    this: JsValue,
) -> Result<JsValue, JErrorType> {
    match ctx.realm.get_property(o, name).cloned() {
        None => Ok(JsValue::Undefined),
        Some(PropertyDescriptor::Data { value, .. }) => Ok(value),
        Some(PropertyDescriptor::Accessor { get: None, .. }) => Ok(JsValue::Undefined),
        Some(PropertyDescriptor::Accessor { get: Some(f), .. }) => {
            call_accessor(ctx, f, this, vec![])
        }
    }
}

/// `[[CanPut]]`.
pub fn can_put(ctx: &EvalContext, o: ObjectId, name: &str) -> bool {
    let record = ctx.realm.get_object(o);
    if let Some(desc) = record.get_own_property(name) {
        return match desc {
            PropertyDescriptor::Accessor { set, .. } => set.is_some(),
            PropertyDescriptor::Data { writable, .. } => *writable,
        };
    }
    match record.get_prototype_of() {
        None => record.is_extensible(),
        Some(proto) => match ctx.realm.get_property(proto, name) {
            None => record.is_extensible(),
            Some(PropertyDescriptor::Accessor { set, .. }) => set.is_some(),
            Some(PropertyDescriptor::Data { writable, .. }) => {
                record.is_extensible() && *writable
            }
        },
    }
}

/// `[[Put]]`. A write that may or may not happen (made inside an ambiguous block to an object
/// created outside it) stores Unknown.
pub fn put(
    ctx: &mut EvalContext,
    o: ObjectId,
    name: &str,
    value: JsValue,
    throw: bool,
) -> Result<(), JErrorType> {
    if !can_put(ctx, o, name) {
        if throw {
            return Err(JErrorType::TypeError(format!(
                "Cannot assign to read only property '{}'",
                name
            )));
        }
        return Ok(());
    }
    let value = if ctx.is_ambiguous_write(ctx.realm.get_object(o).created_ambiguity) {
        JsValue::Unknown
    } else {
        value
    };
    let own_is_data = ctx
        .realm
        .get_object(o)
        .get_own_property(name)
        .map(|d| d.is_data_descriptor());
    if own_is_data == Some(true) {
        define_own_property(ctx, o, name, PropertyDescriptorSetter::value_only(value), throw)?;
        return Ok(());
    }
    if let Some(PropertyDescriptor::Accessor { set: Some(f), .. }) =
        ctx.realm.get_property(o, name).cloned()
    {
        call_accessor(ctx, f, JsValue::Object(o), vec![value])?;
        return Ok(());
    }
    define_own_property(
        ctx,
        o,
        name,
        PropertyDescriptorSetter::new_default_data(value),
        throw,
    )?;
    Ok(())
}

/// `[[DefineOwnProperty]]`, including the `length` and index handling of arrays.
pub fn define_own_property(
    ctx: &mut EvalContext,
    o: ObjectId,
    name: &str,
    desc: PropertyDescriptorSetter,
    throw: bool,
) -> Result<bool, JErrorType> {
    if ctx.realm.get_object(o).class != ObjectClass::Array {
        return ctx.realm.get_object_mut(o).define_own_property(name, desc, throw);
    }
    if name == "length" {
        return define_array_length(ctx, o, desc, throw);
    }
    let index = match to_array_index(name) {
        Some(index) => index,
        None => return ctx.realm.get_object_mut(o).define_own_property(name, desc, throw),
    };
    let (old_len, length_writable) = match array_length(ctx, o) {
        Some(len) => len,
        None => return ctx.realm.get_object_mut(o).define_own_property(name, desc, throw),
    };
    if index >= old_len && !length_writable {
        return reject(throw, name);
    }
    if !ctx
        .realm
        .get_object_mut(o)
        .define_own_property(name, desc, false)?
    {
        return reject(throw, name);
    }
    if index >= old_len {
        set_array_length(ctx, o, JsValue::Number(index as f64 + 1.0), true);
    }
    Ok(true)
}

fn reject(throw: bool, name: &str) -> Result<bool, JErrorType> {
    if throw {
        Err(JErrorType::TypeError(format!(
            "Cannot define property: {}",
            name
        )))
    } else {
        Ok(false)
    }
}

/// Current `length` of an array and whether it is writable. `None` if the length is unknown.
fn array_length(ctx: &EvalContext, o: ObjectId) -> Option<(u32, bool)> {
    match ctx.realm.get_object(o).get_own_property("length") {
        Some(PropertyDescriptor::Data {
            value: JsValue::Number(n),
            writable,
            ..
        }) => Some((*n as u32, *writable)),
        _ => None,
    }
}

fn set_array_length(ctx: &mut EvalContext, o: ObjectId, value: JsValue, writable: bool) {
    ctx.realm.get_object_mut(o).replace_own_property(
        "length",
        PropertyDescriptor::Data {
            value,
            writable,
            enumerable: false,
            configurable: false,
        },
    );
}

fn define_array_length(
    ctx: &mut EvalContext,
    o: ObjectId,
    mut desc: PropertyDescriptorSetter,
    throw: bool,
) -> Result<bool, JErrorType> {
    let new_len_value = match desc.value() {
        None => return ctx.realm.get_object_mut(o).define_own_property("length", desc, throw),
        Some(v) => v.clone(),
    };
    let number = match to_number(ctx, &new_len_value)? {
        Some(n) => n,
        None => {
            desc = desc.with_value(JsValue::Unknown);
            return ctx.realm.get_object_mut(o).define_own_property("length", desc, throw);
        }
    };
    let new_len = to_uint32(number);
    if new_len as f64 != number {
        return Err(JErrorType::RangeError("Invalid array length".to_string()));
    }
    desc = desc.with_value(JsValue::Number(new_len as f64));
    let (old_len, old_writable) = match array_length(ctx, o) {
        Some(len) => len,
        None => return ctx.realm.get_object_mut(o).define_own_property("length", desc, throw),
    };
    if new_len >= old_len {
        return ctx.realm.get_object_mut(o).define_own_property("length", desc, throw);
    }
    if !old_writable {
        return reject(throw, "length");
    }
    let new_writable = !desc.honour_writable || desc.descriptor.is_writable();
    if !new_writable {
        desc = desc.with_writable(true);
    }
    if !ctx
        .realm
        .get_object_mut(o)
        .define_own_property("length", desc, throw)?
    {
        return Ok(false);
    }
    let mut doomed: Vec<u32> = ctx
        .realm
        .get_object(o)
        .own_property_keys()
        .iter()
        .filter_map(|k| to_array_index(k))
        .filter(|i| *i >= new_len)
        .collect();
    doomed.sort_unstable_by(|a, b| b.cmp(a));
    for index in doomed {
        if !ctx
            .realm
            .get_object_mut(o)
            .delete(&index.to_string(), false)?
        {
            set_array_length(ctx, o, JsValue::Number(index as f64 + 1.0), new_writable);
            return reject(throw, "length");
        }
    }
    if !new_writable {
        ctx.realm.get_object_mut(o).define_own_property(
            "length",
            PropertyDescriptorSetter::empty().with_writable(false),
            false,
        )?;
    }
    Ok(true)
}

/// Defines an enumerable, writable and configurable data property, ignoring failure.
pub fn create_data_property(
    ctx: &mut EvalContext,
    o: ObjectId,
    name: &str,
    value: JsValue,
) -> Result<bool, JErrorType> {
    define_own_property(
        ctx,
        o,
        name,
        PropertyDescriptorSetter::new_default_data(value),
        false,
    )
}

pub fn delete(ctx: &mut EvalContext, o: ObjectId, name: &str, throw: bool) -> Result<bool, JErrorType> {
    ctx.realm.get_object_mut(o).delete(name, throw)
}

/// `FromPropertyDescriptor`: a descriptor as a plain object, or undefined.
pub fn from_property_descriptor(
    ctx: &mut EvalContext,
    desc: Option<PropertyDescriptor>,
) -> Result<JsValue, JErrorType> {
    let desc = match desc {
        None => return Ok(JsValue::Undefined),
        Some(desc) => desc,
    };
    let obj = ctx.realm.create_ordinary_object();
    match &desc {
        PropertyDescriptor::Data {
            value, writable, ..
        } => {
            create_data_property(ctx, obj, "value", value.clone())?;
            create_data_property(ctx, obj, "writable", JsValue::Boolean(*writable))?;
        }
        PropertyDescriptor::Accessor { get, set, .. } => {
            let to_value = |f: &Option<ObjectId>| match f {
                Some(f) => JsValue::Object(*f),
                None => JsValue::Undefined,
            };
            create_data_property(ctx, obj, "get", to_value(get))?;
            create_data_property(ctx, obj, "set", to_value(set))?;
        }
    }
    create_data_property(ctx, obj, "enumerable", JsValue::Boolean(desc.is_enumerable()))?;
    create_data_property(
        ctx,
        obj,
        "configurable",
        JsValue::Boolean(desc.is_configurable()),
    )?;
    Ok(JsValue::Object(obj))
}

/// `ToPropertyDescriptor`. `Ok(None)` if any part of the descriptor is unknown.
pub fn to_property_descriptor(
    ctx: &mut EvalContext,
    v: &JsValue,
) -> Result<Option<PropertyDescriptorSetter>, JErrorType> {
    let obj = match v {
        JsValue::Unknown => return Ok(None),
        JsValue::Object(o) => *o,
        _ => {
            return Err(JErrorType::TypeError(
                "Property description must be an object".to_string(),
            ))
        }
    };
    let mut desc = PropertyDescriptorSetter::empty();
    for flag in ["enumerable", "configurable", "writable"] {
        if !ctx.realm.has_property(obj, flag) {
            continue;
        }
        let value = match to_boolean(&get(ctx, obj, flag)?) {
            Some(b) => b,
            None => return Ok(None),
        };
        desc = match flag {
            "enumerable" => desc.with_enumerable(value),
            "configurable" => desc.with_configurable(value),
            _ => desc.with_writable(value),
        };
    }
    if ctx.realm.has_property(obj, "value") {
        let value = get(ctx, obj, "value")?;
        desc = desc.with_value(value);
    }
    for accessor in ["get", "set"] {
        if !ctx.realm.has_property(obj, accessor) {
            continue;
        }
        let f = match get(ctx, obj, accessor)? {
            JsValue::Unknown => return Ok(None),
            JsValue::Undefined => None,
            JsValue::Object(f) if ctx.realm.get_object(f).is_callable() => Some(f),
            other => {
                return Err(JErrorType::TypeError(format!(
                    "{} must be a function: {}",
                    if accessor == "get" { "Getter" } else { "Setter" },
                    other
                )))
            }
        };
        desc = if accessor == "get" {
            desc.with_get(f)
        } else {
            desc.with_set(f)
        };
    }
    if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
        return Err(JErrorType::TypeError(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
                .to_string(),
        ));
    }
    Ok(Some(desc))
}

/// Own enumerable property names in insertion order.
pub fn own_enumerable_keys(ctx: &EvalContext, o: ObjectId) -> Vec<String> {
    let record = ctx.realm.get_object(o);
    record
        .own_property_keys()
        .into_iter()
        .filter(|k| {
            record
                .get_own_property(k)
                .map(|d| d.is_enumerable())
                .unwrap_or(false)
        })
        .collect()
}
