//! String wrapper.
//!
//! Positions are UTF-16 code unit offsets, matching the `length` and index properties of
//! string wrapper objects.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::operations::type_conversion::{to_integer, to_number, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::{argument, this_primitive, wrap};

pub fn register(registry: &mut BuiltInRegistry) {
    let string = BuiltInObject::new("String")
        .with_call(string_call)
        .with_constructor(string_construct)
        .add_prototype_method("toString", string_value_of)
        .add_prototype_method("valueOf", string_value_of)
        .add_prototype_method("charAt", string_char_at)
        .add_prototype_method("indexOf", string_index_of);
    registry.register_object(string);
}

/// `String()` is the empty string; otherwise `ToString` of the first argument.
fn convert(ctx: &mut EvalContext, args: &[JsValue]) -> Result<JsValue, JErrorType> {
    if args.is_empty() {
        return Ok(JsValue::String(String::new()));
    }
    Ok(match to_string(ctx, &argument(args, 0))? {
        Some(s) => JsValue::String(s),
        None => JsValue::Unknown,
    })
}

fn string_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    convert(ctx, &args)
}

fn string_construct(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = convert(ctx, &args)?;
    wrap(&mut ctx.realm, &value)
}

fn string_value_of(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this_primitive(&ctx.realm, &this, ObjectClass::String)?.unwrap_or(JsValue::Unknown))
}

fn this_units(ctx: &EvalContext, this: &JsValue) -> Result<Option<Vec<u16>>, JErrorType> {
    Ok(match this_primitive(&ctx.realm, this, ObjectClass::String)? {
        Some(JsValue::String(s)) => Some(s.encode_utf16().collect()),
        _ => None,
    })
}

/// `ToInteger` of an optional position argument; `Ok(None)` when unknown.
fn position(ctx: &mut EvalContext, value: &JsValue) -> Result<Option<f64>, JErrorType> {
    Ok(to_number(ctx, value)?.map(to_integer))
}

fn string_char_at(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let units = match this_units(ctx, &this)? {
        Some(units) => units,
        None => return Ok(JsValue::Unknown),
    };
    let pos = match position(ctx, &argument(&args, 0))? {
        Some(pos) => pos,
        None => return Ok(JsValue::Unknown),
    };
    if pos < 0.0 || pos >= units.len() as f64 {
        return Ok(JsValue::String(String::new()));
    }
    Ok(JsValue::String(String::from_utf16_lossy(&units[pos as usize..pos as usize + 1])))
}

fn string_index_of(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let units = match this_units(ctx, &this)? {
        Some(units) => units,
        None => return Ok(JsValue::Unknown),
    };
    let search: Vec<u16> = match to_string(ctx, &argument(&args, 0))? {
        Some(s) => s.encode_utf16().collect(),
        None => return Ok(JsValue::Unknown),
    };
    let start = match position(ctx, &argument(&args, 1))? {
        Some(pos) => pos.max(0.0).min(units.len() as f64) as usize,
        None => return Ok(JsValue::Unknown),
    };
    let found = (start..=units.len().saturating_sub(search.len()))
        .filter(|i| *i + search.len() <= units.len())
        .find(|i| units[*i..*i + search.len()] == search[..]);
    Ok(JsValue::Number(found.map(|i| i as f64).unwrap_or(-1.0)))
}
