//! Array built-in.
//!
//! The constructor, `Array.isArray` and the generic prototype methods `push`, `pop`, `join`
//! and `toString`. The prototype methods work on any object with a `length`; an unknown
//! length, or one beyond the loop iteration bound, makes the whole operation unknown.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::operations::object::{delete, get, put};
use crate::runner::ds::operations::type_conversion::{
    number_to_string, to_number, to_object, to_string, to_uint32,
};
use crate::runner::ds::value::{JsValue, ObjectId};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::{argument, bounded_length};

pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_call(array_constructor)
        .with_constructor(array_constructor)
        .add_method("isArray", is_array)
        .add_prototype_method("push", array_push)
        .add_prototype_method("pop", array_pop)
        .add_prototype_method("join", array_join)
        .add_prototype_method("toString", array_to_string);
    registry.register_object(array);
}

/// `Array(len)` and `Array(a, b, ...)`. Calling and constructing behave the same.
fn array_constructor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let [JsValue::Number(len)] = args.as_slice() {
        let len = *len;
        if to_uint32(len) as f64 != len {
            return Err(JErrorType::RangeError("Invalid array length".to_string()));
        }
        let array = ctx.realm.create_array(vec![]);
        put(ctx, array, "length", JsValue::Number(len), true)?;
        return Ok(JsValue::Object(array));
    }
    if let [JsValue::Unknown] = args.as_slice() {
        return Ok(JsValue::Unknown);
    }
    Ok(JsValue::Object(ctx.realm.create_array(args)))
}

fn is_array(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(match argument(&args, 0) {
        JsValue::Object(o) => JsValue::Boolean(ctx.realm.get_object(o).class == ObjectClass::Array),
        JsValue::Unknown => JsValue::Unknown,
        _ => JsValue::Boolean(false),
    })
}

/// `this` as an object together with its length, or `None` if either is unknown.
fn this_with_length(
    ctx: &mut EvalContext,
    this: &JsValue,
) -> Result<Option<(ObjectId, u32)>, JErrorType> {
    let o = match to_object(&mut ctx.realm, this)? {
        Some(o) => o,
        None => return Ok(None),
    };
    let len = get(ctx, o, "length")?;
    Ok(to_number(ctx, &len)?.map(|n| (o, to_uint32(n))))
}

fn array_push(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, len) = match this_with_length(ctx, &this)? {
        Some(parts) => parts,
        None => return Ok(JsValue::Unknown),
    };
    let mut n = len as f64;
    for value in args {
        put(ctx, o, &number_to_string(n), value, true)?;
        n += 1.0;
    }
    put(ctx, o, "length", JsValue::Number(n), true)?;
    Ok(JsValue::Number(n))
}

fn array_pop(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, len) = match this_with_length(ctx, &this)? {
        Some(parts) => parts,
        None => return Ok(JsValue::Unknown),
    };
    if len == 0 {
        put(ctx, o, "length", JsValue::Number(0.0), true)?;
        return Ok(JsValue::Undefined);
    }
    let index = (len - 1).to_string();
    let element = get(ctx, o, &index)?;
    delete(ctx, o, &index, true)?;
    put(ctx, o, "length", JsValue::Number((len - 1) as f64), true)?;
    Ok(element)
}

fn array_join(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let (o, len) = match this_with_length(ctx, &this)? {
        Some(parts) => parts,
        None => return Ok(JsValue::Unknown),
    };
    let separator = match argument(&args, 0) {
        JsValue::Undefined => ",".to_string(),
        other => match to_string(ctx, &other)? {
            Some(s) => s,
            None => return Ok(JsValue::Unknown),
        },
    };
    let len = match bounded_length(ctx, len) {
        Some(len) => len,
        None => return Ok(JsValue::Unknown),
    };
    let mut parts = vec![];
    for index in 0..len {
        let element = get(ctx, o, &index.to_string())?;
        if element.is_undefined_or_null() {
            parts.push(String::new());
            continue;
        }
        match to_string(ctx, &element)? {
            Some(s) => parts.push(s),
            None => return Ok(JsValue::Unknown),
        }
    }
    Ok(JsValue::String(parts.join(&separator)))
}

fn array_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    array_join(ctx, this, vec![])
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
    fn length_argument_must_be_an_array_index() {
        let mut ctx = context();
        let array = array_constructor(&mut ctx, JsValue::Undefined, vec![JsValue::Number(3.0)])
            .unwrap()
            .as_object()
            .unwrap();
        assert_eq!(get(&mut ctx, array, "length").unwrap(), JsValue::Number(3.0));
        assert!(!ctx.realm.get_object(array).has_own_property("0"));

        let err = array_constructor(&mut ctx, JsValue::Undefined, vec![JsValue::Number(1.5)])
            .unwrap_err();
        assert_eq!(err, JErrorType::RangeError("Invalid array length".to_string()));
    }

    #[test]
    fn push_pop_and_join() {
        let mut ctx = context();
        let array = JsValue::Object(ctx.realm.create_array(vec![JsValue::Number(1.0)]));
        let len = array_push(
            &mut ctx,
            array.clone(),
            vec![JsValue::Null, JsValue::from_str("x")],
        )
        .unwrap();
        assert_eq!(len, JsValue::Number(3.0));
        assert_eq!(
            array_join(&mut ctx, array.clone(), vec![JsValue::from_str("-")]).unwrap(),
            JsValue::from_str("1--x")
        );
        assert_eq!(
            array_pop(&mut ctx, array.clone(), vec![]).unwrap(),
            JsValue::from_str("x")
        );
        assert_eq!(
            array_to_string(&mut ctx, array, vec![]).unwrap(),
            JsValue::from_str("1,")
        );
    }

    #[test]
    fn join_stops_at_the_iteration_bound() {
        let mut ctx = context();
        let o = ctx.realm.create_ordinary_object();
        put(&mut ctx, o, "length", JsValue::Number(4294967295.0), true).unwrap();
        assert_eq!(
            array_join(&mut ctx, JsValue::Object(o), vec![]).unwrap(),
            JsValue::Unknown
        );
        assert_eq!(ctx.runtime.diagnostics().len(), 1);

        let sparse = array_constructor(
            &mut ctx,
            JsValue::Undefined,
            vec![JsValue::Number(4294967295.0)],
        )
        .unwrap();
        assert_eq!(
            array_to_string(&mut ctx, sparse, vec![]).unwrap(),
            JsValue::Unknown
        );
        assert_eq!(ctx.runtime.diagnostics().len(), 2);
    }

    #[test]
    fn unknown_length_is_unknown() {
        let mut ctx = context();
        let o = ctx.realm.create_ordinary_object();
        put(&mut ctx, o, "length", JsValue::Unknown, true).unwrap();
        assert_eq!(
            array_pop(&mut ctx, JsValue::Object(o), vec![]).unwrap(),
            JsValue::Unknown
        );
    }
}
