//! Number wrapper: the constructor, its constant properties and the radix-aware
//! `Number.prototype.toString`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::operations::type_conversion::{number_to_string, to_integer, to_number};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::{argument, this_primitive, wrap};

/// Fraction digits printed for a non-decimal radix.
const MAX_FRACTION_DIGITS: usize = 20;

pub fn register(registry: &mut BuiltInRegistry) {
    let number = BuiltInObject::new("Number")
        .with_call(number_call)
        .with_constructor(number_construct)
        .add_property("MAX_VALUE", JsValue::Number(f64::MAX))
        .add_property("MIN_VALUE", JsValue::Number(5e-324))
        .add_property("NaN", JsValue::Number(f64::NAN))
        .add_property("POSITIVE_INFINITY", JsValue::Number(f64::INFINITY))
        .add_property("NEGATIVE_INFINITY", JsValue::Number(f64::NEG_INFINITY))
        .add_prototype_method("toString", number_to_string_method)
        .add_prototype_method("valueOf", number_value_of);
    registry.register_object(number);
}

/// `Number()` is `+0`; otherwise `ToNumber` of the first argument.
fn convert(ctx: &mut EvalContext, args: &[JsValue]) -> Result<JsValue, JErrorType> {
    if args.is_empty() {
        return Ok(JsValue::Number(0.0));
    }
    Ok(match to_number(ctx, &argument(args, 0))? {
        Some(n) => JsValue::Number(n),
        None => JsValue::Unknown,
    })
}

fn number_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    convert(ctx, &args)
}

fn number_construct(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let value = convert(ctx, &args)?;
    wrap(&mut ctx.realm, &value)
}

fn number_to_string_method(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = match this_primitive(&ctx.realm, &this, ObjectClass::Number)? {
        Some(JsValue::Number(n)) => n,
        _ => return Ok(JsValue::Unknown),
    };
    let radix = match argument(&args, 0) {
        JsValue::Undefined => 10.0,
        other => match to_number(ctx, &other)? {
            Some(r) => to_integer(r),
            None => return Ok(JsValue::Unknown),
        },
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(JsValue::String(number_to_string(n)));
    }
    Ok(JsValue::String(format_radix(n, radix as u32)))
}

fn number_value_of(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this_primitive(&ctx.realm, &this, ObjectClass::Number)?.unwrap_or(JsValue::Unknown))
}

/// Formats a finite number in `radix`, printing up to [`MAX_FRACTION_DIGITS`] fraction digits.
fn format_radix(n: f64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let negative = n < 0.0;
    let n = n.abs();
    let mut integer = n.trunc();
    let mut fraction = n - integer;

    let mut result = Vec::new();
    if integer == 0.0 {
        result.push(b'0');
    }
    while integer >= 1.0 {
        let digit = (integer % radix as f64) as usize;
        result.push(DIGITS[digit]);
        integer = (integer / radix as f64).trunc();
    }
    if negative {
        result.push(b'-');
    }
    result.reverse();

    if fraction > 0.0 {
        result.push(b'.');
        for _ in 0..MAX_FRACTION_DIGITS {
            fraction *= radix as f64;
            let digit = fraction.trunc();
            result.push(DIGITS[digit as usize]);
            fraction -= digit;
            if fraction == 0.0 {
                break;
            }
        }
    }
    result.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_in_other_radixes() {
        assert_eq!(format_radix(255.0, 16), "ff");
        assert_eq!(format_radix(-5.0, 2), "-101");
        assert_eq!(format_radix(0.5, 2), "0.1");
        assert_eq!(format_radix(0.0, 36), "0");
    }
}
