use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::realm::{Realm, WellKnownIntrinsics};
use crate::runner::ds::value::{JsValue, ObjectId};
use crate::runner::plugin::types::EvalContext;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// Result of the `typeof` operator, `None` for an unknown operand.
pub fn get_type(realm: &Realm, a: &JsValue) -> Option<&'static str> {
    Some(match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if realm.get_object(*o).is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
        JsValue::Unknown => return None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    String,
    Number,
}

/// `ToPrimitive`. Never runs user code: an object whose conversion method is a script
/// function, or is reached through an accessor, converts to Unknown.
pub fn to_primitive(
    ctx: &mut EvalContext,
    v: &JsValue,
    preferred_type: PreferredType,
) -> Result<JsValue, JErrorType> {
    match v {
        JsValue::Object(o) => default_value(ctx, *o, preferred_type),
        _ => Ok(v.clone()),
    }
}

fn default_value(
    ctx: &mut EvalContext,
    o: ObjectId,
    hint: PreferredType,
) -> Result<JsValue, JErrorType> {
    let order = match hint {
        PreferredType::String => ["toString", "valueOf"],
        _ => ["valueOf", "toString"],
    };
    for name in order.iter() {
        let method = match ctx.realm.get_property(o, name) {
            None => continue,
            Some(PropertyDescriptor::Data { value, .. }) => value.clone(),
            Some(PropertyDescriptor::Accessor { .. }) => return Ok(JsValue::Unknown),
        };
        let f = match method {
            JsValue::Unknown => return Ok(JsValue::Unknown),
            JsValue::Object(f) => f,
            _ => continue,
        };
        match ctx.realm.get_object(f).callable.clone() {
            Some(FunctionKind::Native {
                call: Some(call), ..
            }) => {
                let result = call.call(ctx, JsValue::Object(o), vec![])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
            Some(_) => return Ok(JsValue::Unknown),
            None => {}
        }
    }
    Err(JErrorType::TypeError(
        "Cannot convert object to primitive value".to_string(),
    ))
}

pub fn to_boolean(v: &JsValue) -> Option<bool> {
    Some(match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => !(*n == 0.0 || n.is_nan()),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
        JsValue::Unknown => return None,
    })
}

/// `ToNumber` of a primitive. `None` for Unknown and for objects.
pub fn primitive_to_number(v: &JsValue) -> Option<f64> {
    Some(match v {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::Number(n) => *n,
        JsValue::String(s) => string_to_number(s),
        JsValue::Object(_) | JsValue::Unknown => return None,
    })
}

/// `ToString` of a primitive. `None` for Unknown and for objects.
pub fn primitive_to_string(v: &JsValue) -> Option<String> {
    Some(match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::Number(n) => number_to_string(*n),
        JsValue::String(s) => s.clone(),
        JsValue::Object(_) | JsValue::Unknown => return None,
    })
}

/// `ToNumber`; `Ok(None)` when the result cannot be determined.
pub fn to_number(ctx: &mut EvalContext, v: &JsValue) -> Result<Option<f64>, JErrorType> {
    match v {
        JsValue::Object(_) => {
            let pv = to_primitive(ctx, v, PreferredType::Number)?;
            Ok(primitive_to_number(&pv))
        }
        _ => Ok(primitive_to_number(v)),
    }
}

/// `ToString`; `Ok(None)` when the result cannot be determined.
pub fn to_string(ctx: &mut EvalContext, v: &JsValue) -> Result<Option<String>, JErrorType> {
    match v {
        JsValue::Object(_) => {
            let pv = to_primitive(ctx, v, PreferredType::String)?;
            Ok(primitive_to_string(&pv))
        }
        _ => Ok(primitive_to_string(v)),
    }
}

/// `ToObject`. Primitives are wrapped in a fresh object of the matching class; `Ok(None)` for
/// Unknown.
pub fn to_object(realm: &mut Realm, v: &JsValue) -> Result<Option<ObjectId>, JErrorType> {
    let (class, proto) = match v {
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(format!(
                "'{}' cannot be converted to object",
                v
            )))
        }
        JsValue::Unknown => return Ok(None),
        JsValue::Object(o) => return Ok(Some(*o)),
        JsValue::Boolean(_) => (ObjectClass::Boolean, WellKnownIntrinsics::BooleanPrototype),
        JsValue::Number(_) => (ObjectClass::Number, WellKnownIntrinsics::NumberPrototype),
        JsValue::String(_) => (ObjectClass::String, WellKnownIntrinsics::StringPrototype),
    };
    let proto = realm.get_intrinsic(proto);
    let o = realm.create_object(class, Some(proto));
    realm.get_object_mut(o).primitive_value = Some(v.clone());
    if let JsValue::String(s) = v {
        let units: Vec<u16> = s.encode_utf16().collect();
        let record = realm.get_object_mut(o);
        for (index, unit) in units.iter().enumerate() {
            record.replace_own_property(
                &index.to_string(),
                PropertyDescriptor::Data {
                    value: JsValue::String(String::from_utf16_lossy(&[*unit])),
                    writable: false,
                    enumerable: true,
                    configurable: false,
                },
            );
        }
        record.replace_own_property(
            "length",
            PropertyDescriptor::Data {
                value: JsValue::Number(units.len() as f64),
                writable: false,
                enumerable: false,
                configurable: false,
            },
        );
    }
    Ok(Some(o))
}

pub fn to_integer(n: f64) -> f64 {
    if n.is_nan() {
        0.0
    } else if n.is_infinite() || n == 0.0 {
        n
    } else {
        n.signum() * n.abs().floor()
    }
}

pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let int = n.signum() * n.abs().floor();
    int.rem_euclid(4_294_967_296.0) as u32
}

pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// Canonical numeric index, as used for array element names.
pub fn to_array_index(name: &str) -> Option<u32> {
    let n: u32 = name.parse().ok()?;
    if n != u32::MAX && n.to_string() == name {
        Some(n)
    } else {
        None
    }
}

fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}' | '\n' | '\r'
            | '\u{2028}' | '\u{2029}'
    ) || (c.is_whitespace() && !c.is_ascii())
}

/// `ToNumber` applied to a string.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .fold(0.0, |acc, d| acc * 16.0 + d as f64);
    }
    let unsigned = s.strip_prefix('+').or_else(|| s.strip_prefix('-')).unwrap_or(s);
    if unsigned == "Infinity" {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let valid = unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && unsigned.chars().next().map_or(false, |c| c != 'e' && c != 'E');
    if !valid {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// `ToString` applied to a number, using the shortest round-tripping digits.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }
    let sci = format!("{:e}", n);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exponent + 1;
    if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let sign = if point - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (point - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (point - 1).abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_like_ecmascript() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(123456789.0), "123456789");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(0.0000001), "1e-7");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.25e22), "1.25e+22");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn parses_strings_like_ecmascript() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1f"), 31.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(string_to_number(".5"), 0.5);
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("e5").is_nan());
    }

    #[test]
    fn integer_conversions_wrap() {
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_uint32(f64::NAN), 0);
        assert_eq!(to_int32(3.9), 3);
        assert_eq!(to_array_index("10"), Some(10));
        assert_eq!(to_array_index("010"), None);
        assert_eq!(to_array_index("4294967295"), None);
    }

    #[test]
    fn unknown_values_stay_unknown() {
        assert_eq!(to_boolean(&JsValue::Unknown), None);
        assert_eq!(primitive_to_number(&JsValue::Unknown), None);
        let mut realm = Realm::new();
        assert_eq!(to_object(&mut realm, &JsValue::Unknown), Ok(None));
        assert!(to_object(&mut realm, &JsValue::Null).is_err());
        let wrapped = to_object(&mut realm, &JsValue::from_str("ab")).unwrap().unwrap();
        assert_eq!(realm.get_object(wrapped).class, ObjectClass::String);
        assert!(realm.get_object(wrapped).has_own_property("1"));
    }
}
