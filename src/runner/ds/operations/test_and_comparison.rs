use std::cmp::Ordering;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{
    primitive_to_number, to_primitive, PreferredType,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

/// `SameValue`: like `===` except that NaN equals NaN and +0 differs from -0. Unknown is only the
/// same as Unknown.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
        }
        _ => a == b,
    }
}

/// `===`, `None` if either side is Unknown.
pub fn strict_equality(a: &JsValue, b: &JsValue) -> Option<bool> {
    if a.is_unknown() || b.is_unknown() {
        return None;
    }
    Some(a == b)
}

/// `==`, `Ok(None)` when the answer cannot be determined.
pub fn abstract_equality(
    ctx: &mut EvalContext,
    a: &JsValue,
    b: &JsValue,
) -> Result<Option<bool>, JErrorType> {
    Ok(Some(match (a, b) {
        (JsValue::Unknown, _) | (_, JsValue::Unknown) => return Ok(None),
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        (JsValue::Number(_), JsValue::Number(_))
        | (JsValue::String(_), JsValue::String(_))
        | (JsValue::Boolean(_), JsValue::Boolean(_))
        | (JsValue::Object(_), JsValue::Object(_)) => a == b,
        (JsValue::Object(_), _) => {
            let pa = to_primitive(ctx, a, PreferredType::Default)?;
            return abstract_equality(ctx, &pa, b);
        }
        (_, JsValue::Object(_)) => {
            let pb = to_primitive(ctx, b, PreferredType::Default)?;
            return abstract_equality(ctx, a, &pb);
        }
        _ => match (primitive_to_number(a), primitive_to_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => return Ok(None),
        },
    }))
}

/// Ordering used by `<`, `>`, `<=` and `>=`. `Ok(None)` if unknown; `Ok(Some(None))` if the
/// operands are unordered (NaN involved).
pub fn abstract_relational_comparison(
    ctx: &mut EvalContext,
    a: &JsValue,
    b: &JsValue,
) -> Result<Option<Option<Ordering>>, JErrorType> {
    let pa = to_primitive(ctx, a, PreferredType::Number)?;
    let pb = to_primitive(ctx, b, PreferredType::Number)?;
    Ok(match (&pa, &pb) {
        (JsValue::Unknown, _) | (_, JsValue::Unknown) => None,
        (JsValue::String(x), JsValue::String(y)) => {
            Some(Some(x.encode_utf16().cmp(y.encode_utf16())))
        }
        _ => match (primitive_to_number(&pa), primitive_to_number(&pb)) {
            (Some(x), Some(y)) => Some(x.partial_cmp(&y)),
            _ => None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_distinguishes_zeroes_and_equates_nan() {
        assert!(same_value(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)));
        assert!(!same_value(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
        assert!(same_value(&JsValue::from_str("a"), &JsValue::from_str("a")));
        assert!(!same_value(&JsValue::Null, &JsValue::Undefined));
    }

    #[test]
    fn strict_equality_with_unknown_is_undetermined() {
        assert_eq!(strict_equality(&JsValue::Unknown, &JsValue::Null), None);
        assert_eq!(
            strict_equality(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN)),
            Some(false)
        );
        assert_eq!(
            strict_equality(&JsValue::Number(0.0), &JsValue::Number(-0.0)),
            Some(true)
        );
    }
}
