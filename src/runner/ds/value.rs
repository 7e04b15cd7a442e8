use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};

use crate::runner::ds::operations::type_conversion::{
    number_to_string, TYPE_STR_NULL, TYPE_STR_UNDEFINED,
};

/// Index of an object in the realm's object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    String(String),
    Number(f64),
    Object(ObjectId),
    /// A value that cannot be determined statically.
    Unknown,
}

impl JsValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, JsValue::Unknown)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_undefined_or_null(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            JsValue::Object(o) => Some(*o),
            _ => None,
        }
    }

    pub fn from_str(s: &str) -> Self {
        JsValue::String(s.to_string())
    }
}

/// True if any of the operands is [`JsValue::Unknown`].
pub fn any_unknown<'a>(values: impl IntoIterator<Item = &'a JsValue>) -> bool {
    values.into_iter().any(|v| v.is_unknown())
}

impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "{}", TYPE_STR_UNDEFINED),
            JsValue::Null => write!(f, "{}", TYPE_STR_NULL),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::String(s) => write!(f, "\"{}\"", s),
            JsValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            JsValue::Object(o) => write!(f, "object{}", o),
            JsValue::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Number(n) => write!(f, "JsValue::Number({:?})", n),
            JsValue::Object(o) => write!(f, "JsValue::Object({})", o),
            JsValue::Unknown => write!(f, "JsValue::Unknown"),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Unknown, JsValue::Unknown) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for JsValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            JsValue::Boolean(b) => serializer.serialize_bool(*b),
            JsValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            JsValue::String(s) => serializer.serialize_str(s),
            JsValue::Null => serializer.serialize_none(),
            _ => serializer.serialize_str(&self.to_string()),
        }
    }
}
