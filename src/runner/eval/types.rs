//! Completion records and references.

use serde::Serialize;

use crate::runner::ds::env_record::EnvId;
use crate::runner::ds::error::FatalError;
use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompletionType {
    Normal,
    Return,
    Throw,
    Break,
    Continue,
}

/// Completion record. Every rule produces exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
    /// Target label for break/continue.
    pub target: Option<String>,
}

impl Completion {
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
            target: None,
        }
    }

    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
            target: None,
        }
    }

    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
            target: None,
        }
    }

    pub fn throw(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Throw,
            value: Some(value),
            target: None,
        }
    }

    pub fn break_completion(target: Option<String>) -> Self {
        Completion {
            completion_type: CompletionType::Break,
            value: None,
            target,
        }
    }

    pub fn continue_completion(target: Option<String>) -> Self {
        Completion {
            completion_type: CompletionType::Continue,
            value: None,
            target,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self.completion_type, CompletionType::Normal)
    }

    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    pub fn is_throw(&self) -> bool {
        matches!(self.completion_type, CompletionType::Throw)
    }

    /// The value, or undefined if none.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// Fills in the value of a completion that has none.
    pub fn update_empty(self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            Completion { value, ..self }
        } else {
            self
        }
    }
}

pub type EvalResult = Result<Completion, FatalError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceBase {
    /// A property of this value. The value may be a primitive (or Unknown).
    Value(JsValue),
    Environment(EnvId),
    Unresolvable,
    /// The referenced name could not be determined.
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub base: ReferenceBase,
    pub referenced_name: String,
}

impl Reference {
    pub fn property(base: JsValue, name: impl Into<String>) -> Self {
        Reference {
            base: ReferenceBase::Value(base),
            referenced_name: name.into(),
        }
    }

    pub fn environment(env: EnvId, name: impl Into<String>) -> Self {
        Reference {
            base: ReferenceBase::Environment(env),
            referenced_name: name.into(),
        }
    }

    pub fn unresolvable(name: impl Into<String>) -> Self {
        Reference {
            base: ReferenceBase::Unresolvable,
            referenced_name: name.into(),
        }
    }

    pub fn unknown() -> Self {
        Reference {
            base: ReferenceBase::Unknown,
            referenced_name: String::new(),
        }
    }

    pub fn is_property_reference(&self) -> bool {
        matches!(self.base, ReferenceBase::Value(_))
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }

    /// `this` for a call through this reference.
    pub fn get_this_value(&self) -> JsValue {
        match &self.base {
            ReferenceBase::Value(base) => base.clone(),
            ReferenceBase::Unknown => JsValue::Unknown,
            _ => JsValue::Undefined,
        }
    }
}

/// Outcome of evaluating an expression for its reference: the reference, or the abrupt
/// completion produced while evaluating its base.
pub type ReferenceResult = Result<Result<Reference, Completion>, FatalError>;
