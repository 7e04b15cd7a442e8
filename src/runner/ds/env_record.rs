use std::collections::HashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::{JsValue, ObjectId};

/// Index of a lexical environment in the realm's environment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Option<JsValue>,
    pub mutable: bool,
    pub deletable: bool,
}

pub enum EnvironmentRecord {
    Declarative(DeclarativeEnvironmentRecord),
    Object(ObjectEnvironmentRecord),
}

#[derive(Default)]
pub struct DeclarativeEnvironmentRecord {
    bindings: HashMap<String, Binding>,
    order: Vec<String>,
}

impl DeclarativeEnvironmentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn create_mutable_binding(&mut self, name: &str, deletable: bool) {
        if !self.bindings.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.bindings.insert(
            name.to_string(),
            Binding {
                value: Some(JsValue::Undefined),
                mutable: true,
                deletable,
            },
        );
    }

    pub fn create_immutable_binding(&mut self, name: &str) {
        if !self.bindings.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.bindings.insert(
            name.to_string(),
            Binding {
                value: None,
                mutable: false,
                deletable: false,
            },
        );
    }

    pub fn initialize_immutable_binding(&mut self, name: &str, value: JsValue) {
        if let Some(binding) = self.bindings.get_mut(name) {
            if binding.value.is_none() {
                binding.value = Some(value);
            }
        }
    }

    /// Assignments to immutable bindings are silently ignored outside strict code.
    pub fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            Some(binding) if binding.mutable => {
                binding.value = Some(value);
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    pub fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        match self.bindings.get(name) {
            Some(Binding { value: Some(v), .. }) => Ok(v.clone()),
            Some(Binding { value: None, .. }) => Ok(JsValue::Undefined),
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    pub fn delete_binding(&mut self, name: &str) -> bool {
        match self.bindings.get(name) {
            None => true,
            Some(b) if b.deletable => {
                self.bindings.remove(name);
                self.order.retain(|n| n != name);
                true
            }
            Some(_) => false,
        }
    }

    /// Bindings in creation order.
    pub fn binding_names(&self) -> &[String] {
        &self.order
    }
}

/// Binds identifiers to the properties of an object. The global environment is one of these.
pub struct ObjectEnvironmentRecord {
    pub binding_object: ObjectId,
    pub provide_this: bool,
}

pub struct LexEnvironment {
    pub record: EnvironmentRecord,
    pub outer: Option<EnvId>,
    /// Set when a return inside an ambiguous block was reached while this environment was the
    /// running one: whatever follows may or may not run.
    pub ambiguous_context: bool,
    pub created_ambiguity: usize,
}

impl LexEnvironment {
    pub fn new_declarative(outer: Option<EnvId>) -> Self {
        LexEnvironment {
            record: EnvironmentRecord::Declarative(DeclarativeEnvironmentRecord::new()),
            outer,
            ambiguous_context: false,
            created_ambiguity: 0,
        }
    }

    pub fn new_object(binding_object: ObjectId, outer: Option<EnvId>) -> Self {
        LexEnvironment {
            record: EnvironmentRecord::Object(ObjectEnvironmentRecord {
                binding_object,
                provide_this: false,
            }),
            outer,
            ambiguous_context: false,
            created_ambiguity: 0,
        }
    }

    pub fn as_declarative(&self) -> Option<&DeclarativeEnvironmentRecord> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => Some(d),
            EnvironmentRecord::Object(_) => None,
        }
    }

    pub fn as_declarative_mut(&mut self) -> Option<&mut DeclarativeEnvironmentRecord> {
        match &mut self.record {
            EnvironmentRecord::Declarative(d) => Some(d),
            EnvironmentRecord::Object(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immutable_binding_is_initialized_once() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        rec.create_immutable_binding("f");
        assert_eq!(rec.get_binding_value("f"), Ok(JsValue::Undefined));
        rec.initialize_immutable_binding("f", JsValue::Number(1.0));
        rec.initialize_immutable_binding("f", JsValue::Number(2.0));
        rec.set_mutable_binding("f", JsValue::Null).unwrap();
        assert_eq!(rec.get_binding_value("f"), Ok(JsValue::Number(1.0)));
    }

    #[test]
    fn missing_binding_is_a_reference_error() {
        let mut rec = DeclarativeEnvironmentRecord::new();
        assert!(matches!(
            rec.set_mutable_binding("nope", JsValue::Null),
            Err(JErrorType::ReferenceError(_))
        ));
        rec.create_mutable_binding("a", false);
        rec.create_mutable_binding("b", true);
        assert!(!rec.delete_binding("a"));
        assert!(rec.delete_binding("b"));
        assert_eq!(rec.binding_names(), &["a".to_string()]);
    }
}
