use std::collections::HashMap;
use std::fmt;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::value::{JsValue, ObjectId};

/// The `[[Class]]` internal property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Object,
    Array,
    Function,
    Error,
    Boolean,
    Number,
    String,
    Arguments,
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One entry in the realm's object table.
///
/// Properties are only ever changed through [`ObjectRecord::define_own_property`] and
/// [`ObjectRecord::delete`], so the descriptor invariants hold for every object.
pub struct ObjectRecord {
    pub class: ObjectClass,
    properties: HashMap<String, PropertyDescriptor>,
    property_order: Vec<String>,
    prototype: Option<ObjectId>,
    extensible: bool,
    /// `[[PrimitiveValue]]` of Boolean, Number and String wrappers.
    pub primitive_value: Option<JsValue>,
    pub callable: Option<FunctionKind>,
    /// Ambiguity level that was active when the object was created. Writes made at a deeper
    /// level may or may not have happened.
    pub created_ambiguity: usize,
}

impl ObjectRecord {
    pub fn new(class: ObjectClass, prototype: Option<ObjectId>) -> Self {
        ObjectRecord {
            class,
            properties: HashMap::new(),
            property_order: vec![],
            prototype,
            extensible: true,
            primitive_value: None,
            callable: None,
            created_ambiguity: 0,
        }
    }

    pub fn get_prototype_of(&self) -> Option<ObjectId> {
        self.prototype
    }

    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    pub fn is_callable(&self) -> bool {
        self.callable.is_some()
    }

    pub fn get_own_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    pub fn has_own_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Own property names in insertion order.
    pub fn own_property_keys(&self) -> Vec<String> {
        self.property_order.clone()
    }

    pub fn own_property_count(&self) -> usize {
        self.property_order.len()
    }

    /// Stores a descriptor without validation. Used while building fresh objects and for the
    /// `length` of arrays once the new value has been checked.
    pub(crate) fn replace_own_property(&mut self, name: &str, desc: PropertyDescriptor) {
        if !self.properties.contains_key(name) {
            self.property_order.push(name.to_string());
        }
        self.properties.insert(name.to_string(), desc);
    }

    /// `[[DefineOwnProperty]]` for ordinary objects.
    pub fn define_own_property(
        &mut self,
        name: &str,
        desc: PropertyDescriptorSetter,
        throw: bool,
    ) -> Result<bool, JErrorType> {
        let reject = |reason: &str| {
            if throw {
                Err(JErrorType::TypeError(format!(
                    "Cannot redefine property: {} ({})",
                    name, reason
                )))
            } else {
                Ok(false)
            }
        };
        let current = match self.properties.get(name) {
            None => {
                if !self.extensible {
                    return reject("object is not extensible");
                }
                let new_desc = PropertyDescriptor::new_from_property_descriptor_setter(desc);
                self.replace_own_property(name, new_desc);
                return Ok(true);
            }
            Some(current) => current.clone(),
        };
        if desc.is_empty() {
            return Ok(true);
        }
        if !current.is_configurable() {
            if desc.honour_configurable && desc.descriptor.is_configurable() {
                return reject("property is not configurable");
            }
            if desc.honour_enumerable
                && desc.descriptor.is_enumerable() != current.is_enumerable()
            {
                return reject("property is not configurable");
            }
        }
        let base = if desc.is_generic_descriptor() {
            current
        } else if current.is_data_descriptor() != desc.is_data_descriptor() {
            if !current.is_configurable() {
                return reject("property is not configurable");
            }
            let enumerable = current.is_enumerable();
            let configurable = current.is_configurable();
            if current.is_data_descriptor() {
                PropertyDescriptor::Accessor {
                    get: None,
                    set: None,
                    enumerable,
                    configurable,
                }
            } else {
                PropertyDescriptor::Data {
                    value: JsValue::Undefined,
                    writable: false,
                    enumerable,
                    configurable,
                }
            }
        } else {
            match (&current, &desc.descriptor) {
                (
                    PropertyDescriptor::Data {
                        value: current_value,
                        writable: false,
                        configurable: false,
                        ..
                    },
                    PropertyDescriptor::Data {
                        value, writable, ..
                    },
                ) => {
                    if desc.honour_writable && *writable {
                        return reject("property is not writable");
                    }
                    if desc.honour_value && !same_value(value, current_value) {
                        return reject("property is not writable");
                    }
                }
                (
                    PropertyDescriptor::Accessor {
                        get: current_get,
                        set: current_set,
                        configurable: false,
                        ..
                    },
                    PropertyDescriptor::Accessor { get, set, .. },
                ) => {
                    if desc.honour_get && get != current_get {
                        return reject("getter is not configurable");
                    }
                    if desc.honour_set && set != current_set {
                        return reject("setter is not configurable");
                    }
                }
                _ => {}
            }
            current
        };
        let merged = merge_descriptor(base, &desc);
        self.replace_own_property(name, merged);
        Ok(true)
    }

    /// `[[Delete]]`.
    pub fn delete(&mut self, name: &str, throw: bool) -> Result<bool, JErrorType> {
        match self.properties.get(name) {
            None => Ok(true),
            Some(desc) if desc.is_configurable() => {
                self.properties.remove(name);
                self.property_order.retain(|n| n != name);
                Ok(true)
            }
            Some(_) => {
                if throw {
                    Err(JErrorType::TypeError(format!(
                        "Cannot delete property '{}'",
                        name
                    )))
                } else {
                    Ok(false)
                }
            }
        }
    }
}

/// Copies every honoured field of `desc` onto `base`, which has the same shape as `desc`
/// (or `desc` is generic).
fn merge_descriptor(base: PropertyDescriptor, desc: &PropertyDescriptorSetter) -> PropertyDescriptor {
    let mut merged = match (base, &desc.descriptor) {
        (
            PropertyDescriptor::Data {
                value,
                writable,
                enumerable,
                configurable,
            },
            PropertyDescriptor::Data {
                value: new_value,
                writable: new_writable,
                ..
            },
        ) => PropertyDescriptor::Data {
            value: if desc.honour_value {
                new_value.clone()
            } else {
                value
            },
            writable: if desc.honour_writable {
                *new_writable
            } else {
                writable
            },
            enumerable,
            configurable,
        },
        (
            PropertyDescriptor::Accessor {
                get,
                set,
                enumerable,
                configurable,
            },
            PropertyDescriptor::Accessor {
                get: new_get,
                set: new_set,
                ..
            },
        ) => PropertyDescriptor::Accessor {
            get: if desc.honour_get { *new_get } else { get },
            set: if desc.honour_set { *new_set } else { set },
            enumerable,
            configurable,
        },
        (base, _) => base,
    };
    if desc.honour_enumerable {
        merged.set_enumerable(desc.descriptor.is_enumerable());
    }
    if desc.honour_configurable {
        merged.set_configurable(desc.descriptor.is_configurable());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> PropertyDescriptor {
        PropertyDescriptor::Data {
            value,
            writable,
            enumerable,
            configurable,
        }
    }

    #[test]
    fn missing_attributes_default_to_false() {
        let mut o = ObjectRecord::new(ObjectClass::Object, None);
        let desc = PropertyDescriptorSetter::empty().with_value(JsValue::Number(1.0));
        assert_eq!(o.define_own_property("a", desc, true), Ok(true));
        assert_eq!(
            o.get_own_property("a"),
            Some(&data(JsValue::Number(1.0), false, false, false))
        );
    }

    #[test]
    fn redefinition_merges_with_current() {
        let mut o = ObjectRecord::new(ObjectClass::Object, None);
        o.define_own_property(
            "a",
            PropertyDescriptorSetter::new_default_data(JsValue::Number(1.0)),
            true,
        )
        .unwrap();
        o.define_own_property("a", PropertyDescriptorSetter::empty().with_enumerable(false), true)
            .unwrap();
        assert_eq!(
            o.get_own_property("a"),
            Some(&data(JsValue::Number(1.0), true, false, true))
        );
    }

    #[test]
    fn non_configurable_rejects_widening() {
        let mut o = ObjectRecord::new(ObjectClass::Object, None);
        o.define_own_property(
            "a",
            PropertyDescriptorSetter::empty().with_value(JsValue::Number(1.0)),
            true,
        )
        .unwrap();
        let widen = PropertyDescriptorSetter::empty().with_configurable(true);
        assert_eq!(o.define_own_property("a", widen.clone(), false), Ok(false));
        assert!(matches!(
            o.define_own_property("a", widen, true),
            Err(JErrorType::TypeError(_))
        ));
        let change_value = PropertyDescriptorSetter::value_only(JsValue::Number(2.0));
        assert_eq!(o.define_own_property("a", change_value, false), Ok(false));
        let same_value = PropertyDescriptorSetter::value_only(JsValue::Number(1.0));
        assert_eq!(o.define_own_property("a", same_value, false), Ok(true));
    }

    #[test]
    fn data_to_accessor_conversion_keeps_flags() {
        let mut o = ObjectRecord::new(ObjectClass::Object, None);
        o.define_own_property(
            "a",
            PropertyDescriptorSetter::new_default_data(JsValue::Null),
            true,
        )
        .unwrap();
        o.define_own_property(
            "a",
            PropertyDescriptorSetter::empty().with_get(Some(ObjectId(3))),
            true,
        )
        .unwrap();
        assert_eq!(
            o.get_own_property("a"),
            Some(&PropertyDescriptor::Accessor {
                get: Some(ObjectId(3)),
                set: None,
                enumerable: true,
                configurable: true,
            })
        );
    }

    #[test]
    fn not_extensible_returns_false_and_keeps_properties() {
        let mut o = ObjectRecord::new(ObjectClass::Object, None);
        o.define_own_property(
            "kept",
            PropertyDescriptorSetter::new_default_data(JsValue::Boolean(true)),
            true,
        )
        .unwrap();
        o.prevent_extensions();
        let added = PropertyDescriptorSetter::new_default_data(JsValue::Null);
        assert_eq!(o.define_own_property("added", added, false), Ok(false));
        assert_eq!(o.own_property_keys(), vec!["kept".to_string()]);
    }

    #[test]
    fn delete_respects_configurable_and_order() {
        let mut o = ObjectRecord::new(ObjectClass::Object, None);
        for name in ["x", "y", "z"] {
            o.define_own_property(
                name,
                PropertyDescriptorSetter::new_default_data(JsValue::Null),
                true,
            )
            .unwrap();
        }
        o.define_own_property("y", PropertyDescriptorSetter::empty().with_configurable(false), true)
            .unwrap();
        assert_eq!(o.delete("x", false), Ok(true));
        assert_eq!(o.delete("y", false), Ok(false));
        assert!(o.delete("y", true).is_err());
        assert_eq!(o.own_property_keys(), vec!["y".to_string(), "z".to_string()]);
    }
}
