use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::value::{JsValue, ObjectId};

/// A partially specified property descriptor, as handed to `[[DefineOwnProperty]]`.
///
/// `descriptor` carries the field values; a field only takes part in the definition when its
/// `honour_*` flag is set. A setter with neither value/writable nor get/set honoured is a
/// generic descriptor.
#[derive(Debug, Clone)]
pub struct PropertyDescriptorSetter {
    pub honour_value: bool,
    pub honour_writable: bool,
    pub honour_set: bool,
    pub honour_get: bool,
    pub honour_enumerable: bool,
    pub honour_configurable: bool,
    pub descriptor: PropertyDescriptor,
}

impl PropertyDescriptorSetter {
    pub fn new_from_property_descriptor(desc: PropertyDescriptor) -> Self {
        let is_data = desc.is_data_descriptor();
        PropertyDescriptorSetter {
            honour_value: is_data,
            honour_writable: is_data,
            honour_set: !is_data,
            honour_get: !is_data,
            honour_enumerable: true,
            honour_configurable: true,
            descriptor: desc,
        }
    }

    /// Nothing honoured yet. Fields are switched on with the `with_*` builders.
    pub fn empty() -> Self {
        PropertyDescriptorSetter {
            honour_value: false,
            honour_writable: false,
            honour_set: false,
            honour_get: false,
            honour_enumerable: false,
            honour_configurable: false,
            descriptor: PropertyDescriptor::Data {
                value: JsValue::Undefined,
                writable: false,
                enumerable: false,
                configurable: false,
            },
        }
    }

    /// `{ [[Value]]: value }`, the descriptor used by `[[Put]]` on an existing data property.
    pub fn value_only(value: JsValue) -> Self {
        Self::empty().with_value(value)
    }

    /// A data property that is writable, enumerable and configurable, as created by plain
    /// assignment.
    pub fn new_default_data(value: JsValue) -> Self {
        Self::new_from_property_descriptor(PropertyDescriptor::Data {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        })
    }

    pub fn with_value(mut self, value: JsValue) -> Self {
        self.make_data();
        if let PropertyDescriptor::Data { value: v, .. } = &mut self.descriptor {
            *v = value;
        }
        self.honour_value = true;
        self
    }

    pub fn with_writable(mut self, writable: bool) -> Self {
        self.make_data();
        if let PropertyDescriptor::Data { writable: w, .. } = &mut self.descriptor {
            *w = writable;
        }
        self.honour_writable = true;
        self
    }

    pub fn with_get(mut self, get: Option<ObjectId>) -> Self {
        self.make_accessor();
        if let PropertyDescriptor::Accessor { get: g, .. } = &mut self.descriptor {
            *g = get;
        }
        self.honour_get = true;
        self
    }

    pub fn with_set(mut self, set: Option<ObjectId>) -> Self {
        self.make_accessor();
        if let PropertyDescriptor::Accessor { set: s, .. } = &mut self.descriptor {
            *s = set;
        }
        self.honour_set = true;
        self
    }

    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.descriptor.set_enumerable(enumerable);
        self.honour_enumerable = true;
        self
    }

    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.descriptor.set_configurable(configurable);
        self.honour_configurable = true;
        self
    }

    fn make_data(&mut self) {
        if let PropertyDescriptor::Accessor {
            enumerable,
            configurable,
            ..
        } = self.descriptor
        {
            self.descriptor = PropertyDescriptor::Data {
                value: JsValue::Undefined,
                writable: false,
                enumerable,
                configurable,
            };
        }
    }

    fn make_accessor(&mut self) {
        if let PropertyDescriptor::Data {
            enumerable,
            configurable,
            ..
        } = self.descriptor
        {
            self.descriptor = PropertyDescriptor::Accessor {
                get: None,
                set: None,
                enumerable,
                configurable,
            };
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.honour_configurable
            && !self.honour_enumerable
            && !self.honour_get
            && !self.honour_set
            && !self.honour_value
            && !self.honour_writable
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.honour_value || self.honour_writable
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.honour_get || self.honour_set
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_data_descriptor() && !self.is_accessor_descriptor()
    }

    pub fn value(&self) -> Option<&JsValue> {
        match &self.descriptor {
            PropertyDescriptor::Data { value, .. } if self.honour_value => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum PropertyDescriptor {
    Data {
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<ObjectId>,
        set: Option<ObjectId>,
        enumerable: bool,
        configurable: bool,
    },
}

impl PropertyDescriptor {
    /// Builds a complete descriptor, defaulting every field the setter does not honour.
    pub fn new_from_property_descriptor_setter(desc_setter: PropertyDescriptorSetter) -> Self {
        let enumerable = desc_setter.honour_enumerable && desc_setter.descriptor.is_enumerable();
        let configurable =
            desc_setter.honour_configurable && desc_setter.descriptor.is_configurable();
        match desc_setter.descriptor {
            PropertyDescriptor::Accessor { get, set, .. }
                if desc_setter.honour_get || desc_setter.honour_set =>
            {
                PropertyDescriptor::Accessor {
                    get: if desc_setter.honour_get { get } else { None },
                    set: if desc_setter.honour_set { set } else { None },
                    enumerable,
                    configurable,
                }
            }
            PropertyDescriptor::Data {
                value, writable, ..
            } => PropertyDescriptor::Data {
                value: if desc_setter.honour_value {
                    value
                } else {
                    JsValue::Undefined
                },
                writable: desc_setter.honour_writable && writable,
                enumerable,
                configurable,
            },
            PropertyDescriptor::Accessor { .. } => PropertyDescriptor::Data {
                value: JsValue::Undefined,
                writable: false,
                enumerable,
                configurable,
            },
        }
    }

    pub fn is_enumerable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { enumerable, .. } => *enumerable,
            PropertyDescriptor::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn is_configurable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { configurable, .. } => *configurable,
            PropertyDescriptor::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_writable(&self) -> bool {
        match self {
            PropertyDescriptor::Data { writable, .. } => *writable,
            PropertyDescriptor::Accessor { .. } => false,
        }
    }

    pub fn set_enumerable(&mut self, value: bool) {
        match self {
            PropertyDescriptor::Data { enumerable, .. } => *enumerable = value,
            PropertyDescriptor::Accessor { enumerable, .. } => *enumerable = value,
        }
    }

    pub fn set_configurable(&mut self, value: bool) {
        match self {
            PropertyDescriptor::Data { configurable, .. } => *configurable = value,
            PropertyDescriptor::Accessor { configurable, .. } => *configurable = value,
        }
    }

    pub fn is_data_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Data { .. })
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        matches!(self, PropertyDescriptor::Accessor { .. })
    }
}

impl PartialEq for PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                PropertyDescriptor::Data {
                    value,
                    writable,
                    enumerable,
                    configurable,
                },
                PropertyDescriptor::Data {
                    value: other_value,
                    writable: other_writable,
                    enumerable: other_enumerable,
                    configurable: other_configurable,
                },
            ) => {
                same_value(value, other_value)
                    && writable == other_writable
                    && enumerable == other_enumerable
                    && configurable == other_configurable
            }
            (
                PropertyDescriptor::Accessor {
                    get,
                    set,
                    enumerable,
                    configurable,
                },
                PropertyDescriptor::Accessor {
                    get: other_get,
                    set: other_set,
                    enumerable: other_enumerable,
                    configurable: other_configurable,
                },
            ) => {
                get == other_get
                    && set == other_set
                    && enumerable == other_enumerable
                    && configurable == other_configurable
            }
            _ => false,
        }
    }
}
