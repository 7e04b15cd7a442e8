//! Built-in registry: the objects installed into every new realm.

use tracing::debug;

use super::types::{BuiltInFn, BuiltInObject};
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::ObjectClass;
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::realm::{Realm, WellKnownIntrinsics};
use crate::runner::ds::value::{JsValue, ObjectId};
use crate::runner::std_lib::register_core_builtins;

const GLOBAL_NAME: &str = "global";

/// Registry for built-in objects. Later registrations of the same name replace earlier ones.
pub struct BuiltInRegistry {
    objects: Vec<BuiltInObject>,
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry { objects: vec![] }
    }

    /// Create a registry with the core built-ins.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.retain(|o| o.name != obj.name);
        self.objects.push(obj);
    }

    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn get_object_mut(&mut self, name: &str) -> Option<&mut BuiltInObject> {
        self.objects.iter_mut().find(|o| o.name == name)
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.get_object(name).is_some()
    }

    pub fn get_method(&self, object: &str, method: &str) -> Option<&BuiltInFn> {
        self.get_object(object).and_then(|obj| {
            obj.methods
                .iter()
                .find(|(name, _)| name == method)
                .map(|(_, f)| f)
        })
    }

    /// Replaces (or adds) a method on a registered object.
    pub fn override_method(&mut self, object: &str, method: &str, func: BuiltInFn) -> bool {
        match self.get_object_mut(object) {
            Some(obj) => {
                obj.methods.retain(|(name, _)| name != method);
                obj.methods.push((method.to_string(), func));
                true
            }
            None => false,
        }
    }

    /// Installs every registered object into `realm`.
    pub fn install(&self, realm: &mut Realm) {
        let global = realm.global_object();
        for obj in &self.objects {
            debug!(name = %obj.name, "install built-in");
            let (target, proto) = if obj.name == GLOBAL_NAME {
                (global, None)
            } else if let Some(ctor) = WellKnownIntrinsics::constructor_by_name(&obj.name) {
                let target = realm.get_intrinsic(ctor);
                let proto = match realm.get_object(target).get_own_property("prototype") {
                    Some(PropertyDescriptor::Data {
                        value: JsValue::Object(p),
                        ..
                    }) => Some(*p),
                    _ => None,
                };
                if let Some(FunctionKind::Native {
                    call, construct, ..
                }) = &mut realm.get_object_mut(target).callable
                {
                    if obj.call.is_some() {
                        *call = obj.call.clone();
                    }
                    if obj.constructor.is_some() {
                        *construct = obj.constructor.clone();
                    }
                }
                define_global(realm, global, &obj.name, JsValue::Object(target));
                (target, proto)
            } else {
                let target = create_host_object(realm, obj);
                define_global(realm, global, &obj.name, JsValue::Object(target));
                let proto = if obj.prototype_methods.is_empty() && obj.prototype_properties.is_empty() {
                    None
                } else {
                    let proto = realm.create_ordinary_object();
                    link_prototype(realm, target, proto);
                    Some(proto)
                };
                (target, proto)
            };
            for (name, func) in &obj.methods {
                define_method(realm, target, name, func.clone());
            }
            if let Some(proto) = proto {
                for (name, func) in &obj.prototype_methods {
                    define_method(realm, proto, name, func.clone());
                }
                for (name, value) in &obj.prototype_properties {
                    realm.get_object_mut(proto).replace_own_property(
                        name,
                        PropertyDescriptor::Data {
                            value: value.clone(),
                            writable: true,
                            enumerable: false,
                            configurable: true,
                        },
                    );
                }
            }
            for (name, value) in &obj.properties {
                realm.get_object_mut(target).replace_own_property(
                    name,
                    PropertyDescriptor::Data {
                        value: value.clone(),
                        writable: false,
                        enumerable: false,
                        configurable: false,
                    },
                );
            }
        }
    }
}

fn create_host_object(realm: &mut Realm, obj: &BuiltInObject) -> ObjectId {
    if obj.call.is_some() || obj.constructor.is_some() {
        realm.create_function_object(FunctionKind::Native {
            name: obj.name.clone(),
            call: obj.call.clone(),
            construct: obj.constructor.clone(),
        })
    } else {
        let proto = realm.get_intrinsic(WellKnownIntrinsics::ObjectPrototype);
        realm.create_object(ObjectClass::Object, Some(proto))
    }
}

fn link_prototype(realm: &mut Realm, ctor: ObjectId, proto: ObjectId) {
    realm.get_object_mut(ctor).replace_own_property(
        "prototype",
        PropertyDescriptor::Data {
            value: JsValue::Object(proto),
            writable: false,
            enumerable: false,
            configurable: false,
        },
    );
    realm.get_object_mut(proto).replace_own_property(
        "constructor",
        PropertyDescriptor::Data {
            value: JsValue::Object(ctor),
            writable: true,
            enumerable: false,
            configurable: true,
        },
    );
}

fn define_method(realm: &mut Realm, target: ObjectId, name: &str, func: BuiltInFn) {
    let f = realm.create_function_object(FunctionKind::native(name, func));
    realm.get_object_mut(target).replace_own_property(
        name,
        PropertyDescriptor::Data {
            value: JsValue::Object(f),
            writable: true,
            enumerable: false,
            configurable: true,
        },
    );
}

fn define_global(realm: &mut Realm, global: ObjectId, name: &str, value: JsValue) {
    realm.get_object_mut(global).replace_own_property(
        name,
        PropertyDescriptor::Data {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        },
    );
}
