use std::collections::HashSet;

use crate::runner::ds::env_record::{EnvId, LexEnvironment};
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::{ObjectClass, ObjectRecord};
use crate::runner::ds::object_property::PropertyDescriptor;
use crate::runner::ds::value::{JsValue, ObjectId};

/// Objects that every realm starts with. They are allocated first and in this order, so the
/// discriminant doubles as the object id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownIntrinsics {
    ObjectPrototype,
    FunctionPrototype,
    ArrayPrototype,
    BooleanPrototype,
    NumberPrototype,
    StringPrototype,
    ErrorPrototype,
    TypeErrorPrototype,
    RangeErrorPrototype,
    ReferenceErrorPrototype,
    SyntaxErrorPrototype,
    Object,
    Function,
    Array,
    Boolean,
    Number,
    String,
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
    GlobalObject,
}

impl WellKnownIntrinsics {
    pub const ALL: [WellKnownIntrinsics; 23] = [
        WellKnownIntrinsics::ObjectPrototype,
        WellKnownIntrinsics::FunctionPrototype,
        WellKnownIntrinsics::ArrayPrototype,
        WellKnownIntrinsics::BooleanPrototype,
        WellKnownIntrinsics::NumberPrototype,
        WellKnownIntrinsics::StringPrototype,
        WellKnownIntrinsics::ErrorPrototype,
        WellKnownIntrinsics::TypeErrorPrototype,
        WellKnownIntrinsics::RangeErrorPrototype,
        WellKnownIntrinsics::ReferenceErrorPrototype,
        WellKnownIntrinsics::SyntaxErrorPrototype,
        WellKnownIntrinsics::Object,
        WellKnownIntrinsics::Function,
        WellKnownIntrinsics::Array,
        WellKnownIntrinsics::Boolean,
        WellKnownIntrinsics::Number,
        WellKnownIntrinsics::String,
        WellKnownIntrinsics::Error,
        WellKnownIntrinsics::TypeError,
        WellKnownIntrinsics::RangeError,
        WellKnownIntrinsics::ReferenceError,
        WellKnownIntrinsics::SyntaxError,
        WellKnownIntrinsics::GlobalObject,
    ];

    /// Constructor and the prototype object it creates instances from.
    const CONSTRUCTORS: [(WellKnownIntrinsics, WellKnownIntrinsics); 11] = [
        (WellKnownIntrinsics::Object, WellKnownIntrinsics::ObjectPrototype),
        (WellKnownIntrinsics::Function, WellKnownIntrinsics::FunctionPrototype),
        (WellKnownIntrinsics::Array, WellKnownIntrinsics::ArrayPrototype),
        (WellKnownIntrinsics::Boolean, WellKnownIntrinsics::BooleanPrototype),
        (WellKnownIntrinsics::Number, WellKnownIntrinsics::NumberPrototype),
        (WellKnownIntrinsics::String, WellKnownIntrinsics::StringPrototype),
        (WellKnownIntrinsics::Error, WellKnownIntrinsics::ErrorPrototype),
        (WellKnownIntrinsics::TypeError, WellKnownIntrinsics::TypeErrorPrototype),
        (WellKnownIntrinsics::RangeError, WellKnownIntrinsics::RangeErrorPrototype),
        (WellKnownIntrinsics::ReferenceError, WellKnownIntrinsics::ReferenceErrorPrototype),
        (WellKnownIntrinsics::SyntaxError, WellKnownIntrinsics::SyntaxErrorPrototype),
    ];

    /// Looks up a constructor intrinsic by its global name.
    pub fn constructor_by_name(name: &str) -> Option<WellKnownIntrinsics> {
        Self::CONSTRUCTORS
            .iter()
            .map(|(ctor, _)| *ctor)
            .find(|ctor| ctor.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            WellKnownIntrinsics::ObjectPrototype => "Object.prototype",
            WellKnownIntrinsics::FunctionPrototype => "Function.prototype",
            WellKnownIntrinsics::ArrayPrototype => "Array.prototype",
            WellKnownIntrinsics::BooleanPrototype => "Boolean.prototype",
            WellKnownIntrinsics::NumberPrototype => "Number.prototype",
            WellKnownIntrinsics::StringPrototype => "String.prototype",
            WellKnownIntrinsics::ErrorPrototype => "Error.prototype",
            WellKnownIntrinsics::TypeErrorPrototype => "TypeError.prototype",
            WellKnownIntrinsics::RangeErrorPrototype => "RangeError.prototype",
            WellKnownIntrinsics::ReferenceErrorPrototype => "ReferenceError.prototype",
            WellKnownIntrinsics::SyntaxErrorPrototype => "SyntaxError.prototype",
            WellKnownIntrinsics::Object => "Object",
            WellKnownIntrinsics::Function => "Function",
            WellKnownIntrinsics::Array => "Array",
            WellKnownIntrinsics::Boolean => "Boolean",
            WellKnownIntrinsics::Number => "Number",
            WellKnownIntrinsics::String => "String",
            WellKnownIntrinsics::Error => "Error",
            WellKnownIntrinsics::TypeError => "TypeError",
            WellKnownIntrinsics::RangeError => "RangeError",
            WellKnownIntrinsics::ReferenceError => "ReferenceError",
            WellKnownIntrinsics::SyntaxError => "SyntaxError",
            WellKnownIntrinsics::GlobalObject => "global",
        }
    }

    fn shape(&self) -> (ObjectClass, Option<WellKnownIntrinsics>) {
        use WellKnownIntrinsics::*;
        match self {
            ObjectPrototype => (ObjectClass::Object, None),
            FunctionPrototype => (ObjectClass::Function, Some(ObjectPrototype)),
            ArrayPrototype => (ObjectClass::Array, Some(ObjectPrototype)),
            BooleanPrototype => (ObjectClass::Boolean, Some(ObjectPrototype)),
            NumberPrototype => (ObjectClass::Number, Some(ObjectPrototype)),
            StringPrototype => (ObjectClass::String, Some(ObjectPrototype)),
            ErrorPrototype => (ObjectClass::Error, Some(ObjectPrototype)),
            TypeErrorPrototype | RangeErrorPrototype | ReferenceErrorPrototype
            | SyntaxErrorPrototype => (ObjectClass::Error, Some(ErrorPrototype)),
            GlobalObject => (ObjectClass::Object, Some(ObjectPrototype)),
            _ => (ObjectClass::Function, Some(FunctionPrototype)),
        }
    }
}

/// The object and environment tables of one processing run.
pub struct Realm {
    objects: Vec<ObjectRecord>,
    environments: Vec<LexEnvironment>,
    global_env: EnvId,
    pub(crate) ambiguity_level: usize,
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

impl Realm {
    pub fn new() -> Self {
        let mut realm = Realm {
            objects: vec![],
            environments: vec![],
            global_env: EnvId(0),
            ambiguity_level: 0,
        };
        for intrinsic in WellKnownIntrinsics::ALL.iter() {
            let (class, proto) = intrinsic.shape();
            let mut record = ObjectRecord::new(class, proto.map(|p| ObjectId(p as usize)));
            if class == ObjectClass::Function {
                record.callable = Some(FunctionKind::Native {
                    name: intrinsic.name().to_string(),
                    call: None,
                    construct: None,
                });
            }
            realm.objects.push(record);
        }
        let set_primitive = |realm: &mut Realm, w: WellKnownIntrinsics, v: JsValue| {
            realm.get_object_mut(realm.get_intrinsic(w)).primitive_value = Some(v);
        };
        set_primitive(&mut realm, WellKnownIntrinsics::BooleanPrototype, JsValue::Boolean(false));
        set_primitive(&mut realm, WellKnownIntrinsics::NumberPrototype, JsValue::Number(0.0));
        set_primitive(
            &mut realm,
            WellKnownIntrinsics::StringPrototype,
            JsValue::String(String::new()),
        );
        let array_proto = realm.get_intrinsic(WellKnownIntrinsics::ArrayPrototype);
        realm.get_object_mut(array_proto).replace_own_property(
            "length",
            PropertyDescriptor::Data {
                value: JsValue::Number(0.0),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        for (ctor, proto) in WellKnownIntrinsics::CONSTRUCTORS.iter() {
            let ctor = realm.get_intrinsic(*ctor);
            let proto = realm.get_intrinsic(*proto);
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
        let global = realm.get_intrinsic(WellKnownIntrinsics::GlobalObject);
        realm.global_env = realm.new_environment(LexEnvironment::new_object(global, None));
        realm
    }

    pub fn get_intrinsic(&self, intrinsic: WellKnownIntrinsics) -> ObjectId {
        ObjectId(intrinsic as usize)
    }

    pub fn global_object(&self) -> ObjectId {
        self.get_intrinsic(WellKnownIntrinsics::GlobalObject)
    }

    pub fn global_env(&self) -> EnvId {
        self.global_env
    }

    pub fn get_object(&self, id: ObjectId) -> &ObjectRecord {
        &self.objects[id.0]
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> &mut ObjectRecord {
        &mut self.objects[id.0]
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn create_object(&mut self, class: ObjectClass, prototype: Option<ObjectId>) -> ObjectId {
        let mut record = ObjectRecord::new(class, prototype);
        record.created_ambiguity = self.ambiguity_level;
        self.objects.push(record);
        ObjectId(self.objects.len() - 1)
    }

    /// A plain object inheriting from `Object.prototype`.
    pub fn create_ordinary_object(&mut self) -> ObjectId {
        let proto = self.get_intrinsic(WellKnownIntrinsics::ObjectPrototype);
        self.create_object(ObjectClass::Object, Some(proto))
    }

    pub fn create_array(&mut self, elements: Vec<JsValue>) -> ObjectId {
        let proto = self.get_intrinsic(WellKnownIntrinsics::ArrayPrototype);
        let array = self.create_object(ObjectClass::Array, Some(proto));
        let len = elements.len();
        let record = self.get_object_mut(array);
        for (index, value) in elements.into_iter().enumerate() {
            record.replace_own_property(
                &index.to_string(),
                PropertyDescriptor::Data {
                    value,
                    writable: true,
                    enumerable: true,
                    configurable: true,
                },
            );
        }
        record.replace_own_property(
            "length",
            PropertyDescriptor::Data {
                value: JsValue::Number(len as f64),
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        array
    }

    pub fn create_function_object(&mut self, kind: FunctionKind) -> ObjectId {
        let proto = self.get_intrinsic(WellKnownIntrinsics::FunctionPrototype);
        let f = self.create_object(ObjectClass::Function, Some(proto));
        self.get_object_mut(f).callable = Some(kind);
        f
    }

    pub fn new_environment(&mut self, mut env: LexEnvironment) -> EnvId {
        env.created_ambiguity = self.ambiguity_level;
        self.environments.push(env);
        EnvId(self.environments.len() - 1)
    }

    pub fn get_environment(&self, id: EnvId) -> &LexEnvironment {
        &self.environments[id.0]
    }

    pub fn get_environment_mut(&mut self, id: EnvId) -> &mut LexEnvironment {
        &mut self.environments[id.0]
    }

    /// `[[GetProperty]]`: the own property or the nearest one up the prototype chain.
    pub fn get_property(&self, id: ObjectId, name: &str) -> Option<&PropertyDescriptor> {
        let mut current = Some(id);
        while let Some(o) = current {
            let record = self.get_object(o);
            if let Some(desc) = record.get_own_property(name) {
                return Some(desc);
            }
            current = record.get_prototype_of();
        }
        None
    }

    pub fn has_property(&self, id: ObjectId, name: &str) -> bool {
        self.get_property(id, name).is_some()
    }

    pub fn is_callable(&self, value: &JsValue) -> bool {
        match value {
            JsValue::Object(o) => self.get_object(*o).is_callable(),
            _ => false,
        }
    }

    /// True if `proto` appears on the prototype chain of `id` (excluding `id` itself).
    pub fn inherits_from(&self, id: ObjectId, proto: ObjectId) -> bool {
        let mut current = self.get_object(id).get_prototype_of();
        while let Some(o) = current {
            if o == proto {
                return true;
            }
            current = self.get_object(o).get_prototype_of();
        }
        false
    }

    /// Names visited by `for-in`: enumerable properties of the object and its prototypes,
    /// skipping names shadowed further down the chain.
    pub fn enumerable_property_names(&self, id: ObjectId) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = vec![];
        let mut current = Some(id);
        while let Some(o) = current {
            let record = self.get_object(o);
            for name in record.own_property_keys() {
                if !seen.insert(name.clone()) {
                    continue;
                }
                if record
                    .get_own_property(&name)
                    .map(|d| d.is_enumerable())
                    .unwrap_or(false)
                {
                    names.push(name);
                }
            }
            current = record.get_prototype_of();
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsics_are_linked() {
        let realm = Realm::new();
        let object_ctor = realm.get_intrinsic(WellKnownIntrinsics::Object);
        let object_proto = realm.get_intrinsic(WellKnownIntrinsics::ObjectPrototype);
        assert_eq!(realm.get_object(object_proto).get_prototype_of(), None);
        assert!(realm.get_object(object_ctor).is_callable());
        assert_eq!(
            realm.get_object(object_proto).get_own_property("constructor"),
            Some(&PropertyDescriptor::Data {
                value: JsValue::Object(object_ctor),
                writable: true,
                enumerable: false,
                configurable: true,
            })
        );
        let type_error_proto = realm.get_intrinsic(WellKnownIntrinsics::TypeErrorPrototype);
        let error_proto = realm.get_intrinsic(WellKnownIntrinsics::ErrorPrototype);
        assert!(realm.inherits_from(type_error_proto, error_proto));
        assert!(realm.inherits_from(type_error_proto, object_proto));
    }

    #[test]
    fn arrays_carry_length() {
        let mut realm = Realm::new();
        let a = realm.create_array(vec![JsValue::Null, JsValue::Boolean(true)]);
        assert_eq!(
            realm.get_object(a).own_property_keys(),
            vec!["0".to_string(), "1".to_string(), "length".to_string()]
        );
        assert!(realm.has_property(a, "constructor"));
    }

    #[test]
    fn enumeration_skips_shadowed_and_hidden_names() {
        let mut realm = Realm::new();
        let proto = realm.create_ordinary_object();
        let child = realm.create_object(ObjectClass::Object, Some(proto));
        let visible = |v| PropertyDescriptor::Data {
            value: v,
            writable: true,
            enumerable: true,
            configurable: true,
        };
        realm
            .get_object_mut(proto)
            .replace_own_property("a", visible(JsValue::Null));
        realm
            .get_object_mut(proto)
            .replace_own_property("b", visible(JsValue::Null));
        realm.get_object_mut(child).replace_own_property(
            "a",
            PropertyDescriptor::Data {
                value: JsValue::Null,
                writable: true,
                enumerable: false,
                configurable: true,
            },
        );
        realm
            .get_object_mut(child)
            .replace_own_property("c", visible(JsValue::Null));
        assert_eq!(
            realm.enumerable_property_names(child),
            vec!["c".to_string(), "b".to_string()]
        );
    }
}
