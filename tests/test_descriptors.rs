//! Object model through the built-ins: property descriptors, prototypes and extensibility.

extern crate codeprocessor;

mod processor_util;

use codeprocessor::runner::ds::error::ErrorKind;
use codeprocessor::runner::ds::value::JsValue;
use codeprocessor::runner::runtime::DiagnosticKind;
use pretty_assertions::assert_eq;
use processor_util::run;

fn assert_globals(code: &str, expected: &[(&str, JsValue)]) {
    let results = run(code);
    assert!(
        results.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        results.diagnostics
    );
    for (name, value) in expected {
        assert_eq!(results.global(name).as_ref(), Some(value), "global {}", name);
    }
}

#[test]
fn create_with_null_prototype() {
    assert_globals(
        "var o = Object.create(null);
         var noProto = Object.getPrototypeOf(o) === null;
         var p = Object.create(Object.prototype);
         var inherits = Object.prototype.isPrototypeOf(p);",
        &[
            ("noProto", JsValue::Boolean(true)),
            ("inherits", JsValue::Boolean(true)),
        ],
    );
}

#[test]
fn object_of_an_object_is_identity() {
    assert_globals(
        "var p = {}; var same = Object(p) === p; var fresh = Object(null) !== Object(null);
         var wrapped = typeof Object('s');",
        &[
            ("same", JsValue::Boolean(true)),
            ("fresh", JsValue::Boolean(true)),
            ("wrapped", JsValue::from_str("object")),
        ],
    );
}

#[test]
fn freeze_and_seal_predicates() {
    assert_globals(
        "var f = Object.freeze({ a: 1 });
         var s = Object.seal({ a: 1 });
         var e = Object.preventExtensions({});
         var frozen = Object.isFrozen(f) && Object.isSealed(f);
         var sealedOnly = Object.isSealed(s) && !Object.isFrozen(s);
         var emptyFrozen = Object.isFrozen(e);
         f.a = 2; s.a = 2; s.b = 3;
         var fa = f.a; var sa = s.a; var sb = s.b;",
        &[
            ("frozen", JsValue::Boolean(true)),
            ("sealedOnly", JsValue::Boolean(true)),
            ("emptyFrozen", JsValue::Boolean(true)),
            ("fa", JsValue::Number(1.0)),
            ("sa", JsValue::Number(2.0)),
            ("sb", JsValue::Undefined),
        ],
    );
}

#[test]
fn prevent_extensions_blocks_new_properties() {
    assert_globals(
        "var q = { kept: true }; Object.preventExtensions(q); q.x = 1;
         var ext = Object.isExtensible(q);
         var hasX = q.hasOwnProperty('x');
         var removed = delete q.kept;",
        &[
            ("ext", JsValue::Boolean(false)),
            ("hasX", JsValue::Boolean(false)),
            ("removed", JsValue::Boolean(true)),
        ],
    );
}

#[test]
fn define_property_defaults_to_non_enumerable_read_only() {
    assert_globals(
        "var o = {};
         Object.defineProperty(o, 'x', { value: 1 });
         o.x = 2;
         var d = Object.getOwnPropertyDescriptor(o, 'x');
         var summary = [d.value, d.writable, d.enumerable, d.configurable].join();
         var keys = Object.keys(o).length;
         var names = Object.getOwnPropertyNames(o).join();",
        &[
            ("summary", JsValue::from_str("1,false,false,false")),
            ("keys", JsValue::Number(0.0)),
            ("names", JsValue::from_str("x")),
        ],
    );
}

#[test]
fn redefining_a_non_configurable_property_is_reported() {
    let results = run(
        "var o = {};
         Object.defineProperty(o, 'x', { value: 1 });
         var r = Object.defineProperty(o, 'x', { value: 2 });
         var x = o.x;",
    );
    assert_eq!(results.diagnostics.len(), 1);
    assert_eq!(
        results.diagnostics[0].kind,
        DiagnosticKind::NativeException(ErrorKind::TypeError)
    );
    assert_eq!(results.global("r"), Some(JsValue::Unknown));
    assert_eq!(results.global("x"), Some(JsValue::Number(1.0)));
}

/// Script getters are never run: reading through one gives Unknown.
#[test]
fn define_properties_and_accessors() {
    assert_globals(
        "var o = Object.create({}, {
             a: { value: 1, enumerable: true },
             b: { get: function () { return 5; }, enumerable: false }
         });
         var a = o.a; var b = o.b;
         var enumerable = o.propertyIsEnumerable('a') && !o.propertyIsEnumerable('b');
         var literal = { get c() { return 7; } };
         var c = literal.c;",
        &[
            ("a", JsValue::Number(1.0)),
            ("b", JsValue::Unknown),
            ("enumerable", JsValue::Boolean(true)),
            ("c", JsValue::Unknown),
        ],
    );
}

#[test]
fn reflective_operations_on_primitives_are_type_errors() {
    let results = run("var k = Object.keys(1); var after = 1;");
    assert_eq!(results.diagnostics.len(), 1);
    assert_eq!(
        results.diagnostics[0].kind,
        DiagnosticKind::NativeException(ErrorKind::TypeError)
    );
    assert_eq!(results.global("k"), Some(JsValue::Unknown));
    assert_eq!(results.global("after"), Some(JsValue::Number(1.0)));
}

#[test]
fn arrays_maintain_length() {
    assert_globals(
        "var a = [1, 2]; a.push(3); var len = a.length;
         var last = a.pop(); var afterPop = a.length;
         a[5] = 'x'; var grown = a.length;
         a.length = 1; var truncated = a.join('-');
         var sized = new Array(3).length;
         var isArr = Array.isArray(a) && !Array.isArray({ length: 0 });",
        &[
            ("len", JsValue::Number(3.0)),
            ("last", JsValue::Number(3.0)),
            ("afterPop", JsValue::Number(2.0)),
            ("grown", JsValue::Number(6.0)),
            ("truncated", JsValue::from_str("1")),
            ("sized", JsValue::Number(3.0)),
            ("isArr", JsValue::Boolean(true)),
        ],
    );
}

#[test]
fn object_prototype_to_string_reports_the_class() {
    assert_globals(
        "function classOf(o) { o.describe = Object.prototype.toString; return o.describe(); }
         var classes = [classOf([]), classOf(new Error('x')), classOf(new Boolean(true)),
                        classOf(function () {})].join(' ');
         var plain = ({}).toString();",
        &[
            (
                "classes",
                JsValue::from_str("[object Array] [object Error] [object Boolean] [object Function]"),
            ),
            ("plain", JsValue::from_str("[object Object]")),
        ],
    );
}

#[test]
fn wrappers_and_errors() {
    assert_globals(
        "var n = new Number(5); var nv = n.valueOf() + 1; var hex = (255).toString(16);
         var s = new String('ab'); var sl = s.length; var c = 'xyz'.charAt(2);
         var b = Boolean(''); var bs = new Boolean(true).toString();
         var msg = String(new RangeError('too big'));
         var nan = isNaN('abc') && !isFinite(Infinity);",
        &[
            ("nv", JsValue::Number(6.0)),
            ("hex", JsValue::from_str("ff")),
            ("sl", JsValue::Number(2.0)),
            ("c", JsValue::from_str("z")),
            ("b", JsValue::Boolean(false)),
            ("bs", JsValue::from_str("true")),
            ("msg", JsValue::from_str("RangeError: too big")),
            ("nan", JsValue::Boolean(true)),
        ],
    );
}

#[test]
fn conversion_never_runs_script_methods() {
    assert_globals(
        "var ran = false;
         var o = { toString: function () { ran = true; return 'x'; } };
         var s = '' + o;",
        &[("ran", JsValue::Boolean(false)), ("s", JsValue::Unknown)],
    );
}
