//! Tests for exportAll

use super::*;

use jsnative::{PropertyDescriptor, PropertyFlags};

fn export_all(rt: &mut Runtime, exports: JsValue, source: JsValue) -> JsResult<JsValue> {
    rt.call_builtin(BuiltinMethod::ExportAll, &[exports, source])
}

#[test]
fn test_export_all_skips_default_and_non_enumerable() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let exports = object_with(&mut rt, &scope, &[]);
    let source = object_with(
        &mut rt,
        &scope,
        &[("default", JsValue::from(1)), ("x", JsValue::from(2))],
    );
    rt.define_own_property(
        source.id(),
        PropertyKey::from("y"),
        PropertyDescriptor::with_flags(JsValue::from(3), PropertyFlags::hidden()),
        PropOpFlags::THROW,
    )
    .unwrap();

    let result = export_all(&mut rt, exports.value(), source.value()).unwrap();
    assert!(result.is_undefined());
    assert_eq!(own_keys(&mut rt, exports.id()), vec!["x"]);
    assert_eq!(get(&mut rt, exports.id(), "x"), JsValue::from(2));

    let flags = rt
        .get_own_property(exports.id(), &PropertyKey::from("x"))
        .unwrap()
        .unwrap()
        .flags;
    assert!(!flags.configurable);
    assert!(flags.writable);
    assert!(flags.enumerable);
}

#[test]
fn test_export_all_keeps_definition_order() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let exports = object_with(&mut rt, &scope, &[]);
    let source = object_with(
        &mut rt,
        &scope,
        &[("zeta", JsValue::Null), ("alpha", JsValue::Null), ("mid", JsValue::Null)],
    );
    export_all(&mut rt, exports.value(), source.value()).unwrap();
    assert_eq!(own_keys(&mut rt, exports.id()), vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_export_all_ignores_symbols_and_indices() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let exports = object_with(&mut rt, &scope, &[]);
    let source = object_with(&mut rt, &scope, &[("0", JsValue::from(0)), ("named", JsValue::from(1))]);
    let symbol = rt.create_symbol(None);
    rt.put(source.id(), PropertyKey::Symbol(symbol), JsValue::from(2), PropOpFlags::THROW)
        .unwrap();

    export_all(&mut rt, exports.value(), source.value()).unwrap();
    assert_eq!(own_keys(&mut rt, exports.id()), vec!["named"]);
}

#[test]
fn test_export_all_skips_bindings_already_fixed() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let exports = object_with(&mut rt, &scope, &[]);
    rt.define_own_property(
        exports.id(),
        PropertyKey::from("x"),
        PropertyDescriptor::with_flags(JsValue::from("local"), PropertyFlags::constant()),
        PropOpFlags::THROW,
    )
    .unwrap();
    let source = object_with(&mut rt, &scope, &[("x", JsValue::from(1)), ("y", JsValue::from(2))]);

    export_all(&mut rt, exports.value(), source.value()).unwrap();
    assert_eq!(get(&mut rt, exports.id(), "x"), JsValue::from("local"));
    assert_eq!(get(&mut rt, exports.id(), "y"), JsValue::from(2));
}

#[test]
fn test_export_all_reads_through_getters() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let exports = object_with(&mut rt, &scope, &[]);
    let source = scope.object(rt.create_object());
    let getter = scope.object(rt.create_host_function("live", 0, |_, _| Ok(JsValue::from(99))));
    rt.define_own_property(
        source.id(),
        PropertyKey::from("live"),
        PropertyDescriptor::accessor(getter.value(), JsValue::Undefined, true, true),
        PropOpFlags::THROW,
    )
    .unwrap();

    export_all(&mut rt, exports.value(), source.value()).unwrap();
    assert_eq!(get(&mut rt, exports.id(), "live"), JsValue::from(99));
}

#[test]
fn test_export_all_requires_objects() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let obj = object_with(&mut rt, &scope, &[]);

    let msg = expect_type_error(export_all(&mut rt, JsValue::from(1), obj.value()));
    assert_eq!(msg, "exportAll() exports argument must be object");
    let msg = expect_type_error(export_all(&mut rt, obj.value(), JsValue::Null));
    assert_eq!(msg, "exportAll() source argument must be object");
}
