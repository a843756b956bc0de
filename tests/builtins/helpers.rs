//! Tests for silentSetPrototypeOf, ensureObject, throwTypeError and
//! exponentiationOperator

use super::*;

fn set_proto(rt: &mut Runtime, obj: JsValue, parent: JsValue) -> JsResult<JsValue> {
    rt.call_builtin(BuiltinMethod::SilentSetPrototypeOf, &[obj, parent])
}

#[test]
fn test_silent_set_prototype_of_sets() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let obj = object_with(&mut rt, &scope, &[]);
    let parent = object_with(&mut rt, &scope, &[("inherited", JsValue::from(1))]);

    assert!(set_proto(&mut rt, obj.value(), parent.value()).unwrap().is_undefined());
    assert_eq!(rt.object(obj.id()).unwrap().prototype, Some(parent.id()));
    assert_eq!(get(&mut rt, obj.id(), "inherited"), JsValue::from(1));

    assert!(set_proto(&mut rt, obj.value(), JsValue::Null).unwrap().is_undefined());
    assert_eq!(rt.object(obj.id()).unwrap().prototype, None);
}

#[test]
fn test_silent_set_prototype_of_swallows_failures() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let a = object_with(&mut rt, &scope, &[]);
    let b = object_with(&mut rt, &scope, &[]);
    set_proto(&mut rt, b.value(), a.value()).unwrap();

    // Cycle
    assert!(set_proto(&mut rt, a.value(), b.value()).unwrap().is_undefined());
    assert_ne!(rt.object(a.id()).unwrap().prototype, Some(b.id()));

    // Non-extensible
    let before = rt.object(b.id()).unwrap().prototype;
    rt.prevent_extensions(b.id()).unwrap();
    assert!(set_proto(&mut rt, b.value(), JsValue::Null).unwrap().is_undefined());
    assert_eq!(rt.object(b.id()).unwrap().prototype, before);
}

#[test]
fn test_silent_set_prototype_of_ignores_bad_arguments() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let obj = object_with(&mut rt, &scope, &[]);
    let before = rt.object(obj.id()).unwrap().prototype;

    assert!(set_proto(&mut rt, JsValue::from(1), obj.value()).unwrap().is_undefined());
    assert!(set_proto(&mut rt, obj.value(), JsValue::from("parent")).unwrap().is_undefined());
    assert!(set_proto(&mut rt, obj.value(), JsValue::Undefined).unwrap().is_undefined());
    assert_eq!(rt.object(obj.id()).unwrap().prototype, before);
}

#[test]
fn test_ensure_object() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let obj = object_with(&mut rt, &scope, &[]);
    let ok = rt
        .call_builtin(BuiltinMethod::EnsureObject, &[obj.value(), JsValue::from("unused")])
        .unwrap();
    assert!(ok.is_undefined());

    let msg = expect_type_error(rt.call_builtin(
        BuiltinMethod::EnsureObject,
        &[JsValue::Null, JsValue::from("Iterator result is not an object")],
    ));
    assert_eq!(msg, "Iterator result is not an object");
}

#[test]
fn test_throw_type_error() {
    let mut rt = create_test_runtime();
    let msg = expect_type_error(
        rt.call_builtin(BuiltinMethod::ThrowTypeError, &[JsValue::from("Assignment to constant")]),
    );
    assert_eq!(msg, "Assignment to constant");
}

fn pow(rt: &mut Runtime, base: JsValue, exponent: JsValue) -> JsValue {
    rt.call_builtin(BuiltinMethod::ExponentiationOperator, &[base, exponent])
        .unwrap()
}

#[test]
fn test_exponentiation_operator() {
    let mut rt = create_test_runtime();
    assert_eq!(pow(&mut rt, JsValue::from(2), JsValue::from(10)), JsValue::from(1024));
    assert_eq!(pow(&mut rt, JsValue::from("3"), JsValue::from(2)), JsValue::from(9));
    assert_eq!(pow(&mut rt, JsValue::from(f64::NAN), JsValue::from(0)), JsValue::from(1));
    assert_eq!(pow(&mut rt, JsValue::from(2), JsValue::from(-1)), JsValue::from(0.5));
    assert!(
        pow(&mut rt, JsValue::from(1), JsValue::from(f64::INFINITY))
            .as_number()
            .unwrap()
            .is_nan()
    );
    assert!(pow(&mut rt, JsValue::Undefined, JsValue::from(1)).as_number().unwrap().is_nan());
}

#[test]
fn test_exponentiation_operator_uses_value_of() {
    let mut rt = create_test_runtime();
    let scope = rt.gc_scope();
    let obj = object_with(&mut rt, &scope, &[]);
    let value_of = scope.object(rt.create_host_function("valueOf", 0, |_, _| Ok(JsValue::from(5))));
    rt.put(obj.id(), PropertyKey::from("valueOf"), value_of.value(), PropOpFlags::THROW)
        .unwrap();
    assert_eq!(pow(&mut rt, obj.value(), JsValue::from(2)), JsValue::from(25));

    let symbol = JsValue::Symbol(rt.create_symbol(None));
    let result = rt.call_builtin(BuiltinMethod::ExponentiationOperator, &[symbol, JsValue::from(1)]);
    assert!(result.unwrap_err().is_type_error());
}
