//! Tests for requireFast

use std::cell::Cell;
use std::rc::Rc;

use super::*;

fn require(rt: &mut Runtime, module: ModuleId, index: u32) -> JsResult<JsValue> {
    call_in_module(rt, module, BuiltinMethod::RequireFast, &[JsValue::from(index)])
}

/// A factory that sets `exports.name = value` and counts its runs
fn counting_factory(rt: &mut Runtime, module: ModuleId, value: i32) -> (ObjectId, Rc<Cell<u32>>) {
    let runs = Rc::new(Cell::new(0u32));
    let counter = runs.clone();
    let factory = rt.create_code_function(module, "factory", move |rt, args| {
        counter.set(counter.get() + 1);
        let exports = args.arg(0).as_object().ok_or_else(|| JsError::type_error("no exports"))?;
        rt.put(exports, PropertyKey::from("value"), JsValue::from(value), PropOpFlags::THROW)?;
        Ok(JsValue::Undefined)
    });
    (factory, runs)
}

#[test]
fn test_require_loads_once() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();
    let (factory, runs) = counting_factory(&mut rt, module, 42);
    let factory = scope.object(factory);
    rt.register_cjs_module(module, 3, factory.value()).unwrap();

    let first = scope.handle(require(&mut rt, module, 3).unwrap());
    let first = as_object(first.get());
    assert_eq!(get(&mut rt, first, "value"), JsValue::from(42));

    let second = require(&mut rt, module, 3).unwrap();
    assert_eq!(second, JsValue::Object(first));
    assert_eq!(runs.get(), 1);
}

#[test]
fn test_require_returns_reassigned_module_exports() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();
    let factory = scope.object(rt.create_code_function(module, "factory", |rt, args| {
        let module_object = args.arg(2).as_object().ok_or_else(|| JsError::type_error("no module"))?;
        rt.put(module_object, PropertyKey::from("exports"), JsValue::from("replaced"), PropOpFlags::THROW)?;
        Ok(JsValue::Undefined)
    }));
    rt.register_cjs_module(module, 0, factory.value()).unwrap();

    assert_eq!(require(&mut rt, module, 0).unwrap(), JsValue::from("replaced"));
    assert_eq!(require(&mut rt, module, 0).unwrap(), JsValue::from("replaced"));
}

#[test]
fn test_factory_receives_exports_and_module() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();
    let factory = scope.object(rt.create_code_function(module, "factory", |rt, args| {
        let exports = args.arg(0).clone();
        let module_object = args.arg(2).as_object().ok_or_else(|| JsError::type_error("no module"))?;
        let same = rt.get_named(module_object, "exports")?.strict_equals(&exports);
        let exports = exports.as_object().ok_or_else(|| JsError::type_error("no exports"))?;
        rt.put(exports, PropertyKey::from("same"), JsValue::Boolean(same), PropOpFlags::THROW)?;
        rt.put(
            exports,
            PropertyKey::from("require"),
            JsValue::Boolean(args.arg(1).is_undefined()),
            PropOpFlags::THROW,
        )?;
        Ok(JsValue::Undefined)
    }));
    rt.register_cjs_module(module, 1, factory.value()).unwrap();

    let exports = scope.handle(require(&mut rt, module, 1).unwrap());
    let exports = as_object(exports.get());
    assert_eq!(get(&mut rt, exports, "same"), JsValue::Boolean(true));
    assert_eq!(get(&mut rt, exports, "require"), JsValue::Boolean(true));
}

#[test]
fn test_cyclic_require_sees_partial_exports() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();
    // a: exports.early = 1; exports.b = require(1); exports.late = 2
    let a = scope.object(rt.create_code_function(module, "a", |rt, args| {
        let scope = rt.gc_scope();
        let exports = scope.object(as_object_or_throw(&args.arg(0))?);
        rt.put(exports.id(), PropertyKey::from("early"), JsValue::from(1), PropOpFlags::THROW)?;
        let b = scope.handle(rt.call_builtin(BuiltinMethod::RequireFast, &[JsValue::from(1)])?);
        rt.put(exports.id(), PropertyKey::from("b"), b.value(), PropOpFlags::THROW)?;
        rt.put(exports.id(), PropertyKey::from("late"), JsValue::from(2), PropOpFlags::THROW)?;
        Ok(JsValue::Undefined)
    }));
    // b: exports.a = require(0), which is a's partially filled exports
    let b = scope.object(rt.create_code_function(module, "b", |rt, args| {
        let scope = rt.gc_scope();
        let exports = scope.object(as_object_or_throw(&args.arg(0))?);
        let a = scope.handle(rt.call_builtin(BuiltinMethod::RequireFast, &[JsValue::from(0)])?);
        let a_id = as_object_or_throw(a.get())?;
        let early = rt.get_named(a_id, "early")?;
        let late = rt.get_named(a_id, "late")?;
        rt.put(exports.id(), PropertyKey::from("a"), a.value(), PropOpFlags::THROW)?;
        rt.put(exports.id(), PropertyKey::from("sawEarly"), early, PropOpFlags::THROW)?;
        rt.put(exports.id(), PropertyKey::from("sawLate"), late, PropOpFlags::THROW)?;
        Ok(JsValue::Undefined)
    }));
    rt.register_cjs_module(module, 0, a.value()).unwrap();
    rt.register_cjs_module(module, 1, b.value()).unwrap();

    let a_exports = scope.handle(require(&mut rt, module, 0).unwrap());
    let a_exports = as_object(a_exports.get());
    let b_exports = as_object(&get(&mut rt, a_exports, "b"));

    assert_eq!(get(&mut rt, b_exports, "a"), JsValue::Object(a_exports));
    assert_eq!(get(&mut rt, b_exports, "sawEarly"), JsValue::from(1));
    assert!(get(&mut rt, b_exports, "sawLate").is_undefined());
    assert_eq!(get(&mut rt, a_exports, "late"), JsValue::from(2));
}

fn as_object_or_throw(value: &JsValue) -> JsResult<ObjectId> {
    value
        .as_object()
        .ok_or_else(|| JsError::type_error("expected an object"))
}

#[test]
fn test_throwing_factory_leaves_partial_exports() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();
    let factory = scope.object(rt.create_code_function(module, "factory", |rt, args| {
        let exports = as_object_or_throw(&args.arg(0))?;
        rt.put(exports, PropertyKey::from("before"), JsValue::from(1), PropOpFlags::THROW)?;
        Err(JsError::thrown(JsValue::from("boom")))
    }));
    rt.register_cjs_module(module, 0, factory.value()).unwrap();

    let err = require(&mut rt, module, 0).unwrap_err();
    assert_eq!(err.to_value(), JsValue::from("boom"));

    // The factory does not run again
    let exports = scope.handle(require(&mut rt, module, 0).unwrap());
    let exports = as_object(exports.get());
    assert_eq!(get(&mut rt, exports, "before"), JsValue::from(1));
}

#[test]
fn test_require_resolves_in_the_calling_module() {
    let mut rt = create_test_runtime();
    let main = rt.create_module("main");
    let other = rt.create_module("other");
    let scope = rt.gc_scope();
    let (factory, runs) = counting_factory(&mut rt, other, 7);
    let factory = scope.object(factory);
    rt.register_cjs_module(other, 0, factory.value()).unwrap();

    let msg = expect_type_error(require(&mut rt, main, 0));
    assert_eq!(msg, "Unable to find module with ID: 0");
    assert_eq!(runs.get(), 0);

    let exports = scope.handle(require(&mut rt, other, 0).unwrap());
    assert_eq!(get(&mut rt, as_object(exports.get()), "value"), JsValue::from(7));
}

#[test]
fn test_require_errors() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");

    let msg = expect_type_error(require(&mut rt, module, 99));
    assert_eq!(msg, "Unable to find module with ID: 99");

    let msg = expect_type_error(call_in_module(
        &mut rt,
        module,
        BuiltinMethod::RequireFast,
        &[JsValue::from("0")],
    ));
    assert_eq!(msg, "Module index must be a number");

    let msg = expect_type_error(rt.call_builtin(BuiltinMethod::RequireFast, &[JsValue::from(0)]));
    assert_eq!(msg, "Cannot be called from native code");

    let not_callable = JsValue::from(1);
    assert!(rt.register_cjs_module(module, 0, not_callable).unwrap_err().is_type_error());
}
