//! Tests for getTemplateObject

use super::*;

use jsnative::PropertyDescriptor;

fn strs(values: &[&str]) -> Vec<JsValue> {
    values.iter().map(|s| JsValue::from(*s)).collect()
}

/// `getTemplateObject(id, false, ...raw, ...cooked)`
fn template_args(id: u32, raw: &[&str], cooked: &[&str]) -> Vec<JsValue> {
    let mut args = vec![JsValue::from(id), JsValue::Boolean(false)];
    args.extend(strs(raw));
    args.extend(strs(cooked));
    args
}

#[test]
fn test_template_object_contents() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();

    let args = template_args(0, &["a\\n", "b"], &["a\n", "b"]);
    let template = scope.handle(
        call_in_module(&mut rt, module, BuiltinMethod::GetTemplateObject, &args).unwrap(),
    );
    let template = as_object(template.get());

    assert_eq!(array_values(&rt, template), strs(&["a\n", "b"]));
    let raw = scope.object(as_object(&get(&mut rt, template, "raw")));
    assert_eq!(array_values(&rt, raw.id()), strs(&["a\\n", "b"]));
    assert_eq!(own_keys(&mut rt, template), vec!["0", "1", "length", "raw"]);
}

#[test]
fn test_template_dup_uses_raw_as_cooked() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();

    let mut args = vec![JsValue::from(3), JsValue::Boolean(true)];
    args.extend(strs(&["x", "y", "z"]));
    let template = scope.handle(
        call_in_module(&mut rt, module, BuiltinMethod::GetTemplateObject, &args).unwrap(),
    );
    let template = as_object(template.get());
    assert_eq!(array_values(&rt, template), strs(&["x", "y", "z"]));
    let raw = as_object(&get(&mut rt, template, "raw"));
    assert_eq!(array_values(&rt, raw), strs(&["x", "y", "z"]));
}

#[test]
fn test_template_identity_per_call_site() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();

    let first = scope.handle(
        call_in_module(
            &mut rt,
            module,
            BuiltinMethod::GetTemplateObject,
            &template_args(7, &["a"], &["a"]),
        )
        .unwrap(),
    );
    // Same site, different literal arguments: still the cached object
    let second = scope.handle(
        call_in_module(
            &mut rt,
            module,
            BuiltinMethod::GetTemplateObject,
            &template_args(7, &["other", "strings"], &["other", "strings"]),
        )
        .unwrap(),
    );
    let other_site = scope.handle(
        call_in_module(
            &mut rt,
            module,
            BuiltinMethod::GetTemplateObject,
            &template_args(8, &["a"], &["a"]),
        )
        .unwrap(),
    );

    assert_eq!(first.get(), second.get());
    assert_ne!(first.get(), other_site.get());
    assert_eq!(array_values(&rt, as_object(second.get())), strs(&["a"]));
}

#[test]
fn test_template_cache_is_checked_before_shape() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();

    let first = scope.handle(
        call_in_module(
            &mut rt,
            module,
            BuiltinMethod::GetTemplateObject,
            &template_args(1, &["a"], &["a"]),
        )
        .unwrap(),
    );
    // Odd count would be rejected, but the site is already cached
    let mut odd = vec![JsValue::from(1), JsValue::Boolean(false)];
    odd.extend(strs(&["a", "b", "c"]));
    let again = call_in_module(&mut rt, module, BuiltinMethod::GetTemplateObject, &odd).unwrap();
    assert_eq!(first.get(), &again);
}

#[test]
fn test_template_cache_is_per_module() {
    let mut rt = create_test_runtime();
    let a = rt.create_module("a");
    let b = rt.create_module("b");
    let scope = rt.gc_scope();
    let args = template_args(0, &["s"], &["s"]);

    let from_a = scope.handle(
        call_in_module(&mut rt, a, BuiltinMethod::GetTemplateObject, &args).unwrap(),
    );
    let from_b = scope.handle(
        call_in_module(&mut rt, b, BuiltinMethod::GetTemplateObject, &args).unwrap(),
    );
    assert_ne!(from_a.get(), from_b.get());
}

#[test]
fn test_template_immutability() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let scope = rt.gc_scope();

    let template = scope.handle(
        call_in_module(
            &mut rt,
            module,
            BuiltinMethod::GetTemplateObject,
            &template_args(0, &["a", "b"], &["a", "b"]),
        )
        .unwrap(),
    );
    let template = as_object(template.get());
    let raw = scope.object(as_object(&get(&mut rt, template, "raw")));

    for obj in [template, raw.id()] {
        // Elements are read-only and non-configurable
        let elem = rt.get_own_property(obj, &PropertyKey::Index(0)).unwrap().unwrap();
        assert!(!elem.flags.writable);
        assert!(!elem.flags.configurable);
        assert!(elem.flags.enumerable);

        assert!(!rt.put(obj, PropertyKey::Index(0), JsValue::from("x"), PropOpFlags::SILENT).unwrap());
        assert!(rt.put(obj, PropertyKey::Index(0), JsValue::from("x"), PropOpFlags::THROW).is_err());
        assert!(!rt.delete_property(obj, &PropertyKey::Index(0), PropOpFlags::SILENT).unwrap());
        assert!(rt.delete_property(obj, &PropertyKey::Index(0), PropOpFlags::THROW).is_err());

        // No new properties, indexed or named
        assert!(!rt.is_extensible(obj).unwrap());
        assert!(!rt.put(obj, PropertyKey::Index(2), JsValue::from("x"), PropOpFlags::SILENT).unwrap());
        assert!(!rt.put(obj, PropertyKey::from("extra"), JsValue::Null, PropOpFlags::SILENT).unwrap());
        assert!(
            rt.define_own_property(
                obj,
                PropertyKey::from("extra"),
                PropertyDescriptor::data(JsValue::Null),
                PropOpFlags::THROW,
            )
            .is_err()
        );

        // length is non-writable
        let length = rt.get_own_property(obj, &PropertyKey::from("length")).unwrap().unwrap();
        assert!(!length.flags.writable);
        assert!(!rt.put(obj, PropertyKey::from("length"), JsValue::from(0), PropOpFlags::SILENT).unwrap());
        assert_eq!(rt.array_length(obj).unwrap(), 2);
    }

    let raw_prop = rt.get_own_property(template, &PropertyKey::from("raw")).unwrap().unwrap();
    assert!(!raw_prop.flags.writable);
    assert!(!raw_prop.flags.enumerable);
    assert!(!raw_prop.flags.configurable);
    assert!(
        rt.define_own_property(
            template,
            PropertyKey::from("raw"),
            PropertyDescriptor::data(JsValue::Null),
            PropOpFlags::THROW,
        )
        .is_err()
    );
}

#[test]
fn test_template_argument_errors() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");

    let msg = expect_type_error(call_in_module(
        &mut rt,
        module,
        BuiltinMethod::GetTemplateObject,
        &[JsValue::from(0), JsValue::Boolean(true)],
    ));
    assert_eq!(msg, "At least three arguments expected");

    let msg = expect_type_error(call_in_module(
        &mut rt,
        module,
        BuiltinMethod::GetTemplateObject,
        &[JsValue::from("0"), JsValue::Boolean(true), JsValue::from("a")],
    ));
    assert_eq!(msg, "First argument should be a number");

    let msg = expect_type_error(call_in_module(
        &mut rt,
        module,
        BuiltinMethod::GetTemplateObject,
        &[JsValue::from(0), JsValue::from(1), JsValue::from("a")],
    ));
    assert_eq!(msg, "Second argument should be a bool");

    let msg = expect_type_error(call_in_module(
        &mut rt,
        module,
        BuiltinMethod::GetTemplateObject,
        &[JsValue::from(0), JsValue::Boolean(false), JsValue::from("a")],
    ));
    assert_eq!(msg, "There must be the same number of raw and cooked strings.");

    // A rejected call caches nothing
    assert_eq!(rt.module(module).unwrap().template_cache_len(), 0);
}

#[test]
fn test_template_requires_compiled_caller() {
    let mut rt = create_test_runtime();
    let args = template_args(0, &["a"], &["a"]);
    let result = rt.call_builtin(BuiltinMethod::GetTemplateObject, &args);
    assert!(expect_type_error(result).contains("compiled code"));

    // Called from a host function: still no compiled module
    let host = rt.create_host_function("host", 0, |rt, args| {
        rt.call_builtin(BuiltinMethod::GetTemplateObject, args.args())
    });
    let result = rt.call(&JsValue::Object(host), JsValue::Undefined, &args);
    assert!(result.unwrap_err().is_type_error());
}

#[test]
fn test_template_cache_survives_gc_and_dies_with_module() {
    let mut rt = create_test_runtime();
    let module = rt.create_module("main");
    let args = template_args(0, &["a"], &["a"]);

    let template = as_object(
        &call_in_module(&mut rt, module, BuiltinMethod::GetTemplateObject, &args).unwrap(),
    );
    rt.collect_garbage();
    assert!(rt.is_live(template));
    let raw = as_object(&get(&mut rt, template, "raw"));
    assert!(rt.is_live(raw));

    rt.destroy_module(module).unwrap();
    rt.collect_garbage();
    assert!(!rt.is_live(template));
    assert!(call_in_module(&mut rt, module, BuiltinMethod::GetTemplateObject, &args).is_err());

    // A reloaded module starts with an empty cache
    let reloaded = rt.create_module("main");
    assert_eq!(rt.module(reloaded).unwrap().template_cache_len(), 0);
    let fresh = as_object(
        &call_in_module(&mut rt, reloaded, BuiltinMethod::GetTemplateObject, &args).unwrap(),
    );
    assert_ne!(fresh, template);
}
