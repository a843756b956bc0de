//! Object rest/spread copying and `export *` aggregation

use crate::error::{JsError, JsResult};
use crate::gc::ObjectHandle;
use crate::object::{AnyObject, PropOpFlags, PropertyDescriptor, PropertyFlags};
use crate::runtime::Runtime;
use crate::value::{JsValue, PropertyKey};

use super::NativeArgs;

/// `copyDataProperties(target, source, excludedKeys?)`
///
/// Copies the enumerable own properties of `source` onto `target` in
/// enumeration order, skipping keys `excludedKeys` has as own properties.
/// A throwing getter stops the copy; whatever was copied before stays.
pub(super) fn copy_data_properties(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let JsValue::Object(target) = args.arg(0) else {
        return Ok(JsValue::Undefined);
    };
    let source_value = args.arg(1);
    if source_value.is_null_or_undefined() {
        return Ok(JsValue::Object(target));
    }

    let scope = rt.gc_scope();
    let target = scope.object(target);
    let source = scope.object(rt.to_object(&source_value)?);
    let excluded = args.dyncast_arg::<AnyObject>(rt, &scope, 2);

    rt.for_each_own_property_while(
        source.id(),
        |rt, index, flags| copy_property(rt, target, source, excluded, PropertyKey::Index(index), flags),
        |rt, key, flags| copy_property(rt, target, source, excluded, key.clone(), flags),
    )?;
    Ok(target.value())
}

fn copy_property(
    rt: &mut Runtime,
    target: ObjectHandle<'_>,
    source: ObjectHandle<'_>,
    excluded: Option<ObjectHandle<'_>>,
    key: PropertyKey,
    flags: PropertyFlags,
) -> JsResult<bool> {
    if !flags.enumerable {
        return Ok(true);
    }
    if let Some(excluded) = excluded {
        if rt.has_own_property(excluded.id(), &key)? {
            return Ok(true);
        }
    }
    let scope = rt.gc_scope();
    let value = scope.handle(rt.get(source.id(), &key, &source.value())?);
    rt.define_own_property(
        target.id(),
        key,
        PropertyDescriptor::data(value.value()),
        PropOpFlags::THROW,
    )?;
    Ok(true)
}

/// `exportAll(exports, source)`: `export * from "..."`
///
/// Re-exports every enumerable string-keyed own property of `source` except
/// `default`, as non-configurable bindings on `exports`.
pub(super) fn export_all(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let scope = rt.gc_scope();
    let exports = args
        .dyncast_arg::<AnyObject>(rt, &scope, 0)
        .ok_or_else(|| JsError::type_error("exportAll() exports argument must be object"))?;
    let source = args
        .dyncast_arg::<AnyObject>(rt, &scope, 1)
        .ok_or_else(|| JsError::type_error("exportAll() source argument must be object"))?;

    rt.for_each_named_property_while(source.id(), |rt, key, flags| {
        if !flags.enumerable || !matches!(key, PropertyKey::String(_)) || key.eq_str("default") {
            return Ok(true);
        }
        let scope = rt.gc_scope();
        let value = scope.handle(rt.get(source.id(), key, &source.value())?);
        let defined = rt.define_own_property(
            exports.id(),
            key.clone(),
            PropertyDescriptor::data(value.value()).configurable(false),
            PropOpFlags::SILENT,
        )?;
        if !defined {
            log::debug!("exportAll: binding '{}' already fixed on exports, skipped", key);
        }
        Ok(true)
    })?;
    Ok(JsValue::Undefined)
}
