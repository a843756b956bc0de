//! Tagged template objects
//!
//! `getTemplateObject(id, dup, ...raw, ...cooked)` builds the frozen strings
//! array passed to a template tag, together with its frozen `raw` array. The
//! object is built once per call site and cached on the calling module, so
//! every evaluation of the same site sees the same object.

use crate::error::{JsError, JsResult};
use crate::gc::ObjectId;
use crate::object::{PropOpFlags, PropertyDescriptor, PropertyFlags};
use crate::runtime::Runtime;
use crate::value::{JsValue, PropertyKey, to_uint32};

use super::NativeArgs;

pub(super) fn get_template_object(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let argc = args.arg_count();
    if argc < 3 {
        return Err(JsError::type_error("At least three arguments expected"));
    }
    let Some(template_id) = args.arg(0).as_number() else {
        return Err(JsError::type_error("First argument should be a number"));
    };
    let JsValue::Boolean(dup) = args.arg(1) else {
        return Err(JsError::type_error("Second argument should be a bool"));
    };
    let template_id = to_uint32(template_id);

    let module = rt.caller_module().ok_or_else(|| {
        JsError::type_error("getTemplateObject() can only be called from compiled code")
    })?;
    if let Some(cached) = rt.module(module)?.find_cached_template_object(template_id) {
        log::trace!("template object {} served from cache", template_id);
        return Ok(JsValue::Object(cached));
    }

    if !dup && argc % 2 != 0 {
        return Err(JsError::type_error(
            "There must be the same number of raw and cooked strings.",
        ));
    }
    let count = if dup { argc - 2 } else { argc / 2 - 1 };
    let cooked_base = if dup { 2 } else { 2 + count };

    let scope = rt.gc_scope();
    let raw = scope.object(rt.create_array(count as u32));
    fill_frozen(rt, raw.id(), (0..count).map(|i| args.arg(2 + i)))?;
    if !rt.define_own_property(
        raw.id(),
        PropertyKey::from("length"),
        PropertyDescriptor::read_only(),
        PropOpFlags::SILENT,
    )? {
        return Err(JsError::type_error(
            "Failed to set 'length' property on the raw object read-only.",
        ));
    }
    rt.prevent_extensions(raw.id())?;

    let template = scope.object(rt.create_array(count as u32));
    fill_frozen(rt, template.id(), (0..count).map(|i| args.arg(cooked_base + i)))?;
    rt.define_own_property(
        template.id(),
        PropertyKey::from("raw"),
        PropertyDescriptor::with_flags(raw.value(), PropertyFlags::constant()),
        PropOpFlags::THROW,
    )?;
    if !rt.define_own_property(
        template.id(),
        PropertyKey::from("length"),
        PropertyDescriptor::read_only(),
        PropOpFlags::SILENT,
    )? {
        return Err(JsError::type_error(
            "Failed to set 'length' property on the template object read-only.",
        ));
    }
    rt.prevent_extensions(template.id())?;

    rt.module_mut(module)?
        .cache_template_object(template_id, template.id());
    Ok(template.value())
}

/// Define `values` as read-only, non-configurable, enumerable elements
fn fill_frozen(
    rt: &mut Runtime,
    array: ObjectId,
    values: impl Iterator<Item = JsValue>,
) -> JsResult<()> {
    for (index, value) in values.enumerate() {
        rt.define_own_property(
            array,
            PropertyKey::Index(index as u32),
            PropertyDescriptor::with_flags(value, PropertyFlags::frozen_element()),
            PropOpFlags::THROW,
        )?;
    }
    Ok(())
}
