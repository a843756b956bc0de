//! Small coercion and guard helpers

use crate::error::{JsError, JsResult};
use crate::object::PropOpFlags;
use crate::runtime::Runtime;
use crate::value::{JsValue, js_pow};

use super::NativeArgs;

/// `silentSetPrototypeOf(obj, parent)`. Never raises.
pub(super) fn silent_set_prototype_of(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let JsValue::Object(obj) = args.arg(0) else {
        return Ok(JsValue::Undefined);
    };
    let parent = match args.arg(1) {
        JsValue::Null => None,
        JsValue::Object(parent) => Some(parent),
        _ => return Ok(JsValue::Undefined),
    };
    // The one place an error is dropped on purpose
    if let Err(err) = rt.set_prototype(obj, parent, PropOpFlags::THROW) {
        log::trace!("silentSetPrototypeOf ignored: {}", err);
    }
    Ok(JsValue::Undefined)
}

/// `ensureObject(value, message)`
pub(super) fn ensure_object(_rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    if args.arg(0).is_object() {
        Ok(JsValue::Undefined)
    } else {
        Err(JsError::type_error(message_text(&args.arg(1))))
    }
}

/// `throwTypeError(message)`
pub(super) fn throw_type_error(_rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    Err(JsError::type_error(message_text(&args.arg(0))))
}

/// `exponentiationOperator(base, exponent)`: `base ** exponent`
pub(super) fn exponentiation_operator(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let base = rt.to_number(&args.arg(0))?;
    let exponent = rt.to_number(&args.arg(1))?;
    Ok(JsValue::Number(js_pow(base, exponent)))
}

fn message_text(value: &JsValue) -> String {
    value.to_js_string().to_string()
}
