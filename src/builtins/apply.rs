//! Fast `apply` / `construct` dispatch

use crate::error::{JsError, JsResult};
use crate::object::ArrayObject;
use crate::runtime::{NativeCallFrame, Runtime};
use crate::value::JsValue;

use super::NativeArgs;

/// `apply(fn, argArray, thisVal?)`
///
/// With exactly two arguments this constructs `fn`; with a `thisVal` it
/// calls it. `argArray` is read straight from element storage, so it must be
/// a plain array. A `length` above `max_call_args` raises RangeError before
/// anything is reserved.
pub(super) fn apply(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let scope = rt.gc_scope();
    let func = args.arg_handle(&scope, 0);
    if !rt.is_callable(func.get()) {
        return Err(JsError::type_error(format!(
            "{} is not a function",
            rt.describe_value(func.get())
        )));
    }
    let arg_array = args
        .dyncast_arg::<ArrayObject>(rt, &scope, 1)
        .ok_or_else(|| JsError::type_error("apply() args must be an array"))?;
    let length = rt.array_length(arg_array.id())?;
    if length as usize > rt.config().max_call_args {
        return Err(JsError::range_error("Maximum call stack size exceeded"));
    }

    let is_construct = args.arg_count() == 2;
    let this = if is_construct {
        scope.object(rt.create_this_for_construct(func.get())?).value()
    } else {
        args.arg(2)
    };

    let mut frame = NativeCallFrame::new(func.value(), this, length as usize);
    for index in 0..length {
        frame.push_arg(rt.array_element_at(arg_array.id(), index)?);
    }
    if is_construct {
        rt.construct_frame(frame)
    } else {
        rt.call_frame(frame)
    }
}
