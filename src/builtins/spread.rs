//! Rest parameters and array spread

use crate::error::{JsError, JsResult};
use crate::object::{ArrayObject, PropOpFlags, PropertyDescriptor};
use crate::runtime::Runtime;
use crate::value::{JsValue, PropertyKey, to_uint32};

use super::NativeArgs;

/// `copyRestArgs(from)`: the caller's arguments from `from` on, as an array
pub(super) fn copy_rest_args(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let Some(from) = args.arg(0).as_number() else {
        return Ok(JsValue::Undefined);
    };
    let Some(caller) = rt.caller_frame() else {
        return Ok(JsValue::Undefined);
    };
    let caller_args = caller.args.clone();
    let from = to_uint32(from) as usize;
    let length = caller_args.len().saturating_sub(from);

    let scope = rt.gc_scope();
    let rest = scope.object(rt.create_array(length as u32));
    for (index, value) in caller_args.iter().skip(from).enumerate() {
        rt.define_own_property(
            rest.id(),
            PropertyKey::Index(index as u32),
            PropertyDescriptor::data(value.clone()),
            PropOpFlags::THROW,
        )?;
    }
    Ok(rest.value())
}

/// `arraySpread(target, source, nextIndex)`: append everything `source`
/// iterates to `target` starting at `nextIndex`. Returns the index after the
/// last element written.
pub(super) fn array_spread(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let scope = rt.gc_scope();
    let target = args
        .dyncast_arg::<ArrayObject>(rt, &scope, 0)
        .ok_or_else(|| JsError::type_error("arraySpread requires an array target"))?;
    let mut next_index = args
        .arg(2)
        .as_number()
        .ok_or_else(|| JsError::type_error("arraySpread requires a numeric index"))?;
    let source = args.arg_handle(&scope, 1);

    let record = rt.get_iterator(&scope, source.get())?;
    loop {
        let step = rt.gc_scope();
        let Some(result) = rt.iterator_step(&step, &record)? else {
            return Ok(JsValue::Number(next_index));
        };
        let value = step.handle(rt.get_named(result.id(), "value")?);
        rt.put(
            target.id(),
            PropertyKey::from_value(&JsValue::Number(next_index)),
            value.value(),
            PropOpFlags::THROW,
        )?;
        next_index += 1.0;
    }
}
