//! `yield*` bookkeeping

use crate::error::{JsError, JsResult};
use crate::runtime::Runtime;
use crate::value::JsValue;

use super::NativeArgs;

/// `generatorSetDelegated()`: mark the calling generator as delegating to
/// an inner iterator, so its next resume forwards `throw`/`return`.
pub(super) fn generator_set_delegated(rt: &mut Runtime, _args: &NativeArgs) -> JsResult<JsValue> {
    let not_delegating =
        || JsError::type_error("generatorSetDelegated can only be called as part of yield*");
    let Some(callee) = rt.caller_frame().map(|frame| frame.callee) else {
        return Err(not_delegating());
    };
    let activation = rt
        .object_mut(callee)?
        .function_mut()
        .and_then(|function| function.generator.as_mut())
        .ok_or_else(not_delegating)?;
    activation.delegated = true;
    Ok(JsValue::Undefined)
}
