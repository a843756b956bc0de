//! CommonJS `require` by module-table index

use crate::error::{JsError, JsResult};
use crate::runtime::Runtime;
use crate::value::{JsValue, to_uint32};

use super::NativeArgs;

/// `requireFast(moduleIndex)`: exports of the CommonJS module registered
/// under `moduleIndex` in the calling module, loading it on first use
pub(super) fn require_fast(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let Some(index) = args.arg(0).as_number() else {
        return Err(JsError::type_error("Module index must be a number"));
    };
    let module = rt
        .caller_module()
        .ok_or_else(|| JsError::type_error("Cannot be called from native code"))?;
    rt.require_cjs(module, to_uint32(index))
}
