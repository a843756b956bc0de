//! Argument vector passed to native functions

use std::rc::Rc;

use crate::gc::{GcScope, Handle, ObjectHandle, ObjectId};
use crate::object::ObjectClass;
use crate::runtime::Runtime;
use crate::value::JsValue;

/// View over the caller's arguments for the duration of one call.
///
/// The values are rooted by the active frame, so reading them never needs a
/// scope; use [`NativeArgs::arg_handle`] to keep one across a call that may
/// allocate after the frame is gone.
#[derive(Debug, Clone)]
pub struct NativeArgs {
    this: JsValue,
    args: Rc<[JsValue]>,
    new_target: Option<ObjectId>,
}

impl NativeArgs {
    pub(crate) fn new(this: JsValue, args: Rc<[JsValue]>, new_target: Option<ObjectId>) -> Self {
        Self {
            this,
            args,
            new_target,
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Argument `index`, or undefined past the end
    pub fn arg(&self, index: usize) -> JsValue {
        self.args.get(index).cloned().unwrap_or_default()
    }

    pub fn arg_handle<'s>(&self, scope: &'s GcScope, index: usize) -> Handle<'s> {
        scope.handle(self.arg(index))
    }

    /// Argument `index` if it is an object of class `K`. Never raises.
    pub fn dyncast_arg<'s, K: ObjectClass>(
        &self,
        rt: &Runtime,
        scope: &'s GcScope,
        index: usize,
    ) -> Option<ObjectHandle<'s>> {
        let id = self.args.get(index)?.as_object()?;
        let object = rt.object(id).ok()?;
        K::is_instance(object).then(|| scope.object(id))
    }

    pub fn this(&self) -> &JsValue {
        &self.this
    }

    pub fn args(&self) -> &[JsValue] {
        &self.args
    }

    pub fn new_target(&self) -> Option<ObjectId> {
        self.new_target
    }

    pub fn is_construct_call(&self) -> bool {
        self.new_target.is_some()
    }
}
