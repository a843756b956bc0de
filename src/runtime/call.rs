//! Frames, call and construct

use std::rc::Rc;

use crate::builtins::NativeArgs;
use crate::error::{JsError, JsResult};
use crate::gc::{ObjectId, Traceable};
use crate::module::ModuleId;
use crate::object::{
    FunctionData, FunctionKind, GeneratorActivation, JsObject, NativeFn, ObjectKind, Property,
    PropertyFlags,
};
use crate::value::{JsString, JsValue, PropertyKey};

use super::Runtime;

/// One activation on the frame stack
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub callee: ObjectId,
    pub this: JsValue,
    pub new_target: Option<ObjectId>,
    pub args: Rc<[JsValue]>,
    /// Module of the running code, `None` for native and host functions
    pub module: Option<ModuleId>,
}

impl Traceable for StackFrame {
    fn trace(&self, visitor: &mut dyn FnMut(ObjectId)) {
        visitor(self.callee);
        self.this.trace(visitor);
        if let Some(new_target) = self.new_target {
            visitor(new_target);
        }
        for arg in self.args.iter() {
            arg.trace(visitor);
        }
    }
}

/// A call prepared by native code before it is invoked.
///
/// Values pushed here are not rooted until the frame is invoked, so fill it
/// without allocating in between.
#[derive(Debug)]
pub struct NativeCallFrame {
    callee: JsValue,
    this: JsValue,
    args: Vec<JsValue>,
}

impl NativeCallFrame {
    pub fn new(callee: JsValue, this: JsValue, capacity: usize) -> Self {
        Self {
            callee,
            this,
            args: Vec::with_capacity(capacity),
        }
    }

    pub fn with_args(callee: JsValue, this: JsValue, args: &[JsValue]) -> Self {
        Self {
            callee,
            this,
            args: args.to_vec(),
        }
    }

    pub fn push_arg(&mut self, value: JsValue) {
        self.args.push(value);
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }
}

impl Runtime {
    /// [[Call]]
    pub fn call(&mut self, callee: &JsValue, this: JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        self.call_frame(NativeCallFrame::with_args(callee.clone(), this, args))
    }

    /// [[Construct]] with `new.target` = `callee`
    pub fn construct(&mut self, callee: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let scope = self.gc_scope();
        let this = scope.object(self.create_this_for_construct(callee)?);
        self.construct_frame(NativeCallFrame::with_args(
            callee.clone(),
            this.value(),
            args,
        ))
    }

    /// Invoke a prepared frame with ordinary call semantics
    pub fn call_frame(&mut self, frame: NativeCallFrame) -> JsResult<JsValue> {
        let callee = self.callable_object(&frame.callee)?;
        self.invoke(callee, frame.this, frame.args.into(), None)
    }

    /// Invoke a prepared frame with construct semantics. The frame's `this`
    /// must come from [`Runtime::create_this_for_construct`]; it is the result
    /// unless the function returns an object.
    pub fn construct_frame(&mut self, frame: NativeCallFrame) -> JsResult<JsValue> {
        let callee = self.callable_object(&frame.callee)?;
        if !self.is_constructor(callee)? {
            return Err(not_a_constructor(self, &frame.callee));
        }
        let this = frame.this;
        let result = self.invoke(callee, this.clone(), frame.args.into(), Some(callee))?;
        Ok(if result.is_object() { result } else { this })
    }

    /// OrdinaryCreateFromConstructor: a fresh object whose prototype is
    /// `callee.prototype` (Object.prototype when that is not an object)
    pub fn create_this_for_construct(&mut self, callee: &JsValue) -> JsResult<ObjectId> {
        let id = self.callable_object(callee)?;
        if !self.is_constructor(id)? {
            return Err(not_a_constructor(self, callee));
        }
        let prototype = self
            .get_named(id, "prototype")?
            .as_object()
            .unwrap_or(self.realm.object_prototype);
        Ok(self.alloc(JsObject::with_prototype(Some(prototype))))
    }

    fn callable_object(&self, value: &JsValue) -> JsResult<ObjectId> {
        match value.as_object() {
            Some(id) if self.object(id)?.is_callable() => Ok(id),
            _ => Err(JsError::type_error(format!(
                "{} is not a function",
                self.describe_value(value)
            ))),
        }
    }

    fn is_constructor(&self, id: ObjectId) -> JsResult<bool> {
        Ok(self
            .object(id)?
            .function()
            .is_some_and(|f| f.is_constructor))
    }

    fn invoke(
        &mut self,
        callee: ObjectId,
        this: JsValue,
        args: Rc<[JsValue]>,
        new_target: Option<ObjectId>,
    ) -> JsResult<JsValue> {
        if self.frames.len() >= self.config.max_call_depth {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        let function = self
            .object(callee)?
            .function()
            .ok_or_else(|| JsError::internal("callee lost its [[Call]] slot"))?;
        let kind = function.kind.clone();
        let module = function.module();

        self.frames.push(StackFrame {
            callee,
            this: this.clone(),
            new_target,
            args: args.clone(),
            module,
        });
        let native_args = NativeArgs::new(this, args, new_target);
        let result = match kind {
            FunctionKind::Native { func, .. } => func(self, &native_args),
            FunctionKind::Host(body) | FunctionKind::Code { body, .. } => body(self, &native_args),
        };
        self.frames.pop();
        result
    }

    // ------------------------------------------------------------------------
    // Frame lookups
    // ------------------------------------------------------------------------

    /// Frame of the function currently running
    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    /// Frame of whoever called the function currently running
    pub fn caller_frame(&self) -> Option<&StackFrame> {
        let len = self.frames.len();
        if len < 2 {
            return None;
        }
        self.frames.get(len - 2)
    }

    /// Compiled module of the calling frame, if the caller is compiled code
    pub fn caller_module(&self) -> Option<ModuleId> {
        self.caller_frame().and_then(|frame| frame.module)
    }

    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    // ------------------------------------------------------------------------
    // Function creation
    // ------------------------------------------------------------------------

    pub fn create_native_function(&mut self, name: &str, func: NativeFn, arity: u8) -> ObjectId {
        self.create_function(
            FunctionData {
                name: JsString::from(name),
                kind: FunctionKind::Native { func, arity },
                is_constructor: false,
                generator: None,
            },
            u32::from(arity),
        )
    }

    /// A function backed by a Rust closure with no owning module.
    ///
    /// The collector does not see inside `body`: an [`ObjectId`] it captures
    /// must stay rooted by the caller (a scope, [`Runtime::add_root`], or a
    /// property of this function) for as long as the function can run.
    pub fn create_host_function<F>(&mut self, name: &str, arity: u32, body: F) -> ObjectId
    where
        F: Fn(&mut Runtime, &NativeArgs) -> JsResult<JsValue> + 'static,
    {
        self.create_function(
            FunctionData {
                name: JsString::from(name),
                kind: FunctionKind::Host(Rc::new(body)),
                is_constructor: false,
                generator: None,
            },
            arity,
        )
    }

    /// A constructor standing in for compiled code of `module`. Gets a fresh
    /// `prototype` object linked back through `constructor`.
    ///
    /// As with [`Runtime::create_host_function`], objects captured by `body`
    /// are not traced and must be rooted by the caller.
    pub fn create_code_function<F>(&mut self, module: ModuleId, name: &str, body: F) -> ObjectId
    where
        F: Fn(&mut Runtime, &NativeArgs) -> JsResult<JsValue> + 'static,
    {
        let scope = self.gc_scope();
        let function = scope.object(self.create_function(
            FunctionData {
                name: JsString::from(name),
                kind: FunctionKind::Code {
                    module,
                    body: Rc::new(body),
                },
                is_constructor: true,
                generator: None,
            },
            0,
        ));
        let prototype = self.create_object();
        self.insert_own(
            prototype,
            PropertyKey::from("constructor"),
            function.value(),
            PropertyFlags::hidden(),
        );
        self.insert_own(
            function.id(),
            PropertyKey::from("prototype"),
            JsValue::Object(prototype),
            PropertyFlags {
                writable: true,
                enumerable: false,
                configurable: false,
            },
        );
        function.id()
    }

    /// A generator activation of compiled code in `module`
    pub fn create_generator_function<F>(&mut self, module: ModuleId, name: &str, body: F) -> ObjectId
    where
        F: Fn(&mut Runtime, &NativeArgs) -> JsResult<JsValue> + 'static,
    {
        self.create_function(
            FunctionData {
                name: JsString::from(name),
                kind: FunctionKind::Code {
                    module,
                    body: Rc::new(body),
                },
                is_constructor: false,
                generator: Some(GeneratorActivation::default()),
            },
            0,
        )
    }

    fn create_function(&mut self, data: FunctionData, length: u32) -> ObjectId {
        let name = data.name.clone();
        let mut object = JsObject::with_prototype(Some(self.realm.function_prototype));
        object.kind = ObjectKind::Function(Box::new(data));
        let read_only = PropertyFlags {
            writable: false,
            enumerable: false,
            configurable: true,
        };
        object.insert_property(
            PropertyKey::from("length"),
            Property::data(JsValue::from(length), read_only),
        );
        object.insert_property(
            PropertyKey::from("name"),
            Property::data(JsValue::String(name), read_only),
        );
        self.alloc(object)
    }

    fn insert_own(&mut self, target: ObjectId, key: PropertyKey, value: JsValue, flags: PropertyFlags) {
        if let Some(object) = self.heap.get_mut(target) {
            object.insert_property(key, Property::data(value, flags));
        }
    }

    /// Delegation flag of a generator activation, `None` for other functions
    pub fn generator_delegated(&self, function: ObjectId) -> JsResult<Option<bool>> {
        Ok(self
            .object(function)?
            .function()
            .and_then(|f| f.generator.as_ref())
            .map(|g| g.delegated))
    }
}

fn not_a_constructor(rt: &Runtime, callee: &JsValue) -> JsError {
    JsError::type_error(format!("{} is not a constructor", rt.describe_value(callee)))
}
