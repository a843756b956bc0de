//! The runtime: heap, realm intrinsics, frame stack and module arena
//!
//! Everything that can allocate goes through [`Runtime::alloc`], which runs a
//! collection first when the heap asks for one. Any `JsValue` or `ObjectId`
//! a caller still needs after a call that may allocate must be held through a
//! [`GcScope`] handle (or be reachable from a frame, the realm, a module, or a
//! persistent root).

mod call;
mod iterator;
mod property;

pub use call::{NativeCallFrame, StackFrame};
pub use iterator::IteratorRecord;

use crate::builtins::{self, BuiltinTable};
use crate::config::RuntimeConfig;
use crate::error::{JsError, JsResult};
use crate::gc::{GcScope, GcStats, Heap, ObjectId, Traceable};
use crate::module::ModuleArena;
use crate::object::{JsObject, ObjectKind, Property, PropertyFlags};
use crate::value::{JsString, JsSymbol, JsValue, PropertyKey};

/// Intrinsic objects shared by everything the runtime creates
#[derive(Debug, Clone, Copy)]
pub struct Realm {
    pub object_prototype: ObjectId,
    pub function_prototype: ObjectId,
    pub array_prototype: ObjectId,
    pub string_prototype: ObjectId,
    pub array_iterator_prototype: ObjectId,
    pub string_iterator_prototype: ObjectId,
}

impl Realm {
    fn ids(&self) -> [ObjectId; 6] {
        [
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
            self.string_prototype,
            self.array_iterator_prototype,
            self.string_iterator_prototype,
        ]
    }
}

pub struct Runtime {
    pub(crate) heap: Heap<JsObject>,
    pub(crate) realm: Realm,
    pub(crate) frames: Vec<StackFrame>,
    pub(crate) modules: ModuleArena,
    pub(crate) builtins: BuiltinTable,
    /// Persistent roots registered by the embedder
    roots: Vec<ObjectId>,
    config: RuntimeConfig,
    next_symbol_id: u64,
    symbol_iterator: JsSymbol,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        // No automatic collection until the realm is wired up
        let mut heap = Heap::new(0);
        let object_prototype = heap.alloc(JsObject::with_prototype(None));
        let function_prototype = heap.alloc(JsObject::with_prototype(Some(object_prototype)));
        let array_prototype = heap.alloc(JsObject::array(Some(object_prototype), 0));
        let string_prototype = heap.alloc(JsObject::with_prototype(Some(object_prototype)));
        let array_iterator_prototype = heap.alloc(JsObject::with_prototype(Some(object_prototype)));
        let string_iterator_prototype =
            heap.alloc(JsObject::with_prototype(Some(object_prototype)));

        let realm = Realm {
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            array_iterator_prototype,
            string_iterator_prototype,
        };

        let mut runtime = Self {
            heap,
            realm,
            frames: Vec::new(),
            modules: ModuleArena::default(),
            builtins: BuiltinTable::default(),
            roots: Vec::new(),
            config: config.clone(),
            next_symbol_id: 1,
            symbol_iterator: JsSymbol::new(0, Some(JsString::from("Symbol.iterator"))),
        };

        runtime.install_intrinsics();
        builtins::install(&mut runtime);
        runtime.heap.set_gc_threshold(config.gc_threshold);
        runtime
    }

    fn install_intrinsics(&mut self) {
        let realm = self.realm;

        let value_of = self.create_native_function("valueOf", object_value_of, 0);
        self.install_method(realm.object_prototype, PropertyKey::from("valueOf"), value_of);
        let to_string = self.create_native_function("toString", object_to_string, 0);
        self.install_method(realm.object_prototype, PropertyKey::from("toString"), to_string);

        let iterator_key = PropertyKey::Symbol(self.symbol_iterator.clone());
        let values = self.create_native_function("values", iterator::array_values, 0);
        self.install_method(realm.array_prototype, iterator_key.clone(), values);
        let string_iter =
            self.create_native_function("[Symbol.iterator]", iterator::string_iterator, 0);
        self.install_method(realm.string_prototype, iterator_key, string_iter);

        let next = self.create_native_function("next", iterator::array_iterator_next, 0);
        self.install_method(realm.array_iterator_prototype, PropertyKey::from("next"), next);
        let next = self.create_native_function("next", iterator::string_iterator_next, 0);
        self.install_method(realm.string_iterator_prototype, PropertyKey::from("next"), next);
    }

    /// Store a method directly, as a non-enumerable data property
    fn install_method(&mut self, target: ObjectId, key: PropertyKey, method: ObjectId) {
        if let Some(object) = self.heap.get_mut(target) {
            object.insert_property(
                key,
                Property::data(JsValue::Object(method), PropertyFlags::hidden()),
            );
        }
    }

    // ------------------------------------------------------------------------
    // Allocation and GC
    // ------------------------------------------------------------------------

    /// Allocate an object, collecting first if the threshold was reached.
    /// Everything `object` references survives that collection.
    pub(crate) fn alloc(&mut self, object: JsObject) -> ObjectId {
        if self.heap.should_collect() {
            let mut pending = Vec::new();
            object.trace(&mut |id| pending.push(id));
            self.collect_with(pending);
        }
        self.heap.alloc(object)
    }

    /// Run a full collection now. Returns the number of objects freed.
    pub fn collect_garbage(&mut self) -> usize {
        self.collect_with(Vec::new())
    }

    fn collect_with(&mut self, mut roots: Vec<ObjectId>) -> usize {
        roots.extend(self.realm.ids());
        roots.extend(self.builtins.iter().map(|(_, id)| id));
        for frame in &self.frames {
            frame.trace(&mut |id| roots.push(id));
        }
        for module in self.modules.iter() {
            roots.extend(module.roots());
        }
        roots.extend(self.roots.iter().copied());
        self.heap.collect(roots)
    }

    /// Open a root scope. Handles created through it live until it drops.
    pub fn gc_scope(&self) -> GcScope {
        self.heap.create_scope()
    }

    /// Keep `id` alive until a matching [`Runtime::remove_root`]
    pub fn add_root(&mut self, id: ObjectId) {
        self.roots.push(id);
    }

    pub fn remove_root(&mut self, id: ObjectId) {
        if let Some(pos) = self.roots.iter().rposition(|r| *r == id) {
            self.roots.swap_remove(pos);
        }
    }

    pub fn gc_stats(&self) -> GcStats {
        self.heap.stats()
    }

    pub fn set_gc_threshold(&mut self, threshold: usize) {
        self.heap.set_gc_threshold(threshold);
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Check whether `id` still refers to a live object
    pub fn is_live(&self, id: ObjectId) -> bool {
        self.heap.contains(id)
    }

    // ------------------------------------------------------------------------
    // Object access
    // ------------------------------------------------------------------------

    pub fn object(&self, id: ObjectId) -> JsResult<&JsObject> {
        self.heap.get(id).ok_or_else(|| stale_reference(id))
    }

    pub fn object_mut(&mut self, id: ObjectId) -> JsResult<&mut JsObject> {
        self.heap.get_mut(id).ok_or_else(|| stale_reference(id))
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Create an empty ordinary object inheriting from Object.prototype
    pub fn create_object(&mut self) -> ObjectId {
        let prototype = self.realm.object_prototype;
        self.alloc(JsObject::with_prototype(Some(prototype)))
    }

    /// Create an array of `length` holes
    pub fn create_array(&mut self, length: u32) -> ObjectId {
        let prototype = self.realm.array_prototype;
        self.alloc(JsObject::array(Some(prototype), length))
    }

    pub fn create_symbol(&mut self, description: Option<&str>) -> JsSymbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsSymbol::new(id, description.map(JsString::from))
    }

    /// The well-known `Symbol.iterator`
    pub fn symbol_iterator(&self) -> JsSymbol {
        self.symbol_iterator.clone()
    }

    /// Short rendering of a value for error messages
    pub fn describe_value(&self, value: &JsValue) -> String {
        let JsValue::Object(id) = value else {
            return value.to_js_string().to_string();
        };
        match self.heap.get(*id).map(|o| &o.kind) {
            Some(ObjectKind::Function(data)) => format!("function {}", data.name),
            Some(ObjectKind::Array { .. }) => "[object Array]".to_string(),
            _ => "[object Object]".to_string(),
        }
    }
}

fn stale_reference(id: ObjectId) -> JsError {
    JsError::internal(format!(
        "stale object reference #{}@{}",
        id.index(),
        id.generation()
    ))
}

/// Object.prototype.valueOf
fn object_value_of(rt: &mut Runtime, args: &crate::builtins::NativeArgs) -> JsResult<JsValue> {
    let id = rt.to_object(args.this())?;
    Ok(JsValue::Object(id))
}

/// Object.prototype.toString
fn object_to_string(rt: &mut Runtime, args: &crate::builtins::NativeArgs) -> JsResult<JsValue> {
    let tag = match args.this() {
        JsValue::Undefined => "[object Undefined]",
        JsValue::Null => "[object Null]",
        JsValue::Object(id) => match rt.object(*id)?.kind {
            ObjectKind::Array { .. } => "[object Array]",
            ObjectKind::Function(_) => "[object Function]",
            _ => "[object Object]",
        },
        JsValue::String(_) => "[object String]",
        JsValue::Number(_) => "[object Number]",
        JsValue::Boolean(_) => "[object Boolean]",
        JsValue::Symbol(_) => "[object Symbol]",
    };
    Ok(JsValue::from(tag))
}
