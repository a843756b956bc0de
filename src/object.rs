//! Object model: property storage, descriptors and object kinds
//!
//! Indexed properties live in an ordered map so own-key enumeration visits
//! them in ascending order; named properties (strings, symbols, internal
//! slots) live in an insertion-ordered map so enumeration follows definition
//! order.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::builtins::NativeArgs;
use crate::error::JsResult;
use crate::gc::{ObjectId, Traceable};
use crate::module::ModuleId;
use crate::runtime::Runtime;
use crate::value::{JsString, JsValue, PropertyKey};

/// Attribute bits of a stored property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyFlags {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl PropertyFlags {
    /// Flags for a property created by ordinary assignment
    pub const fn default_new() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Enumerable but neither writable nor configurable
    pub const fn frozen_element() -> Self {
        Self {
            writable: false,
            enumerable: true,
            configurable: false,
        }
    }

    /// Not writable, not enumerable, not configurable
    pub const fn constant() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Writable and configurable, but hidden from enumeration
    pub const fn hidden() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }
}

/// What a property holds
#[derive(Debug, Clone)]
pub enum PropertySlot {
    Data(JsValue),
    Accessor { getter: JsValue, setter: JsValue },
}

/// A stored own property
#[derive(Debug, Clone)]
pub struct Property {
    pub slot: PropertySlot,
    pub flags: PropertyFlags,
}

impl Property {
    pub fn data(value: JsValue, flags: PropertyFlags) -> Self {
        Self {
            slot: PropertySlot::Data(value),
            flags,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, PropertySlot::Accessor { .. })
    }

    /// The stored value of a data property
    pub fn value(&self) -> Option<&JsValue> {
        match &self.slot {
            PropertySlot::Data(value) => Some(value),
            PropertySlot::Accessor { .. } => None,
        }
    }
}

/// A (possibly partial) property descriptor passed to `define_own_property`.
///
/// Absent fields keep the current attribute of an existing property and
/// default to `false`/`undefined` for a new one.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub getter: Option<JsValue>,
    pub setter: Option<JsValue>,
    pub writable: Option<bool>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Data property with the default new-property policy: writable,
    /// enumerable and configurable.
    pub fn data(value: JsValue) -> Self {
        Self::with_flags(value, PropertyFlags::default_new())
    }

    /// Complete data descriptor
    pub fn with_flags(value: JsValue, flags: PropertyFlags) -> Self {
        Self {
            value: Some(value),
            getter: None,
            setter: None,
            writable: Some(flags.writable),
            enumerable: Some(flags.enumerable),
            configurable: Some(flags.configurable),
        }
    }

    /// Complete accessor descriptor
    pub fn accessor(getter: JsValue, setter: JsValue, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: None,
            getter: Some(getter),
            setter: Some(setter),
            writable: None,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    /// Make an existing property non-writable and non-configurable, leaving
    /// its value and enumerability alone
    pub fn read_only() -> Self {
        Self {
            writable: Some(false),
            configurable: Some(false),
            ..Self::default()
        }
    }

    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    pub fn is_accessor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }
}

/// Options for property operations that can be rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropOpFlags {
    /// Raise a TypeError instead of returning `false` on rejection
    pub throw_on_error: bool,
}

impl PropOpFlags {
    pub const THROW: PropOpFlags = PropOpFlags {
        throw_on_error: true,
    };
    pub const SILENT: PropOpFlags = PropOpFlags {
        throw_on_error: false,
    };
}

/// Native function signature shared by every built-in
pub type NativeFn = fn(&mut Runtime, &NativeArgs) -> JsResult<JsValue>;

/// Function body implemented by a Rust closure
pub type HostFn = Rc<dyn Fn(&mut Runtime, &NativeArgs) -> JsResult<JsValue>>;

/// How a function object runs
#[derive(Clone)]
pub enum FunctionKind {
    /// A built-in operation
    Native { func: NativeFn, arity: u8 },
    /// An embedder-provided closure with no owning module
    Host(HostFn),
    /// Compiled code belonging to a module
    Code { module: ModuleId, body: HostFn },
}

/// Internal state of an executing generator function
#[derive(Debug, Clone, Default)]
pub struct GeneratorActivation {
    /// Set by `yield*` so the next resume forwards throw/return to the inner iterator
    pub delegated: bool,
}

/// Function exotic object data
#[derive(Clone)]
pub struct FunctionData {
    pub name: JsString,
    pub kind: FunctionKind,
    pub is_constructor: bool,
    /// Present for generator activations
    pub generator: Option<GeneratorActivation>,
}

impl FunctionData {
    /// Module owning the function's code, if it is compiled code
    pub fn module(&self) -> Option<ModuleId> {
        match &self.kind {
            FunctionKind::Code { module, .. } => Some(*module),
            FunctionKind::Native { .. } | FunctionKind::Host(_) => None,
        }
    }
}

impl fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            FunctionKind::Native { .. } => "native",
            FunctionKind::Host(_) => "host",
            FunctionKind::Code { .. } => "code",
        };
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("generator", &self.generator)
            .finish()
    }
}

/// Exotic object behavior
#[derive(Debug, Clone, Default)]
pub enum ObjectKind {
    #[default]
    Ordinary,
    /// Array exotic object; `length` is virtual and always non-configurable
    Array { length: u32, length_writable: bool },
    Function(Box<FunctionData>),
    /// %ArrayIteratorPrototype% instance over any array-like
    ArrayIterator {
        target: ObjectId,
        next_index: u32,
        done: bool,
    },
    /// %StringIteratorPrototype% instance, position in bytes
    StringIterator { string: JsString, position: usize },
}

/// A JavaScript object
#[derive(Debug, Clone, Default)]
pub struct JsObject {
    pub prototype: Option<ObjectId>,
    pub extensible: bool,
    /// Indexed properties, ascending
    pub elements: BTreeMap<u32, Property>,
    /// Named properties in definition order
    pub properties: IndexMap<PropertyKey, Property, FxBuildHasher>,
    pub kind: ObjectKind,
}

impl JsObject {
    pub fn with_prototype(prototype: Option<ObjectId>) -> Self {
        Self {
            prototype,
            extensible: true,
            ..Self::default()
        }
    }

    pub fn array(prototype: Option<ObjectId>, length: u32) -> Self {
        Self {
            kind: ObjectKind::Array {
                length,
                length_writable: true,
            },
            ..Self::with_prototype(prototype)
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array { .. })
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn function(&self) -> Option<&FunctionData> {
        match &self.kind {
            ObjectKind::Function(data) => Some(data),
            _ => None,
        }
    }

    pub fn function_mut(&mut self) -> Option<&mut FunctionData> {
        match &mut self.kind {
            ObjectKind::Function(data) => Some(data),
            _ => None,
        }
    }

    /// Own property stored in element or named storage (not the virtual array `length`)
    pub fn stored_property(&self, key: &PropertyKey) -> Option<&Property> {
        match key {
            PropertyKey::Index(i) => self.elements.get(i),
            _ => self.properties.get(key),
        }
    }

    pub fn stored_property_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
        match key {
            PropertyKey::Index(i) => self.elements.get_mut(i),
            _ => self.properties.get_mut(key),
        }
    }

    pub fn insert_property(&mut self, key: PropertyKey, property: Property) {
        match key {
            PropertyKey::Index(i) => {
                self.elements.insert(i, property);
            }
            key => {
                self.properties.insert(key, property);
            }
        }
    }

    /// Remove an own property, keeping the definition order of the rest
    pub fn remove_property(&mut self, key: &PropertyKey) -> Option<Property> {
        match key {
            PropertyKey::Index(i) => self.elements.remove(i),
            _ => self.properties.shift_remove(key),
        }
    }
}

impl Traceable for JsObject {
    fn trace(&self, visitor: &mut dyn FnMut(ObjectId)) {
        if let Some(proto) = self.prototype {
            visitor(proto);
        }
        for property in self.elements.values().chain(self.properties.values()) {
            match &property.slot {
                PropertySlot::Data(value) => value.trace(visitor),
                PropertySlot::Accessor { getter, setter } => {
                    getter.trace(visitor);
                    setter.trace(visitor);
                }
            }
        }
        if let ObjectKind::ArrayIterator { target, .. } = &self.kind {
            visitor(*target);
        }
    }
}

/// Object classes accepted by `NativeArgs::dyncast_arg`
pub trait ObjectClass {
    fn is_instance(object: &JsObject) -> bool;
}

/// Any object
pub struct AnyObject;

/// Array exotic objects
pub struct ArrayObject;

/// Objects with a [[Call]] slot
pub struct CallableObject;

impl ObjectClass for AnyObject {
    fn is_instance(_object: &JsObject) -> bool {
        true
    }
}

impl ObjectClass for ArrayObject {
    fn is_instance(object: &JsObject) -> bool {
        object.is_array()
    }
}

impl ObjectClass for CallableObject {
    fn is_instance(object: &JsObject) -> bool {
        object.is_callable()
    }
}
