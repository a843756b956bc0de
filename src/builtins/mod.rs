//! Native built-in operations
//!
//! A fixed, append-only table the compiler calls by index. Indices, names and
//! arities are stable; user code cannot reach or shadow these through name
//! lookup.

mod apply;
mod args;
mod generator;
mod helpers;
mod properties;
mod require;
mod spread;
mod template;

pub use args::NativeArgs;

use crate::error::{JsError, JsResult};
use crate::gc::ObjectId;
use crate::object::NativeFn;
use crate::runtime::Runtime;
use crate::value::JsValue;

/// Index into the built-in table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BuiltinMethod {
    SilentSetPrototypeOf = 0,
    GetTemplateObject = 1,
    EnsureObject = 2,
    ThrowTypeError = 3,
    GeneratorSetDelegated = 4,
    CopyDataProperties = 5,
    CopyRestArgs = 6,
    ArraySpread = 7,
    Apply = 8,
    ExportAll = 9,
    ExponentiationOperator = 10,
    RequireFast = 11,
}

impl BuiltinMethod {
    pub const ALL: [BuiltinMethod; 12] = [
        BuiltinMethod::SilentSetPrototypeOf,
        BuiltinMethod::GetTemplateObject,
        BuiltinMethod::EnsureObject,
        BuiltinMethod::ThrowTypeError,
        BuiltinMethod::GeneratorSetDelegated,
        BuiltinMethod::CopyDataProperties,
        BuiltinMethod::CopyRestArgs,
        BuiltinMethod::ArraySpread,
        BuiltinMethod::Apply,
        BuiltinMethod::ExportAll,
        BuiltinMethod::ExponentiationOperator,
        BuiltinMethod::RequireFast,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Declared name
    pub fn name(self) -> &'static str {
        match self {
            BuiltinMethod::SilentSetPrototypeOf => "silentSetPrototypeOf",
            BuiltinMethod::GetTemplateObject => "getTemplateObject",
            BuiltinMethod::EnsureObject => "ensureObject",
            BuiltinMethod::ThrowTypeError => "throwTypeError",
            BuiltinMethod::GeneratorSetDelegated => "generatorSetDelegated",
            BuiltinMethod::CopyDataProperties => "copyDataProperties",
            BuiltinMethod::CopyRestArgs => "copyRestArgs",
            BuiltinMethod::ArraySpread => "arraySpread",
            BuiltinMethod::Apply => "apply",
            BuiltinMethod::ExportAll => "exportAll",
            BuiltinMethod::ExponentiationOperator => "exponentiationOperator",
            BuiltinMethod::RequireFast => "requireFast",
        }
    }

    /// Declared arity (the function's `length`)
    pub fn arity(self) -> u8 {
        match self {
            BuiltinMethod::SilentSetPrototypeOf => 2,
            BuiltinMethod::GetTemplateObject => 0,
            BuiltinMethod::EnsureObject => 2,
            BuiltinMethod::ThrowTypeError => 1,
            BuiltinMethod::GeneratorSetDelegated => 1,
            BuiltinMethod::CopyDataProperties => 3,
            BuiltinMethod::CopyRestArgs => 1,
            BuiltinMethod::ArraySpread => 2,
            BuiltinMethod::Apply => 2,
            BuiltinMethod::ExportAll => 0,
            BuiltinMethod::ExponentiationOperator => 0,
            BuiltinMethod::RequireFast => 1,
        }
    }

    fn native(self) -> NativeFn {
        match self {
            BuiltinMethod::SilentSetPrototypeOf => helpers::silent_set_prototype_of,
            BuiltinMethod::GetTemplateObject => template::get_template_object,
            BuiltinMethod::EnsureObject => helpers::ensure_object,
            BuiltinMethod::ThrowTypeError => helpers::throw_type_error,
            BuiltinMethod::GeneratorSetDelegated => generator::generator_set_delegated,
            BuiltinMethod::CopyDataProperties => properties::copy_data_properties,
            BuiltinMethod::CopyRestArgs => spread::copy_rest_args,
            BuiltinMethod::ArraySpread => spread::array_spread,
            BuiltinMethod::Apply => apply::apply,
            BuiltinMethod::ExportAll => properties::export_all,
            BuiltinMethod::ExponentiationOperator => helpers::exponentiation_operator,
            BuiltinMethod::RequireFast => require::require_fast,
        }
    }
}

/// Function objects bound to each built-in index
#[derive(Debug, Default)]
pub struct BuiltinTable {
    entries: Vec<Option<ObjectId>>,
}

impl BuiltinTable {
    pub fn get(&self, method: BuiltinMethod) -> Option<ObjectId> {
        self.entries.get(method.index()).copied().flatten()
    }

    fn define(&mut self, method: BuiltinMethod, function: ObjectId) {
        let index = method.index();
        if self.entries.len() <= index {
            self.entries.resize(index + 1, None);
        }
        if let Some(slot) = self.entries.get_mut(index) {
            debug_assert!(slot.is_none(), "built-in {} defined twice", method.name());
            *slot = Some(function);
        }
    }

    /// Number of bound entries
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuiltinMethod, ObjectId)> + '_ {
        self.entries.iter().enumerate().filter_map(|(index, entry)| {
            Some((BuiltinMethod::from_index(index)?, (*entry)?))
        })
    }
}

/// Bind every built-in to a native function object
pub(crate) fn install(rt: &mut Runtime) {
    for method in BuiltinMethod::ALL {
        let function = rt.create_native_function(method.name(), method.native(), method.arity());
        rt.builtins.define(method, function);
    }
    log::debug!("registered {} native built-ins", rt.builtins.len());
}

impl Runtime {
    pub fn builtins(&self) -> &BuiltinTable {
        &self.builtins
    }

    /// Invoke a built-in by index with `this` = undefined
    pub fn call_builtin(&mut self, method: BuiltinMethod, args: &[JsValue]) -> JsResult<JsValue> {
        let function = self.builtins.get(method).ok_or_else(|| {
            JsError::internal(format!("built-in {} is not registered", method.name()))
        })?;
        self.call(&JsValue::Object(function), JsValue::Undefined, args)
    }
}
