//! Native built-in operations for an embeddable ECMAScript runtime
//!
//! The compiler lowers template literals, rest/spread, `apply`, `export *`,
//! `yield*` bookkeeping and a few guards to calls into a fixed table of
//! native operations, addressed by index. This crate provides that table
//! together with the heap, object model, frame stack and module state it
//! runs against.
//!
//! # Example
//!
//! ```
//! use jsnative::{BuiltinMethod, JsValue, Runtime};
//!
//! let mut rt = Runtime::new();
//! let result = rt
//!     .call_builtin(BuiltinMethod::ExponentiationOperator, &[JsValue::from(2), JsValue::from(10)])
//!     .unwrap();
//! assert_eq!(result, JsValue::from(1024));
//! ```

pub mod builtins;
pub mod config;
pub mod error;
pub mod gc;
pub mod module;
pub mod object;
pub mod runtime;
pub mod value;

pub use builtins::{BuiltinMethod, NativeArgs};
pub use config::{ConfigError, RuntimeConfig};
pub use error::{JsError, JsResult};
pub use gc::{DEFAULT_GC_THRESHOLD, GcScope, GcStats, Handle, ObjectHandle, ObjectId};
pub use module::ModuleId;
pub use object::{
    JsObject, ObjectKind, PropOpFlags, Property, PropertyDescriptor, PropertyFlags, PropertySlot,
};
pub use runtime::{IteratorRecord, NativeCallFrame, Runtime, StackFrame};
pub use value::{JsString, JsSymbol, JsValue, PropertyKey};
