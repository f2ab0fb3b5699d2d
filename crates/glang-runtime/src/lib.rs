//! glang dispatch runtime.
//!
//! Compiled glang code leaves every dynamic decision to this crate: which
//! overload a call reaches, which extension or declared member a method
//! access names, what a global or an import resolves to. Each decision is
//! made once per call shape or name and cached.
//!
//! ## Modules
//!
//! - [`value`]: Dynamically typed values
//! - [`class`]: Classes, methods, fields and the class builder
//! - [`lookup`]: Overload resolution and the method and field resolvers
//! - [`extension`]: The extension method registry
//! - [`import`]: Qualified and star import resolution
//! - [`builtins`]: Core classes, default extensions and builtin functions
//! - [`unit`] / [`vm`]: Loaded units and the bytecode interpreter
//! - [`runtime`]: The [`Runtime`] tying it all together

pub mod builtins;
pub mod cache;
pub mod class;
pub mod class_path;
pub mod config;
pub mod extension;
pub mod import;
pub mod lookup;
pub mod native;
pub mod output;
pub mod runtime;
pub mod unit;
pub mod value;
pub mod vm;

pub use builtins::{LANG_PACKAGE, LangClasses};
pub use cache::{CacheSpec, CacheStats, ResultCache};
pub use class::{ClassBuilder, ClassRef, MethodDef, Modifiers, ParamType};
pub use class_path::{ClassPath, ClassSource};
pub use config::{ConfigError, RuntimeConfig};
pub use extension::{ExtensionRegistrar, ExtensionRegistry};
pub use lookup::{LookupMode, MethodLookup};
pub use native::CallContext;
pub use output::{CapturedOutput, OutputSink, StdStreams};
pub use runtime::{Runtime, RuntimeBuilder};
pub use unit::{Globals, LoadedUnit};
pub use value::{FromValue, Object, OptionalParameter, Value};

pub use glang_core::{RuntimeError, RuntimeResult};
