//! glang: a small dynamically typed scripting language.
//!
//! Scripts compile to one bytecode unit per source file. Everything dynamic
//! (calls, operators, member access, globals and imports) is resolved at run
//! time by the dispatch runtime, with every decision cached.
//!
//! ```ignore
//! use glang::Engine;
//!
//! let engine = Engine::builder().include_dir("scripts").build();
//! engine.run_source("demo.hello", "println(\"hello\")", vec![])?;
//! ```
//!
//! The pieces are usable on their own: `glang-parser` for syntax trees,
//! [`glang_compiler`] for bytecode and [`glang_runtime`] for dispatch.

mod engine;
mod error;
pub mod loader;

pub use engine::{Engine, EngineBuilder};
pub use error::{Error, Result};
pub use loader::{DirectorySource, MemorySource, ModuleLoader, SourceFile, SourceProvider};

pub use glang_compiler::{CodeUnit, CompileOptions};
pub use glang_core::{CompileError, CompileErrors, RuntimeError, RuntimeResult, Span};
pub use glang_runtime::{
    CapturedOutput, ExtensionRegistrar, ExtensionRegistry, LoadedUnit, OutputSink, Runtime,
    RuntimeConfig, Value,
};
