//! Core types shared by every glang crate.
//!
//! This crate holds the pieces the parser, code generator and dispatch runtime
//! all agree on: source spans, the error hierarchy, the naming rules that map a
//! dotted namespace path to a generated type name, and the calling ABI
//! constants compiled code and the runtime must match exactly.

pub mod abi;
pub mod error;
pub mod naming;
pub mod span;
pub mod text;

pub use abi::{BinaryOperator, MAX_CALL_ARGS, MAX_FIXED_ARITY};
pub use error::{
    CompileError, CompileErrors, LexError, ParseError, ParseErrorKind, ParseErrors, RuntimeError,
    RuntimeResult,
};
pub use naming::{
    SOURCE_SUFFIX, TYPE_NAME_MARKER, namespace_for_path, source_path_for, type_name_for,
};
pub use span::Span;
