use glang_core::{CompileErrors, RuntimeError};
use glang_runtime::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileErrors),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A script path without the `.glang` suffix.
    #[error("not a glang source path: {0}")]
    InvalidPath(String),
}

impl Error {
    /// The compile diagnostics behind this error, whether compilation
    /// failed up front or while loading a unit on demand.
    pub fn compile_errors(&self) -> Option<&CompileErrors> {
        match self {
            Error::Compile(errors) | Error::Runtime(RuntimeError::CompileFailed(errors)) => {
                Some(errors)
            }
            _ => None,
        }
    }
}
