//! Native function storage and the context they are called with.

use std::fmt;
use std::sync::Arc;

use glang_core::{RuntimeError, RuntimeResult};

use crate::runtime::Runtime;
use crate::value::{FromValue, Value};

/// Context for native function calls.
///
/// Holds the final, adapted argument list: the receiver first for instance
/// methods and extensions, optional parameters wrapped, and a variadic tail
/// collected into one array.
///
/// ```ignore
/// let a: i32 = ctx.arg(0)?;
/// let b: i32 = ctx.arg(1)?;
/// Ok(Value::Int(a + b))
/// ```
pub struct CallContext<'rt> {
    runtime: &'rt Runtime,
    args: Vec<Value>,
}

impl<'rt> CallContext<'rt> {
    pub fn new(runtime: &'rt Runtime, args: Vec<Value>) -> Self {
        Self { runtime, args }
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Get a raw argument.
    pub fn arg_value(&self, index: usize) -> RuntimeResult<&Value> {
        self.args.get(index).ok_or_else(|| {
            RuntimeError::IllegalArgument(format!(
                "argument {index} out of range ({} passed)",
                self.args.len()
            ))
        })
    }

    /// Get a typed argument.
    pub fn arg<T: FromValue>(&self, index: usize) -> RuntimeResult<T> {
        T::from_value(self.arg_value(index)?)
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext<'_>) -> RuntimeResult<Value>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> RuntimeResult<Value>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> RuntimeResult<Value> {
        (self)(ctx)
    }
}

/// Type-erased native function, shared between every member that uses it.
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn call(&self, runtime: &Runtime, args: Vec<Value>) -> RuntimeResult<Value> {
        let mut ctx = CallContext::new(runtime, args);
        self.inner.call(&mut ctx)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}
