//! Built-in classes and namespaces.
//!
//! [`LangClasses`] holds the core classes every value maps onto. They are
//! importable by simple name from any unit. The `glang.*Ns` namespaces hold
//! the default extensions and the star-imported builtin functions.

mod builtins_ns;
mod extensions;
mod lang;

use glang_core::{RuntimeError, RuntimeResult};

use crate::class::{ClassRef, ParamType};
use crate::value::Value;

pub use builtins_ns::builtins_namespace;
pub use extensions::{DefaultExtensions, Namespaces};

/// Package of the core classes.
pub const LANG_PACKAGE: &str = "glang.lang";

/// The core classes.
#[derive(Debug, Clone)]
pub struct LangClasses {
    pub object: ClassRef,
    pub comparable: ClassRef,
    pub number: ClassRef,
    pub boolean: ClassRef,
    pub integer: ClassRef,
    pub long: ClassRef,
    pub double: ClassRef,
    pub big_integer: ClassRef,
    pub string: ClassRef,
    pub array: ClassRef,
    pub optional: ClassRef,
    /// The metaclass: the class of class values.
    pub class: ClassRef,
    /// The class of method values.
    pub method: ClassRef,
    /// The class of null.
    pub void: ClassRef,
    pub math: ClassRef,
    pub string_builder: ClassRef,
}

impl LangClasses {
    pub fn new() -> Self {
        lang::build()
    }

    /// Every core class, in import order.
    pub fn all(&self) -> [&ClassRef; 16] {
        [
            &self.object,
            &self.comparable,
            &self.number,
            &self.boolean,
            &self.integer,
            &self.long,
            &self.double,
            &self.big_integer,
            &self.string,
            &self.array,
            &self.optional,
            &self.class,
            &self.method,
            &self.void,
            &self.math,
            &self.string_builder,
        ]
    }

    /// The runtime class of `value`.
    pub fn class_of(&self, value: &Value) -> ClassRef {
        match value {
            Value::Null => self.void.clone(),
            Value::Bool(_) => self.boolean.clone(),
            Value::Int(_) => self.integer.clone(),
            Value::Long(_) => self.long.clone(),
            Value::Double(_) => self.double.clone(),
            Value::BigInt(_) => self.big_integer.clone(),
            Value::Str(_) => self.string.clone(),
            Value::Array(_) => self.array.clone(),
            Value::Optional(_) => self.optional.clone(),
            Value::Class(_) => self.class.clone(),
            Value::Method(_) => self.method.clone(),
            Value::Object(object) => object.class().clone(),
        }
    }
}

impl Default for LangClasses {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn obj(class: &ClassRef) -> ParamType {
    ParamType::Object(class.clone())
}

pub(crate) fn divide_by_zero() -> RuntimeError {
    RuntimeError::Arithmetic("/ by zero".into())
}

/// Floor modulus: the result takes the sign of the divisor.
pub(crate) fn floor_mod_i32(a: i32, b: i32) -> RuntimeResult<i32> {
    if b == 0 {
        return Err(divide_by_zero());
    }
    let r = a.wrapping_rem(b);
    Ok(if r != 0 && (r ^ b) < 0 { r + b } else { r })
}

pub(crate) fn floor_mod_i64(a: i64, b: i64) -> RuntimeResult<i64> {
    if b == 0 {
        return Err(divide_by_zero());
    }
    let r = a.wrapping_rem(b);
    Ok(if r != 0 && (r ^ b) < 0 { r + b } else { r })
}
