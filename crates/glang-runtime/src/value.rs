//! Runtime values.

use std::fmt;
use std::sync::Arc;

use glang_core::text::format_double;
use glang_core::{RuntimeError, RuntimeResult};
use num_bigint::BigInt;
use parking_lot::RwLock;

use crate::class::ClassRef;
use crate::lookup::MethodLookup;

/// A dynamically typed value.
///
/// Cloning is cheap: every heap-backed variant is reference counted.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    BigInt(Arc<BigInt>),
    Str(Arc<str>),
    Array(Arc<[Value]>),
    /// Value handed to an optional parameter.
    Optional(OptionalParameter),
    /// A class used as a value: calling it constructs an instance.
    Class(ClassRef),
    /// A callable overload set.
    Method(Arc<MethodLookup>),
    Object(Arc<Object>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Arc::from(values))
    }

    pub fn big(value: BigInt) -> Self {
        Value::BigInt(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness for every variant that decides it without a method call.
    ///
    /// Returns `None` for objects, classes, methods and optionals, whose
    /// truthiness depends on a `booleanValue` member.
    pub fn intrinsic_truthiness(&self) -> Option<bool> {
        Some(match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Long(l) => *l != 0,
            Value::BigInt(b) => b.sign() != num_bigint::Sign::NoSign,
            Value::Double(d) => *d != 0.0 && !d.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Optional(_) | Value::Class(_) | Value::Method(_) | Value::Object(_) => {
                return None;
            }
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Value equality for immutable values, identity for everything else.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            // NaN equals itself, -0.0 differs from 0.0
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Optional(a), Value::Optional(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Double(d) => f.write_str(&format_double(*d)),
            Value::BigInt(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Value::Optional(opt) => write!(f, "{opt}"),
            Value::Class(class) => write!(f, "class {}", class.name()),
            Value::Method(lookup) => write!(f, "{lookup}"),
            Value::Object(object) => write!(f, "{object}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::big(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::str(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Arc::from(value))
    }
}

impl From<ClassRef> for Value {
    fn from(value: ClassRef) -> Self {
        Value::Class(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

/// Conversion from a [`Value`] to a native argument type.
///
/// Overload resolution has already checked the argument's runtime type, so
/// a failed conversion means a native method was declared with the wrong
/// parameter type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> RuntimeResult<Self>;
}

fn mismatch(expected: &str, value: &Value) -> RuntimeError {
    RuntimeError::IllegalArgument(format!("expected {expected}, got {value:?}"))
}

macro_rules! from_value {
    ($ty:ty, $name:literal, $($pat:pat => $out:expr),+ $(,)?) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> RuntimeResult<Self> {
                match value {
                    $($pat => Ok($out),)+
                    other => Err(mismatch($name, other)),
                }
            }
        }
    };
}

from_value!(bool, "boolean", Value::Bool(b) => *b);
from_value!(i32, "int", Value::Int(i) => *i);
from_value!(i64, "long", Value::Long(l) => *l);
from_value!(f64, "double", Value::Double(d) => *d);
from_value!(Arc<str>, "String", Value::Str(s) => s.clone());
from_value!(Arc<BigInt>, "BigInteger", Value::BigInt(b) => b.clone());
from_value!(Arc<[Value]>, "array", Value::Array(a) => a.clone());
from_value!(ClassRef, "Class", Value::Class(c) => c.clone());
from_value!(Arc<Object>, "object", Value::Object(o) => o.clone());
from_value!(OptionalParameter, "OptionalParameter", Value::Optional(o) => o.clone());

impl FromValue for Value {
    fn from_value(value: &Value) -> RuntimeResult<Self> {
        Ok(value.clone())
    }
}

/// The value of an optional parameter: absent, or present with a value.
#[derive(Clone, Default)]
pub struct OptionalParameter(Option<Arc<Value>>);

impl OptionalParameter {
    pub fn absent() -> Self {
        OptionalParameter(None)
    }

    pub fn present(value: Value) -> Self {
        OptionalParameter(Some(Arc::new(value)))
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    pub fn get(&self) -> RuntimeResult<&Value> {
        self.0.as_deref().ok_or_else(|| {
            RuntimeError::IllegalArgument("Cannot get() an absent OptionalParameter".into())
        })
    }
}

impl PartialEq for OptionalParameter {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for OptionalParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("Absent"),
            Some(value) => write!(f, "Present[{value}]"),
        }
    }
}

/// An instance of a class with instance field slots.
pub struct Object {
    class: ClassRef,
    fields: RwLock<Vec<Value>>,
}

impl Object {
    /// Allocate an instance with every field set to null.
    pub fn new(class: ClassRef) -> Arc<Self> {
        let fields = vec![Value::Null; class.instance_slots()];
        Arc::new(Self {
            class,
            fields: RwLock::new(fields),
        })
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn get(&self, slot: usize) -> Value {
        self.fields.read().get(slot).cloned().unwrap_or(Value::Null)
    }

    pub fn set(&self, slot: usize, value: Value) {
        if let Some(field) = self.fields.write().get_mut(slot) {
            *field = value;
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.class.name(), self as *const Object as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Double(2.0).to_string(), "2.0");
        assert_eq!(Value::str("hi").to_string(), "hi");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::array(vec![Value::Int(1), Value::str("a")]).to_string(),
            "[1, a]"
        );
        assert_eq!(Value::big(BigInt::from(-12)).to_string(), "-12");
    }

    #[test]
    fn optional_display() {
        assert_eq!(OptionalParameter::absent().to_string(), "Absent");
        assert_eq!(
            OptionalParameter::present(Value::Int(4)).to_string(),
            "Present[4]"
        );
        assert!(OptionalParameter::absent().get().is_err());
    }

    #[test]
    fn intrinsic_truthiness() {
        assert_eq!(Value::Null.intrinsic_truthiness(), Some(false));
        assert_eq!(Value::Int(0).intrinsic_truthiness(), Some(false));
        assert_eq!(Value::Long(-1).intrinsic_truthiness(), Some(true));
        assert_eq!(Value::Double(f64::NAN).intrinsic_truthiness(), Some(false));
        assert_eq!(Value::big(BigInt::from(0)).intrinsic_truthiness(), Some(false));
        assert_eq!(Value::str("").intrinsic_truthiness(), Some(false));
        assert_eq!(Value::array(vec![]).intrinsic_truthiness(), Some(false));
        assert_eq!(
            Value::Optional(OptionalParameter::absent()).intrinsic_truthiness(),
            None
        );
    }

    #[test]
    fn equality_is_per_type() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Long(1));
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_eq!(Value::str("a"), Value::str("a"));
        let array = Value::array(vec![Value::Int(1)]);
        assert_eq!(array, array.clone());
        assert_ne!(array, Value::array(vec![Value::Int(1)]));
    }

    #[test]
    fn native_conversions() {
        assert_eq!(i32::from_value(&Value::Int(5)).unwrap(), 5);
        assert!(i32::from_value(&Value::Long(5)).is_err());
        assert_eq!(&*Arc::<str>::from_value(&Value::str("x")).unwrap(), "x");
    }
}
