//! Field resolution to a getter and an optional setter.

use glang_core::{RuntimeError, RuntimeResult};

use crate::cache::{CacheSpec, ResultCache};
use crate::class::{ClassRef, FieldStorage};
use crate::runtime::Runtime;
use crate::value::Value;

/// A resolved field. Final fields have no setter.
#[derive(Debug, Clone)]
pub struct FieldAccess {
    owner: String,
    name: String,
    getter: FieldStorage,
    setter: Option<FieldStorage>,
}

impl FieldAccess {
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    pub fn get(&self, receiver: &Value) -> RuntimeResult<Value> {
        read(&self.getter, receiver)
    }

    pub fn set(&self, receiver: &Value, value: Value) -> RuntimeResult<()> {
        let Some(setter) = &self.setter else {
            return Err(RuntimeError::ReadOnlyField {
                owner: self.owner.clone(),
                name: self.name.clone(),
            });
        };
        match setter {
            FieldStorage::Static(cell) => *cell.write() = value,
            FieldStorage::Instance(slot) => match receiver {
                Value::Object(object) => object.set(*slot, value),
                other => return Err(not_an_instance(other)),
            },
        }
        Ok(())
    }
}

fn read(storage: &FieldStorage, receiver: &Value) -> RuntimeResult<Value> {
    match storage {
        FieldStorage::Static(cell) => Ok(cell.read().clone()),
        FieldStorage::Instance(slot) => match receiver {
            Value::Object(object) => Ok(object.get(*slot)),
            other => Err(not_an_instance(other)),
        },
    }
}

fn not_an_instance(value: &Value) -> RuntimeError {
    RuntimeError::IllegalArgument(format!("{value:?} has no instance fields"))
}

/// Cached field lookups, keyed by class, name and whether the access is
/// through a class value.
#[derive(Debug)]
pub struct FieldResolver {
    cache: ResultCache<(ClassRef, String, bool), FieldAccess>,
}

impl FieldResolver {
    pub fn new(spec: CacheSpec) -> Self {
        Self {
            cache: ResultCache::new(spec),
        }
    }

    /// Resolve a public field of `class`. A static access only sees static
    /// fields.
    pub fn resolve(&self, class: &ClassRef, name: &str, is_static: bool) -> RuntimeResult<FieldAccess> {
        let key = (class.clone(), name.to_string(), is_static);
        self.cache.get_or_try_insert_with(&key, || {
            let field = class
                .public_field(name)
                .filter(|f| f.is_static() || !is_static)
                .ok_or_else(|| RuntimeError::NoSuchField {
                    owner: class.canonical_name(),
                    name: name.to_string(),
                    is_static,
                })?;
            Ok(FieldAccess {
                owner: class.canonical_name(),
                name: name.to_string(),
                getter: field.storage.clone(),
                setter: (!field.is_final()).then(|| field.storage.clone()),
            })
        })
    }

    pub fn get(&self, runtime: &Runtime, receiver: &Value, name: &str) -> RuntimeResult<Value> {
        let (class, is_static) = receiver_class(runtime, receiver, name, "get")?;
        self.resolve(&class, name, is_static)?.get(receiver)
    }

    pub fn set(&self, runtime: &Runtime, receiver: &Value, name: &str, value: Value) -> RuntimeResult<()> {
        let (class, is_static) = receiver_class(runtime, receiver, name, "set")?;
        self.resolve(&class, name, is_static)?.set(receiver, value)
    }
}

fn receiver_class(
    runtime: &Runtime,
    receiver: &Value,
    name: &str,
    action: &str,
) -> RuntimeResult<(ClassRef, bool)> {
    match receiver {
        Value::Null => Err(RuntimeError::null_target(format!(
            "Cannot {action} field '{name}' on null"
        ))),
        Value::Class(class) => Ok((class.clone(), true)),
        other => Ok((runtime.class_of(other), false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassBuilder, Modifiers};
    use crate::value::Object;

    fn point() -> ClassRef {
        ClassBuilder::new("demo.Point")
            .field("x", Modifiers::PUBLIC)
            .field("id", Modifiers::PUBLIC | Modifiers::FINAL)
            .static_field("ORIGIN", Value::Int(0), Modifiers::PUBLIC)
            .static_field("LIMIT", Value::Int(9), Modifiers::PUBLIC | Modifiers::FINAL)
            .build()
    }

    #[test]
    fn instance_fields() {
        let runtime = Runtime::new();
        let class = point();
        let object = Value::Object(Object::new(class));

        runtime.set_field(&object, "x", Value::Int(5)).unwrap();
        assert_eq!(runtime.get_field(&object, "x").unwrap(), Value::Int(5));
        assert_eq!(runtime.get_field(&object, "id").unwrap(), Value::Null);
    }

    #[test]
    fn final_fields_are_read_only() {
        let runtime = Runtime::new();
        let object = Value::Object(Object::new(point()));
        let err = runtime.set_field(&object, "id", Value::Int(1)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot set final field demo.Point.id");

        let class = Value::Class(point());
        assert!(runtime.set_field(&class, "LIMIT", Value::Int(1)).is_err());
    }

    #[test]
    fn static_access_sees_static_fields_only() {
        let runtime = Runtime::new();
        let class = Value::Class(point());
        runtime.set_field(&class, "ORIGIN", Value::Int(3)).unwrap();
        assert_eq!(runtime.get_field(&class, "ORIGIN").unwrap(), Value::Int(3));

        let err = runtime.get_field(&class, "x").unwrap_err();
        assert_eq!(err.to_string(), "no such field: static demo.Point.x");
    }

    #[test]
    fn null_receiver() {
        let runtime = Runtime::new();
        let err = runtime.get_field(&Value::Null, "x").unwrap_err();
        assert_eq!(err.to_string(), "Cannot get field 'x' on null");
        let err = runtime.set_field(&Value::Null, "x", Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Cannot set field 'x' on null");
    }
}
