//! Method lookup by receiver.
//!
//! ```text
//! receiver        plain                              direct
//! --------        -----                              ------
//! value of T      extensions on T, else T's methods  T's methods
//! class value C   extensions on Class, C's statics,  Class's methods
//!                 then Class's methods
//! ```
//!
//! Every result is cached per (class, name) and mode.

use std::sync::Arc;

use glang_core::{RuntimeError, RuntimeResult};

use crate::cache::{CacheSpec, ResultCache};
use crate::class::ClassRef;
use crate::runtime::Runtime;
use crate::value::Value;

use super::{Candidate, MethodLookup};

/// Whether a method access may be satisfied by an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupMode {
    /// Extensions first, then declared members.
    Plain,
    /// Declared members only.
    Direct,
}

type LookupCache = ResultCache<(ClassRef, String), Option<Arc<MethodLookup>>>;

/// Cached method lookups for every receiver class.
#[derive(Debug)]
pub struct MethodResolver {
    declared: LookupCache,
    statics: LookupCache,
    extensions: LookupCache,
    method_cache: CacheSpec,
}

impl MethodResolver {
    pub fn new(lookup_cache: CacheSpec, method_cache: CacheSpec) -> Self {
        Self {
            declared: ResultCache::new(lookup_cache),
            statics: ResultCache::new(lookup_cache),
            extensions: ResultCache::new(lookup_cache),
            method_cache,
        }
    }

    /// Drop cached extension lookups after the registry changed.
    pub fn clear_extensions(&self) {
        self.extensions.clear();
    }

    /// Resolve `name` on `receiver`.
    pub fn method(
        &self,
        runtime: &Runtime,
        receiver: &Value,
        name: &str,
        mode: LookupMode,
    ) -> RuntimeResult<Arc<MethodLookup>> {
        match receiver {
            Value::Null => Err(RuntimeError::null_target(format!(
                "Cannot invoke method '{name}' on null"
            ))),
            Value::Class(class) => self.for_class(runtime, class, name, mode),
            other => self.for_instance(runtime, &runtime.class_of(other), name, mode),
        }
    }

    /// Resolve `name` on an instance of `class`.
    pub fn for_instance(
        &self,
        runtime: &Runtime,
        class: &ClassRef,
        name: &str,
        mode: LookupMode,
    ) -> RuntimeResult<Arc<MethodLookup>> {
        if mode == LookupMode::Plain {
            if let Some(lookup) = self.extension(runtime, class, name)? {
                return Ok(lookup);
            }
        }
        self.declared(class, name)?
            .ok_or_else(|| no_such_method(class, name))
    }

    /// Resolve `name` on a class used as a value.
    pub fn for_class(
        &self,
        runtime: &Runtime,
        class: &ClassRef,
        name: &str,
        mode: LookupMode,
    ) -> RuntimeResult<Arc<MethodLookup>> {
        let metaclass = &runtime.lang().class;
        if mode == LookupMode::Plain {
            if let Some(lookup) = self.extension(runtime, metaclass, name)? {
                return Ok(lookup);
            }
            if let Some(lookup) = self.statics(class, name)? {
                return Ok(lookup);
            }
        }
        self.declared(metaclass, name)?
            .ok_or_else(|| no_such_method(class, name))
    }

    fn declared(&self, class: &ClassRef, name: &str) -> RuntimeResult<Option<Arc<MethodLookup>>> {
        let key = (class.clone(), name.to_string());
        self.declared.get_or_try_insert_with(&key, || {
            let candidates: Vec<Candidate> = class
                .public_methods(name, false)
                .into_iter()
                .map(|(declaring, m)| Candidate::instance(&declaring, m))
                .collect();
            Ok(self.build(class, name, candidates))
        })
    }

    fn statics(&self, class: &ClassRef, name: &str) -> RuntimeResult<Option<Arc<MethodLookup>>> {
        let key = (class.clone(), name.to_string());
        self.statics.get_or_try_insert_with(&key, || {
            let candidates: Vec<Candidate> = class
                .public_methods(name, true)
                .into_iter()
                .map(|(declaring, m)| Candidate::member(&declaring, m).skipping(1))
                .collect();
            Ok(self.build(class, name, candidates))
        })
    }

    fn extension(
        &self,
        runtime: &Runtime,
        class: &ClassRef,
        name: &str,
    ) -> RuntimeResult<Option<Arc<MethodLookup>>> {
        let key = (class.clone(), name.to_string());
        self.extensions.get_or_try_insert_with(&key, || {
            let candidates: Vec<Candidate> = runtime
                .extensions()
                .extension_methods(class, name)
                .into_iter()
                .map(Candidate::function)
                .collect();
            Ok(self.build(class, name, candidates))
        })
    }

    fn build(&self, class: &ClassRef, name: &str, candidates: Vec<Candidate>) -> Option<Arc<MethodLookup>> {
        if candidates.is_empty() {
            return None;
        }
        let target = format!("{}.{name}", class.canonical_name());
        Some(Arc::new(MethodLookup::new(target, candidates, self.method_cache)))
    }
}

fn no_such_method(class: &ClassRef, name: &str) -> RuntimeError {
    RuntimeError::NoSuchMethod {
        target: format!("{}.{name}", class.canonical_name()),
    }
}
