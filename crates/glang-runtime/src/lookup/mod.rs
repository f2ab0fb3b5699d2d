//! Member resolution: overload sets, method lookups by receiver, fields.

pub mod field;
pub mod instance;
pub mod overload;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glang_core::{RuntimeError, RuntimeResult};
use log::trace;

use crate::cache::{CacheSpec, CacheStats, ResultCache};
use crate::class::ClassRef;
use crate::runtime::Runtime;
use crate::value::Value;

pub use field::{FieldAccess, FieldResolver};
pub use instance::{LookupMode, MethodResolver};
pub use overload::{Candidate, Invoker};

/// The ordered runtime classes of a call's arguments.
pub type CallShape = Vec<ClassRef>;

/// A named overload set, resolved and adapted once per call shape.
pub struct MethodLookup {
    /// `Owner.name`, or the owner alone for constructors.
    target: String,
    candidates: Vec<Arc<Candidate>>,
    cache: ResultCache<CallShape, Invoker>,
    resolutions: AtomicU64,
}

impl MethodLookup {
    pub fn new(target: impl Into<String>, candidates: Vec<Candidate>, spec: CacheSpec) -> Self {
        Self {
            target: target.into(),
            candidates: candidates.into_iter().map(Arc::new).collect(),
            cache: ResultCache::new(spec),
            resolutions: AtomicU64::new(0),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn candidates(&self) -> &[Arc<Candidate>] {
        &self.candidates
    }

    /// The invoker for `shape`, resolved on the first call with that shape.
    pub fn invoker(&self, runtime: &Runtime, shape: &CallShape) -> RuntimeResult<Invoker> {
        self.cache.get_or_try_insert_with(shape, || {
            self.resolutions.fetch_add(1, Ordering::Relaxed);
            trace!("resolving {} for {} args", self.target, shape.len());
            let lang = runtime.lang();
            overload::resolve(&self.candidates, shape, lang)
                .map(|candidate| Invoker::new(candidate.clone()))
                .ok_or_else(|| RuntimeError::NoApplicableOverload {
                    target: self.target.clone(),
                    args: shape.iter().map(|c| c.simple_name().to_string()).collect(),
                })
        })
    }

    pub fn invoke(&self, runtime: &Runtime, args: Vec<Value>) -> RuntimeResult<Value> {
        let shape: CallShape = args.iter().map(|arg| runtime.class_of(arg)).collect();
        self.invoker(runtime, &shape)?.invoke(runtime, args)
    }

    /// How many times candidates were scanned, one per cache miss.
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl fmt::Display for MethodLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "public fn {}", self.target)
    }
}

impl fmt::Debug for MethodLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodLookup")
            .field("target", &self.target)
            .field("candidates", &self.candidates.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{MethodDef, Modifiers, ParamType};

    fn lookup(runtime: &Runtime) -> MethodLookup {
        let string = ParamType::Object(runtime.lang().string.clone());
        let one = MethodDef::new("f", Modifiers::PUBLIC, vec![string.clone()], |_| {
            Ok(Value::Int(1))
        });
        let two = MethodDef::new(
            "f",
            Modifiers::PUBLIC,
            vec![string, ParamType::Optional],
            |ctx| Ok(Value::str(&ctx.arg_value(1)?.to_string())),
        );
        MethodLookup::new(
            "Demo.f",
            vec![Candidate::function(Arc::new(one)), Candidate::function(Arc::new(two))],
            CacheSpec::new(4, 64),
        )
    }

    #[test]
    fn dispatches_by_window() {
        let runtime = Runtime::new();
        let lookup = lookup(&runtime);
        assert_eq!(lookup.invoke(&runtime, vec![Value::str("a")]).unwrap(), Value::Int(1));
        assert_eq!(
            lookup
                .invoke(&runtime, vec![Value::str("a"), Value::Int(2)])
                .unwrap(),
            Value::str("Present[2]")
        );
    }

    #[test]
    fn failure_names_call_shape() {
        let runtime = Runtime::new();
        let lookup = lookup(&runtime);
        let err = lookup
            .invoke(&runtime, vec![Value::str("a"), Value::Null, Value::Int(1)])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "no applicable overload for public fn Demo.f with args [String, Void, Integer]"
        );
    }

    #[test]
    fn cached_shapes_skip_resolution() {
        let runtime = Runtime::new();
        let lookup = lookup(&runtime);
        for _ in 0..3 {
            lookup.invoke(&runtime, vec![Value::str("a")]).unwrap();
        }
        assert_eq!(lookup.resolution_count(), 1);

        lookup.invoke(&runtime, vec![Value::str("a"), Value::Null]).unwrap();
        assert_eq!(lookup.resolution_count(), 2);
        assert_eq!(lookup.cache_stats().hits, 2);
    }

    #[test]
    fn display() {
        let runtime = Runtime::new();
        assert_eq!(lookup(&runtime).to_string(), "public fn Demo.f");
    }
}
