//! Class lookup by fully qualified name.
//!
//! Classes are either defined up front (the core classes and namespaces) or
//! produced on demand by a [`ClassSource`], such as a module loader that
//! compiles the unit a generated type name refers to.

use std::fmt;
use std::sync::Arc;

use glang_core::{RuntimeError, RuntimeResult};
use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::class::ClassRef;
use crate::runtime::Runtime;

/// Produces classes the class path does not know yet.
pub trait ClassSource: Send + Sync {
    /// The class called `name`, or `Ok(None)` when this source has none.
    ///
    /// A source may define the class itself through the runtime; the class
    /// path registers whatever is returned either way.
    fn find_class(&self, runtime: &Runtime, name: &str) -> RuntimeResult<Option<ClassRef>>;
}

#[derive(Default)]
pub struct ClassPath {
    classes: RwLock<FxHashMap<String, ClassRef>>,
    sources: RwLock<Vec<Arc<dyn ClassSource>>>,
}

impl ClassPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class` and its nested types under their names.
    ///
    /// A name is only ever bound once: when it is already taken the existing
    /// class is kept and returned.
    pub fn define(&self, class: &ClassRef) -> ClassRef {
        let defined = {
            let mut classes = self.classes.write();
            classes
                .entry(class.name().to_string())
                .or_insert_with(|| class.clone())
                .clone()
        };
        for nested in defined.nested_types() {
            self.define(nested);
        }
        defined
    }

    /// A class that has already been defined.
    pub fn defined(&self, name: &str) -> Option<ClassRef> {
        self.classes.read().get(name).cloned()
    }

    pub fn add_source(&self, source: Arc<dyn ClassSource>) {
        self.sources.write().push(source);
    }

    /// Find a class, asking each source in order when it is not defined yet.
    pub fn find_class(&self, runtime: &Runtime, name: &str) -> RuntimeResult<ClassRef> {
        if let Some(class) = self.defined(name) {
            return Ok(class);
        }
        let sources = self.sources.read().clone();
        for source in &sources {
            if let Some(class) = source.find_class(runtime, name)? {
                debug!("class {name} provided by a class source");
                return Ok(self.define(&class));
            }
        }
        Err(RuntimeError::ClassNotFound {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

impl fmt::Debug for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassPath")
            .field("classes", &self.classes.read().len())
            .field("sources", &self.sources.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
    }

    impl ClassSource for Counting {
        fn find_class(&self, _: &Runtime, name: &str) -> RuntimeResult<Option<ClassRef>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((name == "gen.Made").then(|| ClassBuilder::new("gen.Made").build()))
        }
    }

    #[test]
    fn nested_types_are_defined_with_their_outer_class() {
        let path = ClassPath::new();
        let inner = ClassBuilder::new("pkg.Outer$Inner").build();
        let outer = ClassBuilder::new("pkg.Outer").nested(&inner).build();
        path.define(&outer);
        assert_eq!(path.defined("pkg.Outer$Inner"), Some(inner));
        assert!(path.defined("pkg.Outer.Inner").is_none());
    }

    #[test]
    fn first_definition_wins() {
        let path = ClassPath::new();
        let first = ClassBuilder::new("pkg.A").build();
        let second = ClassBuilder::new("pkg.A").build();
        path.define(&first);
        assert!(path.define(&second).ptr_eq(&first));
    }

    #[test]
    fn sources_are_asked_once_per_class() {
        let runtime = Runtime::new();
        let source = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        runtime.class_path().add_source(source.clone());

        let made = runtime.find_class("gen.Made").unwrap();
        assert!(runtime.find_class("gen.Made").unwrap().ptr_eq(&made));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let err = runtime.find_class("gen.Missing").unwrap_err();
        assert_eq!(err.to_string(), "class not found: gen.Missing");
    }
}
