//! Extension method registry.
//!
//! An extension is a static function that acts as a method of the type of
//! its first parameter. Registrars contribute extensions when the registry
//! is first used and again on every [`reload`](ExtensionRegistry::reload).

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glang_core::{RuntimeError, RuntimeResult};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::builtins::LangClasses;
use crate::class::{ClassRef, MethodDef, Modifiers, ParamType};

/// A source of extension methods.
pub trait ExtensionRegistrar: Send + Sync {
    fn register(&self, registry: &ExtensionRegistry) -> RuntimeResult<()>;
}

type ByName = FxHashMap<String, Vec<Arc<MethodDef>>>;

/// Extensions indexed by receiver class and method name.
pub struct ExtensionRegistry {
    lang: LangClasses,
    registrars: RwLock<Vec<Arc<dyn ExtensionRegistrar>>>,
    methods: RwLock<FxHashMap<ClassRef, ByName>>,
    loaded: AtomicBool,
    load_lock: Mutex<()>,
}

impl ExtensionRegistry {
    pub fn new(lang: LangClasses) -> Self {
        Self {
            lang,
            registrars: RwLock::new(Vec::new()),
            methods: RwLock::new(FxHashMap::default()),
            loaded: AtomicBool::new(false),
            load_lock: Mutex::new(()),
        }
    }

    pub fn lang(&self) -> &LangClasses {
        &self.lang
    }

    /// Add a registrar. It runs on the next load or reload.
    pub fn add_registrar(&self, registrar: Arc<dyn ExtensionRegistrar>) {
        self.registrars.write().push(registrar);
    }

    /// The class extensions whose first parameter is `param` are keyed by.
    fn receiver_class(&self, param: &ParamType) -> Option<ClassRef> {
        Some(match param {
            ParamType::Boolean => self.lang.boolean.clone(),
            ParamType::Int => self.lang.integer.clone(),
            ParamType::Long => self.lang.long.clone(),
            ParamType::Double => self.lang.double.clone(),
            ParamType::Object(class) => class.clone(),
            ParamType::Any => self.lang.object.clone(),
            ParamType::Optional | ParamType::Declaring => return None,
        })
    }

    /// Register `method` as an extension under its own name.
    pub fn register(&self, method: Arc<MethodDef>) -> RuntimeResult<()> {
        let name = method.name.clone();
        self.register_as(&name, method)
    }

    /// Register `method` as an extension called `name`.
    pub fn register_as(&self, name: &str, method: Arc<MethodDef>) -> RuntimeResult<()> {
        let receiver = method
            .params
            .first()
            .and_then(|p| self.receiver_class(p))
            .ok_or_else(|| {
                RuntimeError::IllegalArgument(format!(
                    "Extension method {name} must have a receiver parameter"
                ))
            })?;
        self.methods
            .write()
            .entry(receiver)
            .or_default()
            .entry(name.to_string())
            .or_default()
            .push(method);
        Ok(())
    }

    /// Register every public static method declared by a namespace class.
    pub fn register_all(&self, class: &ClassRef) -> RuntimeResult<()> {
        self.register_all_static(class, |_| true)
    }

    /// Register the public static methods of `class` with at least one
    /// parameter that satisfy `predicate`.
    pub fn register_all_static(
        &self,
        class: &ClassRef,
        predicate: impl Fn(&MethodDef) -> bool,
    ) -> RuntimeResult<()> {
        let public_static = Modifiers::PUBLIC | Modifiers::STATIC;
        for method in class.declared_methods() {
            if !method.modifiers.contains(public_static)
                || method.params.is_empty()
                || !predicate(method)
            {
                continue;
            }
            self.register(method.clone())?;
        }
        Ok(())
    }

    /// Make the extensions `from` that apply to `class` also available as `to`.
    pub fn copy(&self, class: &ClassRef, from: &str, to: &str) {
        let methods = self.collect(class, from);
        if methods.is_empty() {
            warn!("no {from} extensions on {} to copy to {to}", class.name());
        }
        self.methods
            .write()
            .entry(class.clone())
            .or_default()
            .entry(to.to_string())
            .or_default()
            .extend(methods);
    }

    /// Extensions named `name` applicable to `target`: those on the class,
    /// then its superclasses, then its interfaces. Each interface is visited
    /// once.
    pub fn extension_methods(&self, target: &ClassRef, name: &str) -> Vec<Arc<MethodDef>> {
        self.load();
        self.collect(target, name)
    }

    fn collect(&self, target: &ClassRef, name: &str) -> Vec<Arc<MethodDef>> {
        let methods = self.methods.read();
        let mut result = Vec::new();
        let mut visited: FxHashSet<ClassRef> = FxHashSet::default();
        let mut interfaces: VecDeque<ClassRef> = VecDeque::new();

        let mut current = Some(target.clone());
        while let Some(class) = current {
            if let Some(found) = methods.get(&class).and_then(|by_name| by_name.get(name)) {
                result.extend(found.iter().cloned());
            }
            interfaces.extend(class.interfaces().iter().cloned());
            current = class.superclass().cloned();
        }
        while let Some(interface) = interfaces.pop_front() {
            if !visited.insert(interface.clone()) {
                continue;
            }
            if let Some(found) = methods.get(&interface).and_then(|by_name| by_name.get(name)) {
                result.extend(found.iter().cloned());
            }
            interfaces.extend(interface.interfaces().iter().cloned());
        }
        result
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Run the registrars if they have not run yet.
    pub fn load(&self) {
        if self.is_loaded() {
            return;
        }
        let _guard = self.load_lock.lock();
        if !self.is_loaded() {
            self.run_registrars();
        }
    }

    /// Forget every extension and run the registrars again.
    pub fn reload(&self) {
        let _guard = self.load_lock.lock();
        self.run_registrars();
    }

    fn run_registrars(&self) {
        self.loaded.store(false, Ordering::Release);
        self.methods.write().clear();
        let registrars = self.registrars.read().clone();
        for registrar in &registrars {
            if let Err(e) = registrar.register(self) {
                warn!("extension registrar failed: {e}");
            }
        }
        debug!(
            "loaded extensions for {} classes from {} registrars",
            self.methods.read().len(),
            registrars.len()
        );
        self.loaded.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("classes", &self.methods.read().len())
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::value::Value;
    use std::sync::atomic::AtomicUsize;

    fn ext(name: &str, receiver: ParamType) -> Arc<MethodDef> {
        Arc::new(MethodDef::new(
            name,
            Modifiers::PUBLIC | Modifiers::STATIC,
            vec![receiver],
            |_| Ok(Value::Null),
        ))
    }

    #[test]
    fn primitive_receivers_key_by_wrapper() {
        let registry = ExtensionRegistry::new(LangClasses::new());
        registry.register(ext("twice", ParamType::Int)).unwrap();
        let integer = registry.lang().integer.clone();
        assert_eq!(registry.collect(&integer, "twice").len(), 1);
    }

    #[test]
    fn receiverless_methods_are_rejected() {
        let registry = ExtensionRegistry::new(LangClasses::new());
        let method = Arc::new(MethodDef::new("f", Modifiers::STATIC, vec![], |_| Ok(Value::Null)));
        assert!(registry.register(method).is_err());
    }

    #[test]
    fn diamond_interfaces_contribute_once() {
        let registry = ExtensionRegistry::new(LangClasses::new());
        let root = ClassBuilder::interface("Root").build();
        let left = ClassBuilder::interface("Left").implements(&root).build();
        let right = ClassBuilder::interface("Right").implements(&root).build();
        let base = ClassBuilder::new("Base").implements(&left).build();
        let leaf = ClassBuilder::new("Leaf")
            .extends(&base)
            .implements(&right)
            .build();

        registry.register(ext("m", ParamType::Object(root))).unwrap();
        registry.register(ext("m", ParamType::Object(base))).unwrap();

        assert_eq!(registry.collect(&leaf, "m").len(), 2);
    }

    #[test]
    fn copy_aliases_existing_extensions() {
        let registry = ExtensionRegistry::new(LangClasses::new());
        registry.register(ext("sum", ParamType::Int)).unwrap();
        let integer = registry.lang().integer.clone();
        registry.copy(&integer, "sum", "add");
        assert_eq!(registry.collect(&integer, "add").len(), 1);
    }

    struct Counting(AtomicUsize);

    impl ExtensionRegistrar for Counting {
        fn register(&self, registry: &ExtensionRegistry) -> RuntimeResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            registry.register(ext("probe", ParamType::Int))
        }
    }

    #[test]
    fn load_runs_once_and_reload_replaces() {
        let registry = ExtensionRegistry::new(LangClasses::new());
        let counting = Arc::new(Counting(AtomicUsize::new(0)));
        registry.add_registrar(counting.clone());
        let integer = registry.lang().integer.clone();

        assert_eq!(registry.extension_methods(&integer, "probe").len(), 1);
        assert_eq!(registry.extension_methods(&integer, "probe").len(), 1);
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);

        registry.reload();
        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
        assert_eq!(registry.extension_methods(&integer, "probe").len(), 1);
    }
}
