//! The dispatch runtime.
//!
//! [`Runtime`] is what compiled code calls into for everything dynamic:
//! method and field lookup, invocation through the fixed and array entry
//! points, binary operators, truthiness, global lookup and imports. It owns
//! the core classes, the extension registry, every lookup cache and the
//! class path the loaded units live on.

use std::fmt;
use std::sync::{Arc, OnceLock};

use glang_compiler::CodeUnit;
use glang_core::abi::{ENTRY_PROCEDURE, MAX_FIXED_ARITY};
use glang_core::{RuntimeError, RuntimeResult};
use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builtins::{DefaultExtensions, LangClasses, Namespaces, builtins_namespace};
use crate::cache::ResultCache;
use crate::class::ClassRef;
use crate::class_path::{ClassPath, ClassSource};
use crate::config::RuntimeConfig;
use crate::extension::{ExtensionRegistrar, ExtensionRegistry};
use crate::import;
use crate::lookup::{Candidate, FieldResolver, LookupMode, MethodLookup, MethodResolver};
use crate::output::{OutputSink, StdStreams};
use crate::unit::{Globals, LoadedUnit};
use crate::value::Value;

/// Builder for a [`Runtime`].
#[derive(Default)]
pub struct RuntimeBuilder {
    config: Option<RuntimeConfig>,
    registrars: Vec<Arc<dyn ExtensionRegistrar>>,
    sources: Vec<Arc<dyn ClassSource>>,
    output: Option<Arc<dyn OutputSink>>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add an extension registrar, run after the default one.
    pub fn registrar(mut self, registrar: Arc<dyn ExtensionRegistrar>) -> Self {
        self.registrars.push(registrar);
        self
    }

    /// Add a source of classes the class path does not define up front.
    pub fn class_source(mut self, source: Arc<dyn ClassSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Where `println` and debug instrumentation write. Defaults to the
    /// process's stdout and stderr.
    pub fn output(mut self, output: Arc<dyn OutputSink>) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> Runtime {
        let config = self.config.unwrap_or_default();
        let lang = LangClasses::new();
        let namespaces = Namespaces::new(&lang);
        let builtins = builtins_namespace(&lang);

        let class_path = ClassPath::new();
        for class in lang.all() {
            class_path.define(class);
        }
        for class in namespaces.all() {
            class_path.define(class);
        }
        class_path.define(&builtins);
        for source in self.sources {
            class_path.add_source(source);
        }

        let extensions = ExtensionRegistry::new(lang.clone());
        extensions.add_registrar(Arc::new(DefaultExtensions::new(namespaces.clone())));
        for registrar in self.registrars {
            extensions.add_registrar(registrar);
        }

        Runtime {
            methods: MethodResolver::new(config.instance_lookup_cache, config.method_lookup_cache),
            fields: FieldResolver::new(config.field_lookup_cache),
            constructors: ResultCache::new(config.instance_lookup_cache),
            config,
            lang,
            namespaces,
            builtins,
            extensions,
            class_path,
            default_imports: OnceLock::new(),
            output: self.output.unwrap_or_else(|| Arc::new(StdStreams)),
            units: RwLock::new(FxHashMap::default()),
        }
    }
}

/// The dispatch runtime compiled units run against.
pub struct Runtime {
    config: RuntimeConfig,
    lang: LangClasses,
    namespaces: Namespaces,
    builtins: ClassRef,
    extensions: ExtensionRegistry,
    methods: MethodResolver,
    fields: FieldResolver,
    constructors: ResultCache<ClassRef, Arc<MethodLookup>>,
    class_path: ClassPath,
    default_imports: OnceLock<IndexMap<String, Value>>,
    output: Arc<dyn OutputSink>,
    /// Loaded units by type name. Unit classes only hold weak references
    /// back to their unit, so this keeps them alive.
    units: RwLock<FxHashMap<String, Arc<LoadedUnit>>>,
}

impl Runtime {
    /// A runtime with the default configuration and extensions.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn lang(&self) -> &LangClasses {
        &self.lang
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// `glang.BuiltinsNs`, star-imported into every unit.
    pub fn builtins(&self) -> &ClassRef {
        &self.builtins
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn class_path(&self) -> &ClassPath {
        &self.class_path
    }

    pub fn output(&self) -> &dyn OutputSink {
        self.output.as_ref()
    }

    pub fn class_of(&self, value: &Value) -> ClassRef {
        self.lang.class_of(value)
    }

    pub fn find_class(&self, name: &str) -> RuntimeResult<ClassRef> {
        self.class_path.find_class(self, name)
    }

    /// Rerun every extension registrar and drop the lookups built from the
    /// previous set of extensions.
    pub fn reload_extensions(&self) {
        self.extensions.reload();
        self.methods.clear_extensions();
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    /// The overload set `name` resolves to on `receiver`.
    pub fn method_lookup(
        &self,
        receiver: &Value,
        name: &str,
        mode: LookupMode,
    ) -> RuntimeResult<Arc<MethodLookup>> {
        self.methods.method(self, receiver, name, mode)
    }

    /// Call `name` on `receiver`. `args` excludes the receiver.
    pub fn invoke_method(
        &self,
        receiver: &Value,
        name: &str,
        mode: LookupMode,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let lookup = self.method_lookup(receiver, name, mode)?;
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(receiver.clone());
        full.extend(args);
        lookup.invoke(self, full)
    }

    /// Dispatch a binary operator as a call of `name` on the left operand.
    pub fn binary_op(&self, name: &str, left: Value, right: Value) -> RuntimeResult<Value> {
        self.invoke_method(&left, name, LookupMode::Plain, vec![right])
    }

    pub fn get_field(&self, receiver: &Value, name: &str) -> RuntimeResult<Value> {
        self.fields.get(self, receiver, name)
    }

    pub fn set_field(&self, receiver: &Value, name: &str, value: Value) -> RuntimeResult<()> {
        self.fields.set(self, receiver, name, value)
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    fn constructor(&self, class: &ClassRef) -> RuntimeResult<Arc<MethodLookup>> {
        self.constructors.get_or_try_insert_with(class, || {
            let candidates = class
                .constructors()
                .iter()
                .map(|ctor| Candidate::member(class, ctor.clone()))
                .collect();
            Ok(Arc::new(MethodLookup::new(
                class.canonical_name(),
                candidates,
                self.config.method_lookup_cache,
            )))
        })
    }

    /// Call a value: construct a class, or invoke a method lookup.
    pub fn invoke_object(&self, target: &Value, args: Vec<Value>) -> RuntimeResult<Value> {
        match target {
            Value::Null => Err(RuntimeError::null_target("null is not invokable")),
            Value::Class(class) => self.constructor(class)?.invoke(self, args),
            Value::Method(lookup) => lookup.invoke(self, args),
            other => Err(RuntimeError::UninvokableTarget {
                type_name: self.class_of(other).name().to_string(),
            }),
        }
    }

    /// The fixed-arity entry point: up to [`MAX_FIXED_ARITY`] positional
    /// arguments.
    pub fn invoke_fixed(&self, target: &Value, args: Vec<Value>) -> RuntimeResult<Value> {
        if args.len() > MAX_FIXED_ARITY {
            return Err(RuntimeError::InvalidBytecode(format!(
                "{} arguments passed to a fixed-arity invoke",
                args.len()
            )));
        }
        self.invoke_object(target, args)
    }

    /// The array entry point: every argument packed into one array value.
    pub fn invoke_array(&self, target: &Value, args: &Value) -> RuntimeResult<Value> {
        match args {
            Value::Array(values) => self.invoke_object(target, values.to_vec()),
            other => Err(RuntimeError::InvalidBytecode(format!(
                "array invoke with {other:?} as arguments"
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    /// Truthiness of a value. Values without an intrinsic answer ask their
    /// `booleanValue` member and are true when they have none.
    pub fn is_truthy(&self, value: &Value) -> RuntimeResult<bool> {
        if let Some(truthy) = value.intrinsic_truthiness() {
            return Ok(truthy);
        }
        let lookup = match self.method_lookup(value, "booleanValue", LookupMode::Plain) {
            Ok(lookup) => lookup,
            Err(RuntimeError::NoSuchMethod { .. }) => return Ok(true),
            Err(e) => return Err(e),
        };
        match lookup.invoke(self, vec![value.clone()])? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::IllegalArgument(format!(
                "booleanValue returned {other:?}"
            ))),
        }
    }

    /// The printed form of a value. Objects are asked for their declared
    /// `toString`.
    pub fn stringify(&self, value: &Value) -> RuntimeResult<String> {
        match value {
            Value::Object(_) => match self.invoke_method(value, "toString", LookupMode::Direct, vec![]) {
                Ok(Value::Str(s)) => Ok(s.to_string()),
                Ok(other) => self.stringify(&other),
                Err(RuntimeError::NoSuchMethod { .. }) => Ok(value.to_string()),
                Err(e) => Err(e),
            },
            Value::Array(values) => {
                let mut out = String::from("[");
                for (i, element) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.stringify(element)?);
                }
                out.push(']');
                Ok(out)
            }
            Value::Optional(optional) if optional.is_present() => {
                Ok(format!("Present[{}]", self.stringify(optional.get()?)?))
            }
            other => Ok(other.to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Globals
    // ------------------------------------------------------------------

    /// Names every unit sees without an import: the core classes by simple
    /// name and the members of `glang.BuiltinsNs`.
    pub fn default_imports(&self) -> &IndexMap<String, Value> {
        self.default_imports.get_or_init(|| {
            let mut imports = IndexMap::new();
            for class in self.lang.all() {
                imports.insert(class.simple_name().to_string(), Value::Class(class.clone()));
            }
            imports.extend(import::collect_star_import(self, &self.builtins));
            debug!("{} default imports", imports.len());
            imports
        })
    }

    /// Look `name` up in a unit's globals, then in the default imports.
    pub fn get_global(&self, globals: &Globals, name: &str) -> RuntimeResult<Value> {
        if let Some(value) = globals.get(name) {
            return Ok(value);
        }
        self.default_imports()
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownGlobal {
                name: name.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    /// Load a compiled unit and define its class. Loading a type name that
    /// is already loaded returns the existing unit.
    pub fn load_unit(&self, code: CodeUnit) -> RuntimeResult<Arc<LoadedUnit>> {
        if code.entry().is_none() {
            return Err(RuntimeError::InvalidBytecode(format!(
                "{} has no {ENTRY_PROCEDURE} procedure",
                code.type_name
            )));
        }
        let mut units = self.units.write();
        if let Some(existing) = units.get(&code.type_name) {
            return Ok(existing.clone());
        }
        let unit = LoadedUnit::new(code, &self.lang);
        let defined = self.class_path.define(unit.class());
        if !defined.ptr_eq(unit.class()) {
            return Err(RuntimeError::IllegalArgument(format!(
                "class {} is already defined",
                unit.type_name()
            )));
        }
        debug!("loaded unit {}", unit.type_name());
        units.insert(unit.type_name().to_string(), unit.clone());
        Ok(unit)
    }

    pub fn unit(&self, type_name: &str) -> Option<Arc<LoadedUnit>> {
        self.units.read().get(type_name).cloned()
    }

    /// Call a unit's `main` with the launch arguments.
    pub fn run_unit(&self, unit: &LoadedUnit, args: Vec<Value>) -> RuntimeResult<Value> {
        let class = Value::Class(unit.class().clone());
        self.invoke_method(&class, ENTRY_PROCEDURE, LookupMode::Plain, vec![Value::array(args)])
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("class_path", &self.class_path)
            .field("units", &self.units.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassBuilder, Modifiers, ParamType};
    use crate::value::Object;
    use glang_compiler::{CompileOptions, compile_source};

    #[test]
    fn invoking_non_callables() {
        let runtime = Runtime::new();
        let err = runtime.invoke_object(&Value::Null, vec![]).unwrap_err();
        assert_eq!(err.to_string(), "null is not invokable");
        let err = runtime.invoke_object(&Value::Int(3), vec![]).unwrap_err();
        assert_eq!(err.to_string(), "Cannot invoke object of type glang.lang.Integer");
    }

    #[test]
    fn fixed_entry_rejects_wide_calls() {
        let runtime = Runtime::new();
        let println = runtime.default_imports()["println"].clone();
        let args = vec![Value::Int(0); MAX_FIXED_ARITY + 1];
        assert!(runtime.invoke_fixed(&println, args.clone()).is_err());
        assert!(runtime.invoke_array(&println, &Value::array(args)).is_ok());
    }

    #[test]
    fn truthiness() {
        let runtime = Runtime::new();
        assert!(!runtime.is_truthy(&Value::Null).unwrap());
        assert!(!runtime.is_truthy(&Value::Double(f64::NAN)).unwrap());
        assert!(runtime.is_truthy(&Value::str("x")).unwrap());
        assert!(!runtime.is_truthy(&Value::array(vec![])).unwrap());

        let flag = ClassBuilder::new("demo.Flag")
            .method("booleanValue", vec![], |_| Ok(Value::Bool(false)))
            .build();
        let plain = ClassBuilder::new("demo.Plain").build();
        assert!(!runtime.is_truthy(&Value::Object(Object::new(flag))).unwrap());
        assert!(runtime.is_truthy(&Value::Object(Object::new(plain))).unwrap());
    }

    #[test]
    fn stringify_nests() {
        let runtime = Runtime::new();
        let point = ClassBuilder::new("demo.Point")
            .method("toString", vec![], |_| Ok(Value::str("(1, 2)")))
            .build();
        let nested = Value::array(vec![
            Value::Int(1),
            Value::array(vec![Value::Null, Value::Object(Object::new(point))]),
        ]);
        assert_eq!(runtime.stringify(&nested).unwrap(), "[1, [null, (1, 2)]]");
    }

    #[test]
    fn constructors_dispatch_on_arguments() {
        let runtime = Runtime::new();
        let boxed = ClassBuilder::new("demo.Box")
            .field("value", Modifiers::PUBLIC)
            .constructor(vec![ParamType::Any], |class, ctx| {
                let this = Object::new(class.clone());
                this.set(0, ctx.arg_value(0)?.clone());
                Ok(Value::Object(this))
            })
            .build();
        let class = Value::Class(boxed);
        let made = runtime.invoke_object(&class, vec![Value::Int(4)]).unwrap();
        assert_eq!(runtime.get_field(&made, "value").unwrap(), Value::Int(4));

        let err = runtime.invoke_object(&class, vec![]).unwrap_err();
        assert_eq!(err.to_string(), "no applicable overload for public fn demo.Box with args []");
    }

    #[test]
    fn globals_fall_back_to_default_imports() {
        let runtime = Runtime::new();
        let globals = Globals::new();
        assert_eq!(
            runtime.get_global(&globals, "Integer").unwrap(),
            Value::Class(runtime.lang().integer.clone())
        );
        globals.put("Integer", Value::Int(1));
        assert_eq!(runtime.get_global(&globals, "Integer").unwrap(), Value::Int(1));
        assert!(matches!(
            runtime.get_global(&globals, "nothing"),
            Err(RuntimeError::UnknownGlobal { .. })
        ));
    }

    #[test]
    fn units_load_once() {
        let runtime = Runtime::new();
        let code = compile_source("demo.once", "x = 1", &CompileOptions::default()).unwrap();
        let first = runtime.load_unit(code.clone()).unwrap();
        let second = runtime.load_unit(code).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(runtime.find_class("demo.OnceNs").unwrap().ptr_eq(first.class()));

        runtime.run_unit(&first, vec![]).unwrap();
        assert_eq!(first.globals().get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn reload_picks_up_new_registrars() {
        use crate::class::MethodDef;
        use crate::extension::ExtensionRegistry;

        struct Twice;
        impl ExtensionRegistrar for Twice {
            fn register(&self, registry: &ExtensionRegistry) -> RuntimeResult<()> {
                registry.register(Arc::new(MethodDef::new(
                    "twice",
                    Modifiers::PUBLIC | Modifiers::STATIC,
                    vec![ParamType::Int],
                    |ctx| Ok(Value::Int(ctx.arg::<i32>(0)? * 2)),
                )))
            }
        }

        let runtime = Runtime::new();
        let call = |r: &Runtime| r.invoke_method(&Value::Int(4), "twice", LookupMode::Plain, vec![]);
        assert!(call(&runtime).is_err());

        runtime.extensions().add_registrar(Arc::new(Twice));
        runtime.reload_extensions();
        assert_eq!(call(&runtime).unwrap(), Value::Int(8));
    }
}
