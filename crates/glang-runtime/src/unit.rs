//! Compiled units loaded into a runtime.
//!
//! Loading a [`CodeUnit`] gives it a class named after its generated type,
//! with one public static `main(args)` running the entry procedure, and the
//! per-unit state its code needs at run time: the global table and the
//! slots that hold bootstrapped constants and resolved imports.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, Weak};

use glang_compiler::{CodeUnit, Constant};
use glang_core::abi::ENTRY_PROCEDURE;
use glang_core::{RuntimeError, RuntimeResult};
use indexmap::IndexMap;
use num_bigint::BigInt;
use parking_lot::RwLock;

use crate::builtins::LangClasses;
use crate::class::{ClassBuilder, ClassRef, ParamType};
use crate::import::{self, StarImport};
use crate::runtime::Runtime;
use crate::value::Value;
use crate::vm;

/// A unit's global variables, in definition order.
#[derive(Default)]
pub struct Globals {
    values: RwLock<IndexMap<String, Value>>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value bound to `name`. A global explicitly set to null is bound.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    pub fn put(&self, name: &str, value: Value) {
        self.values.write().insert(name.to_string(), value);
    }

    /// Bind every entry of `values`, replacing existing bindings.
    pub fn extend(&self, values: &StarImport) {
        let mut globals = self.values.write();
        for (name, value) in values {
            globals.insert(name.clone(), value.clone());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl fmt::Debug for Globals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.read().keys()).finish()
    }
}

/// Run `init` unless `cell` already holds a value. Racing initializers may
/// both run; the first one stored wins.
fn get_or_try_init<T: Clone>(
    cell: &OnceLock<T>,
    init: impl FnOnce() -> RuntimeResult<T>,
) -> RuntimeResult<T> {
    if let Some(value) = cell.get() {
        return Ok(value.clone());
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value).clone())
}

/// Materialize a literal constant.
pub fn bootstrap_constant(constant: &Constant) -> RuntimeResult<Value> {
    Ok(match constant {
        Constant::Int(v) => Value::Int(*v),
        Constant::Long(v) => Value::Long(*v),
        Constant::Double(v) => Value::Double(*v),
        Constant::BigInt(digits) => Value::big(BigInt::from_str(digits).map_err(|e| {
            RuntimeError::InvalidBytecode(format!("bad integer constant {digits}: {e}"))
        })?),
        Constant::Str(s) => Value::str(s),
        Constant::Import { .. } => {
            return Err(RuntimeError::InvalidBytecode(
                "import reference used as a value".into(),
            ));
        }
    })
}

/// A code unit loaded into a runtime.
pub struct LoadedUnit {
    code: CodeUnit,
    class: ClassRef,
    globals: Globals,
    /// String constants, built once at load.
    strings: Vec<Option<Value>>,
    bootstrapped: Box<[OnceLock<Value>]>,
    imports: Box<[OnceLock<Value>]>,
    star_imports: Box<[OnceLock<Arc<StarImport>>]>,
}

impl LoadedUnit {
    pub fn new(code: CodeUnit, lang: &LangClasses) -> Arc<Self> {
        let slots = code.constants.len();
        let strings = code
            .constants
            .constants()
            .iter()
            .map(|c| c.as_str().map(Value::str))
            .collect();
        let args = ParamType::Object(lang.array.clone());

        Arc::new_cyclic(|weak: &Weak<LoadedUnit>| {
            let weak = weak.clone();
            let owner = code.type_name.clone();
            let class = ClassBuilder::new(code.type_name.clone())
                .static_method(ENTRY_PROCEDURE, vec![args], move |ctx| {
                    let unit = weak.upgrade().ok_or_else(|| {
                        RuntimeError::IllegalArgument(format!("{owner} was unloaded"))
                    })?;
                    let args = ctx.arg_value(0)?.clone();
                    unit.run_main(ctx.runtime(), args)
                })
                .build();
            LoadedUnit {
                code,
                class,
                globals: Globals::new(),
                strings,
                bootstrapped: (0..slots).map(|_| OnceLock::new()).collect(),
                imports: (0..slots).map(|_| OnceLock::new()).collect(),
                star_imports: (0..slots).map(|_| OnceLock::new()).collect(),
            }
        })
    }

    pub fn type_name(&self) -> &str {
        &self.code.type_name
    }

    pub fn code(&self) -> &CodeUnit {
        &self.code
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Run the entry procedure with `args` (an array value) in slot 0.
    pub fn run_main(&self, runtime: &Runtime, args: Value) -> RuntimeResult<Value> {
        let entry = self.code.entry().ok_or_else(|| {
            RuntimeError::InvalidBytecode(format!("{} has no {ENTRY_PROCEDURE}", self.type_name()))
        })?;
        vm::execute(runtime, self, entry, vec![args])
    }

    fn constant(&self, index: u16) -> RuntimeResult<&Constant> {
        self.code.constants.get(u32::from(index)).ok_or_else(|| {
            RuntimeError::InvalidBytecode(format!("constant {index} out of range"))
        })
    }

    fn slot<T>(slots: &[T], index: u16) -> RuntimeResult<&T> {
        slots
            .get(usize::from(index))
            .ok_or_else(|| RuntimeError::InvalidBytecode(format!("constant {index} out of range")))
    }

    /// A name or string literal.
    pub fn string(&self, index: u16) -> RuntimeResult<&Value> {
        self.strings
            .get(usize::from(index))
            .and_then(Option::as_ref)
            .ok_or_else(|| RuntimeError::InvalidBytecode(format!("constant {index} is not a string")))
    }

    /// A name constant as text.
    pub fn name(&self, index: u16) -> RuntimeResult<&str> {
        self.string(index)?
            .as_str()
            .ok_or_else(|| RuntimeError::InvalidBytecode(format!("constant {index} is not a name")))
    }

    /// A numeric literal, built on first use and shared afterwards.
    pub fn bootstrap(&self, index: u16) -> RuntimeResult<Value> {
        let cell = Self::slot(&self.bootstrapped, index)?;
        get_or_try_init(cell, || bootstrap_constant(self.constant(index)?))
    }

    fn import_ref(&self, index: u16) -> RuntimeResult<(&[String], Option<&str>)> {
        match self.constant(index)? {
            Constant::Import { path, target } => Ok((path, target.as_deref())),
            _ => Err(RuntimeError::InvalidBytecode(format!(
                "constant {index} is not an import"
            ))),
        }
    }

    /// Resolve a qualified import, once per unit.
    pub fn import(&self, runtime: &Runtime, index: u16) -> RuntimeResult<Value> {
        let cell = Self::slot(&self.imports, index)?;
        get_or_try_init(cell, || {
            let (path, target) = self.import_ref(index)?;
            let target = target.ok_or_else(|| {
                RuntimeError::InvalidBytecode(format!("constant {index} is a star import"))
            })?;
            import::do_import(runtime, path, target)
        })
    }

    /// Resolve a star import once per unit and bind its names as globals.
    pub fn import_star(&self, runtime: &Runtime, index: u16) -> RuntimeResult<()> {
        let cell = Self::slot(&self.star_imports, index)?;
        let names = get_or_try_init(cell, || {
            let (path, _) = self.import_ref(index)?;
            import::import_star(runtime, path).map(Arc::new)
        })?;
        self.globals.extend(&names);
        Ok(())
    }
}

impl fmt::Debug for LoadedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedUnit")
            .field("type_name", &self.code.type_name)
            .field("globals", &self.globals)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glang_compiler::{CompileOptions, compile_source};

    fn load(runtime: &Runtime, source: &str) -> Arc<LoadedUnit> {
        let code = compile_source("demo.unit", source, &CompileOptions::default()).unwrap();
        runtime.load_unit(code).unwrap()
    }

    #[test]
    fn unit_class_exposes_main() {
        let runtime = Runtime::new();
        let unit = load(&runtime, "answer = 42");
        assert_eq!(unit.class().name(), "demo.UnitNs");

        let main = runtime
            .method_lookup(&Value::Class(unit.class().clone()), "main", crate::lookup::LookupMode::Plain)
            .unwrap();
        let class = Value::Class(unit.class().clone());
        main.invoke(&runtime, vec![class, Value::array(vec![])]).unwrap();
        assert_eq!(unit.globals().get("answer"), Some(Value::Int(42)));
    }

    #[test]
    fn constants_are_bootstrapped_once() {
        let runtime = Runtime::new();
        let unit = load(&runtime, "x = 123456789012345678901234567890");
        let index = unit
            .code()
            .constants
            .constants()
            .iter()
            .position(|c| matches!(c, Constant::BigInt(_)))
            .unwrap() as u16;
        let a = unit.bootstrap(index).unwrap();
        let b = unit.bootstrap(index).unwrap();
        match (a, b) {
            (Value::BigInt(a), Value::BigInt(b)) => assert!(Arc::ptr_eq(&a, &b)),
            other => panic!("expected big integers, got {other:?}"),
        }
    }

    #[test]
    fn globals_keep_null_bindings() {
        let globals = Globals::new();
        globals.put("a", Value::Null);
        globals.put("b", Value::Int(1));
        assert_eq!(globals.get("a"), Some(Value::Null));
        assert_eq!(globals.get("c"), None);
        assert_eq!(globals.names(), ["a", "b"]);
    }

    #[test]
    fn bad_constants() {
        assert!(bootstrap_constant(&Constant::BigInt("12x".into())).is_err());
        let import = Constant::Import {
            path: vec![],
            target: None,
        };
        assert!(bootstrap_constant(&import).is_err());
    }
}
