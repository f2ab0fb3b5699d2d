//! Import resolution.
//!
//! A qualified import `a.b.C.x` first tries `x` as a nested type of `a.b.C`,
//! then as a public static member of it, then as the top-level class
//! `a.b.C.x`. When none works, trailing path segments are reread as nested
//! type qualifiers (`a.b$C`, then `a$b$C`) and the first two steps are
//! retried.
//!
//! A qualified import naming both a static field and a static method or
//! nested type is ambiguous and fails. A star import quietly leaves such
//! names out instead.

use std::sync::Arc;

use glang_core::{RuntimeError, RuntimeResult};
use indexmap::IndexMap;
use log::trace;
use rustc_hash::FxHashSet;

use crate::class::ClassRef;
use crate::lookup::{Candidate, MethodLookup};
use crate::runtime::Runtime;
use crate::value::Value;

/// Names a star import contributes, in declaration order.
pub type StarImport = IndexMap<String, Value>;

/// The overload set of the public static methods of `class` named `name`.
pub fn static_function(runtime: &Runtime, class: &ClassRef, name: &str) -> Arc<MethodLookup> {
    let candidates = class
        .public_methods(name, true)
        .into_iter()
        .map(|(declaring, method)| Candidate::member(&declaring, method))
        .collect();
    Arc::new(MethodLookup::new(
        format!("{}.{name}", class.canonical_name()),
        candidates,
        runtime.config().method_lookup_cache,
    ))
}

/// Every public static field, public static method and public nested type
/// of `class`.
///
/// A name shared between a field and a method, or between a nested type
/// and either, is left out entirely.
pub fn collect_star_import(runtime: &Runtime, class: &ClassRef) -> StarImport {
    let mut result = StarImport::new();

    let mut field_names: FxHashSet<&str> = FxHashSet::default();
    for field in class.declared_fields() {
        if !(field.is_public() && field.is_static()) {
            continue;
        }
        field_names.insert(&field.name);
        if let Some(value) = field.static_value() {
            result.insert(field.name.clone(), value);
        }
    }

    let mut method_names: FxHashSet<&str> = FxHashSet::default();
    for method in class.declared_methods() {
        if !(method.is_public() && method.is_static()) {
            continue;
        }
        if field_names.contains(method.name.as_str()) {
            result.shift_remove(&method.name);
            continue;
        }
        if method_names.insert(&method.name) {
            let function = static_function(runtime, class, &method.name);
            result.insert(method.name.clone(), Value::Method(function));
        }
    }

    for nested in class.nested_types() {
        if !nested.is_public() {
            continue;
        }
        let simple_name = nested.simple_name();
        if field_names.contains(simple_name) || method_names.contains(simple_name) {
            result.shift_remove(simple_name);
            continue;
        }
        result.insert(simple_name.to_string(), Value::Class(nested.clone()));
    }

    result
}

/// The public static member or nested type of `class` called `name`.
pub fn find_import(
    runtime: &Runtime,
    class: &ClassRef,
    name: &str,
    path: &[String],
) -> RuntimeResult<Value> {
    let ambiguous = || RuntimeError::AmbiguousImport {
        path: path.to_vec(),
        target: name.to_string(),
    };
    let mut result = None;

    if let Some(field) = class
        .declared_fields()
        .iter()
        .find(|f| f.is_public() && f.is_static() && f.name == name)
    {
        result = field.static_value();
    }

    if class
        .declared_methods()
        .iter()
        .any(|m| m.is_public() && m.is_static() && m.name == name)
    {
        if result.is_some() {
            return Err(ambiguous());
        }
        result = Some(Value::Method(static_function(runtime, class, name)));
    }

    if let Some(nested) = class
        .nested_types()
        .iter()
        .find(|n| n.is_public() && n.simple_name() == name)
    {
        if result.is_some() {
            return Err(ambiguous());
        }
        result = Some(Value::Class(nested.clone()));
    }

    result.ok_or_else(|| RuntimeError::ImportNotFound {
        path: path.to_vec(),
        target: Some(name.to_string()),
        reason: None,
    })
}

/// Whether a failed attempt should fall through to the next reading of
/// the path.
fn is_miss(error: &RuntimeError) -> bool {
    matches!(
        error,
        RuntimeError::ClassNotFound { .. } | RuntimeError::ImportNotFound { .. }
    )
}

/// The class names to try for `path`: the plain dotted name, then with
/// ever more trailing segments joined as nested types.
fn class_name_readings(path: &[String]) -> Vec<String> {
    let mut readings = vec![path.join(".")];
    for i in (0..path.len().saturating_sub(1)).rev() {
        let nested = path[i..].join("$");
        readings.push(if i == 0 {
            nested
        } else {
            format!("{}.{nested}", path[..i].join("."))
        });
    }
    readings
}

/// Resolve `import path.target`.
pub fn do_import(runtime: &Runtime, path: &[String], target: &str) -> RuntimeResult<Value> {
    trace!("import {}.{target}", path.join("."));
    if path.is_empty() {
        return match runtime.find_class(target) {
            Ok(class) => Ok(Value::Class(class)),
            Err(RuntimeError::ClassNotFound { .. }) => Err(RuntimeError::ImportNotFound {
                path: Vec::new(),
                target: Some(target.to_string()),
                reason: None,
            }),
            Err(e) => Err(e),
        };
    }

    for (i, joined) in class_name_readings(path).into_iter().enumerate() {
        match runtime.find_class(&format!("{joined}${target}")) {
            Ok(class) => return Ok(Value::Class(class)),
            Err(e) if is_miss(&e) => {}
            Err(e) => return Err(e),
        }
        let found = runtime
            .find_class(&joined)
            .and_then(|class| find_import(runtime, &class, target, path));
        match found {
            Ok(value) => return Ok(value),
            Err(e) if is_miss(&e) => {}
            Err(e) => return Err(e),
        }
        // a plain dotted path may also be a package holding `target`
        if i == 0 {
            match runtime.find_class(&format!("{joined}.{target}")) {
                Ok(class) => return Ok(Value::Class(class)),
                Err(e) if is_miss(&e) => {}
                Err(e) => return Err(e),
            }
        }
    }

    Err(RuntimeError::ImportNotFound {
        path: path.to_vec(),
        target: Some(target.to_string()),
        reason: None,
    })
}

/// Find the class a star import of `path` refers to.
pub fn find_star_import_class(runtime: &Runtime, path: &[String]) -> RuntimeResult<ClassRef> {
    for joined in class_name_readings(path) {
        match runtime.find_class(&joined) {
            Ok(class) => return Ok(class),
            Err(e) if is_miss(&e) => {}
            Err(e) => return Err(e),
        }
    }
    Err(RuntimeError::ImportNotFound {
        path: path.to_vec(),
        target: None,
        reason: None,
    })
}

/// Resolve `import path.*`.
pub fn import_star(runtime: &Runtime, path: &[String]) -> RuntimeResult<StarImport> {
    trace!("import {}.*", path.join("."));
    let class = find_star_import_class(runtime, path)?;
    Ok(collect_star_import(runtime, &class))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glang_compiler::{CompileOptions, compile_source};

    use super::*;
    use crate::class::{ClassBuilder, Modifiers, ParamType};
    use crate::output::CapturedOutput;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn holder(runtime: &Runtime) -> ClassRef {
        let inner = ClassBuilder::new("pkg.Holder$Inner").build();
        let hidden = ClassBuilder::new("pkg.Holder$Hidden")
            .modifiers(Modifiers::empty())
            .build();
        let class = ClassBuilder::new("pkg.Holder")
            .static_field("x", Value::Int(1), Modifiers::PUBLIC)
            .static_method("x", vec![], |_| Ok(Value::Int(2)))
            .static_field("limit", Value::Int(10), Modifiers::PUBLIC | Modifiers::FINAL)
            .static_field("secret", Value::Int(0), Modifiers::empty())
            .static_method("twice", vec![ParamType::Int], |ctx| {
                Ok(Value::Int(ctx.arg::<i32>(0)? * 2))
            })
            .nested(&inner)
            .nested(&hidden)
            .build();
        runtime.class_path().define(&class);
        class
    }

    #[test]
    fn qualified_ambiguity_is_an_error() {
        let runtime = Runtime::new();
        holder(&runtime);
        let err = do_import(&runtime, &path(&["pkg", "Holder"]), "x").unwrap_err();
        assert_eq!(err.to_string(), "pkg.Holder.x: Ambiguous import");
    }

    #[test]
    fn star_import_omits_ambiguous_names() {
        let runtime = Runtime::new();
        holder(&runtime);
        let star = import_star(&runtime, &path(&["pkg", "Holder"])).unwrap();
        let names: Vec<&str> = star.keys().map(String::as_str).collect();
        assert_eq!(names, ["limit", "twice", "Inner"]);
    }

    fn run(runtime: &Runtime, namespace: &str, source: &str) -> RuntimeResult<Value> {
        let code = compile_source(namespace, source, &CompileOptions::default())
            .map_err(RuntimeError::from)?;
        let unit = runtime.load_unit(code)?;
        unit.run_main(runtime, Value::array(vec![]))
    }

    #[test]
    fn script_star_import_drops_colliding_name_that_qualified_import_reaches() {
        let output = Arc::new(CapturedOutput::default());
        let runtime = Runtime::builder().output(output.clone()).build();
        holder(&runtime);

        run(
            &runtime,
            "imports.both",
            "import pkg.Holder.*\nimport pkg.Holder\nprintln(limit, twice(3), Holder.twice(5))",
        )
        .unwrap();
        assert_eq!(output.stdout(), "10 6 10\n");

        let err = run(&runtime, "imports.star", "import pkg.Holder.*\nprintln(x)").unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownGlobal { ref name } if name == "x"));

        let err = run(&runtime, "imports.qualified", "import pkg.Holder.x").unwrap_err();
        assert!(err.is_import_failure());
        assert!(err.to_string().contains("Ambiguous import"));
    }

    #[test]
    fn qualified_members() {
        let runtime = Runtime::new();
        holder(&runtime);
        let p = path(&["pkg", "Holder"]);
        assert_eq!(do_import(&runtime, &p, "limit").unwrap(), Value::Int(10));

        let twice = do_import(&runtime, &p, "twice").unwrap();
        assert_eq!(
            runtime.invoke_object(&twice, vec![Value::Int(21)]).unwrap(),
            Value::Int(42)
        );

        let inner = do_import(&runtime, &p, "Inner").unwrap();
        assert!(matches!(inner, Value::Class(c) if c.name() == "pkg.Holder$Inner"));

        let err = do_import(&runtime, &p, "secret").unwrap_err();
        assert_eq!(err.to_string(), "pkg.Holder.secret");
        assert!(do_import(&runtime, &p, "Hidden").is_err());
    }

    #[test]
    fn trailing_segments_are_reread_as_nested_types() {
        let runtime = Runtime::new();
        let leaf = ClassBuilder::new("pkg.Outer$Inner")
            .static_field("VALUE", Value::Int(7), Modifiers::PUBLIC)
            .build();
        let outer = ClassBuilder::new("pkg.Outer").nested(&leaf).build();
        runtime.class_path().define(&outer);

        let value = do_import(&runtime, &path(&["pkg", "Outer", "Inner"]), "VALUE").unwrap();
        assert_eq!(value, Value::Int(7));

        let star = import_star(&runtime, &path(&["pkg", "Outer", "Inner"])).unwrap();
        assert_eq!(star["VALUE"], Value::Int(7));
    }

    #[test]
    fn unknown_imports() {
        let runtime = Runtime::new();
        let err = do_import(&runtime, &path(&["nope"]), "thing").unwrap_err();
        assert_eq!(err.to_string(), "nope.thing");

        let err = import_star(&runtime, &path(&["no", "where"])).unwrap_err();
        assert_eq!(err.to_string(), "no.where.*");

        let err = do_import(&runtime, &[], "Missing").unwrap_err();
        assert!(err.is_import_failure());
    }

    #[test]
    fn core_classes_are_importable() {
        let runtime = Runtime::new();
        let pi = do_import(&runtime, &path(&["glang", "lang", "Math"]), "PI").unwrap();
        assert_eq!(pi, Value::Double(std::f64::consts::PI));
        let math = do_import(&runtime, &path(&["glang", "lang"]), "Math").unwrap();
        assert_eq!(math, Value::Class(runtime.lang().math.clone()));
    }

    #[test]
    fn readings_of_a_path() {
        assert_eq!(
            class_name_readings(&path(&["a", "b", "C"])),
            ["a.b.C", "a.b$C", "a$b$C"]
        );
        assert_eq!(class_name_readings(&path(&["A"])), ["A"]);
    }
}
