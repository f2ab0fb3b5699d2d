//! Default extension namespaces and the registrar that installs them.

use std::sync::Arc;

use glang_core::text::{escape, get_line};
use glang_core::{RuntimeError, RuntimeResult};

use crate::class::{ClassBuilder, ClassRef, MethodDef, ParamType};
use crate::extension::{ExtensionRegistrar, ExtensionRegistry};
use crate::lookup::LookupMode;
use crate::native::CallContext;
use crate::value::Value;

use super::{LangClasses, divide_by_zero, floor_mod_i32, floor_mod_i64, obj};

/// The `glang.*Ns` extension namespaces.
#[derive(Debug, Clone)]
pub struct Namespaces {
    pub string_ns: ClassRef,
    pub integer_ns: ClassRef,
    pub number_ns: ClassRef,
    pub comparable_ns: ClassRef,
}

impl Namespaces {
    pub fn new(lang: &LangClasses) -> Self {
        Self {
            string_ns: string_ns(lang),
            integer_ns: integer_ns(),
            number_ns: number_ns(),
            comparable_ns: comparable_ns(lang),
        }
    }

    pub fn all(&self) -> [&ClassRef; 4] {
        [
            &self.string_ns,
            &self.integer_ns,
            &self.number_ns,
            &self.comparable_ns,
        ]
    }
}

fn string_ns(lang: &LangClasses) -> ClassRef {
    let string = obj(&lang.string);
    ClassBuilder::new("glang.StringNs")
        .static_method("escapeGlang", vec![string.clone(), ParamType::Boolean], |ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            Ok(Value::from(escape(&text, ctx.arg(1)?)))
        })
        .static_method("getLine", vec![string.clone(), ParamType::Int], |ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            let index = usize::try_from(ctx.arg::<i32>(1)?).unwrap_or(usize::MAX);
            Ok(Value::str(get_line(&text, index)))
        })
        .static_method("add", vec![string, ParamType::Any], |ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            let other = ctx.arg_value(1)?.clone();
            Ok(Value::from(format!("{text}{}", ctx.runtime().stringify(&other)?)))
        })
        .build()
}

fn int_op(f: fn(i32, i32) -> RuntimeResult<i32>) -> impl Fn(&mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static {
    move |ctx| Ok(Value::Int(f(ctx.arg(0)?, ctx.arg(1)?)?))
}

fn long_op(f: fn(i64, i64) -> RuntimeResult<i64>) -> impl Fn(&mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static {
    move |ctx| Ok(Value::Long(f(ctx.arg(0)?, ctx.arg(1)?)?))
}

fn double_op(f: fn(f64, f64) -> f64) -> impl Fn(&mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static {
    move |ctx| Ok(Value::Double(f(ctx.arg(0)?, ctx.arg(1)?)))
}

fn integer_ns() -> ClassRef {
    let int2 = || vec![ParamType::Int, ParamType::Int];
    ClassBuilder::new("glang.IntegerNs")
        .static_method("subtract", int2(), int_op(|a, b| Ok(a.wrapping_sub(b))))
        .static_method("multiply", int2(), int_op(|a, b| Ok(a.wrapping_mul(b))))
        .static_method(
            "divide",
            int2(),
            int_op(|a, b| {
                if b == 0 {
                    return Err(divide_by_zero());
                }
                Ok(a.wrapping_div(b))
            }),
        )
        .static_method("modulo", int2(), int_op(floor_mod_i32))
        .static_method(
            "remainder",
            int2(),
            int_op(|a, b| {
                if b == 0 {
                    return Err(divide_by_zero());
                }
                Ok(a.wrapping_rem(b))
            }),
        )
        .build()
}

/// Wide integer and floating point counterparts of the integer operators.
fn number_ns() -> ClassRef {
    let long2 = || vec![ParamType::Long, ParamType::Long];
    let double2 = || vec![ParamType::Double, ParamType::Double];
    ClassBuilder::new("glang.NumberNs")
        .static_method("subtract", long2(), long_op(|a, b| Ok(a.wrapping_sub(b))))
        .static_method("subtract", double2(), double_op(|a, b| a - b))
        .static_method("multiply", long2(), long_op(|a, b| Ok(a.wrapping_mul(b))))
        .static_method("multiply", double2(), double_op(|a, b| a * b))
        .static_method(
            "divide",
            long2(),
            long_op(|a, b| {
                if b == 0 {
                    return Err(divide_by_zero());
                }
                Ok(a.wrapping_div(b))
            }),
        )
        .static_method("divide", double2(), double_op(|a, b| a / b))
        .static_method("modulo", long2(), long_op(floor_mod_i64))
        .static_method(
            "remainder",
            long2(),
            long_op(|a, b| {
                if b == 0 {
                    return Err(divide_by_zero());
                }
                Ok(a.wrapping_rem(b))
            }),
        )
        .static_method("remainder", double2(), double_op(|a, b| a % b))
        .build()
}

/// `compareTo` on the receiver, read as an ordering.
fn compare(ctx: &CallContext<'_>) -> RuntimeResult<i32> {
    let a = ctx.arg_value(0)?.clone();
    let b = ctx.arg_value(1)?.clone();
    match ctx
        .runtime()
        .invoke_method(&a, "compareTo", LookupMode::Direct, vec![b])?
    {
        Value::Int(ordering) => Ok(ordering),
        other => Err(RuntimeError::IllegalArgument(format!(
            "compareTo returned {other:?}"
        ))),
    }
}

fn comparable_ns(lang: &LangClasses) -> ClassRef {
    let params = || vec![obj(&lang.comparable), ParamType::Any];
    ClassBuilder::new("glang.ComparableNs")
        .static_method("lessThan", params(), |ctx| Ok(Value::Bool(compare(ctx)? < 0)))
        .static_method("greaterThan", params(), |ctx| Ok(Value::Bool(compare(ctx)? > 0)))
        .static_method("lessThanEqual", params(), |ctx| Ok(Value::Bool(compare(ctx)? <= 0)))
        .static_method("greaterThanEqual", params(), |ctx| {
            Ok(Value::Bool(compare(ctx)? >= 0))
        })
        .build()
}

fn first_param_is(method: &MethodDef, param: &ParamType) -> bool {
    method.params.first() == Some(param)
}

/// Installs the namespaces above plus the wrapper classes' static helpers.
///
/// Static methods of `Integer`, `Long` and `Double` whose first parameter
/// is the matching primitive become extensions of that class, and their
/// `sum` is aliased to `add`.
#[derive(Debug, Clone)]
pub struct DefaultExtensions {
    namespaces: Namespaces,
}

impl DefaultExtensions {
    pub fn new(namespaces: Namespaces) -> Self {
        Self { namespaces }
    }
}

impl ExtensionRegistrar for DefaultExtensions {
    fn register(&self, registry: &ExtensionRegistry) -> RuntimeResult<()> {
        for namespace in self.namespaces.all() {
            registry.register_all(namespace)?;
        }

        let lang = registry.lang().clone();
        registry.register_all_static(&lang.integer, |m| {
            first_param_is(m, &ParamType::Int) && m.name != "toString"
        })?;
        registry.copy(&lang.integer, "sum", "add");

        registry.register_all_static(&lang.long, |m| first_param_is(m, &ParamType::Long))?;
        registry.copy(&lang.long, "sum", "add");

        registry.register_all_static(&lang.double, |m| first_param_is(m, &ParamType::Double))?;
        registry.copy(&lang.double, "sum", "add");
        Ok(())
    }
}
