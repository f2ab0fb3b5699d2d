//! `glang.BuiltinsNs`: functions every unit sees without an import.

use std::sync::Arc;

use glang_core::RuntimeResult;

use crate::class::{ClassBuilder, ClassRef, MethodDef, Modifiers, ParamType};
use crate::native::CallContext;
use crate::value::Value;

use super::{LangClasses, obj};

fn print_joined(ctx: &mut CallContext<'_>) -> RuntimeResult<Value> {
    let runtime = ctx.runtime();
    let values: Arc<[Value]> = ctx.arg(0)?;
    let mut line = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&runtime.stringify(value)?);
    }
    runtime.output().print_line(&line);
    Ok(Value::Null)
}

fn optional_arg_test(ctx: &mut CallContext<'_>) -> RuntimeResult<Value> {
    let runtime = ctx.runtime();
    let mut parts = Vec::with_capacity(4);
    for index in 0..4 {
        parts.push(runtime.stringify(ctx.arg_value(index)?)?);
    }
    Ok(Value::from(parts.join(" ")))
}

/// Build the namespace class.
pub fn builtins_namespace(lang: &LangClasses) -> ClassRef {
    let public_static = Modifiers::PUBLIC | Modifiers::STATIC;
    ClassBuilder::new("glang.BuiltinsNs")
        .static_method("println", vec![], |ctx| {
            ctx.runtime().output().print_line("");
            Ok(Value::Null)
        })
        .static_method("println", vec![ParamType::Any], |ctx| {
            let runtime = ctx.runtime();
            runtime.output().print_line(&runtime.stringify(ctx.arg_value(0)?)?);
            Ok(Value::Null)
        })
        .method_def(
            MethodDef::new("println", public_static, vec![], print_joined)
                .with_variadic(ParamType::Any),
        )
        .method_def(
            MethodDef::new(
                "optionalArgTest",
                public_static,
                vec![obj(&lang.string), ParamType::Optional, ParamType::Optional],
                optional_arg_test,
            )
            .with_variadic(ParamType::Int),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::output::CapturedOutput;
    use crate::runtime::Runtime;
    use crate::value::Value;

    fn call(runtime: &Runtime, name: &str, args: Vec<Value>) -> Value {
        let function = runtime.default_imports()[name].clone();
        runtime.invoke_object(&function, args).unwrap()
    }

    #[test]
    fn println_overloads() {
        let output = Arc::new(CapturedOutput::default());
        let runtime = Runtime::builder().output(output.clone()).build();

        call(&runtime, "println", vec![]);
        call(&runtime, "println", vec![Value::Int(2)]);
        call(&runtime, "println", vec![Value::str("a"), Value::Null, Value::Double(1.0)]);
        assert_eq!(output.stdout(), "\n2\na null 1.0\n");
    }

    #[test]
    fn optional_arguments() {
        let runtime = Runtime::new();
        let a = Value::str("a");
        assert_eq!(
            call(&runtime, "optionalArgTest", vec![a.clone()]),
            Value::str("a Absent Absent []")
        );
        assert_eq!(
            call(&runtime, "optionalArgTest", vec![a.clone(), Value::Int(1)]),
            Value::str("a Present[1] Absent []")
        );
        assert_eq!(
            call(
                &runtime,
                "optionalArgTest",
                vec![a, Value::Null, Value::str("c"), Value::Int(4), Value::Int(5)]
            ),
            Value::str("a Present[null] Present[c] [4, 5]")
        );
    }

    #[test]
    fn variadic_tail_rejects_wrong_types() {
        let runtime = Runtime::new();
        let function = runtime.default_imports()["optionalArgTest"].clone();
        let args = vec![Value::str("a"), Value::Null, Value::Null, Value::str("x")];
        assert!(runtime.invoke_object(&function, args).is_err());
    }
}
