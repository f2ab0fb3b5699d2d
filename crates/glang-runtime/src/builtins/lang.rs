//! The core classes.

use std::cmp::Ordering;
use std::sync::Arc;

use glang_core::{RuntimeError, RuntimeResult};
use num_bigint::{BigInt, Sign};

use crate::class::{ClassBuilder, ClassRef, Modifiers, ParamType};
use crate::native::CallContext;
use crate::value::{Object, OptionalParameter, Value};

use super::{LANG_PACKAGE, LangClasses, floor_mod_i32, floor_mod_i64, obj};

const CONSTANT: Modifiers = Modifiers::PUBLIC.union(Modifiers::FINAL);

/// Slot of a `StringBuilder`'s contents.
const BUILDER_VALUE: usize = 0;

fn qualified(simple: &str) -> String {
    format!("{LANG_PACKAGE}.{simple}")
}

fn ordering(ordering: Ordering) -> Value {
    Value::Int(ordering as i32)
}

fn to_i64(value: &Value) -> RuntimeResult<i64> {
    Ok(match value {
        Value::Int(i) => i64::from(*i),
        Value::Long(l) => *l,
        Value::Double(d) => *d as i64,
        Value::BigInt(b) => i64::try_from(&**b)
            .map_err(|_| RuntimeError::Arithmetic(format!("{b} does not fit a long")))?,
        other => {
            return Err(RuntimeError::IllegalArgument(format!(
                "{other:?} is not a number"
            )));
        }
    })
}

fn to_f64(value: &Value) -> RuntimeResult<f64> {
    Ok(match value {
        Value::Int(i) => f64::from(*i),
        Value::Long(l) => *l as f64,
        Value::Double(d) => *d,
        Value::BigInt(b) => b.to_string().parse().unwrap_or(f64::NAN),
        other => {
            return Err(RuntimeError::IllegalArgument(format!(
                "{other:?} is not a number"
            )));
        }
    })
}

fn char_range(s: &str, begin: i32, end: i32) -> RuntimeResult<String> {
    let length = s.chars().count();
    let in_range = begin >= 0 && end >= begin && (end as usize) <= length;
    if !in_range {
        return Err(RuntimeError::IllegalArgument(format!(
            "begin {begin}, end {end}, length {length}"
        )));
    }
    Ok(s.chars()
        .skip(begin as usize)
        .take((end - begin) as usize)
        .collect())
}

pub(super) fn build() -> LangClasses {
    let object = object_class();
    let comparable = ClassBuilder::interface(qualified("Comparable")).build();
    let number = number_class(&object);
    let void = ClassBuilder::new(qualified("Void")).extends(&object).build();
    let string = string_class(&object, &comparable);
    let boolean = ClassBuilder::new(qualified("Boolean"))
        .extends(&object)
        .implements(&comparable)
        .constructor(vec![ParamType::Boolean], |_, ctx| Ok(Value::Bool(ctx.arg(0)?)))
        .constructor(vec![obj(&string)], |_, ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            Ok(Value::Bool(text.eq_ignore_ascii_case("true")))
        })
        .method("booleanValue", vec![], |ctx| Ok(Value::Bool(ctx.arg(0)?)))
        .method("compareTo", vec![ParamType::Boolean], |ctx| {
            let (a, b): (bool, bool) = (ctx.arg(0)?, ctx.arg(1)?);
            Ok(ordering(a.cmp(&b)))
        })
        .static_field("TRUE", Value::Bool(true), CONSTANT)
        .static_field("FALSE", Value::Bool(false), CONSTANT)
        .build();
    let integer = integer_class(&number, &comparable, &string);
    let long = long_class(&number, &comparable, &string);
    let double = double_class(&number, &comparable, &string);
    let big_integer = big_integer_class(&number, &comparable, &string);
    let array = ClassBuilder::new(qualified("Array"))
        .extends(&object)
        .method("length", vec![], |ctx| {
            let values: Arc<[Value]> = ctx.arg(0)?;
            Ok(Value::Int(values.len() as i32))
        })
        .method("isEmpty", vec![], |ctx| {
            let values: Arc<[Value]> = ctx.arg(0)?;
            Ok(Value::Bool(values.is_empty()))
        })
        .method("get", vec![ParamType::Int], |ctx| {
            let values: Arc<[Value]> = ctx.arg(0)?;
            let index: i32 = ctx.arg(1)?;
            usize::try_from(index)
                .ok()
                .and_then(|i| values.get(i).cloned())
                .ok_or_else(|| {
                    RuntimeError::IllegalArgument(format!(
                        "Index {index} out of bounds for length {}",
                        values.len()
                    ))
                })
        })
        .build();
    let optional = ClassBuilder::new(qualified("OptionalParameter"))
        .extends(&object)
        .modifiers(CONSTANT)
        .method("isPresent", vec![], |ctx| {
            Ok(Value::Bool(ctx.arg::<OptionalParameter>(0)?.is_present()))
        })
        .method("isAbsent", vec![], |ctx| {
            Ok(Value::Bool(ctx.arg::<OptionalParameter>(0)?.is_absent()))
        })
        .method("get", vec![], |ctx| {
            Ok(ctx.arg::<OptionalParameter>(0)?.get()?.clone())
        })
        .build();
    let class = metaclass(&object);
    let method = ClassBuilder::new("glang.runtime.MethodLookup")
        .extends(&object)
        .build();
    let math = math_class(&object);
    let string_builder = string_builder_class(&object, &string);

    LangClasses {
        object,
        comparable,
        number,
        boolean,
        integer,
        long,
        double,
        big_integer,
        string,
        array,
        optional,
        class,
        method,
        void,
        math,
        string_builder,
    }
}

fn object_class() -> ClassRef {
    ClassBuilder::new(qualified("Object"))
        .method("equals", vec![ParamType::Any], |ctx| {
            Ok(Value::Bool(ctx.arg_value(0)? == ctx.arg_value(1)?))
        })
        .method("toString", vec![], |ctx| Ok(Value::str(&ctx.arg_value(0)?.to_string())))
        .method("getClass", vec![], |ctx| {
            let receiver = ctx.arg_value(0)?;
            Ok(Value::Class(ctx.runtime().class_of(receiver)))
        })
        .build()
}

fn number_class(object: &ClassRef) -> ClassRef {
    ClassBuilder::new(qualified("Number"))
        .extends(object)
        .method("intValue", vec![], |ctx| {
            Ok(Value::Int(to_i64(ctx.arg_value(0)?)? as i32))
        })
        .method("longValue", vec![], |ctx| Ok(Value::Long(to_i64(ctx.arg_value(0)?)?)))
        .method("doubleValue", vec![], |ctx| {
            Ok(Value::Double(to_f64(ctx.arg_value(0)?)?))
        })
        .build()
}

fn parse_error(text: &str) -> RuntimeError {
    RuntimeError::IllegalArgument(format!("For input string: \"{text}\""))
}

fn integer_class(number: &ClassRef, comparable: &ClassRef, string: &ClassRef) -> ClassRef {
    let int2 = || vec![ParamType::Int, ParamType::Int];
    ClassBuilder::new(qualified("Integer"))
        .extends(number)
        .implements(comparable)
        .modifiers(CONSTANT)
        .constructor(vec![ParamType::Int], |_, ctx| Ok(Value::Int(ctx.arg(0)?)))
        .constructor(vec![obj(string)], |_, ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            text.parse().map(Value::Int).map_err(|_| parse_error(&text))
        })
        .method("compareTo", vec![ParamType::Int], |ctx| {
            let (a, b): (i32, i32) = (ctx.arg(0)?, ctx.arg(1)?);
            Ok(ordering(a.cmp(&b)))
        })
        .static_method("sum", int2(), |ctx| {
            Ok(Value::Int(ctx.arg::<i32>(0)?.wrapping_add(ctx.arg(1)?)))
        })
        .static_method("max", int2(), |ctx| Ok(Value::Int(ctx.arg::<i32>(0)?.max(ctx.arg(1)?))))
        .static_method("min", int2(), |ctx| Ok(Value::Int(ctx.arg::<i32>(0)?.min(ctx.arg(1)?))))
        .static_method("signum", vec![ParamType::Int], |ctx| {
            Ok(Value::Int(ctx.arg::<i32>(0)?.signum()))
        })
        .static_method("bitCount", vec![ParamType::Int], |ctx| {
            Ok(Value::Int(ctx.arg::<i32>(0)?.count_ones() as i32))
        })
        .static_method("floorMod", int2(), |ctx| {
            Ok(Value::Int(floor_mod_i32(ctx.arg(0)?, ctx.arg(1)?)?))
        })
        .static_method("toHexString", vec![ParamType::Int], |ctx| {
            Ok(Value::from(format!("{:x}", ctx.arg::<i32>(0)?)))
        })
        .static_method("toBinaryString", vec![ParamType::Int], |ctx| {
            Ok(Value::from(format!("{:b}", ctx.arg::<i32>(0)?)))
        })
        .static_method("toString", vec![ParamType::Int], |ctx| {
            Ok(Value::from(ctx.arg::<i32>(0)?.to_string()))
        })
        .static_method("parseInt", vec![obj(string)], |ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            text.parse().map(Value::Int).map_err(|_| parse_error(&text))
        })
        .static_field("MAX_VALUE", Value::Int(i32::MAX), CONSTANT)
        .static_field("MIN_VALUE", Value::Int(i32::MIN), CONSTANT)
        .build()
}

fn long_class(number: &ClassRef, comparable: &ClassRef, string: &ClassRef) -> ClassRef {
    let long2 = || vec![ParamType::Long, ParamType::Long];
    ClassBuilder::new(qualified("Long"))
        .extends(number)
        .implements(comparable)
        .modifiers(CONSTANT)
        .constructor(vec![ParamType::Long], |_, ctx| Ok(Value::Long(ctx.arg(0)?)))
        .constructor(vec![ParamType::Int], |_, ctx| {
            Ok(Value::Long(i64::from(ctx.arg::<i32>(0)?)))
        })
        .constructor(vec![obj(string)], |_, ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            text.parse().map(Value::Long).map_err(|_| parse_error(&text))
        })
        .method("compareTo", vec![ParamType::Long], |ctx| {
            let (a, b): (i64, i64) = (ctx.arg(0)?, ctx.arg(1)?);
            Ok(ordering(a.cmp(&b)))
        })
        .static_method("sum", long2(), |ctx| {
            Ok(Value::Long(ctx.arg::<i64>(0)?.wrapping_add(ctx.arg(1)?)))
        })
        .static_method("max", long2(), |ctx| Ok(Value::Long(ctx.arg::<i64>(0)?.max(ctx.arg(1)?))))
        .static_method("min", long2(), |ctx| Ok(Value::Long(ctx.arg::<i64>(0)?.min(ctx.arg(1)?))))
        .static_method("parseLong", vec![obj(string)], |ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            text.parse().map(Value::Long).map_err(|_| parse_error(&text))
        })
        .static_field("MAX_VALUE", Value::Long(i64::MAX), CONSTANT)
        .static_field("MIN_VALUE", Value::Long(i64::MIN), CONSTANT)
        .build()
}

fn double_class(number: &ClassRef, comparable: &ClassRef, string: &ClassRef) -> ClassRef {
    let double2 = || vec![ParamType::Double, ParamType::Double];
    ClassBuilder::new(qualified("Double"))
        .extends(number)
        .implements(comparable)
        .modifiers(CONSTANT)
        .constructor(vec![ParamType::Double], |_, ctx| Ok(Value::Double(ctx.arg(0)?)))
        .constructor(vec![ParamType::Int], |_, ctx| {
            Ok(Value::Double(f64::from(ctx.arg::<i32>(0)?)))
        })
        .constructor(vec![ParamType::Long], |_, ctx| {
            Ok(Value::Double(ctx.arg::<i64>(0)? as f64))
        })
        .constructor(vec![obj(string)], |_, ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            text.trim().parse().map(Value::Double).map_err(|_| parse_error(&text))
        })
        .method("compareTo", vec![ParamType::Double], |ctx| {
            let (a, b): (f64, f64) = (ctx.arg(0)?, ctx.arg(1)?);
            Ok(ordering(a.total_cmp(&b)))
        })
        .method("isNaN", vec![], |ctx| Ok(Value::Bool(ctx.arg::<f64>(0)?.is_nan())))
        .method("isInfinite", vec![], |ctx| {
            Ok(Value::Bool(ctx.arg::<f64>(0)?.is_infinite()))
        })
        .static_method("sum", double2(), |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)? + ctx.arg::<f64>(1)?))
        })
        .static_method("max", double2(), |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.max(ctx.arg(1)?)))
        })
        .static_method("min", double2(), |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.min(ctx.arg(1)?)))
        })
        .static_method("parseDouble", vec![obj(string)], |ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            text.trim().parse().map(Value::Double).map_err(|_| parse_error(&text))
        })
        .static_field("NaN", Value::Double(f64::NAN), CONSTANT)
        .static_field("POSITIVE_INFINITY", Value::Double(f64::INFINITY), CONSTANT)
        .static_field("NEGATIVE_INFINITY", Value::Double(f64::NEG_INFINITY), CONSTANT)
        .static_field("MAX_VALUE", Value::Double(f64::MAX), CONSTANT)
        .build()
}

fn big_binary(
    f: fn(&BigInt, &BigInt) -> RuntimeResult<BigInt>,
) -> impl Fn(&mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static {
    move |ctx| {
        let (a, b): (Arc<BigInt>, Arc<BigInt>) = (ctx.arg(0)?, ctx.arg(1)?);
        Ok(Value::big(f(&a, &b)?))
    }
}

fn big_integer_class(number: &ClassRef, comparable: &ClassRef, string: &ClassRef) -> ClassRef {
    let big = ParamType::Declaring;
    ClassBuilder::new(qualified("BigInteger"))
        .extends(number)
        .implements(comparable)
        .constructor(vec![obj(string)], |_, ctx| {
            let text: Arc<str> = ctx.arg(0)?;
            text.parse::<BigInt>().map(Value::big).map_err(|_| parse_error(&text))
        })
        .method("add", vec![big.clone()], big_binary(|a, b| Ok(a + b)))
        .method("subtract", vec![big.clone()], big_binary(|a, b| Ok(a - b)))
        .method("multiply", vec![big.clone()], big_binary(|a, b| Ok(a * b)))
        .method(
            "divide",
            vec![big.clone()],
            big_binary(|a, b| {
                if b.sign() == Sign::NoSign {
                    return Err(RuntimeError::Arithmetic("BigInteger divide by zero".into()));
                }
                Ok(a / b)
            }),
        )
        .method(
            "remainder",
            vec![big.clone()],
            big_binary(|a, b| {
                if b.sign() == Sign::NoSign {
                    return Err(RuntimeError::Arithmetic("BigInteger divide by zero".into()));
                }
                Ok(a % b)
            }),
        )
        .method(
            "mod",
            vec![big.clone()],
            big_binary(|a, m| {
                if m.sign() != Sign::Plus {
                    return Err(RuntimeError::Arithmetic(
                        "BigInteger: modulus not positive".into(),
                    ));
                }
                let r = a % m;
                Ok(if r.sign() == Sign::Minus { r + m } else { r })
            }),
        )
        .method("compareTo", vec![big], |ctx| {
            let (a, b): (Arc<BigInt>, Arc<BigInt>) = (ctx.arg(0)?, ctx.arg(1)?);
            Ok(ordering(a.cmp(&b)))
        })
        .method("negate", vec![], |ctx| {
            let a: Arc<BigInt> = ctx.arg(0)?;
            Ok(Value::big(-&*a))
        })
        .method("abs", vec![], |ctx| {
            let a: Arc<BigInt> = ctx.arg(0)?;
            Ok(Value::big(if a.sign() == Sign::Minus { -&*a } else { (*a).clone() }))
        })
        .method("signum", vec![], |ctx| {
            let a: Arc<BigInt> = ctx.arg(0)?;
            Ok(Value::Int(match a.sign() {
                Sign::Minus => -1,
                Sign::NoSign => 0,
                Sign::Plus => 1,
            }))
        })
        .method("pow", vec![ParamType::Int], |ctx| {
            let a: Arc<BigInt> = ctx.arg(0)?;
            let exponent = u32::try_from(ctx.arg::<i32>(1)?)
                .map_err(|_| RuntimeError::Arithmetic("Negative exponent".into()))?;
            Ok(Value::big(a.pow(exponent)))
        })
        .static_method("valueOf", vec![ParamType::Long], |ctx| {
            Ok(Value::big(BigInt::from(ctx.arg::<i64>(0)?)))
        })
        .static_field("ZERO", Value::big(BigInt::from(0)), CONSTANT)
        .static_field("ONE", Value::big(BigInt::from(1)), CONSTANT)
        .static_field("TWO", Value::big(BigInt::from(2)), CONSTANT)
        .static_field("TEN", Value::big(BigInt::from(10)), CONSTANT)
        .build()
}

fn text(ctx: &CallContext<'_>) -> RuntimeResult<Arc<str>> {
    ctx.arg(0)
}

fn string_class(object: &ClassRef, comparable: &ClassRef) -> ClassRef {
    let s = || ParamType::Declaring;
    ClassBuilder::new(qualified("String"))
        .extends(object)
        .implements(comparable)
        .modifiers(CONSTANT)
        .constructor(vec![], |_, _| Ok(Value::str("")))
        .constructor(vec![s()], |_, ctx| Ok(Value::Str(ctx.arg(0)?)))
        .method("length", vec![], |ctx| {
            Ok(Value::Int(text(ctx)?.chars().count() as i32))
        })
        .method("isEmpty", vec![], |ctx| Ok(Value::Bool(text(ctx)?.is_empty())))
        .method("substring", vec![ParamType::Int], |ctx| {
            let s = text(ctx)?;
            let end = s.chars().count() as i32;
            Ok(Value::from(char_range(&s, ctx.arg(1)?, end)?))
        })
        .method("substring", vec![ParamType::Int, ParamType::Int], |ctx| {
            Ok(Value::from(char_range(&text(ctx)?, ctx.arg(1)?, ctx.arg(2)?)?))
        })
        .method("toUpperCase", vec![], |ctx| Ok(Value::from(text(ctx)?.to_uppercase())))
        .method("toLowerCase", vec![], |ctx| Ok(Value::from(text(ctx)?.to_lowercase())))
        .method("trim", vec![], |ctx| Ok(Value::str(text(ctx)?.trim())))
        .method("contains", vec![s()], |ctx| {
            let needle: Arc<str> = ctx.arg(1)?;
            Ok(Value::Bool(text(ctx)?.contains(&*needle)))
        })
        .method("startsWith", vec![s()], |ctx| {
            let prefix: Arc<str> = ctx.arg(1)?;
            Ok(Value::Bool(text(ctx)?.starts_with(&*prefix)))
        })
        .method("endsWith", vec![s()], |ctx| {
            let suffix: Arc<str> = ctx.arg(1)?;
            Ok(Value::Bool(text(ctx)?.ends_with(&*suffix)))
        })
        .method("indexOf", vec![s()], |ctx| {
            let haystack = text(ctx)?;
            let needle: Arc<str> = ctx.arg(1)?;
            Ok(Value::Int(match haystack.find(&*needle) {
                Some(byte) => haystack[..byte].chars().count() as i32,
                None => -1,
            }))
        })
        .method("concat", vec![s()], |ctx| {
            let other: Arc<str> = ctx.arg(1)?;
            Ok(Value::from(format!("{}{other}", text(ctx)?)))
        })
        .method("repeat", vec![ParamType::Int], |ctx| {
            let count = usize::try_from(ctx.arg::<i32>(1)?)
                .map_err(|_| RuntimeError::IllegalArgument("count is negative".into()))?;
            Ok(Value::from(text(ctx)?.repeat(count)))
        })
        .method("replace", vec![s(), s()], |ctx| {
            let (from, to): (Arc<str>, Arc<str>) = (ctx.arg(1)?, ctx.arg(2)?);
            Ok(Value::from(text(ctx)?.replace(&*from, &to)))
        })
        .method("split", vec![s()], |ctx| {
            let separator: Arc<str> = ctx.arg(1)?;
            let parts = text(ctx)?.split(&*separator).map(Value::str).collect();
            Ok(Value::array(parts))
        })
        .method("compareTo", vec![s()], |ctx| {
            let other: Arc<str> = ctx.arg(1)?;
            Ok(ordering(text(ctx)?.cmp(&other)))
        })
        .static_method("valueOf", vec![ParamType::Any], |ctx| {
            let value = ctx.arg_value(0)?.clone();
            Ok(Value::from(ctx.runtime().stringify(&value)?))
        })
        .method_def(
            crate::class::MethodDef::new(
                "join",
                Modifiers::PUBLIC | Modifiers::STATIC,
                vec![s()],
                |ctx| {
                    let separator: Arc<str> = ctx.arg(0)?;
                    let parts: Arc<[Value]> = ctx.arg(1)?;
                    let mut pieces = Vec::with_capacity(parts.len());
                    for part in parts.iter() {
                        pieces.push(ctx.runtime().stringify(part)?);
                    }
                    Ok(Value::from(pieces.join(&*separator)))
                },
            )
            .with_variadic(ParamType::Any),
        )
        .build()
}

fn receiver_class(ctx: &CallContext<'_>) -> RuntimeResult<ClassRef> {
    ctx.arg(0)
}

fn metaclass(object: &ClassRef) -> ClassRef {
    ClassBuilder::new(qualified("Class"))
        .extends(object)
        .modifiers(CONSTANT)
        .method("getName", vec![], |ctx| Ok(Value::str(receiver_class(ctx)?.name())))
        .method("getSimpleName", vec![], |ctx| {
            Ok(Value::str(receiver_class(ctx)?.simple_name()))
        })
        .method("getCanonicalName", vec![], |ctx| {
            Ok(Value::from(receiver_class(ctx)?.canonical_name()))
        })
        .method("isInterface", vec![], |ctx| Ok(Value::Bool(receiver_class(ctx)?.is_interface())))
        .method("getSuperclass", vec![], |ctx| {
            Ok(receiver_class(ctx)?
                .superclass()
                .map_or(Value::Null, |s| Value::Class(s.clone())))
        })
        .method("isInstance", vec![ParamType::Any], |ctx| {
            let target = receiver_class(ctx)?;
            let value = ctx.arg_value(1)?;
            Ok(Value::Bool(
                !value.is_null() && ctx.runtime().class_of(value).is_subclass_of(&target),
            ))
        })
        .build()
}

fn math_class(object: &ClassRef) -> ClassRef {
    let int2 = || vec![ParamType::Int, ParamType::Int];
    let long2 = || vec![ParamType::Long, ParamType::Long];
    let double2 = || vec![ParamType::Double, ParamType::Double];
    ClassBuilder::new(qualified("Math"))
        .extends(object)
        .modifiers(CONSTANT)
        .static_method("abs", vec![ParamType::Int], |ctx| {
            Ok(Value::Int(ctx.arg::<i32>(0)?.wrapping_abs()))
        })
        .static_method("abs", vec![ParamType::Long], |ctx| {
            Ok(Value::Long(ctx.arg::<i64>(0)?.wrapping_abs()))
        })
        .static_method("abs", vec![ParamType::Double], |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.abs()))
        })
        .static_method("max", int2(), |ctx| Ok(Value::Int(ctx.arg::<i32>(0)?.max(ctx.arg(1)?))))
        .static_method("max", long2(), |ctx| Ok(Value::Long(ctx.arg::<i64>(0)?.max(ctx.arg(1)?))))
        .static_method("max", double2(), |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.max(ctx.arg(1)?)))
        })
        .static_method("min", int2(), |ctx| Ok(Value::Int(ctx.arg::<i32>(0)?.min(ctx.arg(1)?))))
        .static_method("min", long2(), |ctx| Ok(Value::Long(ctx.arg::<i64>(0)?.min(ctx.arg(1)?))))
        .static_method("min", double2(), |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.min(ctx.arg(1)?)))
        })
        .static_method("floorMod", int2(), |ctx| {
            Ok(Value::Int(floor_mod_i32(ctx.arg(0)?, ctx.arg(1)?)?))
        })
        .static_method("floorMod", long2(), |ctx| {
            Ok(Value::Long(floor_mod_i64(ctx.arg(0)?, ctx.arg(1)?)?))
        })
        .static_method("sqrt", vec![ParamType::Double], |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.sqrt()))
        })
        .static_method("pow", double2(), |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.powf(ctx.arg(1)?)))
        })
        .static_method("floor", vec![ParamType::Double], |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.floor()))
        })
        .static_method("ceil", vec![ParamType::Double], |ctx| {
            Ok(Value::Double(ctx.arg::<f64>(0)?.ceil()))
        })
        .static_method("round", vec![ParamType::Double], |ctx| {
            Ok(Value::Long((ctx.arg::<f64>(0)? + 0.5).floor() as i64))
        })
        .static_field("PI", Value::Double(std::f64::consts::PI), CONSTANT)
        .static_field("E", Value::Double(std::f64::consts::E), CONSTANT)
        .build()
}

fn builder_text(ctx: &CallContext<'_>) -> RuntimeResult<(Arc<Object>, String)> {
    let this: Arc<Object> = ctx.arg(0)?;
    let text = this.get(BUILDER_VALUE).to_string();
    Ok((this, text))
}

fn string_builder_class(object: &ClassRef, string: &ClassRef) -> ClassRef {
    ClassBuilder::new(qualified("StringBuilder"))
        .extends(object)
        .modifiers(CONSTANT)
        .field("value", Modifiers::empty())
        .constructor(vec![], |class, _| {
            let this = Object::new(class.clone());
            this.set(BUILDER_VALUE, Value::str(""));
            Ok(Value::Object(this))
        })
        .constructor(vec![obj(string)], |class, ctx| {
            let this = Object::new(class.clone());
            this.set(BUILDER_VALUE, Value::Str(ctx.arg(0)?));
            Ok(Value::Object(this))
        })
        .method("append", vec![ParamType::Any], |ctx| {
            let (this, mut text) = builder_text(ctx)?;
            let value = ctx.arg_value(1)?.clone();
            text.push_str(&ctx.runtime().stringify(&value)?);
            this.set(BUILDER_VALUE, Value::from(text));
            Ok(Value::Object(this))
        })
        .method("reverse", vec![], |ctx| {
            let (this, text) = builder_text(ctx)?;
            this.set(BUILDER_VALUE, Value::from(text.chars().rev().collect::<String>()));
            Ok(Value::Object(this))
        })
        .method("length", vec![], |ctx| {
            let (_, text) = builder_text(ctx)?;
            Ok(Value::Int(text.chars().count() as i32))
        })
        .method("toString", vec![], |ctx| {
            let (_, text) = builder_text(ctx)?;
            Ok(Value::from(text))
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupMode;
    use crate::runtime::Runtime;

    fn call(runtime: &Runtime, receiver: Value, name: &str, args: Vec<Value>) -> RuntimeResult<Value> {
        runtime.invoke_method(&receiver, name, LookupMode::Direct, args)
    }

    #[test]
    fn string_methods() {
        let runtime = Runtime::new();
        let s = Value::str("héllo");
        assert_eq!(call(&runtime, s.clone(), "length", vec![]).unwrap(), Value::Int(5));
        assert_eq!(
            call(&runtime, s.clone(), "substring", vec![Value::Int(1), Value::Int(3)]).unwrap(),
            Value::str("él")
        );
        assert_eq!(
            call(&runtime, s.clone(), "indexOf", vec![Value::str("l")]).unwrap(),
            Value::Int(2)
        );
        assert!(call(&runtime, s, "substring", vec![Value::Int(9)]).is_err());
    }

    #[test]
    fn boxed_constructors_take_a_value_or_its_text() {
        let runtime = Runtime::new();
        let lang = runtime.lang();
        let make = |class: &ClassRef, arg: Value| {
            runtime.invoke_object(&Value::Class(class.clone()), vec![arg])
        };

        assert_eq!(make(&lang.integer, Value::Int(5)).unwrap(), Value::Int(5));
        assert_eq!(make(&lang.integer, Value::str("12")).unwrap(), Value::Int(12));
        assert_eq!(make(&lang.long, Value::Int(7)).unwrap(), Value::Long(7));
        assert_eq!(make(&lang.long, Value::str("-3")).unwrap(), Value::Long(-3));
        assert_eq!(make(&lang.double, Value::Int(2)).unwrap(), Value::Double(2.0));
        assert_eq!(make(&lang.double, Value::str(" 1.5 ")).unwrap(), Value::Double(1.5));
        assert_eq!(make(&lang.boolean, Value::str("TRUE")).unwrap(), Value::Bool(true));
        assert_eq!(make(&lang.boolean, Value::Bool(false)).unwrap(), Value::Bool(false));
        assert_eq!(make(&lang.string, Value::str("s")).unwrap(), Value::str("s"));

        let err = make(&lang.integer, Value::str("x")).unwrap_err();
        assert!(err.to_string().ends_with("For input string: \"x\""));
        assert!(make(&lang.integer, Value::Double(1.0)).is_err());
    }

    #[test]
    fn self_typed_parameters_accept_receiver_class() {
        let runtime = Runtime::new();
        let result = call(&runtime, Value::str("a"), "compareTo", vec![Value::str("b")]).unwrap();
        assert_eq!(result, Value::Int(-1));
        let result = call(&runtime, Value::str("a"), "equals", vec![Value::str("a")]).unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    #[test]
    fn compare_rejects_other_types() {
        let runtime = Runtime::new();
        assert!(call(&runtime, Value::Int(1), "compareTo", vec![Value::Long(1)]).is_err());
    }

    #[test]
    fn big_integer_arithmetic() {
        let runtime = Runtime::new();
        let a = Value::big(BigInt::from(-7));
        let m = Value::big(BigInt::from(3));
        assert_eq!(call(&runtime, a.clone(), "mod", vec![m.clone()]).unwrap().to_string(), "2");
        assert_eq!(call(&runtime, a.clone(), "remainder", vec![m]).unwrap().to_string(), "-1");
        let zero = Value::big(BigInt::from(0));
        assert!(call(&runtime, a, "divide", vec![zero]).is_err());
    }

    #[test]
    fn math_overloads_by_type() {
        let runtime = Runtime::new();
        let math = Value::Class(runtime.lang().math.clone());
        let plain = |args| runtime.invoke_method(&math, "abs", LookupMode::Plain, args);
        assert_eq!(plain(vec![Value::Int(-2)]).unwrap(), Value::Int(2));
        assert_eq!(plain(vec![Value::Double(-2.5)]).unwrap(), Value::Double(2.5));
        assert!(plain(vec![Value::str("x")]).is_err());
    }

    #[test]
    fn string_builder_appends() {
        let runtime = Runtime::new();
        let class = Value::Class(runtime.lang().string_builder.clone());
        let builder = runtime.invoke_object(&class, vec![]).unwrap();
        call(&runtime, builder.clone(), "append", vec![Value::Int(1)]).unwrap();
        call(&runtime, builder.clone(), "append", vec![Value::str("x")]).unwrap();
        assert_eq!(runtime.stringify(&builder).unwrap(), "1x");
        assert!(runtime.get_field(&builder, "value").is_err());
    }

    #[test]
    fn metaclass_members() {
        let runtime = Runtime::new();
        let integer = Value::Class(runtime.lang().integer.clone());
        assert_eq!(
            call(&runtime, integer.clone(), "getName", vec![]).unwrap(),
            Value::str("glang.lang.Integer")
        );
        assert_eq!(
            call(&runtime, integer, "isInstance", vec![Value::Int(3)]).unwrap(),
            Value::Bool(true)
        );
    }
}
