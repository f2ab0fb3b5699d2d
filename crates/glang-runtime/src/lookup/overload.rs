//! Overload resolution over applicable candidates.
//!
//! Every resolvable member (instance method, static method, constructor,
//! extension) is described by one [`Candidate`]. For instance methods the
//! receiver is parameter 0, so resolution treats all kinds the same way.
//!
//! Among the candidates whose argument window holds the call and whose
//! parameters accept the call shape, the one with the narrowest window wins.
//! Equal windows keep declaration order.

use std::sync::Arc;

use glang_core::abi::VARIADIC_MAX;
use glang_core::RuntimeResult;

use crate::builtins::LangClasses;
use crate::class::{ClassRef, MethodDef, ParamType};
use crate::runtime::Runtime;
use crate::value::{OptionalParameter, Value};

/// A member annotated with its accepted argument-count window.
#[derive(Debug, Clone)]
pub struct Candidate {
    method: Arc<MethodDef>,
    /// Parameter types the call's arguments are matched against, after
    /// skipped arguments.
    params: Vec<ParamType>,
    variadic: Option<ParamType>,
    /// Leading arguments dropped before the method is called.
    skip: usize,
    min: usize,
    max: usize,
}

impl Candidate {
    /// A free function such as an extension: arguments map one to one onto
    /// the declared parameters.
    pub fn function(method: Arc<MethodDef>) -> Self {
        let params = method.params.clone();
        let variadic = method.variadic.clone();
        Self::with_params(method, params, variadic)
    }

    /// A static method or constructor of `declaring`.
    pub fn member(declaring: &ClassRef, method: Arc<MethodDef>) -> Self {
        let bind = |p: &ParamType| bind_declaring(p, declaring);
        let params = method.params.iter().map(bind).collect();
        let variadic = method.variadic.as_ref().map(bind);
        Self::with_params(method, params, variadic)
    }

    /// An instance method of `declaring`: the receiver is the first argument.
    pub fn instance(declaring: &ClassRef, method: Arc<MethodDef>) -> Self {
        let bind = |p: &ParamType| bind_declaring(p, declaring);
        let mut params = Vec::with_capacity(method.params.len() + 1);
        params.push(ParamType::Object(declaring.clone()));
        params.extend(method.params.iter().map(bind));
        let variadic = method.variadic.as_ref().map(bind);
        Self::with_params(method, params, variadic)
    }

    fn with_params(method: Arc<MethodDef>, params: Vec<ParamType>, variadic: Option<ParamType>) -> Self {
        let mut min = params.len();
        while min > 0 && params[min - 1] == ParamType::Optional {
            min -= 1;
        }
        let max = if variadic.is_some() {
            VARIADIC_MAX
        } else {
            params.len()
        };
        Self {
            method,
            params,
            variadic,
            skip: 0,
            min,
            max,
        }
    }

    /// Accept and drop `count` leading arguments, such as the class value a
    /// static method is reached through.
    pub fn skipping(mut self, count: usize) -> Self {
        self.skip += count;
        self.min += count;
        if self.variadic.is_none() {
            self.max += count;
        }
        self
    }

    pub fn method(&self) -> &Arc<MethodDef> {
        &self.method
    }

    /// The `[min, max]` argument-count window.
    pub fn window(&self) -> (usize, usize) {
        (self.min, self.max)
    }

    fn width(&self) -> usize {
        self.max - self.min
    }

    /// Whether the call shape fits the window and the checked parameters.
    ///
    /// Only the required prefix and the variadic tail are type checked.
    /// Optional parameters accept anything.
    fn accepts(&self, shape: &[ClassRef], lang: &LangClasses) -> bool {
        let n = shape.len();
        if n < self.min || n > self.max {
            return false;
        }
        let args = &shape[self.skip..];
        let required = self.min - self.skip;
        let fixed_ok = args[..required]
            .iter()
            .zip(&self.params)
            .all(|(arg, param)| is_assignable(arg, param, lang));
        if !fixed_ok {
            return false;
        }
        match &self.variadic {
            Some(element) => args
                .iter()
                .skip(self.params.len())
                .all(|arg| is_assignable(arg, element, lang)),
            None => true,
        }
    }
}

fn bind_declaring(param: &ParamType, declaring: &ClassRef) -> ParamType {
    match param {
        ParamType::Declaring => ParamType::Object(declaring.clone()),
        other => other.clone(),
    }
}

/// Whether a value of runtime class `arg` may be passed to `param`.
///
/// Null (class `Void`) is accepted by every non-primitive parameter.
/// Primitive parameters accept exactly their wrapper class.
pub fn is_assignable(arg: &ClassRef, param: &ParamType, lang: &LangClasses) -> bool {
    match param {
        ParamType::Boolean => arg == &lang.boolean,
        ParamType::Int => arg == &lang.integer,
        ParamType::Long => arg == &lang.long,
        ParamType::Double => arg == &lang.double,
        ParamType::Optional => arg == &lang.void || arg == &lang.optional,
        ParamType::Any => true,
        ParamType::Object(class) => arg == &lang.void || arg.is_subclass_of(class),
        // only meaningful once bound to a declaring class
        ParamType::Declaring => false,
    }
}

/// Pick the applicable candidate with the narrowest window.
pub fn resolve<'a>(
    candidates: &'a [Arc<Candidate>],
    shape: &[ClassRef],
    lang: &LangClasses,
) -> Option<&'a Arc<Candidate>> {
    let mut best: Option<&Arc<Candidate>> = None;
    for candidate in candidates {
        if !candidate.accepts(shape, lang) {
            continue;
        }
        if best.is_none_or(|b| candidate.width() < b.width()) {
            best = Some(candidate);
        }
    }
    best
}

/// A candidate bound for one call shape.
#[derive(Debug, Clone)]
pub struct Invoker {
    candidate: Arc<Candidate>,
}

impl Invoker {
    pub fn new(candidate: Arc<Candidate>) -> Self {
        Self { candidate }
    }

    pub fn method(&self) -> &Arc<MethodDef> {
        &self.candidate.method
    }

    pub fn invoke(&self, runtime: &Runtime, args: Vec<Value>) -> RuntimeResult<Value> {
        let adapted = self.adapt(args);
        self.candidate.method.body.call(runtime, adapted)
    }

    /// Shape `args` into the method's declared parameter list: skipped
    /// arguments dropped, optional parameters wrapped and the variadic tail
    /// collected into an array.
    pub fn adapt(&self, mut args: Vec<Value>) -> Vec<Value> {
        let candidate = &*self.candidate;
        let skip = candidate.skip.min(args.len());
        args.drain(..skip);

        let required = candidate.min - candidate.skip;
        let mut rest = args.into_iter();
        let mut adapted = Vec::with_capacity(candidate.params.len() + 1);
        for index in 0..candidate.params.len() {
            let next = rest.next();
            if index < required {
                adapted.push(next.unwrap_or(Value::Null));
            } else {
                let optional = match next {
                    Some(value) => OptionalParameter::present(value),
                    None => OptionalParameter::absent(),
                };
                adapted.push(Value::Optional(optional));
            }
        }
        if candidate.variadic.is_some() {
            adapted.push(Value::array(rest.collect()));
        }
        adapted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Modifiers;

    fn def(params: Vec<ParamType>) -> Arc<MethodDef> {
        Arc::new(MethodDef::new("f", Modifiers::PUBLIC, params, |_| Ok(Value::Null)))
    }

    fn candidates(defs: Vec<Arc<MethodDef>>) -> Vec<Arc<Candidate>> {
        defs.into_iter()
            .map(|d| Arc::new(Candidate::function(d)))
            .collect()
    }

    #[test]
    fn primitives_match_their_wrappers() {
        let lang = LangClasses::new();
        assert!(is_assignable(&lang.integer, &ParamType::Int, &lang));
        assert!(!is_assignable(&lang.long, &ParamType::Int, &lang));
        assert!(!is_assignable(&lang.void, &ParamType::Double, &lang));
        assert!(is_assignable(&lang.void, &ParamType::Object(lang.string.clone()), &lang));
        assert!(is_assignable(
            &lang.integer,
            &ParamType::Object(lang.comparable.clone()),
            &lang
        ));
    }

    #[test]
    fn window_selects_overload() {
        let lang = LangClasses::new();
        let one = def(vec![ParamType::Any]);
        let two = def(vec![ParamType::Any, ParamType::Optional]);
        let set = candidates(vec![one.clone(), two.clone()]);

        let s = lang.string.clone();
        let picked = resolve(&set, &[s.clone()], &lang).unwrap();
        assert!(Arc::ptr_eq(picked.method(), &one));
        let picked = resolve(&set, &[s.clone(), s.clone()], &lang).unwrap();
        assert!(Arc::ptr_eq(picked.method(), &two));
        assert!(resolve(&set, &[s.clone(), s.clone(), s], &lang).is_none());
    }

    #[test]
    fn equal_windows_keep_declaration_order() {
        let lang = LangClasses::new();
        let first = def(vec![ParamType::Any]);
        let second = def(vec![ParamType::Any]);
        let set = candidates(vec![first.clone(), second]);
        let picked = resolve(&set, &[lang.integer.clone()], &lang).unwrap();
        assert!(Arc::ptr_eq(picked.method(), &first));
    }

    #[test]
    fn variadic_tail_is_type_checked() {
        let lang = LangClasses::new();
        let method = Arc::new(
            MethodDef::new("f", Modifiers::PUBLIC, vec![], |_| Ok(Value::Null))
                .with_variadic(ParamType::Int),
        );
        let set = candidates(vec![method]);
        let i = lang.integer.clone();
        assert!(resolve(&set, &[], &lang).is_some());
        assert!(resolve(&set, &[i.clone(), i.clone(), i.clone()], &lang).is_some());
        assert!(resolve(&set, &[i, lang.string.clone()], &lang).is_none());
    }

    #[test]
    fn adapt_wraps_optionals_and_collects_tail() {
        let method = Arc::new(
            MethodDef::new(
                "f",
                Modifiers::PUBLIC,
                vec![ParamType::Int, ParamType::Optional, ParamType::Optional],
                |_| Ok(Value::Null),
            )
            .with_variadic(ParamType::Int),
        );
        let invoker = Invoker::new(Arc::new(Candidate::function(method)));

        let adapted = invoker.adapt(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(adapted.len(), 4);
        assert_eq!(adapted[0], Value::Int(1));
        assert_eq!(adapted[1].to_string(), "Present[2]");
        assert_eq!(adapted[2].to_string(), "Absent");
        assert_eq!(adapted[3].to_string(), "[]");

        let adapted = invoker.adapt((1..=5).map(Value::Int).collect());
        assert_eq!(adapted[3].to_string(), "[4, 5]");
    }

    #[test]
    fn declaring_parameters_bind_to_owner() {
        let lang = LangClasses::new();
        let method = def(vec![ParamType::Declaring]);
        let unbound = vec![Arc::new(Candidate::function(method.clone()))];
        assert!(resolve(&unbound, &[lang.string.clone()], &lang).is_none());

        let bound = vec![Arc::new(Candidate::member(&lang.string, method))];
        assert!(resolve(&bound, &[lang.string.clone()], &lang).is_some());
        assert!(resolve(&bound, &[lang.void.clone()], &lang).is_some());
        assert!(resolve(&bound, &[lang.integer.clone()], &lang).is_none());
    }

    #[test]
    fn skipped_arguments_are_dropped() {
        let lang = LangClasses::new();
        let method = def(vec![ParamType::Int]);
        let candidate = Arc::new(Candidate::function(method).skipping(1));
        assert_eq!(candidate.window(), (2, 2));
        let set = vec![candidate.clone()];
        assert!(resolve(&set, &[lang.class.clone(), lang.integer.clone()], &lang).is_some());

        let adapted = Invoker::new(candidate).adapt(vec![Value::Null, Value::Int(3)]);
        assert_eq!(adapted, vec![Value::Int(3)]);
    }
}
