//! The class model every runtime value belongs to.
//!
//! Classes are immutable once built. A [`ClassRef`] compares and hashes by
//! identity, so it can key dispatch caches directly.

use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Weak};

use bitflags::bitflags;
use glang_core::abi::VARIADIC_MAX;
use glang_core::{RuntimeError, RuntimeResult};
use parking_lot::RwLock;

use crate::native::{CallContext, NativeFn};
use crate::value::Value;

bitflags! {
    /// Member and class modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
        const FINAL = 1 << 2;
        const INTERFACE = 1 << 3;
    }
}

/// Declared type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    Boolean,
    Int,
    Long,
    Double,
    /// Any value, null included.
    Any,
    /// Any instance of the class or one of its subclasses, or null.
    Object(ClassRef),
    /// An instance of the class declaring the member, or null.
    Declaring,
    /// Receives an [`OptionalParameter`](crate::value::OptionalParameter).
    Optional,
}

impl ParamType {
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            ParamType::Boolean | ParamType::Int | ParamType::Long | ParamType::Double
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Boolean => f.write_str("boolean"),
            ParamType::Int => f.write_str("int"),
            ParamType::Long => f.write_str("long"),
            ParamType::Double => f.write_str("double"),
            ParamType::Any => f.write_str("Object"),
            ParamType::Object(class) => f.write_str(class.simple_name()),
            ParamType::Declaring => f.write_str("Self"),
            ParamType::Optional => f.write_str("OptionalParameter"),
        }
    }
}

/// A method or constructor with a native body.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub modifiers: Modifiers,
    /// Declared parameters, excluding the receiver of instance methods.
    pub params: Vec<ParamType>,
    /// Element type of a trailing variadic parameter.
    pub variadic: Option<ParamType>,
    pub body: NativeFn,
}

impl MethodDef {
    pub fn new<F>(name: impl Into<String>, modifiers: Modifiers, params: Vec<ParamType>, f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            modifiers,
            params,
            variadic: None,
            body: NativeFn::new(f),
        }
    }

    pub fn with_variadic(mut self, element: ParamType) -> Self {
        self.variadic = Some(element);
        self
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_varargs(&self) -> bool {
        self.variadic.is_some()
    }

    /// Fewest declared arguments accepted: trailing optional parameters
    /// may be left out.
    pub fn min_args(&self) -> usize {
        let mut count = self.params.len();
        while count > 0 && self.params[count - 1] == ParamType::Optional {
            count -= 1;
        }
        count
    }

    /// Most declared arguments accepted.
    pub fn max_args(&self) -> usize {
        if self.is_varargs() {
            VARIADIC_MAX
        } else {
            self.params.len()
        }
    }
}

/// Where a field's value lives.
#[derive(Debug, Clone)]
pub enum FieldStorage {
    /// Slot index in every instance.
    Instance(usize),
    Static(Arc<RwLock<Value>>),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub modifiers: Modifiers,
    pub storage: FieldStorage,
}

impl FieldDef {
    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifiers::FINAL)
    }

    /// Current value of a static field.
    pub fn static_value(&self) -> Option<Value> {
        match &self.storage {
            FieldStorage::Static(cell) => Some(cell.read().clone()),
            FieldStorage::Instance(_) => None,
        }
    }
}

/// A class: its members, supertypes and nested types.
#[derive(Debug)]
pub struct Class {
    /// Fully qualified name; nested types join their outer name with `$`.
    name: String,
    modifiers: Modifiers,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    fields: Vec<FieldDef>,
    methods: Vec<Arc<MethodDef>>,
    constructors: Vec<Arc<MethodDef>>,
    nested: Vec<ClassRef>,
    instance_slots: usize,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name without package or outer types.
    pub fn simple_name(&self) -> &str {
        let start = self.name.rfind(['.', '$']).map_or(0, |i| i + 1);
        &self.name[start..]
    }

    /// The dotted source-level name (`pkg.Outer.Inner`).
    pub fn canonical_name(&self) -> String {
        self.name.replace('$', ".")
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC)
    }

    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }

    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    pub fn interfaces(&self) -> &[ClassRef] {
        &self.interfaces
    }

    pub fn declared_fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn declared_methods(&self) -> &[Arc<MethodDef>] {
        &self.methods
    }

    pub fn constructors(&self) -> &[Arc<MethodDef>] {
        &self.constructors
    }

    pub fn nested_types(&self) -> &[ClassRef] {
        &self.nested
    }

    pub fn instance_slots(&self) -> usize {
        self.instance_slots
    }

    /// Whether `self` is `other` or inherits from it, through superclasses
    /// or interfaces.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mut queue: VecDeque<&ClassRef> = VecDeque::new();
        queue.extend(self.superclass.iter());
        queue.extend(self.interfaces.iter());
        while let Some(next) = queue.pop_front() {
            if std::ptr::eq(&**next, other) {
                return true;
            }
            queue.extend(next.superclass.iter());
            queue.extend(next.interfaces.iter());
        }
        false
    }

    /// A public field visible on this class, inherited ones included.
    pub fn public_field(&self, name: &str) -> Option<&FieldDef> {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(field) = class.fields.iter().find(|f| f.name == name && f.is_public()) {
                return Some(field);
            }
            current = class.superclass.as_deref();
        }
        None
    }

    /// A public type declared directly inside this one.
    pub fn nested_type(&self, simple_name: &str) -> Option<&ClassRef> {
        self.nested
            .iter()
            .find(|n| n.is_public() && n.simple_name() == simple_name)
    }
}

/// Shared handle to a [`Class`], compared by identity.
#[derive(Clone)]
pub struct ClassRef(Arc<Class>);

impl ClassRef {
    pub fn ptr_eq(&self, other: &ClassRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Public methods named `name`, declared here or inherited through the
    /// superclass chain, each with its declaring class. An override hides
    /// the inherited method with the same parameters.
    pub fn public_methods(&self, name: &str, want_static: bool) -> Vec<(ClassRef, Arc<MethodDef>)> {
        let mut result: Vec<(ClassRef, Arc<MethodDef>)> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(class) = current {
            for method in &class.methods {
                if method.name != name || !method.is_public() || method.is_static() != want_static
                {
                    continue;
                }
                let hidden = result
                    .iter()
                    .any(|(_, m)| m.params == method.params && m.variadic == method.variadic);
                if !hidden {
                    result.push((class.clone(), method.clone()));
                }
            }
            current = class.superclass.clone();
        }
        result
    }
}

impl Deref for ClassRef {
    type Target = Class;

    fn deref(&self) -> &Class {
        &self.0
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.0.name)
    }
}

/// Constructor body: receives the class being instantiated.
type ConstructorFn =
    Arc<dyn Fn(&ClassRef, &mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync>;

/// Builder for [`Class`].
///
/// ```ignore
/// let point = ClassBuilder::new("demo.Point")
///     .extends(&object)
///     .field("x", Modifiers::PUBLIC)
///     .constructor(vec![ParamType::Int], |class, ctx| { ... })
///     .build();
/// ```
pub struct ClassBuilder {
    name: String,
    modifiers: Modifiers,
    superclass: Option<ClassRef>,
    interfaces: Vec<ClassRef>,
    fields: Vec<FieldDef>,
    methods: Vec<Arc<MethodDef>>,
    constructors: Vec<(Vec<ParamType>, ConstructorFn)>,
    nested: Vec<ClassRef>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Start a public interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name).modifiers(Modifiers::PUBLIC | Modifiers::INTERFACE)
    }

    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn extends(mut self, superclass: &ClassRef) -> Self {
        self.superclass = Some(superclass.clone());
        self
    }

    pub fn implements(mut self, interface: &ClassRef) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Add a public instance method.
    pub fn method<F>(self, name: &str, params: Vec<ParamType>, f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.method_def(MethodDef::new(name, Modifiers::PUBLIC, params, f))
    }

    /// Add a public static method.
    pub fn static_method<F>(self, name: &str, params: Vec<ParamType>, f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.method_def(MethodDef::new(
            name,
            Modifiers::PUBLIC | Modifiers::STATIC,
            params,
            f,
        ))
    }

    pub fn method_def(mut self, method: MethodDef) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    /// Add a public constructor. The body allocates and returns the instance.
    pub fn constructor<F>(mut self, params: Vec<ParamType>, f: F) -> Self
    where
        F: Fn(&ClassRef, &mut CallContext<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.constructors.push((params, Arc::new(f)));
        self
    }

    /// Add an instance field.
    pub fn field(mut self, name: &str, modifiers: Modifiers) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            modifiers: modifiers - Modifiers::STATIC,
            storage: FieldStorage::Instance(0),
        });
        self
    }

    /// Add a static field with its initial value.
    pub fn static_field(mut self, name: &str, value: Value, modifiers: Modifiers) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            modifiers: modifiers | Modifiers::STATIC,
            storage: FieldStorage::Static(Arc::new(RwLock::new(value))),
        });
        self
    }

    /// Add a type declared inside this one. Its name must be this class's
    /// name joined with `$`.
    pub fn nested(mut self, nested: &ClassRef) -> Self {
        self.nested.push(nested.clone());
        self
    }

    pub fn build(mut self) -> ClassRef {
        let mut next_slot = self.superclass.as_ref().map_or(0, |s| s.instance_slots);
        for field in &mut self.fields {
            if let FieldStorage::Instance(slot) = &mut field.storage {
                *slot = next_slot;
                next_slot += 1;
            }
        }
        let name = self.name;
        let pending = self.constructors;
        let class = Arc::new_cyclic(|weak: &Weak<Class>| {
            let constructors = pending
                .into_iter()
                .map(|(params, body)| {
                    let weak = weak.clone();
                    let owner = name.clone();
                    Arc::new(MethodDef::new(
                        name.clone(),
                        Modifiers::PUBLIC,
                        params,
                        move |ctx| {
                            let class = weak.upgrade().map(ClassRef).ok_or_else(|| {
                                RuntimeError::IllegalArgument(format!("{owner} was dropped"))
                            })?;
                            body(&class, ctx)
                        },
                    ))
                })
                .collect();
            Class {
                name: name.clone(),
                modifiers: self.modifiers,
                superclass: self.superclass,
                interfaces: self.interfaces,
                fields: self.fields,
                methods: self.methods,
                constructors,
                nested: self.nested,
                instance_slots: next_slot,
            }
        });
        ClassRef(class)
    }
}
