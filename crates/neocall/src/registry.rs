//! # Type Registry
//!
//! Startup-populated metadata for the types a call may name: primitive
//! argument types, records, and services with their methods.
//!
//! Uses DashMap so lookups on the request hot path never contend on a global
//! lock while late registrations are still possible.
//!
//! ## Invariants
//! - **Name-only Method Resolution**: `public_method` never looks at argument
//!   types. Overloaded public methods cannot be served by name and resolve to
//!   `MethodOverloadAmbiguous`.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Error;
use crate::error::Result;
use crate::value::Value;

/// Name of the well-known generic service marker type.
///
/// Calls targeting this type carry no static method or argument metadata and
/// are resolved dynamically at the target.
pub const GENERIC_SERVICE: &str = "neocall.GenericService";

/// Names of the primitive types every registry starts with.
pub const PRIMITIVES: &[&str] = &["bool", "i64", "f64", "string", "bytes", "list", "map", "any"];

pub type TypeRef = Arc<TypeDescriptor>;
pub type MethodRef = Arc<MethodDescriptor>;

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum TypeKind {
    Primitive,
    Record,
    Service,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Metadata for a single method of a service type.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: String,
    visibility: Visibility,
    params: Vec<TypeRef>,
    returns: Option<String>,
}

impl MethodDescriptor {
    pub fn public(name: impl Into<String>, params: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            params,
            returns: None,
        }
    }

    pub fn private(name: impl Into<String>, params: Vec<TypeRef>) -> Self {
        Self {
            visibility: Visibility::Private,
            ..Self::public(name, params)
        }
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.returns = Some(type_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Declared parameter types, in order.
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Declared parameter type names, in order.
    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn return_type(&self) -> Option<&str> {
        self.returns.as_deref()
    }
}

/// Metadata for a named type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    methods: Vec<MethodRef>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            methods: Vec::new(),
        }
    }

    pub fn primitive(name: impl Into<String>) -> TypeRef {
        Arc::new(Self::new(name, TypeKind::Primitive))
    }

    pub fn record(name: impl Into<String>) -> TypeRef {
        Arc::new(Self::new(name, TypeKind::Record))
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Service)
    }

    /// Appends a method. Declaration order is preserved.
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn methods(&self) -> &[MethodRef] {
        &self.methods
    }

    pub fn is_generic_marker(&self) -> bool {
        self.name == GENERIC_SERVICE
    }

    /// Resolves a public method by name alone.
    ///
    /// # Errors
    /// - `MethodNotFound` if no public method has this name.
    /// - `MethodOverloadAmbiguous` if several public methods share it.
    pub fn public_method(&self, name: &str) -> Result<MethodRef> {
        let mut candidates = self.methods.iter()
            .filter(|m| m.is_public() && m.name == name);

        let Some(first) = candidates.next() else {
            return Err(Error::MethodNotFound {
                type_name: self.name.clone(),
                method: name.to_string(),
            });
        };

        let others = candidates.count();
        if others > 0 {
            return Err(Error::MethodOverloadAmbiguous {
                type_name: self.name.clone(),
                method: name.to_string(),
                count: others + 1,
            });
        }

        Ok(Arc::clone(first))
    }
}

/// A call-side target able to execute a resolved method.
pub trait ServiceObject: Send + Sync + 'static {
    fn call(&self, method: &MethodDescriptor, args: &[Value]) -> anyhow::Result<Value>;
}

/// Concurrent registry of known types, keyed by name.
pub struct TypeRegistry {
    types: DashMap<String, TypeRef>,
}

impl TypeRegistry {
    /// Creates a registry holding the primitive types and the generic service marker.
    pub fn new() -> Self {
        let registry = Self::empty();
        for name in PRIMITIVES {
            registry.register(TypeDescriptor::primitive(*name));
        }
        registry.register(Self::generic_service(&registry));
        registry
    }

    /// Creates a registry with nothing in it.
    pub fn empty() -> Self {
        Self { types: DashMap::new() }
    }

    /// Registers a type, replacing any previous type of the same name.
    pub fn register(&self, ty: impl Into<TypeRef>) -> TypeRef {
        let ty = ty.into();
        tracing::debug!(name = ty.name(), kind = ?ty.kind(), methods = ty.methods().len(), "registered type");
        self.types.insert(ty.name().to_string(), Arc::clone(&ty));
        ty
    }

    /// Looks up a type by name.
    ///
    /// # Errors
    /// Returns `TargetTypeNotFound` if the name is unknown.
    pub fn resolve(&self, name: &str) -> Result<TypeRef> {
        self.get(name).ok_or_else(|| Error::TargetTypeNotFound(name.to_string()))
    }

    /// Resolves an ordered list of argument type names.
    ///
    /// # Errors
    /// Returns `ArgumentTypeResolutionFailed` naming the first unknown type.
    pub fn resolve_arg_types(&self, names: &[String]) -> Result<Vec<TypeRef>> {
        names.iter()
            .map(|n| self.get(n).ok_or_else(|| Error::ArgumentTypeResolutionFailed(n.clone())))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.types.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn generic_service(registry: &Self) -> TypeDescriptor {
        let params = ["string", "list", "list"]
            .iter()
            .filter_map(|n| registry.get(n))
            .collect();
        TypeDescriptor::service(GENERIC_SERVICE)
            .with_method(MethodDescriptor::public("$invoke", params).returns("any"))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
