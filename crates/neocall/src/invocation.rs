//! # Invocation Descriptor
//!
//! One remote call: who is called (type, alias, method), with what (ordered
//! argument types and values), and under which out-of-band metadata
//! (attachments).
//!
//! ## Invariants
//! - **Aligned Arguments**: once both `arg_type_names` and `args` have been
//!   assigned they have the same length, zero included. Every constructor and
//!   setter checks this. A side that was never assigned (a name-only
//!   descriptor) is not checked until it is.
//! - **Sparse Attachments**: the attachment map is not allocated until the
//!   first write. An absent map and an empty map are indistinguishable to
//!   readers and to equality.
//! - **Derived Caches**: the argument type cache and the generic flag are
//!   memoized once per instance (`OnceLock`). The type cache is dropped
//!   whenever `arg_type_names` is reassigned; the generic flag is never
//!   re-evaluated, so query it only once attachments are final.
//! - **Identity**: equality and hash cover type name, alias, method name,
//!   argument type names, arguments and attachments. Resolved metadata,
//!   caches and the target object are not part of a call's identity.
//!
//! A descriptor is owned by exactly one in-flight call and has no internal
//! locking beyond the single-assignment caches.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::OnceLock;

use anyhow::anyhow;

use crate::error::Error;
use crate::error::Result;
use crate::keys;
use crate::registry::MethodRef;
use crate::registry::ServiceObject;
use crate::registry::TypeRef;
use crate::registry::TypeRegistry;
use crate::session::Session;
use crate::value::Value;

#[derive(Clone, Default)]
pub struct Invocation {
    pub(crate) target_type_name: String,
    pub(crate) alias: String,
    pub(crate) method_name: String,
    pub(crate) arg_type_names: Option<Vec<String>>,
    pub(crate) arg_type_cache: OnceLock<Vec<TypeRef>>,
    pub(crate) args: Option<Vec<Value>>,
    pub(crate) attachments: Option<BTreeMap<String, Value>>,
    pub(crate) resolved_method: Option<MethodRef>,
    pub(crate) resolved_type: Option<TypeRef>,
    pub(crate) target_object: Option<Arc<dyn ServiceObject>>,
    pub(crate) generic_cache: OnceLock<bool>,
}

impl Invocation {
    /// Creates an unresolved descriptor from names only.
    ///
    /// Used for generic calls and for calls whose metadata arrives later.
    pub fn named(
        target_type_name: impl Into<String>,
        alias: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            target_type_name: target_type_name.into(),
            alias: alias.into(),
            method_name: method_name.into(),
            ..Self::default()
        }
    }

    /// Creates a fully resolved descriptor on the caller side.
    ///
    /// Argument type names are taken from the method's declared parameters.
    ///
    /// # Errors
    /// Returns `ArgumentCountMismatch` if `args` does not line up with the
    /// declared parameters.
    pub fn new(
        service: &TypeRef,
        alias: Option<&str>,
        method: &MethodRef,
        args: Vec<Value>,
    ) -> Result<Self> {
        Self::with_arg_types(service, alias, method, args, method.params().to_vec())
    }

    /// Like `new`, but with explicit argument types overriding the declared ones.
    pub fn with_arg_types(
        service: &TypeRef,
        alias: Option<&str>,
        method: &MethodRef,
        args: Vec<Value>,
        arg_types: Vec<TypeRef>,
    ) -> Result<Self> {
        check_aligned(Some(arg_types.len()), Some(args.len()))?;
        let mut invocation = Self::named(service.name(), alias.unwrap_or_default(), method.name());
        invocation.resolved_type = Some(Arc::clone(service));
        invocation.resolved_method = Some(Arc::clone(method));
        invocation.arg_type_names = Some(type_names(&arg_types));
        invocation.arg_type_cache = OnceLock::from(arg_types);
        invocation.args = Some(args);
        Ok(invocation)
    }

    // ------------------------------------------------------------------------
    //  Identity fields
    // ------------------------------------------------------------------------

    pub fn target_type_name(&self) -> &str {
        &self.target_type_name
    }

    pub fn set_target_type_name(&mut self, name: impl Into<String>) {
        self.target_type_name = name.into();
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = alias.into();
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn set_method_name(&mut self, name: impl Into<String>) {
        self.method_name = name.into();
    }

    /// Argument type names; empty if never assigned.
    pub fn arg_type_names(&self) -> &[String] {
        self.arg_type_names.as_deref().unwrap_or_default()
    }

    /// Replaces the argument type names and drops the resolved type cache.
    ///
    /// # Errors
    /// Returns `ArgumentCountMismatch` if arguments were already assigned
    /// and their count differs, zero included.
    pub fn set_arg_type_names(&mut self, names: Vec<String>) -> Result<()> {
        check_aligned(Some(names.len()), self.args.as_ref().map(Vec::len))?;
        self.arg_type_names = Some(names);
        self.arg_type_cache = OnceLock::new();
        Ok(())
    }

    /// Replaces the argument types, keeping names and cache in step.
    pub fn set_arg_types(&mut self, types: Vec<TypeRef>) -> Result<()> {
        check_aligned(Some(types.len()), self.args.as_ref().map(Vec::len))?;
        self.arg_type_names = Some(type_names(&types));
        self.arg_type_cache = OnceLock::from(types);
        Ok(())
    }

    /// Argument values; empty if never assigned.
    pub fn args(&self) -> &[Value] {
        self.args.as_deref().unwrap_or_default()
    }

    /// Replaces the argument values.
    ///
    /// # Errors
    /// Returns `ArgumentCountMismatch` if argument types were already
    /// assigned (by construction, `build` or a setter) and their count
    /// differs. A method declaring no parameters accepts no arguments.
    pub fn set_args(&mut self, args: Vec<Value>) -> Result<()> {
        check_aligned(self.arg_type_names.as_ref().map(Vec::len), Some(args.len()))?;
        self.args = Some(args);
        Ok(())
    }

    // ------------------------------------------------------------------------
    //  Resolved metadata
    // ------------------------------------------------------------------------

    pub fn resolved_type(&self) -> Option<&TypeRef> {
        self.resolved_type.as_ref()
    }

    pub fn set_resolved_type(&mut self, ty: TypeRef) {
        self.resolved_type = Some(ty);
    }

    pub fn resolved_method(&self) -> Option<&MethodRef> {
        self.resolved_method.as_ref()
    }

    pub fn set_resolved_method(&mut self, method: MethodRef) {
        self.resolved_method = Some(method);
    }

    pub fn target_object(&self) -> Option<&Arc<dyn ServiceObject>> {
        self.target_object.as_ref()
    }

    pub fn set_target_object(&mut self, target: Arc<dyn ServiceObject>) {
        self.target_object = Some(target);
    }

    /// Returns the argument type metadata, resolving it on first use.
    ///
    /// Taken from the resolved method when there is one, otherwise looked up
    /// by name in `registry`. A failed lookup is reported and not cached.
    ///
    /// # Errors
    /// Returns `ArgumentTypeResolutionFailed` naming the first unknown type.
    pub fn arg_types(&self, registry: &TypeRegistry) -> Result<&[TypeRef]> {
        if let Some(types) = self.arg_type_cache.get() {
            return Ok(types);
        }
        // Computed outside the cell: a racing reader may compute it too, first store wins.
        let types = match &self.resolved_method {
            Some(method) => method.params().to_vec(),
            None => registry.resolve_arg_types(self.arg_type_names())?,
        };
        Ok(self.arg_type_cache.get_or_init(|| types))
    }

    /// Fills unassigned argument type names from cached types or the resolved method.
    pub fn compute_arg_type_names(&mut self) -> &[String] {
        if self.arg_type_names.is_none() {
            if let Some(types) = self.arg_type_cache.get() {
                self.arg_type_names = Some(type_names(types));
            } else if let Some(method) = &self.resolved_method {
                self.arg_type_names = Some(method.param_names());
            }
        }
        self.arg_type_names()
    }

    /// Whether this call is dispatched without static metadata.
    ///
    /// True if the resolved type is the generic service marker, or the
    /// `GENERIC_KEY` attachment is `true`. Memoized on first call.
    pub fn is_generic(&self) -> bool {
        *self.generic_cache.get_or_init(|| {
            let marker = self.resolved_type.as_ref().is_some_and(|t| t.is_generic_marker());
            marker || self.attachment(keys::GENERIC_KEY) == Some(&Value::Bool(true))
        })
    }

    // ------------------------------------------------------------------------
    //  Attachments
    // ------------------------------------------------------------------------

    /// Adds an attachment. `Value::Null` is ignored.
    pub fn add_attachment(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if !value.is_null() {
            self.attachments.get_or_insert_with(BTreeMap::new).insert(key.into(), value);
        }
        self
    }

    /// Adds an attachment only when a value is present.
    pub fn add_optional_attachment<V: Into<Value>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.add_attachment(key, value);
        }
        self
    }

    pub fn add_attachments<K, V, I>(&mut self, entries: I) -> &mut Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in entries {
            self.add_attachment(k, v);
        }
        self
    }

    pub fn attachment(&self, key: &str) -> Option<&Value> {
        self.attachments.as_ref().and_then(|m| m.get(key))
    }

    pub fn attachment_or(&self, key: &str, default: impl Into<Value>) -> Value {
        match self.attachment(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// Returns the attachment under `key`, inserting `f()` first if absent.
    ///
    /// Like `add_attachment`, a `Value::Null` from `f` is not stored; the
    /// call then returns `None` and leaves the map untouched.
    pub fn attachment_or_insert_with(
        &mut self,
        key: impl Into<String>,
        f: impl FnOnce() -> Value,
    ) -> Option<&Value> {
        let key = key.into();
        if self.attachment(&key).is_none() {
            let value = f();
            if value.is_null() {
                return None;
            }
            self.attachments.get_or_insert_with(BTreeMap::new).insert(key.clone(), value);
        }
        self.attachment(&key)
    }

    pub fn remove_attachment(&mut self, key: &str) -> Option<Value> {
        self.attachments.as_mut().and_then(|m| m.remove(key))
    }

    /// The attachment map, if one was ever allocated.
    pub fn attachments(&self) -> Option<&BTreeMap<String, Value>> {
        self.attachments.as_ref()
    }

    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().is_some_and(|m| !m.is_empty())
    }

    // ------------------------------------------------------------------------
    //  Session backfill and dispatch
    // ------------------------------------------------------------------------

    /// Backfills missing identity from an established session.
    ///
    /// Empty type name and alias are taken from the session. Caller identity
    /// is copied only if neither an app id nor an app name is present yet;
    /// existing attachments are never overwritten. `None` is a no-op.
    pub fn apply(&mut self, session: Option<&Session>) {
        let Some(session) = session else { return };

        if self.target_type_name.is_empty() {
            self.target_type_name = session.interface_name.clone();
        }
        if self.alias.is_empty() {
            self.alias = session.alias.clone();
        }
        if self.attachment(keys::HIDDEN_KEY_APPID).is_none()
            && self.attachment(keys::HIDDEN_KEY_APPNAME).is_none()
        {
            self.add_optional_attachment(keys::HIDDEN_KEY_APPID, session.remote_app_id.clone())
                .add_optional_attachment(keys::HIDDEN_KEY_APPNAME, session.remote_app_name.clone())
                .add_optional_attachment(keys::HIDDEN_KEY_APPINSID, session.remote_app_instance.clone());
        }
    }

    /// Runs the resolved method against `target` with this call's arguments.
    pub fn invoke(&self, target: &dyn ServiceObject) -> anyhow::Result<Value> {
        let method = self.resolved_method.as_ref()
            .ok_or_else(|| anyhow!("method {} is not resolved on {}", self.method_name, self.target_type_name))?;
        target.call(method, self.args())
    }

    /// Runs the resolved method against the attached target object.
    pub fn invoke_target(&self) -> anyhow::Result<Value> {
        let target = self.target_object.as_ref()
            .ok_or_else(|| anyhow!("no target object for {}.{}", self.target_type_name, self.method_name))?;
        self.invoke(target.as_ref())
    }

    fn identity_attachments(&self) -> Option<&BTreeMap<String, Value>> {
        self.attachments.as_ref().filter(|m| !m.is_empty())
    }
}

/// Both sides must agree once both are assigned. `None` means not yet assigned.
fn check_aligned(type_count: Option<usize>, arg_count: Option<usize>) -> Result<()> {
    match (type_count, arg_count) {
        (Some(expected), Some(found)) if expected != found => {
            Err(Error::ArgumentCountMismatch { expected, found })
        }
        _ => Ok(()),
    }
}

fn type_names(types: &[TypeRef]) -> Vec<String> {
    types.iter().map(|t| t.name().to_string()).collect()
}

impl PartialEq for Invocation {
    fn eq(&self, other: &Self) -> bool {
        self.target_type_name == other.target_type_name
            && self.alias == other.alias
            && self.method_name == other.method_name
            && self.arg_type_names() == other.arg_type_names()
            && self.args() == other.args()
            && self.identity_attachments() == other.identity_attachments()
    }
}

impl Eq for Invocation {}

impl Hash for Invocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.target_type_name.hash(state);
        self.alias.hash(state);
        self.method_name.hash(state);
        self.arg_type_names().hash(state);
        self.args().hash(state);
        self.identity_attachments().hash(state);
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("target_type_name", &self.target_type_name)
            .field("alias", &self.alias)
            .field("method_name", &self.method_name)
            .field("arg_type_names", &self.arg_type_names())
            .field("args", &self.args())
            .field("attachments", &self.attachments)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}({})", self.target_type_name, self.alias, self.method_name, self.arg_type_names().join(", "))
    }
}
