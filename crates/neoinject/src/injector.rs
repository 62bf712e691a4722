//! # Injector Contract
//!
//! ## Invariants
//! - **Attachments Only**: an injector receives an `Outbound` view, which
//!   grants read access to the whole invocation but write access to its
//!   attachments alone. Arguments, argument types and identity names cannot
//!   be changed from here.
//! - **Idempotence**: running an injector twice against the same ambient
//!   context leaves the same attachment values.
//! - **Non-blocking**: injectors run inline on the thread preparing the call.

use neocall::Invocation;
use neocall::Value;

use crate::node::Node;

/// A named mutator applied to outgoing calls.
pub trait Injector: Send + Sync + 'static {
    /// Registry key, also used in logs.
    fn name(&self) -> &str;

    /// Whether this injector takes part at all.
    ///
    /// Evaluated once when a pipeline is assembled, not per call.
    fn applies(&self) -> bool {
        true
    }

    /// Writes zero or more attachments onto the outgoing call.
    ///
    /// An injector that cannot act should return `Ok(())`. An `Err`, or a
    /// panic, is logged by the pipeline and never aborts the call.
    fn inject(&self, target: &mut Outbound<'_>, node: &Node) -> anyhow::Result<()>;
}

/// Attachment-only view of an outgoing invocation.
pub struct Outbound<'a> {
    invocation: &'a mut Invocation,
}

impl<'a> Outbound<'a> {
    pub fn new(invocation: &'a mut Invocation) -> Self {
        Self { invocation }
    }

    pub fn invocation(&self) -> &Invocation {
        &*self.invocation
    }

    pub fn attachment(&self, key: &str) -> Option<&Value> {
        self.invocation.attachment(key)
    }

    /// Writes an attachment, replacing any previous value. `Value::Null` is ignored.
    pub fn set_attachment(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.invocation.add_attachment(key, value);
        self
    }

    /// Writes an attachment unless one is already present. Returns true if written.
    pub fn set_attachment_if_absent(&mut self, key: &str, value: impl Into<Value>) -> bool {
        if self.invocation.attachment(key).is_some() {
            return false;
        }
        let value = value.into();
        if value.is_null() {
            return false;
        }
        self.invocation.add_attachment(key, value);
        true
    }

    pub fn remove_attachment(&mut self, key: &str) -> Option<Value> {
        self.invocation.remove_attachment(key)
    }
}
