//! # Ambient Request Context
//!
//! Per-call scalars (retry counter, trace ids, ...) visible to everything
//! running on behalf of the current call, without threading them through
//! every signature.
//!
//! The context lives in a task-local slot. It is installed for the extent of a
//! closure (`scope_sync`) or a future (`scope`), and injectors only ever read it.

use std::collections::HashMap;
use std::future::Future;

use neocall::Value;

tokio::task_local! {
    static CURRENT: RequestContext;
}

/// Ambient state of the call being prepared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    attachments: HashMap<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attachment(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attachment(key, value);
        self
    }

    pub fn set_attachment(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attachments.insert(key.into(), value.into());
    }

    pub fn attachment(&self, key: &str) -> Option<&Value> {
        self.attachments.get(key)
    }

    /// Runs `f` with this context installed as the current one.
    pub fn scope_sync<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }

    /// Drives `fut` with this context installed as the current one.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// Runs `f` against the current context, or returns `None` outside any scope.
    pub fn with_current<R>(f: impl FnOnce(&RequestContext) -> R) -> Option<R> {
        CURRENT.try_with(f).ok()
    }

    /// Reads one attachment from the current context.
    pub fn current_attachment(key: &str) -> Option<Value> {
        Self::with_current(|ctx| ctx.attachment(key).cloned()).flatten()
    }
}
