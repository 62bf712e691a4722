//! # Injection Pipeline
//!
//! An ordered, immutable list of injectors applied to each outgoing call.

use std::any::Any;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use neocall::Invocation;

use crate::injector::Injector;
use crate::injector::Outbound;
use crate::node::Node;

/// Injectors in configuration order, filtered by `Injector::applies`.
#[derive(Clone, Default)]
pub struct Pipeline {
    injectors: Vec<Arc<dyn Injector>>,
}

impl Pipeline {
    /// Assembles a pipeline, keeping order and dropping injectors that do not apply.
    pub fn new(candidates: impl IntoIterator<Item = Arc<dyn Injector>>) -> Self {
        let mut injectors = Vec::new();
        for injector in candidates {
            if injector.applies() {
                injectors.push(injector);
            } else {
                tracing::debug!(injector = injector.name(), "injector does not apply; skipped");
            }
        }
        let pipeline = Self { injectors };
        tracing::debug!(injectors = ?pipeline.names(), "assembled injection pipeline");
        pipeline
    }

    pub fn names(&self) -> Vec<&str> {
        self.injectors.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.injectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.injectors.is_empty()
    }

    /// Runs every injector, in order, against `invocation` bound for `node`.
    ///
    /// Failing injectors are logged and skipped; this never fails the call.
    /// A panicking injector counts as failed. Attachments it wrote before
    /// panicking are kept.
    pub fn inject(&self, invocation: &mut Invocation, node: &Node) {
        let mut target = Outbound::new(invocation);
        for injector in &self.injectors {
            tracing::trace!(injector = injector.name(), %node, "running injector");
            match panic::catch_unwind(AssertUnwindSafe(|| injector.inject(&mut target, node))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(injector = injector.name(), %node, error = %e, "injection failed; continuing");
                }
                Err(payload) => {
                    tracing::warn!(
                        injector = injector.name(),
                        %node,
                        panic = panic_message(payload.as_ref()),
                        "injector panicked; continuing"
                    );
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("injectors", &self.names()).finish()
    }
}
