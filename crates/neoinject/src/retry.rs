//! Carries the per-call retry counter onto the outgoing call.

use neocall::keys::INTERNAL_KEY_RETRY_TIMES;

use crate::context::RequestContext;
use crate::injector::Injector;
use crate::injector::Outbound;
use crate::node::Node;

/// Copies `INTERNAL_KEY_RETRY_TIMES` from the ambient context, if set.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryInjector;

impl Injector for RetryInjector {
    fn name(&self) -> &str {
        "retry"
    }

    fn inject(&self, target: &mut Outbound<'_>, _node: &Node) -> anyhow::Result<()> {
        if let Some(retries) = RequestContext::current_attachment(INTERNAL_KEY_RETRY_TIMES) {
            target.set_attachment(INTERNAL_KEY_RETRY_TIMES, retries);
        }
        Ok(())
    }
}
