//! # NeoInject
//!
//! Best-effort enrichment of outgoing invocations.
//!
//! ## Architecture
//!
//! An `Injector` writes attachments onto an outgoing `Invocation` just before
//! it is sent to a destination `Node`. A `Pipeline` runs an ordered list of
//! injectors synchronously on the calling thread; later injectors see what
//! earlier ones wrote. Injectors are looked up by name in an
//! `InjectorRegistry` populated at startup, and the configured order is
//! authoritative.
//!
//! Injection never fails a call: an injector that errors is logged and
//! skipped.

pub mod app;
pub mod context;
pub mod error;
pub mod injector;
pub mod node;
pub mod pipeline;
pub mod registry;
pub mod retry;

pub use app::AppIdentity;
pub use app::AppInjector;
pub use context::RequestContext;
pub use error::Error;
pub use error::Result;
pub use injector::Injector;
pub use injector::Outbound;
pub use node::Node;
pub use pipeline::Pipeline;
pub use registry::InjectorRegistry;
pub use retry::RetryInjector;
