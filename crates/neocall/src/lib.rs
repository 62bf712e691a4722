//! # NeoCall
//!
//! The in-memory descriptor of a single remote call.
//!
//! ## Architecture
//!
//! An `Invocation` names a target service type, an alias (group/variant) and a
//! method, and carries ordered argument types, argument values, and sparse
//! out-of-band attachments. It is produced either directly on the caller side
//! from resolved metadata (`Invocation::new`) or on the serving side by parsing
//! a path and a header set (`Invocation::build`). Dispatch, serialization and
//! result caching consume it afterwards; its `Eq + Hash` identity is the cache
//! key contract.
//!
//! Type metadata lives in a `TypeRegistry` populated at startup. Nothing here
//! performs I/O.

pub mod error;
pub mod headers;
pub mod invocation;
pub mod keys;
pub mod registry;
pub mod request;
pub mod session;
pub mod value;

pub use error::Error;
pub use error::Result;
pub use headers::HeaderKey;
pub use headers::Headers;
pub use invocation::Invocation;
pub use registry::MethodDescriptor;
pub use registry::MethodRef;
pub use registry::ServiceObject;
pub use registry::TypeDescriptor;
pub use registry::TypeKind;
pub use registry::TypeRef;
pub use registry::TypeRegistry;
pub use registry::Visibility;
pub use session::Session;
pub use value::Value;

#[cfg(test)]
mod tests;
