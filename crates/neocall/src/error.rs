//! # Error Definitions
//!
//! Failures raised while constructing or resolving an invocation.

/// Construction and resolution failures.
///
/// All of these surface synchronously to the caller; none are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request path has fewer than two segments, or two segments and no alias.
    MalformedRequest(String),
    /// The target type name is not registered.
    TargetTypeNotFound(String),
    /// No public method with the given name exists on the type.
    MethodNotFound { type_name: String, method: String },
    /// More than one public method shares the name.
    MethodOverloadAmbiguous { type_name: String, method: String, count: usize },
    /// A declared argument type name does not resolve back to type metadata.
    ArgumentTypeResolutionFailed(String),
    /// Argument values and argument types disagree in length.
    ArgumentCountMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedRequest(msg) => write!(f, "Malformed request: {}", msg),
            Self::TargetTypeNotFound(name) => write!(f, "Target type not found: {}", name),
            Self::MethodNotFound { type_name, method } => {
                write!(f, "Method not found: {}.{}", type_name, method)
            }
            Self::MethodOverloadAmbiguous { type_name, method, count } => {
                write!(f, "Method {}.{} is overloaded ({} public candidates)", type_name, method, count)
            }
            Self::ArgumentTypeResolutionFailed(name) => {
                write!(f, "Argument type could not be resolved: {}", name)
            }
            Self::ArgumentCountMismatch { expected, found } => {
                write!(f, "Argument count mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for Error {}

/// A specialized Result type for invocation construction.
pub type Result<T> = std::result::Result<T, Error>;
