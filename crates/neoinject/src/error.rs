//! # Error Definitions

/// Failures while assembling a pipeline from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No injector is registered under this name.
    UnknownInjector(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownInjector(name) => write!(f, "Unknown injector: {}", name),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
