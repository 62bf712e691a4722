//! # Request Parsing
//!
//! Turns an inbound path and header set into a resolved `Invocation`.
//!
//! ## Path Layout
//! - `type/alias/method` (further segments are ignored)
//! - `type/method`, with the alias carried by the `alias` header
//!
//! Empty segments (leading, trailing or doubled slashes) are dropped before
//! the layout is decided.

use std::sync::Arc;

use crate::error::Error;
use crate::error::Result;
use crate::headers::Headers;
use crate::invocation::Invocation;
use crate::keys;
use crate::registry::TypeRegistry;

/// Well-known headers and the attachment keys they are copied to.
const WELL_KNOWN: &[(&str, &str)] = &[
    (keys::HEADER_TOKEN, keys::HIDDEN_KEY_TOKEN),
    (keys::HEADER_APP_ID, keys::HIDDEN_KEY_APPID),
    (keys::HEADER_APP_NAME, keys::HIDDEN_KEY_APPNAME),
    (keys::HEADER_APP_INSTANCE, keys::HIDDEN_KEY_APPINSID),
];

/// The three names a request path addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPath<'a> {
    pub target: &'a str,
    pub alias: String,
    pub method: &'a str,
}

impl<'a> CallPath<'a> {
    /// Splits `path` and settles the alias.
    ///
    /// Returns `None` when the path has fewer than two segments, or exactly two
    /// and the `alias` header is absent or empty.
    pub fn parse(path: &'a str, headers: &Headers) -> Option<Self> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match parts.as_slice() {
            [target, alias, method, ..] => Some(Self {
                target: *target,
                alias: alias.to_string(),
                method: *method,
            }),
            [target, method] => {
                let alias = headers.get_text(keys::HEADER_ALIAS).filter(|a| !a.is_empty())?;
                Some(Self { target: *target, alias, method: *method })
            }
            _ => None,
        }
    }
}

impl Invocation {
    /// Builds a resolved invocation from a request path and its headers.
    ///
    /// `malformed` supplies the error returned when the path cannot be
    /// interpreted, so the serving protocol decides what a bad request looks
    /// like on its side.
    ///
    /// Well-known caller headers (token and app identity) are copied to their
    /// reserved attachment keys; every other header whose key carries the
    /// hidden prefix is copied verbatim.
    ///
    /// # Errors
    /// - whatever `malformed` returns, for unusable paths
    /// - `TargetTypeNotFound`, `MethodNotFound`, `MethodOverloadAmbiguous`
    pub fn build<F>(path: &str, headers: &Headers, registry: &TypeRegistry, malformed: F) -> Result<Self>
    where
        F: FnOnce() -> Error,
    {
        let Some(call) = CallPath::parse(path, headers) else {
            tracing::debug!(path, "rejecting malformed request path");
            return Err(malformed());
        };

        let service = registry.resolve(call.target)?;
        let method = service.public_method(call.method)?;

        let mut invocation = Invocation::named(call.target, call.alias, call.method);
        invocation.arg_type_names = Some(method.param_names());
        invocation.arg_type_cache = method.params().to_vec().into();

        for (header, key) in WELL_KNOWN {
            invocation.add_optional_attachment(*key, headers.get_text(header));
        }
        for (key, value) in headers.iter() {
            let key = key.as_text();
            if keys::is_hidden(&key) {
                invocation.add_attachment(key.into_owned(), value.clone());
            }
        }

        invocation.resolved_type = Some(Arc::clone(&service));
        invocation.resolved_method = Some(method);

        tracing::debug!(%invocation, "parsed request");
        Ok(invocation)
    }
}

/// The default error factory: a `MalformedRequest` naming the path.
pub fn malformed_path(path: &str) -> impl FnOnce() -> Error + '_ {
    move || Error::MalformedRequest(format!("cannot derive type/alias/method from path '{}'", path))
}
