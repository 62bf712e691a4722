//! # Reserved Keys
//!
//! Header names understood by the request parser and the attachment keys
//! reserved for runtime metadata.
//!
//! Attachment keys starting with `HIDDEN_PREFIX` are implicit parameters: they
//! travel with the call but are never part of its formal arguments.

/// Leading character marking a hidden (implicit) key.
pub const HIDDEN_PREFIX: char = '_';

/// Header carrying the alias when the path has only two segments.
pub const HEADER_ALIAS: &str = "alias";
/// Header carrying the caller's auth token.
pub const HEADER_TOKEN: &str = "token";
/// Header carrying the caller's application id.
pub const HEADER_APP_ID: &str = "appId";
/// Header carrying the caller's application name.
pub const HEADER_APP_NAME: &str = "appName";
/// Header carrying the caller's application instance id.
pub const HEADER_APP_INSTANCE: &str = "appInsId";

pub const HIDDEN_KEY_TOKEN: &str = "_token";
pub const HIDDEN_KEY_APPID: &str = "_appId";
pub const HIDDEN_KEY_APPNAME: &str = "_appName";
pub const HIDDEN_KEY_APPINSID: &str = "_appInsId";

/// Boolean attachment forcing a call to be treated as generic.
pub const GENERIC_KEY: &str = "_generic";

/// Per-call retry counter, copied from the ambient call context.
pub const INTERNAL_KEY_RETRY_TIMES: &str = "_retryTimes";

/// Returns true if `key` carries the hidden prefix.
pub fn is_hidden(key: &str) -> bool {
    key.starts_with(HIDDEN_PREFIX)
}
