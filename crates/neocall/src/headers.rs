//! # Request Headers
//!
//! A case-preserving header set whose keys arrive either as text or as raw
//! bytes. Lookups compare key bytes exactly; no case folding is applied.

use std::borrow::Cow;

use crate::value::Value;

/// A header name as it arrived on the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderKey {
    Text(String),
    Bytes(Vec<u8>),
}

impl HeaderKey {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HeaderKey::Text(s) => s.as_bytes(),
            HeaderKey::Bytes(b) => b,
        }
    }

    /// The key as text; byte keys are decoded lossily.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            HeaderKey::Text(s) => Cow::Borrowed(s),
            HeaderKey::Bytes(b) => String::from_utf8_lossy(b),
        }
    }
}

impl From<&str> for HeaderKey {
    fn from(k: &str) -> Self { HeaderKey::Text(k.to_string()) }
}

impl From<String> for HeaderKey {
    fn from(k: String) -> Self { HeaderKey::Text(k) }
}

impl From<&[u8]> for HeaderKey {
    fn from(k: &[u8]) -> Self { HeaderKey::Bytes(k.to_vec()) }
}

impl From<Vec<u8>> for HeaderKey {
    fn from(k: Vec<u8>) -> Self { HeaderKey::Bytes(k) }
}

/// Insertion-ordered request headers.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(HeaderKey, Value)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing an existing one with byte-identical key.
    pub fn insert(&mut self, key: impl Into<HeaderKey>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.as_bytes() == key.as_bytes()) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Builder-style `insert`.
    pub fn with(mut self, key: impl Into<HeaderKey>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter()
            .find(|(k, _)| k.as_bytes() == name.as_bytes())
            .map(|(_, v)| v)
    }

    /// Reads a header as text. Absent headers and non-scalar values yield `None`.
    pub fn get_text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(Value::to_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<HeaderKey>, V: Into<Value>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}
