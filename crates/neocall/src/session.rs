//! # Sessions
//!
//! Identity established on a logical channel before any call runs on it. A
//! call arriving without its own type name, alias or caller identity can be
//! backfilled from the session (`Invocation::apply`).

/// Read-only identity carried by an established session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub interface_name: String,
    pub alias: String,
    pub remote_app_id: Option<String>,
    pub remote_app_name: Option<String>,
    pub remote_app_instance: Option<String>,
}

impl Session {
    pub fn new(interface_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            alias: alias.into(),
            ..Self::default()
        }
    }

    pub fn remote_app(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        self.remote_app_id = Some(id.into());
        self.remote_app_name = Some(name.into());
        self.remote_app_instance = Some(instance.into());
        self
    }
}
