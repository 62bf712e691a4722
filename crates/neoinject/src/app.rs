//! # Application Identity
//!
//! The local application's identity, and the injector that stamps it onto
//! outgoing calls so the target can tell who is calling.

use neocall::keys::HIDDEN_KEY_APPID;
use neocall::keys::HIDDEN_KEY_APPINSID;
use neocall::keys::HIDDEN_KEY_APPNAME;

use crate::injector::Injector;
use crate::injector::Outbound;
use crate::node::Node;

pub const ENV_APP_ID: &str = "NEOCALL_APP_ID";
pub const ENV_APP_NAME: &str = "NEOCALL_APP_NAME";
pub const ENV_APP_INSTANCE: &str = "NEOCALL_APP_INSTANCE";

/// Who the local application is. Empty values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppIdentity {
    pub app_id: Option<String>,
    pub app_name: Option<String>,
    pub instance_id: Option<String>,
}

impl AppIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_id(mut self, id: impl Into<String>) -> Self {
        self.app_id = non_empty(id.into());
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = non_empty(name.into());
        self
    }

    pub fn instance_id(mut self, id: impl Into<String>) -> Self {
        self.instance_id = non_empty(id.into());
        self
    }

    /// Reads the identity through `lookup`, keyed by the `ENV_*` names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            app_id: lookup(ENV_APP_ID).and_then(non_empty),
            app_name: lookup(ENV_APP_NAME).and_then(non_empty),
            instance_id: lookup(ENV_APP_INSTANCE).and_then(non_empty),
        }
    }

    /// Reads the identity from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// True if an app id or app name is known.
    pub fn is_configured(&self) -> bool {
        self.app_id.is_some() || self.app_name.is_some()
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Stamps the local identity onto outgoing calls.
///
/// Each key is written only if the call does not carry it already, so an
/// identity forwarded from upstream survives.
#[derive(Debug, Clone)]
pub struct AppInjector {
    identity: AppIdentity,
}

impl AppInjector {
    pub fn new(identity: AppIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }
}

impl Injector for AppInjector {
    fn name(&self) -> &str {
        "app"
    }

    fn applies(&self) -> bool {
        self.identity.is_configured()
    }

    fn inject(&self, target: &mut Outbound<'_>, _node: &Node) -> anyhow::Result<()> {
        let fields = [
            (HIDDEN_KEY_APPID, &self.identity.app_id),
            (HIDDEN_KEY_APPNAME, &self.identity.app_name),
            (HIDDEN_KEY_APPINSID, &self.identity.instance_id),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                target.set_attachment_if_absent(key, value.as_str());
            }
        }
        Ok(())
    }
}
