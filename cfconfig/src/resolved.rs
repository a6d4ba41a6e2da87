use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::vcap::{Application, Services};

/// Where the configuration was resolved from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnvironmentKind {
    Platform,
    Local,
}

/// Configuration resolved at startup. Read-only once built.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfiguration {
    pub(crate) kind: EnvironmentKind,
    pub(crate) app_name: String,
    pub(crate) vars: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) messaging_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) database_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) application: Option<Application>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) port: Option<u16>,
    pub(crate) services: Services,
}

impl ResolvedConfiguration {
    pub fn kind(&self) -> EnvironmentKind {
        self.kind
    }

    pub fn is_platform(&self) -> bool {
        self.kind == EnvironmentKind::Platform
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Value of a requested key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Connection string of the bound message broker, if any.
    pub fn messaging_uri(&self) -> Option<&str> {
        self.messaging_uri.as_deref()
    }

    /// Connection string of the bound relational database, if any.
    pub fn database_uri(&self) -> Option<&str> {
        self.database_uri.as_deref()
    }

    /// Platform description of the app. `None` outside the platform.
    pub fn application(&self) -> Option<&Application> {
        self.application.as_ref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// All bound services. Empty outside the platform.
    pub fn services(&self) -> &Services {
        &self.services
    }
}
