use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Result;

/// Prefix of the environment variables that override [`ResolverSettings`].
pub const SETTINGS_PREFIX: &str = "CFCONFIG";

fn default_marker_var() -> String {
    crate::vcap::VCAP_SERVICES.into()
}

fn default_messaging_label() -> String {
    "p.rabbitmq".into()
}

fn default_database_label() -> String {
    "postgres-db".into()
}

fn default_uri_key() -> String {
    "uri".into()
}

/// Knobs of the resolver. The defaults match a stock Cloud Foundry
/// foundation with RabbitMQ and Postgres tiles.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Variable whose presence means the app runs on the platform.
    #[serde(default = "default_marker_var")]
    pub marker_var: String,
    #[serde(default = "default_messaging_label")]
    pub messaging_label: String,
    #[serde(default = "default_database_label")]
    pub database_label: String,
    /// Credential holding the connection string of a binding.
    #[serde(default = "default_uri_key")]
    pub uri_key: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            marker_var: default_marker_var(),
            messaging_label: default_messaging_label(),
            database_label: default_database_label(),
            uri_key: default_uri_key(),
        }
    }
}

impl ResolverSettings {
    /// Defaults overridden by `CFCONFIG_*` process environment variables,
    /// e.g. `CFCONFIG_MESSAGING_LABEL=rabbitmq`.
    ///
    /// Variables that are not valid unicode are skipped instead of handed to
    /// `config`, whose own environment scan panics on them.
    pub fn new() -> Result<Self> {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .filter(|(k, _)| k.starts_with(SETTINGS_PREFIX))
            .collect();
        Self::from_map(vars)
    }

    /// Same as [`ResolverSettings::new`] but reads the overrides from `vars`
    /// instead of the process environment.
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::build(config::Environment::with_prefix(SETTINGS_PREFIX).source(Some(vars)))
    }

    fn build(source: config::Environment) -> Result<Self> {
        Ok(config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_overrides() {
        let settings = ResolverSettings::from_map(HashMap::new()).unwrap();
        assert_eq!(settings, ResolverSettings::default());
        assert_eq!(settings.marker_var, "VCAP_SERVICES");
        assert_eq!(settings.messaging_label, "p.rabbitmq");
        assert_eq!(settings.database_label, "postgres-db");
    }

    #[test]
    fn prefixed_variables_override() {
        let vars = HashMap::from([
            ("CFCONFIG_MESSAGING_LABEL".to_string(), "rabbitmq".to_string()),
            ("CFCONFIG_MARKER_VAR".to_string(), "CF_INSTANCE_GUID".to_string()),
            ("MESSAGING_LABEL".to_string(), "ignored".to_string()),
        ]);
        let settings = ResolverSettings::from_map(vars).unwrap();
        assert_eq!(settings.messaging_label, "rabbitmq");
        assert_eq!(settings.marker_var, "CF_INSTANCE_GUID");
        assert_eq!(settings.database_label, "postgres-db");
    }
}
