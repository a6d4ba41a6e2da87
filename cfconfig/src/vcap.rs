//! Cloud Foundry platform metadata.
//!
//! The platform describes the running application in `VCAP_APPLICATION` and
//! the bound services in `VCAP_SERVICES`. Both are JSON documents. Service
//! credentials stay loosely typed and are only narrowed on access.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::environment::EnvSource;
use crate::error::{ConfigError, Result};

pub const VCAP_APPLICATION: &str = "VCAP_APPLICATION";
pub const VCAP_SERVICES: &str = "VCAP_SERVICES";
pub const PORT: &str = "PORT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub mem: Option<u64>,
    #[serde(default)]
    pub disk: Option<u64>,
    #[serde(default)]
    pub fds: Option<u64>,
}

/// Contents of `VCAP_APPLICATION`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, skip_serializing)]
    application_name: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub application_uris: Vec<String>,
    #[serde(default)]
    pub application_version: Option<String>,
    #[serde(default)]
    pub space_id: Option<String>,
    #[serde(default)]
    pub space_name: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub instance_index: Option<u32>,
    #[serde(default)]
    pub limits: Option<Limits>,
}

impl Application {
    /// Application name. Older platforms only send `application_name`.
    pub fn name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.application_name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// One bound service instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub credentials: Map<String, Value>,
}

impl Service {
    /// Returns the credential `key` as a string.
    pub fn credential_str(&self, key: &str) -> Result<&str> {
        match self.credentials.get(key) {
            None | Some(Value::Null) => Err(ConfigError::MissingCredential {
                service: self.name.clone(),
                key: key.to_string(),
            }),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(ConfigError::CredentialType {
                service: self.name.clone(),
                key: key.to_string(),
                expected: "string",
            }),
        }
    }
}

/// Bound services keyed by label, as found in `VCAP_SERVICES`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Services(BTreeMap<String, Vec<Service>>);

impl Services {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ConfigError::MalformedPlatformMetadata {
            variable: VCAP_SERVICES,
            reason: e.to_string(),
        })
    }

    fn all(&self) -> impl Iterator<Item = &Service> {
        self.0.values().flatten()
    }

    pub fn with_label(&self, label: &str) -> Vec<&Service> {
        self.all().filter(|s| s.label == label).collect()
    }

    pub fn with_name(&self, name: &str) -> Option<&Service> {
        self.all().find(|s| s.name == name)
    }

    pub fn with_tag(&self, tag: &str) -> Vec<&Service> {
        self.all().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    /// Number of bound service instances.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the platform tells the application about itself.
#[derive(Debug, Clone)]
pub struct PlatformMetadata {
    pub application: Application,
    pub services: Services,
    pub port: Option<u16>,
}

impl PlatformMetadata {
    /// Reads `VCAP_APPLICATION`, `VCAP_SERVICES` and `PORT`.
    ///
    /// Unlike go-cfenv, an application without a name is rejected since the
    /// name is the one thing the resolver takes from it. An unset
    /// `VCAP_SERVICES` means no bindings; one that is set but empty or not
    /// valid unicode is malformed.
    pub fn from_env(env: &dyn EnvSource) -> Result<Self> {
        let raw_app = env
            .var(VCAP_APPLICATION)
            .ok_or_else(|| ConfigError::MalformedPlatformMetadata {
                variable: VCAP_APPLICATION,
                reason: "variable is not set".into(),
            })?;
        let application: Application =
            serde_json::from_str(&raw_app).map_err(|e| ConfigError::MalformedPlatformMetadata {
                variable: VCAP_APPLICATION,
                reason: e.to_string(),
            })?;
        if application.name().is_none() {
            return Err(ConfigError::MalformedPlatformMetadata {
                variable: VCAP_APPLICATION,
                reason: "application name is missing".into(),
            });
        }

        let services = match env.var(VCAP_SERVICES) {
            Some(raw) => Services::parse(&raw)?,
            None if env.contains(VCAP_SERVICES) => {
                return Err(ConfigError::MalformedPlatformMetadata {
                    variable: VCAP_SERVICES,
                    reason: "value is not valid unicode".into(),
                })
            }
            None => Services::default(),
        };
        let port = env.var(PORT).and_then(|p| p.trim().parse().ok());

        Ok(Self {
            application,
            services,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MapEnv;

    const SERVICES: &str = r#"{
        "p.rabbitmq": [
            {"name": "events", "label": "p.rabbitmq", "tags": ["rabbitmq", "amqp"],
             "plan": "single-node", "credentials": {"uri": "amqp://events", "port": 5672}}
        ],
        "postgres-db": [
            {"name": "main-db", "label": "postgres-db", "tags": ["postgres"],
             "credentials": {"uri": "postgres://main"}}
        ]
    }"#;

    #[test]
    fn lookup_by_label_name_and_tag() {
        let services = Services::parse(SERVICES).unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services.with_label("p.rabbitmq")[0].name, "events");
        assert!(services.with_label("redis").is_empty());
        assert_eq!(services.with_name("main-db").unwrap().label, "postgres-db");
        assert_eq!(services.with_tag("amqp").len(), 1);
    }

    #[test]
    fn credential_types_are_checked() {
        let services = Services::parse(SERVICES).unwrap();
        let rmq = services.with_name("events").unwrap();
        assert_eq!(rmq.credential_str("uri").unwrap(), "amqp://events");
        assert!(matches!(
            rmq.credential_str("port"),
            Err(ConfigError::CredentialType { expected: "string", .. })
        ));
        assert!(matches!(
            rmq.credential_str("password"),
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn empty_services_document() {
        assert!(Services::parse("{}").unwrap().is_empty());
        for raw in ["", "  "] {
            assert!(matches!(
                Services::parse(raw),
                Err(ConfigError::MalformedPlatformMetadata { variable: VCAP_SERVICES, .. })
            ));
        }
    }

    #[test]
    fn malformed_services_document() {
        let err = Services::parse("{not json").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MalformedPlatformMetadata { variable: VCAP_SERVICES, .. }
        ));
    }

    #[test]
    fn application_accepts_both_name_fields() {
        let app: Application =
            serde_json::from_str(r#"{"name": "a", "application_name": "a"}"#).unwrap();
        assert_eq!(app.name(), Some("a"));
        let app: Application = serde_json::from_str(r#"{"application_name": "b"}"#).unwrap();
        assert_eq!(app.name(), Some("b"));
    }

    #[test]
    fn metadata_from_env() {
        let env = MapEnv::new()
            .with(VCAP_APPLICATION, r#"{"name": "billing", "space_name": "prod", "instance_index": 2}"#)
            .with(VCAP_SERVICES, SERVICES)
            .with(PORT, "8080");
        let meta = PlatformMetadata::from_env(&env).unwrap();
        assert_eq!(meta.application.name(), Some("billing"));
        assert_eq!(meta.application.space_name.as_deref(), Some("prod"));
        assert_eq!(meta.application.instance_index, Some(2));
        assert_eq!(meta.port, Some(8080));
        assert_eq!(meta.services.len(), 2);
    }

    #[test]
    fn metadata_requires_application() {
        let env = MapEnv::new().with(VCAP_SERVICES, "{}");
        assert!(matches!(
            PlatformMetadata::from_env(&env),
            Err(ConfigError::MalformedPlatformMetadata { variable: VCAP_APPLICATION, .. })
        ));

        let env = env.with(VCAP_APPLICATION, r#"{"space_name": "prod"}"#);
        assert!(PlatformMetadata::from_env(&env).is_err());
    }
}
