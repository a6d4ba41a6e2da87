use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variables: {}. Cannot start", .keys.join(", "))]
    MissingConfiguration { keys: Vec<String> },
    #[error("Cannot load {variable} from the platform: {reason}")]
    MalformedPlatformMetadata {
        variable: &'static str,
        reason: String,
    },
    #[error("Service binding '{service}' has no '{key}' credential")]
    MissingCredential { service: String, key: String },
    #[error("Credential '{key}' of service binding '{service}' is not a {expected}")]
    CredentialType {
        service: String,
        key: String,
        expected: &'static str,
    },
    #[error("Resolver settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_every_key() {
        let err = ConfigError::MissingConfiguration {
            keys: vec!["API_TOKEN".into(), "QUEUE_NAME".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing environment variables: API_TOKEN, QUEUE_NAME. Cannot start"
        );
    }
}
