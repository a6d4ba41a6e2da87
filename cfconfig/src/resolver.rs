//! Picks between the platform and the local development setup and resolves
//! the requested keys against it.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use crate::config::ResolverSettings;
use crate::environment::{EnvSource, OsEnv};
use crate::error::{ConfigError, Result};
use crate::request::{Requested, RequestedKey};
use crate::resolved::{EnvironmentKind, ResolvedConfiguration};
use crate::vcap::{PlatformMetadata, Services};

#[derive(Debug, Clone, Default)]
pub struct EnvironmentResolver {
    settings: ResolverSettings,
}

impl EnvironmentResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }

    /// Resolves `requested` against the process environment.
    pub fn resolve(
        &self,
        local_app_name: &str,
        requested: &Requested,
    ) -> Result<ResolvedConfiguration> {
        self.resolve_from(&OsEnv, local_app_name, requested)
    }

    /// Resolves `requested` against `env`.
    ///
    /// If the marker variable is set the platform metadata provides the app
    /// name and every key must be present in `env`. Otherwise
    /// `local_app_name` is used and keys with a development fallback take it
    /// without looking at `env`. In both cases all missing keys are reported
    /// together.
    pub fn resolve_from(
        &self,
        env: &dyn EnvSource,
        local_app_name: &str,
        requested: &Requested,
    ) -> Result<ResolvedConfiguration> {
        if env.contains(&self.settings.marker_var) {
            self.resolve_platform(env, requested)
        } else {
            self.resolve_local(env, local_app_name, requested)
        }
    }

    fn resolve_platform(
        &self,
        env: &dyn EnvSource,
        requested: &Requested,
    ) -> Result<ResolvedConfiguration> {
        info!(marker = %self.settings.marker_var, "loading environment variables in platform setup");

        let meta = PlatformMetadata::from_env(env).inspect_err(|err| {
            error!(%err, "cannot load system variables from the platform");
        })?;
        let app_name = meta.application.name().unwrap_or_default().to_string();

        let vars = collect_vars(requested, |req| {
            info!(key = %req.key(), source = "platform", "loading variable");
            env.var(req.key())
        })?;

        let messaging_uri = self.binding_uri(&meta.services, &self.settings.messaging_label)?;
        let database_uri = self.binding_uri(&meta.services, &self.settings.database_label)?;

        Ok(ResolvedConfiguration {
            kind: EnvironmentKind::Platform,
            app_name,
            vars,
            messaging_uri,
            database_uri,
            application: Some(meta.application),
            port: meta.port,
            services: meta.services,
        })
    }

    fn resolve_local(
        &self,
        env: &dyn EnvSource,
        local_app_name: &str,
        requested: &Requested,
    ) -> Result<ResolvedConfiguration> {
        info!("loading environment variables in local setup");

        let vars = collect_vars(requested, |req| match req.dev_fallback() {
            Some(fallback) => {
                info!(key = %req.key(), source = "fallback", "loading variable");
                Some(fallback.to_string())
            }
            None => {
                info!(key = %req.key(), source = "os", "loading variable");
                env.var(req.key())
            }
        })?;

        Ok(ResolvedConfiguration {
            kind: EnvironmentKind::Local,
            app_name: local_app_name.to_string(),
            vars,
            messaging_uri: None,
            database_uri: None,
            application: None,
            port: None,
            services: Services::default(),
        })
    }

    /// Connection string of the first binding carrying `label`.
    fn binding_uri(&self, services: &Services, label: &str) -> Result<Option<String>> {
        let bindings = services.with_label(label);
        let Some(first) = bindings.first() else {
            return Ok(None);
        };
        if bindings.len() > 1 {
            warn!(
                label = %label,
                count = bindings.len(),
                service = %first.name,
                "multiple bindings discovered, using the first one"
            );
        }
        let uri = first.credential_str(&self.settings.uri_key)?;
        info!(label = %label, service = %first.name, "service binding found");
        Ok(Some(uri.to_string()))
    }
}

/// Looks up every requested key and fails with all missing keys at once.
fn collect_vars<F>(requested: &Requested, mut lookup: F) -> Result<BTreeMap<String, String>>
where
    F: FnMut(&RequestedKey) -> Option<String>,
{
    let mut vars: BTreeMap<String, String> = BTreeMap::new();
    let mut missing: Vec<String> = Vec::new();

    for req in requested {
        if vars.contains_key(req.key()) || missing.iter().any(|m| m == req.key()) {
            warn!(key = %req.key(), "key requested more than once");
            continue;
        }
        match lookup(req) {
            Some(value) => {
                vars.insert(req.key().to_string(), value);
            }
            None => missing.push(req.key().to_string()),
        }
    }

    if !missing.is_empty() {
        error!(missing = ?missing, "missing environment variables");
        return Err(ConfigError::MissingConfiguration { keys: missing });
    }
    Ok(vars)
}

/// Resolves `requested` against the process environment with settings taken
/// from [`ResolverSettings::new`].
pub fn load_environment(
    local_app_name: &str,
    requested: &Requested,
) -> Result<ResolvedConfiguration> {
    EnvironmentResolver::new(ResolverSettings::new()?).resolve(local_app_name, requested)
}
