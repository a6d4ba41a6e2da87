//! Startup configuration for services that run both on Cloud Foundry and on
//! a developer machine. On the platform the app name and service bindings
//! come from `VCAP_APPLICATION`/`VCAP_SERVICES`; locally the caller supplies
//! the app name and optional fallback values per key.

pub mod config;
pub mod environment;
pub mod error;
pub mod request;
pub mod resolved;
pub mod resolver;
pub mod telemetry;
pub mod vcap;

pub use crate::config::ResolverSettings;
pub use crate::environment::{EnvSource, MapEnv, OsEnv};
pub use crate::error::{ConfigError, Result};
pub use crate::request::{Requested, RequestedKey};
pub use crate::resolved::{EnvironmentKind, ResolvedConfiguration};
pub use crate::resolver::{load_environment, EnvironmentResolver};
