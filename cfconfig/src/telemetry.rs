//! Log setup for applications bootstrapping through this crate.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing` subscriber filtered by `RUST_LOG`, falling
/// back to `info`. Returns `false` if a subscriber was already installed.
pub fn init_tracing(json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(true);
    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_refused() {
        init_tracing(false);
        assert!(!init_tracing(true));
    }
}
