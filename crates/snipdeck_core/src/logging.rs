//! Tracing subscriber setup shared by front ends.

use crate::config::Config;
use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "snipdeck=debug,snipdeck_core=debug,snipdeck_cli=debug"
    } else {
        "snipdeck=warn,snipdeck_core=warn,snipdeck_cli=info"
    }
}

/// Install a compact stderr subscriber filtered by `RUST_LOG` or the
/// config's debug flag.
///
/// # Returns
/// `false` when a global subscriber was already installed.
pub fn init_tracing(config: &Config) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.debug)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .is_ok()
}
