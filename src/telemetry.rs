use tracing_subscriber::{EnvFilter, fmt};

use crate::config::EnvVars;

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter;
/// `LOG_FORMAT=json` switches to one JSON object per line.
pub fn init(env: &EnvVars) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let builder = fmt().with_env_filter(filter).with_target(false);

    if wants_json(env) {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn wants_json(env: &EnvVars) -> bool {
    env.get("LOG_FORMAT")
        .is_some_and(|v| v.eq_ignore_ascii_case("json"))
}
