use std::env;
use std::time::Duration;

use streaming::DEFAULT_MAX_LEVELS;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Client settings, read from `SHAPESHIFTER_*` environment variables.
///
/// Command-line flags override individual values after loading.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub tolerance_end: f64,
    pub tolerance_step: f64,
    pub max_levels: usize,
    pub log_json: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(120),
            tolerance_end: 0.5,
            tolerance_step: 0.05,
            max_levels: DEFAULT_MAX_LEVELS,
            log_json: false,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparseable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: lookup("SHAPESHIFTER_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.api_url),
            timeout: Duration::from_secs(env_var_u64(
                &lookup,
                "SHAPESHIFTER_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
            tolerance_end: env_var_f64(&lookup, "SHAPESHIFTER_TOLERANCE_END", defaults.tolerance_end),
            tolerance_step: env_var_f64(
                &lookup,
                "SHAPESHIFTER_TOLERANCE_STEP",
                defaults.tolerance_step,
            ),
            max_levels: env_var_usize(&lookup, "SHAPESHIFTER_MAX_LEVELS", defaults.max_levels),
            log_json: lookup("SHAPESHIFTER_LOG_JSON")
                .map(|v| env_flag(&v))
                .unwrap_or(defaults.log_json),
        }
    }
}

fn env_var_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_var_usize(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_var_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
