//! Environment variable processing for runtime configuration overrides.
//!
//! Env var prefix: `SAMPLE_RUNNER_`
//!
//! - `SAMPLE_RUNNER_PROFILE`: select a configuration profile
//! - `SAMPLE_RUNNER_TIME`: override the time limit (seconds, float)
//! - `SAMPLE_RUNNER_OUTPUT`: override the output limit (bytes)
//! - `SAMPLE_RUNNER_COMBINE`: override the combine policy (none/ordered/shuffle)
//! - `SAMPLE_RUNNER_SEED`: set the shuffle seed
//! - `SAMPLE_RUNNER_DEBUG_FLAG`: override the debug-symbol build flag
//! - `SAMPLE_RUNNER_VERBOSE`: enable verbose output (1/true/yes)

use super::Config;

const PREFIX: &str = "SAMPLE_RUNNER_";

/// Read the active profile name from `SAMPLE_RUNNER_PROFILE`.
pub fn get_profile_name() -> Option<String> {
    env_str("PROFILE")
}

/// Apply individual env var overrides to a config.
///
/// Each override is applied only if the env var is set and parses correctly.
/// Invalid values are silently ignored.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(val) = env_parse::<f64>("TIME") {
        config.run.time_limit = val;
    }

    if let Some(val) = env_parse::<u64>("OUTPUT") {
        config.run.output_limit = val;
    }

    if let Some(val) = env_parse("COMBINE") {
        config.run.combine = val;
    }

    if let Some(val) = env_parse::<u64>("SEED") {
        config.run.seed = Some(val);
    }

    if let Some(val) = env_str("DEBUG_FLAG") {
        config.toolchain.debug_flag = val;
    }

    if let Some(val) = env_bool("VERBOSE") {
        config.verbose = val;
    }
}

/// Summarize which env var overrides are currently active.
pub fn detect_active_overrides() -> Vec<(String, String)> {
    let keys = ["PROFILE", "TIME", "OUTPUT", "COMBINE", "SEED", "DEBUG_FLAG", "VERBOSE"];

    let mut active = Vec::new();
    for key in keys {
        let full = format!("{PREFIX}{key}");
        if let Ok(val) = std::env::var(&full) {
            if !val.is_empty() {
                active.push((full, val));
            }
        }
    }
    active
}

// --- helpers ---

fn env_str(key: &str) -> Option<String> {
    std::env::var(format!("{PREFIX}{key}"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_str(key).and_then(|s| s.trim().parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).and_then(|s| match s.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    })
}
