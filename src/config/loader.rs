use super::{CONFIG_FILE_NAME, Config};
use crate::core::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration loader that supports multiple sources.
pub struct ConfigLoader {
    /// Directory searched for `sample-runner.toml`.
    workdir: Option<PathBuf>,
    /// Path to an explicit standalone config file.
    config_file: Option<PathBuf>,
    /// Whether to apply `SAMPLE_RUNNER_*` env overrides.
    use_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self {
            workdir: None,
            config_file: None,
            use_env: true,
        }
    }

    /// Set the working directory searched for `sample-runner.toml`.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Set a standalone configuration file path.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Disable env var overrides (profile selection included).
    pub fn no_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load configuration from all enabled sources.
    ///
    /// Priority (later sources override earlier):
    /// 1. Default values
    /// 2. Explicit config file, or `sample-runner.toml` in the working directory
    /// 3. Profile overlay (`SAMPLE_RUNNER_PROFILE`)
    /// 4. Individual env var overrides (`SAMPLE_RUNNER_*`)
    pub fn load(self) -> Result<Config> {
        let mut config = Config::default();
        let mut profiles: HashMap<String, serde_json::Value> = HashMap::new();

        let file = match (&self.config_file, &self.workdir) {
            (Some(path), _) => Some(path.clone()),
            (None, Some(dir)) => Some(dir.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
            (None, None) => None,
        };

        if let Some(ref path) = file {
            tracing::debug!(path = %path.display(), "loading config file");
            let value = self.load_toml_file(path)?;
            extract_profiles(&value, &mut profiles);
            config = serde_json::from_value(value)
                .map_err(|e| Error::config(format!("invalid config file {}: {}", path.display(), e)))?;
        }

        if !self.use_env {
            return Ok(config);
        }

        // Apply profile overlay if SAMPLE_RUNNER_PROFILE is set
        if let Some(profile_name) = super::env::get_profile_name() {
            config = apply_profile(config, &profiles, &profile_name)?;
        }

        // Apply individual env var overrides (highest priority)
        super::env::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Read a TOML file into a JSON value so profiles can be deep-merged.
    fn load_toml_file(&self, path: &Path) -> Result<serde_json::Value> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let value: toml::Value = toml::from_str(&content)
            .map_err(|e| Error::config(format!("failed to parse TOML config: {}", e)))?;
        Ok(serde_json::to_value(value)?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge the named profile over `config`.
fn apply_profile(
    config: Config,
    profiles: &HashMap<String, serde_json::Value>,
    profile_name: &str,
) -> Result<Config> {
    let profile_value = profiles.get(profile_name).ok_or_else(|| {
        let mut available: Vec<&str> = profiles.keys().map(|s| s.as_str()).collect();
        available.sort_unstable();
        if available.is_empty() {
            Error::config(format!(
                "profile '{}' not found (no profiles defined)",
                profile_name,
            ))
        } else {
            Error::config(format!(
                "profile '{}' not found. Available profiles: {}",
                profile_name,
                available.join(", "),
            ))
        }
    })?;

    tracing::debug!(profile = profile_name, "applying config profile");

    let mut base_value = serde_json::to_value(&config)
        .map_err(|e| Error::config(format!("failed to serialize config: {}", e)))?;
    deep_merge(&mut base_value, profile_value);
    serde_json::from_value(base_value)
        .map_err(|e| Error::config(format!("failed to apply profile '{}': {}", profile_name, e)))
}

/// Extract profile definitions from a config JSON value.
///
/// Profiles live at `value["profiles"]` as `{ name: { ...config fields... } }`.
fn extract_profiles(
    value: &serde_json::Value,
    profiles: &mut HashMap<String, serde_json::Value>,
) {
    if let Some(serde_json::Value::Object(map)) = value.get("profiles") {
        for (name, profile_value) in map {
            profiles.insert(name.clone(), profile_value.clone());
        }
    }
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Objects: keys are merged recursively (overlay keys win for conflicts).
/// - Scalars and arrays: overlay replaces base entirely.
pub(crate) fn deep_merge(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let entry = base_map
                    .entry(key.clone())
                    .or_insert(serde_json::Value::Null);
                deep_merge(entry, overlay_val);
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombinePolicy;
    use crate::config::env::tests::with_env;

    const PROFILED: &str = r#"
[run]
time-limit = 1.5
combine = "ordered"

[profiles.slow.run]
time-limit = 10.0

[profiles.judge.run]
online-judge = true
"#;

    #[test]
    fn test_load_standalone_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        std::fs::write(&config_path, PROFILED).unwrap();

        let config = ConfigLoader::new()
            .no_env()
            .config_file(&config_path)
            .load()
            .unwrap();

        assert_eq!(config.run.time_limit, 1.5);
        assert_eq!(config.run.combine, CombinePolicy::Ordered);
    }

    #[test]
    fn test_load_from_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "verbose = true\n").unwrap();

        let config = ConfigLoader::new().no_env().workdir(dir.path()).load().unwrap();
        assert!(config.verbose);
    }

    #[test]
    fn test_workdir_without_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new().no_env().workdir(dir.path()).load().unwrap();
        assert_eq!(config.run.time_limit, 2.0);
    }

    #[test]
    fn test_missing_config_file_error() {
        let result = ConfigLoader::new()
            .no_env()
            .config_file("/nonexistent/config.toml")
            .load();
        let err = result.err().expect("should fail");
        assert!(err.to_string().contains("config file"));
    }

    #[test]
    fn test_invalid_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("bad.toml");
        std::fs::write(&config_path, "this is not valid { toml [[[").unwrap();

        let result = ConfigLoader::new().no_env().config_file(&config_path).load();
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_applied_from_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), PROFILED).unwrap();

        with_env(&[("SAMPLE_RUNNER_PROFILE", "slow")], || {
            let config = ConfigLoader::new().workdir(dir.path()).load().unwrap();
            assert_eq!(config.run.time_limit, 10.0);
            // Untouched fields survive the overlay
            assert_eq!(config.run.combine, CombinePolicy::Ordered);
        });
    }

    #[test]
    fn test_env_overrides_profile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), PROFILED).unwrap();

        with_env(
            &[
                ("SAMPLE_RUNNER_PROFILE", "slow"),
                ("SAMPLE_RUNNER_TIME", "3"),
            ],
            || {
                let config = ConfigLoader::new().workdir(dir.path()).load().unwrap();
                assert_eq!(config.run.time_limit, 3.0);
            },
        );
    }

    #[test]
    fn test_unknown_profile_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), PROFILED).unwrap();

        with_env(&[("SAMPLE_RUNNER_PROFILE", "fast")], || {
            let err = ConfigLoader::new()
                .workdir(dir.path())
                .load()
                .err()
                .expect("should fail");
            assert_eq!(
                err.to_string(),
                "Configuration error: profile 'fast' not found. Available profiles: judge, slow"
            );
        });
    }

    #[test]
    fn test_unknown_profile_without_profiles() {
        let dir = tempfile::tempdir().unwrap();

        with_env(&[("SAMPLE_RUNNER_PROFILE", "fast")], || {
            let err = ConfigLoader::new()
                .workdir(dir.path())
                .load()
                .err()
                .expect("should fail");
            assert!(err.to_string().contains("no profiles defined"));
        });
    }

    #[test]
    fn test_deep_merge_objects() {
        let mut base = serde_json::json!({
            "run": { "time-limit": 2.0, "debug": false },
            "verbose": false
        });
        let overlay = serde_json::json!({
            "run": { "debug": true }
        });
        deep_merge(&mut base, &overlay);
        assert_eq!(base["run"]["debug"], true);
        assert_eq!(base["run"]["time-limit"], 2.0);
        assert_eq!(base["verbose"], false);
    }

    #[test]
    fn test_deep_merge_array_replaces() {
        let mut base = serde_json::json!({
            "toolchain": { "targets": [{ "source": "{name}.cpp" }, { "source": "{name}.py" }] }
        });
        let overlay = serde_json::json!({
            "toolchain": { "targets": [{ "source": "{name}.go" }] }
        });
        deep_merge(&mut base, &overlay);
        assert_eq!(
            base["toolchain"]["targets"],
            serde_json::json!([{ "source": "{name}.go" }])
        );
    }

    #[test]
    fn test_extract_profiles_none() {
        let value = serde_json::json!({ "run": { "debug": true } });
        let mut profiles = HashMap::new();
        extract_profiles(&value, &mut profiles);
        assert!(profiles.is_empty());
    }
}
