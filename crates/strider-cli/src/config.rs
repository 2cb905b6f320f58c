//! Reads `~/.strider/config.toml` and converts it into runtime settings.
//!
//! A missing file means defaults.  `STRIDER_*` environment variables override
//! whatever was loaded.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use strider_hal::TickConfig;
use strider_runtime::NavConfig;

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Ollama instance.
    pub ollama_url: String,
    /// Vision model used for classification.
    pub vision_model: String,
    pub classification_timeout_secs: u64,
    /// Counted navigation steps before the run ends.
    pub max_steps: u32,
    pub step_interval_ms: u64,
    pub retry_backoff_ms: u64,
    /// Turn rate for turn primitives (rad/s).
    pub yaw_rate: f64,
    pub physics_hz: f64,
    pub render_hz: f64,
    pub camera_width: u32,
    pub camera_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            vision_model: "qwen3-vl:4b".to_string(),
            classification_timeout_secs: 60,
            max_steps: 100,
            step_interval_ms: 1000,
            retry_backoff_ms: 1000,
            yaw_rate: 0.8,
            physics_hz: 500.0,
            render_hz: 50.0,
            camera_width: 512,
            camera_height: 256,
        }
    }
}

impl Config {
    pub fn classification_timeout(&self) -> Duration {
        Duration::from_secs(self.classification_timeout_secs)
    }

    pub fn nav_config(&self) -> NavConfig {
        NavConfig {
            max_steps: self.max_steps,
            step_interval: Duration::from_millis(self.step_interval_ms),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            classification_timeout: self.classification_timeout(),
            yaw_rate: self.yaw_rate,
            ..NavConfig::default()
        }
    }

    pub fn tick_config(&self) -> TickConfig {
        TickConfig::from_rates(self.physics_hz, self.render_hz)
    }

    pub fn camera_resolution(&self) -> (u32, u32) {
        (self.camera_width, self.camera_height)
    }
}

/// Return the path to `~/.strider/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".strider").join("config.toml")
}

/// Load the config with environment overrides applied.  Returns defaults
/// (plus overrides) when the file does not exist.
pub fn load() -> Result<Config, String> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Load the file alone.  Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

/// Apply `STRIDER_*` overrides looked up through `var`.
///
/// | Variable | Config field |
/// |---|---|
/// | `STRIDER_OLLAMA_URL` | `ollama_url` |
/// | `STRIDER_MODEL` | `vision_model` |
/// | `STRIDER_MAX_STEPS` | `max_steps` |
///
/// Unparseable values are ignored.
pub fn apply_env_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("STRIDER_OLLAMA_URL") {
        cfg.ollama_url = v;
    }
    if let Some(v) = var("STRIDER_MODEL") {
        cfg.vision_model = v;
    }
    if let Some(v) = var("STRIDER_MAX_STEPS")
        && let Ok(n) = v.trim().parse::<u32>()
    {
        cfg.max_steps = n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_path_points_to_strider_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.strider/config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "vision_model = \"llava\"\nmax_steps = 7\n").unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.vision_model, "llava");
        assert_eq!(cfg.max_steps, 7);
        assert_eq!(cfg.ollama_url, "http://localhost:11434");
        assert_eq!(cfg.camera_resolution(), (512, 256));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_steps = \"lots\"").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config"));
    }

    #[test]
    fn defaults_survive_toml_roundtrip() {
        let raw = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&raw).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                ("STRIDER_OLLAMA_URL", "http://robot-host:11434"),
                ("STRIDER_MODEL", "llava:7b"),
                ("STRIDER_MAX_STEPS", " 12 "),
            ]),
        );
        assert_eq!(cfg.ollama_url, "http://robot-host:11434");
        assert_eq!(cfg.vision_model, "llava:7b");
        assert_eq!(cfg.max_steps, 12);
    }

    #[test]
    fn invalid_max_steps_override_is_ignored() {
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg, env(&[("STRIDER_MAX_STEPS", "many")]));
        assert_eq!(cfg.max_steps, 100);
    }

    #[test]
    fn converts_into_runtime_settings() {
        let cfg = Config {
            max_steps: 3,
            step_interval_ms: 250,
            yaw_rate: 0.5,
            ..Config::default()
        };
        let nav = cfg.nav_config();
        assert_eq!(nav.max_steps, 3);
        assert_eq!(nav.step_interval, Duration::from_millis(250));
        assert_eq!(nav.classification_timeout, Duration::from_secs(60));
        assert_eq!(nav.yaw_rate, 0.5);
        assert_eq!(nav.stop_settle, Duration::from_secs(2));

        let tick = cfg.tick_config();
        assert_eq!(tick.physics_dt, Duration::from_millis(2));
        assert_eq!(tick.render_every, 10);
    }
}
