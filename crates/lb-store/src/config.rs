use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use lb_core::SessionPolicy;
use lb_core::constants::{DEFAULT_MIN_SESSION_SECS, DEFAULT_RADIUS_METERS};

use crate::error::{Result, StoreError};

/// User-tunable settings stored as `config.toml` beside the database.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum dwell before a departure reminder fires.
    pub min_session_secs: u64,
    /// Radius for places added without an explicit one.
    pub default_radius_meters: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_session_secs: DEFAULT_MIN_SESSION_SECS,
            default_radius_meters: DEFAULT_RADIUS_METERS,
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| StoreError::Config(format!("invalid {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let text = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(format!("failed to encode config: {e}")))?;
        fs::write(path, text)
            .map_err(|e| StoreError::Config(format!("failed to write {}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.default_radius_meters.is_finite() || self.default_radius_meters <= 0.0 {
            return Err(StoreError::Config(format!(
                "default_radius_meters must be positive, got {}",
                self.default_radius_meters
            )));
        }
        Ok(())
    }

    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy::new(self.min_session_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("lb-config-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir.join("config.toml")
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_path("missing");
        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.min_session_secs, 30);
        assert_eq!(config.default_radius_meters, 60.0);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("save");
        let config = Config {
            min_session_secs: 120,
            default_radius_meters: 25.0,
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial");
        fs::write(&path, "min_session_secs = 5\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.min_session_secs, 5);
        assert_eq!(config.default_radius_meters, 60.0);
        assert_eq!(config.policy().min_session_secs(), 5);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let path = temp_path("invalid");
        fs::write(&path, "min_session_secs = \"soon\"").unwrap();
        assert!(matches!(Config::load(&path), Err(StoreError::Config(_))));
    }

    #[test]
    fn test_nonpositive_radius_rejected() {
        let path = temp_path("radius");
        fs::write(&path, "default_radius_meters = 0.0").unwrap();
        assert!(Config::load(&path).is_err());

        let bad = Config {
            default_radius_meters: -3.0,
            ..Config::default()
        };
        assert!(bad.save(&path).is_err());
    }
}
