//! World configuration and settings-file loading.
//!
//! Settings are read once at startup. JSON and YAML are both accepted; the
//! format is picked from the file extension, falling back to JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating world configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
}

/// World dimensions and simulation tick rates consumed by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the square world, in world units.
    #[serde(alias = "WorldSize")]
    pub world_size: i32,
    /// Side length of one grid cell.
    pub cell_size: i32,
    /// Current simulation tick rate (can be raised or lowered at runtime).
    pub ticks_per_second: f32,
    /// Reference tick rate that entity speeds are tuned for.
    pub base_tick_rate: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        // 50 suits a 5000x5000 map with 32px sprites.
        Self {
            world_size: 5000,
            cell_size: 50,
            ticks_per_second: 30.0,
            base_tick_rate: 30.0,
        }
    }
}

impl WorldConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            _ => Self::from_json_str(&text)?,
        };
        tracing::debug!(path = %path.display(), ?config, "loaded world config");
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes and rates that would make the grid or tick math meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, f64); 4] = [
            ("world_size", self.world_size as f64),
            ("cell_size", self.cell_size as f64),
            ("ticks_per_second", self.ticks_per_second as f64),
            ("base_tick_rate", self.base_tick_rate as f64),
        ];
        for (field, value) in checks {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }

    /// Number of cells along one side: `ceil(world_size / cell_size)`.
    pub fn grid_dimension(&self) -> usize {
        (self.world_size as usize).div_ceil(self.cell_size as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_sizing() {
        let c = WorldConfig::default();
        assert_eq!(c.world_size, 5000);
        assert_eq!(c.cell_size, 50);
        assert_eq!(c.grid_dimension(), 100);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn dimension_rounds_up() {
        let c = WorldConfig {
            world_size: 1020,
            cell_size: 50,
            ..WorldConfig::default()
        };
        assert_eq!(c.grid_dimension(), 21);
    }

    #[test]
    fn json_accepts_prototype_key_and_fills_defaults() {
        let c = WorldConfig::from_json_str(r#"{ "WorldSize": 2000 }"#).unwrap();
        assert_eq!(c.world_size, 2000);
        assert_eq!(c.cell_size, 50);
        assert_eq!(c.ticks_per_second, 30.0);
    }

    #[test]
    fn yaml_round_trip_fields() {
        let c = WorldConfig::from_yaml_str("world_size: 800\ncell_size: 40\n").unwrap();
        assert_eq!(c.world_size, 800);
        assert_eq!(c.cell_size, 40);
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let err = WorldConfig::from_json_str(r#"{ "cell_size": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotPositive {
                field: "cell_size",
                ..
            }
        ));
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("Settings.json");
        let mut f = std::fs::File::create(&json_path).unwrap();
        writeln!(f, r#"{{ "world_size": 1000, "cell_size": 25 }}"#).unwrap();
        let c = WorldConfig::load(&json_path).unwrap();
        assert_eq!(c.grid_dimension(), 40);

        let yaml_path = dir.path().join("settings.yaml");
        std::fs::write(&yaml_path, "world_size: 300\n").unwrap();
        let c = WorldConfig::load(&yaml_path).unwrap();
        assert_eq!(c.world_size, 300);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorldConfig::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
