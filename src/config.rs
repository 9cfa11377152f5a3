//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/arbor-sampler/arbor-sampler.toml`
//! 3. Local config: `<dir>/.arbor-sampler.toml`
//! 4. Environment variables: `ARBOR_SAMPLER__<SECTION>__<KEY>`
//!
//! Every layer replaces the values it specifies, including coordinate lists.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{InterpolatableSections, PartitionOptions};

/// Interval creation settings of a sampler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Target interval length (nm)
    pub interval_length: f64,
    /// Boundary error tolerated before new nodes are created (nm)
    pub interval_error: f64,
    /// Create boundary nodes to match the interval length exactly
    pub create_interval_boundaries: bool,
    /// Allow shortening of intervals to minimize error
    pub prefer_smaller_error: bool,
    /// Fraction of the interval length an interval may deviate before it is flagged
    pub max_diff_percent: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_length: 5000.0,
            interval_error: 250.0,
            create_interval_boundaries: false,
            prefer_smaller_error: true,
            max_diff_percent: 0.1,
        }
    }
}

impl SamplerConfig {
    pub fn partition_options(&self) -> PartitionOptions {
        PartitionOptions::new(self.interval_length, self.interval_error)
            .with_prefer_smaller_error(self.prefer_smaller_error)
            .with_node_synthesis(self.create_interval_boundaries)
    }

    pub fn max_diff(&self) -> f64 {
        crate::domain::report::max_diff(self.interval_length, self.max_diff_percent)
    }
}

/// Section interpolation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterpolationConfig {
    /// Place nodes on interpolatable sections at interpolated locations
    pub enabled: bool,
    /// Interpolatable X project coordinates
    pub x: Vec<f64>,
    /// Interpolatable Y project coordinates
    pub y: Vec<f64>,
    /// Interpolatable Z project coordinates
    pub z: Vec<f64>,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            x: vec![],
            y: vec![],
            z: vec![],
        }
    }
}

impl InterpolationConfig {
    /// Sections to interpolate; empty when interpolation is disabled.
    pub fn sections(&self) -> InterpolatableSections {
        if self.enabled {
            InterpolatableSections::new(self.x.clone(), self.y.clone(), self.z.clone())
        } else {
            InterpolatableSections::default()
        }
    }
}

/// Raw sampler config for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSamplerConfig {
    pub interval_length: Option<f64>,
    pub interval_error: Option<f64>,
    pub create_interval_boundaries: Option<bool>,
    pub prefer_smaller_error: Option<bool>,
    pub max_diff_percent: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawInterpolationConfig {
    pub enabled: Option<bool>,
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,
    pub z: Option<Vec<f64>>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub sampler: RawSamplerConfig,
    pub interpolation: RawInterpolationConfig,
}

/// Unified configuration for arbor-sampler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub sampler: SamplerConfig,
    pub interpolation: InterpolationConfig,
}

/// Get the XDG config directory for arbor-sampler.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "arbor-sampler").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("arbor-sampler.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".arbor-sampler.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Parse a comma separated coordinate list such as `"40, 120.5"`.
pub fn parse_coordinate_list(value: &str) -> Result<Vec<f64>, ApplicationError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<f64>().map_err(|e| ApplicationError::Config {
                message: format!("invalid coordinate '{item}': {e}"),
            })
        })
        .collect()
}

impl Settings {
    /// Overlay values that are specified, keep the rest.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let s = &overlay.sampler;
        let i = &overlay.interpolation;
        Self {
            sampler: SamplerConfig {
                interval_length: s.interval_length.unwrap_or(self.sampler.interval_length),
                interval_error: s.interval_error.unwrap_or(self.sampler.interval_error),
                create_interval_boundaries: s
                    .create_interval_boundaries
                    .unwrap_or(self.sampler.create_interval_boundaries),
                prefer_smaller_error: s
                    .prefer_smaller_error
                    .unwrap_or(self.sampler.prefer_smaller_error),
                max_diff_percent: s.max_diff_percent.unwrap_or(self.sampler.max_diff_percent),
            },
            interpolation: InterpolationConfig {
                enabled: i.enabled.unwrap_or(self.interpolation.enabled),
                x: i.x.clone().unwrap_or_else(|| self.interpolation.x.clone()),
                y: i.y.clone().unwrap_or_else(|| self.interpolation.y.clone()),
                z: i.z.clone().unwrap_or_else(|| self.interpolation.z.clone()),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.arbor-sampler.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply ARBOR_SAMPLER__* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("ARBOR_SAMPLER").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<f64>("sampler.interval_length") {
            settings.sampler.interval_length = val;
        }
        if let Ok(val) = config.get::<f64>("sampler.interval_error") {
            settings.sampler.interval_error = val;
        }
        if let Ok(val) = config.get_bool("sampler.create_interval_boundaries") {
            settings.sampler.create_interval_boundaries = val;
        }
        if let Ok(val) = config.get_bool("sampler.prefer_smaller_error") {
            settings.sampler.prefer_smaller_error = val;
        }
        if let Ok(val) = config.get::<f64>("sampler.max_diff_percent") {
            settings.sampler.max_diff_percent = val;
        }
        if let Ok(val) = config.get_bool("interpolation.enabled") {
            settings.interpolation.enabled = val;
        }
        if let Ok(val) = config.get_string("interpolation.x") {
            settings.interpolation.x = parse_coordinate_list(&val)?;
        }
        if let Ok(val) = config.get_string("interpolation.y") {
            settings.interpolation.y = parse_coordinate_list(&val)?;
        }
        if let Ok(val) = config.get_string("interpolation.z") {
            settings.interpolation.z = parse_coordinate_list(&val)?;
        }

        Ok(settings)
    }

    /// Reject values the partitioner cannot work with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        self.sampler
            .partition_options()
            .validate()
            .map_err(|e| ApplicationError::Config {
                message: e.to_string(),
            })?;
        if !self.sampler.max_diff_percent.is_finite() || self.sampler.max_diff_percent < 0.0 {
            return Err(ApplicationError::Config {
                message: format!(
                    "max_diff_percent must not be negative, got {}",
                    self.sampler.max_diff_percent
                ),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# arbor-sampler configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/arbor-sampler/arbor-sampler.toml
#   Local:  <dir>/.arbor-sampler.toml  (select with -C <dir>)
#   Env:    ARBOR_SAMPLER__SAMPLER__INTERVAL_LENGTH=4000 etc.

[sampler]
# Target interval length in nm
# interval_length = 5000.0

# If the boundary error with existing nodes is bigger than this value and
# interval boundary creation is enabled, a new node is created (nm)
# interval_error = 250.0

# Create missing nodes to match the interval length exactly
# create_interval_boundaries = false

# On equal error, end intervals early rather than late
# prefer_smaller_error = true

# Flag intervals deviating by more than this fraction of the interval length
# max_diff_percent = 0.1

[interpolation]
# Place nodes on the sections below at interpolated locations
# enabled = true

# Interpolatable project coordinates per axis
# x = []
# y = []
# z = [4520.0, 4560.0]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_defaults_then_matches_sampler_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.sampler.interval_length, 5000.0);
        assert_eq!(settings.sampler.interval_error, 250.0);
        assert!(settings.interpolation.enabled);
        assert!(settings.interpolation.sections().is_empty());
    }

    #[test]
    fn given_overlay_when_merging_then_replaces_only_specified_values() {
        let raw: RawSettings = toml::from_str(
            r#"
[sampler]
interval_length = 2000.0

[interpolation]
z = [40.0]
"#,
        )
        .unwrap();
        let merged = Settings::default().merge_with(&raw);
        assert_eq!(merged.sampler.interval_length, 2000.0);
        assert_eq!(merged.sampler.interval_error, 250.0);
        assert_eq!(merged.interpolation.z, vec![40.0]);
        assert!(merged.interpolation.x.is_empty());
    }

    #[test]
    fn given_disabled_interpolation_when_building_sections_then_empty() {
        let config = InterpolationConfig {
            enabled: false,
            z: vec![40.0],
            ..Default::default()
        };
        assert!(config.sections().is_empty());
    }

    #[test]
    fn given_comma_list_when_parsing_then_returns_values() {
        assert_eq!(parse_coordinate_list("40, 120.5,").unwrap(), vec![40.0, 120.5]);
        assert!(parse_coordinate_list("").unwrap().is_empty());
        assert!(parse_coordinate_list("4x").is_err());
    }

    #[test]
    fn given_zero_length_when_validating_then_config_error() {
        let mut settings = Settings::default();
        settings.sampler.interval_length = 0.0;
        assert!(matches!(settings.validate(), Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.sampler.interval_length.is_none());
    }
}
