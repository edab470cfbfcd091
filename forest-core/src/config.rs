//! Tunable parameters for tree generation, incremental growth and density
//! fields, loadable from a TOML file.
//!
//! Every section has a [`Default`] and missing keys fall back to it, so a
//! config file only needs to name what it overrides:
//!
//! ```toml
//! [fractal]
//! min_splits = 2
//! max_splits = 2
//!
//! [field]
//! falloff = 0.25
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{error::ConfigError, forest::DEFAULT_SPAWN_CANDIDATES};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub fractal: FractalConfig,
    pub growth: GrowthConfig,
    pub field: FieldConfig,
    pub forest: ForestConfig,
}

/// One-shot fractal generation.
///
/// Angles are in degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FractalConfig {
    pub min_splits: u32,
    pub max_splits: u32,
    /// Length multiplier applied per generation.
    pub length_decay: f32,
    /// Jitter bound for branch directions at depth 0.
    pub max_rotation_angle: f32,
    /// Jitter bound for the trunk direction.
    pub max_rotation_angle_base: f32,
    pub angle_increase_per_depth: f32,
    /// Vertices per surface ring.
    pub vertices_count: usize,
    pub min_starting_width: f32,
    pub max_starting_width: f32,
    pub min_starting_length: f32,
    pub max_starting_length: f32,
    pub min_depth: u32,
    pub max_depth: u32,
}

impl Default for FractalConfig {
    fn default() -> Self {
        Self {
            min_splits: 2,
            max_splits: 3,
            length_decay: 0.9,
            max_rotation_angle: 30.0,
            max_rotation_angle_base: 10.0,
            angle_increase_per_depth: 10.0,
            vertices_count: 8,
            min_starting_width: 0.1,
            max_starting_width: 0.5,
            min_starting_length: 0.5,
            max_starting_length: 1.0,
            min_depth: 1,
            max_depth: 5,
        }
    }
}

/// Incremental growth. Percentages are fractions (`0.05` is 5%).
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GrowthConfig {
    pub extra_width_percent_to_branch: f32,
    pub percent_length_increase: f32,
    pub percent_width_increase: f32,
    /// Per-tree variation applied to the three percentages above.
    pub random_growth_factor: f32,
    /// Jitter bound in degrees for new branch directions.
    pub max_rotation_offset: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            extra_width_percent_to_branch: 0.25,
            percent_length_increase: 0.05,
            percent_width_increase: 0.05,
            random_growth_factor: 0.1,
            max_rotation_offset: 10.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    pub width: u32,
    pub height: u32,
    pub falloff: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            falloff: 0.1,
        }
    }
}

/// Spawn placement.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    /// Half extent of the square ground area trees spawn in.
    pub max_generation_distance: f32,
    /// Candidates tried per spawn.
    pub spawn_candidates: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            max_generation_distance: 10.0,
            spawn_candidates: DEFAULT_SPAWN_CANDIDATES,
        }
    }
}

impl Config {
    /// Parses a config from TOML text and validates it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&s)?;
        log::debug!(target: "config", "loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Checks the ranges the generators rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.fractal;
        if f.min_splits == 0 || f.min_splits > f.max_splits {
            return Err(invalid(format!(
                "fractal splits range {}..={} must be non-empty and start at 1 or more",
                f.min_splits, f.max_splits
            )));
        }
        if f.vertices_count < 3 {
            return Err(invalid(format!(
                "fractal.vertices_count must be at least 3, got {}",
                f.vertices_count
            )));
        }
        if f.min_depth > f.max_depth {
            return Err(invalid(format!(
                "fractal depth range {}..={} is empty",
                f.min_depth, f.max_depth
            )));
        }
        if !(f.length_decay > 0.0) {
            return Err(invalid("fractal.length_decay must be positive".into()));
        }
        if f.min_starting_width <= 0.0 || f.min_starting_length <= 0.0 {
            return Err(invalid("fractal starting width and length must be positive".into()));
        }
        finite("fractal.length_decay", f.length_decay)?;
        finite("fractal.min_starting_width", f.min_starting_width)?;
        finite("fractal.min_starting_length", f.min_starting_length)?;
        finite("fractal.max_starting_width", f.max_starting_width)?;
        finite("fractal.max_starting_length", f.max_starting_length)?;
        finite("fractal.max_rotation_angle", f.max_rotation_angle)?;
        finite("fractal.max_rotation_angle_base", f.max_rotation_angle_base)?;
        finite("fractal.angle_increase_per_depth", f.angle_increase_per_depth)?;

        let g = &self.growth;
        if !(0.0..1.0).contains(&g.random_growth_factor) {
            return Err(invalid(format!(
                "growth.random_growth_factor must be in [0, 1), got {}",
                g.random_growth_factor
            )));
        }
        finite("growth.max_rotation_offset", g.max_rotation_offset)?;

        let d = &self.field;
        if d.width == 0 || d.height == 0 {
            return Err(invalid("field dimensions must be non-zero".into()));
        }
        if !(d.falloff > 0.0 && d.falloff.is_finite()) {
            return Err(invalid(format!(
                "field.falloff must be positive and finite, got {}",
                d.falloff
            )));
        }

        finite("forest.max_generation_distance", self.forest.max_generation_distance)?;
        if self.forest.spawn_candidates == 0 {
            return Err(invalid("forest.spawn_candidates must be at least 1".into()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

/// Angles and distances feed `random_range` bounds, which must be finite.
fn finite(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let cfg = Config::from_toml_str(
            r#"
            [fractal]
            min_splits = 2
            max_splits = 2

            [field]
            falloff = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(cfg.fractal.min_splits, 2);
        assert_eq!(cfg.fractal.max_splits, 2);
        assert_eq!(cfg.fractal.length_decay, FractalConfig::default().length_decay);
        assert_eq!(cfg.field.falloff, 0.5);
        assert_eq!(cfg.field.width, 256);
        assert_eq!(cfg.growth, GrowthConfig::default());
    }

    #[test]
    fn inverted_split_range_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            [fractal]
            min_splits = 4
            max_splits = 2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_falloff_is_rejected() {
        let mut cfg = Config::default();
        cfg.field.falloff = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let cases = [
            "[fractal]\nmax_rotation_angle = nan\n",
            "[fractal]\nmax_rotation_angle_base = inf\n",
            "[fractal]\nangle_increase_per_depth = -inf\n",
            "[fractal]\nmax_starting_width = inf\n",
            "[growth]\nmax_rotation_offset = nan\n",
            "[growth]\nrandom_growth_factor = nan\n",
            "[forest]\nmax_generation_distance = inf\n",
        ];
        for toml in cases {
            let err = Config::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{toml}: {err}");
        }
    }

    #[test]
    fn growth_factor_range_is_half_open() {
        let mut cfg = Config::default();
        cfg.growth.random_growth_factor = 0.0;
        assert!(cfg.validate().is_ok());
        cfg.growth.random_growth_factor = 1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        cfg.growth.random_growth_factor = -0.1;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn default_spawn_candidates_match_forest_default() {
        assert_eq!(ForestConfig::default().spawn_candidates, DEFAULT_SPAWN_CANDIDATES);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("forest-core-no-such-config.toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("forest-core-config-{}.toml", std::process::id()));
        fs::write(&path, "[field]\nwidth = 32\n").unwrap();
        let cfg = Config::load(&path);
        fs::remove_file(&path).unwrap();
        assert_eq!(cfg.unwrap().field.width, 32);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("[fractal\nmin_splits = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
