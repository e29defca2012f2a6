//! Scan configuration
//!
//! [`ScanConfig::default`] reproduces the field-tested ladders. Every knob can
//! be overridden from the environment (`INVSCAN_*`) or loaded from JSON.
//! Environment parsing is tolerant: a malformed value keeps the default.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{Rotation, Symbology};
use crate::orientation::OrientationStrategy;
use crate::render::{DEFAULT_MIN_DIMENSION, Preprocess, RenderOptions};

/// Largest accepted scale factor
pub const MAX_SCALE: f32 = 4.0;

/// Iteration order over the scale x rotation grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridOrder {
    /// Outer loop over scales, inner loop over rotations
    #[default]
    RotationsFirst,
    /// Outer loop over rotations, inner loop over scales
    ScalesFirst,
}

impl FromStr for GridOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rotations_first" | "rotations" => Ok(GridOrder::RotationsFirst),
            "scales_first" | "scales" => Ok(GridOrder::ScalesFirst),
            other => Err(ConfigError::UnknownVariant {
                kind: "grid order",
                value: other.to_string(),
            }),
        }
    }
}

/// Everything a [`Scanner`](crate::Scanner) needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Scale ladder, tried in order
    pub scales: Vec<f32>,
    /// Rotation ladder, tried in order
    pub rotations: Vec<Rotation>,
    /// Floor for each scaled dimension
    pub min_dimension: u32,
    /// Gamma/contrast pass; `None` disables it
    pub preprocess: Option<Preprocess>,
    /// Symbologies the engines may report
    pub symbologies: Vec<Symbology>,
    /// Ask the multi-format engine for its slower, more thorough search
    pub try_harder: bool,
    /// Grid iteration order
    pub grid_order: GridOrder,
    /// How orientation metadata is discovered
    pub orientation: OrientationStrategy,
    /// Wall-clock budget for one scan
    pub time_budget_ms: Option<u64>,
    /// Reject raw inputs larger than this
    pub max_input_bytes: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scales: vec![1.0, 0.8, 0.6, 0.45],
            rotations: Rotation::ALL.to_vec(),
            min_dimension: DEFAULT_MIN_DIMENSION,
            preprocess: Some(Preprocess::default()),
            symbologies: Symbology::ALL.to_vec(),
            try_harder: true,
            grid_order: GridOrder::default(),
            orientation: OrientationStrategy::default(),
            time_budget_ms: None,
            max_input_bytes: None,
        }
    }
}

impl ScanConfig {
    /// Defaults overridden by `INVSCAN_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `INVSCAN_*` name
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(scales) = parse_var(&lookup, "INVSCAN_SCALES", parse_scales) {
            config.scales = scales;
        }
        if let Some(rotations) = parse_var(&lookup, "INVSCAN_ROTATIONS", Rotation::parse_list) {
            config.rotations = rotations;
        }
        if let Some(min) = parse_var(&lookup, "INVSCAN_MIN_DIM", u32::from_str) {
            config.min_dimension = min;
        }
        if let Some(enabled) = parse_var(&lookup, "INVSCAN_PREPROCESS", parse_flag) {
            config.preprocess = enabled.then(Preprocess::default);
        }
        if let Some(p) = config.preprocess.as_mut() {
            if let Some(gamma) = parse_var(&lookup, "INVSCAN_GAMMA", f32::from_str) {
                p.gamma = gamma;
            }
            if let Some(contrast) = parse_var(&lookup, "INVSCAN_CONTRAST", f32::from_str) {
                p.contrast = contrast;
            }
        }
        if let Some(symbologies) = parse_var(&lookup, "INVSCAN_SYMBOLOGIES", Symbology::parse_list) {
            config.symbologies = symbologies;
        }
        if let Some(try_harder) = parse_var(&lookup, "INVSCAN_TRY_HARDER", parse_flag) {
            config.try_harder = try_harder;
        }
        if let Some(order) = parse_var(&lookup, "INVSCAN_GRID_ORDER", GridOrder::from_str) {
            config.grid_order = order;
        }
        if let Some(strategy) = parse_var(&lookup, "INVSCAN_ORIENTATION", OrientationStrategy::from_str) {
            config.orientation = strategy;
        }
        if let Some(ms) = parse_var(&lookup, "INVSCAN_TIME_BUDGET_MS", u64::from_str) {
            config.time_budget_ms = Some(ms);
        }
        if let Some(limit) = parse_var(&lookup, "INVSCAN_MAX_INPUT_BYTES", usize::from_str) {
            config.max_input_bytes = Some(limit);
        }

        config
    }

    /// Parse a JSON document; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check ladders, allow-list and preprocessing parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scales.is_empty() {
            return Err(ConfigError::EmptyScales);
        }
        if let Some(&bad) = self
            .scales
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0 || **s > MAX_SCALE)
        {
            return Err(ConfigError::InvalidScale(bad));
        }
        if let Some(i) = (1..self.scales.len()).find(|&i| self.scales[..i].contains(&self.scales[i])) {
            return Err(ConfigError::DuplicateLadderEntry(format!("scale {}", self.scales[i])));
        }
        if self.rotations.is_empty() {
            return Err(ConfigError::EmptyRotations);
        }
        if let Some(i) = (1..self.rotations.len()).find(|&i| self.rotations[..i].contains(&self.rotations[i])) {
            return Err(ConfigError::DuplicateLadderEntry(format!("rotation {}", self.rotations[i])));
        }
        if self.symbologies.is_empty() {
            return Err(ConfigError::EmptySymbologies);
        }
        if self.min_dimension == 0 {
            return Err(ConfigError::InvalidMinDimension);
        }
        if let Some(p) = &self.preprocess {
            p.validate()?;
        }
        Ok(())
    }

    /// Number of grid cells a full scan visits
    pub fn grid_len(&self) -> usize {
        self.scales.len() * self.rotations.len()
    }

    /// Time budget as a [`Duration`]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    /// Options handed to the render stage
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            min_dimension: self.min_dimension,
            preprocess: self.preprocess,
        }
    }
}

fn parse_var<F, T, E, P>(lookup: &F, name: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Result<T, E>,
    E: std::fmt::Display,
{
    let raw = lookup(name)?;
    match parse(raw.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring {name}={raw:?}: {e}");
            None
        }
    }
}

fn parse_scales(list: &str) -> Result<Vec<f32>, std::num::ParseFloatError> {
    let mut out = Vec::new();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let scale = f32::from_str(token)?;
        if !out.contains(&scale) {
            out.push(scale);
        }
    }
    Ok(out)
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::UnknownVariant {
            kind: "flag",
            value: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.scales, vec![1.0, 0.8, 0.6, 0.45]);
        assert_eq!(config.rotations, Rotation::ALL.to_vec());
        assert_eq!(config.min_dimension, 240);
        assert_eq!(config.grid_len(), 16);
        assert_eq!(config.grid_order, GridOrder::RotationsFirst);
        assert!(config.try_harder);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_ladders() {
        let mut config = ScanConfig::default();
        config.scales.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyScales));

        config.scales = vec![1.0, 0.0];
        assert_eq!(config.validate(), Err(ConfigError::InvalidScale(0.0)));

        config.scales = vec![-0.5];
        assert_eq!(config.validate(), Err(ConfigError::InvalidScale(-0.5)));

        config.scales = vec![f32::INFINITY];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidScale(_))));

        let mut config = ScanConfig::default();
        config.rotations.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyRotations));

        let mut config = ScanConfig::default();
        config.symbologies.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptySymbologies));

        let mut config = ScanConfig::default();
        config.min_dimension = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMinDimension));
    }

    #[test]
    fn test_validate_rejects_repeated_cells() {
        let config = ScanConfig {
            scales: vec![1.0],
            rotations: vec![Rotation::Deg0, Rotation::from_degrees(360).unwrap()],
            ..ScanConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateLadderEntry(_))
        ));

        let config = ScanConfig {
            scales: vec![1.0, 0.6, 1.0],
            ..ScanConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateLadderEntry(_))
        ));
    }

    #[test]
    fn test_env_ladders_collapse_repeats() {
        let config = ScanConfig::from_lookup(lookup(&[
            ("INVSCAN_SCALES", "1.0,0.5,1.0"),
            ("INVSCAN_ROTATIONS", "0,360,90,-270"),
        ]));
        assert_eq!(config.scales, vec![1.0, 0.5]);
        assert_eq!(config.rotations, vec![Rotation::Deg0, Rotation::Deg90]);
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_len(), 4);
    }

    #[test]
    fn test_env_overrides() {
        let config = ScanConfig::from_lookup(lookup(&[
            ("INVSCAN_SCALES", "1.0, 0.5"),
            ("INVSCAN_ROTATIONS", "0,-90"),
            ("INVSCAN_MIN_DIM", "120"),
            ("INVSCAN_GAMMA", "1.2"),
            ("INVSCAN_SYMBOLOGIES", "qr_code,ean_13"),
            ("INVSCAN_TRY_HARDER", "0"),
            ("INVSCAN_GRID_ORDER", "scales_first"),
            ("INVSCAN_ORIENTATION", "exif"),
            ("INVSCAN_TIME_BUDGET_MS", "1500"),
        ]));
        assert_eq!(config.scales, vec![1.0, 0.5]);
        assert_eq!(config.rotations, vec![Rotation::Deg0, Rotation::Deg270]);
        assert_eq!(config.min_dimension, 120);
        assert_eq!(config.preprocess.map(|p| p.gamma), Some(1.2));
        assert_eq!(config.symbologies, vec![Symbology::Qr, Symbology::Ean13]);
        assert!(!config.try_harder);
        assert_eq!(config.grid_order, GridOrder::ScalesFirst);
        assert_eq!(config.orientation, OrientationStrategy::ExifOnly);
        assert_eq!(config.time_budget(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_malformed_env_keeps_defaults() {
        let config = ScanConfig::from_lookup(lookup(&[
            ("INVSCAN_SCALES", "big"),
            ("INVSCAN_ROTATIONS", "45"),
            ("INVSCAN_MIN_DIM", "-3"),
            ("INVSCAN_GRID_ORDER", "diagonal"),
            ("INVSCAN_TRY_HARDER", "maybe"),
        ]));
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn test_preprocess_can_be_disabled() {
        let config = ScanConfig::from_lookup(lookup(&[
            ("INVSCAN_PREPROCESS", "off"),
            ("INVSCAN_GAMMA", "2.0"),
        ]));
        assert_eq!(config.preprocess, None);
        assert_eq!(config.render_options().preprocess, None);
    }

    #[test]
    fn test_json_partial_document() {
        let config = ScanConfig::from_json_str(
            r#"{ "scales": [0.5], "rotations": [90, 270], "symbologies": ["qr_code"] }"#,
        )
        .unwrap();
        assert_eq!(config.scales, vec![0.5]);
        assert_eq!(config.rotations, vec![Rotation::Deg90, Rotation::Deg270]);
        assert_eq!(config.symbologies, vec![Symbology::Qr]);
        assert_eq!(config.min_dimension, 240);
    }

    #[test]
    fn test_json_rejects_invalid() {
        assert!(matches!(
            ScanConfig::from_json_str(r#"{ "rotations": [45] }"#),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            ScanConfig::from_json_str(r#"{ "scales": [] }"#),
            Err(ConfigError::EmptyScales)
        );
        assert!(matches!(
            ScanConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_grid_order_parse() {
        assert_eq!("rotations".parse::<GridOrder>(), Ok(GridOrder::RotationsFirst));
        assert_eq!("Scales_First".parse::<GridOrder>(), Ok(GridOrder::ScalesFirst));
        assert!("zigzag".parse::<GridOrder>().is_err());
    }
}
