//! Authoring configuration for emitters, trails and line styles.

use std::collections::BTreeMap;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::random::UniformSampler;
use crate::style::LineStyle;

/// Inclusive `(min, max)` range, written as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange(pub f32, pub f32);

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self(min, max)
    }

    pub const fn fixed(value: f32) -> Self {
        Self(value, value)
    }

    pub fn min(&self) -> f32 {
        self.0
    }

    pub fn max(&self) -> f32 {
        self.1
    }

    pub fn sample(&self, sampler: &mut impl UniformSampler) -> f32 {
        sampler.uniform(self.0, self.1)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.0.is_finite() || !self.1.is_finite() {
            return Err(ConfigError::invalid(field, "range bounds must be finite"));
        }
        if self.0 < 0.0 || self.1 < 0.0 {
            return Err(ConfigError::invalid(field, "range bounds must not be negative"));
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("expected a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Seconds before the emitter stops emitting. Zero emits forever.
    pub lifetime: f32,
    /// Full cone angle in degrees around the emitter's right axis.
    pub emission_angle: f32,
    pub delay: FloatRange,
    pub simultaneous_emissions: FloatRange,
    pub spark_lifetime: FloatRange,
    pub appear_time: FloatRange,
    pub disappear_time: FloatRange,
    pub length_multiplier: f32,
    pub start_speed: FloatRange,
    pub drag: f32,
    pub acceleration: Vec2,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            lifetime: 0.0,
            emission_angle: 360.0,
            delay: FloatRange(0.1, 0.2),
            simultaneous_emissions: FloatRange(1.0, 5.0),
            spark_lifetime: FloatRange(0.3, 0.5),
            appear_time: FloatRange(0.2, 0.25),
            disappear_time: FloatRange(0.4, 0.5),
            length_multiplier: 1.0,
            start_speed: FloatRange(1.5, 2.0),
            drag: 0.1,
            acceleration: Vec2::ZERO,
        }
    }
}

impl EmitterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("lifetime", self.lifetime)?;
        non_negative("emission_angle", self.emission_angle)?;
        if self.emission_angle > 360.0 {
            return Err(ConfigError::invalid(
                "emission_angle",
                "must be at most 360 degrees",
            ));
        }
        self.delay.validate("delay")?;
        self.simultaneous_emissions
            .validate("simultaneous_emissions")?;
        self.spark_lifetime.validate("spark_lifetime")?;
        self.appear_time.validate("appear_time")?;
        self.disappear_time.validate("disappear_time")?;
        self.start_speed.validate("start_speed")?;
        non_negative("length_multiplier", self.length_multiplier)?;
        non_negative("drag", self.drag)?;
        if !self.acceleration.is_finite() {
            return Err(ConfigError::invalid("acceleration", "must be finite"));
        }
        Ok(())
    }
}

pub const MIN_TRAIL_POINTS: usize = 2;
pub const MAX_TRAIL_POINTS: usize = 32;
pub const MAX_SPLINE_PRECISION: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Seconds between recorded samples once the history is full.
    pub cadence: f32,
    /// Seconds to fade out after the owner goes away.
    pub fade_time: f32,
    /// Recorded points kept in the history. 2 draws a straight line.
    pub point_capacity: usize,
    /// Spline points per trail point. 1 disables smoothing.
    pub spline_precision: usize,
    pub spline_tension: f32,
    /// Distance recorded points drift along the owner's forward axis each step.
    pub idle_speed: f32,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            cadence: 0.05,
            fade_time: 1.0,
            point_capacity: MIN_TRAIL_POINTS,
            spline_precision: 1,
            spline_tension: 0.4,
            idle_speed: 0.0,
        }
    }
}

impl TrailConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("cadence", self.cadence)?;
        non_negative("fade_time", self.fade_time)?;
        if !(MIN_TRAIL_POINTS..=MAX_TRAIL_POINTS).contains(&self.point_capacity) {
            return Err(ConfigError::invalid(
                "point_capacity",
                format!("must be between {MIN_TRAIL_POINTS} and {MAX_TRAIL_POINTS}"),
            ));
        }
        if !(1..=MAX_SPLINE_PRECISION).contains(&self.spline_precision) {
            return Err(ConfigError::invalid(
                "spline_precision",
                format!("must be between 1 and {MAX_SPLINE_PRECISION}"),
            ));
        }
        if !self.spline_tension.is_finite() {
            return Err(ConfigError::invalid("spline_tension", "must be finite"));
        }
        if !self.idle_speed.is_finite() {
            return Err(ConfigError::invalid("idle_speed", "must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterEntry {
    pub name: String,
    /// Names of the styles sparks are drawn with. One is picked per spark.
    pub templates: Vec<String>,
    pub emitter: EmitterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailEntry {
    pub name: String,
    pub style: String,
    pub trail: TrailConfig,
}

/// A whole effect file: named styles plus the emitters and trails using them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub styles: BTreeMap<String, LineStyle>,
    pub emitters: Vec<EmitterEntry>,
    pub trails: Vec<TrailEntry>,
}

impl EffectsConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.toml` or `.json` effect file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let source = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading effects config");
        match extension.as_str() {
            "toml" => Self::from_toml_str(&source),
            "json" => Self::from_json_str(&source),
            _ => Err(ConfigError::UnsupportedFormat(extension)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for style in self.styles.values() {
            style.validate()?;
        }
        for entry in &self.emitters {
            entry.emitter.validate()?;
            for name in &entry.templates {
                self.style(name)?;
            }
        }
        for entry in &self.trails {
            entry.trail.validate()?;
            self.style(&entry.style)?;
        }
        Ok(())
    }

    pub fn style(&self, name: &str) -> Result<&LineStyle, ConfigError> {
        self.styles
            .get(name)
            .ok_or_else(|| ConfigError::invalid("style", format!("unknown style {name:?}")))
    }

    /// Resolves an emitter's template names to styles.
    pub fn templates(&self, entry: &EmitterEntry) -> Result<Vec<LineStyle>, ConfigError> {
        entry
            .templates
            .iter()
            .map(|name| self.style(name).cloned())
            .collect()
    }
}
