//! Host abstraction traits so `sparkykit-core` stays engine-agnostic.

use glam::{Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// World placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Local +X in world space. Sparks are emitted around this axis.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Local +Z in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorKey {
    pub time: f32,
    pub color: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaKey {
    pub time: f32,
    pub alpha: f32,
}

/// Colour ramp along a line. Time 0 is the tail, time 1 the tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorGradient {
    pub color_keys: Vec<ColorKey>,
    pub alpha_keys: Vec<AlphaKey>,
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self {
            color_keys: vec![
                ColorKey { time: 0.0, color: Vec3::ONE },
                ColorKey { time: 1.0, color: Vec3::ONE },
            ],
            alpha_keys: vec![
                AlphaKey { time: 0.0, alpha: 1.0 },
                AlphaKey { time: 1.0, alpha: 1.0 },
            ],
        }
    }
}

impl ColorGradient {
    /// Copy of this gradient with every alpha key multiplied by `factor`.
    pub fn scaled_alpha(&self, factor: f32) -> Self {
        Self {
            color_keys: self.color_keys.clone(),
            alpha_keys: self
                .alpha_keys
                .iter()
                .map(|key| AlphaKey {
                    time: key.time,
                    alpha: key.alpha * factor,
                })
                .collect(),
        }
    }

    /// Samples RGBA at `t` in `[0, 1]`, holding the end keys flat outside their range.
    pub fn evaluate(&self, t: f32) -> Vec4 {
        let t = t.clamp(0.0, 1.0);
        let color = sample_keys(self.color_keys.iter().map(|k| (k.time, k.color)), t)
            .unwrap_or(Vec3::ONE);
        let alpha = sample_keys(self.alpha_keys.iter().map(|k| (k.time, k.alpha)), t)
            .unwrap_or(1.0);
        color.extend(alpha)
    }
}

fn sample_keys<T>(keys: impl Iterator<Item = (f32, T)>, t: f32) -> Option<T>
where
    T: Copy + std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
    let mut previous: Option<(f32, T)> = None;
    for (time, value) in keys {
        if t <= time {
            return Some(match previous {
                Some((prev_time, prev_value)) if time > prev_time => {
                    let f = (t - prev_time) / (time - prev_time);
                    prev_value * (1.0 - f) + value * f
                }
                _ => value,
            });
        }
        previous = Some((time, value));
    }
    previous.map(|(_, value)| value)
}

/// A thin-line rendering primitive: an ordered polyline with per-endpoint width and a colour gradient.
pub trait LinePrimitive {
    fn set_positions(&mut self, positions: &[Vec3]);
    fn positions(&self) -> &[Vec3];
    fn set_widths(&mut self, start: f32, end: f32);
    fn widths(&self) -> (f32, f32);
    fn set_gradient(&mut self, gradient: ColorGradient);
    fn gradient(&self) -> &ColorGradient;
    fn set_material(&mut self, _material: &str) {}
    fn set_visible(&mut self, _visible: bool) {}
}

/// Creates and releases the line primitives backing simulated entities.
pub trait EffectHost {
    type Line: LinePrimitive;

    fn create_line(&mut self) -> Result<Self::Line>;
    fn release_line(&mut self, _line: Self::Line) {}
}
