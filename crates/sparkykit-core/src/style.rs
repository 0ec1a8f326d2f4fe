//! Line styling and the bundled in-memory line primitive.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use sparkykit_platform::{ColorGradient, EffectHost, LinePrimitive};
use tracing::trace;

use crate::error::{ConfigError, EffectError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyle {
    pub width: f32,
    /// 0 keeps both ends at `width`, 1 tapers the tail to zero, -1 tapers the tip to zero.
    pub taper: f32,
    /// Tail on the left, tip on the right.
    pub gradient: ColorGradient,
    pub material: Option<String>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 0.1,
            taper: 0.0,
            gradient: ColorGradient::default(),
            material: Some("default".into()),
        }
    }
}

impl LineStyle {
    /// Start (tail) and end (tip) widths after tapering.
    pub fn widths(&self) -> (f32, f32) {
        if self.taper > 0.0 {
            (self.width * (1.0 - self.taper), self.width)
        } else if self.taper < 0.0 {
            (self.width, self.width * (1.0 + self.taper))
        } else {
            (self.width, self.width)
        }
    }

    /// Initialises `line` with this style. Lines without a material are not drawable.
    pub fn apply<L: LinePrimitive + ?Sized>(&self, line: &mut L) -> Result<(), EffectError> {
        let material = self.material.as_deref().ok_or(EffectError::MissingMaterial)?;
        let (start, end) = self.widths();
        line.set_widths(start, end);
        line.set_gradient(self.gradient.clone());
        line.set_material(material);
        trace!(material, start, end, "line style applied");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(ConfigError::invalid("width", "must be finite and non-negative"));
        }
        if !(-1.0..=1.0).contains(&self.taper) {
            return Err(ConfigError::invalid("taper", "must be between -1 and 1"));
        }
        Ok(())
    }
}

/// Vertex layout for uploading a polyline to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub width: f32,
    pub color: [f32; 4],
}

/// In-memory line primitive used by the headless host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub positions: Vec<Vec3>,
    pub start_width: f32,
    pub end_width: f32,
    pub gradient: ColorGradient,
    pub material: Option<String>,
    pub visible: bool,
}

impl Default for Polyline {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            start_width: 0.0,
            end_width: 0.0,
            gradient: ColorGradient::default(),
            material: None,
            visible: true,
        }
    }
}

impl Polyline {
    pub fn vertices(&self) -> Vec<LineVertex> {
        let last = self.positions.len().saturating_sub(1).max(1) as f32;
        self.positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                let t = i as f32 / last;
                LineVertex {
                    position: position.to_array(),
                    width: self.start_width + (self.end_width - self.start_width) * t,
                    color: self.gradient.evaluate(t).to_array(),
                }
            })
            .collect()
    }
}

/// Reinterprets vertices as bytes for a vertex buffer.
pub fn vertex_bytes(vertices: &[LineVertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

impl LinePrimitive for Polyline {
    fn set_positions(&mut self, positions: &[Vec3]) {
        self.positions.clear();
        self.positions.extend_from_slice(positions);
    }

    fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    fn set_widths(&mut self, start: f32, end: f32) {
        self.start_width = start;
        self.end_width = end;
    }

    fn widths(&self) -> (f32, f32) {
        (self.start_width, self.end_width)
    }

    fn set_gradient(&mut self, gradient: ColorGradient) {
        self.gradient = gradient;
    }

    fn gradient(&self) -> &ColorGradient {
        &self.gradient
    }

    fn set_material(&mut self, material: &str) {
        self.material = Some(material.to_owned());
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Effect host that keeps every line in memory.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pub created: usize,
    pub released: usize,
}

impl EffectHost for HeadlessHost {
    type Line = Polyline;

    fn create_line(&mut self) -> sparkykit_platform::Result<Polyline> {
        self.created += 1;
        Ok(Polyline::default())
    }

    fn release_line(&mut self, _line: Polyline) {
        self.released += 1;
    }
}
