// src/tracer.rs

//! Decorative field lines that follow the network's gradient.
//!
//! Every line is a fixed set of vertices sharing one seed. A vertex is pushed
//! `LINE_STEPS` times along the normalized gradient, with a step proportional
//! to its index along the line, so successive vertices trace out the curve
//! that starts at the seed. The field value at the final position, read
//! against the iso level, sets the vertex colour and opacity.

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::field::{ScalarField, MIN_GRADIENT};
use crate::locator::BLIND_RADIUS;
use crate::math::{fract, Vec3};

/// Gradient steps applied to every vertex.
pub const LINE_STEPS: usize = 20;
pub const VERTICES_PER_LINE: usize = 10;

/// Seeds cover integer coordinates in `[-SEED_GRID_HALF, SEED_GRID_HALF)` per axis.
pub const SEED_GRID_HALF: i32 = 4;
pub const SEED_SCALE: f32 = 1.2;

/// Peak opacity of a line vertex.
pub const LINE_ALPHA: f32 = 0.4;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Step length gained per vertex index.
    pub step_per_index: f32,
    /// Index whose step is zero. Vertices below it walk down the gradient.
    pub index_offset: i32,
    /// `k` in `exp(-k · fract(iso - value))`.
    pub decay: f32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            step_per_index: 0.02,
            index_offset: 0,
            decay: 7.0,
        }
    }
}

/// One vertex of a field line before tracing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineVertex {
    pub seed: Vec3,
    pub step_index: u8,
}

impl LineVertex {
    pub fn step_scale(&self, config: &LineConfig) -> f32 {
        (i32::from(self.step_index) - config.index_offset) as f32 * config.step_per_index
    }
}

/// A line's vertices, ordered by step index.
pub type FieldLine = [LineVertex; VERTICES_PER_LINE];

/// The seed layout: an 8×8×8 grid of lines, scaled by `SEED_SCALE`.
pub fn line_seeds() -> Vec<FieldLine> {
    let range = -SEED_GRID_HALF..SEED_GRID_HALF;
    let mut lines = Vec::with_capacity(range.len().pow(3));
    for x in range.clone() {
        for y in range.clone() {
            for z in range.clone() {
                let seed = Vec3::new(x as f32, y as f32, z as f32) * SEED_SCALE;
                lines.push(std::array::from_fn(|i| LineVertex {
                    seed,
                    step_index: i as u8,
                }));
            }
        }
    }
    lines
}

/// A vertex after tracing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracedVertex {
    pub position: Vec3,
    /// Field value at `position`.
    pub value: f32,
}

impl TracedVertex {
    /// Vertices outside the blind sphere are not drawn.
    pub fn visible(&self) -> bool {
        is_visible(self.position)
    }

    pub fn color(&self, iso_level: f32, decay: f32) -> Rgba {
        line_color(self.value, iso_level, decay)
    }
}

pub fn is_visible(position: Vec3) -> bool {
    position.length() <= BLIND_RADIUS
}

/// Colour of a line sample with field value `value`.
///
/// Opacity peaks just as the animated iso level passes the sample's value
/// and decays over the following unit of iso level.
pub fn line_color(value: f32, iso_level: f32, decay: f32) -> Rgba {
    let since_crossing = fract(iso_level - value);
    Rgba::new(
        0.5 + value / 10.0,
        0.25,
        0.5 - value / 4.0,
        (-decay * since_crossing).exp() * LINE_ALPHA,
    )
}

/// Traces line vertices along a field's gradient. Stateless between calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldLineTracer {
    config: LineConfig,
}

impl FieldLineTracer {
    pub fn new(config: LineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// One displacement of `p` along the unit gradient. A flat field leaves
    /// `p` where it is.
    pub fn advance<F: ScalarField + ?Sized>(&self, p: Vec3, step_scale: f32, field: &F) -> Vec3 {
        match field.gradient(p).try_normalize(MIN_GRADIENT) {
            Some(dir) => p + dir * step_scale,
            None => p,
        }
    }

    pub fn trace<F: ScalarField + ?Sized>(&self, vertex: &LineVertex, field: &F) -> TracedVertex {
        let step_scale = vertex.step_scale(&self.config);
        let mut p = vertex.seed;
        for _ in 0..LINE_STEPS {
            p = self.advance(p, step_scale, field);
        }
        TracedVertex {
            position: p,
            value: field.evaluate(p),
        }
    }

    pub fn trace_line<F: ScalarField + ?Sized>(
        &self,
        line: &FieldLine,
        field: &F,
    ) -> [TracedVertex; VERTICES_PER_LINE] {
        std::array::from_fn(|i| self.trace(&line[i], field))
    }

    pub fn trace_all<F: ScalarField + ?Sized>(
        &self,
        lines: &[FieldLine],
        field: &F,
    ) -> Vec<[TracedVertex; VERTICES_PER_LINE]> {
        lines.iter().map(|line| self.trace_line(line, field)).collect()
    }
}

#[cfg(test)]
mod tests;
