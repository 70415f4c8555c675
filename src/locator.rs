// src/locator.rs

//! Per-ray iso-surface location.
//!
//! A ray is first clipped to the blind sphere, then a coarse search looks for
//! the point where `field(p) - iso` approaches (or crosses) an integer level.
//! Every integer offset is a surface, so a single network renders as a stack
//! of nested layers that drift as the iso level animates.
//!
//! Two coarse searches are available through [`MarchStrategy`]:
//!
//! - `AdaptiveBacktrack` (default) walks with a growing step, halves and
//!   reverses whenever the sample's integer level changes, and stops once the
//!   sample is within [`FD_EPS`] of a level.
//! - `FloorScan` takes 64 equal steps across the part of the ray inside the
//!   sphere and hands the first bracket whose integer level changes to
//!   [`refine`] (regula falsi).
//!
//! All loops have fixed iteration caps; a ray that does not settle within the
//! budget is a [`HitResult::Miss`].

use log::trace;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::field::{ScalarField, FD_EPS};
use crate::math::{level_distance, reflect, sign, Vec3};

/// Radius of the sphere, centred at the origin, outside of which nothing renders.
pub const BLIND_RADIUS: f32 = 5.0;

/// Iteration cap for both coarse searches.
pub const MAX_MARCH_STEPS: usize = 64;

pub const LIGHT_DIR: Vec3 = Vec3::Y;

/// Alpha of every surface hit.
pub const SURFACE_ALPHA: f32 = 0.6;

// Adaptive march tuning.
const INITIAL_FACTOR: f32 = 0.5;
const FACTOR_GROWTH: f32 = 1.2;
const MAX_FACTOR: f32 = 3.0;
const INITIAL_MIN_STEP: f32 = 0.02;

/// Points this far past the sphere still count as inside; entry samples sit
/// exactly on it up to rounding.
pub const RADIUS_SLACK: f32 = 1e-4;

// Regula falsi stops on these.
const REFINE_TOLERANCE: f32 = 1e-6;
const DEGENERATE_SPAN: f32 = 1e-9;

/// A ray with a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance between the world origin and the infinite line through the ray.
    pub fn closest_approach(&self) -> f32 {
        (self.origin - self.direction * self.direction.dot(self.origin)).length()
    }
}

/// Coarse search policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarchStrategy {
    #[default]
    AdaptiveBacktrack,
    FloorScan,
}

/// Surface shading parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shading {
    /// Lower clamp of the diffuse term.
    pub diffuse_floor: f32,
    /// Grey level of the specular highlight.
    pub specular_tint: f32,
    pub specular_power: f32,
    /// Constant added to the specular term.
    pub specular_bias: f32,
    /// Perturb the base colour with `sign(sin(|p|·10))` rings.
    pub banding: bool,
}

impl Default for Shading {
    fn default() -> Self {
        Self {
            diffuse_floor: 0.3,
            specular_tint: 0.8,
            specular_power: 10.0,
            specular_bias: 0.2,
            banding: true,
        }
    }
}

impl Shading {
    /// Position-only base colour.
    pub fn base_color(&self, p: Vec3) -> Vec3 {
        let band = if self.banding {
            sign((p.length() * 10.0).sin())
        } else {
            0.0
        };
        (p + Vec3::splat(band)).map(|c| (c * 0.1 + 0.5).clamp(0.0, 1.0))
    }

    /// Diffuse + specular colour for a unit `normal` facing against `view`.
    pub fn lit_color(&self, p: Vec3, normal: Vec3, view: Vec3) -> Vec3 {
        let diffuse = LIGHT_DIR.dot(normal).clamp(self.diffuse_floor, 1.0);
        let specular = reflect(LIGHT_DIR, normal)
            .dot(view)
            .clamp(0.0, 1.0)
            .powf(self.specular_power)
            + self.specular_bias;
        self.base_color(p) * diffuse + Vec3::splat(self.specular_tint) * specular
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub strategy: MarchStrategy,
    /// Regula falsi budget for `FloorScan` brackets.
    pub refine_iterations: usize,
    pub shading: Shading,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            strategy: MarchStrategy::default(),
            refine_iterations: 16,
            shading: Shading::default(),
        }
    }
}

/// Outcome of one surface query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitResult {
    Hit {
        position: Vec3,
        /// `None` when the field is flat at `position`; shading was skipped.
        normal: Option<Vec3>,
        color: Rgba,
    },
    /// Nothing to draw; compositors treat this as fully transparent.
    Miss,
}

impl HitResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, HitResult::Hit { .. })
    }

    /// The colour to composite. A miss is fully transparent, not black.
    pub fn color(&self) -> Rgba {
        match self {
            HitResult::Hit { color, .. } => *color,
            HitResult::Miss => Rgba::TRANSPARENT,
        }
    }

    pub fn position(&self) -> Option<Vec3> {
        match self {
            HitResult::Hit { position, .. } => Some(*position),
            HitResult::Miss => None,
        }
    }
}

/// Two depths along a ray whose values lie on different integer levels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bracket {
    pub near_depth: f32,
    pub near_value: f32,
    pub far_depth: f32,
    pub far_value: f32,
}

impl Bracket {
    /// The integer level crossed between the two samples.
    pub fn target(&self) -> f32 {
        self.near_value.max(self.far_value).floor()
    }
}

/// Best sample found by [`refine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refined {
    pub depth: f32,
    pub value: f32,
    pub target: f32,
    pub iterations: usize,
}

impl Refined {
    pub fn error(&self) -> f32 {
        (self.value - self.target).abs()
    }
}

/// Regula falsi on `f` inside `bracket`, toward `bracket.target()`.
///
/// Returns the endpoint whose value is closest to the target. Stops early
/// when a sample lands within `1e-6` of the target, or when the endpoint
/// values coincide and the secant is undefined.
pub fn refine(bracket: Bracket, max_iterations: usize, f: impl Fn(f32) -> f32) -> Refined {
    let target = bracket.target();
    let (mut l_depth, mut l_value) = (bracket.near_depth, bracket.near_value);
    let (mut r_depth, mut r_value) = (bracket.far_depth, bracket.far_value);
    let mut iterations = 0;

    while iterations < max_iterations {
        let span = r_value - l_value;
        if span.abs() < DEGENERATE_SPAN {
            break;
        }
        iterations += 1;

        let depth = l_depth + (target - l_value) * (r_depth - l_depth) / span;
        let value = f(depth);
        if (value >= target) == (l_value >= target) {
            l_depth = depth;
            l_value = value;
        } else {
            r_depth = depth;
            r_value = value;
        }
        if (value - target).abs() < REFINE_TOLERANCE {
            break;
        }
    }

    let (depth, value) = if (l_value - target).abs() <= (r_value - target).abs() {
        (l_depth, l_value)
    } else {
        (r_depth, r_value)
    };
    Refined {
        depth,
        value,
        target,
        iterations,
    }
}

/// Ray segment inside the blind sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Clip {
    /// Where marching starts.
    start: Vec3,
    /// Distance from `start` to the far side of the sphere (0 if behind).
    span: f32,
}

/// Finds iso-surface hits along rays. Stateless between calls.
#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceLocator {
    config: LocatorConfig,
}

impl SurfaceLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Locates the first iso-level crossing of `field` along `ray`.
    pub fn trace<F: ScalarField + ?Sized>(&self, ray: &Ray, field: &F, iso_level: f32) -> HitResult {
        if ray.closest_approach() > BLIND_RADIUS {
            return HitResult::Miss;
        }
        let Some(clip) = Self::clip(ray) else {
            return HitResult::Miss;
        };

        let dist = |p: Vec3| field.evaluate(p) - iso_level;
        let found = match self.config.strategy {
            MarchStrategy::AdaptiveBacktrack => Self::march_adaptive(ray, clip, &dist),
            MarchStrategy::FloorScan => self.march_floor_scan(ray, clip, &dist),
        };

        match found {
            Some(position) if position.length() <= BLIND_RADIUS + RADIUS_SLACK => {
                self.shade(position, ray.direction, field)
            }
            Some(position) => {
                trace!("hit at {:?} left the blind sphere", position);
                HitResult::Miss
            }
            None => HitResult::Miss,
        }
    }

    /// The part of the ray inside the blind sphere.
    ///
    /// An origin inside the sphere stays where it is and marching runs to the
    /// far side. An origin outside moves to the near intersection, and a
    /// sphere lying behind the origin is a miss.
    fn clip(ray: &Ray) -> Option<Clip> {
        let b = ray.origin.dot(ray.direction);
        let c = ray.origin.length_squared() - BLIND_RADIUS * BLIND_RADIUS;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        if c <= 0.0 {
            return Some(Clip {
                start: ray.origin,
                span: (-b + root).max(0.0),
            });
        }
        if b >= 0.0 {
            return None;
        }
        Some(Clip {
            start: ray.at(-b - root),
            span: 2.0 * root,
        })
    }

    /// Adaptive march with backtracking. Returns the final marched point if
    /// the last sample settled within `FD_EPS` of an integer level.
    fn march_adaptive(ray: &Ray, clip: Clip, dist: &impl Fn(Vec3) -> f32) -> Option<Vec3> {
        let origin = clip.start;
        let mut p = origin;
        let mut depth = 0.0f32;

        let mut old_dist = dist(p);
        let original_level = old_dist.floor();
        let mut d = old_dist;
        let mut factor = INITIAL_FACTOR;
        let mut min_step = INITIAL_MIN_STEP;

        for step in 0..MAX_MARCH_STEPS {
            d = dist(p);

            if old_dist.floor() != d.floor() {
                factor *= -0.5;
                min_step = 0.0;
            } else {
                factor *= FACTOR_GROWTH;
            }
            factor = factor.abs().min(MAX_FACTOR);
            if original_level != d.floor() {
                factor = -factor;
            }

            old_dist = d;
            depth += (level_distance(d) + min_step) * factor;
            p = origin + ray.direction * depth;
            if level_distance(d) < FD_EPS {
                trace!("adaptive march settled after {} steps", step + 1);
                return Some(p);
            }
        }

        trace!("adaptive march exhausted budget, last distance {}", d);
        None
    }

    /// Fixed-step scan for a level change, refined with regula falsi.
    fn march_floor_scan(&self, ray: &Ray, clip: Clip, dist: &impl Fn(Vec3) -> f32) -> Option<Vec3> {
        let origin = clip.start;
        let along = |t: f32| dist(origin + ray.direction * t);

        let mut prev_depth = 0.0f32;
        let mut prev_value = along(0.0);
        if level_distance(prev_value) < FD_EPS {
            return Some(origin);
        }

        let step = clip.span / MAX_MARCH_STEPS as f32;
        if step <= 0.0 {
            return None;
        }

        for j in 1..=MAX_MARCH_STEPS {
            let depth = step * j as f32;
            let value = along(depth);
            if value.floor() != prev_value.floor() {
                let bracket = Bracket {
                    near_depth: prev_depth,
                    near_value: prev_value,
                    far_depth: depth,
                    far_value: value,
                };
                let refined = refine(bracket, self.config.refine_iterations, &along);
                trace!(
                    "floor scan bracket at step {}, refined in {} iterations (error {})",
                    j,
                    refined.iterations,
                    refined.error()
                );
                return (refined.error() < FD_EPS).then(|| origin + ray.direction * refined.depth);
            }
            prev_depth = depth;
            prev_value = value;
        }
        None
    }

    fn shade<F: ScalarField + ?Sized>(&self, position: Vec3, view: Vec3, field: &F) -> HitResult {
        let shading = &self.config.shading;
        match field.normal(position) {
            Some(n) => {
                let normal = if n.dot(view) > 0.0 { -n } else { n };
                let rgb = shading.lit_color(position, normal, view);
                HitResult::Hit {
                    position,
                    normal: Some(normal),
                    color: Rgba::from_rgb(rgb, SURFACE_ALPHA),
                }
            }
            None => HitResult::Hit {
                position,
                normal: None,
                color: Rgba::from_rgb(shading.base_color(position), SURFACE_ALPHA),
            },
        }
    }
}
