// src/network.rs

//! The 4→8→1 tanh network whose output defines the rendered scalar field.
//!
//! Layer 1 is an 8×4 matrix stored flat and row-major: row `k` holds the
//! weights hidden unit `k` applies to `(x, y, z, 1)`. Layer 2 is an 8-vector
//! dotted with the hidden activations.

use rand::Rng;

use crate::field::ScalarField;
use crate::math::Vec3;

pub const INPUTS: usize = 4;
pub const HIDDEN: usize = 8;

/// tanh arguments are clamped to this magnitude before exponentiating.
/// `tanh(10)` already rounds to 1.0 in `f32`.
const TANH_CLAMP: f32 = 10.0;

/// `(e^{2x} - 1) / (e^{2x} + 1)` with the argument clamped so `exp` cannot overflow.
#[inline]
pub fn tanh(x: f32) -> f32 {
    let e = (2.0 * x.clamp(-TANH_CLAMP, TANH_CLAMP)).exp();
    (e - 1.0) / (e + 1.0)
}

/// Weights of the network. Cheap to copy; evaluation never mutates it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Network {
    w: [f32; HIDDEN * INPUTS],
    v: [f32; HIDDEN],
}

impl Default for Network {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Network {
    pub const fn zeros() -> Self {
        Self {
            w: [0.0; HIDDEN * INPUTS],
            v: [0.0; HIDDEN],
        }
    }

    pub fn new(w: [f32; HIDDEN * INPUTS], v: [f32; HIDDEN]) -> Self {
        Self { w, v }
    }

    /// Every weight drawn uniformly from `[-1, 1]`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut net = Self::zeros();
        for w in net.w.iter_mut().chain(net.v.iter_mut()) {
            *w = rng.gen_range(-1.0..=1.0);
        }
        net
    }

    #[inline]
    pub fn hidden_weight(&self, unit: usize, input: usize) -> f32 {
        self.w[unit * INPUTS + input]
    }

    #[inline]
    pub fn set_hidden_weight(&mut self, unit: usize, input: usize, value: f32) {
        self.w[unit * INPUTS + input] = value;
    }

    /// The four layer-1 weights of one hidden unit.
    pub fn hidden_row(&self, unit: usize) -> [f32; INPUTS] {
        let start = unit * INPUTS;
        [self.w[start], self.w[start + 1], self.w[start + 2], self.w[start + 3]]
    }

    pub fn set_hidden_row(&mut self, unit: usize, row: [f32; INPUTS]) {
        self.w[unit * INPUTS..(unit + 1) * INPUTS].copy_from_slice(&row);
    }

    #[inline]
    pub fn output_weight(&self, unit: usize) -> f32 {
        self.v[unit]
    }

    #[inline]
    pub fn set_output_weight(&mut self, unit: usize, value: f32) {
        self.v[unit] = value;
    }

    pub fn hidden_weights(&self) -> &[f32; HIDDEN * INPUTS] {
        &self.w
    }

    pub fn output_weights(&self) -> &[f32; HIDDEN] {
        &self.v
    }

    /// Hidden-layer activations at `p`.
    pub fn activations(&self, p: Vec3) -> [f32; HIDDEN] {
        let mut h = [0.0; HIDDEN];
        for (unit, out) in h.iter_mut().enumerate() {
            let [wx, wy, wz, wb] = self.hidden_row(unit);
            *out = tanh(p.x * wx + p.y * wy + p.z * wz + wb);
        }
        h
    }

    /// Upper bound on `|f(p) - f(q)| / |p - q|`.
    ///
    /// tanh is 1-Lipschitz, so each unit contributes `|v_k| · |w_k,xyz|`.
    pub fn lipschitz_bound(&self) -> f32 {
        self.output_weights()
            .iter()
            .enumerate()
            .map(|(unit, v)| {
                let [wx, wy, wz, _] = self.hidden_row(unit);
                v.abs() * Vec3::new(wx, wy, wz).length()
            })
            .sum()
    }

    /// True when every weight lies in `[-1, 1]`.
    pub fn is_within_unit_range(&self) -> bool {
        self.w
            .iter()
            .chain(self.v.iter())
            .all(|w| (-1.0..=1.0).contains(w))
    }
}

impl ScalarField for Network {
    fn evaluate(&self, p: Vec3) -> f32 {
        self.activations(p)
            .iter()
            .zip(self.v.iter())
            .map(|(h, v)| h * v)
            .sum()
    }
}
