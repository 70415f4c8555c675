// src/controls.rs

//! Mutable scene state edited between frames.
//!
//! `SceneState` owns the network weights and the iso level. It is the only
//! state that survives from one frame to the next. Each frame works on a
//! `FrameInputs` snapshot so edits made while a frame is being rendered
//! cannot tear it.

use log::debug;
use rand::Rng;

use crate::network::{Network, HIDDEN, INPUTS};

/// Weight change per unit of wheel delta.
pub const WHEEL_SENSITIVITY: f32 = 0.05;

/// Iso-level change per second while animating.
pub const DEFAULT_ISO_SPEED: f32 = 0.2;

/// Address of one editable weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeightCell {
    /// Layer-1 weight from `input` (x, y, z, bias) into hidden `unit`.
    Hidden { unit: usize, input: usize },
    /// Layer-2 weight from hidden `unit` to the output.
    Output { unit: usize },
}

impl WeightCell {
    /// Every editable cell: the 32 layer-1 weights, then the 8 output weights.
    pub fn all() -> impl Iterator<Item = WeightCell> {
        let hidden = (0..HIDDEN)
            .flat_map(|unit| (0..INPUTS).map(move |input| WeightCell::Hidden { unit, input }));
        let output = (0..HIDDEN).map(|unit| WeightCell::Output { unit });
        hidden.chain(output)
    }

    fn is_valid(&self) -> bool {
        match *self {
            WeightCell::Hidden { unit, input } => unit < HIDDEN && input < INPUTS,
            WeightCell::Output { unit } => unit < HIDDEN,
        }
    }
}

/// Immutable per-frame view of the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInputs {
    pub network: Network,
    pub iso_level: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneState {
    network: Network,
    iso_level: f32,
    animate: bool,
    iso_speed: f32,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new(Network::zeros())
    }
}

impl SceneState {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            iso_level: 0.0,
            animate: true,
            iso_speed: DEFAULT_ISO_SPEED,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn iso_level(&self) -> f32 {
        self.iso_level
    }

    pub fn set_iso_level(&mut self, iso_level: f32) {
        self.iso_level = iso_level;
    }

    pub fn is_animating(&self) -> bool {
        self.animate
    }

    pub fn set_animate(&mut self, animate: bool) {
        self.animate = animate;
    }

    pub fn set_iso_speed(&mut self, speed: f32) {
        self.iso_speed = speed;
    }

    /// Advances the animation clock. The iso level only moves while animating.
    pub fn advance(&mut self, seconds: f32) {
        if self.animate {
            self.iso_level += self.iso_speed * seconds;
        }
    }

    /// Re-draws every weight uniformly from `[-1, 1]`.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.network = Network::random(rng);
        debug!("randomized network weights");
    }

    /// Current value of `cell`, or `None` for an out-of-range address.
    pub fn weight(&self, cell: WeightCell) -> Option<f32> {
        if !cell.is_valid() {
            return None;
        }
        Some(match cell {
            WeightCell::Hidden { unit, input } => self.network.hidden_weight(unit, input),
            WeightCell::Output { unit } => self.network.output_weight(unit),
        })
    }

    /// Sets `cell` to `value` clamped to `[-1, 1]`. Returns the stored value.
    pub fn set_weight(&mut self, cell: WeightCell, value: f32) -> Option<f32> {
        if !cell.is_valid() || value.is_nan() {
            return None;
        }
        let value = value.clamp(-1.0, 1.0);
        match cell {
            WeightCell::Hidden { unit, input } => self.network.set_hidden_weight(unit, input, value),
            WeightCell::Output { unit } => self.network.set_output_weight(unit, value),
        }
        Some(value)
    }

    /// Applies a scroll-wheel delta to `cell`.
    pub fn apply_wheel(&mut self, cell: WeightCell, delta: f32) -> Option<f32> {
        let current = self.weight(cell)?;
        self.set_weight(cell, current + delta * WHEEL_SENSITIVITY)
    }

    /// Swatch colour for a cell: blue at -1, through purple, to red at +1.
    /// Weights outside `[-1, 1]` (from [`SceneState::new`]) saturate.
    pub fn cell_color(&self, cell: WeightCell) -> Option<[u8; 3]> {
        let w = self.weight(cell)?.clamp(-1.0, 1.0);
        let v = (100.0 * (w + 1.0) / 2.0).round() as u8;
        Some([50 + v, 50, 150 - v])
    }

    pub fn snapshot(&self) -> FrameInputs {
        FrameInputs {
            network: self.network,
            iso_level: self.iso_level,
        }
    }
}
