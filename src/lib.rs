// src/lib.rs

//! `nnsurf` renders the level sets of a tiny neural network.
//!
//! A 4→8→1 tanh network defines a scalar field over space. Its surfaces are
//! every place where `field - iso` is an integer. [`SurfaceLocator`] finds
//! them along view rays inside a sphere of radius 5, and [`FieldLineTracer`]
//! bends a fixed grid of seed lines along the field gradient. The
//! [`Renderer`] draws both into a [`Frame`].

pub mod camera;
pub mod color;
pub mod config;
pub mod controls;
pub mod field;
pub mod locator;
pub mod math;
pub mod network;
pub mod renderer;
pub mod tracer;

pub use camera::Camera;
pub use color::Rgba;
pub use config::{Config, CONFIG};
pub use controls::{FrameInputs, SceneState, WeightCell};
pub use field::ScalarField;
pub use locator::{HitResult, MarchStrategy, Ray, SurfaceLocator};
pub use math::Vec3;
pub use network::Network;
pub use renderer::{Frame, RenderPasses, Renderer};
pub use tracer::FieldLineTracer;
