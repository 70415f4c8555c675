// src/renderer.rs

//! This module defines the `Renderer`.
//!
//! The `Renderer` turns one `FrameInputs` snapshot into pixels. It runs the
//! two passes the scene is made of, in order:
//!
//! 1. the line pass: every field line is traced, projected and drawn with
//!    additive blending;
//! 2. the surface pass: one `SurfaceLocator` query per pixel, blended over
//!    the lines with the hit's alpha. Misses leave the pixel untouched.
//!
//! The surface pass is split into horizontal stripes rendered on scoped
//! threads. Every query only reads the snapshot, so stripes need no
//! synchronisation beyond owning disjoint slices of the frame.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bitflags::bitflags;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::color::Rgba;
use crate::controls::FrameInputs;
use crate::locator::SurfaceLocator;
use crate::tracer::{is_visible, line_color, line_seeds, FieldLine, FieldLineTracer, TracedVertex};

bitflags! {
    /// Which passes a frame draws.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RenderPasses: u8 {
        const LINES   = 1 << 0;
        const SURFACE = 1 << 1;
    }
}

impl Default for RenderPasses {
    fn default() -> Self {
        RenderPasses::all()
    }
}

/// A framebuffer of linear colours, row-major, top row first.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<Rgba>,
}

impl Frame {
    /// Creates a black frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![Rgba::BLACK; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(Rgba::BLACK);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        self.data[y * self.width + x]
    }

    /// Writes the frame as a binary PPM (`P6`), dropping alpha.
    pub fn write_ppm<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create frame file {}", path.display()))?;
        let mut out = BufWriter::new(file);
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        for pixel in &self.data {
            out.write_all(&pixel.to_rgb8())?;
        }
        out.flush()
            .with_context(|| format!("Failed to flush frame file {}", path.display()))?;
        Ok(())
    }
}

/// Per-frame counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub surface_hits: usize,
    pub line_samples: usize,
}

/// Translates a scene snapshot into a `Frame`.
///
/// Holds only configuration and the static line-seed layout; `render`
/// borrows it immutably.
pub struct Renderer {
    locator: SurfaceLocator,
    tracer: FieldLineTracer,
    passes: RenderPasses,
    num_threads: usize,
    lines: Vec<FieldLine>,
}

impl Renderer {
    pub fn new(
        locator: SurfaceLocator,
        tracer: FieldLineTracer,
        passes: RenderPasses,
        num_threads: usize,
    ) -> Self {
        Self {
            locator,
            tracer,
            passes,
            num_threads: num_threads.max(1),
            lines: line_seeds(),
        }
    }

    pub fn passes(&self) -> RenderPasses {
        self.passes
    }

    /// Clears `frame` and draws both passes into it.
    pub fn render(&self, inputs: &FrameInputs, camera: &Camera, frame: &mut Frame) -> FrameStats {
        frame.clear();
        let mut stats = FrameStats::default();

        if self.passes.contains(RenderPasses::LINES) {
            stats.line_samples = self.draw_lines(inputs, camera, frame);
        }
        if self.passes.contains(RenderPasses::SURFACE) {
            stats.surface_hits = self.draw_surface(inputs, camera, frame);
        }

        debug!(
            "Renderer: iso {:.3}, {} surface hits, {} line samples",
            inputs.iso_level, stats.surface_hits, stats.line_samples
        );
        stats
    }

    /// Surface pass. Returns the number of pixels hit.
    fn draw_surface(&self, inputs: &FrameInputs, camera: &Camera, frame: &mut Frame) -> usize {
        let (width, height) = (frame.width, frame.height);
        if width == 0 || height == 0 {
            return 0;
        }

        let threads = self.num_threads.min(height);
        let rows_per_thread = height / threads;
        let remainder = height % threads;

        // Split the buffer into disjoint row stripes.
        let mut stripes = Vec::with_capacity(threads);
        let mut remaining = frame.data.as_mut_slice();
        let mut start_y = 0;
        for i in 0..threads {
            let rows = rows_per_thread + usize::from(i < remainder);
            let (chunk, rest) = remaining.split_at_mut(rows * width);
            stripes.push((chunk, start_y));
            remaining = rest;
            start_y += rows;
        }

        std::thread::scope(|s| {
            let handles: Vec<_> = stripes
                .into_iter()
                .map(|(chunk, start_y)| {
                    s.spawn(move || self.shade_stripe(inputs, camera, chunk, start_y, width, height))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .sum()
        })
    }

    fn shade_stripe(
        &self,
        inputs: &FrameInputs,
        camera: &Camera,
        chunk: &mut [Rgba],
        start_y: usize,
        width: usize,
        height: usize,
    ) -> usize {
        trace!("Renderer: stripe from row {} ({} rows)", start_y, chunk.len() / width);
        let mut hits = 0;
        for (offset, pixel) in chunk.iter_mut().enumerate() {
            let (x, y) = (offset % width, start_y + offset / width);
            let ray = camera.ray_for_pixel(x, y, width, height);
            let hit = self.locator.trace(&ray, &inputs.network, inputs.iso_level);
            *pixel = pixel.blend_over(hit.color());
            hits += usize::from(hit.is_hit());
        }
        hits
    }

    /// Line pass. Returns the number of samples blended.
    fn draw_lines(&self, inputs: &FrameInputs, camera: &Camera, frame: &mut Frame) -> usize {
        let decay = self.tracer.config().decay;
        let mut samples = 0;
        for line in &self.lines {
            let traced = self.tracer.trace_line(line, &inputs.network);
            for pair in traced.windows(2) {
                samples += draw_segment(&pair[0], &pair[1], inputs.iso_level, decay, camera, frame);
            }
        }
        samples
    }
}

/// Draws one line segment, interpolating position and field value per sample.
fn draw_segment(
    a: &TracedVertex,
    b: &TracedVertex,
    iso_level: f32,
    decay: f32,
    camera: &Camera,
    frame: &mut Frame,
) -> usize {
    let (Some(pa), Some(pb)) = (
        camera.project(a.position, frame.width, frame.height),
        camera.project(b.position, frame.width, frame.height),
    ) else {
        return 0;
    };

    let span = (pb.0 - pa.0).abs().max((pb.1 - pa.1).abs());
    if !span.is_finite() {
        return 0;
    }
    let steps = span.ceil() as usize + 1;

    let mut drawn = 0;
    for i in 0..steps {
        let t = if steps > 1 { i as f32 / (steps - 1) as f32 } else { 0.0 };
        let position = a.position.lerp(b.position, t);
        if !is_visible(position) {
            continue;
        }
        let x = pa.0 + (pb.0 - pa.0) * t;
        let y = pa.1 + (pb.1 - pa.1) * t;
        if x < 0.0 || y < 0.0 || x >= frame.width as f32 || y >= frame.height as f32 {
            continue;
        }
        let value = a.value + (b.value - a.value) * t;
        let idx = y as usize * frame.width + x as usize;
        frame.data[idx] = frame.data[idx].blend_additive(line_color(value, iso_level, decay));
        drawn += 1;
    }
    drawn
}

#[cfg(test)]
mod tests;
