// src/renderer/tests.rs

use super::*;
use crate::locator::{HitResult, LocatorConfig, MarchStrategy};
use crate::network::Network;
use crate::tracer::LineConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use test_log::test; // For logging within tests

// --- Test Helpers ---

fn renderer(passes: RenderPasses, threads: usize) -> Renderer {
    Renderer::new(
        SurfaceLocator::new(LocatorConfig::default()),
        FieldLineTracer::new(LineConfig::default()),
        passes,
        threads,
    )
}

fn inputs(network: Network, iso_level: f32) -> FrameInputs {
    FrameInputs { network, iso_level }
}

fn camera() -> Camera {
    Camera::orbit(0.5, 0.5, 10.0)
}

// --- Tests ---

#[test]
fn off_level_flat_field_leaves_frame_black() {
    let r = renderer(RenderPasses::SURFACE, 2);
    let mut frame = Frame::new(24, 16);
    let stats = r.render(&inputs(Network::zeros(), 0.5), &camera(), &mut frame);
    assert_eq!(stats.surface_hits, 0);
    assert!(frame.data.iter().all(|p| *p == Rgba::BLACK));
}

#[test]
fn on_level_flat_field_covers_the_sphere_disc() {
    let r = renderer(RenderPasses::SURFACE, 3);
    let mut frame = Frame::new(32, 32);
    let stats = r.render(&inputs(Network::zeros(), 0.0), &camera(), &mut frame);
    assert!(stats.surface_hits > 0);
    // The centre of the view looks straight through the sphere.
    assert_ne!(frame.pixel(16, 16), Rgba::BLACK);
    // The corners look past it.
    assert_eq!(frame.pixel(0, 0), Rgba::BLACK);
    assert_eq!(frame.pixel(31, 31), Rgba::BLACK);
}

#[test]
fn thread_count_does_not_change_the_image() {
    let net = Network::random(&mut StdRng::seed_from_u64(4));
    let frame_inputs = inputs(net, 0.42);
    let mut single = Frame::new(20, 15);
    let mut multi = Frame::new(20, 15);
    let a = renderer(RenderPasses::all(), 1).render(&frame_inputs, &camera(), &mut single);
    let b = renderer(RenderPasses::all(), 4).render(&frame_inputs, &camera(), &mut multi);
    assert_eq!(a, b);
    assert_eq!(single, multi);
}

#[test]
fn more_threads_than_rows_is_fine() {
    let r = renderer(RenderPasses::SURFACE, 16);
    let mut frame = Frame::new(8, 3);
    r.render(&inputs(Network::zeros(), 0.0), &camera(), &mut frame);
    assert_eq!(frame.data.len(), 24);
}

#[test]
fn line_pass_draws_samples_for_a_sloped_field() {
    let mut net = Network::zeros();
    net.set_hidden_row(0, [0.0, 1.0, 0.0, 0.0]);
    net.set_output_weight(0, 1.0);
    let r = renderer(RenderPasses::LINES, 1);
    let mut frame = Frame::new(48, 48);
    let stats = r.render(&inputs(net, 0.1), &camera(), &mut frame);
    assert!(stats.line_samples > 0);
    assert_eq!(stats.surface_hits, 0);
    assert!(frame.data.iter().any(|p| p.r > 0.0));
}

#[test]
fn surface_pass_blends_with_hit_alpha() {
    let locator = SurfaceLocator::new(LocatorConfig {
        strategy: MarchStrategy::FloorScan,
        ..LocatorConfig::default()
    });
    let r = Renderer::new(locator, FieldLineTracer::default(), RenderPasses::SURFACE, 1);
    let mut frame = Frame::new(9, 9);
    r.render(&inputs(Network::zeros(), 0.0), &camera(), &mut frame);

    let hit = locator.trace(&camera().ray_for_pixel(4, 4, 9, 9), &Network::zeros(), 0.0);
    let HitResult::Hit { color, .. } = hit else {
        panic!("centre ray missed");
    };
    // Black background under an alpha 0.6 surface.
    let centre = frame.pixel(4, 4);
    assert!((centre.r - color.r * 0.6).abs() < 1e-6);
    assert!((centre.g - color.g * 0.6).abs() < 1e-6);
}

#[test]
fn misses_composite_as_transparent() {
    let dst = Rgba::new(0.2, 0.4, 0.6, 1.0);
    assert_eq!(HitResult::Miss.color(), Rgba::TRANSPARENT);
    assert_eq!(dst.blend_over(HitResult::Miss.color()), dst);
}

#[test]
fn ppm_output_has_header_and_rgb_payload() {
    let mut frame = Frame::new(3, 2);
    frame.data[0] = Rgba::new(1.0, 0.0, 0.0, 1.0);
    let path = std::env::temp_dir().join("nnsurf_renderer_test.ppm");
    frame.write_ppm(&path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let header = b"P6\n3 2\n255\n";
    assert_eq!(&bytes[..header.len()], header);
    assert_eq!(bytes.len(), header.len() + 3 * 2 * 3);
    assert_eq!(&bytes[header.len()..header.len() + 3], &[255, 0, 0]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn render_passes_round_trip_through_json() {
    let json = serde_json::to_string(&RenderPasses::SURFACE).unwrap();
    let back: RenderPasses = serde_json::from_str(&json).unwrap();
    assert_eq!(back, RenderPasses::SURFACE);
    assert_eq!(RenderPasses::default(), RenderPasses::LINES | RenderPasses::SURFACE);
}
