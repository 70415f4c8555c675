// src/tracer/tests.rs

use super::*;
use crate::field::FnField;
use crate::network::Network;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn z_selector() -> Network {
    let mut net = Network::zeros();
    net.set_hidden_row(0, [0.0, 0.0, 1.0, 0.0]);
    net.set_output_weight(0, 1.0);
    net
}

#[test_log::test]
fn zero_step_vertices_stay_on_their_seed() {
    let mut rng = StdRng::seed_from_u64(5);
    let tracer = FieldLineTracer::default();
    for _ in 0..10 {
        let net = Network::random(&mut rng);
        for line in line_seeds().iter().step_by(37) {
            let vertex = line[0];
            assert_eq!(vertex.step_scale(tracer.config()), 0.0);
            let traced = tracer.trace(&vertex, &net);
            assert_eq!(traced.position, vertex.seed);
        }
    }
}

#[test_log::test]
fn flat_field_yields_zero_displacement() {
    let tracer = FieldLineTracer::default();
    let net = Network::zeros();
    let vertex = LineVertex {
        seed: Vec3::new(1.2, -2.4, 3.6),
        step_index: 9,
    };
    let traced = tracer.trace(&vertex, &net);
    assert_eq!(traced.position, vertex.seed);
    assert!(traced.position.is_finite());
    assert_eq!(traced.value, 0.0);
}

#[test_log::test]
fn vertices_climb_the_gradient() {
    let tracer = FieldLineTracer::default();
    let net = z_selector();
    let vertex = LineVertex {
        seed: Vec3::new(0.5, 0.5, -1.0),
        step_index: 5,
    };
    let traced = tracer.trace(&vertex, &net);
    // 20 steps of 5 · 0.02 straight up the z axis.
    assert!((traced.position.z - 1.0).abs() < 1e-4, "{:?}", traced);
    assert!((traced.position.x - 0.5).abs() < 1e-6);
    assert!((traced.value - 1.0f32.tanh()).abs() < 1e-4);
}

#[test_log::test]
fn index_offset_reverses_low_vertices() {
    let tracer = FieldLineTracer::new(LineConfig {
        index_offset: 4,
        ..LineConfig::default()
    });
    let net = z_selector();
    let vertex = LineVertex {
        seed: Vec3::ZERO,
        step_index: 2,
    };
    assert!((vertex.step_scale(tracer.config()) + 0.04).abs() < 1e-7);
    let traced = tracer.trace(&vertex, &net);
    assert!((traced.position.z + 0.8).abs() < 1e-4);
}

#[test_log::test]
fn advance_guards_vanishing_gradient() {
    let tracer = FieldLineTracer::default();
    // Flat near the origin, so the central difference cancels exactly.
    let field = FnField(|p: Vec3| if p.length() < 1.0 { 2.0 } else { p.x });
    let p = tracer.advance(Vec3::ZERO, 0.5, &field);
    assert_eq!(p, Vec3::ZERO);
}

#[test_log::test]
fn line_opacity_peaks_at_the_iso_level() {
    let at_level = line_color(0.3, 0.3, 7.0);
    assert!((at_level.a - LINE_ALPHA).abs() < 1e-6);
    let later = line_color(0.3, 0.8, 7.0);
    assert!((later.a - (-3.5f32).exp() * LINE_ALPHA).abs() < 1e-6);
    // Iso level just below the value wraps to almost a full unit.
    let before = line_color(0.3, 0.29, 7.0);
    assert!(before.a < 0.001);
    assert!((at_level.r - 0.53).abs() < 1e-6);
    assert!((at_level.b - 0.425).abs() < 1e-6);
}

#[test_log::test]
fn vertices_outside_the_sphere_are_hidden() {
    let inside = TracedVertex {
        position: Vec3::new(0.0, 4.9, 0.0),
        value: 0.0,
    };
    let outside = TracedVertex {
        position: Vec3::new(4.0, 4.0, 0.0),
        value: 0.0,
    };
    assert!(inside.visible());
    assert!(!outside.visible());
}

#[test_log::test]
fn seed_grid_layout() {
    let lines = line_seeds();
    assert_eq!(lines.len(), 512);
    let first = &lines[0];
    assert_eq!(first[0].seed, Vec3::splat(-4.0 * SEED_SCALE));
    for (i, v) in first.iter().enumerate() {
        assert_eq!(v.step_index as usize, i);
        assert_eq!(v.seed, first[0].seed);
    }
    let last = &lines[511];
    assert_eq!(last[0].seed, Vec3::splat(3.0 * SEED_SCALE));
}

#[test_log::test]
fn trace_all_matches_per_vertex_tracing() {
    let mut rng = StdRng::seed_from_u64(21);
    let net = Network::random(&mut rng);
    let tracer = FieldLineTracer::default();
    let lines = &line_seeds()[..4];
    let traced = tracer.trace_all(lines, &net);
    for (line, out) in lines.iter().zip(traced.iter()) {
        for (v, t) in line.iter().zip(out.iter()) {
            assert_eq!(tracer.trace(v, &net), *t);
        }
    }
}
