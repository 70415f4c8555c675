// src/main.rs

use nnsurf::{
    config::{Config, CONFIG},
    tracer::FieldLineTracer,
    Camera, Frame, RenderPasses, Renderer, SceneState, SurfaceLocator,
};

use anyhow::Context;
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Main entry point for `nnsurf`.
///
/// Usage: `nnsurf [CONFIG.json]`. Without an argument the configuration comes
/// from `$NNSURF_CONFIG`, or defaults.
fn main() -> anyhow::Result<()> {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting nnsurf...");

    // --- Configuration ---
    let config = match std::env::args_os().nth(1) {
        Some(path) => Config::load(&path)?,
        None => CONFIG.clone(),
    };
    let anim = config.animation;
    if anim.fps <= 0.0 {
        anyhow::bail!("animation.fps must be positive, got {}", anim.fps);
    }

    // --- Scene ---
    let mut scene = SceneState::default();
    scene.randomize(&mut StdRng::seed_from_u64(anim.seed));
    scene.set_iso_level(anim.iso_start);
    scene.set_iso_speed(anim.iso_speed);
    scene.set_animate(anim.animate);
    info!(
        "Network initialized from seed {}; iso level {} (animated: {})",
        anim.seed,
        scene.iso_level(),
        scene.is_animating()
    );

    let camera = Camera::from_config(&config.camera);
    let threads = config.render.resolved_threads();
    let renderer = Renderer::new(
        SurfaceLocator::new(config.locator),
        FieldLineTracer::new(config.lines),
        config.render.passes,
        threads,
    );
    info!(
        "Renderer initialized: {}x{}, {} threads, passes {:?}, {:?} march",
        config.render.width,
        config.render.height,
        threads,
        renderer.passes(),
        config.locator.strategy
    );

    std::fs::create_dir_all(&config.output.directory).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output.directory.display()
        )
    })?;

    // --- Frame loop ---
    let mut frame = Frame::new(config.render.width, config.render.height);
    let dt = 1.0 / anim.fps;
    for index in 0..anim.frames {
        let inputs = scene.snapshot();
        let stats = renderer.render(&inputs, &camera, &mut frame);
        if stats.surface_hits == 0 && renderer.passes().contains(RenderPasses::SURFACE) {
            warn!("Frame {}: no surface visible at iso {:.3}", index, inputs.iso_level);
        }

        let path = config.output.frame_path(index);
        if let Err(e) = frame.write_ppm(&path) {
            error!(
                "Error writing frame {}: {:#}. Root cause: {:?}. Exiting.",
                index,
                e,
                e.root_cause()
            );
            return Err(e);
        }
        info!("Wrote {} (iso {:.3})", path.display(), inputs.iso_level);

        scene.advance(dt);
    }

    info!("nnsurf finished: {} frames.", anim.frames);
    Ok(())
}
