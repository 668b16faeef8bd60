//! Headless demo host for the substrate viewer.
//!
//! The real deployment hands a window and an input loop to the controller;
//! this binary stands in for that host by scripting a short session against
//! the in-memory engine: boot, scrub a few generations, orbit the camera,
//! click an input node, and report what the frame would draw.

use anyhow::{Context, Result};
use neatscope_engine::scripted::ScriptedEngine;
use neatscope_engine::ExperimentType;
use neatscope_view::{
    InputSink, InteractionController, Key, Modifiers, PointerButton, ViewerConfig,
};
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let config = load_config()?;
    let engine = demo_engine(&config);
    let mut controller = InteractionController::new(Box::new(engine), config)
        .context("booting the viewer against the demo populations")?;

    info!("neatscope demo session starting");
    run_demo_session(&mut controller)?;

    let frame = controller.on_frame();
    for line in frame.hud.lines() {
        info!("{line}");
    }
    info!(
        plates = frame.plates.len(),
        nodes = frame.nodes.len(),
        "final frame geometry"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Reads `NEATSCOPE_CONFIG` (a JSON file) when set, defaults otherwise.
fn load_config() -> Result<ViewerConfig> {
    match std::env::var_os("NEATSCOPE_CONFIG") {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.to_string_lossy()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.to_string_lossy()))
        }
        None => Ok(ViewerConfig {
            population_template: "demo/population_run$RUN_NUMBER$.xml.gz".into(),
            ..ViewerConfig::default()
        }),
    }
}

/// Scripted populations for runs 3-5; runs 1-2 are deliberately absent so
/// the boot path exercises the forward-retry policy.
fn demo_engine(config: &ViewerConfig) -> ScriptedEngine {
    let mut engine = ScriptedEngine::new(ExperimentType(15), 0x5EED);
    for run in 3..=5 {
        engine = engine.with_population(config.population_path(run), 20, 8);
    }
    engine
}

fn run_demo_session(controller: &mut InteractionController) -> Result<()> {
    controller.on_resize(800, 600);

    // Scrub: ten generations forward (shift = x10), one individual forward.
    controller.on_key_up(Key::Char(']'), Modifiers { shift: true })?;
    controller.on_key_up(Key::Char('.'), Modifiers::default())?;

    // Orbit for half a second of timer ticks with the right arrow held.
    controller.on_key_down(Key::ArrowRight, Modifiers::default());
    for _ in 0..50 {
        controller.on_timer_tick();
    }
    controller.on_key_up(Key::ArrowRight, Modifiers::default())?;

    // Click the rearmost pick rect; after the front-to-back reversal that is
    // the first input-layer node.
    let _ = controller.on_frame();
    if let Some((rect, node)) = controller.view().pick_rects().last().copied() {
        let point = (rect.min + rect.max) * 0.5;
        info!(%node, "clicking rearmost pick rect");
        controller.on_pointer_move(point.x, point.y);
        controller.on_pointer_up(PointerButton::Primary, point.x, point.y);
        controller.on_timer_tick();
    }

    let nav = controller.navigation();
    info!(
        run = nav.run,
        generation = nav.generation,
        individual = nav.individual,
        tilt = controller.camera().tilt(),
        heading = controller.camera().heading(),
        "demo session state"
    );
    Ok(())
}
