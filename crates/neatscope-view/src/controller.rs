//! Top-level orchestration: input events in, navigation/camera/view updates
//! out.
//!
//! The host event loop owns a window and a 10 ms timer and forwards
//! everything through the [`InputSink`] trait; the controller owns the
//! navigation state, the orbit camera, the loaded population, and the
//! current [`SubstrateView`].

use glam::Vec2;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use neatscope_engine::{Engine, NodeAddress, Population};

use crate::camera::{OrbitCamera, ScreenProjector};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::navigation::NavigationState;
use crate::view::{FrameGeometry, HudState, SubstrateView};

/// Host-agnostic key identity. The host maps its native key codes here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
    Char(char),
}

/// Modifier state delivered alongside key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
}

impl Modifiers {
    /// Shift scrubs ten steps at a time.
    fn step_multiplier(self) -> i64 {
        if self.shift {
            10
        } else {
            1
        }
    }
}

/// Pointer buttons the pick interaction distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

impl PointerButton {
    /// Override delta applied when picking an input node: primary raises,
    /// secondary lowers, anything else probes without changing the value.
    fn override_delta(self) -> f64 {
        match self {
            Self::Primary => 0.5,
            Self::Secondary => -0.5,
            Self::Other => 0.0,
        }
    }
}

/// Discrete commands the key mapping produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerCommand {
    StepGeneration(i64),
    StepIndividual(i64),
    StepRun(i64),
    Pick {
        point: Vec2,
        button: PointerButton,
    },
    Quit,
}

/// Capability interface the host event loop drives. One implementor, one
/// thread; every mutation happens inside these callbacks.
pub trait InputSink {
    /// Produces the geometry for the frame about to be drawn. Refreshes the
    /// network first if any override changed.
    fn on_frame(&mut self) -> FrameGeometry;
    fn on_resize(&mut self, width: u32, height: u32);
    fn on_key_down(&mut self, key: Key, modifiers: Modifiers);
    /// Navigation commands fire on release; reloads can fail fatally.
    fn on_key_up(&mut self, key: Key, modifiers: Modifiers) -> Result<(), ViewerError>;
    fn on_pointer_move(&mut self, x: f32, y: f32);
    fn on_pointer_down(&mut self, button: PointerButton, x: f32, y: f32);
    fn on_pointer_up(&mut self, button: PointerButton, x: f32, y: f32);
    /// Fixed-interval tick: integrates camera velocity and refreshes the
    /// hover selection.
    fn on_timer_tick(&mut self);
}

pub struct InteractionController {
    engine: Box<dyn Engine>,
    config: ViewerConfig,
    nav: NavigationState,
    camera: OrbitCamera,
    population: Box<dyn Population>,
    view: SubstrateView,
    viewport: (u32, u32),
    pointer: Vec2,
    needs_redraw: bool,
    quit: bool,
}

impl InteractionController {
    /// Loads the first reachable run and shows its first individual.
    pub fn new(engine: Box<dyn Engine>, config: ViewerConfig) -> Result<Self, ViewerError> {
        let mut nav = NavigationState::starting_at_run(config.initial_run);
        let population = load_population_retrying(engine.as_ref(), &config, &mut nav)?;
        let view = build_view(engine.as_ref(), population.as_ref(), &mut nav, None)?;
        let viewport = config.viewport;
        Ok(Self {
            engine,
            config,
            nav,
            camera: OrbitCamera::default(),
            population,
            view,
            viewport,
            pointer: Vec2::ZERO,
            needs_redraw: true,
            quit: false,
        })
    }

    #[must_use]
    pub fn navigation(&self) -> NavigationState {
        self.nav
    }

    #[must_use]
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    #[must_use]
    pub fn view(&self) -> &SubstrateView {
        &self.view
    }

    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Rebuilds the substrate view for the navigated individual. The
    /// existing view's override map carries over; only the very first view
    /// starts from the experiment defaults.
    fn reload_individual(&mut self) -> Result<(), ViewerError> {
        let carried = self.view.take_overrides();
        self.view = build_view(
            self.engine.as_ref(),
            self.population.as_ref(),
            &mut self.nav,
            Some(carried),
        )?;
        self.needs_redraw = true;
        Ok(())
    }

    /// Applies one discrete command. Any generation/individual/run change
    /// reloads the substrate.
    pub fn apply(&mut self, command: ViewerCommand) -> Result<(), ViewerError> {
        match command {
            ViewerCommand::StepGeneration(delta) => {
                self.nav
                    .step_generation(delta, self.population.generation_count());
                self.reload_individual()?;
            }
            ViewerCommand::StepIndividual(delta) => {
                self.nav
                    .step_individual(delta, self.population.individual_count(self.nav.generation));
                self.reload_individual()?;
            }
            ViewerCommand::StepRun(delta) => {
                self.nav.step_run(delta);
                self.population =
                    load_population_retrying(self.engine.as_ref(), &self.config, &mut self.nav)?;
                self.reload_individual()?;
            }
            ViewerCommand::Pick { point, button } => self.pick(point, button),
            ViewerCommand::Quit => {
                info!("quit requested");
                self.quit = true;
            }
        }
        Ok(())
    }

    fn pick(&mut self, point: Vec2, button: PointerButton) {
        let Some(node) = self.view.pick_at(point) else {
            debug!(x = point.x, y = point.y, "pick missed");
            return;
        };
        if !node.is_input() {
            debug!(%node, "pick ignored: not an input node");
            return;
        }
        self.view.nudge_override(node, button.override_delta());
        self.needs_redraw = true;
    }
}

impl InputSink for InteractionController {
    fn on_frame(&mut self) -> FrameGeometry {
        let hud = HudState {
            run: self.nav.run,
            generation: self.nav.generation,
            generation_count: self.population.generation_count(),
            individual: self.nav.individual,
            individual_count: self.population.individual_count(self.nav.generation),
        };
        let projector = ScreenProjector::new(
            &self.camera,
            self.viewport,
            self.config.fov_y_degrees.to_radians(),
            self.config.near,
            self.config.far,
        );
        self.view.refresh_if_dirty();
        self.view.rebuild_pick_rects(&projector);
        self.needs_redraw = false;
        self.view.frame_geometry(hud)
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
        self.needs_redraw = true;
    }

    fn on_key_down(&mut self, key: Key, _modifiers: Modifiers) {
        let speed = self.config.camera_speed;
        let zoom = self.config.zoom_speed();
        match key {
            Key::ArrowUp => self.camera.adjust_tilt_velocity(speed),
            Key::ArrowDown => self.camera.adjust_tilt_velocity(-speed),
            Key::ArrowLeft => self.camera.adjust_turn_velocity(-speed),
            Key::ArrowRight => self.camera.adjust_turn_velocity(speed),
            Key::Char('q') => self.camera.adjust_distance_velocity(-zoom),
            Key::Char('e') => self.camera.adjust_distance_velocity(zoom),
            _ => {}
        }
    }

    fn on_key_up(&mut self, key: Key, modifiers: Modifiers) -> Result<(), ViewerError> {
        let speed = self.config.camera_speed;
        let zoom = self.config.zoom_speed();
        match key {
            Key::ArrowUp => self.camera.adjust_tilt_velocity(-speed),
            Key::ArrowDown => self.camera.adjust_tilt_velocity(speed),
            Key::ArrowLeft => self.camera.adjust_turn_velocity(speed),
            Key::ArrowRight => self.camera.adjust_turn_velocity(-speed),
            Key::Char('q') => self.camera.adjust_distance_velocity(zoom),
            Key::Char('e') => self.camera.adjust_distance_velocity(-zoom),
            _ => {
                if let Some(command) = command_for_key(key, modifiers) {
                    self.apply(command)?;
                }
            }
        }
        Ok(())
    }

    fn on_pointer_move(&mut self, x: f32, y: f32) {
        self.pointer = Vec2::new(x, y);
    }

    fn on_pointer_down(&mut self, _button: PointerButton, _x: f32, _y: f32) {
        // Interaction happens on release.
    }

    fn on_pointer_up(&mut self, button: PointerButton, x: f32, y: f32) {
        self.pick(Vec2::new(x, y), button);
    }

    fn on_timer_tick(&mut self) {
        let dt = self.config.timer_period_secs();
        self.camera.tick(dt);
        let hovered = self.view.pick_at(self.pointer);
        self.view.set_hovered(hovered);
        self.needs_redraw = true;
    }
}

/// Maps released keys to navigation commands. The shifted punctuation
/// variants arrive when the host reports characters rather than raw keys.
fn command_for_key(key: Key, modifiers: Modifiers) -> Option<ViewerCommand> {
    let step = modifiers.step_multiplier();
    match key {
        Key::Escape => Some(ViewerCommand::Quit),
        Key::Char('[') => Some(ViewerCommand::StepGeneration(-step)),
        Key::Char('{') => Some(ViewerCommand::StepGeneration(-10)),
        Key::Char(']') => Some(ViewerCommand::StepGeneration(step)),
        Key::Char('}') => Some(ViewerCommand::StepGeneration(10)),
        Key::Char(',') => Some(ViewerCommand::StepIndividual(-step)),
        Key::Char('<') => Some(ViewerCommand::StepIndividual(-10)),
        Key::Char('.') => Some(ViewerCommand::StepIndividual(step)),
        Key::Char('>') => Some(ViewerCommand::StepIndividual(10)),
        Key::Char('=') => Some(ViewerCommand::StepRun(1)),
        Key::Char('-') => Some(ViewerCommand::StepRun(-1)),
        _ => None,
    }
}

/// Builds the view shown for the navigated individual: clamps the indices
/// against the population, populates a fresh substrate, and seeds the
/// override map (carried from the previous view, or the experiment defaults
/// when this is the first view of the session).
fn build_view(
    engine: &dyn Engine,
    population: &dyn Population,
    nav: &mut NavigationState,
    carried: Option<HashMap<NodeAddress, f64>>,
) -> Result<SubstrateView, ViewerError> {
    nav.step_generation(0, population.generation_count());
    nav.clamp_individual(population.individual_count(nav.generation));

    let overrides =
        carried.unwrap_or_else(|| engine.experiment_type().default_overrides());
    let genome = population.individual(nav.individual, nav.generation)?;
    let mut substrate = engine.new_substrate();
    substrate.populate(genome)?;
    info!(
        run = nav.run,
        generation = nav.generation,
        individual = nav.individual,
        overrides = overrides.len(),
        "substrate reloaded"
    );
    Ok(SubstrateView::new(
        substrate,
        engine.experiment_type(),
        overrides,
    ))
}

/// Tries the navigated run first, then advances run by run until a
/// population loads. Bounded by attempt count, not wall clock; exhaustion is
/// fatal.
fn load_population_retrying(
    engine: &dyn Engine,
    config: &ViewerConfig,
    nav: &mut NavigationState,
) -> Result<Box<dyn Population>, ViewerError> {
    for _ in 0..config.max_load_attempts {
        let path = config.population_path(nav.run);
        match engine.load_population(&path) {
            Ok(population) => {
                info!(run = nav.run, path = %path.display(), "population loaded");
                return Ok(population);
            }
            Err(err) => {
                debug!(run = nav.run, %err, "population load failed; trying next run");
                nav.run += 1;
            }
        }
    }
    warn!(
        attempts = config.max_load_attempts,
        "exhausted population load attempts"
    );
    Err(ViewerError::PopulationLoadExhausted {
        attempts: config.max_load_attempts,
        last_run: nav.run.saturating_sub(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_multiplies_navigation_steps() {
        let shifted = Modifiers { shift: true };
        assert_eq!(
            command_for_key(Key::Char(']'), shifted),
            Some(ViewerCommand::StepGeneration(10))
        );
        assert_eq!(
            command_for_key(Key::Char(']'), Modifiers::default()),
            Some(ViewerCommand::StepGeneration(1))
        );
        assert_eq!(
            command_for_key(Key::Char('<'), Modifiers::default()),
            Some(ViewerCommand::StepIndividual(-10))
        );
    }

    #[test]
    fn escape_quits_and_unmapped_keys_do_nothing() {
        assert_eq!(
            command_for_key(Key::Escape, Modifiers::default()),
            Some(ViewerCommand::Quit)
        );
        assert_eq!(command_for_key(Key::Char('z'), Modifiers::default()), None);
    }

    #[test]
    fn pointer_buttons_map_to_override_deltas() {
        assert_eq!(PointerButton::Primary.override_delta(), 0.5);
        assert_eq!(PointerButton::Secondary.override_delta(), -0.5);
        assert_eq!(PointerButton::Other.override_delta(), 0.0);
    }
}
