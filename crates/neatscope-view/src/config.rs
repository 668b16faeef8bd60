use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder substituted with the current run number when resolving the
/// population path.
pub const RUN_NUMBER_PLACEHOLDER: &str = "$RUN_NUMBER$";

/// Static viewer configuration, computed once at startup and passed into the
/// controller. Replaces the module-level globals of earlier incarnations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Population file path with a `$RUN_NUMBER$` placeholder.
    pub population_template: String,
    /// Run number tried first.
    pub initial_run: u32,
    /// Load attempts (advancing the run number each time) before giving up.
    pub max_load_attempts: u32,
    /// Angular velocity increment per held key, radians-ish per second.
    pub camera_speed: f32,
    /// Distance velocity increment as a fraction of `camera_speed`.
    pub zoom_speed_factor: f32,
    /// Fixed timer period driving camera integration, in milliseconds.
    pub timer_period_ms: u32,
    /// Initial viewport size in pixels.
    pub viewport: (u32, u32),
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            population_template: format!("population_run{RUN_NUMBER_PLACEHOLDER}.xml.gz"),
            initial_run: 1,
            max_load_attempts: 1000,
            camera_speed: 5.0,
            zoom_speed_factor: 0.25,
            timer_period_ms: 10,
            viewport: (640, 480),
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl ViewerConfig {
    /// Resolves the population path for a concrete run number.
    #[must_use]
    pub fn population_path(&self, run: u32) -> PathBuf {
        PathBuf::from(
            self.population_template
                .replace(RUN_NUMBER_PLACEHOLDER, &run.to_string()),
        )
    }

    /// Timer period in seconds, the dt fed to camera integration.
    #[must_use]
    pub fn timer_period_secs(&self) -> f32 {
        self.timer_period_ms as f32 / 1000.0
    }

    /// Distance velocity increment per held zoom key.
    #[must_use]
    pub fn zoom_speed(&self) -> f32 {
        self.camera_speed * self.zoom_speed_factor
    }
}
