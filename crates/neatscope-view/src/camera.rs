//! Orbit camera and screen projection.
//!
//! The camera orbits a fixed look-at point on a sphere parameterized by
//! distance, tilt (lookdown) and heading. Held keys feed edge-triggered
//! velocity accumulators that a fixed 10 ms timer integrates; there is no
//! physical damping.

use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Motion limits and key increments.
#[derive(Debug, Clone, Copy)]
pub struct CameraMotion {
    pub min_distance: f32,
}

impl Default for CameraMotion {
    fn default() -> Self {
        Self { min_distance: 1.0 }
    }
}

/// Spherical orbit around a look-at point.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    motion: CameraMotion,
    look_at: Vec3,
    distance: f32,
    /// Lookdown angle, clamped to [0, π/2].
    tilt: f32,
    /// Heading, wrapped into (-π, π].
    heading: f32,
    tilt_velocity: f32,
    turn_velocity: f32,
    distance_velocity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        // Historical starting pose: eye at (0, 15, -15) looking at the origin.
        Self {
            motion: CameraMotion::default(),
            look_at: Vec3::ZERO,
            distance: (15.0f32 * 15.0 + 15.0 * 15.0).sqrt(),
            tilt: 45.0f32.to_radians(),
            heading: PI,
            tilt_velocity: 0.0,
            turn_velocity: 0.0,
            distance_velocity: 0.0,
        }
    }
}

impl OrbitCamera {
    #[inline]
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    #[inline]
    #[must_use]
    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    #[inline]
    #[must_use]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    /// Key-edge hooks: key-down passes a positive increment, key-up the same
    /// increment negated, so a held key contributes exactly once.
    pub fn adjust_tilt_velocity(&mut self, delta: f32) {
        self.tilt_velocity += delta;
    }

    pub fn adjust_turn_velocity(&mut self, delta: f32) {
        self.turn_velocity += delta;
    }

    pub fn adjust_distance_velocity(&mut self, delta: f32) {
        self.distance_velocity += delta;
    }

    /// One fixed timer step. Angles integrate at `velocity * dt`; distance
    /// moves a full velocity increment per tick (legacy behavior, kept).
    pub fn tick(&mut self, dt: f32) {
        self.tilt = (self.tilt + self.tilt_velocity * dt).clamp(0.0, FRAC_PI_2);
        self.heading = wrap_signed_angle(self.heading + self.turn_velocity * dt);
        self.distance = (self.distance + self.distance_velocity).max(self.motion.min_distance);
    }

    /// Eye position from the spherical parameters.
    ///
    /// One formula for every caller: with horizontal radius r = d·cos(tilt),
    /// eye = look_at + (r·sin(heading), d·sin(tilt), r·cos(heading)).
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        let radius = self.distance * self.tilt.cos();
        self.look_at
            + Vec3::new(
                radius * self.heading.sin(),
                self.distance * self.tilt.sin(),
                radius * self.heading.cos(),
            )
    }

    #[must_use]
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }
}

fn wrap_signed_angle(mut angle: f32) -> f32 {
    if angle.is_nan() {
        return 0.0;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

/// World→screen projection for one frame: perspective × look-at, with the
/// vertical axis flipped so (0, 0) is the window's top-left pixel.
#[derive(Debug, Clone, Copy)]
pub struct ScreenProjector {
    view_proj: Mat4,
    viewport: Vec2,
}

impl ScreenProjector {
    #[must_use]
    pub fn new(camera: &OrbitCamera, viewport: (u32, u32), fov_y: f32, near: f32, far: f32) -> Self {
        let width = viewport.0.max(1) as f32;
        let height = viewport.1.max(1) as f32;
        let proj = Mat4::perspective_rh(fov_y, width / height, near, far);
        let view = Mat4::look_at_rh(camera.eye(), camera.look_at(), Vec3::Y);
        Self {
            view_proj: proj * view,
            viewport: Vec2::new(width, height),
        }
    }

    /// Projects a world point to screen pixels (top-left origin).
    #[must_use]
    pub fn project(&self, world: Vec3) -> Vec2 {
        let ndc = self.view_proj.project_point3(world);
        let x = (ndc.x + 1.0) * 0.5 * self.viewport.x;
        let y_up = (ndc.y + 1.0) * 0.5 * self.viewport.y;
        Vec2::new(x, (self.viewport.y - 1.0) - y_up)
    }
}
