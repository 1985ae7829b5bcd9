//! Camera controls and orbit navigation

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use std::f32::consts::{PI, TAU};

use crate::config::SceneConfig;

/// Keeps the polar angle away from the poles so `looking_at` stays defined
const POLAR_EPSILON: f32 = 1e-4;
/// Pixels of smooth scrolling that count as one wheel notch
const PIXELS_PER_LINE: f32 = 100.0;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Orbit camera state, driven by pointer input and advanced once per frame
///
/// Input accumulates into pending deltas; `update` applies them. With damping
/// enabled only a `damping_factor` share is applied per step and the rest
/// decays, which gives the camera its glide after the pointer is released.
#[derive(Debug, Clone, Component)]
pub struct OrbitControls {
    pub target: Vec3,
    pub radius: f32,
    /// Azimuth around +Y, measured from +Z towards +X
    pub theta: f32,
    /// Polar angle from +Y
    pub phi: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,
    attached: bool,
}

impl OrbitControls {
    /// Build controls orbiting `target` from the camera's current `position`
    pub fn from_camera(position: Vec3, target: Vec3, config: &SceneConfig) -> Self {
        let offset = position - target;
        let radius = offset.length();
        let (theta, phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, PI / 2.0)
        };

        let controls = &config.controls;
        Self {
            target,
            radius,
            theta,
            phi,
            enable_damping: controls.enable_damping,
            damping_factor: controls.damping_factor,
            enable_zoom: controls.enable_zoom,
            enable_pan: controls.enable_pan,
            rotate_speed: controls.rotate_speed,
            zoom_speed: controls.zoom_speed,
            pan_speed: controls.pan_speed,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            attached: true,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Stop listening to input and drop anything still pending
    pub fn release(&mut self) {
        self.attached = false;
        self.delta_theta = 0.0;
        self.delta_phi = 0.0;
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }

    pub fn rotate_left(&mut self, angle: f32) {
        if self.attached {
            self.delta_theta -= angle;
        }
    }

    pub fn rotate_up(&mut self, angle: f32) {
        if self.attached {
            self.delta_phi -= angle;
        }
    }

    /// Move the orbit target by a world-space offset
    pub fn pan(&mut self, offset: Vec3) {
        if self.attached && self.enable_pan {
            self.pan_offset += offset;
        }
    }

    /// Scale the orbit radius; values below 1 move the camera closer
    pub fn dolly(&mut self, factor: f32) {
        if self.attached && self.enable_zoom && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Radius multiplier for a single wheel notch
    pub fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    /// Advance one damping step and return the resulting camera position
    pub fn update(&mut self) -> Vec3 {
        if self.enable_damping {
            self.theta += self.delta_theta * self.damping_factor;
            self.phi += self.delta_phi * self.damping_factor;
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.theta += self.delta_theta;
            self.phi += self.delta_phi;
            self.target += self.pan_offset;
        }

        self.theta = wrap_angle(self.theta);
        self.phi = self.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = (self.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        self.position()
    }

    /// Camera position for the current spherical state
    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(sin_phi * self.theta.sin(), self.phi.cos(), sin_phi * self.theta.cos())
    }

    /// Whether any input is still being played out
    pub fn is_settling(&self) -> bool {
        self.delta_theta.abs() > f32::EPSILON
            || self.delta_phi.abs() > f32::EPSILON
            || self.pan_offset.length_squared() > f32::EPSILON
    }
}

fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Set the projection aspect ratio to match a surface of the given size
pub fn apply_viewport(projection: &mut PerspectiveProjection, width: u32, height: u32) {
    if height == 0 {
        return;
    }
    projection.aspect_ratio = width as f32 / height as f32;
}

/// Plugin for camera controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (orbit_input, orbit_update).chain());
    }
}

/// Translate pointer and touch input into orbit deltas
fn orbit_input(
    mut controls_query: Query<(&mut OrbitControls, &Transform, &Projection), With<MainCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
) {
    let Ok((mut controls, transform, projection)) = controls_query.single_mut() else {
        return;
    };
    if !controls.is_attached() {
        return;
    }

    let viewport_height = windows
        .single()
        .map(|window| window.height())
        .unwrap_or(1.0)
        .max(1.0);
    let fov = match projection {
        Projection::Perspective(perspective) => perspective.fov,
        _ => std::f32::consts::FRAC_PI_4,
    };

    // Rotation is normalized by height so a full-height drag is one turn
    let rotate = |controls: &mut OrbitControls, delta: Vec2| {
        let speed = controls.rotate_speed;
        controls.rotate_left(TAU * delta.x / viewport_height * speed);
        controls.rotate_up(TAU * delta.y / viewport_height * speed);
    };
    // Panning keeps the point under the pointer fixed at the target depth
    let pan = |controls: &mut OrbitControls, delta: Vec2| {
        let world_per_pixel = 2.0 * controls.radius * (fov / 2.0).tan() / viewport_height;
        let offset = (-transform.right() * delta.x + transform.up() * delta.y)
            * world_per_pixel
            * controls.pan_speed;
        controls.pan(offset);
    };

    let motion = mouse_motion.delta;
    if motion != Vec2::ZERO {
        if mouse_button.pressed(MouseButton::Left) {
            rotate(&mut *controls, motion);
        } else if mouse_button.pressed(MouseButton::Right) {
            pan(&mut *controls, motion);
        }
    }

    if mouse_scroll.delta.y != 0.0 {
        let notches = match mouse_scroll.unit {
            MouseScrollUnit::Line => mouse_scroll.delta.y,
            MouseScrollUnit::Pixel => mouse_scroll.delta.y / PIXELS_PER_LINE,
        };
        // Scrolling up moves the camera closer
        let factor = controls.zoom_scale().powf(notches);
        controls.dolly(factor);
    }

    let active: Vec<_> = touches.iter().collect();
    match active.as_slice() {
        [touch] => rotate(&mut *controls, touch.delta()),
        [first, second] => {
            let current = first.position().distance(second.position());
            let previous = first.previous_position().distance(second.previous_position());
            if current > 1.0 {
                controls.dolly(previous / current);
            }
            let midpoint_delta = (first.delta() + second.delta()) / 2.0;
            pan(&mut *controls, midpoint_delta);
        }
        _ => {}
    }
}

/// Step the damping once per frame and move the camera
fn orbit_update(mut camera_query: Query<(&mut OrbitControls, &mut Transform), With<MainCamera>>) {
    for (mut controls, mut transform) in camera_query.iter_mut() {
        if !controls.is_attached() {
            continue;
        }
        let position = controls.update();
        *transform = Transform::from_translation(position).looking_at(controls.target, Vec3::Y);
    }
}
