//! Render loop lifecycle: the running flag, dispose and resize requests
//!
//! The browser side only ever holds a [`ControllerHandle`]. Everything it asks
//! for is queued on the handle and picked up by the app on its next frame, so
//! all scene state is still only touched from inside the Bevy schedule.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::camera::{apply_viewport, MainCamera, OrbitControls};

/// Shared handle between the page and the running app
#[derive(Debug, Clone, Resource)]
pub struct ControllerHandle {
    inner: Arc<ControllerState>,
}

#[derive(Debug)]
struct ControllerState {
    running: AtomicBool,
    pending_resize: Mutex<Option<UVec2>>,
}

impl Default for ControllerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ControllerState {
                running: AtomicBool::new(true),
                pending_resize: Mutex::new(None),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Clear the running flag. Returns `true` only for the call that
    /// actually stopped the controller; later calls do nothing.
    pub fn dispose(&self) -> bool {
        self.inner.running.swap(false, Ordering::AcqRel)
    }

    /// Queue a new surface size; only the latest request is kept
    pub fn request_resize(&self, width: u32, height: u32) {
        if !self.is_running() {
            return;
        }
        if let Ok(mut pending) = self.inner.pending_resize.lock() {
            *pending = Some(UVec2::new(width, height));
        }
    }

    pub fn take_resize(&self) -> Option<UVec2> {
        self.inner
            .pending_resize
            .lock()
            .ok()
            .and_then(|mut pending| pending.take())
    }
}

/// Plugin driving the per-frame lifecycle checks
pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ControllerHandle>()
            .add_systems(First, halt_on_dispose)
            .add_systems(PreUpdate, apply_resize);
    }
}

/// Stop the loop once the handle has been disposed
///
/// Writing `AppExit` makes the runner stop scheduling frames and drop the
/// renderer, which releases the GPU surface.
fn halt_on_dispose(
    controller: Res<ControllerHandle>,
    mut halted: Local<bool>,
    mut players: Query<&mut AnimationPlayer>,
    mut controls: Query<&mut OrbitControls>,
    mut exit: MessageWriter<AppExit>,
) {
    if controller.is_running() || *halted {
        return;
    }
    *halted = true;

    for mut player in players.iter_mut() {
        player.stop_all();
    }
    for mut orbit in controls.iter_mut() {
        orbit.release();
    }

    tracing::info!("Scene controller disposed, stopping render loop");
    exit.write(AppExit::Success);
}

/// Match the window and camera to the last requested surface size
fn apply_resize(
    controller: Res<ControllerHandle>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
) {
    let Some(size) = controller.take_resize() else {
        return;
    };
    if size.x == 0 || size.y == 0 {
        tracing::debug!("Ignoring resize to empty surface {}x{}", size.x, size.y);
        return;
    }

    for mut window in windows.iter_mut() {
        window.resolution.set(size.x as f32, size.y as f32);
    }
    for mut projection in cameras.iter_mut() {
        if let Projection::Perspective(perspective) = &mut *projection {
            apply_viewport(perspective, size.x, size.y);
        }
    }

    tracing::debug!(width = size.x, height = size.y, "Surface resized");
}
