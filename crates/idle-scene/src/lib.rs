//! Idle Scene - the character viewer's scene controller
//!
//! Sets up the camera, orbit controls and light rig, loads the character
//! model and loops its idle clip. The browser crate (idle-web) binds this to
//! a canvas and forwards resize/dispose through a [`ControllerHandle`].

pub mod camera;
pub mod config;
pub mod lifecycle;
pub mod model;
pub mod scene;

use bevy::prelude::*;

/// Plugin that assembles the whole scene controller
pub struct IdleScenePlugin {
    pub config: SceneConfig,
    pub handle: ControllerHandle,
}

impl Plugin for IdleScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .insert_resource(self.handle.clone())
            .add_plugins(lifecycle::LifecyclePlugin)
            .add_plugins(camera::CameraPlugin)
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(model::ModelPlugin);
    }
}

// Re-export commonly used types
pub use camera::{MainCamera, OrbitControls};
pub use config::{ConfigError, SceneConfig};
pub use lifecycle::ControllerHandle;
pub use model::{select_clip, CharacterModel};
