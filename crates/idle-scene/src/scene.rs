//! Scene setup - background, camera and the light rig

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::{CascadeShadowConfigBuilder, DirectionalLightShadowMap, ShadowFilteringMethod};
use bevy::prelude::*;

use crate::camera::{MainCamera, OrbitControls};
use crate::config::{hex_color, SceneConfig};

/// Marker component for the shadow-casting directional light
#[derive(Component)]
pub struct KeyLight;

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene);
    }
}

fn setup_scene(mut commands: Commands, config: Res<SceneConfig>) {
    commands.insert_resource(ClearColor(config.background_color()));

    let position = config.camera_position();
    let target = config.camera_target();
    let lights = &config.lights;

    // Camera with orbit controls. No tonemapping keeps the output plain sRGB.
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: config.camera.fov_degrees.to_radians(),
            near: config.camera.near,
            far: config.camera.far,
            ..default()
        }),
        Transform::from_translation(position).looking_at(target, Vec3::Y),
        Msaa::Sample4,
        Tonemapping::None,
        ShadowFilteringMethod::Gaussian,
        // Ambient fill for everything this camera sees
        AmbientLight {
            color: hex_color(lights.ambient_color),
            brightness: config.ambient_brightness(),
            ..default()
        },
        OrbitControls::from_camera(position, target, &config),
        MainCamera,
    ));

    commands.insert_resource(DirectionalLightShadowMap {
        size: lights.shadow_map_size,
    });

    commands.spawn((
        DirectionalLight {
            color: hex_color(lights.directional_color),
            illuminance: config.directional_illuminance(),
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(lights.directional_position))
            .looking_at(Vec3::ZERO, Vec3::Y),
        // One cascade covering exactly the shadow near/far range
        CascadeShadowConfigBuilder {
            num_cascades: 1,
            minimum_distance: lights.shadow_near,
            maximum_distance: lights.shadow_far,
            first_cascade_far_bound: lights.shadow_far,
            ..default()
        }
        .build(),
        KeyLight,
    ));

    tracing::info!(
        fov = config.camera.fov_degrees,
        shadow_map = lights.shadow_map_size,
        "Scene initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(SceneConfig::default())
            .add_plugins(SceneSetupPlugin);
        app.update();
        app
    }

    #[test]
    fn test_camera_uses_configured_projection() {
        let mut app = setup_app();
        let world = app.world_mut();

        let mut query = world.query_filtered::<(&Projection, &Transform), With<MainCamera>>();
        let (projection, transform) = query.single(world).unwrap();
        let Projection::Perspective(perspective) = projection else {
            panic!("expected a perspective projection");
        };
        assert!((perspective.fov - 75f32.to_radians()).abs() < 1e-6);
        assert_eq!(perspective.near, 0.1);
        assert_eq!(perspective.far, 1000.0);
        assert_eq!(transform.translation, Vec3::new(0.0, 1.5, 3.0));
    }

    #[test]
    fn test_light_rig() {
        let mut app = setup_app();
        let world = app.world_mut();

        assert_eq!(world.resource::<DirectionalLightShadowMap>().size, 2048);

        let mut lights = world.query_filtered::<&DirectionalLight, With<KeyLight>>();
        let light = lights.single(world).unwrap();
        assert!(light.shadows_enabled);

        let mut ambient = world.query_filtered::<&AmbientLight, With<MainCamera>>();
        assert!(ambient.single(world).unwrap().brightness > 0.0);
    }
}
