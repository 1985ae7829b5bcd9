//! Character model loading and idle animation playback

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;

use crate::config::SceneConfig;
use crate::lifecycle::ControllerHandle;

/// Substring that marks a clip as the idle loop
const IDLE_MARKER: &str = "idle";

/// Where the single character model is in its life
///
/// Only `Loaded` changes what is on screen; `Loading` and `Failed` render
/// the same empty, lit scene as `Unloaded`. `Failed` is terminal.
#[derive(Debug, Clone, Default, Resource)]
pub enum CharacterModel {
    #[default]
    Unloaded,
    Loading(Handle<Gltf>),
    Loaded {
        root: Entity,
        /// Clip picked for playback, `None` when the asset has no animations
        clip: Option<String>,
    },
    Failed,
}

impl CharacterModel {
    pub fn is_loaded(&self) -> bool {
        matches!(self, CharacterModel::Loaded { .. })
    }

    pub fn root(&self) -> Option<Entity> {
        match self {
            CharacterModel::Loaded { root, .. } => Some(*root),
            _ => None,
        }
    }

    /// Name of the clip driven by the mixer, if one was created
    pub fn active_clip(&self) -> Option<&str> {
        match self {
            CharacterModel::Loaded { clip, .. } => clip.as_deref(),
            _ => None,
        }
    }
}

/// Marker for the root entity of the spawned character scene
#[derive(Component)]
pub struct CharacterRoot;

/// Playback chosen for the character, applied once its animation player spawns
#[derive(Debug, Clone, Component)]
pub struct IdleAnimation {
    pub graph: Handle<AnimationGraph>,
    pub node: AnimationNodeIndex,
    pub clip_name: String,
}

/// Pick the clip to play: the first whose name contains "idle" in any case,
/// otherwise the first clip. `None` only when there are no clips.
pub fn select_clip<S: AsRef<str>>(names: &[S]) -> Option<usize> {
    if names.is_empty() {
        return None;
    }
    names
        .iter()
        .position(|name| name.as_ref().to_lowercase().contains(IDLE_MARKER))
        .or(Some(0))
}

/// Clip names in the asset's own order; unnamed clips get an empty name
fn clip_names(gltf: &Gltf) -> Vec<String> {
    gltf.animations
        .iter()
        .map(|handle| {
            gltf.named_animations
                .iter()
                .find(|(_, named)| *named == handle)
                .map(|(name, _)| name.to_string())
                .unwrap_or_default()
        })
        .collect()
}

/// Plugin for model loading
pub struct ModelPlugin;

impl Plugin for ModelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CharacterModel>()
            .add_systems(Startup, start_model_load)
            .add_systems(Update, poll_model_load)
            .add_systems(Update, (enable_mesh_shadows, start_idle_animation).after(poll_model_load));
    }
}

fn start_model_load(
    mut model: ResMut<CharacterModel>,
    asset_server: Res<AssetServer>,
    config: Res<SceneConfig>,
    controller: Res<ControllerHandle>,
) {
    if !controller.is_running() {
        return;
    }

    tracing::info!("Starting to load model: {}", config.asset_path);
    let handle: Handle<Gltf> = asset_server.load(config.asset_path.clone());
    *model = CharacterModel::Loading(handle);
}

/// Check the load state and spawn the character once the glTF is ready
fn poll_model_load(
    mut commands: Commands,
    mut model: ResMut<CharacterModel>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
    config: Res<SceneConfig>,
    controller: Res<ControllerHandle>,
) {
    let CharacterModel::Loading(handle) = &*model else {
        return;
    };
    let handle = handle.clone();

    // A load finishing after dispose must not touch the torn-down scene
    if !controller.is_running() {
        return;
    }

    if let Some(gltf) = gltf_assets.get(&handle) {
        *model = spawn_character(&mut commands, &mut graphs, gltf, &config.asset_path);
        return;
    }

    if let Some(LoadState::Failed(error)) = asset_server.get_load_state(handle.id()) {
        tracing::error!(path = %config.asset_path, "Error loading model: {}", error);
        *model = CharacterModel::Failed;
    }
}

/// Spawn the glTF's scene under a `CharacterRoot` and pick its clip
fn spawn_character(
    commands: &mut Commands,
    graphs: &mut Assets<AnimationGraph>,
    gltf: &Gltf,
    path: &str,
) -> CharacterModel {
    let Some(scene) = gltf
        .default_scene
        .clone()
        .or_else(|| gltf.scenes.first().cloned())
    else {
        tracing::error!("Error loading model: {} contains no scenes", path);
        return CharacterModel::Failed;
    };

    let mut root = commands.spawn((
        SceneRoot(scene),
        Transform::default(),
        Name::new("character"),
        CharacterRoot,
    ));

    let names = clip_names(gltf);
    let clip = select_clip(&names).and_then(|index| {
        let clip_handle = gltf.animations.get(index)?.clone();
        let name = names[index].clone();
        if name.to_lowercase().contains(IDLE_MARKER) {
            tracing::info!("Playing idle animation: {}", name);
        } else {
            tracing::info!("No idle animation found, playing: {}", name);
        }

        let (graph, node) = AnimationGraph::from_clip(clip_handle);
        root.insert(IdleAnimation {
            graph: graphs.add(graph),
            node,
            clip_name: name.clone(),
        });
        Some(name)
    });

    tracing::info!(clips = names.len(), "Model loaded successfully");
    CharacterModel::Loaded {
        root: root.id(),
        clip,
    }
}

/// Every mesh of the character casts and receives shadows
///
/// Bevy meshes cast and receive by default, so this only undoes opt-outs,
/// e.g. ones added by a scene post-processing step.
fn enable_mesh_shadows(
    mut commands: Commands,
    meshes: Query<Entity, Added<Mesh3d>>,
    parents: Query<&ChildOf>,
    roots: Query<(), With<CharacterRoot>>,
) {
    for entity in meshes.iter() {
        if parents.iter_ancestors(entity).any(|ancestor| roots.contains(ancestor)) {
            commands
                .entity(entity)
                .remove::<(NotShadowCaster, NotShadowReceiver)>();
        }
    }
}

/// Attach the chosen clip to the glTF's animation player and loop it
fn start_idle_animation(
    mut commands: Commands,
    mut players: Query<(Entity, &mut AnimationPlayer), Added<AnimationPlayer>>,
    parents: Query<&ChildOf>,
    animations: Query<&IdleAnimation>,
) {
    for (entity, mut player) in players.iter_mut() {
        let Some(animation) = parents
            .iter_ancestors(entity)
            .find_map(|ancestor| animations.get(ancestor).ok())
        else {
            continue;
        };

        commands
            .entity(entity)
            .insert(AnimationGraphHandle(animation.graph.clone()));
        player.play(animation.node).repeat();
        tracing::debug!("Animation player {:?} started clip {}", entity, animation.clip_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::platform::collections::HashMap;
    use std::time::Duration;

    fn load_app(handle: &ControllerHandle, config: SceneConfig) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Gltf>()
            .init_asset::<AnimationClip>()
            .init_asset::<AnimationGraph>()
            .insert_resource(config)
            .insert_resource(handle.clone());
        app
    }

    /// Add an in-memory glTF with one scene and the named clips, in order
    fn add_gltf(app: &mut App, clip_names: &[&str]) -> Handle<Gltf> {
        let world = app.world_mut();
        let mut animations = Vec::new();
        let mut named_animations: HashMap<Box<str>, Handle<AnimationClip>> = HashMap::default();
        {
            let mut clips = world.resource_mut::<Assets<AnimationClip>>();
            for name in clip_names {
                let clip = clips.add(AnimationClip::default());
                named_animations.insert((*name).into(), clip.clone());
                animations.push(clip);
            }
        }

        let gltf = Gltf {
            scenes: vec![Handle::default()],
            named_scenes: default(),
            meshes: Vec::new(),
            named_meshes: default(),
            materials: Vec::new(),
            named_materials: default(),
            nodes: Vec::new(),
            named_nodes: default(),
            skins: Vec::new(),
            named_skins: default(),
            default_scene: None,
            animations,
            named_animations,
            source: None,
        };
        world.resource_mut::<Assets<Gltf>>().add(gltf)
    }

    /// Run the poll system against an already-available glTF
    fn poll_loaded(clip_names: &[&str]) -> App {
        let handle = ControllerHandle::new();
        let mut app = load_app(&handle, SceneConfig::default());
        app.add_systems(Update, poll_model_load);
        let gltf = add_gltf(&mut app, clip_names);
        app.insert_resource(CharacterModel::Loading(gltf));
        app.update();
        app
    }

    fn chosen_clip(app: &mut App) -> Option<String> {
        let world = app.world_mut();
        let mut roots = world.query_filtered::<&IdleAnimation, With<CharacterRoot>>();
        roots
            .iter(world)
            .next()
            .map(|animation| animation.clip_name.clone())
    }

    #[test]
    fn test_select_clip_prefers_idle() {
        assert_eq!(select_clip(&["Walk", "Idle_Loop", "Run"]), Some(1));
    }

    #[test]
    fn test_select_clip_is_case_insensitive() {
        assert_eq!(select_clip(&["Run", "breathing_IDLE"]), Some(1));
    }

    #[test]
    fn test_select_clip_first_idle_wins() {
        assert_eq!(select_clip(&["idle_a", "idle_b"]), Some(0));
    }

    #[test]
    fn test_select_clip_falls_back_to_first() {
        assert_eq!(select_clip(&["Walk", "Run"]), Some(0));
    }

    #[test]
    fn test_select_clip_without_clips() {
        let names: [&str; 0] = [];
        assert_eq!(select_clip(&names), None);
    }

    #[test]
    fn test_failed_model_has_no_mixer() {
        let model = CharacterModel::Failed;
        assert!(!model.is_loaded());
        assert_eq!(model.root(), None);
        assert_eq!(model.active_clip(), None);
    }

    #[test]
    fn test_loaded_model_plays_idle_clip() {
        let mut app = poll_loaded(&["Walk", "Idle_Loop", "Run"]);

        let model = app.world().resource::<CharacterModel>().clone();
        assert!(model.is_loaded());
        assert_eq!(model.active_clip(), Some("Idle_Loop"));
        assert_eq!(chosen_clip(&mut app).as_deref(), Some("Idle_Loop"));
        assert!(app
            .world()
            .get::<CharacterRoot>(model.root().unwrap())
            .is_some());
    }

    #[test]
    fn test_loaded_model_falls_back_to_first_clip() {
        let mut app = poll_loaded(&["Walk", "Run"]);

        assert_eq!(
            app.world().resource::<CharacterModel>().active_clip(),
            Some("Walk")
        );
        assert_eq!(chosen_clip(&mut app).as_deref(), Some("Walk"));
    }

    #[test]
    fn test_loaded_model_without_clips_has_no_mixer() {
        let mut app = poll_loaded(&[]);

        let model = app.world().resource::<CharacterModel>().clone();
        assert!(model.is_loaded());
        assert_eq!(model.active_clip(), None);
        assert_eq!(chosen_clip(&mut app), None);
    }

    #[test]
    fn test_load_finishing_after_dispose_is_dropped() {
        let handle = ControllerHandle::new();
        let mut app = load_app(&handle, SceneConfig::default());
        app.add_systems(Update, poll_model_load);
        let gltf = add_gltf(&mut app, &["Idle_Loop"]);
        app.insert_resource(CharacterModel::Loading(gltf));

        handle.dispose();
        app.update();

        let world = app.world_mut();
        assert!(matches!(
            world.resource::<CharacterModel>(),
            CharacterModel::Loading(_)
        ));
        let mut roots = world.query_filtered::<Entity, With<CharacterRoot>>();
        assert_eq!(roots.iter(world).count(), 0);
    }

    #[test]
    fn test_missing_model_fails_without_mixer() {
        let handle = ControllerHandle::new();
        let config = SceneConfig {
            asset_path: "missing/character.glb".to_string(),
            ..default()
        };
        let mut app = load_app(&handle, config);
        app.add_plugins(ModelPlugin);

        // The read happens on the IO task pool; give it a few frames
        for _ in 0..200 {
            app.update();
            if matches!(app.world().resource::<CharacterModel>(), CharacterModel::Failed) {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(matches!(
            app.world().resource::<CharacterModel>(),
            CharacterModel::Failed
        ));
        let world = app.world_mut();
        let mut animations = world.query::<&IdleAnimation>();
        assert_eq!(animations.iter(world).count(), 0);
    }

    #[test]
    fn test_character_meshes_cast_and_receive_shadows() {
        let mut app = App::new();
        app.add_systems(Update, enable_mesh_shadows);

        let root = app.world_mut().spawn(CharacterRoot).id();
        let node = app.world_mut().spawn(ChildOf(root)).id();
        let body = app
            .world_mut()
            .spawn((
                Mesh3d(Handle::default()),
                NotShadowCaster,
                NotShadowReceiver,
                ChildOf(node),
            ))
            .id();
        let floor = app
            .world_mut()
            .spawn((Mesh3d(Handle::default()), NotShadowCaster))
            .id();

        app.update();

        let world = app.world();
        assert!(world.get::<NotShadowCaster>(body).is_none());
        assert!(world.get::<NotShadowReceiver>(body).is_none());
        // Meshes outside the character are left alone
        assert!(world.get::<NotShadowCaster>(floor).is_some());
    }

    #[test]
    fn test_idle_animation_starts_on_player_spawn() {
        let mut app = App::new();
        app.add_systems(Update, start_idle_animation);

        let (_, node) = AnimationGraph::from_clip(Handle::<AnimationClip>::default());
        let graph = Handle::<AnimationGraph>::default();
        let root = app
            .world_mut()
            .spawn((
                CharacterRoot,
                IdleAnimation {
                    graph: graph.clone(),
                    node,
                    clip_name: "Idle_Loop".to_string(),
                },
            ))
            .id();
        let armature = app.world_mut().spawn(ChildOf(root)).id();
        let player = app
            .world_mut()
            .spawn((AnimationPlayer::default(), ChildOf(armature)))
            .id();

        app.update();

        let world = app.world();
        let player_component = world.get::<AnimationPlayer>(player).unwrap();
        assert!(player_component.is_playing_animation(node));
        assert_eq!(
            world.get::<AnimationGraphHandle>(player).map(|h| h.0.clone()),
            Some(graph)
        );
    }
}
