//! Browser-facing scene controller

use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use idle_scene::{ControllerHandle, IdleScenePlugin, SceneConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

use crate::deploy;
use crate::error::SceneError;

/// Set once an app has taken the page's event loop. Winit refuses to build
/// a second loop, so later scenes must fail before reaching it.
static EVENT_LOOP_TAKEN: AtomicBool = AtomicBool::new(false);

fn claim_event_loop(taken: &AtomicBool) -> Result<(), SceneError> {
    taken
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .map(|_| ())
        .map_err(|_| SceneError::AlreadyStarted)
}

/// A running character scene bound to one canvas
#[wasm_bindgen]
pub struct CharacterScene {
    canvas: HtmlCanvasElement,
    handle: ControllerHandle,
}

#[wasm_bindgen]
impl CharacterScene {
    /// Bind to the canvas with `canvas_id` and start rendering
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<CharacterScene, JsError> {
        Ok(Self::create(canvas_id, SceneConfig::default())?)
    }

    /// Like the constructor, with scene settings overridden by a TOML document
    #[wasm_bindgen(js_name = "withConfig")]
    pub fn with_config(canvas_id: &str, config_toml: &str) -> Result<CharacterScene, JsError> {
        let config = SceneConfig::from_toml_str(config_toml).map_err(SceneError::from)?;
        Ok(Self::create(canvas_id, config)?)
    }

    /// Re-read the canvas size and resize the surface and camera to match
    pub fn resize(&self) {
        let width = self.canvas.client_width().max(0) as u32;
        let height = self.canvas.client_height().max(0) as u32;
        self.handle.request_resize(width, height);
    }

    /// Stop the render loop and release the surface. Safe to call twice.
    pub fn dispose(&self) {
        if self.handle.dispose() {
            tracing::info!("Disposing character scene");
        }
    }

    #[wasm_bindgen(getter, js_name = "isRunning")]
    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }
}

impl CharacterScene {
    /// Resolve the canvas first so a bad id allocates nothing, then start the app
    pub fn create(canvas_id: &str, config: SceneConfig) -> Result<Self, SceneError> {
        let canvas = find_canvas(canvas_id)?;
        claim_event_loop(&EVENT_LOOP_TAKEN)?;
        let handle = ControllerHandle::new();

        let device_ratio = web_sys::window()
            .map(|window| window.device_pixel_ratio() as f32)
            .unwrap_or(1.0);
        let size = UVec2::new(
            canvas.client_width().max(1) as u32,
            canvas.client_height().max(1) as u32,
        );

        tracing::info!(
            canvas = canvas_id,
            width = size.x,
            height = size.y,
            base = deploy::BASE_PATH,
            "Creating character scene"
        );

        let mut app = build_app(canvas_id, config, handle.clone(), size, device_ratio);
        // On the web the winit runner hands the loop to the browser and returns
        app.run();

        Ok(Self { canvas, handle })
    }
}

fn find_canvas(canvas_id: &str) -> Result<HtmlCanvasElement, SceneError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or(SceneError::NoDocument)?;
    let element = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| SceneError::CanvasNotFound(canvas_id.to_string()))?;
    element
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| SceneError::NotACanvas(canvas_id.to_string()))
}

fn build_app(
    canvas_id: &str,
    config: SceneConfig,
    handle: ControllerHandle,
    size: UVec2,
    device_ratio: f32,
) -> App {
    let mut window = Window {
        title: "Idle Character Viewer".to_string(),
        canvas: Some(format!("#{}", canvas_id)),
        // Sizing is driven by explicit resize() calls from the host
        fit_canvas_to_parent: false,
        // Right-drag pans, so the context menu must not open
        prevent_default_event_handling: true,
        ..default()
    };
    window.resolution.set(size.x as f32, size.y as f32);
    let pixel_ratio = config.pixel_ratio(device_ratio);
    if pixel_ratio < device_ratio {
        window.resolution.set_scale_factor_override(Some(pixel_ratio));
    }

    let mut app = App::new();
    app
        // Render every frame; there is no visibility-based throttling
        .insert_resource(WinitSettings::game())
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(window),
                ..default()
            })
            .set(AssetPlugin {
                file_path: deploy::asset_root(deploy::BASE_PATH),
                // Static hosting has no .meta files
                meta_check: AssetMetaCheck::Never,
                ..default()
            })
        )
        .add_plugins(IdleScenePlugin { config, handle });
    app
}
