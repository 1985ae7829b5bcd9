//! Host component: owns the canvas element and the scene's lifetime

use idle_scene::SceneConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

use crate::controller::CharacterScene;
use crate::error::SceneError;

/// Id given to the canvas inserted into the container
pub const CANVAS_ID: &str = "game-canvas";

/// Mounts a canvas into a container element and runs one scene on it
#[wasm_bindgen]
pub struct GameCanvas {
    container_id: String,
    canvas: Option<HtmlCanvasElement>,
    scene: Option<CharacterScene>,
}

#[wasm_bindgen]
impl GameCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> GameCanvas {
        Self {
            container_id: container_id.to_string(),
            canvas: None,
            scene: None,
        }
    }

    /// Insert the canvas and construct the scene. Mounting twice is a no-op;
    /// mounting again after `unmount` fails, as the page's scene is spent.
    pub fn mount(&mut self) -> Result<(), JsError> {
        if self.scene.is_some() {
            return Ok(());
        }
        if self.canvas.is_none() {
            self.canvas = Some(self.insert_canvas()?);
        }
        match CharacterScene::create(CANVAS_ID, SceneConfig::default()) {
            Ok(scene) => {
                self.scene = Some(scene);
                Ok(())
            }
            Err(e) => {
                // Nothing will render into it
                if let Some(canvas) = self.canvas.take() {
                    canvas.remove();
                }
                Err(e.into())
            }
        }
    }

    /// Dispose the scene, drop it and take the canvas out of the page
    pub fn unmount(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.dispose();
        }
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
        }
    }

    /// Forward a layout change to the scene, if mounted
    pub fn resize(&self) {
        if let Some(scene) = &self.scene {
            scene.resize();
        }
    }

    #[wasm_bindgen(getter, js_name = "isMounted")]
    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }
}

impl GameCanvas {
    fn insert_canvas(&self) -> Result<HtmlCanvasElement, SceneError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(SceneError::NoDocument)?;
        let container = document
            .get_element_by_id(&self.container_id)
            .ok_or_else(|| SceneError::ContainerNotFound(self.container_id.clone()))?;

        let canvas = document
            .create_element("canvas")
            .map_err(|e| SceneError::Dom(format!("{:?}", e)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| SceneError::Dom("created element is not a canvas".to_string()))?;
        canvas.set_id(CANVAS_ID);
        canvas.set_class_name("canvas");
        container
            .append_child(&canvas)
            .map_err(|e| SceneError::Dom(format!("{:?}", e)))?;

        Ok(canvas)
    }
}
