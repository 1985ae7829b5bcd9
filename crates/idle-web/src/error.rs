//! Errors raised while binding the viewer to the page

use idle_scene::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("No document available")]
    NoDocument,
    #[error("Canvas with id \"{0}\" not found")]
    CanvasNotFound(String),
    #[error("Element with id \"{0}\" is not a canvas")]
    NotACanvas(String),
    #[error("Container with id \"{0}\" not found")]
    ContainerNotFound(String),
    #[error("DOM operation failed: {0}")]
    Dom(String),
    #[error("A character scene was already started on this page")]
    AlreadyStarted,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
