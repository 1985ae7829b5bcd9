//! Web server setup and routing

use anyhow::Result;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::ServerConfig;

/// Build the router serving the bundle and assets under the base path
pub fn router(config: &ServerConfig) -> Router {
    let prefix = config.route_prefix();
    let assets = ServeDir::new(&config.assets_dir);
    let web = ServeDir::new(&config.web_root);

    let site = Router::new()
        .nest_service("/assets", assets)
        // Static files (WASM frontend) - must be fallback for the base path
        .fallback_service(web);

    let router = if prefix == "/" {
        site
    } else {
        Router::new().nest(&prefix, site)
    };

    router.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// Run plain HTTP server
pub async fn run(config: &ServerConfig) -> Result<()> {
    let app = router(config);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(
        address = %config.bind,
        base = %config.route_prefix(),
        root = %config.web_root,
        "Starting web server"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn fixture(base_path: &str) -> (TempDir, ServerConfig) {
        let temp_dir = TempDir::new().unwrap();
        let web = temp_dir.path().join("web");
        let assets = temp_dir.path().join("assets");
        std::fs::create_dir_all(&web).unwrap();
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(web.join("index.html"), "<canvas></canvas>").unwrap();
        std::fs::write(assets.join("jenny_idle.glb"), b"glTF").unwrap();

        let config = ServerConfig {
            bind: "127.0.0.1:0".to_string(),
            web_root: web.to_string_lossy().into_owned(),
            assets_dir: assets.to_string_lossy().into_owned(),
            base_path: base_path.to_string(),
        };
        (temp_dir, config)
    }

    async fn status(config: &ServerConfig, uri: &str) -> StatusCode {
        router(config)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_serves_from_root() {
        let (_dir, config) = fixture("/");
        assert_eq!(status(&config, "/").await, StatusCode::OK);
        assert_eq!(status(&config, "/assets/jenny_idle.glb").await, StatusCode::OK);
        assert_eq!(status(&config, "/assets/missing.glb").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_under_base_path() {
        let (_dir, config) = fixture("/idle_test/");
        assert_eq!(status(&config, "/idle_test/").await, StatusCode::OK);
        assert_eq!(
            status(&config, "/idle_test/assets/jenny_idle.glb").await,
            StatusCode::OK
        );
        assert_eq!(status(&config, "/assets/jenny_idle.glb").await, StatusCode::NOT_FOUND);
    }
}
