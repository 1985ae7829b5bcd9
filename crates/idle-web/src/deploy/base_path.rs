//! Deployment base path, shared with the build script

/// Repository name used when the build environment does not provide one
pub const DEFAULT_REPOSITORY_NAME: &str = "idle_test";

/// URL prefix the bundle is served under.
///
/// Development builds are served from the root. Published builds live under
/// `/<name>/`, where `<name>` is the second half of an `owner/name`
/// repository slug.
pub fn base_path(development: bool, repository: Option<&str>) -> String {
    if development {
        return "/".to_string();
    }

    let name = repository
        .and_then(|slug| slug.split('/').nth(1))
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_REPOSITORY_NAME);
    format!("/{}/", name)
}
