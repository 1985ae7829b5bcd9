//! Build-time deployment settings

mod base_path;

pub use base_path::base_path;

/// Base path injected by the build script
pub const BASE_PATH: &str = env!("IDLE_BASE_PATH");

/// Root the asset server fetches from, without the trailing slash
///
/// The root deployment maps to an empty root so requests stay relative to
/// the page.
pub fn asset_root(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_root() {
        assert_eq!(asset_root("/"), "");
        assert_eq!(asset_root("/idle_test/"), "/idle_test");
    }

    #[test]
    fn test_injected_base_path_is_well_formed() {
        assert!(BASE_PATH.starts_with('/'));
        assert!(BASE_PATH.ends_with('/'));
    }
}
