#[path = "src/deploy/base_path.rs"]
mod base_path;

fn main() {
    println!("cargo:rerun-if-env-changed=GITHUB_REPOSITORY");
    println!("cargo:rerun-if-env-changed=IDLE_DEVELOPMENT");

    // IDLE_DEVELOPMENT wins; otherwise debug builds are development builds
    let development = match std::env::var("IDLE_DEVELOPMENT") {
        Ok(value) => !value.is_empty() && value != "0",
        Err(_) => std::env::var("PROFILE").map(|p| p == "debug").unwrap_or(true),
    };
    let repository = std::env::var("GITHUB_REPOSITORY").ok();

    let base = base_path::base_path(development, repository.as_deref());
    println!("cargo:rustc-env=IDLE_BASE_PATH={}", base);
}
