use std::path::{Path, PathBuf};

// Project paths

pub const PROJECT_CONFIG_FILE: &str = "pow.toml";

pub fn get_project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_CONFIG_FILE)
}

pub fn get_vscode_settings_path(project_root: &Path) -> PathBuf {
    project_root.join(".vscode").join("settings.json")
}

/// Walks from `start` (or the current directory) up to the filesystem root and
/// returns the first directory containing `pow.toml`.
pub fn find_project_root(start: Option<&Path>) -> Option<PathBuf> {
    let start = match start {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => std::env::current_dir().ok()?.join(path),
        None => std::env::current_dir().ok()?,
    };

    let start = start.canonicalize().unwrap_or(start);

    start
        .ancestors()
        .find(|dir| get_project_config_path(dir).is_file())
        .map(Path::to_path_buf)
}

// Isaac Sim package paths

pub fn get_isaacsim_kit_path(isaacsim_path: &Path) -> PathBuf {
    isaacsim_path.join("apps").join("isaacsim.exp.base.kit")
}

pub fn get_asset_browser_cache_path(isaacsim_path: &Path) -> PathBuf {
    isaacsim_path
        .join("exts")
        .join("isaacsim.asset.browser")
        .join("cache")
        .join("isaacsim.asset.browser.cache.json")
}

// Asset paths

pub const ASSETS_EXTRACT_DIR: &str = "isaacsim_assets";

pub fn get_assets_extract_path(target: &Path) -> PathBuf {
    target.join(ASSETS_EXTRACT_DIR)
}

/// Root of the extracted asset tree, e.g. `<target>/isaacsim_assets/Assets/Isaac/5.0`.
pub fn get_assets_root_path(target: &Path, version: &str) -> PathBuf {
    let release = version.split('.').take(2).collect::<Vec<_>>().join(".");

    get_assets_extract_path(target)
        .join("Assets")
        .join("Isaac")
        .join(release)
}
