use crate::command::{
    config::DEFAULT_CONFIG_TEMPLATE,
    isaacsim::{generate_vscode_settings, get_isaacsim_path},
    log::{print_banner, print_created, print_exists},
    paths::{get_asset_browser_cache_path, get_project_config_path, get_vscode_settings_path},
};
use anyhow::{bail, Context, Result};
use regex::{NoExpand, Regex};
use std::{env::current_dir, path::Path, sync::LazyLock};
use tokio::fs::{create_dir_all, read_to_string, write};
use tracing::{error, info};

const WORKSPACE_VENV_PREFIX: &str = "\"${workspaceFolder}/.venv/";

static VENV_PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]+/\.venv/"#).expect("valid venv pattern"));

/// Replaces absolute prefixes of `.venv` paths with `${workspaceFolder}`.
pub fn replace_venv_paths(content: &str) -> String {
    VENV_PATH_PATTERN
        .replace_all(content, NoExpand(WORKSPACE_VENV_PREFIX))
        .into_owned()
}

pub async fn setup_vscode_settings(project_root: &Path) -> Result<()> {
    let settings_path = get_vscode_settings_path(project_root);

    if settings_path.exists() {
        print_exists("VS Code settings");
        return Ok(());
    }

    generate_vscode_settings(project_root).await?;

    info!("generated VS Code settings for Isaac Sim");

    let content = read_to_string(&settings_path)
        .await
        .with_context(|| format!("failed to read {}", settings_path.display()))?;

    let updated = replace_venv_paths(&content);

    if updated == content {
        info!("no absolute paths to replace with ${{workspaceFolder}} in VS Code settings");
    } else {
        write(&settings_path, updated)
            .await
            .with_context(|| format!("failed to write {}", settings_path.display()))?;
    }

    print_created(&settings_path.display().to_string());

    Ok(())
}

/// The asset browser extension fails to load without its cache file.
pub async fn setup_asset_browser_cache(isaacsim_path: &Path) -> Result<()> {
    let cache_path = get_asset_browser_cache_path(isaacsim_path);

    if let Some(parent) = cache_path.parent() {
        create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if cache_path.exists() {
        print_exists(&format!("Asset browser cache {}", cache_path.display()));
        return Ok(());
    }

    let empty_cache = serde_json::to_string_pretty(&serde_json::json!({}))?;

    write(&cache_path, empty_cache)
        .await
        .with_context(|| format!("failed to write {}", cache_path.display()))?;

    print_created(&cache_path.display().to_string());

    Ok(())
}

pub async fn setup_project_config(project_root: &Path) -> Result<()> {
    let config_path = get_project_config_path(project_root);

    if config_path.exists() {
        print_exists("pow.toml");
        return Ok(());
    }

    write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .await
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    print_created("pow.toml");

    Ok(())
}

/// Runs every setup step independently; a failing step is logged and the rest still run.
pub async fn init_project(project_root: &Path, isaacsim_path: &Path) {
    if let Err(err) = setup_vscode_settings(project_root).await {
        error!("failed to set up VS Code settings: {err:#}");
    }

    if let Err(err) = setup_asset_browser_cache(isaacsim_path).await {
        error!("failed to set up asset browser cache: {err:#}");
    }

    if let Err(err) = setup_project_config(project_root).await {
        error!("failed to create pow.toml: {err:#}");
    }
}

pub async fn run() -> Result<()> {
    let Some(isaacsim_path) = get_isaacsim_path().await? else {
        bail!("Isaac Sim not found. Please install Isaac Sim first.");
    };

    info!("Isaac Sim: {}", isaacsim_path.display());

    let project_root = current_dir().context("failed to get current directory")?;

    init_project(&project_root, &isaacsim_path).await;

    print_banner("Successfully initialized Sim project");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn replace_venv_paths_rewrites_absolute_prefixes() {
        let content = r#"{
    "python.defaultInterpreterPath": "/home/me/project/.venv/bin/python",
    "python.analysis.extraPaths": [
        "/home/me/project/.venv/lib/python3.11/site-packages/isaacsim/exts/isaacsim.core.api",
        "/opt/other/path"
    ]
}"#;

        let updated = replace_venv_paths(content);

        assert!(updated.contains(r#""${workspaceFolder}/.venv/bin/python""#));
        assert!(updated.contains(
            r#""${workspaceFolder}/.venv/lib/python3.11/site-packages/isaacsim/exts/isaacsim.core.api""#
        ));
        assert!(updated.contains(r#""/opt/other/path""#));
        assert!(!updated.contains("/home/me"));
    }

    #[test]
    fn replace_venv_paths_without_venv_is_identity() {
        let content = r#"{ "editor.tabSize": 4, "path": "/usr/lib/python3" }"#;

        assert_eq!(replace_venv_paths(content), content);
    }

    #[tokio::test]
    async fn setup_project_config_writes_template() {
        let tmp = TempDir::new().expect("failed to create temp dir");

        setup_project_config(tmp.path())
            .await
            .expect("should create config");

        let content = fs::read_to_string(tmp.path().join("pow.toml")).expect("read config");

        assert_eq!(content, DEFAULT_CONFIG_TEMPLATE);
    }

    #[tokio::test]
    async fn setup_project_config_keeps_existing_content() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let custom = "[sim]\ncommand = [\"./custom.sh\"]\n";
        fs::write(tmp.path().join("pow.toml"), custom).expect("write config");

        setup_project_config(tmp.path())
            .await
            .expect("should succeed");

        let content = fs::read_to_string(tmp.path().join("pow.toml")).expect("read config");

        assert_eq!(content, custom);
    }

    #[tokio::test]
    async fn setup_asset_browser_cache_creates_empty_json() {
        let tmp = TempDir::new().expect("failed to create temp dir");

        setup_asset_browser_cache(tmp.path())
            .await
            .expect("should create cache");

        let cache_path = get_asset_browser_cache_path(tmp.path());
        let content = fs::read_to_string(&cache_path).expect("read cache");
        let value: serde_json::Value = serde_json::from_str(&content).expect("valid json");

        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn setup_asset_browser_cache_keeps_existing() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let cache_path = get_asset_browser_cache_path(tmp.path());
        fs::create_dir_all(cache_path.parent().expect("parent")).expect("create dirs");
        fs::write(&cache_path, "{\"cached\": true}").expect("write cache");

        setup_asset_browser_cache(tmp.path())
            .await
            .expect("should succeed");

        assert_eq!(
            fs::read_to_string(&cache_path).expect("read cache"),
            "{\"cached\": true}"
        );
    }

    #[tokio::test]
    async fn setup_vscode_settings_skips_existing_file() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let settings_path = get_vscode_settings_path(tmp.path());
        fs::create_dir_all(settings_path.parent().expect("parent")).expect("create dirs");
        fs::write(&settings_path, "{}").expect("write settings");

        setup_vscode_settings(tmp.path())
            .await
            .expect("existing settings are left alone");

        assert_eq!(fs::read_to_string(&settings_path).expect("read"), "{}");
    }

    #[tokio::test]
    async fn init_project_steps_are_independent() {
        let project = TempDir::new().expect("failed to create temp dir");
        let isaacsim = TempDir::new().expect("failed to create temp dir");

        // Block the cache directory with a plain file so that step fails.
        fs::create_dir_all(isaacsim.path().join("exts").join("isaacsim.asset.browser"))
            .expect("create dirs");
        fs::write(
            isaacsim
                .path()
                .join("exts")
                .join("isaacsim.asset.browser")
                .join("cache"),
            "",
        )
        .expect("write blocker");

        let settings_path = get_vscode_settings_path(project.path());
        fs::create_dir_all(settings_path.parent().expect("parent")).expect("create dirs");
        fs::write(&settings_path, "{}").expect("write settings");

        init_project(project.path(), isaacsim.path()).await;

        assert!(project.path().join("pow.toml").is_file());
    }
}
