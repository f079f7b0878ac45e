//! Marker-delimited settings block inside Isaac Sim's `isaacsim.exp.base.kit`.
//!
//! The block is located by literal substring search for the start and end
//! markers. Existing patched kit files depend on the exact marker text.

use crate::command::{
    isaacsim::get_isaacsim_path, log::badge_success, paths::get_isaacsim_kit_path,
};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::{read_to_string, write};
use tracing::{info, warn};

pub const BLOCK_START: &str = "# >>> pow local assets >>>";
pub const BLOCK_END: &str = "# <<< pow local assets <<<";

const BROWSER_FOLDERS: [&str; 8] = [
    "Robots",
    "People",
    "IsaacLab",
    "Props",
    "Environments",
    "Materials",
    "Samples",
    "Sensors",
];

/// Renders the settings block pointing Isaac Sim at `asset_root`.
pub fn render_block(asset_root: &Path) -> String {
    let root = asset_root.display().to_string();

    let mut block = String::new();

    block.push_str(BLOCK_START);
    block.push('\n');
    block.push_str("[settings]\n");
    block.push_str(&format!("persistent.isaac.asset_root.default = \"{root}\"\n"));
    block.push_str("exts.\"isaacsim.asset.browser\".folders = [\n");

    for folder in BROWSER_FOLDERS {
        block.push_str(&format!("    \"{root}/Isaac/{folder}\",\n"));
    }

    block.push_str("]\n");
    block.push_str(BLOCK_END);

    block
}

/// Removes the first marker block, trimming whitespace left around it.
///
/// A start marker without an end marker drops everything after it.
pub fn remove_block(content: &str) -> String {
    let Some(start) = content.find(BLOCK_START) else {
        return content.to_string();
    };

    let end = match content[start..].find(BLOCK_END) {
        Some(offset) => start + offset + BLOCK_END.len(),
        None => {
            warn!("settings block has no end marker, removing to end of file");
            content.len()
        }
    };

    let before = content[..start].trim_end();
    let after = content[end..].trim_start_matches(['\r', '\n']);

    match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_string(),
        (false, true) => before.to_string(),
        (false, false) => format!("{before}\n\n{after}"),
    }
}

/// Replaces every existing block with `block`, appended at the end of the file.
pub fn replace_block(content: &str, block: &str) -> String {
    let mut remaining = content.to_string();

    // Unguarded concurrent installs can leave more than one block behind.
    while remaining.contains(BLOCK_START) {
        remaining = remove_block(&remaining);
    }

    let remaining = remaining.trim_end();

    if remaining.is_empty() {
        format!("{block}\n")
    } else {
        format!("{remaining}\n\n{block}\n")
    }
}

/// Rewrites the kit file at `kit_path` so its settings block points at `asset_root`.
///
/// The whole file is held in memory and written back with a single write.
pub async fn rewrite_kit_file(kit_path: &Path, asset_root: &Path) -> Result<()> {
    let content = read_to_string(kit_path)
        .await
        .with_context(|| format!("failed to read {}", kit_path.display()))?;

    if content.contains(BLOCK_START) {
        info!("replacing existing settings block in {}", kit_path.display());
    }

    let updated = replace_block(&content, &render_block(asset_root));

    write(kit_path, updated)
        .await
        .with_context(|| format!("failed to write {}", kit_path.display()))?;

    Ok(())
}

/// Points the installed Isaac Sim at `asset_root`.
///
/// Returns `Ok(false)` with a warning when the kit file cannot be located.
pub async fn update_asset_settings(asset_root: &Path) -> Result<bool> {
    let isaacsim_path = match get_isaacsim_path().await {
        Ok(Some(path)) => path,
        Ok(None) => {
            warn!("Isaac Sim installation not found, skipping settings update");
            return Ok(false);
        }
        Err(err) => {
            warn!("failed to locate Isaac Sim, skipping settings update: {err:#}");
            return Ok(false);
        }
    };

    let kit_path = get_isaacsim_kit_path(&isaacsim_path);

    if !kit_path.is_file() {
        warn!("Isaac Sim settings file not found: {}", kit_path.display());
        return Ok(false);
    }

    rewrite_kit_file(&kit_path, asset_root).await?;

    println!(
        "{} Updated asset settings: {}",
        badge_success(),
        kit_path.display()
    );

    Ok(true)
}
