use crate::command::{
    kit::update_asset_settings,
    log::{
        print_merge_progress, print_part_complete, print_part_incomplete, print_part_missing,
        print_settings_not_updated,
    },
    paths::{get_assets_extract_path, get_assets_root_path},
};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::{
    fs::{create_dir_all, metadata, remove_file, File},
    io::{AsyncReadExt, AsyncWriteExt},
    process::Command,
};
use tracing::{debug, info, warn};

pub const DEFAULT_ASSETS_VERSION: &str = "5.0.0";
pub const DEFAULT_BASE_URL: &str = "https://download.isaacsim.omniverse.nvidia.com";
pub const DEFAULT_DOWNLOADER: &str = "aria2c";
pub const DEFAULT_EXTRACTOR: &str = "unzip";

pub const PART_COUNT: usize = 3;

/// Suffix of the download utility's control file for an unfinished download.
pub const INCOMPLETE_SUFFIX: &str = "aria2";

const MERGE_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// The fixed set of numbered archive parts for one asset pack version.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveParts {
    base_url: String,
    version: String,
}

impl ArchiveParts {
    pub fn new(base_url: &str, version: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.to_string(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn archive_name(&self) -> String {
        format!("isaac-sim-assets-complete-{}.zip", self.version)
    }

    /// Part file names in merge order, e.g. `...-5.0.0.zip.001`.
    pub fn names(&self) -> Vec<String> {
        let archive_name = self.archive_name();

        (1..=PART_COUNT)
            .map(|index| format!("{archive_name}.{index:03}"))
            .collect()
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PartStatus {
    Complete,
    Incomplete,
    Missing,
}

pub fn get_incomplete_marker_path(part_path: &Path) -> PathBuf {
    let mut marker = part_path.as_os_str().to_owned();

    marker.push(".");
    marker.push(INCOMPLETE_SUFFIX);

    PathBuf::from(marker)
}

pub fn get_part_status(part_path: &Path) -> PartStatus {
    if get_incomplete_marker_path(part_path).exists() {
        return PartStatus::Incomplete;
    }

    if part_path.is_file() {
        return PartStatus::Complete;
    }

    PartStatus::Missing
}

pub struct Install {
    pub downloader: String,
    pub extractor: String,
    pub parts: ArchiveParts,
    pub target: PathBuf,
}

impl Install {
    pub fn part_paths(&self) -> Vec<PathBuf> {
        self.parts
            .names()
            .into_iter()
            .map(|name| self.target.join(name))
            .collect()
    }

    pub fn archive_path(&self) -> PathBuf {
        self.target.join(self.parts.archive_name())
    }

    pub fn extract_path(&self) -> PathBuf {
        get_assets_extract_path(&self.target)
    }

    pub fn assets_root_path(&self) -> PathBuf {
        get_assets_root_path(&self.target, self.parts.version())
    }
}

async fn download_part(downloader: &str, url: &str, target: &Path, name: &str) -> Result<()> {
    info!("downloading: {url}");

    let status = Command::new(downloader)
        .args([
            "--continue=true",
            "--max-connection-per-server=16",
            "--split=16",
            "--dir",
        ])
        .arg(target)
        .arg("--out")
        .arg(name)
        .arg(url)
        .status()
        .await
        .with_context(|| format!("failed to start download utility: {downloader}"))?;

    if !status.success() {
        bail!("download failed for {name}: {downloader} exited with {status}");
    }

    Ok(())
}

/// Reports each part and downloads any that are missing or unfinished.
pub async fn ensure_parts(install: &Install) -> Result<()> {
    create_dir_all(&install.target)
        .await
        .with_context(|| format!("failed to create {}", install.target.display()))?;

    for name in install.parts.names() {
        let part_path = install.target.join(&name);

        match get_part_status(&part_path) {
            PartStatus::Complete => {
                print_part_complete(&name);
                continue;
            }
            PartStatus::Incomplete => print_part_incomplete(&name),
            PartStatus::Missing => print_part_missing(&name),
        }

        let url = install.parts.url(&name);

        download_part(&install.downloader, &url, &install.target, &name).await?;
    }

    Ok(())
}

/// Fails with the first part that is absent or still has an unfinished download marker.
pub fn verify_parts(part_paths: &[PathBuf]) -> Result<()> {
    for part_path in part_paths {
        let name = part_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| part_path.display().to_string());

        match get_part_status(part_path) {
            PartStatus::Complete => {}
            PartStatus::Incomplete => bail!("archive part is incomplete: {name}"),
            PartStatus::Missing => bail!("archive part not found: {name}"),
        }
    }

    Ok(())
}

/// Concatenates `part_paths` in order into `archive_path`.
///
/// `on_progress` receives the cumulative percentage each time it changes.
pub async fn merge_parts<F>(
    part_paths: &[PathBuf],
    archive_path: &Path,
    mut on_progress: F,
) -> Result<u64>
where
    F: FnMut(u64),
{
    if archive_path.exists() {
        debug!("removing previous archive: {}", archive_path.display());

        remove_file(archive_path)
            .await
            .with_context(|| format!("failed to remove {}", archive_path.display()))?;
    }

    let mut total_size = 0;

    for part_path in part_paths {
        let part_metadata = metadata(part_path)
            .await
            .with_context(|| format!("failed to read metadata: {}", part_path.display()))?;

        total_size += part_metadata.len();
    }

    let mut archive = File::create(archive_path)
        .await
        .with_context(|| format!("failed to create {}", archive_path.display()))?;

    let mut buffer = vec![0u8; MERGE_CHUNK_SIZE];
    let mut written = 0u64;
    let mut last_percent = None;

    for part_path in part_paths {
        let mut part = File::open(part_path)
            .await
            .with_context(|| format!("failed to open {}", part_path.display()))?;

        loop {
            let read = part
                .read(&mut buffer)
                .await
                .with_context(|| format!("failed to read {}", part_path.display()))?;

            if read == 0 {
                break;
            }

            archive
                .write_all(&buffer[..read])
                .await
                .with_context(|| format!("failed to write {}", archive_path.display()))?;

            written += read as u64;

            let percent = (written * 100).checked_div(total_size).unwrap_or(100);

            if last_percent != Some(percent) {
                on_progress(percent);
                last_percent = Some(percent);
            }
        }
    }

    if last_percent != Some(100) {
        on_progress(100);
    }

    archive.flush().await?;

    Ok(written)
}

pub async fn extract_archive(
    extractor: &str,
    archive_path: &Path,
    extract_path: &Path,
) -> Result<()> {
    info!("extracting: {}", archive_path.display());

    create_dir_all(extract_path)
        .await
        .with_context(|| format!("failed to create {}", extract_path.display()))?;

    let status = Command::new(extractor)
        .arg("-q")
        .arg("-o")
        .arg(archive_path)
        .arg("-d")
        .arg(extract_path)
        .status()
        .await
        .with_context(|| format!("failed to start extraction utility: {extractor}"))?;

    if !status.success() {
        bail!(
            "extraction failed for {}: {extractor} exited with {status}",
            archive_path.display()
        );
    }

    Ok(())
}

pub async fn cleanup(part_paths: &[PathBuf], archive_path: &Path) -> Result<()> {
    for path in part_paths.iter().map(PathBuf::as_path).chain([archive_path]) {
        if !path.exists() {
            continue;
        }

        remove_file(path)
            .await
            .with_context(|| format!("failed to remove {}", path.display()))?;

        debug!("removed: {}", path.display());
    }

    Ok(())
}

/// Downloads, merges, extracts and cleans up the asset pack under `install.target`.
pub async fn install_archive(install: &Install) -> Result<()> {
    ensure_parts(install).await?;

    let part_paths = install.part_paths();

    verify_parts(&part_paths)?;

    let archive_path = install.archive_path();

    let size = merge_parts(&part_paths, &archive_path, print_merge_progress).await?;

    info!("merged {} bytes into {}", size, archive_path.display());

    extract_archive(&install.extractor, &archive_path, &install.extract_path()).await?;

    cleanup(&part_paths, &archive_path).await
}

pub async fn run(install: &Install, skip_download: bool) -> Result<()> {
    if skip_download {
        info!("skipping download, using existing assets");
    } else {
        install_archive(install).await?;
    }

    let assets_root = install.assets_root_path();

    if !assets_root.is_dir() {
        warn!("asset root not found: {}", assets_root.display());
    }

    info!("asset root: {}", assets_root.display());

    if !update_asset_settings(&assets_root).await? {
        print_settings_not_updated(&assets_root.display().to_string());
    }

    Ok(())
}
