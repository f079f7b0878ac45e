use anyhow::{anyhow, bail, Context, Result};
use std::{
    env::var,
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::process::Command;
use tracing::debug;

pub const ISAACSIM_PATH_ENV: &str = "POW_ISAACSIM_PATH";

const PYTHON: [&str; 3] = ["uv", "run", "python"];

const FIND_PACKAGE_SCRIPT: &str = "import importlib.util, os\n\
spec = importlib.util.find_spec('isaacsim')\n\
print(os.path.dirname(spec.origin) if spec and spec.origin else '')";

fn python_command() -> Command {
    let mut command = Command::new(PYTHON[0]);

    command.args(&PYTHON[1..]);

    command
}

/// Locates the installed `isaacsim` Python package directory.
///
/// Returns `Ok(None)` when the package (or the Python toolchain) is not available.
pub async fn get_isaacsim_path() -> Result<Option<PathBuf>> {
    if let Ok(path) = var(ISAACSIM_PATH_ENV) {
        let path = PathBuf::from(path);

        if !path.is_dir() {
            bail!(
                "{} is set but is not a directory: {}",
                ISAACSIM_PATH_ENV,
                path.display()
            );
        }

        return Ok(Some(path));
    }

    let output = python_command()
        .args(["-c", FIND_PACKAGE_SCRIPT])
        .stdin(Stdio::null())
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(err) => {
            debug!("failed to start python: {err}");
            return Ok(None);
        }
    };

    if !output.status.success() {
        debug!(
            "isaacsim lookup failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Ok(None);
    }

    Ok(parse_package_dir(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_package_dir(stdout: &str) -> Option<PathBuf> {
    let line = stdout.lines().map(str::trim).rfind(|line| !line.is_empty())?;

    Some(PathBuf::from(line))
}

/// Runs `python -m isaacsim --generate-vscode-settings` in `project_root`.
pub async fn generate_vscode_settings(project_root: &Path) -> Result<()> {
    let output = python_command()
        .args(["-m", "isaacsim", "--generate-vscode-settings"])
        .current_dir(project_root)
        .stdin(Stdio::null())
        .output()
        .await
        .context("failed to start python, is `uv` in PATH?")?;

    if !output.status.success() {
        return Err(anyhow!(
            "settings generator exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_package_dir_takes_last_line() {
        let stdout = "warning: resolving environment\n/venv/site-packages/isaacsim\n\n";

        assert_eq!(
            parse_package_dir(stdout),
            Some(PathBuf::from("/venv/site-packages/isaacsim"))
        );
    }

    #[tokio::test]
    async fn get_isaacsim_path_prefers_override() {
        let package = tempfile::TempDir::new().expect("failed to create temp dir");
        let _env = testing::IsaacSimPathOverride::set(package.path()).await;

        let found = get_isaacsim_path().await.expect("lookup should succeed");

        assert_eq!(found, Some(package.path().to_path_buf()));
    }

    #[tokio::test]
    async fn get_isaacsim_path_rejects_missing_override() {
        let _env = testing::IsaacSimPathOverride::set(Path::new("/nonexistent/isaacsim")).await;

        let err = get_isaacsim_path().await.unwrap_err();

        assert!(err.to_string().contains("is set but is not a directory"));
    }

    #[test]
    fn parse_package_dir_empty_means_not_installed() {
        assert_eq!(parse_package_dir(""), None);
        assert_eq!(parse_package_dir("\n  \n"), None);
    }
}
