use nix::sys::utsname::uname;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SUPPORTED_ARCHITECTURES: [&str; 2] = ["x86_64", "amd64"];

pub const SUPPORTED_DISTRIBUTION: &str = "ubuntu";

pub fn get_os_release_path() -> PathBuf {
    Path::new("/etc/os-release").to_path_buf()
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unsupported architecture '{0}': Isaac Sim requires x86_64")]
    UnsupportedArchitecture(String),

    #[error("unsupported operating system: Isaac Sim requires Ubuntu ({path} does not identify as Ubuntu)")]
    UnsupportedDistribution { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    OsRelease {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to query host architecture: {0}")]
    Uname(#[from] nix::Error),
}

/// Machine architecture as reported by the kernel (`uname -m`).
pub fn get_host_architecture() -> Result<String, HostError> {
    let name = uname()?;

    Ok(name.machine().to_string_lossy().to_string())
}

pub fn check_architecture(arch: &str) -> Result<(), HostError> {
    let supported = SUPPORTED_ARCHITECTURES
        .iter()
        .any(|a| a.eq_ignore_ascii_case(arch.trim()));

    if !supported {
        return Err(HostError::UnsupportedArchitecture(arch.to_string()));
    }

    Ok(())
}

pub fn check_distribution(os_release: &str, path: &Path) -> Result<(), HostError> {
    if !os_release.to_lowercase().contains(SUPPORTED_DISTRIBUTION) {
        return Err(HostError::UnsupportedDistribution {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Checks `arch` against the allow-list, then the distribution in `os_release_path`.
pub async fn check_host(arch: &str, os_release_path: &Path) -> Result<(), HostError> {
    check_architecture(arch)?;

    let os_release = tokio::fs::read_to_string(os_release_path)
        .await
        .map_err(|source| HostError::OsRelease {
            path: os_release_path.to_path_buf(),
            source,
        })?;

    check_distribution(&os_release, os_release_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UBUNTU: &str = "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nID=ubuntu\nID_LIKE=debian\n";
    const FEDORA: &str = "NAME=\"Fedora Linux\"\nVERSION_ID=40\nID=fedora\n";

    fn os_release(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let path = tmp.path().join("os-release");
        std::fs::write(&path, content).expect("failed to write os-release");
        (tmp, path)
    }

    #[test]
    fn check_architecture_accepts_allow_list_case_insensitive() {
        assert!(check_architecture("x86_64").is_ok());
        assert!(check_architecture("X86_64").is_ok());
        assert!(check_architecture("AMD64").is_ok());
        assert!(check_architecture("amd64").is_ok());
    }

    #[test]
    fn check_architecture_rejects_arm() {
        let err = check_architecture("arm64").unwrap_err();

        assert!(matches!(err, HostError::UnsupportedArchitecture(ref a) if a == "arm64"));
        assert!(err.to_string().contains("unsupported architecture 'arm64'"));

        assert!(check_architecture("aarch64").is_err());
    }

    #[test]
    fn check_distribution_matches_case_insensitively() {
        let path = Path::new("/etc/os-release");

        assert!(check_distribution(UBUNTU, path).is_ok());
        assert!(check_distribution("ID=UBUNTU\n", path).is_ok());
        assert!(check_distribution("ID=linuxmint\nID_LIKE=\"ubuntu debian\"\n", path).is_ok());
    }

    #[tokio::test]
    async fn check_host_arm_fails_before_reading_os_release() {
        let err = check_host("arm64", Path::new("/nonexistent/os-release"))
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::UnsupportedArchitecture(_)));
    }

    #[tokio::test]
    async fn check_host_x86_64_non_ubuntu_fails_with_os_error() {
        let (_tmp, path) = os_release(FEDORA);

        let err = check_host("x86_64", &path).await.unwrap_err();

        assert!(matches!(err, HostError::UnsupportedDistribution { .. }));
        assert!(err.to_string().contains("unsupported operating system"));
    }

    #[tokio::test]
    async fn check_host_x86_64_ubuntu_passes() {
        let (_tmp, path) = os_release(UBUNTU);

        assert!(check_host("x86_64", &path).await.is_ok());
    }

    #[tokio::test]
    async fn check_host_missing_os_release() {
        let tmp = TempDir::new().expect("failed to create temp dir");

        let err = check_host("x86_64", &tmp.path().join("os-release"))
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::OsRelease { .. }));
    }

    #[test]
    fn host_architecture_is_reported() {
        let arch = get_host_architecture().expect("uname should succeed");

        assert!(!arch.is_empty());
    }
}
