use crate::command::paths::get_project_config_path;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs::read_to_string;

pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("init/template/pow.default.toml");

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PowTomlProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PowTomlSim {
    /// Launcher for `pow sim run`; forwarded arguments are appended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PowToml {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<PowTomlProject>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sim: Option<PowTomlSim>,
}

impl PowToml {
    pub fn default_command() -> Vec<String> {
        vec!["uv".to_string(), "run".to_string(), "isaacsim".to_string()]
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().and_then(|project| project.name.as_deref())
    }

    /// The launcher command, falling back to `uv run isaacsim`.
    pub fn sim_command(&self) -> Result<Vec<String>> {
        let command = self
            .sim
            .as_ref()
            .and_then(|sim| sim.command.clone())
            .unwrap_or_else(Self::default_command);

        if command.is_empty() || command[0].trim().is_empty() {
            bail!("invalid `sim.command` in pow.toml: launcher program is empty");
        }

        Ok(command)
    }
}

/// A parsed `pow.toml`: the typed view plus the full document for display.
#[derive(Clone, Debug)]
pub struct ProjectConfig {
    pub config: PowToml,
    pub table: toml::Table,
}

impl ProjectConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(contents)?;

        let config: PowToml = toml::Value::Table(table.clone())
            .try_into()
            .context("failed to deserialize pow.toml")?;

        Ok(Self { config, table })
    }

    pub fn display(&self) -> Result<String> {
        toml::to_string_pretty(&self.table).context("failed to serialize pow.toml")
    }
}

pub async fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = get_project_config_path(project_root);

    if !path.exists() {
        bail!("config file not found: {}", path.display());
    }

    let contents = read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    ProjectConfig::parse(&contents)
        .with_context(|| format!("failed to parse TOML from {}", path.display()))
}
