use crate::command::{
    config::load_project_config,
    paths::find_project_root,
    system::{check_host, get_host_architecture, get_os_release_path},
};
use anyhow::{anyhow, bail, Context, Result};
use std::{
    env::current_dir,
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info};

/// A validated launch: the program, its arguments and the project it runs in.
#[derive(Clone, Debug, PartialEq)]
pub struct RunPlan {
    pub project_root: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

impl RunPlan {
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);

        command.args(&self.args).current_dir(&self.project_root);

        command
    }
}

/// Resolves the project from `start`, validates the host and builds the launch.
///
/// `forwarded` is appended verbatim after the configured launcher.
pub async fn plan(
    start: &Path,
    arch: &str,
    os_release_path: &Path,
    forwarded: &[String],
) -> Result<RunPlan> {
    let project_root = find_project_root(Some(start)).ok_or_else(|| {
        anyhow!("Could not find pow.toml in current directory or any parent directory.")
    })?;

    println!("Project root: {}", project_root.display());

    let config = load_project_config(&project_root).await?;

    println!("Loaded config:\n{}", config.display()?);

    if let Some(name) = config.config.project_name() {
        info!("project: {name}");
    }

    check_host(arch, os_release_path).await?;

    let mut launcher = config.config.sim_command()?.into_iter();

    let program = launcher
        .next()
        .ok_or_else(|| anyhow!("invalid `sim.command` in pow.toml: launcher program is empty"))?;

    let args = launcher.chain(forwarded.iter().cloned()).collect();

    Ok(RunPlan {
        project_root,
        program,
        args,
    })
}

pub async fn run(args: &[String]) -> Result<()> {
    let start = current_dir().context("failed to get current directory")?;
    let arch = get_host_architecture()?;

    debug!("run: arch={arch}, args={args:?}");

    let plan = plan(&start, &arch, &get_os_release_path(), args).await?;

    info!("run: executing {} {}", plan.program, plan.args.join(" "));

    // exec() only returns on error
    let err = plan.command().exec();

    bail!("failed to execute {}: {}", plan.program, err);
}
