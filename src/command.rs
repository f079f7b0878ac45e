use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{subscriber, Level};
use tracing_subscriber::{fmt::writer::MakeWriterExt, FmtSubscriber};

mod assets;
mod config;
mod init;
mod isaacsim;
mod kit;
mod log;
mod paths;
mod run;
mod system;

#[derive(Subcommand)]
pub enum CommandSimAdd {
    /// Download, merge and extract the Isaac Sim asset pack, then point Isaac Sim at it
    LocalAssets {
        /// Directory the asset pack is downloaded and extracted into
        path: PathBuf,

        /// Asset pack version
        #[arg(default_value = assets::DEFAULT_ASSETS_VERSION, long)]
        assets_version: String,

        #[arg(default_value = assets::DEFAULT_BASE_URL, long)]
        base_url: String,

        /// Download utility (aria2c compatible)
        #[arg(default_value = assets::DEFAULT_DOWNLOADER, long)]
        downloader: String,

        /// Extraction utility (unzip compatible)
        #[arg(default_value = assets::DEFAULT_EXTRACTOR, long)]
        extractor: String,

        /// Only rewrite Isaac Sim settings for an already extracted asset pack
        #[arg(default_value_t = false, long)]
        skip_download: bool,
    },
}

#[derive(Subcommand)]
pub enum CommandSim {
    #[clap(subcommand)]
    Add(CommandSimAdd),

    /// Initialize an Isaac Sim project in the current directory
    Init {},

    /// Run the project's Isaac Sim app
    Run {
        /// Arguments forwarded to the launched app
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(subcommand)]
    Sim(CommandSim),
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(default_value_t = Level::INFO, global = true, long)]
    level: Level,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Cli { command, level } = cli;

    // Set up tracing subscriber

    let subscriber_writer = std::io::stderr.with_max_level(level);

    let mut subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(subscriber_writer)
        .without_time();

    if [Level::DEBUG, Level::TRACE].contains(&level) {
        subscriber = subscriber.with_file(true).with_line_number(true);
    }

    let subscriber = subscriber.finish();

    subscriber::set_global_default(subscriber).expect("setting default subscriber");

    match command {
        Command::Sim(sim) => match sim {
            CommandSim::Add(add) => match add {
                CommandSimAdd::LocalAssets {
                    path,
                    assets_version,
                    base_url,
                    downloader,
                    extractor,
                    skip_download,
                } => {
                    let install = assets::Install {
                        downloader,
                        extractor,
                        parts: assets::ArchiveParts::new(&base_url, &assets_version),
                        target: path,
                    };

                    assets::run(&install, skip_download).await
                }
            },

            CommandSim::Init {} => init::run().await,

            CommandSim::Run { args } => run::run(&args).await,
        },
    }
}
