use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "calltap")]
#[command(about = "calltap - call interception and failure injection drills", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new config file
    Init {
        /// Path for new config file
        #[arg(default_value = "calltap.toml")]
        path: PathBuf,
    },
    /// Run the fault drills from the config
    Drill {
        /// Run only the drill with this name
        #[arg(long)]
        only: Option<String>,
    },
    /// Resolve a static asset URL and the asset directory
    Asset {
        /// Asset path, e.g. /images/logo.svg
        path: String,
        /// Resolve for the production build layout
        #[arg(long)]
        prod: bool,
    },
}
