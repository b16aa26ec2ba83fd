mod app;

use anyhow::Result;
use clap::{Parser, Subcommand};
use grove_layout::SplitDirection;
use std::path::PathBuf;

use crate::app::{Paths, Runner};

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Split-pane workspace manager for terminal sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Directory holding workspace.json and settings.json
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the workspace and the rectangles of its visible panes as JSON
    Dump {
        #[arg(long, default_value_t = 80)]
        cols: u16,
        #[arg(long, default_value_t = 24)]
        rows: u16,
    },
    /// Add a session for a directory and make it active
    Add {
        /// Working directory of the session
        path: String,
        /// Session name, defaults to the last path component
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Split the focused pane of the active session
    Split {
        /// Stack the new pane below instead of beside
        #[arg(long)]
        down: bool,
    },
    /// Run the visible sessions, forwarding stdin to the focused pane
    Run {
        #[arg(long, default_value_t = 80)]
        cols: u16,
        #[arg(long, default_value_t = 24)]
        rows: u16,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let paths = Paths::new(cli.config_dir);

    match cli.command {
        Commands::Dump { cols, rows } => app::dump(&paths, cols, rows),
        Commands::Add { path, name } => app::add(&paths, &path, name.as_deref()),
        Commands::Split { down } => {
            let direction = if down {
                SplitDirection::Horizontal
            } else {
                SplitDirection::Vertical
            };
            app::split(&paths, direction)
        }
        Commands::Run { cols, rows } => {
            let (runner, pty_events) = Runner::new(paths, cols, rows);
            runner.run(pty_events)
        }
    }
}
