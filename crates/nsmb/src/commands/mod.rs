pub mod arc;
pub mod level;
pub mod lz;

use miette::{Context, IntoDiagnostic, Result};
use std::{fs::File, path::Path};

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle U8 archives
    Arc {
        #[command(subcommand)]
        command: arc::ArcCommands,
    },
    /// Handle LZ77 and LH compressed files
    Lz {
        #[command(subcommand)]
        command: lz::LzCommands,
    },
    /// Handle level archives
    Level {
        #[command(subcommand)]
        command: level::LevelCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> Result<()> {
        match self {
            Commands::Arc { command } => command.handle(),
            Commands::Lz { command } => command.handle(),
            Commands::Level { command } => command.handle(),
        }
    }
}

/// Read a whole input file
pub(crate) fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))
}

/// Create an output file, refusing to replace an existing one unless asked
pub(crate) fn create_output(path: &Path, overwrite: bool) -> Result<File> {
    let file = if overwrite {
        File::create(path)
    } else {
        File::create_new(path)
    };
    file.into_diagnostic()
        .context(format!("creating {}", path.display()))
}
