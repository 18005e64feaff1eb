use clap::Args;
use miette::{IntoDiagnostic, Result};
use nsmb_course::Level;
use std::{io::Write, path::PathBuf};
use tracing::{info, warn};

use crate::commands::{create_output, read_input};

#[derive(Args)]
pub struct ResaveArgs {
    /// An input level archive, optionally compressed
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target level archive
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Write the archive without LZ77 compression
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ResaveArgs {
    pub fn handle(&self) -> Result<()> {
        let level = Level::from_bytes(&read_input(&self.file)?)?;
        info!("read {} areas", level.areas.len());

        for (number, area) in level.areas.iter().enumerate() {
            if let Err(err) = area.records.bind() {
                warn!("area {}: {}", number + 1, err);
            }
        }

        let bytes = level.to_bytes(!self.raw)?;
        info!("writing {} bytes to {}", bytes.len(), self.output.display());

        let mut out = create_output(&self.output, self.overwrite)?;
        out.write_all(&bytes).into_diagnostic()?;

        Ok(())
    }
}
