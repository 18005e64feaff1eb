use clap::Args;
use miette::{IntoDiagnostic, Result};
use nsmb_lz::CompressionType;
use std::{io::Write, path::PathBuf};
use tracing::{info, warn};

use crate::commands::{create_output, read_input};

#[derive(Args)]
pub struct DecompressArgs {
    /// An input file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl DecompressArgs {
    pub fn handle(&self) -> Result<()> {
        let data = read_input(&self.file)?;

        match CompressionType::detect(&data) {
            Some(kind) => info!("detected {:?} data", kind),
            None => warn!("{} is not compressed, copying it", self.file.display()),
        }

        let decompressed = nsmb_lz::decompress(&data)?;
        info!("decompressed to {} bytes", decompressed.len());

        let mut out = create_output(&self.output, self.overwrite)?;
        out.write_all(&decompressed).into_diagnostic()?;

        Ok(())
    }
}
