use clap::Args;
use miette::{miette, IntoDiagnostic, Result};
use nsmb_lz::{lz77, Lz77Options};
use std::{io::Write, path::PathBuf};
use tracing::info;

use crate::commands::{create_output, read_input};

#[derive(Args)]
pub struct CompressArgs {
    /// An input file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// How far back matches may reach, smaller is faster
    #[arg(
        short,
        long,
        value_name = "BYTES",
        value_parser = clap::value_parser!(u16).range(1..=0x1000)
    )]
    window: Option<u16>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl CompressArgs {
    pub fn handle(&self) -> Result<()> {
        let data = read_input(&self.file)?;

        let options = Lz77Options::builder()
            .maybe_window_size(self.window.map(usize::from))
            .build();
        let compressed = lz77::compress_with(&data, options)
            .ok_or(miette!("{} is too large to compress", self.file.display()))?;

        info!(
            "compressed {} bytes to {} bytes",
            data.len(),
            compressed.len()
        );

        let mut out = create_output(&self.output, self.overwrite)?;
        out.write_all(&compressed).into_diagnostic()?;

        Ok(())
    }
}
