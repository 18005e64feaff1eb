use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use nsmb_u8::U8Archive;
use std::{io::Write, path::PathBuf};
use tracing::info;

use crate::commands::{create_output, read_input};

#[derive(Args)]
pub struct ExtractArgs {
    /// An input archive, optionally compressed
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let raw = nsmb_lz::decompress(&read_input(&self.file)?)?;
        let archive = U8Archive::from_bytes(&raw)?;

        for (name, data) in archive.entries() {
            let p = self.directory.join(&name);

            let Some(data) = data else {
                std::fs::create_dir_all(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", p.display()))?;
                continue;
            };

            info!("writing {}", p.display());
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)
                    .into_diagnostic()
                    .context(format!("creating {}", parent.display()))?;
            }

            let mut out = create_output(&p, self.overwrite)?;
            out.write_all(data).into_diagnostic()?;
        }
        Ok(())
    }
}
