use clap::Args;
use itertools::Itertools;
use miette::miette;
use miette::{Context, IntoDiagnostic, Result};
use nsmb_u8::U8Archive;
use std::{io::Write, path::PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::commands::{create_output, read_input};

#[derive(Args)]
pub struct PackArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target archive
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// LZ77 compress the archive
    #[arg(short, long, default_value_t = false)]
    compress: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        info!("creating {}", &self.file.display());

        let entries = WalkDir::new(&self.directory)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .collect::<Vec<_>>();

        if entries.is_empty() {
            return Err(miette!("directory is empty"));
        }

        let mut archive = U8Archive::new();
        for entry in entries {
            let name = entry
                .path()
                .strip_prefix(&self.directory)
                .into_diagnostic()?;
            let name = name
                .components()
                .map(|c| c.as_os_str().to_str())
                .collect::<Option<Vec<_>>>()
                .ok_or(miette!("unable to convert {} to a string", name.display()))?
                .iter()
                .join("/");

            if entry.file_type().is_dir() {
                archive.set(&name, None)?;
                continue;
            }

            info!("packing {}", name);
            let data = read_input(entry.path())?;
            archive
                .set(&name, Some(data))
                .context(format!("adding {}", name))?;
        }

        let mut bytes = archive.to_bytes()?;
        if self.compress {
            bytes = nsmb_lz::compress(&bytes)
                .ok_or(miette!("archive is too large to compress ({} bytes)", bytes.len()))?;
        }

        let mut out = create_output(&self.file, self.overwrite)?;
        out.write_all(&bytes).into_diagnostic()?;

        Ok(())
    }
}
