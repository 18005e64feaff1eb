use clap::Args;
use miette::{IntoDiagnostic, Result};
use nsmb_course::Level;
use std::path::PathBuf;
use tracing::info;

use crate::commands::read_input;

#[derive(Args)]
pub struct InfoArgs {
    /// An input level archive, optionally compressed
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Indent the output
    #[arg(short, long, default_value_t = false)]
    pretty: bool,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let level = Level::from_bytes(&read_input(&self.file)?)?;

        for (number, area) in level.areas.iter().enumerate() {
            let records = &area.records;
            info!(
                "area {}: {} zones, {} sprites, {} entrances, {} objects",
                number + 1,
                records.zones.len(),
                records.sprites.len(),
                records.entrances.len(),
                area.object_count()
            );
            for (key, kind, value) in records.metadata.iter() {
                info!(
                    "  {} ({}): {}",
                    String::from_utf8_lossy(key),
                    kind,
                    records
                        .metadata
                        .string(key)
                        .filter(|_| kind == nsmb_course::metadata::TYPE_STRING)
                        .unwrap_or_else(|| format!("{} bytes", value.len()))
                );
            }
        }

        let json = if self.pretty {
            serde_json::to_string_pretty(&level)
        } else {
            serde_json::to_string(&level)
        }
        .into_diagnostic()?;
        println!("{json}");

        Ok(())
    }
}
