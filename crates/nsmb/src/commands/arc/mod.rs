pub mod diff;
pub mod extract;
pub mod pack;

#[derive(clap::Subcommand)]
pub enum ArcCommands {
    /// Compare two U8 archives
    Diff(diff::DiffArgs),
    /// Extract a U8 archive into a directory
    Extract(extract::ExtractArgs),
    /// Pack a directory into a U8 archive
    Pack(pack::PackArgs),
}

impl ArcCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            ArcCommands::Diff(diff) => diff.handle(),
            ArcCommands::Extract(extract) => extract.handle(),
            ArcCommands::Pack(pack) => pack.handle(),
        }
    }
}
