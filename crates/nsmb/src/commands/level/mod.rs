pub mod info;
pub mod resave;

#[derive(clap::Subcommand)]
pub enum LevelCommands {
    /// Print the contents of a level as JSON
    Info(info::InfoArgs),
    /// Read a level and write it back out
    Resave(resave::ResaveArgs),
}

impl LevelCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            LevelCommands::Info(info) => info.handle(),
            LevelCommands::Resave(resave) => resave.handle(),
        }
    }
}
