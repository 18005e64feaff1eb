pub mod compress;
pub mod decompress;

#[derive(clap::Subcommand)]
pub enum LzCommands {
    /// LZ77 compress a file
    Compress(compress::CompressArgs),
    /// Decompress an LZ77 or LH file
    Decompress(decompress::DecompressArgs),
}

impl LzCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            LzCommands::Compress(compress) => compress.handle(),
            LzCommands::Decompress(decompress) => decompress.handle(),
        }
    }
}
