//! This library implements the compression formats found in *New Super Mario Bros. Wii* assets.
//!
//! # Compressed Blob Format Documentation
//!
//! Compressed files start with a one byte tag naming the format, followed by the size of the data
//! once decompressed.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Tag                    | 1 byte: `0x11` for LZ77, `0x40..=0x4F` for LH              |
//! | 0x0001         | Size                   | 3 bytes: Uncompressed size, little-endian                  |
//! | 0x0004         | Extended Size          | 4 bytes: Present only when the 3 byte size is zero         |
//!
//! - [`lz77`] reads and writes the LZ77 format used for most archives.
//! - [`lh`] reads the LH format some tilesets ship in. There is no LH encoder.
//!
//! [`decompress`] picks the right decoder from the tag and passes anything else through unchanged.
//!
//! ```
//! # fn doit() -> nsmb_lz::error::Result<()>
//! # {
//! let data = b"Pa0_jyotyu Pa0_jyotyu".to_vec();
//! let compressed = nsmb_lz::compress(&data).unwrap();
//! assert_eq!(nsmb_lz::decompress(&compressed)?, data);
//! # Ok(())
//! # }
//! # doit().unwrap();
//! ```

pub mod error;
pub mod header;
pub mod lh;
pub mod lz77;

pub use header::CompressionType;
pub use lz77::{compress, Lz77Options};

use error::Result;

/// Decompress LZ77 or LH data, returning anything else unchanged
///
/// The output always has the size the header declares. Input that ends early is padded with zeros,
/// so a few bytes of header can expand into a very large buffer.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    match CompressionType::detect(data) {
        Some(CompressionType::Lz77) => lz77::decompress(data),
        Some(CompressionType::Lh) => lh::decompress(data),
        None => Ok(data.to_vec()),
    }
}
