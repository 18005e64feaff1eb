//! Compression header shared by the LZ77 and LH formats
//!
//! Every compressed blob starts with a one byte tag followed by the uncompressed size as a 24-bit
//! little-endian integer. Sizes that do not fit are stored as a zeroed 24-bit field followed by a
//! full 32-bit little-endian size.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, ErrorKind};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Tag byte of LZ77 compressed data
pub const LZ77_TAG: u8 = 0x11;

/// Tag byte written for LH compressed data, only the top nibble is significant
pub const LH_TAG: u8 = 0x40;

/// Zero padding beyond this many bytes is reported as a warning
pub const PADDING_WARN_LIMIT: usize = 0x10000;

/// Pad the output of a decoder whose input ended early up to the declared size
///
/// The declared size is trusted as is, so a truncated blob can still produce up to 4 GiB of zeros.
pub(crate) fn zero_fill(out: &mut Vec<u8>, size: usize) {
    if out.len() >= size {
        return;
    }

    let padding = size - out.len();
    if padding > PADDING_WARN_LIMIT && padding > out.len() {
        warn!(decoded = out.len(), declared = size, "input ended early, padding with zeros");
    } else {
        debug!(decoded = out.len(), declared = size, "input ended early");
    }
    out.resize(size, 0);
}

/// Compression scheme of a blob, as announced by its tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// LZ77 with the `0x11` tag
    Lz77,

    /// LZ77 with huffman coded tokens, any tag in `0x40..=0x4F`
    Lh,
}

impl CompressionType {
    /// Detect the compression type of a blob, `None` when it is not compressed
    pub fn detect(data: &[u8]) -> Option<Self> {
        match *data.first()? {
            LZ77_TAG => Some(CompressionType::Lz77),
            tag if tag >> 4 == LH_TAG >> 4 => Some(CompressionType::Lh),
            _ => None,
        }
    }

    /// The tag byte written for this compression type
    pub fn tag(self) -> u8 {
        match self {
            CompressionType::Lz77 => LZ77_TAG,
            CompressionType::Lh => LH_TAG,
        }
    }
}

/// A parsed compression header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Raw tag byte
    pub tag: u8,

    /// Declared uncompressed size
    pub size: usize,

    /// Length of the header itself, 4 or 8 bytes
    pub len: usize,
}

fn truncated(err: std::io::Error) -> Error {
    match err.kind() {
        ErrorKind::UnexpectedEof => Error::Truncated,
        _ => Error::IOError(err),
    }
}

/// Parse the compression header at the start of `data`
///
/// A 24-bit size of zero always means the extended 32-bit size follows, even if the real size is
/// zero.
pub fn read_header(data: &[u8]) -> Result<Header> {
    let mut reader = Cursor::new(data);
    let tag = reader.read_u8().map_err(truncated)?;
    let short = reader.read_u24::<LittleEndian>().map_err(truncated)?;
    if short != 0 {
        return Ok(Header {
            tag,
            size: short as usize,
            len: 4,
        });
    }

    let size = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    Ok(Header {
        tag,
        size: size as usize,
        len: 8,
    })
}

/// Declared uncompressed size of a compressed blob
pub fn uncompressed_size(data: &[u8]) -> Result<usize> {
    Ok(read_header(data)?.size)
}

/// Length of the compression header at the start of `data`
pub fn header_len(data: &[u8]) -> Result<usize> {
    Ok(read_header(data)?.len)
}

/// Append a compression header to `out`
///
/// Zero and anything above 24 bits use the extended form, so the written header always reads back
/// with the same size.
pub fn write_header(out: &mut Vec<u8>, tag: u8, size: u32) {
    out.push(tag);
    if size != 0 && size <= 0xFF_FFFF {
        let mut buf = [0; 3];
        LittleEndian::write_u24(&mut buf, size);
        out.extend_from_slice(&buf);
    } else {
        let mut buf = [0; 7];
        LittleEndian::write_u32(&mut buf[3..], size);
        out.extend_from_slice(&buf);
    }
}
