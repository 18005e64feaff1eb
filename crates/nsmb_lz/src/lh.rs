//! LH decompression, LZ77 with huffman coded tokens
//!
//! After the header come two huffman tables and the token stream:
//!
//! | Part            | Entry width | Prefix             | Symbols                                 |
//! |-----------------|-------------|--------------------|-----------------------------------------|
//! | Primary table   | 9 bits      | 2 bytes, LE        | `< 0x100` literal, else length `- 0xFD` |
//! | Secondary table | 5 bits      | 1 byte             | bit count of the reference distance     |
//!
//! Each table occupies `(prefix + 1) * 4` bytes, prefix included, and stores its entries as
//! big-endian bit fields starting at slot 1. A table is a binary tree: every inner node holds the
//! offset to its pair of children plus one leaf flag per child. The token stream is read as 32-bit
//! little-endian words, most significant bit first.

use bitstream_io::{BigEndian, BitRead, BitReader};
use byteorder::{ByteOrder, LittleEndian};
use std::io::{Cursor, ErrorKind};
use tracing::{debug, instrument, trace};

use crate::error::{Error, Result};
use crate::header::{read_header, zero_fill, CompressionType};

/// Entry width of the primary table
pub const PRIMARY_WIDTH: u32 = 9;

/// Entry width of the secondary table
pub const SECONDARY_WIDTH: u32 = 5;

const PREALLOC_LIMIT: usize = 0x100_0000;

/// Turn the end of the bit stream into `None`
fn until_eof<T>(result: std::io::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Unpack one table of `width`-bit entries from the start of `input`
///
/// Returns the table and the number of bytes it occupied. Slot 0 is unused so that the children of
/// every node form an aligned pair.
pub fn load_piece(input: &[u8], width: u32) -> Result<(Vec<u16>, usize)> {
    let (prefix, prefix_len) = if width > 8 {
        let raw = input.get(..2).ok_or(Error::Truncated)?;
        (LittleEndian::read_u16(raw) as usize, 2)
    } else {
        (*input.first().ok_or(Error::Truncated)? as usize, 1)
    };

    let region = (prefix + 1) * 4;
    let body = input.get(prefix_len..region).ok_or(Error::Truncated)?;
    let count = body.len() * 8 / width as usize;

    let mut reader = BitReader::endian(Cursor::new(body), BigEndian);
    let mut table = vec![0u16; count + 1];
    for slot in table.iter_mut().skip(1) {
        *slot = reader.read::<u16>(width)?;
    }

    trace!(width, entries = count, region, "loaded table");
    Ok((table, region))
}

/// A huffman table as loaded by [`load_piece`]
struct Tree {
    table: Vec<u16>,
    offset_mask: u16,
    leaf_flag: u16,
}

impl Tree {
    fn new(table: Vec<u16>, width: u32) -> Self {
        Self {
            table,
            offset_mask: (1 << (width - 2)) - 1,
            leaf_flag: 1 << (width - 1),
        }
    }

    fn slot(&self, index: usize) -> Result<u16> {
        self.table
            .get(index)
            .copied()
            .ok_or(Error::InvalidTable(index))
    }

    /// Walk from the root to a leaf, `None` once the stream is exhausted
    fn decode<R: BitRead>(&self, bits: &mut R) -> Result<Option<u16>> {
        let mut index = 1;
        loop {
            let node = self.slot(index)?;
            let Some(bit) = until_eof(bits.read_bit())? else {
                return Ok(None);
            };
            let bit = bit as usize;

            let next = (index & !1) + 2 * ((node & self.offset_mask) as usize + 1) + bit;
            if node & (self.leaf_flag >> bit) != 0 {
                return self.slot(next).map(Some);
            }
            index = next;
        }
    }
}

/// Decompress LH data
///
/// Decoding stops once the declared size is reached or the token stream runs out, in which case the
/// rest of the output is zero.
#[instrument(skip_all, err, fields(size = data.len()))]
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let tag = *data.first().ok_or(Error::Truncated)?;
    if CompressionType::detect(data) != Some(CompressionType::Lh) {
        return Err(Error::UnexpectedType(tag));
    }

    let header = read_header(data)?;
    let mut pos = header.len;

    let (primary, len) = load_piece(&data[pos..], PRIMARY_WIDTH)?;
    pos += len;
    let (secondary, len) = load_piece(&data[pos..], SECONDARY_WIDTH)?;
    pos += len;
    debug!(
        primary = primary.len(),
        secondary = secondary.len(),
        stream = pos,
        "read tables"
    );

    let primary = Tree::new(primary, PRIMARY_WIDTH);
    let secondary = Tree::new(secondary, SECONDARY_WIDTH);

    let stream: Vec<u8> = data[pos..]
        .chunks_exact(4)
        .flat_map(|word| [word[3], word[2], word[1], word[0]])
        .collect();
    let mut bits = BitReader::endian(Cursor::new(stream), BigEndian);

    let size = header.size;
    let mut out = Vec::with_capacity(size.min(PREALLOC_LIMIT));
    while out.len() < size {
        let Some(symbol) = primary.decode(&mut bits)? else {
            break;
        };
        if symbol < 0x100 {
            out.push(symbol as u8);
            continue;
        }

        let length = (symbol & 0xFF) as usize + 3;
        let Some(width) = secondary.decode(&mut bits)? else {
            break;
        };
        let distance = match width {
            0 => 0,
            1 => 1,
            width => {
                let Some(low) = until_eof(bits.read::<u32>(width as u32 - 1))? else {
                    break;
                };
                (1 << (width - 1)) | low as usize
            }
        };

        if distance + 1 > out.len() {
            return Err(Error::InvalidLookback {
                position: out.len(),
                distance: distance + 1,
            });
        }
        for _ in 0..length.min(size - out.len()) {
            let byte = out[out.len() - distance - 1];
            out.push(byte);
        }
    }

    zero_fill(&mut out, size);

    Ok(out)
}
