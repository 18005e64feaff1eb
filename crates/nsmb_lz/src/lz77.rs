//! LZ77 compression with the `0x11` tag
//!
//! After the header the stream is a series of groups, each made of a flag byte followed by up to
//! eight tokens. Flag bits are read from the most significant one down, a clear bit is a literal
//! byte and a set bit is a back reference. References come in three sizes, selected by the top
//! nibble of their first byte:
//!
//! | Top nibble | Size    | Length                                   | Distance                  |
//! |------------|---------|------------------------------------------|---------------------------|
//! | `0`        | 3 bytes | `(b0 & 0xF) << 4 \| b1 >> 4` + 0x11      | `(b1 & 0xF) << 8 \| b2` + 1 |
//! | `1`        | 4 bytes | `(b0 & 0xF) << 12 \| b1 << 4 \| b2 >> 4` + 0x111 | `(b2 & 0xF) << 8 \| b3` + 1 |
//! | `2..=F`    | 2 bytes | nibble + 1                               | `(b0 & 0xF) << 8 \| b1` + 1 |

use bon::Builder;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::header::{read_header, write_header, zero_fill, LZ77_TAG};

/// Largest input [`compress`] accepts
pub const MAX_SIZE: usize = 0xFF_FFFF;

/// Largest distance a reference can reach back
pub const WINDOW_SIZE: usize = 0x1000;

/// Shortest match worth a reference
pub const MIN_MATCH: usize = 3;

/// Longest match a single reference can hold
pub const MAX_MATCH: usize = 0xFFFF + 0x111;

const PREALLOC_LIMIT: usize = 0x100_0000;

const HASH_BITS: u32 = 12;
const NO_POSITION: usize = usize::MAX;

/// Tuning for [`compress_with`]
#[derive(Debug, Clone, Copy, Builder)]
pub struct Lz77Options {
    /// How far back matches are searched, at most [`WINDOW_SIZE`]
    #[builder(default = WINDOW_SIZE)]
    pub window_size: usize,

    /// Longest match emitted, between [`MIN_MATCH`] and [`MAX_MATCH`]
    #[builder(default = MAX_MATCH)]
    pub max_match: usize,
}

impl Default for Lz77Options {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn read_reference(input: &mut impl Iterator<Item = u8>) -> Option<(usize, usize)> {
    let b0 = input.next()? as usize;
    let b1 = input.next()? as usize;

    match b0 >> 4 {
        0 => {
            let b2 = input.next()? as usize;
            let length = (((b0 & 0xF) << 4) | (b1 >> 4)) + 0x11;
            let distance = (((b1 & 0xF) << 8) | b2) + 1;
            Some((length, distance))
        }
        1 => {
            let b2 = input.next()? as usize;
            let b3 = input.next()? as usize;
            let length = (((b0 & 0xF) << 12) | (b1 << 4) | (b2 >> 4)) + 0x111;
            let distance = (((b2 & 0xF) << 8) | b3) + 1;
            Some((length, distance))
        }
        nibble => {
            let distance = (((b0 & 0xF) << 8) | b1) + 1;
            Some((nibble + 1, distance))
        }
    }
}

/// Decompress LZ77 data
///
/// Data that does not start with the `0x11` tag is returned unchanged. Decoding stops once the
/// declared size is reached or the input runs out, in which case the rest of the output is zero.
#[instrument(skip_all, err, fields(size = data.len()))]
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.first() != Some(&LZ77_TAG) {
        debug!("no lz77 tag, passing data through");
        return Ok(data.to_vec());
    }

    let header = read_header(data)?;
    let size = header.size;
    let mut out = Vec::with_capacity(size.min(PREALLOC_LIMIT));
    let mut input = data[header.len..].iter().copied();

    'groups: while out.len() < size {
        let Some(flags) = input.next() else {
            break;
        };

        for bit in (0..8).rev() {
            if out.len() >= size {
                break 'groups;
            }

            if flags & (1 << bit) == 0 {
                let Some(byte) = input.next() else {
                    break 'groups;
                };
                out.push(byte);
                continue;
            }

            let Some((length, distance)) = read_reference(&mut input) else {
                break 'groups;
            };
            if distance > out.len() {
                return Err(Error::InvalidLookback {
                    position: out.len(),
                    distance,
                });
            }

            for _ in 0..length.min(size - out.len()) {
                let byte = out[out.len() - distance];
                out.push(byte);
            }
        }
    }

    zero_fill(&mut out, size);

    Ok(out)
}

/// Compress data with the default [`Lz77Options`]
///
/// Returns `None` when the input is larger than [`MAX_SIZE`].
pub fn compress(data: &[u8]) -> Option<Vec<u8>> {
    compress_with(data, Lz77Options::default())
}

/// Compress data using greedy longest matching
///
/// Among matches of equal length the most recent one wins. Returns `None` when the input is larger
/// than [`MAX_SIZE`].
#[instrument(skip_all, fields(size = data.len()))]
pub fn compress_with(data: &[u8], options: Lz77Options) -> Option<Vec<u8>> {
    if data.len() > MAX_SIZE {
        debug!("input too large for lz77");
        return None;
    }

    let mut finder = MatchFinder::new(
        data,
        options.window_size.clamp(1, WINDOW_SIZE),
        options.max_match.clamp(MIN_MATCH, MAX_MATCH),
    );

    let mut out = Vec::with_capacity(data.len() + data.len() / 8 + 8);
    write_header(&mut out, LZ77_TAG, data.len() as u32);

    let mut pos = 0;
    let mut flag_index = 0;
    let mut tokens = 8;
    while pos < data.len() {
        if tokens == 8 {
            flag_index = out.len();
            out.push(0);
            tokens = 0;
        }

        match finder.longest_match(pos) {
            Some((length, distance)) => {
                out[flag_index] |= 0x80 >> tokens;
                write_reference(&mut out, length, distance);
                for p in pos..pos + length {
                    finder.insert(p);
                }
                pos += length;
            }
            None => {
                out.push(data[pos]);
                finder.insert(pos);
                pos += 1;
            }
        }
        tokens += 1;
    }

    debug!(compressed = out.len(), "compressed");
    Some(out)
}

fn write_reference(out: &mut Vec<u8>, length: usize, distance: usize) {
    let disp = distance - 1;
    if length <= 0x10 {
        out.push((((length - 1) << 4) | (disp >> 8)) as u8);
        out.push(disp as u8);
    } else if length <= 0x110 {
        let length = length - 0x11;
        out.push((length >> 4) as u8);
        out.push((((length & 0xF) << 4) | (disp >> 8)) as u8);
        out.push(disp as u8);
    } else {
        let length = length - 0x111;
        out.push((0x10 | (length >> 12)) as u8);
        out.push((length >> 4) as u8);
        out.push((((length & 0xF) << 4) | (disp >> 8)) as u8);
        out.push(disp as u8);
    }
}

/// Hash chains over three byte prefixes
struct MatchFinder<'a> {
    data: &'a [u8],
    window: usize,
    max_match: usize,
    head: Vec<usize>,
    prev: Vec<usize>,
}

impl<'a> MatchFinder<'a> {
    fn new(data: &'a [u8], window: usize, max_match: usize) -> Self {
        Self {
            data,
            window,
            max_match,
            head: vec![NO_POSITION; 1 << HASH_BITS],
            prev: vec![NO_POSITION; data.len()],
        }
    }

    fn hash(&self, pos: usize) -> usize {
        let key = (self.data[pos] as u32) << 16
            | (self.data[pos + 1] as u32) << 8
            | self.data[pos + 2] as u32;
        (key.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
    }

    fn insert(&mut self, pos: usize) {
        if pos + MIN_MATCH > self.data.len() {
            return;
        }
        let hash = self.hash(pos);
        self.prev[pos] = self.head[hash];
        self.head[hash] = pos;
    }

    /// Longest `(length, distance)` match for `pos`, walking candidates newest first
    fn longest_match(&self, pos: usize) -> Option<(usize, usize)> {
        if pos + MIN_MATCH > self.data.len() {
            return None;
        }

        let limit = self.max_match.min(self.data.len() - pos);
        let mut best = (0, 0);
        let mut candidate = self.head[self.hash(pos)];
        while candidate != NO_POSITION && pos - candidate <= self.window {
            let length = self.data[candidate..]
                .iter()
                .zip(&self.data[pos..pos + limit])
                .take_while(|(a, b)| a == b)
                .count();

            if length > best.0 {
                best = (length, pos - candidate);
                if length == limit {
                    break;
                }
            }
            candidate = self.prev[candidate];
        }

        (best.0 >= MIN_MATCH).then_some(best)
    }
}
