//! Editor metadata stored between the block table and the first block of a course
//!
//! The `MD2_` format is a flat list of keys, each holding one or more typed values:
//!
//! | Field      | Size          | Description                                  |
//! |------------|---------------|----------------------------------------------|
//! | Magic      | 4 bytes       | `MD2_`                                       |
//! | Key length | 4 bytes       | Length of the key                            |
//! | Key        | variable      | Raw key bytes                                |
//! | Type count | 4 bytes       | Number of values stored under the key        |
//! | Type       | 4 bytes       | `0` binary, `1` string, anything else opaque |
//! | Data size  | 4 bytes       | Length of the value                          |
//! | Data       | variable      | Raw value bytes                              |
//! | Reserved   | 4 bytes       | Zero, after the last key                     |
//!
//! All integers are big-endian. Data that does not start with the magic is handed to the
//! [`legacy`](crate::legacy) importer.

use byteorder::{BigEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::legacy;

/// Magic at the start of metadata blocks
pub const MAGIC: &[u8; 4] = b"MD2_";

/// Reserved zero bytes after the last record
pub const TRAILER_LEN: usize = 4;

/// Type of raw binary values
pub const TYPE_BINARY: u32 = 0;

/// Type of single byte per character strings
pub const TYPE_STRING: u32 = 1;

/// Key/type/value store for editor annotations
///
/// Keys and types are kept sorted, which makes [`Metadata::serialize`] deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<Vec<u8>, BTreeMap<u32, Vec<u8>>>,
}

fn read_record(reader: &mut Cursor<&[u8]>) -> std::io::Result<(Vec<u8>, Vec<(u32, Vec<u8>)>)> {
    let key_len = reader.read_u32::<BigEndian>()?;
    let key = read_exact_vec(reader, key_len)?;

    let count = reader.read_u32::<BigEndian>()?;
    let mut values = Vec::new();
    for _ in 0..count {
        let kind = reader.read_u32::<BigEndian>()?;
        let len = reader.read_u32::<BigEndian>()?;
        values.push((kind, read_exact_vec(reader, len)?));
    }

    Ok((key, values))
}

fn read_exact_vec(reader: &mut Cursor<&[u8]>, len: u32) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut data)?;
    if data.len() != len as usize {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }
    Ok(data)
}

/// Decode a string where every byte is one code point
pub(crate) fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|b| *b as char).collect()
}

/// Encode a string as one byte per code point, `Err` holds the first character that does not fit
pub(crate) fn encode_latin1(value: &str) -> core::result::Result<Vec<u8>, char> {
    value.chars().map(|c| u8::try_from(c).map_err(|_| c)).collect()
}

impl Metadata {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a metadata block
    ///
    /// Never fails: missing or empty data is an empty store, and data that is neither `MD2_` nor
    /// importable legacy metadata is logged and dropped.
    pub fn parse(data: Option<&[u8]>) -> Metadata {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return Metadata::new();
        };

        if !data.starts_with(MAGIC) {
            return match legacy::import(data) {
                Ok(metadata) => {
                    debug!(keys = metadata.len(), "imported legacy metadata");
                    metadata
                }
                Err(err) => {
                    warn!(%err, "discarding unreadable metadata");
                    Metadata::new()
                }
            };
        }

        let mut metadata = Metadata::new();
        let mut reader = Cursor::new(data);
        reader.set_position(MAGIC.len() as u64);

        while (reader.position() as usize) + TRAILER_LEN < data.len() {
            match read_record(&mut reader) {
                Ok((key, values)) => {
                    trace!(key = %decode_latin1(&key), values = values.len(), "record");
                    let entry = metadata.entries.entry(key).or_default();
                    entry.extend(values);
                }
                Err(err) => {
                    debug!(%err, "metadata ends with a partial record");
                    break;
                }
            }
        }

        metadata
    }

    /// Serialize to the `MD2_` format, keys and types in ascending order, followed by the reserved
    /// trailer
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        for (key, values) in &self.entries {
            write_u32(&mut out, key.len());
            out.extend_from_slice(key);
            write_u32(&mut out, values.len());
            for (kind, data) in values {
                write_u32(&mut out, *kind as usize);
                write_u32(&mut out, data.len());
                out.extend_from_slice(data);
            }
        }
        out.extend_from_slice(&[0; TRAILER_LEN]);
        out
    }

    /// Value of the given type stored under `key`
    pub fn other(&self, key: impl AsRef<[u8]>, kind: u32) -> Option<&[u8]> {
        self.entries
            .get(key.as_ref())?
            .get(&kind)
            .map(Vec::as_slice)
    }

    /// Binary value stored under `key`
    pub fn binary(&self, key: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.other(key, TYPE_BINARY)
    }

    /// String value stored under `key`, every byte taken as one code point
    pub fn string(&self, key: impl AsRef<[u8]>) -> Option<String> {
        self.other(key, TYPE_STRING).map(decode_latin1)
    }

    /// Store a value of any type, replacing the previous one
    pub fn set_other(&mut self, key: impl Into<Vec<u8>>, kind: u32, value: impl Into<Vec<u8>>) {
        self.entries
            .entry(key.into())
            .or_default()
            .insert(kind, value.into());
    }

    /// Store a binary value, replacing the previous one
    pub fn set_binary(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.set_other(key, TYPE_BINARY, value);
    }

    /// Store a string value, replacing the previous one
    ///
    /// Fails with [`Error::UnencodableCharacter`] if a character is above U+00FF.
    pub fn set_string(&mut self, key: impl Into<Vec<u8>>, value: &str) -> Result<()> {
        let key = key.into();
        let encoded = encode_latin1(value).map_err(|character| Error::UnencodableCharacter {
            key: decode_latin1(&key),
            character,
        })?;
        self.set_other(key, TYPE_STRING, encoded);
        Ok(())
    }

    /// Remove every value stored under `key`
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> Option<BTreeMap<u32, Vec<u8>>> {
        self.entries.remove(key.as_ref())
    }

    /// Keys in ascending byte order
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(Vec::as_slice)
    }

    /// Every `(key, type, value)` in serialization order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u32, &[u8])> {
        self.entries.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |(kind, data)| (key.as_slice(), *kind, data.as_slice()))
        })
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn write_u32(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(&(value as u32).to_be_bytes());
}
