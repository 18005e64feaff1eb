//! Types for reading U8 archives
//!

use binrw::BinRead;
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};
use tracing::{debug, instrument, trace};

use crate::{
    archive::U8Archive,
    error::{Error, Result},
    types::{NodeKind, U8Header, U8Node, HEADER_SIZE, NODE_SIZE},
};

fn check_range(index: usize, start: u64, len: u64, total: u64) -> Result<()> {
    let end = start.saturating_add(len);
    if end > total {
        return Err(Error::NodeOutOfRange {
            index,
            start,
            end,
            len: total,
        });
    }
    Ok(())
}

fn read_name(strings: &[u8], offset: u32) -> String {
    let raw = strings.get(offset as usize..).unwrap_or_default();
    let end = raw.iter().position(|c| *c == b'\0').unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

impl U8Archive {
    /// Read a U8 archive from a reader, collecting every entry it contains.
    pub fn read<R: Read + Seek>(mut reader: R) -> Result<U8Archive> {
        reader.seek(SeekFrom::Start(0))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Parse a U8 archive held in memory.
    ///
    /// Fails with [`Error::InvalidArchive`] when the buffer is too short for the header or the node
    /// table or a node is neither file nor directory, and with [`Error::NodeOutOfRange`] when a
    /// file's data lies outside the buffer.
    #[instrument(skip_all, err, fields(size = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<U8Archive> {
        let total = data.len() as u64;
        if total < HEADER_SIZE as u64 {
            return Err(Error::InvalidArchive);
        }

        let mut reader = Cursor::new(data);
        let header = U8Header::read(&mut reader).map_err(|_| Error::InvalidArchive)?;
        debug!(?header, "read header");

        if header.root_offset as u64 + NODE_SIZE as u64 > total {
            return Err(Error::InvalidArchive);
        }
        // only the size of the root matters, its kind byte is not checked
        reader.seek(SeekFrom::Start(header.root_offset as u64 + 8))?;
        let count = reader.read_u32::<BigEndian>()? as u64;
        let table_size = count.saturating_mul(NODE_SIZE as u64);
        let strings_start = header.root_offset as u64 + table_size;
        let strings_end = header.root_offset as u64 + header.header_size as u64;
        if count == 0 || strings_start > total || strings_end > total || strings_end < strings_start
        {
            return Err(Error::InvalidArchive);
        }

        // a kind byte other than file or directory makes the table unreadable
        let nodes = (1..count)
            .map(|_| U8Node::read(&mut reader).map_err(|_| Error::InvalidArchive))
            .collect::<Result<Vec<_>>>()?;
        let strings = &data[strings_start as usize..strings_end as usize];

        let mut archive = U8Archive::new();
        // (directory path, index one past its last descendant)
        let mut parents: Vec<(String, u64)> = Vec::new();

        for (i, node) in nodes.iter().enumerate() {
            let index = i + 1;
            while parents
                .last()
                .is_some_and(|(_, end)| index as u64 >= *end)
            {
                parents.pop();
            }

            let name = read_name(strings, node.name_offset);
            let path = match parents.last() {
                Some((parent, _)) => format!("{parent}/{name}"),
                None => name,
            };

            match node.kind {
                NodeKind::Directory => {
                    trace!(%path, "directory");
                    archive.set(&path, None)?;
                    parents.push((path, node.size as u64));
                }
                NodeKind::File => {
                    let start = node.data_offset as u64;
                    let len = node.size as u64;
                    check_range(index, start, len, total)?;
                    trace!(%path, start, len, "file");

                    let contents = data[start as usize..(start + len) as usize].to_vec();
                    archive.set(&path, Some(contents))?;
                }
            }
        }

        Ok(archive)
    }
}
