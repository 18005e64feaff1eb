//! Types for writing U8 archives
//!

use binrw::BinWrite;
use bon::Builder;
use byteorder::WriteBytesExt;
use indexmap::IndexMap;
use std::io::{Cursor, Seek, Write};
use tracing::{debug, instrument};

use crate::archive::{Node, U8Archive};
use crate::error::Result;
use crate::types::{NodeKind, U8Header, U8Node, HEADER_SIZE, NODE_SIZE};

/// Options for how the U8 file should be written
#[derive(Debug, Clone, Copy, Builder)]
pub struct U8WriterOptions {
    /// Alignment of the data section and of every file stored in it
    #[builder(default = 0x20)]
    pub alignment: u32,
}

impl Default for U8WriterOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

enum FlatNode<'a> {
    Directory { name: &'a str, parent: u32, end: u32 },
    File { name: &'a str, data: &'a [u8] },
}

impl FlatNode<'_> {
    fn name(&self) -> &str {
        match self {
            FlatNode::Directory { name, .. } | FlatNode::File { name, .. } => name,
        }
    }
}

fn flatten<'a>(dir: &'a IndexMap<String, Node>, parent: u32, out: &mut Vec<FlatNode<'a>>) {
    for (name, node) in dir {
        match node {
            Node::File(data) => out.push(FlatNode::File { name, data }),
            Node::Directory(children) => {
                let index = out.len();
                out.push(FlatNode::Directory {
                    name,
                    parent,
                    end: 0,
                });
                flatten(children, index as u32, out);

                let total = out.len() as u32;
                if let FlatNode::Directory { end, .. } = &mut out[index] {
                    *end = total;
                }
            }
        }
    }
}

fn align_up(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

impl U8Archive {
    /// Serialize the archive with the default [`U8WriterOptions`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self
            .write(Cursor::new(Vec::new()), U8WriterOptions::default())?
            .into_inner())
    }

    /// Serialize the archive into a writer
    ///
    /// Nodes are written depth first in insertion order, so the output is fully determined by the
    /// archive contents and the options. Returns the writer once everything has been written.
    #[instrument(skip_all, err)]
    pub fn write<W: Write + Seek>(&self, mut writer: W, options: U8WriterOptions) -> Result<W> {
        let alignment = options.alignment.max(1);

        let mut flat = vec![FlatNode::Directory {
            name: "",
            parent: 0,
            end: 0,
        }];
        flatten(&self.root, 0, &mut flat);

        let total = flat.len() as u32;
        if let FlatNode::Directory { end, .. } = &mut flat[0] {
            *end = total;
        }

        let mut strings = Vec::new();
        let mut name_offsets = Vec::with_capacity(flat.len());
        for node in &flat {
            name_offsets.push(strings.len() as u32);
            strings.extend_from_slice(node.name().as_bytes());
            strings.push(b'\0');
        }

        let header_size = total * NODE_SIZE + strings.len() as u32;
        let header = U8Header {
            root_offset: HEADER_SIZE,
            header_size,
            data_offset: align_up(HEADER_SIZE + header_size, alignment),
        };
        debug!(?header, nodes = total, "writing archive");

        let mut next_data = header.data_offset;
        let nodes: Vec<U8Node> = flat
            .iter()
            .zip(name_offsets)
            .map(|(node, name_offset)| match node {
                FlatNode::Directory { parent, end, .. } => U8Node {
                    kind: NodeKind::Directory,
                    name_offset,
                    data_offset: *parent,
                    size: *end,
                },
                FlatNode::File { data, .. } => {
                    let start = align_up(next_data, alignment);
                    next_data = start + data.len() as u32;
                    U8Node {
                        kind: NodeKind::File,
                        name_offset,
                        data_offset: start,
                        size: data.len() as u32,
                    }
                }
            })
            .collect();

        header.write(&mut writer)?;
        for node in &nodes {
            node.write(&mut writer)?;
        }
        writer.write_all(&strings)?;

        let mut position = HEADER_SIZE + header_size;
        for (node, flat) in nodes.iter().zip(&flat) {
            if let FlatNode::File { data, .. } = flat {
                for _ in position..node.data_offset {
                    writer.write_u8(0)?;
                }
                writer.write_all(data)?;
                position = node.data_offset + node.size;
            }
        }

        Ok(writer)
    }
}
