//! Base types for structure of U8 file.

use binrw::{BinRead, BinWrite};

/// Size of the fixed file header, which is also where the node table starts
pub const HEADER_SIZE: u32 = 0x20;

/// Size of a single entry in the node table
pub const NODE_SIZE: u32 = 12;

/// U8 file header
///
/// Defines the header of the U8 file which always starts with `0x55AA382D`.
/// All data is stored in big endian format
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
#[brw(magic = b"\x55\xAA\x38\x2D", big)]
pub struct U8Header {
    /// The offset from the beginning of the file where the root node starts
    pub root_offset: u32,

    /// The combined size of the node table and the string table
    pub header_size: u32,

    /// The offset from the beginning of the file where file data starts
    #[brw(pad_after = 16)]
    pub data_offset: u32,
}

impl Default for U8Header {
    fn default() -> Self {
        Self {
            root_offset: HEADER_SIZE,
            header_size: Default::default(),
            data_offset: Default::default(),
        }
    }
}

/// Identifies whether a node is a file or a directory
#[derive(BinRead, BinWrite, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[brw(repr = u8)]
pub enum NodeKind {
    /// A file, whose node points at its data
    #[default]
    File = 0,

    /// A directory, whose node points at its parent and its last descendant
    Directory = 1,
}

/// U8 node table entry
///
/// The meaning of `data_offset` and `size` depends on [`NodeKind`]:
///
/// | kind      | `data_offset`                   | `size`                                   |
/// |-----------|---------------------------------|------------------------------------------|
/// | file      | offset of the data in the file  | length of the data                       |
/// | directory | index of the parent directory   | index one past the last descendant node  |
#[derive(BinRead, BinWrite, Debug, Default, Copy, Clone, PartialEq)]
#[brw(big)]
pub struct U8Node {
    /// Whether this is a file or a directory
    pub kind: NodeKind,

    /// The offset from the start of the string table for this node's name
    #[br(parse_with = binrw::helpers::read_u24)]
    #[bw(write_with = binrw::helpers::write_u24)]
    pub name_offset: u32,

    /// Data offset for files, parent index for directories
    pub data_offset: u32,

    /// Data length for files, end index for directories
    pub size: u32,
}
