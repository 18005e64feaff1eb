//! This library handles reading from and creating **U8** archives used by *New Super Mario Bros. Wii*.
//!
//! # U8 Archive Format Documentation
//!
//! Levels, tilesets and most other game assets are shipped inside U8 archives, usually with the
//! `.arc` extension. A U8 archive stores a tree of named directories and files in one contiguous
//! buffer.
//!
//! ## File Structure
//!
//! A U8 file consists of a header, a node table, a string table and finally the data of every file.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: 0x55AA382D                                        |
//! | 0x0004         | Root Node Offset       | 4 bytes: Offset to the first node, always 0x20             |
//! | 0x0008         | Header Size            | 4 bytes: Size of the node table plus the string table      |
//! | 0x000C         | Data Offset            | 4 bytes: Offset to the start of the file data              |
//! | 0x0010         | Reserved               | 16 bytes: Zero                                             |
//!
//! ### Node Table
//!
//! Every entry, including the unnamed root directory, has a 12 byte node. Nodes are stored depth
//! first so the children of a directory directly follow it.
//!
//! | Offset (bytes) | Field                  | Description                                             |
//! |----------------|------------------------|---------------------------------------------------------|
//! | 0x0000         | Type                   | 1 byte: `0` for files, `1` for directories              |
//! | 0x0001         | Name Offset            | 3 bytes: Offset of the name within the string table     |
//! | 0x0004         | Data Offset / Parent   | 4 bytes: File data offset, or parent directory index    |
//! | 0x0008         | Size / End             | 4 bytes: File size, or index past the last descendant   |
//!
//! The root node's size is the total number of nodes, which also tells where the string table starts.
//!
//! ### String Table
//!
//! Names are stored as NUL terminated strings directly after the node table. The root node's name is
//! the empty string at offset 0.
//!
//! ## Additional Information
//!
//! - **File Extension**: `.arc`
//! - **Endianness**: Big-endian for all multi-byte integers
//! - **Alignment**: File data is aligned to 0x20 bytes when written by this crate
//!

pub mod archive;
pub mod error;
pub mod read;
pub mod types;
pub mod write;

pub use archive::{Node, U8Archive};
pub use write::U8WriterOptions;
