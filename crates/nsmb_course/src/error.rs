//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`nsmb_u8::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    ArchiveError(#[from] nsmb_u8::error::Error),

    /// Transparent wrapper for [`nsmb_lz::error::Error`]
    #[error(transparent)]
    #[diagnostic(transparent)]
    CompressionError(#[from] nsmb_lz::error::Error),

    /// course data is shorter than its block table
    #[error("course data is {0} bytes, shorter than its block table")]
    TruncatedCourse(usize),

    /// block {block} points outside of the course data
    #[error("block {block} points outside of the course data ({offset:#x}+{length:#x} > {len:#x})")]
    BlockOutOfRange {
        /// Index of the block in the block table
        block: usize,
        /// Offset of the block
        offset: u32,
        /// Length of the block
        length: u32,
        /// Length of the course data
        len: usize,
    },

    /// object layer index out of range
    #[error("object layer {0} does not exist, layers are numbered 0 to 2")]
    InvalidLayer(usize),

    /// character cannot be stored as a single byte
    #[error("{character:?} in {key:?} cannot be stored as a single byte")]
    UnencodableCharacter {
        /// Metadata key being written
        key: String,
        /// First character above U+00FF
        character: char,
    },

    /// legacy metadata could not be imported
    #[error("legacy metadata could not be imported: {0}")]
    InvalidLegacyMetadata(String),

    /// zone refers to a record that does not exist
    #[error("zone {zone} refers to {kind} {id}, which does not exist")]
    UnresolvedReference {
        /// Id of the zone holding the reference
        zone: u8,
        /// Kind of record referred to
        kind: &'static str,
        /// Id that could not be found
        id: u8,
    },

    /// level archive has no course folder
    #[error("level archive has no course folder")]
    #[diagnostic(help("level archives keep their areas in course/course1.bin, course/course2.bin, ..."))]
    MissingCourseFolder,

    /// level archive contains no areas
    #[error("level archive contains no areas")]
    NoAreas,

    /// level archive is too large to compress
    #[error("level archive is {0} bytes, too large to compress")]
    TooLargeToCompress(usize),

    /// failure while handling a file of the level archive
    #[error("{name}: {source}")]
    InFile {
        /// Path of the file inside the level archive
        name: String,
        /// Underlying failure
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the name of the archive file being handled
    pub fn in_file(self, name: impl Into<String>) -> Self {
        Error::InFile {
            name: name.into(),
            source: Box::new(self),
        }
    }
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
