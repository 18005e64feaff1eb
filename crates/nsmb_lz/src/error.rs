//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// buffer ends before the compression header does
    #[error("buffer ends before the compression header does")]
    Truncated,

    /// compression type {0:#04x} was not expected here
    #[error("compression type {0:#04x} was not expected here")]
    UnexpectedType(u8),

    /// back reference reaches before the start of the output
    #[error("back reference at {position:#x} reaches {distance:#x} bytes back")]
    #[diagnostic(help("the compressed stream is corrupt"))]
    InvalidLookback {
        /// Output position the reference was decoded at
        position: usize,
        /// Distance of the reference, counting from 1
        distance: usize,
    },

    /// huffman table walk left the table
    #[error("huffman table walk left the table at slot {0}")]
    InvalidTable(usize),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
