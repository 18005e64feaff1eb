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

    /// buffer is not a valid u8 archive
    #[error("buffer is not a valid u8 archive")]
    InvalidArchive,

    /// node {index} points outside of the archive
    #[error("node {index} points outside of the archive ({start:#x}..{end:#x} > {len:#x})")]
    NodeOutOfRange {
        /// Index of the offending node in the node table
        index: usize,
        /// First byte referenced by the node
        start: u64,
        /// One past the last byte referenced by the node
        end: u64,
        /// Length of the archive buffer
        len: u64,
    },

    /// unable to find requested file
    #[error("unable to find requested file")]
    FileNotFound(#[from] FileNotFoundError),

    /// path {0} is empty or malformed
    #[error("path {0:?} is empty or malformed")]
    InvalidPath(String),

    /// {0} is a file and cannot contain other entries
    #[error("{0} is a file and cannot contain other entries")]
    NotADirectory(String),
}

/// Error type to provide further information when a file has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested file")]
pub enum FileNotFoundError {
    /// by name {0}
    #[error("by name {0}")]
    Name(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
