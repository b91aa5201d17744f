use std::io;

use thiserror::Error;

/// Errors raised while decoding.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The underlying reader failed or ran out of bytes.
    #[error("io error while reading: {0}")]
    Io(#[from] io::Error),
    /// A stack named a kind the local registry does not know.
    #[error("unknown item kind {hashed:#018x}")]
    UnknownKind {
        /// The hashed key that was read.
        hashed: u64,
    },
    /// A value did not fit the type it is read into.
    #[error("{0} is too large")]
    TooLarge(&'static str),
    /// A boolean byte was neither 0 nor 1.
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),
    /// A delta started with a tag no variant uses.
    #[error("unknown delta tag {0}")]
    UnknownTag(u8),
    /// A delta referenced a slot the replica does not have.
    #[error("delta index {index} out of range for {len} slots")]
    IndexOutOfRange {
        /// The index carried by the delta.
        index: usize,
        /// Slots the replica had.
        len: usize,
    },
}

/// Errors raised while encoding.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The underlying writer failed.
    #[error("io error while writing: {0}")]
    Io(#[from] io::Error),
    /// A length or index does not fit its wire type.
    #[error("{what} of {value} does not fit the wire format")]
    TooLarge {
        /// What was being written.
        what: &'static str,
        /// The offending value.
        value: usize,
    },
}
