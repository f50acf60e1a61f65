//! Snapshot (RDB) file support.
//!
//! Only string values are understood. A snapshot is parsed once at startup
//! and encoded whenever a replica performs a full resynchronisation.

mod encoding;
mod get_slice;
mod opcode;
mod rdb_file_operations;
mod rdb_parser;

use thiserror::Error;

pub use rdb_file_operations::{encode_snapshot, load_snapshot_file};
pub use rdb_parser::{RdbParser, SnapshotEntry};

#[derive(Error, Debug)]
pub enum RdbError {
    #[error("invalid magic string")]
    InvalidMagicString,
    #[error("invalid snapshot version {0:?}")]
    InvalidVersion(String),
    #[error("unexpected end of snapshot data")]
    UnexpectedEof,
    #[error("unsupported length encoding {0:#04x}")]
    UnsupportedEncoding(u8),
    #[error("unsupported value type {0:#04x}")]
    UnsupportedValueType(u8),
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),
    #[error("expiry must be followed by a key value pair")]
    MissingKeyAfterExpiry,
    #[error("snapshot has no end of file marker")]
    MissingEndOfFile,
    #[error("failed to read snapshot file")]
    Io(#[from] std::io::Error),
}
