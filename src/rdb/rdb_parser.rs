use std::collections::HashMap;

use bytes::Bytes;

use crate::rdb::{
    opcode::{parse_header, parse_opcode, OpCodeResponse},
    RdbError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub key: Bytes,
    pub value: Bytes,
    /// Absolute expiry in unix milliseconds.
    pub expires_at: Option<u64>,
}

#[derive(Debug, Default)]
pub struct RdbParser {
    pub redis_version: String,
    pub metadata: HashMap<Bytes, Bytes>,
    pub db_number: Option<usize>,
    pub hash_table_size: Option<usize>,
    pub expiry_hash_table_size: Option<usize>,
    pub entries: Vec<SnapshotEntry>,
    pub checksum: Option<[u8; 8]>,
}

impl RdbParser {
    /// Parses a complete snapshot held in memory.
    pub fn parse(bytes: &[u8]) -> Result<Self, RdbError> {
        let (redis_version, mut cursor) = parse_header(bytes)?;
        let mut parser = RdbParser {
            redis_version,
            ..Default::default()
        };

        while parser.checksum.is_none() {
            if cursor >= bytes.len() {
                return Err(RdbError::MissingEndOfFile);
            }

            let (response, read) = parse_opcode(bytes, cursor)?;
            cursor += read;

            match response {
                OpCodeResponse::Metadata { key, value } => {
                    parser.metadata.insert(key, value);
                }
                OpCodeResponse::ResizeDb {
                    db_hash_table_size,
                    expiry_hash_table_size,
                } => {
                    parser.hash_table_size = Some(db_hash_table_size);
                    parser.expiry_hash_table_size = Some(expiry_hash_table_size);
                }
                OpCodeResponse::Database { database_number } => {
                    parser.db_number = Some(database_number);
                }
                OpCodeResponse::KeyValuePair {
                    key,
                    value,
                    expires_at,
                } => parser.entries.push(SnapshotEntry {
                    key,
                    value,
                    expires_at,
                }),
                OpCodeResponse::EndOfFile { checksum } => {
                    parser.checksum = Some(checksum);
                }
            }
        }

        Ok(parser)
    }
}
