use bytes::Bytes;

use crate::rdb::{
    encoding::{parse_length, parse_string},
    get_slice::{get_array, get_buffer_slice, get_byte},
    RdbError,
};

pub const MAGIC_STRING: &[u8] = b"REDIS";
pub const METADATA_OPCODE: u8 = 0xFA;
pub const RESIZE_DB_OPCODE: u8 = 0xFB;
pub const DATABASE_OPCODE: u8 = 0xFE;
pub const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
pub const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
pub const END_OF_FILE_OPCODE: u8 = 0xFF;
pub const STRING_VALUE_TYPE: u8 = 0x00;
const LAST_VALUE_TYPE: u8 = 0x0E;

pub enum OpCodeResponse {
    Metadata {
        key: Bytes,
        value: Bytes,
    },
    ResizeDb {
        db_hash_table_size: usize,
        expiry_hash_table_size: usize,
    },
    Database {
        database_number: usize,
    },
    KeyValuePair {
        key: Bytes,
        value: Bytes,
        expires_at: Option<u64>,
    },
    EndOfFile {
        checksum: [u8; 8],
    },
}

pub fn parse_opcode(bytes: &[u8], cursor: usize) -> Result<(OpCodeResponse, usize), RdbError> {
    let opcode = get_byte(bytes, cursor)?;
    let mut temp_cursor = cursor + 1;

    let response = match opcode {
        METADATA_OPCODE => {
            let (key, key_read) = parse_string(bytes, temp_cursor)?;
            temp_cursor += key_read;
            let (value, value_read) = parse_string(bytes, temp_cursor)?;
            temp_cursor += value_read;

            OpCodeResponse::Metadata { key, value }
        }
        RESIZE_DB_OPCODE => {
            let (db_hash_table_size, read) = parse_length(bytes, temp_cursor)?;
            temp_cursor += read;
            let (expiry_hash_table_size, read) = parse_length(bytes, temp_cursor)?;
            temp_cursor += read;

            OpCodeResponse::ResizeDb {
                db_hash_table_size,
                expiry_hash_table_size,
            }
        }
        DATABASE_OPCODE => {
            let (database_number, read) = parse_length(bytes, temp_cursor)?;
            temp_cursor += read;

            OpCodeResponse::Database { database_number }
        }
        EXPIRATION_SECONDS_OPCODE | EXPIRATION_MILLISECONDS_OPCODE => {
            let expires_at = if opcode == EXPIRATION_SECONDS_OPCODE {
                let seconds = u32::from_le_bytes(get_array::<4>(bytes, temp_cursor)?);
                temp_cursor += 4;
                seconds as u64 * 1000
            } else {
                let milliseconds = u64::from_le_bytes(get_array::<8>(bytes, temp_cursor)?);
                temp_cursor += 8;
                milliseconds
            };

            let value_type = get_byte(bytes, temp_cursor)?;
            if value_type > LAST_VALUE_TYPE {
                return Err(RdbError::MissingKeyAfterExpiry);
            }

            let (key_value_pair, read) = parse_opcode(bytes, temp_cursor)?;
            temp_cursor += read;

            match key_value_pair {
                OpCodeResponse::KeyValuePair { key, value, .. } => OpCodeResponse::KeyValuePair {
                    key,
                    value,
                    expires_at: Some(expires_at),
                },
                _ => return Err(RdbError::MissingKeyAfterExpiry),
            }
        }
        END_OF_FILE_OPCODE => {
            let checksum = get_array::<8>(bytes, temp_cursor)?;
            temp_cursor += 8;

            OpCodeResponse::EndOfFile { checksum }
        }
        STRING_VALUE_TYPE => {
            let (key, key_read) = parse_string(bytes, temp_cursor)?;
            temp_cursor += key_read;
            let (value, value_read) = parse_string(bytes, temp_cursor)?;
            temp_cursor += value_read;

            OpCodeResponse::KeyValuePair {
                key,
                value,
                expires_at: None,
            }
        }
        value_type if value_type <= LAST_VALUE_TYPE => {
            return Err(RdbError::UnsupportedValueType(value_type));
        }
        opcode => return Err(RdbError::UnknownOpcode(opcode)),
    };

    Ok((response, temp_cursor - cursor))
}

/// Checks the `REDIS` magic string and returns the 4-digit version.
pub fn parse_header(bytes: &[u8]) -> Result<(String, usize), RdbError> {
    if get_buffer_slice(bytes, 0, MAGIC_STRING.len())? != MAGIC_STRING {
        return Err(RdbError::InvalidMagicString);
    }

    let version = get_buffer_slice(bytes, MAGIC_STRING.len(), 4)?;
    let version = String::from_utf8_lossy(version).into_owned();

    match version.parse::<u32>() {
        Ok(number) if (1..=12).contains(&number) => Ok((version, MAGIC_STRING.len() + 4)),
        _ => Err(RdbError::InvalidVersion(version)),
    }
}
