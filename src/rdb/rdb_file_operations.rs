use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::info;

use crate::rdb::{
    encoding::{encode_length, encode_string},
    opcode::{
        DATABASE_OPCODE, END_OF_FILE_OPCODE, EXPIRATION_MILLISECONDS_OPCODE, MAGIC_STRING,
        METADATA_OPCODE, RESIZE_DB_OPCODE, STRING_VALUE_TYPE,
    },
    RdbError, RdbParser, SnapshotEntry,
};

const SNAPSHOT_VERSION: &[u8] = b"0011";
const REDIS_VERSION: &[u8] = b"7.2.0";

/// Reads and parses the snapshot at `path`. A missing file yields no entries.
pub async fn load_snapshot_file(path: &Path) -> Result<Vec<SnapshotEntry>, RdbError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot file, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let parser = RdbParser::parse(&bytes)?;
    info!(
        path = %path.display(),
        version = %parser.redis_version,
        keys = parser.entries.len(),
        "loaded snapshot"
    );

    Ok(parser.entries)
}

/// Encodes string entries (key, value, absolute expiry in ms) as a snapshot.
/// The checksum is written as zeros, which readers treat as "not computed".
pub fn encode_snapshot(entries: &[(Bytes, Bytes, Option<u64>)]) -> Bytes {
    let mut buffer = BytesMut::new();

    buffer.put_slice(MAGIC_STRING);
    buffer.put_slice(SNAPSHOT_VERSION);

    buffer.put_u8(METADATA_OPCODE);
    encode_string(b"redis-ver", &mut buffer);
    encode_string(REDIS_VERSION, &mut buffer);

    if !entries.is_empty() {
        let expiring = entries
            .iter()
            .filter(|(_, _, expires_at)| expires_at.is_some())
            .count();

        buffer.put_u8(DATABASE_OPCODE);
        buffer.put_u8(0);
        buffer.put_u8(RESIZE_DB_OPCODE);
        encode_length(entries.len(), &mut buffer);
        encode_length(expiring, &mut buffer);

        for (key, value, expires_at) in entries {
            if let Some(expires_at) = expires_at {
                buffer.put_u8(EXPIRATION_MILLISECONDS_OPCODE);
                buffer.put_u64_le(*expires_at);
            }

            buffer.put_u8(STRING_VALUE_TYPE);
            encode_string(key, &mut buffer);
            encode_string(value, &mut buffer);
        }
    }

    buffer.put_u8(END_OF_FILE_OPCODE);
    buffer.put_u64(0);

    buffer.freeze()
}
