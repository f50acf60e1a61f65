use bytes::Bytes;
use redis_replica::{
    config::ServerConfig,
    key_value_store::current_unix_time_ms,
    rdb::{encode_snapshot, load_snapshot_file, RdbError, RdbParser, SnapshotEntry},
    server::RedisServer,
};

const FUTURE_EXPIRY_MS: u64 = 4_102_444_800_000;
const FUTURE_EXPIRY_SECONDS: u32 = 4_102_444_800;

fn put_string(bytes: &mut Vec<u8>, value: &[u8]) {
    bytes.push(value.len() as u8);
    bytes.extend_from_slice(value);
}

/// Snapshot with metadata, a plain key, a key expiring in milliseconds and a
/// key expiring in seconds.
fn sample_snapshot(millisecond_expiry: u64) -> Vec<u8> {
    let mut bytes = b"REDIS0011".to_vec();

    bytes.push(0xFA);
    put_string(&mut bytes, b"redis-ver");
    put_string(&mut bytes, b"7.2.0");
    bytes.push(0xFA);
    put_string(&mut bytes, b"redis-bits");
    bytes.extend_from_slice(&[0xC0, 0x40]);

    bytes.extend_from_slice(&[0xFE, 0x00, 0xFB, 0x03, 0x02]);

    bytes.push(0x00);
    put_string(&mut bytes, b"grape");
    put_string(&mut bytes, b"mango");

    bytes.push(0xFC);
    bytes.extend_from_slice(&millisecond_expiry.to_le_bytes());
    bytes.push(0x00);
    put_string(&mut bytes, b"apple");
    put_string(&mut bytes, b"pear");

    bytes.push(0xFD);
    bytes.extend_from_slice(&FUTURE_EXPIRY_SECONDS.to_le_bytes());
    bytes.push(0x00);
    put_string(&mut bytes, b"kiwi");
    bytes.extend_from_slice(&[0xC1, 0x39, 0x30]);

    bytes.push(0xFF);
    bytes.extend_from_slice(&[0x8E, 0x5E, 0x41, 0x2D, 0x17, 0x4C, 0x0B, 0x76]);

    bytes
}

fn entry(key: &'static str, value: &'static str, expires_at: Option<u64>) -> SnapshotEntry {
    SnapshotEntry {
        key: Bytes::from(key),
        value: Bytes::from(value),
        expires_at,
    }
}

#[test]
fn test_rdb_parser_with_key_value_pairs_including_expiration() {
    let parser = RdbParser::parse(&sample_snapshot(FUTURE_EXPIRY_MS)).unwrap();

    assert_eq!(parser.redis_version, "0011");
    assert_eq!(parser.metadata.len(), 2);
    assert_eq!(
        parser.metadata.get(&Bytes::from("redis-bits")),
        Some(&Bytes::from("64"))
    );
    assert_eq!(parser.db_number, Some(0));
    assert_eq!(parser.hash_table_size, Some(3));
    assert_eq!(parser.expiry_hash_table_size, Some(2));
    assert_eq!(
        parser.entries,
        vec![
            entry("grape", "mango", None),
            entry("apple", "pear", Some(FUTURE_EXPIRY_MS)),
            entry("kiwi", "12345", Some(FUTURE_EXPIRY_SECONDS as u64 * 1000)),
        ]
    );
    assert!(parser.checksum.is_some());
}

#[test]
fn test_rdb_parser_empty_snapshot() {
    let parser = RdbParser::parse(&encode_snapshot(&[])).unwrap();

    assert_eq!(
        parser.metadata.get(&Bytes::from("redis-ver")),
        Some(&Bytes::from("7.2.0"))
    );
    assert!(parser.entries.is_empty());
    assert_eq!(parser.checksum, Some([0; 8]));
}

#[test]
fn test_rdb_parser_reads_encoded_snapshot() {
    let snapshot = encode_snapshot(&[
        (Bytes::from("grape"), Bytes::from("mango"), None),
        (Bytes::from("apple"), Bytes::from("pear"), Some(FUTURE_EXPIRY_MS)),
    ]);

    let parser = RdbParser::parse(&snapshot).unwrap();

    assert_eq!(
        parser.entries,
        vec![
            entry("grape", "mango", None),
            entry("apple", "pear", Some(FUTURE_EXPIRY_MS)),
        ]
    );
}

#[test]
fn test_rdb_parser_invalid_files() {
    let mut truncated = sample_snapshot(FUTURE_EXPIRY_MS);
    truncated.truncate(truncated.len() - 9);

    let mut unknown_opcode = b"REDIS0011".to_vec();
    unknown_opcode.extend_from_slice(&[0xF0, 0xFF]);

    assert!(matches!(
        RdbParser::parse(b"RUDIS0011\xFF"),
        Err(RdbError::InvalidMagicString)
    ));
    assert!(matches!(
        RdbParser::parse(b"REDIS0099\xFF"),
        Err(RdbError::InvalidVersion(_))
    ));
    assert!(matches!(
        RdbParser::parse(&truncated),
        Err(RdbError::MissingEndOfFile)
    ));
    assert!(matches!(
        RdbParser::parse(&unknown_opcode),
        Err(RdbError::UnknownOpcode(0xF0))
    ));
}

#[tokio::test]
async fn test_load_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.rdb");
    tokio::fs::write(&path, sample_snapshot(FUTURE_EXPIRY_MS))
        .await
        .unwrap();

    let entries = load_snapshot_file(&path).await.unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0], entry("grape", "mango", None));
}

#[tokio::test]
async fn test_load_missing_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();

    let entries = load_snapshot_file(&dir.path().join("missing.rdb"))
        .await
        .unwrap();

    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_server_starts_from_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let past_expiry = current_unix_time_ms() - 1000;
    tokio::fs::write(dir.path().join("dump.rdb"), sample_snapshot(past_expiry))
        .await
        .unwrap();

    let config = ServerConfig {
        dir: Some(dir.path().to_path_buf()),
        dbfilename: Some("dump.rdb".to_string()),
        ..ServerConfig::default()
    };
    let server = RedisServer::new(config).await.unwrap();

    let mut store_guard = server.context().store.lock().await;
    let mut keys = store_guard.keys();
    keys.sort();

    assert_eq!(keys, vec![Bytes::from("grape"), Bytes::from("kiwi")]);
    assert!(store_guard.get(b"grape").is_some());
    assert!(store_guard.get(b"kiwi").is_some());
    assert!(store_guard.get(b"apple").is_none());
}

#[tokio::test]
async fn test_server_rejects_corrupt_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("dump.rdb"), b"not a snapshot")
        .await
        .unwrap();

    let config = ServerConfig {
        dir: Some(dir.path().to_path_buf()),
        dbfilename: Some("dump.rdb".to_string()),
        ..ServerConfig::default()
    };

    assert!(RedisServer::new(config).await.is_err());
}
