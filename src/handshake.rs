//! Replica side of the replication handshake.
//!
//! The replica must see the following replies from its primary, in order:
//! - `PONG` to `PING`
//! - `OK` to `REPLCONF listening-port <port>`
//! - `OK` to `REPLCONF capa psync2`
//! - `FULLRESYNC <replid> <offset>` to `PSYNC ? -1`, followed by a snapshot
//!
//! The snapshot is read and discarded. Bytes that follow it stay buffered in
//! the returned [`Connection`] and are the start of the command stream.

use regex::Regex;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::{
    connection::{Connection, ConnectionError},
    resp::RespValue,
};

/// Replication id and offset announced in the `FULLRESYNC` reply.
#[derive(Debug, Clone, PartialEq)]
pub struct FullResync {
    pub replid: String,
    pub offset: u64,
}

pub async fn handshake<R, W>(
    connection: &mut Connection<R>,
    writer: &mut W,
    listening_port: u16,
) -> Result<FullResync, ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let response =
        send_and_handle_handshake_command(connection, writer, RespValue::command(["PING"])).await?;
    expect_simple_string(response, "PONG")?;

    let response = send_and_handle_handshake_command(
        connection,
        writer,
        RespValue::command([
            "REPLCONF".to_string(),
            "listening-port".to_string(),
            listening_port.to_string(),
        ]),
    )
    .await?;
    expect_simple_string(response, "OK")?;

    let response = send_and_handle_handshake_command(
        connection,
        writer,
        RespValue::command(["REPLCONF", "capa", "psync2"]),
    )
    .await?;
    expect_simple_string(response, "OK")?;

    let response = send_and_handle_handshake_command(
        connection,
        writer,
        RespValue::command(["PSYNC", "?", "-1"]),
    )
    .await?;
    let full_resync = parse_fullresync(response)?;

    let snapshot = connection.read_raw_payload().await?;
    info!(
        replid = %full_resync.replid,
        offset = full_resync.offset,
        snapshot_bytes = snapshot.len(),
        "handshake with primary complete"
    );

    Ok(full_resync)
}

async fn send_and_handle_handshake_command<R, W>(
    connection: &mut Connection<R>,
    writer: &mut W,
    command: RespValue,
) -> Result<RespValue, ConnectionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    debug!(?command, "sending handshake command");

    writer.write_all(&command.encode()).await?;
    writer.flush().await?;

    match connection.read_frame().await? {
        Some(frame) => Ok(frame.value),
        None => Err(ConnectionError::ConnectionClosed),
    }
}

fn expect_simple_string(response: RespValue, expected: &str) -> Result<(), ConnectionError> {
    match response {
        RespValue::SimpleString(s) if s.eq_ignore_ascii_case(expected) => Ok(()),
        other => Err(ConnectionError::InvalidResponseFromPrimary(format!(
            "expected {}, got {:?}",
            expected, other
        ))),
    }
}

fn parse_fullresync(response: RespValue) -> Result<FullResync, ConnectionError> {
    let invalid = |line: &str| ConnectionError::InvalidResponseFromPrimary(line.to_string());

    let line = match response {
        RespValue::SimpleString(line) => line,
        other => return Err(invalid(&format!("{:?}", other))),
    };

    let parts: Vec<&str> = line.split_whitespace().collect();

    let [keyword, replid, offset] = parts[..] else {
        return Err(invalid(&line));
    };

    if keyword != "FULLRESYNC" || !is_valid_repl_id(replid) {
        return Err(invalid(&line));
    }

    let offset = offset.parse::<u64>().map_err(|_| invalid(&line))?;

    Ok(FullResync {
        replid: replid.to_string(),
        offset,
    })
}

fn is_valid_repl_id(repl_id: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9]{40}$")
        .map(|re| re.is_match(repl_id))
        .unwrap_or(false)
}
