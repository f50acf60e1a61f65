use std::time::Duration;

use bytes::Bytes;
use tokio::{
    sync::{mpsc, Mutex},
    time::{timeout, Instant},
};

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::CommandResult,
        command_utils::{argument_as_keyword, parse_argument},
        stream_utils::{get_stream, stream_id_argument},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    state::{State, Subscriber},
    stream::{entries_to_resp, StreamId},
};

/// Interval at which a blocked XREAD re-checks its streams even without a
/// wakeup.
pub const XREAD_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where an XREAD starts reading a stream (exclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XreadStart {
    /// `$`: only entries appended after the call began
    Latest,
    After(StreamId),
}

/// Represents the parsed arguments for the XREAD command.
///
/// Format: `XREAD [BLOCK milliseconds] STREAMS key [key ...] id [id ...]`
#[derive(Debug)]
pub struct XreadArguments {
    /// Blocking duration in milliseconds. `None` for a non-blocking read,
    /// `Some(0)` to block until data arrives.
    pub block_ms: Option<u64>,
    /// (stream key, start) pairs in argument order
    pub streams: Vec<(Bytes, XreadStart)>,
}

impl XreadArguments {
    /// Parses command arguments into structured XreadArguments.
    ///
    /// Handles both blocking and non-blocking variants of the XREAD command:
    /// - `XREAD STREAMS key1 key2 id1 id2` (non-blocking)
    /// - `XREAD BLOCK milliseconds STREAMS key1 key2 id1 id2` (blocking)
    ///
    /// An id without a sequence part starts after `<ms>-0`.
    ///
    /// # Errors
    ///
    /// * `CommandError::WrongNumberOfArguments` - If no stream is given
    /// * `CommandError::SyntaxError` - If an unknown option appears or `STREAMS` is missing
    /// * `CommandError::InvalidTimeout` - If the block duration is not a non-negative integer
    /// * `CommandError::UnbalancedStreams` - If keys and ids differ in number
    /// * `CommandError::Stream(StreamError::InvalidStreamId)` - If an id is malformed
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let mut block_ms = None;
        let mut cursor = 0;

        loop {
            let Some(option) = arguments.get(cursor) else {
                return Err(CommandError::WrongNumberOfArguments("xread"));
            };

            match argument_as_keyword(option).as_str() {
                "BLOCK" => {
                    let duration = arguments
                        .get(cursor + 1)
                        .ok_or(CommandError::SyntaxError)?;

                    block_ms = Some(parse_argument::<u64>(duration, CommandError::InvalidTimeout)?);
                    cursor += 2;
                }
                "STREAMS" => {
                    cursor += 1;
                    break;
                }
                _ => return Err(CommandError::SyntaxError),
            }
        }

        let rest = &arguments[cursor..];

        if rest.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("xread"));
        }

        if rest.len() % 2 != 0 {
            return Err(CommandError::UnbalancedStreams("xread"));
        }

        let (keys, ids) = rest.split_at(rest.len() / 2);
        let mut streams = Vec::with_capacity(keys.len());

        for (key, id) in keys.iter().zip(ids) {
            let start = match stream_id_argument(id)? {
                "$" => XreadStart::Latest,
                id => XreadStart::After(StreamId::parse_range_start(id)?),
            };

            streams.push((key.clone(), start));
        }

        Ok(Self { block_ms, streams })
    }
}

/// Handles the XREAD command.
///
/// Replies with `[[key, entries], ...]` for the streams that have entries
/// after their start id, or a null bulk string when none do.
///
/// With `BLOCK` the call registers a wakeup for each stream, then re-reads
/// every time `XADD` signals one of them (or every poll interval) until data
/// arrives or the deadline passes. `BLOCK 0` has no deadline. Registration
/// happens before the first read so an append racing with the call is never
/// missed.
///
/// # Errors
///
/// * `CommandError::WrongType` - If one of the keys holds a string
pub async fn xread(
    client_address: &str,
    store: &Mutex<KeyValueStore>,
    state: &Mutex<State>,
    arguments: &XreadArguments,
) -> Result<CommandResult, CommandError> {
    let streams = resolve_start_ids(store, &arguments.streams).await?;

    let Some(block_ms) = arguments.block_ms else {
        let response = read_streams(store, &streams).await?;
        return Ok(CommandResult::Response(
            response.unwrap_or(RespValue::NullBulkString),
        ));
    };

    let deadline = (block_ms > 0).then(|| Instant::now() + Duration::from_millis(block_ms));
    let (sender, mut receiver) = mpsc::channel(1);

    {
        let mut state_guard = state.lock().await;

        for (key, _) in &streams {
            state_guard.add_subscriber(
                key.clone(),
                Subscriber {
                    client_address: client_address.to_string(),
                    sender: sender.clone(),
                },
            );
        }
    }

    let result = wait_for_entries(store, &streams, deadline, &mut receiver).await;

    {
        let mut state_guard = state.lock().await;

        for (key, _) in &streams {
            state_guard.remove_subscriber(key, client_address);
        }
    }

    result.map(|response| {
        CommandResult::Response(response.unwrap_or(RespValue::NullBulkString))
    })
}

/// Replaces `$` with the current last id of each stream (`0-0` when the
/// stream does not exist yet).
async fn resolve_start_ids(
    store: &Mutex<KeyValueStore>,
    streams: &[(Bytes, XreadStart)],
) -> Result<Vec<(Bytes, StreamId)>, CommandError> {
    let mut store_guard = store.lock().await;
    let mut resolved = Vec::with_capacity(streams.len());

    for (key, start) in streams {
        let id = match start {
            XreadStart::After(id) => *id,
            XreadStart::Latest => get_stream(&mut store_guard, key)?
                .and_then(|stream| stream.last_id())
                .unwrap_or(StreamId::MIN),
        };

        resolved.push((key.clone(), id));
    }

    Ok(resolved)
}

async fn read_streams(
    store: &Mutex<KeyValueStore>,
    streams: &[(Bytes, StreamId)],
) -> Result<Option<RespValue>, CommandError> {
    let mut store_guard = store.lock().await;
    let mut response = Vec::new();

    for (key, id) in streams {
        let Some(stream) = get_stream(&mut store_guard, key)? else {
            continue;
        };

        let entries = stream.entries_after(*id);

        if !entries.is_empty() {
            response.push(RespValue::Array(vec![
                RespValue::BulkString(key.clone()),
                entries_to_resp(entries),
            ]));
        }
    }

    if response.is_empty() {
        return Ok(None);
    }

    Ok(Some(RespValue::Array(response)))
}

async fn wait_for_entries(
    store: &Mutex<KeyValueStore>,
    streams: &[(Bytes, StreamId)],
    deadline: Option<Instant>,
    receiver: &mut mpsc::Receiver<()>,
) -> Result<Option<RespValue>, CommandError> {
    loop {
        if let Some(response) = read_streams(store, streams).await? {
            return Ok(Some(response));
        }

        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();

                if now >= deadline {
                    return Ok(None);
                }

                XREAD_POLL_INTERVAL.min(deadline - now)
            }
            None => XREAD_POLL_INTERVAL,
        };

        let _ = timeout(wait, receiver.recv()).await;
    }
}
