use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::CommandResult,
        command_utils::{argument_as_keyword, parse_argument},
        stream_utils::{get_stream, stream_id_argument},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    stream::{entries_to_resp, StreamId},
};

/// Represents the parsed arguments for the XRANGE command.
///
/// Format: `XRANGE key start end [COUNT n]`
#[derive(Debug)]
pub struct XrangeArguments {
    pub key: Bytes,
    /// Inclusive lower bound, `-` is the smallest id
    pub start: StreamId,
    /// Inclusive upper bound, `+` is the largest id
    pub end: StreamId,
    pub count: Option<usize>,
}

impl XrangeArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let (key, start, end, count) = match arguments {
            [key, start, end] => (key, start, end, None),
            [key, start, end, option, count] => {
                if argument_as_keyword(option) != "COUNT" {
                    return Err(CommandError::SyntaxError);
                }

                let count = parse_argument::<usize>(count, CommandError::InvalidInteger)?;
                (key, start, end, Some(count))
            }
            [_, _, _, _] => return Err(CommandError::SyntaxError),
            _ => return Err(CommandError::WrongNumberOfArguments("xrange")),
        };

        Ok(Self {
            key: key.clone(),
            start: StreamId::parse_range_start(stream_id_argument(start)?)?,
            end: StreamId::parse_range_end(stream_id_argument(end)?)?,
            count,
        })
    }
}

/// Replies with the entries whose ids fall in `[start, end]`, in insertion
/// order. An absent key replies with an empty array.
pub async fn xrange(
    store: &Mutex<KeyValueStore>,
    arguments: &XrangeArguments,
) -> Result<CommandResult, CommandError> {
    let mut store_guard = store.lock().await;

    let Some(stream) = get_stream(&mut store_guard, &arguments.key)? else {
        return Ok(CommandResult::Response(RespValue::Array(Vec::new())));
    };

    let mut entries = stream.range(arguments.start, arguments.end);

    if let Some(count) = arguments.count {
        entries = &entries[..count.min(entries.len())];
    }

    Ok(CommandResult::Response(entries_to_resp(entries)))
}
