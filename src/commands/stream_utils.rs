use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_utils::argument_as_str},
    key_value_store::{DataType, KeyValueStore},
    stream::{Stream, StreamError},
};

/// Looks up the stream stored under `key`.
///
/// Absent and expired keys give `Ok(None)`; a key holding any other type is a
/// `WrongType` error.
pub fn get_stream<'a>(
    store: &'a mut KeyValueStore,
    key: &[u8],
) -> Result<Option<&'a Stream>, CommandError> {
    match store.get(key) {
        Some(value) => match &value.data {
            DataType::Stream(stream) => Ok(Some(stream)),
            _ => Err(CommandError::WrongType),
        },
        None => Ok(None),
    }
}

/// Stream id arguments must be ASCII; anything else is an invalid id.
pub fn stream_id_argument(argument: &Bytes) -> Result<&str, CommandError> {
    argument_as_str(argument).map_err(|_| CommandError::Stream(StreamError::InvalidStreamId))
}
