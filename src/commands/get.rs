use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::{DataType, KeyValueStore},
    resp::RespValue,
};

/// Represents the parsed arguments for the GET command
pub struct GetArguments {
    /// The key name to retrieve from the store
    key: Bytes,
}

impl GetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("get"));
        };

        Ok(Self { key: key.clone() })
    }
}

/// Handles the GET command.
///
/// Replies with the stored string as a bulk string, or a null bulk string when
/// the key is absent or expired. Expired keys are evicted by the lookup.
///
/// # Errors
///
/// * `CommandError::WrongType` - If the key holds a stream
pub async fn get(
    store: &Mutex<KeyValueStore>,
    arguments: &GetArguments,
) -> Result<CommandResult, CommandError> {
    let mut store_guard = store.lock().await;

    let response = match store_guard.get(&arguments.key) {
        Some(value) => match &value.data {
            DataType::String(data) => RespValue::BulkString(data.clone()),
            DataType::Stream(_) => return Err(CommandError::WrongType),
        },
        None => RespValue::NullBulkString,
    };

    Ok(CommandResult::Response(response))
}
