use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct TypeArguments {
    key: Bytes,
}

impl TypeArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("type"));
        };

        Ok(Self { key: key.clone() })
    }
}

/// Replies `string`, `stream` or `none`.
pub async fn type_command(
    store: &Mutex<KeyValueStore>,
    arguments: &TypeArguments,
) -> Result<CommandResult, CommandError> {
    let mut store_guard = store.lock().await;

    let type_name = store_guard
        .get(&arguments.key)
        .map_or("none", |value| value.data.type_name());

    Ok(CommandResult::Response(RespValue::simple_string(type_name)))
}
