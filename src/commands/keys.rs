use bytes::Bytes;
use globset::Glob;
use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        command_utils::argument_as_str,
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
};

pub struct KeysArguments {
    pub pattern: Option<String>,
}

impl KeysArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        match arguments {
            [] => Ok(Self { pattern: None }),
            [pattern] => Ok(Self {
                pattern: Some(argument_as_str(pattern)?.to_string()),
            }),
            _ => Err(CommandError::WrongNumberOfArguments("keys")),
        }
    }
}

/// Replies with the live keys matching the glob pattern, sorted.
pub async fn keys(
    store: &Mutex<KeyValueStore>,
    arguments: &KeysArguments,
) -> Result<CommandResult, CommandError> {
    let matcher = match arguments.pattern.as_deref() {
        None | Some("*") => None,
        Some(pattern) => Some(
            Glob::new(pattern)
                .map_err(|e| CommandError::InvalidPattern(e.to_string()))?
                .compile_matcher(),
        ),
    };

    let mut keys = {
        let store_guard = store.lock().await;
        store_guard.keys()
    };

    if let Some(matcher) = matcher {
        keys.retain(|key| matcher.is_match(&*String::from_utf8_lossy(key)));
    }

    keys.sort();

    Ok(CommandResult::Response(RespValue::Array(
        keys.into_iter().map(RespValue::BulkString).collect(),
    )))
}
