use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::CommandResult,
        command_utils::{argument_as_keyword, ok_response, parse_argument},
    },
    key_value_store::{current_unix_time_ms, KeyValueStore},
};

/// Represents the parsed arguments for the SET command
#[derive(Debug, PartialEq)]
pub struct SetArguments {
    /// The key name to store the value under
    pub key: Bytes,
    /// The value to be stored under the given key
    pub value: Bytes,
    /// Time to live in milliseconds
    pub expiration_ms: Option<u64>,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// Accepted forms:
    ///   - `[key, value]` - permanent storage
    ///   - `[key, value, "PX", milliseconds]` - expires after the given milliseconds
    ///   - `[key, value, "EX", seconds]` - expires after the given seconds
    ///
    /// The option name is case-insensitive.
    ///
    /// # Errors
    ///
    /// * `CommandError::WrongNumberOfArguments` - If the number of arguments is not 2 or 4
    /// * `CommandError::SyntaxError` - If the option is neither `PX` nor `EX`
    /// * `CommandError::InvalidInteger` - If the expiration is not a positive integer
    /// * `CommandError::InvalidExpireTime` - If `EX` overflows when converted to milliseconds
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let (key, value, expiration_ms) = match arguments {
            [key, value] => (key, value, None),
            [key, value, option, amount] => {
                let amount = parse_argument::<u64>(amount, CommandError::InvalidInteger)?;

                let expiration_ms = match argument_as_keyword(option).as_str() {
                    "PX" => amount,
                    "EX" => amount
                        .checked_mul(1000)
                        .ok_or(CommandError::InvalidExpireTime("set"))?,
                    _ => return Err(CommandError::SyntaxError),
                };

                (key, value, Some(expiration_ms))
            }
            _ => return Err(CommandError::WrongNumberOfArguments("set")),
        };

        Ok(Self {
            key: key.clone(),
            value: value.clone(),
            expiration_ms,
        })
    }
}

/// Handles the SET command.
///
/// Stores a string under the key, replacing any previous value of any type.
/// With an expiration the absolute deadline is computed from the current
/// wall-clock time. Replies `+OK`.
pub async fn set(
    store: &Mutex<KeyValueStore>,
    arguments: &SetArguments,
) -> Result<CommandResult, CommandError> {
    let expires_at = arguments
        .expiration_ms
        .map(|expiration_ms| current_unix_time_ms().saturating_add(expiration_ms));

    let mut store_guard = store.lock().await;
    store_guard.set_string(arguments.key.clone(), arguments.value.clone(), expires_at);

    Ok(CommandResult::Response(ok_response()))
}
