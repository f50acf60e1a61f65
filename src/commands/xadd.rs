use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        stream_utils::stream_id_argument,
    },
    key_value_store::{current_unix_time_ms, DataType, KeyValueStore, Value},
    resp::RespValue,
    state::State,
    stream::{Stream, StreamIdRequest},
};

/// Represents the parsed arguments for the XADD command.
///
/// Format: `XADD key id field value [field value ...]`
#[derive(Debug)]
pub struct XaddArguments {
    /// The stream key
    pub key: Bytes,
    /// Requested entry id: explicit, `<ms>-*` or `*`
    pub id: StreamIdRequest,
    /// Field/value pairs in the order given
    pub fields: Vec<(Bytes, Bytes)>,
}

impl XaddArguments {
    /// Parses `key id field value [field value ...]`.
    ///
    /// # Errors
    ///
    /// * `CommandError::WrongNumberOfArguments` - If there is no field/value pair
    ///   or a field has no value
    /// * `CommandError::Stream(StreamError::InvalidStreamId)` - If the id is malformed
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [key, id, pairs @ ..] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("xadd"));
        };

        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(CommandError::WrongNumberOfArguments("xadd"));
        }

        let id = stream_id_argument(id)?.parse::<StreamIdRequest>()?;

        let fields = pairs
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();

        Ok(Self {
            key: key.clone(),
            id,
            fields,
        })
    }
}

/// Handles the XADD command.
///
/// Appends an entry to the stream, creating the stream if the key is absent
/// (or expired), and replies with the realised id as a bulk string. A rejected
/// id leaves the key space untouched. Readers blocked on the stream are woken.
///
/// # Errors
///
/// * `CommandError::Stream` - If the id is not greater than `0-0` or than the stream's last id
/// * `CommandError::WrongType` - If the key holds a string
pub async fn xadd(
    store: &Mutex<KeyValueStore>,
    state: &Mutex<State>,
    arguments: &XaddArguments,
) -> Result<CommandResult, CommandError> {
    let mut store_guard = store.lock().await;
    let now = current_unix_time_ms();

    let id = match store_guard.get_mut(&arguments.key) {
        Some(Value {
            data: DataType::Stream(stream),
            ..
        }) => stream.append(arguments.id, arguments.fields.clone(), now)?,
        Some(_) => return Err(CommandError::WrongType),
        None => {
            let mut stream = Stream::new();
            let id = stream.append(arguments.id, arguments.fields.clone(), now)?;

            store_guard.set(
                arguments.key.clone(),
                Value::new(DataType::Stream(stream), None),
            );

            id
        }
    };

    state.lock().await.notify_subscribers(&arguments.key);

    Ok(CommandResult::Response(RespValue::bulk_string(
        id.to_string(),
    )))
}
