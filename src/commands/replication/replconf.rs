//! REPLCONF command implementation.
//!
//! REPLCONF carries the replica's side of the handshake (`listening-port`,
//! `capa`) and, once replication runs, the offset exchange: the primary sends
//! `GETACK *` and the replica answers with `ACK <offset>`.

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::CommandResult,
        command_utils::{argument_as_keyword, ok_response, parse_argument},
    },
    replication::Replication,
    resp::RespValue,
};

#[derive(Debug, PartialEq)]
pub enum ReplconfArguments {
    ListeningPort(u16),
    Capabilities(Vec<Bytes>),
    GetAck,
    Ack(u64),
    /// Any other option, acknowledged with `OK`
    Other,
}

impl ReplconfArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [option, values @ ..] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("replconf"));
        };

        if values.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("replconf"));
        }

        let arguments = match argument_as_keyword(option).as_str() {
            "LISTENING-PORT" => ReplconfArguments::ListeningPort(parse_argument::<u16>(
                &values[0],
                CommandError::InvalidInteger,
            )?),
            "CAPA" => ReplconfArguments::Capabilities(values.to_vec()),
            "GETACK" => ReplconfArguments::GetAck,
            "ACK" => ReplconfArguments::Ack(parse_argument::<u64>(
                &values[0],
                CommandError::InvalidInteger,
            )?),
            _ => ReplconfArguments::Other,
        };

        Ok(arguments)
    }
}

/// Handles the REPLCONF command.
///
/// * `GETACK` replies `REPLCONF ACK <offset>` with this server's offset.
/// * `ACK <offset>` records the offset acknowledged by the replica connected
///   as `client_address` and produces no reply.
/// * Every other option replies `OK`.
pub async fn replconf(
    client_address: &str,
    replication: &Mutex<Replication>,
    arguments: &ReplconfArguments,
) -> Result<CommandResult, CommandError> {
    match arguments {
        ReplconfArguments::GetAck => {
            let offset = replication.lock().await.offset;

            Ok(CommandResult::Response(RespValue::command([
                Bytes::from_static(b"REPLCONF"),
                Bytes::from_static(b"ACK"),
                Bytes::from(offset.to_string()),
            ])))
        }
        ReplconfArguments::Ack(offset) => {
            replication.lock().await.record_ack(client_address, *offset);

            Ok(CommandResult::NoResponse)
        }
        ReplconfArguments::ListeningPort(_)
        | ReplconfArguments::Capabilities(_)
        | ReplconfArguments::Other => Ok(CommandResult::Response(ok_response())),
    }
}
