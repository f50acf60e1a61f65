use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    resp::RespValue,
};

pub struct PingArguments {
    message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        match arguments {
            [] => Ok(Self { message: None }),
            [message] => Ok(Self {
                message: Some(message.clone()),
            }),
            _ => Err(CommandError::WrongNumberOfArguments("ping")),
        }
    }
}

pub fn ping(arguments: &PingArguments) -> Result<CommandResult, CommandError> {
    let response = match &arguments.message {
        Some(message) => RespValue::BulkString(message.clone()),
        None => RespValue::simple_string("PONG"),
    };

    Ok(CommandResult::Response(response))
}
