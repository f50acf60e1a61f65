use bytes::Bytes;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        command_utils::argument_as_str,
    },
    resp::RespValue,
};

pub struct EchoArguments {
    message: String,
}

impl EchoArguments {
    /// Joins every argument with a single space. Arguments must be UTF-8.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("echo"));
        }

        let message = arguments
            .iter()
            .map(argument_as_str)
            .collect::<Result<Vec<_>, _>>()?
            .join(" ");

        Ok(Self { message })
    }
}

/// Handles the ECHO command.
///
/// Replies with a simple string, so the message must not contain CR or LF.
pub fn echo(arguments: &EchoArguments) -> Result<CommandResult, CommandError> {
    if arguments.message.contains(['\r', '\n']) {
        return Err(CommandError::SyntaxError);
    }

    Ok(CommandResult::Response(RespValue::simple_string(
        arguments.message.clone(),
    )))
}
