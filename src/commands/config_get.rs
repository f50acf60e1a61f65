use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::CommandResult},
    config::ServerConfig,
    resp::RespValue,
};

pub struct ConfigGetArguments {
    pub parameters: Vec<String>,
}

impl ConfigGetArguments {
    /// Parameter names are lower-cased.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments("config|get"));
        }

        let parameters = arguments
            .iter()
            .map(|argument| String::from_utf8_lossy(argument).to_lowercase())
            .collect();

        Ok(Self { parameters })
    }
}

/// Replies `[name1, value1, name2, value2, ...]`. Unknown parameters get an
/// empty value.
pub fn config_get(
    config: &ServerConfig,
    arguments: &ConfigGetArguments,
) -> Result<CommandResult, CommandError> {
    let mut response = Vec::with_capacity(arguments.parameters.len() * 2);

    for parameter in &arguments.parameters {
        response.push(RespValue::bulk_string(parameter.clone()));
        response.push(RespValue::bulk_string(config.get_parameter(parameter)));
    }

    Ok(CommandResult::Response(RespValue::Array(response)))
}
