use std::str::FromStr;

use bytes::Bytes;

use crate::{commands::CommandError, resp::RespValue};

pub fn argument_as_str(argument: &Bytes) -> Result<&str, CommandError> {
    std::str::from_utf8(argument).map_err(|_| CommandError::SyntaxError)
}

/// Upper-cased copy of an option or sub-command name.
pub fn argument_as_keyword(argument: &Bytes) -> String {
    String::from_utf8_lossy(argument).to_uppercase()
}

pub fn parse_argument<T: FromStr>(argument: &Bytes, error: CommandError) -> Result<T, CommandError> {
    argument_as_str(argument)?.parse::<T>().map_err(|_| error)
}

pub fn ok_response() -> RespValue {
    RespValue::simple_string("OK")
}
