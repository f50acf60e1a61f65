use bytes::Bytes;
use thiserror::Error;

use crate::{resp::RespValue, stream::StreamError};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("invalid command, expected an array of bulk strings")]
    InvalidCommand,
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(&'static str),
    #[error("syntax error")]
    SyntaxError,
    #[error("value is not an integer or out of range")]
    InvalidInteger,
    #[error("invalid expire time in '{0}' command")]
    InvalidExpireTime(&'static str),
    #[error("timeout is not an integer or out of range")]
    InvalidTimeout,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Unbalanced '{0}' list of streams: for each stream key an ID or '$' must be specified.")]
    UnbalancedStreams(&'static str),
    #[error("{0}")]
    Stream(#[from] StreamError),
    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error("'{0}' is not allowed on a replica")]
    NotAllowedOnReplica(&'static str),
}

impl CommandError {
    pub fn as_resp(&self) -> RespValue {
        let prefix = match self {
            CommandError::WrongType => "WRONGTYPE",
            CommandError::ReadOnlyReplica => "READONLY",
            _ => "ERR",
        };

        RespValue::Error(format!("{} {}", prefix, self))
    }

    pub fn as_bytes(&self) -> Bytes {
        self.as_resp().encode()
    }
}
