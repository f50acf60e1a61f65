mod command_error;
mod command_handler;
mod command_utils;
mod config_get;
mod echo;
mod get;
mod info;
mod keys;
mod ping;
mod replication;
mod set;
mod stream_utils;
mod type_command;
mod xadd;
mod xrange;
mod xread;

pub use command_error::CommandError;
pub use command_handler::{Command, CommandHandler, CommandResult};
pub use replication::WAIT_POLL_INTERVAL;
pub use xread::XREAD_POLL_INTERVAL;
