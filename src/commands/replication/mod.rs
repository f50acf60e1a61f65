mod psync;
mod replconf;
mod wait;

pub use psync::{psync, PsyncArguments};
pub use replconf::{replconf, ReplconfArguments};
pub use wait::{wait, WaitArguments, WAIT_POLL_INTERVAL};
