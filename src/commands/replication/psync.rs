//! PSYNC command implementation.
//!
//! Only full resynchronisation is supported: whatever replication id and
//! offset the replica offers, it receives the whole key space.

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        command_utils::parse_argument,
    },
    replication::Replication,
};

/// Represents the parsed arguments for the PSYNC command.
pub struct PsyncArguments {
    /// The replication id the replica last followed (`?` on first sync)
    pub replication_id: Bytes,
    /// The replica's offset (`-1` on first sync)
    pub offset: i64,
}

impl PsyncArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [replication_id, offset] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("psync"));
        };

        Ok(Self {
            replication_id: replication_id.clone(),
            offset: parse_argument::<i64>(offset, CommandError::InvalidInteger)?,
        })
    }
}

/// Handles the PSYNC command.
///
/// The `FULLRESYNC` reply, the snapshot and the replica registration are
/// written by the connection, which owns the socket, once this returns
/// `CommandResult::FullResync`.
///
/// # Errors
///
/// * `CommandError::NotAllowedOnReplica` - If this server is itself a replica
pub async fn psync(
    replication: &Mutex<Replication>,
    _arguments: &PsyncArguments,
) -> Result<CommandResult, CommandError> {
    if !replication.lock().await.is_primary() {
        return Err(CommandError::NotAllowedOnReplica("psync"));
    }

    Ok(CommandResult::FullResync)
}
