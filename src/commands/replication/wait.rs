use std::time::Duration;

use bytes::Bytes;
use tokio::{
    sync::Mutex,
    time::{sleep, Instant},
};

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        command_utils::parse_argument,
    },
    replication::Replication,
    resp::RespValue,
};

pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct WaitArguments {
    pub number_of_replicas: usize,
    /// `None` waits until enough replicas have acknowledged.
    pub timeout: Option<Duration>,
}

impl WaitArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let [number_of_replicas, timeout] = arguments else {
            return Err(CommandError::WrongNumberOfArguments("wait"));
        };

        let number_of_replicas =
            parse_argument::<usize>(number_of_replicas, CommandError::InvalidInteger)?;

        let timeout = match parse_argument::<u64>(timeout, CommandError::InvalidTimeout)? {
            0 => None,
            timeout_ms => Some(Duration::from_millis(timeout_ms)),
        };

        Ok(Self {
            number_of_replicas,
            timeout,
        })
    }
}

/// Handles the WAIT command.
///
/// Asks every replica for its offset with `REPLCONF GETACK *`, then polls the
/// number of replicas whose acknowledged offset has reached the primary
/// offset. Stops once that number reaches the smaller of the requested count
/// and the number of attached replicas, or when the timeout expires, and
/// replies with the number reached. A timeout of 0 never expires.
///
/// The replication lock is released while sleeping so `REPLCONF ACK` from the
/// replicas can be recorded.
///
/// # Errors
///
/// * `CommandError::NotAllowedOnReplica` - If this server is a replica
pub async fn wait(
    replication: &Mutex<Replication>,
    arguments: &WaitArguments,
) -> Result<CommandResult, CommandError> {
    let deadline = arguments.timeout.map(|timeout| Instant::now() + timeout);

    {
        let mut replication_guard = replication.lock().await;

        if !replication_guard.is_primary() {
            return Err(CommandError::NotAllowedOnReplica("wait"));
        }

        replication_guard.broadcast_getack().await;
    }

    loop {
        let (synced, target) = {
            let replication_guard = replication.lock().await;

            (
                replication_guard.synced_replica_count(),
                arguments
                    .number_of_replicas
                    .min(replication_guard.replica_count()),
            )
        };

        if synced >= target {
            return Ok(CommandResult::Response(RespValue::Integer(synced as i64)));
        }

        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();

                if now >= deadline {
                    return Ok(CommandResult::Response(RespValue::Integer(synced as i64)));
                }

                WAIT_POLL_INTERVAL.min(deadline - now)
            }
            None => WAIT_POLL_INTERVAL,
        };

        sleep(pause).await;
    }
}
