use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{
    commands::{
        command_error::CommandError, command_handler::CommandResult,
        command_utils::argument_as_keyword,
    },
    replication::{Replication, Role},
    resp::RespValue,
};

#[derive(Debug, PartialEq)]
enum InfoSection {
    Replication,
    Unknown,
}

pub struct InfoArguments {
    section: InfoSection,
}

impl InfoArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        let section = match arguments {
            [] => InfoSection::Replication,
            [section] => match argument_as_keyword(section).as_str() {
                "REPLICATION" | "ALL" | "DEFAULT" | "EVERYTHING" => InfoSection::Replication,
                _ => InfoSection::Unknown,
            },
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self { section })
    }
}

/// Replies with the replication section of INFO as a bulk string. Sections
/// this server does not track reply with an empty bulk string.
pub async fn info(
    replication: &Mutex<Replication>,
    arguments: &InfoArguments,
) -> Result<CommandResult, CommandError> {
    if arguments.section == InfoSection::Unknown {
        return Ok(CommandResult::Response(RespValue::bulk_string("")));
    }

    let replication_guard = replication.lock().await;
    let mut lines = vec![
        "# Replication".to_string(),
        format!("role:{}", replication_guard.role),
    ];

    match &replication_guard.role {
        Role::Primary => {
            lines.push(format!("connected_slaves:{}", replication_guard.replica_count()));
            lines.push(format!("master_replid:{}", replication_guard.replid));
            lines.push(format!("master_repl_offset:{}", replication_guard.offset));
        }
        Role::Replica { host, port } => {
            lines.push(format!("master_host:{}", host));
            lines.push(format!("master_port:{}", port));
            lines.push(format!("slave_repl_offset:{}", replication_guard.offset));
        }
    }

    Ok(CommandResult::Response(RespValue::bulk_string(lines.join("\r\n"))))
}
