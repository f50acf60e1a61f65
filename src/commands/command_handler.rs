use bytes::Bytes;
use tracing::debug;

use crate::{
    commands::{
        command_error::CommandError,
        command_utils::argument_as_keyword,
        config_get::{config_get, ConfigGetArguments},
        echo::{echo, EchoArguments},
        get::{get, GetArguments},
        info::{info, InfoArguments},
        keys::{keys, KeysArguments},
        ping::{ping, PingArguments},
        replication::{psync, replconf, wait, PsyncArguments, ReplconfArguments, WaitArguments},
        set::{set, SetArguments},
        type_command::{type_command, TypeArguments},
        xadd::{xadd, XaddArguments},
        xrange::{xrange, XrangeArguments},
        xread::{xread, XreadArguments},
    },
    resp::RespValue,
    server::ServerContext,
};

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    NoResponse,
    Response(RespValue),
    /// PSYNC accepted: the connection must send the snapshot and register
    /// itself as a replica.
    FullResync,
}

/// A request decoded into a command name and validated, typed arguments.
pub enum Command {
    Ping(PingArguments),
    Echo(EchoArguments),
    Set(SetArguments),
    Get(GetArguments),
    Info(InfoArguments),
    ConfigGet(ConfigGetArguments),
    Keys(KeysArguments),
    Type(TypeArguments),
    Xadd(XaddArguments),
    Xrange(XrangeArguments),
    Xread(XreadArguments),
    Replconf(ReplconfArguments),
    Psync(PsyncArguments),
    Wait(WaitArguments),
}

impl Command {
    /// Parses the arguments of the command called `name` (upper case).
    /// Returns `Ok(None)` for commands this server does not know.
    pub fn parse(name: &str, arguments: &[Bytes]) -> Result<Option<Self>, CommandError> {
        let command = match name {
            "PING" => Command::Ping(PingArguments::parse(arguments)?),
            "ECHO" => Command::Echo(EchoArguments::parse(arguments)?),
            "SET" => Command::Set(SetArguments::parse(arguments)?),
            "GET" => Command::Get(GetArguments::parse(arguments)?),
            "INFO" => Command::Info(InfoArguments::parse(arguments)?),
            "CONFIG GET" => Command::ConfigGet(ConfigGetArguments::parse(arguments)?),
            "KEYS" => Command::Keys(KeysArguments::parse(arguments)?),
            "TYPE" => Command::Type(TypeArguments::parse(arguments)?),
            "XADD" => Command::Xadd(XaddArguments::parse(arguments)?),
            "XRANGE" => Command::Xrange(XrangeArguments::parse(arguments)?),
            "XREAD" => Command::Xread(XreadArguments::parse(arguments)?),
            "REPLCONF" => Command::Replconf(ReplconfArguments::parse(arguments)?),
            "PSYNC" => Command::Psync(PsyncArguments::parse(arguments)?),
            "WAIT" => Command::Wait(WaitArguments::parse(arguments)?),
            _ => return Ok(None),
        };

        Ok(Some(command))
    }

    /// Commands that modify the key space and are propagated to replicas.
    pub fn is_write(&self) -> bool {
        matches!(self, Command::Set(_) | Command::Xadd(_))
    }
}

pub struct CommandHandler {
    pub name: String,
    pub command: Command,
    /// The request exactly as it arrived on the wire.
    pub input: Bytes,
}

impl CommandHandler {
    /// Builds a handler from a decoded request and its raw bytes.
    ///
    /// Returns `Ok(None)` for unknown commands, which callers ignore.
    ///
    /// # Errors
    ///
    /// * `CommandError::InvalidCommand` - If the request is not a non-empty array of bulk strings
    /// * Any argument error of the named command
    pub fn new(value: RespValue, input: Bytes) -> Result<Option<Self>, CommandError> {
        let RespValue::Array(elements) = value else {
            return Err(CommandError::InvalidCommand);
        };

        let mut parts = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(part) => parts.push(part),
                _ => return Err(CommandError::InvalidCommand),
            }
        }

        let Some(first) = parts.first() else {
            return Err(CommandError::InvalidCommand);
        };

        let mut name = argument_as_keyword(first);
        let mut arguments = &parts[1..];

        if name == "CONFIG" {
            let Some(sub_command) = arguments.first() else {
                return Err(CommandError::WrongNumberOfArguments("config"));
            };

            if argument_as_keyword(sub_command) != "GET" {
                return Err(CommandError::SyntaxError);
            }

            name = "CONFIG GET".to_string();
            arguments = &arguments[1..];
        }

        let Some(command) = Command::parse(&name, arguments)? else {
            debug!(command = %name, "ignoring unknown command");
            return Ok(None);
        };

        Ok(Some(Self {
            name,
            command,
            input,
        }))
    }

    /// Executes a command received from an ordinary client.
    ///
    /// Write commands run while holding the replication lock: the key space
    /// is mutated, the raw request is sent to every replica and the primary
    /// offset advances, with no other write interleaving. Replicas refuse
    /// writes from clients.
    pub async fn handle_client_command(
        &self,
        context: &ServerContext,
        client_address: &str,
    ) -> Result<CommandResult, CommandError> {
        if !self.command.is_write() {
            return self.execute(context, client_address).await;
        }

        let mut replication_guard = context.replication.lock().await;

        if !replication_guard.is_primary() {
            return Err(CommandError::ReadOnlyReplica);
        }

        let result = self.execute(context, client_address).await?;
        replication_guard.propagate(&self.input).await;

        Ok(result)
    }

    /// Executes a command received on a replica's link to its primary.
    ///
    /// Writes are applied. Only `REPLCONF GETACK` produces a reply; every
    /// other result is discarded so the replica never talks back otherwise.
    pub async fn handle_primary_command(
        &self,
        context: &ServerContext,
        primary_address: &str,
    ) -> Result<CommandResult, CommandError> {
        let result = self.execute(context, primary_address).await?;

        match (&self.command, result) {
            (Command::Replconf(ReplconfArguments::GetAck), response) => Ok(response),
            _ => Ok(CommandResult::NoResponse),
        }
    }

    async fn execute(
        &self,
        context: &ServerContext,
        client_address: &str,
    ) -> Result<CommandResult, CommandError> {
        match &self.command {
            Command::Ping(arguments) => ping(arguments),
            Command::Echo(arguments) => echo(arguments),
            Command::Set(arguments) => set(&context.store, arguments).await,
            Command::Get(arguments) => get(&context.store, arguments).await,
            Command::Info(arguments) => info(&context.replication, arguments).await,
            Command::ConfigGet(arguments) => config_get(&context.config, arguments),
            Command::Keys(arguments) => keys(&context.store, arguments).await,
            Command::Type(arguments) => type_command(&context.store, arguments).await,
            Command::Xadd(arguments) => xadd(&context.store, &context.state, arguments).await,
            Command::Xrange(arguments) => xrange(&context.store, arguments).await,
            Command::Xread(arguments) => {
                xread(client_address, &context.store, &context.state, arguments).await
            }
            Command::Replconf(arguments) => {
                replconf(client_address, &context.replication, arguments).await
            }
            Command::Psync(arguments) => psync(&context.replication, arguments).await,
            Command::Wait(arguments) => wait(&context.replication, arguments).await,
        }
    }
}
