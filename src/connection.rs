use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::{
    commands::{CommandHandler, CommandResult},
    replication::{shared_writer, write_to_shared},
    resp::{RespError, RespValue},
    server::ServerContext,
};

const READ_BUFFER_CAPACITY: usize = 4096;

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),
    #[error("connection closed in the middle of a frame")]
    ConnectionClosed,
    #[error("unexpected response from primary: {0}")]
    InvalidResponseFromPrimary(String),
}

/// A decoded value together with the exact bytes it was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub value: RespValue,
    pub raw: Bytes,
}

/// Buffered reader that yields one RESP frame at a time, however the bytes
/// were split across socket reads.
pub struct Connection<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> Connection<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
        }
    }

    /// Returns the next frame, or `None` when the peer closed the connection
    /// between frames.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            match RespValue::decode(&mut self.buffer) {
                Ok((value, raw)) => return Ok(Some(Frame { value, raw })),
                Err(RespError::Incomplete) => {}
                Err(e) => return Err(e.into()),
            }

            if self.fill_buffer().await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }

                return Err(ConnectionError::ConnectionClosed);
            }
        }
    }

    /// Reads a `$<n>\r\n<n bytes>` payload that has no trailing CRLF.
    pub async fn read_raw_payload(&mut self) -> Result<Bytes, ConnectionError> {
        loop {
            match RespValue::decode_raw_payload(&mut self.buffer) {
                Ok(payload) => return Ok(payload),
                Err(RespError::Incomplete) => {}
                Err(e) => return Err(e.into()),
            }

            if self.fill_buffer().await? == 0 {
                return Err(ConnectionError::ConnectionClosed);
            }
        }
    }

    async fn fill_buffer(&mut self) -> Result<usize, ConnectionError> {
        Ok(self.reader.read_buf(&mut self.buffer).await?)
    }
}

async fn write_to_stream<W>(writer: &mut W, response: &[u8]) -> tokio::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response).await?;
    writer.flush().await?;

    Ok(())
}

/// Serves one client until it disconnects.
///
/// Requests are answered in order. Unknown commands get no reply; command
/// errors are answered with an error reply and the connection stays open.
/// A malformed frame is answered with an error and closes the connection.
/// When the client turns into a replica through PSYNC the same socket keeps
/// receiving its `REPLCONF ACK`s here, and the replica is unregistered when
/// the loop ends.
pub async fn handle_client_connection<S>(stream: S, client_address: String, context: ServerContext)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let writer = shared_writer(writer);
    let mut connection = Connection::new(reader);

    loop {
        let frame = match connection.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(ConnectionError::Protocol(e)) => {
                let reply = RespValue::Error(format!("ERR Protocol error: {}", e)).encode();
                let _ = write_to_shared(&writer, &reply).await;
                warn!(client = %client_address, error = %e, "closing connection after protocol error");
                break;
            }
            Err(e) => {
                warn!(client = %client_address, error = %e, "failed to read from client");
                break;
            }
        };

        let response = match CommandHandler::new(frame.value, frame.raw) {
            Ok(Some(command_handler)) => {
                match command_handler
                    .handle_client_command(&context, &client_address)
                    .await
                {
                    Ok(CommandResult::NoResponse) => None,
                    Ok(CommandResult::Response(response)) => Some(response.encode()),
                    Ok(CommandResult::FullResync) => {
                        let mut replication_guard = context.replication.lock().await;

                        if let Err(e) = replication_guard
                            .attach_replica(client_address.clone(), writer.clone(), &context.store)
                            .await
                        {
                            warn!(client = %client_address, error = %e, "full resync failed");
                            break;
                        }

                        None
                    }
                    Err(e) => Some(e.as_bytes()),
                }
            }
            Ok(None) => None,
            Err(e) => Some(e.as_bytes()),
        };

        if let Some(response) = response {
            if let Err(e) = write_to_shared(&writer, &response).await {
                warn!(client = %client_address, error = %e, "failed to write to client");
                break;
            }
        }
    }

    context.replication.lock().await.remove_replica(&client_address);
    debug!(client = %client_address, "connection closed");
}

/// Applies the command stream a replica receives from its primary.
///
/// Every frame advances the replica offset by its raw length once it has been
/// dispatched, whether or not it was understood. Only `REPLCONF GETACK`
/// writes back to the primary.
pub async fn handle_primary_connection<R, W>(
    mut connection: Connection<R>,
    mut writer: W,
    primary_address: String,
    context: ServerContext,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = match connection.read_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!(primary = %primary_address, "primary closed the replication link");
                break;
            }
            Err(e) => {
                warn!(primary = %primary_address, error = %e, "replication link failed");
                break;
            }
        };

        let consumed = frame.raw.len() as u64;

        match CommandHandler::new(frame.value, frame.raw) {
            Ok(Some(command_handler)) => {
                match command_handler
                    .handle_primary_command(&context, &primary_address)
                    .await
                {
                    Ok(CommandResult::Response(response)) => {
                        if let Err(e) = write_to_stream(&mut writer, &response.encode()).await {
                            warn!(primary = %primary_address, error = %e, "failed to answer primary");
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(primary = %primary_address, command = %command_handler.name, error = %e, "replicated command failed");
                    }
                }
            }
            Ok(None) => {}
            Err(e) => warn!(primary = %primary_address, error = %e, "invalid command from primary"),
        }

        context.replication.lock().await.offset += consumed;
    }
}
