use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::Mutex,
    task::JoinHandle,
};
use tracing::{info, warn};

use crate::{
    config::{PrimaryAddress, ServerConfig},
    connection::{handle_client_connection, handle_primary_connection, Connection},
    handshake::handshake,
    key_value_store::KeyValueStore,
    rdb::load_snapshot_file,
    replication::{Replication, Role},
    state::State,
};

/// Everything a connection handler needs, cloned into each connection task.
#[derive(Clone)]
pub struct ServerContext {
    pub config: Arc<ServerConfig>,
    pub store: Arc<Mutex<KeyValueStore>>,
    pub state: Arc<Mutex<State>>,
    pub replication: Arc<Mutex<Replication>>,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> Self {
        let role = match &config.replicaof {
            Some(primary) => Role::Replica {
                host: primary.host.clone(),
                port: primary.port,
            },
            None => Role::Primary,
        };

        Self::with_replication(config, Replication::new(role))
    }

    pub fn with_replication(config: ServerConfig, replication: Replication) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(KeyValueStore::new())),
            state: Arc::new(Mutex::new(State::new())),
            replication: Arc::new(Mutex::new(replication)),
        }
    }
}

pub struct RedisServer {
    context: ServerContext,
}

impl RedisServer {
    /// Builds the server state and loads the snapshot file, if configured.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let context = ServerContext::new(config);

        if let Some(path) = context.config.snapshot_path() {
            let entries = load_snapshot_file(&path)
                .await
                .with_context(|| format!("failed to load snapshot {}", path.display()))?;

            let mut store_guard = context.store.lock().await;

            for entry in entries {
                store_guard.set_string(entry.key, entry.value, entry.expires_at);
            }
        }

        Ok(Self { context })
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let address = SocketAddr::from(([127, 0, 0, 1], self.context.config.port));
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("failed to bind {}", address))?;

        self.serve(listener).await
    }

    /// Accepts clients on `listener` forever. A replica first completes the
    /// handshake with its primary and starts applying its command stream.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let local_address = listener.local_addr()?;
        info!(address = %local_address, "listening");

        if let Some(primary) = self.context.config.replicaof.clone() {
            connect_to_primary(self.context.clone(), &primary, local_address.port()).await?;
        }

        loop {
            match listener.accept().await {
                Ok((stream, client_address)) => {
                    info!(client = %client_address, "accepted connection");

                    tokio::spawn(handle_client_connection(
                        stream,
                        client_address.to_string(),
                        self.context.clone(),
                    ));
                }
                Err(e) => warn!(error = %e, "failed to accept connection"),
            }
        }
    }
}

/// Performs the replication handshake and spawns the task that applies the
/// primary's command stream.
pub async fn connect_to_primary(
    context: ServerContext,
    primary: &PrimaryAddress,
    listening_port: u16,
) -> anyhow::Result<JoinHandle<()>> {
    let stream = TcpStream::connect((primary.host.as_str(), primary.port))
        .await
        .with_context(|| format!("failed to connect to primary {}", primary))?;

    let (reader, mut writer) = stream.into_split();
    let mut connection = Connection::new(reader);

    handshake(&mut connection, &mut writer, listening_port)
        .await
        .with_context(|| format!("replication handshake with {} failed", primary))?;

    Ok(tokio::spawn(handle_primary_connection(
        connection,
        writer,
        primary.to_string(),
        context,
    )))
}
