//! Replication bookkeeping shared by every connection of a server.
//!
//! On a primary this tracks the attached replicas, their acknowledged offsets
//! and the primary's write offset. On a replica only `offset` moves, counting
//! the bytes consumed from the primary link.

use std::{collections::HashMap, fmt, sync::Arc};

use bytes::Bytes;
use rand::{distributions::Alphanumeric, Rng};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tracing::{info, warn};

use crate::{key_value_store::KeyValueStore, rdb::encode_snapshot, resp::RespValue};

pub const REPLICATION_ID_LENGTH: usize = 40;

/// Write half of a connection that may be written to from several tasks.
pub type SharedWriter = Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

pub fn shared_writer<W>(writer: W) -> SharedWriter
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    Arc::new(Mutex::new(Box::new(writer)))
}

pub async fn write_to_shared(writer: &SharedWriter, bytes: &[u8]) -> tokio::io::Result<()> {
    let mut writer_guard = writer.lock().await;
    writer_guard.write_all(bytes).await?;
    writer_guard.flush().await?;

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    Primary,
    Replica { host: String, port: u16 },
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "master"),
            Role::Replica { .. } => write!(f, "slave"),
        }
    }
}

pub struct ReplicaHandle {
    pub address: String,
    pub writer: SharedWriter,
    pub acknowledged_offset: u64,
}

pub struct Replication {
    pub role: Role,
    pub replid: String,
    pub offset: u64,
    replicas: HashMap<String, ReplicaHandle>,
}

impl fmt::Debug for Replication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replication")
            .field("role", &self.role)
            .field("replid", &self.replid)
            .field("offset", &self.offset)
            .field("replicas", &self.replicas.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub fn generate_replication_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REPLICATION_ID_LENGTH)
        .map(char::from)
        .collect()
}

impl Replication {
    pub fn new(role: Role) -> Self {
        Self::with_replid(role, generate_replication_id())
    }

    pub fn with_replid(role: Role, replid: String) -> Self {
        Self {
            role,
            replid,
            offset: 0,
            replicas: HashMap::new(),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.role == Role::Primary
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    pub fn replica_addresses(&self) -> Vec<String> {
        self.replicas.keys().cloned().collect()
    }

    pub fn acknowledged_offset(&self, address: &str) -> Option<u64> {
        self.replicas
            .get(address)
            .map(|replica| replica.acknowledged_offset)
    }

    /// Number of replicas that have acknowledged everything written so far.
    pub fn synced_replica_count(&self) -> usize {
        self.replicas
            .values()
            .filter(|replica| replica.acknowledged_offset >= self.offset)
            .count()
    }

    pub fn add_replica(&mut self, address: String, writer: SharedWriter) {
        info!(replica = %address, "replica attached");

        self.replicas.insert(
            address.clone(),
            ReplicaHandle {
                address,
                writer,
                acknowledged_offset: 0,
            },
        );
    }

    pub fn remove_replica(&mut self, address: &str) -> bool {
        let removed = self.replicas.remove(address).is_some();

        if removed {
            info!(replica = %address, "replica detached");
        }

        removed
    }

    /// Records a `REPLCONF ACK`. Returns false when `address` is not a replica.
    pub fn record_ack(&mut self, address: &str, offset: u64) -> bool {
        match self.replicas.get_mut(address) {
            Some(replica) => {
                replica.acknowledged_offset = offset;
                true
            }
            None => false,
        }
    }

    /// Sends `raw` to every replica, dropping the ones whose socket fails, and
    /// advances the primary offset by its length.
    pub async fn propagate(&mut self, raw: &Bytes) {
        self.send_to_replicas(raw).await;
        self.offset += raw.len() as u64;
    }

    /// Sends `REPLCONF GETACK *` to every replica. The primary offset is not
    /// advanced.
    pub async fn broadcast_getack(&mut self) {
        let getack = RespValue::command(["REPLCONF", "GETACK", "*"]).encode();
        self.send_to_replicas(&getack).await;
    }

    async fn send_to_replicas(&mut self, bytes: &[u8]) {
        let mut failed = Vec::new();

        for replica in self.replicas.values() {
            if let Err(e) = write_to_shared(&replica.writer, bytes).await {
                warn!(replica = %replica.address, error = %e, "propagation failed");
                failed.push(replica.address.clone());
            }
        }

        for address in failed {
            self.remove_replica(&address);
        }
    }

    /// Completes a `PSYNC` from `address`: writes the `FULLRESYNC` line and a
    /// snapshot of the key space, then registers the connection as a replica.
    ///
    /// Callers hold the replication lock for the whole call so no write can be
    /// propagated between the snapshot and the registration.
    pub async fn attach_replica(
        &mut self,
        address: String,
        writer: SharedWriter,
        store: &Mutex<KeyValueStore>,
    ) -> tokio::io::Result<()> {
        let snapshot = {
            let store_guard = store.lock().await;
            encode_snapshot(&store_guard.string_entries())
        };

        let mut response = RespValue::SimpleString(format!(
            "FULLRESYNC {} {}",
            self.replid, self.offset
        ))
        .encode()
        .to_vec();
        response.extend_from_slice(&RespValue::RawPayload(snapshot).encode());

        write_to_shared(&writer, &response).await?;
        self.add_replica(address, writer);

        Ok(())
    }
}
