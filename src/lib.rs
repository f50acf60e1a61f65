//! A Redis-compatible key-value server with primary/replica replication.
//!
//! The server speaks RESP over TCP and supports:
//!
//! - Strings with optional expiry (GET, SET, KEYS, TYPE)
//! - Append-only streams (XADD, XRANGE, XREAD with BLOCK)
//! - Server commands (PING, ECHO, INFO, CONFIG GET)
//! - Replication: handshake, write propagation, offsets and WAIT
//!
//! Each client connection runs in its own task against shared state guarded
//! by async mutexes.

pub mod commands;
pub mod config;
pub mod connection;
pub mod handshake;
pub mod key_value_store;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
pub mod state;
pub mod stream;
