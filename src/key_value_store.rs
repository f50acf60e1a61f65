use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;

use crate::stream::Stream;

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(Bytes),
    Stream(Stream),
}

impl DataType {
    /// Name reported by the TYPE command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    /// Absolute expiry as milliseconds since the unix epoch.
    pub expires_at: Option<u64>,
}

impl Value {
    pub fn new(data: DataType, expires_at: Option<u64>) -> Self {
        Self { data, expires_at }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now_ms)
    }
}

pub fn current_unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

/// Keyspace with lazy expiry: an expired key is removed the first time a
/// lookup notices it, there is no background sweeper.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<Bytes, Value>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the live value for `key`, evicting it first if it has expired.
    pub fn get(&mut self, key: &[u8]) -> Option<&Value> {
        self.get_mut(key).map(|value| &*value)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Value> {
        let now = current_unix_time_ms();

        if self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(now))
        {
            self.entries.remove(key);
            return None;
        }

        self.entries.get_mut(key)
    }

    /// Replaces whatever is stored under `key`, clearing any previous expiry.
    pub fn set(&mut self, key: Bytes, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn set_string(&mut self, key: Bytes, value: Bytes, expires_at: Option<u64>) {
        self.set(key, Value::new(DataType::String(value), expires_at));
    }

    pub fn delete(&mut self, key: &[u8]) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Live keys. Expired entries are skipped but left for lazy eviction.
    pub fn keys(&self) -> Vec<Bytes> {
        let now = current_unix_time_ms();

        self.entries
            .iter()
            .filter(|(_, value)| !value.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Live string entries, used to build snapshots.
    pub fn string_entries(&self) -> Vec<(Bytes, Bytes, Option<u64>)> {
        let now = current_unix_time_ms();

        self.entries
            .iter()
            .filter(|(_, value)| !value.is_expired(now))
            .filter_map(|(key, value)| match &value.data {
                DataType::String(data) => Some((key.clone(), data.clone(), value.expires_at)),
                DataType::Stream(_) => None,
            })
            .collect()
    }
}
