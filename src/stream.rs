//! Append-only streams.
//!
//! Entries are kept in a `Vec` sorted by [`StreamId`]. Ordering is only ever
//! enforced in [`Stream::append`], every reader relies on it.

use std::{fmt, str::FromStr};

use bytes::Bytes;
use thiserror::Error;

use crate::resp::RespValue;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("The ID specified in XADD must be greater than 0-0")]
    IdNotGreaterThanZero,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    IdNotGreaterThanTop,
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidStreamId,
}

/// A `<ms_time>-<seq_no>` stream entry id, ordered by `ms_time` then `seq_no`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub ms_time: u64,
    pub seq_no: u64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId::new(0, 0);
    pub const MAX: StreamId = StreamId::new(u64::MAX, u64::MAX);

    pub const fn new(ms_time: u64, seq_no: u64) -> Self {
        Self { ms_time, seq_no }
    }

    /// Parses a range start: `-`, `<ms>` (sequence 0) or `<ms>-<seq>`.
    pub fn parse_range_start(input: &str) -> Result<Self, StreamError> {
        if input == "-" {
            return Ok(StreamId::MIN);
        }

        Self::parse_with_default_sequence(input, 0)
    }

    /// Parses a range end: `+`, `<ms>` (maximum sequence) or `<ms>-<seq>`.
    pub fn parse_range_end(input: &str) -> Result<Self, StreamError> {
        if input == "+" {
            return Ok(StreamId::MAX);
        }

        Self::parse_with_default_sequence(input, u64::MAX)
    }

    fn parse_with_default_sequence(input: &str, default_seq_no: u64) -> Result<Self, StreamError> {
        match input.split_once('-') {
            Some(_) => input.parse(),
            None => {
                let ms_time = input
                    .parse::<u64>()
                    .map_err(|_| StreamError::InvalidStreamId)?;

                Ok(StreamId::new(ms_time, default_seq_no))
            }
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms_time, self.seq_no)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some((ms_time, seq_no)) = input.split_once('-') else {
            return Err(StreamError::InvalidStreamId);
        };

        let ms_time = ms_time
            .parse::<u64>()
            .map_err(|_| StreamError::InvalidStreamId)?;
        let seq_no = seq_no
            .parse::<u64>()
            .map_err(|_| StreamError::InvalidStreamId)?;

        Ok(StreamId::new(ms_time, seq_no))
    }
}

/// The id argument of XADD before it is resolved against the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StreamIdRequest {
    /// `*`
    Auto,
    /// `<ms>-*`
    AutoSequence(u64),
    /// `<ms>-<seq>`
    Explicit(StreamId),
}

impl FromStr for StreamIdRequest {
    type Err = StreamError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input == "*" {
            return Ok(StreamIdRequest::Auto);
        }

        match input.split_once('-') {
            Some((ms_time, "*")) => ms_time
                .parse::<u64>()
                .map(StreamIdRequest::AutoSequence)
                .map_err(|_| StreamError::InvalidStreamId),
            Some(_) => input.parse().map(StreamIdRequest::Explicit),
            None => input
                .parse::<u64>()
                .map(|ms_time| StreamIdRequest::Explicit(StreamId::new(ms_time, 0)))
                .map_err(|_| StreamError::InvalidStreamId),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl StreamEntry {
    /// `[id, [field, value, ...]]`
    pub fn to_resp(&self) -> RespValue {
        let mut flattened = Vec::with_capacity(self.fields.len() * 2);

        for (field, value) in &self.fields {
            flattened.push(RespValue::BulkString(field.clone()));
            flattened.push(RespValue::BulkString(value.clone()));
        }

        RespValue::Array(vec![
            RespValue::bulk_string(self.id.to_string()),
            RespValue::Array(flattened),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stream {
    entries: Vec<StreamEntry>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StreamEntry] {
        &self.entries
    }

    pub fn last_id(&self) -> Option<StreamId> {
        self.entries.last().map(|entry| entry.id)
    }

    /// Resolves the id an XADD with `request` would receive, without appending.
    pub fn next_id(&self, request: StreamIdRequest, now_ms: u64) -> Result<StreamId, StreamError> {
        let last_id = self.last_id();

        let id = match request {
            StreamIdRequest::Explicit(id) => id,
            StreamIdRequest::AutoSequence(ms_time) => match last_id {
                Some(last) if last.ms_time == ms_time => {
                    let seq_no = last
                        .seq_no
                        .checked_add(1)
                        .ok_or(StreamError::IdNotGreaterThanTop)?;

                    StreamId::new(ms_time, seq_no)
                }
                None if ms_time == 0 => StreamId::new(0, 1),
                _ => StreamId::new(ms_time, 0),
            },
            StreamIdRequest::Auto => match last_id {
                Some(last) if last.ms_time >= now_ms => match last.seq_no.checked_add(1) {
                    Some(seq_no) => StreamId::new(last.ms_time, seq_no),
                    None => StreamId::new(last.ms_time.saturating_add(1), 0),
                },
                None if now_ms == 0 => StreamId::new(0, 1),
                _ => StreamId::new(now_ms, 0),
            },
        };

        if id <= StreamId::MIN {
            return Err(StreamError::IdNotGreaterThanZero);
        }

        if let Some(last) = last_id {
            if id <= last {
                return Err(StreamError::IdNotGreaterThanTop);
            }
        }

        Ok(id)
    }

    pub fn append(
        &mut self,
        request: StreamIdRequest,
        fields: Vec<(Bytes, Bytes)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let id = self.next_id(request, now_ms)?;
        self.entries.push(StreamEntry { id, fields });

        Ok(id)
    }

    /// Entries with `start <= id <= end`, in stored order.
    pub fn range(&self, start: StreamId, end: StreamId) -> &[StreamEntry] {
        let from = self.entries.partition_point(|entry| entry.id < start);
        let to = self.entries.partition_point(|entry| entry.id <= end);

        if from >= to {
            return &[];
        }

        &self.entries[from..to]
    }

    /// Entries with an id strictly greater than `id`.
    pub fn entries_after(&self, id: StreamId) -> &[StreamEntry] {
        let from = self.entries.partition_point(|entry| entry.id <= id);
        &self.entries[from..]
    }
}

/// Encodes a list of entries as the two-level array used by XRANGE and XREAD.
pub fn entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::Array(entries.iter().map(StreamEntry::to_resp).collect())
}
