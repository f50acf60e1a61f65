//! RESP (REdis Serialization Protocol) codec.
//!
//! Values are decoded from a growable `BytesMut` buffer one frame at a time.
//! A decode that runs out of bytes reports [`RespError::Incomplete`] and leaves
//! the buffer untouched so the caller can read more data and try again.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Deepest array nesting accepted from a peer. Requests are flat arrays.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Errors produced while decoding RESP frames.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("incomplete frame")]
    Incomplete,
    #[error("missing CRLF terminator")]
    MissingTerminator,
    #[error("invalid length: {0}")]
    InvalidLength(String),
    #[error("invalid integer: {0}")]
    InvalidInteger(String),
    #[error("unknown RESP type byte {0:#04x}")]
    UnknownType(u8),
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("arrays nested deeper than {MAX_NESTING_DEPTH} levels")]
    NestingTooDeep,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    NullBulkString,
    Array(Vec<RespValue>),
    /// `$<n>\r\n<n bytes>` with no trailing CRLF, used for the PSYNC snapshot.
    RawPayload(Bytes),
}

impl RespValue {
    pub fn bulk_string(value: impl Into<Bytes>) -> Self {
        RespValue::BulkString(value.into())
    }

    pub fn simple_string(value: impl Into<String>) -> Self {
        RespValue::SimpleString(value.into())
    }

    /// Builds a request-shaped array of bulk strings.
    pub fn command<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Bytes>,
    {
        RespValue::Array(parts.into_iter().map(RespValue::bulk_string).collect())
    }

    pub fn encode(&self) -> Bytes {
        let mut buffer = BytesMut::new();
        self.encode_into(&mut buffer);
        buffer.freeze()
    }

    pub fn encoded_len(&self) -> usize {
        self.encode().len()
    }

    fn encode_into(&self, buffer: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buffer.put_u8(b'+');
                buffer.put_slice(s.as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::Error(s) => {
                buffer.put_u8(b'-');
                buffer.put_slice(s.as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buffer.put_u8(b':');
                buffer.put_slice(i.to_string().as_bytes());
                buffer.put_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buffer.put_u8(b'$');
                buffer.put_slice(data.len().to_string().as_bytes());
                buffer.put_slice(CRLF);
                buffer.put_slice(data);
                buffer.put_slice(CRLF);
            }
            RespValue::NullBulkString => buffer.put_slice(b"$-1\r\n"),
            RespValue::Array(elements) => {
                buffer.put_u8(b'*');
                buffer.put_slice(elements.len().to_string().as_bytes());
                buffer.put_slice(CRLF);

                for element in elements {
                    element.encode_into(buffer);
                }
            }
            RespValue::RawPayload(data) => {
                buffer.put_u8(b'$');
                buffer.put_slice(data.len().to_string().as_bytes());
                buffer.put_slice(CRLF);
                buffer.put_slice(data);
            }
        }
    }

    /// Decodes one value from the front of `buffer`.
    ///
    /// On success the consumed bytes are split off the buffer and returned
    /// alongside the value, so callers can forward the exact wire encoding.
    pub fn decode(buffer: &mut BytesMut) -> Result<(RespValue, Bytes), RespError> {
        let (value, consumed) = decode_value(&buffer[..], 0, 0)?;
        let raw = buffer.split_to(consumed).freeze();

        Ok((value, raw))
    }

    /// Decodes a `$<n>\r\n<n bytes>` payload that has no trailing CRLF.
    pub fn decode_raw_payload(buffer: &mut BytesMut) -> Result<Bytes, RespError> {
        let Some(&type_byte) = buffer.first() else {
            return Err(RespError::Incomplete);
        };

        if type_byte != b'$' {
            return Err(RespError::UnknownType(type_byte));
        }

        let (line, header_end) = read_line(&buffer[..], 1)?;
        let length = parse_length(line)?;
        let payload_end = checked_end(header_end, length, line)?;

        if buffer.len() < payload_end {
            return Err(RespError::Incomplete);
        }

        let _ = buffer.split_to(header_end);
        Ok(buffer.split_to(length).freeze())
    }
}

fn decode_value(
    bytes: &[u8],
    cursor: usize,
    depth: usize,
) -> Result<(RespValue, usize), RespError> {
    let Some(&type_byte) = bytes.get(cursor) else {
        return Err(RespError::Incomplete);
    };

    match type_byte {
        b'+' => {
            let (line, next) = read_line(bytes, cursor + 1)?;
            Ok((RespValue::SimpleString(line_to_string(line)?), next))
        }
        b'-' => {
            let (line, next) = read_line(bytes, cursor + 1)?;
            Ok((RespValue::Error(line_to_string(line)?), next))
        }
        b':' => {
            let (line, next) = read_line(bytes, cursor + 1)?;
            let text = line_to_string(line)?;
            let value = text
                .parse::<i64>()
                .map_err(|_| RespError::InvalidInteger(text))?;

            Ok((RespValue::Integer(value), next))
        }
        b'$' => {
            let (line, data_start) = read_line(bytes, cursor + 1)?;

            if line == b"-1" {
                return Ok((RespValue::NullBulkString, data_start));
            }

            let length = parse_length(line)?;
            let data_end = checked_end(data_start, length, line)?;
            let frame_end = checked_end(data_end, CRLF.len(), line)?;

            if bytes.len() < frame_end {
                return Err(RespError::Incomplete);
            }

            if &bytes[data_end..frame_end] != CRLF {
                return Err(RespError::MissingTerminator);
            }

            let data = Bytes::copy_from_slice(&bytes[data_start..data_end]);
            Ok((RespValue::BulkString(data), frame_end))
        }
        b'*' => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(RespError::NestingTooDeep);
            }

            let (line, mut next) = read_line(bytes, cursor + 1)?;
            let length = parse_length(line)?;
            let mut elements = Vec::with_capacity(length.min(1024));

            for _ in 0..length {
                let (element, after) = decode_value(bytes, next, depth + 1)?;
                elements.push(element);
                next = after;
            }

            Ok((RespValue::Array(elements), next))
        }
        other => Err(RespError::UnknownType(other)),
    }
}

/// Returns the line starting at `start` (without CRLF) and the index after the CRLF.
fn read_line(bytes: &[u8], start: usize) -> Result<(&[u8], usize), RespError> {
    let rest = bytes.get(start..).unwrap_or_default();

    match rest.iter().position(|&b| b == b'\r') {
        Some(position) => match rest.get(position + 1) {
            Some(b'\n') => Ok((&rest[..position], start + position + 2)),
            Some(_) => Err(RespError::MissingTerminator),
            None => Err(RespError::Incomplete),
        },
        None if rest.contains(&b'\n') => Err(RespError::MissingTerminator),
        None => Err(RespError::Incomplete),
    }
}

fn parse_length(line: &[u8]) -> Result<usize, RespError> {
    let text = std::str::from_utf8(line).map_err(|_| RespError::InvalidUtf8)?;

    text.parse::<usize>()
        .map_err(|_| RespError::InvalidLength(text.to_string()))
}

fn checked_end(start: usize, length: usize, line: &[u8]) -> Result<usize, RespError> {
    start
        .checked_add(length)
        .ok_or_else(|| RespError::InvalidLength(String::from_utf8_lossy(line).into_owned()))
}

fn line_to_string(line: &[u8]) -> Result<String, RespError> {
    String::from_utf8(line.to_vec()).map_err(|_| RespError::InvalidUtf8)
}
