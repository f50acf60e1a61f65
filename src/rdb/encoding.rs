use bytes::{BufMut, Bytes, BytesMut};

use crate::rdb::{
    get_slice::{get_array, get_buffer_slice, get_byte},
    RdbError,
};

#[derive(Debug, PartialEq)]
enum ValueEncoding {
    Length(usize),
    Int8,
    Int16,
    Int32,
}

/// Reads a length or special-encoding prefix. Returns the encoding and the
/// number of bytes consumed.
fn parse_length_encoding(bytes: &[u8], cursor: usize) -> Result<(ValueEncoding, usize), RdbError> {
    let byte = get_byte(bytes, cursor)?;

    // The two most significant bits select the encoding.
    match byte >> 6 {
        0b00 => Ok((ValueEncoding::Length((byte & 0b0011_1111) as usize), 1)),
        0b01 => {
            // 14 bits: the low 6 bits of this byte are the high bits of the length.
            let low = get_byte(bytes, cursor + 1)? as usize;
            let high = (byte & 0b0011_1111) as usize;

            Ok((ValueEncoding::Length((high << 8) | low), 2))
        }
        0b10 if byte == 0x80 => {
            let length = u32::from_be_bytes(get_array::<4>(bytes, cursor + 1)?);
            Ok((ValueEncoding::Length(length as usize), 5))
        }
        0b11 => match byte & 0b0011_1111 {
            0 => Ok((ValueEncoding::Int8, 1)),
            1 => Ok((ValueEncoding::Int16, 1)),
            2 => Ok((ValueEncoding::Int32, 1)),
            _ => Err(RdbError::UnsupportedEncoding(byte)),
        },
        _ => Err(RdbError::UnsupportedEncoding(byte)),
    }
}

/// Reads a plain length (used by resize hints and the database selector).
pub fn parse_length(bytes: &[u8], cursor: usize) -> Result<(usize, usize), RdbError> {
    match parse_length_encoding(bytes, cursor)? {
        (ValueEncoding::Length(length), read) => Ok((length, read)),
        _ => Err(RdbError::UnsupportedEncoding(get_byte(bytes, cursor)?)),
    }
}

/// Reads a string, expanding integer encodings to their decimal text.
pub fn parse_string(bytes: &[u8], cursor: usize) -> Result<(Bytes, usize), RdbError> {
    let (encoding, header) = parse_length_encoding(bytes, cursor)?;
    let start = cursor + header;

    let (value, read) = match encoding {
        ValueEncoding::Length(length) => (
            Bytes::copy_from_slice(get_buffer_slice(bytes, start, length)?),
            length,
        ),
        // Integers are stored little-endian.
        ValueEncoding::Int8 => {
            let value = i8::from_le_bytes(get_array::<1>(bytes, start)?);
            (Bytes::from(value.to_string()), 1)
        }
        ValueEncoding::Int16 => {
            let value = i16::from_le_bytes(get_array::<2>(bytes, start)?);
            (Bytes::from(value.to_string()), 2)
        }
        ValueEncoding::Int32 => {
            let value = i32::from_le_bytes(get_array::<4>(bytes, start)?);
            (Bytes::from(value.to_string()), 4)
        }
    };

    Ok((value, header + read))
}

pub fn encode_length(length: usize, buffer: &mut BytesMut) {
    if length < 1 << 6 {
        buffer.put_u8(length as u8);
    } else if length < 1 << 14 {
        buffer.put_u8(0b0100_0000 | (length >> 8) as u8);
        buffer.put_u8(length as u8);
    } else {
        buffer.put_u8(0x80);
        buffer.put_u32(length as u32);
    }
}

pub fn encode_string(value: &[u8], buffer: &mut BytesMut) {
    encode_length(value.len(), buffer);
    buffer.put_slice(value);
}
