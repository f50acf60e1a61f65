use crate::rdb::RdbError;

pub fn get_buffer_slice(buffer: &[u8], cursor: usize, len: usize) -> Result<&[u8], RdbError> {
    let end = cursor.checked_add(len).ok_or(RdbError::UnexpectedEof)?;

    buffer.get(cursor..end).ok_or(RdbError::UnexpectedEof)
}

pub fn get_byte(buffer: &[u8], cursor: usize) -> Result<u8, RdbError> {
    buffer.get(cursor).copied().ok_or(RdbError::UnexpectedEof)
}

pub fn get_array<const N: usize>(buffer: &[u8], cursor: usize) -> Result<[u8; N], RdbError> {
    get_buffer_slice(buffer, cursor, N)?
        .try_into()
        .map_err(|_| RdbError::UnexpectedEof)
}
