//! Sequential little-endian cursors over in-memory record payloads.
//!
//! All multi-byte fields in a BIFF stream are little-endian. `ReadCursor`
//! provides bounds-checked reads that advance a position; `WriteCursor` is
//! the mirror, appending to a growable buffer. Record codecs branch on
//! [`ReadCursor::remaining`] where the payload length discriminates between
//! record layouts.

use crate::error::{BiffError, BiffResult};
use zerocopy::{F64, FromBytes, I16, I32, I64, LE, U16, U32, U64};

/// Bounds-checked sequential reader over a record payload.
pub struct ReadCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        ReadCursor { data, pos: 0 }
    }

    /// Number of unread bytes.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current position from the start of the payload.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consume `n` bytes, failing if fewer remain.
    fn take(&mut self, n: usize) -> BiffResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(BiffError::UnexpectedEndOfData {
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a fixed-length byte run.
    pub fn read_bytes(&mut self, n: usize) -> BiffResult<&'a [u8]> {
        self.take(n)
    }

    /// Skip `n` bytes without interpreting them.
    pub fn skip(&mut self, n: usize) -> BiffResult<()> {
        self.take(n).map(|_| ())
    }

    #[inline]
    pub fn read_u8(&mut self) -> BiffResult<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> BiffResult<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    #[inline]
    pub fn read_u16(&mut self) -> BiffResult<u16> {
        let bytes = self.take(2)?;
        U16::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| BiffError::UnexpectedEndOfData { needed: 2, available: 0 })
    }

    #[inline]
    pub fn read_i16(&mut self) -> BiffResult<i16> {
        let bytes = self.take(2)?;
        I16::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| BiffError::UnexpectedEndOfData { needed: 2, available: 0 })
    }

    #[inline]
    pub fn read_u32(&mut self) -> BiffResult<u32> {
        let bytes = self.take(4)?;
        U32::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| BiffError::UnexpectedEndOfData { needed: 4, available: 0 })
    }

    #[inline]
    pub fn read_i32(&mut self) -> BiffResult<i32> {
        let bytes = self.take(4)?;
        I32::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| BiffError::UnexpectedEndOfData { needed: 4, available: 0 })
    }

    #[inline]
    pub fn read_u64(&mut self) -> BiffResult<u64> {
        let bytes = self.take(8)?;
        U64::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| BiffError::UnexpectedEndOfData { needed: 8, available: 0 })
    }

    #[inline]
    pub fn read_i64(&mut self) -> BiffResult<i64> {
        let bytes = self.take(8)?;
        I64::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| BiffError::UnexpectedEndOfData { needed: 8, available: 0 })
    }

    /// Read an IEEE-754 double.
    #[inline]
    pub fn read_f64(&mut self) -> BiffResult<f64> {
        let bytes = self.take(8)?;
        F64::<LE>::read_from_bytes(bytes)
            .map(|v| v.get())
            .map_err(|_| BiffError::UnexpectedEndOfData { needed: 8, available: 0 })
    }
}

/// Mirror of [`ReadCursor`]: appends little-endian values to a buffer.
///
/// Writing into memory cannot fail, so the methods return nothing. The
/// finished buffer is recovered with [`WriteCursor::into_bytes`].
#[derive(Default)]
pub struct WriteCursor {
    buf: Vec<u8>,
}

impl WriteCursor {
    pub fn new() -> Self {
        WriteCursor::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        WriteCursor {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut cur = ReadCursor::new(&data);
        assert_eq!(cur.read_u16().unwrap(), 0x1234);
        assert_eq!(cur.read_u32().unwrap(), 0x12345678);
        assert_eq!(cur.remaining(), 0);
        assert!(matches!(
            cur.read_u8(),
            Err(BiffError::UnexpectedEndOfData { needed: 1, available: 0 })
        ));
    }

    #[test]
    fn test_read_signed_and_double() {
        let mut out = WriteCursor::new();
        out.write_i16(-2);
        out.write_i32(-70000);
        out.write_f64(3.25);
        let buf = out.into_bytes();

        let mut cur = ReadCursor::new(&buf);
        assert_eq!(cur.read_i16().unwrap(), -2);
        assert_eq!(cur.read_i32().unwrap(), -70000);
        assert_eq!(cur.read_f64().unwrap(), 3.25);
    }

    #[test]
    fn test_read_bytes_and_skip() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cur = ReadCursor::new(&data);
        assert_eq!(cur.read_bytes(2).unwrap(), &[1, 2]);
        cur.skip(1).unwrap();
        assert_eq!(cur.position(), 3);
        assert_eq!(cur.remaining(), 2);
        assert!(cur.skip(3).is_err());
        // A failed read must not advance the cursor
        assert_eq!(cur.position(), 3);
    }

    #[test]
    fn test_write_read_round_trip() {
        let mut out = WriteCursor::new();
        out.write_u8(0xAB);
        out.write_u16(0xBEEF);
        out.write_u32(0xDEADBEEF);
        out.write_u64(0x0123_4567_89AB_CDEF);
        out.write_bytes(&[9, 9, 9]);
        assert_eq!(out.len(), 1 + 2 + 4 + 8 + 3);

        let buf = out.into_bytes();
        let mut cur = ReadCursor::new(&buf);
        assert_eq!(cur.read_u8().unwrap(), 0xAB);
        assert_eq!(cur.read_u16().unwrap(), 0xBEEF);
        assert_eq!(cur.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(cur.read_u64().unwrap(), 0x0123_4567_89AB_CDEF);
        assert_eq!(cur.read_bytes(3).unwrap(), &[9, 9, 9]);
    }
}
