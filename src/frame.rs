//! Physical record framing.
//!
//! Every record on the wire is preceded by a fixed 4-byte header: the type
//! identifier (sid) followed by the payload length, both little-endian u16.
//! A frame payload never exceeds [`MAX_FRAME_PAYLOAD`] bytes; logical
//! records longer than that are carried by CONTINUE frames, which the
//! [`continuation`](crate::continuation) module assembles.

use crate::consts::{FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD};
use crate::error::{BiffError, BiffResult};
use bytes::Bytes;
use zerocopy::{FromBytes, LE, U16};

/// Frame header (4 bytes: sid + payload length)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sid: u16,
    pub len: u16,
}

impl FrameHeader {
    /// Parse a header from `data` at `offset`.
    ///
    /// Fails with [`BiffError::MalformedFrame`] if the stream ends
    /// mid-header.
    pub fn parse(data: &[u8], offset: usize) -> BiffResult<Self> {
        if offset + FRAME_HEADER_SIZE > data.len() {
            return Err(BiffError::MalformedFrame {
                offset,
                reason: "stream ends mid-header",
            });
        }
        let sid = U16::<LE>::read_from_bytes(&data[offset..offset + 2])
            .map(|v| v.get())
            .unwrap_or(0);
        let len = U16::<LE>::read_from_bytes(&data[offset + 2..offset + 4])
            .map(|v| v.get())
            .unwrap_or(0);
        Ok(FrameHeader { sid, len })
    }

    /// Append the 4 header bytes to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.sid.to_le_bytes());
        out.extend_from_slice(&self.len.to_le_bytes());
    }
}

/// Write one complete frame (header + payload).
///
/// The payload must fit in a single frame; oversized payloads fail with
/// [`BiffError::PayloadTooLarge`] and must be pre-split through
/// [`ContinuationWriter`](crate::continuation::ContinuationWriter).
pub fn write_frame(out: &mut Vec<u8>, sid: u16, payload: &[u8]) -> BiffResult<()> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(BiffError::PayloadTooLarge { len: payload.len() });
    }
    FrameHeader {
        sid,
        len: payload.len() as u16,
    }
    .write(out);
    out.extend_from_slice(payload);
    Ok(())
}

/// One physical frame peeled off the stream.
///
/// `data` is a zero-copy [`Bytes`] slice sharing the stream's backing
/// storage.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Type identifier from the header
    pub sid: u16,
    /// Absolute stream offset of the frame header
    pub offset: usize,
    /// Payload bytes
    pub data: Bytes,
}

/// Iterator over the physical frames of an in-memory stream.
pub struct FrameReader {
    data: Bytes,
    pos: usize,
}

impl FrameReader {
    pub fn new(data: Bytes) -> Self {
        FrameReader { data, pos: 0 }
    }

    /// Absolute offset of the next unread frame header.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether any bytes remain past the current position.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.pos < self.data.len()
    }

    /// Sid of the next frame without consuming it, or `None` at the end of
    /// the stream or when the remaining bytes cannot hold a header.
    pub fn peek_sid(&self) -> Option<u16> {
        FrameHeader::parse(&self.data, self.pos).ok().map(|h| h.sid)
    }

    /// Read the next frame, or `None` at the end of the stream.
    ///
    /// Fails with [`BiffError::TruncatedPayload`] when the header declares
    /// more payload than the stream holds; the cursor does not advance past
    /// a failed frame.
    pub fn next_frame(&mut self) -> Option<BiffResult<Frame>> {
        if !self.has_next() {
            return None;
        }
        let offset = self.pos;
        let header = match FrameHeader::parse(&self.data, offset) {
            Ok(h) => h,
            Err(e) => return Some(Err(e)),
        };
        let body_start = offset + FRAME_HEADER_SIZE;
        let declared = header.len as usize;
        if body_start + declared > self.data.len() {
            return Some(Err(BiffError::TruncatedPayload {
                sid: header.sid,
                offset,
                declared,
                available: self.data.len() - body_start,
            }));
        }
        self.pos = body_start + declared;
        Some(Ok(Frame {
            sid: header.sid,
            offset,
            data: self.data.slice(body_start..body_start + declared),
        }))
    }
}
