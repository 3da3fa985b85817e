//! Logical-record assembly across CONTINUE frames, and the mirror splitter.
//!
//! A logical record whose payload exceeds one frame's limit is carried by a
//! chain: one primary frame under the record's true sid followed by frames
//! under the reserved CONTINUE sid. [`RecordReader`] reassembles chains into
//! contiguous payloads on the way in; [`ContinuationWriter`] splits
//! arbitrary-length payloads into chains on the way out.
//!
//! The assembler works on byte counts only. Bookkeeping that depends on
//! *item* boundaries inside a payload (shared-string bucket offsets, grbit
//! bytes re-emitted mid-string) belongs to the record codecs and the string
//! sub-codec, which receive the chain's boundary offsets for that purpose.

use crate::consts::{FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD, SID_CONTINUE};
use crate::context::DecodeContext;
use crate::error::{BiffError, BiffResult};
use crate::frame::{FrameHeader, FrameReader};
use crate::records::Record;
use crate::registry;
use bytes::Bytes;
use smallvec::SmallVec;

/// A logical record before type dispatch: the payload reassembled from one
/// primary frame and any number of CONTINUE frames.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Type identifier of the primary frame
    pub sid: u16,
    /// Absolute stream offset of the primary frame's header
    pub offset: usize,
    /// Reassembled payload. Zero-copy for single-frame records, an owned
    /// merge otherwise.
    pub data: Bytes,
    /// Payload offsets at which a CONTINUE frame's bytes begin. Empty for
    /// single-frame records; zero-length CONTINUE frames contribute no
    /// entry.
    pub boundaries: SmallVec<[usize; 4]>,
}

/// Reads logical records off an in-memory stream.
pub struct RecordReader {
    frames: FrameReader,
    ctx: DecodeContext,
}

impl RecordReader {
    pub fn new(data: impl Into<Bytes>, ctx: DecodeContext) -> Self {
        RecordReader {
            frames: FrameReader::new(data.into()),
            ctx,
        }
    }

    /// Absolute offset of the next unread frame.
    pub fn position(&self) -> usize {
        self.frames.position()
    }

    /// Reassemble the next logical record without decoding it.
    ///
    /// Returns `None` at the end of the stream. A CONTINUE frame with no
    /// preceding record fails with [`BiffError::MalformedFrame`].
    pub fn next_raw(&mut self) -> Option<BiffResult<RawRecord>> {
        let first = match self.frames.next_frame()? {
            Ok(frame) => frame,
            Err(e) => return Some(Err(e)),
        };
        if first.sid == SID_CONTINUE {
            return Some(Err(BiffError::MalformedFrame {
                offset: first.offset,
                reason: "continuation frame with no preceding record",
            }));
        }

        if self.frames.peek_sid() != Some(SID_CONTINUE) {
            return Some(Ok(RawRecord {
                sid: first.sid,
                offset: first.offset,
                data: first.data,
                boundaries: SmallVec::new(),
            }));
        }

        let mut merged = first.data.to_vec();
        let mut boundaries = SmallVec::new();
        while self.frames.peek_sid() == Some(SID_CONTINUE) {
            let frame = match self.frames.next_frame() {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            };
            if !frame.data.is_empty() {
                boundaries.push(merged.len());
                merged.extend_from_slice(&frame.data);
            }
        }
        Some(Ok(RawRecord {
            sid: first.sid,
            offset: first.offset,
            data: Bytes::from(merged),
            boundaries,
        }))
    }

    /// Reassemble and decode the next logical record.
    ///
    /// Unknown sids decode to [`Record::Unknown`]; recognized-but-refused
    /// sids (the encryption header) fail with
    /// [`BiffError::UnsupportedVariant`]. Every decode failure is wrapped
    /// with the record's sid and stream offset.
    pub fn next_record(&mut self) -> Option<BiffResult<Record>> {
        let raw = match self.next_raw()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };
        Some(registry::dispatch(&raw, &self.ctx).map_err(|e| e.in_record(raw.sid, raw.offset)))
    }
}

/// Splits one logical payload across a primary frame and CONTINUE frames.
///
/// Bytes are accumulated into the frame under construction; when it fills,
/// the frame is closed and a CONTINUE frame opened. [`finish`] returns the
/// complete wire bytes, headers included. A record with an empty payload
/// still produces its (empty) primary frame.
///
/// [`finish`]: ContinuationWriter::finish
pub struct ContinuationWriter {
    sid: u16,
    finished: Vec<u8>,
    current: Vec<u8>,
    first: bool,
}

impl ContinuationWriter {
    pub fn new(sid: u16) -> Self {
        ContinuationWriter {
            sid,
            finished: Vec::new(),
            current: Vec::new(),
            first: true,
        }
    }

    /// Bytes still fitting in the frame under construction.
    #[inline]
    pub fn frame_remaining(&self) -> usize {
        MAX_FRAME_PAYLOAD - self.current.len()
    }

    /// Offset of the next written byte from the start of the current
    /// frame, header included.
    #[inline]
    pub fn frame_offset(&self) -> usize {
        FRAME_HEADER_SIZE + self.current.len()
    }

    /// Offset of the next written byte from the start of the record's wire
    /// bytes, headers included.
    #[inline]
    pub fn position(&self) -> usize {
        self.finished.len() + FRAME_HEADER_SIZE + self.current.len()
    }

    fn flush(&mut self) {
        let sid = if self.first { self.sid } else { SID_CONTINUE };
        FrameHeader {
            sid,
            len: self.current.len() as u16,
        }
        .write(&mut self.finished);
        self.finished.extend_from_slice(&self.current);
        self.current.clear();
        self.first = false;
    }

    /// Close the frame under construction and start the next CONTINUE
    /// frame. Most callers never need this directly; it exists for codecs
    /// whose internal accounting demands a frame break at an item boundary,
    /// including an explicit zero-length continuation.
    pub fn break_frame(&mut self) {
        self.flush();
    }

    /// Append bytes that must already fit in the current frame. Callers
    /// check [`frame_remaining`](ContinuationWriter::frame_remaining) and
    /// break frames themselves; the string sub-codec uses this to interleave
    /// its grbit repair bytes.
    pub fn push_raw(&mut self, data: &[u8]) {
        debug_assert!(data.len() <= self.frame_remaining());
        self.current.extend_from_slice(data);
    }

    /// Append a byte run that may be split anywhere.
    pub fn write_bytes(&mut self, mut data: &[u8]) {
        loop {
            let can_write = self.frame_remaining().min(data.len());
            self.current.extend_from_slice(&data[..can_write]);
            data = &data[can_write..];
            if data.is_empty() {
                break;
            }
            self.flush();
        }
    }

    /// Append a unit that must not be split across a frame boundary
    /// (record and string headers). The unit must be smaller than one
    /// frame.
    pub fn write_atomic(&mut self, data: &[u8]) {
        debug_assert!(data.len() <= MAX_FRAME_PAYLOAD);
        if data.len() > self.frame_remaining() {
            self.flush();
        }
        self.current.extend_from_slice(data);
    }

    /// Close the last frame and return the complete wire bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.first || !self.current.is_empty() {
            self.flush();
        }
        self.finished
    }
}

/// Serialize one logical payload as a frame chain. The everyday path for
/// records without item-level continuation bookkeeping.
pub fn write_record_frames(sid: u16, payload: &[u8]) -> Vec<u8> {
    let mut writer = ContinuationWriter::new(sid);
    writer.write_bytes(payload);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SID_EOF;
    use proptest::prelude::*;

    fn raw_round_trip(payload: &[u8]) -> RawRecord {
        let wire = write_record_frames(0x00FC, payload);
        let mut reader = RecordReader::new(wire, DecodeContext::default());
        let raw = reader.next_raw().unwrap().unwrap();
        assert!(reader.next_raw().is_none());
        raw
    }

    #[test]
    fn test_empty_payload_single_empty_frame() {
        let wire = write_record_frames(SID_EOF, &[]);
        assert_eq!(wire, vec![0x0A, 0x00, 0x00, 0x00]);
        let raw = raw_round_trip(&[]);
        assert!(raw.data.is_empty());
        assert!(raw.boundaries.is_empty());
    }

    #[test]
    fn test_payload_at_limit_no_continuation() {
        let payload = vec![0x11u8; MAX_FRAME_PAYLOAD];
        let wire = write_record_frames(0x00FC, &payload);
        // Exactly one frame: header + 8224 bytes
        assert_eq!(wire.len(), FRAME_HEADER_SIZE + MAX_FRAME_PAYLOAD);
        assert_eq!(&wire[2..4], &(MAX_FRAME_PAYLOAD as u16).to_le_bytes());

        let raw = raw_round_trip(&payload);
        assert_eq!(&raw.data[..], &payload[..]);
        assert!(raw.boundaries.is_empty());
    }

    #[test]
    fn test_payload_one_past_limit() {
        let payload = vec![0x22u8; MAX_FRAME_PAYLOAD + 1];
        let wire = write_record_frames(0x00FC, &payload);
        // Primary frame of 8224 + CONTINUE of 1
        assert_eq!(wire.len(), 2 * FRAME_HEADER_SIZE + MAX_FRAME_PAYLOAD + 1);
        let continue_header = &wire[FRAME_HEADER_SIZE + MAX_FRAME_PAYLOAD..];
        assert_eq!(&continue_header[0..2], &SID_CONTINUE.to_le_bytes());
        assert_eq!(&continue_header[2..4], &1u16.to_le_bytes());

        let raw = raw_round_trip(&payload);
        assert_eq!(&raw.data[..], &payload[..]);
        assert_eq!(&raw.boundaries[..], &[MAX_FRAME_PAYLOAD]);
    }

    #[test]
    fn test_long_chain_reassembles_byte_identical() {
        let payload: Vec<u8> = (0..30_000u32).map(|i| (i % 251) as u8).collect();
        let raw = raw_round_trip(&payload);
        assert_eq!(raw.sid, 0x00FC);
        assert_eq!(&raw.data[..], &payload[..]);
        assert_eq!(&raw.boundaries[..], &[8224, 16448, 24672]);
    }

    #[test]
    fn test_zero_length_continuation_contributes_nothing() {
        // Hand-built chain: primary(3) + CONTINUE(0) + CONTINUE(2)
        let mut wire = Vec::new();
        crate::frame::write_frame(&mut wire, 0x00FC, &[1, 2, 3]).unwrap();
        crate::frame::write_frame(&mut wire, SID_CONTINUE, &[]).unwrap();
        crate::frame::write_frame(&mut wire, SID_CONTINUE, &[4, 5]).unwrap();

        let mut reader = RecordReader::new(wire, DecodeContext::default());
        let raw = reader.next_raw().unwrap().unwrap();
        assert_eq!(&raw.data[..], &[1, 2, 3, 4, 5]);
        assert_eq!(&raw.boundaries[..], &[3]);
        assert!(reader.next_raw().is_none());
    }

    #[test]
    fn test_trailing_zero_length_continuation() {
        let mut wire = Vec::new();
        crate::frame::write_frame(&mut wire, 0x00FC, &[9]).unwrap();
        crate::frame::write_frame(&mut wire, SID_CONTINUE, &[]).unwrap();

        let mut reader = RecordReader::new(wire, DecodeContext::default());
        let raw = reader.next_raw().unwrap().unwrap();
        assert_eq!(&raw.data[..], &[9]);
        assert!(raw.boundaries.is_empty());
        assert!(reader.next_raw().is_none());
    }

    #[test]
    fn test_orphan_continuation_rejected() {
        let mut wire = Vec::new();
        crate::frame::write_frame(&mut wire, SID_CONTINUE, &[1, 2]).unwrap();

        let mut reader = RecordReader::new(wire, DecodeContext::default());
        assert!(matches!(
            reader.next_raw().unwrap(),
            Err(BiffError::MalformedFrame { offset: 0, .. })
        ));
    }

    #[test]
    fn test_chain_stops_at_next_record() {
        let mut wire = Vec::new();
        crate::frame::write_frame(&mut wire, 0x00FC, &[1]).unwrap();
        crate::frame::write_frame(&mut wire, SID_CONTINUE, &[2]).unwrap();
        crate::frame::write_frame(&mut wire, SID_EOF, &[]).unwrap();

        let mut reader = RecordReader::new(wire, DecodeContext::default());
        let sst = reader.next_raw().unwrap().unwrap();
        assert_eq!(&sst.data[..], &[1, 2]);
        let eof = reader.next_raw().unwrap().unwrap();
        assert_eq!(eof.sid, SID_EOF);
        assert!(reader.next_raw().is_none());
    }

    proptest! {
        #[test]
        fn prop_continuation_law(len in 0usize..40_000) {
            let payload: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
            let raw = raw_round_trip(&payload);
            prop_assert_eq!(&raw.data[..], &payload[..]);
        }
    }
}
