//! Shared string table records.
//!
//! SST is the record most often split across CONTINUE frames, and the one
//! whose continuation handling goes beyond byte counts: string headers may
//! not straddle a frame boundary, interrupted character runs resume behind
//! a re-emitted grbit byte, and the EXTSST index wants to know where every
//! bucket's first string landed in the chain. The byte-level splitting
//! lives in [`ContinuationWriter`]; everything item-shaped is done here.

use super::RecordCodec;
use crate::consts::{DEFAULT_EXTSST_BUCKET_SIZE, SID_EXTSST, SID_SST};
use crate::context::DecodeContext;
use crate::continuation::ContinuationWriter;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{BiffError, BiffResult};
use crate::strings;

/// SST record (the workbook's shared string table)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SstRecord {
    /// Total number of string uses in the workbook (cells may share
    /// entries, so this is usually larger than the entry count)
    pub total_used: u32,
    /// The unique string entries, in table order
    pub strings: Vec<String>,
}

/// Output of [`SstRecord::serialize`]: the wire bytes plus the bucket
/// offsets the EXTSST index is built from.
pub struct SstSerialized {
    /// Complete wire bytes (SST frame plus CONTINUE frames)
    pub bytes: Vec<u8>,
    /// Per bucket: offset of the bucket's first string from the start of
    /// the record's wire bytes
    pub bucket_offsets: Vec<u32>,
    /// Per bucket: offset of the bucket's first string from the start of
    /// the frame that holds it, header included
    pub bucket_frame_offsets: Vec<u16>,
}

impl SstRecord {
    pub(crate) fn decode(
        cur: &mut ReadCursor<'_>,
        boundaries: &[usize],
        ctx: &DecodeContext,
    ) -> BiffResult<Self> {
        let total_used = cur.read_u32()?;
        let unique = cur.read_u32()? as usize;
        let mut strings_vec = Vec::with_capacity(unique.min(u16::MAX as usize));
        for _ in 0..unique {
            strings_vec.push(strings::read_unicode_string(cur, boundaries, ctx)?);
        }
        if cur.remaining() != 0 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_SST,
                field: "trailing bytes",
                value: cur.remaining() as u32,
            });
        }
        Ok(SstRecord {
            total_used,
            strings: strings_vec,
        })
    }

    /// Serialize the table, recording where each EXTSST bucket starts.
    ///
    /// String headers are kept whole within a frame; character runs split
    /// at frame boundaries through the string sub-codec, which re-emits
    /// the grbit byte for the continued remainder.
    pub fn serialize(&self) -> SstSerialized {
        let mut writer = ContinuationWriter::new(SID_SST);
        let mut header = WriteCursor::with_capacity(8);
        header.write_u32(self.total_used);
        header.write_u32(self.strings.len() as u32);
        writer.write_atomic(header.as_slice());

        let bucket_size = DEFAULT_EXTSST_BUCKET_SIZE as usize;
        let mut bucket_offsets = Vec::new();
        let mut bucket_frame_offsets = Vec::new();

        for (index, s) in self.strings.iter().enumerate() {
            // The 3-byte string header must land in one frame
            if writer.frame_remaining() < 3 {
                writer.break_frame();
            }
            if index % bucket_size == 0 {
                bucket_offsets.push(writer.position() as u32);
                bucket_frame_offsets.push(writer.frame_offset() as u16);
            }
            let wide = strings::is_wide(s);
            let cch = s.encode_utf16().count().min(0xFFFF) as u16;
            let mut string_header = [0u8; 3];
            string_header[..2].copy_from_slice(&cch.to_le_bytes());
            string_header[2] = wide as u8;
            writer.push_raw(&string_header);
            strings::write_continued_chars(&mut writer, s, wide);
        }

        SstSerialized {
            bytes: writer.finish(),
            bucket_offsets,
            bucket_frame_offsets,
        }
    }

    /// Complete wire bytes, CONTINUE frames included.
    pub fn encode(&self) -> Vec<u8> {
        self.serialize().bytes
    }

    /// Exact length of [`encode`](SstRecord::encode)'s output, measured
    /// through the same serialization path.
    pub fn record_size(&self) -> usize {
        self.serialize().bytes.len()
    }

    /// Build the EXTSST index for this table as it would serialize at
    /// `stream_offset` (the absolute position of the SST record in the
    /// surrounding stream).
    pub fn create_ext_sst(&self, stream_offset: u32) -> ExtSstRecord {
        let serialized = self.serialize();
        let buckets = serialized
            .bucket_offsets
            .iter()
            .zip(&serialized.bucket_frame_offsets)
            .map(|(&abs, &rel)| ExtSstInfo {
                stream_position: stream_offset + abs,
                frame_offset: rel,
            })
            .collect();
        ExtSstRecord {
            bucket_size: DEFAULT_EXTSST_BUCKET_SIZE,
            buckets,
        }
    }
}

/// One EXTSST bucket entry (ISSTINF)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtSstInfo {
    /// Absolute stream position of the bucket's first string
    pub stream_position: u32,
    /// Offset of that string from the start of its frame, header included
    pub frame_offset: u16,
}

/// EXTSST record (random-access index into the shared string table)
///
/// The bucket array carries no count field; its length is whatever the
/// payload holds after the bucket-size field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtSstRecord {
    /// Number of strings per bucket
    pub bucket_size: u16,
    pub buckets: Vec<ExtSstInfo>,
}

impl RecordCodec for ExtSstRecord {
    const SID: u16 = SID_EXTSST;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let bucket_size = cur.read_u16()?;
        if cur.remaining() % 8 != 0 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_EXTSST,
                field: "payload length",
                value: cur.remaining() as u32,
            });
        }
        let count = cur.remaining() / 8;
        let mut buckets = Vec::with_capacity(count);
        for _ in 0..count {
            let stream_position = cur.read_u32()?;
            let frame_offset = cur.read_u16()?;
            cur.skip(2)?; // reserved
            buckets.push(ExtSstInfo {
                stream_position,
                frame_offset,
            });
        }
        Ok(ExtSstRecord {
            bucket_size,
            buckets,
        })
    }

    fn payload_size(&self) -> usize {
        2 + self.buckets.len() * 8
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.bucket_size);
        for bucket in &self.buckets {
            out.write_u32(bucket.stream_position);
            out.write_u16(bucket.frame_offset);
            out.write_u16(0); // reserved
        }
    }
}
