//! Opaque fallback for unregistered record kinds.

use crate::continuation::{RawRecord, write_record_frames};
use crate::records::framed_size_for_payload;
use bytes::Bytes;

/// A record whose type identifier has no registered codec.
///
/// The payload is preserved byte-exact so unrecognized records survive a
/// decode/encode cycle losslessly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRecord {
    /// Type identifier from the wire
    pub sid: u16,
    /// Reassembled payload, unchanged
    pub data: Bytes,
}

impl UnknownRecord {
    pub(crate) fn from_raw(raw: &RawRecord) -> Self {
        UnknownRecord {
            sid: raw.sid,
            data: raw.data.clone(),
        }
    }

    /// Complete wire bytes; payloads past the frame limit re-split into
    /// CONTINUE frames exactly as any other record.
    pub fn encode(&self) -> Vec<u8> {
        write_record_frames(self.sid, &self.data)
    }

    /// Exact length of [`encode`](UnknownRecord::encode)'s output.
    pub fn record_size(&self) -> usize {
        framed_size_for_payload(self.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_round_trip() {
        let rec = UnknownRecord {
            sid: 0x7777,
            data: Bytes::from_static(&[0xAA, 0xBB]),
        };
        let wire = rec.encode();
        assert_eq!(wire.len(), rec.record_size());
        assert_eq!(wire, vec![0x77, 0x77, 0x02, 0x00, 0xAA, 0xBB]);
    }
}
