//! Error types for the BIFF record codec.

use thiserror::Error;

/// Result type alias for codec operations.
pub type BiffResult<T> = std::result::Result<T, BiffError>;

/// Errors that can occur while framing, assembling or decoding records.
#[derive(Error, Debug)]
pub enum BiffError {
    /// The stream is not a well-formed frame sequence at this position.
    /// Covers a stream that ends mid-header and a CONTINUE frame with no
    /// preceding record to continue.
    #[error("malformed frame at offset {offset}: {reason}")]
    MalformedFrame {
        /// Absolute stream offset of the offending frame
        offset: usize,
        /// What made the frame unreadable
        reason: &'static str,
    },

    /// A frame header declared more payload bytes than the stream holds.
    #[error(
        "truncated payload for record 0x{sid:04X} at offset {offset}: declared {declared} bytes, {available} available"
    )]
    TruncatedPayload {
        /// Type identifier from the frame header
        sid: u16,
        /// Absolute stream offset of the frame header
        offset: usize,
        /// Payload length declared by the header
        declared: usize,
        /// Payload bytes actually available
        available: usize,
    },

    /// Write-side violation of the frame payload limit. The caller bypassed
    /// the continuation writer; oversized payloads must be pre-split.
    #[error("payload of {len} bytes exceeds the 8224-byte frame limit")]
    PayloadTooLarge {
        /// Length of the rejected payload
        len: usize,
    },

    /// A decoded field violates a known domain constraint.
    #[error("invalid value {value} for {field} in record 0x{sid:04X}")]
    InvalidFieldValue {
        /// Type identifier of the record being decoded
        sid: u16,
        /// Name of the offending field
        field: &'static str,
        /// The out-of-domain value
        value: u32,
    },

    /// The type identifier is recognized but deliberately not decoded
    /// further (e.g. an encryption header). The raw record remains
    /// available through the raw-record layer.
    #[error("record 0x{sid:04X} at offset {offset} is not supported: {reason}")]
    UnsupportedVariant {
        /// Type identifier of the refused record
        sid: u16,
        /// Absolute stream offset of the record
        offset: usize,
        /// Why the record is refused
        reason: &'static str,
    },

    /// A field read would cross the end of the available payload.
    #[error("unexpected end of data: needed {needed} bytes, {available} available")]
    UnexpectedEndOfData {
        /// Bytes the read required
        needed: usize,
        /// Bytes that remained
        available: usize,
    },

    /// Wrapper attached by the dispatcher so every decode failure names the
    /// offending type identifier and stream offset.
    #[error("failed to decode record 0x{sid:04X} at offset {offset}")]
    RecordDecode {
        /// Type identifier of the record that failed to decode
        sid: u16,
        /// Absolute stream offset of the record's first frame
        offset: usize,
        /// The underlying failure
        #[source]
        source: Box<BiffError>,
    },
}

impl BiffError {
    /// Wrap a decode failure with the record's sid and stream offset.
    pub(crate) fn in_record(self, sid: u16, offset: usize) -> Self {
        match self {
            // Already carries its position; re-wrapping would only obscure it.
            BiffError::RecordDecode { .. } => self,
            other => BiffError::RecordDecode {
                sid,
                offset,
                source: Box::new(other),
            },
        }
    }
}
