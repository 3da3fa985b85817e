//! Longan - record-level codec for the legacy Excel binary workbook stream
//!
//! This library decodes and re-encodes the framed record stream used by
//! the legacy Excel binary format (BIFF8): the `[sid][length][payload]`
//! units every workbook stream is built from, including the CONTINUE
//! chains that carry payloads past the 8224-byte frame limit.
//!
//! # Features
//!
//! - **Frame codec**: bounds-checked reading/writing of the 4-byte record
//!   header and payload framing
//! - **Continuation assembly**: transparent reassembly of multi-frame
//!   logical records, and the mirror splitting on the write side
//! - **Typed records**: one codec per record kind, dispatched through a
//!   compile-time sid table, with an opaque lossless fallback for
//!   unrecognized kinds
//! - **String sub-codec**: compressed and UTF-16LE character runs,
//!   codepage-aware, surviving splits at frame boundaries
//!
//! Interpreting what the records *mean* (sheets, cells, formulas) is the
//! caller's concern; this layer owns only their binary shape.
//!
//! # Example - Decoding a record stream
//!
//! ```
//! use longan::{DecodeContext, Record, RecordReader};
//! use longan::records::NumberRecord;
//!
//! let cell = Record::Number(NumberRecord {
//!     row: 0,
//!     col: 2,
//!     xf_index: 15,
//!     value: 1234.5,
//! });
//! let wire = cell.encode();
//! assert_eq!(wire.len(), cell.record_size());
//!
//! let mut reader = RecordReader::new(wire, DecodeContext::default());
//! let decoded = reader.next_record().unwrap().unwrap();
//! assert_eq!(decoded, cell);
//! ```
//!
//! # Example - Pre-classifying records without decoding
//!
//! ```
//! use longan::{DecodeContext, RecordReader, registry};
//!
//! let wire = vec![0x0A, 0x00, 0x00, 0x00]; // an EOF frame
//! let mut reader = RecordReader::new(wire, DecodeContext::default());
//! while let Some(raw) = reader.next_raw() {
//!     let raw = raw.unwrap();
//!     assert_eq!(registry::record_name(raw.sid), Some("EOF"));
//! }
//! ```

/// Constants for the record stream: sids, frame limits
pub mod consts;

/// Caller-supplied decode context (BIFF version, codepage)
pub mod context;

/// Logical-record assembly across CONTINUE frames and the write-side
/// splitter
pub mod continuation;

/// Little-endian read/write cursors over record payloads
pub mod cursor;

/// Error types
pub mod error;

/// Physical frame header codec
pub mod frame;

/// Typed record representations
pub mod records;

/// The sid-to-codec dispatch table
pub mod registry;

/// String sub-codecs (compressed / UTF-16LE, codepage handling)
pub mod strings;

// Re-export the types most callers touch
pub use context::{BiffVersion, DecodeContext};
pub use continuation::{ContinuationWriter, RawRecord, RecordReader};
pub use cursor::{ReadCursor, WriteCursor};
pub use error::{BiffError, BiffResult};
pub use frame::{Frame, FrameHeader, FrameReader};
pub use records::Record;
