//! Constants for the BIFF record stream.

/// Maximum number of payload bytes permitted in one physical record frame.
///
/// A logical record whose payload exceeds this limit is split across the
/// primary frame and one or more CONTINUE frames.
pub const MAX_FRAME_PAYLOAD: usize = 8224;

/// Size in bytes of the frame header (sid + length, both little-endian u16)
pub const FRAME_HEADER_SIZE: usize = 4;

/// Default number of shared strings per EXTSST bucket
pub const DEFAULT_EXTSST_BUCKET_SIZE: u16 = 8;

// Record type identifiers (sids)
/// Cell formula
pub const SID_FORMULA: u16 = 0x0006;
/// End of stream section
pub const SID_EOF: u16 = 0x000A;
/// 1904 date system flag
pub const SID_DATE1904: u16 = 0x0022;
/// Stream encryption header
pub const SID_FILEPASS: u16 = 0x002F;
/// Overflow payload carrier for the preceding record
pub const SID_CONTINUE: u16 = 0x003C;
/// Codepage for single-byte strings
pub const SID_CODEPAGE: u16 = 0x0042;
/// Embedded object descriptor (container of sub-records)
pub const SID_OBJ: u16 = 0x005D;
/// Sheet metadata in the workbook directory
pub const SID_BOUNDSHEET: u16 = 0x0085;
/// Multiple RK numbers in one row run
pub const SID_MULRK: u16 = 0x00BD;
/// Multiple blank cells in one row run
pub const SID_MULBLANK: u16 = 0x00BE;
/// Interface header (codepage of the writing application)
pub const SID_INTERFACEHDR: u16 = 0x00E1;
/// Interface end marker; buggy producers also write header bodies under it
pub const SID_INTERFACEEND: u16 = 0x00E2;
/// Shared string table
pub const SID_SST: u16 = 0x00FC;
/// Cell referencing the shared string table
pub const SID_LABELSST: u16 = 0x00FD;
/// Shared string table index
pub const SID_EXTSST: u16 = 0x00FF;
/// Used cell area of a sheet
pub const SID_DIMENSIONS: u16 = 0x0200;
/// Empty cell
pub const SID_BLANK: u16 = 0x0201;
/// IEEE number cell
pub const SID_NUMBER: u16 = 0x0203;
/// Inline string cell
pub const SID_LABEL: u16 = 0x0204;
/// Boolean or error cell
pub const SID_BOOLERR: u16 = 0x0205;
/// Cached string result of the preceding formula
pub const SID_STRING: u16 = 0x0207;
/// RK compressed number cell
pub const SID_RK: u16 = 0x027E;
/// Shared formula definition for a cell range
pub const SID_SHAREDFMLA: u16 = 0x04BC;
/// Beginning of stream section
pub const SID_BOF: u16 = 0x0809;

// FORMULA cached-value type tags (first byte of the special 8-byte value)
/// Cached value is a string carried by the following STRING record
pub const CACHED_STRING: u8 = 0;
/// Cached value is a boolean
pub const CACHED_BOOLEAN: u8 = 1;
/// Cached value is an error code
pub const CACHED_ERROR: u8 = 2;
/// Cached value is the empty string
pub const CACHED_EMPTY: u8 = 3;

// Sub-record type identifiers inside an OBJ record
/// Common object data, always the first sub-record
pub const FT_CMO: u16 = 0x0015;
/// Terminating sub-record
pub const FT_END: u16 = 0x0000;
