//! Caller-supplied decode context.
//!
//! The codec layer does not own cross-record state. The BIFF version and the
//! codepage for single-byte strings are discovered by the caller (from the
//! BOF and CODEPAGE records of the stream being read) and passed in here.

/// BIFF versions supported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiffVersion {
    Biff2 = 0x0200,
    Biff3 = 0x0300,
    Biff4 = 0x0400,
    Biff5 = 0x0500,
    Biff8 = 0x0600,
}

impl BiffVersion {
    /// Map the version field of a BOF record to a known BIFF version.
    pub fn from_bof_version(version: u16) -> Option<Self> {
        match version {
            0x0200 | 0x0002 | 0x0007 => Some(BiffVersion::Biff2),
            0x0300 => Some(BiffVersion::Biff3),
            0x0400 => Some(BiffVersion::Biff4),
            0x0500 => Some(BiffVersion::Biff5),
            0x0600 => Some(BiffVersion::Biff8),
            _ => None,
        }
    }

    /// Whether string fields carry the 1-byte grbit selecting the
    /// character width. Earlier versions always store single-byte text.
    pub fn supports_unicode(&self) -> bool {
        matches!(self, BiffVersion::Biff8)
    }
}

/// Cross-record context supplied by the caller for decoding.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext {
    /// Version of the stream being decoded; selects field widths for
    /// version-dependent record layouts
    pub biff_version: BiffVersion,
    /// Windows codepage used for single-byte character runs
    pub codepage: u16,
}

impl Default for DecodeContext {
    fn default() -> Self {
        DecodeContext {
            biff_version: BiffVersion::Biff8,
            codepage: 1252,
        }
    }
}
