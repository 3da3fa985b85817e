//! Stream-level records: section markers, codepage and directory entries.

use super::RecordCodec;
use crate::consts::{
    SID_BOF, SID_BOUNDSHEET, SID_CODEPAGE, SID_DATE1904, SID_DIMENSIONS, SID_EOF,
    SID_INTERFACEEND, SID_INTERFACEHDR,
};
use crate::context::{BiffVersion, DecodeContext};
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{BiffError, BiffResult};
use crate::strings;

/// Substream types a BOF record can open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    WorkbookGlobals = 0x0005,
    VbModule = 0x0006,
    Worksheet = 0x0010,
    Chart = 0x0020,
    MacroSheet = 0x0040,
    Workspace = 0x0100,
}

impl StreamType {
    fn from_u16(value: u16) -> BiffResult<Self> {
        match value {
            0x0005 => Ok(StreamType::WorkbookGlobals),
            0x0006 => Ok(StreamType::VbModule),
            0x0010 => Ok(StreamType::Worksheet),
            0x0020 => Ok(StreamType::Chart),
            0x0040 => Ok(StreamType::MacroSheet),
            0x0100 => Ok(StreamType::Workspace),
            v => Err(BiffError::InvalidFieldValue {
                sid: SID_BOF,
                field: "stream type",
                value: v as u32,
            }),
        }
    }
}

/// BOF (Beginning of File) record
#[derive(Debug, Clone, PartialEq)]
pub struct BofRecord {
    /// Raw version field; see [`BofRecord::biff_version`]
    pub version: u16,
    pub stream_type: StreamType,
    /// Build identifier of the writing application
    pub build: u16,
    /// Build year of the writing application
    pub build_year: u16,
    /// File history flags
    pub history_flags: u32,
    /// Lowest version that can read all records in this stream
    pub lowest_version: u32,
}

impl BofRecord {
    /// BIFF version this stream is written in, if recognized.
    pub fn biff_version(&self) -> Option<BiffVersion> {
        BiffVersion::from_bof_version(self.version)
    }
}

impl RecordCodec for BofRecord {
    const SID: u16 = SID_BOF;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(BofRecord {
            version: cur.read_u16()?,
            stream_type: StreamType::from_u16(cur.read_u16()?)?,
            build: cur.read_u16()?,
            build_year: cur.read_u16()?,
            history_flags: cur.read_u32()?,
            lowest_version: cur.read_u32()?,
        })
    }

    fn payload_size(&self) -> usize {
        16
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.version);
        out.write_u16(self.stream_type as u16);
        out.write_u16(self.build);
        out.write_u16(self.build_year);
        out.write_u32(self.history_flags);
        out.write_u32(self.lowest_version);
    }
}

/// EOF record; terminates the substream opened by the matching BOF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EofRecord;

impl RecordCodec for EofRecord {
    const SID: u16 = SID_EOF;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        if cur.remaining() != 0 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_EOF,
                field: "payload length",
                value: cur.remaining() as u32,
            });
        }
        Ok(EofRecord)
    }

    fn payload_size(&self) -> usize {
        0
    }

    fn write_payload(&self, _out: &mut WriteCursor) {}
}

/// INTERFACEHDR record; carries the codepage of the writing application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceHdrRecord {
    pub codepage: u16,
}

impl RecordCodec for InterfaceHdrRecord {
    const SID: u16 = SID_INTERFACEHDR;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(InterfaceHdrRecord {
            codepage: cur.read_u16()?,
        })
    }

    fn payload_size(&self) -> usize {
        2
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.codepage);
    }
}

/// INTERFACEEND marker record.
///
/// Its sid is dual-purpose: buggy producers write an interface *header*
/// body under it. The registry disambiguates by payload length, so this
/// codec only ever sees the zero-byte form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceEndRecord;

impl RecordCodec for InterfaceEndRecord {
    const SID: u16 = SID_INTERFACEEND;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        if cur.remaining() != 0 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_INTERFACEEND,
                field: "payload length",
                value: cur.remaining() as u32,
            });
        }
        Ok(InterfaceEndRecord)
    }

    fn payload_size(&self) -> usize {
        0
    }

    fn write_payload(&self, _out: &mut WriteCursor) {}
}

/// CODEPAGE record; selects the encoding of single-byte strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodepageRecord {
    pub codepage: u16,
}

impl RecordCodec for CodepageRecord {
    const SID: u16 = SID_CODEPAGE;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(CodepageRecord {
            codepage: cur.read_u16()?,
        })
    }

    fn payload_size(&self) -> usize {
        2
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.codepage);
    }
}

/// DATE1904 record; selects the epoch of serial date values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date1904Record {
    pub is_1904: bool,
}

impl RecordCodec for Date1904Record {
    const SID: u16 = SID_DATE1904;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let flag = cur.read_u16()?;
        if flag > 1 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_DATE1904,
                field: "date system flag",
                value: flag as u32,
            });
        }
        Ok(Date1904Record { is_1904: flag == 1 })
    }

    fn payload_size(&self) -> usize {
        2
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.is_1904 as u16);
    }
}

/// DIMENSIONS record (used cell area of a sheet)
///
/// Two layouts exist on the wire: the 10-byte form with 16-bit row
/// indices and the 14-byte form with 32-bit rows. The payload length
/// discriminates; encoding always produces the wide form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionsRecord {
    pub first_row: u32,
    /// One past the last used row
    pub last_row: u32,
    pub first_col: u16,
    /// One past the last used column
    pub last_col: u16,
}

impl RecordCodec for DimensionsRecord {
    const SID: u16 = SID_DIMENSIONS;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let rec = match cur.remaining() {
            10 => DimensionsRecord {
                first_row: cur.read_u16()? as u32,
                last_row: cur.read_u16()? as u32,
                first_col: cur.read_u16()?,
                last_col: cur.read_u16()?,
            },
            14 => DimensionsRecord {
                first_row: cur.read_u32()?,
                last_row: cur.read_u32()?,
                first_col: cur.read_u16()?,
                last_col: cur.read_u16()?,
            },
            n => {
                return Err(BiffError::InvalidFieldValue {
                    sid: SID_DIMENSIONS,
                    field: "payload length",
                    value: n as u32,
                });
            }
        };
        cur.skip(2)?; // reserved
        Ok(rec)
    }

    fn payload_size(&self) -> usize {
        14
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u32(self.first_row);
        out.write_u32(self.last_row);
        out.write_u16(self.first_col);
        out.write_u16(self.last_col);
        out.write_u16(0); // reserved
    }
}

/// Sheet visibility states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetVisibility {
    Visible = 0x00,
    Hidden = 0x01,
    VeryHidden = 0x02,
}

impl SheetVisibility {
    fn from_u8(value: u8) -> BiffResult<Self> {
        match value & 0x3 {
            0x00 => Ok(SheetVisibility::Visible),
            0x01 => Ok(SheetVisibility::Hidden),
            0x02 => Ok(SheetVisibility::VeryHidden),
            v => Err(BiffError::InvalidFieldValue {
                sid: SID_BOUNDSHEET,
                field: "visibility",
                value: v as u32,
            }),
        }
    }
}

/// Sheet substream kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Worksheet = 0x00,
    MacroSheet = 0x01,
    ChartSheet = 0x02,
    VbModule = 0x06,
}

impl SheetKind {
    fn from_u8(value: u8) -> BiffResult<Self> {
        match value {
            0x00 => Ok(SheetKind::Worksheet),
            0x01 => Ok(SheetKind::MacroSheet),
            0x02 => Ok(SheetKind::ChartSheet),
            0x06 => Ok(SheetKind::VbModule),
            v => Err(BiffError::InvalidFieldValue {
                sid: SID_BOUNDSHEET,
                field: "sheet kind",
                value: v as u32,
            }),
        }
    }
}

/// BOUNDSHEET record (one workbook directory entry per sheet)
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSheetRecord {
    /// Absolute stream position of the sheet's BOF record
    pub bof_position: u32,
    pub visibility: SheetVisibility,
    pub kind: SheetKind,
    pub name: String,
}

impl RecordCodec for BoundSheetRecord {
    const SID: u16 = SID_BOUNDSHEET;

    fn decode(cur: &mut ReadCursor<'_>, ctx: &DecodeContext) -> BiffResult<Self> {
        let bof_position = cur.read_u32()?;
        let visibility = SheetVisibility::from_u8(cur.read_u8()?)?;
        let kind = SheetKind::from_u8(cur.read_u8()?)?;
        let name = strings::read_short_string(cur, ctx)?;
        Ok(BoundSheetRecord {
            bof_position,
            visibility,
            kind,
            name,
        })
    }

    fn payload_size(&self) -> usize {
        6 + strings::short_string_size(&self.name)
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u32(self.bof_position);
        out.write_u8(self.visibility as u8);
        out.write_u8(self.kind as u8);
        strings::write_short_string(out, &self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DecodeContext {
        DecodeContext::default()
    }

    fn payload_round_trip<R: RecordCodec + PartialEq + std::fmt::Debug>(rec: &R) {
        let mut out = WriteCursor::new();
        rec.write_payload(&mut out);
        assert_eq!(out.len(), rec.payload_size());
        let buf = out.into_bytes();
        let mut cur = ReadCursor::new(&buf);
        let back = R::decode(&mut cur, &ctx()).unwrap();
        assert_eq!(&back, rec);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn test_bof_round_trip() {
        let rec = BofRecord {
            version: 0x0600,
            stream_type: StreamType::WorkbookGlobals,
            build: 0x0DBB,
            build_year: 1996,
            history_flags: 0x000000C1,
            lowest_version: 0x00000306,
        };
        payload_round_trip(&rec);
        assert_eq!(rec.biff_version(), Some(BiffVersion::Biff8));
        assert_eq!(rec.framed_size(), 4 + 16);
    }

    #[test]
    fn test_bof_rejects_unknown_stream_type() {
        let mut out = WriteCursor::new();
        out.write_u16(0x0600);
        out.write_u16(0x0099);
        out.write_bytes(&[0u8; 12]);
        let buf = out.into_bytes();
        let mut cur = ReadCursor::new(&buf);
        assert!(matches!(
            BofRecord::decode(&mut cur, &ctx()),
            Err(BiffError::InvalidFieldValue {
                sid: SID_BOF,
                field: "stream type",
                value: 0x99,
            })
        ));
    }

    #[test]
    fn test_eof_rejects_payload() {
        let buf = [0u8; 2];
        let mut cur = ReadCursor::new(&buf);
        assert!(EofRecord::decode(&mut cur, &ctx()).is_err());
    }

    #[test]
    fn test_date1904_validation() {
        let rec = Date1904Record { is_1904: true };
        payload_round_trip(&rec);

        let buf = [0x02, 0x00];
        let mut cur = ReadCursor::new(&buf);
        assert!(matches!(
            Date1904Record::decode(&mut cur, &ctx()),
            Err(BiffError::InvalidFieldValue {
                sid: SID_DATE1904,
                field: "date system flag",
                value: 2,
            })
        ));
    }

    #[test]
    fn test_dimensions_wide_round_trip() {
        payload_round_trip(&DimensionsRecord {
            first_row: 0,
            last_row: 65_536,
            first_col: 0,
            last_col: 256,
        });
    }

    #[test]
    fn test_dimensions_narrow_layout() {
        // 10-byte legacy form with 16-bit row indices
        let mut out = WriteCursor::new();
        out.write_u16(1);
        out.write_u16(100);
        out.write_u16(2);
        out.write_u16(8);
        out.write_u16(0);
        let buf = out.into_bytes();
        let mut cur = ReadCursor::new(&buf);
        let rec = DimensionsRecord::decode(&mut cur, &ctx()).unwrap();
        assert_eq!(rec.first_row, 1);
        assert_eq!(rec.last_row, 100);
        assert_eq!(rec.first_col, 2);
        assert_eq!(rec.last_col, 8);
    }

    #[test]
    fn test_dimensions_bad_length() {
        let buf = [0u8; 12];
        let mut cur = ReadCursor::new(&buf);
        assert!(matches!(
            DimensionsRecord::decode(&mut cur, &ctx()),
            Err(BiffError::InvalidFieldValue {
                sid: SID_DIMENSIONS,
                field: "payload length",
                value: 12,
            })
        ));
    }

    #[test]
    fn test_boundsheet_round_trip() {
        payload_round_trip(&BoundSheetRecord {
            bof_position: 0x0000_1234,
            visibility: SheetVisibility::Visible,
            kind: SheetKind::Worksheet,
            name: "Sheet1".to_string(),
        });
        payload_round_trip(&BoundSheetRecord {
            bof_position: 77,
            visibility: SheetVisibility::VeryHidden,
            kind: SheetKind::ChartSheet,
            name: "Umsätze".to_string(),
        });
    }

    #[test]
    fn test_boundsheet_rejects_bad_kind() {
        let mut out = WriteCursor::new();
        out.write_u32(0);
        out.write_u8(0x00);
        out.write_u8(0x05); // not a sheet kind
        out.write_bytes(&[1, 0, b'x']);
        let buf = out.into_bytes();
        let mut cur = ReadCursor::new(&buf);
        assert!(matches!(
            BoundSheetRecord::decode(&mut cur, &ctx()),
            Err(BiffError::InvalidFieldValue {
                sid: SID_BOUNDSHEET,
                field: "sheet kind",
                value: 5,
            })
        ));
    }
}
