//! Cell-value records and their field sub-codecs.

use super::RecordCodec;
use crate::consts::{
    CACHED_BOOLEAN, CACHED_EMPTY, CACHED_ERROR, CACHED_STRING, SID_BLANK, SID_BOOLERR,
    SID_FORMULA, SID_LABEL, SID_LABELSST, SID_MULBLANK, SID_MULRK, SID_NUMBER, SID_RK,
    SID_SHAREDFMLA, SID_STRING,
};
use crate::context::DecodeContext;
use crate::continuation::ContinuationWriter;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{BiffError, BiffResult};
use crate::strings;
use bitflags::bitflags;

/// The fixed set of legal spreadsheet error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// #NULL!
    Null = 0x00,
    /// #DIV/0!
    Div0 = 0x07,
    /// #VALUE!
    Value = 0x0F,
    /// #REF!
    Ref = 0x17,
    /// #NAME?
    Name = 0x1D,
    /// #NUM!
    Num = 0x24,
    /// #N/A
    NotAvailable = 0x2A,
}

impl ErrorCode {
    /// Map a wire byte to an error code; anything outside the fixed set is
    /// a domain violation, never coerced.
    pub fn from_code(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(ErrorCode::Null),
            0x07 => Some(ErrorCode::Div0),
            0x0F => Some(ErrorCode::Value),
            0x17 => Some(ErrorCode::Ref),
            0x1D => Some(ErrorCode::Name),
            0x24 => Some(ErrorCode::Num),
            0x2A => Some(ErrorCode::NotAvailable),
            _ => None,
        }
    }
}

/// An RK value: a 30-bit compressed number with two tag bits.
///
/// Bit 1 (fInt) selects the shifted two-complement integer interpretation
/// over the IEEE one; bit 0 (fX100) divides the result by 100. The raw
/// encoding is retained so a decoded cell re-encodes to the exact
/// original bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RkNumber(pub u32);

impl RkNumber {
    /// Numeric value this RK encodes.
    pub fn value(&self) -> f64 {
        let raw = self.0;
        let mut value = if raw & 0x02 != 0 {
            ((raw as i32) >> 2) as f64
        } else {
            // The RK carries the high 30 bits of an IEEE double
            f64::from_bits(((raw & 0xFFFF_FFFC) as u64) << 32)
        };
        if raw & 0x01 != 0 {
            value /= 100.0;
        }
        value
    }
}

/// An inclusive row/column rectangle with 8-bit column bounds.
///
/// Records that relate to a region of the sheet (a shared formula applying
/// to several cells) carry this by value; the relation is never a pointer
/// to another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u8,
    pub last_col: u8,
}

impl CellRange {
    fn decode(cur: &mut ReadCursor<'_>) -> BiffResult<Self> {
        Ok(CellRange {
            first_row: cur.read_u16()?,
            last_row: cur.read_u16()?,
            first_col: cur.read_u8()?,
            last_col: cur.read_u8()?,
        })
    }

    fn write(&self, out: &mut WriteCursor) {
        out.write_u16(self.first_row);
        out.write_u16(self.last_row);
        out.write_u8(self.first_col);
        out.write_u8(self.last_col);
    }
}

/// BLANK record (an empty cell that carries formatting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlankRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
}

impl RecordCodec for BlankRecord {
    const SID: u16 = SID_BLANK;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(BlankRecord {
            row: cur.read_u16()?,
            col: cur.read_u16()?,
            xf_index: cur.read_u16()?,
        })
    }

    fn payload_size(&self) -> usize {
        6
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.col);
        out.write_u16(self.xf_index);
    }
}

/// NUMBER record (IEEE double cell)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
    pub value: f64,
}

impl RecordCodec for NumberRecord {
    const SID: u16 = SID_NUMBER;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(NumberRecord {
            row: cur.read_u16()?,
            col: cur.read_u16()?,
            xf_index: cur.read_u16()?,
            value: cur.read_f64()?,
        })
    }

    fn payload_size(&self) -> usize {
        14
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.col);
        out.write_u16(self.xf_index);
        out.write_f64(self.value);
    }
}

/// LABEL record (inline string cell)
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
    pub value: String,
}

impl RecordCodec for LabelRecord {
    const SID: u16 = SID_LABEL;

    fn decode(cur: &mut ReadCursor<'_>, ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(LabelRecord {
            row: cur.read_u16()?,
            col: cur.read_u16()?,
            xf_index: cur.read_u16()?,
            value: strings::read_label_string(cur, ctx)?,
        })
    }

    fn payload_size(&self) -> usize {
        6 + strings::unicode_string_size(&self.value)
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.col);
        out.write_u16(self.xf_index);
        strings::write_unicode_string(out, &self.value);
    }
}

/// Value carried by a BOOLERR cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOrError {
    Bool(bool),
    Error(ErrorCode),
}

/// BOOLERR record (boolean or error cell)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolErrRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
    pub value: BoolOrError,
}

impl RecordCodec for BoolErrRecord {
    const SID: u16 = SID_BOOLERR;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let row = cur.read_u16()?;
        let col = cur.read_u16()?;
        let xf_index = cur.read_u16()?;
        let raw = cur.read_u8()?;
        let is_error = cur.read_u8()?;
        let value = match is_error {
            0 => BoolOrError::Bool(raw != 0),
            1 => BoolOrError::Error(ErrorCode::from_code(raw).ok_or(
                BiffError::InvalidFieldValue {
                    sid: SID_BOOLERR,
                    field: "error code",
                    value: raw as u32,
                },
            )?),
            v => {
                return Err(BiffError::InvalidFieldValue {
                    sid: SID_BOOLERR,
                    field: "error flag",
                    value: v as u32,
                });
            }
        };
        Ok(BoolErrRecord {
            row,
            col,
            xf_index,
            value,
        })
    }

    fn payload_size(&self) -> usize {
        8
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.col);
        out.write_u16(self.xf_index);
        match self.value {
            BoolOrError::Bool(b) => {
                out.write_u8(b as u8);
                out.write_u8(0);
            }
            BoolOrError::Error(code) => {
                out.write_u8(code as u8);
                out.write_u8(1);
            }
        }
    }
}

/// RK record (single compressed-number cell)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RkRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
    pub rk: RkNumber,
}

impl RecordCodec for RkRecord {
    const SID: u16 = SID_RK;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(RkRecord {
            row: cur.read_u16()?,
            col: cur.read_u16()?,
            xf_index: cur.read_u16()?,
            rk: RkNumber(cur.read_u32()?),
        })
    }

    fn payload_size(&self) -> usize {
        10
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.col);
        out.write_u16(self.xf_index);
        out.write_u32(self.rk.0);
    }
}

/// One cell of a MULRK run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RkCell {
    pub xf_index: u16,
    pub rk: RkNumber,
}

/// MULRK record (a horizontal run of RK cells in one row)
///
/// The cell array carries no count field; its length is implied by the
/// payload bytes remaining between the leading fields and the trailing
/// last-column field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulRkRecord {
    pub row: u16,
    pub first_col: u16,
    pub cells: Vec<RkCell>,
}

impl MulRkRecord {
    /// Column of the run's last cell.
    pub fn last_col(&self) -> u16 {
        self.first_col + self.cells.len().saturating_sub(1) as u16
    }
}

impl RecordCodec for MulRkRecord {
    const SID: u16 = SID_MULRK;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let row = cur.read_u16()?;
        let first_col = cur.read_u16()?;
        let array_bytes = cur.remaining().saturating_sub(2);
        if array_bytes % 6 != 0 || array_bytes == 0 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_MULRK,
                field: "payload length",
                value: cur.remaining() as u32,
            });
        }
        let count = array_bytes / 6;
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            cells.push(RkCell {
                xf_index: cur.read_u16()?,
                rk: RkNumber(cur.read_u32()?),
            });
        }
        let last_col = cur.read_u16()?;
        let rec = MulRkRecord {
            row,
            first_col,
            cells,
        };
        if last_col != rec.last_col() {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_MULRK,
                field: "last column",
                value: last_col as u32,
            });
        }
        Ok(rec)
    }

    fn payload_size(&self) -> usize {
        6 + self.cells.len() * 6
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.first_col);
        for cell in &self.cells {
            out.write_u16(cell.xf_index);
            out.write_u32(cell.rk.0);
        }
        out.write_u16(self.last_col());
    }
}

/// MULBLANK record (a horizontal run of blank cells in one row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulBlankRecord {
    pub row: u16,
    pub first_col: u16,
    pub xf_indexes: Vec<u16>,
}

impl MulBlankRecord {
    pub fn last_col(&self) -> u16 {
        self.first_col + self.xf_indexes.len().saturating_sub(1) as u16
    }
}

impl RecordCodec for MulBlankRecord {
    const SID: u16 = SID_MULBLANK;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let row = cur.read_u16()?;
        let first_col = cur.read_u16()?;
        let array_bytes = cur.remaining().saturating_sub(2);
        if array_bytes % 2 != 0 || array_bytes == 0 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_MULBLANK,
                field: "payload length",
                value: cur.remaining() as u32,
            });
        }
        let count = array_bytes / 2;
        let mut xf_indexes = Vec::with_capacity(count);
        for _ in 0..count {
            xf_indexes.push(cur.read_u16()?);
        }
        let last_col = cur.read_u16()?;
        let rec = MulBlankRecord {
            row,
            first_col,
            xf_indexes,
        };
        if last_col != rec.last_col() {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_MULBLANK,
                field: "last column",
                value: last_col as u32,
            });
        }
        Ok(rec)
    }

    fn payload_size(&self) -> usize {
        6 + self.xf_indexes.len() * 2
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.first_col);
        for xf in &self.xf_indexes {
            out.write_u16(*xf);
        }
        out.write_u16(self.last_col());
    }
}

/// LABELSST record (cell referencing the shared string table by index)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSstRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
    pub sst_index: u32,
}

impl RecordCodec for LabelSstRecord {
    const SID: u16 = SID_LABELSST;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        Ok(LabelSstRecord {
            row: cur.read_u16()?,
            col: cur.read_u16()?,
            xf_index: cur.read_u16()?,
            sst_index: cur.read_u32()?,
        })
    }

    fn payload_size(&self) -> usize {
        10
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.col);
        out.write_u16(self.xf_index);
        out.write_u32(self.sst_index);
    }
}

bitflags! {
    /// FORMULA record option flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormulaOptions: u16 {
        /// Recalculate on every recalculation pass
        const ALWAYS_CALC = 0x0001;
        /// Recalculate when the file is opened
        const CALC_ON_LOAD = 0x0002;
        /// Part of a shared formula group
        const SHARED = 0x0008;
    }
}

/// Cached result stored inline in a FORMULA record.
///
/// A numeric result is the plain IEEE double. Every other kind is encoded
/// as a tagged 8-byte value whose last two bytes are 0xFFFF, a bit pattern
/// no legal double uses here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CachedValue {
    Number(f64),
    /// The string result follows in a STRING record
    String,
    Bool(bool),
    Error(ErrorCode),
    /// Empty string result
    Empty,
}

impl CachedValue {
    fn decode(cur: &mut ReadCursor<'_>) -> BiffResult<Self> {
        let raw = cur.read_u64()?;
        if raw >> 48 != 0xFFFF {
            return Ok(CachedValue::Number(f64::from_bits(raw)));
        }
        let tag = (raw & 0xFF) as u8;
        let data = ((raw >> 16) & 0xFF) as u8;
        match tag {
            CACHED_STRING => Ok(CachedValue::String),
            CACHED_BOOLEAN => Ok(CachedValue::Bool(data != 0)),
            CACHED_ERROR => {
                ErrorCode::from_code(data)
                    .map(CachedValue::Error)
                    .ok_or(BiffError::InvalidFieldValue {
                        sid: SID_FORMULA,
                        field: "cached error code",
                        value: data as u32,
                    })
            }
            CACHED_EMPTY => Ok(CachedValue::Empty),
            t => Err(BiffError::InvalidFieldValue {
                sid: SID_FORMULA,
                field: "cached value tag",
                value: t as u32,
            }),
        }
    }

    fn write(&self, out: &mut WriteCursor) {
        let special = |tag: u8, data: u8| -> u64 {
            (tag as u64) | ((data as u64) << 16) | (0xFFFFu64 << 48)
        };
        match self {
            CachedValue::Number(v) => out.write_u64(v.to_bits()),
            CachedValue::String => out.write_u64(special(CACHED_STRING, 0)),
            CachedValue::Bool(b) => out.write_u64(special(CACHED_BOOLEAN, *b as u8)),
            CachedValue::Error(code) => out.write_u64(special(CACHED_ERROR, *code as u8)),
            CachedValue::Empty => out.write_u64(special(CACHED_EMPTY, 0)),
        }
    }
}

/// FORMULA record.
///
/// The expression tokens are opaque to this layer; they are carried as the
/// token run (rgce) plus the trailing constant block (rgcb) and round-trip
/// byte-exact.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaRecord {
    pub row: u16,
    pub col: u16,
    pub xf_index: u16,
    pub cached_value: CachedValue,
    pub options: FormulaOptions,
    /// Reserved calculation chain field, preserved verbatim
    pub chn: u32,
    /// Parsed expression tokens (rgce)
    pub tokens: Vec<u8>,
    /// Trailing constant data for array/string operands (rgcb)
    pub aux_data: Vec<u8>,
}

impl RecordCodec for FormulaRecord {
    const SID: u16 = SID_FORMULA;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let row = cur.read_u16()?;
        let col = cur.read_u16()?;
        let xf_index = cur.read_u16()?;
        let cached_value = CachedValue::decode(cur)?;
        let options = FormulaOptions::from_bits_retain(cur.read_u16()?);
        let chn = cur.read_u32()?;
        let token_len = cur.read_u16()? as usize;
        let tokens = cur.read_bytes(token_len)?.to_vec();
        let aux_data = cur.read_bytes(cur.remaining())?.to_vec();
        Ok(FormulaRecord {
            row,
            col,
            xf_index,
            cached_value,
            options,
            chn,
            tokens,
            aux_data,
        })
    }

    fn payload_size(&self) -> usize {
        22 + self.tokens.len() + self.aux_data.len()
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        out.write_u16(self.row);
        out.write_u16(self.col);
        out.write_u16(self.xf_index);
        self.cached_value.write(out);
        out.write_u16(self.options.bits());
        out.write_u32(self.chn);
        out.write_u16(self.tokens.len() as u16);
        out.write_bytes(&self.tokens);
        out.write_bytes(&self.aux_data);
    }
}

/// STRING record: the cached string result of the preceding FORMULA.
///
/// The only cell-level record whose payload can outgrow one frame, so it
/// frames itself through the continuation writer instead of the byte-wise
/// splitter; a character run interrupted at a frame boundary resumes
/// behind a re-emitted grbit byte.
#[derive(Debug, Clone, PartialEq)]
pub struct StringRecord {
    pub text: String,
}

impl StringRecord {
    pub(crate) fn decode(
        cur: &mut ReadCursor<'_>,
        boundaries: &[usize],
        ctx: &DecodeContext,
    ) -> BiffResult<Self> {
        Ok(StringRecord {
            text: strings::read_unicode_string(cur, boundaries, ctx)?,
        })
    }

    /// Complete wire bytes, CONTINUE frames included.
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ContinuationWriter::new(SID_STRING);
        let wide = strings::is_wide(&self.text);
        let cch = self.text.encode_utf16().count().min(0xFFFF) as u16;
        let mut header = [0u8; 3];
        header[..2].copy_from_slice(&cch.to_le_bytes());
        header[2] = wide as u8;
        writer.write_atomic(&header);
        strings::write_continued_chars(&mut writer, &self.text, wide);
        writer.finish()
    }

    /// Exact length of [`encode`](StringRecord::encode)'s output, measured
    /// through the same serialization path.
    pub fn record_size(&self) -> usize {
        self.encode().len()
    }
}

/// SHAREDFMLA record: one formula expression shared by a range of cells.
///
/// The member cells refer to this definition through their position inside
/// [`range`](SharedFormulaRecord::range); the relation is a value-copied
/// rectangle, never a link to the member records.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedFormulaRecord {
    pub range: CellRange,
    /// Reserved byte, preserved verbatim
    pub reserved: u8,
    /// Number of cells using this formula
    pub use_count: u8,
    /// Parsed expression tokens (rgce)
    pub tokens: Vec<u8>,
    /// Trailing constant data (rgcb)
    pub aux_data: Vec<u8>,
}

impl RecordCodec for SharedFormulaRecord {
    const SID: u16 = SID_SHAREDFMLA;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let range = CellRange::decode(cur)?;
        let reserved = cur.read_u8()?;
        let use_count = cur.read_u8()?;
        let token_len = cur.read_u16()? as usize;
        let tokens = cur.read_bytes(token_len)?.to_vec();
        let aux_data = cur.read_bytes(cur.remaining())?.to_vec();
        Ok(SharedFormulaRecord {
            range,
            reserved,
            use_count,
            tokens,
            aux_data,
        })
    }

    fn payload_size(&self) -> usize {
        10 + self.tokens.len() + self.aux_data.len()
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        self.range.write(out);
        out.write_u8(self.reserved);
        out.write_u8(self.use_count);
        out.write_u16(self.tokens.len() as u16);
        out.write_bytes(&self.tokens);
        out.write_bytes(&self.aux_data);
    }
}
