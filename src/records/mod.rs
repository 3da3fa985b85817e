//! Typed record representations and their codecs.
//!
//! Each record kind is a plain struct that knows its own payload layout;
//! [`Record`] is the sum of all of them. The shared framing logic (frame
//! headers, continuation splitting, size accounting) lives here and in the
//! [`continuation`](crate::continuation) module, one generic layer above
//! the per-kind field codecs.

mod cells;
mod control;
mod obj;
mod sst;
mod unknown;

pub use cells::{
    BlankRecord, BoolErrRecord, BoolOrError, CellRange, ErrorCode, FormulaOptions, FormulaRecord,
    CachedValue, LabelRecord, LabelSstRecord, MulBlankRecord, MulRkRecord, NumberRecord, RkCell,
    RkNumber, RkRecord, SharedFormulaRecord, StringRecord,
};
pub use control::{
    BofRecord, BoundSheetRecord, CodepageRecord, Date1904Record, DimensionsRecord, EofRecord,
    InterfaceEndRecord, InterfaceHdrRecord, SheetKind, SheetVisibility, StreamType,
};
pub use obj::{CommonObjectData, ObjRecord, SubRecord, UnknownSubRecord};
pub use sst::{ExtSstInfo, ExtSstRecord, SstRecord, SstSerialized};
pub use unknown::UnknownRecord;

use crate::consts::{FRAME_HEADER_SIZE, MAX_FRAME_PAYLOAD};
use crate::context::DecodeContext;
use crate::continuation::write_record_frames;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::BiffResult;

/// Per-kind codec contract for records whose payload is written in one
/// piece and split purely byte-wise when oversized. Records with
/// item-level continuation accounting (the shared string table, the cached
/// formula string) implement their framing directly instead.
pub(crate) trait RecordCodec: Sized {
    /// Type identifier this codec owns.
    const SID: u16;

    /// Parse the payload into typed fields.
    fn decode(cur: &mut ReadCursor<'_>, ctx: &DecodeContext) -> BiffResult<Self>;

    /// Exact payload byte count [`write_payload`](Self::write_payload)
    /// produces.
    fn payload_size(&self) -> usize;

    /// Serialize the typed fields back into payload bytes.
    fn write_payload(&self, out: &mut WriteCursor);

    /// Complete wire bytes: frame header(s) plus payload.
    fn encode_framed(&self) -> Vec<u8> {
        let mut out = WriteCursor::with_capacity(self.payload_size());
        self.write_payload(&mut out);
        write_record_frames(Self::SID, out.as_slice())
    }

    /// Exact length of [`encode_framed`](Self::encode_framed)'s output.
    fn framed_size(&self) -> usize {
        framed_size_for_payload(self.payload_size())
    }
}

/// Wire size of a payload split into frames: the payload itself plus one
/// header per frame. An empty payload still occupies one (empty) frame.
pub(crate) fn framed_size_for_payload(payload: usize) -> usize {
    let frames = if payload == 0 {
        1
    } else {
        payload.div_ceil(MAX_FRAME_PAYLOAD)
    };
    payload + frames * FRAME_HEADER_SIZE
}

/// A fully decoded logical record.
///
/// Cloning is a deep field-wise copy; no two records share mutable state.
/// Record kinds that relate to other records on the sheet (shared formulas
/// spanning a cell range) carry that relation as a value ([`CellRange`]),
/// never as a reference to another record instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Bof(BofRecord),
    Eof(EofRecord),
    InterfaceHdr(InterfaceHdrRecord),
    InterfaceEnd(InterfaceEndRecord),
    Codepage(CodepageRecord),
    Date1904(Date1904Record),
    Dimensions(DimensionsRecord),
    BoundSheet(BoundSheetRecord),
    Blank(BlankRecord),
    Number(NumberRecord),
    Label(LabelRecord),
    BoolErr(BoolErrRecord),
    Rk(RkRecord),
    MulRk(MulRkRecord),
    MulBlank(MulBlankRecord),
    LabelSst(LabelSstRecord),
    Formula(FormulaRecord),
    /// Cached string result of the preceding FORMULA record
    FormulaString(StringRecord),
    SharedFormula(SharedFormulaRecord),
    Sst(SstRecord),
    ExtSst(ExtSstRecord),
    Obj(ObjRecord),
    /// Opaque byte-preserving fallback for unregistered type identifiers
    Unknown(UnknownRecord),
}

impl Record {
    /// Type identifier of this record on the wire.
    pub fn sid(&self) -> u16 {
        match self {
            Record::Bof(_) => BofRecord::SID,
            Record::Eof(_) => EofRecord::SID,
            Record::InterfaceHdr(_) => InterfaceHdrRecord::SID,
            Record::InterfaceEnd(_) => InterfaceEndRecord::SID,
            Record::Codepage(_) => CodepageRecord::SID,
            Record::Date1904(_) => Date1904Record::SID,
            Record::Dimensions(_) => DimensionsRecord::SID,
            Record::BoundSheet(_) => BoundSheetRecord::SID,
            Record::Blank(_) => BlankRecord::SID,
            Record::Number(_) => NumberRecord::SID,
            Record::Label(_) => LabelRecord::SID,
            Record::BoolErr(_) => BoolErrRecord::SID,
            Record::Rk(_) => RkRecord::SID,
            Record::MulRk(_) => MulRkRecord::SID,
            Record::MulBlank(_) => MulBlankRecord::SID,
            Record::LabelSst(_) => LabelSstRecord::SID,
            Record::Formula(_) => FormulaRecord::SID,
            Record::FormulaString(_) => crate::consts::SID_STRING,
            Record::SharedFormula(_) => SharedFormulaRecord::SID,
            Record::Sst(_) => crate::consts::SID_SST,
            Record::ExtSst(_) => ExtSstRecord::SID,
            Record::Obj(_) => ObjRecord::SID,
            Record::Unknown(rec) => rec.sid,
        }
    }

    /// Serialize to complete wire bytes, continuation frames included
    /// where the payload demands them.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Record::Bof(rec) => rec.encode_framed(),
            Record::Eof(rec) => rec.encode_framed(),
            Record::InterfaceHdr(rec) => rec.encode_framed(),
            Record::InterfaceEnd(rec) => rec.encode_framed(),
            Record::Codepage(rec) => rec.encode_framed(),
            Record::Date1904(rec) => rec.encode_framed(),
            Record::Dimensions(rec) => rec.encode_framed(),
            Record::BoundSheet(rec) => rec.encode_framed(),
            Record::Blank(rec) => rec.encode_framed(),
            Record::Number(rec) => rec.encode_framed(),
            Record::Label(rec) => rec.encode_framed(),
            Record::BoolErr(rec) => rec.encode_framed(),
            Record::Rk(rec) => rec.encode_framed(),
            Record::MulRk(rec) => rec.encode_framed(),
            Record::MulBlank(rec) => rec.encode_framed(),
            Record::LabelSst(rec) => rec.encode_framed(),
            Record::Formula(rec) => rec.encode_framed(),
            Record::FormulaString(rec) => rec.encode(),
            Record::SharedFormula(rec) => rec.encode_framed(),
            Record::Sst(rec) => rec.encode(),
            Record::ExtSst(rec) => rec.encode_framed(),
            Record::Obj(rec) => rec.encode_framed(),
            Record::Unknown(rec) => rec.encode(),
        }
    }

    /// Exact length of [`encode`](Record::encode)'s output.
    pub fn record_size(&self) -> usize {
        match self {
            Record::Bof(rec) => rec.framed_size(),
            Record::Eof(rec) => rec.framed_size(),
            Record::InterfaceHdr(rec) => rec.framed_size(),
            Record::InterfaceEnd(rec) => rec.framed_size(),
            Record::Codepage(rec) => rec.framed_size(),
            Record::Date1904(rec) => rec.framed_size(),
            Record::Dimensions(rec) => rec.framed_size(),
            Record::BoundSheet(rec) => rec.framed_size(),
            Record::Blank(rec) => rec.framed_size(),
            Record::Number(rec) => rec.framed_size(),
            Record::Label(rec) => rec.framed_size(),
            Record::BoolErr(rec) => rec.framed_size(),
            Record::Rk(rec) => rec.framed_size(),
            Record::MulRk(rec) => rec.framed_size(),
            Record::MulBlank(rec) => rec.framed_size(),
            Record::LabelSst(rec) => rec.framed_size(),
            Record::Formula(rec) => rec.framed_size(),
            Record::FormulaString(rec) => rec.record_size(),
            Record::SharedFormula(rec) => rec.framed_size(),
            Record::Sst(rec) => rec.record_size(),
            Record::ExtSst(rec) => rec.framed_size(),
            Record::Obj(rec) => rec.framed_size(),
            Record::Unknown(rec) => rec.record_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::RecordReader;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::Bof(BofRecord {
                version: 0x0600,
                stream_type: StreamType::WorkbookGlobals,
                build: 0x0DBB,
                build_year: 1996,
                history_flags: 0xC1,
                lowest_version: 0x0600,
            }),
            Record::InterfaceHdr(InterfaceHdrRecord { codepage: 0x04B0 }),
            Record::InterfaceEnd(InterfaceEndRecord),
            Record::Codepage(CodepageRecord { codepage: 1252 }),
            Record::Date1904(Date1904Record { is_1904: false }),
            Record::Dimensions(DimensionsRecord {
                first_row: 0,
                last_row: 10,
                first_col: 0,
                last_col: 4,
            }),
            Record::BoundSheet(BoundSheetRecord {
                bof_position: 0x200,
                visibility: SheetVisibility::Visible,
                kind: SheetKind::Worksheet,
                name: "Sheet1".to_string(),
            }),
            Record::Blank(BlankRecord {
                row: 1,
                col: 1,
                xf_index: 15,
            }),
            Record::Number(NumberRecord {
                row: 1,
                col: 2,
                xf_index: 15,
                value: 2.5,
            }),
            Record::Label(LabelRecord {
                row: 1,
                col: 3,
                xf_index: 15,
                value: "inline".to_string(),
            }),
            Record::BoolErr(BoolErrRecord {
                row: 1,
                col: 4,
                xf_index: 15,
                value: BoolOrError::Error(ErrorCode::Ref),
            }),
            Record::Rk(RkRecord {
                row: 1,
                col: 5,
                xf_index: 15,
                rk: RkNumber((9 << 2) | 0x02),
            }),
            Record::MulRk(MulRkRecord {
                row: 2,
                first_col: 0,
                cells: vec![
                    RkCell {
                        xf_index: 15,
                        rk: RkNumber((1 << 2) | 0x02),
                    },
                    RkCell {
                        xf_index: 15,
                        rk: RkNumber((2 << 2) | 0x02),
                    },
                ],
            }),
            Record::MulBlank(MulBlankRecord {
                row: 3,
                first_col: 1,
                xf_indexes: vec![15, 16],
            }),
            Record::LabelSst(LabelSstRecord {
                row: 4,
                col: 0,
                xf_index: 15,
                sst_index: 1,
            }),
            Record::Formula(FormulaRecord {
                row: 5,
                col: 0,
                xf_index: 15,
                cached_value: CachedValue::Number(7.0),
                options: FormulaOptions::empty(),
                chn: 0,
                tokens: vec![0x1E, 0x07, 0x00],
                aux_data: Vec::new(),
            }),
            Record::FormulaString(StringRecord {
                text: "seven".to_string(),
            }),
            Record::SharedFormula(SharedFormulaRecord {
                range: CellRange {
                    first_row: 5,
                    last_row: 9,
                    first_col: 0,
                    last_col: 0,
                },
                reserved: 0,
                use_count: 5,
                tokens: vec![0x44, 0x00, 0x00, 0xC0],
                aux_data: Vec::new(),
            }),
            Record::Sst(SstRecord {
                total_used: 2,
                strings: vec!["one".to_string(), "two".to_string()],
            }),
            Record::ExtSst(ExtSstRecord {
                bucket_size: 8,
                buckets: vec![ExtSstInfo {
                    stream_position: 16,
                    frame_offset: 12,
                }],
            }),
            Record::Obj(ObjRecord {
                sub_records: vec![
                    SubRecord::CommonObjectData(CommonObjectData {
                        kind: 0x08,
                        object_id: 1,
                        option_flags: 0x6011,
                        reserved: [0; 12],
                    }),
                    SubRecord::End,
                ],
            }),
            Record::Unknown(UnknownRecord {
                sid: 0x7777,
                data: bytes::Bytes::from_static(&[0xAA, 0xBB]),
            }),
            Record::Eof(EofRecord),
        ]
    }

    #[test]
    fn test_size_law_holds_for_every_variant() {
        for record in sample_records() {
            assert_eq!(
                record.encode().len(),
                record.record_size(),
                "size mismatch for sid 0x{:04X}",
                record.sid()
            );
        }
    }

    #[test]
    fn test_every_variant_round_trips_through_the_stream() {
        let records = sample_records();
        let mut wire = Vec::new();
        for record in &records {
            wire.extend_from_slice(&record.encode());
        }

        let mut reader = RecordReader::new(wire, crate::context::DecodeContext::default());
        let mut decoded = Vec::new();
        while let Some(result) = reader.next_record() {
            decoded.push(result.unwrap());
        }
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_clone_is_a_deep_copy() {
        let original = Record::Sst(SstRecord {
            total_used: 1,
            strings: vec!["shared".to_string()],
        });
        let mut copy = original.clone();
        if let Record::Sst(rec) = &mut copy {
            rec.strings[0].push_str("-changed");
        }
        // The original is untouched by mutating the copy
        assert_eq!(
            original,
            Record::Sst(SstRecord {
                total_used: 1,
                strings: vec!["shared".to_string()],
            })
        );
    }
}
