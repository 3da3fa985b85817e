//! Record registry: the sid-to-codec dispatch table.
//!
//! The table is a compile-time perfect hash map, so it is immutable,
//! holds no resources and is safe for concurrent lookups from any number
//! of decoding threads. Unknown sids fall back to the opaque
//! byte-preserving record; the encryption header is recognized but
//! deliberately refused.

use crate::consts::{SID_FILEPASS, SID_INTERFACEEND, SID_STRING};
use crate::context::DecodeContext;
use crate::continuation::RawRecord;
use crate::cursor::ReadCursor;
use crate::error::{BiffError, BiffResult};
use crate::records::{
    BlankRecord, BofRecord, BoolErrRecord, BoundSheetRecord, CodepageRecord, Date1904Record,
    DimensionsRecord, EofRecord, ExtSstRecord, FormulaRecord, InterfaceEndRecord,
    InterfaceHdrRecord, LabelRecord, LabelSstRecord, MulBlankRecord, MulRkRecord, NumberRecord,
    ObjRecord, Record, RkRecord, SharedFormulaRecord, SstRecord, StringRecord, UnknownRecord,
};
use phf::phf_map;

type DecodeFn = fn(&RawRecord, &DecodeContext) -> BiffResult<Record>;

macro_rules! payload_decoder {
    ($name:ident, $codec:ty, $variant:ident) => {
        fn $name(raw: &RawRecord, ctx: &DecodeContext) -> BiffResult<Record> {
            use crate::records::RecordCodec as _;
            let mut cur = ReadCursor::new(&raw.data);
            let rec = <$codec>::decode(&mut cur, ctx)?;
            // Unconsumed payload bytes would be dropped on re-encode
            if cur.remaining() != 0 {
                return Err(BiffError::InvalidFieldValue {
                    sid: <$codec>::SID,
                    field: "trailing bytes",
                    value: cur.remaining() as u32,
                });
            }
            Ok(Record::$variant(rec))
        }
    };
}

payload_decoder!(decode_bof, BofRecord, Bof);
payload_decoder!(decode_eof, EofRecord, Eof);
payload_decoder!(decode_interface_hdr, InterfaceHdrRecord, InterfaceHdr);
payload_decoder!(decode_codepage, CodepageRecord, Codepage);
payload_decoder!(decode_date1904, Date1904Record, Date1904);
payload_decoder!(decode_dimensions, DimensionsRecord, Dimensions);
payload_decoder!(decode_boundsheet, BoundSheetRecord, BoundSheet);
payload_decoder!(decode_blank, BlankRecord, Blank);
payload_decoder!(decode_number, NumberRecord, Number);
payload_decoder!(decode_label, LabelRecord, Label);
payload_decoder!(decode_boolerr, BoolErrRecord, BoolErr);
payload_decoder!(decode_rk, RkRecord, Rk);
payload_decoder!(decode_mulrk, MulRkRecord, MulRk);
payload_decoder!(decode_mulblank, MulBlankRecord, MulBlank);
payload_decoder!(decode_labelsst, LabelSstRecord, LabelSst);
payload_decoder!(decode_formula, FormulaRecord, Formula);
payload_decoder!(decode_shared_formula, SharedFormulaRecord, SharedFormula);
payload_decoder!(decode_ext_sst, ExtSstRecord, ExtSst);
payload_decoder!(decode_obj, ObjRecord, Obj);

/// The INTERFACEEND sid is dual-purpose: a zero-byte payload is the end
/// marker, while a two-byte payload is an interface header a buggy
/// producer wrote under the wrong sid. Payload length disambiguates.
fn decode_interface_end(raw: &RawRecord, ctx: &DecodeContext) -> BiffResult<Record> {
    use crate::records::RecordCodec as _;
    let mut cur = ReadCursor::new(&raw.data);
    match cur.remaining() {
        0 => Ok(Record::InterfaceEnd(InterfaceEndRecord)),
        2 => InterfaceHdrRecord::decode(&mut cur, ctx).map(Record::InterfaceHdr),
        n => Err(BiffError::InvalidFieldValue {
            sid: SID_INTERFACEEND,
            field: "payload length",
            value: n as u32,
        }),
    }
}

fn decode_sst(raw: &RawRecord, ctx: &DecodeContext) -> BiffResult<Record> {
    let mut cur = ReadCursor::new(&raw.data);
    SstRecord::decode(&mut cur, &raw.boundaries, ctx).map(Record::Sst)
}

fn decode_string(raw: &RawRecord, ctx: &DecodeContext) -> BiffResult<Record> {
    let mut cur = ReadCursor::new(&raw.data);
    let rec = StringRecord::decode(&mut cur, &raw.boundaries, ctx)?;
    if cur.remaining() != 0 {
        return Err(BiffError::InvalidFieldValue {
            sid: SID_STRING,
            field: "trailing bytes",
            value: cur.remaining() as u32,
        });
    }
    Ok(Record::FormulaString(rec))
}

/// Perfect hash map from sid to decoder function, built at compile time.
static DECODERS: phf::Map<u16, DecodeFn> = phf_map! {
    0x0006u16 => decode_formula,
    0x000Au16 => decode_eof,
    0x0022u16 => decode_date1904,
    0x0042u16 => decode_codepage,
    0x005Du16 => decode_obj,
    0x0085u16 => decode_boundsheet,
    0x00BDu16 => decode_mulrk,
    0x00BEu16 => decode_mulblank,
    0x00E1u16 => decode_interface_hdr,
    0x00E2u16 => decode_interface_end,
    0x00FCu16 => decode_sst,
    0x00FDu16 => decode_labelsst,
    0x00FFu16 => decode_ext_sst,
    0x0200u16 => decode_dimensions,
    0x0201u16 => decode_blank,
    0x0203u16 => decode_number,
    0x0204u16 => decode_label,
    0x0205u16 => decode_boolerr,
    0x0207u16 => decode_string,
    0x027Eu16 => decode_rk,
    0x04BCu16 => decode_shared_formula,
    0x0809u16 => decode_bof,
};

/// Human-readable record names for the sid table's lookup surface.
static NAMES: phf::Map<u16, &'static str> = phf_map! {
    0x0006u16 => "FORMULA",
    0x000Au16 => "EOF",
    0x0022u16 => "DATE1904",
    0x002Fu16 => "FILEPASS",
    0x003Cu16 => "CONTINUE",
    0x0042u16 => "CODEPAGE",
    0x005Du16 => "OBJ",
    0x0085u16 => "BOUNDSHEET",
    0x00BDu16 => "MULRK",
    0x00BEu16 => "MULBLANK",
    0x00E1u16 => "INTERFACEHDR",
    0x00E2u16 => "INTERFACEEND",
    0x00FCu16 => "SST",
    0x00FDu16 => "LABELSST",
    0x00FFu16 => "EXTSST",
    0x0200u16 => "DIMENSIONS",
    0x0201u16 => "BLANK",
    0x0203u16 => "NUMBER",
    0x0204u16 => "LABEL",
    0x0205u16 => "BOOLERR",
    0x0207u16 => "STRING",
    0x027Eu16 => "RK",
    0x04BCu16 => "SHAREDFMLA",
    0x0809u16 => "BOF",
};

/// Decode a reassembled record through the registry.
///
/// Unknown sids produce [`Record::Unknown`] preserving the raw payload;
/// the encryption header fails with [`BiffError::UnsupportedVariant`].
pub fn dispatch(raw: &RawRecord, ctx: &DecodeContext) -> BiffResult<Record> {
    if raw.sid == SID_FILEPASS {
        return Err(BiffError::UnsupportedVariant {
            sid: SID_FILEPASS,
            offset: raw.offset,
            reason: "encrypted streams are not decoded",
        });
    }
    match DECODERS.get(&raw.sid) {
        Some(decoder) => decoder(raw, ctx),
        None => Ok(Record::Unknown(UnknownRecord::from_raw(raw))),
    }
}

/// Name of a known record kind. Covers the framing sids (CONTINUE,
/// FILEPASS) that never dispatch to a typed codec.
pub fn record_name(sid: u16) -> Option<&'static str> {
    NAMES.get(&sid).copied()
}

/// Whether the sid is part of the known record table. Callers use this to
/// pre-classify records without fully decoding them.
pub fn is_known_sid(sid: u16) -> bool {
    NAMES.contains_key(&sid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{SID_CONTINUE, SID_SST};
    use crate::continuation::RecordReader;
    use crate::frame::write_frame;

    fn ctx() -> DecodeContext {
        DecodeContext::default()
    }

    fn decode_one(wire: Vec<u8>) -> BiffResult<Record> {
        let mut reader = RecordReader::new(wire, ctx());
        reader.next_record().unwrap()
    }

    #[test]
    fn test_unknown_sid_preserves_bytes() {
        let mut wire = Vec::new();
        write_frame(&mut wire, 0x7777, &[0xAA, 0xBB]).unwrap();
        let record = decode_one(wire.clone()).unwrap();
        match &record {
            Record::Unknown(rec) => {
                assert_eq!(rec.sid, 0x7777);
                assert_eq!(&rec.data[..], &[0xAA, 0xBB]);
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
        assert_eq!(record.encode(), wire);
    }

    #[test]
    fn test_dual_sid_zero_bytes_is_end_marker() {
        let mut wire = Vec::new();
        write_frame(&mut wire, SID_INTERFACEEND, &[]).unwrap();
        assert!(matches!(
            decode_one(wire).unwrap(),
            Record::InterfaceEnd(InterfaceEndRecord)
        ));
    }

    #[test]
    fn test_dual_sid_two_bytes_is_interface_hdr() {
        let mut wire = Vec::new();
        write_frame(&mut wire, SID_INTERFACEEND, &0x04B0u16.to_le_bytes()).unwrap();
        match decode_one(wire).unwrap() {
            Record::InterfaceHdr(rec) => assert_eq!(rec.codepage, 0x04B0),
            other => panic!("expected InterfaceHdr, got {other:?}"),
        }
    }

    #[test]
    fn test_dual_sid_other_length_rejected() {
        let mut wire = Vec::new();
        write_frame(&mut wire, SID_INTERFACEEND, &[1, 2, 3]).unwrap();
        assert!(matches!(
            decode_one(wire).unwrap_err(),
            BiffError::RecordDecode {
                sid: SID_INTERFACEEND,
                offset: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_filepass_refused_but_raw_available() {
        let payload = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00];
        let mut wire = Vec::new();
        write_frame(&mut wire, SID_FILEPASS, &payload).unwrap();

        assert!(matches!(
            decode_one(wire.clone()).unwrap_err(),
            BiffError::UnsupportedVariant {
                sid: SID_FILEPASS,
                offset: 0,
                ..
            }
        ));

        // The raw-record layer still hands out the bytes for pass-through
        let mut reader = RecordReader::new(wire, ctx());
        let raw = reader.next_raw().unwrap().unwrap();
        assert_eq!(raw.sid, SID_FILEPASS);
        assert_eq!(&raw.data[..], &payload);
    }

    #[test]
    fn test_decode_error_names_sid_and_offset() {
        // A BOOLERR with an illegal error code, preceded by another record
        // so the offset is non-zero.
        let mut wire = Vec::new();
        write_frame(&mut wire, 0x000A, &[]).unwrap();
        let bad = [0u8, 0, 0, 0, 15, 0, 0x55, 1];
        write_frame(&mut wire, 0x0205, &bad).unwrap();

        let mut reader = RecordReader::new(wire, ctx());
        reader.next_record().unwrap().unwrap();
        let err = reader.next_record().unwrap().unwrap_err();
        match err {
            BiffError::RecordDecode { sid, offset, source } => {
                assert_eq!(sid, 0x0205);
                assert_eq!(offset, 4);
                assert!(matches!(
                    *source,
                    BiffError::InvalidFieldValue { field: "error code", value: 0x55, .. }
                ));
            }
            other => panic!("expected RecordDecode, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_surface() {
        assert_eq!(record_name(0x00FC), Some("SST"));
        assert_eq!(record_name(SID_CONTINUE), Some("CONTINUE"));
        assert_eq!(record_name(0x7777), None);
        assert!(is_known_sid(SID_SST));
        assert!(is_known_sid(SID_STRING));
        assert!(!is_known_sid(0x7777));
    }

    #[test]
    fn test_mixed_stream_decodes_in_order() {
        let mut wire = Vec::new();
        // BOF
        let bof = Record::Bof(crate::records::BofRecord {
            version: 0x0600,
            stream_type: crate::records::StreamType::Worksheet,
            build: 0x0DBB,
            build_year: 1996,
            history_flags: 0,
            lowest_version: 0x0600,
        });
        wire.extend_from_slice(&bof.encode());
        // A number cell
        let number = Record::Number(crate::records::NumberRecord {
            row: 0,
            col: 0,
            xf_index: 15,
            value: 1.5,
        });
        wire.extend_from_slice(&number.encode());
        // EOF
        let eof = Record::Eof(crate::records::EofRecord);
        wire.extend_from_slice(&eof.encode());

        let mut reader = RecordReader::new(wire, ctx());
        assert_eq!(reader.next_record().unwrap().unwrap(), bof);
        assert_eq!(reader.next_record().unwrap().unwrap(), number);
        assert_eq!(reader.next_record().unwrap().unwrap(), eof);
        assert!(reader.next_record().is_none());
    }
}
