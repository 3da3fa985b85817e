//! OBJ record: a container of tagged sub-records.
//!
//! The payload nests the frame pattern one level down: a sequence of
//! `[ft: u16][cb: u16][data: cb bytes]` chunks, opened by the common
//! object data (ftCmo) and closed by the ftEnd terminator. Sub-record
//! kinds this layer does not model are preserved opaquely.

use super::RecordCodec;
use crate::consts::{FT_CMO, FT_END, SID_OBJ};
use crate::context::DecodeContext;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{BiffError, BiffResult};

/// Common object data (ftCmo), always the container's first sub-record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonObjectData {
    /// Object kind (0x00 group .. 0x1E Office drawing)
    pub kind: u16,
    /// Object identifier, unique within the sheet
    pub object_id: u16,
    pub option_flags: u16,
    /// Three reserved dwords, preserved verbatim
    pub reserved: [u8; 12],
}

/// A sub-record not modelled by this layer, preserved byte-exact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSubRecord {
    pub ft: u16,
    pub data: Vec<u8>,
}

/// One tagged chunk inside an OBJ record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubRecord {
    CommonObjectData(CommonObjectData),
    /// ftEnd terminator
    End,
    Unknown(UnknownSubRecord),
}

impl SubRecord {
    fn data_size(&self) -> usize {
        match self {
            SubRecord::CommonObjectData(_) => 18,
            SubRecord::End => 0,
            SubRecord::Unknown(sub) => sub.data.len(),
        }
    }
}

/// OBJ record (descriptor of an embedded drawing object)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjRecord {
    pub sub_records: Vec<SubRecord>,
}

impl RecordCodec for ObjRecord {
    const SID: u16 = SID_OBJ;

    fn decode(cur: &mut ReadCursor<'_>, _ctx: &DecodeContext) -> BiffResult<Self> {
        let mut sub_records = Vec::new();
        loop {
            let ft = cur.read_u16()?;
            let cb = cur.read_u16()? as usize;
            match ft {
                FT_CMO => {
                    if cb != 18 {
                        return Err(BiffError::InvalidFieldValue {
                            sid: SID_OBJ,
                            field: "ftCmo length",
                            value: cb as u32,
                        });
                    }
                    let kind = cur.read_u16()?;
                    if kind > 0x1E {
                        return Err(BiffError::InvalidFieldValue {
                            sid: SID_OBJ,
                            field: "object kind",
                            value: kind as u32,
                        });
                    }
                    let object_id = cur.read_u16()?;
                    let option_flags = cur.read_u16()?;
                    let mut reserved = [0u8; 12];
                    reserved.copy_from_slice(cur.read_bytes(12)?);
                    sub_records.push(SubRecord::CommonObjectData(CommonObjectData {
                        kind,
                        object_id,
                        option_flags,
                        reserved,
                    }));
                }
                FT_END => {
                    if cb != 0 {
                        return Err(BiffError::InvalidFieldValue {
                            sid: SID_OBJ,
                            field: "ftEnd length",
                            value: cb as u32,
                        });
                    }
                    sub_records.push(SubRecord::End);
                    break;
                }
                _ => {
                    sub_records.push(SubRecord::Unknown(UnknownSubRecord {
                        ft,
                        data: cur.read_bytes(cb)?.to_vec(),
                    }));
                }
            }
        }
        if cur.remaining() != 0 {
            return Err(BiffError::InvalidFieldValue {
                sid: SID_OBJ,
                field: "trailing bytes",
                value: cur.remaining() as u32,
            });
        }
        Ok(ObjRecord { sub_records })
    }

    fn payload_size(&self) -> usize {
        self.sub_records
            .iter()
            .map(|sub| 4 + sub.data_size())
            .sum()
    }

    fn write_payload(&self, out: &mut WriteCursor) {
        for sub in &self.sub_records {
            match sub {
                SubRecord::CommonObjectData(cmo) => {
                    out.write_u16(FT_CMO);
                    out.write_u16(18);
                    out.write_u16(cmo.kind);
                    out.write_u16(cmo.object_id);
                    out.write_u16(cmo.option_flags);
                    out.write_bytes(&cmo.reserved);
                }
                SubRecord::End => {
                    out.write_u16(FT_END);
                    out.write_u16(0);
                }
                SubRecord::Unknown(sub) => {
                    out.write_u16(sub.ft);
                    out.write_u16(sub.data.len() as u16);
                    out.write_bytes(&sub.data);
                }
            }
        }
    }
}
