//! BIFF string sub-codecs.
//!
//! Strings in the record stream are length-prefixed by a 16-bit count of
//! *characters* (UTF-16 code units), followed in BIFF8 by a 1-byte grbit
//! whose low bit selects the character width: clear means one byte per
//! character interpreted through the stream codepage ("compressed"), set
//! means UTF-16LE. The grbit may also announce rich-text runs and an
//! extended (far-east) block, both of which this codec length-skips.
//!
//! A character run that straddles a CONTINUE boundary is resumed with a
//! fresh grbit byte at the start of the next frame, and the width may
//! change between segments. The continued readers/writers here own that
//! repair step; the continuation assembler only supplies the boundary
//! offsets.

use crate::context::DecodeContext;
use crate::continuation::ContinuationWriter;
use crate::cursor::{ReadCursor, WriteCursor};
use crate::error::{BiffError, BiffResult};
use bitflags::bitflags;
use encoding_rs::Encoding;

bitflags! {
    /// Option flags (grbit) preceding a BIFF8 character run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StrOptions: u8 {
        /// Characters are 2-byte UTF-16LE code units
        const WIDE = 0x01;
        /// A far-east extension block follows the characters
        const EXTENDED = 0x04;
        /// Rich-text formatting runs follow the characters
        const RICH_TEXT = 0x08;
    }
}

/// Map a Windows codepage identifier to an `encoding_rs` encoding.
///
/// Covers the codepages observed in legacy workbook streams; unsupported
/// identifiers fall back to Windows-1252 at the decode sites.
pub fn codepage_to_encoding(codepage: u16) -> Option<&'static Encoding> {
    match codepage {
        874 => Some(encoding_rs::WINDOWS_874),   // Thai
        932 => Some(encoding_rs::SHIFT_JIS),     // Japanese
        936 => Some(encoding_rs::GBK),           // Simplified Chinese
        949 => Some(encoding_rs::EUC_KR),        // Korean
        950 => Some(encoding_rs::BIG5),          // Traditional Chinese
        1250 => Some(encoding_rs::WINDOWS_1250), // Central European
        1251 => Some(encoding_rs::WINDOWS_1251), // Cyrillic
        1252 => Some(encoding_rs::WINDOWS_1252), // Western European
        1253 => Some(encoding_rs::WINDOWS_1253), // Greek
        1254 => Some(encoding_rs::WINDOWS_1254), // Turkish
        1255 => Some(encoding_rs::WINDOWS_1255), // Hebrew
        1256 => Some(encoding_rs::WINDOWS_1256), // Arabic
        1257 => Some(encoding_rs::WINDOWS_1257), // Baltic
        1258 => Some(encoding_rs::WINDOWS_1258), // Vietnamese
        10000 => Some(encoding_rs::MACINTOSH),   // Macintosh Roman
        _ => None,
    }
}

/// Decode a single-byte character run through the stream codepage.
fn decode_single_byte(bytes: &[u8], codepage: u16) -> String {
    let encoding = codepage_to_encoding(codepage).unwrap_or(encoding_rs::WINDOWS_1252);
    encoding.decode_without_bom_handling(bytes).0.into_owned()
}

/// Decode a UTF-16LE character run. Unpaired surrogates are replaced, the
/// codec never fails on character content.
fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Whether a string needs the 2-byte character width on the wire.
#[inline]
pub fn is_wide(s: &str) -> bool {
    !s.is_ascii()
}

/// Number of UTF-16 code units the string occupies, capped at the 16-bit
/// count field's range.
#[inline]
fn char_count(s: &str) -> usize {
    s.encode_utf16().count().min(0xFFFF)
}

/// Read a 16-bit-count unicode string (cch + grbit + characters), skipping
/// rich-text runs and the extension block when present.
pub fn read_unicode_string(
    cur: &mut ReadCursor<'_>,
    boundaries: &[usize],
    ctx: &DecodeContext,
) -> BiffResult<String> {
    let cch = cur.read_u16()? as usize;
    read_string_body(cur, boundaries, ctx, cch)
}

/// Read the inline string of a LABEL cell.
///
/// Some third-party producers write the character count as a negative
/// 16-bit value; the count is read back as its absolute value. This is a
/// compatibility shim for that one observed bug, not a format rule, and is
/// applied only here.
pub fn read_label_string(cur: &mut ReadCursor<'_>, ctx: &DecodeContext) -> BiffResult<String> {
    let cch = cur.read_i16()?.unsigned_abs() as usize;
    read_string_body(cur, &[], ctx, cch)
}

/// Read a short (8-bit count) string, used by BOUNDSHEET names.
pub fn read_short_string(cur: &mut ReadCursor<'_>, ctx: &DecodeContext) -> BiffResult<String> {
    let cch = cur.read_u8()? as usize;
    read_string_body(cur, &[], ctx, cch)
}

fn read_string_body(
    cur: &mut ReadCursor<'_>,
    boundaries: &[usize],
    ctx: &DecodeContext,
    cch: usize,
) -> BiffResult<String> {
    if !ctx.biff_version.supports_unicode() {
        // Pre-BIFF8 strings carry no grbit; always single-byte characters.
        let bytes = cur.read_bytes(cch)?;
        return Ok(decode_single_byte(bytes, ctx.codepage));
    }

    let flags = StrOptions::from_bits_retain(cur.read_u8()?);
    let rich_runs = if flags.contains(StrOptions::RICH_TEXT) {
        cur.read_u16()? as usize
    } else {
        0
    };
    let ext_size = if flags.contains(StrOptions::EXTENDED) {
        cur.read_u32()? as usize
    } else {
        0
    };

    let mut wide = flags.contains(StrOptions::WIDE);
    let mut out = String::with_capacity(cch);
    let mut chars_left = cch;

    while chars_left > 0 {
        // A run resumed past a CONTINUE boundary restarts with a fresh
        // grbit; only the width bit is meaningful there.
        if boundaries.contains(&cur.position()) {
            wide = cur.read_u8()? & StrOptions::WIDE.bits() != 0;
        }
        let segment_end = boundaries
            .iter()
            .copied()
            .find(|&b| b > cur.position())
            .unwrap_or(cur.position() + cur.remaining());
        let capacity = segment_end - cur.position();
        let width = if wide { 2 } else { 1 };
        let take = chars_left.min(capacity / width);
        if take == 0 {
            return Err(BiffError::UnexpectedEndOfData {
                needed: width,
                available: capacity,
            });
        }
        let bytes = cur.read_bytes(take * width)?;
        if wide {
            out.push_str(&decode_utf16le(bytes));
        } else {
            out.push_str(&decode_single_byte(bytes, ctx.codepage));
        }
        chars_left -= take;
    }

    // Formatting runs and the extension block are opaque to this layer;
    // they are length-skipped, not retained.
    cur.skip(rich_runs * 4)?;
    cur.skip(ext_size)?;

    Ok(out)
}

/// Write a 16-bit-count unicode string in its single-frame form.
pub fn write_unicode_string(out: &mut WriteCursor, s: &str) {
    let cch = char_count(s) as u16;
    out.write_u16(cch);
    write_flagged_chars(out, s, cch);
}

/// Write a short (8-bit count) string.
pub fn write_short_string(out: &mut WriteCursor, s: &str) {
    let cch = char_count(s).min(0xFF) as u8;
    out.write_u8(cch);
    write_flagged_chars(out, s, cch as u16);
}

fn write_flagged_chars(out: &mut WriteCursor, s: &str, cch: u16) {
    if is_wide(s) {
        out.write_u8(StrOptions::WIDE.bits());
        for unit in s.encode_utf16().take(cch as usize) {
            out.write_u16(unit);
        }
    } else {
        out.write_u8(0);
        out.write_bytes(&s.as_bytes()[..cch as usize]);
    }
}

/// Exact encoded size of [`write_unicode_string`]'s output.
pub fn unicode_string_size(s: &str) -> usize {
    let cch = char_count(s);
    2 + 1 + cch * if is_wide(s) { 2 } else { 1 }
}

/// Exact encoded size of [`write_short_string`]'s output.
pub fn short_string_size(s: &str) -> usize {
    let cch = char_count(s).min(0xFF);
    1 + 1 + cch * if is_wide(s) { 2 } else { 1 }
}

/// Write a character run through a [`ContinuationWriter`], re-emitting the
/// grbit byte whenever the run resumes in a new frame and never splitting a
/// 2-byte character. The 16-bit count and the initial grbit must already
/// have been written (atomically) by the caller.
pub fn write_continued_chars(w: &mut ContinuationWriter, s: &str, wide: bool) {
    if wide {
        let mut units: Vec<u8> = Vec::with_capacity(s.len() * 2);
        for unit in s.encode_utf16().take(0xFFFF) {
            units.extend_from_slice(&unit.to_le_bytes());
        }
        let mut written = 0;
        while written < units.len() {
            let mut can_write = w.frame_remaining().min(units.len() - written);
            // Keep an even byte count so no character is split
            can_write &= !1;
            if can_write == 0 {
                w.break_frame();
                w.push_raw(&[StrOptions::WIDE.bits()]);
                continue;
            }
            w.push_raw(&units[written..written + can_write]);
            written += can_write;
        }
    } else {
        let bytes = &s.as_bytes()[..s.len().min(0xFFFF)];
        let mut written = 0;
        while written < bytes.len() {
            let can_write = w.frame_remaining().min(bytes.len() - written);
            if can_write == 0 {
                w.break_frame();
                w.push_raw(&[0u8]);
                continue;
            }
            w.push_raw(&bytes[written..written + can_write]);
            written += can_write;
        }
    }
}
