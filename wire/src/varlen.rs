use common::err::CResult;

use crate::{overflow, Decode, Encode, InputBuffer, OutputBuffer};

/// Short-form length prefixes stay below this; longer payloads switch to
/// the sentinel + 4-byte length form.
const SHORT_FORM_LIMIT: usize = 255;
const LONG_FORM_SENTINEL: u8 = 0xFF;
const NUL_TERMINATOR: u8 = 0x00;

/// `put_varchar`: length-prefix, payload, trailing NUL sentinel, then
/// 0-3 zero pad bytes so the cursor lands on a 4-byte boundary.
pub fn put_varchar(buf: &mut OutputBuffer, bytes: &[u8]) -> CResult<()> {
    if bytes.len() < SHORT_FORM_LIMIT {
        buf.put_u8(bytes.len() as u8)?;
    } else {
        buf.put_u8(LONG_FORM_SENTINEL)?;
        buf.put_u32(bytes.len() as u32)?;
    }
    buf.put_bytes(bytes)?;
    buf.put_u8(NUL_TERMINATOR)?;
    buf.align4()
}

/// Inverse of [`put_varchar`]. Returns the payload bytes (the payload
/// *length* is `result.len()`, matching the contract of `get_varchar` in
/// §4.1, but callers nearly always also want the bytes themselves).
pub fn get_varchar<'a>(buf: &mut InputBuffer<'a>) -> CResult<&'a [u8]> {
    let first = buf.get_u8()?;
    let len = if first == LONG_FORM_SENTINEL {
        buf.get_u32()? as usize
    } else {
        first as usize
    };
    let payload = buf.get_bytes(len)?;
    let nul = buf.get_u8()?;
    if nul != NUL_TERMINATOR {
        return Err(common::err::client_error::ClientError::String(
            "varchar missing NUL sentinel".to_string(),
        ));
    }
    buf.align4()?;
    Ok(payload)
}

/// `put_varbit`: as `put_varchar` but the length prefix records bit
/// count rather than byte count; payload is still byte-packed (bits
/// packed MSB-first into the trailing partial byte).
pub fn put_varbit(buf: &mut OutputBuffer, bits: &[bool]) -> CResult<()> {
    let byte_len = (bits.len() + 7) / 8;
    if bits.len() < SHORT_FORM_LIMIT {
        buf.put_u8(bits.len() as u8)?;
    } else {
        buf.put_u8(LONG_FORM_SENTINEL)?;
        buf.put_u32(bits.len() as u32)?;
    }
    let mut packed = vec![0u8; byte_len];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            packed[i / 8] |= 0x80 >> (i % 8);
        }
    }
    buf.put_bytes(&packed)?;
    buf.put_u8(NUL_TERMINATOR)?;
    buf.align4()
}

pub fn get_varbit(buf: &mut InputBuffer<'_>) -> CResult<Vec<bool>> {
    let first = buf.get_u8()?;
    let bit_len = if first == LONG_FORM_SENTINEL {
        buf.get_u32()? as usize
    } else {
        first as usize
    };
    let byte_len = (bit_len + 7) / 8;
    let packed = buf.get_bytes(byte_len)?;
    let _nul = buf.get_u8()?;
    buf.align4()?;
    let mut bits = Vec::with_capacity(bit_len);
    for i in 0..bit_len {
        bits.push(packed[i / 8] & (0x80 >> (i % 8)) != 0);
    }
    Ok(bits)
}

/// The datetime quintuple: year, month, day, time-of-day, millisecond.
/// Packed on the wire as two double-aligned 32-bit words (an encoded
/// date word and an encoded time-of-day-plus-millisecond word) rather
/// than five separate fields, matching the fixed 8-byte disk width
/// `Datetime` is given in §3's supplemented layout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Datetime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub time_of_day_seconds: u32,
    pub millisecond: u16,
}

impl Encode for Datetime {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.align8()?;
        let date_word =
            ((self.year as u32) << 16) | ((self.month as u32) << 8) | (self.day as u32);
        let time_word = (self.time_of_day_seconds << 16) | (self.millisecond as u32);
        buf.put_u32(date_word)?;
        buf.put_u32(time_word)?;
        buf.align8()
    }
}

impl Decode for Datetime {
    fn decode(buf: &mut InputBuffer) -> CResult<Self> {
        buf.align8()?;
        let date_word = buf.get_u32()?;
        let time_word = buf.get_u32()?;
        buf.align8()?;
        Ok(Self {
            year: (date_word >> 16) as u16,
            month: ((date_word >> 8) & 0xFF) as u8,
            day: (date_word & 0xFF) as u8,
            time_of_day_seconds: time_word >> 16,
            millisecond: (time_word & 0xFFFF) as u16,
        })
    }
}

/// The generic envelope `put_set`/`get_set` in §4.1 describe: cardinality,
/// an optional homogeneous element-domain tag, a per-element bound-bitmap,
/// an optional offset table, and the concatenated element bytes.
///
/// `wire` only owns the framing; `dbtype` supplies already-encoded
/// per-element byte strings (or `None` for a bound-bit-false / NULL
/// element) so that this crate stays domain-type agnostic.
#[derive(Debug, Clone, Default)]
pub struct SetHeader {
    pub element_domain_tag: Option<i32>,
}

impl SetHeader {
    pub fn encode(
        &self,
        buf: &mut OutputBuffer,
        elements: &[Option<Vec<u8>>],
        with_offsets: bool,
    ) -> CResult<()> {
        buf.put_i32(elements.len() as i32)?;
        match self.element_domain_tag {
            Some(tag) => {
                buf.put_u8(1)?;
                buf.put_i32(tag)?;
            }
            None => buf.put_u8(0)?,
        }

        let bound_bytes = (elements.len() + 7) / 8;
        let mut bound_bitmap = vec![0u8; bound_bytes];
        for (i, el) in elements.iter().enumerate() {
            if el.is_some() {
                bound_bitmap[i / 8] |= 0x80 >> (i % 8);
            }
        }
        buf.put_bytes(&bound_bitmap)?;
        buf.align4()?;

        if with_offsets {
            let mut offset = 0i32;
            for el in elements {
                buf.put_i32(offset)?;
                if let Some(bytes) = el {
                    offset += bytes.len() as i32;
                }
            }
            buf.align4()?;
        }

        for el in elements.iter().flatten() {
            buf.put_bytes(el)?;
        }
        buf.align4()
    }

    /// Decodes the envelope, returning the element-domain tag and the
    /// bound-bitmap-gated raw element byte slices. Offsets (when
    /// present) are consumed but not returned: the caller slices
    /// `element_bytes` itself once it knows each element's on-disk
    /// width from the domain.
    pub fn decode<'a>(
        buf: &mut InputBuffer<'a>,
        with_offsets: bool,
    ) -> CResult<(Option<i32>, Vec<bool>, &'a [u8])> {
        let cardinality = buf.get_i32()?;
        if cardinality < 0 {
            return Err(overflow());
        }
        let has_header = buf.get_u8()?;
        let tag = if has_header != 0 {
            Some(buf.get_i32()?)
        } else {
            None
        };

        let bound_bytes = (cardinality as usize + 7) / 8;
        let bitmap = buf.get_bytes(bound_bytes)?;
        buf.align4()?;
        let mut bound = Vec::with_capacity(cardinality as usize);
        for i in 0..cardinality as usize {
            bound.push(bitmap[i / 8] & (0x80 >> (i % 8)) != 0);
        }

        if with_offsets {
            for _ in 0..cardinality {
                buf.get_i32()?;
            }
            buf.align4()?;
        }

        let rest = buf.read_to_end();
        Ok((tag, bound, rest))
    }
}
