use bytes::{BufMut, BytesMut};

use common::err::CResult;

use crate::overflow;

/// A fixed-capacity, growth-forbidding write cursor.
///
/// Every `put_*` checks remaining capacity first; exceeding it raises
/// [`ClientError::BufferOverflow`](common::err::client_error::ClientError::BufferOverflow)
/// rather than silently reallocating, matching the bounded-buffer
/// contract of §4.1: request buffers are sized up front by summing
/// argument disk-sizes, and overflow aborts the RPC.
#[derive(Debug)]
pub struct OutputBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl OutputBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    fn reserve(&mut self, n: usize) -> CResult<()> {
        if self.remaining_capacity() < n {
            return Err(overflow());
        }
        Ok(())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> CResult<()> {
        self.reserve(bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    pub fn put_u8(&mut self, v: u8) -> CResult<()> {
        self.reserve(1)?;
        self.buf.put_u8(v);
        Ok(())
    }

    pub fn put_i8(&mut self, v: i8) -> CResult<()> {
        self.put_u8(v as u8)
    }

    pub fn put_u16(&mut self, v: u16) -> CResult<()> {
        self.reserve(2)?;
        self.buf.put_u16(v);
        Ok(())
    }

    pub fn put_i16(&mut self, v: i16) -> CResult<()> {
        self.put_u16(v as u16)
    }

    pub fn put_u32(&mut self, v: u32) -> CResult<()> {
        self.reserve(4)?;
        self.buf.put_u32(v);
        Ok(())
    }

    pub fn put_i32(&mut self, v: i32) -> CResult<()> {
        self.put_u32(v as u32)
    }

    pub fn put_u64(&mut self, v: u64) -> CResult<()> {
        self.reserve(8)?;
        self.buf.put_u64(v);
        Ok(())
    }

    pub fn put_i64(&mut self, v: i64) -> CResult<()> {
        self.put_u64(v as u64)
    }

    pub fn put_f32(&mut self, v: f32) -> CResult<()> {
        self.reserve(4)?;
        self.buf.put_f32(v);
        Ok(())
    }

    pub fn put_f64(&mut self, v: f64) -> CResult<()> {
        self.reserve(8)?;
        self.buf.put_f64(v);
        Ok(())
    }

    /// Pads with zero bytes until `self.len()` is a multiple of `width`.
    pub fn align_to(&mut self, width: usize) -> CResult<()> {
        let misalignment = self.buf.len() % width;
        if misalignment == 0 {
            return Ok(());
        }
        let pad = width - misalignment;
        self.reserve(pad)?;
        for _ in 0..pad {
            self.buf.put_u8(0);
        }
        Ok(())
    }

    pub fn align4(&mut self) -> CResult<()> {
        self.align_to(4)
    }

    pub fn align8(&mut self) -> CResult<()> {
        self.align_to(8)
    }
}

/// A bounded read cursor over a borrowed byte slice: `ptr`/`endptr` per
/// §4.1, expressed as a position plus the slice's own length.
#[derive(Debug, Clone, Copy)]
pub struct InputBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> InputBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    fn take(&mut self, n: usize) -> CResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(overflow());
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn get_bytes(&mut self, n: usize) -> CResult<&'a [u8]> {
        self.take(n)
    }

    pub fn peek_bytes(&self, n: usize) -> CResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(overflow());
        }
        Ok(&self.data[self.pos..self.pos + n])
    }

    pub fn get_u8(&mut self) -> CResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_i8(&mut self) -> CResult<i8> {
        Ok(self.get_u8()? as i8)
    }

    pub fn get_u16(&mut self) -> CResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn get_i16(&mut self) -> CResult<i16> {
        Ok(self.get_u16()? as i16)
    }

    pub fn get_u32(&mut self) -> CResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_i32(&mut self) -> CResult<i32> {
        Ok(self.get_u32()? as i32)
    }

    pub fn get_u64(&mut self) -> CResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn get_i64(&mut self) -> CResult<i64> {
        Ok(self.get_u64()? as i64)
    }

    pub fn get_f32(&mut self) -> CResult<f32> {
        Ok(f32::from_bits(self.get_u32()?))
    }

    pub fn get_f64(&mut self) -> CResult<f64> {
        Ok(f64::from_bits(self.get_u64()?))
    }

    pub fn align_to(&mut self, width: usize) -> CResult<()> {
        let misalignment = self.pos % width;
        if misalignment == 0 {
            return Ok(());
        }
        let pad = width - misalignment;
        self.take(pad)?;
        Ok(())
    }

    pub fn align4(&mut self) -> CResult<()> {
        self.align_to(4)
    }

    pub fn align8(&mut self) -> CResult<()> {
        self.align_to(8)
    }

    pub fn read_to_end(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn overflow_signals_instead_of_growing() {
        let mut out = OutputBuffer::with_capacity(2);
        out.put_u8(1).unwrap();
        out.put_u8(2).unwrap();
        assert!(out.put_u8(3).is_err());
    }

    #[test]
    fn align4_pads_to_next_boundary() {
        let mut out = OutputBuffer::with_capacity(8);
        out.put_u8(1).unwrap();
        out.align4().unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn read_past_end_overflows() {
        let buf = [0u8; 2];
        let mut input = InputBuffer::new(&buf);
        input.get_u16().unwrap();
        assert!(input.get_u8().is_err());
    }
}
