use common::err::CResult;

use crate::{Decode, Encode, InputBuffer, OutputBuffer};

/// Object identifier: `(volume, page, slot)`, see GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    pub volume: i32,
    pub page: i32,
    pub slot: i32,
}

/// The sentinel `(page=-1, volume=-1, slot=-1)` denotes NULL in OID
/// fields, per §6.
pub const NULL_OID: Oid = Oid {
    volume: -1,
    page: -1,
    slot: -1,
};

impl Oid {
    pub fn new(volume: i32, page: i32, slot: i32) -> Self {
        Self { volume, page, slot }
    }

    pub fn is_null(&self) -> bool {
        *self == NULL_OID
    }

    pub const WIDTH: usize = 12;
}

impl Encode for Oid {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.volume)?;
        buf.put_i32(self.page)?;
        buf.put_i32(self.slot)
    }
}

impl Decode for Oid {
    fn decode(buf: &mut InputBuffer) -> CResult<Self> {
        let volume = buf.get_i32()?;
        let page = buf.get_i32()?;
        let slot = buf.get_i32()?;
        Ok(Self { volume, page, slot })
    }
}

/// Heap file id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hfid {
    pub volume: i16,
    pub fileid: i32,
}

impl Encode for Hfid {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.fileid)?;
        buf.put_i16(self.volume)?;
        buf.align4()
    }
}

impl Decode for Hfid {
    fn decode(buf: &mut InputBuffer) -> CResult<Self> {
        let fileid = buf.get_i32()?;
        let volume = buf.get_i16()?;
        buf.align4()?;
        Ok(Self { volume, fileid })
    }
}

/// B-tree id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Btid {
    pub volume: i16,
    pub root_pageid: i32,
}

impl Encode for Btid {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.root_pageid)?;
        buf.put_i16(self.volume)?;
        buf.align4()
    }
}

impl Decode for Btid {
    fn decode(buf: &mut InputBuffer) -> CResult<Self> {
        let root_pageid = buf.get_i32()?;
        let volume = buf.get_i16()?;
        buf.align4()?;
        Ok(Self { volume, root_pageid })
    }
}

/// Log sequence address: `(page_id, offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Lsa {
    pub pageid: i64,
    pub offset: i32,
}

impl Lsa {
    pub const NULL: Lsa = Lsa {
        pageid: -1,
        offset: -1,
    };

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl Encode for Lsa {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.align8()?;
        buf.put_i64(self.pageid)?;
        buf.put_i32(self.offset)?;
        buf.align8()
    }
}

impl Decode for Lsa {
    fn decode(buf: &mut InputBuffer) -> CResult<Self> {
        buf.align8()?;
        let pageid = buf.get_i64()?;
        let offset = buf.get_i32()?;
        buf.align8()?;
        Ok(Self { pageid, offset })
    }
}

/// `(currency, amount)` triple backing the `Monetary` type id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Monetary {
    pub currency: i16,
    pub amount: f64,
}

impl Encode for Monetary {
    fn encode(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.align8()?;
        buf.put_f64(self.amount)?;
        buf.put_i16(self.currency)?;
        buf.align8()
    }
}

impl Decode for Monetary {
    fn decode(buf: &mut InputBuffer) -> CResult<Self> {
        buf.align8()?;
        let amount = buf.get_f64()?;
        let currency = buf.get_i16()?;
        buf.align8()?;
        Ok(Self { currency, amount })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn null_oid_matches_sentinel() {
        assert!(NULL_OID.is_null());
        assert_eq!(NULL_OID, Oid::new(-1, -1, -1));
    }

    #[test]
    fn oid_roundtrips() {
        let mut out = OutputBuffer::with_capacity(Oid::WIDTH);
        let oid = Oid::new(1, 2, 3);
        oid.encode(&mut out).unwrap();
        let mut input = InputBuffer::new(out.as_slice());
        assert_eq!(Oid::decode(&mut input).unwrap(), oid);
    }

    #[test]
    fn lsa_encode_is_8_byte_aligned() {
        let mut out = OutputBuffer::with_capacity(16);
        Lsa { pageid: 7, offset: 3 }.encode(&mut out).unwrap();
        assert_eq!(out.len() % 8, 0);
    }
}
