use common::err::CResult;
use wire::{Decode, Encode, InputBuffer, Oid, OutputBuffer};

use crate::copy_area::CopyArea;
use crate::op_id::OpId;
use crate::request::Request;

/// `locator_fetch`: reply+Copy Area shape (§4.4) — bulk object fetch.
pub struct LocatorFetchRequest {
    pub oids: Vec<Oid>,
}

impl Request for LocatorFetchRequest {
    type Reply = CopyArea;

    fn op_id(&self) -> OpId {
        OpId::LocatorFetch
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.oids.len() as i32)?;
        for oid in &self.oids {
            oid.encode(buf)?;
        }
        Ok(())
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut input = InputBuffer::new(reply_region);
        CopyArea::decode(&mut input)
    }
}

/// `locator_force`: flushes a Copy Area of dirty objects to the server
/// (used by `workspace::WorkspaceHooks::flush_all`); the server assigns
/// permanent OIDs to any temporary ones and echoes back an updated Copy
/// Area (§4.5, §8 scenario S5).
pub struct LocatorForceRequest {
    pub copy_area: CopyArea,
}

impl Request for LocatorForceRequest {
    type Reply = CopyArea;

    fn op_id(&self) -> OpId {
        OpId::LocatorForce
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        self.copy_area.encode(buf)
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut input = InputBuffer::new(reply_region);
        CopyArea::decode(&mut input)
    }
}
