use byteorder::{BigEndian, ReadBytesExt};

use common::err::client_error::ClientError;
use common::err::CResult;
use wire::{Decode, Lsa, OutputBuffer};

use crate::op_id::OpId;
use crate::request::Request;

/// `tran_server_commit`: flush has already happened client-side (§5's
/// commit ordering); this asks the server to finalise. `retain_lock`
/// mirrors `clear_all_hints`'s parameter so the server can decide
/// whether per-object lock hints survive.
pub struct CommitRequest {
    pub retain_lock: bool,
}

/// Raw terminal-state code the server returns; `txn::state` maps this
/// onto the ASCII state machine of §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReply {
    pub state_code: i32,
    pub has_postpone: bool,
    /// HA: the commit landed on a server that asks the client to treat
    /// its connection as Reset and reconnect to the new active (§4.6
    /// "Unilateral abort").
    pub reset_on_commit: bool,
}

impl Request for CommitRequest {
    type Reply = CommitReply;

    fn op_id(&self) -> OpId {
        OpId::TranServerCommit
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_u8(self.retain_lock as u8)
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut cursor = std::io::Cursor::new(reply_region);
        let state_code = cursor
            .read_i32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        let has_postpone = cursor
            .read_u8()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?
            != 0;
        let reset_on_commit = cursor
            .read_u8()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?
            != 0;
        Ok(CommitReply {
            state_code,
            has_postpone,
            reset_on_commit,
        })
    }
}

pub struct AbortRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortReply {
    pub state_code: i32,
    pub has_loose_ends: bool,
}

impl Request for AbortRequest {
    type Reply = AbortReply;

    fn op_id(&self) -> OpId {
        OpId::TranServerAbort
    }

    fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
        Ok(())
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut cursor = std::io::Cursor::new(reply_region);
        let state_code = cursor
            .read_i32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        let has_loose_ends = cursor
            .read_u8()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?
            != 0;
        Ok(AbortReply {
            state_code,
            has_loose_ends,
        })
    }
}

/// `tran_savepoint`: records an LSA on the server at the current log
/// position. The user-visible name bookkeeping lives in `txn`.
pub struct SavepointRequest {
    pub name: String,
}

impl Request for SavepointRequest {
    type Reply = Lsa;

    fn op_id(&self) -> OpId {
        OpId::TranServerSavepoint
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        wire::put_varchar(buf, self.name.as_bytes())
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut input = wire::InputBuffer::new(reply_region);
        Lsa::decode(&mut input)
    }
}

/// `tran_partial_abort`: roll the log back to the LSA recorded by an
/// earlier savepoint.
pub struct PartialAbortRequest {
    pub name: String,
}

impl Request for PartialAbortRequest {
    type Reply = Lsa;

    fn op_id(&self) -> OpId {
        OpId::TranServerPartialAbort
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        wire::put_varchar(buf, self.name.as_bytes())
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut input = wire::InputBuffer::new(reply_region);
        Lsa::decode(&mut input)
    }
}

/// `tran_reset_isolation`: `iso` is the raw wire tag `txn::IsolationLevel`
/// converts to/from.
pub struct ResetIsolationRequest {
    pub isolation: i32,
    pub async_workspace: bool,
}

impl Request for ResetIsolationRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::TranResetIsolation
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.isolation)?;
        buf.put_u8(self.async_workspace as u8)
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}

/// `tran_reset_wait_times`: milliseconds, already converted by `txn`
/// (negative preserved verbatim as infinite, per §4.6).
pub struct ResetWaitTimesRequest {
    pub wait_msecs: i32,
}

impl Request for ResetWaitTimesRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::TranResetWaitTimes
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.wait_msecs)
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}

/// `tran_start_topop` / `tran_end_topop_*`: the lighter-weight
/// system-internal nested-transaction marker (§4.6 supplement).
pub struct StartTopopRequest;

impl Request for StartTopopRequest {
    type Reply = Lsa;

    fn op_id(&self) -> OpId {
        OpId::TranServerStartTopop
    }

    fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
        Ok(())
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut input = wire::InputBuffer::new(reply_region);
        Lsa::decode(&mut input)
    }
}

pub struct EndTopopRequest {
    pub commit: bool,
}

impl Request for EndTopopRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::TranServerEndTopop
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_u8(self.commit as u8)
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}
