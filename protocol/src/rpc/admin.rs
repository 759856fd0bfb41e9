use common::err::client_error::ClientError;
use common::err::CResult;
use wire::OutputBuffer;

use crate::op_id::OpId;
use crate::request::Request;

/// `set_interrupt`: no-reply, fire-and-forget (§5's cancellation
/// contract) — may race with the reply to the call it interrupts.
pub struct SetInterruptRequest {
    pub flag: bool,
}

impl Request for SetInterruptRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::SetInterrupt
    }

    fn no_reply(&self) -> bool {
        true
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_u8(self.flag as u8)
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}

pub struct CheckpointTriggerRequest;

impl Request for CheckpointTriggerRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::CheckpointTrigger
    }

    fn no_reply(&self) -> bool {
        true
    }

    fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
        Ok(())
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}

/// Whether this session believes it is talking to a client/server
/// deployment or running logically in-process against the server's own
/// address space (§4.4's mode multiplexing). Stand-alone mode is not
/// implemented end-to-end (DESIGN.md Open Question resolution); this
/// enum exists so `ChangeModeRequest` can still express and enforce the
/// §6 contract ("not available in stand-alone mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    ClientServer,
    Standalone,
}

/// `changemode`: toggles HA role on the server. Per §6, this admin op
/// is only meaningful against a server the client reaches directly
/// (stand-alone mode); called from an ordinary client/server session it
/// is rejected locally, without a round-trip, as `OnlyInStandalone`.
pub struct ChangeModeRequest {
    pub new_role: i32,
    pub mode: OperatingMode,
}

impl Request for ChangeModeRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::ChangeMode
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        if self.mode != OperatingMode::Standalone {
            return Err(ClientError::OnlyInStandalone);
        }
        buf.put_i32(self.new_role)
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}
