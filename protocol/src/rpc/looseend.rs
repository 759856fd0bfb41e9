use byteorder::{BigEndian, ReadBytesExt};

use common::err::client_error::ClientError;
use common::err::CResult;
use wire::OutputBuffer;

use crate::op_id::OpId;
use crate::request::Request;

/// One server-dictated deferred log action, LSA-ordered, that the
/// client must run before a `_WITH_CLIENT_LOOSE_ENDS` commit/abort is
/// observable (§4.6, GLOSSARY "Loose-end action"). `rcvindex` is the
/// statically-keyed dispatch index the original `tran_...` action
/// vector would switch on; `txn::loose_end` resolves it to a concrete
/// action.
#[derive(Debug, Clone)]
pub struct LooseEndAction {
    pub rcvindex: i32,
    pub payload: Vec<u8>,
}

fn decode_optional_action(reply_region: &[u8], reply_data: &[Vec<u8>]) -> CResult<Option<LooseEndAction>> {
    let mut cursor = std::io::Cursor::new(reply_region);
    let present = cursor
        .read_u8()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    if present == 0 {
        return Ok(None);
    }
    let rcvindex = cursor
        .read_i32::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    let payload = reply_data.first().cloned().unwrap_or_default();
    Ok(Some(LooseEndAction { rcvindex, payload }))
}

macro_rules! loose_end_fetch {
    ($name:ident, $op:expr) => {
        pub struct $name;

        impl Request for $name {
            type Reply = Option<LooseEndAction>;

            fn op_id(&self) -> OpId {
                $op
            }

            fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
                Ok(())
            }

            fn decode_reply(
                _status: i32,
                reply_region: &[u8],
                reply_data: &[Vec<u8>],
            ) -> CResult<Self::Reply> {
                decode_optional_action(reply_region, reply_data)
            }
        }
    };
}

loose_end_fetch!(GetFirstPostponeRequest, OpId::LogClientGetFirstPostpone);
loose_end_fetch!(GetNextPostponeRequest, OpId::LogClientGetNextPostpone);
loose_end_fetch!(GetFirstUndoRequest, OpId::LogClientGetFirstUndo);
loose_end_fetch!(GetNextUndoRequest, OpId::LogClientGetNextUndo);

pub struct HasFinishedPostponeRequest;

impl Request for HasFinishedPostponeRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::LogHasFinishedClientPostpone
    }

    fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
        Ok(())
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}

pub struct HasFinishedUndoRequest;

impl Request for HasFinishedUndoRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::LogHasFinishedClientUndo
    }

    fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
        Ok(())
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}
