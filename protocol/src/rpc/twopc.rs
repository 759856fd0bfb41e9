use byteorder::{BigEndian, ReadBytesExt};

use common::err::client_error::ClientError;
use common::err::CResult;
use wire::OutputBuffer;

use crate::op_id::OpId;
use crate::request::Request;

pub struct Tran2pcStartRequest;

impl Request for Tran2pcStartRequest {
    /// Global transaction id, per §4.6.
    type Reply = i32;

    fn op_id(&self) -> OpId {
        OpId::Tran2pcStart
    }

    fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
        Ok(())
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        std::io::Cursor::new(reply_region)
            .read_i32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))
    }
}

pub struct Tran2pcPrepareRequest;

impl Request for Tran2pcPrepareRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::Tran2pcPrepare
    }

    fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
        Ok(())
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}

/// `tran_2pc_recovery_prepared(buf, n)`: up to `max` gtrids of locally
/// prepared transactions awaiting XA resolution.
pub struct Tran2pcRecoveryPreparedRequest {
    pub max: i32,
}

impl Request for Tran2pcRecoveryPreparedRequest {
    type Reply = Vec<i32>;

    fn op_id(&self) -> OpId {
        OpId::Tran2pcRecoveryPrepared
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.max)
    }

    fn decode_reply(_status: i32, reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut cursor = std::io::Cursor::new(reply_region);
        let n = cursor
            .read_i32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        let mut gtrids = Vec::with_capacity(n.max(0) as usize);
        for _ in 0..n {
            gtrids.push(
                cursor
                    .read_i32::<BigEndian>()
                    .map_err(|e| ClientError::NetworkFailure(e.to_string()))?,
            );
        }
        Ok(gtrids)
    }
}

/// `tran_2pc_attach_global_tran(gtrid)`: aborts the current transaction
/// and rebinds the session to the loose-end transaction named `gtrid`.
pub struct Tran2pcAttachGlobalTranRequest {
    pub gtrid: i32,
}

impl Request for Tran2pcAttachGlobalTranRequest {
    type Reply = ();

    fn op_id(&self) -> OpId {
        OpId::Tran2pcAttachGlobalTran
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.put_i32(self.gtrid)
    }

    fn decode_reply(_status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        Ok(())
    }
}
