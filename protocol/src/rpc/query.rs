use byteorder::{BigEndian, ReadBytesExt};

use common::err::client_error::ClientError;
use common::err::CResult;
use wire::OutputBuffer;

use crate::op_id::OpId;
use crate::request::Request;

/// A query execution round-trip: reply + 2 data blocks (§4.4) — a
/// list-id descriptor and the last list page, matching the shape the
/// original calls `qp_get_sys_timestamp`/`qmgr_xxx` share with
/// `execute`.
pub struct QueryExecuteRequest {
    pub xasl: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct QueryExecuteReply {
    pub list_id: i32,
    pub last_page: i32,
    pub list_id_block: Vec<u8>,
    pub last_page_block: Vec<u8>,
}

impl Request for QueryExecuteRequest {
    type Reply = QueryExecuteReply;

    fn op_id(&self) -> OpId {
        OpId::QueryExecute
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        wire::put_varchar(buf, &self.xasl)
    }

    fn decode_reply(_status: i32, reply_region: &[u8], reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut cursor = std::io::Cursor::new(reply_region);
        let list_id = cursor
            .read_i32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        let last_page = cursor
            .read_i32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        let list_id_block = reply_data.first().cloned().unwrap_or_default();
        let last_page_block = reply_data.get(1).cloned().unwrap_or_default();
        Ok(QueryExecuteReply {
            list_id,
            last_page,
            list_id_block,
            last_page_block,
        })
    }
}
