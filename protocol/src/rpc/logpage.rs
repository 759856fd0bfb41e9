use byteorder::{BigEndian, ReadBytesExt};

use common::err::client_error::ClientError;
use common::err::CResult;
use wire::OutputBuffer;

use crate::op_id::OpId;
use crate::request::Request;

/// Pull mode for the log-writer follower loop (§4.7): `Async` returns
/// whatever is available immediately, `Sync` blocks until the next
/// commit is durable, `SemiSync` behaves as `Sync` until caught up then
/// switches to `Async`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Sync,
    Async,
    SemiSync,
}

impl FetchMode {
    fn to_wire(self) -> i32 {
        match self {
            FetchMode::Sync => 0,
            FetchMode::Async => 1,
            FetchMode::SemiSync => 2,
        }
    }
}

/// `fetch_log_pages`: reply + Log Page area shape (§4.4, §4.7). The
/// distinguished header page (id 0) is requested on the first exchange
/// with a never-contacted server so the client can validate database
/// identity before consuming data pages.
pub struct FetchLogPagesRequest {
    pub first_page: i64,
    pub mode: FetchMode,
    pub last_error: i32,
}

#[derive(Debug, Clone)]
pub struct FetchLogPagesReply {
    pub eof_pageid: i64,
    pub server_crashed: bool,
    /// Raw fixed-size page blocks, in ascending page-id order starting
    /// at `first_page` (or at the header page, id 0, for the first
    /// never-contacted-server exchange).
    pub pages: Vec<Vec<u8>>,
}

impl Request for FetchLogPagesRequest {
    type Reply = FetchLogPagesReply;

    fn op_id(&self) -> OpId {
        OpId::FetchLogPages
    }

    fn encode_args(&self, buf: &mut OutputBuffer) -> CResult<()> {
        buf.align8()?;
        buf.put_i64(self.first_page)?;
        buf.align8()?;
        buf.put_i32(self.mode.to_wire())?;
        buf.put_i32(self.last_error)
    }

    fn decode_reply(_status: i32, reply_region: &[u8], reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
        let mut cursor = std::io::Cursor::new(reply_region);
        let eof_pageid = cursor
            .read_i64::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        let server_crashed = cursor
            .read_u8()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?
            != 0;
        Ok(FetchLogPagesReply {
            eof_pageid,
            server_crashed,
            pages: reply_data.to_vec(),
        })
    }
}
