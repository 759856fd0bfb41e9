use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::instrument;
use wire::OutputBuffer;

use common::err::client_error::ClientError;
use common::err::CResult;

use crate::reply::status_to_error;
use crate::request::Request;
use crate::transport::Transport;

/// The single generic driver for every RPC shape in §4.4: build the
/// request frame with A+B, transmit, receive the reply frame, unpack.
/// One dispatch loop parameterised by the request/reply types each RPC
/// declares, rather than a one-off call site per operation.
#[derive(Debug)]
pub struct Dispatcher<T: Transport> {
    transport: T,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Step 1-2: sum argument disk sizes into one bounded buffer, pack
    /// op id + arg region. A bounded 64 KiB scratch capacity is used for
    /// the typical request; oversized requests (e.g. a large Copy Area
    /// being forced) size themselves explicitly via `encode_args`
    /// writing into a larger buffer before the frame is assembled here
    /// is not supported — callers with such payloads should prefer
    /// `send_raw` directly.
    fn build_frame(req: &impl Request) -> CResult<Vec<u8>> {
        let mut arg_buf = OutputBuffer::with_capacity(64 * 1024);
        req.encode_args(&mut arg_buf)?;
        let arg_bytes = arg_buf.into_vec();

        let mut frame = Vec::with_capacity(8 + arg_bytes.len());
        let op_id: i32 = req.op_id().into();
        frame
            .write_i32::<BigEndian>(op_id)
            .map_err(|e| ClientError::Bug(e.to_string()))?;
        frame
            .write_u32::<BigEndian>(arg_bytes.len() as u32)
            .map_err(|e| ClientError::Bug(e.to_string()))?;
        frame.extend_from_slice(&arg_bytes);
        Ok(frame)
    }

    /// Sends `req` and, unless it is a no-reply call, waits for and
    /// unpacks the reply. This is the single call site every concrete
    /// RPC in `protocol::rpc` goes through.
    #[instrument(skip(self, req))]
    pub fn call<R: Request>(&mut self, req: &R) -> CResult<R::Reply> {
        let frame = Self::build_frame(req)?;
        self.transport.write_frame(&frame)?;

        if req.no_reply() {
            return R::decode_reply(0, &[], &[]);
        }

        let body = self.transport.read_frame()?;
        let (status, reply_region, reply_data) = decode_reply_frame(&body)?;
        if let Some(err) = status_to_error(status) {
            // Per §7: a failing RPC still returns a structured error;
            // the caller (txn/dbclient) is responsible for running any
            // cache-invalidation cleanup before propagating it.
            return Err(err);
        }
        R::decode_reply(status, &reply_region, &reply_data)
    }
}

/// `[status:i32][reply_region_len:u32][reply_region][n_data:u32]{[len:u32][bytes]}*`
fn decode_reply_frame(body: &[u8]) -> CResult<(i32, Vec<u8>, Vec<Vec<u8>>)> {
    let mut cursor = std::io::Cursor::new(body);
    let status = cursor
        .read_i32::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    let region_len = cursor
        .read_u32::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))? as usize;
    let mut reply_region = vec![0u8; region_len];
    std::io::Read::read_exact(&mut cursor, &mut reply_region)
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;

    let n_data = cursor
        .read_u32::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    let mut reply_data = Vec::with_capacity(n_data as usize);
    for _ in 0..n_data {
        let len = cursor
            .read_u32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))? as usize;
        let mut block = vec![0u8; len];
        std::io::Read::read_exact(&mut cursor, &mut block)
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        reply_data.push(block);
    }
    Ok((status, reply_region, reply_data))
}

/// Assembles a reply frame body; used by tests to feed
/// `LoopbackTransport` canned replies, matching the exact wire shape
/// `decode_reply_frame` expects.
pub fn encode_reply_frame(status: i32, reply_region: &[u8], reply_data: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_i32::<BigEndian>(status).unwrap();
    out.write_u32::<BigEndian>(reply_region.len() as u32).unwrap();
    out.extend_from_slice(reply_region);
    out.write_u32::<BigEndian>(reply_data.len() as u32).unwrap();
    for block in reply_data {
        out.write_u32::<BigEndian>(block.len() as u32).unwrap();
        out.extend_from_slice(block);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op_id::OpId;
    use crate::transport::LoopbackTransport;

    struct Ping;

    impl Request for Ping {
        type Reply = i32;

        fn op_id(&self) -> OpId {
            OpId::SetInterrupt
        }

        fn encode_args(&self, _buf: &mut OutputBuffer) -> CResult<()> {
            Ok(())
        }

        fn decode_reply(status: i32, _reply_region: &[u8], _reply_data: &[Vec<u8>]) -> CResult<Self::Reply> {
            Ok(status)
        }
    }

    #[test]
    fn call_roundtrips_through_loopback() {
        let mut transport = LoopbackTransport::new();
        transport.push_reply(encode_reply_frame(0, &[], &[]));
        let mut dispatcher = Dispatcher::new(transport);
        let reply = dispatcher.call(&Ping).unwrap();
        assert_eq!(reply, 0);
        assert_eq!(dispatcher.transport_mut().sent.len(), 1);
    }

    #[test]
    fn nonzero_status_surfaces_as_error() {
        let mut transport = LoopbackTransport::new();
        transport.push_reply(encode_reply_frame(-2, &[], &[]));
        let mut dispatcher = Dispatcher::new(transport);
        let err = dispatcher.call(&Ping).unwrap_err();
        assert!(matches!(err, ClientError::Aborted));
    }
}
