use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use common::err::client_error::ClientError;
use common::err::CResult;

/// The byte-stream abstraction `protocol::dispatch` sends/receives
/// whole frames over. A frame is a 4-byte big-endian length prefix (per
/// §6: "every multi-byte integer is big-endian") followed by that many
/// bytes of frame body; `protocol::request`/`protocol::reply` own the
/// body's internal region layout.
pub trait Transport {
    fn write_frame(&mut self, body: &[u8]) -> CResult<()>;
    fn read_frame(&mut self) -> CResult<Vec<u8>>;
}

/// Heartbeat/idle latency budget added on top of a session's configured
/// lock-wait timeout before the transport itself gives up and reports
/// `NetworkFailure`, matching `connection::PacketChannel`'s
/// `TIMEOUT_LATENCY_DELTA` convention.
pub const TIMEOUT_LATENCY_DELTA: Duration = Duration::from_secs(10);

/// A single multiplexed byte-stream connection to one server node.
/// Synchronous and `!Send`-in-spirit: callers serialise all calls on a
/// session per §5.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn connect(host: &str, port: u16) -> CResult<Self> {
        let stream = TcpStream::connect((host, port))
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        stream
            .set_read_timeout(Some(TIMEOUT_LATENCY_DELTA))
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        Ok(Self { stream })
    }

    /// Cluster routing (§4.4 step 3): reroute this transport's
    /// underlying socket to a specific replica node, e.g. when a commit
    /// must land on the current HA active.
    pub fn reconnect(&mut self, host: &str, port: u16) -> CResult<()> {
        let stream = TcpStream::connect((host, port))
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        stream
            .set_read_timeout(Some(TIMEOUT_LATENCY_DELTA))
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        self.stream = stream;
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn write_frame(&mut self, body: &[u8]) -> CResult<()> {
        self.stream
            .write_u32::<BigEndian>(body.len() as u32)
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        self.stream
            .write_all(body)
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        Ok(())
    }

    fn read_frame(&mut self) -> CResult<Vec<u8>> {
        let len = self
            .stream
            .read_u32::<BigEndian>()
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        let mut body = vec![0u8; len as usize];
        self.stream
            .read_exact(&mut body)
            .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
        Ok(body)
    }
}

/// A FIFO loopback transport for unit/integration tests: `read_frame`
/// pops from a queue of canned reply bodies pushed in advance via
/// [`LoopbackTransport::push_reply`], and every `write_frame` is
/// recorded so a test can assert on the bytes a dispatch call actually
/// produced.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    pub sent: Vec<Vec<u8>>,
    pub replies: std::collections::VecDeque<Vec<u8>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&mut self, body: Vec<u8>) {
        self.replies.push_back(body);
    }
}

impl Transport for LoopbackTransport {
    fn write_frame(&mut self, body: &[u8]) -> CResult<()> {
        self.sent.push(body.to_vec());
        Ok(())
    }

    fn read_frame(&mut self) -> CResult<Vec<u8>> {
        self.replies
            .pop_front()
            .ok_or_else(|| ClientError::NetworkFailure("no queued reply".to_string()))
    }
}
