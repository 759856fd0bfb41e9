use byteorder::{BigEndian, ReadBytesExt};
use tracing::{debug, instrument, warn};

use common::err::client_error::ClientError;
use common::err::CResult;
use protocol::dispatch::Dispatcher;
use protocol::rpc::logpage::{FetchLogPagesReply, FetchLogPagesRequest, FetchMode};
use protocol::transport::Transport;

use crate::mode::effective_mode;
use crate::state::{HaServerState, LogHeaderMirror, LogWriterState};

/// `$db_name_lgar${seq}`/`$db_name_lgat` writer the follower loop hands
/// completed pages to; kept as a trait (rather than requiring
/// `logwriter::paths::LogWriterPaths` directly) so tests can assert on
/// what the loop would have written without touching a filesystem.
pub trait PageSink {
    fn write_page(&mut self, pageid: i64, bytes: &[u8]) -> CResult<()>;
    /// Force-flush any buffered writes to durable storage; called on a
    /// `ServerCrashed` reply in `SemiSync` mode (§4.7) and when the loop
    /// shuts down cleanly.
    fn flush(&mut self) -> CResult<()>;
}

/// `configured` mode plus a place to note the last error seen, matching
/// `FetchLogPagesRequest::last_error` (§4.7's request shape — the
/// server uses it to detect a client retrying after a transient
/// failure).
#[derive(Debug, Clone, Copy)]
pub struct FollowerConfig {
    pub mode: FetchMode,
}

/// The `fetch_log_pages` pull loop of §4.7, generic over the transport
/// carrying it and the page sink writing received pages to the replica
/// directory.
pub struct LogWriterFollower<T: Transport> {
    dispatcher: Dispatcher<T>,
    config: FollowerConfig,
    state: LogWriterState,
    last_error: i32,
}

/// One fetch round's outcome, so a caller driving the loop (directly,
/// or via [`LogWriterFollower::run_until_caught_up`]) can observe
/// progress without re-deriving it from `state()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Progressed,
    CaughtUp,
    ServerCrashed,
}

impl<T: Transport> LogWriterFollower<T> {
    pub fn new(dispatcher: Dispatcher<T>, config: FollowerConfig) -> Self {
        Self {
            dispatcher,
            config,
            state: LogWriterState::new_never_contacted(),
            last_error: 0,
        }
    }

    pub fn state(&self) -> &LogWriterState {
        &self.state
    }

    /// One iteration of §4.7's loop body: compute the next page to
    /// request, pick a mode, call the server, and apply the reply.
    /// `sink` receives completed pages and is force-flushed on a
    /// `SemiSync` crash per the contract.
    #[instrument(skip(self, sink))]
    pub fn fetch_round(&mut self, sink: &mut dyn PageSink) -> CResult<RoundOutcome> {
        let mode = effective_mode(
            self.config.mode,
            self.state.last_recv_pageid,
            self.state.header.eof_pageid,
        );
        let first_page = self.state.next_request_pageid();

        let reply = self.dispatcher.call(&FetchLogPagesRequest {
            first_page,
            mode,
            last_error: self.last_error,
        })?;

        self.last_error = 0;
        self.apply_reply(first_page, reply, sink)
    }

    fn apply_reply(
        &mut self,
        first_page: i64,
        reply: FetchLogPagesReply,
        sink: &mut dyn PageSink,
    ) -> CResult<RoundOutcome> {
        self.state.header.eof_pageid = reply.eof_pageid;

        if reply.server_crashed {
            warn!("server reported crashed while streaming log pages");
            if self.config.mode == FetchMode::SemiSync {
                sink.flush()?;
            }
            self.state.mark_dead();
            return Ok(RoundOutcome::ServerCrashed);
        }

        if reply.pages.is_empty() {
            return Ok(RoundOutcome::CaughtUp);
        }

        // The first never-contacted-server exchange carries the
        // distinguished header page (id 0) instead of a data page.
        if self.state.is_never_contacted() && first_page == 0 {
            let header = decode_header_page(&reply.pages[0])?;
            self.state.apply_header_reply(header);
            for (i, page) in reply.pages.iter().enumerate().skip(1) {
                let pageid = first_page + i as i64;
                sink.write_page(pageid, page)?;
                self.state.enqueue_page(pageid, page.clone());
            }
        } else {
            for (i, page) in reply.pages.iter().enumerate() {
                let pageid = first_page + i as i64;
                sink.write_page(pageid, page)?;
                self.state.enqueue_page(pageid, page.clone());
            }
        }
        self.state.drain_flush_queue();

        debug!(last_recv_pageid = self.state.last_recv_pageid, "fetched log pages");
        if self.state.is_behind() {
            Ok(RoundOutcome::Progressed)
        } else {
            Ok(RoundOutcome::CaughtUp)
        }
    }

    /// Runs rounds until the follower has caught up to the server's
    /// `eof_lsa` (property 10) or the server reports a crash, bounding
    /// iterations so a misbehaving server can't hang a test/caller
    /// forever.
    pub fn run_until_caught_up(&mut self, sink: &mut dyn PageSink, max_rounds: u32) -> CResult<RoundOutcome> {
        for _ in 0..max_rounds {
            match self.fetch_round(sink)? {
                RoundOutcome::CaughtUp => return Ok(RoundOutcome::CaughtUp),
                RoundOutcome::ServerCrashed => return Ok(RoundOutcome::ServerCrashed),
                RoundOutcome::Progressed => continue,
            }
        }
        Err(ClientError::Bug(
            "log-writer follower did not catch up within max_rounds".to_string(),
        ))
    }

    pub fn is_dead(&self) -> bool {
        self.state.ha_server_state == HaServerState::Dead
    }
}

/// `[eof_pageid:i64][nxarv_pageid:i64][nxarv_phy_pageid:i64][pages_per_archive:i64][last_checkpoint_pageid:i64]`
fn decode_header_page(bytes: &[u8]) -> CResult<LogHeaderMirror> {
    let mut cursor = std::io::Cursor::new(bytes);
    let eof_pageid = cursor
        .read_i64::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    let nxarv_pageid = cursor
        .read_i64::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    let nxarv_phy_pageid = cursor
        .read_i64::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    let pages_per_archive = cursor
        .read_i64::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    let last_checkpoint_pageid = cursor
        .read_i64::<BigEndian>()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))?;
    Ok(LogHeaderMirror {
        eof_pageid,
        last_checkpoint_pageid,
        nxarv_pageid,
        nxarv_phy_pageid,
        pages_per_archive,
    })
}

#[cfg(test)]
mod test {
    use byteorder::WriteBytesExt;

    use protocol::dispatch::encode_reply_frame;
    use protocol::transport::LoopbackTransport;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        pages: Vec<(i64, Vec<u8>)>,
        flush_calls: u32,
    }

    impl PageSink for RecordingSink {
        fn write_page(&mut self, pageid: i64, bytes: &[u8]) -> CResult<()> {
            self.pages.push((pageid, bytes.to_vec()));
            Ok(())
        }

        fn flush(&mut self) -> CResult<()> {
            self.flush_calls += 1;
            Ok(())
        }
    }

    fn header_page_bytes(eof: i64, nxarv: i64, nxarv_phy: i64, per_archive: i64) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_i64::<BigEndian>(eof).unwrap();
        out.write_i64::<BigEndian>(nxarv).unwrap();
        out.write_i64::<BigEndian>(nxarv_phy).unwrap();
        out.write_i64::<BigEndian>(per_archive).unwrap();
        out.write_i64::<BigEndian>(0).unwrap();
        out
    }

    fn reply_bytes(eof_pageid: i64, crashed: bool) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_i64::<BigEndian>(eof_pageid).unwrap();
        out.write_u8(crashed as u8).unwrap();
        out
    }

    fn push_fetch_reply(transport: &mut LoopbackTransport, eof_pageid: i64, crashed: bool, pages: Vec<Vec<u8>>) {
        let region = reply_bytes(eof_pageid, crashed);
        transport.push_reply(encode_reply_frame(0, &region, &pages));
    }

    #[test]
    fn first_round_requests_header_page_then_data_pages() {
        let mut transport = LoopbackTransport::new();
        push_fetch_reply(
            &mut transport,
            3,
            false,
            vec![header_page_bytes(3, 1000, 0, 100), vec![1], vec![2], vec![3]],
        );
        let mut follower = LogWriterFollower::new(Dispatcher::new(transport), FollowerConfig { mode: FetchMode::Async });
        let mut sink = RecordingSink::default();

        let outcome = follower.fetch_round(&mut sink).unwrap();
        assert_eq!(outcome, RoundOutcome::CaughtUp);
        assert_eq!(follower.state().last_recv_pageid, 3);
        assert_eq!(sink.pages.len(), 3);
        assert_eq!(sink.pages[0].0, 1);
    }

    #[test]
    fn progress_property_reaches_server_eof_within_finite_rounds() {
        // Property 10: server at eof=5, follower starts never-contacted,
        // async mode; after finitely many rounds last_recv_pageid >= 5.
        let mut transport = LoopbackTransport::new();
        push_fetch_reply(&mut transport, 5, false, vec![header_page_bytes(5, 1000, 0, 100)]);
        push_fetch_reply(&mut transport, 5, false, vec![vec![0u8; 4], vec![0u8; 4]]);
        push_fetch_reply(&mut transport, 5, false, vec![vec![0u8; 4], vec![0u8; 4], vec![0u8; 4]]);
        let mut follower = LogWriterFollower::new(Dispatcher::new(transport), FollowerConfig { mode: FetchMode::Async });
        let mut sink = RecordingSink::default();

        let outcome = follower.run_until_caught_up(&mut sink, 10).unwrap();
        assert_eq!(outcome, RoundOutcome::CaughtUp);
        assert!(follower.state().last_recv_pageid >= 5);
    }

    #[test]
    fn server_crashed_in_semi_sync_flushes_and_marks_dead() {
        let mut transport = LoopbackTransport::new();
        push_fetch_reply(&mut transport, 10, false, vec![header_page_bytes(10, 1000, 0, 100)]);
        push_fetch_reply(&mut transport, 10, true, vec![]);
        let mut follower = LogWriterFollower::new(
            Dispatcher::new(transport),
            FollowerConfig { mode: FetchMode::SemiSync },
        );
        let mut sink = RecordingSink::default();

        follower.fetch_round(&mut sink).unwrap();
        let outcome = follower.fetch_round(&mut sink).unwrap();
        assert_eq!(outcome, RoundOutcome::ServerCrashed);
        assert!(follower.is_dead());
        assert_eq!(sink.flush_calls, 1);
    }
}
