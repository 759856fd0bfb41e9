use bitflags::bitflags;

use wire::Lsa;

bitflags! {
    /// Pending-action bit set (§3 "Log-Writer State"): mirrors the
    /// teacher's `SegmentManager` deferred-write bookkeeping, but keyed
    /// to the four actions a follower can have outstanding at once
    /// rather than one flag per call site.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PendingActions: u8 {
        /// Pages received but not yet appended to the active log file.
        const DELAYED_WRITE = 0b0001;
        /// An async-mode write whose completion hasn't been observed.
        const ASYNC_WRITE   = 0b0010;
        /// The header mirror changed and needs flushing to disk.
        const HDR_WRITE     = 0b0100;
        /// A page crossed the archive boundary; background archiving owes
        /// a write to the next archive file.
        const ARCHIVING     = 0b1000;
    }
}

/// Mirrors the fields of the server's log header this client needs to
/// decide what to request next (§3, §4.7). `nxarv_phy_pageid` names the
/// field from `original_source/log_impl.h` the archive-boundary
/// computation is pinned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHeaderMirror {
    pub eof_pageid: i64,
    pub last_checkpoint_pageid: i64,
    /// First page id of the next (not yet created) archive.
    pub nxarv_pageid: i64,
    /// Physical page id within an archive file that `nxarv_pageid`
    /// would land on; advances by one archive's worth of pages each
    /// time an archive is closed out.
    pub nxarv_phy_pageid: i64,
    pub pages_per_archive: i64,
}

impl LogHeaderMirror {
    /// Computes the physical offset (in pages) of `pageid` within its
    /// archive file, given the archive boundary recorded in this
    /// header. Pages at or past `nxarv_pageid` have no archive yet.
    pub fn physical_page_in_archive(&self, pageid: i64) -> Option<i64> {
        if pageid >= self.nxarv_pageid || self.pages_per_archive <= 0 {
            return None;
        }
        let pages_behind_boundary = self.nxarv_pageid - pageid;
        Some(self.nxarv_phy_pageid - pages_behind_boundary)
    }
}

/// Last known archived range (§3): archives `[0, last_archived_seq]`
/// are known to be complete and safe to prune from the active log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchivedRange {
    pub last_archived_seq: u32,
    pub last_archived_pageid: i64,
}

/// Per-follower state (§3 "Log-Writer State", §4.7's loop): everything
/// the follower loop needs across fetch rounds, independent of the
/// transport. One instance per replica being followed.
#[derive(Debug, Clone)]
pub struct LogWriterState {
    pub header: LogHeaderMirror,
    pub last_recv_pageid: i64,
    pub last_checkpoint_pageid: i64,
    pub archived: ArchivedRange,
    /// Pages received but not yet flushed to the active log file, in
    /// ascending page-id order.
    pub flush_queue: Vec<(i64, Vec<u8>)>,
    pub pending: PendingActions,
    pub ha_server_state: HaServerState,
    /// Whether the header page (distinguished id 0) has been exchanged
    /// with the server yet. Tracked separately from `last_recv_pageid`
    /// because the header page is not part of the data-page sequence
    /// (§4.7: "first exchange ... requests the header page").
    contacted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaServerState {
    Alive,
    /// The server crashed mid-stream (§4.7): the loop force-flushes any
    /// buffered writes, marks the header dead, and exits.
    Dead,
}

impl LogWriterState {
    pub fn new_never_contacted() -> Self {
        Self {
            header: LogHeaderMirror {
                eof_pageid: 0,
                last_checkpoint_pageid: 0,
                nxarv_pageid: 0,
                nxarv_phy_pageid: 0,
                pages_per_archive: 0,
            },
            last_recv_pageid: -1,
            last_checkpoint_pageid: -1,
            archived: ArchivedRange {
                last_archived_seq: 0,
                last_archived_pageid: -1,
            },
            flush_queue: Vec::new(),
            pending: PendingActions::empty(),
            ha_server_state: HaServerState::Alive,
            contacted: false,
        }
    }

    /// Whether this follower has never exchanged a page with the
    /// server (§4.7: "first exchange with a never-contacted server
    /// requests the header page").
    pub fn is_never_contacted(&self) -> bool {
        !self.contacted
    }

    /// Page id to request on the next fetch round.
    pub fn next_request_pageid(&self) -> i64 {
        if self.is_never_contacted() {
            // Distinguished header page id (§6).
            0
        } else {
            self.last_recv_pageid + 1
        }
    }

    pub fn is_behind(&self) -> bool {
        self.last_recv_pageid < self.header.eof_pageid
    }

    /// Records a header page reply distinct from ordinary data pages:
    /// primes `header`, but does not advance `last_recv_pageid` (the
    /// header page is id 0 by convention and is not part of the data
    /// page sequence).
    pub fn apply_header_reply(&mut self, header: LogHeaderMirror) {
        self.header = header;
        self.contacted = true;
        self.last_recv_pageid = self.last_recv_pageid.max(0);
        self.pending.insert(PendingActions::HDR_WRITE);
    }

    /// Queues a received data page and advances `last_recv_pageid`.
    /// Pages must arrive in ascending order (§4.4's FIFO guarantee).
    pub fn enqueue_page(&mut self, pageid: i64, bytes: Vec<u8>) {
        self.flush_queue.push((pageid, bytes));
        self.last_recv_pageid = self.last_recv_pageid.max(pageid);
        self.pending.insert(PendingActions::DELAYED_WRITE);
        if let Some(phys) = self.header.physical_page_in_archive(pageid) {
            let _ = phys;
        } else if pageid >= self.header.nxarv_pageid && self.header.pages_per_archive > 0 {
            self.pending.insert(PendingActions::ARCHIVING);
        }
    }

    /// Drains the flush queue, e.g. once a caller has written the pages
    /// to the local active-log file.
    pub fn drain_flush_queue(&mut self) -> Vec<(i64, Vec<u8>)> {
        self.pending.remove(PendingActions::DELAYED_WRITE);
        std::mem::take(&mut self.flush_queue)
    }

    pub fn mark_dead(&mut self) {
        self.ha_server_state = HaServerState::Dead;
        self.pending.insert(PendingActions::HDR_WRITE);
    }
}

impl Default for LogWriterState {
    fn default() -> Self {
        Self::new_never_contacted()
    }
}

/// Just the header's LSA-carrying summary; exposed for callers that
/// want to log progress without the full mirror.
pub fn eof_lsa(header: &LogHeaderMirror) -> Lsa {
    Lsa {
        pageid: header.eof_pageid,
        offset: 0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(eof: i64, nxarv: i64, nxarv_phy: i64, per_archive: i64) -> LogHeaderMirror {
        LogHeaderMirror {
            eof_pageid: eof,
            last_checkpoint_pageid: 0,
            nxarv_pageid: nxarv,
            nxarv_phy_pageid: nxarv_phy,
            pages_per_archive: per_archive,
        }
    }

    #[test]
    fn never_contacted_requests_header_page_first() {
        let state = LogWriterState::new_never_contacted();
        assert_eq!(state.next_request_pageid(), 0);
        assert!(state.is_never_contacted());
    }

    #[test]
    fn after_receiving_pages_next_request_follows_last_recv() {
        let mut state = LogWriterState::new_never_contacted();
        state.apply_header_reply(header(100, 1000, 0, 100));
        state.enqueue_page(1, vec![0u8; 4]);
        state.enqueue_page(2, vec![0u8; 4]);
        assert_eq!(state.next_request_pageid(), 3);
        assert_eq!(state.last_recv_pageid, 2);
    }

    #[test]
    fn physical_page_in_archive_computes_offset_from_boundary() {
        let h = header(0, 1000, 500, 100);
        assert_eq!(h.physical_page_in_archive(999), Some(499));
        assert_eq!(h.physical_page_in_archive(900), Some(400));
        assert_eq!(h.physical_page_in_archive(1000), None);
    }

    #[test]
    fn drain_flush_queue_clears_pending_delayed_write() {
        let mut state = LogWriterState::new_never_contacted();
        state.apply_header_reply(header(10, 1000, 0, 100));
        state.enqueue_page(1, vec![1, 2, 3]);
        assert!(state.pending.contains(PendingActions::DELAYED_WRITE));
        let drained = state.drain_flush_queue();
        assert_eq!(drained.len(), 1);
        assert!(!state.pending.contains(PendingActions::DELAYED_WRITE));
        assert!(state.flush_queue.is_empty());
    }

    #[test]
    fn mark_dead_sets_ha_server_state() {
        let mut state = LogWriterState::new_never_contacted();
        state.mark_dead();
        assert_eq!(state.ha_server_state, HaServerState::Dead);
    }
}
