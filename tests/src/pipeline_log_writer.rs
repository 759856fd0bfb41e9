//! Drives a [`logwriter::LogWriterFollower`] against a real
//! `protocol::Dispatcher` end-to-end: header bootstrap on a
//! never-contacted server, then ordinary data-page rounds, writing
//! through [`logwriter::FilePageSink`] rather than a recording test
//! double, so the on-disk page-offset convention is exercised too.

#[cfg(test)]
mod pipeline_log_writer {
    use byteorder::{BigEndian, WriteBytesExt};

    use logwriter::{FilePageSink, FollowerConfig, LogWriterFollower, LogWriterPaths, PageSink, RoundOutcome, LOG_PAGE_SIZE};
    use protocol::dispatch::{encode_reply_frame, Dispatcher};
    use protocol::rpc::logpage::FetchMode;
    use protocol::transport::LoopbackTransport;

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

    fn push_fetch_reply(transport: &mut LoopbackTransport, eof_pageid: i64, pages: Vec<Vec<u8>>) {
        transport.push_reply(encode_reply_frame(0, &reply_bytes(eof_pageid, false), &pages));
    }

    #[test]
    fn follower_writes_fetched_pages_at_their_computed_file_offset() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LogWriterPaths::new(dir.path(), "orders");
        let mut sink = FilePageSink::open(&paths).unwrap();

        let mut transport = LoopbackTransport::new();
        push_fetch_reply(
            &mut transport,
            2,
            vec![header_page_bytes(2, 1000, 0, 100), vec![9u8; 4], vec![9u8; 4], vec![9u8; 4]],
        );
        let mut follower = LogWriterFollower::new(Dispatcher::new(transport), FollowerConfig { mode: FetchMode::Async });

        let outcome = follower.run_until_caught_up(&mut sink, 5).unwrap();
        assert_eq!(outcome, RoundOutcome::CaughtUp);
        sink.flush().unwrap();

        let contents = std::fs::read(paths.active_log_path()).unwrap();
        let offset = LOG_PAGE_SIZE as usize;
        assert_eq!(&contents[offset..offset + 4], &[9u8; 4]);
        assert_eq!(follower.state().last_recv_pageid, 3);
    }
}
