//! S6: the two-phase-commit handshake — `start_2pc`, `prepare_2pc`,
//! then `recovery_prepared` on a second session listing the first
//! session's gtrid — driven through `dbclient::Session` rather than
//! `txn::TransactionManager` directly, the way an XA-aware caller
//! would actually use this pipeline.

#[cfg(test)]
mod pipeline_two_phase_commit {
    use byteorder::{BigEndian, WriteBytesExt};

    use dbclient::Session;
    use dbworkspace::InMemoryWorkspace;
    use protocol::dispatch::encode_reply_frame;
    use protocol::transport::LoopbackTransport;
    use txn::TxnState;

    fn new_session() -> Session<LoopbackTransport, InMemoryWorkspace> {
        Session::new(LoopbackTransport::new(), InMemoryWorkspace::new())
    }

    fn i32_reply(n: i32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_i32::<BigEndian>(n).unwrap();
        buf
    }

    fn gtrid_list_reply(gtrids: &[i32]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_i32::<BigEndian>(gtrids.len() as i32).unwrap();
        for g in gtrids {
            buf.write_i32::<BigEndian>(*g).unwrap();
        }
        buf
    }

    #[tokio::test]
    async fn start_then_prepare_advances_to_the_2pc_prepared_state() {
        let mut session = new_session();

        session
            .shared_dispatcher()
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &i32_reply(101), &[]));
        let gtrid = session.start_2pc().unwrap();
        assert_eq!(gtrid, 101);
        assert_eq!(session.gtrid(), Some(101));

        session
            .shared_dispatcher()
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &[], &[]));
        session.prepare_2pc().await.unwrap();
        assert_eq!(session.state(), TxnState::Unactive2pcPrepare);
    }

    #[tokio::test]
    async fn recovery_prepared_lists_a_previously_prepared_gtrid() {
        let mut session = new_session();
        session
            .shared_dispatcher()
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &gtrid_list_reply(&[101, 202]), &[]));

        let prepared = session.recovery_prepared(10).unwrap();
        assert_eq!(prepared, vec![101, 202]);
    }

    #[tokio::test]
    async fn global_tran_info_round_trips_locally_without_a_network_call() {
        let mut session = new_session();
        session.set_global_tran_info(b"opaque-xa-blob".to_vec());
        assert_eq!(session.get_global_tran_info(), Some(b"opaque-xa-blob".as_slice()));
    }
}
