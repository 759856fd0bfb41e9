//! S3: set a savepoint, roll back to it with `partial_abort`, and
//! confirm the savepoint name stack and the underlying
//! `protocol::Dispatcher` round trip agree — `txn` driven over a real
//! `Dispatcher` the way `dbclient::Session` drives it, rather than
//! through `txn`'s own white-box unit tests.

#[cfg(test)]
mod pipeline_savepoint {
    use byteorder::{BigEndian, WriteBytesExt};

    use dbworkspace::InMemoryWorkspace;
    use protocol::copy_area::CopyArea;
    use protocol::dispatch::{encode_reply_frame, Dispatcher};
    use protocol::transport::LoopbackTransport;
    use dbworkspace::ObjectForcer;
    use txn::TransactionManager;
    use wire::{Encode, Lsa, OutputBuffer};

    struct NeverForcer;

    impl ObjectForcer for NeverForcer {
        fn force(&mut self, _area: CopyArea) -> common::err::CResult<CopyArea> {
            panic!("no dirty objects in these tests; flush should not be invoked")
        }
    }

    fn lsa_bytes(lsa: Lsa) -> Vec<u8> {
        let mut out = OutputBuffer::with_capacity(32);
        lsa.encode(&mut out).unwrap();
        out.into_vec()
    }

    fn abort_reply_bytes(state_code: i32, has_loose_ends: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_i32::<BigEndian>(state_code).unwrap();
        buf.push(has_loose_ends as u8);
        buf
    }

    #[tokio::test]
    async fn savepoint_then_partial_abort_leaves_the_session_active() {
        let dispatcher = Dispatcher::new(LoopbackTransport::new());
        let mut mgr = TransactionManager::new(dispatcher, InMemoryWorkspace::new());
        let mut forcer = NeverForcer;

        mgr.shared_dispatcher()
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &lsa_bytes(Lsa::NULL), &[]));
        mgr.savepoint("before_big_update", &mut forcer).await.unwrap();

        mgr.shared_dispatcher()
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &lsa_bytes(Lsa::NULL), &[]));
        mgr.partial_abort("before_big_update").unwrap();

        assert_eq!(mgr.state(), txn::TxnState::Active, "a partial abort does not end the transaction");
    }

    #[tokio::test]
    async fn full_abort_after_a_savepoint_drains_loose_ends_to_completion() {
        let dispatcher = Dispatcher::new(LoopbackTransport::new());
        let mut mgr = TransactionManager::new(dispatcher, InMemoryWorkspace::new());
        let mut forcer = NeverForcer;

        mgr.shared_dispatcher()
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &lsa_bytes(Lsa::NULL), &[]));
        mgr.savepoint("s1", &mut forcer).await.unwrap();

        mgr.shared_dispatcher()
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &abort_reply_bytes(2, false), &[]));
        mgr.abort().unwrap();

        assert_eq!(mgr.state(), txn::TxnState::UnactiveAborted);
        assert!(mgr.drain_undo().unwrap().is_none(), "no undo actions were ever queued");
    }
}
