//! S5: flushing new and dirty workspace objects resolves temporary OIDs
//! to permanent ones through a `CopyArea` round trip over a real
//! `protocol::Dispatcher`, the way `dbclient::Session::commit` drives
//! `dbworkspace::InMemoryWorkspace::flush_all` rather than through
//! `workspace`'s own white-box unit tests.

#[cfg(test)]
mod pipeline_copy_area {
    use protocol::copy_area::{CopyArea, CopyOperation};
    use protocol::dispatch::{encode_reply_frame, Dispatcher};
    use protocol::rpc::locator::LocatorForceRequest;
    use protocol::transport::LoopbackTransport;
    use dbworkspace::{is_temporary_oid, InMemoryWorkspace, ObjectForcer, WorkspaceHooks};
    use wire::{Encode, Oid, OutputBuffer};

    struct DispatcherForcer {
        dispatcher: Dispatcher<LoopbackTransport>,
    }

    impl ObjectForcer for DispatcherForcer {
        fn force(&mut self, area: CopyArea) -> common::err::CResult<CopyArea> {
            self.dispatcher.call(&LocatorForceRequest { copy_area: area })
        }
    }

    fn push_forced_reply(transport: &mut LoopbackTransport, forced: &CopyArea) {
        let mut out = OutputBuffer::with_capacity(256);
        forced.encode(&mut out).unwrap();
        transport.push_reply(encode_reply_frame(0, out.as_slice(), &[]));
    }

    #[tokio::test]
    async fn flush_all_round_trips_new_objects_to_permanent_oids() {
        let class_oid = Oid::new(1, 1, 1);
        let mut workspace = InMemoryWorkspace::new();
        let h1 = workspace.insert_new(class_oid, true, b"row-one".to_vec());
        let h2 = workspace.insert_new(class_oid, true, b"row-two".to_vec());
        assert!(is_temporary_oid(workspace.get(h1).unwrap().oid));
        assert!(is_temporary_oid(workspace.get(h2).unwrap().oid));

        let mut transport = LoopbackTransport::new();
        let mut forced = CopyArea::new(class_oid);
        forced.push(CopyOperation::Insert, Oid::new(1, 100, 0), class_oid, b"row-one");
        forced.push(CopyOperation::Insert, Oid::new(1, 101, 0), class_oid, b"row-two");
        push_forced_reply(&mut transport, &forced);

        let mut forcer = DispatcherForcer {
            dispatcher: Dispatcher::new(transport),
        };
        workspace.flush_all(&mut forcer).await.unwrap();

        assert!(!is_temporary_oid(workspace.get(h1).unwrap().oid));
        assert_eq!(workspace.get(h1).unwrap().oid, Oid::new(1, 100, 0));
        assert_eq!(workspace.get(h2).unwrap().oid, Oid::new(1, 101, 0));
        assert!(!workspace.needs_flush());
    }
}
