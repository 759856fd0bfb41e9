//! The application-facing facade binding components D (`protocol`), E
//! (`dbworkspace`), and F (`txn`) into one [`Session`] object.
//!
//! Component G (`logwriter`) is deliberately *not* wired into
//! [`Session`]: per §2's data-flow note, "G runs as an independent pull
//! loop using D" — a log-writer follower drives its own
//! `protocol::Dispatcher` against a replica connection, independent of
//! an application session's transaction lifecycle. Construct a
//! [`logwriter::LogWriterFollower`] directly for that use case; it
//! composes with the same `protocol::transport::Transport` impls this
//! crate uses.

pub mod forcer;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::instrument;

use common::err::CResult;
use protocol::copy_area::CopyArea;
use protocol::dispatch::Dispatcher;
use protocol::rpc::admin::{ChangeModeRequest, CheckpointTriggerRequest, OperatingMode, SetInterruptRequest};
use protocol::rpc::locator::LocatorFetchRequest;
use protocol::rpc::looseend::LooseEndAction;
use protocol::rpc::query::{QueryExecuteReply, QueryExecuteRequest};
use protocol::transport::{TcpTransport, Transport};
use dbworkspace::{InMemoryWorkspace, WorkspaceHooks};
use txn::{IsolationLevel, TransactionManager, TxnState};
use wire::Oid;

pub use forcer::LocatorForcer;

/// Runs one server-dictated deferred loose-end action (§4.6, GLOSSARY
/// "Loose-end action"). `rcvindex` names which statically-keyed action
/// to run; the closed catalogue of concrete actions is a named
/// collaborator (the trigger/schema-DDL subsystems this pipeline hands
/// off to), so the default implementation below simply acknowledges
/// every action — applications that need real loose-end replay provide
/// their own [`LooseEndHandler`].
pub trait LooseEndHandler {
    fn run(&mut self, action: &LooseEndAction) -> CResult<()>;
}

/// Acknowledges every loose-end action without side effects. Correct
/// whenever the server never actually hands back pending actions (the
/// common case outside of trigger/cascade-heavy schemas); sufficient to
/// drive property 6 (commit idempotence on loose ends).
#[derive(Debug, Default)]
pub struct NoopLooseEndHandler;

impl LooseEndHandler for NoopLooseEndHandler {
    fn run(&mut self, _action: &LooseEndAction) -> CResult<()> {
        Ok(())
    }
}

/// One application-visible database session: owns the transport (via a
/// shared [`Dispatcher`]), the transaction state machine, and the
/// workspace object cache. Not `Sync` by construction — `Rc<RefCell<_>>`
/// guards the dispatcher, a single-threaded-per-connection design (§5).
pub struct Session<T: Transport, W: WorkspaceHooks = InMemoryWorkspace> {
    dispatcher: Rc<RefCell<Dispatcher<T>>>,
    forcer: LocatorForcer<T>,
    txn: TransactionManager<T, W>,
}

impl<T: Transport, W: WorkspaceHooks> Session<T, W> {
    pub fn new(transport: T, workspace: W) -> Self {
        let dispatcher = Rc::new(RefCell::new(Dispatcher::new(transport)));
        let forcer = LocatorForcer::new(dispatcher.clone());
        let txn = TransactionManager::with_shared_dispatcher(dispatcher.clone(), workspace);
        Self {
            dispatcher,
            forcer,
            txn,
        }
    }

    pub fn state(&self) -> TxnState {
        self.txn.state()
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.txn.isolation()
    }

    pub fn lock_wait_msecs(&self) -> i32 {
        self.txn.lock_wait_msecs()
    }

    pub fn get_savepoints(&self) -> Vec<&str> {
        self.txn.get_savepoints()
    }

    pub fn workspace(&self) -> &W {
        self.txn.workspace()
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        self.txn.workspace_mut()
    }

    /// Session-control knobs exposed at the CLI per §6.
    pub fn reset_isolation(&mut self, level: IsolationLevel, async_workspace: bool) -> CResult<()> {
        self.txn.reset_isolation(level, async_workspace)
    }

    /// `secs < 0` means infinite, `0` means no-wait, per §6.
    pub fn reset_wait_times(&mut self, secs: i32) -> CResult<()> {
        let msecs = if secs < 0 { secs } else { secs.saturating_mul(1000) };
        self.txn.reset_wait_times(msecs)
    }

    pub async fn savepoint(&mut self, name: &str) -> CResult<()> {
        self.txn.savepoint(name, &mut self.forcer).await
    }

    pub fn partial_abort(&mut self, name: &str) -> CResult<()> {
        self.txn.partial_abort(name)
    }

    pub fn start_topop(&mut self) -> CResult<()> {
        self.txn.start_topop()
    }

    pub fn end_topop(&mut self, commit: bool) -> CResult<()> {
        self.txn.end_topop(commit)
    }

    /// Flushes dirty workspace objects, commits, and runs every
    /// postpone loose-end through `handler` if the server returns
    /// `WITH_CLIENT_LOOSE_ENDS` (§4.6, §5's ordering guarantee).
    #[instrument(skip(self, handler))]
    pub async fn commit(&mut self, retain_lock: bool, handler: &mut dyn LooseEndHandler) -> CResult<()> {
        self.txn.commit(retain_lock, &mut self.forcer).await?;
        self.drain_postpone_fully(handler)
    }

    /// Aborts (no network round trip for object state) and runs every
    /// undo loose-end through `handler` if the server left any.
    #[instrument(skip(self, handler))]
    pub fn abort(&mut self, handler: &mut dyn LooseEndHandler) -> CResult<()> {
        self.txn.abort()?;
        self.drain_undo_fully(handler)
    }

    /// Remaps a mid-transaction network failure onto §4.6's unilateral
    /// abort and runs any undo loose-ends the local reset implies.
    pub fn handle_unilateral_failure(
        &mut self,
        err: common::err::client_error::ClientError,
        handler: &mut dyn LooseEndHandler,
    ) -> common::err::client_error::ClientError {
        let remapped = self.txn.handle_unilateral_failure(err);
        let _ = self.drain_undo_fully(handler);
        remapped
    }

    fn drain_postpone_fully(&mut self, handler: &mut dyn LooseEndHandler) -> CResult<()> {
        while let Some(action) = self.txn.drain_postpone()? {
            handler.run(&action)?;
        }
        Ok(())
    }

    fn drain_undo_fully(&mut self, handler: &mut dyn LooseEndHandler) -> CResult<()> {
        while let Some(action) = self.txn.drain_undo()? {
            handler.run(&action)?;
        }
        Ok(())
    }

    // --- Two-phase commit (§4.6) ---

    pub fn start_2pc(&mut self) -> CResult<i32> {
        self.txn.start_2pc()
    }

    pub async fn prepare_2pc(&mut self) -> CResult<()> {
        self.txn.prepare_2pc(&mut self.forcer).await
    }

    pub fn recovery_prepared(&mut self, max: i32) -> CResult<Vec<i32>> {
        self.txn.recovery_prepared(max)
    }

    pub fn attach_global_tran(&mut self, gtrid: i32) -> CResult<()> {
        self.txn.attach_global_tran(gtrid)
    }

    pub fn set_global_tran_info(&mut self, info: Vec<u8>) {
        self.txn.set_global_tran_info(info)
    }

    pub fn get_global_tran_info(&self) -> Option<&[u8]> {
        self.txn.get_global_tran_info()
    }

    pub fn gtrid(&self) -> Option<i32> {
        self.txn.gtrid()
    }

    /// The shared `protocol::Dispatcher` backing this session, for
    /// callers (e.g. integration tests, or a caller layering its own
    /// direct RPCs over this session) that need the raw request/reply
    /// channel `fetch_objects`/`query_execute` already use internally.
    pub fn shared_dispatcher(&self) -> Rc<RefCell<Dispatcher<T>>> {
        self.dispatcher.clone()
    }

    // --- Direct RPCs (D), outside the transaction state machine ---

    /// `locator_fetch`: bulk object fetch (reply + Copy Area shape,
    /// §4.4).
    pub fn fetch_objects(&mut self, oids: Vec<Oid>) -> CResult<CopyArea> {
        self.dispatcher.borrow_mut().call(&LocatorFetchRequest { oids })
    }

    /// `query_execute`: reply + 2 data blocks shape (§4.4).
    pub fn query_execute(&mut self, xasl: Vec<u8>) -> CResult<QueryExecuteReply> {
        self.dispatcher
            .borrow_mut()
            .call(&QueryExecuteRequest { xasl })
    }

    /// `set_interrupt`: fire-and-forget; may race with the reply to the
    /// call it interrupts (§5).
    pub fn set_interrupt(&mut self, flag: bool) -> CResult<()> {
        self.dispatcher
            .borrow_mut()
            .call(&SetInterruptRequest { flag })
    }

    pub fn checkpoint_trigger(&mut self) -> CResult<()> {
        self.dispatcher.borrow_mut().call(&CheckpointTriggerRequest)
    }

    /// `changemode`: admin HA-role toggle, only valid in stand-alone
    /// mode (§6) — this binding always reports `OnlyInStandalone` since
    /// `protocol` does not implement the stand-alone transport variant
    /// (DESIGN.md Open Question resolution).
    pub fn changemode(&mut self, new_role: i32) -> CResult<()> {
        self.dispatcher.borrow_mut().call(&ChangeModeRequest {
            new_role,
            mode: OperatingMode::ClientServer,
        })
    }
}

impl<W: WorkspaceHooks> Session<TcpTransport, W> {
    /// Connects a TCP session to `host:port` (§6's connection
    /// endpoint).
    pub fn connect(host: &str, port: u16, workspace: W) -> CResult<Self> {
        let transport = TcpTransport::connect(host, port)?;
        Ok(Self::new(transport, workspace))
    }
}

impl Session<TcpTransport, InMemoryWorkspace> {
    pub fn connect_default(host: &str, port: u16) -> CResult<Self> {
        Self::connect(host, port, InMemoryWorkspace::new())
    }
}

#[cfg(test)]
mod test {
    use byteorder::{BigEndian, WriteBytesExt};

    use protocol::dispatch::encode_reply_frame;
    use protocol::transport::LoopbackTransport;

    use super::*;

    fn new_session() -> Session<LoopbackTransport, InMemoryWorkspace> {
        Session::new(LoopbackTransport::new(), InMemoryWorkspace::new())
    }

    fn push_commit_reply(session: &mut Session<LoopbackTransport, InMemoryWorkspace>, code: i32) {
        let mut buf = Vec::new();
        buf.write_i32::<BigEndian>(code).unwrap();
        buf.push(0);
        buf.push(0);
        session
            .dispatcher
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, &buf, &[]));
    }

    #[tokio::test]
    async fn commit_with_no_loose_ends_settles_committed() {
        let mut session = new_session();
        push_commit_reply(&mut session, 0);
        let mut handler = NoopLooseEndHandler;
        session.commit(false, &mut handler).await.unwrap();
        assert_eq!(session.state(), TxnState::UnactiveCommitted);
    }

    #[test]
    fn fetch_objects_round_trips_through_shared_dispatcher() {
        let mut session = new_session();
        let area = CopyArea::new(Oid::new(1, 1, 1));
        let mut out = wire::OutputBuffer::with_capacity(256);
        use wire::Encode;
        area.encode(&mut out).unwrap();
        session
            .dispatcher
            .borrow_mut()
            .transport_mut()
            .push_reply(encode_reply_frame(0, out.as_slice(), &[]));

        let fetched = session.fetch_objects(vec![Oid::new(1, 2, 3)]).unwrap();
        assert_eq!(fetched.class_oid, Oid::new(1, 1, 1));
    }

    #[test]
    fn changemode_in_client_server_mode_is_rejected_locally() {
        let mut session = new_session();
        let err = session.changemode(1).unwrap_err();
        assert!(matches!(err, common::err::client_error::ClientError::OnlyInStandalone));
    }
}
