use std::cell::RefCell;
use std::rc::Rc;

use tracing::instrument;

use common::err::client_error::ClientError;
use common::err::CResult;
use protocol::dispatch::Dispatcher;
use protocol::rpc::looseend::{
    GetFirstPostponeRequest, GetFirstUndoRequest, GetNextPostponeRequest, GetNextUndoRequest,
    HasFinishedPostponeRequest, HasFinishedUndoRequest,
};
use protocol::rpc::twopc::{
    Tran2pcAttachGlobalTranRequest, Tran2pcPrepareRequest, Tran2pcRecoveryPreparedRequest,
    Tran2pcStartRequest,
};
use protocol::rpc::txn_ops::{
    AbortRequest, CommitRequest, EndTopopRequest, PartialAbortRequest, ResetIsolationRequest,
    ResetWaitTimesRequest, SavepointRequest, StartTopopRequest,
};
use protocol::transport::Transport;
use dbworkspace::{ObjectForcer, WorkspaceHooks};

use crate::isolation::IsolationLevel;
use crate::looseend::LooseEndRegistry;
use crate::savepoint::SavepointList;
use crate::state::TxnState;
use crate::topop::TopopStack;

/// Raw state codes `tran_server_commit`/`tran_server_abort` return,
/// collapsing §4.6's diagram onto the four terminal legs a single call
/// can land on.
mod state_code {
    pub const COMMITTED: i32 = 0;
    pub const COMMITTED_WITH_POSTPONE: i32 = 1;
    pub const ABORTED: i32 = 2;
    pub const ABORTED_WITH_UNDO: i32 = 3;
}

/// §4: the Transaction Manager, composed over D (`protocol::Dispatcher`)
/// and E (`dbworkspace::WorkspaceHooks`) — one struct gluing the wire
/// client to a stateful session. One instance per session; not `Sync`,
/// matching §5's single-threaded-per-session model.
#[derive(Debug)]
pub struct TransactionManager<T: Transport, W: WorkspaceHooks> {
    dispatcher: Rc<RefCell<Dispatcher<T>>>,
    workspace: W,
    state: TxnState,
    isolation: IsolationLevel,
    lock_wait_msecs: i32,
    async_workspace: bool,
    savepoints: SavepointList,
    topops: TopopStack,
    loose_ends: LooseEndRegistry,
    gtrid: Option<i32>,
    global_tran_info: Option<Vec<u8>>,
}

impl<T: Transport, W: WorkspaceHooks> TransactionManager<T, W> {
    pub fn new(dispatcher: Dispatcher<T>, workspace: W) -> Self {
        Self::with_shared_dispatcher(Rc::new(RefCell::new(dispatcher)), workspace)
    }

    /// Builds a manager sharing an already-constructed dispatcher, e.g.
    /// one a `dbclient::Session` also hands to an `ObjectForcer` that
    /// issues `locator_force` calls over the same multiplexed byte
    /// stream (§1: "a single multiplexed byte-stream"; §5: one
    /// transport per session).
    pub fn with_shared_dispatcher(dispatcher: Rc<RefCell<Dispatcher<T>>>, workspace: W) -> Self {
        Self {
            dispatcher,
            workspace,
            state: TxnState::Active,
            isolation: IsolationLevel::ReadCommitted,
            lock_wait_msecs: -1,
            async_workspace: false,
            savepoints: SavepointList::new(),
            topops: TopopStack::new(),
            loose_ends: LooseEndRegistry::new(),
            gtrid: None,
            global_tran_info: None,
        }
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    pub fn workspace(&self) -> &W {
        &self.workspace
    }

    /// Shares this session's dispatcher, e.g. so a `dbclient::Session`
    /// can build an `ObjectForcer` that calls `locator_force` over the
    /// same transport this manager drives its own RPCs through.
    pub fn shared_dispatcher(&self) -> Rc<RefCell<Dispatcher<T>>> {
        self.dispatcher.clone()
    }

    pub fn workspace_mut(&mut self) -> &mut W {
        &mut self.workspace
    }

    /// `tran_savepoint`'s listing contract: user-established savepoints,
    /// newest first, with any `#sys_`-prefixed internal ones a
    /// collaborator may have pushed filtered out.
    pub fn get_savepoints(&self) -> Vec<&str> {
        self.savepoints.user_visible()
    }

    fn ensure_active(&self) -> CResult<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(ClientError::Aborted)
        }
    }

    /// `tran_reset_isolation`: §4.6, takes effect for the remainder of
    /// this transaction.
    pub fn reset_isolation(&mut self, level: IsolationLevel, async_workspace: bool) -> CResult<()> {
        self.ensure_active()?;
        self.dispatcher.borrow_mut().call(&ResetIsolationRequest {
            isolation: level.to_wire(),
            async_workspace,
        })?;
        self.isolation = level;
        self.async_workspace = async_workspace;
        Ok(())
    }

    /// `tran_reset_wait_times`: a negative value is preserved verbatim
    /// as "wait forever" per §4.6, not clamped to zero.
    pub fn reset_wait_times(&mut self, wait_msecs: i32) -> CResult<()> {
        self.ensure_active()?;
        self.dispatcher.borrow_mut().call(&ResetWaitTimesRequest { wait_msecs })?;
        self.lock_wait_msecs = wait_msecs;
        Ok(())
    }

    pub fn lock_wait_msecs(&self) -> i32 {
        self.lock_wait_msecs
    }

    /// `tran_savepoint`: flushes dirty workspace objects first (§4.5's
    /// ordering — a savepoint must be able to roll back object state
    /// too), then records the named point.
    #[instrument(skip(self, forcer))]
    pub async fn savepoint(&mut self, name: &str, forcer: &mut dyn ObjectForcer) -> CResult<()> {
        self.ensure_active()?;
        if name.is_empty() {
            return Err(ClientError::InvalidArgument(
                "savepoint name must not be empty".to_string(),
            ));
        }
        if self.workspace.needs_flush() {
            self.workspace.flush_all(forcer).await?;
        }
        self.dispatcher.borrow_mut().call(&SavepointRequest {
            name: name.to_string(),
        })?;
        self.savepoints.push(name.to_string());
        Ok(())
    }

    /// `tran_partial_abort` (§8 scenario S3): rolls back to `name`,
    /// dropping it and every savepoint established after it.
    pub fn partial_abort(&mut self, name: &str) -> CResult<()> {
        self.ensure_active()?;
        self.savepoints
            .truncate_through(name)
            .ok_or_else(|| ClientError::InvalidArgument(format!("no such savepoint '{}'", name)))?;
        self.dispatcher.borrow_mut().call(&PartialAbortRequest {
            name: name.to_string(),
        })?;
        self.workspace.abort_mops(true);
        self.workspace.clear_all_hints(true);
        Ok(())
    }

    pub fn start_topop(&mut self) -> CResult<()> {
        self.ensure_active()?;
        let lsa = self.dispatcher.borrow_mut().call(&StartTopopRequest)?;
        self.topops.push(lsa);
        Ok(())
    }

    pub fn end_topop(&mut self, commit: bool) -> CResult<()> {
        self.ensure_active()?;
        if self.topops.pop().is_none() {
            return Err(ClientError::Bug("end_topop with no open top-op".to_string()));
        }
        self.dispatcher.borrow_mut().call(&EndTopopRequest { commit })?;
        Ok(())
    }

    /// §5: flush dirty objects, then `tran_server_commit`. `retain_lock`
    /// forwards to the workspace's own hint-clearing so locks held for
    /// cursors opened `WITH HOLD` survive (§4.5).
    #[instrument(skip(self, forcer))]
    pub async fn commit(&mut self, retain_lock: bool, forcer: &mut dyn ObjectForcer) -> CResult<()> {
        if !self.state.is_committable() {
            return Err(ClientError::Aborted);
        }
        if self.workspace.needs_flush() {
            self.workspace.flush_all(forcer).await?;
        }

        let reply = self.dispatcher.borrow_mut().call(&CommitRequest { retain_lock })?;
        self.savepoints.clear();
        self.topops = TopopStack::new();
        self.loose_ends.reset();
        self.workspace.clear_query_results(true);

        self.state = match reply.state_code {
            state_code::COMMITTED => {
                self.workspace.clear_all_hints(retain_lock);
                TxnState::UnactiveCommitted
            }
            state_code::COMMITTED_WITH_POSTPONE => TxnState::UnactiveCommittedWithClientLooseEnds,
            state_code::ABORTED | state_code::ABORTED_WITH_UNDO => {
                // §7: "partial failures in F (e.g., commit rejected
                // post-flush) always run cache invalidation before
                // returning, so the session is left in a usable state" —
                // mirror `finish_abort`'s invalidation here rather than
                // erroring out with the session still marked Active.
                self.workspace.abort_mops(false);
                self.workspace.clear_all_hints(false);
                if reply.has_postpone || reply.state_code == state_code::ABORTED_WITH_UNDO {
                    TxnState::UnactiveAbortedWithClientLooseEnds
                } else {
                    TxnState::UnactiveAborted
                }
            }
            other => {
                return Err(ClientError::Bug(format!(
                    "commit returned unrecognised state code {}",
                    other
                )))
            }
        };
        let _ = reply.reset_on_commit;
        Ok(())
    }

    /// `tran_server_abort`: never touches the network for object state
    /// (an abort discards it), so no `ObjectForcer` is needed.
    #[instrument(skip(self))]
    pub fn abort(&mut self) -> CResult<()> {
        if self.state.is_active() {
            let reply = self.dispatcher.borrow_mut().call(&AbortRequest)?;
            self.finish_abort(reply.state_code, reply.has_loose_ends);
        } else {
            // Already unactive: an abort here is the client unwinding
            // after a failed commit, not a fresh server round trip.
            self.finish_abort(state_code::ABORTED, false);
        }
        Ok(())
    }

    fn finish_abort(&mut self, code: i32, has_loose_ends: bool) {
        self.savepoints.clear();
        self.topops = TopopStack::new();
        self.loose_ends.reset();
        self.workspace.abort_mops(false);
        self.workspace.clear_all_hints(false);
        self.workspace.clear_query_results(true);
        self.state = if has_loose_ends || code == state_code::ABORTED_WITH_UNDO {
            TxnState::UnactiveAbortedWithClientLooseEnds
        } else {
            TxnState::UnactiveAborted
        };
    }

    /// Maps a mid-transaction `NetworkFailure` onto §4.6's "Unilateral
    /// abort": the server is presumed to have rolled the transaction
    /// back on its side, so the client must do the same locally without
    /// a round trip, and the caller sees
    /// [`ClientError::ServerDownUnilaterallyAborted`] instead of the
    /// raw network error.
    pub fn handle_unilateral_failure(&mut self, err: ClientError) -> ClientError {
        if self.state.is_active() {
            if let ClientError::NetworkFailure(_) = err {
                self.finish_abort(state_code::ABORTED, false);
                return ClientError::ServerDownUnilaterallyAborted;
            }
        }
        err
    }

    /// Drains one postpone action if the current state has any pending
    /// (property 6): a no-op once the registry reports exhausted,
    /// whether called once or a hundred times.
    pub fn drain_postpone(&mut self) -> CResult<Option<protocol::rpc::looseend::LooseEndAction>> {
        if !matches!(self.state, TxnState::UnactiveCommittedWithClientLooseEnds) {
            return Ok(None);
        }
        if let Some(action) = self.loose_ends.take_next() {
            return Ok(Some(action));
        }
        if self.loose_ends.is_exhausted() {
            // §4.6: once the client has run every postpone action, it
            // tells the server it may close the log record.
            self.dispatcher.borrow_mut().call(&HasFinishedPostponeRequest)?;
            self.state = TxnState::UnactiveCommitted;
            return Ok(None);
        }
        let fetched = if self.loose_ends.is_primed() {
            self.dispatcher.borrow_mut().call(&GetNextPostponeRequest)?
        } else {
            self.dispatcher.borrow_mut().call(&GetFirstPostponeRequest)?
        };
        self.loose_ends.push_fetched(fetched);
        self.drain_postpone()
    }

    /// Drains one undo action for an aborted-with-loose-ends
    /// transaction; mirrors [`Self::drain_postpone`].
    pub fn drain_undo(&mut self) -> CResult<Option<protocol::rpc::looseend::LooseEndAction>> {
        if !matches!(self.state, TxnState::UnactiveAbortedWithClientLooseEnds) {
            return Ok(None);
        }
        if let Some(action) = self.loose_ends.take_next() {
            return Ok(Some(action));
        }
        if self.loose_ends.is_exhausted() {
            self.dispatcher.borrow_mut().call(&HasFinishedUndoRequest)?;
            self.state = TxnState::UnactiveAborted;
            return Ok(None);
        }
        let fetched = if self.loose_ends.is_primed() {
            self.dispatcher.borrow_mut().call(&GetNextUndoRequest)?
        } else {
            self.dispatcher.borrow_mut().call(&GetFirstUndoRequest)?
        };
        self.loose_ends.push_fetched(fetched);
        self.drain_undo()
    }


    // --- Two-phase commit (§4.6) ---

    pub fn start_2pc(&mut self) -> CResult<i32> {
        self.ensure_active()?;
        let gtrid = self.dispatcher.borrow_mut().call(&Tran2pcStartRequest)?;
        self.gtrid = Some(gtrid);
        Ok(gtrid)
    }

    /// `tran_2pc_prepare`: the only RPC that advances
    /// [`TxnState::Unactive2pcPrepare`]. Object flush must already have
    /// happened (a prepared transaction cannot later discover dirty
    /// objects), so this takes the same `ObjectForcer` as `commit`.
    #[instrument(skip(self, forcer))]
    pub async fn prepare_2pc(&mut self, forcer: &mut dyn ObjectForcer) -> CResult<()> {
        self.ensure_active()?;
        if self.workspace.needs_flush() {
            self.workspace.flush_all(forcer).await?;
        }
        self.dispatcher.borrow_mut().call(&Tran2pcPrepareRequest)?;
        self.state = TxnState::Unactive2pcPrepare;
        Ok(())
    }

    pub fn recovery_prepared(&mut self, max: i32) -> CResult<Vec<i32>> {
        self.dispatcher.borrow_mut().call(&Tran2pcRecoveryPreparedRequest { max })
    }

    /// `tran_2pc_attach_global_tran`: per §4.6, aborts whatever is
    /// active on this session first, then rebinds to `gtrid`.
    pub fn attach_global_tran(&mut self, gtrid: i32) -> CResult<()> {
        if self.state.is_active() {
            self.abort()?;
        }
        self.dispatcher.borrow_mut().call(&Tran2pcAttachGlobalTranRequest { gtrid })?;
        self.gtrid = Some(gtrid);
        self.state = TxnState::Unactive2pcPrepare;
        Ok(())
    }

    /// Application-defined opaque blob carried alongside a global
    /// transaction id (§4.6); stored client-side only, never
    /// interpreted.
    pub fn set_global_tran_info(&mut self, info: Vec<u8>) {
        self.global_tran_info = Some(info);
    }

    pub fn get_global_tran_info(&self) -> Option<&[u8]> {
        self.global_tran_info.as_deref()
    }

    pub fn gtrid(&self) -> Option<i32> {
        self.gtrid
    }
}
