/// The transaction state machine of §4.6, collapsed to the states a
/// session is ever observed in (the diagram's `ACTIVE ->` arrows are
/// the methods on [`crate::manager::TransactionManager`] that cause the
/// transitions, not states themselves).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    Active,
    UnactiveCommitted,
    /// Equivalent naming for the same situation per §4.6: "committed
    /// with postpone" and "committed with client loose ends" name the
    /// same transitional state.
    UnactiveCommittedWithClientLooseEnds,
    UnactiveAborted,
    UnactiveAbortedWithClientLooseEnds,
    /// Committed only by a later `commit()`, per the prepare leg of
    /// two-phase commit.
    Unactive2pcPrepare,
}

impl TxnState {
    pub fn is_active(self) -> bool {
        matches!(self, TxnState::Active)
    }

    /// Whether `commit()` is callable from this state: either an
    /// ordinary active transaction, or one this session previously
    /// prepared (2PC) and is now finalising.
    pub fn is_committable(self) -> bool {
        matches!(self, TxnState::Active | TxnState::Unactive2pcPrepare)
    }

    pub fn has_pending_loose_ends(self) -> bool {
        matches!(
            self,
            TxnState::UnactiveCommittedWithClientLooseEnds | TxnState::UnactiveAbortedWithClientLooseEnds
        )
    }
}
