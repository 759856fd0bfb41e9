//! Transaction Manager (component F): owns the per-session state
//! machine of §4.6 — commit/abort, savepoints, nested top-operations,
//! isolation/lock-wait knobs, loose-end draining, and the two-phase
//! commit participant role — layered over D (`protocol`) and E
//! (`dbworkspace`).

pub mod isolation;
pub mod looseend;
pub mod manager;
pub mod savepoint;
pub mod state;
pub mod topop;

pub use isolation::IsolationLevel;
pub use manager::TransactionManager;
pub use savepoint::SavepointList;
pub use state::TxnState;
