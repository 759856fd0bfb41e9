//! Log-Writer Client (component G): a continuous pull of log pages
//! from a server for a replica follower — sync/async/semi-sync modes,
//! header mirroring, and background-archiving bookkeeping (§4.7).

pub mod follower;
pub mod mode;
pub mod paths;
pub mod state;

pub use follower::{FollowerConfig, LogWriterFollower, PageSink, RoundOutcome};
pub use paths::{FilePageSink, LogWriterPaths, LOG_PAGE_SIZE};
pub use state::{ArchivedRange, HaServerState, LogHeaderMirror, LogWriterState, PendingActions};
