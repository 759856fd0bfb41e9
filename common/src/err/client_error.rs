use std::fmt::Display;
use std::{fmt, io};

/// Client-visible error kinds, per §7 of the pipeline design.
///
/// A failing RPC returns one of these plus, where it carries file/line/
/// parameter context, a [`ErrorContext`] attached by `er_set`-style call
/// sites in `protocol`.
#[derive(Debug)]
pub enum ClientError {
    //////////////////////
    // Transport / network
    //////////////////////
    /// Server unreachable, or the connection died mid-call.
    NetworkFailure(String),
    /// A transaction was active when the network failed: the client must
    /// treat the transaction as unilaterally aborted by the server.
    ServerDownUnilaterallyAborted,

    //////////////////////
    // Codec / type system
    //////////////////////
    /// `setmem`/`setval` saw a byte length exceeding the domain's declared
    /// precision.
    DomainConflict(String),
    /// A null OID/BTID/key (or malformed savepoint name) was passed where
    /// a well-formed one was required.
    InvalidArgument(String),
    /// The codec cursor ran past its bounded capacity.
    BufferOverflow,
    /// Allocation of a request buffer failed.
    OutOfMemory,

    //////////////////////
    // Transaction manager
    //////////////////////
    /// The server rejected a lock request after waiting past the
    /// session's configured lock-wait timeout.
    LockWaitTimeout,
    /// The current transaction is no longer valid (already committed,
    /// aborted, or unilaterally aborted by the server).
    Aborted,
    /// A session tried to attach to a gtrid that is not in the prepared
    /// state.
    PreparedRecoveryRequired,
    /// An admin RPC that only makes sense in stand-alone mode was called
    /// against a client/server session.
    OnlyInStandalone,
    /// An admin RPC that only makes sense in client/server mode was
    /// called against a stand-alone session.
    NotInStandalone,

    //////////////////////
    // Ambient
    //////////////////////
    ConfigFileParseErr(String),
    IoError(io::Error),
    /// A condition that should never happen; if it does, it is a bug.
    Bug(String),
    String(String),
}

impl Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::NetworkFailure(s) => write!(f, "network failure: {}", s),
            ClientError::ServerDownUnilaterallyAborted => {
                write!(f, "server connection lost; transaction unilaterally aborted")
            }
            ClientError::DomainConflict(s) => write!(f, "domain conflict: {}", s),
            ClientError::InvalidArgument(s) => write!(f, "invalid argument: {}", s),
            ClientError::BufferOverflow => write!(f, "codec buffer overflow"),
            ClientError::OutOfMemory => write!(f, "out of memory allocating request buffer"),
            ClientError::LockWaitTimeout => write!(f, "lock wait timeout"),
            ClientError::Aborted => write!(f, "transaction is no longer active"),
            ClientError::PreparedRecoveryRequired => {
                write!(f, "gtrid is not in the prepared state")
            }
            ClientError::OnlyInStandalone => write!(f, "operation is only valid in stand-alone mode"),
            ClientError::NotInStandalone => write!(f, "operation is not valid in stand-alone mode"),
            ClientError::ConfigFileParseErr(s) => write!(f, "config parse error: {}", s),
            ClientError::IoError(err) => write!(f, "{}", err),
            ClientError::Bug(s) => write!(f, "bug: {}", s),
            ClientError::String(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<io::Error> for ClientError {
    fn from(error: io::Error) -> Self {
        ClientError::IoError(error)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_is_stable_for_structured_variants() {
        assert_eq!(
            ClientError::DomainConflict("CHAR(3)".to_string()).to_string(),
            "domain conflict: CHAR(3)"
        );
        assert_eq!(
            ClientError::ServerDownUnilaterallyAborted.to_string(),
            "server connection lost; transaction unilaterally aborted"
        );
    }
}
