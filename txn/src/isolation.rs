use common::err::client_error::ClientError;
use common::err::CResult;

/// Session isolation level (§3, §6): the CLI-visible knobs are
/// `RR|RC|RU|SERIALIZABLE`; `ReadCommittedSnapshot` is the
/// snapshot-isolation variant of RC the original system also exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    RepeatableRead,
    ReadCommitted,
    ReadCommittedSnapshot,
    ReadUncommitted,
    Serializable,
}

impl IsolationLevel {
    pub fn to_wire(self) -> i32 {
        match self {
            IsolationLevel::RepeatableRead => 0,
            IsolationLevel::ReadCommitted => 1,
            IsolationLevel::ReadCommittedSnapshot => 2,
            IsolationLevel::ReadUncommitted => 3,
            IsolationLevel::Serializable => 4,
        }
    }

    pub fn from_wire(v: i32) -> CResult<Self> {
        match v {
            0 => Ok(IsolationLevel::RepeatableRead),
            1 => Ok(IsolationLevel::ReadCommitted),
            2 => Ok(IsolationLevel::ReadCommittedSnapshot),
            3 => Ok(IsolationLevel::ReadUncommitted),
            4 => Ok(IsolationLevel::Serializable),
            other => Err(ClientError::InvalidArgument(format!(
                "unrecognised isolation level tag {}",
                other
            ))),
        }
    }

    /// Parses the CLI-visible spelling from §6.
    pub fn from_cli_str(s: &str) -> CResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "RR" => Ok(IsolationLevel::RepeatableRead),
            "RC" => Ok(IsolationLevel::ReadCommitted),
            "RC_SNAPSHOT" => Ok(IsolationLevel::ReadCommittedSnapshot),
            "RU" => Ok(IsolationLevel::ReadUncommitted),
            "SERIALIZABLE" => Ok(IsolationLevel::Serializable),
            other => Err(ClientError::InvalidArgument(format!(
                "unrecognised isolation level '{}'",
                other
            ))),
        }
    }
}
