use common::err::client_error::ClientError;
use common::err::CResult;

/// Server-side status word translation (§4.4 step 5, §7's propagation
/// policy): zero is success, any negative value names a client-visible
/// error kind. The mapping is intentionally small and closed — it is
/// the client's *local* understanding of a handful of status codes the
/// server is contractually allowed to send back; anything else becomes
/// a generic `ClientError::String` carrying the raw code so it is never
/// silently swallowed.
pub fn status_to_error(status: i32) -> Option<ClientError> {
    match status {
        0 => None,
        -1 => Some(ClientError::LockWaitTimeout),
        -2 => Some(ClientError::Aborted),
        -3 => Some(ClientError::PreparedRecoveryRequired),
        -4 => Some(ClientError::OnlyInStandalone),
        -5 => Some(ClientError::NotInStandalone),
        -6 => Some(ClientError::DomainConflict("server-reported".to_string())),
        -7 => Some(ClientError::InvalidArgument("server-reported".to_string())),
        other => Some(ClientError::String(format!("server status {}", other))),
    }
}

pub fn error_to_status(err: &ClientError) -> i32 {
    match err {
        ClientError::LockWaitTimeout => -1,
        ClientError::Aborted => -2,
        ClientError::PreparedRecoveryRequired => -3,
        ClientError::OnlyInStandalone => -4,
        ClientError::NotInStandalone => -5,
        ClientError::DomainConflict(_) => -6,
        ClientError::InvalidArgument(_) => -7,
        _ => -99,
    }
}

pub fn ok_or_status(status: i32) -> CResult<()> {
    match status_to_error(status) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_is_success() {
        assert!(ok_or_status(0).is_ok());
    }

    #[test]
    fn negative_maps_to_known_kind() {
        assert!(matches!(ok_or_status(-1), Err(ClientError::LockWaitTimeout)));
    }
}
