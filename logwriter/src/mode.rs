pub use protocol::rpc::logpage::FetchMode;

/// Chooses the mode for the next `fetch_log_pages` call (§4.7): once the
/// client has fallen behind the server's known end-of-log, async is
/// forced regardless of the configured mode, so a slow follower never
/// blocks the loop waiting on a commit it's already missed.
pub fn effective_mode(configured: FetchMode, last_recv_pageid: i64, server_eof_pageid: i64) -> FetchMode {
    if last_recv_pageid < server_eof_pageid {
        FetchMode::Async
    } else {
        configured
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn falls_back_to_async_when_behind() {
        assert_eq!(effective_mode(FetchMode::Sync, 10, 20), FetchMode::Async);
    }

    #[test]
    fn honours_configured_mode_when_caught_up() {
        assert_eq!(effective_mode(FetchMode::Sync, 20, 20), FetchMode::Sync);
        assert_eq!(effective_mode(FetchMode::SemiSync, 21, 20), FetchMode::SemiSync);
    }
}
