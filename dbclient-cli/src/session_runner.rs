use common::config::ClientConfig;
use common::err::client_error::ClientError;
use common::err::CResult;
use dbclient::{NoopLooseEndHandler, Session};
use dbworkspace::InMemoryWorkspace;
use txn::IsolationLevel;

use crate::Commands;

/// Opens one session against `config.connection`, runs `command`, and
/// reports the outcome: a single dispatch with no long-running loop.
pub fn run(config: ClientConfig, command: Commands) -> CResult<()> {
    let mut session = Session::connect_default(&config.connection.host, config.connection.port)?;
    let mut handler = NoopLooseEndHandler;

    match command {
        Commands::SetIsolation { level } => {
            let parsed = IsolationLevel::from_cli_str(&level)?;
            session.reset_isolation(parsed, config.session.async_workspace)?;
            println!("isolation set to {:?}", session.isolation());
        }
        Commands::SetLockWaitSeconds { seconds } => {
            session.reset_wait_times(seconds)?;
            println!("lock_wait_msecs set to {}", session.lock_wait_msecs());
        }
        Commands::Commit { retain_lock } => {
            let rt = tokio::runtime::Runtime::new().map_err(|e| ClientError::Bug(e.to_string()))?;
            rt.block_on(session.commit(retain_lock, &mut handler))?;
            println!("committed, session state: {:?}", session.state());
        }
        Commands::Abort => {
            session.abort(&mut handler)?;
            println!("aborted, session state: {:?}", session.state());
        }
        Commands::Changemode { new_role } => {
            session.changemode(new_role)?;
            println!("changemode accepted, new_role={}", new_role);
        }
    }

    Ok(())
}
