mod session_runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use common::config::{read_config, ClientConfig};
use common::err::CResult;

use crate::session_runner::run;

/// One-shot session-control CLI over the client-side transactional
/// pipeline (§6: isolation, lock-wait seconds, async-workspace,
/// changemode): `CliArgs` + `Commands` with config-file merge, no
/// long-running loop — each invocation opens a session, runs one
/// operation, and exits.
#[derive(Parser, Debug, Clone)]
#[command(name = "dbclient-cli")]
#[command(version = "0.1.0")]
#[command(author = "rust-us")]
#[command(about = "Session-control CLI for the client-side transactional pipeline")]
#[command(long_about = None)]
struct CliArgs {
    /// Path to a TOML configuration file (ClientConfig). When omitted,
    /// ./conf/dbclient.toml is tried and falls back to defaults.
    #[arg(short, long, help = "Path to loaded configuration file", value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long = "host", help = "server host, overrides config", value_name = "host")]
    host: Option<String>,

    #[arg(long = "port", help = "server port, overrides config", value_name = "port")]
    port: Option<u16>,

    #[arg(short, long, help = "enable debug logging", default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// `reset_isolation`: RR|RC|RC_SNAPSHOT|RU|SERIALIZABLE (§6).
    SetIsolation { level: String },
    /// `reset_wait_times`: seconds, negative = infinite, 0 = no-wait.
    SetLockWaitSeconds { seconds: i32 },
    /// Commits the (otherwise empty) session transaction, draining any
    /// postpone loose-ends with the no-op handler.
    Commit {
        #[arg(long, default_value_t = false)]
        retain_lock: bool,
    },
    /// Aborts the session transaction, draining any undo loose-ends.
    Abort,
    /// `changemode`: HA admin toggle, rejected outside stand-alone mode.
    Changemode { new_role: i32 },
}

fn main() -> CResult<()> {
    let args = CliArgs::parse();

    let log_opt = common::log::tracing_factory::TracingFactoryOptions::new(
        args.debug,
        common::log::tracing_factory::OutputTarget::Stdout,
        None,
    );
    common::log::tracing_factory::TracingFactory::init_with_options(log_opt);

    let mut config = load_config(&args);
    if let Some(host) = &args.host {
        config.connection.host = host.clone();
    }
    if let Some(port) = args.port {
        config.connection.port = port;
    }

    run(config, args.command)
}

fn load_config(args: &CliArgs) -> ClientConfig {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("./conf/dbclient.toml"));
    read_config(&path).unwrap_or_else(|_| ClientConfig::default())
}
