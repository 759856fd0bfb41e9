use std::io;

use once_cell::sync::OnceCell;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::MakeWriterExt;

static INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    RollingFile,
}

#[derive(Debug, Clone)]
pub struct TracingFactoryOptions {
    debug: bool,
    target: OutputTarget,
    level: Level,
    log_dir: Option<String>,
}

impl Default for TracingFactoryOptions {
    fn default() -> Self {
        Self::new(false, OutputTarget::Stdout, None)
    }
}

impl TracingFactoryOptions {
    pub fn new(debug: bool, target: OutputTarget, log_dir: Option<String>) -> Self {
        let level = if debug { Level::DEBUG } else { Level::INFO };
        Self {
            debug,
            target,
            level,
            log_dir,
        }
    }

    pub fn log_dir(&self) -> &str {
        self.log_dir.as_deref().unwrap_or("")
    }
}

/// Installs the process-wide `tracing` subscriber exactly once. Later
/// calls are no-ops: a session library attaching to an already-running
/// process (e.g. a second `Session` in the same binary) must not clobber
/// a subscriber some other component installed.
pub struct TracingFactory;

impl TracingFactory {
    pub fn init(debug: bool) -> bool {
        Self::init_with_options(TracingFactoryOptions::new(debug, OutputTarget::Stdout, None))
    }

    pub fn init_with_options(opts: TracingFactoryOptions) -> bool {
        let mut newly_initialized = false;
        INIT.get_or_init(|| {
            let format = fmt::format()
                .with_file(true)
                .with_line_number(false)
                .with_target(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .compact();

            let result = match opts.target {
                OutputTarget::Stdout => tracing_subscriber::fmt()
                    .with_max_level(opts.level)
                    .event_format(format)
                    .try_init(),
                OutputTarget::RollingFile => {
                    let dir = if opts.log_dir().is_empty() {
                        "/tmp/dbclient/logs"
                    } else {
                        opts.log_dir()
                    };
                    let file_appender = rolling::daily(dir, "client.log");
                    let writer = file_appender.and(io::stdout);
                    tracing_subscriber::fmt()
                        .with_max_level(opts.level)
                        .event_format(format)
                        .with_writer(writer)
                        .try_init()
                }
            };
            if result.is_ok() {
                newly_initialized = true;
            }
        });
        newly_initialized
    }
}
