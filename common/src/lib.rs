//! Shared library for the `rdo` scripting tools
//!
//! `rdo` is a small toolkit for scripts that issue file and command
//! operations against the local machine or a remote host transparently.
//! Paths use the familiar `[user@]host:path` syntax to name remote
//! endpoints; everything else is local.
//!
//! The pieces:
//!
//! - [`job::Job`] - one external command invocation: spawns the process
//!   (through `ssh` for remote hosts), drains stdout/stderr concurrently,
//!   classifies output lines as they arrive and captures both streams.
//! - [`endpoint::Endpoint`] - syntactic local/remote classification of
//!   path strings.
//! - [`ops`] - file operations (exists/copy/move/remove/mkdir/extract/
//!   list) routed to local syscalls or remote-equivalent commands run
//!   through the engine.
//!
//! Tool binaries (`rrun`, `rfs`) wire their arguments into
//! [`config::OutputConfig`]/[`config::RuntimeConfig`] and hand an async
//! entry point to [`run`].

pub mod config;
pub mod endpoint;
pub mod job;
pub mod ops;
pub mod testutils;

/// Typed failures that callers are expected to match on.
///
/// Everything else travels as an [`anyhow::Error`] with context attached.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A path carrying embedded `host:path` syntax was combined with an
    /// explicit remote-host argument. Raised before any I/O happens.
    #[error("conflicting endpoint: {0:?} already names a remote host")]
    ConflictingEndpoint(String),
    /// A required executable is not available on PATH. Raised before
    /// anything is spawned.
    #[error("missing required executable: {0}")]
    MissingDependency(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Checks whether `name` resolves to an executable on PATH.
///
/// Used to gate remote-transport operations on `ssh`/`scp` availability.
pub fn executable(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Escape one argument for interpolation into a POSIX `sh` command line.
///
/// Safe strings pass through unchanged, everything else is single-quoted
/// with embedded quotes rewritten as `'\''`.
pub fn shell_escape(arg: &str) -> String {
    fn is_safe(byte: u8) -> bool {
        byte.is_ascii_alphanumeric() || b"-_./=:@+,".contains(&byte)
    }
    if !arg.is_empty() && arg.bytes().all(is_safe) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

fn init_tracing(output: &config::OutputConfig) {
    let default_level = match output.verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // quiet wins over RUST_LOG; otherwise the environment may override
    let filter = if output.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
    };
    // tests may initialize more than once; only the first subscriber wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Entry point for the tool binaries.
///
/// Initializes the tracing subscriber from `output`, builds a tokio
/// runtime from `runtime` and blocks on `func`. The error chain of a
/// failed future is logged and mapped to `None` so mains can exit
/// nonzero without re-reporting.
pub fn run<FuncType, FutureType, SummaryType>(
    output: &config::OutputConfig,
    runtime: &config::RuntimeConfig,
    func: FuncType,
) -> Option<SummaryType>
where
    FuncType: FnOnce() -> FutureType,
    FutureType: std::future::Future<Output = anyhow::Result<SummaryType>>,
{
    init_tracing(output);
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    if runtime.max_blocking_threads > 0 {
        builder.max_blocking_threads(runtime.max_blocking_threads);
    }
    let tokio_runtime = match builder.build() {
        Ok(tokio_runtime) => tokio_runtime,
        Err(error) => {
            eprintln!("Failed to start the tokio runtime: {error}");
            return None;
        }
    };
    match tokio_runtime.block_on(func()) {
        Ok(summary) => Some(summary),
        Err(error) => {
            tracing::error!("{:#}", error);
            None
        }
    }
}
