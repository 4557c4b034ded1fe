use anyhow::{Context, Result};
use clap::Parser;
use tracing::instrument;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rrun",
    version,
    about = "Run a command locally or on a remote host over ssh",
    long_about = "`rrun` executes a command, captures and classifies its output line by line \
and exits with the command's own exit code.

EXAMPLE:
    # Run locally, show command output
    rrun -v -- make test

    # Run on a remote host from a given directory, give up after a minute
    rrun --remote-host backup@10.0.0.3 --cwd /srv/app --timeout 1min -- git pull

Lines marked [error]/<fail> on stdout are reported at error severity; the
exit code of the wrapped command is passed through (a timeout maps to 255)."
)]
struct Args {
    // Execution options
    /// Run the command on this host through ssh (accepts user@host)
    #[arg(
        short = 'H',
        long,
        value_name = "HOST",
        help_heading = "Execution options"
    )]
    remote_host: Option<String>,

    /// Working directory (remote commands default to $HOME)
    #[arg(
        short = 'C',
        long,
        value_name = "PATH",
        help_heading = "Execution options"
    )]
    cwd: Option<String>,

    /// Bound on the wait for command completion
    ///
    /// This option accepts a human readable duration, e.g. "200ms", "30s", "5min".
    /// The default is 60s. On expiry the command is killed and rrun exits with 255.
    #[arg(
        short = 't',
        long,
        value_name = "DURATION",
        help_heading = "Execution options"
    )]
    timeout: Option<String>,

    /// Background mode: log command output at debug instead of info severity
    #[arg(short = 'b', long, help_heading = "Execution options")]
    background: bool,

    // Progress & output
    /// Print the first N captured stdout lines after completion
    #[arg(long, value_name = "N", help_heading = "Progress & output")]
    head: Option<isize>,

    /// Print the last N captured stdout lines after completion
    #[arg(long, value_name = "N", help_heading = "Progress & output")]
    tail: Option<isize>,

    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // ARGUMENTS
    /// Command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[instrument]
async fn async_main(args: Args) -> Result<i32> {
    let timeout = match &args.timeout {
        Some(timeout) => humantime::parse_duration(timeout)
            .with_context(|| format!("invalid timeout: {timeout:?}"))?,
        None => common::job::DEFAULT_TIMEOUT,
    };
    let options = common::job::ExecOptions {
        background: args.background,
        cwd: args.cwd.clone(),
        remote_host: args.remote_host.clone(),
        timeout,
    };
    let mut job = common::job::Job::new(args.command.clone());
    let exit_code = job.execute(&options).await?;
    if let Some(head) = args.head {
        for line in job.head(head)? {
            println!("{line}");
        }
    }
    if let Some(tail) = args.tail {
        for line in job.tail(tail)? {
            println!("{line}");
        }
    }
    Ok(exit_code)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let func = {
        let args = args.clone();
        || async_main(args)
    };
    let output = common::config::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
    };
    let runtime = common::config::RuntimeConfig::default();
    let res = common::run(&output, &runtime, func);
    match res {
        // clamp into the exit-status range; the -1 timeout sentinel maps to 255
        Some(exit_code) => std::process::exit(exit_code & 0xff),
        None => std::process::exit(1),
    }
}
