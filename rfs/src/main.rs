use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::instrument;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rfs",
    version,
    about = "File operations against local paths or remote [user@]host:path endpoints",
    long_about = "`rfs` routes file operations to the local filesystem or to a remote host,
depending on the endpoint syntax of each path argument.

EXAMPLE:
    # Does the release bundle exist on the build box?
    rfs exists builder@10.0.0.7:/srv/out/bundle.zip

    # Pull it over and unpack it
    rfs copy builder@10.0.0.7:/srv/out/bundle.zip ./bundle.zip
    rfs extract ./bundle.zip --dest ./bundle

A failed operation exits with status 1; existence checks answer through
the exit status as well, like `test`."
)]
struct Args {
    /// Verbose level: -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Check that a path exists
    Exists {
        path: String,
        /// Check on this host instead of parsing the path for one
        #[arg(long, value_name = "HOST")]
        remote_host: Option<String>,
    },
    /// Check that a path exists and is a regular file
    IsFile {
        path: String,
        #[arg(long, value_name = "HOST")]
        remote_host: Option<String>,
    },
    /// Check that a path exists and is a directory
    IsDir {
        path: String,
        #[arg(long, value_name = "HOST")]
        remote_host: Option<String>,
    },
    /// Delete a file or directory
    Remove {
        path: String,
        /// Ignore warnings, `rm -rf` on remote endpoints
        #[arg(short, long)]
        force: bool,
    },
    /// Copy a file or directory (scp -r when any endpoint is remote)
    Copy {
        src: String,
        dest: String,
        /// Replace an existing destination
        #[arg(short, long)]
        force: bool,
    },
    /// Move a file or directory; the source survives a failed transfer
    Move {
        src: String,
        dest: String,
        /// Replace an existing destination
        #[arg(short, long)]
        force: bool,
    },
    /// Rename a file or directory
    Rename {
        src: String,
        dest: String,
        /// Replace an existing destination
        #[arg(short, long)]
        force: bool,
    },
    /// Create a directory
    Mkdir {
        path: String,
        /// Create missing parents (`mkdir -p`)
        #[arg(short = 'p', long)]
        parents: bool,
        #[arg(long, value_name = "HOST")]
        remote_host: Option<String>,
    },
    /// Unpack a zip archive
    Extract {
        archive: String,
        /// Destination directory (defaults to the current directory)
        #[arg(short, long, value_name = "PATH")]
        dest: Option<String>,
        #[arg(long, value_name = "HOST")]
        remote_host: Option<String>,
    },
    /// List local directory entries matching a glob pattern
    List {
        dir: String,
        /// Glob pattern matched against entry names
        #[arg(long, value_name = "PATTERN", default_value = "*")]
        pattern: String,
        /// Only list regular files
        #[arg(long, conflicts_with = "dirs")]
        files: bool,
        /// Only list directories
        #[arg(long)]
        dirs: bool,
    },
}

#[instrument]
async fn async_main(args: Args) -> Result<bool> {
    match &args.command {
        Command::Exists { path, remote_host } => {
            common::ops::exists(path, remote_host.as_deref()).await
        }
        Command::IsFile { path, remote_host } => {
            common::ops::is_file(path, remote_host.as_deref()).await
        }
        Command::IsDir { path, remote_host } => {
            common::ops::is_dir(path, remote_host.as_deref()).await
        }
        Command::Remove { path, force } => common::ops::remove(path, *force).await,
        Command::Copy { src, dest, force } => common::ops::copy(src, dest, *force).await,
        Command::Move { src, dest, force } => common::ops::move_path(src, dest, *force).await,
        Command::Rename { src, dest, force } => common::ops::rename(src, dest, *force).await,
        Command::Mkdir {
            path,
            parents,
            remote_host,
        } => common::ops::mkdir(path, *parents, remote_host.as_deref()).await,
        Command::Extract {
            archive,
            dest,
            remote_host,
        } => common::ops::extract(archive, dest.as_deref(), remote_host.as_deref()).await,
        Command::List {
            dir,
            pattern,
            files,
            dirs,
        } => {
            let matches = if *files {
                common::ops::get_files(dir, pattern, None).await?
            } else if *dirs {
                common::ops::get_dirs(dir, pattern, None).await?
            } else {
                common::ops::list_content(dir, pattern, None).await?
            };
            for path in matches {
                println!("{}", path.display());
            }
            Ok(true)
        }
    }
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
    match common::run(&output, &runtime, func) {
        Some(true) => Ok(()),
        _ => std::process::exit(1),
    }
}
