//! Command execution engine
//!
//! A [`Job`] owns one external command invocation. Executing it spawns the
//! process (wrapped in `ssh` when a remote host is requested), drains
//! stdout and stderr through two concurrent reader tasks, classifies
//! stdout lines as they arrive and captures both streams for later
//! inspection. Two independent readers are required: draining one pipe at
//! a time can deadlock once the unread pipe's OS buffer fills and the
//! child blocks writing to it.

use anyhow::Context;
use std::sync::{Arc, Mutex};

use crate::ToolError;

/// Wait bound applied when the caller does not pick one.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Severity bucket assigned to one line of process output.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Normal,
    Warning,
    Error,
}

/// Maps a captured output line to a severity bucket.
///
/// The engine never inspects lines itself; swapping detection rules means
/// handing a different classifier to [`Job::with_classifier`].
pub trait LineClassifier: std::fmt::Debug + Send + Sync {
    fn classify(&self, line: &str) -> Severity;
}

/// Default classifier matching the `[error]`/`<fail>`-style markers tools
/// embed in their standard output.
#[derive(Debug)]
pub struct MarkerClassifier {
    warning: regex::Regex,
    error: regex::Regex,
}

impl MarkerClassifier {
    pub fn new() -> Self {
        Self {
            warning: regex::Regex::new(r"(?i)(<warn(ing)?>\s*:?|\[warn(ing)?\])").unwrap(),
            error: regex::Regex::new(r"(?i)(<(err(or)?|fail(ed)?)>\s*:?|\[(err(or)?|fail(ed)?)\])")
                .unwrap(),
        }
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier for MarkerClassifier {
    fn classify(&self, line: &str) -> Severity {
        if self.error.is_match(line) {
            Severity::Error
        } else if self.warning.is_match(line) {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

/// Per-call execution parameters.
#[derive(Clone, Debug)]
pub struct ExecOptions {
    /// Log non-error output at debug instead of info severity.
    pub background: bool,
    /// Working directory; local commands default to `.`, remote commands
    /// to `$HOME`.
    pub cwd: Option<String>,
    /// Run the command on this host through `ssh`.
    pub remote_host: Option<String>,
    /// Bound on the wait for process completion.
    pub timeout: std::time::Duration,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            background: true,
            cwd: None,
            remote_host: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExecOptions {
    pub fn remote(host: &str) -> Self {
        Self {
            remote_host: Some(host.to_string()),
            ..Default::default()
        }
    }
}

type LineBuffer = Arc<Mutex<Vec<String>>>;

/// One external command invocation with captured output and exit status.
///
/// A `Job` is re-executable: every [`execute`](Job::execute) call starts
/// from fresh capture buffers and produces a new exit code. The `&mut
/// self` receiver rules out overlapping executions of the same instance.
#[derive(Debug)]
pub struct Job {
    cmd: Vec<String>,
    classifier: Arc<dyn LineClassifier>,
    // shared with the reader tasks; a reader orphaned by a timed-out run
    // keeps the replaced allocation and never touches the fresh buffers
    stdout: LineBuffer,
    stderr: LineBuffer,
    pid: Option<u32>,
    exit_code: Option<i32>,
}

impl Job {
    /// Create a job for `cmd`; the first element must be an executable or
    /// a path to one.
    pub fn new<CmdType, ArgType>(cmd: CmdType) -> Self
    where
        CmdType: IntoIterator<Item = ArgType>,
        ArgType: Into<String>,
    {
        Self::with_classifier(cmd, Arc::new(MarkerClassifier::new()))
    }

    pub fn with_classifier<CmdType, ArgType>(
        cmd: CmdType,
        classifier: Arc<dyn LineClassifier>,
    ) -> Self
    where
        CmdType: IntoIterator<Item = ArgType>,
        ArgType: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            classifier,
            stdout: Arc::new(Mutex::new(Vec::new())),
            stderr: Arc::new(Mutex::new(Vec::new())),
            pid: None,
            exit_code: None,
        }
    }

    pub fn cmd(&self) -> &[String] {
        &self.cmd
    }

    /// Process id of the most recent execution.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Exit code of the most recent execution; set only once the process
    /// terminated or was declared timed out.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Snapshot of the captured stdout lines.
    pub fn stdout(&self) -> Vec<String> {
        self.stdout.lock().unwrap().clone()
    }

    /// Snapshot of the captured stderr lines. Holds stderr output plus any
    /// stdout lines the classifier flagged as errors; ordering between the
    /// two streams is not guaranteed.
    pub fn stderr(&self) -> Vec<String> {
        self.stderr.lock().unwrap().clone()
    }

    /// First `size` captured stdout lines.
    ///
    /// # Errors
    ///
    /// Fails with [`ToolError::InvalidArgument`] when `size <= 0`.
    pub fn head(&self, size: isize) -> anyhow::Result<Vec<String>> {
        if size <= 0 {
            return Err(
                ToolError::InvalidArgument(format!("head size must be positive, got {size}"))
                    .into(),
            );
        }
        let stdout = self.stdout.lock().unwrap();
        Ok(stdout.iter().take(size as usize).cloned().collect())
    }

    /// Last `size` captured stdout lines, in stream order.
    ///
    /// # Errors
    ///
    /// Fails with [`ToolError::InvalidArgument`] when `size <= 0`.
    pub fn tail(&self, size: isize) -> anyhow::Result<Vec<String>> {
        if size <= 0 {
            return Err(
                ToolError::InvalidArgument(format!("tail size must be positive, got {size}"))
                    .into(),
            );
        }
        let stdout = self.stdout.lock().unwrap();
        let skip = stdout.len().saturating_sub(size as usize);
        Ok(stdout.iter().skip(skip).cloned().collect())
    }

    /// Execute the command and return its exit code.
    ///
    /// A nonzero code is logged at error severity but not raised; failure
    /// handling belongs to the caller. When the wait exceeds
    /// `options.timeout` the child is killed (best effort) and `-1` is
    /// returned unless the process had already exited.
    ///
    /// # Errors
    ///
    /// Fails with [`ToolError::MissingDependency`] when a remote host is
    /// requested and `ssh` is not on PATH, with
    /// [`ToolError::InvalidArgument`] on an empty command vector, or when
    /// the process cannot be spawned at all.
    pub async fn execute(&mut self, options: &ExecOptions) -> anyhow::Result<i32> {
        if self.cmd.is_empty() {
            return Err(ToolError::InvalidArgument("command vector is empty".to_string()).into());
        }
        let argv = self.build_argv(options)?;
        tracing::debug!("Executing command: {:?}", argv);
        if options.background {
            tracing::debug!("Sending job to background");
        } else {
            tracing::debug!("Running in foreground");
        }
        self.stdout = Arc::new(Mutex::new(Vec::new()));
        self.stderr = Arc::new(Mutex::new(Vec::new()));
        self.exit_code = None;
        let workdir = if options.remote_host.is_some() {
            // ssh itself runs here; the cd travels inside the wrapped command
            ".".to_string()
        } else {
            options.cwd.clone().unwrap_or_else(|| ".".to_string())
        };
        let mut child = tokio::process::Command::new(&argv[0])
            .args(&argv[1..])
            .current_dir(&workdir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {:?}", &argv[0]))?;
        self.pid = child.id();
        let stdout_pipe = child
            .stdout
            .take()
            .context("failed to get stdout for command")?;
        let stderr_pipe = child
            .stderr
            .take()
            .context("failed to get stderr for command")?;
        let stdout_reader = tokio::spawn(drain_stdout(
            stdout_pipe,
            self.classifier.clone(),
            options.background,
            self.stdout.clone(),
            self.stderr.clone(),
        ));
        let stderr_reader = tokio::spawn(drain_stderr(stderr_pipe, self.stderr.clone()));
        let exit_code = match tokio::time::timeout(options.timeout, child.wait()).await {
            Ok(status) => {
                let status = status.context("failed to wait for command completion")?;
                // the pipes close once the process exits; join the readers
                // so the buffers are complete before returning
                let _ = tokio::join!(stdout_reader, stderr_reader);
                status.code().unwrap_or(-1)
            }
            Err(_) => {
                tracing::error!(
                    "Command {:?} timed out after {:?}",
                    self.cmd,
                    options.timeout
                );
                // readers stay detached; they stop when the pipes close
                match child.try_wait() {
                    Ok(Some(status)) => status.code().unwrap_or(-1),
                    _ => {
                        if let Err(error) = child.start_kill() {
                            tracing::warn!("Failed to kill timed out process: {error}");
                        }
                        -1
                    }
                }
            }
        };
        self.exit_code = Some(exit_code);
        if exit_code != 0 {
            tracing::error!("Command exited with {exit_code}");
        }
        Ok(exit_code)
    }

    fn build_argv(&self, options: &ExecOptions) -> anyhow::Result<Vec<String>> {
        let Some(host) = options.remote_host.as_deref() else {
            return Ok(self.cmd.clone());
        };
        if !crate::executable("ssh") {
            return Err(ToolError::MissingDependency("ssh".to_string()).into());
        }
        // the working directory is substituted verbatim so variables like
        // $HOME expand on the remote side; the arguments are escaped
        let cwd = options.cwd.as_deref().unwrap_or("$HOME");
        let flattened = self
            .cmd
            .iter()
            .map(|arg| crate::shell_escape(arg))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(vec![
            "ssh".to_string(),
            "-t".to_string(),
            host.to_string(),
            format!("cd {cwd} ; {flattened}"),
        ])
    }
}

async fn drain_stdout<PipeType>(
    pipe: PipeType,
    classifier: Arc<dyn LineClassifier>,
    background: bool,
    stdout: LineBuffer,
    stderr: LineBuffer,
) where
    PipeType: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncBufReadExt;
    let mut lines = tokio::io::BufReader::new(pipe).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        match classifier.classify(&line) {
            Severity::Error => {
                tracing::error!("{line}");
                append_line(&stderr, &line);
            }
            Severity::Warning => {
                tracing::warn!("{line}");
                append_line(&stdout, &line);
            }
            Severity::Normal => {
                if background {
                    tracing::debug!("{line}");
                } else {
                    tracing::info!("{line}");
                }
                append_line(&stdout, &line);
            }
        }
    }
}

async fn drain_stderr<PipeType>(pipe: PipeType, stderr: LineBuffer)
where
    PipeType: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncBufReadExt;
    let mut lines = tokio::io::BufReader::new(pipe).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        tracing::error!("{line}");
        append_line(&stderr, &line);
    }
}

// progress-style output overwrites itself with \r; keep each segment as
// its own entry
fn append_line(buffer: &LineBuffer, line: &str) {
    let mut buffer = buffer.lock().unwrap();
    if line.contains('\r') {
        buffer.extend(
            line.split('\r')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string),
        );
    } else {
        buffer.push(line.to_string());
    }
}
