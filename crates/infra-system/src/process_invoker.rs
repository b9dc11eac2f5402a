// Bounded process invoker
// reason: async-trait, tokio for async process management, nix for graceful termination
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use jqlite_core::domain::{
    ExitError, InvocationLimits, InvocationSpec, OverflowPolicy, ProcessInvocationResult,
};
use jqlite_core::port::{ProcessInvoker, TimeProvider};

/// Size of one read from a child pipe
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Time a process gets between SIGTERM and SIGKILL
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_millis(250);

/// Environment variables passed through to engines by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "LC_ALL", "TMPDIR"];

/// Which pipe a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Output captured so far, bounded by the combined byte limit
#[derive(Debug, Default)]
struct Capture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    overflowed: bool,
}

impl Capture {
    fn total(&self) -> usize {
        self.stdout.len() + self.stderr.len()
    }

    /// Append as much of `chunk` as fits under `limit`
    ///
    /// Returns false once anything had to be dropped.
    fn append(&mut self, stream: Stream, chunk: &[u8], limit: usize) -> bool {
        let room = limit.saturating_sub(self.total());
        let kept = chunk.len().min(room);

        let buf = match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        buf.extend_from_slice(&chunk[..kept]);

        if kept < chunk.len() {
            self.overflowed = true;
        }
        !self.overflowed
    }
}

/// How the capture loop ended
enum Drive {
    Exited(ExitStatus),
    Overflowed,
}

/// Bounded process invoker
/// Spawns one isolated child per invocation with environment allowlisting
pub struct BoundedProcessInvoker {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
    kill_grace: Duration,
}

impl BoundedProcessInvoker {
    /// Create a new invoker
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - Inherited environment variables visible to the engine
    ///
    /// # Example
    /// ```ignore
    /// let invoker = BoundedProcessInvoker::new(
    ///     Arc::new(SystemTimeProvider),
    ///     vec!["PATH".to_string(), "HOME".to_string()],
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn with_kill_grace(mut self, kill_grace: Duration) -> Self {
        self.kill_grace = kill_grace;
        self
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Spawn the engine: discrete argv, no shell, stdin closed, pipes for output
    fn spawn(&self, spec: &InvocationSpec) -> std::io::Result<Child> {
        let inherited: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();

        Command::new(&spec.program)
            .args(&spec.args)
            .env_clear()
            .envs(self.filter_env(&inherited))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }

    fn elapsed_since(&self, start_ms: i64) -> i64 {
        self.time_provider.now_millis() - start_ms
    }

    /// Stop a child with SIGTERM first, then SIGKILL after the grace period
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                debug!(pid = %pid, "Sending SIGTERM to engine process");
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                    if let Ok(Ok(_)) = timeout(self.kill_grace, child.wait()).await {
                        debug!(pid = %pid, "Engine process exited after SIGTERM");
                        return;
                    }
                    warn!(pid = %pid, "Engine process did not exit after SIGTERM, sending SIGKILL");
                }
            }
        }

        if let Err(e) = child.kill().await {
            warn!(error = %e, "Failed to kill engine process");
        }
    }
}

/// Read one chunk, or wait forever once the pipe is closed
async fn read_chunk<R: AsyncRead + Unpin>(
    pipe: &mut Option<R>,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    match pipe {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Pump both pipes until EOF (or overflow under `Abort`), then reap the child
async fn drive(
    child: &mut Child,
    limits: &InvocationLimits,
    capture: &mut Capture,
) -> std::io::Result<Drive> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();
    let mut out_buf = vec![0u8; READ_CHUNK_BYTES];
    let mut err_buf = vec![0u8; READ_CHUNK_BYTES];

    while stdout.is_some() || stderr.is_some() {
        let (stream, read) = tokio::select! {
            read = read_chunk(&mut stdout, &mut out_buf) => (Stream::Stdout, read?),
            read = read_chunk(&mut stderr, &mut err_buf) => (Stream::Stderr, read?),
        };

        if read == 0 {
            match stream {
                Stream::Stdout => stdout = None,
                Stream::Stderr => stderr = None,
            }
            continue;
        }

        let chunk = match stream {
            Stream::Stdout => &out_buf[..read],
            Stream::Stderr => &err_buf[..read],
        };
        let within_limit = capture.append(stream, chunk, limits.max_output_bytes);

        if !within_limit && limits.overflow_policy == OverflowPolicy::Abort {
            return Ok(Drive::Overflowed);
        }
    }

    Ok(Drive::Exited(child.wait().await?))
}

/// Map a finished process status to an exit error
fn exit_error_from(status: ExitStatus) -> Option<ExitError> {
    if status.success() {
        return None;
    }

    if let Some(code) = status.code() {
        return Some(ExitError::NonZeroExit { code });
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Some(ExitError::Signal { signal });
        }
    }

    Some(ExitError::Io(format!("process ended with {}", status)))
}

#[async_trait]
impl ProcessInvoker for BoundedProcessInvoker {
    async fn invoke(&self, spec: &InvocationSpec) -> ProcessInvocationResult {
        let start_ms = self.time_provider.now_millis();
        let program = spec.program.display().to_string();
        let timeout_ms = spec.limits.timeout.as_millis() as u64;

        info!(
            program = %program,
            args = ?spec.args,
            timeout_ms = %timeout_ms,
            max_output_bytes = %spec.limits.max_output_bytes,
            "Starting engine process"
        );

        let mut child = match self.spawn(spec) {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %program, error = %e, "Failed to spawn engine process");
                return ProcessInvocationResult::spawn_failed(program, e.to_string())
                    .with_duration(self.elapsed_since(start_ms));
            }
        };

        let mut capture = Capture::default();
        let driven = timeout(
            spec.limits.timeout,
            drive(&mut child, &spec.limits, &mut capture),
        )
        .await;

        let (exit_error, killed_by_timeout) = match driven {
            Ok(Ok(Drive::Exited(status))) => (exit_error_from(status), false),
            Ok(Ok(Drive::Overflowed)) => {
                warn!(
                    program = %program,
                    limit = %spec.limits.max_output_bytes,
                    "Engine output exceeded limit, terminating"
                );
                self.terminate(&mut child).await;
                let limit = spec.limits.max_output_bytes;
                (Some(ExitError::OutputLimitExceeded { limit }), false)
            }
            Ok(Err(e)) => {
                warn!(program = %program, error = %e, "Failed to read engine output");
                self.terminate(&mut child).await;
                (Some(ExitError::Io(e.to_string())), false)
            }
            Err(_) => {
                warn!(program = %program, timeout_ms = %timeout_ms, "Engine process timed out, terminating");
                self.terminate(&mut child).await;
                (Some(ExitError::TimedOut { timeout_ms }), true)
            }
        };

        let result = ProcessInvocationResult {
            exit_error,
            killed_by_timeout,
            stdout: String::from_utf8_lossy(&capture.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&capture.stderr).into_owned(),
            duration_ms: self.elapsed_since(start_ms),
        };

        info!(
            program = %program,
            duration_ms = %result.duration_ms,
            exit_error = ?result.exit_error,
            killed_by_timeout = %result.killed_by_timeout,
            truncated = %capture.overflowed,
            "Engine process completed"
        );

        result
    }

    async fn is_available(&self, program: &Path) -> bool {
        let Ok(metadata) = tokio::fs::metadata(program).await else {
            return false;
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
        }

        #[cfg(not(unix))]
        {
            metadata.is_file()
        }
    }
}
