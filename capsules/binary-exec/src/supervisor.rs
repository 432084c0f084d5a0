//! Timeout-bounded process supervision.
//!
//! Each run spawns the child and hands it to a dedicated tokio task that drains
//! stdout line by line and waits for the exit status. The caller races that task
//! against the configured deadline.
//!
//! Termination on timeout is best-effort. On unix the child leads its own process
//! group and the whole group is sent `SIGKILL`; on windows `taskkill /T /F` is run
//! against the child's tree. Descendants that leave the group (`setsid`, daemons) or
//! run as another user (`sudo`) can outlive the request.

use crate::classification::Classification;
use crate::command::ResolvedCommand;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

const PERMISSION_MARKERS: [&str; 3] = ["permission denied", "error=13", "os error 13"];

/// How a supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisedRun {
    /// The child exited on its own. `code` is `None` when it was killed by a signal.
    Exited {
        code: Option<i32>,
        output: Vec<String>,
    },
    /// The child could not be started or supervised.
    Failed(Classification),
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct ProcessSupervisor {
    timeout: Duration,
}

impl ProcessSupervisor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run(&self, command: &ResolvedCommand) -> SupervisedRun {
        let child = match spawn(command) {
            Ok(child) => child,
            Err(err) => return SupervisedRun::Failed(classify_spawn_error(&err)),
        };

        let mut worker = Worker::start(child);
        let finished = tokio::time::timeout(self.timeout, worker.wait()).await;

        match finished {
            Ok(Ok(Ok(exit))) => {
                info!(exit_code = ?exit.code, "execution finished");
                SupervisedRun::Exited {
                    code: exit.code,
                    output: exit.output,
                }
            }
            Ok(Ok(Err(err))) => {
                error!(error = %err, "failed while draining child output");
                SupervisedRun::Failed(Classification::InternalServerError)
            }
            Ok(Err(err)) => {
                error!(error = %err, "supervising task did not complete");
                SupervisedRun::Failed(Classification::InternalServerError)
            }
            Err(_) => {
                error!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "execution timed out and has been cancelled"
                );
                worker.shutdown().await;
                SupervisedRun::TimedOut
            }
        }
    }
}

/// Map a spawn-time I/O failure onto the classification table.
pub fn classify_spawn_error(err: &io::Error) -> Classification {
    let message = err.to_string().to_lowercase();
    if err.kind() == io::ErrorKind::PermissionDenied
        || PERMISSION_MARKERS.iter().any(|marker| message.contains(marker))
    {
        warn!(error = %err, "binary file is not executable or lacks privileges");
        return Classification::FilePermissionDenied;
    }

    error!(error = %err, "exception during the execution of file");
    Classification::InternalServerError
}

fn spawn(command: &ResolvedCommand) -> io::Result<Child> {
    let mut std_command = std::process::Command::new(command.program());
    std_command
        .args(command.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        std_command.process_group(0);
    }

    let mut command = Command::from(std_command);
    command.kill_on_drop(true);
    command.spawn()
}

#[derive(Debug)]
struct ChildExit {
    code: Option<i32>,
    output: Vec<String>,
}

/// Owns the supervising task for one child. Dropping an unfinished worker aborts
/// the task and signals the child's process tree.
struct Worker {
    handle: JoinHandle<io::Result<ChildExit>>,
    pid: Option<u32>,
    finished: bool,
}

impl Worker {
    fn start(child: Child) -> Self {
        let pid = child.id();
        debug!(?pid, "child process spawned");
        Self {
            handle: tokio::spawn(drain_and_wait(child)),
            pid,
            finished: false,
        }
    }

    async fn wait(&mut self) -> Result<io::Result<ChildExit>, JoinError> {
        let result = (&mut self.handle).await;
        self.finished = true;
        result
    }

    async fn shutdown(mut self) {
        self.cancel();
        if let Err(err) = (&mut self.handle).await {
            if !err.is_cancelled() {
                warn!(error = %err, "supervising task failed during shutdown");
            }
        }
    }

    fn cancel(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(pid) = self.pid {
            terminate_process_tree(pid);
        }
        self.handle.abort();
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn drain_and_wait(mut child: Child) -> io::Result<ChildExit> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (output, diagnostics) = tokio::try_join!(read_lines(stdout), read_lines(stderr))?;
    for line in &diagnostics {
        debug!(stderr = %line, "child stderr");
    }

    let status = child.wait().await?;
    Ok(ChildExit {
        code: status.code(),
        output,
    })
}

async fn read_lines<R: AsyncRead + Unpin>(stream: Option<R>) -> io::Result<Vec<String>> {
    let Some(stream) = stream else {
        return Ok(Vec::new());
    };

    let mut reader = BufReader::new(stream);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        lines.push(decode_line(&buf));
    }
    Ok(lines)
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(unix)]
fn terminate_process_tree(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // The child was spawned with process_group(0), so its pid is the group id.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == 0 {
        info!(pgid, "killed process group of timed out child");
        return;
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        debug!(pgid, "process group already gone");
    } else {
        warn!(pgid, error = %err, "failed to kill process group; child may outlive the request");
    }
}

#[cfg(windows)]
fn terminate_process_tree(pid: u32) {
    let status = std::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => info!(pid, "killed process tree of timed out child"),
        Ok(status) => warn!(pid, ?status, "taskkill failed; child may outlive the request"),
        Err(err) => warn!(pid, error = %err, "could not run taskkill; child may outlive the request"),
    }
}

#[cfg(not(any(unix, windows)))]
fn terminate_process_tree(pid: u32) {
    warn!(pid, "no process tree termination on this platform");
}
