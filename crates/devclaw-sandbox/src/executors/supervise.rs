//! Child process supervision shared by the process-backed executors.
//!
//! The child always lives in its own process group so cancellation and
//! timeouts can SIGKILL the whole tree with one negative-pid signal.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use devclaw_core::errors::DevclawError;
use devclaw_core::errors::DevclawResult;
use devclaw_core::Ctx;

use crate::exec::{ExecResult, ExecTask};

/// SIGKILL an entire process group. No-op when the pid is unknown.
pub(crate) fn kill_process_group(pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        // Negative pid addresses the group.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer).await;
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Spawn the command and supervise it: capture output, race the wait
/// against cancellation and the task deadline, decode the exit.
pub(crate) async fn run_child(
    mut command: Command,
    task: &ExecTask,
    ctx: &Ctx,
) -> DevclawResult<ExecResult> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let mut child = command
        .spawn()
        .map_err(|e| DevclawError::Sandbox(format!("spawn failed: {e}")))?;
    let pid = child.id();

    let stdout_reader = tokio::spawn(read_pipe(child.stdout.take()));
    let stderr_reader = tokio::spawn(read_pipe(child.stderr.take()));

    let deadline = match ctx.remaining() {
        Some(remaining) => remaining.min(task.timeout),
        None => task.timeout,
    };

    let mut killed = false;
    let mut kill_reason: Option<String> = None;

    let status = tokio::select! {
        status = child.wait() => {
            status.map_err(|e| DevclawError::Sandbox(format!("wait failed: {e}")))?
        }
        _ = ctx.cancelled() => {
            debug!(?pid, "execution cancelled, killing process group");
            kill_process_group(pid);
            killed = true;
            kill_reason = Some("cancelled".to_string());
            child
                .wait()
                .await
                .map_err(|e| DevclawError::Sandbox(format!("wait failed: {e}")))?
        }
        _ = tokio::time::sleep(deadline) => {
            debug!(?pid, timeout = ?deadline, "execution deadline hit, killing process group");
            kill_process_group(pid);
            killed = true;
            kill_reason = Some("timeout".to_string());
            child
                .wait()
                .await
                .map_err(|e| DevclawError::Sandbox(format!("wait failed: {e}")))?
        }
    };

    let stdout = stdout_reader.await.unwrap_or_default();
    let stderr = stderr_reader.await.unwrap_or_default();

    let mut exit_code = status.code().unwrap_or(-1);
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            exit_code = 128 + signal;
            if !killed {
                killed = true;
                kill_reason = Some(match signal {
                    libc::SIGKILL => "killed (possible OOM)".to_string(),
                    libc::SIGXCPU => "cpu_limit".to_string(),
                    other => format!("signal_{other}"),
                });
            }
        }
    }

    Ok(ExecResult {
        exit_code,
        stdout,
        stderr,
        killed,
        kill_reason,
        duration: started.elapsed(),
        output_files: Vec::new(),
    })
}
