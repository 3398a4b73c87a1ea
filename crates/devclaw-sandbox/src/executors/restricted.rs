//! Restricted executor: Linux namespaces.
//!
//! The child gets new PID, mount, and user namespaces, plus a network
//! namespace unless the task allows network. The interpreter is resolved
//! through PATH and must land inside a fixed trusted-directory set —
//! a `/tmp/python3` planted ahead of the real one on PATH is rejected
//! before fork. The environment is replaced wholesale with a minimal
//! base plus the already-filtered request variables.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use devclaw_core::errors::{DevclawError, DevclawResult};
use devclaw_core::Ctx;

use crate::exec::{ExecResult, ExecTask};

use super::{run_child, Executor};

/// Directories an interpreter may legitimately resolve into.
const TRUSTED_DIRS: &[&str] = &[
    "/usr/local/bin",
    "/usr/bin",
    "/bin",
    "/usr/local/sbin",
    "/usr/sbin",
    "/sbin",
];

/// Minimal PATH exported into the sandbox.
const SANDBOX_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

pub struct RestrictedExecutor;

/// Resolve `name` through `path_var` (a PATH-formatted string) and insist
/// the result lives under a trusted directory. The first PATH hit decides;
/// a hit outside the trusted set is a rejection, not a skip.
pub fn resolve_trusted_interpreter(name: &str, path_var: &str) -> Result<PathBuf, String> {
    for dir in path_var.split(':').filter(|d| !d.is_empty()) {
        let candidate = Path::new(dir).join(name);
        if !candidate.is_file() {
            continue;
        }
        let resolved = candidate
            .canonicalize()
            .map_err(|e| format!("cannot canonicalize {}: {e}", candidate.display()))?;
        let trusted = TRUSTED_DIRS
            .iter()
            .any(|t| resolved.starts_with(t));
        if !trusted {
            return Err(format!(
                "interpreter {} resolved to {}, outside the trusted directories {:?}",
                name,
                resolved.display(),
                TRUSTED_DIRS
            ));
        }
        return Ok(resolved);
    }
    Err(format!("interpreter {name} not found on PATH"))
}

#[async_trait]
impl Executor for RestrictedExecutor {
    #[cfg(target_os = "linux")]
    async fn execute(&self, task: &ExecTask, ctx: &Ctx) -> DevclawResult<ExecResult> {
        let path_var = std::env::var("PATH").unwrap_or_else(|_| SANDBOX_PATH.to_string());
        let interpreter = resolve_trusted_interpreter(task.runtime.interpreter(), &path_var)
            .map_err(DevclawError::Sandbox)?;
        debug!(interpreter = %interpreter.display(), "trusted interpreter resolved");

        let mut command = tokio::process::Command::new(&interpreter);
        command
            .arg(&task.script_path)
            .args(&task.args)
            .current_dir(&task.workdir)
            .env_clear()
            .env("PATH", SANDBOX_PATH);
        for name in ["LANG", "LC_ALL", "TERM"] {
            if let Ok(value) = std::env::var(name) {
                command.env(name, value);
            }
        }
        command.envs(task.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command.process_group(0);

        let allow_network = task.allow_network;
        let host_uid = unsafe { libc::getuid() };
        let host_gid = unsafe { libc::getgid() };
        unsafe {
            command.pre_exec(move || {
                let mut flags = libc::CLONE_NEWPID | libc::CLONE_NEWNS | libc::CLONE_NEWUSER;
                if !allow_network {
                    flags |= libc::CLONE_NEWNET;
                }
                if libc::unshare(flags) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                // Map sandbox root onto the host identity.
                std::fs::write("/proc/self/setgroups", "deny")?;
                std::fs::write("/proc/self/gid_map", format!("0 {host_gid} 1"))?;
                std::fs::write("/proc/self/uid_map", format!("0 {host_uid} 1"))?;
                Ok(())
            });
        }

        run_child(command, task, ctx).await
    }

    #[cfg(not(target_os = "linux"))]
    async fn execute(&self, _task: &ExecTask, _ctx: &Ctx) -> DevclawResult<ExecResult> {
        Err(DevclawError::Sandbox(
            "restricted executor is Linux-only".to_string(),
        ))
    }

    fn available(&self) -> bool {
        cfg!(target_os = "linux")
    }

    fn name(&self) -> &'static str {
        "restricted"
    }
}
