//! Execution request/result types shared by the runner and executors.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use devclaw_core::config::IsolationLevel;

pub use devclaw_core::models::Runtime;

/// A request to run a skill script.
#[derive(Debug, Clone, Default)]
pub struct ExecRequest {
    /// Script path; `{baseDir}` is substituted with `base_dir`.
    pub script_path: String,
    /// Arguments; `{baseDir}` is substituted in each.
    pub args: Vec<String>,
    /// Runtime override. Inferred from the extension when unset.
    pub runtime: Option<Runtime>,
    /// Isolation override. Config default when unset.
    pub isolation: Option<IsolationLevel>,
    /// Per-run timeout override.
    pub timeout: Option<Duration>,
    /// Request-specific environment, subject to policy filtering.
    pub env: HashMap<String, String>,
    /// Skill directory used for `{baseDir}` substitution and as workdir.
    pub base_dir: Option<PathBuf>,
    /// Whether restricted executions keep the host network namespace.
    pub allow_network: bool,
}

/// Outcome of a sandboxed execution. Policy and preflight failures are
/// reported here (synthetic results), never as errors, so callers always
/// see stderr.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub killed: bool,
    pub kill_reason: Option<String>,
    pub duration: Duration,
    /// Immediate non-directory entries created in the temp dir.
    pub output_files: Vec<PathBuf>,
}

impl ExecResult {
    /// Synthetic failing result used for policy/preflight rejections.
    pub fn refused(reason: &str, stderr: String) -> Self {
        Self {
            exit_code: 1,
            killed: true,
            kill_reason: Some(reason.to_string()),
            stderr,
            ..Self::default()
        }
    }
}

/// Fully resolved work order handed to an executor: interpreter chosen,
/// env filtered and injected, temp dir allocated.
#[derive(Debug, Clone)]
pub struct ExecTask {
    pub runtime: Runtime,
    pub script_path: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub workdir: PathBuf,
    pub temp_dir: PathBuf,
    pub allow_network: bool,
    pub timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_result_shape() {
        let result = ExecResult::refused("policy_violation", "nope".to_string());
        assert_eq!(result.exit_code, 1);
        assert!(result.killed);
        assert_eq!(result.kill_reason.as_deref(), Some("policy_violation"));
    }
}
