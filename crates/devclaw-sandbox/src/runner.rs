//! The runner: isolation dispatch, pre-flight, temp-dir lifecycle,
//! output truncation.
//!
//! Every run gets a synthetic result rather than an error for policy and
//! preflight failures, so callers always have stdout/stderr to show.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use devclaw_core::config::SandboxConfig;
use devclaw_core::errors::DevclawResult;
use devclaw_core::Ctx;

use crate::exec::{ExecRequest, ExecResult, ExecTask, Runtime};
use crate::executors::ExecutorSet;
use crate::policy::{self, ExecPolicy};

/// Marker appended when stdout/stderr exceed the output budget.
const TRUNCATION_MARKER: &str = "... [output truncated]";

pub struct Runner {
    policy: ExecPolicy,
    /// Exclusive lock only to replace the set; execution takes it shared.
    executors: RwLock<ExecutorSet>,
    config: SandboxConfig,
}

impl Runner {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            policy: ExecPolicy::new(config.env_allowlist.clone()),
            executors: RwLock::new(ExecutorSet::new(config.container_image.clone())),
            config,
        }
    }

    /// Swap the executor table (e.g. after a config reload).
    pub async fn replace_executors(&self, set: ExecutorSet) {
        *self.executors.write().await = set;
    }

    /// Run a skill script through policy, pre-flight, and the selected
    /// executor.
    pub async fn run(&self, request: &ExecRequest, ctx: &Ctx) -> DevclawResult<ExecResult> {
        let started = Instant::now();

        // Defaults.
        let isolation = request.isolation.unwrap_or(self.config.isolation);
        let timeout = request
            .timeout
            .unwrap_or(Duration::from_secs(self.config.timeout_secs));

        // {baseDir} substitution.
        let base_dir = request
            .base_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let script_path = PathBuf::from(substitute_base_dir(&request.script_path, &base_dir));
        let args: Vec<String> = request
            .args
            .iter()
            .map(|a| substitute_base_dir(a, &base_dir))
            .collect();

        let Some(runtime) = request
            .runtime
            .or_else(|| Runtime::from_extension(&script_path))
        else {
            return Ok(finish(
                ExecResult::refused(
                    "unsupported_runtime",
                    format!("cannot infer a runtime for {}", script_path.display()),
                ),
                started,
            ));
        };

        // Policy gate.
        if let Err(reason) = self.policy.validate(isolation, &script_path) {
            info!(script = %script_path.display(), %reason, "policy rejected execution");
            return Ok(finish(
                ExecResult::refused("policy_violation", reason),
                started,
            ));
        }

        // Pre-flight content scan.
        if let Some(blocked) = self.preflight(runtime, &script_path) {
            return Ok(finish(blocked, started));
        }

        // Environment: filter, then inject the per-run temp dir.
        let mut env: Vec<(String, String)> = self
            .policy
            .filter_env(&request.env)
            .into_iter()
            .collect();
        let temp_dir = tempfile::Builder::new()
            .prefix("devclaw-exec-")
            .tempdir()?;
        let temp_path = temp_dir.path().to_path_buf();
        for name in ["DEVCLAW_TMPDIR", "TMPDIR", "HOME"] {
            env.push((name.to_string(), temp_path.display().to_string()));
        }

        let workdir = request
            .base_dir
            .clone()
            .or_else(|| script_path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        let task = ExecTask {
            runtime,
            script_path,
            args,
            env,
            workdir,
            temp_dir: temp_path.clone(),
            allow_network: request.allow_network || self.config.allow_network,
            timeout,
        };

        // Dispatch. Shared lock: the table is only written on reload.
        let run_ctx = ctx.with_timeout(timeout);
        let mut result = {
            let executors = self.executors.read().await;
            let executor = executors.select(isolation);
            debug!(
                executor = executor.name(),
                script = %task.script_path.display(),
                "dispatching execution"
            );
            match executor.execute(&task, &run_ctx).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "executor failed before completion");
                    ExecResult::refused("executor_error", e.to_string())
                }
            }
        };

        result.output_files = collect_output_files(&temp_path);
        result.stdout = truncate_output(result.stdout, self.config.max_output_bytes);
        result.stderr = truncate_output(result.stderr, self.config.max_output_bytes);
        result.duration = started.elapsed();

        info!(
            exit = result.exit_code,
            killed = result.killed,
            duration_ms = result.duration.as_millis() as u64,
            "execution finished"
        );
        Ok(result)
    }

    /// Scan the script content; a critical finding produces the blocking
    /// synthetic result.
    fn preflight(&self, runtime: Runtime, script_path: &Path) -> Option<ExecResult> {
        let content = match std::fs::read_to_string(script_path) {
            Ok(content) => content,
            Err(e) => {
                return Some(ExecResult::refused(
                    "policy_violation",
                    format!("cannot read script {}: {e}", script_path.display()),
                ));
            }
        };

        let findings = match runtime {
            Runtime::Shell => policy::scan_shell_script(&content),
            _ => policy::scan_script(&content),
        };

        for finding in findings
            .iter()
            .filter(|f| f.severity == policy::Severity::Warn)
        {
            warn!(
                rule = finding.rule,
                line = finding.line,
                "script scan warning"
            );
        }

        let critical: Vec<_> = findings
            .iter()
            .filter(|f| f.severity == policy::Severity::Critical)
            .collect();
        if critical.is_empty() {
            return None;
        }

        let mut stderr = String::from("script blocked by content scan:\n");
        for finding in &critical {
            stderr.push_str(&format!(
                "  {} at line {}: {}\n",
                finding.rule, finding.line, finding.message
            ));
        }
        info!(
            script = %script_path.display(),
            findings = critical.len(),
            "preflight blocked execution"
        );
        Some(ExecResult::refused("preflight_blocked", stderr))
    }
}

fn substitute_base_dir(value: &str, base_dir: &str) -> String {
    value.replace("{baseDir}", base_dir)
}

fn finish(mut result: ExecResult, started: Instant) -> ExecResult {
    result.duration = started.elapsed();
    result
}

/// Immediate non-directory entries of the temp dir, sorted for stable
/// output.
fn collect_output_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    files
}

/// Cap output at `max` bytes (on a char boundary) with a trailing marker.
fn truncate_output(text: String, max: usize) -> String {
    if text.len() <= max {
        return text;
    }
    let mut cut = max;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut truncated = text[..cut].to_string();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dir_substitution() {
        assert_eq!(
            substitute_base_dir("{baseDir}/scripts/run.py", "/opt/skill"),
            "/opt/skill/scripts/run.py"
        );
        assert_eq!(substitute_base_dir("plain", "/opt/skill"), "plain");
    }

    #[test]
    fn truncation_appends_marker_on_char_boundary() {
        let text = "héllo wörld".repeat(100);
        let truncated = truncate_output(text.clone(), 64);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert!(truncated.len() <= 64 + TRUNCATION_MARKER.len());

        let short = truncate_output("tiny".to_string(), 64);
        assert_eq!(short, "tiny");
    }
}
