//! Execution policy: request validation and environment filtering.
//!
//! Content scanning lives in [`rules`].

pub mod rules;

pub use rules::{scan_script, scan_shell_script, ScanResult, Severity};

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use devclaw_core::config::IsolationLevel;

/// Env var names that never reach a sandboxed child.
const BLOCKED_ENV_NAMES: &[&str] = &[
    "PATH",
    "NODE_OPTIONS",
    "NODE_PATH",
    "PYTHONHOME",
    "PYTHONPATH",
    "PYTHONSTARTUP",
    "RUBYOPT",
    "PERL5LIB",
    "PERL5OPT",
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    "BASH_ENV",
    "ENV",
    "CDPATH",
];

/// Env var name prefixes that never reach a sandboxed child.
const BLOCKED_ENV_PREFIXES: &[&str] = &["LD_", "DYLD_"];

/// Gate-keeping applied before any executor is touched.
#[derive(Debug, Clone, Default)]
pub struct ExecPolicy {
    /// When set, only these names survive filtering (after the block
    /// rules have already applied).
    pub env_allowlist: Option<Vec<String>>,
}

impl ExecPolicy {
    pub fn new(env_allowlist: Option<Vec<String>>) -> Self {
        Self { env_allowlist }
    }

    /// For any isolation above `None`, the script must exist and be a
    /// regular file.
    pub fn validate(&self, isolation: IsolationLevel, script_path: &Path) -> Result<(), String> {
        if isolation == IsolationLevel::None {
            return Ok(());
        }
        match std::fs::metadata(script_path) {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(format!(
                "script path {} is not a regular file",
                script_path.display()
            )),
            Err(e) => Err(format!(
                "script path {} not accessible: {e}",
                script_path.display()
            )),
        }
    }

    /// Drop blocked names and prefixes; when an allow-list is configured,
    /// drop anything not in it.
    pub fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        let mut kept = HashMap::new();
        for (name, value) in env {
            if BLOCKED_ENV_NAMES.contains(&name.as_str()) {
                debug!(name, "dropping blocked env var");
                continue;
            }
            if BLOCKED_ENV_PREFIXES.iter().any(|p| name.starts_with(p)) {
                debug!(name, "dropping env var with blocked prefix");
                continue;
            }
            if let Some(allowlist) = &self.env_allowlist {
                if !allowlist.iter().any(|allowed| allowed == name) {
                    continue;
                }
            }
            kept.insert(name.clone(), value.clone());
        }
        kept
    }
}
