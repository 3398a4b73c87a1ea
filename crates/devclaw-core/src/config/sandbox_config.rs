use serde::{Deserialize, Serialize};

use super::defaults;

/// Isolation tier requested for a sandboxed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationLevel {
    /// No isolation; parent environment, own process group. Trusted callers only.
    None,
    /// Linux namespaces: new PID, mount, user (and net unless allowed).
    Restricted,
    /// Container engine with no network and mounted workdir only.
    Container,
}

impl IsolationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Restricted => "restricted",
            Self::Container => "container",
        }
    }
}

/// Sandbox execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Default isolation tier when a request does not specify one.
    pub isolation: IsolationLevel,
    /// Per-execution wall-clock timeout in seconds.
    pub timeout_secs: u64,
    /// stdout/stderr are truncated beyond this many bytes.
    pub max_output_bytes: usize,
    /// Whether restricted executions keep the host network namespace.
    pub allow_network: bool,
    /// Image used by the container executor.
    pub container_image: String,
    /// When set, only these env var names survive filtering.
    pub env_allowlist: Option<Vec<String>>,
    pub ssrf: SsrfConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            isolation: IsolationLevel::Restricted,
            timeout_secs: defaults::DEFAULT_EXEC_TIMEOUT_SECS,
            max_output_bytes: defaults::DEFAULT_MAX_OUTPUT_BYTES,
            allow_network: false,
            container_image: defaults::DEFAULT_CONTAINER_IMAGE.to_string(),
            env_allowlist: None,
            ssrf: SsrfConfig::default(),
        }
    }
}

/// SSRF guard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SsrfConfig {
    /// Permit RFC1918/ULA destinations. Link-local is rejected regardless.
    pub allow_private: bool,
    /// Hostnames denied in addition to the built-in list.
    pub blocked_hosts: Vec<String>,
    /// When non-empty, hostnames must appear here to proceed.
    pub allowed_hosts: Vec<String>,
}
