//! Host requirement checks: OS gate, binary probes, env vars.

use std::path::{Path, PathBuf};

use crate::frontmatter::SkillMetadata;

/// What the host is missing for a skill. `satisfied()` is the summary.
#[derive(Debug, Clone, Default)]
pub struct RequirementReport {
    pub os_supported: bool,
    pub missing_bins: Vec<String>,
    /// Set when none of `anyBins` resolved.
    pub missing_any_bins: Vec<String>,
    pub missing_env: Vec<String>,
}

impl RequirementReport {
    pub fn satisfied(&self) -> bool {
        self.os_supported
            && self.missing_bins.is_empty()
            && self.missing_any_bins.is_empty()
            && self.missing_env.is_empty()
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var("PATH").ok()?;
    path_var
        .split(':')
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| candidate.is_file())
}

/// Whether an OS-gate entry matches the running platform.
fn os_matches(gate: &str) -> bool {
    let gate = gate.to_ascii_lowercase();
    match std::env::consts::OS {
        "macos" => gate == "macos" || gate == "darwin",
        os => gate == os,
    }
}

pub(crate) fn check(metadata: &SkillMetadata) -> RequirementReport {
    let os_supported = metadata.os.is_empty() || metadata.os.iter().any(|g| os_matches(g));

    let missing_bins: Vec<String> = metadata
        .requires
        .bins
        .iter()
        .filter(|bin| find_in_path(bin).is_none())
        .cloned()
        .collect();

    let any_bins = &metadata.requires.any_bins;
    let missing_any_bins = if any_bins.is_empty()
        || any_bins.iter().any(|bin| find_in_path(bin).is_some())
    {
        Vec::new()
    } else {
        any_bins.clone()
    };

    let missing_env: Vec<String> = metadata
        .requires
        .env
        .iter()
        .filter(|name| std::env::var(name.as_str()).map_or(true, |v| v.is_empty()))
        .cloned()
        .collect();

    RequirementReport {
        os_supported,
        missing_bins,
        missing_any_bins,
        missing_env,
    }
}
