//! Script discovery inside a skill directory.
//!
//! Scripts live under `scripts/` (immediate entries only) plus the
//! conventional Python entry points `src/__main__.py` and `src/main.py`.

use std::path::{Path, PathBuf};

use tracing::debug;

use devclaw_core::models::Runtime;

/// A discovered script with its inferred runtime.
#[derive(Debug, Clone)]
pub struct SkillScript {
    pub path: PathBuf,
    /// None for files with an unrecognised extension.
    pub runtime: Option<Runtime>,
}

pub(crate) fn discover(dir: &Path) -> Vec<SkillScript> {
    let mut scripts = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir.join("scripts")) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                scripts.push(SkillScript {
                    runtime: Runtime::from_extension(&path),
                    path,
                });
            }
        }
    }

    for entry_point in ["src/__main__.py", "src/main.py"] {
        let path = dir.join(entry_point);
        if path.is_file() {
            scripts.push(SkillScript {
                runtime: Some(Runtime::Python),
                path,
            });
        }
    }

    scripts.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(dir = %dir.display(), scripts = scripts.len(), "skill scripts discovered");
    scripts
}
