//! Container executor: local engine, no network, mounted workdir only.
//!
//! The task's workdir (the skill root) is mounted at `/work` and the
//! temp dir at `/devclaw-tmp` — the same roots the other tiers see, so
//! sibling assets under the skill root stay reachable. Script path,
//! arguments, and env values pointing into either mount are rewritten to
//! their in-container locations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use devclaw_core::errors::{DevclawError, DevclawResult};
use devclaw_core::Ctx;

use crate::exec::{ExecResult, ExecTask};

use super::{run_child, Executor};

/// Mount points inside the container.
const WORK_MOUNT: &str = "/work";
const TMP_MOUNT: &str = "/devclaw-tmp";

pub struct ContainerExecutor {
    engine: Option<String>,
    image: String,
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var("PATH").ok()?;
    path_var
        .split(':')
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| candidate.is_file())
}

/// Join a mount point with a host-relative path.
fn join_mount(mount: &str, rel: &Path) -> String {
    if rel.as_os_str().is_empty() {
        mount.to_string()
    } else {
        format!("{mount}/{}", rel.display())
    }
}

/// Rewrite a host path into its in-container location. Values outside
/// both mounts pass through unchanged (they are not paths we own).
fn translate_host_path(value: &str, workdir: &Path, temp_dir: &Path) -> String {
    let path = Path::new(value);
    if let Ok(rel) = path.strip_prefix(temp_dir) {
        return join_mount(TMP_MOUNT, rel);
    }
    if let Ok(rel) = path.strip_prefix(workdir) {
        return join_mount(WORK_MOUNT, rel);
    }
    value.to_string()
}

impl ContainerExecutor {
    /// Probe for a local container engine, docker first, then podman.
    pub fn detect(image: String) -> Self {
        let engine = ["docker", "podman"]
            .iter()
            .find(|name| find_in_path(name).is_some())
            .map(|name| name.to_string());
        if let Some(engine) = &engine {
            debug!(engine, image, "container engine detected");
        }
        Self { engine, image }
    }
}

#[async_trait]
impl Executor for ContainerExecutor {
    async fn execute(&self, task: &ExecTask, ctx: &Ctx) -> DevclawResult<ExecResult> {
        let engine = self
            .engine
            .as_deref()
            .ok_or_else(|| DevclawError::Sandbox("no container engine available".to_string()))?;

        // The script must live under the mounted workdir; scripts/ is a
        // subdirectory of the skill root, not the root itself.
        let script_rel = task
            .script_path
            .strip_prefix(&task.workdir)
            .map_err(|_| {
                DevclawError::Sandbox(format!(
                    "script {} is outside the mounted workdir {}",
                    task.script_path.display(),
                    task.workdir.display()
                ))
            })?;

        let mut command = Command::new(engine);
        command
            .arg("run")
            .arg("--rm")
            .arg("--network")
            .arg(if task.allow_network { "bridge" } else { "none" })
            .arg("-v")
            .arg(format!("{}:{WORK_MOUNT}", task.workdir.display()))
            .arg("-v")
            .arg(format!("{}:{TMP_MOUNT}", task.temp_dir.display()))
            .arg("-w")
            .arg(WORK_MOUNT);
        for (name, value) in &task.env {
            let value = translate_host_path(value, &task.workdir, &task.temp_dir);
            command.arg("-e").arg(format!("{name}={value}"));
        }
        command
            .arg(&self.image)
            .arg(task.runtime.interpreter())
            .arg(join_mount(WORK_MOUNT, script_rel))
            .args(
                task.args
                    .iter()
                    .map(|arg| translate_host_path(arg, &task.workdir, &task.temp_dir)),
            );
        #[cfg(unix)]
        command.process_group(0);

        run_child(command, task, ctx).await
    }

    fn available(&self) -> bool {
        self.engine.is_some()
    }

    fn name(&self) -> &'static str {
        "container"
    }
}
