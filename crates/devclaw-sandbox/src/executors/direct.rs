//! Direct executor: parent environment, own process group.
//!
//! No filesystem or network isolation. Used only when a trusted caller
//! explicitly requests isolation level `none`; the process group still
//! lets cancellation kill the whole tree.

use async_trait::async_trait;
use tokio::process::Command;

use devclaw_core::errors::DevclawResult;
use devclaw_core::Ctx;

use crate::exec::{ExecResult, ExecTask};

use super::{run_child, Executor};

pub struct DirectExecutor;

#[async_trait]
impl Executor for DirectExecutor {
    async fn execute(&self, task: &ExecTask, ctx: &Ctx) -> DevclawResult<ExecResult> {
        let mut command = Command::new(task.runtime.interpreter());
        command
            .arg(&task.script_path)
            .args(&task.args)
            .current_dir(&task.workdir)
            .envs(task.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        #[cfg(unix)]
        command.process_group(0);

        run_child(command, task, ctx).await
    }

    fn available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}
