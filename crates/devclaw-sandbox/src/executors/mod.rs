//! Execution backends.
//!
//! Three tiers behind one trait: direct (own process group only),
//! restricted (Linux namespaces), container (local engine, no network).
//! Selection falls back along requested → container → restricted →
//! direct, with a warning on every hop.

mod container;
mod direct;
mod restricted;
mod supervise;

pub use container::ContainerExecutor;
pub use direct::DirectExecutor;
pub use restricted::RestrictedExecutor;
pub(crate) use supervise::run_child;

use async_trait::async_trait;
use tracing::warn;

use devclaw_core::config::IsolationLevel;
use devclaw_core::errors::DevclawResult;
use devclaw_core::Ctx;

use crate::exec::{ExecResult, ExecTask};

/// A sandboxed execution backend. Implementations hold no per-run state;
/// everything a run needs travels in the [`ExecTask`].
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, task: &ExecTask, ctx: &Ctx) -> DevclawResult<ExecResult>;

    /// Whether this backend can run on the current host.
    fn available(&self) -> bool;

    fn name(&self) -> &'static str;

    /// Release backend resources. Most executors have none.
    async fn close(&self) {}
}

/// The full set of backends, owned by the runner.
pub struct ExecutorSet {
    pub direct: DirectExecutor,
    pub restricted: RestrictedExecutor,
    pub container: ContainerExecutor,
}

impl ExecutorSet {
    pub fn new(container_image: String) -> Self {
        Self {
            direct: DirectExecutor,
            restricted: RestrictedExecutor,
            container: ContainerExecutor::detect(container_image),
        }
    }

    fn by_level(&self, level: IsolationLevel) -> &dyn Executor {
        match level {
            IsolationLevel::None => &self.direct,
            IsolationLevel::Restricted => &self.restricted,
            IsolationLevel::Container => &self.container,
        }
    }

    /// Pick the first available backend along the fallback chain.
    pub fn select(&self, requested: IsolationLevel) -> &dyn Executor {
        let chain = [
            requested,
            IsolationLevel::Container,
            IsolationLevel::Restricted,
            IsolationLevel::None,
        ];
        let mut tried = Vec::new();
        for level in chain {
            if tried.contains(&level) {
                continue;
            }
            tried.push(level);
            let executor = self.by_level(level);
            if executor.available() {
                if level != requested {
                    warn!(
                        requested = requested.as_str(),
                        selected = executor.name(),
                        "requested executor unavailable, falling back"
                    );
                }
                return executor;
            }
        }
        // Direct is unconditionally available; the chain always ends there.
        &self.direct
    }
}
