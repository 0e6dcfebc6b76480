use serde::{Deserialize, Serialize};

/// Parameters of one configuration-driven concurrency stress scenario:
/// `scopes` scopes each spawn `tasks_per_scope` children, each child
/// performing `increments_per_task` guarded increments on one shared counter.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[non_exhaustive]
pub struct StressScenarioConfig {
    pub scopes: usize,
    pub tasks_per_scope: usize,
    pub increments_per_task: u64,
}

impl StressScenarioConfig {
    /// Counter value expected once every scope has been awaited.
    pub fn expected_total(&self) -> u64 {
        self.scopes as u64 * self.tasks_per_scope as u64 * self.increments_per_task
    }
}

impl Default for StressScenarioConfig {
    fn default() -> Self {
        Self {
            scopes: 100,
            tasks_per_scope: 1000,
            increments_per_task: 1,
        }
    }
}
