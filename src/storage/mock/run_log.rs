use async_trait::async_trait;

use super::MockStore;
use crate::model::RunLog;
use crate::storage::{Result, RunLogStore, StorageError};

#[async_trait]
impl RunLogStore for MockStore {
    async fn record_run(&self, run: &RunLog) -> Result<()> {
        if *self.fail_on_record_run.read().await {
            return Err(StorageError::Unavailable("run log write failed".to_string()));
        }
        self.state.write().await.runs.push(run.clone());
        Ok(())
    }

    async fn recent_runs(&self, limit: u32) -> Result<Vec<RunLog>> {
        let state = self.state.read().await;
        let mut runs: Vec<RunLog> = state.runs.iter().rev().cloned().collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit as usize);
        Ok(runs)
    }
}
