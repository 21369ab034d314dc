use crate::pipeline::Pipeline;
use crate::state::AppState;
use chrono::Utc;
use sage_common::report::CycleReport;
use std::time::Duration;

/// Pause after a failed cycle before the loop resumes.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Upper bound on one cycle. Per-call timeouts normally keep a cycle far
/// below this; hitting it means a collaborator hung past its own timeout.
pub const CYCLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs one bounded cycle and publishes its result for the health endpoint.
pub async fn run_once(pipeline: &mut Pipeline, state: &AppState) -> anyhow::Result<CycleReport> {
    let started = Utc::now();
    let report = tokio::time::timeout(CYCLE_TIMEOUT, pipeline.run_cycle(started))
        .await
        .map_err(|_| anyhow::anyhow!("cycle exceeded {CYCLE_TIMEOUT:?}"))?;
    state.publish(&report, Utc::now());
    Ok(report)
}
