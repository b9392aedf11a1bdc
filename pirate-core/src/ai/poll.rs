//! Run polling with capped exponential backoff.

use std::time::Duration;
use tokio::time::Instant;

use super::client::{AiError, AssistantClient};
use super::types::{RunHandle, RunStatus};

/// How often to poll a run and when to give up.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second poll.
    pub initial_delay: Duration,
    /// Each delay is the previous one times this factor.
    pub multiplier: f64,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Absolute budget, measured from submission.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            multiplier: 1.5,
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
        }
    }
}

impl PollPolicy {
    /// The uncapped-by-timeout delay sequence: 1s, 1.5s, 2.25s, 3.375s, 5s, 5s, ...
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.initial_delay.min(self.max_delay)), move |d| {
            Some(d.mul_f64(self.multiplier).min(self.max_delay))
        })
    }
}

/// Poll `run` until it leaves the pending states.
///
/// `started` is the instant the run was submitted; the timeout counts from
/// there. Sleeps are clamped and each status request is cut off at the
/// deadline, so the total wait never exceeds the timeout.
/// `on_status` sees every status observed, including the terminal one.
pub async fn await_completion(
    client: &dyn AssistantClient,
    run: &RunHandle,
    policy: &PollPolicy,
    started: Instant,
    on_status: &(dyn Fn(&RunStatus) + Send + Sync),
) -> Result<(), AiError> {
    let deadline = started + policy.timeout;
    let mut delays = policy.delays();

    loop {
        let status = tokio::time::timeout_at(deadline, client.run_status(run))
            .await
            .map_err(|_| {
                tracing::warn!(
                    thread_id = %run.thread_id,
                    run_id = %run.run_id,
                    "Status request still pending at timeout"
                );
                AiError::Timeout(policy.timeout)
            })??;
        on_status(&status);

        if status == RunStatus::Completed {
            return Ok(());
        }
        if !status.is_pending() {
            return Err(AiError::RunFailed {
                status: status.to_string(),
            });
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(
                thread_id = %run.thread_id,
                run_id = %run.run_id,
                status = %status,
                "Run did not complete before timeout"
            );
            return Err(AiError::Timeout(policy.timeout));
        }

        let delay = delays.next().unwrap_or(policy.max_delay);
        tracing::trace!(
            run_id = %run.run_id,
            status = %status,
            delay_ms = delay.as_millis() as u64,
            "Run still pending"
        );
        tokio::time::sleep(delay.min(deadline - now)).await;
    }
}
