//! Fake assistant client for testing.
//!
//! Serves scripted replies and run statuses so the generation pipeline can be
//! exercised without network access or API costs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::client::{AiError, AssistantClient};
use super::types::{RunHandle, RunStatus};

/// A scripted [`AssistantClient`].
///
/// - Replies are served in submission order; the last one repeats.
/// - Run statuses are served in poll order per run; the last one repeats.
/// - Status delays follow the same per-run order, so a run can stall mid-way.
pub struct FakeAssistant {
    replies: Vec<String>,
    run_statuses: Vec<RunStatus>,
    submit_error: Option<AiError>,
    submit_delay: Duration,
    status_delays: Vec<Duration>,
    fetch_delay: Duration,
    submits: AtomicUsize,
    status_polls: AtomicUsize,
    polls_this_run: Mutex<usize>,
}

impl Default for FakeAssistant {
    fn default() -> Self {
        Self {
            replies: Vec::new(),
            run_statuses: vec![RunStatus::Completed],
            submit_error: None,
            submit_delay: Duration::ZERO,
            status_delays: Vec::new(),
            fetch_delay: Duration::ZERO,
            submits: AtomicUsize::new(0),
            status_polls: AtomicUsize::new(0),
            polls_this_run: Mutex::new(0),
        }
    }
}

impl FakeAssistant {
    /// Runs complete on the first poll and there are no replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always reply with `text`.
    pub fn with_reply(text: &str) -> Self {
        Self::new().with_replies(vec![text.to_string()])
    }

    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    pub fn with_run_statuses(mut self, statuses: Vec<RunStatus>) -> Self {
        assert!(!statuses.is_empty(), "run statuses must not be empty");
        self.run_statuses = statuses;
        self
    }

    /// Fail every submission with `error`.
    pub fn with_submit_error(mut self, error: AiError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Sleep for `delay` inside every submission.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    /// Sleep before answering each status poll of a run, in poll order.
    pub fn with_status_delays(mut self, delays: Vec<Duration>) -> Self {
        self.status_delays = delays;
        self
    }

    /// Sleep inside every reply fetch.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    /// Number of `submit` calls so far.
    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    /// Number of `run_status` calls so far, across all runs.
    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssistantClient for FakeAssistant {
    async fn submit(&self, _prompt: &str) -> Result<RunHandle, AiError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        if let Some(error) = &self.submit_error {
            return Err(error.clone());
        }

        *self.polls_this_run.lock().unwrap() = 0;
        Ok(RunHandle {
            thread_id: format!("thread_{n}"),
            run_id: format!("run_{n}"),
        })
    }

    async fn run_status(&self, _run: &RunHandle) -> Result<RunStatus, AiError> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);

        let poll = {
            let mut polls = self.polls_this_run.lock().unwrap();
            *polls += 1;
            *polls - 1
        };

        if let Some(delay) = self.status_delays.get(poll).or(self.status_delays.last()) {
            tokio::time::sleep(*delay).await;
        }

        let idx = poll.min(self.run_statuses.len() - 1);
        Ok(self.run_statuses[idx].clone())
    }

    async fn fetch_latest_reply(&self, thread_id: &str) -> Result<String, AiError> {
        let n: usize = thread_id
            .trim_start_matches("thread_")
            .parse()
            .map_err(|_| AiError::NoReply)?;

        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }
        if self.replies.is_empty() {
            return Err(AiError::NoReply);
        }
        let idx = n.saturating_sub(1).min(self.replies.len() - 1);
        Ok(self.replies[idx].clone())
    }
}
