//! Call deadlines and cancellation
//!
//! A [`Deadline`] travels with one pipeline call. Every suspension point in
//! that call (adapter requests, poll waits, fan-out items) runs under it, so
//! expiry or cancellation ends the whole call with a `TimeoutError`.

use crate::error::PipelineError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Deadline {
    at: Option<Instant>,
    cancel: CancellationToken,
}

impl Deadline {
    /// No time limit and nothing to cancel it
    pub fn unbounded() -> Self {
        Self {
            at: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            at: Some(Instant::now() + budget),
            cancel: CancellationToken::new(),
        }
    }

    /// Also end when `token` is cancelled (e.g. service shutdown)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Copy that expires no later than `budget` from now
    pub fn tightened(&self, budget: Duration) -> Self {
        let limit = Instant::now() + budget;
        Self {
            at: Some(self.at.map_or(limit, |at| at.min(limit))),
            cancel: self.cancel.clone(),
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Run `work` until it finishes, the deadline passes, or the call is cancelled
    pub async fn run<T, F>(&self, what: &str, work: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, PipelineError>>,
    {
        let bounded = async {
            match self.at {
                Some(at) => match tokio::time::timeout_at(at, work).await {
                    Ok(result) => result,
                    Err(_) => Err(PipelineError::Timeout(format!("{} exceeded its deadline", what))),
                },
                None => work.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(PipelineError::Timeout(format!("{} was cancelled", what)))
            }
            result = bounded => result,
        }
    }

    /// Suspend for `period` under this deadline
    pub async fn sleep(&self, what: &str, period: Duration) -> Result<(), PipelineError> {
        self.run(what, async {
            tokio::time::sleep(period).await;
            Ok(())
        })
        .await
    }
}
