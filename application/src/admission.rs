//! Admission control for caller-triggered re-analysis.
//!
//! A per-caller sliding window bounds how often one user can trigger runs.
//! This is a caller-facing policy, not part of the run state machine: it
//! lives in process memory and only limits the instance it runs in.

use crate::config::AdmissionParams;
use crate::error::OrchestrationError;
use chrono::{DateTime, Utc};
use diligence_domain::UserId;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// Sliding-window rate limiter keyed by caller.
pub struct SlidingWindowLimiter {
    params: AdmissionParams,
    hits: Mutex<HashMap<UserId, VecDeque<DateTime<Utc>>>>,
}

impl SlidingWindowLimiter {
    pub fn new(params: AdmissionParams) -> Self {
        Self {
            params,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn params(&self) -> &AdmissionParams {
        &self.params
    }

    /// Admit one request for `user` at `now`, or reject with the time until
    /// the oldest request in the window expires.
    ///
    /// Rejected requests are not counted.
    pub fn admit(
        &self,
        user: &UserId,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<(), OrchestrationError> {
        if is_admin && self.params.exempt_admins {
            return Ok(());
        }

        let window = self.params.window_delta();
        let mut hits = self
            .hits
            .lock()
            .map_err(|_| OrchestrationError::Store("admission state poisoned".to_string()))?;
        let entries = hits.entry(user.clone()).or_default();

        while let Some(oldest) = entries.front() {
            if now - *oldest >= window {
                entries.pop_front();
            } else {
                break;
            }
        }

        if entries.len() >= self.params.max_requests {
            let retry_after = entries
                .front()
                .map(|oldest| (*oldest + window - now).num_seconds().max(1) as u64)
                .unwrap_or(1);
            debug!(user = %user, retry_after, "Re-analysis request rejected by rate limit");
            return Err(OrchestrationError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        entries.push_back(now);
        Ok(())
    }

    /// Requests currently counted for `user` (as of the last admission).
    pub fn in_window(&self, user: &UserId) -> usize {
        self.hits
            .lock()
            .map(|hits| hits.get(user).map(VecDeque::len).unwrap_or(0))
            .unwrap_or(0)
    }
}
