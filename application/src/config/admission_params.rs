//! Admission control parameters for caller-triggered re-analysis.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sliding-window rate limit applied per caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionParams {
    /// Requests allowed per caller within `window`.
    pub max_requests: usize,
    pub window: Duration,
    /// Admins bypass the limit.
    pub exempt_admins: bool,
}

impl Default for AdmissionParams {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: Duration::from_secs(60 * 60),
            exempt_admins: true,
        }
    }
}

impl AdmissionParams {
    pub fn window_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::MAX)
    }
}

/// Ledger conversion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerParams {
    /// Credits charged per USD of agent cost.
    pub credits_per_usd: f64,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            credits_per_usd: 100.0,
        }
    }
}
