//! Admission and ledger configuration from TOML (`[admission]`, `[ledger]`)

use super::orchestrator::zero_warning;
use diligence_application::{AdmissionParams, LedgerParams};
use diligence_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-caller re-analysis rate limit.
///
/// # Example
///
/// ```toml
/// [admission]
/// max_requests = 3
/// window_minutes = 60
/// exempt_admins = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAdmissionConfig {
    pub max_requests: usize,
    pub window_minutes: u64,
    pub exempt_admins: bool,
}

impl Default for FileAdmissionConfig {
    fn default() -> Self {
        let params = AdmissionParams::default();
        Self {
            max_requests: params.max_requests,
            window_minutes: params.window.as_secs() / 60,
            exempt_admins: params.exempt_admins,
        }
    }
}

impl FileAdmissionConfig {
    pub fn to_params(&self) -> (AdmissionParams, Vec<ConfigIssue>) {
        let mut params = AdmissionParams {
            exempt_admins: self.exempt_admins,
            ..AdmissionParams::default()
        };
        let mut issues = Vec::new();

        if self.max_requests == 0 {
            issues.push(zero_warning("admission.max_requests"));
        } else {
            params.max_requests = self.max_requests;
        }
        if self.window_minutes == 0 {
            issues.push(zero_warning("admission.window_minutes"));
        } else {
            params.window = Duration::from_secs(self.window_minutes * 60);
        }

        (params, issues)
    }
}

/// Cost to credit conversion.
///
/// ```toml
/// [ledger]
/// credits_per_usd = 100.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLedgerConfig {
    pub credits_per_usd: f64,
}

impl Default for FileLedgerConfig {
    fn default() -> Self {
        Self {
            credits_per_usd: LedgerParams::default().credits_per_usd,
        }
    }
}

impl FileLedgerConfig {
    pub fn to_params(&self) -> (LedgerParams, Vec<ConfigIssue>) {
        if self.credits_per_usd.is_finite() && self.credits_per_usd > 0.0 {
            return (
                LedgerParams {
                    credits_per_usd: self.credits_per_usd,
                },
                Vec::new(),
            );
        }
        (
            LedgerParams::default(),
            vec![ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "ledger.credits_per_usd".to_string(),
                },
                format!(
                    "ledger.credits_per_usd ({}) must be positive, using the default",
                    self.credits_per_usd
                ),
            )],
        )
    }
}
