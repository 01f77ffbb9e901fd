//! JSON seed data for the in-memory store
//!
//! Deals and session summaries are owned by other services in a real
//! deployment. Locally they are loaded from a fixture file:
//!
//! ```json
//! {
//!   "deals": [
//!     { "id": "acme", "name": "Acme Robotics", "owner_id": "analyst-1",
//!       "confidence_baseline": { "financial": 0.6 },
//!       "created_at": "2026-01-10T09:00:00Z" }
//!   ],
//!   "sessions": [
//!     { "session_id": "call-1", "deal_id": "acme",
//!       "created_at": "2026-02-01T15:00:00Z",
//!       "payload": { "confidence_delta": { "financial": -0.2 } } }
//!   ]
//! }
//! ```

use super::memory::InMemoryStore;
use diligence_application::ports::analysis_store::StoreError;
use diligence_domain::{Deal, SessionSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Session {session} references unknown deal {deal}")]
    UnknownDeal { session: String, deal: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Contents of a fixture file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub deals: Vec<Deal>,
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
}

impl FixtureFile {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fixture: Self = serde_json::from_str(&content).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            deals = fixture.deals.len(),
            sessions = fixture.sessions.len(),
            "Loaded fixture"
        );
        Ok(fixture)
    }

    /// Every session must belong to a deal of the same fixture.
    pub fn check(&self) -> Result<(), FixtureError> {
        let deals: HashSet<_> = self.deals.iter().map(|d| &d.id).collect();
        match self.sessions.iter().find(|s| !deals.contains(&s.deal_id)) {
            Some(orphan) => Err(FixtureError::UnknownDeal {
                session: orphan.session_id.to_string(),
                deal: orphan.deal_id.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn seed(self, store: &InMemoryStore) -> Result<(), FixtureError> {
        self.check()?;
        let (deals, sessions) = (self.deals.len(), self.sessions.len());
        for deal in self.deals {
            store.insert_deal(deal)?;
        }
        for summary in self.sessions {
            store.insert_summary(summary)?;
        }
        info!(deals, sessions, "Seeded store from fixture");
        Ok(())
    }
}
