//! Job transport port
//!
//! The durable background-job transport accepts a named event with a JSON
//! payload and runs its handler asynchronously somewhere else. There is no
//! return channel: results come back through agent-completion callbacks.
//! Delivery is at-least-once, so handlers must tolerate duplicates.

use async_trait::async_trait;
use diligence_domain::{AgentName, AnalysisId, DealId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Event asking the job runtime to execute an agent batch.
pub const AGENTS_REQUESTED_EVENT: &str = "analysis/agents.requested";

/// Errors that can occur while emitting an event
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,

    #[error("Event rejected: {0}")]
    Rejected(String),

    #[error("Malformed payload for {event}: {message}")]
    MalformedPayload { event: String, message: String },
}

/// A named event with an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub name: String,
    pub payload: Value,
}

impl JobEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Payload of [`AGENTS_REQUESTED_EVENT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    pub deal_id: DealId,
    pub analysis_id: AnalysisId,
    pub agents: Vec<AgentName>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

impl AnalysisJob {
    pub fn to_event(&self) -> Result<JobEvent, TransportError> {
        let payload = serde_json::to_value(self).map_err(|e| TransportError::MalformedPayload {
            event: AGENTS_REQUESTED_EVENT.to_string(),
            message: e.to_string(),
        })?;
        Ok(JobEvent::new(AGENTS_REQUESTED_EVENT, payload))
    }

    pub fn from_event(event: &JobEvent) -> Result<Self, TransportError> {
        if event.name != AGENTS_REQUESTED_EVENT {
            return Err(TransportError::MalformedPayload {
                event: event.name.clone(),
                message: "unexpected event name".to_string(),
            });
        }
        serde_json::from_value(event.payload.clone()).map_err(|e| {
            TransportError::MalformedPayload {
                event: event.name.clone(),
                message: e.to_string(),
            }
        })
    }
}

/// Fire-and-forget event emitter
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Hand the event to the transport. Returns once it is accepted, never
    /// after the handler runs.
    async fn send(&self, event: JobEvent) -> Result<(), TransportError>;
}
