//! Error kinds surfaced by the Letta client.

use reqwest::StatusCode;

/// Errors returned by every client operation.
///
/// The client never retries; each variant maps to one failed round trip so the
/// caller can decide how to react.
#[derive(Debug, thiserror::Error)]
pub enum LettaError {
    /// The server rejected an agent creation payload.
    #[error("agent creation rejected ({status}): {body}")]
    Creation { status: StatusCode, body: String },

    /// The referenced agent does not exist on the server.
    #[error("agent not found: {agent_id}")]
    NotFound { agent_id: String },

    /// A message exchange came back without the expected reply shape.
    #[error("messaging error: {0}")]
    Messaging(String),

    /// The server could not be reached or answered with an unexpected status.
    #[error("cannot talk to Letta server at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// A successful response carried a body we could not decode.
    #[error("decode {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The blocking client could not start its runtime.
    #[error("start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// Bulk deletion attempted every agent but some deletions failed.
    #[error("{} of {} agent deletion(s) failed", .0.failed.len(), .0.attempted())]
    PartialDelete(DeleteReport),
}

impl LettaError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LettaError::NotFound { .. })
    }

    /// Classify a transport-level reqwest failure.
    pub(crate) fn from_transport(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return LettaError::Timeout {
                url: url.to_string(),
            };
        }
        LettaError::Connectivity {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Outcome of deleting every agent on the server.
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Agents removed by this call.
    pub deleted: Vec<String>,
    /// Agents that were already gone when we got to them.
    pub skipped: Vec<String>,
    /// Agents whose deletion failed, with the reason.
    pub failed: Vec<(String, LettaError)>,
}

impl DeleteReport {
    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub type Result<T> = std::result::Result<T, LettaError>;
