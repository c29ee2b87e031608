//! Model provider domain: prediction wire types, transport seam, client, and
//! fixed prompt templates built on top of `generate`.

pub mod prompts;
pub mod replicate;

use crate::error::AgentError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use replicate::{HttpPredictionTransport, ReplicateClient};

/// Body submitted to the prediction creation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
}

/// Generation parameters carried inside a prediction request.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionInput {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// State returned by the creation and status endpoints.
///
/// `status` values `succeeded` and `failed` are terminal; anything else means
/// the job is still running.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionState {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl PredictionState {
    pub fn is_terminal(&self) -> bool {
        self.status == "succeeded" || self.status == "failed"
    }
}

/// Transport seam over the remote prediction API so the poll loop can be
/// exercised without a network.
#[async_trait]
pub trait PredictionTransport: Send + Sync {
    /// Submit a prediction job; returns the initial state including its id.
    async fn create(&self, request: &PredictionRequest) -> Result<PredictionState, AgentError>;

    /// Fetch the current state of a prediction by id.
    async fn status(&self, prediction_id: &str) -> Result<PredictionState, AgentError>;
}
