use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use strum::{Display, EnumString};

/// Status of an agent verification job as reported by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    InProgress,
    NeedsInfo,
    Completed,
    Failed,
    /// Any status this client does not know about. Treated as non-terminal.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// `completed` and `failed` end the job; nothing transitions out of them.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Step identifiers arrive as strings from the agent and as integers from older backends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StepId {
    Number(i64),
    Text(String),
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepId::Number(n) => write!(f, "{n}"),
            StepId::Text(s) => f.write_str(s),
        }
    }
}

/// One step of the agent's verification pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationStep {
    pub step_id: StepId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Backend-defined; not interpreted client-side.
    #[serde(default)]
    pub status: String,
    pub confidence: Option<f64>,
    /// Opaque structured detail, displayed verbatim.
    pub details: Option<Map<String, Value>>,
    pub timestamp: Option<String>,
}

/// Request for more input attached to a `needs_info` job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NeedsInfo {
    pub message: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Full status snapshot of a verification job. Every poll replaces the previous snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationJob {
    pub verification_id: Option<String>,
    pub status: JobStatus,
    pub document_type: Option<String>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub steps: Vec<VerificationStep>,
    pub result_summary: Option<String>,
    pub needs_info: Option<NeedsInfo>,
    pub preview_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl VerificationJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
