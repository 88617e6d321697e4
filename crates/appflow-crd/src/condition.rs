//! Status conditions reported on submitted objects
//!
//! The platform reports step progress through a condition of type
//! [`CONDITION_WORKFLOW_PROGRESS`]. A `Succeeded` report carries the
//! generation it observed so that a stale success can be told apart from
//! a current one.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition type indicating workflow step progress
pub const CONDITION_WORKFLOW_PROGRESS: &str = "workflow-progress";

/// A structured status signal on an object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (e.g., "workflow-progress")
    #[serde(rename = "type")]
    pub condition_type: String,

    /// Whether the condition holds
    pub status: ConditionStatus,

    /// Machine-readable reason
    #[serde(default)]
    pub reason: ConditionReason,

    /// Free-form message; JSON for `Succeeded` progress reports
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Last time the status changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl Condition {
    /// Create a condition of the given type, status and reason
    pub fn new(
        condition_type: impl Into<String>,
        status: ConditionStatus,
        reason: ConditionReason,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason,
            message: String::new(),
            last_transition_time: Some(chrono::Utc::now()),
        }
    }

    /// Attach a message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// A true workflow-progress condition with the given reason
    pub fn workflow_progress(reason: ConditionReason) -> Self {
        Self::new(CONDITION_WORKFLOW_PROGRESS, ConditionStatus::True, reason)
    }

    /// A succeeded workflow-progress report fenced at `observed_generation`
    pub fn succeeded(observed_generation: i64) -> Self {
        Self::workflow_progress(ConditionReason::Succeeded)
            .with_message(SucceededMessage::new(observed_generation).to_string())
    }

    /// A failed workflow-progress report
    pub fn failed(message: impl Into<String>) -> Self {
        Self::workflow_progress(ConditionReason::Failed).with_message(message)
    }

    /// A stopped workflow-progress report
    pub fn stopped(message: impl Into<String>) -> Self {
        Self::workflow_progress(ConditionReason::Stopped).with_message(message)
    }

    /// Whether the condition status is `True`
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }
}

/// Condition status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    /// Any status the platform reports that is neither true nor false
    #[serde(other)]
    Unknown,
}

/// Reason attached to a workflow-progress condition
///
/// Serialized as a bare string. Reasons this crate does not know are kept
/// verbatim in [`ConditionReason::Other`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ConditionReason {
    Succeeded,
    Failed,
    Stopped,
    Other(String),
}

impl Default for ConditionReason {
    fn default() -> Self {
        ConditionReason::Other(String::new())
    }
}

impl From<String> for ConditionReason {
    fn from(reason: String) -> Self {
        match reason.as_str() {
            "Succeeded" => ConditionReason::Succeeded,
            "Failed" => ConditionReason::Failed,
            "Stopped" => ConditionReason::Stopped,
            _ => ConditionReason::Other(reason),
        }
    }
}

impl From<ConditionReason> for String {
    fn from(reason: ConditionReason) -> Self {
        reason.to_string()
    }
}

impl fmt::Display for ConditionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionReason::Succeeded => f.write_str("Succeeded"),
            ConditionReason::Failed => f.write_str("Failed"),
            ConditionReason::Stopped => f.write_str("Stopped"),
            ConditionReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// Payload of a `Succeeded` workflow-progress message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SucceededMessage {
    /// Generation of the object the success was observed at
    #[serde(rename = "ObservedGeneration", alias = "observedGeneration", default)]
    pub observed_generation: i64,
}

impl SucceededMessage {
    pub fn new(observed_generation: i64) -> Self {
        Self {
            observed_generation,
        }
    }

    /// Parse a condition message; unknown fields are ignored
    pub fn parse(message: &str) -> Result<Self> {
        Ok(serde_json::from_str(message)?)
    }
}

impl fmt::Display for SucceededMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"ObservedGeneration\":{}}}", self.observed_generation)
    }
}
