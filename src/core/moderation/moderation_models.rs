// Moderation domain models - the connection handle, result envelope and payloads.
//
// These are pure domain types with no transport dependencies.
// The console layer renders them; the client produces them.

use super::catalogue::OperationId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Parameters supplied to an invocation, keyed by parameter name.
pub type InvocationParams = BTreeMap<String, String>;

/// The client's current belief about reachability of the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Testing,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Testing => write!(f, "Testing"),
            ConnectionStatus::Connected => write!(f, "Connected"),
        }
    }
}

/// Reachability to the external service.
///
/// Never mutated in place: a status change produces a new handle via `with_status`
/// which then replaces the live one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    pub endpoint_address: String,
    pub service_identifier: String,
    pub status: ConnectionStatus,
}

impl ConnectionHandle {
    pub fn new(endpoint_address: impl Into<String>, service_identifier: impl Into<String>) -> Self {
        Self {
            endpoint_address: endpoint_address.into(),
            service_identifier: service_identifier.into(),
            status: ConnectionStatus::Disconnected,
        }
    }

    pub fn with_status(&self, status: ConnectionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

/// A stored message as returned by `receive-messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    /// Position in the returned sequence; usable as `messageIndex` for edits.
    pub index: u64,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Harassment severity as reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityCategory {
    Low,
    Moderate,
    High,
    /// Any label the service returns that we do not recognise.
    Unknown,
}

impl SeverityCategory {
    /// Case-insensitive match on the trimmed label. Never fails.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" => SeverityCategory::Low,
            "moderate" => SeverityCategory::Moderate,
            "high" => SeverityCategory::High,
            _ => SeverityCategory::Unknown,
        }
    }

    /// Display-only position on a 0-100 scale.
    pub fn scale(&self) -> u8 {
        match self {
            SeverityCategory::Low => 25,
            SeverityCategory::Moderate => 55,
            SeverityCategory::High => 85,
            SeverityCategory::Unknown => 0,
        }
    }

    pub fn risk_label(&self) -> &'static str {
        match self {
            SeverityCategory::Low => "Low Risk",
            SeverityCategory::Moderate => "Moderate Risk",
            SeverityCategory::High => "Severe Risk",
            SeverityCategory::Unknown => "Unrated",
        }
    }
}

impl fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityCategory::Low => write!(f, "low"),
            SeverityCategory::Moderate => write!(f, "moderate"),
            SeverityCategory::High => write!(f, "high"),
            SeverityCategory::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarassmentAssessment {
    /// The label exactly as the service returned it.
    pub raw_label: String,
    pub category: SeverityCategory,
    pub scale: u8,
}

impl HarassmentAssessment {
    pub fn from_label(raw_label: impl Into<String>) -> Self {
        let raw_label = raw_label.into();
        let category = SeverityCategory::from_label(&raw_label);
        Self {
            raw_label,
            category,
            scale: category.scale(),
        }
    }
}

/// Operation-specific data of a successful invocation.
///
/// The boolean flags are reported exactly as the service answered. For `Edit` a `false`
/// cannot be attributed to a cause: the service uses the same answer for an invalid index,
/// an unauthorized sender and a re-moderation rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Payload {
    Delivery {
        accepted: bool,
    },
    Messages {
        receiver: String,
        messages: Vec<MessageRecord>,
    },
    Edit {
        message_index: u64,
        applied: bool,
    },
    Deletion {
        sender: String,
        deleted: bool,
    },
    Clear {
        cleared: bool,
    },
    Harassment(HarassmentAssessment),
    Suggestion {
        original: String,
        suggestion: String,
    },
    KeyIssue {
        key: Option<String>,
    },
    KeyCheck {
        valid: bool,
    },
}

impl Payload {
    /// Whether the service answered "no" to an otherwise completed call.
    pub fn is_business_negative(&self) -> bool {
        match self {
            Payload::Delivery { accepted } => !accepted,
            Payload::Edit { applied, .. } => !applied,
            Payload::Deletion { deleted, .. } => !deleted,
            Payload::Clear { cleared } => !cleared,
            Payload::KeyIssue { key } => key.is_none(),
            Payload::KeyCheck { valid } => !valid,
            Payload::Messages { .. } | Payload::Harassment(_) | Payload::Suggestion { .. } => false,
        }
    }
}

/// Why an invocation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InvocationError {
    #[error("validation error: {field} {problem}")]
    Validation { field: String, problem: String },

    #[error("not connected: moderation service is {status}")]
    NotConnected { status: ConnectionStatus },

    #[error("{reason}")]
    Remote { reason: String },
}

impl InvocationError {
    pub fn validation(field: &str, problem: &str) -> Self {
        InvocationError::Validation {
            field: field.to_string(),
            problem: problem.to_string(),
        }
    }

    /// Remote failure carrying the underlying message, or a generic one if it is empty.
    pub fn remote(message: impl Into<String>) -> Self {
        let message = message.into();
        let reason = if message.trim().is_empty() {
            "unknown error".to_string()
        } else {
            message
        };
        InvocationError::Remote { reason }
    }
}

/// The normalized outcome of one invocation.
///
/// Built once by the client and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResult {
    operation_id: OperationId,
    supplied_parameters: InvocationParams,
    succeeded: bool,
    payload: Option<Payload>,
    failure: Option<InvocationError>,
    occurred_at: DateTime<Utc>,
}

impl InvocationResult {
    pub fn success(operation_id: OperationId, params: InvocationParams, payload: Payload) -> Self {
        Self {
            operation_id,
            supplied_parameters: params,
            succeeded: true,
            payload: Some(payload),
            failure: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn failure(
        operation_id: OperationId,
        params: InvocationParams,
        error: InvocationError,
    ) -> Self {
        Self {
            operation_id,
            supplied_parameters: params,
            succeeded: false,
            payload: None,
            failure: Some(error),
            occurred_at: Utc::now(),
        }
    }

    pub fn operation_id(&self) -> OperationId {
        self.operation_id
    }

    pub fn supplied_parameters(&self) -> &InvocationParams {
        &self.supplied_parameters
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&InvocationError> {
        self.failure.as_ref()
    }

    pub fn failure_reason(&self) -> Option<String> {
        self.failure.as_ref().map(|e| e.to_string())
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
