// Rendering of core results as console text.
//
// Pure functions only, so every message can be unit tested without a terminal.

use crate::core::auth::{AuthOutcome, KeyRequestOutcome};
use crate::core::moderation::{
    ConnectionStatus, InvocationError, InvocationResult, OperationId, Payload, CATALOGUE,
};
use crate::core::projects::Project;

/// Shorten long identities to `first8...last8`.
pub fn short_identity(identity: &str) -> String {
    let chars: Vec<char> = identity.chars().collect();
    if chars.len() <= 16 {
        return identity.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn status_line(status: ConnectionStatus) -> String {
    let icon = match status {
        ConnectionStatus::Connected => "🟢",
        ConnectionStatus::Testing => "🟡",
        ConnectionStatus::Disconnected => "🔴",
    };
    format!("{} Moderation service: {}", icon, status)
}

pub fn project_line(project: &Project) -> String {
    let key = if project.auth_key.is_some() {
        "🔑"
    } else {
        "  "
    };
    format!(
        "{} {}  {}  ({}) created {}",
        key,
        project.id,
        project.name,
        project.description,
        project.created_at.format("%Y-%m-%d")
    )
}

pub fn project_list(projects: &[Project]) -> Vec<String> {
    if projects.is_empty() {
        return vec!["No projects yet. Create one with `create <name> | <description>`.".to_string()];
    }
    let mut lines = vec![format!("📁 {} project(s):", projects.len())];
    lines.extend(projects.iter().map(project_line));
    lines
}

pub fn operation_list() -> Vec<String> {
    CATALOGUE
        .iter()
        .map(|op| {
            let params: Vec<&str> = op.parameter_names().collect();
            let params = if params.is_empty() {
                "(no parameters)".to_string()
            } else {
                params.join(", ")
            };
            format!("{:<22} {:<22} {}  [{}]", op.id, op.title, op.description, params)
        })
        .collect()
}

pub fn key_request(outcome: &KeyRequestOutcome) -> String {
    match outcome {
        KeyRequestOutcome::Issued(key) => format!("🔑 Key generated: {}", key),
        KeyRequestOutcome::NotIssued => {
            "❌ No key issued. The project may already have a key.".to_string()
        }
        KeyRequestOutcome::Failed(reason) => format!("❌ Key request failed: {}", reason),
    }
}

pub fn auth(outcome: &AuthOutcome, project: &Project) -> String {
    match outcome {
        AuthOutcome::Authenticated => format!("✅ Authenticated. Welcome to {}.", project.name),
        AuthOutcome::Rejected => "🚫 Invalid key for this project.".to_string(),
        AuthOutcome::Unavailable(reason) => format!("⚠️ Could not verify key: {}", reason),
    }
}

/// The one-line summary of an invocation result.
pub fn summary(result: &InvocationResult) -> String {
    let project_id = result
        .supplied_parameters()
        .get("projectIdentifier")
        .map(String::as_str)
        .unwrap_or_default();

    let Some(payload) = result.payload() else {
        let hint = match result.error() {
            Some(InvocationError::NotConnected { .. }) => " (run `probe` to reconnect)",
            _ => "",
        };
        return format!(
            "❌ {} failed: {}{}",
            result.operation_id(),
            result
                .failure_reason()
                .unwrap_or_else(|| "unknown error".to_string()),
            hint
        );
    };

    match payload {
        Payload::Delivery { accepted: true } => {
            "✅ Message sent successfully! Toxicity check passed.".to_string()
        }
        Payload::Delivery { accepted: false } => {
            "🚫 Message blocked! Harassment or toxicity detected.".to_string()
        }
        Payload::Messages { receiver, messages } => {
            format!("📬 Retrieved {} messages for {}", messages.len(), receiver)
        }
        Payload::Edit {
            message_index,
            applied: true,
        } => format!(
            "✅ Message at index {} edited successfully! Toxicity check passed.",
            message_index
        ),
        Payload::Edit { applied: false, .. } => "🚫 Edit failed! Possible reasons: invalid index, \
             unauthorized sender, or toxicity detected in the new content."
            .to_string(),
        Payload::Deletion {
            sender,
            deleted: true,
        } => format!(
            "🗑️ All messages from user {} have been permanently deleted.",
            sender
        ),
        Payload::Deletion {
            sender,
            deleted: false,
        } => format!("❌ Failed to delete messages from {}.", sender),
        Payload::Clear { cleared: true } => {
            "🧹 All messages have been cleared from the system.".to_string()
        }
        Payload::Clear { cleared: false } => {
            "❌ Failed to clear messages from the system.".to_string()
        }
        Payload::Harassment(assessment) => format!(
            "🤖 Analysis complete: {} harassment level detected ({}/100), {}",
            assessment.raw_label.trim().to_uppercase(),
            assessment.scale,
            assessment.category.risk_label()
        ),
        Payload::Suggestion { .. } => {
            "💡 An improved version of your message is ready.".to_string()
        }
        Payload::KeyIssue { key: Some(key) } => format!(
            "🔑 Key generated for project {}: {}",
            project_id,
            key
        ),
        Payload::KeyIssue { key: None } => format!(
            "❌ No key issued for project {}.",
            project_id
        ),
        Payload::KeyCheck { valid: true } => "✅ Key is valid.".to_string(),
        Payload::KeyCheck { valid: false } => "🚫 Key is not valid.".to_string(),
    }
}

/// Full rendering: the summary plus any detail lines the payload carries.
pub fn invocation(result: &InvocationResult) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {}",
        result.occurred_at().format("%H:%M:%S"),
        summary(result)
    )];

    match result.payload() {
        Some(Payload::Messages { messages, .. }) => {
            for message in messages {
                lines.push(format!(
                    "  #{} {} -> {} at {}: {}",
                    message.index,
                    short_identity(&message.sender),
                    short_identity(&message.receiver),
                    message.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    message.content
                ));
            }
        }
        Some(Payload::Suggestion {
            original,
            suggestion,
        }) => {
            lines.push(format!("  original:  {}", original));
            lines.push(format!("  suggested: {}", suggestion));
        }
        _ => {}
    }

    if result.operation_id() == OperationId::ClearMessages && result.succeeded() {
        lines.push("  (system-wide)".to_string());
    }

    lines
}

pub fn history(results: &[std::sync::Arc<InvocationResult>]) -> Vec<String> {
    if results.is_empty() {
        return vec!["No results yet in this session.".to_string()];
    }
    results
        .iter()
        .map(|r| {
            format!(
                "[{}] {:<22} {}",
                r.occurred_at().format("%H:%M:%S"),
                r.operation_id(),
                summary(r)
            )
        })
        .collect()
}
