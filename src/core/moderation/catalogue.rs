// The fixed catalogue of remote operations.
//
// Every capability the workspace can invoke is one row in `CATALOGUE`. The client has a
// single invoke routine parameterized by these rows, so there is no per-operation code
// path outside of result decoding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable identifier of a catalogued operation.
///
/// The discriminant doubles as the row index in `CATALOGUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationId {
    SendMessage = 0,
    ReceiveMessages = 1,
    EditMessage = 2,
    DeleteUserMessages = 3,
    ClearMessages = 4,
    HarassmentLevel = 5,
    SuggestImprovement = 6,
    GenerateKey = 7,
    VerifyKey = 8,
}

impl OperationId {
    pub const ALL: [OperationId; 9] = [
        OperationId::SendMessage,
        OperationId::ReceiveMessages,
        OperationId::EditMessage,
        OperationId::DeleteUserMessages,
        OperationId::ClearMessages,
        OperationId::HarassmentLevel,
        OperationId::SuggestImprovement,
        OperationId::GenerateKey,
        OperationId::VerifyKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationId::SendMessage => "send-message",
            OperationId::ReceiveMessages => "receive-messages",
            OperationId::EditMessage => "edit-message",
            OperationId::DeleteUserMessages => "delete-user-messages",
            OperationId::ClearMessages => "clear-messages",
            OperationId::HarassmentLevel => "harassment-level",
            OperationId::SuggestImprovement => "suggest-improvement",
            OperationId::GenerateKey => "generate-key",
            OperationId::VerifyKey => "verify-key",
        }
    }

    /// The catalogue row describing this operation.
    pub fn operation(self) -> &'static Operation {
        &CATALOGUE[self as usize]
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation: {0}")]
pub struct UnknownOperation(pub String);

impl FromStr for OperationId {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OperationId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownOperation(wanted.to_string()))
    }
}

/// How the raw response of an operation is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Boolean acceptance; `false` means the remote moderation blocked the content.
    Acceptance,
    /// Sequence of stored messages.
    MessageList,
    /// Plain boolean success/validity flag.
    Flag,
    /// Free-text severity label.
    SeverityLabel,
    /// Free-text replacement.
    Text,
    /// Optional string (candid `opt text`).
    OptionalKey,
}

/// Wire type of a parameter once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    /// Non-negative integer, sent as a JSON number.
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    pub kind: ParamKind,
}

const fn text(name: &'static str) -> Parameter {
    Parameter {
        name,
        kind: ParamKind::Text,
    }
}

const fn index(name: &'static str) -> Parameter {
    Parameter {
        name,
        kind: ParamKind::Index,
    }
}

/// A named remote capability.
#[derive(Debug)]
pub struct Operation {
    pub id: OperationId,
    /// Method name on the remote service.
    pub method: &'static str,
    /// Required parameters, in wire order.
    pub parameters: &'static [Parameter],
    pub result_shape: ResultShape,
    pub title: &'static str,
    pub description: &'static str,
}

impl Operation {
    pub fn parameter_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.parameters.iter().map(|p| p.name)
    }
}

pub static CATALOGUE: [Operation; 9] = [
    Operation {
        id: OperationId::SendMessage,
        method: "sendMessage",
        parameters: &[
            text("senderAddress"),
            text("receiverAddress"),
            text("message"),
        ],
        result_shape: ResultShape::Acceptance,
        title: "Send Message",
        description: "Send a message through toxicity screening",
    },
    Operation {
        id: OperationId::ReceiveMessages,
        method: "receiveMessages",
        parameters: &[text("receiverAddress")],
        result_shape: ResultShape::MessageList,
        title: "Receive Messages",
        description: "Retrieve all messages for a receiver address",
    },
    Operation {
        id: OperationId::EditMessage,
        method: "editMessage",
        parameters: &[
            text("senderAddress"),
            index("messageIndex"),
            text("newMessage"),
        ],
        result_shape: ResultShape::Flag,
        title: "Edit Message",
        description: "Replace a stored message; the new content is screened again",
    },
    Operation {
        id: OperationId::DeleteUserMessages,
        method: "deleteUserMessages",
        parameters: &[text("senderAddress")],
        result_shape: ResultShape::Flag,
        title: "Delete User Messages",
        description: "Remove every message sent by an address",
    },
    Operation {
        id: OperationId::ClearMessages,
        method: "clearMessages",
        parameters: &[],
        result_shape: ResultShape::Flag,
        title: "Clear All Messages",
        description: "Clear all messages from the system (admin, system-wide)",
    },
    Operation {
        id: OperationId::HarassmentLevel,
        method: "harassmentLevel",
        parameters: &[text("text")],
        result_shape: ResultShape::SeverityLabel,
        title: "Analyze Harassment",
        description: "Rate text for harassment severity (low/moderate/high)",
    },
    Operation {
        id: OperationId::SuggestImprovement,
        method: "suggestImprovedMessage",
        parameters: &[text("text")],
        result_shape: ResultShape::Text,
        title: "Suggest Improvement",
        description: "Rewrite text in a neutral, less toxic tone",
    },
    Operation {
        id: OperationId::GenerateKey,
        method: "generateKey",
        parameters: &[text("projectIdentifier"), text("developerIdentity")],
        result_shape: ResultShape::OptionalKey,
        title: "Generate Key",
        description: "Issue an authentication key for a project",
    },
    Operation {
        id: OperationId::VerifyKey,
        method: "verifyKey",
        parameters: &[
            text("projectIdentifier"),
            text("developerIdentity"),
            text("key"),
        ],
        result_shape: ResultShape::Flag,
        title: "Verify Key",
        description: "Check an authentication key against a project",
    },
];
