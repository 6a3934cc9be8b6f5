// Console commands - parsing one input line into a `Command`.
//
// This layer is THIN: it only turns text into primitive values. What a command means
// is decided by the repl, which calls the core services.

use crate::core::moderation::{InvocationParams, OperationId, UnknownOperation};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List projects on the dashboard.
    Projects,
    Create { name: String, description: String },
    /// Open a project's authentication screen.
    Select { project_id: String },
    Delete { project_id: String },
    /// Ask the service to issue a key for the selected project.
    Key,
    Auth { key: String },
    Probe,
    Status,
    /// List the operation catalogue.
    Ops,
    Call {
        operation: OperationId,
        params: InvocationParams,
    },
    History,
    /// Return to the dashboard.
    Back,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command: {0} (type `help` for the list)")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown operation: {0} (type `ops` for the list)")]
    UnknownOperation(String),
}

impl From<UnknownOperation> for ParseError {
    fn from(e: UnknownOperation) -> Self {
        ParseError::UnknownOperation(e.0)
    }
}

pub const HELP: &[(&str, &str)] = &[
    ("projects", "List your projects"),
    ("create <name> | <description>", "Create a new project"),
    ("select <project-id>", "Open a project's authentication screen"),
    ("delete <project-id>", "Delete a project"),
    ("key", "Request an authentication key for the selected project"),
    ("auth <key>", "Authenticate and enter the project workspace"),
    ("probe", "Test the connection to the moderation service"),
    ("status", "Show the connection status"),
    ("ops", "List the available operations"),
    ("call <operation> name=value ...", "Invoke an operation"),
    ("history", "Show this session's results, newest first"),
    ("back", "Return to the dashboard"),
    ("help", "Show this list"),
    ("quit", "Exit"),
];

/// Parse one line. Returns `Ok(None)` for a blank line.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "projects" | "ls" => Command::Projects,
        "create" => {
            let (name, description) = rest
                .split_once('|')
                .ok_or(ParseError::Usage("create <name> | <description>"))?;
            Command::Create {
                name: name.trim().to_string(),
                description: description.trim().to_string(),
            }
        }
        "select" | "open" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("select <project-id>"));
            }
            Command::Select {
                project_id: rest.to_string(),
            }
        }
        "delete" | "rm" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("delete <project-id>"));
            }
            Command::Delete {
                project_id: rest.to_string(),
            }
        }
        "key" => Command::Key,
        "auth" => {
            if rest.is_empty() {
                return Err(ParseError::Usage("auth <key>"));
            }
            Command::Auth {
                key: rest.to_string(),
            }
        }
        "probe" | "connect" => Command::Probe,
        "status" => Command::Status,
        "ops" => Command::Ops,
        "call" => parse_call(rest)?,
        "history" => Command::History,
        "back" => Command::Back,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };

    Ok(Some(command))
}

/// `call <operation> name=value ...`
///
/// Values may contain spaces: a token without `=` is appended to the previous value,
/// so `call send-message message=hello there` sends "hello there".
fn parse_call(rest: &str) -> Result<Command, ParseError> {
    let mut tokens = rest.split_whitespace();
    let operation: OperationId = tokens
        .next()
        .ok_or(ParseError::Usage("call <operation> name=value ..."))?
        .parse()?;

    let mut params = InvocationParams::new();
    let mut current: Option<String> = None;

    for token in tokens {
        match token.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                params.insert(name.to_string(), value.to_string());
                current = Some(name.to_string());
            }
            _ => {
                let value = match current.as_deref() {
                    Some(name) => params.get_mut(name),
                    None => None,
                };
                let Some(value) = value else {
                    return Err(ParseError::Usage("call <operation> name=value ..."));
                };
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(token);
            }
        }
    }

    Ok(Command::Call { operation, params })
}
