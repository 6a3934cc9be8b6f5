use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A moderation project owned by the developer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Key issued by the remote service, once one has been generated.
    pub auth_key: Option<String>,
}
