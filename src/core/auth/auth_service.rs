// Key authentication flow - gate between the dashboard and a project workspace.
//
// Keys are issued and verified by the remote service through the same client the
// workspace uses, so every attempt also shows up in the session history.

use crate::core::moderation::{
    InvocationParams, ModerationTransport, OperationId, Payload, RemoteModerationClient,
};
use crate::core::projects::{Project, ProjectError, ProjectService, ProjectStore};
use std::sync::Arc;

/// Outcome of asking the service for a project key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRequestOutcome {
    /// A key was issued and stored on the project.
    Issued(String),
    /// The service declined: the project already holds a key or the developer hit a limit.
    NotIssued,
    /// The call itself did not complete.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Rejected,
    /// Could not reach a verdict (e.g. disconnected); the key was neither accepted nor refused.
    Unavailable(String),
}

pub struct AuthService<T: ModerationTransport> {
    client: Arc<RemoteModerationClient<T>>,
    developer_identity: String,
}

impl<T: ModerationTransport> AuthService<T> {
    pub fn new(client: Arc<RemoteModerationClient<T>>, developer_identity: impl Into<String>) -> Self {
        Self {
            client,
            developer_identity: developer_identity.into(),
        }
    }

    pub fn developer_identity(&self) -> &str {
        &self.developer_identity
    }

    fn key_params(&self, project: &Project) -> InvocationParams {
        let mut params = InvocationParams::new();
        params.insert("projectIdentifier".to_string(), project.id.clone());
        params.insert(
            "developerIdentity".to_string(),
            self.developer_identity.clone(),
        );
        params
    }

    /// Ask the remote service to issue a key for `project` and remember it if one is issued.
    pub async fn request_key<S: ProjectStore>(
        &self,
        projects: &ProjectService<S>,
        project: &Project,
    ) -> Result<KeyRequestOutcome, ProjectError> {
        let result = self
            .client
            .invoke(OperationId::GenerateKey, self.key_params(project))
            .await;

        match (result.payload(), result.failure_reason()) {
            (Some(Payload::KeyIssue { key: Some(key) }), _) => {
                projects.attach_key(&project.id, key).await?;
                tracing::info!(project_id = %project.id, "Key issued");
                Ok(KeyRequestOutcome::Issued(key.clone()))
            }
            (Some(_), _) => Ok(KeyRequestOutcome::NotIssued),
            (None, reason) => Ok(KeyRequestOutcome::Failed(
                reason.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    /// Check `key` for `project`.
    ///
    /// A key matching the one stored on the project is accepted without a remote call.
    pub async fn authenticate(&self, project: &Project, key: &str) -> AuthOutcome {
        let key = key.trim();
        if key.is_empty() {
            return AuthOutcome::Rejected;
        }
        if project.auth_key.as_deref() == Some(key) {
            return AuthOutcome::Authenticated;
        }

        let mut params = self.key_params(project);
        params.insert("key".to_string(), key.to_string());
        let result = self.client.invoke(OperationId::VerifyKey, params).await;

        match result.payload() {
            Some(Payload::KeyCheck { valid: true }) => AuthOutcome::Authenticated,
            Some(_) => {
                tracing::warn!(project_id = %project.id, "Key rejected");
                AuthOutcome::Rejected
            }
            None => AuthOutcome::Unavailable(
                result
                    .failure_reason()
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
        }
    }
}
