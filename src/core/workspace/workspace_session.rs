// Workspace session - one authenticated project bound to the moderation client.
//
// Entering a workspace optionally probes the service; leaving it returns to the
// dashboard and drops the invocation history.

use crate::core::moderation::{
    ConnectionStatus, InvocationParams, InvocationResult, ModerationTransport, OperationId,
    RemoteModerationClient,
};
use crate::core::projects::Project;
use std::sync::Arc;

pub struct WorkspaceSession<T: ModerationTransport> {
    project: Project,
    developer_identity: String,
    client: Arc<RemoteModerationClient<T>>,
}

impl<T: ModerationTransport> WorkspaceSession<T> {
    pub async fn enter(
        project: Project,
        developer_identity: impl Into<String>,
        client: Arc<RemoteModerationClient<T>>,
        probe_on_entry: bool,
    ) -> Self {
        if probe_on_entry {
            client.probe().await;
        }
        tracing::info!(project_id = %project.id, status = %client.status(), "Entered workspace");

        Self {
            project,
            developer_identity: developer_identity.into(),
            client,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn status(&self) -> ConnectionStatus {
        self.client.status()
    }

    pub async fn probe(&self) -> ConnectionStatus {
        self.client.probe().await
    }

    /// Invoke an operation, filling in the project and identity parameters when the
    /// caller left them out.
    pub async fn invoke(
        &self,
        id: OperationId,
        mut params: InvocationParams,
    ) -> Arc<InvocationResult> {
        let names: Vec<&str> = id.operation().parameter_names().collect();
        if names.contains(&"projectIdentifier") {
            params
                .entry("projectIdentifier".to_string())
                .or_insert_with(|| self.project.id.clone());
        }
        if names.contains(&"developerIdentity") {
            params
                .entry("developerIdentity".to_string())
                .or_insert_with(|| self.developer_identity.clone());
        }

        self.client.invoke(id, params).await
    }

    pub async fn history(&self) -> Vec<Arc<InvocationResult>> {
        self.client.history().snapshot().await
    }

    /// Leave the workspace. The session history is cleared; the connection stays as is.
    pub async fn leave(self) -> Project {
        self.client.session().reset().await;
        tracing::info!(project_id = %self.project.id, "Left workspace");
        self.project
    }
}
