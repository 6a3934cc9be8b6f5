// The interactive loop: dashboard -> authentication -> workspace.
//
// **Notice the pattern:**
// 1. Parse the line into a `Command`
// 2. Call the core service for the current screen
// 3. Format the outcome with `formatter`
//
// `handle` returns the lines to print instead of printing them, so whole sessions can be
// scripted in tests.

use super::commands::{self, Command, HELP};
use super::formatter;
use crate::core::auth::{AuthOutcome, AuthService};
use crate::core::moderation::{ModerationTransport, RemoteModerationClient};
use crate::core::projects::{Project, ProjectService, ProjectStore};
use crate::core::workspace::WorkspaceSession;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub type Transport = Box<dyn ModerationTransport>;
pub type Client = RemoteModerationClient<Transport>;

enum Screen {
    Dashboard,
    Authentication { project: Project },
    Workspace(WorkspaceSession<Transport>),
}

pub struct Console {
    client: Arc<Client>,
    projects: ProjectService<Box<dyn ProjectStore>>,
    auth: AuthService<Transport>,
    probe_on_entry: bool,
    screen: Screen,
    running: bool,
}

impl Console {
    pub fn new(
        client: Arc<Client>,
        projects: ProjectService<Box<dyn ProjectStore>>,
        developer_identity: impl Into<String>,
        probe_on_entry: bool,
    ) -> Self {
        let auth = AuthService::new(Arc::clone(&client), developer_identity);
        Self {
            client,
            projects,
            auth,
            probe_on_entry,
            screen: Screen::Dashboard,
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    fn prompt(&self) -> String {
        match &self.screen {
            Screen::Dashboard => "dashboard> ".to_string(),
            Screen::Authentication { project } => format!("auth:{}> ", project.name),
            Screen::Workspace(workspace) => format!("{}> ", workspace.project().name),
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Vec<String> {
        match commands::parse(line) {
            Ok(Some(command)) => self.handle(command).await,
            Ok(None) => Vec::new(),
            Err(e) => vec![e.to_string()],
        }
    }

    pub async fn handle(&mut self, command: Command) -> Vec<String> {
        match command {
            Command::Projects => self.list_projects().await,
            Command::Create { name, description } => self.create_project(&name, &description).await,
            Command::Select { project_id } => self.select_project(&project_id).await,
            Command::Delete { project_id } => self.delete_project(&project_id).await,
            Command::Key => self.request_key().await,
            Command::Auth { key } => self.authenticate(&key).await,
            Command::Probe => {
                let status = match &self.screen {
                    Screen::Workspace(workspace) => workspace.probe().await,
                    _ => self.client.probe().await,
                };
                vec![formatter::status_line(status)]
            }
            Command::Status => vec![formatter::status_line(self.client.status())],
            Command::Ops => formatter::operation_list(),
            Command::Call { operation, params } => match &self.screen {
                Screen::Workspace(workspace) => {
                    let result = workspace.invoke(operation, params).await;
                    formatter::invocation(&result)
                }
                _ => vec!["🔒 Authenticate into a project first (`select <id>`, then `auth <key>`).".to_string()],
            },
            Command::History => match &self.screen {
                Screen::Workspace(workspace) => formatter::history(&workspace.history().await),
                _ => formatter::history(&self.client.history().snapshot().await),
            },
            Command::Back => self.back().await,
            Command::Help => HELP
                .iter()
                .map(|(usage, what)| format!("{:<34} {}", usage, what))
                .collect(),
            Command::Quit => {
                self.running = false;
                vec!["Goodbye!".to_string()]
            }
        }
    }

    fn in_workspace(&self) -> bool {
        matches!(self.screen, Screen::Workspace(_))
    }

    async fn list_projects(&self) -> Vec<String> {
        match self.projects.list().await {
            Ok(projects) => formatter::project_list(&projects),
            Err(e) => vec![format!("❌ {}", e)],
        }
    }

    async fn create_project(&self, name: &str, description: &str) -> Vec<String> {
        if self.in_workspace() {
            return vec!["Leave the workspace first with `back`.".to_string()];
        }
        match self.projects.create(name, description).await {
            Ok(project) => vec![
                format!("✅ Project created: {}", project.name),
                formatter::project_line(&project),
            ],
            Err(e) => vec![format!("❌ {}", e)],
        }
    }

    async fn select_project(&mut self, project_id: &str) -> Vec<String> {
        if self.in_workspace() {
            return vec!["Leave the workspace first with `back`.".to_string()];
        }
        match self.projects.get(project_id).await {
            Ok(project) => {
                let mut lines = vec![format!("🔐 Authenticate to access {}", project.name)];
                if project.auth_key.is_none() {
                    lines.push("This project has no key yet. Use `key` to request one.".to_string());
                }
                lines.push("Enter `auth <key>` to continue.".to_string());
                // Results recorded for a previously selected project do not carry over
                if matches!(&self.screen, Screen::Authentication { .. }) {
                    self.client.session().reset().await;
                }
                self.screen = Screen::Authentication { project };
                lines
            }
            Err(e) => vec![format!("❌ {}", e)],
        }
    }

    async fn delete_project(&mut self, project_id: &str) -> Vec<String> {
        if self.in_workspace() {
            return vec!["Leave the workspace first with `back`.".to_string()];
        }
        match self.projects.delete(project_id).await {
            Ok(()) => {
                if matches!(&self.screen, Screen::Authentication { project } if project.id == project_id.trim())
                {
                    self.screen = Screen::Dashboard;
                    self.client.session().reset().await;
                }
                vec![format!("🗑️ Project {} deleted.", project_id.trim())]
            }
            Err(e) => vec![format!("❌ {}", e)],
        }
    }

    async fn request_key(&mut self) -> Vec<String> {
        let Screen::Authentication { project } = &self.screen else {
            return vec!["Select a project first with `select <id>`.".to_string()];
        };

        let outcome = match self.auth.request_key(&self.projects, project).await {
            Ok(outcome) => outcome,
            Err(e) => return vec![format!("❌ {}", e)],
        };
        let line = formatter::key_request(&outcome);

        // Pick up the key that was just stored on the project
        let refreshed = self.projects.get(&project.id).await;
        if let Ok(project) = refreshed {
            self.screen = Screen::Authentication { project };
        }
        vec![line]
    }

    async fn authenticate(&mut self, key: &str) -> Vec<String> {
        let Screen::Authentication { project } = &self.screen else {
            return vec!["Select a project first with `select <id>`.".to_string()];
        };

        let outcome = self.auth.authenticate(project, key).await;
        let mut lines = vec![formatter::auth(&outcome, project)];

        if outcome == AuthOutcome::Authenticated {
            let project = project.clone();
            let workspace = WorkspaceSession::enter(
                project,
                self.auth.developer_identity(),
                Arc::clone(&self.client),
                self.probe_on_entry,
            )
            .await;
            lines.push(formatter::status_line(workspace.status()));
            lines.push("Type `ops` to list operations, `call <operation> name=value ...` to run one.".to_string());
            self.screen = Screen::Workspace(workspace);
        }
        lines
    }

    async fn back(&mut self) -> Vec<String> {
        match std::mem::replace(&mut self.screen, Screen::Dashboard) {
            Screen::Workspace(workspace) => {
                let project = workspace.leave().await;
                vec![format!("↩️ Left {}. Back on the dashboard.", project.name)]
            }
            Screen::Authentication { .. } => {
                self.client.session().reset().await;
                vec!["↩️ Back on the dashboard.".to_string()]
            }
            Screen::Dashboard => vec!["Already on the dashboard.".to_string()],
        }
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let banner = [
            "EcoKind console. Type `help` for commands.".to_string(),
            formatter::status_line(self.client.status()),
        ];
        for line in banner {
            stdout.write_all(format!("{}\n", line).as_bytes()).await?;
        }

        while self.is_running() {
            stdout.write_all(self.prompt().as_bytes()).await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            for out in self.handle_line(&line).await {
                stdout.write_all(format!("{}\n", out).as_bytes()).await?;
            }
        }

        stdout.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{ModerationSession, TransportError};
    use crate::infra::projects::InMemoryProjectStore;
    use async_trait::async_trait;
    use dashmap::DashMap;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Canned answers per remote method. Methods without an entry fail remotely.
    struct CannedTransport {
        answers: DashMap<&'static str, Value>,
        reachable: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ModerationTransport for CannedTransport {
        async fn call(&self, method: &str, _args: Vec<Value>) -> Result<Value, TransportError> {
            self.answers
                .get(method)
                .map(|v| v.clone())
                .ok_or_else(|| TransportError::Remote(format!("{} unavailable", method)))
        }

        async fn probe(&self) -> Result<(), TransportError> {
            if self.reachable.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(TransportError::Request("connection refused".to_string()))
            }
        }
    }

    fn console(probe_on_entry: bool) -> (Console, Arc<AtomicBool>) {
        let answers = DashMap::new();
        answers.insert("generateKey", json!(["vetkey-abc"]));
        answers.insert("verifyKey", json!(false));
        answers.insert("harassmentLevel", json!("moderate"));
        answers.insert("sendMessage", json!(false));
        answers.insert("receiveMessages", json!([]));

        let reachable = Arc::new(AtomicBool::new(true));
        let transport: Transport = Box::new(CannedTransport {
            answers,
            reachable: Arc::clone(&reachable),
        });
        let session = Arc::new(ModerationSession::new("http://localhost:4943", "svc"));
        let client = Arc::new(RemoteModerationClient::new(transport, session));
        let store: Box<dyn ProjectStore> = Box::new(InMemoryProjectStore::new());

        (
            Console::new(client, ProjectService::new(store), "dev-1", probe_on_entry),
            reachable,
        )
    }

    async fn create_and_select(console: &mut Console) -> String {
        console
            .handle_line("create Social Media Guardian | Content filtering")
            .await;
        let id = console.projects.list().await.unwrap()[0].id.clone();
        console.handle_line(&format!("select {}", id)).await;
        id
    }

    #[tokio::test]
    async fn test_full_session() {
        let (mut console, _) = console(true);
        create_and_select(&mut console).await;

        let out = console.handle_line("key").await;
        assert!(out[0].starts_with("❌ Key request failed: not connected"));

        console.handle_line("probe").await;
        let out = console.handle_line("key").await;
        assert_eq!(out, vec!["🔑 Key generated: vetkey-abc"]);

        let out = console.handle_line("auth vetkey-abc").await;
        assert!(out[0].starts_with("✅ Authenticated"));
        assert_eq!(out[1], "🟢 Moderation service: Connected");
        assert!(console.in_workspace());

        let out = console.handle_line("call harassment-level text=you are great").await;
        assert!(out[0].contains("MODERATE harassment level detected (55/100)"));

        let out = console
            .handle_line("call send-message senderAddress=A receiverAddress=B message=hi")
            .await;
        assert!(out[0].contains("Message blocked"));

        // Both generate-key attempts plus the two calls, newest first
        let history = console.handle_line("history").await;
        assert_eq!(history.len(), 4);
        assert!(history[0].contains("send-message"));

        let out = console.handle_line("back").await;
        assert!(out[0].contains("Back on the dashboard"));
        assert!(console.client.history().is_empty().await);
    }

    #[tokio::test]
    async fn test_wrong_key_is_rejected_remotely() {
        let (mut console, _) = console(true);
        create_and_select(&mut console).await;
        console.handle_line("probe").await;

        let out = console.handle_line("auth not-the-key").await;
        assert_eq!(out, vec!["🚫 Invalid key for this project."]);
        assert!(!console.in_workspace());
    }

    #[tokio::test]
    async fn test_verification_unavailable_while_disconnected() {
        let (mut console, _) = console(true);
        create_and_select(&mut console).await;

        let out = console.handle_line("auth some-key").await;
        assert!(out[0].starts_with("⚠️ Could not verify key: not connected"));
        assert!(!console.in_workspace());
    }

    #[tokio::test]
    async fn test_calls_need_a_workspace() {
        let (mut console, _) = console(true);
        let out = console.handle_line("call harassment-level text=hi").await;
        assert!(out[0].starts_with("🔒"));
        assert!(console.client.history().is_empty().await);
    }

    #[tokio::test]
    async fn test_calls_are_gated_after_failed_probe() {
        let (mut console, reachable) = console(false);
        create_and_select(&mut console).await;
        console.handle_line("probe").await;
        console.handle_line("key").await;
        console.handle_line("auth vetkey-abc").await;
        assert!(console.in_workspace());

        reachable.store(false, Ordering::SeqCst);
        let out = console.handle_line("probe").await;
        assert_eq!(out, vec!["🔴 Moderation service: Disconnected"]);

        let out = console.handle_line("call harassment-level text=hi").await;
        assert_eq!(
            out[0].split_once(' ').unwrap().1,
            "❌ harassment-level failed: not connected: moderation service is Disconnected (run `probe` to reconnect)"
        );

        reachable.store(true, Ordering::SeqCst);
        console.handle_line("probe").await;
        let out = console.handle_line("call harassment-level text=hi").await;
        assert!(out[0].contains("MODERATE"));
    }

    #[tokio::test]
    async fn test_parse_errors_and_quit() {
        let (mut console, _) = console(true);
        let out = console.handle_line("launch").await;
        assert!(out[0].starts_with("Unknown command"));
        assert!(console.handle_line("").await.is_empty());

        console.handle_line("quit").await;
        assert!(!console.is_running());
    }

    #[tokio::test]
    async fn test_delete_selected_project_returns_to_dashboard() {
        let (mut console, _) = console(true);
        let id = create_and_select(&mut console).await;

        let out = console.handle_line(&format!("delete {}", id)).await;
        assert_eq!(out, vec![format!("🗑️ Project {} deleted.", id)]);
        assert!(matches!(console.screen, Screen::Dashboard));
        assert!(console.projects.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auth_screen_results_do_not_follow_into_another_project() {
        let (mut console, _) = console(true);
        create_and_select(&mut console).await;
        let out = console.handle_line("key").await;
        assert!(out[0].starts_with("❌ Key request failed"));
        console.handle_line("back").await;
        assert!(console.client.history().is_empty().await);

        console.handle_line("create Second | Other project").await;
        let second = console
            .projects
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == "Second")
            .unwrap();
        console.handle_line(&format!("select {}", second.id)).await;
        console.handle_line("probe").await;
        console.handle_line("key").await;
        console.handle_line("auth vetkey-abc").await;
        assert!(console.in_workspace());

        let history = console.handle_line("history").await;
        assert_eq!(history.len(), 1);
        assert!(history[0].contains(&format!("Key generated for project {}", second.id)));
    }

    #[tokio::test]
    async fn test_switching_projects_on_auth_screen_clears_history() {
        let (mut console, _) = console(true);
        let first = create_and_select(&mut console).await;
        console.handle_line("key").await;
        assert_eq!(console.client.history().len().await, 1);

        console.handle_line(&format!("select {}", first)).await;
        assert!(console.client.history().is_empty().await);
    }

    #[tokio::test]
    async fn test_deleting_selected_project_clears_history() {
        let (mut console, _) = console(true);
        let id = create_and_select(&mut console).await;
        console.handle_line("key").await;

        console.handle_line(&format!("delete {}", id)).await;
        assert!(console.client.history().is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let (mut console, _) = console(true);
        let out = console.handle_line("select prj-missing").await;
        assert_eq!(out, vec!["❌ Project not found: prj-missing"]);
    }
}
