// This is the entry point of the EcoKind console.
//
// **Architecture Overview:**
// - `core/` = Business logic (transport-agnostic)
// - `infra/` = Implementations of core traits (HTTP transport, project stores)
// - `console/` = Terminal adapter (commands, rendering)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Hand control to the console loop

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "console/console_layer.rs"]
mod console;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::ConsoleConfig;
use crate::console::Console;
use crate::core::moderation::{ModerationSession, ModerationTransport, RemoteModerationClient};
use crate::core::projects::{ProjectService, ProjectStore};
use crate::infra::moderation::HttpModerationTransport;
use crate::infra::projects::{InMemoryProjectStore, SqliteProjectStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Logs go to stderr so they never interleave with console output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ConsoleConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let transport: Box<dyn ModerationTransport> = Box::new(HttpModerationTransport::new(
        &config.endpoint_address,
        &config.service_identifier,
        config.request_timeout,
    )?);
    let session = Arc::new(ModerationSession::new(
        config.endpoint_address.clone(),
        config.service_identifier.clone(),
    ));
    let client = Arc::new(if config.probe_on_start {
        RemoteModerationClient::connect(transport, session).await
    } else {
        RemoteModerationClient::new(transport, session)
    });

    // Keep runtime databases in a dedicated folder so the working directory stays tidy.
    let db_path = config.projects_db_path();
    let store: Box<dyn ProjectStore> =
        match SqliteProjectStore::new(&db_path.to_string_lossy()).await {
            Ok(store) => Box::new(store),
            Err(e) => {
                tracing::warn!(
                    path = %db_path.display(),
                    "Could not open project database, projects will not be saved: {}",
                    e
                );
                Box::new(InMemoryProjectStore::new())
            }
        };
    let projects = ProjectService::new(store);

    tracing::info!(
        endpoint = %config.endpoint_address,
        service = %config.service_identifier,
        status = %client.status(),
        "Console starting"
    );

    Console::new(
        client,
        projects,
        config.developer_identity.clone(),
        config.probe_on_start,
    )
    .run()
    .await
}
