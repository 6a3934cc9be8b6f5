// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "projects/mod.rs"]
pub mod projects;

#[path = "auth/auth_service.rs"]
pub mod auth;

#[path = "workspace/workspace_session.rs"]
pub mod workspace;
