// Core projects module - the developer's project dashboard.

pub mod project_models;
pub mod project_service;

pub use project_models::*;
pub use project_service::*;
