// Core moderation module - the remote operation client and its result envelope.
// Following the same layout as the other core modules: models, a port, a service.

pub mod catalogue;
pub mod moderation_client;
pub mod moderation_models;
pub mod session;

pub use catalogue::*;
pub use moderation_client::*;
pub use moderation_models::*;
pub use session::*;
