//! Repository layer
//!
//! Each repository exposes a trait describing the data access interface and
//! an SQLx implementation that dispatches on the configured database driver.

pub mod approval_log;
pub mod auth_session;
pub mod content_session;
pub mod linkedin_oauth;
pub mod n8n_config;
pub mod post;
pub mod user;

pub use approval_log::{ApprovalLogRepository, SqlxApprovalLogRepository};
pub use auth_session::{AuthSessionRepository, SqlxAuthSessionRepository};
pub use content_session::{ContentSessionRepository, SqlxContentSessionRepository};
pub use linkedin_oauth::{LinkedinOauthRepository, SqlxLinkedinOauthRepository};
pub use n8n_config::{N8nConfigRepository, SqlxN8nConfigRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use user::{SqlxUserRepository, UserRepository};
