//! Data models
//!
//! This module contains all data structures used throughout the Relaypost
//! platform. Models represent:
//! - Database entities (User, AuthSession, Post, ContentSession, N8nConfig,
//!   LinkedinOauthConfig, ApprovalLog)
//! - API request/response types
//! - Internal data transfer objects

mod approval_log;
mod auth_session;
mod content_session;
mod linkedin_oauth;
mod n8n_config;
mod post;
mod user;

pub use approval_log::{ApprovalLog, SuggestionType};
pub use auth_session::AuthSession;
pub use content_session::{
    ContentSession, FinalContent, SessionKind, SessionStatus, session_status_for_post,
};
pub use linkedin_oauth::{
    AccountType, LinkedinOauthConfig, UpsertOauthInput, DEFAULT_REDIRECT_URI,
};
pub use n8n_config::N8nConfig;
pub use post::{CreatePostInput, ListParams, PagedResult, Post, PostStatus, UpdatePostInput};
pub use user::{CreateUserInput, User};
