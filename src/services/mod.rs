//! Service layer
//!
//! Business logic sits here, between the HTTP handlers and the
//! repositories. Handlers stay thin; services own status transitions,
//! webhook calls, and cross-entity consistency.

pub mod content;
pub mod password;
pub mod post;
pub mod settings;
pub mod user;

pub use content::{
    ContentService, ContentServiceError, DecisionInput, DecisionOutcome, IngestOutcome,
    PublishInput, PublishOutcome, SessionOverview, SessionSnapshot, StartContentInput,
    StartOutcome,
};
pub use post::{PostService, PostServiceError, PostStats};
pub use settings::{
    N8nRegistration, N8nSettingsPatch, OauthOverview, OauthSettingsPatch, SettingsService,
    SettingsServiceError, SettingsUpdate, SettingsView,
};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
