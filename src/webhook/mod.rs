//! n8n webhook integration
//!
//! The platform never talks to LinkedIn directly; every generation,
//! approval, and publish step goes out as a JSON POST to the user's n8n
//! workflow. This module holds the HTTP client, the payload builders, and
//! the parsing of the workflow's replies.

pub mod client;
pub mod extract;

pub use client::{
    approval_payload, publish_payload, rejection_payload, start_generation_payload, N8nClient,
    WebhookError, WebhookReply,
};
