//! Reply text extraction
//!
//! The n8n workflow replies with human-readable confirmation messages
//! rather than structured fields. The share URN, the feed link, and the
//! scheduled publication time are pulled out of that text with the
//! patterns below, which match the workflow's message format verbatim
//! (Turkish labels included).

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static DIRECT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"🌐 Doğrudan link: (https://www\.linkedin\.com/feed/update/urn:li:share:\d+)")
        .expect("invalid direct link pattern")
});

static SHARE_URN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"📊 Post ID: (urn:li:share:\d+)").expect("invalid share URN pattern")
});

static GENERIC_POST_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Post ID: ([^\n]+)").expect("invalid post ID pattern"));

static PUBLISH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"⏰ Yayın tarihi: (\d{2}\.\d{2}\.\d{4} \d{2}:\d{2}:\d{2})")
        .expect("invalid publish date pattern")
});

/// Extract the direct feed link from a workflow confirmation message
pub fn extract_direct_link(text: &str) -> Option<String> {
    DIRECT_LINK
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Extract the LinkedIn share URN from a workflow confirmation message.
/// Falls back to the generic `Post ID:` label when the URN form is absent.
pub fn extract_post_id(text: &str) -> Option<String> {
    if let Some(caps) = SHARE_URN.captures(text) {
        return Some(caps[1].to_string());
    }
    GENERIC_POST_ID
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Best link to the published post: the direct feed link when the message
/// carries one, else a feed URL built from the share URN
pub fn linkedin_direct_link(text: &str) -> Option<String> {
    if let Some(link) = extract_direct_link(text) {
        return Some(link);
    }
    SHARE_URN
        .captures(text)
        .map(|caps| format!("https://www.linkedin.com/feed/update/{}", &caps[1]))
}

/// Check whether a reply carries any post identifier at all
pub fn contains_post_id(text: &str) -> bool {
    text.contains("Post ID:")
}

/// Extract the scheduled publication time (dd.mm.yyyy hh:mm:ss) from a
/// workflow confirmation message
pub fn extract_publish_date(text: &str) -> Option<DateTime<Utc>> {
    let caps = PUBLISH_DATE.captures(text)?;
    NaiveDateTime::parse_from_str(&caps[1], "%d.%m.%Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
