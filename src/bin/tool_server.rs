//! Relaypost tool server
//!
//! A standalone stdio binary exposing callable tools over a line-oriented
//! JSON protocol: one request object per stdin line, one response object
//! per stdout line. Diagnostics go to stderr so stdout stays protocol-only.
//!
//! Tools:
//! - `echo` - echo back the input text
//! - `get_time` - current UTC time
//! - `linkedin_post` - share a UGC post through LinkedIn's REST API

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LINKEDIN_PROFILE_URL: &str = "https://api.linkedin.com/v2/people/~";
const LINKEDIN_UGC_POSTS_URL: &str = "https://api.linkedin.com/v2/ugcPosts";

/// One request per stdin line
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    ListTools,
    CallTool {
        tool: String,
        #[serde(default)]
        args: Value,
    },
}

/// One response per stdout line
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Tools { tools: Vec<ToolDescriptor> },
    Content { content: Vec<ContentBlock> },
    Error { error: ToolError },
}

#[derive(Debug, Serialize)]
struct ToolDescriptor {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolError {
    code: &'static str,
    message: String,
}

impl Response {
    fn text(text: String) -> Self {
        Response::Content {
            content: vec![ContentBlock { kind: "text", text }],
        }
    }

    fn error(code: &'static str, message: impl Into<String>) -> Self {
        Response::Error {
            error: ToolError {
                code,
                message: message.into(),
            },
        }
    }
}

/// Arguments for the `linkedin_post` tool
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedinPostArgs {
    access_token: String,
    content: String,
    #[serde(default = "default_visibility")]
    visibility: String,
}

fn default_visibility() -> String {
    "PUBLIC".to_string()
}

fn list_tools() -> Response {
    Response::Tools {
        tools: vec![
            ToolDescriptor {
                name: "echo",
                description: "Echo back the input text",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "text": {"type": "string", "description": "Text to echo back"}
                    },
                    "required": ["text"]
                }),
            },
            ToolDescriptor {
                name: "get_time",
                description: "Get the current time",
                input_schema: json!({"type": "object", "properties": {}}),
            },
            ToolDescriptor {
                name: "linkedin_post",
                description: "Share a post on LinkedIn",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "accessToken": {
                            "type": "string",
                            "description": "LinkedIn access token for authentication"
                        },
                        "content": {
                            "type": "string",
                            "description": "Content of the post to share"
                        },
                        "visibility": {
                            "type": "string",
                            "description": "Post visibility",
                            "enum": ["PUBLIC", "CONNECTIONS", "LOGGED_IN_MEMBERS"],
                            "default": "PUBLIC"
                        }
                    },
                    "required": ["accessToken", "content"]
                }),
            },
        ],
    }
}

fn echo(args: &Value) -> Response {
    match args.get("text").and_then(Value::as_str) {
        Some(text) => Response::text(format!("Echo: {text}")),
        None => Response::error("invalid_args", "echo requires a 'text' string"),
    }
}

fn get_time() -> Response {
    Response::text(format!(
        "Current time: {}",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    ))
}

/// Fetch the member profile for its person id, then publish a UGC share
fn linkedin_post(http: &reqwest::blocking::Client, args: Value) -> Response {
    let args: LinkedinPostArgs = match serde_json::from_value(args) {
        Ok(args) => args,
        Err(e) => return Response::error("invalid_args", format!("linkedin_post: {e}")),
    };

    match share_post(http, &args) {
        Ok(post_id) => {
            Response::text(format!("LinkedIn post shared successfully! Post ID: {post_id}"))
        }
        Err(e) => Response::error("internal_error", format!("Failed to share LinkedIn post: {e:#}")),
    }
}

fn share_post(http: &reqwest::blocking::Client, args: &LinkedinPostArgs) -> Result<String> {
    let profile: Value = http
        .get(LINKEDIN_PROFILE_URL)
        .bearer_auth(&args.access_token)
        .send()
        .context("profile request failed")?
        .error_for_status()
        .context("profile request rejected")?
        .json()
        .context("profile response is not JSON")?;

    let person_id = profile
        .get("id")
        .and_then(Value::as_str)
        .context("profile response has no id")?;

    let body = json!({
        "author": format!("urn:li:person:{person_id}"),
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": {"text": args.content},
                "shareMediaCategory": "NONE"
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": args.visibility
        }
    });

    let reply: Value = http
        .post(LINKEDIN_UGC_POSTS_URL)
        .bearer_auth(&args.access_token)
        .header("X-Restli-Protocol-Version", "2.0.0")
        .json(&body)
        .send()
        .context("share request failed")?
        .error_for_status()
        .context("share request rejected")?
        .json()
        .context("share response is not JSON")?;

    Ok(reply
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

fn handle(http: &reqwest::blocking::Client, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return Response::error("invalid_request", format!("bad request line: {e}")),
    };

    match request {
        Request::ListTools => list_tools(),
        Request::CallTool { tool, args } => match tool.as_str() {
            "echo" => echo(&args),
            "get_time" => get_time(),
            "linkedin_post" => linkedin_post(http, args),
            other => Response::error("unknown_tool", format!("Unknown tool: {other}")),
        },
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relaypost_tools=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!(pid = std::process::id(), "tool server running on stdio");

    let http = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle(&http, &line);
        serde_json::to_writer(&mut stdout, &response)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> reqwest::blocking::Client {
        reqwest::blocking::Client::new()
    }

    #[test]
    fn test_list_tools_names() {
        let response = handle(&client(), r#"{"op": "list_tools"}"#);
        match response {
            Response::Tools { tools } => {
                let names: Vec<_> = tools.iter().map(|t| t.name).collect();
                assert_eq!(names, vec!["echo", "get_time", "linkedin_post"]);
            }
            other => panic!("expected tool list, got {other:?}"),
        }
    }

    #[test]
    fn test_echo_round_trip() {
        let response = handle(
            &client(),
            r#"{"op": "call_tool", "tool": "echo", "args": {"text": "merhaba"}}"#,
        );
        match response {
            Response::Content { content } => {
                assert_eq!(content[0].text, "Echo: merhaba");
            }
            other => panic!("expected content, got {other:?}"),
        }
    }

    #[test]
    fn test_echo_requires_text() {
        let response = handle(&client(), r#"{"op": "call_tool", "tool": "echo"}"#);
        match response {
            Response::Error { error } => assert_eq!(error.code, "invalid_args"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_get_time_is_rfc3339() {
        let response = handle(&client(), r#"{"op": "call_tool", "tool": "get_time"}"#);
        match response {
            Response::Content { content } => {
                let text = content[0].text.strip_prefix("Current time: ").unwrap();
                assert!(chrono::DateTime::parse_from_rfc3339(text).is_ok());
            }
            other => panic!("expected content, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tool() {
        let response = handle(&client(), r#"{"op": "call_tool", "tool": "rm_rf"}"#);
        match response {
            Response::Error { error } => {
                assert_eq!(error.code, "unknown_tool");
                assert!(error.message.contains("rm_rf"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_line() {
        let response = handle(&client(), "not json at all");
        match response {
            Response::Error { error } => assert_eq!(error.code, "invalid_request"),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
