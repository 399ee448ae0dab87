//! GitHub Webhook Events
//!
//! Classification of `X-GitHub-Event` kinds and rendering of the supported
//! payloads into chat text.

use serde_json::Value;

use super::{capitalize, field_text};

/// Number of commit messages listed in a push summary.
const PUSH_COMMIT_PREVIEW: usize = 3;

/// GitHub event kinds with a dedicated summary format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GithubEventKind {
    Push,
    PullRequest,
    IssueComment,
    /// Any other kind, carried verbatim (`"unknown"` when the header is absent).
    Other(String),
}

impl GithubEventKind {
    /// Parse from the `X-GitHub-Event` header value.
    pub fn parse_str(s: &str) -> Self {
        match s {
            "push" => Self::Push,
            "pull_request" => Self::PullRequest,
            "issue_comment" => Self::IssueComment,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::IssueComment => "issue_comment",
            Self::Other(kind) => kind,
        }
    }
}

impl Default for GithubEventKind {
    fn default() -> Self {
        Self::Other("unknown".to_string())
    }
}

impl std::fmt::Display for GithubEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified webhook delivery, alive only until it has been rendered.
#[derive(Debug, Clone)]
pub struct InboundWebhookEvent {
    pub kind: GithubEventKind,
    pub payload: Value,
    pub signature: Option<String>,
    /// `X-GitHub-Delivery`, kept for log correlation.
    pub delivery_id: Option<String>,
}

impl InboundWebhookEvent {
    /// Render the chat message for this event.
    ///
    /// Every field is optional. Missing, `null` or structurally misplaced
    /// values fall back to fixed defaults; scalars of an unexpected type are
    /// rendered as their JSON text.
    pub fn render(&self) -> String {
        match &self.kind {
            GithubEventKind::Push => render_push(&self.payload),
            GithubEventKind::PullRequest => render_pull_request(&self.payload),
            GithubEventKind::IssueComment => render_issue_comment(&self.payload),
            GithubEventKind::Other(kind) => format!("Received GitHub event: **{kind}**"),
        }
    }
}

/// Text at a JSON pointer. Non-object payloads resolve nothing.
fn text_at(payload: &Value, pointer: &str) -> Option<String> {
    field_text(payload.pointer(pointer))
}

fn text_or(payload: &Value, pointer: &str, default: &str) -> String {
    text_at(payload, pointer).unwrap_or_else(|| default.to_string())
}

fn render_push(payload: &Value) -> String {
    let git_ref = text_or(payload, "/ref", "unknown ref");
    let pusher = text_or(payload, "/pusher/name", "someone");
    let commits = payload
        .get("commits")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let listed = commits
        .iter()
        .take(PUSH_COMMIT_PREVIEW)
        .map(|c| {
            let message = field_text(c.get("message")).unwrap_or_default();
            format!("- {}", message.trim())
        })
        .collect::<Vec<_>>()
        .join("\n");
    let overflow = if commits.len() > PUSH_COMMIT_PREVIEW {
        format!(
            "\n...and {} more commit(s).",
            commits.len() - PUSH_COMMIT_PREVIEW
        )
    } else {
        String::new()
    };

    format!("**Push Event** by {pusher} on {git_ref}:\n{listed}{overflow}")
}

fn render_pull_request(payload: &Value) -> String {
    let action = text_or(payload, "/action", "performed an action on");
    let title = text_or(payload, "/pull_request/title", "No title");
    let url = text_or(payload, "/pull_request/html_url", "");
    let user = text_or(payload, "/pull_request/user/login", "someone");

    format!(
        "**Pull Request {}** by {user}: [{title}]({url})",
        capitalize(&action)
    )
}

fn render_issue_comment(payload: &Value) -> String {
    let action = text_or(payload, "/action", "updated");
    let issue_title = text_or(payload, "/issue/title", "No title");
    let url = text_or(payload, "/comment/html_url", "");
    let user = text_or(payload, "/comment/user/login", "someone");

    format!(
        "**Issue Comment {}** by {user} on issue \"{issue_title}\": [View Comment]({url})",
        capitalize(&action)
    )
}
