//! CI execution context and comment target resolution.
//!
//! Everything the pipeline needs from GitHub Actions is read once into an
//! [`ExecutionContext`]. Target resolution order:
//!
//! 1. `PR_NUMBER` set: that pull request, whatever the event.
//! 2. `pull_request` / `pull_request_target`: `number` (or
//!    `pull_request.number`) from the `GITHUB_EVENT_PATH` payload.
//! 3. `push`: the commit at `GITHUB_SHA`.
//! 4. no event name: `GITHUB_REF` of the form `refs/pull/<n>/...`.
//! 5. anything else is unsupported.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::constants;
use crate::env::Env;
use crate::models::CommentTarget;

/// Errors from reading the CI context.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid repository '{0}' (expected owner/name)")]
    InvalidRepository(String),

    #[error("invalid pull request number: {0}")]
    InvalidPrNumber(String),

    #[error("failed to read event payload {path}: {source}")]
    EventRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse event payload: {0}")]
    EventParse(String),

    #[error("no pull request number in the '{0}' event payload")]
    MissingPrNumber(String),

    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),
}

/// The triggering CI event, as named by `GITHUB_EVENT_NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PullRequest,
    PullRequestTarget,
    Push,
    Other(String),
    /// No event name in the environment (local or non-Actions runs).
    Unknown,
}

impl EventKind {
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            None => EventKind::Unknown,
            Some("pull_request") => EventKind::PullRequest,
            Some("pull_request_target") => EventKind::PullRequestTarget,
            Some("push") => EventKind::Push,
            Some(other) => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::PullRequest => write!(f, "pull_request"),
            EventKind::PullRequestTarget => write!(f, "pull_request_target"),
            EventKind::Push => write!(f, "push"),
            EventKind::Other(name) => write!(f, "{name}"),
            EventKind::Unknown => write!(f, "<none>"),
        }
    }
}

/// Values read from the CI environment for one invocation.
#[derive(Clone)]
pub struct ExecutionContext {
    pub event: EventKind,
    pub event_path: Option<PathBuf>,
    pub sha: Option<String>,
    pub git_ref: Option<String>,
    pub repository: Option<String>,
    pub token: Option<String>,
    pub pr_number: Option<String>,
    pub api_url: String,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("event", &self.event)
            .field("event_path", &self.event_path)
            .field("sha", &self.sha)
            .field("git_ref", &self.git_ref)
            .field("repository", &self.repository)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("pr_number", &self.pr_number)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl ExecutionContext {
    /// Read the context from the environment. Blank values count as unset.
    pub fn from_env(env: &Env) -> Self {
        Self {
            event: EventKind::from_name(env.non_empty(constants::ENV_GITHUB_EVENT_NAME).as_deref()),
            event_path: env.non_empty(constants::ENV_GITHUB_EVENT_PATH).map(PathBuf::from),
            sha: env.non_empty(constants::ENV_GITHUB_SHA),
            git_ref: env.non_empty(constants::ENV_GITHUB_REF),
            repository: env.non_empty(constants::ENV_GITHUB_REPOSITORY),
            token: env.non_empty(constants::ENV_GITHUB_TOKEN),
            pr_number: env.non_empty(constants::ENV_PR_NUMBER),
            api_url: env
                .non_empty(constants::ENV_GITHUB_API_URL)
                .unwrap_or_else(|| constants::DEFAULT_API_URL.to_string()),
        }
    }

    /// The forge token.
    pub fn token(&self) -> Result<&str, ContextError> {
        self.token
            .as_deref()
            .ok_or(ContextError::MissingEnv(constants::ENV_GITHUB_TOKEN))
    }

    /// The `owner/name` repository slug, validated.
    pub fn repository(&self) -> Result<&str, ContextError> {
        let repo = self
            .repository
            .as_deref()
            .ok_or(ContextError::MissingEnv(constants::ENV_GITHUB_REPOSITORY))?;

        match repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(repo)
            }
            _ => Err(ContextError::InvalidRepository(repo.to_string())),
        }
    }

    /// Decide where the summary comment goes.
    pub fn resolve_target(&self) -> Result<CommentTarget, ContextError> {
        if let Some(raw) = &self.pr_number {
            return parse_pr_number(raw).map(|number| CommentTarget::PullRequest { number });
        }

        match &self.event {
            EventKind::PullRequest | EventKind::PullRequestTarget => {
                let number = self.pr_number_from_payload()?;
                Ok(CommentTarget::PullRequest { number })
            }
            EventKind::Push => {
                let sha = self
                    .sha
                    .clone()
                    .ok_or(ContextError::MissingEnv(constants::ENV_GITHUB_SHA))?;
                Ok(CommentTarget::Commit { sha })
            }
            EventKind::Unknown => self
                .git_ref
                .as_deref()
                .and_then(pr_number_from_ref)
                .map(|number| CommentTarget::PullRequest { number })
                .ok_or_else(|| {
                    ContextError::UnsupportedEvent(format!(
                        "no {} and {} is not a pull request ref",
                        constants::ENV_GITHUB_EVENT_NAME,
                        constants::ENV_GITHUB_REF
                    ))
                }),
            EventKind::Other(name) => Err(ContextError::UnsupportedEvent(name.clone())),
        }
    }

    fn pr_number_from_payload(&self) -> Result<u64, ContextError> {
        let path = self
            .event_path
            .as_ref()
            .ok_or(ContextError::MissingEnv(constants::ENV_GITHUB_EVENT_PATH))?;

        let raw = std::fs::read_to_string(path).map_err(|source| ContextError::EventRead {
            path: path.clone(),
            source,
        })?;
        let payload: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| ContextError::EventParse(e.to_string()))?;

        payload
            .get("number")
            .and_then(serde_json::Value::as_u64)
            .or_else(|| payload.pointer("/pull_request/number").and_then(serde_json::Value::as_u64))
            .ok_or_else(|| ContextError::MissingPrNumber(self.event.to_string()))
    }
}

fn parse_pr_number(raw: &str) -> Result<u64, ContextError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ContextError::InvalidPrNumber(raw.to_string())),
    }
}

/// Extract `N` from `refs/pull/N/merge` (or `/head`, or any other suffix).
fn pr_number_from_ref(git_ref: &str) -> Option<u64> {
    let (number, _rest) = git_ref.strip_prefix("refs/pull/")?.split_once('/')?;
    number.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ctx(vars: &[(&str, &str)]) -> ExecutionContext {
        ExecutionContext::from_env(&Env::mock(vars.iter().copied()))
    }

    fn event_file(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn pull_request_target_reads_number() {
        let file = event_file(r#"{"number": 42, "action": "opened"}"#);
        let path = file.path().to_str().unwrap();
        let c = ctx(&[
            ("GITHUB_EVENT_NAME", "pull_request_target"),
            ("GITHUB_EVENT_PATH", path),
        ]);
        assert_eq!(
            c.resolve_target().unwrap(),
            CommentTarget::PullRequest { number: 42 }
        );
    }

    #[test]
    fn pull_request_falls_back_to_nested_number() {
        let file = event_file(r#"{"pull_request": {"number": 9}}"#);
        let path = file.path().to_str().unwrap();
        let c = ctx(&[("GITHUB_EVENT_NAME", "pull_request"), ("GITHUB_EVENT_PATH", path)]);
        assert_eq!(
            c.resolve_target().unwrap(),
            CommentTarget::PullRequest { number: 9 }
        );
    }

    #[test]
    fn pull_request_without_number_is_missing() {
        let file = event_file(r#"{"action": "opened"}"#);
        let path = file.path().to_str().unwrap();
        let c = ctx(&[("GITHUB_EVENT_NAME", "pull_request"), ("GITHUB_EVENT_PATH", path)]);
        assert!(matches!(
            c.resolve_target(),
            Err(ContextError::MissingPrNumber(e)) if e == "pull_request"
        ));
    }

    #[test]
    fn pull_request_with_bad_payload() {
        let file = event_file("not json");
        let path = file.path().to_str().unwrap();
        let c = ctx(&[("GITHUB_EVENT_NAME", "pull_request"), ("GITHUB_EVENT_PATH", path)]);
        assert!(matches!(c.resolve_target(), Err(ContextError::EventParse(_))));

        let c = ctx(&[
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_EVENT_PATH", "/nonexistent/event.json"),
        ]);
        assert!(matches!(c.resolve_target(), Err(ContextError::EventRead { .. })));
    }

    #[test]
    fn push_targets_commit() {
        let c = ctx(&[("GITHUB_EVENT_NAME", "push"), ("GITHUB_SHA", "abc123")]);
        assert_eq!(
            c.resolve_target().unwrap(),
            CommentTarget::Commit {
                sha: "abc123".into()
            }
        );
    }

    #[test]
    fn push_without_sha_is_config_error() {
        let c = ctx(&[("GITHUB_EVENT_NAME", "push")]);
        assert!(matches!(
            c.resolve_target(),
            Err(ContextError::MissingEnv("GITHUB_SHA"))
        ));
    }

    #[test]
    fn other_events_are_unsupported() {
        let c = ctx(&[("GITHUB_EVENT_NAME", "workflow_dispatch"), ("GITHUB_SHA", "abc123")]);
        assert!(matches!(
            c.resolve_target(),
            Err(ContextError::UnsupportedEvent(e)) if e == "workflow_dispatch"
        ));
    }

    #[test]
    fn pr_number_override_wins() {
        let c = ctx(&[
            ("GITHUB_EVENT_NAME", "push"),
            ("GITHUB_SHA", "abc123"),
            ("PR_NUMBER", "17"),
        ]);
        assert_eq!(
            c.resolve_target().unwrap(),
            CommentTarget::PullRequest { number: 17 }
        );

        let bad = ctx(&[("PR_NUMBER", "seventeen")]);
        assert!(matches!(
            bad.resolve_target(),
            Err(ContextError::InvalidPrNumber(_))
        ));
    }

    #[test]
    fn git_ref_fallback_without_event_name() {
        let c = ctx(&[("GITHUB_REF", "refs/pull/5/merge")]);
        assert_eq!(
            c.resolve_target().unwrap(),
            CommentTarget::PullRequest { number: 5 }
        );

        let head = ctx(&[("GITHUB_REF", "refs/pull/12/head")]);
        assert_eq!(
            head.resolve_target().unwrap(),
            CommentTarget::PullRequest { number: 12 }
        );

        let branch = ctx(&[("GITHUB_REF", "refs/heads/main")]);
        assert!(matches!(
            branch.resolve_target(),
            Err(ContextError::UnsupportedEvent(_))
        ));

        let nothing = ctx(&[]);
        assert!(matches!(
            nothing.resolve_target(),
            Err(ContextError::UnsupportedEvent(_))
        ));
    }

    #[test]
    fn repository_validation() {
        assert_eq!(
            ctx(&[("GITHUB_REPOSITORY", "acme/widgets")]).repository().unwrap(),
            "acme/widgets"
        );
        assert!(matches!(
            ctx(&[]).repository(),
            Err(ContextError::MissingEnv("GITHUB_REPOSITORY"))
        ));
        for bad in ["acme", "/widgets", "acme/", "a/b/c"] {
            assert!(matches!(
                ctx(&[("GITHUB_REPOSITORY", bad)]).repository(),
                Err(ContextError::InvalidRepository(_))
            ));
        }
    }

    #[test]
    fn api_url_defaults_and_override() {
        assert_eq!(ctx(&[]).api_url, constants::DEFAULT_API_URL);
        assert_eq!(
            ctx(&[("GITHUB_API_URL", "https://ghe.example.com/api/v3")]).api_url,
            "https://ghe.example.com/api/v3"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let c = ctx(&[("GITHUB_TOKEN", "ghs_secret")]);
        assert_eq!(c.token().unwrap(), "ghs_secret");
        let debug = format!("{c:?}");
        assert!(!debug.contains("ghs_secret"));
    }

    #[test]
    fn blank_values_are_unset() {
        let c = ctx(&[("GITHUB_EVENT_NAME", "  "), ("GITHUB_TOKEN", "")]);
        assert_eq!(c.event, EventKind::Unknown);
        assert!(matches!(c.token(), Err(ContextError::MissingEnv(_))));
    }
}
