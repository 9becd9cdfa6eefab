//! App-wide constants.
//!
//! Centralises the tool name, config paths, environment variable names,
//! and URLs so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "prscribe";

/// Crate version, baked in at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple (exported by `build.rs`).
pub const TARGET: &str = env!("TARGET");

/// Local config filename (e.g. `.prscribe.toml` in repo root).
pub const CONFIG_FILENAME: &str = ".prscribe.toml";

/// Directory name under `~/.config/` for global config.
pub const CONFIG_DIR: &str = "prscribe";

/// Hidden HTML comment placed on the first line of every summary comment.
///
/// Used to find (and replace) comments this tool posted earlier.
pub const COMMENT_MARKER: &str = "<!-- prscribe:pr-summary -->";

/// Footer appended to every posted comment.
pub const AI_DISCLOSURE: &str = "This summary was generated by an AI model and may contain mistakes.";

/// Default GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type selecting the versioned GitHub JSON API.
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Pinned GitHub REST API version header value.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

// ── Environment variable names ──────────────────────────────────────

pub const ENV_PROVIDER: &str = "PRSCRIBE_PROVIDER";
pub const ENV_MODEL: &str = "PRSCRIBE_MODEL";
pub const ENV_API_KEY: &str = "PRSCRIBE_API_KEY";
pub const ENV_BASE_URL: &str = "PRSCRIBE_BASE_URL";
pub const ENV_BASE_REF: &str = "PRSCRIBE_BASE_REF";
pub const ENV_HEAD_REF: &str = "PRSCRIBE_HEAD_REF";

// CI-injected (GitHub Actions)
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const ENV_GITHUB_EVENT_NAME: &str = "GITHUB_EVENT_NAME";
pub const ENV_GITHUB_EVENT_PATH: &str = "GITHUB_EVENT_PATH";
pub const ENV_GITHUB_SHA: &str = "GITHUB_SHA";
pub const ENV_GITHUB_REF: &str = "GITHUB_REF";
pub const ENV_GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const ENV_PR_NUMBER: &str = "PR_NUMBER";
