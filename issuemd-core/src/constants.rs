// Constants used throughout issuemd

// Rendering defaults
pub const DEFAULT_DATE_FORMAT: &str = "MMM dd, yyyy";
pub const DEFAULT_HEADING_LEVEL: usize = 1;
pub const HEADING_MARKER: &str = "#";
pub const FRONT_MATTER_DELIMITER: &str = "---";
pub const DOCUMENT_EXTENSION: &str = ".md";

// Template syntax
pub const ALTERNATIVE_SEPARATOR: &str = "??";
pub const FORMAT_SEPARATOR: char = '|';
pub const ARGUMENT_SEPARATOR: char = ':';
pub const PATH_SEPARATOR: char = '.';

// GitHub API
pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const USER_AGENT: &str = "issuemd-rust/1.0";
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";
pub const DEFAULT_MAX_ISSUES_PER_RUN: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;
pub const HTTP_TIMEOUT_SECS: u64 = 30;

// Run configuration keys
pub const LAST_TIMESTAMP_KEY: &str = "lastTimeStamp";
pub const COMMIT_MESSAGE: &str = "Updated cached markdown files";

// Environment overrides
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_API_URL: &str = "ISSUEMD_API_URL";
pub const ENV_CTX_OUT: &str = "ISSUEMD_CTXOUT";
pub const ENV_DRY_RUN: &str = "ISSUEMD_DRY_RUN";
