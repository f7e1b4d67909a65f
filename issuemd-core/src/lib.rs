//! issuemd Core Library
//!
//! Turns GitHub issue threads into Markdown documents. The interesting part is
//! the placeholder engine in [`template`] (field paths, `??` fallbacks,
//! formatters, date patterns); around it sit the renderer, the run driver
//! with its timestamp checkpoint, and thin GitHub/filesystem collaborators.

pub mod config;
pub mod constants;
pub mod context;
pub mod datetime;
pub mod error;
pub mod github;
pub mod record;
pub mod render;
pub mod run;
pub mod store;
pub mod template;

// Re-export commonly used items
pub use config::{ConfigFile, RenderConfig, RunConfig};
pub use context::Context;
pub use datetime::Timestamp;
pub use error::{IssueMdError, Result};
pub use github::{CommentSource, GitHubClient, IssueSource};
pub use record::{CommentRecord, IssueRecord};
pub use run::{generate_documents, RunSources, RunSummary};
pub use store::{DocumentStore, DryRunStore, FsDocumentStore};
