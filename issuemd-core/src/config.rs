//! Run configuration file and the render settings derived from it
//!
//! The JSON file is both input and state: after a successful run its
//! `lastTimeStamp` is rewritten in place, so the raw document is kept next to
//! the typed view and every key the tool does not know about survives.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Map;
use tracing::info;

use crate::constants::{
    DEFAULT_DATE_FORMAT, DEFAULT_HEADING_LEVEL, DEFAULT_MAX_ISSUES_PER_RUN, DOCUMENT_EXTENSION,
    HEADING_MARKER, LAST_TIMESTAMP_KEY,
};
use crate::datetime::{self, Timestamp};
use crate::{IssueMdError, Result};

/// `md_config` section as written by users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkdownConfig {
    #[serde(default)]
    pub heading_start: Option<usize>,
    #[serde(rename = "dateFormat", default)]
    pub date_format: Option<String>,
    /// Front matter: key -> template, in file order
    #[serde(default)]
    pub header: Option<Map<String, serde_json::Value>>,
    #[serde(default)]
    pub comment_title_format: Option<String>,
}

/// Immutable render settings with defaults applied
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub heading_level: usize,
    pub date_format: String,
    pub front_matter: Vec<(String, String)>,
    pub comment_title_template: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            heading_level: DEFAULT_HEADING_LEVEL,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            front_matter: Vec::new(),
            comment_title_template: None,
        }
    }
}

impl RenderConfig {
    pub fn from_markdown_config(md: &MarkdownConfig) -> Self {
        let heading_level = md
            .heading_start
            .filter(|level| *level >= 1)
            .unwrap_or(DEFAULT_HEADING_LEVEL);

        let date_format = md
            .date_format
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());

        let front_matter = md
            .header
            .iter()
            .flatten()
            .map(|(key, template)| {
                let template = match template {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), template)
            })
            .collect();

        let comment_title_template = md.comment_title_format.clone().filter(|t| !t.is_empty());

        RenderConfig {
            heading_level,
            date_format,
            front_matter,
            comment_title_template,
        }
    }

    /// Heading marker for the document title, e.g. `##` for level 2
    pub fn heading(&self) -> String {
        HEADING_MARKER.repeat(self.heading_level)
    }

    /// Every template this config carries, for upfront diagnostics
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.front_matter
            .iter()
            .map(|(_, t)| t.as_str())
            .chain(self.comment_title_template.as_deref())
    }
}

/// Typed view of the run configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub output_path: String,
    #[serde(default = "default_file_name_template")]
    pub file_name_template: String,
    #[serde(default)]
    pub md_config: MarkdownConfig,
    #[serde(default)]
    pub source_repository: Option<String>,
    #[serde(default)]
    pub max_issues_per_run: Option<usize>,
    #[serde(rename = "lastTimeStamp", default)]
    pub last_timestamp: Option<String>,
    #[serde(rename = "autoCommit", default)]
    pub auto_commit: bool,
}

fn default_file_name_template() -> String {
    "{number}".to_string()
}

impl RunConfig {
    /// File name template, always ending in the document extension
    pub fn file_name_template(&self) -> String {
        if self.file_name_template.ends_with(DOCUMENT_EXTENSION) {
            self.file_name_template.clone()
        } else {
            format!("{}{}", self.file_name_template, DOCUMENT_EXTENSION)
        }
    }

    pub fn max_issues_per_run(&self) -> usize {
        self.max_issues_per_run
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_ISSUES_PER_RUN)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        datetime::parse(self.last_timestamp.as_deref())
    }

    pub fn source_repository(&self) -> Result<&str> {
        self.source_repository
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                IssueMdError::Config(
                    "Repository source url is required which is not provided in config".to_string(),
                )
            })
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig::from_markdown_config(&self.md_config)
    }
}

/// Run configuration bound to the file it came from
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    raw: serde_json::Value,
    pub config: RunConfig,
}

impl ConfigFile {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(IssueMdError::Config(format!(
                "Config file does not exist in path {}",
                path.display()
            )));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        Self::from_str(path, &content)
    }

    pub fn from_str(path: PathBuf, content: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)?;
        if !raw.is_object() {
            return Err(IssueMdError::Config(format!(
                "Config file {} must contain a JSON object",
                path.display()
            )));
        }
        let config = serde_json::from_value(raw.clone())?;

        Ok(ConfigFile { path, raw, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite `lastTimeStamp` in place. Invalid timestamps are never
    /// persisted.
    pub async fn save_checkpoint(&mut self, timestamp: &Timestamp) -> Result<()> {
        let iso = timestamp.to_iso_string().ok_or_else(|| {
            IssueMdError::Generic("refusing to persist an invalid checkpoint timestamp".to_string())
        })?;

        if let serde_json::Value::Object(map) = &mut self.raw {
            map.insert(LAST_TIMESTAMP_KEY.to_string(), serde_json::Value::String(iso.clone()));
        }
        self.config.last_timestamp = Some(iso.clone());

        tokio::fs::write(&self.path, self.to_pretty_json()?).await?;
        info!("Checkpoint {} saved to {}", iso, self.path.display());
        Ok(())
    }

    /// Serialize with 4-space indentation and a trailing newline
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.raw.serialize(&mut serializer)?;
        buf.push(b'\n');

        String::from_utf8(buf).map_err(|err| IssueMdError::Generic(err.to_string()))
    }
}
