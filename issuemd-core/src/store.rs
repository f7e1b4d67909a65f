//! Where rendered documents end up

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{IssueMdError, Result};

/// Persists rendered documents under a root directory
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document at `file_name` (relative to the store root) and
    /// return the full path written.
    async fn write(&self, file_name: &str, content: &str) -> Result<PathBuf>;
}

/// Plain files on disk, delete-then-create
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Create the store, making the output directory (recursively) if absent
    pub async fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !tokio::fs::try_exists(&root).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&root).await?;
            info!("Created output directory {}", root.display());
        }
        Ok(FsDocumentStore { root })
    }

}

/// Join `file_name` under `root`, keeping only plain components so the result
/// cannot escape the root through `/`, `..` or a drive prefix.
fn document_path(root: &Path, file_name: &str) -> Result<PathBuf> {
    let relative: PathBuf = Path::new(file_name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if relative.as_os_str().is_empty() {
        return Err(IssueMdError::Generic(format!(
            "Document name '{}' has no usable path components",
            file_name
        )));
    }

    Ok(root.join(relative))
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn write(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = document_path(&self.root, file_name)?;

        // File name templates may contain separators
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path).await?;
        }

        tokio::fs::write(&path, content).await?;
        debug!("Wrote {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}

/// Logs what would be written and touches nothing
#[derive(Debug, Clone)]
pub struct DryRunStore {
    root: PathBuf,
}

impl DryRunStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        DryRunStore {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DocumentStore for DryRunStore {
    async fn write(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = document_path(&self.root, file_name)?;
        info!("Would write {} ({} bytes)", path.display(), content.len());
        Ok(path)
    }
}
