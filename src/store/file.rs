/// Reading and writing the lecture index on disk
use super::IndexDocument;
use crate::error::{MonitorError, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info};

/// File-backed lecture index
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
    backup_suffix: String,
}

impl IndexStore {
    pub fn new(path: PathBuf, backup_suffix: impl Into<String>) -> Self {
        Self {
            path,
            backup_suffix: backup_suffix.into(),
        }
    }

    /// Path of the copy taken before each overwrite
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(&self.backup_suffix);
        PathBuf::from(name)
    }

    /// Raw index text. A missing or blank file is an error, never an empty index.
    pub async fn read(&self) -> Result<String> {
        if !fs::try_exists(&self.path).await? {
            error!("❌ Failed to read index: {} does not exist", self.path.display());
            return Err(MonitorError::StoreMissing {
                path: self.path.clone(),
            });
        }

        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            error!("❌ Failed to read index: {} is empty", self.path.display());
            return Err(MonitorError::StoreEmpty {
                path: self.path.clone(),
            });
        }

        Ok(content)
    }

    /// Read and parse the index
    pub async fn load(&self, placeholder_marker: &str) -> Result<IndexDocument> {
        let content = self.read().await?;
        let document = IndexDocument::parse(content, placeholder_marker)?;
        info!(
            "📄 Loaded {} lecture slots from {}",
            document.slot_count(),
            self.path.display()
        );
        Ok(document)
    }

    /// Replace the index, copying the current file to the backup path first
    pub async fn write(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(MonitorError::StoreEmpty {
                path: self.path.clone(),
            });
        }

        if fs::try_exists(&self.path).await? {
            fs::copy(&self.path, self.backup_path()).await?;
            info!("📋 Created backup of {}", self.path.display());
        }

        fs::write(&self.path, content).await?;
        info!("✅ Successfully updated {}", self.path.display());
        Ok(())
    }
}
