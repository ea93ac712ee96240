//! # File-Backed Document Store
//!
//! Implements `DocumentStore` over a local file. The production deployment
//! keeps the membership document on a community-editable page; this adapter
//! provides the same contract for development and self-hosted setups, where
//! the "page" is a file humans can edit while the bot runs.

use crate::domain::traits::DocumentStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn fetch(&self) -> Result<String, String> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // First run: no document yet means no groups yet.
                tracing::warn!("Membership document {:?} not found, starting empty", self.path);
                Ok(String::new())
            }
            Err(e) => Err(e.to_string()),
        }
    }

    async fn publish(&self, content: &str, reason: &str) -> Result<(), String> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| e.to_string())?;
        }

        // Write-then-rename so a concurrent human read never sees a torn file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).await.map_err(|e| e.to_string())?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!("Published membership document ({})", reason);
        Ok(())
    }
}
