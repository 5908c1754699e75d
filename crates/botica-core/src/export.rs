//! Conversation-log export seam.
//!
//! Idle sessions export their accumulated transcript through this trait.
//! Mail delivery itself is an external collaborator; the shipped
//! implementations write to disk or drop the export, and the session layer
//! treats any failure as best-effort.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::errors::AssistantError;

#[async_trait]
pub trait LogExporter: Send + Sync {
    async fn export(&self, subject: &str, body: &str) -> Result<(), AssistantError>;
}

pub struct NoopExporter;

#[async_trait]
impl LogExporter for NoopExporter {
    async fn export(&self, subject: &str, _body: &str) -> Result<(), AssistantError> {
        log::info!("Dropping log export {:?} (no exporter configured)", subject);
        Ok(())
    }
}

/// Writes each export as one file under the configured directory.
pub struct FileExporter {
    dir: PathBuf,
}

impl FileExporter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl LogExporter for FileExporter {
    async fn export(&self, subject: &str, body: &str) -> Result<(), AssistantError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AssistantError::ExportError(e.to_string()))?;
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let path = self.dir.join(format!("chat-{}.log", stamp));
        let content = format!("{}\n\n{}", subject, body);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AssistantError::ExportError(e.to_string()))?;
        log::info!("Conversation log exported to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_exporter_writes_log() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = FileExporter::new(dir.path().to_path_buf());
        exporter.export("Chat Q&A: 2024-01-01", "USER: hola").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let content =
            std::fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
        assert!(content.contains("USER: hola"));
    }

    #[tokio::test]
    async fn test_noop_exporter_succeeds() {
        assert!(NoopExporter.export("s", "b").await.is_ok());
    }
}
