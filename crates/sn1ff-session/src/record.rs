//! Local record storage

use sn1ff_core::{RecordHandle, Result};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Appends observation lines to the file a record handle addresses
///
/// Each append is flushed and synced to disk before returning, so lines
/// written before a crash survive on local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordWriter;

impl RecordWriter {
    pub fn new() -> Self {
        Self
    }

    /// Append `text` followed by a newline
    pub async fn append_line(&self, handle: &RecordHandle, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(handle.as_path())
            .await?;

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    /// Read back every line of a record
    pub async fn read_lines(&self, handle: &RecordHandle) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(handle.as_path()).await?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn handle_in(dir: &TempDir, name: &str) -> RecordHandle {
        RecordHandle::parse(dir.path().join(name).to_string_lossy().to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let dir = TempDir::new().unwrap();
        let handle = handle_in(&dir, "chk.snff");
        let writer = RecordWriter::new();

        writer.append_line(&handle, "first").await.unwrap();
        writer.append_line(&handle, "second").await.unwrap();

        assert_eq!(writer.read_lines(&handle).await.unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_append_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        let handle = handle_in(&dir, "chk.snff");
        std::fs::write(handle.as_path(), "App: sn1ff\n\n").unwrap();

        RecordWriter::new().append_line(&handle, "disk ok").await.unwrap();

        let content = std::fs::read_to_string(handle.as_path()).unwrap();
        assert_eq!(content, "App: sn1ff\n\ndisk ok\n");
    }

    #[tokio::test]
    async fn test_empty_text_writes_empty_line() {
        let dir = TempDir::new().unwrap();
        let handle = handle_in(&dir, "chk.snff");

        RecordWriter::new().append_line(&handle, "").await.unwrap();

        assert_eq!(std::fs::read_to_string(handle.as_path()).unwrap(), "\n");
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let handle = handle_in(&dir, "missing/chk.snff");

        let err = RecordWriter::new().append_line(&handle, "x").await.unwrap_err();
        assert!(matches!(err, sn1ff_core::Sn1ffError::Io(_)));
    }
}
