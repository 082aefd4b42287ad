use std::path::{Path, PathBuf};

use swarm_types::Result;

/// Writes generated source text into a project tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactWriter;

impl ArtifactWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `text` to `project_root/relative_path`, creating parent
    /// directories as needed. Any existing file is overwritten.
    ///
    /// Returns the path that was written.
    pub async fn write(
        &self,
        project_root: &Path,
        relative_path: &Path,
        text: &str,
    ) -> Result<PathBuf> {
        let target = project_root.join(relative_path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, text).await?;
        tracing::info!(path = %target.display(), bytes = text.len(), "Artifact written");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LIB_RS: &str = "programs/program/src/lib.rs";

    #[tokio::test]
    async fn write_creates_intermediate_directories() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("program");

        let path = ArtifactWriter::new()
            .write(&root, Path::new(LIB_RS), "X")
            .await
            .unwrap();

        assert_eq!(path, root.join(LIB_RS));
        assert!(root.join("programs/program/src").is_dir());
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "X");
    }

    #[tokio::test]
    async fn second_write_replaces_first() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new();
        writer
            .write(dir.path(), Path::new(LIB_RS), "first version, much longer text")
            .await
            .unwrap();
        let path = writer
            .write(dir.path(), Path::new(LIB_RS), "second")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");
    }

    #[tokio::test]
    async fn empty_text_is_written() {
        let dir = TempDir::new().unwrap();
        let path = ArtifactWriter::new()
            .write(dir.path(), Path::new(LIB_RS), "")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "");
    }

    #[tokio::test]
    async fn unwritable_path_is_error() {
        let dir = TempDir::new().unwrap();
        // A regular file where a directory is expected.
        tokio::fs::write(dir.path().join("programs"), "blocker").await.unwrap();
        let result = ArtifactWriter::new()
            .write(dir.path(), Path::new(LIB_RS), "X")
            .await;
        assert!(matches!(result, Err(swarm_types::SwarmError::Io(_))));
    }
}
