//! Attachment bytes on the local filesystem.
//!
//! Files live at `<storage_dir>/<note_id>/<attachment_id>_<file name>` and are
//! served read-only under `/files`.

use std::path::{Path, PathBuf};

use notes_core::{AttachmentId, NoteId};

#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` and return the path relative to the storage root.
    pub async fn save(
        &self,
        note_id: &NoteId,
        attachment_id: &AttachmentId,
        filename: &str,
        bytes: &[u8],
    ) -> std::io::Result<String> {
        let relative = format!("{note_id}/{attachment_id}_{}", base_name(filename));
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(relative)
    }

    /// Remove a stored file; a file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = relative, "Attachment file already missing");
                Ok(())
            }
            other => other,
        }
    }
}

/// Public URL of a stored file.
pub fn file_url(relative: &str) -> String {
    format!("/files/{relative}")
}

/// Final path component of a client-supplied file name, with both separator styles stripped.
fn base_name(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => "file".to_string(),
        name => name.to_string(),
    }
}
