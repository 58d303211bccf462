//! Attachment intake: screening of user-selected files and the staged set.
//!
//! Screening happens before any bytes are read, so duplicates and oversized
//! files never touch the filesystem. Reading is left to the caller, which lets
//! the form release its state lock while file contents load.

use std::io;
use std::path::{Path, PathBuf};

use crate::domain::attachment::{Attachment, AttachmentKey};
use crate::errors::IntakeRejection;

#[derive(Clone, Debug, PartialEq, Eq)]
enum FileSource {
    Memory(Vec<u8>),
    Path(PathBuf),
}

/// A file the user picked, before its contents are read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    source: FileSource,
}

impl SelectedFile {
    pub fn in_memory(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: content.len() as u64,
            source: FileSource::Memory(content),
        }
    }

    /// Describe a file on disk; the mime type is guessed from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{}` is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_guess::from_path(path).first_or_octet_stream().to_string();

        Ok(Self {
            name,
            mime_type,
            size_bytes: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn key(&self) -> AttachmentKey {
        AttachmentKey { name: self.name.clone(), size_bytes: self.size_bytes }
    }

    pub async fn read(self) -> Result<Attachment, IntakeRejection> {
        let content = match self.source {
            FileSource::Memory(content) => content,
            FileSource::Path(path) => tokio::fs::read(&path).await.map_err(|error| {
                IntakeRejection::Unreadable { name: self.name.clone(), reason: error.to_string() }
            })?,
        };
        Ok(Attachment::new(self.name, self.mime_type, content))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntakePolicy {
    pub max_attachment_bytes: u64,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self { max_attachment_bytes: crate::config::DEFAULT_MAX_ATTACHMENT_BYTES }
    }
}

/// Ordered attachments, unique by (name, size).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StagedAttachmentSet {
    items: Vec<Attachment>,
}

impl StagedAttachmentSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Attachment] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    pub fn contains(&self, key: &AttachmentKey) -> bool {
        self.items.iter().any(|item| item.name == key.name && item.size_bytes == key.size_bytes)
    }

    /// Appends unless an attachment with the same identity is already staged.
    pub fn push(&mut self, attachment: Attachment) -> bool {
        if self.contains(&attachment.key()) {
            return false;
        }
        self.items.push(attachment);
        true
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Attachment> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop the attachments that went out with a delivered payload. Files staged
    /// after the payload was assembled stay.
    pub fn remove_sent(&mut self, sent: &[Attachment]) {
        let sent: Vec<AttachmentKey> = sent.iter().map(Attachment::key).collect();
        self.items.retain(|item| !sent.contains(&item.key()));
    }

    /// Split a selection into files worth reading, duplicates, and rejections.
    pub fn screen(&self, selected: Vec<SelectedFile>, policy: IntakePolicy) -> Screening {
        let mut screening = Screening::default();
        let mut seen: Vec<AttachmentKey> = Vec::new();

        for file in selected {
            let key = file.key();
            if self.contains(&key) || seen.contains(&key) {
                screening.duplicates.push(file.name);
                continue;
            }

            if file.size_bytes > policy.max_attachment_bytes {
                screening.rejections.push(IntakeRejection::Oversized {
                    name: file.name,
                    size_bytes: file.size_bytes,
                    limit_bytes: policy.max_attachment_bytes,
                });
                continue;
            }

            seen.push(key);
            screening.accepted.push(file);
        }

        screening
    }
}

#[derive(Debug, Default)]
pub struct Screening {
    pub accepted: Vec<SelectedFile>,
    pub duplicates: Vec<String>,
    pub rejections: Vec<IntakeRejection>,
}

/// Result of one `add_files` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub added: Vec<String>,
    pub duplicates: Vec<String>,
    pub rejections: Vec<IntakeRejection>,
}

impl IntakeReport {
    pub fn messages(&self) -> Vec<String> {
        self.rejections.iter().map(ToString::to_string).collect()
    }

    /// Text for the inline error banner, `None` when nothing was rejected.
    pub fn banner(&self) -> Option<String> {
        if self.rejections.is_empty() {
            return None;
        }
        Some(self.messages().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{IntakePolicy, SelectedFile, StagedAttachmentSet};
    use crate::domain::attachment::Attachment;
    use crate::errors::IntakeRejection;

    fn policy(max: u64) -> IntakePolicy {
        IntakePolicy { max_attachment_bytes: max }
    }

    #[test]
    fn push_rejects_same_name_and_size() {
        let mut staged = StagedAttachmentSet::default();
        assert!(staged.push(Attachment::new("sofa.jpg", "image/jpeg", vec![1, 2, 3])));
        assert!(!staged.push(Attachment::new("sofa.jpg", "image/jpeg", vec![4, 5, 6])));
        assert!(staged.push(Attachment::new("sofa.jpg", "image/jpeg", vec![4, 5])));
        assert_eq!(staged.len(), 2);
    }

    #[test]
    fn remove_sent_keeps_attachments_staged_later() {
        let mut staged = StagedAttachmentSet::default();
        staged.push(Attachment::new("a.jpg", "image/jpeg", vec![0; 4]));
        staged.push(Attachment::new("b.jpg", "image/jpeg", vec![0; 2]));
        let sent = staged.as_slice().to_vec();
        staged.push(Attachment::new("late.jpg", "image/jpeg", vec![0; 3]));

        staged.remove_sent(&sent);

        let names: Vec<_> = staged.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["late.jpg"]);
    }

    #[test]
    fn screen_keeps_selection_order_and_dedupes_within_batch() {
        let mut staged = StagedAttachmentSet::default();
        staged.push(Attachment::new("a.jpg", "image/jpeg", vec![0; 4]));

        let screening = staged.screen(
            vec![
                SelectedFile::in_memory("b.jpg", "image/jpeg", vec![0; 2]),
                SelectedFile::in_memory("a.jpg", "image/jpeg", vec![0; 4]),
                SelectedFile::in_memory("big.png", "image/png", vec![0; 20]),
                SelectedFile::in_memory("b.jpg", "image/jpeg", vec![0; 2]),
                SelectedFile::in_memory("c.jpg", "image/jpeg", vec![0; 3]),
            ],
            policy(10),
        );

        let accepted: Vec<_> = screening.accepted.iter().map(|file| file.name.as_str()).collect();
        assert_eq!(accepted, vec!["b.jpg", "c.jpg"]);
        assert_eq!(screening.duplicates, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
        assert_eq!(screening.rejections.len(), 1);
        assert_eq!(screening.rejections[0].file_name(), "big.png");
    }

    #[test]
    fn remove_at_out_of_range_is_none() {
        let mut staged = StagedAttachmentSet::default();
        staged.push(Attachment::new("a.jpg", "image/jpeg", vec![1]));

        assert!(staged.remove_at(1).is_none());
        assert_eq!(staged.len(), 1);
        assert_eq!(staged.remove_at(0).map(|item| item.name), Some("a.jpg".to_string()));
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn from_path_reads_size_and_guesses_mime() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("garden.png");
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(&[9u8; 42]).expect("write");

        let selected = SelectedFile::from_path(&path).await.expect("metadata");
        assert_eq!(selected.name, "garden.png");
        assert_eq!(selected.mime_type, "image/png");
        assert_eq!(selected.size_bytes, 42);

        let attachment = selected.read().await.expect("read");
        assert_eq!(attachment.content().len(), 42);
    }

    #[tokio::test]
    async fn unreadable_file_is_a_rejection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.jpg");
        std::fs::write(&path, b"jpeg").expect("write");
        let selected = SelectedFile::from_path(&path).await.expect("metadata");
        std::fs::remove_file(&path).expect("remove");

        let rejection = selected.read().await.expect_err("missing file should not read");
        assert!(matches!(
            rejection,
            IntakeRejection::Unreadable { ref name, .. } if name == "gone.jpg"
        ));
        assert_eq!(rejection.to_string(), "Failed to read file: gone.jpg");
    }
}
