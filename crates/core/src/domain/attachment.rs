use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// De-duplication identity of a staged file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentKey {
    pub name: String,
    pub size_bytes: u64,
}

/// A file read into memory and staged for a quote request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    content: Arc<[u8]>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        let size_bytes = content.len() as u64;
        Self { name: name.into(), mime_type: mime_type.into(), size_bytes, content: content.into() }
    }

    pub fn key(&self) -> AttachmentKey {
        AttachmentKey { name: self.name.clone(), size_bytes: self.size_bytes }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.content)
    }

    pub fn estimated_kb(&self) -> u64 {
        estimated_kb(base64_len(self.content.len()))
    }
}

/// Padded base64 length for `raw_len` input bytes.
pub fn base64_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}

/// Rendered size estimate in KB, derived from an encoded base64 length.
pub fn estimated_kb(base64_len: usize) -> u64 {
    (base64_len as f64 * 0.75 / 1024.0).round() as u64
}
