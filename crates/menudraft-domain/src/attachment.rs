//! Attachment metadata as seen by the extraction pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an uploaded attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(uuid::Uuid);

impl AttachmentId {
    /// Generate a new AttachmentId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse an AttachmentId from its string form
    pub fn parse(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| format!("Invalid attachment id '{}': {}", s, e))
    }
}

impl Default for AttachmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata of an uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment identifier
    pub id: AttachmentId,
    /// Owning organization
    pub org_id: String,
    /// Opaque location understood by the attachment repository
    pub storage_location: String,
    /// MIME type recorded at upload
    pub mime_type: String,
    /// File name as uploaded
    pub original_name: String,
}

impl Attachment {
    /// Whether the content is plain text (any `text/*` type)
    pub fn is_text(&self) -> bool {
        self.mime_type
            .split(';')
            .next()
            .map(|essence| essence.trim().to_ascii_lowercase().starts_with("text/"))
            .unwrap_or(false)
    }
}
