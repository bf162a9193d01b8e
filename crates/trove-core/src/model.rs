use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Maximum body length carried on a payload snapshot, in characters.
const EXCERPT_CHARS: usize = 280;

/// Where a stored document originally came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Email,
    Pdf,
    Transcript,
    Note,
    /// A sub-document unit indexed separately for finer-grained semantic
    /// search, tagged with a parent document id.
    DocumentChunk,
    Other,
}

impl SourceType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Pdf => "pdf",
            Self::Transcript => "transcript",
            Self::Note => "note",
            Self::DocumentChunk => "document_chunk",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for SourceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "pdf" => Ok(Self::Pdf),
            "transcript" => Ok(Self::Transcript),
            "note" => Ok(Self::Note),
            "document_chunk" => Ok(Self::DocumentChunk),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "source type",
                got: s.to_string(),
            }),
        }
    }
}

/// A stored document (or sub-document chunk) as the content store returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub id: String,
    pub source_type: SourceType,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Parent document id for chunk rows.
    pub parent_id: Option<String>,
    /// Position of this chunk within its parent.
    pub chunk_index: Option<u32>,
    /// Ingestion-time quality estimate in `[0, 1]`.
    pub quality_score: f32,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            id: String::new(),
            source_type: SourceType::Other,
            title: String::new(),
            body: String::new(),
            created_at: DateTime::UNIX_EPOCH,
            parent_id: None,
            chunk_index: None,
            quality_score: 1.0,
        }
    }
}

/// Two-field form of the `"{parent_id}:{chunk_index}"` composite chunk id.
///
/// The single-string convention is what crosses the storage boundary; this
/// struct is the structured view used internally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    pub parent_id: String,
    pub chunk_index: Option<u32>,
}

impl ChunkRef {
    /// Parse the composite form. An id without the delimiter, or whose
    /// suffix is not a number, is treated as its own parent rather than an
    /// error.
    ///
    /// The split is on the *last* colon, so parent ids containing colons
    /// still resolve (`"email:123:4"` → parent `"email:123"`, chunk `4`).
    #[must_use]
    pub fn parse(id: &str) -> Self {
        match id.rsplit_once(':') {
            Some((parent, index)) if !parent.is_empty() => match index.parse::<u32>() {
                Ok(n) => Self {
                    parent_id: parent.to_string(),
                    chunk_index: Some(n),
                },
                Err(_) => Self::whole(id),
            },
            _ => Self::whole(id),
        }
    }

    fn whole(id: &str) -> Self {
        Self {
            parent_id: id.to_string(),
            chunk_index: None,
        }
    }
}

/// Payload snapshot carried on hits and fused results.
///
/// A snapshot is a plain record for presentation layers; fields the backend
/// did not supply stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSnapshot {
    pub source_type: SourceType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,
}

impl DocSnapshot {
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        Self {
            source_type: doc.source_type,
            title: doc.title.clone(),
            excerpt: excerpt(&doc.body),
            quality_score: Some(doc.quality_score),
        }
    }
}

fn excerpt(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(EXCERPT_CHARS).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
