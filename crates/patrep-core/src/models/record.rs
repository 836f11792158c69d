//! Extracted text lines and the document references they carry.

use std::path::Path;
use std::sync::Arc;

/// Confidence score attached to every line read from native PDF text.
pub const NATIVE_TEXT_SCORE: u8 = 100;

/// Reference to a source document.
///
/// Ordering and equality follow the canonical URI first, so two references
/// to the same file always group together regardless of label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceRef {
    /// Canonical `file://` URI of the document.
    pub uri: String,
    /// Human-readable label (file name without extension).
    pub label: String,
}

impl SourceRef {
    /// Create a reference from an already canonical path.
    pub fn from_canonical(path: &Path) -> Self {
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            uri: file_uri(path),
            label,
        }
    }

    /// Resolve `path` to its canonical location and build a reference.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let canonical = path.canonicalize()?;
        Ok(Self::from_canonical(&canonical))
    }

    /// Link that opens the document directly at `page`.
    pub fn deep_link(&self, page: u32) -> String {
        format!("{}#page={}", self.uri, page)
    }
}

/// Build a percent-encoded `file://` URI for an absolute path.
pub fn file_uri(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let raw = raw.strip_prefix(r"\\?\").unwrap_or(&raw).replace('\\', "/");

    let encoded = raw
        .split('/')
        .map(|segment| {
            // Keep Windows drive letters ("C:") readable.
            if segment.len() == 2 && segment.ends_with(':') {
                segment.to_string()
            } else {
                urlencoding::encode(segment).into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

/// Axis-aligned rectangle with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box from two corners in any order.
    pub fn new(xa: f32, ya: f32, xb: f32, yb: f32) -> Self {
        Self {
            x1: xa.min(xb),
            y1: ya.min(yb),
            x2: xa.max(xb),
            y2: ya.max(yb),
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// One extracted line of text with its page location.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLineRecord {
    /// Document the line was read from.
    pub source: Arc<SourceRef>,
    /// Page number (1-indexed).
    pub page: u32,
    /// Sanitized line text.
    pub text: String,
    /// Line bounding box.
    pub bbox: BoundingBox,
    /// Extraction confidence, always [`NATIVE_TEXT_SCORE`] for native text.
    pub score: u8,
}

impl TextLineRecord {
    /// Create a record for a natively extracted line.
    pub fn new(source: Arc<SourceRef>, page: u32, text: String, bbox: BoundingBox) -> Self {
        Self {
            source,
            page,
            text,
            bbox,
            score: NATIVE_TEXT_SCORE,
        }
    }

    /// Link to the page this line was found on.
    pub fn deep_link(&self) -> String {
        self.source.deep_link(self.page)
    }
}
