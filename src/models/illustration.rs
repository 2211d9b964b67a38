use serde::Serialize;

/// Where a page's picture comes from.
///
/// Exactly one source is chosen when the illustration is built, so the
/// "both present" and "both absent" cases never reach rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IllustrationSource {
    /// Raster bytes embedded in the book payload.
    Inline(Vec<u8>),
    /// File id served by the backend image endpoint.
    Remote(String),
    /// No picture; the caption is shown on its own.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Illustration {
    source: IllustrationSource,
    caption: String,
}

impl Illustration {
    /// Picks the source in fixed priority: inline data, then remote id, then
    /// the caption alone. Empty values count as absent.
    pub fn from_sources(
        inline: Option<Vec<u8>>,
        remote: Option<String>,
        caption: impl Into<String>,
    ) -> Self {
        let source = match (inline, remote) {
            (Some(bytes), _) if !bytes.is_empty() => IllustrationSource::Inline(bytes),
            (_, Some(id)) if !id.trim().is_empty() => IllustrationSource::Remote(id.trim().to_string()),
            _ => IllustrationSource::Fallback,
        };

        Self {
            source,
            caption: caption.into(),
        }
    }

    pub fn fallback(caption: impl Into<String>) -> Self {
        Self::from_sources(None, None, caption)
    }

    pub fn source(&self) -> &IllustrationSource {
        &self.source
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn has_image(&self) -> bool {
        !matches!(self.source, IllustrationSource::Fallback)
    }
}
