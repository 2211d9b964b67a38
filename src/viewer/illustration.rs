use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::models::{Illustration, IllustrationSource};

/// Render-ready form of an illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedIllustration {
    /// Embedded `data:` URI, no network needed.
    Embedded { src: String, alt: String },
    /// Fetched from the image endpoint by the browser.
    Fetched { src: String, alt: String },
    /// Caption block only; no image element.
    Caption { text: String },
}

impl ResolvedIllustration {
    pub fn image_src(&self) -> Option<&str> {
        match self {
            ResolvedIllustration::Embedded { src, .. } | ResolvedIllustration::Fetched { src, .. } => {
                Some(src.as_str())
            }
            ResolvedIllustration::Caption { .. } => None,
        }
    }

    pub fn alt(&self) -> &str {
        match self {
            ResolvedIllustration::Embedded { alt, .. } | ResolvedIllustration::Fetched { alt, .. } => alt,
            ResolvedIllustration::Caption { text } => text,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            ResolvedIllustration::Caption { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

/// Turns an illustration into what the page shows.
pub fn resolve(illustration: &Illustration, images_base: &str) -> ResolvedIllustration {
    let alt = illustration.caption().to_string();
    match illustration.source() {
        IllustrationSource::Inline(bytes) => ResolvedIllustration::Embedded {
            src: data_uri(bytes),
            alt,
        },
        IllustrationSource::Remote(file_id) => ResolvedIllustration::Fetched {
            src: image_url(images_base, file_id),
            alt,
        },
        IllustrationSource::Fallback => ResolvedIllustration::Caption { text: alt },
    }
}

pub fn image_url(images_base: &str, file_id: &str) -> String {
    format!("{}/{}", images_base.trim_end_matches('/'), file_id)
}

pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

/// Image type from magic bytes. The generator emits PNG, so that is the default.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}

/// Decodes a base64 payload from the backend. Invalid data counts as absent.
pub fn decode_inline(payload: &str) -> Option<Vec<u8>> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return None;
    }

    let encoded = trimmed
        .split_once(";base64,")
        .map_or(trimmed, |(_, data)| data);

    match STANDARD.decode(encoded) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Ignoring undecodable inline illustration: {}", e);
            None
        }
    }
}
