use std::{fmt, path::PathBuf, sync::Arc};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Identifier of one requested stylistic variant (a "decade"). Opaque to the core.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Straight (non-premultiplied) RGBA8 color as written in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn premultiplied(self) -> [u8; 4] {
        let af = (self.a as u16) + 1;
        let premul = |c: u8| -> u8 { (((c as u16) * af) >> 8) as u8 };
        [premul(self.r), premul(self.g), premul(self.b), self.a]
    }
}

/// Handle to image bytes that are not necessarily decoded yet.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded image bytes held in memory (generated results end up here).
    Bytes(Arc<[u8]>),
    /// Encoded image file on disk.
    Path(PathBuf),
    /// Encoded image fetched over HTTP(S).
    Url(String),
}

/// Reference to a generated image, as returned by the generation call.
pub type ImageRef = ImageSource;

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Arc::from(bytes.into()))
    }

    /// Human-readable reference used in logs and errors. Never contains raw bytes.
    pub fn reference(&self) -> String {
        match self {
            Self::Bytes(b) => format!("<{} bytes in memory>", b.len()),
            Self::Path(p) => p.display().to_string(),
            Self::Url(u) => u.clone(),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Self::Url(u) => f.debug_tuple("Url").field(u).finish(),
        }
    }
}

/// Ordered `label -> value` map. Keys keep first-insertion order; replacing a
/// value keeps the key's position.
pub type LabelMap<V> = indexmap::IndexMap<Label, V>;

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
