use std::{path::PathBuf, sync::Arc};

use crate::foundation::error::{AlbumError, AlbumResult};

/// Where to find a font: an explicit file, or a family name looked up in system fonts.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl FontSpec {
    pub fn family(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            path: None,
        }
    }

    pub fn file(family: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            family: family.into(),
            path: Some(path.into()),
        }
    }
}

/// Font bytes resolved and ready for shaping and glyph rendering.
#[derive(Clone)]
pub struct LoadedFont {
    /// Family name requested (or detected) for this face.
    pub family: String,
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside a collection file.
    pub index: u32,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("family", &self.family)
            .field("bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .finish()
    }
}

/// Which face a piece of page text is set in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FontRole {
    /// Page title.
    Display,
    /// Per-cell label caption.
    Caption,
}

/// The two faces a page needs. Building one is the "fonts are ready" barrier:
/// no text is drawn before a [`FontBook`] exists.
#[derive(Clone, Debug)]
pub struct FontBook {
    pub display: LoadedFont,
    pub caption: LoadedFont,
}

impl FontBook {
    /// Resolve both faces. A face that cannot be found fails with
    /// [`AlbumError::FontUnavailable`]; there is no fallback face.
    #[tracing::instrument(skip_all)]
    pub async fn load(display: &FontSpec, caption: &FontSpec) -> AlbumResult<Self> {
        let (display, caption) =
            futures::future::try_join(resolve_font(display), resolve_font(caption)).await?;
        Ok(Self { display, caption })
    }

    pub fn from_fonts(display: LoadedFont, caption: LoadedFont) -> Self {
        Self { display, caption }
    }

    pub fn get(&self, role: FontRole) -> &LoadedFont {
        match role {
            FontRole::Display => &self.display,
            FontRole::Caption => &self.caption,
        }
    }
}

async fn resolve_font(spec: &FontSpec) -> AlbumResult<LoadedFont> {
    if let Some(path) = &spec.path {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AlbumError::font_unavailable(format!(
                "read font '{}' from '{}': {e}",
                spec.family,
                path.display()
            ))
        })?;
        if bytes.is_empty() {
            return Err(AlbumError::font_unavailable(format!(
                "font file '{}' is empty",
                path.display()
            )));
        }
        return Ok(LoadedFont {
            family: spec.family.clone(),
            bytes: Arc::new(bytes),
            index: 0,
        });
    }

    let family = spec.family.clone();
    tokio::task::spawn_blocking(move || query_system_font(&family))
        .await
        .map_err(|e| AlbumError::font_unavailable(format!("font lookup task failed: {e}")))?
}

fn query_system_font(family: &str) -> AlbumResult<LoadedFont> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    let families = [system_family(family)];
    let query = usvg::fontdb::Query {
        families: &families,
        weight: usvg::fontdb::Weight::NORMAL,
        stretch: usvg::fontdb::Stretch::Normal,
        style: usvg::fontdb::Style::Normal,
    };

    let id = db.query(&query).ok_or_else(|| {
        AlbumError::font_unavailable(format!("no system font matches family '{family}'"))
    })?;
    let (bytes, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| {
            AlbumError::font_unavailable(format!("font data for '{family}' is unreadable"))
        })?;

    tracing::debug!(family, bytes = bytes.len(), index, "resolved system font");
    Ok(LoadedFont {
        family: family.to_string(),
        bytes: Arc::new(bytes),
        index,
    })
}

fn system_family(name: &str) -> usvg::fontdb::Family<'_> {
    match name {
        "serif" => usvg::fontdb::Family::Serif,
        "sans-serif" => usvg::fontdb::Family::SansSerif,
        "cursive" => usvg::fontdb::Family::Cursive,
        "fantasy" => usvg::fontdb::Family::Fantasy,
        "monospace" => usvg::fontdb::Family::Monospace,
        other => usvg::fontdb::Family::Name(other),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
