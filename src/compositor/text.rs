use std::collections::HashMap;

use crate::{
    assets::fonts::{FontBook, FontRole, LoadedFont},
    foundation::core::Rgba8,
    foundation::error::{AlbumError, AlbumResult},
};

/// Brush carried through parley layouts; the straight color of a glyph run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBrush(pub Rgba8);

impl Default for TextBrush {
    fn default() -> Self {
        Self(Rgba8::opaque(0, 0, 0))
    }
}

/// Shapes single-line page text with the faces of a [`FontBook`].
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrush>,
    families: HashMap<FontRole, String>,
}

impl TextLayoutEngine {
    /// Register both faces of `fonts`. Fails when a face carries no usable family.
    pub fn new(fonts: &FontBook) -> AlbumResult<Self> {
        let mut engine = Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        };
        for role in [FontRole::Display, FontRole::Caption] {
            let family = engine.register(fonts.get(role))?;
            engine.families.insert(role, family);
        }
        Ok(engine)
    }

    fn register(&mut self, font: &LoadedFont) -> AlbumResult<String> {
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            AlbumError::font_unavailable(format!(
                "no font families registered from '{}'",
                font.family
            ))
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| {
                AlbumError::font_unavailable(format!(
                    "registered font '{}' has no family name",
                    font.family
                ))
            })?
            .to_string();
        Ok(name)
    }

    /// Family name parley resolved for `role`.
    pub fn family_name(&self, role: FontRole) -> Option<&str> {
        self.families.get(&role).map(String::as_str)
    }

    /// Shape `text` on a single unbounded line.
    pub fn layout_line(
        &mut self,
        text: &str,
        role: FontRole,
        size_px: f32,
        color: Rgba8,
    ) -> AlbumResult<parley::Layout<TextBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(AlbumError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family = self
            .families
            .get(&role)
            .cloned()
            .ok_or_else(|| AlbumError::font_unavailable(format!("no face for {role:?}")))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrush(color)));

        let mut layout: parley::Layout<TextBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/text.rs"]
mod tests;
