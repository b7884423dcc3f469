use std::sync::Arc;

use crate::{
    assets::decode::DecodedImage,
    assets::fonts::{FontBook, FontRole},
    compositor::plan::{CellOp, PageOp, PagePlan, ShadowOp, TextOp},
    compositor::text::TextLayoutEngine,
    foundation::core::{Affine, Rect, Rgba8},
    foundation::error::{AlbumError, AlbumResult},
};

const SHADOW_LAYERS: u32 = 6;

/// Rendered page pixels.
#[derive(Clone, Debug)]
pub struct PageRGBA {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA8, row-major.
    pub data: Vec<u8>,
}

/// Rasterizes a [`PagePlan`] on the CPU with `vello_cpu`.
///
/// Every call owns its own surface; nothing is shared between pages.
pub struct CpuPageRenderer<'a> {
    fonts: Option<&'a FontBook>,
}

impl<'a> CpuPageRenderer<'a> {
    pub fn new(fonts: &'a FontBook) -> Self {
        Self { fonts: Some(fonts) }
    }

    /// Renderer for plans that carry no text.
    pub fn without_fonts() -> Self {
        Self { fonts: None }
    }

    #[tracing::instrument(skip_all, fields(width = plan.width, height = plan.height, cells = plan.cell_count()))]
    pub fn render(&self, plan: &PagePlan, images: &[DecodedImage]) -> AlbumResult<PageRGBA> {
        let width_u16: u16 = plan
            .width
            .try_into()
            .map_err(|_| AlbumError::environment("page width exceeds the rasterizer limit"))?;
        let height_u16: u16 = plan
            .height
            .try_into()
            .map_err(|_| AlbumError::environment("page height exceeds the rasterizer limit"))?;

        let mut text = match (self.fonts, plan.has_text()) {
            (Some(fonts), true) => Some(TextFonts::new(fonts)?),
            (None, true) => {
                return Err(AlbumError::font_unavailable(
                    "page has text but no fonts were provided",
                ));
            }
            (_, false) => None,
        };

        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);

        // `render_to_pixmap` overwrites the whole buffer; the background must be a fill.
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        set_solid_paint(&mut ctx, plan.background);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(plan.width),
            f64::from(plan.height),
        ));

        for op in &plan.ops {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            match op {
                PageOp::Title(t) => {
                    let text = text.as_mut().ok_or_else(|| {
                        AlbumError::font_unavailable("title requires a display font")
                    })?;
                    draw_text(&mut ctx, text, t)?;
                }
                PageOp::Cell(cell) => {
                    let image = images.get(cell.image).ok_or_else(|| {
                        AlbumError::validation(format!(
                            "cell {} refers to missing image {}",
                            cell.index, cell.image
                        ))
                    })?;
                    draw_cell(&mut ctx, cell, image)?;
                    if let Some(caption) = &cell.caption {
                        let text = text.as_mut().ok_or_else(|| {
                            AlbumError::font_unavailable("captions require a caption font")
                        })?;
                        draw_text(&mut ctx, text, caption)?;
                    }
                }
            }
        }
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(PageRGBA {
            width: plan.width,
            height: plan.height,
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }
}

/// Shaping engine plus the glyph-rendering handle of each face.
struct TextFonts {
    engine: TextLayoutEngine,
    display: vello_cpu::peniko::FontData,
    caption: vello_cpu::peniko::FontData,
}

impl TextFonts {
    fn new(fonts: &FontBook) -> AlbumResult<Self> {
        let font_data = |role: FontRole| {
            let f = fonts.get(role);
            vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(f.bytes.as_ref().clone()),
                f.index,
            )
        };
        Ok(Self {
            engine: TextLayoutEngine::new(fonts)?,
            display: font_data(FontRole::Display),
            caption: font_data(FontRole::Caption),
        })
    }

    fn face(&self, role: FontRole) -> &vello_cpu::peniko::FontData {
        match role {
            FontRole::Display => &self.display,
            FontRole::Caption => &self.caption,
        }
    }
}

fn draw_cell(
    ctx: &mut vello_cpu::RenderContext,
    cell: &CellOp,
    image: &DecodedImage,
) -> AlbumResult<()> {
    ctx.set_transform(affine_to_cpu(cell.transform));
    draw_shadow(ctx, &cell.shadow);

    set_solid_paint(ctx, cell.frame_color);
    ctx.fill_rect(&rect_to_cpu(cell.frame));

    let crop = cell.crop;
    if crop.width() <= 0.0 || crop.height() <= 0.0 {
        return Err(AlbumError::validation(format!(
            "empty crop for '{}'",
            cell.label
        )));
    }
    let pixmap = image_premul_bytes_to_pixmap(&image.rgba8_premul, image.width, image.height)?;
    let sx = cell.photo.width() / crop.width();
    let sy = cell.photo.height() / crop.height();
    let image_transform = cell.transform
        * Affine::translate((cell.photo.x0, cell.photo.y0))
        * Affine::scale_non_uniform(sx, sy)
        * Affine::translate((-crop.x0, -crop.y0));

    ctx.set_transform(affine_to_cpu(image_transform));
    ctx.set_paint(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    });
    ctx.fill_rect(&rect_to_cpu(crop));
    Ok(())
}

fn draw_shadow(ctx: &mut vello_cpu::RenderContext, shadow: &ShadowOp) {
    if shadow.color.a == 0 {
        return;
    }
    // Nested layers build up density toward the center.
    let layer_alpha = (u32::from(shadow.color.a) / SHADOW_LAYERS).max(1) as u8;
    let color = Rgba8::new(shadow.color.r, shadow.color.g, shadow.color.b, layer_alpha);
    set_solid_paint(ctx, color);
    for k in (1..=SHADOW_LAYERS).rev() {
        let grow = shadow.spread * f64::from(k) / f64::from(SHADOW_LAYERS);
        ctx.fill_rect(&rect_to_cpu(shadow.rect.inflate(grow, grow)));
    }
}

fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    fonts: &mut TextFonts,
    op: &TextOp,
) -> AlbumResult<()> {
    let layout = fonts
        .engine
        .layout_line(&op.text, op.role, op.size_px, op.color)?;
    let origin = (
        op.center.x - f64::from(layout.width()) / 2.0,
        op.center.y - f64::from(layout.height()) / 2.0,
    );
    ctx.set_transform(affine_to_cpu(op.transform * Affine::translate(origin)));

    let font = fonts.face(op.role);
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            set_solid_paint(ctx, run.style().brush.0);
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    Ok(())
}

fn set_solid_paint(ctx: &mut vello_cpu::RenderContext, c: Rgba8) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> AlbumResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| AlbumError::environment("image width exceeds the rasterizer limit"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| AlbumError::environment("image height exceeds the rasterizer limit"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(AlbumError::validation("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/cpu.rs"]
mod tests;
