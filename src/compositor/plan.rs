use rand::Rng;

use crate::{
    assets::fonts::FontRole,
    compositor::layout::{GridSpec, PageLayout},
    foundation::core::{Affine, Label, Rect, Rgba8, Vec2},
    foundation::error::{AlbumError, AlbumResult},
};

/// Text drawn centered on a point.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOp {
    pub text: String,
    pub role: FontRole,
    pub size_px: f32,
    pub color: Rgba8,
    /// Page-space transform of the text's local frame.
    pub transform: Affine,
    /// Local point the laid-out block is centered on.
    pub center: Vec2,
}

/// Soft shadow approximated by stacked translucent rectangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowOp {
    pub rect: Rect,
    pub color: Rgba8,
    /// How far the outermost layer extends past `rect`.
    pub spread: f64,
}

/// One framed print. All rectangles are in the cell's local frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CellOp {
    /// Row-major grid slot.
    pub index: usize,
    pub label: Label,
    /// Index into the decoded image list handed to the renderer.
    pub image: usize,
    /// Cell center translation followed by the print's rotation.
    pub transform: Affine,
    pub rotation_deg: f64,
    pub shadow: ShadowOp,
    pub frame: Rect,
    pub frame_color: Rgba8,
    /// Destination square for the photo.
    pub photo: Rect,
    /// Source-pixel region cropped from the image.
    pub crop: Rect,
    pub caption: Option<TextOp>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PageOp {
    Title(TextOp),
    Cell(CellOp),
}

/// Everything needed to draw one page, without pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PagePlan {
    pub width: u32,
    pub height: u32,
    pub background: Rgba8,
    pub grid: GridSpec,
    pub ops: Vec<PageOp>,
}

impl PagePlan {
    pub fn cells(&self) -> impl Iterator<Item = &CellOp> {
        self.ops.iter().filter_map(|op| match op {
            PageOp::Cell(c) => Some(c),
            PageOp::Title(_) => None,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.cells().count()
    }

    pub fn has_text(&self) -> bool {
        self.ops.iter().any(|op| match op {
            PageOp::Title(_) => true,
            PageOp::Cell(c) => c.caption.is_some(),
        })
    }

    /// Same page with the title and every caption removed.
    pub fn without_text(mut self) -> Self {
        self.ops.retain(|op| !matches!(op, PageOp::Title(_)));
        for op in &mut self.ops {
            if let PageOp::Cell(cell) = op {
                cell.caption = None;
            }
        }
        self
    }
}

/// Source dimensions of one decoded image, in input order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDims {
    pub width: u32,
    pub height: u32,
}

impl ImageDims {
    fn square_crop(self) -> Rect {
        let side = f64::from(self.width.min(self.height));
        let x0 = (f64::from(self.width) - side) / 2.0;
        let y0 = (f64::from(self.height) - side) / 2.0;
        Rect::new(x0, y0, x0 + side, y0 + side)
    }
}

/// Lay out `entries` on a page. Cells follow input order; each rotation is drawn from `rng`.
pub fn plan_page<R>(
    layout: &PageLayout,
    entries: &[(Label, ImageDims)],
    rng: &mut R,
) -> AlbumResult<PagePlan>
where
    R: Rng + ?Sized,
{
    if entries.is_empty() {
        return Err(AlbumError::validation(
            "cannot compose a page from an empty image mapping",
        ));
    }
    layout.validate()?;

    let grid = layout.grid_for(entries.len());
    let (cell_w, cell_h) = layout.cell_size(grid);
    if cell_w <= 0.0 || cell_h <= 0.0 {
        return Err(AlbumError::validation(format!(
            "page {}x{} leaves no room for a {}x{} grid",
            layout.width, layout.height, grid.cols, grid.rows
        )));
    }
    let print = layout.print_geometry(grid);

    let mut ops = Vec::with_capacity(entries.len() + 1);
    if !layout.title.is_empty() {
        ops.push(PageOp::Title(TextOp {
            text: layout.title.clone(),
            role: FontRole::Display,
            size_px: layout.title_size_px,
            color: layout.title_color,
            transform: Affine::IDENTITY,
            center: Vec2::new(f64::from(layout.width) / 2.0, layout.title_center_y),
        }));
    }

    for (index, (label, dims)) in entries.iter().enumerate() {
        if dims.width == 0 || dims.height == 0 {
            return Err(AlbumError::validation(format!(
                "image for '{label}' has zero area"
            )));
        }
        let center = layout.cell_rect(grid, index).center();
        let rotation_deg = if layout.max_rotation_deg > 0.0 {
            rng.random_range(-layout.max_rotation_deg..=layout.max_rotation_deg)
        } else {
            0.0
        };
        let transform =
            Affine::translate(center.to_vec2()) * Affine::rotate(rotation_deg.to_radians());

        ops.push(PageOp::Cell(CellOp {
            index,
            label: label.clone(),
            image: index,
            transform,
            rotation_deg,
            shadow: ShadowOp {
                rect: print
                    .frame
                    .with_origin((print.frame.x0, print.frame.y0 + layout.shadow_offset)),
                color: layout.shadow_color,
                spread: layout.shadow_blur,
            },
            frame: print.frame,
            frame_color: layout.frame_color,
            photo: print.photo,
            crop: dims.square_crop(),
            caption: Some(TextOp {
                text: label.to_string(),
                role: FontRole::Caption,
                size_px: layout.caption_size_px,
                color: layout.caption_color,
                transform,
                center: Vec2::new(0.0, print.caption_center_y),
            }),
        }));
    }

    tracing::debug!(
        cells = entries.len(),
        cols = grid.cols,
        rows = grid.rows,
        "page planned"
    );
    Ok(PagePlan {
        width: layout.width,
        height: layout.height,
        background: layout.background,
        grid,
        ops,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/plan.rs"]
mod tests;
