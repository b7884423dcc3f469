use crate::{
    foundation::core::{Rect, Rgba8},
    foundation::error::{AlbumError, AlbumResult},
};

/// Geometry and styling of the album page. All lengths are in output pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub width: u32,
    pub height: u32,
    pub background: Rgba8,

    pub title: String,
    pub title_size_px: f32,
    /// Vertical center of the title line.
    pub title_center_y: f64,
    pub title_color: Rgba8,

    /// Space reserved above the grid for the title.
    pub top_margin: f64,
    /// Gap between cells and around the grid.
    pub padding: f64,
    pub columns: u32,
    /// Rows used while the images fit; more rows are added beyond `columns * min_rows`.
    pub min_rows: u32,

    /// Frame width as a fraction of the cell width.
    pub frame_width_ratio: f64,
    /// Frame height divided by frame width.
    pub frame_aspect: f64,
    pub frame_color: Rgba8,
    /// Margin between the frame edge and the photo.
    pub image_inset: f64,

    pub caption_size_px: f32,
    pub caption_color: Rgba8,

    /// Rotation of each print is drawn uniformly from `[-max, max]` degrees.
    pub max_rotation_deg: f64,

    pub shadow_offset: f64,
    pub shadow_blur: f64,
    pub shadow_color: Rgba8,

    /// JPEG quality in `(0, 1]`.
    pub jpeg_quality: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width: 2480,
            height: 3508,
            background: Rgba8::opaque(0xfd, 0xf5, 0xe6),
            title: "Through the Decades".to_string(),
            title_size_px: 100.0,
            title_center_y: 150.0,
            title_color: Rgba8::opaque(0x33, 0x33, 0x33),
            top_margin: 300.0,
            padding: 100.0,
            columns: 2,
            min_rows: 3,
            frame_width_ratio: 0.8,
            frame_aspect: 1.2,
            frame_color: Rgba8::opaque(0xff, 0xff, 0xff),
            image_inset: 40.0,
            caption_size_px: 60.0,
            caption_color: Rgba8::opaque(0x33, 0x33, 0x33),
            max_rotation_deg: 2.0,
            shadow_offset: 10.0,
            shadow_blur: 35.0,
            shadow_color: Rgba8::new(0, 0, 0, 90),
            jpeg_quality: 0.92,
        }
    }
}

impl PageLayout {
    pub fn validate(&self) -> AlbumResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AlbumError::validation("page width/height must be > 0"));
        }
        if self.columns == 0 || self.min_rows == 0 {
            return Err(AlbumError::validation("grid columns/min_rows must be > 0"));
        }
        for (name, v) in [
            ("top_margin", self.top_margin),
            ("padding", self.padding),
            ("image_inset", self.image_inset),
            ("shadow_offset", self.shadow_offset),
            ("shadow_blur", self.shadow_blur),
            ("max_rotation_deg", self.max_rotation_deg),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(AlbumError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if !(self.frame_width_ratio > 0.0 && self.frame_width_ratio <= 1.0) {
            return Err(AlbumError::validation("frame_width_ratio must be in (0, 1]"));
        }
        if !self.frame_aspect.is_finite() || self.frame_aspect < 1.0 {
            return Err(AlbumError::validation("frame_aspect must be finite and >= 1"));
        }
        for (name, v) in [
            ("title_size_px", self.title_size_px),
            ("caption_size_px", self.caption_size_px),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(AlbumError::validation(format!("{name} must be finite and > 0")));
            }
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(AlbumError::validation("jpeg_quality must be in (0, 1]"));
        }
        Ok(())
    }

    /// Quality on the encoder's 1..=100 scale.
    pub fn jpeg_quality_percent(&self) -> u8 {
        ((self.jpeg_quality * 100.0).round() as i32).clamp(1, 100) as u8
    }

    /// Grid for `count` images: the reference `columns x min_rows` slots while they fit,
    /// otherwise enough rows to hold every image.
    pub fn grid_for(&self, count: usize) -> GridSpec {
        let cols = self.columns.max(1);
        let needed_rows = count.div_ceil(cols as usize) as u32;
        GridSpec {
            cols,
            rows: needed_rows.max(self.min_rows),
        }
    }

    pub fn cell_size(&self, grid: GridSpec) -> (f64, f64) {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let cols = f64::from(grid.cols);
        let rows = f64::from(grid.rows);
        let cell_w = (w - self.padding * (cols + 1.0)) / cols;
        let cell_h = (h - self.top_margin - self.padding * (rows + 1.0)) / rows;
        (cell_w, cell_h)
    }

    /// Page-space rectangle of cell `index` (row-major).
    pub fn cell_rect(&self, grid: GridSpec, index: usize) -> Rect {
        let (cell_w, cell_h) = self.cell_size(grid);
        let row = (index / grid.cols as usize) as f64;
        let col = (index % grid.cols as usize) as f64;
        let x0 = self.padding + col * (cell_w + self.padding);
        let y0 = self.top_margin + self.padding + row * (cell_h + self.padding);
        Rect::new(x0, y0, x0 + cell_w, y0 + cell_h)
    }

    /// Frame, photo and caption boxes for a cell, in the cell's local frame
    /// (origin at the cell center, before rotation).
    ///
    /// The frame is sized from the cell width only, so it may be taller than the
    /// cell. With the default page the frame is about 1046px against a 1036px row
    /// pitch: vertically adjacent prints overlap slightly, like prints laid on a table.
    pub fn print_geometry(&self, grid: GridSpec) -> PrintGeometry {
        let (cell_w, _) = self.cell_size(grid);
        let frame_w = cell_w * self.frame_width_ratio;
        let frame_h = frame_w * self.frame_aspect;
        let frame = Rect::new(-frame_w / 2.0, -frame_h / 2.0, frame_w / 2.0, frame_h / 2.0);

        let side = (frame_w - 2.0 * self.image_inset).max(1.0);
        let photo = Rect::new(
            frame.x0 + self.image_inset,
            frame.y0 + self.image_inset,
            frame.x0 + self.image_inset + side,
            frame.y0 + self.image_inset + side,
        );
        let caption_center_y = photo.y1 + (frame.y1 - photo.y1) / 2.0;

        PrintGeometry {
            frame,
            photo,
            caption_center_y,
        }
    }
}

/// Columns and rows of the cell grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    pub cols: u32,
    pub rows: u32,
}

impl GridSpec {
    pub fn capacity(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Boxes of one print in its local frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrintGeometry {
    pub frame: Rect,
    /// Square photo area inside the frame.
    pub photo: Rect,
    /// Vertical center of the caption, between photo and frame bottom.
    pub caption_center_y: f64,
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/layout.rs"]
mod tests;
