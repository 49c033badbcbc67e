//! # Thumbnail Grid Layout
//!
//! Pure math for column-wrapped media grids: how many columns fit the
//! available width, how many rows a count of cells needs, and how much
//! vertical space the whole block reserves. The caller uses `height()` to
//! request flow space *before* drawing, so a grid is never split across a
//! page boundary.

/// Box constraints for one grid cell plus inter-cell spacing.
#[derive(Debug, Clone, Copy)]
pub struct CellSpec {
    pub max_width: f64,
    pub max_height: f64,
    pub gap: f64,
    pub top_pad: f64,
    pub bottom_pad: f64,
}

/// A resolved grid: column/row counts and concrete cell width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: usize,
    pub rows: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub gap: f64,
    pub top_pad: f64,
    pub bottom_pad: f64,
}

impl GridLayout {
    /// Total vertical space the grid reserves, padding included.
    pub fn height(&self) -> f64 {
        self.top_pad
            + self.rows as f64 * self.cell_height
            + (self.rows.saturating_sub(1)) as f64 * self.gap
            + self.bottom_pad
    }

    /// Top-left x of the cell at `index`, relative to the grid origin.
    pub fn cell_x(&self, index: usize) -> f64 {
        let col = index % self.columns;
        col as f64 * (self.cell_width + self.gap)
    }

    /// Vertical offset of the cell's row below the grid's top edge.
    pub fn cell_y_offset(&self, index: usize) -> f64 {
        let row = index / self.columns;
        row as f64 * (self.cell_height + self.gap)
    }
}

/// Lay out `count` cells into a column-wrapped grid within `max_width`.
///
/// Columns never drop below 1, even when `max_width` is narrower than a
/// single cell. Cell width shrinks below `spec.max_width` when dividing the
/// available width evenly across columns yields less.
pub fn grid_layout(count: usize, max_width: f64, spec: CellSpec) -> GridLayout {
    let columns = (((max_width + spec.gap) / (spec.max_width + spec.gap)).floor() as usize).max(1);
    let rows = count.div_ceil(columns);
    let even_share = (max_width - (columns - 1) as f64 * spec.gap) / columns as f64;
    GridLayout {
        columns,
        rows,
        cell_width: spec.max_width.min(even_share),
        cell_height: spec.max_height,
        gap: spec.gap,
        top_pad: spec.top_pad,
        bottom_pad: spec.bottom_pad,
    }
}

/// Uniformly scale `(w, h)` to fit a cell box, never upscaling past the
/// intrinsic size by more than the box allows. Returns the drawn size.
pub fn scale_to_fit(width_px: u32, height_px: u32, box_w: f64, box_h: f64) -> (f64, f64) {
    let (iw, ih) = (width_px.max(1) as f64, height_px.max(1) as f64);
    let scale = (box_w / iw).min(box_h / ih);
    ((iw * scale).max(1.0), (ih * scale).max(1.0))
}
