//! # Page-Aware Flow Layout
//!
//! The heart of the renderer. Content never lands on an infinite canvas:
//! the cursor walks down a page of known dimensions, and before each block
//! is drawn the caller asks "does this fit?". If it doesn't, the current
//! page is finalized (per-page header chrome stamped) and a fresh page
//! opens. Because callers pre-wrap text and pre-compute grid heights, the
//! break decision is always made before any partial drawing — a block is
//! never split across a page boundary.
//!
//! All cursor movement and page creation funnels through [`FlowCursor`];
//! renderers draw through it but never advance `y` or open pages
//! themselves.

pub mod grid;

use crate::assets::LoadedImage;
use crate::doc::{ContentPage, ImageHandle, ReportDocument};
use crate::font::Font;

/// Fixed page geometry for generated content pages (Letter).
#[derive(Debug, Clone, Copy)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    /// Left margin; the right margin mirrors it.
    pub margin_x: f64,
    /// Top margin below the header band.
    pub margin_y: f64,
    /// Extra space above the bottom margin reserved for the footer pass.
    pub footer_reserve: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin_x: 40.0,
            margin_y: 80.0,
            footer_reserve: 60.0,
        }
    }
}

impl PageGeometry {
    /// Where the cursor starts on a fresh page.
    pub fn top_y(&self) -> f64 {
        self.height - self.margin_y
    }

    /// The cursor may not cross below this line.
    pub fn bottom_threshold(&self) -> f64 {
        self.margin_y + self.footer_reserve
    }

    /// Usable width between the side margins.
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin_x
    }
}

/// Header chrome stamped onto each content page as it is finalized: the
/// report-identification line and the status legend line.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub identification: String,
    pub legend: String,
}

impl PageChrome {
    fn stamp(&self, page: &mut ContentPage, geom: &PageGeometry) {
        page.draw_text(
            &self.identification,
            geom.margin_x,
            geom.height - 25.0,
            10.0,
            Font::Helvetica,
        );
        page.draw_text(
            &self.legend,
            geom.margin_x,
            geom.height - 40.0,
            10.0,
            Font::HelveticaBold,
        );
    }
}

/// The running write position on the current content page. Owns page
/// rotation: `ensure_space` is the only place a page break can happen.
pub struct FlowCursor<'d> {
    doc: &'d mut ReportDocument,
    geom: PageGeometry,
    chrome: PageChrome,
    page: usize,
    y: f64,
}

impl<'d> FlowCursor<'d> {
    /// Open the first content page and place the cursor at its top.
    pub fn new(doc: &'d mut ReportDocument, geom: PageGeometry, chrome: PageChrome) -> Self {
        let page = doc.add_content_page(geom.width, geom.height);
        let y = geom.top_y();
        Self {
            doc,
            geom,
            chrome,
            page,
            y,
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geom
    }

    /// Current vertical write position (distance from the page bottom).
    pub fn y(&self) -> f64 {
        self.y
    }

    /// The draw surface for the current page. Callers draw at [`y`](Self::y)
    /// and below, then account for the space with [`advance`](Self::advance).
    pub fn page(&mut self) -> &mut ContentPage {
        self.doc.page_mut(self.page)
    }

    /// Register a decoded image with the owning document for embedding.
    pub fn register_image(&mut self, image: LoadedImage) -> ImageHandle {
        self.doc.register_image(image)
    }

    /// Guarantee `needed` points of vertical space before the bottom
    /// threshold, rotating to a fresh page if the current one is too full.
    /// After this returns the cursor is never below the threshold.
    pub fn ensure_space(&mut self, needed: f64) {
        if self.y - needed < self.geom.bottom_threshold() {
            self.rotate();
        }
    }

    /// Consume `dy` points of vertical space after drawing a block.
    pub fn advance(&mut self, dy: f64) {
        self.y -= dy;
    }

    /// Draw one pre-wrapped text line at the left edge `x` and consume its
    /// line height.
    pub fn place_line(&mut self, x: f64, text: &str, font: Font, size: f64, line_height: f64) {
        let baseline = self.y - size;
        self.page().draw_text(text, x, baseline, size, font);
        self.advance(line_height);
    }

    fn rotate(&mut self) {
        self.chrome.stamp(self.doc.page_mut(self.page), &self.geom);
        self.page = self.doc.add_content_page(self.geom.width, self.geom.height);
        self.y = self.geom.top_y();
    }

    /// Finalize the last open page. Must be called exactly once, after all
    /// sections have rendered.
    pub fn finish(self) {
        let geom = self.geom;
        self.chrome.stamp(self.doc.page_mut(self.page), &geom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::test_support::template_with_fields;

    fn chrome() -> PageChrome {
        PageChrome {
            identification: "Report Identification: 1204 Bluestem Ln - 08/16/2025".to_string(),
            legend: "I=Inspected  NI=Not Inspected  NP=Not Present  D=Deficient".to_string(),
        }
    }

    fn test_doc() -> ReportDocument {
        ReportDocument::from_template(&template_with_fields(2, &[]), 2).unwrap()
    }

    #[test]
    fn test_cursor_starts_at_top() {
        let mut doc = test_doc();
        let cursor = FlowCursor::new(&mut doc, PageGeometry::default(), chrome());
        assert_eq!(cursor.y(), 712.0);
    }

    #[test]
    fn test_ensure_space_no_rotation_when_fits() {
        let mut doc = test_doc();
        let mut cursor = FlowCursor::new(&mut doc, PageGeometry::default(), chrome());
        cursor.ensure_space(100.0);
        cursor.finish();
        assert_eq!(doc.content_page_count(), 1);
    }

    #[test]
    fn test_ensure_space_rotates_when_full() {
        let mut doc = test_doc();
        let mut cursor = FlowCursor::new(&mut doc, PageGeometry::default(), chrome());
        // Walk the cursor near the bottom threshold.
        cursor.advance(560.0);
        assert!(cursor.y() - 20.0 < 140.0);
        cursor.ensure_space(20.0);
        assert_eq!(cursor.y(), 712.0);
        cursor.finish();
        assert_eq!(doc.content_page_count(), 2);
    }

    #[test]
    fn test_cursor_never_below_threshold_after_ensure() {
        let mut doc = test_doc();
        let geom = PageGeometry::default();
        let mut cursor = FlowCursor::new(&mut doc, geom, chrome());
        for _ in 0..200 {
            cursor.ensure_space(14.0);
            assert!(cursor.y() >= geom.bottom_threshold());
            cursor.place_line(40.0, "line", Font::Helvetica, 11.0, 14.0);
            // A block placed right after ensure_space stays on the page.
            assert!(cursor.y() >= geom.margin_y);
        }
        cursor.finish();
        assert!(doc.content_page_count() > 1);
    }

    #[test]
    fn test_rotation_stamps_chrome_on_finalized_page() {
        let mut doc = test_doc();
        let mut cursor = FlowCursor::new(&mut doc, PageGeometry::default(), chrome());
        cursor.advance(600.0);
        cursor.ensure_space(50.0); // rotates
        cursor.finish();

        // Both pages carry the two chrome text ops.
        for idx in 0..doc.content_page_count() {
            let ops = doc.page_mut(idx).ops().len();
            assert!(ops >= 2, "page {idx} missing chrome");
        }
    }

    #[test]
    fn test_place_line_draws_and_advances() {
        let mut doc = test_doc();
        let mut cursor = FlowCursor::new(&mut doc, PageGeometry::default(), chrome());
        let before = cursor.y();
        cursor.place_line(40.0, "Foundation", Font::Helvetica, 11.0, 14.0);
        assert_eq!(cursor.y(), before - 14.0);
        cursor.finish();
        // The placed line plus the two chrome lines from finish().
        assert_eq!(doc.page_mut(0).ops().len(), 3);
    }
}
