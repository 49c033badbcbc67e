//! # Pagination Finalizer
//!
//! The second rendering pass. Page totals are unknowable until the last
//! content page exists — a late section can always force another page — so
//! footer stamping is deferred until the full page sequence is built, then
//! applied to every content page (the third physical page onward; the two
//! template covers keep their own numbering).

use crate::doc::{ContentPage, ReportDocument};
use crate::font::Font;

/// The template's own page-count text field, filled with the final total.
const PAGE_COUNT_FIELD: &str = "Page 2 of";

const FOOTER_SIZE: f64 = 10.0;
const FOOTER_Y: f64 = 35.0;
const BOILERPLATE_Y: f64 = 15.0;
const BOILERPLATE: &str = "REI 7-6 (8/9/2021)      Promulgated by the Texas Real Estate Commission - (512) 936-3000 - www.trec.texas.gov";

const LEGEND_Y: f64 = 720.0;
const LEGEND_HEIGHT: f64 = 20.0;
const LEGEND_TEXT_SIZE: f64 = 6.0;
const LEGEND_LABELS: [(f64, &str); 4] = [(45.0, "I"), (60.0, "NI"), (80.0, "NP"), (100.0, "D")];

/// Stamp `Page i of N` footers, the boilerplate line, and the legend box
/// onto every content page, and write the total into the template's
/// page-count field.
pub fn stamp_footers(doc: &mut ReportDocument) {
    let total = doc.total_page_count();
    doc.fill_text_field_sized(PAGE_COUNT_FIELD, &total.to_string(), 6.0);

    for index in 0..doc.content_page_count() {
        let physical = doc.physical_page_number(index);
        let footer = format!("Page {physical} of {total}");
        let footer_width = Font::Helvetica.text_width(&footer, FOOTER_SIZE);

        let page = doc.page_mut(index);
        let center_x = (page.width - footer_width) / 2.0;
        page.draw_text(&footer, center_x, FOOTER_Y, FOOTER_SIZE, Font::Helvetica);
        page.draw_text(BOILERPLATE, 20.0, BOILERPLATE_Y, FOOTER_SIZE, Font::Helvetica);

        draw_legend_box(page);
    }
}

/// The white-filled, black-bordered band carrying the four status
/// abbreviations.
fn draw_legend_box(page: &mut ContentPage) {
    let margin_x = 40.0;
    page.draw_rect(
        margin_x,
        LEGEND_Y,
        page.width - 2.0 * margin_x,
        LEGEND_HEIGHT,
        1.0,
        true,
    );
    for (x, label) in LEGEND_LABELS {
        page.draw_text(label, x, LEGEND_Y + 5.0, LEGEND_TEXT_SIZE, Font::Helvetica);
    }
}
