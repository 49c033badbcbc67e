//! # Inspekt
//!
//! A paginated PDF report generator for property inspections.
//!
//! Inspection apps hand over a structured record: client and schedule
//! details, then section after section of inspected items with statuses,
//! comments, and photo/video links. The deliverable is a single PDF built
//! on a fixed regulatory template — cover pages with filled form fields,
//! followed by however many generated pages the content needs.
//!
//! The interesting part is that "however many": content flows *into*
//! pages. The flow cursor asks "does this block fit?" before every
//! placement, rotating to a fresh page when it doesn't, and a second pass
//! stamps `Page i of N` once N is finally known.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON record + template PDF)
//!       ↓
//!   [model]    — inspection record: sections, items, comments, media
//!       ↓
//!   [render]   — section policy, line items, media grids   ← [assets]
//!       ↓
//!   [layout]   — flow cursor, page rotation, grid math     ← [text]/[font]
//!       ↓
//!   [doc]      — content pages materialized through lopdf
//! ```

pub mod assets;
pub mod compress;
pub mod doc;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod render;
pub mod text;

use assets::{AssetLoader, Fetcher};
use doc::ReportDocument;
use error::ReportError;
use model::InspectionRecord;
use render::SectionPolicy;

/// The template's cover sheets, kept verbatim ahead of generated content.
pub const COVER_PAGES: usize = 2;

/// Render a record against a template into final PDF bytes.
///
/// This is the primary entry point. Output is fully determined by the
/// record and the fetcher's responses: rendering the same inputs twice
/// produces identical bytes.
pub fn render_report(
    record: &InspectionRecord,
    template: &[u8],
    fetcher: &dyn Fetcher,
) -> Result<Vec<u8>, ReportError> {
    let mut doc = ReportDocument::from_template(template, COVER_PAGES)?;
    render::fill_static_fields(&mut doc, record);

    let mut assets = AssetLoader::new(fetcher);
    render::render_sections(&mut doc, record, &mut assets, SectionPolicy::default());
    render::finalize::stamp_footers(&mut doc);

    doc.save()
}

/// Render a record given as raw JSON (the `{ "inspection": ... }` wrapper).
pub fn render_report_json(
    json: &str,
    template: &[u8],
    fetcher: &dyn Fetcher,
) -> Result<Vec<u8>, ReportError> {
    let record = InspectionRecord::from_json(json)?;
    render_report(&record, template, fetcher)
}
