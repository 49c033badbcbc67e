//! # Section Rendering
//!
//! Consumes the inspection record in input order and drives the flow
//! cursor. Two rendering paths exist, chosen by an explicit
//! [`SectionPolicy`]: the first section becomes a narrative page (title
//! plus wrapped name/comment blocks, no checkboxes or media); every later
//! section renders item by item with a status checkbox row, wrapped
//! comments, a photo grid, and a video grid with link fallbacks.
//!
//! Media failures degrade per cell — a dead thumbnail becomes an
//! underlined link block, a dead photo leaves its grid slot empty — and
//! never abort the record.

pub mod finalize;

use log::debug;

use crate::assets::{AssetLoader, ImageOutcome};
use crate::doc::{ReportDocument, WidgetKey};
use crate::font::Font;
use crate::layout::grid::{grid_layout, scale_to_fit, CellSpec};
use crate::layout::{FlowCursor, PageChrome, PageGeometry};
use crate::model::{safe_value, InspectionRecord, LineItem, Section, Status};
use crate::text::wrap;

const TITLE_SIZE: f64 = 14.0;
const NAME_SIZE: f64 = 11.0;
const COMMENTS_SIZE: f64 = 10.0;
const LINE_HEIGHT_NAME: f64 = 14.0;
const LINE_HEIGHT_COMMENTS: f64 = 12.0;
const LINE_GAP: f64 = 8.0;

const CHECKBOX_SIZE: f64 = 10.0;
const CHECK_GAP: f64 = 10.0;
const LABEL_GAP: f64 = 8.0;

const PHOTO_CELL: CellSpec = CellSpec {
    max_width: 120.0,
    max_height: 90.0,
    gap: 8.0,
    top_pad: 4.0,
    bottom_pad: 6.0,
};

const VIDEO_COLS: usize = 3;
const VIDEO_GAP: f64 = 8.0;
const THUMB_W: f64 = 150.0;
const THUMB_H: f64 = 100.0;
const CAPTION_SIZE: f64 = 8.0;
const LINK_SIZE: f64 = 9.0;
const LINK_LINE_HEIGHT: f64 = 12.0;

/// The status legend stamped on every content page and in the footer box.
pub const STATUS_LEGEND: &str = "I=Inspected  NI=Not Inspected  NP=Not Present  D=Deficient";

/// Which sections take the narrative path. Making this a named policy
/// keeps "first section is the report scope" a decision, not an accident
/// of loop indices.
#[derive(Debug, Clone, Copy, Default)]
pub enum SectionPolicy {
    /// The first section renders narrative; all later sections render
    /// structured.
    #[default]
    FirstNarrative,
}

impl SectionPolicy {
    pub fn is_narrative(&self, section_index: usize) -> bool {
        match self {
            SectionPolicy::FirstNarrative => section_index == 0,
        }
    }
}

/// Bind the template's fixed text fields from the record header. Absent
/// values render the missing-value placeholder; fields the template lacks
/// are skipped by the document layer.
pub fn fill_static_fields(doc: &mut ReportDocument, record: &InspectionRecord) {
    let setters = [
        ("Name of Client", safe_value(record.client_info.name.as_deref())),
        (
            "Date of Inspection",
            safe_value(record.schedule.date_time_display().as_deref()),
        ),
        (
            "Address of Inspected Property",
            safe_value(record.address.full_address.as_deref()),
        ),
        ("Name of Inspector", safe_value(record.inspector.name.as_deref())),
        ("TREC License", safe_value(record.inspector.license.as_deref())),
        (
            "Name of Sponsor if applicable",
            safe_value(record.sponsor.name.as_deref()),
        ),
        ("TREC License_2", safe_value(record.sponsor.license.as_deref())),
    ];
    for (name, value) in setters {
        doc.fill_text_field(name, &value);
    }
}

/// Render every section of the record, in order, onto content pages.
pub fn render_sections(
    doc: &mut ReportDocument,
    record: &InspectionRecord,
    assets: &mut AssetLoader<'_>,
    policy: SectionPolicy,
) {
    let chrome = PageChrome {
        identification: format!(
            "Report Identification: {} - {}",
            safe_value(record.address.full_address.as_deref()),
            safe_value(record.schedule.date_display().as_deref()),
        ),
        legend: STATUS_LEGEND.to_string(),
    };
    let mut cursor = FlowCursor::new(doc, PageGeometry::default(), chrome);

    for (index, section) in record.sections.iter().enumerate() {
        if policy.is_narrative(index) {
            render_narrative_section(&mut cursor, section);
        } else {
            render_structured_section(&mut cursor, section, assets);
        }
    }

    cursor.finish();
}

/// Narrative path: section title, then each item's name and comments as
/// plain wrapped text. No checkboxes, no media.
fn render_narrative_section(cursor: &mut FlowCursor<'_>, section: &Section) {
    let geom = cursor.geometry();
    let x = geom.margin_x;
    let max_w = geom.content_width();

    cursor.ensure_space(TITLE_SIZE + LINE_GAP * 1.5);
    cursor.place_line(
        x,
        &section.display_title(),
        Font::HelveticaBold,
        TITLE_SIZE,
        TITLE_SIZE + LINE_GAP * 1.5,
    );

    for item in &section.line_items {
        if let Some(name) = item.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let lines = wrap(name, Font::HelveticaBold, NAME_SIZE, max_w);
            cursor.ensure_space(lines.len() as f64 * LINE_HEIGHT_NAME);
            for line in &lines {
                cursor.place_line(x, line, Font::HelveticaBold, NAME_SIZE, LINE_HEIGHT_NAME);
            }
        }

        let comments = item.joined_comments();
        if !comments.is_empty() {
            let lines = wrap(&comments, Font::Helvetica, COMMENTS_SIZE, max_w);
            cursor.ensure_space(lines.len() as f64 * LINE_HEIGHT_COMMENTS);
            for line in &lines {
                cursor.place_line(x, line, Font::Helvetica, COMMENTS_SIZE, LINE_HEIGHT_COMMENTS);
            }
        }

        cursor.advance(LINE_GAP);
    }
}

fn render_structured_section(
    cursor: &mut FlowCursor<'_>,
    section: &Section,
    assets: &mut AssetLoader<'_>,
) {
    for item in &section.line_items {
        render_line_item(cursor, item, assets);
    }
}

/// One structured line item: checkbox row, name, comments, photo grid,
/// video grid.
fn render_line_item(cursor: &mut FlowCursor<'_>, item: &LineItem, assets: &mut AssetLoader<'_>) {
    let geom = cursor.geometry();
    let checkbox_block =
        Status::ALL.len() as f64 * CHECKBOX_SIZE + (Status::ALL.len() - 1) as f64 * CHECK_GAP;
    let start_x = geom.margin_x + checkbox_block + LABEL_GAP;
    let max_w = (geom.width - geom.margin_x - start_x).max(60.0);

    let joined = item.joined_comments();
    let comment_lines = if joined.is_empty() {
        Vec::new()
    } else {
        wrap(
            &format!("Comments: {joined}"),
            Font::Helvetica,
            COMMENTS_SIZE,
            max_w,
        )
    };

    // Name + comments break as one block; the grids reserve their own
    // space below.
    let needed = LINE_HEIGHT_NAME
        + comment_lines.len().max(1) as f64 * LINE_HEIGHT_COMMENTS
        + LINE_GAP;
    cursor.ensure_space(needed);

    draw_checkbox_row(cursor, item);

    let name = item
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or("(unnamed item)");
    cursor.place_line(start_x, name, Font::Helvetica, NAME_SIZE, LINE_HEIGHT_NAME);

    if comment_lines.is_empty() {
        cursor.advance(LINE_HEIGHT_COMMENTS);
    } else {
        for line in &comment_lines {
            cursor.place_line(start_x, line, Font::Helvetica, COMMENTS_SIZE, LINE_HEIGHT_COMMENTS);
        }
    }
    cursor.advance(LINE_GAP);

    render_photo_grid(cursor, item, start_x, max_w, assets);
    render_video_grid(cursor, item, start_x, assets);
}

/// Four mutually exclusive status checkboxes at the left margin. The box
/// matching the item's status is checked; an unknown or missing status
/// checks none.
fn draw_checkbox_row(cursor: &mut FlowCursor<'_>, item: &LineItem) {
    let geom = cursor.geometry();
    let status = item.status();
    let item_id = item.id.as_deref().unwrap_or("item").to_string();

    let mut x = geom.margin_x;
    let y = cursor.y() - CHECKBOX_SIZE;
    for candidate in Status::ALL {
        cursor.page().checkbox(
            WidgetKey {
                item_id: item_id.clone(),
                label: candidate.label(),
            },
            x,
            y,
            CHECKBOX_SIZE,
            status == Some(candidate),
        );
        x += CHECKBOX_SIZE + CHECK_GAP;
    }
}

/// Column-wrapped photo thumbnails. Absent URLs reserve no space at all;
/// an unavailable image leaves its grid slot empty.
fn render_photo_grid(
    cursor: &mut FlowCursor<'_>,
    item: &LineItem,
    start_x: f64,
    max_w: f64,
    assets: &mut AssetLoader<'_>,
) {
    let urls = item.photo_urls();
    if urls.is_empty() {
        return;
    }

    let grid = grid_layout(urls.len(), max_w, PHOTO_CELL);
    cursor.ensure_space(grid.height());
    cursor.advance(grid.top_pad);
    let grid_top = cursor.y();

    for (i, url) in urls.iter().enumerate() {
        match assets.load(url) {
            ImageOutcome::Loaded(image) => {
                let (dw, dh) =
                    scale_to_fit(image.width_px, image.height_px, grid.cell_width, grid.cell_height);
                let handle = cursor.register_image(image);
                let cell_x = start_x + grid.cell_x(i);
                let cell_top = grid_top - grid.cell_y_offset(i);
                cursor.page().draw_image(
                    handle,
                    cell_x + (grid.cell_width - dw) / 2.0,
                    cell_top - dh,
                    dw,
                    dh,
                );
            }
            ImageOutcome::Unavailable => {
                debug!("photo unavailable, leaving grid slot empty: {url}");
            }
        }
    }

    cursor.advance(grid.height() - grid.top_pad);
}

/// Fixed three-column grid of video thumbnails with captions. A cell whose
/// thumbnail is absent or fails to load falls back to an underlined link
/// block; the row advances by the tallest cell it holds.
fn render_video_grid(
    cursor: &mut FlowCursor<'_>,
    item: &LineItem,
    start_x: f64,
    assets: &mut AssetLoader<'_>,
) {
    let videos = item.video_refs();
    if videos.is_empty() {
        return;
    }

    let nominal_row = THUMB_H + CAPTION_SIZE + VIDEO_GAP;
    cursor.ensure_space(LINE_HEIGHT_NAME + nominal_row);
    cursor.place_line(start_x, "Videos:", Font::Helvetica, NAME_SIZE, LINE_HEIGHT_NAME);

    let mut col = 0;
    let mut row_height = nominal_row;
    for video in videos {
        if col == 0 {
            cursor.ensure_space(nominal_row);
        }
        let cell_x = start_x + col as f64 * (THUMB_W + VIDEO_GAP);
        let cell_top = cursor.y();

        let outcome = match video.thumbnail_url.as_deref() {
            Some(url) => assets.load(url),
            None => ImageOutcome::Unavailable,
        };

        match outcome {
            ImageOutcome::Loaded(image) => {
                let (w, h) = scale_to_fit(image.width_px, image.height_px, THUMB_W, THUMB_H);
                let handle = cursor.register_image(image);
                let ix = cell_x + (THUMB_W - w) / 2.0;
                let iy = cell_top - h;
                cursor.page().draw_image(handle, ix, iy, w, h);

                let target = video
                    .url
                    .as_deref()
                    .or(video.thumbnail_url.as_deref())
                    .unwrap_or_default();
                if !target.is_empty() {
                    cursor.page().link(ix, iy, w, h, target);
                }

                let caption = if video.url.is_some() { "Open video" } else { "Open" };
                cursor
                    .page()
                    .draw_text(caption, cell_x, iy - CAPTION_SIZE - 2.0, CAPTION_SIZE, Font::Helvetica);
            }
            ImageOutcome::Unavailable => {
                let target = video.url.as_deref().unwrap_or_default();
                let used = draw_link_block(cursor, "Video", cell_x, cell_top, THUMB_W, target);
                row_height = row_height.max(used + VIDEO_GAP);
            }
        }

        col += 1;
        if col >= VIDEO_COLS {
            col = 0;
            cursor.advance(row_height);
            row_height = nominal_row;
        }
    }
    if col != 0 {
        cursor.advance(row_height);
    }
    cursor.advance(LINE_GAP);
}

/// Wrapped, underlined hyperlink-style text anchored at `top_y`. Returns
/// the vertical space the block consumed so the caller can grow the row.
fn draw_link_block(
    cursor: &mut FlowCursor<'_>,
    text: &str,
    x: f64,
    top_y: f64,
    max_w: f64,
    uri: &str,
) -> f64 {
    let lines = wrap(text, Font::Helvetica, LINK_SIZE, max_w);
    let mut baseline = top_y - LINK_SIZE;
    for line in &lines {
        let line_w = Font::Helvetica.text_width(line, LINK_SIZE);
        let page = cursor.page();
        page.draw_text(line, x, baseline, LINK_SIZE, Font::Helvetica);
        page.draw_line(x, baseline - 1.0, x + line_w, baseline - 1.0, 0.5);
        if !uri.is_empty() {
            page.link(x, baseline - LINK_SIZE, line_w, LINK_SIZE + 2.0, uri);
        }
        baseline -= LINK_LINE_HEIGHT;
    }
    LINK_SIZE + lines.len() as f64 * LINK_LINE_HEIGHT
}
