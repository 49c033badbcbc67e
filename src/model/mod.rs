//! # Inspection Record Model
//!
//! The input representation for the report renderer: a client/schedule/
//! address header plus an ordered list of sections, each holding ordered
//! line items with a status, free-text comments, and photo/video
//! references. Deserialized with serde from the `{ "inspection": ... }`
//! JSON produced by the field-inspection app.
//!
//! Every leaf field is optional. Missing values never fail the run — they
//! render as [`MISSING_VALUE`] or are simply skipped, depending on context.

use chrono::{TimeZone, Utc};
use serde::Deserialize;

/// Placeholder rendered wherever a required display value is absent.
pub const MISSING_VALUE: &str = "Data not found in test data";

/// Top-level wrapper of the input file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportInput {
    pub inspection: InspectionRecord,
}

/// A complete inspection record ready for rendering.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionRecord {
    pub client_info: ClientInfo,
    pub schedule: Schedule,
    pub address: Address,
    pub inspector: Identity,
    pub sponsor: Identity,
    pub sections: Vec<Section>,
}

impl InspectionRecord {
    /// Parse a record from the raw input file contents.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let input: ReportInput = serde_json::from_str(json)?;
        Ok(input.inspection)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientInfo {
    pub name: Option<String>,
}

/// Scheduled date and start time as epoch milliseconds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule {
    pub date: Option<i64>,
    pub start_time: Option<i64>,
}

impl Schedule {
    /// `MM/DD/YYYY h:mma` from date + start time; either half is dropped
    /// when absent. UTC, so output is deterministic across machines.
    pub fn date_time_display(&self) -> Option<String> {
        let date = self.date.and_then(format_date_only);
        let time = self.start_time.and_then(format_time_only);
        match (date, time) {
            (None, None) => None,
            (d, t) => Some(
                [d, t]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        }
    }

    /// `MM/DD/YYYY`, used in the per-page report-identification header.
    pub fn date_display(&self) -> Option<String> {
        self.date.and_then(format_date_only)
    }
}

fn format_date_only(ms: i64) -> Option<String> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%m/%d/%Y").to_string())
}

fn format_time_only(ms: i64) -> Option<String> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%-I:%M%P").to_string())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub full_address: Option<String>,
}

/// Inspector or sponsor identity for the template's license fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    pub name: Option<String>,
    pub license: Option<String>,
}

/// One titled group of line items. Section order is preserved; which
/// sections render as narrative vs structured pages is decided by the
/// renderer's section policy, not here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub title: Option<String>,
    pub name: Option<String>,
    pub section_number: Option<i64>,
    pub line_items: Vec<LineItem>,
}

impl Section {
    /// Title, falling back to the name, then a numbered placeholder.
    pub fn display_title(&self) -> String {
        if let Some(t) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return t.to_string();
        }
        if let Some(n) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return n.to_string();
        }
        match self.section_number {
            Some(n) => format!("Section {n}"),
            None => "Section".to_string(),
        }
    }
}

/// One inspected element.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub inspection_status: Option<String>,
    pub comments: Vec<Comment>,
}

impl LineItem {
    /// The matched status, if the raw string names one of the four known
    /// labels. Unknown or missing statuses are not an error — the item
    /// renders with all boxes unchecked.
    pub fn status(&self) -> Option<Status> {
        self.inspection_status.as_deref().and_then(Status::parse)
    }

    /// All comment texts joined into one 1-based numbered list, skipping
    /// blank entries. Empty string when nothing survives.
    pub fn joined_comments(&self) -> String {
        self.comments
            .iter()
            .filter_map(|c| {
                let t = c.content.as_deref().unwrap_or("").trim();
                (!t.is_empty()).then_some(t)
            })
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, t))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Photo URLs across all comments, in comment order.
    pub fn photo_urls(&self) -> Vec<&str> {
        self.comments
            .iter()
            .flat_map(|c| c.photos.iter())
            .filter_map(|p| p.url.as_deref())
            .filter(|u| !u.is_empty())
            .collect()
    }

    /// Video references across all comments, in comment order.
    pub fn video_refs(&self) -> Vec<&VideoRef> {
        self.comments.iter().flat_map(|c| c.videos.iter()).collect()
    }
}

/// A free-text comment with attached media.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    #[serde(alias = "commentText", alias = "label")]
    pub content: Option<String>,
    pub photos: Vec<PhotoRef>,
    pub videos: Vec<VideoRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoRef {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoRef {
    pub url: Option<String>,
    #[serde(alias = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
}

/// The fixed set of inspection statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Inspected,
    NotInspected,
    NotPresent,
    Deficient,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Inspected,
        Status::NotInspected,
        Status::NotPresent,
        Status::Deficient,
    ];

    /// The checkbox column label.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Inspected => "I",
            Status::NotInspected => "NI",
            Status::NotPresent => "NP",
            Status::Deficient => "D",
        }
    }

    /// Case-insensitive match against the known labels.
    pub fn parse(raw: &str) -> Option<Status> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "I" => Some(Status::Inspected),
            "NI" => Some(Status::NotInspected),
            "NP" => Some(Status::NotPresent),
            "D" => Some(Status::Deficient),
            _ => None,
        }
    }
}

/// Apply the missing-value placeholder to an optional display value.
pub fn safe_value(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.to_string(),
        None => MISSING_VALUE.to_string(),
    }
}
