//! Integration tests for the full report-rendering pipeline.
//!
//! These exercise the path from JSON record + template bytes to the final
//! PDF: field binding, narrative/structured section rendering, media
//! fallbacks, page flow, and the deferred footer pass. Assertions reload
//! the produced bytes with lopdf and inspect real objects — pages, AcroForm
//! fields, annotations, content streams.

use lopdf::Object;

use inspekt::assets::test_support::{tiny_jpeg, tiny_png, StubFetcher};
use inspekt::doc::test_support::template_with_fields;
use inspekt::render_report_json;

const TREC_FIELDS: &[&str] = &[
    "Name of Client",
    "Date of Inspection",
    "Address of Inspected Property",
    "Name of Inspector",
    "TREC License",
    "Name of Sponsor if applicable",
    "TREC License_2",
    "Page 2 of",
];

// ─── Helpers ────────────────────────────────────────────────────

/// A template shaped like the real one: two cover pages plus trailing
/// instruction pages that the renderer trims away.
fn template() -> Vec<u8> {
    template_with_fields(6, TREC_FIELDS)
}

fn reload(bytes: &[u8]) -> lopdf::Document {
    lopdf::Document::load_mem(bytes).expect("output should reload")
}

/// All AcroForm fields as (name, value) pairs. Checkbox values are the
/// /V name ("Yes"/"Off"); text values are the literal string.
fn form_fields(doc: &lopdf::Document) -> Vec<(String, String)> {
    let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let acroform_id = doc
        .get_object(catalog_id)
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"AcroForm")
        .unwrap()
        .as_reference()
        .unwrap();
    let fields = doc
        .get_object(acroform_id)
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"Fields")
        .unwrap()
        .as_array()
        .unwrap()
        .clone();

    fields
        .iter()
        .filter_map(|f| {
            let dict = doc.get_object(f.as_reference().ok()?).ok()?.as_dict().ok()?;
            let name = String::from_utf8_lossy(dict.get(b"T").ok()?.as_str().ok()?).into_owned();
            let value = match dict.get(b"V") {
                Ok(Object::Name(n)) => String::from_utf8_lossy(n).into_owned(),
                Ok(Object::String(s, _)) => String::from_utf8_lossy(s).into_owned(),
                _ => String::new(),
            };
            Some((name, value))
        })
        .collect()
}

fn field_value(doc: &lopdf::Document, name: &str) -> Option<String> {
    form_fields(doc)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

fn count_image_xobjects(doc: &lopdf::Document) -> usize {
    doc.objects
        .values()
        .filter(|obj| match obj {
            Object::Stream(stream) => {
                stream.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Image".as_slice())
            }
            _ => false,
        })
        .count()
}

/// Does any page's content stream contain `needle`?
fn content_contains(doc: &lopdf::Document, needle: &str) -> bool {
    doc.get_pages().values().any(|&page_id| {
        let content = doc.get_page_content(page_id).unwrap_or_default();
        content
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    })
}

/// Collect every /Link annotation's URI across all pages.
fn link_uris(doc: &lopdf::Document) -> Vec<String> {
    let mut uris = Vec::new();
    for &page_id in doc.get_pages().values() {
        let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
            continue;
        };
        let Ok(annots) = page.get(b"Annots").and_then(Object::as_array) else {
            continue;
        };
        for annot in annots {
            let Ok(dict) = annot
                .as_reference()
                .and_then(|id| doc.get_object(id))
                .and_then(Object::as_dict)
            else {
                continue;
            };
            if dict.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Link".as_slice()) {
                continue;
            }
            if let Ok(action) = dict.get(b"A").and_then(Object::as_dict) {
                if let Ok(uri) = action.get(b"URI").and_then(Object::as_str) {
                    uris.push(String::from_utf8_lossy(uri).into_owned());
                }
            }
        }
    }
    uris
}

fn record_json(sections_json: &str) -> String {
    format!(
        r#"{{
            "inspection": {{
                "clientInfo": {{ "name": "Jordan Avery" }},
                "schedule": {{ "date": 1755302400000, "startTime": 1755319800000 }},
                "address": {{ "fullAddress": "1204 Bluestem Ln, Austin, TX 78737" }},
                "inspector": {{ "name": "M. Reyes", "license": "TREC #23811" }},
                "sponsor": {{ "name": "Lone Star Inspections", "license": "TREC #10442" }},
                "sections": [
                    {{
                        "title": "Scope of Inspection",
                        "lineItems": [
                            {{ "name": "Purpose", "comments": [ {{ "content": "Visual survey of readily accessible systems." }} ] }}
                        ]
                    }},
                    {sections_json}
                ]
            }}
        }}"#
    )
}

fn items_json(items: &[(&str, &str)]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|(id, status)| {
            format!(
                r#"{{ "id": "{id}", "name": "Item {id}", "inspectionStatus": "{status}",
                     "comments": [] }}"#
            )
        })
        .collect();
    format!(
        r#"{{ "title": "Structural Systems", "lineItems": [ {} ] }}"#,
        rendered.join(",")
    )
}

// ─── Scenarios ──────────────────────────────────────────────────

#[test]
fn test_static_fields_bound_from_record() {
    let json = record_json(&items_json(&[("a1", "I")]));
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert_eq!(field_value(&doc, "Name of Client").as_deref(), Some("Jordan Avery"));
    assert_eq!(
        field_value(&doc, "Date of Inspection").as_deref(),
        Some("08/16/2025 4:50am")
    );
    assert_eq!(
        field_value(&doc, "Address of Inspected Property").as_deref(),
        Some("1204 Bluestem Ln, Austin, TX 78737")
    );
    assert_eq!(field_value(&doc, "TREC License").as_deref(), Some("TREC #23811"));
}

#[test]
fn test_missing_values_render_placeholder() {
    let json = r#"{ "inspection": { "sections": [] } }"#;
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert_eq!(
        field_value(&doc, "Name of Client").as_deref(),
        Some("Data not found in test data")
    );
    assert_eq!(
        field_value(&doc, "Name of Sponsor if applicable").as_deref(),
        Some("Data not found in test data")
    );
}

#[test]
fn test_template_trimmed_to_two_covers_plus_content() {
    let json = record_json(&items_json(&[("a1", "I")]));
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    // 6-page template → 2 covers kept + 1 generated content page.
    assert_eq!(doc.get_pages().len(), 3);
}

#[test]
fn test_checkboxes_match_item_statuses() {
    // Scenario: two line items, statuses "I" and "D" — the matching box of
    // each item is checked and every other box stays off.
    let json = record_json(&items_json(&[("it1", "I"), ("it2", "D")]));
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    let fields = form_fields(&doc);
    let checkbox = |name: &str| {
        fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing checkbox {name}"))
    };

    assert_eq!(checkbox("li_it1_I"), "Yes");
    assert_eq!(checkbox("li_it1_NI"), "Off");
    assert_eq!(checkbox("li_it1_NP"), "Off");
    assert_eq!(checkbox("li_it1_D"), "Off");

    assert_eq!(checkbox("li_it2_D"), "Yes");
    assert_eq!(checkbox("li_it2_I"), "Off");
}

#[test]
fn test_unmatched_status_leaves_all_unchecked() {
    let json = record_json(&items_json(&[("odd", "REPLACED")]));
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    for label in ["I", "NI", "NP", "D"] {
        assert_eq!(
            field_value(&doc, &format!("li_odd_{label}")).as_deref(),
            Some("Off")
        );
    }
}

#[test]
fn test_seven_photos_embed_and_flow() {
    // Scenario: 7 photos at the structured content width resolve to a
    // 3-column grid; all seven decode and embed.
    let photos: Vec<String> = (0..7)
        .map(|i| format!(r#"{{ "url": "http://img/p{i}.jpg" }}"#))
        .collect();
    let section = format!(
        r#"{{ "title": "Roof", "lineItems": [
            {{ "id": "r1", "name": "Roof Covering", "inspectionStatus": "D",
               "comments": [ {{ "content": "Hail damage on south slope.", "photos": [ {} ] }} ] }}
        ] }}"#,
        photos.join(",")
    );
    let json = record_json(&section);
    let routes: Vec<(String, Vec<u8>)> = (0..7)
        .map(|i| (format!("http://img/p{i}.jpg"), tiny_jpeg()))
        .collect();
    let fetcher = StubFetcher::new(routes.iter().map(|(u, b)| (u.as_str(), b.clone())).collect());
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert_eq!(count_image_xobjects(&doc), 7);
}

#[test]
fn test_png_photo_embeds_flate_stream() {
    let section = r#"{ "title": "Plumbing", "lineItems": [
        { "id": "pl1", "name": "Water Heater", "inspectionStatus": "I",
          "comments": [ { "content": "Sticker photo.", "photos": [ { "url": "http://img/label.png" } ] } ] }
    ] }"#;
    let json = record_json(section);
    let fetcher = StubFetcher::new(vec![("http://img/label.png", tiny_png())]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert_eq!(count_image_xobjects(&doc), 1);
}

#[test]
fn test_unreachable_thumbnail_falls_back_to_link() {
    // Scenario: the video thumbnail URL is dead. The output carries a link
    // annotation targeting the video URL and draws no image at all.
    let section = r#"{ "title": "Electrical", "lineItems": [
        { "id": "e1", "name": "Service Panel", "inspectionStatus": "D",
          "comments": [ { "content": "Double-tapped breaker shown in video.",
                          "videos": [ { "url": "https://videos.example/panel.mp4",
                                        "thumbnailURL": "http://img/dead-thumb.jpg" } ] } ] }
    ] }"#;
    let json = record_json(section);
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert_eq!(count_image_xobjects(&doc), 0);
    assert_eq!(link_uris(&doc), vec!["https://videos.example/panel.mp4".to_string()]);
}

#[test]
fn test_loaded_thumbnail_links_to_video() {
    let section = r#"{ "title": "Electrical", "lineItems": [
        { "id": "e2", "name": "Service Panel", "inspectionStatus": "D",
          "comments": [ { "videos": [ { "url": "https://videos.example/panel.mp4",
                                        "thumbnailURL": "http://img/thumb.jpg" } ] } ] }
    ] }"#;
    let json = record_json(section);
    let fetcher = StubFetcher::new(vec![("http://img/thumb.jpg", tiny_jpeg())]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert_eq!(count_image_xobjects(&doc), 1);
    assert_eq!(link_uris(&doc), vec!["https://videos.example/panel.mp4".to_string()]);
}

#[test]
fn test_footers_stamp_final_page_numbers() {
    // Scenario: enough items to force 3 content pages. With the 2 template
    // covers the total is 5, and each content page carries its final
    // "Page i of N" footer.
    let items: Vec<(String, &str)> = (0..40).map(|i| (format!("x{i}"), "NI")).collect();
    let refs: Vec<(&str, &str)> = items.iter().map(|(id, s)| (id.as_str(), *s)).collect();
    let json = record_json(&items_json(&refs));
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert_eq!(doc.get_pages().len(), 5);
    assert!(content_contains(&doc, "Page 3 of 5"));
    assert!(content_contains(&doc, "Page 4 of 5"));
    assert!(content_contains(&doc, "Page 5 of 5"));
    // The template's own count field got the total.
    assert_eq!(field_value(&doc, "Page 2 of").as_deref(), Some("5"));
}

#[test]
fn test_page_chrome_on_content_pages() {
    let json = record_json(&items_json(&[("a1", "I")]));
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(&json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);

    assert!(content_contains(
        &doc,
        "Report Identification: 1204 Bluestem Ln, Austin, TX 78737 - 08/16/2025"
    ));
    assert!(content_contains(&doc, "I=Inspected  NI=Not Inspected  NP=Not Present  D=Deficient"));
    assert!(content_contains(&doc, "Promulgated by the Texas Real Estate Commission"));
}

#[test]
fn test_rendering_is_deterministic() {
    let json = record_json(&items_json(&[("a1", "I"), ("a2", "NP")]));
    let template = template();

    let fetcher = StubFetcher::new(vec![]);
    let first = render_report_json(&json, &template, &fetcher).unwrap();
    let second = render_report_json(&json, &template, &fetcher).unwrap();
    assert_eq!(first, second, "same inputs must produce identical bytes");
}

#[test]
fn test_garbage_template_is_fatal() {
    let json = record_json(&items_json(&[("a1", "I")]));
    let fetcher = StubFetcher::new(vec![]);
    assert!(render_report_json(&json, b"definitely not a pdf", &fetcher).is_err());
}

#[test]
fn test_garbage_record_is_fatal() {
    let fetcher = StubFetcher::new(vec![]);
    assert!(render_report_json("{ not json", &template(), &fetcher).is_err());
}

#[test]
fn test_empty_record_still_produces_document() {
    let json = r#"{ "inspection": {} }"#;
    let fetcher = StubFetcher::new(vec![]);
    let bytes = render_report_json(json, &template(), &fetcher).unwrap();
    let doc = reload(&bytes);
    // Two covers plus the single (empty) content page.
    assert_eq!(doc.get_pages().len(), 3);
}
