//! # Report Document
//!
//! A facade over `lopdf` that owns the loaded template and the generated
//! content pages. The layout engine never touches PDF objects: it appends
//! [`DrawOp`]s, link annotations, and checkbox widgets to value-object
//! [`ContentPage`]s, and this module materializes everything into the PDF
//! object graph at save time. That late materialization is what makes the
//! finalizer's second pass possible — pages stay editable until the total
//! page count is known.
//!
//! Template handling is deliberately thin: load, trim to the cover pages,
//! fill named AcroForm text fields (missing fields are skipped with a
//! warning, never an error), and append generated pages behind the covers.

use std::collections::HashSet;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::warn;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};

use crate::assets::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::error::ReportError;
use crate::font::Font;

/// Composite key identifying one status checkbox. The PDF field name is
/// derived from this at materialization time, with deterministic uniquing,
/// so free-form item identifiers can never silently collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetKey {
    pub item_id: String,
    pub label: &'static str,
}

impl WidgetKey {
    fn base_field_name(&self) -> String {
        format!("li_{}_{}", self.item_id, self.label)
    }
}

/// Handle to an image registered with the document for embedding.
#[derive(Debug, Clone, Copy)]
pub struct ImageHandle {
    index: usize,
    pub width_px: u32,
    pub height_px: u32,
}

/// One drawing primitive on a content page. Coordinates are PDF points,
/// origin bottom-left; text `y` is the baseline, image/rect `y` the bottom
/// edge.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Text {
        text: String,
        x: f64,
        y: f64,
        size: f64,
        font: Font,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
    },
    /// Outlined rectangle, optionally filled white (the legend box style).
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        border_width: f64,
        fill_white: bool,
    },
    Image {
        handle: ImageHandle,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
}

/// A clickable region targeting an external URI.
#[derive(Debug, Clone)]
pub struct LinkAnnotation {
    pub rect: [f64; 4],
    pub uri: String,
}

/// A status checkbox widget to be realized as an AcroForm field.
#[derive(Debug, Clone)]
pub struct CheckboxWidget {
    pub key: WidgetKey,
    pub rect: [f64; 4],
    pub checked: bool,
}

/// A generated content page: fixed dimensions plus append-only draw ops,
/// link annotations, and form-field widgets. Pages are value objects until
/// [`ReportDocument::save`] materializes them.
#[derive(Debug, Clone)]
pub struct ContentPage {
    pub width: f64,
    pub height: f64,
    ops: Vec<DrawOp>,
    links: Vec<LinkAnnotation>,
    widgets: Vec<CheckboxWidget>,
}

impl ContentPage {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            links: Vec::new(),
            widgets: Vec::new(),
        }
    }

    /// Draw `text` with its baseline at `(x, y)`.
    pub fn draw_text(&mut self, text: &str, x: f64, y: f64, size: f64, font: Font) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            size,
            font,
        });
    }

    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64) {
        self.ops.push(DrawOp::Line { x1, y1, x2, y2, width });
    }

    pub fn draw_rect(&mut self, x: f64, y: f64, w: f64, h: f64, border_width: f64, fill_white: bool) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            w,
            h,
            border_width,
            fill_white,
        });
    }

    pub fn draw_image(&mut self, handle: ImageHandle, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::Image { handle, x, y, w, h });
    }

    /// Register a clickable rectangle targeting `uri`.
    pub fn link(&mut self, x: f64, y: f64, w: f64, h: f64, uri: &str) {
        self.links.push(LinkAnnotation {
            rect: [x, y, x + w, y + h],
            uri: uri.to_string(),
        });
    }

    /// Register a checkbox widget with its bottom-left corner at `(x, y)`.
    pub fn checkbox(&mut self, key: WidgetKey, x: f64, y: f64, size: f64, checked: bool) {
        self.widgets.push(CheckboxWidget {
            key,
            rect: [x, y, x + size, y + size],
            checked,
        });
    }

    #[cfg(test)]
    pub(crate) fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    #[cfg(test)]
    pub(crate) fn links(&self) -> &[LinkAnnotation] {
        &self.links
    }

    #[cfg(test)]
    pub(crate) fn widgets(&self) -> &[CheckboxWidget] {
        &self.widgets
    }
}

/// The output document: the trimmed template plus the ordered content
/// pages and registered images.
#[derive(Debug)]
pub struct ReportDocument {
    inner: lopdf::Document,
    acroform_id: ObjectId,
    cover_pages: usize,
    pages: Vec<ContentPage>,
    images: Vec<LoadedImage>,
}

impl ReportDocument {
    /// Load a template and trim it to its first `cover_pages` pages. A
    /// template with fewer pages than that cannot satisfy the document
    /// model and is a fatal error.
    pub fn from_template(template: &[u8], cover_pages: usize) -> Result<Self, ReportError> {
        let mut inner = lopdf::Document::load_mem(template)
            .map_err(|e| ReportError::Template(format!("failed to parse template: {e}")))?;

        let total = inner.get_pages().len();
        if total < cover_pages {
            return Err(ReportError::Template(format!(
                "template has {total} pages, need at least {cover_pages} cover pages"
            )));
        }
        if total > cover_pages {
            let doomed: Vec<u32> = (cover_pages as u32 + 1..=total as u32).collect();
            inner.delete_pages(&doomed);
        }

        let acroform_id = ensure_acroform(&mut inner)?;
        Ok(Self {
            inner,
            acroform_id,
            cover_pages,
            pages: Vec::new(),
            images: Vec::new(),
        })
    }

    /// Set the value of a named template text field. A field that does not
    /// exist in the template is skipped with a warning.
    pub fn fill_text_field(&mut self, name: &str, value: &str) {
        self.fill_text_field_inner(name, value, None);
    }

    /// Like [`fill_text_field`](Self::fill_text_field), also forcing the
    /// field's appearance font size.
    pub fn fill_text_field_sized(&mut self, name: &str, value: &str, font_size: f64) {
        self.fill_text_field_inner(name, value, Some(font_size));
    }

    fn fill_text_field_inner(&mut self, name: &str, value: &str, font_size: Option<f64>) {
        let Some(field_id) = self.find_field(name) else {
            warn!("template has no form field {name:?}; skipping");
            return;
        };
        let Ok(dict) = self
            .inner
            .get_object_mut(field_id)
            .and_then(Object::as_dict_mut)
        else {
            warn!("form field {name:?} is not a dictionary; skipping");
            return;
        };
        dict.set("V", Object::string_literal(value));
        // Stale appearance streams would show the template's old value;
        // NeedAppearances makes the viewer regenerate them.
        dict.remove(b"AP");
        if let Some(size) = font_size {
            let da = format!("/Helv {size} Tf 0 g");
            dict.set("DA", Object::string_literal(da.as_str()));
        }
    }

    fn find_field(&self, name: &str) -> Option<ObjectId> {
        for id in self.field_ids() {
            if let Ok(dict) = self.inner.get_object(id).and_then(Object::as_dict) {
                if let Ok(t) = dict.get(b"T").and_then(Object::as_str) {
                    if t == name.as_bytes() {
                        return Some(id);
                    }
                }
            }
        }
        None
    }

    fn field_ids(&self) -> Vec<ObjectId> {
        let Ok(fields) = self
            .inner
            .get_object(self.acroform_id)
            .and_then(Object::as_dict)
            .and_then(|d| d.get(b"Fields"))
            .and_then(Object::as_array)
        else {
            return Vec::new();
        };
        fields.iter().filter_map(|o| o.as_reference().ok()).collect()
    }

    fn existing_field_names(&self) -> HashSet<String> {
        self.field_ids()
            .into_iter()
            .filter_map(|id| {
                let dict = self.inner.get_object(id).and_then(Object::as_dict).ok()?;
                let t = dict.get(b"T").and_then(Object::as_str).ok()?;
                Some(String::from_utf8_lossy(t).into_owned())
            })
            .collect()
    }

    /// Open a new content page behind the covers; returns its index.
    pub fn add_content_page(&mut self, width: f64, height: f64) -> usize {
        self.pages.push(ContentPage::new(width, height));
        self.pages.len() - 1
    }

    pub fn page_mut(&mut self, index: usize) -> &mut ContentPage {
        &mut self.pages[index]
    }

    /// Register a decoded image for embedding; cheap handles are copied
    /// into draw ops.
    pub fn register_image(&mut self, image: LoadedImage) -> ImageHandle {
        let handle = ImageHandle {
            index: self.images.len(),
            width_px: image.width_px,
            height_px: image.height_px,
        };
        self.images.push(image);
        handle
    }

    pub fn cover_page_count(&self) -> usize {
        self.cover_pages
    }

    pub fn content_page_count(&self) -> usize {
        self.pages.len()
    }

    /// Physical page count of the finished document.
    pub fn total_page_count(&self) -> usize {
        self.cover_pages + self.pages.len()
    }

    /// 1-based physical page number of content page `index`.
    pub fn physical_page_number(&self, index: usize) -> usize {
        self.cover_pages + index + 1
    }

    /// Materialize all content pages into the PDF object graph and
    /// serialize the document.
    pub fn save(mut self) -> Result<Vec<u8>, ReportError> {
        self.materialize()?;
        let mut buffer = Vec::new();
        self.inner.save_to(&mut buffer)?;
        Ok(buffer)
    }

    fn materialize(&mut self) -> Result<(), ReportError> {
        let catalog_id = root_id(&self.inner)?;
        let pages_root_id = self
            .inner
            .get_object(catalog_id)
            .and_then(Object::as_dict)
            .and_then(|d| d.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|e| ReportError::Template(format!("template has no page tree: {e}")))?;

        let font_regular = self.inner.add_object(font_dict(Font::Helvetica));
        let font_bold = self.inner.add_object(font_dict(Font::HelveticaBold));

        let image_ids = self
            .images
            .iter()
            .map(|img| embed_image(&mut self.inner, img))
            .collect::<Result<Vec<_>, _>>()?;

        let checkbox_on = self.inner.add_object(checkbox_appearance(true));
        let checkbox_off = self.inner.add_object(checkbox_appearance(false));

        let mut taken_names = self.existing_field_names();
        let mut new_page_ids = Vec::new();
        let mut new_field_ids = Vec::new();

        for page in std::mem::take(&mut self.pages) {
            let content = encode_ops(&page.ops);
            let content_id = self.inner.add_object(Stream::new(
                dictionary! {},
                content.encode().map_err(ReportError::Pdf)?,
            ));

            let mut annot_ids = Vec::new();
            for link in &page.links {
                annot_ids.push(self.inner.add_object(link_dict(link)));
            }
            let mut widget_ids = Vec::new();
            for widget in &page.widgets {
                let field_name = unique_field_name(&mut taken_names, &widget.key);
                let id = self.inner.add_object(checkbox_dict(
                    widget,
                    &field_name,
                    checkbox_on,
                    checkbox_off,
                ));
                annot_ids.push(id);
                widget_ids.push(id);
            }

            let resources = page_resources(&page.ops, font_regular, font_bold, &image_ids);
            let page_id = self.inner.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_root_id),
                "MediaBox" => vec![real(0.0), real(0.0), real(page.width), real(page.height)],
                "Contents" => Object::Reference(content_id),
                "Resources" => resources,
                "Annots" => annot_ids
                    .iter()
                    .map(|&id| Object::Reference(id))
                    .collect::<Vec<_>>(),
            });

            // Widgets carry a back-reference to their page.
            for &wid in &widget_ids {
                if let Ok(dict) = self.inner.get_object_mut(wid).and_then(Object::as_dict_mut) {
                    dict.set("P", Object::Reference(page_id));
                }
            }

            new_page_ids.push(page_id);
            new_field_ids.extend(widget_ids);
        }

        // Hang the new pages off the page-tree root.
        let added = new_page_ids.len() as i64;
        let pages_root = self
            .inner
            .get_object_mut(pages_root_id)
            .and_then(Object::as_dict_mut)?;
        let count = pages_root
            .get(b"Count")
            .and_then(Object::as_i64)
            .unwrap_or(0);
        pages_root.set("Count", count + added);
        match pages_root.get_mut(b"Kids").and_then(Object::as_array_mut) {
            Ok(kids) => kids.extend(new_page_ids.iter().map(|&id| Object::Reference(id))),
            Err(_) => {
                let kids: Vec<Object> = new_page_ids.iter().map(|&id| Object::Reference(id)).collect();
                pages_root.set("Kids", kids);
            }
        }

        // Register the checkbox fields and let the viewer regenerate all
        // variable-text appearances.
        let acroform = self
            .inner
            .get_object_mut(self.acroform_id)
            .and_then(Object::as_dict_mut)?;
        acroform.set("NeedAppearances", true);
        match acroform.get_mut(b"Fields").and_then(Object::as_array_mut) {
            Ok(fields) => fields.extend(new_field_ids.iter().map(|&id| Object::Reference(id))),
            Err(_) => {
                let fields: Vec<Object> =
                    new_field_ids.iter().map(|&id| Object::Reference(id)).collect();
                acroform.set("Fields", fields);
            }
        }

        Ok(())
    }
}

fn root_id(doc: &lopdf::Document) -> Result<ObjectId, ReportError> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| ReportError::Template(format!("template has no catalog: {e}")))
}

/// Normalize the catalog's AcroForm to an indirect dictionary object,
/// creating an empty one when the template has none.
fn ensure_acroform(doc: &mut lopdf::Document) -> Result<ObjectId, ReportError> {
    let catalog_id = root_id(doc)?;
    let existing = doc
        .get_object(catalog_id)
        .and_then(Object::as_dict)
        .ok()
        .and_then(|d| d.get(b"AcroForm").ok().cloned());

    let acroform_id = match existing {
        Some(Object::Reference(id)) => id,
        Some(Object::Dictionary(dict)) => doc.add_object(dict),
        _ => doc.add_object(dictionary! { "Fields" => Vec::<Object>::new() }),
    };

    let catalog = doc.get_object_mut(catalog_id).and_then(Object::as_dict_mut)?;
    catalog.set("AcroForm", Object::Reference(acroform_id));
    Ok(acroform_id)
}

/// Derive a document-unique field name from a widget key. Collisions get a
/// deterministic numeric suffix in page order.
fn unique_field_name(taken: &mut HashSet<String>, key: &WidgetKey) -> String {
    let base = key.base_field_name();
    let mut name = base.clone();
    let mut n = 1;
    while taken.contains(&name) {
        n += 1;
        name = format!("{base}_{n}");
    }
    taken.insert(name.clone());
    name
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn font_dict(font: Font) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.pdf_name(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn link_dict(link: &LinkAnnotation) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => link.rect.iter().map(|&v| real(v)).collect::<Vec<_>>(),
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(link.uri.as_str()),
        },
    }
}

/// A shared form XObject drawing the checkbox appearance: an outlined box,
/// with a cross when `on`.
fn checkbox_appearance(on: bool) -> Stream {
    let content = if on {
        "q 1 w 0.5 0.5 9 9 re S 2 2 m 8 8 l S 2 8 m 8 2 l S Q"
    } else {
        "q 1 w 0.5 0.5 9 9 re S Q"
    };
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![real(0.0), real(0.0), real(10.0), real(10.0)],
        },
        content.as_bytes().to_vec(),
    )
}

fn checkbox_dict(
    widget: &CheckboxWidget,
    field_name: &str,
    on: ObjectId,
    off: ObjectId,
) -> Dictionary {
    let state = if widget.checked { "Yes" } else { "Off" };
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "FT" => "Btn",
        "T" => Object::string_literal(field_name),
        "Rect" => widget.rect.iter().map(|&v| real(v)).collect::<Vec<_>>(),
        "F" => 4,
        "V" => state,
        "AS" => state,
        "MK" => dictionary! {
            "BC" => vec![0.into()],
            "BG" => vec![1.into()],
        },
        "AP" => dictionary! {
            "N" => dictionary! {
                "Yes" => Object::Reference(on),
                "Off" => Object::Reference(off),
            },
        },
    }
}

/// Build the /Resources for one page: both fonts, plus the image XObjects
/// its ops actually reference.
fn page_resources(
    ops: &[DrawOp],
    font_regular: ObjectId,
    font_bold: ObjectId,
    image_ids: &[ObjectId],
) -> Dictionary {
    let mut resources = dictionary! {
        "Font" => dictionary! {
            Font::Helvetica.resource_name() => Object::Reference(font_regular),
            Font::HelveticaBold.resource_name() => Object::Reference(font_bold),
        },
    };

    let image_ops: Vec<usize> = ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Image { handle, .. } => Some(handle.index),
            _ => None,
        })
        .collect();
    if !image_ops.is_empty() {
        let mut xobjects = Dictionary::new();
        for index in image_ops {
            xobjects.set(image_resource_name(index), Object::Reference(image_ids[index]));
        }
        resources.set("XObject", xobjects);
    }
    resources
}

fn image_resource_name(index: usize) -> String {
    format!("Im{index}")
}

/// Translate draw ops into a PDF content stream.
fn encode_ops(ops: &[DrawOp]) -> Content {
    let mut operations = Vec::new();
    for op in ops {
        match op {
            DrawOp::Text { text, x, y, size, font } => {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![font.resource_name().into(), real(*size)],
                ));
                operations.push(Operation::new("Td", vec![real(*x), real(*y)]));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(
                        encode_winansi(text),
                        lopdf::StringFormat::Literal,
                    )],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line { x1, y1, x2, y2, width } => {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new("w", vec![real(*width)]));
                operations.push(Operation::new("m", vec![real(*x1), real(*y1)]));
                operations.push(Operation::new("l", vec![real(*x2), real(*y2)]));
                operations.push(Operation::new("S", vec![]));
                operations.push(Operation::new("Q", vec![]));
            }
            DrawOp::Rect { x, y, w, h, border_width, fill_white } => {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new("w", vec![real(*border_width)]));
                if *fill_white {
                    operations.push(Operation::new(
                        "rg",
                        vec![real(1.0), real(1.0), real(1.0)],
                    ));
                    operations.push(Operation::new(
                        "RG",
                        vec![real(0.0), real(0.0), real(0.0)],
                    ));
                }
                operations.push(Operation::new(
                    "re",
                    vec![real(*x), real(*y), real(*w), real(*h)],
                ));
                operations.push(Operation::new(if *fill_white { "B" } else { "S" }, vec![]));
                operations.push(Operation::new("Q", vec![]));
            }
            DrawOp::Image { handle, x, y, w, h } => {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    vec![real(*w), real(0.0), real(0.0), real(*h), real(*x), real(*y)],
                ));
                operations.push(Operation::new(
                    "Do",
                    vec![image_resource_name(handle.index).as_str().into()],
                ));
                operations.push(Operation::new("Q", vec![]));
            }
        }
    }
    Content { operations }
}

/// WinAnsi is a superset of Latin-1 for the range the report uses; anything
/// outside it degrades to '?'.
fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            if code <= 0xFF {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

fn embed_image(doc: &mut lopdf::Document, image: &LoadedImage) -> Result<ObjectId, ReportError> {
    let id = match &image.pixel_data {
        ImagePixelData::Jpeg { data, color_space } => {
            let cs = match color_space {
                JpegColorSpace::DeviceRGB => "DeviceRGB",
                JpegColorSpace::DeviceGray => "DeviceGray",
            };
            doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width_px as i64,
                    "Height" => image.height_px as i64,
                    "ColorSpace" => cs,
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                data.clone(),
            ))
        }
        ImagePixelData::Decoded { rgb, alpha } => {
            let smask_id = match alpha {
                Some(alpha) => Some(doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => image.width_px as i64,
                        "Height" => image.height_px as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                        "Filter" => "FlateDecode",
                    },
                    deflate(alpha)?,
                ))),
                None => None,
            };
            let mut dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width_px as i64,
                "Height" => image.height_px as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            };
            if let Some(smask_id) = smask_id {
                dict.set("SMask", Object::Reference(smask_id));
            }
            doc.add_object(Stream::new(dict, deflate(rgb)?))
        }
    };
    Ok(id)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ReportError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use lopdf::{dictionary, Object, Stream};

    /// Synthesize a minimal template: `page_count` blank Letter pages and
    /// an AcroForm holding the named text fields.
    pub fn template_with_fields(page_count: usize, field_names: &[&str]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for _ in 0..page_count {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );

        let field_ids: Vec<Object> = field_names
            .iter()
            .map(|name| {
                Object::Reference(doc.add_object(dictionary! {
                    "FT" => "Tx",
                    "T" => Object::string_literal(*name),
                    "Rect" => vec![0.into(), 0.into(), 100.into(), 20.into()],
                }))
            })
            .collect();
        let acroform_id = doc.add_object(dictionary! { "Fields" => field_ids });

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
            "AcroForm" => Object::Reference(acroform_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::template_with_fields;
    use super::*;

    #[test]
    fn test_template_trimmed_to_covers() {
        let template = template_with_fields(6, &[]);
        let doc = ReportDocument::from_template(&template, 2).unwrap();
        assert_eq!(doc.total_page_count(), 2);
    }

    #[test]
    fn test_template_too_short_is_fatal() {
        let template = template_with_fields(1, &[]);
        let err = ReportDocument::from_template(&template, 2).unwrap_err();
        assert!(matches!(err, ReportError::Template(_)));
    }

    #[test]
    fn test_garbage_template_is_fatal() {
        let err = ReportDocument::from_template(b"not a pdf", 2).unwrap_err();
        assert!(matches!(err, ReportError::Template(_)));
    }

    #[test]
    fn test_missing_field_is_skipped() {
        let template = template_with_fields(2, &["Name of Client"]);
        let mut doc = ReportDocument::from_template(&template, 2).unwrap();
        doc.fill_text_field("Name of Client", "Jordan Avery");
        doc.fill_text_field("No Such Field", "ignored");
        // Still saves cleanly.
        let bytes = doc.save().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_filled_field_value_round_trips() {
        let template = template_with_fields(2, &["Name of Client"]);
        let mut doc = ReportDocument::from_template(&template, 2).unwrap();
        doc.fill_text_field("Name of Client", "Jordan Avery");
        let bytes = doc.save().unwrap();

        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        let catalog_id = reloaded.trailer.get(b"Root").unwrap().as_reference().unwrap();
        let acroform_id = reloaded
            .get_object(catalog_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"AcroForm")
            .unwrap()
            .as_reference()
            .unwrap();
        let fields = reloaded
            .get_object(acroform_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Fields")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        let field = reloaded
            .get_object(fields[0].as_reference().unwrap())
            .unwrap()
            .as_dict()
            .unwrap();
        assert_eq!(field.get(b"V").unwrap().as_str().unwrap(), b"Jordan Avery");
    }

    #[test]
    fn test_content_pages_append_after_covers() {
        let template = template_with_fields(2, &[]);
        let mut doc = ReportDocument::from_template(&template, 2).unwrap();
        let p = doc.add_content_page(612.0, 792.0);
        doc.page_mut(p)
            .draw_text("Inspection Details", 40.0, 700.0, 11.0, Font::Helvetica);
        assert_eq!(doc.physical_page_number(p), 3);

        let bytes = doc.save().unwrap();
        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 3);
    }

    #[test]
    fn test_widget_names_unique_on_collision() {
        let mut taken = HashSet::new();
        let key = WidgetKey {
            item_id: "a1".to_string(),
            label: "I",
        };
        assert_eq!(unique_field_name(&mut taken, &key), "li_a1_I");
        assert_eq!(unique_field_name(&mut taken, &key), "li_a1_I_2");
        assert_eq!(unique_field_name(&mut taken, &key), "li_a1_I_3");
    }

    #[test]
    fn test_checkbox_and_link_materialize() {
        let template = template_with_fields(2, &[]);
        let mut doc = ReportDocument::from_template(&template, 2).unwrap();
        let p = doc.add_content_page(612.0, 792.0);
        doc.page_mut(p).checkbox(
            WidgetKey {
                item_id: "a1".to_string(),
                label: "D",
            },
            40.0,
            600.0,
            10.0,
            true,
        );
        doc.page_mut(p).link(100.0, 600.0, 80.0, 12.0, "https://example.com/video");
        let bytes = doc.save().unwrap();

        let reloaded = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = reloaded.get_pages();
        let &page_id = pages.get(&3).unwrap();
        let annots = reloaded
            .get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Annots")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(annots.len(), 2);

        let mut subtypes = Vec::new();
        for annot in &annots {
            let dict = reloaded
                .get_object(annot.as_reference().unwrap())
                .unwrap()
                .as_dict()
                .unwrap();
            subtypes.push(dict.get(b"Subtype").unwrap().as_name().unwrap().to_vec());
        }
        subtypes.sort();
        assert_eq!(subtypes, vec![b"Link".to_vec(), b"Widget".to_vec()]);
    }

    #[test]
    fn test_winansi_fallback() {
        assert_eq!(encode_winansi("AB"), vec![b'A', b'B']);
        assert_eq!(encode_winansi("é"), vec![0xE9]);
        assert_eq!(encode_winansi("あ"), vec![b'?']);
    }
}
