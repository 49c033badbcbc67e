//! # Asset Loading and Decoding
//!
//! Fetches remote photo/video-thumbnail bytes, sniffs the raster format by
//! byte signature, and prepares pixels for PDF embedding. JPEG images pass
//! through without re-encoding (DCTDecode); PNG images decode to RGB with a
//! separate alpha channel for SMask transparency.
//!
//! Every result is cached for the lifetime of one document-generation run,
//! keyed by source URL. Failures of any kind — transport, HTTP status,
//! decode — collapse to [`ImageOutcome::Unavailable`]; callers fall back,
//! they never abort.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::time::Duration;

use log::{debug, warn};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Raw-bytes fetch capability. The production implementation is HTTP; tests
/// substitute canned bytes.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Why a fetch produced no bytes. Only ever logged — the loader absorbs it.
#[derive(Debug)]
pub struct FetchError(pub String);

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build();
        Self { agent }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| FetchError(format!("request failed: {e}")))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| FetchError(format!("read failed: {e}")))?;
        Ok(bytes)
    }
}

/// The tagged result of an asset load. Matched exhaustively by callers;
/// `Unavailable` means "omit or fall back", never an error.
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Loaded(LoadedImage),
    Unavailable,
}

/// A fully decoded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

/// Pixel data in a form the document layer can embed directly.
#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes — embed directly with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// Decoded RGB pixels + optional alpha channel.
    Decoded {
        /// width * height * 3 bytes (RGB)
        rgb: Vec<u8>,
        /// width * height bytes (grayscale alpha). None if fully opaque.
        alpha: Option<Vec<u8>>,
    },
}

/// JPEG color space for the PDF /ColorSpace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Per-run image cache over a fetch capability. A given URL resolves to the
/// same outcome for the remainder of the run and is fetched at most once.
pub struct AssetLoader<'a> {
    fetcher: &'a dyn Fetcher,
    cache: HashMap<String, ImageOutcome>,
}

impl<'a> AssetLoader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self {
            fetcher,
            cache: HashMap::new(),
        }
    }

    /// Fetch, sniff, and decode `url`, or return the cached outcome.
    pub fn load(&mut self, url: &str) -> ImageOutcome {
        if let Some(cached) = self.cache.get(url) {
            return cached.clone();
        }
        let outcome = self.load_uncached(url);
        self.cache.insert(url.to_string(), outcome.clone());
        outcome
    }

    fn load_uncached(&self, url: &str) -> ImageOutcome {
        let bytes = match self.fetcher.fetch(url) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("image fetch failed for {url}: {e}");
                return ImageOutcome::Unavailable;
            }
        };
        match decode_image_bytes(&bytes) {
            Ok(image) => {
                debug!(
                    "loaded {url}: {}x{} px",
                    image.width_px, image.height_px
                );
                ImageOutcome::Loaded(image)
            }
            Err(e) => {
                warn!("image decode failed for {url}: {e}");
                ImageOutcome::Unavailable
            }
        }
    }
}

/// Detect image format from magic bytes and decode accordingly. A PNG
/// prefix selects PNG decoding; anything else is treated as JPEG — the
/// deliberate fallback for this pipeline's media store, which only ever
/// serves those two formats.
fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    if data.len() < 4 {
        return Err("image data too short".to_string());
    }
    if is_png(data) {
        decode_png(data)
    } else {
        decode_jpeg(data)
    }
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= PNG_MAGIC.len() && data[..PNG_MAGIC.len()] == PNG_MAGIC
}

/// JPEG: read dimensions and color space without decoding pixels. The raw
/// bytes pass through to the PDF (DCTDecode).
fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("format detection error: {e}"))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| format!("failed to read JPEG dimensions: {e}"))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: detect_jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Scan JPEG markers for the SOF segment and read the component count to
/// determine the color space.
fn detect_jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        // SOF markers: C0-C3, C5-C7, C9-CB, CD-CF
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            // SOF segment: length(2) + precision(1) + height(2) + width(2) + num_components(1)
            if i + 9 < data.len() {
                return if data[i + 9] == 1 {
                    JpegColorSpace::DeviceGray
                } else {
                    JpegColorSpace::DeviceRGB
                };
            }
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    JpegColorSpace::DeviceRGB
}

/// PNG: decode to RGBA, split into RGB + alpha.
fn decode_png(data: &[u8]) -> Result<LoadedImage, String> {
    let reader = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("format detection error: {e}"))?;

    let img = reader
        .decode()
        .map_err(|e| format!("failed to decode PNG: {e}"))?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    let mut has_transparency = false;

    for pixel in rgba.pixels() {
        rgb.push(pixel[0]);
        rgb.push(pixel[1]);
        rgb.push(pixel[2]);
        let a = pixel[3];
        alpha.push(a);
        if a != 255 {
            has_transparency = true;
        }
    }

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if has_transparency { Some(alpha) } else { None },
        },
        width_px: width,
        height_px: height,
    })
}

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned-bytes fetcher that counts calls per URL.
    pub struct StubFetcher {
        responses: HashMap<String, Vec<u8>>,
        pub calls: RefCell<HashMap<String, usize>>,
    }

    impl StubFetcher {
        pub fn new(responses: Vec<(&str, Vec<u8>)>) -> Self {
            Self {
                responses: responses
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                calls: RefCell::new(HashMap::new()),
            }
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.calls.borrow().get(url).copied().unwrap_or(0)
        }
    }

    impl Fetcher for StubFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            *self.calls.borrow_mut().entry(url.to_string()).or_insert(0) += 1;
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError(format!("no route for {url}")))
        }
    }

    /// A 1x1 opaque PNG, encoded through the image crate.
    pub fn tiny_png() -> Vec<u8> {
        encode_png(image::Rgba([200, 40, 40, 255]))
    }

    /// A 1x1 half-transparent PNG.
    pub fn tiny_png_alpha() -> Vec<u8> {
        encode_png(image::Rgba([200, 40, 40, 128]))
    }

    fn encode_png(px: image::Rgba<u8>) -> Vec<u8> {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, px);
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 1, 1, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    /// A 2x2 RGB JPEG.
    pub fn tiny_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_fn(2, 2, |_, _| image::Rgb([0, 128, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 2, 2, image::ColorType::Rgb8)
            .unwrap();
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_png_magic_detected() {
        assert!(is_png(&PNG_MAGIC));
        assert!(!is_png(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0]));
    }

    #[test]
    fn test_short_data_is_error() {
        assert!(decode_image_bytes(&[0x00, 0x01]).is_err());
    }

    #[test]
    fn test_unknown_signature_treated_as_jpeg() {
        // Not a PNG prefix, so the JPEG path runs — and fails to decode.
        let err = decode_image_bytes(&[0x47, 0x49, 0x46, 0x38, 0x39, 0x61]).unwrap_err();
        assert!(err.contains("JPEG") || err.contains("format"), "{err}");
    }

    #[test]
    fn test_decode_opaque_png_drops_alpha() {
        let loaded = decode_image_bytes(&tiny_png()).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (1, 1));
        match &loaded.pixel_data {
            ImagePixelData::Decoded { rgb, alpha } => {
                assert_eq!(rgb, &[200, 40, 40]);
                assert!(alpha.is_none());
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_decode_png_keeps_alpha() {
        let loaded = decode_image_bytes(&tiny_png_alpha()).unwrap();
        match &loaded.pixel_data {
            ImagePixelData::Decoded { alpha, .. } => {
                assert_eq!(alpha.as_deref(), Some(&[128][..]));
            }
            _ => panic!("PNG should decode to Decoded variant"),
        }
    }

    #[test]
    fn test_jpeg_passes_through() {
        let loaded = decode_image_bytes(&tiny_jpeg()).unwrap();
        assert_eq!((loaded.width_px, loaded.height_px), (2, 2));
        match &loaded.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                assert!(data.starts_with(&[0xFF, 0xD8]));
                assert_eq!(*color_space, JpegColorSpace::DeviceRGB);
            }
            _ => panic!("JPEG should stay as Jpeg variant"),
        }
    }

    #[test]
    fn test_loader_caches_success() {
        let fetcher = StubFetcher::new(vec![("http://img/a.png", tiny_png())]);
        let mut loader = AssetLoader::new(&fetcher);

        assert!(matches!(loader.load("http://img/a.png"), ImageOutcome::Loaded(_)));
        assert!(matches!(loader.load("http://img/a.png"), ImageOutcome::Loaded(_)));
        assert_eq!(fetcher.call_count("http://img/a.png"), 1);
    }

    #[test]
    fn test_loader_caches_failure() {
        let fetcher = StubFetcher::new(vec![]);
        let mut loader = AssetLoader::new(&fetcher);

        assert!(matches!(loader.load("http://img/missing.png"), ImageOutcome::Unavailable));
        assert!(matches!(loader.load("http://img/missing.png"), ImageOutcome::Unavailable));
        assert_eq!(fetcher.call_count("http://img/missing.png"), 1);
    }

    #[test]
    fn test_undecodable_bytes_are_unavailable() {
        let fetcher = StubFetcher::new(vec![("http://img/garbage", b"not an image at all".to_vec())]);
        let mut loader = AssetLoader::new(&fetcher);
        assert!(matches!(loader.load("http://img/garbage"), ImageOutcome::Unavailable));
    }
}
