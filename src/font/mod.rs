//! # Font Management
//!
//! The report uses two of the standard PDF fonts — Helvetica for body text
//! and Helvetica-Bold for titles — which need no embedding. Measurement
//! runs over built-in advance-width tables so layout decisions are exact
//! for the glyphs a PDF viewer will actually draw.

pub mod metrics;

use metrics::StandardFontMetrics;

/// The faces available to the report renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    /// The PDF BaseFont name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// The resource name this face is registered under on content pages.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Font::Helvetica => metrics::HELVETICA,
            Font::HelveticaBold => metrics::HELVETICA_BOLD,
        }
    }

    /// Measure the width of a string in points at `font_size`.
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        self.metrics().measure_string(text, font_size)
    }
}
