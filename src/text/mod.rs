//! # Text Wrapping
//!
//! Greedy word-wrap over real font metrics. Words accumulate into a line
//! while the measured width stays within the limit; a word that alone
//! exceeds the limit is split at the character level, so progress is
//! guaranteed even for a degenerate max width.

use crate::font::Font;

/// Wrap `text` into lines whose measured width fits `max_width` points.
///
/// Splits on whitespace. Returns an empty Vec for empty or all-whitespace
/// input — never a single empty line.
pub fn wrap(text: &str, font: Font, font_size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };

        if font.text_width(&candidate, font_size) <= max_width {
            line = candidate;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }

        if font.text_width(word, font_size) > max_width {
            line = split_oversized(word, font, font_size, max_width, &mut lines);
        } else {
            line = word.to_string();
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Character-level split for a word wider than the whole line. Full chunks
/// are pushed onto `lines`; the trailing partial chunk is returned as the
/// new current line. Each chunk holds at least one character, so the loop
/// always advances.
fn split_oversized(
    word: &str,
    font: Font,
    font_size: f64,
    max_width: f64,
    lines: &mut Vec<String>,
) -> String {
    let mut chunk = String::new();
    for ch in word.chars() {
        let mut candidate = chunk.clone();
        candidate.push(ch);
        if chunk.is_empty() || font.text_width(&candidate, font_size) <= max_width {
            chunk = candidate;
        } else {
            lines.push(std::mem::take(&mut chunk));
            chunk.push(ch);
        }
    }
    chunk
}
