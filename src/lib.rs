//! # Glyphflow
//!
//! An SVG 2 / CSS text layout engine.
//!
//! A `<text>` element is a tree of styled spans. Glyphflow turns that tree
//! into one positioned glyph per character, ready for a painter or a hit
//! tester: explicit `x`/`y`/`dx`/`dy`/`rotate` lists, `textLength`,
//! `text-anchor` and `textPath` for classic SVG text, or wrapping against
//! `inline-size` and inside arbitrary shapes for SVG 2 text.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    : Content tree, path references, config
//!       ↓
//!   [style]    : Resolve inheritance and defaults
//!       ↓
//!   [text]     : Collect, collapse, transforms, breaks, bidi
//!       ↓
//!   [font]     : Resolve, shape and load glyphs
//!       ↓
//!   [layout]   : Lines, baselines, anchoring, paths, decorations
//! ```
//!
//! Font access goes through the [`font::FontBackend`] trait, so layout can
//! run against real OpenType data ([`font::FontRegistry`]) or the
//! deterministic [`font::FixedMetrics`].

pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod style;
pub mod text;

use error::LayoutError;
use font::{FixedMetrics, FontBackend, FontRegistry};
use layout::{LayoutEngine, TextLayout};
use model::TextDocument;

/// Lay out a text document against a font backend.
///
/// This is the primary entry point. Layout itself never fails: missing
/// fonts, glyphs and path references degrade and are logged.
pub fn layout(document: &TextDocument, fonts: &dyn FontBackend) -> TextLayout {
    LayoutEngine::new().layout(document, fonts)
}

/// Lay out a text document described as JSON.
///
/// The document's embedded fonts are registered first. Without any fonts
/// the deterministic fixed-metrics backend is used.
pub fn layout_json(json: &str) -> Result<TextLayout, LayoutError> {
    let document: TextDocument = serde_json::from_str(json)?;
    if document.fonts.is_empty() {
        log::debug!("no embedded fonts, using fixed metrics");
        return Ok(layout(&document, &FixedMetrics::new()));
    }
    let registry = FontRegistry::from_sources(&document.fonts)?;
    Ok(layout(&document, &registry))
}
