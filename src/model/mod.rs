//! # Document Model
//!
//! The input representation for the layout engine. A text document is a tree
//! of content nodes: the root plays the role of an SVG `<text>` element, and
//! nested nodes are `<tspan>`/`<textPath>`-like spans. Leaves carry the
//! literal text. The model is designed to be produced by an SVG parser or by
//! direct JSON construction.
//!
//! Layout never walks this serde tree directly; [`tree::TextTree`] flattens
//! it into an arena first.

pub mod tree;

use crate::style::{Style, TextRendering};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use tree::{NodeId, TextNode, TextPath, TextTree};

/// A complete text element ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocument {
    /// The text element itself.
    pub root: TextContent,

    /// Path geometry referenced by `textPath` nodes, keyed by id. Values are
    /// SVG path data strings.
    #[serde(default)]
    pub paths: HashMap<String, String>,

    /// Shapes the text flows inside, in order (SVG path data).
    #[serde(default)]
    pub shapes_inside: Vec<String>,

    /// Shapes the text must avoid (SVG path data).
    #[serde(default)]
    pub shapes_subtract: Vec<String>,

    /// Custom fonts to register before layout.
    #[serde(default)]
    pub fonts: Vec<FontSource>,

    #[serde(default)]
    pub config: LayoutConfig,
}

/// One node of the content tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    /// Literal text. A node with text and children lays the text out before
    /// its children.
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub style: Style,

    #[serde(default)]
    pub children: Vec<TextContent>,

    /// Absolute positions per addressable character.
    #[serde(default)]
    pub x: Vec<f64>,
    #[serde(default)]
    pub y: Vec<f64>,
    /// Relative shifts per addressable character.
    #[serde(default)]
    pub dx: Vec<f64>,
    #[serde(default)]
    pub dy: Vec<f64>,
    /// Rotation in degrees per addressable character.
    #[serde(default)]
    pub rotate: Vec<f64>,

    /// Lay the node's content along a path.
    #[serde(default)]
    pub text_path: Option<TextPathRef>,

    #[serde(default)]
    pub id: Option<String>,
}

/// A `textPath` reference and its layout attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPathRef {
    /// Id into [`TextDocument::paths`].
    #[serde(default)]
    pub href: Option<String>,
    /// Inline path data, used when `href` is absent.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub side: PathSide,
    #[serde(default)]
    pub start_offset: PathOffset,
    #[serde(default)]
    pub method: PathMethod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathSide {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathOffset {
    /// Distance along the path in user units.
    Length(f64),
    /// Percentage (0-100) of the path length.
    Percent(f64),
}

impl Default for PathOffset {
    fn default() -> Self {
        PathOffset::Length(0.0)
    }
}

impl PathOffset {
    pub fn resolve(&self, path_length: f64) -> f64 {
        match *self {
            PathOffset::Length(l) => l,
            PathOffset::Percent(p) => path_length * p / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathMethod {
    #[default]
    Align,
    Stretch,
}

/// A custom font to register with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSource {
    /// Font family name (e.g. "Inter", "Noto Sans").
    pub family: String,
    /// Base64-encoded font data, a data URI (e.g. "data:font/ttf;base64,..."),
    /// or a file path.
    pub src: String,
    /// Font weight (100-900). Defaults to 400.
    #[serde(default = "default_weight")]
    pub weight: u16,
    /// Whether this is an italic variant.
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u16 {
    400
}

/// Tunables for a layout pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Device resolution in dots per inch, used for bitmap strikes.
    pub resolution: f64,
    /// Flattening tolerance for shapes, text paths and emboldening.
    pub path_tolerance: f64,
    /// Rounding tolerance for shape line fitting.
    pub shape_precision: f64,
    /// Only consider the first font family, without per-character fallback.
    pub disable_font_matching: bool,
    /// Rendering intent used where a node doesn't set `text-rendering`.
    pub text_rendering: TextRendering,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            resolution: 72.0,
            path_tolerance: 0.1,
            shape_precision: 1e-3,
            disable_font_matching: false,
            text_rendering: TextRendering::Auto,
        }
    }
}

impl TextContent {
    /// A leaf node with literal text and a style.
    pub fn text(text: &str, style: Style) -> Self {
        Self {
            text: Some(text.to_string()),
            style,
            ..Default::default()
        }
    }

    /// A span node wrapping children.
    pub fn span(style: Style, children: Vec<TextContent>) -> Self {
        Self {
            style,
            children,
            ..Default::default()
        }
    }
}
