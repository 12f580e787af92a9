//! # Style System
//!
//! The CSS/SVG text properties a text content node can carry. Every field of
//! [`Style`] is optional; [`Style::resolve`] folds it over the parent's
//! [`ResolvedStyle`] applying CSS inheritance, so layout code only ever
//! sees concrete values.
//!
//! This is not a general CSS engine. It covers what text layout needs:
//! writing modes, white space, breaking, spacing, alignment, baselines,
//! decorations and font selection.

use serde::{Deserialize, Serialize};

/// The complete set of text style properties for a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    // ── Writing Mode ───────────────────────────────────────────
    pub writing_mode: Option<WritingMode>,
    pub direction: Option<Direction>,
    /// Not inherited. Controls the bidi control characters inserted around
    /// the node's text.
    pub unicode_bidi: Option<UnicodeBidi>,

    // ── White Space & Breaking ─────────────────────────────────
    /// `white-space` / `text-space-collapse`.
    pub white_space: Option<SpaceCollapse>,
    pub text_wrap: Option<TextWrap>,
    pub word_break: Option<WordBreak>,
    pub line_break: Option<LineBreak>,
    pub overflow_wrap: Option<OverflowWrap>,
    pub hanging_punctuation: Option<HangingPunctuation>,
    pub tab_size: Option<TabSize>,

    // ── Spacing & Alignment ────────────────────────────────────
    /// Letter spacing in user units.
    pub letter_spacing: Option<f64>,
    /// Word spacing in user units.
    pub word_spacing: Option<f64>,
    pub text_indent: Option<TextIndent>,
    pub text_align: Option<TextAlign>,
    pub text_align_last: Option<TextAlign>,
    pub text_anchor: Option<TextAnchor>,
    /// Wrapping width. Only read from the root node; `None` means auto.
    pub inline_size: Option<f64>,
    pub line_height: Option<LineHeight>,

    // ── Baselines ──────────────────────────────────────────────
    pub dominant_baseline: Option<Baseline>,
    /// Not inherited.
    pub alignment_baseline: Option<Baseline>,
    /// Not inherited.
    pub baseline_shift: Option<BaselineShift>,

    // ── Decoration ─────────────────────────────────────────────
    /// Not inherited; painted across the node's whole subtree.
    pub text_decoration_line: Option<TextDecorationLine>,
    pub text_decoration_style: Option<TextDecorationStyle>,
    pub text_decoration_color: Option<Color>,
    pub text_decoration_position: Option<UnderlinePosition>,

    // ── Font ───────────────────────────────────────────────────
    /// Family names in preference order.
    pub font_family: Option<Vec<String>>,
    /// Font size in user units.
    pub font_size: Option<f64>,
    pub font_size_adjust: Option<f64>,
    /// Font weight (1-1000).
    pub font_weight: Option<u16>,
    /// Font width as a percentage (50-200).
    pub font_stretch: Option<f64>,
    pub font_style: Option<FontStyle>,
    pub font_variation_settings: Option<Vec<FontAxis>>,
    /// OpenType feature strings, e.g. `"liga=0"`, `"smcp"`.
    pub font_feature_settings: Option<Vec<String>>,
    /// BCP-47 language tag.
    pub lang: Option<String>,
    pub text_rendering: Option<TextRendering>,

    // ── Paint ──────────────────────────────────────────────────
    pub fill: Option<Color>,

    // ── SVG text length ────────────────────────────────────────
    /// Target inline length of the node's text. Not inherited.
    pub text_length: Option<f64>,
    pub length_adjust: Option<LengthAdjust>,

    // ── Shape wrapping ─────────────────────────────────────────
    /// Growth applied to shape-subtract outlines.
    pub shape_margin: Option<f64>,
    /// Inset applied to shape-inside outlines.
    pub shape_padding: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritingMode {
    #[default]
    HorizontalTb,
    VerticalRl,
    VerticalLr,
}

impl WritingMode {
    pub fn is_horizontal(self) -> bool {
        matches!(self, WritingMode::HorizontalTb)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnicodeBidi {
    #[default]
    Normal,
    Embed,
    Isolate,
    BidiOverride,
    IsolateOverride,
    Plaintext,
}

/// White space collapsing modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceCollapse {
    #[default]
    Collapse,
    Discard,
    Preserve,
    PreserveBreaks,
    PreserveSpaces,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextWrap {
    #[default]
    Wrap,
    NoWrap,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordBreak {
    #[default]
    Normal,
    KeepAll,
    BreakAll,
    BreakWord,
}

/// `line-break` strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineBreak {
    #[default]
    Auto,
    Loose,
    Normal,
    Strict,
    Anywhere,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverflowWrap {
    #[default]
    Normal,
    Anywhere,
    BreakWord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HangingPunctuation {
    pub first: bool,
    pub last: bool,
    pub allow_end: bool,
    pub force_end: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TabSize {
    /// Multiple of the space advance.
    Spaces(f64),
    /// Absolute length in user units.
    Length(f64),
}

impl Default for TabSize {
    fn default() -> Self {
        TabSize::Spaces(8.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextIndent {
    pub length: f64,
    /// Indent every line except the first.
    pub hanging: bool,
    /// Indent after every forced break, not only the first line.
    pub each_line: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
    Justify,
    JustifyAll,
    /// Only meaningful for `text-align-last`.
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum LineHeight {
    #[default]
    Normal,
    /// Multiple of the font size.
    Number(f64),
    /// Absolute length in user units.
    Length(f64),
}

/// Baseline keywords shared by `dominant-baseline` and
/// `alignment-baseline`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Baseline {
    #[default]
    Auto,
    Alphabetic,
    Ideographic,
    IdeographicTop,
    IdeographicCenter,
    Hanging,
    Mathematical,
    Central,
    Middle,
    TextTop,
    TextBottom,
    /// `alignment-baseline` only: align on the dominant baseline.
    Dominant,
    /// `dominant-baseline` only: reuse the parent's table unscaled.
    NoChange,
    /// `dominant-baseline` only: rescale the parent's table by font size.
    ResetSize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum BaselineShift {
    #[default]
    None,
    Sub,
    Super,
    /// Absolute length in user units, positive is up.
    Length(f64),
    /// Fraction of the font size, positive is up.
    Percentage(f64),
    LineTop,
    LineBottom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextDecorationLine {
    pub underline: bool,
    pub overline: bool,
    pub line_through: bool,
}

impl TextDecorationLine {
    pub fn is_none(&self) -> bool {
        !self.underline && !self.overline && !self.line_through
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDecorationStyle {
    #[default]
    Solid,
    Double,
    Dotted,
    Dashed,
    Wavy,
}

/// `text-underline-position`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnderlinePosition {
    /// Place the underline below the descender instead of the font's
    /// underline offset.
    pub under: bool,
    /// In vertical writing, draw on the left side instead of the right.
    pub left: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontAxis {
    /// Four-letter axis tag, e.g. `"wght"`.
    pub tag: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextRendering {
    #[default]
    Auto,
    OptimizeSpeed,
    OptimizeLegibility,
    GeometricPrecision,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthAdjust {
    #[default]
    Spacing,
    SpacingAndGlyphs,
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0) as f64 / 255.0;
        match hex.len() {
            3 => Self::rgb(
                channel(&hex[0..1].repeat(2)),
                channel(&hex[1..2].repeat(2)),
                channel(&hex[2..3].repeat(2)),
            ),
            6 => Self::rgb(channel(&hex[0..2]), channel(&hex[2..4]), channel(&hex[4..6])),
            _ => Color::BLACK,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Resolved style: all values are concrete (no Option).
/// This is what the layout passes work with after style resolution.
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    pub writing_mode: WritingMode,
    pub direction: Direction,
    pub unicode_bidi: UnicodeBidi,

    pub white_space: SpaceCollapse,
    pub text_wrap: TextWrap,
    pub word_break: WordBreak,
    pub line_break: LineBreak,
    pub overflow_wrap: OverflowWrap,
    pub hanging_punctuation: HangingPunctuation,
    pub tab_size: TabSize,

    pub letter_spacing: f64,
    pub word_spacing: f64,
    pub text_indent: TextIndent,
    pub text_align: TextAlign,
    pub text_align_last: TextAlign,
    pub text_anchor: TextAnchor,
    pub inline_size: Option<f64>,
    pub line_height: LineHeight,

    pub dominant_baseline: Baseline,
    pub alignment_baseline: Baseline,
    pub baseline_shift: BaselineShift,

    pub text_decoration_line: TextDecorationLine,
    pub text_decoration_style: TextDecorationStyle,
    pub text_decoration_color: Option<Color>,
    pub text_decoration_position: UnderlinePosition,

    pub font_family: Vec<String>,
    pub font_size: f64,
    pub font_size_adjust: Option<f64>,
    pub font_weight: u16,
    pub font_stretch: f64,
    pub font_style: FontStyle,
    pub font_variation_settings: Vec<FontAxis>,
    pub font_feature_settings: Vec<String>,
    pub lang: Option<String>,
    pub text_rendering: TextRendering,

    pub fill: Color,

    pub text_length: Option<f64>,
    pub length_adjust: LengthAdjust,

    pub shape_margin: f64,
    pub shape_padding: f64,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Style::default().resolve(None)
    }
}

impl ResolvedStyle {
    pub fn is_horizontal(&self) -> bool {
        self.writing_mode.is_horizontal()
    }

    pub fn is_rtl(&self) -> bool {
        self.direction == Direction::Rtl
    }

    /// Whether soft wrap opportunities may be taken.
    pub fn wraps(&self) -> bool {
        self.text_wrap != TextWrap::NoWrap
    }

    /// Line height in user units, `None` for `normal` (font line gap).
    pub fn line_height_px(&self) -> Option<f64> {
        match self.line_height {
            LineHeight::Normal => None,
            LineHeight::Number(n) => Some(n * self.font_size),
            LineHeight::Length(l) => Some(l),
        }
    }
}

impl Style {
    /// Resolve this style against a parent's resolved style.
    pub fn resolve(&self, parent: Option<&ResolvedStyle>) -> ResolvedStyle {
        let parent_font_size = parent.map(|p| p.font_size).unwrap_or(16.0);
        let font_size = self.font_size.unwrap_or(parent_font_size);

        // Inherit from the parent, falling back to the initial value.
        macro_rules! inherit {
            ($field:ident, $initial:expr) => {
                self.$field
                    .clone()
                    .unwrap_or_else(|| parent.map(|p| p.$field.clone()).unwrap_or($initial))
            };
        }

        ResolvedStyle {
            writing_mode: inherit!(writing_mode, WritingMode::default()),
            direction: inherit!(direction, Direction::default()),
            unicode_bidi: self.unicode_bidi.unwrap_or_default(),

            white_space: inherit!(white_space, SpaceCollapse::default()),
            text_wrap: inherit!(text_wrap, TextWrap::default()),
            word_break: inherit!(word_break, WordBreak::default()),
            line_break: inherit!(line_break, LineBreak::default()),
            overflow_wrap: inherit!(overflow_wrap, OverflowWrap::default()),
            hanging_punctuation: inherit!(hanging_punctuation, HangingPunctuation::default()),
            tab_size: inherit!(tab_size, TabSize::default()),

            letter_spacing: inherit!(letter_spacing, 0.0),
            word_spacing: inherit!(word_spacing, 0.0),
            text_indent: inherit!(text_indent, TextIndent::default()),
            text_align: inherit!(text_align, TextAlign::default()),
            text_align_last: inherit!(text_align_last, TextAlign::Auto),
            text_anchor: inherit!(text_anchor, TextAnchor::default()),
            inline_size: self.inline_size,
            line_height: inherit!(line_height, LineHeight::default()),

            dominant_baseline: inherit!(dominant_baseline, Baseline::Auto),
            alignment_baseline: self.alignment_baseline.unwrap_or_default(),
            baseline_shift: self.baseline_shift.unwrap_or_default(),

            text_decoration_line: self.text_decoration_line.unwrap_or_default(),
            text_decoration_style: self.text_decoration_style.unwrap_or_default(),
            text_decoration_color: self.text_decoration_color,
            text_decoration_position: inherit!(
                text_decoration_position,
                UnderlinePosition::default()
            ),

            font_family: inherit!(font_family, vec!["sans-serif".to_string()]),
            font_size,
            font_size_adjust: self
                .font_size_adjust
                .or_else(|| parent.and_then(|p| p.font_size_adjust)),
            font_weight: inherit!(font_weight, 400),
            font_stretch: inherit!(font_stretch, 100.0),
            font_style: inherit!(font_style, FontStyle::default()),
            font_variation_settings: inherit!(font_variation_settings, Vec::new()),
            font_feature_settings: inherit!(font_feature_settings, Vec::new()),
            lang: self.lang.clone().or_else(|| parent.and_then(|p| p.lang.clone())),
            text_rendering: inherit!(text_rendering, TextRendering::default()),

            fill: inherit!(fill, Color::BLACK),

            text_length: self.text_length,
            length_adjust: self.length_adjust.unwrap_or_default(),

            shape_margin: self.shape_margin.unwrap_or(0.0),
            shape_padding: self.shape_padding.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherited_properties_flow_down() {
        let parent = Style {
            font_size: Some(24.0),
            writing_mode: Some(WritingMode::VerticalRl),
            white_space: Some(SpaceCollapse::Preserve),
            ..Default::default()
        }
        .resolve(None);
        let child = Style::default().resolve(Some(&parent));
        assert_eq!(child.font_size, 24.0);
        assert!(!child.is_horizontal());
        assert_eq!(child.white_space, SpaceCollapse::Preserve);
    }

    #[test]
    fn test_non_inherited_properties_reset() {
        let parent = Style {
            baseline_shift: Some(BaselineShift::Super),
            text_length: Some(100.0),
            text_decoration_line: Some(TextDecorationLine {
                underline: true,
                ..Default::default()
            }),
            inline_size: Some(200.0),
            ..Default::default()
        }
        .resolve(None);
        let child = Style::default().resolve(Some(&parent));
        assert_eq!(child.baseline_shift, BaselineShift::None);
        assert_eq!(child.text_length, None);
        assert!(child.text_decoration_line.is_none());
        assert_eq!(child.inline_size, None);
    }

    #[test]
    fn test_line_height_px() {
        let style = Style {
            font_size: Some(10.0),
            line_height: Some(LineHeight::Number(1.5)),
            ..Default::default()
        }
        .resolve(None);
        assert_eq!(style.line_height_px(), Some(15.0));
        assert_eq!(ResolvedStyle::default().line_height_px(), None);
    }

    #[test]
    fn test_style_deserialize_camel_case() {
        let json = r#"{"fontSize": 12, "whiteSpace": "PreserveBreaks",
            "textDecorationLine": {"lineThrough": true},
            "baselineShift": {"Length": 3.0}}"#;
        let style: Style = serde_json::from_str(json).unwrap();
        assert_eq!(style.font_size, Some(12.0));
        assert_eq!(style.white_space, Some(SpaceCollapse::PreserveBreaks));
        assert!(style.text_decoration_line.unwrap().line_through);
        assert_eq!(style.baseline_shift, Some(BaselineShift::Length(3.0)));
    }

    #[test]
    fn test_color_hex() {
        let c = Color::hex("#ff0000");
        assert!((c.r - 1.0).abs() < 0.01 && c.g.abs() < 0.01);
        let short = Color::hex("#0f0");
        assert!((short.g - 1.0).abs() < 0.01);
    }
}
