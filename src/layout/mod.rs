//! # Text Layout Engine
//!
//! Turns a styled content tree into positioned glyphs, one
//! [`CharacterResult`] per character of the collected text.
//!
//! ## The Pass Order
//!
//! Every pass mutates the same character buffer in sequence. Nothing is
//! patched incrementally: a new layout always starts from the tree.
//!
//! 1. Collect the leaf text, collapse white space, resolve explicit
//!    `x`/`y`/`dx`/`dy`/`rotate` lists and classify breaks.
//! 2. Shape every leaf with its fonts and load the glyphs ([`glyphs`]).
//! 3. Resolve alignment baselines and `baseline-shift` per node
//!    ([`metrics`]).
//! 4. Break lines: greedily against `inline-size` ([`lines`]) or inside
//!    the wrapping shapes ([`in_shape`]).
//! 5. Align `text-top`/`text-bottom` and `line-top`/`line-bottom` boxes
//!    against the finished lines.
//! 6. Unwrapped text only (SVG 1.1 positioning): apply `dx`/`dy`,
//!    `textLength`, absolute positions and chunk anchoring
//!    ([`anchoring`]), then warp along text paths ([`text_path`]).
//! 7. Generate decorations ([`decoration`]) and the cursor table
//!    ([`cursor`]).
//!
//! The important trick is in step 6: decorations are computed from the
//! positions *before* the text path warp and bent along the path
//! afterwards, the same way glyph outlines are.

mod anchoring;
mod cursor;
mod decoration;
mod glyphs;
mod in_shape;
mod lines;
mod metrics;
mod text_path;

use std::collections::BTreeMap;

use crate::font::{FontBackend, FontMetrics, Glyph};
use crate::geometry::{parse_path_checked, Affine, BezPath, Line, Point, Rect, Vec2};
use crate::model::{NodeId, TextDocument, TextTree};
use crate::style::{Color, Direction, LineBreak, OverflowWrap, TextAnchor, WordBreak, WritingMode};
use crate::text::bidi::resolve_levels;
use crate::text::breaks::{
    grapheme_boundaries, hanging_behaviour, justification_opportunities, line_breaks,
    patch_line_breaks, replace_hard_breaks, word_boundaries, BreakSettings, BreakType,
    LineEdgeBehaviour,
};
use crate::text::collect::collect_text;
use crate::text::transforms::{addressable_mask, resolve_transforms, CharTransformation};
use crate::text::whitespace::{collapse_last_space, collapse_spaces, hang_last_space};

pub use cursor::CursorPos;
pub use decoration::DecorationKind;

/// Caret and hit-testing data for one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorInfo {
    /// Caret line in glyph space.
    pub caret: Line,
    /// Caret offsets inside the cluster along the inline axis.
    pub offsets: Vec<Vec2>,
    /// Plain-text indices of the grapheme ends inside the cluster. Anchored
    /// chunk starts get their start index first, one per entry of `offsets`.
    pub grapheme_indices: Vec<usize>,
    pub rtl: bool,
    pub is_word_boundary: bool,
    pub color: Color,
}

impl Default for CursorInfo {
    fn default() -> Self {
        Self {
            caret: Line::new(Point::ZERO, Point::ZERO),
            offsets: Vec::new(),
            grapheme_indices: Vec::new(),
            rtl: false,
            is_word_boundary: false,
            color: Color::BLACK,
        }
    }
}

/// Layout state of one character.
///
/// Positions are user space, y down. Glyph geometry, `bounding_box` and
/// `ink_bounding_box` are relative to the glyph origin and placed with
/// [`CharacterResult::final_transform`].
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterResult {
    pub final_position: Point,
    /// Position from the CSS line layout, before SVG positioning.
    pub css_position: Point,
    /// Shift added by anchoring and text paths.
    pub text_path_and_anchoring_offset: Vec2,
    /// Alignment-baseline plus baseline-shift offset.
    pub baseline_offset: Vec2,
    /// Radians.
    pub rotate: f64,
    pub advance: Vec2,
    pub glyph: Glyph,
    /// Layout box: advance by ascent and descent.
    pub bounding_box: Rect,
    pub ink_bounding_box: Rect,
    /// Block-axis coordinate of the ascent edge: top in horizontal mode, right
    /// in vertical mode.
    pub scaled_ascent: f64,
    pub scaled_descent: f64,
    pub scaled_half_leading: f64,
    pub metrics: FontMetrics,
    pub font_size: f64,
    pub horizontal: bool,

    pub hidden: bool,
    pub addressable: bool,
    /// Continuation of a cluster: no glyph of its own.
    pub middle: bool,
    pub anchored_chunk: bool,
    pub hanging: bool,
    pub text_length_applied: bool,
    pub overflow_wrap: bool,

    pub break_type: BreakType,
    pub line_start: LineEdgeBehaviour,
    pub line_end: LineEdgeBehaviour,
    pub justify_before: bool,
    pub justify_after: bool,

    pub direction: Direction,
    pub anchor: TextAnchor,
    /// Tab stop distance for tab characters.
    pub tab_size: Option<f64>,
    pub visual_index: Option<usize>,
    pub plain_index: Option<usize>,
    pub cursor_info: CursorInfo,
}

impl Default for CharacterResult {
    fn default() -> Self {
        Self {
            final_position: Point::ZERO,
            css_position: Point::ZERO,
            text_path_and_anchoring_offset: Vec2::ZERO,
            baseline_offset: Vec2::ZERO,
            rotate: 0.0,
            advance: Vec2::ZERO,
            glyph: Glyph::None,
            bounding_box: Rect::ZERO,
            ink_bounding_box: Rect::ZERO,
            scaled_ascent: 0.0,
            scaled_descent: 0.0,
            scaled_half_leading: 0.0,
            metrics: FontMetrics::default(),
            font_size: 0.0,
            horizontal: true,
            hidden: false,
            addressable: true,
            middle: false,
            anchored_chunk: false,
            hanging: false,
            text_length_applied: false,
            overflow_wrap: false,
            break_type: BreakType::NoBreak,
            line_start: LineEdgeBehaviour::NoChange,
            line_end: LineEdgeBehaviour::NoChange,
            justify_before: false,
            justify_after: false,
            direction: Direction::Ltr,
            anchor: TextAnchor::Start,
            tab_size: None,
            visual_index: None,
            plain_index: None,
            cursor_info: CursorInfo::default(),
        }
    }
}

impl CharacterResult {
    pub fn layout_box(&self) -> Rect {
        self.bounding_box
    }

    /// Layout box grown by the half-leading on the block axis.
    pub fn line_height_box(&self) -> Rect {
        let r = self.bounding_box;
        let hl = self.scaled_half_leading;
        if self.horizontal {
            Rect::new(r.x0, r.y0 - hl, r.x1, r.y1 + hl)
        } else {
            Rect::new(r.x0 - hl, r.y0, r.x1 + hl, r.y1)
        }
    }

    pub fn total_baseline_offset(&self) -> Vec2 {
        self.baseline_offset
    }

    /// Glyph space to user space.
    pub fn final_transform(&self) -> Affine {
        Affine::translate(self.final_position.to_vec2()) * Affine::rotate(self.rotate)
    }

    /// Scale glyph, advance and boxes. A zero factor empties the glyph.
    pub fn scale(&mut self, x: f64, y: f64) {
        if x == 1.0 && y == 1.0 {
            return;
        }
        let affine = Affine::scale_non_uniform(x, y);
        if x > 0.0 && y > 0.0 {
            self.glyph.transform(affine);
        } else {
            self.glyph = Glyph::None;
        }
        self.advance = Vec2::new(self.advance.x * x, self.advance.y * y);
        self.bounding_box = affine.transform_rect_bbox(self.bounding_box);
        self.ink_bounding_box = affine.transform_rect_bbox(self.ink_bounding_box);
        let block = if self.horizontal { y } else { x };
        self.scaled_ascent *= block;
        self.scaled_descent *= block;
        self.scaled_half_leading *= block;
    }

    /// Stretch a tab to the next tab stop from `pos`.
    pub fn apply_tab_size(&mut self, pos: Point) {
        let Some(tab) = self.tab_size else {
            return;
        };
        if !tab.is_finite() || tab <= 0.0 {
            return;
        }
        let current = if self.horizontal { pos.x } else { pos.y };
        let remainder = tab - current.rem_euclid(tab);
        if self.horizontal {
            self.advance.x = remainder;
            self.bounding_box.x1 = self.bounding_box.x0 + remainder;
        } else {
            self.advance.y = remainder;
            self.bounding_box.y1 = self.bounding_box.y0 + remainder;
        }
    }
}

/// An inline-axis span available to part of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChunk {
    pub length: Line,
    /// Character indices, in the order they were added.
    pub chunk_indices: Vec<usize>,
    pub bounding_box: Rect,
    /// How far a hanging character sticks out past `length`.
    pub conditional_hang_end: Vec2,
}

impl LineChunk {
    pub fn new(length: Line) -> Self {
        Self {
            length,
            chunk_indices: Vec::new(),
            bounding_box: Rect::ZERO,
            conditional_hang_end: Vec2::ZERO,
        }
    }
}

/// One line: a chunk per free span, usually one.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBox {
    pub chunks: Vec<LineChunk>,
    pub current_chunk: usize,
    /// Predicted top before the actual line height is known.
    pub expected_line_top: f64,
    pub actual_line_top: f64,
    pub actual_line_bottom: f64,
    pub baseline_top: Vec2,
    pub baseline_bottom: Vec2,
    pub text_indent: Vec2,
    pub first_line: bool,
    pub last_line: bool,
    pub justify_line: bool,
}

impl Default for LineBox {
    fn default() -> Self {
        Self {
            chunks: Vec::new(),
            current_chunk: 0,
            expected_line_top: 0.0,
            actual_line_top: 0.0,
            actual_line_bottom: 0.0,
            baseline_top: Vec2::ZERO,
            baseline_bottom: Vec2::ZERO,
            text_indent: Vec2::ZERO,
            first_line: false,
            last_line: false,
            justify_line: false,
        }
    }
}

impl LineBox {
    /// A line with a single chunk from `start` to `end`.
    pub fn from_endpoints(start: Point, end: Point) -> Self {
        Self {
            chunks: vec![LineChunk::new(Line::new(start, end))],
            ..Default::default()
        }
    }

    /// A line over several spans. Right-to-left lines fill the spans from
    /// the inline end, so both the span list and each span are reversed.
    pub fn from_spans(spans: &[Line], ltr: bool, indent: Vec2) -> Self {
        let chunks = if ltr {
            spans.iter().map(|l| LineChunk::new(*l)).collect()
        } else {
            spans
                .iter()
                .rev()
                .map(|l| LineChunk::new(Line::new(l.p1, l.p0)))
                .collect()
        };
        Self {
            chunks,
            text_indent: indent,
            ..Default::default()
        }
    }

    pub fn chunk(&self) -> Option<&LineChunk> {
        self.chunks.get(self.current_chunk)
    }

    pub fn chunk_mut(&mut self) -> Option<&mut LineChunk> {
        self.chunks.get_mut(self.current_chunk)
    }

    /// True when the current chunk holds no characters.
    pub fn is_empty(&self) -> bool {
        self.chunk().map_or(true, |c| c.chunk_indices.is_empty())
    }

    /// Make the chunk containing `pos` on the inline axis current.
    pub fn set_current_chunk_for_pos(&mut self, pos: Point, horizontal: bool) {
        for (i, chunk) in self.chunks.iter().enumerate() {
            let (a, b, p) = if horizontal {
                (chunk.length.p0.x, chunk.length.p1.x, pos.x)
            } else {
                (chunk.length.p0.y, chunk.length.p1.y, pos.y)
            };
            if p >= a.min(b) && p < a.max(b) {
                self.current_chunk = i;
                break;
            }
        }
    }

    /// Reset for the next line at `offset`, keeping the current chunk's
    /// inline extent.
    pub fn clear_and_adjust(&mut self, horizontal: bool, offset: Point, indent: Vec2) {
        let mut length = self
            .chunk()
            .map(|c| c.length)
            .unwrap_or_else(|| Line::new(offset, offset));
        if horizontal {
            length.p0.y = offset.y;
            length.p1.y = offset.y;
        } else {
            length.p0.x = offset.x;
            length.p1.x = offset.x;
        }
        *self = Self {
            chunks: vec![LineChunk::new(length)],
            text_indent: indent,
            ..Default::default()
        };
    }

    /// All character indices of the line, chunk by chunk.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunks.iter().flat_map(|c| c.chunk_indices.iter().copied())
    }
}

/// Geometry produced for one content node.
#[derive(Debug, Clone, Default)]
pub struct NodeGeometry {
    pub id: Option<String>,
    /// Transformed layout boxes of the node's visible characters.
    pub char_rects: Vec<Rect>,
    /// Stroked decoration outlines, in user space.
    pub decorations: BTreeMap<DecorationKind, BezPath>,
}

impl NodeGeometry {
    /// Union of the character rectangles.
    pub fn associated_outline(&self) -> Option<Rect> {
        self.char_rects.iter().copied().reduce(|a, b| a.union(b))
    }
}

/// The result of a layout pass.
#[derive(Debug, Clone, Default)]
pub struct TextLayout {
    pub chars: Vec<CharacterResult>,
    pub lines: Vec<LineBox>,
    pub cursor_positions: Vec<CursorPos>,
    /// Cursor position index to visual cursor order.
    pub logical_to_visual_cursor: BTreeMap<usize, usize>,
    /// Indexed by node id.
    pub nodes: Vec<NodeGeometry>,
    pub start_position: Point,
    pub plain_text: String,
}

impl TextLayout {
    pub fn node(&self, id: NodeId) -> Option<&NodeGeometry> {
        self.nodes.get(id.index())
    }

    /// The first node whose id attribute is `id`.
    pub fn node_by_id(&self, id: &str) -> Option<&NodeGeometry> {
        self.nodes.iter().find(|n| n.id.as_deref() == Some(id))
    }

    /// Characters that draw something.
    pub fn visible_chars(&self) -> impl Iterator<Item = &CharacterResult> {
        self.chars.iter().filter(|c| c.addressable && !c.hidden && !c.middle)
    }
}

/// Per-pass facts derived from the root style.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Paragraph {
    pub writing_mode: WritingMode,
    pub horizontal: bool,
    pub ltr: bool,
    /// Inline-size or shapes constrain the lines.
    pub wrapped: bool,
}

/// Lays out text documents against a font backend.
pub struct LayoutEngine;

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn layout(&self, document: &TextDocument, fonts: &dyn FontBackend) -> TextLayout {
        let tree = TextTree::from_document(document);
        let collected = collect_text(&tree);
        let root = tree.root();
        let root_style = tree.node(root).style.clone();

        let mut nodes: Vec<NodeGeometry> = vec![NodeGeometry::default(); tree.len()];
        for id in tree.descendants(root) {
            nodes[id.index()].id = tree.node(id).id.clone();
        }

        if collected.is_empty() {
            log::debug!("layout: empty text");
            return TextLayout {
                nodes,
                plain_text: collected.plain_text,
                ..Default::default()
            };
        }

        let para = Paragraph {
            writing_mode: root_style.writing_mode,
            horizontal: root_style.is_horizontal(),
            ltr: !root_style.is_rtl(),
            wrapped: root_style.inline_size.is_some() || !document.shapes_inside.is_empty(),
        };
        log::debug!(
            "layout: {} chars in {} leaves, wrapped={}",
            collected.len(),
            collected.chunks.len(),
            para.wrapped
        );

        // 1. White space, breaks and explicit positions.
        let mut text = collected.text.clone();
        let collapsed = collapse_spaces(&mut text, root_style.white_space);

        let root_settings = BreakSettings::from_style(&root_style);
        let mut breaks = line_breaks(&text, &root_settings);
        for id in tree.descendants(root).skip(1) {
            let settings = BreakSettings::from_style(&tree.node(id).style);
            let range = collected.node_ranges[id.index()].clone();
            if settings != root_settings && !range.is_empty() {
                patch_line_breaks(&text, &mut breaks, range, &settings);
            }
        }
        let words = word_boundaries(&text);
        let graphemes = grapheme_boundaries(&text);
        let justify = justification_opportunities(&text);

        let addressable = addressable_mask(&text, &collapsed, para.wrapped);
        let mut resolved =
            resolve_transforms(&tree, &collected.node_ranges, &addressable, para.horizontal);

        let mut result: Vec<CharacterResult> = (0..text.len())
            .map(|i| CharacterResult {
                addressable: addressable[i],
                plain_index: collected.plain_index[i],
                horizontal: para.horizontal,
                ..Default::default()
            })
            .collect();

        // Line edge behaviour and per-leaf flags.
        for chunk in &collected.chunks {
            let style = &tree.node(chunk.leaf).style;
            let wraps = style.wraps();
            let hp = style.hanging_punctuation;
            for i in chunk.range() {
                let cr = &mut result[i];
                let c = text[i];
                cr.anchor = style.text_anchor;
                cr.direction = style.direction;
                (cr.justify_before, cr.justify_after) = justify[i];
                cr.overflow_wrap = style.overflow_wrap != OverflowWrap::Normal;
                cr.cursor_info.is_word_boundary = words[i];
                cr.cursor_info.color = style.fill;

                if breaks[i] == BreakType::HardBreak {
                    cr.break_type = BreakType::HardBreak;
                    cr.line_start = LineEdgeBehaviour::Collapse;
                    cr.line_end = LineEdgeBehaviour::Collapse;
                } else if breaks[i] == BreakType::SoftBreak && wraps {
                    cr.break_type = BreakType::SoftBreak;
                    if collapse_last_space(c, style.white_space) {
                        cr.line_start = LineEdgeBehaviour::Collapse;
                        cr.line_end = LineEdgeBehaviour::Collapse;
                    }
                }
                if cr.line_end != LineEdgeBehaviour::Collapse {
                    let followed_by_forced = i + 1 >= text.len()
                        || breaks[i + 1] == BreakType::HardBreak
                        || resolved[i + 1].starts_new_chunk();
                    let (hangs, force) =
                        hang_last_space(c, style.white_space, wraps, followed_by_forced);
                    if hangs {
                        cr.line_end = if force {
                            LineEdgeBehaviour::ForceHang
                        } else {
                            LineEdgeBehaviour::ConditionallyHang
                        };
                    }
                }
                let break_anywhere = style.word_break == WordBreak::BreakAll
                    || style.line_break == LineBreak::Anywhere;
                if break_anywhere && wraps && graphemes[i] && cr.break_type == BreakType::NoBreak {
                    cr.break_type = BreakType::SoftBreak;
                }
                let (hang_start, hang_end) = hanging_behaviour(c, hp);
                if cr.line_start != LineEdgeBehaviour::Collapse
                    && hang_start == LineEdgeBehaviour::ForceHang
                {
                    cr.line_start = hang_start;
                }
                if cr.line_end != LineEdgeBehaviour::Collapse
                    && hang_end != LineEdgeBehaviour::NoChange
                {
                    cr.line_end = hang_end;
                }
                if (chunk.first_text_in_path && i == chunk.start) || resolved[i].starts_new_chunk() {
                    cr.anchored_chunk = true;
                }
            }
        }
        result[0].anchored_chunk = true;

        // Shaping sees forced breaks as spaces.
        let shaping_text = replace_hard_breaks(&text);
        let levels = resolve_levels(&shaping_text, root_style.direction);

        // 2. Shaping and glyphs.
        let ctx = glyphs::ShapeContext {
            fonts,
            tree: &tree,
            collected: &collected,
            text: &shaping_text,
            levels: &levels,
            resolved: &resolved,
            graphemes: &graphemes,
            config: &document.config,
            horizontal: para.horizontal,
        };
        let dummy = glyphs::shape_and_load(&ctx, &mut result);
        if dummy.is_some() {
            resolved.push(CharTransformation::default());
        }
        let order: Vec<usize> = (0..result.len())
            .filter(|&i| result[i].visual_index.is_some())
            .collect();

        // 3. Baselines.
        metrics::compute_font_metrics(
            fonts,
            &tree,
            &text,
            &collected.node_ranges,
            &document.config,
            para.horizontal,
            &mut result,
        );

        // 4. Lines.
        let mut start_pos = resolved[0].absolute_pos(Point::ZERO);
        let lines = if document.shapes_inside.is_empty() {
            lines::break_lines(&root_style, &para, &order, &mut result, start_pos)
        } else {
            let shapes = in_shape::get_shapes(document, &root_style);
            in_shape::flow_text_in_shapes(
                &root_style,
                &para,
                &order,
                &mut result,
                &shapes,
                &mut start_pos,
                document.config.shape_precision,
            )
        };
        log::debug!("layout: {} line boxes", lines.len());

        // 5. Line-relative alignment.
        metrics::handle_line_box_alignment(
            &tree,
            &collected.node_ranges,
            &mut result,
            &lines,
            para.horizontal,
        );

        // 6. SVG 1.1 positioning, 7. decorations.
        if !para.wrapped {
            anchoring::apply_relative_offsets(&mut result, &resolved);
            anchoring::apply_text_length(&tree, &collected.node_ranges, &mut result, para.horizontal);
            anchoring::apply_absolute_positions(&mut result, &resolved);
            anchoring::apply_anchoring(&mut result, para.horizontal);
        }
        decoration::compute_text_decorations(
            &tree,
            &collected.node_ranges,
            &result,
            &para,
            &document.config,
            &mut nodes,
        );
        if !para.wrapped {
            if let Some(start) = text_path::apply_text_path(
                &tree,
                &collected.node_ranges,
                &mut result,
                para.horizontal,
            ) {
                start_pos = start;
            }
        }

        let cursor = cursor::build_cursor_table(&collected, &mut result, dummy, &lines, para.ltr);
        for (leaf, rect) in cursor.char_rects {
            nodes[leaf.index()].char_rects.push(rect);
        }

        TextLayout {
            chars: result,
            lines,
            cursor_positions: cursor.positions,
            logical_to_visual_cursor: cursor.logical_to_visual,
            nodes,
            start_position: start_pos,
            plain_text: collected.plain_text,
        }
    }
}

/// Parse path data, logging when it yields nothing.
pub(crate) fn parse_shape(data: &str, what: &str) -> Option<BezPath> {
    match parse_path_checked(data) {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("{what}: {e}");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::font::FixedMetrics;
    use crate::model::{TextContent, TextDocument};
    use crate::style::Style;

    use super::{LayoutEngine, TextLayout};

    pub fn doc(root: TextContent) -> TextDocument {
        TextDocument {
            root,
            ..Default::default()
        }
    }

    pub fn sized(size: f64) -> Style {
        Style {
            font_size: Some(size),
            ..Default::default()
        }
    }

    pub fn run(document: &TextDocument) -> TextLayout {
        LayoutEngine::new().layout(document, &FixedMetrics::new())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::model::TextContent;
    use crate::style::Style;

    #[test]
    fn test_hello_world_positions() {
        let layout = run(&doc(TextContent::text("Hello World", sized(10.0))));
        assert_eq!(layout.chars.len(), 11);
        assert_eq!(layout.lines.len(), 1);
        for (i, c) in layout.chars.iter().enumerate() {
            assert!((c.final_position.x - 10.0 * i as f64).abs() < 1e-9, "char {i}");
            assert!(!c.hidden);
        }
    }

    #[test]
    fn test_empty_document() {
        let layout = run(&doc(TextContent::text("", sized(10.0))));
        assert!(layout.chars.is_empty());
        assert!(layout.lines.is_empty());
        assert_eq!(layout.nodes.len(), 1);
    }

    #[test]
    fn test_line_height_box_grows_by_half_leading() {
        let cr = CharacterResult {
            bounding_box: Rect::new(0.0, -8.0, 10.0, 2.0),
            scaled_half_leading: 1.5,
            ..Default::default()
        };
        assert_eq!(cr.line_height_box(), Rect::new(0.0, -9.5, 10.0, 3.5));
        let vertical = CharacterResult {
            horizontal: false,
            ..cr
        };
        assert_eq!(vertical.line_height_box(), Rect::new(-1.5, -8.0, 11.5, 2.0));
    }

    #[test]
    fn test_tab_stretches_to_next_stop() {
        let mut cr = CharacterResult {
            tab_size: Some(40.0),
            bounding_box: Rect::new(0.0, -8.0, 0.0, 2.0),
            ..Default::default()
        };
        cr.apply_tab_size(Point::new(25.0, 0.0));
        assert_eq!(cr.advance.x, 15.0);
        assert_eq!(cr.bounding_box.width(), 15.0);
    }

    #[test]
    fn test_scale_to_zero_drops_glyph() {
        let mut cr = CharacterResult {
            advance: Vec2::new(10.0, 0.0),
            glyph: Glyph::Outline {
                path: kurbo::Shape::to_path(&Rect::new(0.0, -8.0, 10.0, 2.0), 0.1),
            },
            ..Default::default()
        };
        cr.scale(0.0, 1.0);
        assert_eq!(cr.advance.x, 0.0);
        assert!(cr.glyph.is_none());
    }

    #[test]
    fn test_rtl_line_reverses_spans() {
        let spans = [
            Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            Line::new(Point::new(20.0, 0.0), Point::new(30.0, 0.0)),
        ];
        let line = LineBox::from_spans(&spans, false, Vec2::ZERO);
        assert_eq!(line.chunks[0].length.p0, Point::new(30.0, 0.0));
        assert_eq!(line.chunks[1].length.p1, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_node_ids_carry_through() {
        let root = TextContent {
            children: vec![TextContent {
                id: Some("a".into()),
                ..TextContent::text("ab", Style::default())
            }],
            ..TextContent::span(sized(10.0), vec![])
        };
        let layout = run(&doc(root));
        let a = layout.node_by_id("a").unwrap();
        assert_eq!(a.char_rects.len(), 2);
        assert!(a.associated_outline().is_some());
    }
}
