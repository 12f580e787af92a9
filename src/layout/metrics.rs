//! Baseline alignment.
//!
//! [`compute_font_metrics`] walks the tree top-down with the parent's
//! baseline table and turns `alignment-baseline` and `baseline-shift` into a
//! per-character `baseline_offset`. Nested shifts add up.
//!
//! `text-top`, `text-bottom`, `line-top` and `line-bottom` need the finished
//! line boxes, so [`handle_line_box_alignment`] applies them after line
//! breaking.

use std::ops::Range;

use unicode_script::{Script, UnicodeScript};

use super::lines::calculate_line_height;
use super::{CharacterResult, LineBox};
use crate::font::{BaselineTable, FontBackend, FontMetrics, FontQuery};
use crate::geometry::Vec2;
use crate::model::{LayoutConfig, NodeId, TextTree};
use crate::style::{Baseline, BaselineShift, ResolvedStyle, TextRendering};

/// Metrics of the first font that would render `text` in `style`.
pub(super) fn node_font_metrics(
    fonts: &dyn FontBackend,
    style: &ResolvedStyle,
    text: &[char],
    config: &LayoutConfig,
    horizontal: bool,
) -> FontMetrics {
    let text: &[char] = if text.is_empty() { &[' '] } else { text };
    let query = FontQuery::from_style(style, config);
    let script = text
        .iter()
        .map(|c| c.script())
        .find(|s| !matches!(s, Script::Common | Script::Inherited | Script::Unknown))
        .unwrap_or(Script::Latin);
    let rendering = if style.text_rendering == TextRendering::Auto {
        config.text_rendering
    } else {
        style.text_rendering
    };
    match fonts.resolve(&query, text).first().and_then(|r| r.font) {
        Some(font) => fonts.metrics(font, style.font_size, horizontal, script, rendering),
        None => FontMetrics::approximate(style.font_size, horizontal),
    }
}

fn default_baseline(horizontal: bool) -> Baseline {
    if horizontal {
        Baseline::Alphabetic
    } else {
        Baseline::Central
    }
}

/// Resolve alignment baselines and baseline shifts into
/// `baseline_offset`.
pub(super) fn compute_font_metrics(
    fonts: &dyn FontBackend,
    tree: &TextTree,
    text: &[char],
    ranges: &[Range<usize>],
    config: &LayoutConfig,
    horizontal: bool,
    result: &mut [CharacterResult],
) {
    let mut metrics = vec![FontMetrics::default(); tree.len()];
    let mut tables = vec![BaselineTable::default(); tree.len()];
    let default = default_baseline(horizontal);

    for id in tree.descendants(tree.root()) {
        let style = &tree.node(id).style;
        let range = ranges[id.index()].clone();
        let own = node_font_metrics(fonts, style, &text[range.clone()], config, horizontal);
        metrics[id.index()] = own;

        let parent = tree.parent(id);
        let parent_table = parent.map(|p| tables[p.index()]);
        let (table, dominant) = match (style.dominant_baseline, parent) {
            (Baseline::ResetSize, Some(p)) if metrics[p.index()].font_size > 0.0 => {
                let factor = style.font_size / metrics[p.index()].font_size;
                (tables[p.index()].scaled(factor), Baseline::Auto)
            }
            (Baseline::NoChange, Some(p)) => (tables[p.index()], Baseline::Auto),
            (Baseline::ResetSize | Baseline::NoChange, None) => (own.baselines, Baseline::Auto),
            (b, _) => (own.baselines, b),
        };
        tables[id.index()] = table;

        let mut alignment = style.alignment_baseline;
        if alignment == Baseline::Dominant {
            alignment = dominant;
        }
        if alignment == Baseline::Auto {
            alignment = default;
        }

        let mut shift = Vec2::ZERO;
        if !matches!(alignment, Baseline::TextTop | Baseline::TextBottom) {
            if let Some(parent_table) = parent_table {
                let offset = parent_table.get(alignment) - table.get(alignment);
                shift = if horizontal {
                    Vec2::new(0.0, -offset)
                } else {
                    Vec2::new(offset, 0.0)
                };
            }
        }
        if let Some(p) = parent {
            shift += baseline_shift(style, &metrics[p.index()], horizontal);
        }

        if shift != Vec2::ZERO {
            log::trace!("node {} shifts its baseline by {:?}", id.index(), shift);
        }
        for cr in &mut result[range] {
            cr.baseline_offset += shift;
        }
    }
}

/// `baseline-shift` as a user space offset. Sub and super use the
/// parent's font metrics.
fn baseline_shift(style: &ResolvedStyle, parent: &FontMetrics, horizontal: bool) -> Vec2 {
    let along_block = |v: f64| {
        if horizontal {
            Vec2::new(0.0, -v)
        } else {
            Vec2::new(v, 0.0)
        }
    };
    let script = |offset: Vec2| {
        let user = Vec2::new(offset.x, -offset.y);
        if horizontal {
            user
        } else {
            Vec2::new(-user.y, user.x)
        }
    };
    match style.baseline_shift {
        BaselineShift::Super => script(parent.superscript_offset),
        BaselineShift::Sub => script(parent.subscript_offset),
        BaselineShift::Length(v) => along_block(v),
        BaselineShift::Percentage(p) => along_block(p * style.font_size),
        BaselineShift::None | BaselineShift::LineTop | BaselineShift::LineBottom => Vec2::ZERO,
    }
}

/// The line whose chunks hold character `index`.
fn line_containing(lines: &[LineBox], index: usize) -> Option<&LineBox> {
    lines
        .iter()
        .rev()
        .find(|l| l.chunks.iter().any(|c| c.chunk_indices.contains(&index)))
}

enum LineEdge {
    Top,
    Bottom,
}

/// Align nodes to the top or bottom of the line they start on.
pub(super) fn handle_line_box_alignment(
    tree: &TextTree,
    ranges: &[Range<usize>],
    result: &mut [CharacterResult],
    lines: &[LineBox],
    horizontal: bool,
) {
    let ids: Vec<NodeId> = tree.post_order(tree.root()).collect();
    for id in ids {
        let style = &tree.node(id).style;
        let range = ranges[id.index()].clone();
        let edge = match (style.alignment_baseline, style.baseline_shift) {
            (Baseline::TextTop, _) | (_, BaselineShift::LineTop) => LineEdge::Top,
            (Baseline::TextBottom, _) | (_, BaselineShift::LineBottom) => LineEdge::Bottom,
            _ => {
                for cr in &mut result[range] {
                    cr.final_position = cr.css_position;
                }
                continue;
            }
        };
        if range.is_empty() {
            continue;
        }
        let Some(line) = line_containing(lines, range.start) else {
            continue;
        };
        let (mut ascent, mut descent) = (0.0, 0.0);
        for cr in &result[range.clone()] {
            calculate_line_height(cr, &mut ascent, &mut descent, horizontal, true);
        }
        let block = |v: f64| {
            if horizontal {
                Vec2::new(0.0, v)
            } else {
                Vec2::new(v, 0.0)
            }
        };
        let shift = match edge {
            LineEdge::Top => line.baseline_top - block(ascent),
            LineEdge::Bottom => line.baseline_bottom - block(descent),
        };
        log::trace!("node {} aligns to its line edge by {:?}", id.index(), shift);
        for cr in &mut result[range] {
            cr.css_position += shift;
            cr.final_position = cr.css_position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::*;
    use crate::model::TextContent;
    use crate::style::Style;

    fn with_child(child: Style) -> crate::model::TextDocument {
        doc(TextContent::span(
            sized(10.0),
            vec![
                TextContent::text("a", Style::default()),
                TextContent::text("b", child),
            ],
        ))
    }

    #[test]
    fn test_length_shift_moves_up() {
        let layout = run(&with_child(Style {
            baseline_shift: Some(BaselineShift::Length(3.0)),
            ..Default::default()
        }));
        assert!((layout.chars[1].final_position.y + 3.0).abs() < 1e-9);
        assert_eq!(layout.chars[0].final_position.y, 0.0);
    }

    #[test]
    fn test_percentage_shift_uses_font_size() {
        let layout = run(&with_child(Style {
            baseline_shift: Some(BaselineShift::Percentage(-0.5)),
            font_size: Some(20.0),
            ..Default::default()
        }));
        assert!((layout.chars[1].final_position.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_super_uses_parent_metrics() {
        let layout = run(&with_child(Style {
            baseline_shift: Some(BaselineShift::Super),
            ..Default::default()
        }));
        // Approximate superscript offset is 0.34 em up.
        assert!((layout.chars[1].final_position.y + 3.4).abs() < 1e-9);
    }

    #[test]
    fn test_nested_shifts_accumulate() {
        let inner = TextContent::text(
            "c",
            Style {
                baseline_shift: Some(BaselineShift::Length(2.0)),
                ..Default::default()
            },
        );
        let outer = TextContent {
            style: Style {
                baseline_shift: Some(BaselineShift::Length(3.0)),
                ..Default::default()
            },
            children: vec![inner],
            ..Default::default()
        };
        let layout = run(&doc(TextContent::span(
            sized(10.0),
            vec![TextContent::text("a", Style::default()), outer],
        )));
        assert!((layout.chars[1].final_position.y + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_alignment_on_central_baseline() {
        let layout = run(&with_child(Style {
            alignment_baseline: Some(Baseline::Central),
            font_size: Some(20.0),
            ..Default::default()
        }));
        // Central sits at 0.3 em: parent 3.0, child 6.0.
        assert!((layout.chars[1].final_position.y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_top_aligns_to_line_top() {
        let layout = run(&with_child(Style {
            alignment_baseline: Some(Baseline::TextTop),
            font_size: Some(5.0),
            ..Default::default()
        }));
        // Line top is -8; the small glyph's ascent is 4.
        assert!((layout.chars[1].final_position.y + 4.0).abs() < 1e-9);
    }
}
