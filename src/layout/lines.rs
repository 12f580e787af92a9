//! # Line Breaking
//!
//! Greedy breaking of the character buffer into [`LineBox`]es.
//!
//! Characters are consumed in logical order and gathered into "words": runs
//! between break opportunities. A word goes onto the current line if the
//! line still fits inside `inline-size`, otherwise the line is finalized
//! and the word starts the next one. Words that are wider than a whole line
//! are split per character when `overflow-wrap` allows it.
//!
//! Finalizing a line is where positions become real: trailing white space
//! collapses or hangs, characters are placed in visual order, justification
//! slack is distributed, the line is anchored and finally moved down by its
//! own ascent.

use super::{CharacterResult, LineBox, Paragraph};
use crate::geometry::{translate_line, unite_rect, Point, Vec2};
use crate::style::{ResolvedStyle, TextAnchor, WritingMode};
use crate::text::breaks::{BreakType, LineEdgeBehaviour};

/// Per-paragraph inputs shared by every finalized line.
#[derive(Debug, Clone, Copy)]
pub(super) struct LineSettings {
    pub writing_mode: WritingMode,
    pub anchor: TextAnchor,
    pub ltr: bool,
    /// Lines have a definite inline extent to anchor in.
    pub inline_size: bool,
    pub in_shape: bool,
}

impl LineSettings {
    fn horizontal(&self) -> bool {
        self.writing_mode.is_horizontal()
    }
}

fn inline(v: Vec2, horizontal: bool) -> f64 {
    if horizontal {
        v.x
    } else {
        v.y
    }
}

/// Ascent and descent edges of a character including its baseline offset.
///
/// With `compare`, the values only widen what `ascent` and `descent`
/// already hold.
pub(super) fn calculate_line_height(
    cr: &CharacterResult,
    ascent: &mut f64,
    descent: &mut f64,
    horizontal: bool,
    compare: bool,
) {
    let lh = cr.line_height_box() + cr.total_baseline_offset();
    let (asc, desc) = if horizontal {
        (lh.y0, lh.y1)
    } else {
        (lh.x1, lh.x0)
    };
    if !compare {
        *ascent = asc;
        *descent = desc;
    } else if horizontal {
        *ascent = ascent.min(asc);
        *descent = descent.max(desc);
    } else {
        *ascent = ascent.max(asc);
        *descent = descent.min(desc);
    }
}

/// Put the characters of `word` onto the current chunk of `line`.
pub(super) fn add_word_to_line(
    result: &mut [CharacterResult],
    current_pos: &mut Point,
    word: &mut Vec<usize>,
    line: &mut LineBox,
    horizontal: bool,
) {
    let line_was_empty = line.is_empty();
    for (k, &j) in word.iter().enumerate() {
        let cr = &mut result[j];
        if line_was_empty && k == 0 {
            if cr.line_start == LineEdgeBehaviour::Collapse {
                if horizontal {
                    cr.scale(0.0, 1.0);
                } else {
                    cr.scale(1.0, 0.0);
                }
                cr.hidden = true;
                continue;
            }
            cr.anchored_chunk = true;
            if cr.line_start == LineEdgeBehaviour::ForceHang && line.first_line {
                *current_pos -= cr.advance;
                cr.hanging = true;
            }
        }
        calculate_line_height(
            cr,
            &mut line.actual_line_top,
            &mut line.actual_line_bottom,
            horizontal,
            !cr.anchored_chunk,
        );
        cr.css_position = *current_pos;
        cr.apply_tab_size(*current_pos);
        *current_pos += cr.advance;
        let placed = cr.layout_box() + (cr.css_position.to_vec2() + cr.total_baseline_offset());
        if let Some(chunk) = line.chunk_mut() {
            chunk.bounding_box = unite_rect(chunk.bounding_box, placed);
        }
    }
    if let Some(chunk) = line.chunk_mut() {
        chunk.chunk_indices.append(word);
    }
    word.clear();
}

/// Move the finished line onto its baseline and return the block advance
/// to the next line.
///
/// The first line keeps its baseline on the start position; later lines
/// move down by their ascent. In shapes, `expected_line_top` holds the
/// predicted ascent and only the difference is applied.
fn line_height_offset(
    writing_mode: WritingMode,
    result: &mut [CharacterResult],
    line: &mut LineBox,
    first_line: bool,
) -> Vec2 {
    if line.chunks.is_empty() {
        return Vec2::ZERO;
    }
    let horizontal = writing_mode.is_horizontal();
    if line.chunks.len() == 1 && line.actual_line_top == 0.0 && line.actual_line_bottom == 0.0 {
        // A line holding only a forced break still takes its height.
        if let Some(&first) = line.chunks[0].chunk_indices.first() {
            calculate_line_height(
                &result[first],
                &mut line.actual_line_top,
                &mut line.actual_line_bottom,
                horizontal,
                false,
            );
            result[first].anchored_chunk = true;
        }
    }

    let expected_top = if horizontal {
        line.expected_line_top.min(line.actual_line_top)
    } else {
        line.expected_line_top.max(line.actual_line_top)
    };
    let (line_top, line_bottom, correction) = match writing_mode {
        WritingMode::HorizontalTb => {
            line.baseline_top = Vec2::new(0.0, line.actual_line_top);
            line.baseline_bottom = Vec2::new(0.0, line.actual_line_bottom);
            (
                -line.baseline_top,
                line.baseline_bottom,
                Vec2::new(0.0, -expected_top) + line.baseline_top,
            )
        }
        WritingMode::VerticalLr => {
            line.baseline_top = Vec2::new(line.actual_line_top, 0.0);
            line.baseline_bottom = Vec2::new(line.actual_line_bottom, 0.0);
            // Lines advance to the right but their tops still point right.
            (
                -line.baseline_bottom,
                line.baseline_top,
                Vec2::new(-expected_top, 0.0) + line.baseline_top,
            )
        }
        WritingMode::VerticalRl => {
            line.baseline_top = Vec2::new(line.actual_line_top, 0.0);
            line.baseline_bottom = Vec2::new(line.actual_line_bottom, 0.0);
            (
                -line.baseline_top,
                line.baseline_bottom,
                Vec2::new(expected_top, 0.0) - line.baseline_top,
            )
        }
    };

    let shift = if first_line { -correction } else { line_top };
    for chunk in &mut line.chunks {
        for &j in &chunk.chunk_indices {
            let cr = &mut result[j];
            cr.css_position += shift + cr.total_baseline_offset();
            cr.final_position = cr.css_position;
        }
        chunk.length = translate_line(chunk.length, shift);
        chunk.bounding_box = chunk.bounding_box + shift;
    }
    if first_line {
        line_bottom - correction
    } else {
        line_top + line_bottom
    }
}

/// Collapse trailing white space of a chunk and mark hanging characters.
fn handle_collapse_and_hang(
    result: &mut [CharacterResult],
    chunk: &mut super::LineChunk,
    ltr: bool,
    horizontal: bool,
) {
    let end = chunk.length.p1;
    for &last in chunk.chunk_indices.iter().rev() {
        let cr = &mut result[last];
        match cr.line_end {
            LineEdgeBehaviour::Collapse => {
                cr.hidden = true;
                cr.advance = Vec2::ZERO;
                if horizontal {
                    cr.ink_bounding_box.x1 = cr.ink_bounding_box.x0;
                } else {
                    cr.ink_bounding_box.y1 = cr.ink_bounding_box.y0;
                }
            }
            LineEdgeBehaviour::ConditionallyHang => {
                let hang_pos = if ltr {
                    cr.css_position + cr.advance
                } else {
                    cr.css_position
                };
                let (p, e) = if horizontal {
                    (hang_pos.x, end.x)
                } else {
                    (hang_pos.y, end.y)
                };
                let overflows = if ltr { p > e } else { p < e };
                if overflows {
                    cr.hanging = true;
                    chunk.conditional_hang_end = hang_pos - end;
                }
            }
            LineEdgeBehaviour::ForceHang => {
                cr.hanging = true;
                chunk.conditional_hang_end = cr.advance;
            }
            LineEdgeBehaviour::NoChange => {}
        }
        if cr.line_end != LineEdgeBehaviour::Collapse {
            break;
        }
    }
}

/// Shift a chunk so its visible extent sits on `anchor_point` per
/// `anchor`.
pub(super) fn apply_inline_size_anchoring(
    result: &mut [CharacterResult],
    chunk: &mut super::LineChunk,
    anchor: TextAnchor,
    anchor_point: Point,
    ltr: bool,
    horizontal: bool,
    text_indent: Vec2,
) {
    let mut shift = if horizontal {
        anchor_point.x
    } else {
        anchor_point.y
    };
    let mut extent: Option<(f64, f64)> = None;
    for &i in &chunk.chunk_indices {
        let cr = &result[i];
        if !cr.addressable || cr.hidden || (cr.hanging && cr.anchored_chunk) {
            continue;
        }
        let mut p = cr.final_position;
        let mut d = cr.advance;
        if cr.hanging {
            d -= chunk.conditional_hang_end;
            if !ltr {
                p += chunk.conditional_hang_end;
            }
        }
        let pos = if horizontal { p.x } else { p.y };
        let adv = inline(d, horizontal);
        let (lo, hi) = (pos.min(pos + adv), pos.max(pos + adv));
        extent = Some(match extent {
            Some((a, b)) => (a.min(lo), b.max(hi)),
            None => (lo, hi),
        });
    }
    let (mut a, mut b) = extent.unwrap_or((0.0, 0.0));

    if anchor == TextAnchor::Start {
        let indent = inline(text_indent, horizontal);
        if ltr {
            a -= indent;
        } else {
            b += indent;
        }
    }
    shift -= match (anchor, ltr) {
        (TextAnchor::Start, true) | (TextAnchor::End, false) => a,
        (TextAnchor::End, true) | (TextAnchor::Start, false) => b,
        (TextAnchor::Middle, _) => (a + b) * 0.5,
    };

    let shift = if horizontal {
        Vec2::new(shift, 0.0)
    } else {
        Vec2::new(0.0, shift)
    };
    for &j in &chunk.chunk_indices {
        result[j].css_position += shift;
        result[j].final_position = result[j].css_position;
    }
    chunk.bounding_box = chunk.bounding_box + shift;
}

/// Place, justify and anchor every chunk of `line`, then advance
/// `line_offset` past it.
pub(super) fn finalize_line(
    result: &mut [CharacterResult],
    current_pos: &mut Point,
    line: &mut LineBox,
    line_offset: &mut Point,
    settings: &LineSettings,
) {
    let horizontal = settings.horizontal();
    let ltr = settings.ltr;
    let first_line = settings.in_shape || line.first_line;
    let justify_line = line.justify_line;
    let text_indent = line.text_indent;

    for (chunk_index, chunk) in line.chunks.iter_mut().enumerate() {
        let mut visual: Vec<usize> = chunk.chunk_indices.clone();
        visual.sort_by_key(|&j| (result[j].visual_index, j));
        *current_pos = *line_offset;

        handle_collapse_and_hang(result, chunk, ltr, horizontal);

        let mut justify_offset = Vec2::ZERO;
        let mut before: Vec<usize> = Vec::new();
        let mut after: Vec<usize> = Vec::new();
        if justify_line {
            let mut hanging_length = inline(chunk.conditional_hang_end, horizontal);
            let mut advance_length = Vec2::ZERO;
            let mut first = true;
            for (k, &j) in visual.iter().enumerate() {
                let cr = &result[j];
                if !cr.addressable || cr.hidden {
                    continue;
                }
                advance_length += cr.advance;
                if cr.hanging {
                    if cr.anchored_chunk {
                        hanging_length += inline(cr.advance, horizontal);
                    }
                    continue;
                }
                let last = k + 1 == visual.len() || result.get(j + 1).is_some_and(|n| n.hanging);
                if cr.justify_before && !first {
                    before.push(j);
                }
                if cr.justify_after && !last {
                    after.push(j);
                }
                first = false;
            }
            let count = before.len() + after.len();
            if count > 0 {
                let indent = if chunk_index == 0 { text_indent } else { Vec2::ZERO };
                let available = (chunk.length.p1 - (chunk.length.p0 + indent)).hypot();
                let slack =
                    (available + hanging_length - inline(advance_length, horizontal)) / count as f64;
                justify_offset = if horizontal {
                    Vec2::new(slack, 0.0)
                } else {
                    Vec2::new(0.0, slack)
                };
            }
        }

        for &j in &visual {
            let cr = &mut result[j];
            if !cr.addressable {
                continue;
            }
            if cr.hanging && cr.anchored_chunk {
                cr.css_position = if ltr {
                    *current_pos - cr.advance
                } else {
                    *current_pos
                };
                cr.final_position = cr.css_position;
            } else {
                if before.contains(&j) {
                    *current_pos += justify_offset;
                }
                cr.css_position = *current_pos;
                cr.final_position = *current_pos;
                *current_pos += cr.advance;
                if after.contains(&j) {
                    *current_pos += justify_offset;
                }
            }
        }

        if settings.inline_size {
            let anchor_point = match (settings.in_shape, settings.anchor) {
                (true, TextAnchor::Middle) => chunk.length.p0.midpoint(chunk.length.p1),
                (true, TextAnchor::End) => chunk.length.p1,
                _ => chunk.length.p0,
            };
            apply_inline_size_anchoring(
                result,
                chunk,
                settings.anchor,
                anchor_point,
                ltr,
                horizontal,
                text_indent,
            );
        } else if !ltr {
            // Right-to-left text ends on the start position.
            let start = chunk.length.p0;
            apply_inline_size_anchoring(
                result,
                chunk,
                TextAnchor::Start,
                start,
                ltr,
                horizontal,
                text_indent,
            );
        } else {
            let length = if horizontal {
                chunk.bounding_box.width()
            } else {
                chunk.bounding_box.height()
            };
            let dir = if horizontal {
                Vec2::new(length, 0.0)
            } else {
                Vec2::new(0.0, length)
            };
            chunk.length.p1 = chunk.length.p0 + dir;
        }
    }
    *line_offset += line_height_offset(settings.writing_mode, result, line, first_line);
    *current_pos = *line_offset;
}

/// Break the characters of `order` into lines.
///
/// `order` holds the characters that start a cluster, in logical order.
/// Without `inline-size`, only forced breaks end a line.
pub(super) fn break_lines(
    root: &ResolvedStyle,
    para: &Paragraph,
    order: &[usize],
    result: &mut [CharacterResult],
    start_pos: Point,
) -> Vec<LineBox> {
    let horizontal = para.horizontal;
    let ltr = para.ltr;
    let inline_size = root.inline_size;
    let settings = LineSettings {
        writing_mode: root.writing_mode,
        anchor: root.text_anchor,
        ltr,
        inline_size: inline_size.is_some(),
        in_shape: false,
    };
    let indent_info = root.text_indent;

    let mut text_indent = Vec2::ZERO;
    let mut end_pos = Point::ZERO;
    if let Some(size) = inline_size {
        let signed = if ltr { size } else { -size };
        if horizontal {
            text_indent = Vec2::new(indent_info.length, 0.0);
            end_pos = Point::new(start_pos.x + signed, start_pos.y);
        } else {
            text_indent = Vec2::new(0.0, indent_info.length);
            end_pos = Point::new(start_pos.x, start_pos.y + signed);
        }
    }
    let hanging_indent = if indent_info.hanging {
        text_indent
    } else {
        Vec2::ZERO
    };

    let mut lines: Vec<LineBox> = Vec::new();
    let mut line = LineBox::from_endpoints(start_pos, end_pos);
    line.first_line = true;

    let mut word: Vec<usize> = Vec::new();
    let mut word_advance = Vec2::ZERO;
    let mut current_pos = start_pos;
    if !indent_info.hanging && inline_size.is_some() {
        line.text_indent = text_indent;
        current_pos += text_indent;
    }
    let mut line_offset = start_pos;

    for (n, &index) in order.iter().enumerate() {
        result[index].apply_tab_size(current_pos + word_advance);
        let cr = &result[index];
        if !cr.addressable {
            continue;
        }
        let break_type = cr.break_type;
        let overflow_wrap = cr.overflow_wrap;
        let advance = cr.advance;

        let skip_advance =
            cr.line_end != LineEdgeBehaviour::NoChange && !(line.is_empty() && word.is_empty());
        if !skip_advance {
            if word.is_empty() {
                word_advance = advance;
            } else {
                word_advance += advance;
            }
        }
        word.push(index);
        let is_last = n + 1 == order.len();

        let mut soft_break = false;
        if break_type != BreakType::NoBreak || is_last {
            let length = inline(current_pos - start_pos + word_advance, horizontal);
            match inline_size {
                Some(size) if length.abs() - size > 0.01 => soft_break = true,
                _ => add_word_to_line(result, &mut current_pos, &mut word, &mut line, horizontal),
            }
        }

        if soft_break {
            if !line.is_empty() {
                finalize_line(result, &mut current_pos, &mut line, &mut line_offset, &settings);
                lines.push(std::mem::take(&mut line));
                line = restart_line(&lines, horizontal, line_offset, hanging_indent);
                if inline_size.is_some() {
                    current_pos += line.text_indent;
                }
            }
            if let Some(size) = inline_size.filter(|_| overflow_wrap) {
                if inline(word_advance, horizontal) > size {
                    // Too wide for any line: fill lines per character.
                    let mut partial: Vec<usize> = Vec::new();
                    let mut partial_advance = Vec2::ZERO;
                    for &i in &word {
                        result[i].apply_tab_size(current_pos + partial_advance);
                        partial_advance += result[i].advance;
                        if inline(partial_advance, horizontal) > size && !partial.is_empty() {
                            add_word_to_line(
                                result,
                                &mut current_pos,
                                &mut partial,
                                &mut line,
                                horizontal,
                            );
                            finalize_line(
                                result,
                                &mut current_pos,
                                &mut line,
                                &mut line_offset,
                                &settings,
                            );
                            lines.push(std::mem::take(&mut line));
                            line = restart_line(&lines, horizontal, line_offset, hanging_indent);
                            current_pos += line.text_indent;
                            result[i].apply_tab_size(current_pos);
                            partial_advance = result[i].advance;
                        }
                        partial.push(i);
                    }
                    word = partial;
                }
            }
            add_word_to_line(result, &mut current_pos, &mut word, &mut line, horizontal);
        }

        if break_type == BreakType::HardBreak {
            finalize_line(result, &mut current_pos, &mut line, &mut line_offset, &settings);
            lines.push(std::mem::take(&mut line));
            let indent = if !indent_info.hanging && indent_info.each_line {
                text_indent
            } else {
                Vec2::ZERO
            };
            line = restart_line(&lines, horizontal, line_offset, indent);
            if inline_size.is_some() {
                current_pos += line.text_indent;
            }
        }

        // A soft wrap on the last character restarts the line, so the
        // flag is set on whichever line is current now.
        if is_last && break_type != BreakType::HardBreak {
            line.last_line = true;
            if !word.is_empty() {
                add_word_to_line(result, &mut current_pos, &mut word, &mut line, horizontal);
            }
            finalize_line(result, &mut current_pos, &mut line, &mut line_offset, &settings);
            lines.push(std::mem::take(&mut line));
        }
    }
    log::debug!("line breaking finished with {} lines", lines.len());
    lines
}

/// The line after `lines.last()`, starting at `offset`.
fn restart_line(lines: &[LineBox], horizontal: bool, offset: Point, indent: Vec2) -> LineBox {
    let mut line = lines.last().cloned().unwrap_or_default();
    line.clear_and_adjust(horizontal, offset, indent);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Line, Rect};
    use crate::layout::test_support::*;
    use crate::layout::LineChunk;
    use crate::model::TextContent;
    use crate::style::{Direction, SpaceCollapse, Style, TextIndent};

    fn char_at(x: f64, advance: f64) -> CharacterResult {
        CharacterResult {
            css_position: Point::new(x, 0.0),
            final_position: Point::new(x, 0.0),
            advance: Vec2::new(advance, 0.0),
            bounding_box: Rect::new(0.0, -8.0, advance, 2.0),
            visual_index: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_line_height_compare_widens_only() {
        let cr = char_at(0.0, 10.0);
        let (mut asc, mut desc) = (-20.0, 1.0);
        calculate_line_height(&cr, &mut asc, &mut desc, true, true);
        assert_eq!((asc, desc), (-20.0, 2.0));
        calculate_line_height(&cr, &mut asc, &mut desc, true, false);
        assert_eq!((asc, desc), (-8.0, 2.0));
    }

    #[test]
    fn test_trailing_space_collapses() {
        let mut result = vec![char_at(0.0, 10.0), char_at(10.0, 10.0)];
        result[1].line_end = LineEdgeBehaviour::Collapse;
        let mut chunk = LineChunk::new(Line::new((0.0, 0.0), (100.0, 0.0)));
        chunk.chunk_indices = vec![0, 1];
        handle_collapse_and_hang(&mut result, &mut chunk, true, true);
        assert!(result[1].hidden);
        assert_eq!(result[1].advance, Vec2::ZERO);
        assert!(!result[0].hidden);
    }

    #[test]
    fn test_conditional_hang_only_past_end() {
        let mut result = vec![char_at(0.0, 10.0), char_at(95.0, 10.0)];
        result[1].line_end = LineEdgeBehaviour::ConditionallyHang;
        let mut chunk = LineChunk::new(Line::new((0.0, 0.0), (100.0, 0.0)));
        chunk.chunk_indices = vec![0, 1];
        handle_collapse_and_hang(&mut result, &mut chunk, true, true);
        assert!(result[1].hanging);
        assert_eq!(chunk.conditional_hang_end, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_anchor_middle_centers_extent() {
        let mut result = vec![char_at(0.0, 10.0), char_at(10.0, 10.0)];
        let mut chunk = LineChunk::new(Line::new((0.0, 0.0), (100.0, 0.0)));
        chunk.chunk_indices = vec![0, 1];
        apply_inline_size_anchoring(
            &mut result,
            &mut chunk,
            TextAnchor::Middle,
            Point::new(50.0, 0.0),
            true,
            true,
            Vec2::ZERO,
        );
        assert_eq!(result[0].final_position.x, 40.0);
        assert_eq!(result[1].final_position.x, 50.0);
    }

    fn wrapped(inline_size: f64) -> Style {
        Style {
            inline_size: Some(inline_size),
            ..sized(10.0)
        }
    }

    #[test]
    fn test_greedy_packing() {
        let layout = run(&doc(TextContent::text("aaa bbb ccc", wrapped(75.0))));
        assert_eq!(layout.lines.len(), 2);
        // "aaa bbb" fits in 70, "ccc" moves down.
        let c = &layout.chars[8];
        assert_eq!(c.final_position.x, 0.0);
        assert!(c.final_position.y > layout.chars[0].final_position.y);
        // The space before the break collapses.
        assert!(layout.chars[7].hidden);
    }

    #[test]
    fn test_last_word_wraps_onto_its_own_line() {
        let layout = run(&doc(TextContent::text("aaaa bbbb cccc", wrapped(100.0))));
        assert_eq!(layout.lines.len(), 2);
        assert!(layout.lines[1].last_line);
        assert!(!layout.lines[0].last_line);
        for c in &layout.chars[10..14] {
            assert!((c.final_position.y - 10.0).abs() < 1e-9, "{:?}", c.final_position);
        }
        assert_eq!(layout.chars[10].final_position.x, 0.0);
    }

    #[test]
    fn test_first_baseline_on_start() {
        let layout = run(&doc(TextContent::text("aaa bbb", wrapped(35.0))));
        assert_eq!(layout.lines.len(), 2);
        assert!(layout.chars[0].final_position.y.abs() < 1e-9);
        // Approximate metrics: ascent 8, descent 2.
        assert!((layout.chars[4].final_position.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_overflow_wrap_splits_long_word() {
        let style = Style {
            overflow_wrap: Some(crate::style::OverflowWrap::Anywhere),
            ..wrapped(30.0)
        };
        let layout = run(&doc(TextContent::text("abcdefg", style)));
        assert_eq!(layout.lines.len(), 3);
        assert_eq!(layout.chars[3].final_position.x, 0.0);
        assert_eq!(layout.chars[6].final_position.x, 0.0);
    }

    #[test]
    fn test_long_word_overflows_without_wrap() {
        let layout = run(&doc(TextContent::text("abcdefg", wrapped(30.0))));
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.chars[6].final_position.x, 60.0);
    }

    #[test]
    fn test_hard_breaks_without_inline_size() {
        let style = Style {
            white_space: Some(SpaceCollapse::PreserveBreaks),
            ..sized(10.0)
        };
        let layout = run(&doc(TextContent::text("ab\ncd", style)));
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.chars[3].final_position.x, 0.0);
    }

    #[test]
    fn test_text_indent_first_line() {
        let style = Style {
            text_indent: Some(TextIndent {
                length: 20.0,
                ..Default::default()
            }),
            ..wrapped(50.0)
        };
        let layout = run(&doc(TextContent::text("aa bb", style)));
        assert_eq!(layout.chars[0].final_position.x, 20.0);
        assert_eq!(layout.chars[3].final_position.x, 0.0);
    }

    #[test]
    fn test_rtl_lines_end_on_start() {
        let style = Style {
            direction: Some(Direction::Rtl),
            ..wrapped(100.0)
        };
        let layout = run(&doc(TextContent::text("\u{5D0}\u{5D1}", style)));
        // Visual order puts the second letter on the left.
        let right = layout.chars[0].final_position.x + layout.chars[0].advance.x;
        assert!(right.abs() < 1e-9, "{right}");
        assert!(layout.chars[1].final_position.x < layout.chars[0].final_position.x);
    }
}
