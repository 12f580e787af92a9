//! Line breaking inside shapes.
//!
//! Text flows through the `shape-inside` regions in order, minus the
//! `shape-subtract` regions. For every line an estimated box of the next
//! word is fitted into the current shape: [`first_position`] finds the
//! highest spot that box fits, and [`line_spans`] cuts the shape at that
//! height into the spans the line can fill.

use super::lines::{add_word_to_line, calculate_line_height, finalize_line, LineSettings};
use super::{parse_shape, CharacterResult, LineBox, Paragraph};
use crate::geometry::{
    line_intersection, segment_intersection, translate_line, BezPath, Line, Point, Rect,
    ShapeRegion, Vec2,
};
use crate::model::TextDocument;
use crate::style::{ResolvedStyle, TextAlign, TextAnchor, WritingMode};
use crate::text::breaks::{BreakType, LineEdgeBehaviour};

/// Build the flow regions from the document's shapes.
pub(super) fn get_shapes(document: &TextDocument, root: &ResolvedStyle) -> Vec<ShapeRegion> {
    let subtract: Vec<BezPath> = document
        .shapes_subtract
        .iter()
        .filter_map(|d| parse_shape(d, "shape-subtract"))
        .collect();
    document
        .shapes_inside
        .iter()
        .filter_map(|d| parse_shape(d, "shape-inside"))
        .map(|inside| {
            ShapeRegion::from_paths(
                &inside,
                &subtract,
                root.shape_padding,
                root.shape_margin,
                document.config.path_tolerance,
            )
        })
        .filter(|region| !region.is_empty())
        .collect()
}

fn top_corner(rect: Rect, writing_mode: WritingMode) -> Point {
    if writing_mode == WritingMode::VerticalRl {
        Point::new(rect.x1, rect.y0)
    } else {
        Point::new(rect.x0, rect.y0)
    }
}

/// Degrees counterclockwise from the x axis with y pointing up, in
/// `[0, 360)`.
fn line_angle(line: Line) -> f64 {
    let d = line.p1 - line.p0;
    (-d.y).atan2(d.x).to_degrees().rem_euclid(360.0)
}

fn distance_to_line(p: Point, line: Line) -> f64 {
    let d = line.p1 - line.p0;
    let len = d.hypot();
    if len == 0.0 {
        return (p - line.p0).hypot();
    }
    (d.cross(p - line.p0) / len).abs()
}

/// Find where a box of the size of `word_box` first fits into `region`
/// after the block position `terminator`. Returns the line origin such that
/// `word_box` placed there lies in the region.
pub(super) fn first_position(
    region: &ShapeRegion,
    word_box: Rect,
    terminator: Point,
    writing_mode: WritingMode,
    ltr: bool,
    precision: f64,
) -> Option<Point> {
    let mut word_box = word_box;
    if word_box.width() <= 0.0 || word_box.height() <= 0.0 {
        // Zero line height still needs some extent to fit.
        if writing_mode.is_horizontal() {
            word_box.y1 = word_box.y0 + 1e-3;
        } else {
            word_box.x1 = word_box.x0 + 1e-3;
        }
    }
    let word_box = word_box.abs();
    let word = Rect::new(
        precision,
        precision,
        word_box.width() - precision,
        word_box.height() - precision,
    );
    let c = word.center().to_vec2();

    let mut terminator_adjusted = terminator;
    let mut candidates: Vec<Point> = Vec::new();
    for polygon in region.inside.iter().chain(&region.subtract) {
        if polygon.len() < 2 {
            continue;
        }
        let mut offset_lines: Vec<Line> = Vec::new();
        for k in 0..polygon.len() {
            let line = Line::new(polygon[k], polygon[(k + 1) % polygon.len()]);
            let d = line.p1 - line.p0;
            if d.y.abs() < 1e-12 {
                offset_lines.push(translate_line(line, Vec2::new(0.0, c.y)));
                offset_lines.push(translate_line(line, Vec2::new(0.0, -c.y)));
            } else if d.x.abs() < 1e-12 {
                offset_lines.push(translate_line(line, Vec2::new(c.x, 0.0)));
                offset_lines.push(translate_line(line, Vec2::new(-c.x, 0.0)));
            } else {
                let angle = line_angle(line) % 180.0;
                let corner = if angle > 90.0 {
                    line.p0.midpoint(line.p1) + Vec2::new(-c.x, c.y)
                } else {
                    line.p0.midpoint(line.p1) + c
                };
                let offset = distance_to_line(corner, line);
                let (sin, cos) = angle.to_radians().sin_cos();
                let tangent = Vec2::new(cos, -sin);
                let normal = Vec2::new(-tangent.y, tangent.x);
                offset_lines.push(translate_line(line, offset * normal));
                offset_lines.push(translate_line(line, -offset * normal));
            }
        }

        let bounds = crate::geometry::polygon::polygons_bounds(std::slice::from_ref(polygon));
        let limit = match writing_mode {
            WritingMode::HorizontalTb => {
                terminator_adjusted = terminator + c;
                Line::new(
                    Point::new(bounds.x0, terminator_adjusted.y),
                    Point::new(bounds.x1, terminator_adjusted.y),
                )
            }
            WritingMode::VerticalRl => {
                terminator_adjusted = terminator - c;
                Line::new(
                    Point::new(terminator_adjusted.x, bounds.y0),
                    Point::new(terminator_adjusted.x, bounds.y1),
                )
            }
            WritingMode::VerticalLr => {
                terminator_adjusted = terminator + c;
                Line::new(
                    Point::new(terminator_adjusted.x, bounds.y0),
                    Point::new(terminator_adjusted.x, bounds.y1),
                )
            }
        };
        offset_lines.push(limit);

        for (i, a) in offset_lines.iter().enumerate() {
            for b in &offset_lines[i..] {
                let Some(p) = line_intersection(*a, *b) else {
                    continue;
                };
                if !region.contains(p) {
                    continue;
                }
                if !region.contains_rect(Rect::from_center_size(p, word.size())) {
                    continue;
                }
                if !candidates.contains(&p) {
                    candidates.push(p);
                }
            }
        }
    }
    if candidates.is_empty() {
        return None;
    }

    let bounds = region.bounds();
    let mut best = if writing_mode == WritingMode::VerticalRl {
        Point::new(bounds.x0, bounds.y1)
    } else {
        Point::new(bounds.x1, bounds.y1)
    };
    let p = precision;
    let along = |cand: Point, best: Point| {
        if ltr {
            cand.y < best.y
        } else {
            cand.y > best.y
        }
    };
    for cand in candidates {
        match writing_mode {
            WritingMode::HorizontalTb => {
                if terminator_adjusted.y - cand.y < p {
                    if best.y - cand.y > p {
                        best = cand;
                    } else if best.y - cand.y > -p
                        && ((ltr && cand.x < best.x) || (!ltr && cand.x > best.x))
                    {
                        best = cand;
                    }
                }
            }
            WritingMode::VerticalRl => {
                if terminator_adjusted.x - cand.x >= -p {
                    if best.x - cand.x < -p {
                        best = cand;
                    } else if best.x - cand.x < p && along(cand, best) {
                        best = cand;
                    }
                }
            }
            WritingMode::VerticalLr => {
                if terminator_adjusted.x - cand.x < p {
                    if best.x - cand.x > p {
                        best = cand;
                    } else if best.x - cand.x > -p && along(cand, best) {
                        best = cand;
                    }
                }
            }
        }
    }
    if !region.contains(best) {
        return None;
    }
    Some(best - c - word_box.origin().to_vec2())
}

/// Cut `region` along the line at `first_pos` into the spans a line of
/// height `word_box` can fill, in inline order.
pub(super) fn line_spans(
    region: &ShapeRegion,
    first_pos: Point,
    word_box: Rect,
    writing_mode: WritingMode,
    precision: f64,
) -> Vec<Line> {
    let horizontal = writing_mode.is_horizontal();
    let r = word_box.abs();
    let word = Rect::new(
        r.x0 + precision,
        r.y0 + precision,
        r.x1 - precision,
        r.y1 - precision,
    );
    let bounds = region.bounds();
    let (base, top, bottom) = if horizontal {
        (
            Line::new(
                Point::new(bounds.x0 - 5.0, first_pos.y),
                Point::new(bounds.x1 + 5.0, first_pos.y),
            ),
            Vec2::new(0.0, word.y0),
            Vec2::new(0.0, word.y1),
        )
    } else {
        let base = Line::new(
            Point::new(first_pos.x, bounds.y0 - 5.0),
            Point::new(first_pos.x, bounds.y1 + 5.0),
        );
        if writing_mode == WritingMode::VerticalRl {
            (base, Vec2::new(word.x0, 0.0), Vec2::new(word.x1, 0.0))
        } else {
            (base, Vec2::new(word.x1, 0.0), Vec2::new(word.x0, 0.0))
        }
    };

    let top_line = translate_line(base, top);
    let bottom_line = translate_line(base, bottom);
    let mut crossings: Vec<Point> = Vec::new();
    for edge in region.edges() {
        let a = segment_intersection(top_line, edge).map(|p| p - top);
        if let Some(a) = a {
            crossings.push(a);
        }
        if let Some(b) = segment_intersection(bottom_line, edge).map(|p| p - bottom) {
            if a != Some(b) {
                crossings.push(b);
            }
        }
    }
    if !crossings.is_empty() {
        crossings.push(base.p0);
        crossings.push(base.p1);
    }
    let key = |p: &Point| if horizontal { p.x } else { p.y };
    crossings.sort_by(|a, b| key(a).total_cmp(&key(b)));

    let vertices: Vec<Point> = region.vertices().collect();
    let mut spans: Vec<Line> = Vec::new();
    for pair in crossings.windows(2) {
        let line = Line::new(pair[0], pair[1]);
        let mid = line.p0.midpoint(line.p1);
        if (line.p1 - line.p0).hypot() == 0.0
            || !(region.contains(mid + top) && region.contains(mid + bottom))
        {
            continue;
        }
        let line_box = Rect::from_points(line.p0 + top, line.p1 + bottom);
        let (mut start, mut end) = if horizontal {
            (line_box.x0, line_box.x1)
        } else {
            (line_box.y0, line_box.y1)
        };
        let center = key(&mid);
        for v in vertices.iter().filter(|v| line_box.contains(**v)) {
            let k = key(v);
            if k < center {
                start = start.max(k);
            } else if k > center {
                end = end.min(k);
            }
        }
        let mut span = if horizontal {
            Line::new(Point::new(start, line.p0.y), Point::new(end, line.p1.y))
        } else {
            Line::new(Point::new(line.p0.x, start), Point::new(line.p1.x, end))
        };
        if let Some(last) = spans.last() {
            if last.p1 == pair[0] {
                span.p0 = last.p0;
                spans.pop();
            }
        }
        spans.push(span);
    }
    spans
}

/// Grow `word_box` on the block axis to the tallest character that could
/// still fit on the line starting at `index`.
fn estimate_height(
    result: &[CharacterResult],
    index: usize,
    word_box: &mut Rect,
    bounds: Rect,
    horizontal: bool,
) {
    let mut total = Vec2::new(word_box.width(), word_box.height());
    let (mut ascent, mut descent) = if horizontal {
        (word_box.y0, word_box.y1)
    } else {
        (word_box.x1, word_box.x0)
    };
    for cr in &result[index..] {
        if !cr.addressable || cr.hidden {
            continue;
        }
        total += cr.advance;
        if (horizontal && total.x > bounds.width()) || (!horizontal && total.y > bounds.height()) {
            break;
        }
        calculate_line_height(cr, &mut ascent, &mut descent, horizontal, true);
    }
    if horizontal {
        word_box.y0 = ascent;
        word_box.y1 = descent;
    } else {
        word_box.x1 = ascent;
        word_box.x0 = descent;
    }
}

/// `text-anchor` equivalent of `text-align` for lines in shapes.
pub(super) fn anchor_for_text_align(align: TextAlign, align_last: TextAlign, ltr: bool) -> TextAnchor {
    let compare = if align == TextAlign::Justify {
        align_last
    } else {
        align
    };
    match compare {
        TextAlign::Start => TextAnchor::Start,
        TextAlign::Center => TextAnchor::Middle,
        TextAlign::End => TextAnchor::End,
        TextAlign::Left if ltr => TextAnchor::Start,
        TextAlign::Left => TextAnchor::End,
        TextAlign::Right if ltr => TextAnchor::End,
        TextAlign::Right => TextAnchor::Start,
        _ if align == TextAlign::Justify => TextAnchor::Middle,
        _ => TextAnchor::Start,
    }
}

fn inline(v: Vec2, horizontal: bool) -> f64 {
    if horizontal {
        v.x
    } else {
        v.y
    }
}

/// Break the characters of `order` into lines inside `shapes`.
///
/// Words that fit nowhere are hidden. `start_pos` is moved to the first
/// position a default-sized line would take.
pub(super) fn flow_text_in_shapes(
    root: &ResolvedStyle,
    para: &Paragraph,
    order: &[usize],
    result: &mut [CharacterResult],
    shapes: &[ShapeRegion],
    start_pos: &mut Point,
    precision: f64,
) -> Vec<LineBox> {
    let mut lines: Vec<LineBox> = Vec::new();
    let Some(first_shape) = shapes.first() else {
        log::warn!("no usable shapes to flow text into");
        return lines;
    };
    let writing_mode = para.writing_mode;
    let horizontal = para.horizontal;
    let ltr = para.ltr;
    let settings = LineSettings {
        writing_mode,
        anchor: anchor_for_text_align(root.text_align, root.text_align_last, ltr),
        ltr,
        inline_size: true,
        in_shape: true,
    };
    let indent_info = root.text_indent;
    let mut text_indent = Vec2::ZERO;

    let mut word: Vec<usize> = Vec::new();
    let mut word_box = Rect::ZERO;
    let mut word_advance = Vec2::ZERO;
    let mut line = LineBox::default();
    let mut first_line = true;
    let mut indent_line = true;

    let mut current_pos = top_corner(first_shape.bounds(), writing_mode);
    let mut line_offset = current_pos;
    {
        let size = root.font_size;
        let default_box = if horizontal {
            Rect::new(0.0, -0.8 * size, precision, 0.2 * size)
        } else {
            Rect::new(-0.5 * size, 0.0, 0.5 * size, precision)
        };
        if let Some(p) =
            first_position(first_shape, default_box, current_pos, writing_mode, ltr, precision)
        {
            *start_pos = p;
        }
    }

    let mut remaining_shapes = shapes.iter();
    let mut current_shape: Option<&ShapeRegion> = None;

    for (n, &index) in order.iter().enumerate() {
        result[index].apply_tab_size(current_pos + word_advance);
        let cr = &result[index];
        if !cr.addressable {
            continue;
        }
        let break_type = cr.break_type;
        let skip_advance =
            cr.line_end != LineEdgeBehaviour::NoChange && !(line.is_empty() && word.is_empty());
        if !skip_advance {
            let placed = cr.line_height_box() + cr.total_baseline_offset();
            if word.is_empty() {
                word_box = placed;
                word_advance = cr.advance;
            } else {
                word_box = word_box.union(placed + word_advance);
                word_advance += cr.advance;
            }
        }
        word.push(index);
        line.last_line = n + 1 == order.len();
        if line.last_line {
            line.justify_line = root.text_align_last == TextAlign::Justify;
        }

        let mut soft_break = false;
        if break_type != BreakType::NoBreak || line.last_line {
            if line.chunks.is_empty() || line.last_line {
                soft_break = true;
            }
            let mut i = line.current_chunk;
            while i < line.chunks.len() {
                let span = line.chunks[i].length;
                let length = inline(current_pos - span.p0 + word_advance, horizontal);
                if (length.abs() - (span.p1 - span.p0).hypot()).round() > 0.0 {
                    if i + 1 == line.chunks.len() {
                        soft_break = true;
                        break;
                    }
                    let next = line.chunks[i + 1].length;
                    if horizontal {
                        current_pos.x = if ltr {
                            next.p0.x.max(current_pos.x)
                        } else {
                            next.p0.x.min(current_pos.x)
                        };
                    } else {
                        current_pos.y = next.p0.y;
                    }
                } else {
                    line.current_chunk = i;
                    add_word_to_line(result, &mut current_pos, &mut word, &mut line, horizontal);
                    break;
                }
                i += 1;
            }
        }

        if soft_break && line.last_line && word.is_empty() {
            // The last word fit on the current line.
            finalize_line(result, &mut current_pos, &mut line, &mut line_offset, &settings);
            lines.push(std::mem::take(&mut line));
            continue;
        }

        if soft_break {
            if line.indices().next().is_some() {
                finalize_line(result, &mut current_pos, &mut line, &mut line_offset, &settings);
                lines.push(std::mem::take(&mut line));
                first_line = false;
                indent_line = false;
            }
            let indented = if indent_info.hanging {
                !indent_line
            } else {
                indent_line
            };
            let mut indent = if indented { text_indent } else { Vec2::ZERO };
            let mut found = false;
            let mut need_new_line = true;

            if let Some(shape) = current_shape {
                // An offset line on the current shape is more stable on
                // curves than a fresh search.
                estimate_height(result, index, &mut word_box, shape.bounds(), horizontal);
                current_pos -= top_corner(word_box, writing_mode).to_vec2();
                let spans = line_spans(shape, current_pos, word_box, writing_mode, precision);
                line = LineBox::from_spans(&spans, ltr, indent);
                let length = if horizontal {
                    word_box.width()
                } else {
                    word_box.height()
                };
                if let Some(i) = line
                    .chunks
                    .iter()
                    .position(|c| (c.length.p1 - c.length.p0).hypot() > length)
                {
                    line.current_chunk = i;
                    found = true;
                    need_new_line = false;
                }
            }

            while !found {
                if let Some(shape) = current_shape {
                    if let Some(p) =
                        first_position(shape, word_box, line_offset, writing_mode, ltr, precision)
                    {
                        current_pos = p;
                        found = true;
                        break;
                    }
                }
                let Some(next) = remaining_shapes.next() else {
                    break;
                };
                current_shape = Some(next);
                let bounds = next.bounds();
                estimate_height(result, index, &mut word_box, bounds, horizontal);
                text_indent = if horizontal {
                    Vec2::new(indent_info.length, 0.0)
                } else {
                    Vec2::new(0.0, indent_info.length)
                };
                let indented = if indent_info.hanging {
                    !indent_line
                } else {
                    indent_line
                };
                indent = if indented { text_indent } else { Vec2::ZERO };
                current_pos = top_corner(bounds, writing_mode);
                line_offset = current_pos;
            }

            let mut last_ditch = false;
            if !found && first_line && !word.is_empty() {
                if let Some(shape) = current_shape {
                    // Place something even when nothing fits, e.g. when
                    // wrapping is disabled.
                    let first = &result[word[0]];
                    word_box = first.line_height_box() + first.total_baseline_offset();
                    if let Some(p) =
                        first_position(shape, word_box, line_offset, writing_mode, ltr, precision)
                    {
                        current_pos = p;
                        found = true;
                    }
                    last_ditch = true;
                }
            }

            let shape = current_shape.filter(|_| found);
            if let Some(shape) = shape {
                if need_new_line {
                    let spans = line_spans(shape, current_pos, word_box, writing_mode, precision);
                    line = LineBox::from_spans(&spans, ltr, indent);
                    line.set_current_chunk_for_pos(current_pos, horizontal);
                }
                line.first_line = first_line;
                line.expected_line_top = match writing_mode {
                    WritingMode::HorizontalTb => word_box.y0,
                    WritingMode::VerticalRl => word_box.x1,
                    WritingMode::VerticalLr => word_box.x0,
                };
                line.justify_line = root.text_align == TextAlign::Justify;
            }
            match (shape, line.chunk().map(|c| c.length.p0)) {
                (Some(shape), Some(line_start)) => {
                    current_pos = line_start + indent;
                    line_offset = current_pos;
                    if last_ditch {
                        let mut advance = current_pos;
                        word.retain(|&i| {
                            advance += result[i].advance;
                            if shape.contains(advance) {
                                true
                            } else {
                                result[i].hidden = true;
                                result[i].css_position = advance - result[i].advance;
                                result[i].final_position = result[i].css_position;
                                false
                            }
                        });
                    }
                    add_word_to_line(result, &mut current_pos, &mut word, &mut line, horizontal);
                }
                _ => {
                    log::debug!("no room in any shape for {} characters, hiding them", word.len());
                    line = LineBox::default();
                    let mut advance = current_pos;
                    for &j in &word {
                        result[j].css_position = advance;
                        result[j].final_position = advance;
                        advance += result[j].advance;
                        result[j].hidden = true;
                    }
                    word.clear();
                }
            }
        }

        if n + 1 == order.len() && !line.last_line {
            // The last word wrapped onto a fresh line.
            line.last_line = true;
            line.justify_line = root.text_align_last == TextAlign::Justify;
        }

        if break_type == BreakType::HardBreak {
            finalize_line(result, &mut current_pos, &mut line, &mut line_offset, &settings);
            if !line.chunks.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            line = LineBox::default();
            indent_line = !indent_info.hanging && indent_info.each_line;
        }
    }
    if line.indices().next().is_some() {
        finalize_line(result, &mut current_pos, &mut line, &mut line_offset, &settings);
        lines.push(line);
    }
    log::debug!("flowed text into {} lines across {} shapes", lines.len(), shapes.len());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_path_data;
    use crate::layout::test_support::*;
    use crate::model::TextContent;

    fn square(size: f64) -> ShapeRegion {
        let path = parse_path_data(&format!("M 0 0 H {size} V {size} H 0 Z"));
        ShapeRegion::from_paths(&path, &[], 0.0, 0.0, 0.1)
    }

    fn in_square(text: &str, size: f64) -> crate::model::TextDocument {
        let mut document = doc(TextContent::text(text, sized(10.0)));
        document.shapes_inside = vec![format!("M 0 0 H {size} V {size} H 0 Z")];
        document
    }

    #[test]
    fn test_first_position_is_top_left() {
        let region = square(100.0);
        let word = Rect::new(0.0, -8.0, 30.0, 2.0);
        let p = first_position(&region, word, Point::ZERO, WritingMode::HorizontalTb, true, 1e-3)
            .unwrap();
        assert!((p.x - 0.0).abs() < 1e-2, "{p:?}");
        assert!((p.y - 8.0).abs() < 1e-2, "{p:?}");
    }

    #[test]
    fn test_first_position_fails_when_too_wide() {
        let region = square(20.0);
        let word = Rect::new(0.0, -8.0, 30.0, 2.0);
        assert!(
            first_position(&region, word, Point::ZERO, WritingMode::HorizontalTb, true, 1e-3)
                .is_none()
        );
    }

    #[test]
    fn test_spans_split_around_hole() {
        let inside = parse_path_data("M 0 0 H 100 V 100 H 0 Z");
        let hole = parse_path_data("M 40 0 H 60 V 100 H 40 Z");
        let region = ShapeRegion::from_paths(&inside, &[hole], 0.0, 0.0, 0.1);
        let spans = line_spans(
            &region,
            Point::new(0.0, 50.0),
            Rect::new(0.0, -8.0, 10.0, 2.0),
            WritingMode::HorizontalTb,
            1e-3,
        );
        assert_eq!(spans.len(), 2);
        assert!((spans[0].p0.x - 0.0).abs() < 1e-6);
        assert!((spans[0].p1.x - 40.0).abs() < 1e-6);
        assert!((spans[1].p0.x - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_text_align_maps_to_anchor() {
        assert_eq!(
            anchor_for_text_align(TextAlign::Left, TextAlign::Auto, false),
            TextAnchor::End
        );
        assert_eq!(
            anchor_for_text_align(TextAlign::Justify, TextAlign::Center, true),
            TextAnchor::Middle
        );
        assert_eq!(
            anchor_for_text_align(TextAlign::Justify, TextAlign::Auto, true),
            TextAnchor::Middle
        );
    }

    #[test]
    fn test_text_wraps_inside_square() {
        let layout = run(&in_square("aaa bbb ccc", 45.0));
        assert!(layout.lines.len() >= 2);
        for c in layout.visible_chars() {
            let p = c.final_position;
            assert!(p.x >= -1e-6 && p.x <= 45.0 + 1e-6, "{p:?}");
            assert!(p.y >= -1e-6 && p.y <= 45.0 + 1e-6, "{p:?}");
        }
    }

    #[test]
    fn test_word_cut_by_shape_keeps_positions() {
        let layout = run(&in_square("aaaaaaa", 25.0));
        assert!(!layout.chars[0].hidden);
        assert!(!layout.chars[1].hidden);
        for (k, c) in layout.chars.iter().enumerate().take(7).skip(2) {
            assert!(c.hidden, "char {k}");
            assert!((c.final_position.x - 10.0 * k as f64).abs() < 1e-2, "char {k}");
            assert_eq!(c.final_position, c.css_position);
        }
    }

    #[test]
    fn test_overflowing_words_are_hidden() {
        let layout = run(&in_square("aa bb cc dd ee ff", 25.0));
        assert!(layout.chars.iter().any(|c| c.hidden));
    }
}
