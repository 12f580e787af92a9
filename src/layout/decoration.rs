//! Underline, overline and line-through.
//!
//! Each node that sets `text-decoration-line` gets one decoration box per
//! anchored chunk it spans. A box is a flat line laid out in user space,
//! bent along the text path when there is one, then stroked.

use std::ops::Range;

use kurbo::{Cap, Stroke, StrokeOpts};
use serde::Serialize;

use super::text_path::PathWarp;
use super::{CharacterResult, NodeGeometry, Paragraph};
use crate::geometry::{BezPath, Point, Rect, Vec2};
use crate::model::{LayoutConfig, TextTree};
use crate::style::{ResolvedStyle, TextDecorationStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DecorationKind {
    Underline,
    Overline,
    LineThrough,
}

/// Thinnest stroke that still covers one device pixel.
fn minimum_thickness(config: &LayoutConfig) -> f64 {
    if config.resolution > 0.0 {
        72.0 / config.resolution
    } else {
        0.0
    }
}

/// Stroke the decorations of every decorated node into `nodes`.
///
/// Must run before text paths are applied: boxes are measured on the
/// unwarped positions and bent afterwards.
pub(super) fn compute_text_decorations(
    tree: &TextTree,
    ranges: &[Range<usize>],
    result: &[CharacterResult],
    para: &Paragraph,
    config: &LayoutConfig,
    nodes: &mut [NodeGeometry],
) {
    let min = minimum_thickness(config);
    for id in tree.descendants(tree.root()) {
        let style = &tree.node(id).style;
        if style.text_decoration_line.is_none() {
            continue;
        }
        let warp = if para.wrapped {
            None
        } else {
            tree.text_path_of(id)
                .and_then(|p| tree.node(p).text_path.as_ref())
                .and_then(PathWarp::new)
        };
        let boxes = decoration_boxes(result, ranges[id.index()].clone(), warp.as_ref(), para);
        let geometry = &mut nodes[id.index()];
        for chars in boxes {
            let decorated = DecoratedBox::measure(result, &chars, para.horizontal, style, min);
            for (kind, path, width) in decorated.lines(style, min, warp.is_some()) {
                let path = match &warp {
                    Some(warp) => warp.stretch_path(&path, para.horizontal),
                    None => path,
                };
                let stroked = stroke(&path, width, style.text_decoration_style, config.path_tolerance);
                geometry
                    .decorations
                    .entry(kind)
                    .or_default()
                    .extend(stroked.elements().iter().copied());
            }
        }
        log::trace!("node {}: {} decoration kinds", id.index(), geometry.decorations.len());
    }
}

/// Visible characters of `range` grouped per anchored chunk, without
/// leading and trailing characters that have no ink.
fn decoration_boxes(
    result: &[CharacterResult],
    range: Range<usize>,
    warp: Option<&PathWarp>,
    para: &Paragraph,
) -> Vec<Vec<usize>> {
    let mut boxes: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for k in range {
        let cr = &result[k];
        let hidden = match warp {
            Some(warp) => {
                let mut placed = cr.clone();
                warp.place(&mut placed, para.horizontal);
                placed.hidden
            }
            None => cr.hidden,
        };
        if hidden || !cr.addressable || cr.middle {
            continue;
        }
        if cr.anchored_chunk && !current.is_empty() {
            boxes.push(std::mem::take(&mut current));
        }
        current.push(k);
    }
    boxes.push(current);

    let has_ink = |k: &usize| {
        let r = result[*k].ink_bounding_box;
        r.width() > 0.0 && r.height() > 0.0
    };
    boxes
        .into_iter()
        .filter_map(|chars| {
            let first = chars.iter().position(has_ink)?;
            let last = chars.iter().rposition(has_ink)?;
            Some(chars[first..=last].to_vec())
        })
        .collect()
}

/// A line-through run at one height.
struct Strike {
    start: f64,
    end: f64,
    offset: f64,
    thickness: f64,
}

/// The measurements of one decoration box, in user space.
struct DecoratedBox {
    horizontal: bool,
    rect: Rect,
    /// Line baseline: the position of the first character without its
    /// baseline shift.
    origin: Point,
    thickness: f64,
    over: f64,
    under: f64,
    /// Underline sits on the ascent side in vertical writing.
    flipped: bool,
    strikes: Vec<Strike>,
}

impl DecoratedBox {
    fn measure(
        result: &[CharacterResult],
        chars: &[usize],
        horizontal: bool,
        style: &ResolvedStyle,
        min: f64,
    ) -> Self {
        let n = chars.len().max(1) as f64;
        let avg = |f: &dyn Fn(&CharacterResult) -> f64| {
            chars.iter().map(|&k| f(&result[k])).sum::<f64>() / n
        };
        let rect = chars
            .iter()
            .map(|&k| result[k].bounding_box + result[k].final_position.to_vec2())
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO);
        let first = &result[chars[0]];
        let baseline = first.final_position - first.baseline_offset;
        let origin = if horizontal {
            Point::new(rect.x0, baseline.y)
        } else {
            Point::new(baseline.x, rect.y0)
        };
        let thickness = avg(&|c| c.metrics.underline_thickness).max(min);

        let position = style.text_decoration_position;
        let (over, under, flipped) = if horizontal {
            let under = if position.under {
                avg(&|c| c.bounding_box.y1)
            } else {
                avg(&|c| -c.metrics.underline_offset)
            };
            (avg(&|c| c.bounding_box.y0), under, false)
        } else {
            let right = avg(&|c| c.bounding_box.x1);
            let left = avg(&|c| c.bounding_box.x0);
            if position.left {
                (right, left, false)
            } else {
                (left, right, true)
            }
        };

        Self {
            horizontal,
            rect,
            origin,
            thickness,
            over,
            under,
            flipped,
            strikes: strikes(result, chars, horizontal, min),
        }
    }

    /// The flat decoration paths with their stroke widths.
    fn lines(
        &self,
        style: &ResolvedStyle,
        min: f64,
        on_path: bool,
    ) -> Vec<(DecorationKind, BezPath, f64)> {
        let line = style.text_decoration_line;
        let decoration = style.text_decoration_style;
        let along = |v: f64| {
            if self.horizontal {
                Vec2::new(0.0, v)
            } else {
                Vec2::new(v, 0.0)
            }
        };
        let length = if self.horizontal {
            self.rect.width()
        } else {
            self.rect.height()
        };
        let (shape, path_width) =
            line_shape(decoration, length, self.thickness, min, on_path, self.horizontal);

        let mut under = along(self.under);
        let mut over = along(self.over);
        if self.flipped {
            under += path_width;
        } else {
            over += path_width;
        }

        let mut out = Vec::new();
        let placed = |path: &BezPath, offset: Vec2| {
            let mut p = path.clone();
            p.apply_affine(kurbo::Affine::translate(self.origin.to_vec2() + offset));
            p
        };
        if line.underline {
            out.push((DecorationKind::Underline, placed(&shape, under), self.thickness));
        }
        if line.overline {
            out.push((DecorationKind::Overline, placed(&shape, over), self.thickness));
        }
        if line.line_through {
            for strike in &self.strikes {
                let (shape, path_width) = line_shape(
                    decoration,
                    strike.end - strike.start,
                    strike.thickness,
                    min,
                    on_path,
                    self.horizontal,
                );
                let start = if self.horizontal {
                    Vec2::new(strike.start - self.origin.x, 0.0)
                } else {
                    Vec2::new(0.0, strike.start - self.origin.y)
                };
                let offset = start + along(strike.offset) + path_width * 0.5;
                out.push((DecorationKind::LineThrough, placed(&shape, offset), strike.thickness));
            }
        }
        out
    }
}

/// Split a box into line-through runs. A font size change starts a new run
/// at the new font's strikeout height unless it comes with a baseline shift.
fn strikes(result: &[CharacterResult], chars: &[usize], horizontal: bool, min: f64) -> Vec<Strike> {
    let mut out: Vec<Strike> = Vec::new();
    let mut previous: Option<&CharacterResult> = None;
    for &k in chars {
        let cr = &result[k];
        let placed = cr.bounding_box + cr.final_position.to_vec2();
        let (start, end) = if horizontal {
            (placed.x0, placed.x1)
        } else {
            (placed.y0, placed.y1)
        };
        let starts_run = match previous {
            None => true,
            Some(p) => p.font_size != cr.font_size && p.baseline_offset == cr.baseline_offset,
        };
        if starts_run {
            let offset = if horizontal {
                -cr.metrics.strikeout_offset
            } else {
                cr.metrics.strikeout_offset
            };
            out.push(Strike {
                start,
                end,
                offset,
                thickness: cr.metrics.strikeout_thickness.max(min),
            });
        } else if let Some(strike) = out.last_mut() {
            strike.start = strike.start.min(start);
            strike.end = strike.end.max(end);
        }
        previous = Some(cr);
    }
    out
}

/// A decoration line of `length` starting at the origin, and the offset
/// that centers its extra width for double and wavy lines.
fn line_shape(
    style: TextDecorationStyle,
    length: f64,
    width: f64,
    min: f64,
    on_path: bool,
    horizontal: bool,
) -> (BezPath, Vec2) {
    let inline = |v: f64| {
        if horizontal {
            Point::new(v, 0.0)
        } else {
            Point::new(0.0, v)
        }
    };
    let mut path = BezPath::new();
    let mut path_width = Vec2::ZERO;

    if style == TextDecorationStyle::Wavy {
        let height = width * 2.0;
        let mut down = true;
        path.move_to(Point::ZERO);
        let mut x = 0.0;
        if height > 0.0 {
            for _ in 0..(length / height).floor() as usize {
                x += height;
                path.line_to(Point::new(x, if down { height } else { 0.0 }));
                down = !down;
            }
            let rest = length % height;
            path.line_to(Point::new(length, if down { rest } else { height - rest }));
        }
        if horizontal {
            path_width = Vec2::new(0.0, -width);
        } else {
            path.apply_affine(kurbo::Affine::new([0.0, 1.0, 1.0, 0.0, -height, 0.0]));
            path_width = Vec2::new(width, 0.0);
        }
        return (path, path_width);
    }

    path.move_to(Point::ZERO);
    if on_path {
        // Short pieces bend smoothly along the path.
        let total = if width > 0.0 {
            (length / (width * 2.0)).floor().max(1.0)
        } else {
            1.0
        };
        let segment = length / total;
        for i in 1..=total as usize {
            path.line_to(inline(segment * i as f64));
        }
    } else {
        path.line_to(inline(length));
    }

    if style == TextDecorationStyle::Double {
        let gap = (width * 1.5).max(min * 2.0);
        let shift = if horizontal {
            Vec2::new(0.0, gap)
        } else {
            Vec2::new(gap, 0.0)
        };
        let copy = kurbo::Affine::translate(shift) * path.clone();
        path.extend(copy.elements().iter().copied());
        path_width = if horizontal {
            Vec2::new(0.0, -gap)
        } else {
            Vec2::new(gap, 0.0)
        };
    }
    (path, path_width)
}

/// Outline of the decoration line with flat caps.
fn stroke(path: &BezPath, width: f64, style: TextDecorationStyle, tolerance: f64) -> BezPath {
    let mut stroke = Stroke::new(width).with_caps(Cap::Butt);
    match style {
        TextDecorationStyle::Dotted => stroke = stroke.with_dashes(0.0, [width, width * 2.0]),
        TextDecorationStyle::Dashed => stroke = stroke.with_dashes(0.0, [width * 4.0, width * 2.0]),
        _ => {}
    }
    kurbo::stroke(path.iter(), &stroke, &StrokeOpts::default(), tolerance)
}
