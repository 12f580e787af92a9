//! Text on a path.
//!
//! Only direct children of the root can carry a path. Each character is
//! placed at the path point under the middle of its advance and rotated to
//! the tangent there. The block-axis offset of a character becomes an
//! offset along the path normal.

use std::ops::Range;

use super::CharacterResult;
use crate::geometry::{reverse_path, BezPath, PathEl, PathMeasure, PathSample, Point, Vec2};
use crate::model::{PathMethod, PathSide, TextPath, TextTree};
use crate::style::{Direction, TextAnchor};

/// A measured text path with its start offset resolved.
pub(super) struct PathWarp {
    measure: PathMeasure,
    offset: f64,
    closed: bool,
    stretch: bool,
}

impl PathWarp {
    pub fn new(text_path: &TextPath) -> Option<Self> {
        let path = if text_path.side == PathSide::Right {
            reverse_path(&text_path.path)
        } else {
            text_path.path.clone()
        };
        let measure = PathMeasure::new(&path);
        if measure.is_empty() || measure.length() <= 0.0 {
            log::warn!("text path has no length, characters stay in place");
            return None;
        }
        let offset = text_path.start_offset.resolve(measure.length());
        Some(Self {
            closed: measure.is_closed(),
            stretch: text_path.method == PathMethod::Stretch,
            measure,
            offset,
        })
    }

    pub fn length(&self) -> f64 {
        self.measure.length()
    }

    pub fn start_point(&self) -> Point {
        self.measure.point_at_length(self.offset)
    }

    pub fn end_point(&self) -> Point {
        self.measure.end_point()
    }

    /// Distance along the path of the middle of the character's advance.
    /// Hides characters that fall off the path.
    pub fn place(&self, cr: &mut CharacterResult, horizontal: bool) -> f64 {
        let length = self.length();
        let pos = if horizontal {
            cr.final_position.x + cr.advance.x * 0.5
        } else {
            cr.final_position.y + cr.advance.y * 0.5
        };
        let mut mid = pos + self.offset;
        if self.closed {
            let rtl = cr.direction == Direction::Rtl;
            let (lo, hi) = match (cr.anchor, rtl) {
                (TextAnchor::Start, false) | (TextAnchor::End, true) => (0.0, length),
                (TextAnchor::End, false) | (TextAnchor::Start, true) => (-length, 0.0),
                (TextAnchor::Middle, _) => (-length * 0.5, length * 0.5),
            };
            if pos < lo || pos > hi {
                cr.hidden = true;
            }
            mid = mid.rem_euclid(length);
        } else if mid < 0.0 || mid > length {
            cr.hidden = true;
        }
        mid
    }

    fn sample(&self, distance: f64) -> PathSample {
        self.measure.sample(distance).unwrap_or(PathSample {
            point: Point::ZERO,
            tangent: Vec2::new(1.0, 0.0),
        })
    }

    /// Map one user space point onto the path. Points past the ends of an
    /// open path continue along the end tangents.
    fn warp_point(&self, p: Point, horizontal: bool) -> Point {
        let along = if horizontal { p.x } else { p.y } + self.offset;
        let length = self.length();
        let (mid, overshoot) = if self.closed {
            (along.rem_euclid(length), 0.0)
        } else {
            let clamped = along.clamp(0.0, length);
            (clamped, clamped - along)
        };
        let s = self.sample(mid);
        if horizontal {
            s.point - overshoot * s.tangent + p.y * s.normal()
        } else {
            s.point - overshoot * s.tangent - p.x * s.normal()
        }
    }

    /// Bend a flat user space path along the text path.
    pub fn stretch_path(&self, path: &BezPath, horizontal: bool) -> BezPath {
        let f = |p: Point| self.warp_point(p, horizontal);
        path.elements()
            .iter()
            .map(|el| match *el {
                PathEl::MoveTo(p) => PathEl::MoveTo(f(p)),
                PathEl::LineTo(p) => PathEl::LineTo(f(p)),
                PathEl::QuadTo(a, p) => PathEl::QuadTo(f(a), f(p)),
                PathEl::CurveTo(a, b, p) => PathEl::CurveTo(f(a), f(b), f(p)),
                PathEl::ClosePath => PathEl::ClosePath,
            })
            .collect()
    }

    /// Put one visible character onto the path.
    fn warp_char(&self, cr: &mut CharacterResult, mid: f64, horizontal: bool) {
        let before = cr.final_position;
        if self.stretch {
            // Bend the outline in user space, then bring it back to the
            // glyph space of the new position.
            let tf = cr.final_transform();
            cr.glyph.map_paths(|p| self.stretch_path(&(tf * p.clone()), horizontal));
        }
        let s = self.sample(mid);
        if horizontal {
            cr.rotate += s.angle();
            cr.final_position =
                s.point - (cr.advance.x * 0.5) * s.tangent + before.y * s.normal();
        } else {
            cr.rotate += s.angle() - std::f64::consts::FRAC_PI_2;
            cr.final_position =
                s.point - (cr.advance.y * 0.5) * s.tangent - before.x * s.normal();
        }
        if self.stretch {
            let inverse = cr.final_transform().inverse();
            cr.glyph.map_paths(|p| inverse * p.clone());
        }
        cr.text_path_and_anchoring_offset += cr.final_position - before;
    }
}

/// Place the characters of every top-level text path. Text after a path
/// continues from the path's end until the next anchored chunk.
///
/// Returns the new start position when the first child is on a path.
pub(super) fn apply_text_path(
    tree: &TextTree,
    ranges: &[Range<usize>],
    result: &mut [CharacterResult],
    horizontal: bool,
) -> Option<Point> {
    let root = tree.root();
    let mut start = None;
    let mut in_path = false;
    let mut after_path = false;
    let mut path_end = Vec2::ZERO;

    for (n, child) in tree.children(root).enumerate() {
        let range = ranges[child.index()].clone();
        let warp = tree.node(child).text_path.as_ref().and_then(PathWarp::new);
        if let Some(warp) = warp {
            in_path = true;
            if n == 0 {
                start = Some(warp.start_point());
            }
            log::debug!(
                "text path on node {}: length {}, offset {}",
                child.index(),
                warp.length(),
                warp.offset
            );
            for cr in &mut result[range] {
                if cr.middle {
                    continue;
                }
                let mid = warp.place(cr, horizontal);
                if !cr.hidden {
                    warp.warp_char(cr, mid, horizontal);
                }
            }
            path_end = warp.end_point().to_vec2();
            continue;
        }

        if in_path {
            in_path = false;
            after_path = true;
            if let Some(first) = result.get(range.start) {
                path_end -= first.final_position.to_vec2();
            }
        }
        if after_path {
            for cr in &mut result[range] {
                if cr.anchored_chunk {
                    after_path = false;
                    break;
                }
                cr.final_position += path_end;
                cr.text_path_and_anchoring_offset += path_end;
            }
        }
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_path_data;
    use crate::layout::test_support::*;
    use crate::model::{PathOffset, TextContent, TextDocument, TextPathRef};
    use crate::style::Style;

    fn on_path(data: &str, text: &str, path_ref: TextPathRef) -> TextDocument {
        let mut document = doc(TextContent::span(
            sized(10.0),
            vec![TextContent {
                text_path: Some(TextPathRef {
                    href: Some("p".into()),
                    ..path_ref
                }),
                ..TextContent::text(text, Style::default())
            }],
        ));
        document.paths.insert("p".into(), data.into());
        document
    }

    fn warp(data: &str) -> PathWarp {
        PathWarp::new(&TextPath {
            path: parse_path_data(data),
            side: PathSide::Left,
            start_offset: PathOffset::Length(0.0),
            method: PathMethod::Align,
        })
        .unwrap()
    }

    #[test]
    fn test_straight_path_keeps_positions() {
        let layout = run(&on_path("M 0 50 L 200 50", "ab", TextPathRef::default()));
        assert!((layout.chars[0].final_position.x - 0.0).abs() < 1e-6);
        assert!((layout.chars[0].final_position.y - 50.0).abs() < 1e-6);
        assert!((layout.chars[1].final_position.x - 10.0).abs() < 1e-6);
        assert!(layout.chars[1].rotate.abs() < 1e-9);
    }

    #[test]
    fn test_vertical_path_rotates_glyphs() {
        let layout = run(&on_path("M 0 0 L 0 200", "ab", TextPathRef::default()));
        let c = &layout.chars[1];
        assert!((c.rotate - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((c.final_position.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_off_path_chars_are_hidden() {
        let layout = run(&on_path("M 0 0 L 25 0", "abcd", TextPathRef::default()));
        assert!(!layout.chars[1].hidden);
        assert!(layout.chars[3].hidden);
    }

    #[test]
    fn test_right_side_reverses_path() {
        let layout = run(&on_path(
            "M 0 0 L 100 0",
            "a",
            TextPathRef {
                side: PathSide::Right,
                ..Default::default()
            },
        ));
        let c = &layout.chars[0];
        assert!((c.final_position.x - 100.0).abs() < 1e-6);
        assert!((c.rotate.abs() - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_closed_path_wraps() {
        let w = warp("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        assert!(w.closed);
        let mut cr = CharacterResult {
            final_position: Point::new(39.0, 0.0),
            advance: Vec2::new(4.0, 0.0),
            ..Default::default()
        };
        let mid = w.place(&mut cr, true);
        assert!(cr.hidden);
        assert!((mid - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_closed_path_hides_before_start() {
        let w = warp("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        let mut cr = CharacterResult {
            final_position: Point::new(-10.0, 0.0),
            advance: Vec2::new(10.0, 0.0),
            ..Default::default()
        };
        // Midpoint at -5 lies before the start of a start-anchored closed
        // path; it wraps to 35 but is not drawn.
        let mid = w.place(&mut cr, true);
        assert!(cr.hidden);
        assert!((mid - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_stretch_bends_points_past_the_end() {
        let w = warp("M 0 0 L 10 0");
        let path: BezPath = [PathEl::MoveTo(Point::new(15.0, -2.0))].into_iter().collect();
        let bent = w.stretch_path(&path, true);
        assert_eq!(bent.elements()[0], PathEl::MoveTo(Point::new(15.0, -2.0)));
    }

    #[test]
    fn test_text_after_path_continues_from_end() {
        let mut document = on_path("M 0 0 L 30 30", "a", TextPathRef::default());
        document
            .root
            .children
            .push(TextContent::text("b", Style::default()));
        let layout = run(&document);
        let b = &layout.chars[1];
        assert!((b.final_position.x - 30.0).abs() < 1e-6);
        assert!((b.final_position.y - 30.0).abs() < 1e-6);
    }
}
