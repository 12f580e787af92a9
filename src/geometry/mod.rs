//! # Geometry
//!
//! Path data parsing, arc-length sampling along paths, and the polygon
//! helpers the shape line breaker works on. Everything is built on `kurbo`
//! in user space (y grows downward).

pub mod path;
pub mod polygon;

pub use kurbo::{Affine, BezPath, Line, PathEl, Point, Rect, Vec2};
pub use path::{parse_path_checked, parse_path_data, reverse_path, PathMeasure, PathSample};
pub use polygon::{Polygon, ShapeRegion};

/// Intersection of two bounded segments, if any.
pub fn segment_intersection(a: Line, b: Line) -> Option<Point> {
    let (t, u) = line_params(a, b)?;
    let eps = 1e-9;
    if (-eps..=1.0 + eps).contains(&t) && (-eps..=1.0 + eps).contains(&u) {
        Some(a.p0 + (a.p1 - a.p0) * t)
    } else {
        None
    }
}

/// Intersection of the infinite lines through `a` and `b`.
pub fn line_intersection(a: Line, b: Line) -> Option<Point> {
    let (t, _) = line_params(a, b)?;
    Some(a.p0 + (a.p1 - a.p0) * t)
}

fn line_params(a: Line, b: Line) -> Option<(f64, f64)> {
    let r = a.p1 - a.p0;
    let s = b.p1 - b.p0;
    let denom = r.cross(s);
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = b.p0 - a.p0;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    Some((t, u))
}

/// Translate a line by a vector.
pub fn translate_line(line: Line, v: Vec2) -> Line {
    Line::new(line.p0 + v, line.p1 + v)
}

/// Grow `rect` to include `other`, treating an all-zero rect as empty.
pub fn unite_rect(rect: Rect, other: Rect) -> Rect {
    if is_null_rect(rect) {
        other
    } else if is_null_rect(other) {
        rect
    } else {
        rect.union(other)
    }
}

pub fn is_null_rect(rect: Rect) -> bool {
    rect.x0 == 0.0 && rect.y0 == 0.0 && rect.x1 == 0.0 && rect.y1 == 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_intersection_crossing() {
        let a = Line::new((0.0, 0.0), (10.0, 10.0));
        let b = Line::new((0.0, 10.0), (10.0, 0.0));
        let p = segment_intersection(a, b).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_intersection_outside_bounds() {
        let a = Line::new((0.0, 0.0), (1.0, 0.0));
        let b = Line::new((5.0, -1.0), (5.0, 1.0));
        assert!(segment_intersection(a, b).is_none());
        assert!(line_intersection(a, b).is_some());
    }

    #[test]
    fn test_parallel_lines() {
        let a = Line::new((0.0, 0.0), (1.0, 0.0));
        let b = Line::new((0.0, 1.0), (1.0, 1.0));
        assert!(line_intersection(a, b).is_none());
    }

    #[test]
    fn test_unite_rect_empty() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(unite_rect(Rect::ZERO, r), r);
        assert_eq!(unite_rect(r, Rect::ZERO), r);
    }
}
