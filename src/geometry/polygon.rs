//! Flattened polygon helpers for shape wrapping.
//!
//! Shapes are flattened once into polygons. Containment uses the nonzero
//! winding rule, and a [`ShapeRegion`] answers "inside this shape but outside
//! every subtracted shape" without computing polygon booleans.

use super::{segment_intersection, Line, Point, Rect, Vec2};
use kurbo::{BezPath, PathEl};

pub type Polygon = Vec<Point>;

/// Flatten a path into closed polygons, one per subpath.
pub fn flatten_to_polygons(path: &BezPath, tolerance: f64) -> Vec<Polygon> {
    let mut polygons: Vec<Polygon> = Vec::new();
    let mut current: Polygon = Vec::new();
    kurbo::flatten(path.iter(), tolerance, |el| match el {
        PathEl::MoveTo(p) => {
            if current.len() >= 3 {
                polygons.push(std::mem::take(&mut current));
            }
            current.clear();
            current.push(p);
        }
        PathEl::LineTo(p) => {
            if current.last() != Some(&p) {
                current.push(p);
            }
        }
        PathEl::ClosePath => {
            if current.len() >= 3 {
                polygons.push(std::mem::take(&mut current));
            }
            current.clear();
        }
        // flatten only emits move/line/close
        PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
    });
    if current.len() >= 3 {
        polygons.push(current);
    }
    for poly in &mut polygons {
        if poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
    }
    polygons
}

/// Shoelace signed area.
pub fn signed_area(poly: &[Point]) -> f64 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Winding number of `poly` around `pt`.
pub fn winding_number(poly: &[Point], pt: Point) -> i32 {
    let n = poly.len();
    let mut winding = 0;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if a.y <= pt.y {
            if b.y > pt.y && (b - a).cross(pt - a) > 0.0 {
                winding += 1;
            }
        } else if b.y <= pt.y && (b - a).cross(pt - a) < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Nonzero-rule containment over a set of polygons.
pub fn contains_nonzero(polys: &[Polygon], pt: Point) -> bool {
    polys.iter().map(|p| winding_number(p, pt)).sum::<i32>() != 0
}

pub fn polygon_edges(poly: &[Point]) -> impl Iterator<Item = Line> + '_ {
    let n = poly.len();
    (0..n).map(move |i| Line::new(poly[i], poly[(i + 1) % n]))
}

pub fn polygons_bounds(polys: &[Polygon]) -> Rect {
    let mut bounds: Option<Rect> = None;
    for p in polys.iter().flatten() {
        bounds = Some(match bounds {
            Some(r) => r.union_pt(*p),
            None => Rect::from_points(*p, *p),
        });
    }
    bounds.unwrap_or(Rect::ZERO)
}

const MITER_LIMIT: f64 = 4.0;

/// Grow (positive `delta`) or shrink (negative) a polygon along its outward
/// normals with mitered joins.
pub fn offset_polygon(poly: &[Point], delta: f64) -> Polygon {
    let n = poly.len();
    if n < 3 || delta == 0.0 {
        return poly.to_vec();
    }
    let orientation = if signed_area(poly) >= 0.0 { 1.0 } else { -1.0 };
    offset_contour(poly, delta * orientation)
}

/// Offset a contour to the right of its direction of travel (in the
/// y-up sense) by `delta`, regardless of its own orientation.
pub fn offset_contour(poly: &[Point], delta: f64) -> Polygon {
    let n = poly.len();
    if n < 3 || delta == 0.0 {
        return poly.to_vec();
    }
    let normal = |a: Point, b: Point| -> Vec2 {
        let d = b - a;
        let len = d.hypot();
        if len < 1e-12 {
            Vec2::ZERO
        } else {
            Vec2::new(d.y, -d.x) / len
        }
    };

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = poly[(i + n - 1) % n];
        let cur = poly[i];
        let next = poly[(i + 1) % n];
        let n0 = normal(prev, cur);
        let n1 = normal(cur, next);
        let l0 = Line::new(prev + n0 * delta, cur + n0 * delta);
        let l1 = Line::new(cur + n1 * delta, next + n1 * delta);
        let joined = super::line_intersection(l0, l1).unwrap_or(cur + n1 * delta);
        let reach = joined - cur;
        let limit = MITER_LIMIT * delta.abs();
        if reach.hypot() > limit {
            let bisector = n0 + n1;
            let dir = if bisector.hypot() < 1e-12 {
                n1
            } else {
                bisector / bisector.hypot()
            };
            out.push(cur + dir * delta.signum() * limit);
        } else {
            out.push(joined);
        }
    }
    out
}

/// Area a text run may occupy: inside one shape, outside every subtracted
/// shape.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegion {
    pub inside: Vec<Polygon>,
    pub subtract: Vec<Polygon>,
}

impl ShapeRegion {
    pub fn new(inside: Vec<Polygon>, subtract: Vec<Polygon>) -> Self {
        Self { inside, subtract }
    }

    /// Build a region from path geometry, applying shape-padding to the
    /// inside shape and shape-margin to the subtracted shapes.
    pub fn from_paths(
        inside: &BezPath,
        subtract: &[BezPath],
        padding: f64,
        margin: f64,
        tolerance: f64,
    ) -> Self {
        let inside = flatten_to_polygons(inside, tolerance)
            .iter()
            .map(|p| offset_polygon(p, -padding))
            .collect();
        let subtract = subtract
            .iter()
            .flat_map(|s| flatten_to_polygons(s, tolerance))
            .map(|p| offset_polygon(&p, margin))
            .collect();
        Self { inside, subtract }
    }

    pub fn is_empty(&self) -> bool {
        self.inside.is_empty()
    }

    pub fn contains(&self, pt: Point) -> bool {
        contains_nonzero(&self.inside, pt) && !contains_nonzero(&self.subtract, pt)
    }

    /// True when the whole rectangle lies in the region: corners and center
    /// are inside and no region edge crosses its sides.
    pub fn contains_rect(&self, rect: Rect) -> bool {
        let e = 1e-6;
        let rect = rect.abs();
        let r = Rect::new(rect.x0 + e, rect.y0 + e, rect.x1 - e, rect.y1 - e);
        let corners = [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ];
        if !corners.iter().all(|c| self.contains(*c)) || !self.contains(r.center()) {
            return false;
        }
        let sides = [
            Line::new(corners[0], corners[1]),
            Line::new(corners[1], corners[2]),
            Line::new(corners[2], corners[3]),
            Line::new(corners[3], corners[0]),
        ];
        !self
            .edges()
            .any(|edge| sides.iter().any(|side| segment_intersection(edge, *side).is_some()))
    }

    /// Every edge of the inside and subtracted polygons.
    pub fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        self.inside
            .iter()
            .chain(self.subtract.iter())
            .flat_map(|p| polygon_edges(p))
    }

    /// Every vertex of the inside and subtracted polygons.
    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.inside
            .iter()
            .chain(self.subtract.iter())
            .flat_map(|p| p.iter().copied())
    }

    pub fn bounds(&self) -> Rect {
        polygons_bounds(&self.inside)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_path_data;

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ]
    }

    #[test]
    fn test_flatten_square() {
        let polys = flatten_to_polygons(&parse_path_data("M 0 0 H 10 V 10 H 0 Z"), 0.1);
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 4);
    }

    #[test]
    fn test_winding_containment() {
        let sq = square(0.0, 0.0, 10.0);
        assert!(contains_nonzero(&[sq.clone()], Point::new(5.0, 5.0)));
        assert!(!contains_nonzero(&[sq], Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_offset_grows_regardless_of_orientation() {
        let sq = square(0.0, 0.0, 10.0);
        let mut rev = sq.clone();
        rev.reverse();
        for poly in [sq, rev] {
            let grown = offset_polygon(&poly, 2.0);
            let area = signed_area(&grown).abs();
            assert!((area - 196.0).abs() < 1e-6, "area {}", area);
        }
    }

    #[test]
    fn test_offset_shrinks() {
        let shrunk = offset_polygon(&square(0.0, 0.0, 10.0), -1.0);
        assert!((signed_area(&shrunk).abs() - 64.0).abs() < 1e-6);
    }

    #[test]
    fn test_region_subtract() {
        let region = ShapeRegion::new(vec![square(0.0, 0.0, 100.0)], vec![square(40.0, 40.0, 20.0)]);
        assert!(region.contains(Point::new(10.0, 10.0)));
        assert!(!region.contains(Point::new(50.0, 50.0)));
        assert!(region.contains_rect(Rect::new(5.0, 5.0, 30.0, 30.0)));
        assert!(!region.contains_rect(Rect::new(30.0, 30.0, 70.0, 35.0 + 10.0)));
    }

    #[test]
    fn test_region_from_paths_margin() {
        let inside = parse_path_data("M 0 0 H 100 V 100 H 0 Z");
        let hole = parse_path_data("M 40 40 H 60 V 60 H 40 Z");
        let region = ShapeRegion::from_paths(&inside, &[hole], 5.0, 5.0, 0.1);
        assert!(!region.contains(Point::new(2.0, 50.0)));
        assert!(!region.contains(Point::new(37.0, 50.0)));
        assert!(region.contains(Point::new(20.0, 50.0)));
    }
}
