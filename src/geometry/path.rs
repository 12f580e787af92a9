//! SVG path data parsing and arc-length sampling.
//!
//! Text paths, shape-inside/subtract outlines and decoration warping all
//! consume paths through [`PathMeasure`], which caches per-segment lengths
//! so repeated lookups by distance stay cheap.

use kurbo::{
    Arc, BezPath, ParamCurve, ParamCurveArclen, ParamCurveDeriv, PathEl, PathSeg, Point, SvgArc,
    Vec2,
};

use crate::error::LayoutError;

const ARCLEN_ACCURACY: f64 = 1e-4;

/// Parse path data that must describe some geometry.
pub fn parse_path_checked(d: &str) -> Result<BezPath, LayoutError> {
    let path = parse_path_data(d);
    if path.elements().is_empty() {
        let shown: String = d.chars().take(32).collect();
        return Err(LayoutError::Path(format!("no geometry in {:?}", shown)));
    }
    Ok(path)
}

/// Parse SVG path data (`d` attribute) into a path.
///
/// Supports M, L, H, V, C, S, Q, T, A and Z in absolute and relative form.
/// Unknown tokens are skipped.
pub fn parse_path_data(d: &str) -> BezPath {
    let mut path = BezPath::new();
    let mut cur = Point::ZERO;
    let mut start = Point::ZERO;
    // Reflected control point for S/T.
    let mut last_ctrl: Option<(char, Point)> = None;

    let tokens = tokenize_path(d);
    let mut i = 0;

    while i < tokens.len() {
        let cmd = match tokens[i].chars().next() {
            Some(c) if c.is_ascii_alphabetic() && tokens[i].len() == 1 => c,
            _ => {
                i += 1;
                continue;
            }
        };
        let relative = cmd.is_ascii_lowercase();
        let base = |cur: Point| if relative { cur.to_vec2() } else { Vec2::ZERO };
        i += 1;

        match cmd.to_ascii_uppercase() {
            'M' => {
                let mut first = true;
                while i + 1 < tokens.len() && is_number(&tokens[i]) {
                    let p = Point::new(num(&tokens[i]), num(&tokens[i + 1])) + base(cur);
                    if first {
                        path.move_to(p);
                        start = p;
                        first = false;
                    } else {
                        // Implicit LineTo for subsequent coordinate pairs
                        path.line_to(p);
                    }
                    cur = p;
                    i += 2;
                }
                last_ctrl = None;
            }
            'L' => {
                while i + 1 < tokens.len() && is_number(&tokens[i]) {
                    cur = Point::new(num(&tokens[i]), num(&tokens[i + 1])) + base(cur);
                    path.line_to(cur);
                    i += 2;
                }
                last_ctrl = None;
            }
            'H' => {
                while i < tokens.len() && is_number(&tokens[i]) {
                    let x = num(&tokens[i]);
                    cur.x = if relative { cur.x + x } else { x };
                    path.line_to(cur);
                    i += 1;
                }
                last_ctrl = None;
            }
            'V' => {
                while i < tokens.len() && is_number(&tokens[i]) {
                    let y = num(&tokens[i]);
                    cur.y = if relative { cur.y + y } else { y };
                    path.line_to(cur);
                    i += 1;
                }
                last_ctrl = None;
            }
            'C' => {
                while i + 5 < tokens.len() && is_number(&tokens[i]) {
                    let b = base(cur);
                    let c1 = Point::new(num(&tokens[i]), num(&tokens[i + 1])) + b;
                    let c2 = Point::new(num(&tokens[i + 2]), num(&tokens[i + 3])) + b;
                    cur = Point::new(num(&tokens[i + 4]), num(&tokens[i + 5])) + b;
                    path.curve_to(c1, c2, cur);
                    last_ctrl = Some(('C', c2));
                    i += 6;
                }
            }
            'S' => {
                while i + 3 < tokens.len() && is_number(&tokens[i]) {
                    let b = base(cur);
                    let c1 = match last_ctrl {
                        Some(('C', c)) => cur + (cur - c),
                        _ => cur,
                    };
                    let c2 = Point::new(num(&tokens[i]), num(&tokens[i + 1])) + b;
                    cur = Point::new(num(&tokens[i + 2]), num(&tokens[i + 3])) + b;
                    path.curve_to(c1, c2, cur);
                    last_ctrl = Some(('C', c2));
                    i += 4;
                }
            }
            'Q' => {
                while i + 3 < tokens.len() && is_number(&tokens[i]) {
                    let b = base(cur);
                    let q = Point::new(num(&tokens[i]), num(&tokens[i + 1])) + b;
                    cur = Point::new(num(&tokens[i + 2]), num(&tokens[i + 3])) + b;
                    path.quad_to(q, cur);
                    last_ctrl = Some(('Q', q));
                    i += 4;
                }
            }
            'T' => {
                while i + 1 < tokens.len() && is_number(&tokens[i]) {
                    let q = match last_ctrl {
                        Some(('Q', c)) => cur + (cur - c),
                        _ => cur,
                    };
                    cur = Point::new(num(&tokens[i]), num(&tokens[i + 1])) + base(cur);
                    path.quad_to(q, cur);
                    last_ctrl = Some(('Q', q));
                    i += 2;
                }
            }
            'A' => {
                while i + 6 < tokens.len() && is_number(&tokens[i]) {
                    let to = Point::new(num(&tokens[i + 5]), num(&tokens[i + 6])) + base(cur);
                    let arc = SvgArc {
                        from: cur,
                        to,
                        radii: Vec2::new(num(&tokens[i]), num(&tokens[i + 1])),
                        x_rotation: num(&tokens[i + 2]).to_radians(),
                        large_arc: num(&tokens[i + 3]) != 0.0,
                        sweep: num(&tokens[i + 4]) != 0.0,
                    };
                    match Arc::from_svg_arc(&arc) {
                        Some(arc) => {
                            for el in arc.append_iter(0.1) {
                                path.push(el);
                            }
                        }
                        None => path.line_to(to),
                    }
                    cur = to;
                    i += 7;
                }
                last_ctrl = None;
            }
            'Z' => {
                path.close_path();
                cur = start;
                last_ctrl = None;
            }
            _ => {}
        }
    }

    path
}

/// Tokenize a path `d` string into commands and numbers.
fn tokenize_path(d: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in d.chars() {
        if ch.is_ascii_alphabetic() && ch != 'e' && ch != 'E' {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(ch.to_string());
        } else if ch == '-'
            && !current.is_empty()
            && !current.ends_with('e')
            && !current.ends_with('E')
        {
            // Negative sign starts a new number (unless after exponent)
            tokens.push(std::mem::take(&mut current));
            current.push(ch);
        } else if ch == '.' && current.contains('.') && !current.contains(|c| c == 'e' || c == 'E') {
            // "1.5.5" is two numbers
            tokens.push(std::mem::take(&mut current));
            current.push(ch);
        } else if ch.is_ascii_digit() || ch == '.' || ch == '-' || ch == '+' || ch == 'e' || ch == 'E' {
            current.push(ch);
        } else if (ch == ',' || ch.is_whitespace()) && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn is_number(s: &str) -> bool {
    s.parse::<f64>().is_ok()
}

fn num(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

/// Reverse the direction of every subpath, keeping subpath order.
pub fn reverse_path(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut subpath: Vec<PathSeg> = Vec::new();
    let mut closed = false;

    let mut last = Point::ZERO;
    let mut start = Point::ZERO;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                flush_reversed(&mut subpath, closed, &mut out);
                closed = false;
                last = p;
                start = p;
            }
            PathEl::LineTo(p) => {
                subpath.push(PathSeg::Line(kurbo::Line::new(last, p)));
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                subpath.push(PathSeg::Quad(kurbo::QuadBez::new(last, p1, p2)));
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                subpath.push(PathSeg::Cubic(kurbo::CubicBez::new(last, p1, p2, p3)));
                last = p3;
            }
            PathEl::ClosePath => {
                if last != start {
                    subpath.push(PathSeg::Line(kurbo::Line::new(last, start)));
                }
                closed = true;
                last = start;
            }
        }
    }
    flush_reversed(&mut subpath, closed, &mut out);
    out
}

fn flush_reversed(segs: &mut Vec<PathSeg>, closed: bool, out: &mut BezPath) {
    if let Some(last) = segs.last() {
        out.move_to(last.end());
        for seg in segs.iter().rev() {
            match seg.reverse() {
                PathSeg::Line(l) => out.line_to(l.p1),
                PathSeg::Quad(q) => out.quad_to(q.p1, q.p2),
                PathSeg::Cubic(c) => out.curve_to(c.p1, c.p2, c.p3),
            }
        }
        if closed {
            out.close_path();
        }
    }
    segs.clear();
}

/// A point on a path together with its unit tangent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub point: Point,
    pub tangent: Vec2,
}

impl PathSample {
    /// Tangent angle in radians, measured in user space (y down).
    pub fn angle(&self) -> f64 {
        self.tangent.y.atan2(self.tangent.x)
    }

    /// Unit normal pointing to the right of the direction of travel.
    pub fn normal(&self) -> Vec2 {
        Vec2::new(-self.tangent.y, self.tangent.x)
    }
}

struct MeasuredSeg {
    seg: PathSeg,
    start: f64,
    length: f64,
}

/// Arc-length index over a path.
pub struct PathMeasure {
    segments: Vec<MeasuredSeg>,
    length: f64,
    subpaths: usize,
    closed: bool,
}

impl PathMeasure {
    pub fn new(path: &BezPath) -> Self {
        let mut segments = Vec::new();
        let mut length = 0.0;
        for seg in path.segments() {
            let seg_len = seg.arclen(ARCLEN_ACCURACY);
            segments.push(MeasuredSeg {
                seg,
                start: length,
                length: seg_len,
            });
            length += seg_len;
        }

        let mut subpaths = 0;
        let mut has_close = false;
        let mut first = None;
        let mut last = None;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    subpaths += 1;
                    first = Some(p);
                    last = Some(p);
                }
                PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => {
                    last = Some(p)
                }
                PathEl::ClosePath => has_close = true,
            }
        }
        let ends_meet = match (first, last) {
            (Some(a), Some(b)) => a.distance(b) < 1e-6,
            _ => false,
        };

        Self {
            segments,
            length,
            subpaths,
            closed: subpaths == 1 && (has_close || ends_meet),
        }
    }

    /// Total arc length over all subpaths.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// True when the path is exactly one closed subpath.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn subpath_count(&self) -> usize {
        self.subpaths
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sample the path at `distance` along it, clamped to the path extent.
    pub fn sample(&self, distance: f64) -> Option<PathSample> {
        let d = distance.clamp(0.0, self.length);
        let idx = self
            .segments
            .iter()
            .rposition(|s| s.start <= d && s.length > 0.0)
            .or_else(|| self.segments.iter().position(|s| s.length > 0.0))?;
        let ms = &self.segments[idx];
        let local = (d - ms.start).clamp(0.0, ms.length);
        let t = if ms.length > 0.0 {
            ms.seg.inv_arclen(local, ARCLEN_ACCURACY)
        } else {
            0.0
        };
        let point = ms.seg.eval(t);
        let tangent = segment_tangent(ms.seg, t);
        Some(PathSample { point, tangent })
    }

    pub fn point_at_length(&self, distance: f64) -> Point {
        self.sample(distance).map(|s| s.point).unwrap_or(Point::ZERO)
    }

    /// End point of the path (the point reached at full length).
    pub fn end_point(&self) -> Point {
        self.segments
            .last()
            .map(|s| s.seg.end())
            .unwrap_or(Point::ZERO)
    }
}

fn segment_tangent(seg: PathSeg, t: f64) -> Vec2 {
    let d = match seg {
        PathSeg::Line(l) => l.p1 - l.p0,
        PathSeg::Quad(q) => q.deriv().eval(t).to_vec2(),
        PathSeg::Cubic(c) => c.deriv().eval(t).to_vec2(),
    };
    let d = if d.hypot() < 1e-12 {
        // Degenerate derivative at an end point; use the chord instead.
        let a = seg.eval((t - 1e-3).max(0.0));
        let b = seg.eval((t + 1e-3).min(1.0));
        b - a
    } else {
        d
    };
    let len = d.hypot();
    if len < 1e-12 {
        Vec2::new(1.0, 0.0)
    } else {
        d / len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_parse_rejects_empty_data() {
        assert!(matches!(parse_path_checked("  "), Err(LayoutError::Path(_))));
        assert!(matches!(parse_path_checked("foo"), Err(LayoutError::Path(_))));
        assert!(parse_path_checked("M 0 0 L 1 1").is_ok());
    }

    #[test]
    fn test_parse_path_m_l_z() {
        let path = parse_path_data("M 10 20 L 30 40 Z");
        let els = path.elements();
        assert_eq!(els[0], PathEl::MoveTo(Point::new(10.0, 20.0)));
        assert_eq!(els[1], PathEl::LineTo(Point::new(30.0, 40.0)));
        assert_eq!(els[2], PathEl::ClosePath);
    }

    #[test]
    fn test_parse_path_relative() {
        let path = parse_path_data("m 10 20 l 5 5 h 5 v -10 z");
        let els = path.elements();
        assert_eq!(els[1], PathEl::LineTo(Point::new(15.0, 25.0)));
        assert_eq!(els[2], PathEl::LineTo(Point::new(20.0, 25.0)));
        assert_eq!(els[3], PathEl::LineTo(Point::new(20.0, 15.0)));
    }

    #[test]
    fn test_parse_compact_numbers() {
        let path = parse_path_data("M0,0L10-5l.5.5");
        let els = path.elements();
        assert_eq!(els[1], PathEl::LineTo(Point::new(10.0, -5.0)));
        assert_eq!(els[2], PathEl::LineTo(Point::new(10.5, -4.5)));
    }

    #[test]
    fn test_parse_arc_ends_at_target() {
        let path = parse_path_data("M 0 0 A 10 10 0 0 1 20 0");
        let measure = PathMeasure::new(&path);
        let end = measure.end_point();
        assert!((end.x - 20.0).abs() < 1e-6 && end.y.abs() < 1e-6);
        // Half circle of radius 10.
        assert!((measure.length() - std::f64::consts::PI * 10.0).abs() < 0.05);
    }

    #[test]
    fn test_measure_line_length_and_tangent() {
        let path = parse_path_data("M 0 0 L 100 0");
        let measure = PathMeasure::new(&path);
        assert!((measure.length() - 100.0).abs() < 1e-9);
        assert!(!measure.is_closed());
        let s = measure.sample(25.0).unwrap();
        assert!((s.point.x - 25.0).abs() < 1e-6);
        assert!((s.tangent.x - 1.0).abs() < 1e-9);
        assert!(s.angle().abs() < 1e-9);
    }

    #[test]
    fn test_measure_closed_square() {
        let path = parse_path_data("M 0 0 H 10 V 10 H 0 Z");
        let measure = PathMeasure::new(&path);
        assert!(measure.is_closed());
        assert!((measure.length() - 40.0).abs() < 1e-9);
        let s = measure.sample(15.0).unwrap();
        assert!((s.point.x - 10.0).abs() < 1e-6 && (s.point.y - 5.0).abs() < 1e-6);
        assert!((s.tangent.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_subpaths_not_closed() {
        let path = parse_path_data("M 0 0 H 10 Z M 20 0 H 30 Z");
        let measure = PathMeasure::new(&path);
        assert_eq!(measure.subpath_count(), 2);
        assert!(!measure.is_closed());
    }

    #[test]
    fn test_reverse_path() {
        let path = parse_path_data("M 0 0 L 10 0 L 10 10");
        let rev = reverse_path(&path);
        let els = rev.elements();
        assert_eq!(els[0], PathEl::MoveTo(Point::new(10.0, 10.0)));
        assert_eq!(els[2], PathEl::LineTo(Point::new(0.0, 0.0)));
    }
}
