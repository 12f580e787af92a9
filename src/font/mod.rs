//! # Font Collaborators
//!
//! Layout never touches font files directly. It talks to three narrow
//! interfaces, bundled as [`FontBackend`]:
//!
//! - [`FontResolver`] picks fonts for runs of text and reports metrics.
//! - [`Shaper`] turns characters into positioned glyph records.
//! - [`GlyphRasterizer`] produces the drawable [`Glyph`] for a glyph id.
//!
//! Two backends ship with the crate: [`registry::FontRegistry`] over real
//! OpenType data (ttf-parser + rustybuzz), and [`fixed::FixedMetrics`], a
//! deterministic monospace backend for tests and previews.
//!
//! All geometry crossing these interfaces is in user units at the requested
//! size. Metrics are y-up ("over" positive); glyph outlines, advances and
//! offsets are y-down like the rest of user space.

pub mod fixed;
pub mod registry;

use crate::error::LayoutError;
use crate::geometry::{Affine, BezPath, Rect, Vec2};
use crate::model::LayoutConfig;
use crate::style::{Baseline, Color, FontAxis, FontStyle, ResolvedStyle, TextRendering};
use crate::text::breaks::is_word_separator;
use unicode_script::Script;

pub use fixed::FixedMetrics;
pub use registry::FontRegistry;

/// Handle to a font owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub usize);

/// Everything a resolver needs to pick fonts for a span of text.
#[derive(Debug, Clone, PartialEq)]
pub struct FontQuery {
    pub families: Vec<String>,
    pub size: f64,
    pub size_adjust: Option<f64>,
    pub weight: u16,
    /// `font-stretch` percentage.
    pub width: f64,
    pub style: FontStyle,
    pub axes: Vec<FontAxis>,
    pub language: Option<String>,
    /// Dots per inch.
    pub resolution: f64,
    pub disable_matching: bool,
}

impl FontQuery {
    pub fn from_style(style: &ResolvedStyle, config: &LayoutConfig) -> Self {
        Self {
            families: style.font_family.clone(),
            size: style.font_size,
            size_adjust: style.font_size_adjust,
            weight: style.font_weight,
            width: style.font_stretch,
            style: style.font_style,
            axes: style.font_variation_settings.clone(),
            language: style.lang.clone(),
            resolution: config.resolution,
            disable_matching: config.disable_font_matching,
        }
    }
}

/// A run of characters rendered with one font. `font` is `None` when
/// nothing could be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontRun {
    pub font: Option<FontId>,
    pub length: usize,
}

/// Baseline positions relative to the alphabetic baseline (horizontal) or
/// the central baseline (vertical), "over" positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BaselineTable {
    pub alphabetic: f64,
    /// Ideographic bottom.
    pub ideographic: f64,
    pub ideographic_top: f64,
    pub ideographic_center: f64,
    pub central: f64,
    pub hanging: f64,
    pub mathematical: f64,
    pub middle: f64,
    pub text_top: f64,
    pub text_bottom: f64,
}

impl BaselineTable {
    /// Position of `baseline`. Keywords without a table entry map to the
    /// alphabetic baseline.
    pub fn get(&self, baseline: Baseline) -> f64 {
        match baseline {
            Baseline::Alphabetic => self.alphabetic,
            Baseline::Ideographic => self.ideographic,
            Baseline::IdeographicTop => self.ideographic_top,
            Baseline::IdeographicCenter => self.ideographic_center,
            Baseline::Central => self.central,
            Baseline::Hanging => self.hanging,
            Baseline::Mathematical => self.mathematical,
            Baseline::Middle => self.middle,
            Baseline::TextTop => self.text_top,
            Baseline::TextBottom => self.text_bottom,
            Baseline::Auto | Baseline::Dominant | Baseline::NoChange | Baseline::ResetSize => {
                self.alphabetic
            }
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            alphabetic: self.alphabetic * factor,
            ideographic: self.ideographic * factor,
            ideographic_top: self.ideographic_top * factor,
            ideographic_center: self.ideographic_center * factor,
            central: self.central * factor,
            hanging: self.hanging * factor,
            mathematical: self.mathematical * factor,
            middle: self.middle * factor,
            text_top: self.text_top * factor,
            text_bottom: self.text_bottom * factor,
        }
    }

    /// Shift every entry so `origin` becomes zero.
    pub fn rebased(&self, origin: f64) -> Self {
        Self {
            alphabetic: self.alphabetic - origin,
            ideographic: self.ideographic - origin,
            ideographic_top: self.ideographic_top - origin,
            ideographic_center: self.ideographic_center - origin,
            central: self.central - origin,
            hanging: self.hanging - origin,
            mathematical: self.mathematical - origin,
            middle: self.middle - origin,
            text_top: self.text_top - origin,
            text_bottom: self.text_bottom - origin,
        }
    }
}

/// Font metrics at a given size, in user units, y-up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontMetrics {
    pub font_size: f64,
    pub horizontal: bool,
    pub ascender: f64,
    /// Zero or negative.
    pub descender: f64,
    pub line_gap: f64,
    pub x_height: f64,
    pub cap_height: f64,
    pub baselines: BaselineTable,
    /// Distance of the underline center from the baseline, negative below.
    pub underline_offset: f64,
    pub underline_thickness: f64,
    pub strikeout_offset: f64,
    pub strikeout_thickness: f64,
    pub superscript_offset: Vec2,
    pub subscript_offset: Vec2,
    /// Caret direction as (rise, run).
    pub caret_slope: (f64, f64),
    pub caret_offset: f64,
}

impl FontMetrics {
    /// Generic metrics for text without a resolvable font.
    pub fn approximate(size: f64, horizontal: bool) -> Self {
        let ascender = 0.8 * size;
        let descender = -0.2 * size;
        let x_height = 0.5 * size;
        let metrics = Self {
            font_size: size,
            horizontal: true,
            ascender,
            descender,
            line_gap: 0.0,
            x_height,
            cap_height: 0.7 * size,
            baselines: synthesize_baselines(ascender, descender, x_height),
            underline_offset: -0.1 * size,
            underline_thickness: 0.05 * size,
            strikeout_offset: 0.3 * size,
            strikeout_thickness: 0.05 * size,
            superscript_offset: Vec2::new(0.0, 0.34 * size),
            subscript_offset: Vec2::new(0.0, -0.14 * size),
            caret_slope: (1.0, 0.0),
            caret_offset: 0.0,
        };
        if horizontal {
            metrics
        } else {
            metrics.into_vertical()
        }
    }

    /// Recenter on the central baseline for vertical writing. The em box
    /// straddles the baseline evenly.
    pub fn into_vertical(mut self) -> Self {
        if !self.horizontal {
            return self;
        }
        let central = self.baselines.central;
        let half = (self.ascender - self.descender) / 2.0;
        self.horizontal = false;
        self.ascender = half;
        self.descender = -half;
        self.baselines = self.baselines.rebased(central);
        self.underline_offset -= central;
        self.strikeout_offset -= central;
        self.caret_slope = (0.0, 1.0);
        self
    }

    /// Position of `baseline`, see [`BaselineTable::get`].
    pub fn baseline(&self, baseline: Baseline) -> f64 {
        self.baselines.get(baseline)
    }

    /// Ascender plus descender magnitude.
    pub fn height(&self) -> f64 {
        self.ascender - self.descender
    }
}

/// Baselines derived from ascender, descender and x-height when a font has
/// no BASE table.
pub fn synthesize_baselines(ascender: f64, descender: f64, x_height: f64) -> BaselineTable {
    BaselineTable {
        alphabetic: 0.0,
        ideographic: descender,
        ideographic_top: ascender,
        ideographic_center: (ascender + descender) / 2.0,
        central: (ascender + descender) / 2.0,
        hanging: 0.8 * ascender,
        mathematical: x_height / 2.0,
        middle: x_height / 2.0,
        text_top: ascender,
        text_bottom: descender,
    }
}

/// Picks fonts for text and reports their metrics.
pub trait FontResolver {
    /// Split `text` into font runs. Run lengths sum to `text.len()`.
    fn resolve(&self, query: &FontQuery, text: &[char]) -> Vec<FontRun>;

    fn metrics(
        &self,
        font: FontId,
        size: f64,
        horizontal: bool,
        script: Script,
        rendering: TextRendering,
    ) -> FontMetrics;
}

/// One run of a shaping request.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRun {
    /// Character range in the request text.
    pub start: usize,
    pub end: usize,
    pub font: Option<FontId>,
    pub size: f64,
    pub language: Option<String>,
    /// OpenType feature settings such as `"liga=0"` or `"smcp"`.
    pub features: Vec<String>,
    pub axes: Vec<FontAxis>,
    pub letter_spacing: f64,
    pub word_spacing: f64,
}

#[derive(Debug, Clone)]
pub struct ShapeRequest<'a> {
    pub text: &'a [char],
    /// Per character, whether it sits in a right-to-left bidi run.
    pub rtl: &'a [bool],
    pub horizontal: bool,
    pub runs: Vec<ShapeRun>,
    /// Per character, whether a shaping run must start there.
    pub run_breaks: Vec<bool>,
}

impl ShapeRequest<'_> {
    /// Split points: run edges, direction changes and forced run breaks.
    pub fn segments(&self) -> Vec<(usize, usize, usize)> {
        let mut segments = Vec::new();
        for (run_index, run) in self.runs.iter().enumerate() {
            let mut start = run.start;
            for i in run.start + 1..run.end {
                if self.run_breaks[i] || self.rtl[i] != self.rtl[i - 1] {
                    segments.push((run_index, start, i));
                    start = i;
                }
            }
            if start < run.end {
                segments.push((run_index, start, run.end));
            }
        }
        segments
    }
}

/// A glyph record, in logical order. Advances and offsets are user units,
/// y-down.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    /// Zero is the missing glyph.
    pub glyph_id: u16,
    /// First character of the cluster, as an index into the request text.
    pub cluster: usize,
    pub font: Option<FontId>,
    pub advance: Vec2,
    pub offset: Vec2,
}

/// Turns text into glyph records.
///
/// Glyphs come back in logical order: clusters ascend, and the glyphs of a
/// right-to-left segment are returned reversed from the shaper's visual
/// order.
pub trait Shaper {
    fn shape(&self, request: &ShapeRequest<'_>) -> Vec<ShapedGlyph>;
}

/// Add letter and word spacing along the inline axis to the last glyph of
/// each cluster.
pub fn apply_spacing(glyphs: &mut [ShapedGlyph], request: &ShapeRequest<'_>) {
    for i in 0..glyphs.len() {
        let last_of_cluster = glyphs
            .get(i + 1)
            .map_or(true, |next| next.cluster != glyphs[i].cluster);
        if !last_of_cluster {
            continue;
        }
        let cluster = glyphs[i].cluster;
        let Some(run) = request
            .runs
            .iter()
            .find(|r| (r.start..r.end).contains(&cluster))
        else {
            continue;
        };
        let mut extra = run.letter_spacing;
        if is_word_separator(request.text[cluster]) {
            extra += run.word_spacing;
        }
        if extra == 0.0 {
            continue;
        }
        if request.horizontal {
            glyphs[i].advance.x += extra;
        } else {
            glyphs[i].advance.y += extra;
        }
    }
}

/// What a font can do natively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FontCapabilities {
    pub scalable: bool,
    pub color: bool,
    pub native_bold: bool,
    pub native_italic: bool,
    pub variable: bool,
}

/// Glyph loading options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadFlags {
    pub no_hinting: bool,
    pub no_antialias: bool,
    pub no_bitmap: bool,
    pub color: bool,
    pub vertical_layout: bool,
}

impl LoadFlags {
    pub fn derive(rendering: TextRendering, horizontal: bool, caps: FontCapabilities) -> Self {
        Self {
            no_hinting: matches!(
                rendering,
                TextRendering::OptimizeSpeed | TextRendering::GeometricPrecision
            ),
            no_antialias: rendering == TextRendering::OptimizeSpeed,
            no_bitmap: caps.scalable && !caps.color,
            color: caps.color,
            vertical_layout: !horizontal,
        }
    }
}

/// A raster image of a glyph, RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Extra transform applied when drawing (synthetic oblique).
    pub transform: Affine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorLayer {
    pub path: BezPath,
    pub color: Color,
    /// Paint with the text fill instead of `color`.
    pub use_foreground: bool,
}

/// Drawable glyph payload, positioned relative to the glyph origin in user
/// units, y-down.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Glyph {
    #[default]
    None,
    Outline {
        path: BezPath,
    },
    Bitmap {
        images: Vec<GlyphImage>,
        draw_rects: Vec<Rect>,
    },
    ColorLayers {
        layers: Vec<ColorLayer>,
    },
}

impl Glyph {
    pub fn is_none(&self) -> bool {
        match self {
            Glyph::None => true,
            Glyph::Outline { path } => path.elements().is_empty(),
            Glyph::Bitmap { images, .. } => images.is_empty(),
            Glyph::ColorLayers { layers } => layers.is_empty(),
        }
    }

    /// Ink bounds, or a zero rect when empty.
    pub fn bounds(&self) -> Rect {
        use kurbo::Shape;
        let rects: Vec<Rect> = match self {
            Glyph::None => vec![],
            Glyph::Outline { path } => vec![path.bounding_box()],
            Glyph::Bitmap { images, draw_rects } => draw_rects
                .iter()
                .zip(images)
                .map(|(r, img)| img.transform.transform_rect_bbox(*r))
                .collect(),
            Glyph::ColorLayers { layers } => layers.iter().map(|l| l.path.bounding_box()).collect(),
        };
        rects
            .into_iter()
            .filter(|r| !path_rect_is_degenerate(r))
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    /// Apply an affine transform to every part of the glyph.
    pub fn transform(&mut self, affine: Affine) {
        match self {
            Glyph::None => {}
            Glyph::Outline { path } => path.apply_affine(affine),
            Glyph::Bitmap { images, .. } => {
                for img in images {
                    img.transform = affine * img.transform;
                }
            }
            Glyph::ColorLayers { layers } => {
                for layer in layers {
                    layer.path.apply_affine(affine);
                }
            }
        }
    }

    /// Replace every vector path with `f(path)`. Bitmaps are left alone.
    pub fn map_paths(&mut self, mut f: impl FnMut(&BezPath) -> BezPath) {
        match self {
            Glyph::Outline { path } => *path = f(path),
            Glyph::ColorLayers { layers } => {
                for layer in layers {
                    layer.path = f(&layer.path);
                }
            }
            Glyph::None | Glyph::Bitmap { .. } => {}
        }
    }
}

fn path_rect_is_degenerate(r: &Rect) -> bool {
    !r.x0.is_finite() || (r.width() == 0.0 && r.height() == 0.0)
}

/// Produces drawable glyphs.
pub trait GlyphRasterizer {
    fn capabilities(&self, font: FontId) -> FontCapabilities;

    fn load_glyph(
        &self,
        font: FontId,
        glyph_id: u16,
        size: f64,
        flags: LoadFlags,
    ) -> Result<Glyph, LayoutError>;

    /// Fallback for glyph formats `load_glyph` can't return directly.
    fn render_bitmap(
        &self,
        _font: FontId,
        glyph_id: u16,
        _size: f64,
        _flags: LoadFlags,
    ) -> Result<Glyph, LayoutError> {
        Err(LayoutError::Glyph {
            glyph_id,
            message: "bitmap rendering not supported".into(),
        })
    }

    /// Caret positions inside a ligature glyph, along the inline axis.
    fn ligature_carets(&self, _font: FontId, _glyph_id: u16, _size: f64) -> Vec<f64> {
        Vec::new()
    }
}

/// Everything layout needs from fonts.
pub trait FontBackend: FontResolver + Shaper + GlyphRasterizer {}

impl<T: FontResolver + Shaper + GlyphRasterizer> FontBackend for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_lookup_and_scale() {
        let table = synthesize_baselines(8.0, -2.0, 5.0);
        assert_eq!(table.get(Baseline::Alphabetic), 0.0);
        assert_eq!(table.get(Baseline::Central), 3.0);
        assert_eq!(table.get(Baseline::IdeographicTop), 8.0);
        assert_eq!(table.scaled(2.0).get(Baseline::Ideographic), -4.0);
        assert_eq!(table.get(Baseline::Auto), 0.0);
    }

    #[test]
    fn test_vertical_metrics_center_on_central() {
        let m = FontMetrics::approximate(10.0, false);
        assert!(!m.horizontal);
        assert!((m.ascender - 5.0).abs() < 1e-9);
        assert!((m.descender + 5.0).abs() < 1e-9);
        assert!(m.baselines.central.abs() < 1e-9);
    }

    #[test]
    fn test_load_flags() {
        let caps = FontCapabilities {
            scalable: true,
            ..Default::default()
        };
        let speed = LoadFlags::derive(TextRendering::OptimizeSpeed, true, caps);
        assert!(speed.no_hinting && speed.no_antialias && speed.no_bitmap);
        let precise = LoadFlags::derive(TextRendering::GeometricPrecision, false, caps);
        assert!(precise.no_hinting && !precise.no_antialias && precise.vertical_layout);
        let bitmap_font = LoadFlags::derive(TextRendering::Auto, true, FontCapabilities::default());
        assert!(!bitmap_font.no_bitmap);
    }

    #[test]
    fn test_segments_split_on_breaks_and_direction() {
        let text: Vec<char> = "abcdef".chars().collect();
        let rtl = [false, false, true, true, false, false];
        let mut run_breaks = vec![false; 6];
        run_breaks[5] = true;
        let req = ShapeRequest {
            text: &text,
            rtl: &rtl,
            horizontal: true,
            runs: vec![ShapeRun {
                start: 0,
                end: 6,
                font: None,
                size: 10.0,
                language: None,
                features: vec![],
                axes: vec![],
                letter_spacing: 0.0,
                word_spacing: 0.0,
            }],
            run_breaks,
        };
        assert_eq!(req.segments(), vec![(0, 0, 2), (0, 2, 4), (0, 4, 5), (0, 5, 6)]);
    }

    #[test]
    fn test_glyph_bounds_and_transform() {
        let mut glyph = Glyph::Outline {
            path: kurbo::Shape::to_path(&Rect::new(0.0, -8.0, 10.0, 2.0), 0.1),
        };
        assert_eq!(glyph.bounds(), Rect::new(0.0, -8.0, 10.0, 2.0));
        glyph.transform(Affine::translate((5.0, 0.0)));
        assert_eq!(glyph.bounds().x0, 5.0);
        assert!(Glyph::None.is_none());
        assert_eq!(Glyph::None.bounds(), Rect::ZERO);
    }
}
