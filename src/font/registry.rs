//! # Font Registry
//!
//! A [`FontBackend`](super::FontBackend) over real OpenType data. Fonts are
//! parsed with ttf-parser, shaped with rustybuzz, and embedded PNG strikes
//! are decoded with `image`.
//!
//! Matching is by family name (case-insensitive), then weight distance, then
//! slant. Characters a matched font can't cover fall back across every
//! registered font, and the last registered font is the fallback of last
//! resort.

use super::{
    apply_spacing, synthesize_baselines, FontCapabilities, FontId, FontMetrics, FontQuery,
    FontResolver, FontRun, Glyph, GlyphImage, GlyphRasterizer, LoadFlags, ShapeRequest,
    ShapedGlyph, Shaper,
};
use crate::error::LayoutError;
use crate::geometry::{Affine, BezPath, Point, Rect, Vec2};
use crate::model::FontSource;
use crate::style::{FontStyle, TextRendering};
use std::str::FromStr;
use ttf_parser::{GlyphId, OutlineBuilder, Tag};
use unicode_script::Script;

struct LoadedFont {
    family: String,
    weight: u16,
    italic: bool,
    data: Vec<u8>,
}

#[derive(Default)]
pub struct FontRegistry {
    fonts: Vec<LoadedFont>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every font of a document.
    pub fn from_sources(sources: &[FontSource]) -> Result<Self, LayoutError> {
        let mut registry = Self::new();
        for source in sources {
            registry.register_source(source)?;
        }
        Ok(registry)
    }

    /// Register a font from raw bytes.
    pub fn register(
        &mut self,
        family: &str,
        weight: u16,
        italic: bool,
        data: Vec<u8>,
    ) -> Result<FontId, LayoutError> {
        ttf_parser::Face::parse(&data, 0)
            .map_err(|e| LayoutError::Font(format!("Failed to parse font '{}': {}", family, e)))?;
        self.fonts.push(LoadedFont {
            family: family.to_string(),
            weight,
            italic,
            data,
        });
        log::debug!("registered font '{}' weight {} italic {}", family, weight, italic);
        Ok(FontId(self.fonts.len() - 1))
    }

    pub fn register_source(&mut self, source: &FontSource) -> Result<FontId, LayoutError> {
        let data = read_source_bytes(&source.src)?;
        self.register(&source.family, source.weight, source.italic, data)
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    fn face(&self, id: FontId) -> Option<ttf_parser::Face<'_>> {
        let font = self.fonts.get(id.0)?;
        ttf_parser::Face::parse(&font.data, 0).ok()
    }

    fn best_match(&self, family: &str, weight: u16, italic: bool) -> Option<FontId> {
        self.fonts
            .iter()
            .enumerate()
            .filter(|(_, f)| f.family.eq_ignore_ascii_case(family))
            .min_by_key(|(_, f)| {
                let slant_penalty = if f.italic == italic { 0 } else { 1000 };
                (f.weight as i32 - weight as i32).abs() + slant_penalty
            })
            .map(|(i, _)| FontId(i))
    }
}

/// Resolve a font source string to raw bytes.
///
/// Supported `src` formats:
/// - `data:font/...;base64,...` (or any other data URI media type)
/// - File path starting with `/`, `./` or `../`
/// - Raw base64-encoded font data
fn read_source_bytes(src: &str) -> Result<Vec<u8>, LayoutError> {
    if src.starts_with("data:") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| LayoutError::Font("Invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Base64 strings can contain '/', so only explicit path prefixes count.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src)
            .map_err(|e| LayoutError::Font(format!("Failed to read font file '{}': {}", src, e)));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>, LayoutError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| LayoutError::Font(format!("Base64 decode error: {}", e)))
}

fn shares_previous_font(c: char) -> bool {
    c.is_whitespace() || c.is_control() || matches!(c, '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}')
}

impl FontResolver for FontRegistry {
    fn resolve(&self, query: &FontQuery, text: &[char]) -> Vec<FontRun> {
        if text.is_empty() {
            return vec![];
        }
        let italic = query.style != FontStyle::Normal;
        let families = if query.disable_matching {
            &query.families[..query.families.len().min(1)]
        } else {
            &query.families[..]
        };
        let mut candidates: Vec<FontId> = Vec::new();
        for family in families {
            if let Some(id) = self.best_match(family, query.weight, italic) {
                if !candidates.contains(&id) {
                    candidates.push(id);
                }
            }
        }
        if candidates.is_empty() {
            match self.fonts.len().checked_sub(1) {
                Some(last) => candidates.push(FontId(last)),
                None => {
                    log::warn!("no fonts registered, text laid out with fallback metrics");
                    return vec![FontRun {
                        font: None,
                        length: text.len(),
                    }];
                }
            }
        }

        let faces: Vec<Option<ttf_parser::Face<'_>>> =
            (0..self.fonts.len()).map(|i| self.face(FontId(i))).collect();
        let covers = |id: FontId, c: char| {
            faces[id.0]
                .as_ref()
                .is_some_and(|f| f.glyph_index(c).is_some())
        };

        let mut runs: Vec<FontRun> = Vec::new();
        let mut previous: Option<FontId> = None;
        for &c in text {
            let font = match previous {
                Some(prev) if shares_previous_font(c) => prev,
                _ if query.disable_matching => candidates[0],
                _ => candidates
                    .iter()
                    .copied()
                    .find(|id| covers(*id, c))
                    .or_else(|| (0..self.fonts.len()).map(FontId).find(|id| covers(*id, c)))
                    .unwrap_or(candidates[0]),
            };
            previous = Some(font);
            match runs.last_mut() {
                Some(run) if run.font == Some(font) => run.length += 1,
                _ => runs.push(FontRun {
                    font: Some(font),
                    length: 1,
                }),
            }
        }
        runs
    }

    fn metrics(
        &self,
        font: FontId,
        size: f64,
        horizontal: bool,
        _script: Script,
        _rendering: TextRendering,
    ) -> FontMetrics {
        let Some(face) = self.face(font) else {
            return FontMetrics::approximate(size, horizontal);
        };
        let scale = size / face.units_per_em() as f64;
        let ascender = face.ascender() as f64 * scale;
        let descender = face.descender() as f64 * scale;
        let x_height = face
            .x_height()
            .map(|h| h as f64 * scale)
            .unwrap_or(0.5 * size);
        let (underline_offset, underline_thickness) = face
            .underline_metrics()
            .map(|m| {
                let thickness = m.thickness as f64 * scale;
                (m.position as f64 * scale - thickness / 2.0, thickness)
            })
            .unwrap_or((-0.1 * size, 0.05 * size));
        let (strikeout_offset, strikeout_thickness) = face
            .strikeout_metrics()
            .map(|m| {
                let thickness = m.thickness as f64 * scale;
                (m.position as f64 * scale - thickness / 2.0, thickness)
            })
            .unwrap_or((x_height / 2.0, 0.05 * size));
        let superscript_offset = face
            .superscript_metrics()
            .map(|m| Vec2::new(m.x_offset as f64 * scale, m.y_offset as f64 * scale))
            .unwrap_or(Vec2::new(0.0, 0.34 * size));
        // OS/2 subscript offsets are positive downward.
        let subscript_offset = face
            .subscript_metrics()
            .map(|m| Vec2::new(m.x_offset as f64 * scale, -(m.y_offset as f64) * scale))
            .unwrap_or(Vec2::new(0.0, -0.14 * size));
        let angle = (face.italic_angle() as f64).to_radians();

        let metrics = FontMetrics {
            font_size: size,
            horizontal: true,
            ascender,
            descender,
            line_gap: face.line_gap() as f64 * scale,
            x_height,
            cap_height: face
                .capital_height()
                .map(|h| h as f64 * scale)
                .unwrap_or(0.7 * size),
            baselines: synthesize_baselines(ascender, descender, x_height),
            underline_offset,
            underline_thickness,
            strikeout_offset,
            strikeout_thickness,
            superscript_offset,
            subscript_offset,
            caret_slope: (1.0, -angle.tan()),
            caret_offset: 0.0,
        };
        if horizontal {
            metrics
        } else {
            metrics.into_vertical()
        }
    }
}

/// Parse feature strings such as `"smcp"`, `"-liga"` or `"liga=0"`.
fn parse_features(strings: &[String]) -> Vec<rustybuzz::Feature> {
    strings
        .iter()
        .filter_map(|s| {
            if let Ok(feature) = rustybuzz::Feature::from_str(s) {
                return Some(feature);
            }
            let (tag_str, value) = match s.strip_prefix('-') {
                Some(rest) => (rest, 0),
                None => (s.as_str(), 1),
            };
            let bytes: [u8; 4] = match tag_str.as_bytes().try_into() {
                Ok(b) => b,
                Err(_) => {
                    log::warn!("ignoring invalid font feature {:?}", s);
                    return None;
                }
            };
            Some(rustybuzz::Feature::new(Tag::from_bytes(&bytes), value, ..))
        })
        .collect()
}

impl Shaper for FontRegistry {
    fn shape(&self, request: &ShapeRequest<'_>) -> Vec<ShapedGlyph> {
        let mut glyphs = Vec::with_capacity(request.text.len());
        for (run_index, start, end) in request.segments() {
            let run = &request.runs[run_index];
            let face = run
                .font
                .and_then(|f| self.fonts.get(f.0))
                .and_then(|f| rustybuzz::Face::from_slice(&f.data, 0));
            let Some(mut face) = face else {
                emit_unshaped(request, run.font, run.size, start, end, &mut glyphs);
                continue;
            };
            if !run.axes.is_empty() {
                let variations: Vec<rustybuzz::Variation> = run
                    .axes
                    .iter()
                    .filter_map(|axis| {
                        let bytes: [u8; 4] = axis.tag.as_bytes().try_into().ok()?;
                        Some(rustybuzz::Variation {
                            tag: Tag::from_bytes(&bytes),
                            value: axis.value as f32,
                        })
                    })
                    .collect();
                face.set_variations(&variations);
            }

            let segment: String = request.text[start..end].iter().collect();
            // Cluster values are byte offsets into `segment`.
            let mut byte_to_char = vec![0usize; segment.len() + 1];
            for (char_idx, (byte_idx, _)) in segment.char_indices().enumerate() {
                byte_to_char[byte_idx] = char_idx;
            }

            let mut buffer = rustybuzz::UnicodeBuffer::new();
            buffer.push_str(&segment);
            buffer.set_direction(match (request.horizontal, request.rtl[start]) {
                (false, _) => rustybuzz::Direction::TopToBottom,
                (true, true) => rustybuzz::Direction::RightToLeft,
                (true, false) => rustybuzz::Direction::LeftToRight,
            });
            if let Some(lang) = run
                .language
                .as_deref()
                .and_then(|l| rustybuzz::Language::from_str(l).ok())
            {
                buffer.set_language(lang);
            }

            let output = rustybuzz::shape(&face, &parse_features(&run.features), buffer);
            let scale = run.size / face.units_per_em() as f64;
            let mut segment_glyphs: Vec<ShapedGlyph> = output
                .glyph_infos()
                .iter()
                .zip(output.glyph_positions())
                .map(|(info, pos)| ShapedGlyph {
                    glyph_id: info.glyph_id as u16,
                    cluster: start + byte_to_char[info.cluster as usize],
                    font: run.font,
                    advance: Vec2::new(pos.x_advance as f64 * scale, -(pos.y_advance as f64) * scale),
                    offset: Vec2::new(pos.x_offset as f64 * scale, -(pos.y_offset as f64) * scale),
                })
                .collect();
            // Right-to-left output is in visual order.
            if request.horizontal && request.rtl[start] {
                segment_glyphs.reverse();
            }
            glyphs.extend(segment_glyphs);
        }
        apply_spacing(&mut glyphs, request);
        glyphs
    }
}

/// One missing glyph per character with an approximate advance.
fn emit_unshaped(
    request: &ShapeRequest<'_>,
    font: Option<FontId>,
    size: f64,
    start: usize,
    end: usize,
    out: &mut Vec<ShapedGlyph>,
) {
    for i in start..end {
        let advance = if request.horizontal {
            Vec2::new(size / 2.0, 0.0)
        } else {
            Vec2::new(0.0, size)
        };
        out.push(ShapedGlyph {
            glyph_id: 0,
            cluster: i,
            font,
            advance,
            offset: Vec2::ZERO,
        });
    }
}

/// Collects a ttf-parser outline into a kurbo path.
struct PathBuilder {
    path: BezPath,
    transform: Affine,
}

impl PathBuilder {
    fn pt(&self, x: f32, y: f32) -> Point {
        self.transform * Point::new(x as f64, y as f64)
    }
}

impl OutlineBuilder for PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.pt(x, y);
        self.path.move_to(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.pt(x, y);
        self.path.line_to(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (p1, p) = (self.pt(x1, y1), self.pt(x, y));
        self.path.quad_to(p1, p);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (p1, p2, p) = (self.pt(x1, y1), self.pt(x2, y2), self.pt(x, y));
        self.path.curve_to(p1, p2, p);
    }

    fn close(&mut self) {
        self.path.close_path();
    }
}

impl GlyphRasterizer for FontRegistry {
    fn capabilities(&self, font: FontId) -> FontCapabilities {
        let Some(face) = self.face(font) else {
            return FontCapabilities::default();
        };
        let raw = face.raw_face();
        let has = |tag: &[u8; 4]| raw.table(Tag::from_bytes(tag)).is_some();
        FontCapabilities {
            scalable: has(b"glyf") || has(b"CFF ") || has(b"CFF2"),
            color: has(b"COLR") || has(b"CBDT") || has(b"sbix"),
            native_bold: face.is_bold(),
            native_italic: face.is_italic() || face.is_oblique(),
            variable: face.is_variable(),
        }
    }

    fn load_glyph(
        &self,
        font: FontId,
        glyph_id: u16,
        size: f64,
        flags: LoadFlags,
    ) -> Result<Glyph, LayoutError> {
        let face = self.face(font).ok_or_else(|| LayoutError::Glyph {
            glyph_id,
            message: "font data unavailable".into(),
        })?;
        let gid = GlyphId(glyph_id);
        let scale = size / face.units_per_em() as f64;

        if !flags.no_bitmap {
            if let Some(raster) = face.glyph_raster_image(gid, size.ceil() as u16) {
                if raster.format != ttf_parser::RasterImageFormat::PNG {
                    return Err(LayoutError::Glyph {
                        glyph_id,
                        message: "unsupported raster format".into(),
                    });
                }
                return decode_strike(glyph_id, &raster, size);
            }
        }

        let mut builder = PathBuilder {
            path: BezPath::new(),
            transform: Affine::scale_non_uniform(scale, -scale),
        };
        match face.outline_glyph(gid, &mut builder) {
            Some(_) => Ok(Glyph::Outline { path: builder.path }),
            None => Ok(Glyph::None),
        }
    }

    fn render_bitmap(
        &self,
        font: FontId,
        glyph_id: u16,
        size: f64,
        flags: LoadFlags,
    ) -> Result<Glyph, LayoutError> {
        // Outlines stand in for strikes in formats that can't be decoded.
        self.load_glyph(
            font,
            glyph_id,
            size,
            LoadFlags {
                no_bitmap: true,
                ..flags
            },
        )
    }
}

fn decode_strike(
    glyph_id: u16,
    raster: &ttf_parser::RasterGlyphImage<'_>,
    size: f64,
) -> Result<Glyph, LayoutError> {
    let img = image::load_from_memory_with_format(raster.data, image::ImageFormat::Png)
        .map_err(|e| LayoutError::Glyph {
            glyph_id,
            message: format!("Failed to decode PNG strike: {}", e),
        })?;
    let rgba = img.to_rgba8();
    let scale = size / raster.pixels_per_em.max(1) as f64;
    let x = raster.x as f64 * scale;
    let y = raster.y as f64 * scale;
    let rect = Rect::new(
        x,
        -(y + raster.height as f64 * scale),
        x + raster.width as f64 * scale,
        -y,
    );
    Ok(Glyph::Bitmap {
        images: vec![GlyphImage {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
            transform: Affine::IDENTITY,
        }],
        draw_rects: vec![rect],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rejects_garbage() {
        let mut registry = FontRegistry::new();
        let err = registry.register("Bad", 400, false, vec![0, 1, 2, 3]);
        assert!(matches!(err, Err(LayoutError::Font(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_source_decoding_errors() {
        let source = FontSource {
            family: "X".into(),
            src: "data:font/ttf;base64".into(),
            weight: 400,
            italic: false,
        };
        assert!(matches!(
            FontRegistry::from_sources(&[source]),
            Err(LayoutError::Font(_))
        ));
        assert!(read_source_bytes("!!!not base64!!!").is_err());
        assert_eq!(read_source_bytes("AAEC").ok(), Some(vec![0, 1, 2]));
    }

    #[test]
    fn test_empty_registry_resolves_to_no_font() {
        let registry = FontRegistry::new();
        let query = FontQuery {
            families: vec!["Inter".into()],
            size: 12.0,
            size_adjust: None,
            weight: 400,
            width: 100.0,
            style: FontStyle::Normal,
            axes: vec![],
            language: None,
            resolution: 72.0,
            disable_matching: false,
        };
        let runs = registry.resolve(&query, &['a', 'b']);
        assert_eq!(runs, vec![FontRun { font: None, length: 2 }]);
    }

    #[test]
    fn test_parse_features() {
        let features = parse_features(&["smcp".into(), "-liga".into(), "!toolong".into()]);
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn test_unshaped_fallback_advances() {
        let registry = FontRegistry::new();
        let text = ['a', 'b'];
        let rtl = [false, false];
        let request = ShapeRequest {
            text: &text,
            rtl: &rtl,
            horizontal: true,
            runs: vec![super::super::ShapeRun {
                start: 0,
                end: 2,
                font: None,
                size: 10.0,
                language: None,
                features: vec![],
                axes: vec![],
                letter_spacing: 0.0,
                word_spacing: 0.0,
            }],
            run_breaks: vec![false; 2],
        };
        let glyphs = registry.shape(&request);
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[1].advance.x, 5.0);
        assert_eq!(glyphs[0].glyph_id, 0);
    }
}
