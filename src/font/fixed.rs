//! Deterministic monospace backend.
//!
//! Every character advances one em. Outlines are em boxes, spaces are empty
//! and format controls (tabs, bidi controls, joiners) get an empty glyph with
//! no advance. Two extra faces cover emoji so the color and bitmap glyph paths
//! get exercised without real font files:
//!
//! | Font | Characters | Glyph |
//! |---|---|---|
//! | 0 | everything else | outline |
//! | 1 | U+1F300..U+1F5FF | color layers |
//! | 2 | U+1F600..U+1F64F | bitmap (via the render fallback) |
//!
//! Private use characters map to the missing glyph.

use super::{
    apply_spacing, ColorLayer, FontCapabilities, FontId, FontMetrics, FontQuery,
    FontResolver, FontRun, Glyph, GlyphImage, GlyphRasterizer, LoadFlags, ShapeRequest,
    ShapedGlyph, Shaper,
};
use crate::error::LayoutError;
use crate::geometry::{Affine, Rect, Vec2};
use crate::style::{Color, TextRendering};
use kurbo::Shape;
use unicode_script::Script;

const OUTLINE_FONT: FontId = FontId(0);
const COLOR_FONT: FontId = FontId(1);
const BITMAP_FONT: FontId = FontId(2);

/// Glyph id of the "fi" ligature.
pub const FI_LIGATURE: u16 = 0xFB01;

#[derive(Debug, Clone, Default)]
pub struct FixedMetrics {
    /// Form an "fi" ligature in horizontal text.
    pub ligatures: bool,
}

impl FixedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ligatures(mut self) -> Self {
        self.ligatures = true;
        self
    }
}

fn font_for(c: char) -> FontId {
    match c {
        '\u{1F300}'..='\u{1F5FF}' => COLOR_FONT,
        '\u{1F600}'..='\u{1F64F}' => BITMAP_FONT,
        _ => OUTLINE_FONT,
    }
}

fn has_no_glyph(c: char) -> bool {
    matches!(
        c,
        '\t' | '\u{AD}' | '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\u{A0}' | '\u{3000}')
}

fn glyph_id_for(c: char) -> u16 {
    match c {
        '\u{E000}'..='\u{F8FF}' => 0,
        _ => (u32::from(c) & 0xFFFF).max(1) as u16,
    }
}

impl FontResolver for FixedMetrics {
    fn resolve(&self, query: &FontQuery, text: &[char]) -> Vec<FontRun> {
        let mut runs: Vec<FontRun> = Vec::new();
        for &c in text {
            let font = if query.disable_matching {
                OUTLINE_FONT
            } else {
                font_for(c)
            };
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
        _font: FontId,
        size: f64,
        horizontal: bool,
        _script: Script,
        _rendering: TextRendering,
    ) -> FontMetrics {
        FontMetrics::approximate(size, horizontal)
    }
}

impl Shaper for FixedMetrics {
    fn shape(&self, request: &ShapeRequest<'_>) -> Vec<ShapedGlyph> {
        let mut glyphs = Vec::with_capacity(request.text.len());
        for (run_index, start, end) in request.segments() {
            let run = &request.runs[run_index];
            let em = run.size;
            let advance = if request.horizontal {
                Vec2::new(em, 0.0)
            } else {
                Vec2::new(0.0, em)
            };
            let offset = if request.horizontal {
                Vec2::ZERO
            } else {
                Vec2::new(-em / 2.0, 0.8 * em)
            };
            let mut i = start;
            while i < end {
                let c = request.text[i];
                if has_no_glyph(c) {
                    glyphs.push(ShapedGlyph {
                        glyph_id: glyph_id_for(c),
                        cluster: i,
                        font: run.font,
                        advance: Vec2::ZERO,
                        offset: Vec2::ZERO,
                    });
                    i += 1;
                    continue;
                }
                let cluster = if is_combining_mark(c) && i > start { i - 1 } else { i };
                let ligature = self.ligatures
                    && request.horizontal
                    && c == 'f'
                    && i + 1 < end
                    && request.text[i + 1] == 'i';
                glyphs.push(ShapedGlyph {
                    glyph_id: if ligature { FI_LIGATURE } else { glyph_id_for(c) },
                    cluster,
                    font: run.font,
                    advance: if is_combining_mark(c) { Vec2::ZERO } else { advance },
                    offset,
                });
                i += if ligature { 2 } else { 1 };
            }
        }
        apply_spacing(&mut glyphs, request);
        glyphs
    }
}

fn em_box(size: f64) -> Rect {
    Rect::new(0.0, -0.8 * size, size, 0.2 * size)
}

impl GlyphRasterizer for FixedMetrics {
    fn capabilities(&self, font: FontId) -> FontCapabilities {
        FontCapabilities {
            scalable: font != BITMAP_FONT,
            color: font != OUTLINE_FONT,
            ..Default::default()
        }
    }

    fn load_glyph(
        &self,
        font: FontId,
        glyph_id: u16,
        size: f64,
        _flags: LoadFlags,
    ) -> Result<Glyph, LayoutError> {
        let empty = char::from_u32(u32::from(glyph_id)).is_some_and(|c| is_space(c) || has_no_glyph(c));
        if glyph_id == 0 || empty {
            return Ok(Glyph::None);
        }
        match font {
            COLOR_FONT => {
                let outer = em_box(size);
                let inner = outer.inset(-0.2 * size);
                Ok(Glyph::ColorLayers {
                    layers: vec![
                        ColorLayer {
                            path: outer.to_path(0.1),
                            color: Color::rgb(1.0, 0.8, 0.0),
                            use_foreground: false,
                        },
                        ColorLayer {
                            path: inner.to_path(0.1),
                            color: Color::BLACK,
                            use_foreground: true,
                        },
                    ],
                })
            }
            BITMAP_FONT => Err(LayoutError::Glyph {
                glyph_id,
                message: "unsupported raster format".into(),
            }),
            _ => Ok(Glyph::Outline {
                path: em_box(size).to_path(0.1),
            }),
        }
    }

    fn render_bitmap(
        &self,
        _font: FontId,
        _glyph_id: u16,
        size: f64,
        _flags: LoadFlags,
    ) -> Result<Glyph, LayoutError> {
        Ok(Glyph::Bitmap {
            images: vec![GlyphImage {
                width: 4,
                height: 4,
                pixels: vec![255; 4 * 4 * 4],
                transform: Affine::IDENTITY,
            }],
            draw_rects: vec![em_box(size)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::ShapeRun;

    fn request<'a>(text: &'a [char], rtl: &'a [bool], horizontal: bool) -> ShapeRequest<'a> {
        ShapeRequest {
            text,
            rtl,
            horizontal,
            runs: vec![ShapeRun {
                start: 0,
                end: text.len(),
                font: Some(OUTLINE_FONT),
                size: 10.0,
                language: None,
                features: vec![],
                axes: vec![],
                letter_spacing: 0.0,
                word_spacing: 0.0,
            }],
            run_breaks: vec![false; text.len()],
        }
    }

    #[test]
    fn test_every_char_advances_one_em() {
        let text: Vec<char> = "ab c".chars().collect();
        let rtl = vec![false; 4];
        let glyphs = FixedMetrics::new().shape(&request(&text, &rtl, true));
        assert_eq!(glyphs.len(), 4);
        assert!(glyphs.iter().all(|g| g.advance == Vec2::new(10.0, 0.0)));
        assert_eq!(glyphs[2].cluster, 2);
    }

    #[test]
    fn test_tab_has_zero_advance() {
        let text: Vec<char> = "a\tb".chars().collect();
        let rtl = vec![false; 3];
        let fm = FixedMetrics::new();
        let glyphs = fm.shape(&request(&text, &rtl, true));
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[1].advance, Vec2::ZERO);
        assert_eq!(glyphs[2].cluster, 2);
        let tab = fm.load_glyph(OUTLINE_FONT, glyphs[1].glyph_id, 10.0, LoadFlags::default());
        assert_eq!(tab.ok(), Some(Glyph::None));
    }

    #[test]
    fn test_ligature_and_spacing() {
        let text: Vec<char> = "fi x".chars().collect();
        let rtl = vec![false; 4];
        let mut req = request(&text, &rtl, true);
        req.runs[0].letter_spacing = 1.0;
        req.runs[0].word_spacing = 2.0;
        let glyphs = FixedMetrics::new().with_ligatures().shape(&req);
        assert_eq!(glyphs[0].glyph_id, FI_LIGATURE);
        assert_eq!(glyphs[0].advance.x, 11.0);
        assert_eq!(glyphs[1].cluster, 2);
        assert_eq!(glyphs[1].advance.x, 13.0);
    }

    #[test]
    fn test_vertical_offsets_center_glyph() {
        let text: Vec<char> = "a".chars().collect();
        let rtl = vec![false];
        let glyphs = FixedMetrics::new().shape(&request(&text, &rtl, false));
        assert_eq!(glyphs[0].advance, Vec2::new(0.0, 10.0));
        assert_eq!(glyphs[0].offset, Vec2::new(-5.0, 8.0));
    }

    #[test]
    fn test_resolve_splits_emoji_runs() {
        let fm = FixedMetrics::new();
        let query = FontQuery {
            families: vec![],
            size: 10.0,
            size_adjust: None,
            weight: 400,
            width: 100.0,
            style: Default::default(),
            axes: vec![],
            language: None,
            resolution: 72.0,
            disable_matching: false,
        };
        let text: Vec<char> = "a\u{1F600}b".chars().collect();
        let runs = fm.resolve(&query, &text);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].font, Some(BITMAP_FONT));
        assert_eq!(runs.iter().map(|r| r.length).sum::<usize>(), 3);
    }

    #[test]
    fn test_glyph_kinds() {
        let fm = FixedMetrics::new();
        let flags = LoadFlags::default();
        assert!(fm.load_glyph(OUTLINE_FONT, 'a' as u16, 10.0, flags).is_ok());
        assert_eq!(fm.load_glyph(OUTLINE_FONT, ' ' as u16, 10.0, flags).ok(), Some(Glyph::None));
        assert!(fm.load_glyph(BITMAP_FONT, 0xF600, 10.0, flags).is_err());
        assert!(matches!(
            fm.render_bitmap(BITMAP_FONT, 0xF600, 10.0, flags),
            Ok(Glyph::Bitmap { .. })
        ));
        assert!(matches!(
            fm.load_glyph(COLOR_FONT, 0xF300, 10.0, flags),
            Ok(Glyph::ColorLayers { .. })
        ));
    }
}
