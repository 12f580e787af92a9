//! Shaping adapter.
//!
//! Shapes the whole buffer in one request, one run per leaf font run, then
//! loads a drawable glyph for every cluster and fills in the per-character
//! metrics the later passes read: layout box, ascent and descent, caret,
//! half-leading and visual order.
//!
//! Synthetic styles are applied here: an oblique shear when the font has no
//! italic, and emboldening when the weight asks for bold the font lacks.

use image::{Rgba, RgbaImage};
use kurbo::Shape;
use unicode_bidi::Level;
use unicode_script::{Script, UnicodeScript};

use super::CharacterResult;
use crate::font::{
    FontBackend, FontCapabilities, FontId, FontMetrics, FontQuery, Glyph, GlyphImage, LoadFlags,
    ShapeRequest, ShapeRun, ShapedGlyph,
};
use crate::geometry::path::reverse_path;
use crate::geometry::polygon::{flatten_to_polygons, offset_contour, signed_area};
use crate::geometry::{is_null_rect, unite_rect, Affine, BezPath, Line, Rect, Vec2};
use crate::model::{LayoutConfig, TextTree};
use crate::style::{Baseline, FontStyle, ResolvedStyle, TabSize, TextRendering};
use crate::text::bidi::visual_order;
use crate::text::breaks::BreakType;
use crate::text::collect::CollectedText;
use crate::text::transforms::CharTransformation;

/// Shear of a synthetic oblique outline.
const OBLIQUE_SLANT: f64 = 0.249_328_002_843_180_69;
/// Bitmaps shear by a rounder factor.
const OBLIQUE_SLANT_BITMAP: f64 = 0.25;

/// Everything the adapter reads.
pub(super) struct ShapeContext<'a> {
    pub fonts: &'a dyn FontBackend,
    pub tree: &'a TextTree,
    pub collected: &'a CollectedText,
    /// Buffer with forced breaks replaced by spaces.
    pub text: &'a [char],
    pub levels: &'a [Level],
    pub resolved: &'a [CharTransformation],
    pub graphemes: &'a [bool],
    pub config: &'a LayoutConfig,
    pub horizontal: bool,
}

/// A font run of one leaf with its resolved metrics.
struct RunInfo {
    metrics: FontMetrics,
    half_leading: f64,
    caps: FontCapabilities,
}

/// Shape the buffer and load glyphs into `result`.
///
/// When the text ends in a forced break, a zero-width character is appended
/// so the empty last line has a position. Its index is returned.
pub(super) fn shape_and_load(
    ctx: &ShapeContext<'_>,
    result: &mut Vec<CharacterResult>,
) -> Option<usize> {
    let len = ctx.text.len();
    let mut runs: Vec<ShapeRun> = Vec::new();
    let mut infos: Vec<RunInfo> = Vec::new();
    let mut run_of = vec![0usize; len];

    for chunk in &ctx.collected.chunks {
        let range = chunk.range();
        if range.is_empty() {
            continue;
        }
        let style = &ctx.tree.node(chunk.leaf).style;
        let query = FontQuery::from_style(style, ctx.config);
        let mut font_runs = ctx.fonts.resolve(&query, &ctx.text[range.clone()]);
        if font_runs.iter().map(|r| r.length).sum::<usize>() != range.len() {
            log::warn!("font runs don't cover leaf text, using fallback metrics");
            font_runs = vec![crate::font::FontRun {
                font: None,
                length: range.len(),
            }];
        }
        let mut start = range.start;
        for fr in font_runs {
            let end = start + fr.length;
            let info = run_info(ctx, style, fr.font, start, end);
            for r in &mut run_of[start..end] {
                *r = runs.len();
            }
            runs.push(ShapeRun {
                start,
                end,
                font: fr.font,
                size: style.font_size,
                language: style.lang.clone(),
                features: style.font_feature_settings.clone(),
                axes: style.font_variation_settings.clone(),
                letter_spacing: style.letter_spacing,
                word_spacing: style.word_spacing,
            });
            infos.push(info);
            start = end;
        }
    }

    let rtl: Vec<bool> = ctx.levels.iter().map(|l| l.is_rtl()).collect();
    let request = ShapeRequest {
        text: ctx.text,
        rtl: &rtl,
        horizontal: ctx.horizontal,
        run_breaks: ctx.resolved.iter().map(|t| t.starts_new_chunk()).collect(),
        runs,
    };
    let glyphs = ctx.fonts.shape(&request);
    log::debug!("shaped {} chars into {} glyphs", len, glyphs.len());

    let mut visual_of = vec![0usize; len];
    for (visual, logical) in visual_order(ctx.levels).into_iter().enumerate() {
        visual_of[logical] = visual;
    }

    // Per-character metrics and tab stops.
    for i in 0..len {
        let info = &infos[run_of[i]];
        let style = &ctx.tree.node(ctx.collected.leaf_of(i)).style;
        let cr = &mut result[i];
        cr.metrics = info.metrics;
        cr.font_size = style.font_size;
        cr.scaled_half_leading = info.half_leading;
        cr.cursor_info.rtl = rtl[i];
        if ctx.text[i] == '\t' {
            cr.tab_size = Some(tab_size(ctx, &request.runs[run_of[i]], style));
        }
    }

    // Glyph records, grouped by cluster.
    let mut total = Vec2::ZERO;
    let mut g = 0;
    while g < glyphs.len() {
        let cluster = glyphs[g].cluster;
        let mut end = g + 1;
        while end < glyphs.len() && glyphs[end].cluster == cluster {
            end += 1;
        }
        let next_cluster = glyphs.get(end).map_or(len, |n| n.cluster.max(cluster + 1));
        if cluster < len && result[cluster].addressable {
            let info = &infos[run_of[cluster]];
            let style = &ctx.tree.node(ctx.collected.leaf_of(cluster)).style;
            for (k, glyph) in glyphs[g..end].iter().enumerate() {
                load_into(ctx, style, info, glyph, k == 0, &mut result[cluster]);
            }
            let cr = &mut result[cluster];
            if next_cluster - cluster > 1 {
                if let Some(font) = glyphs[g].font {
                    cr.cursor_info.offsets = ctx
                        .fonts
                        .ligature_carets(font, glyphs[g].glyph_id, style.font_size)
                        .into_iter()
                        .map(|c| inline_vec(ctx.horizontal, c))
                        .collect();
                }
            }
            total += cr.advance;
            cr.css_position = (total - cr.advance).to_point();
            cr.visual_index = Some(visual_of[cluster]);
        }
        g = end;
    }

    mark_middles(ctx, result);
    let dummy = add_dummy(result, ctx.horizontal);
    log::debug!(
        "loaded glyphs, {} clusters",
        result.iter().filter(|c| c.visual_index.is_some()).count()
    );
    dummy
}

fn run_info(
    ctx: &ShapeContext<'_>,
    style: &ResolvedStyle,
    font: Option<FontId>,
    start: usize,
    end: usize,
) -> RunInfo {
    let size = style.font_size;
    let script = ctx.text[start..end]
        .iter()
        .map(|c| c.script())
        .find(|s| !matches!(s, Script::Common | Script::Inherited | Script::Unknown))
        .unwrap_or(Script::Latin);
    let (metrics, caps) = match font {
        Some(f) => (
            ctx.fonts
                .metrics(f, size, ctx.horizontal, script, rendering(style, ctx.config)),
            ctx.fonts.capabilities(f),
        ),
        None => (
            FontMetrics::approximate(size, ctx.horizontal),
            FontCapabilities::default(),
        ),
    };
    let half_leading = match style.line_height_px() {
        Some(lh) => (lh - metrics.height()) / 2.0,
        None => metrics.line_gap / 2.0,
    };
    RunInfo {
        metrics,
        half_leading,
        caps,
    }
}

fn rendering(style: &ResolvedStyle, config: &LayoutConfig) -> TextRendering {
    if style.text_rendering == TextRendering::Auto {
        config.text_rendering
    } else {
        style.text_rendering
    }
}

fn inline_vec(horizontal: bool, v: f64) -> Vec2 {
    if horizontal {
        Vec2::new(v, 0.0)
    } else {
        Vec2::new(0.0, v)
    }
}

/// Tab stop distance: a multiple of the space advance plus spacing, or a
/// fixed length.
fn tab_size(ctx: &ShapeContext<'_>, run: &ShapeRun, style: &ResolvedStyle) -> f64 {
    match style.tab_size {
        TabSize::Length(l) => l,
        TabSize::Spaces(n) => {
            let space = [' '];
            let request = ShapeRequest {
                text: &space,
                rtl: &[false],
                horizontal: ctx.horizontal,
                runs: vec![ShapeRun {
                    start: 0,
                    end: 1,
                    letter_spacing: 0.0,
                    word_spacing: 0.0,
                    ..run.clone()
                }],
                run_breaks: vec![false],
            };
            let advance: f64 = ctx
                .fonts
                .shape(&request)
                .iter()
                .map(|g| if ctx.horizontal { g.advance.x } else { g.advance.y })
                .sum();
            n * (advance + style.letter_spacing + style.word_spacing)
        }
    }
}

/// Load one glyph record into its cluster's character. The first record
/// sets up the metrics; later ones are appended after the running advance.
fn load_into(
    ctx: &ShapeContext<'_>,
    style: &ResolvedStyle,
    info: &RunInfo,
    shaped: &ShapedGlyph,
    first: bool,
    cr: &mut CharacterResult,
) {
    let horizontal = ctx.horizontal;
    let metrics = &info.metrics;
    let size = style.font_size;
    let mut advance = shaped.advance;

    let mut glyph = match (shaped.font, shaped.glyph_id) {
        _ if cr.tab_size.is_some() => Glyph::Outline {
            path: BezPath::new(),
        },
        (Some(font), id) if id != 0 => {
            let flags = LoadFlags::derive(rendering(style, ctx.config), horizontal, info.caps);
            let loaded = ctx.fonts.load_glyph(font, id, size, flags).or_else(|err| {
                log::debug!("glyph {id}: {err}, trying the bitmap fallback");
                ctx.fonts.render_bitmap(font, id, size, flags)
            });
            match loaded {
                Ok(glyph) => glyph,
                Err(err) => {
                    log::warn!("glyph {id} failed to load ({err}), drawing a placeholder box");
                    tofu(metrics, horizontal, &mut advance)
                }
            }
        }
        _ => {
            log::warn!(
                "no glyph for U+{:04X}, drawing a placeholder box",
                u32::from(ctx.text[shaped.cluster])
            );
            tofu(metrics, horizontal, &mut advance)
        }
    };

    let bold = style.font_weight >= 600 && !info.caps.native_bold && !info.caps.variable;
    if bold {
        embolden(&mut glyph, &mut advance, size, horizontal, ctx.config);
    }

    glyph.transform(Affine::translate(shaped.offset));
    let oblique = style.font_style != FontStyle::Normal && !info.caps.native_italic;
    let shear = if oblique {
        let s = if matches!(glyph, Glyph::Bitmap { .. }) {
            OBLIQUE_SLANT_BITMAP
        } else {
            OBLIQUE_SLANT
        };
        if horizontal {
            Affine::new([1.0, 0.0, -s, 1.0, 0.0, 0.0])
        } else {
            Affine::new([1.0, s, 0.0, 1.0, 0.0, 0.0])
        }
    } else {
        Affine::IDENTITY
    };
    glyph.transform(shear);

    let dominant = match style.dominant_baseline {
        Baseline::Auto | Baseline::NoChange | Baseline::ResetSize => {
            if horizontal {
                Baseline::Alphabetic
            } else {
                Baseline::Central
            }
        }
        b => b,
    };
    let v = metrics.baseline(dominant);
    let dominant_shift = if horizontal {
        Affine::translate((0.0, v))
    } else {
        Affine::translate((-v, 0.0))
    };
    glyph.transform(dominant_shift);

    if !first {
        glyph.transform(Affine::translate(cr.advance));
        let bounds = glyph.bounds();
        if !is_null_rect(bounds) {
            cr.ink_bounding_box = unite_rect(cr.ink_bounding_box, bounds);
        }
        merge_glyph(&mut cr.glyph, glyph);
        cr.advance += advance;
        extend_layout_box(cr, horizontal);
        return;
    }

    cr.ink_bounding_box = glyph.bounds();
    cr.glyph = glyph;
    cr.advance = advance;

    let (asc, desc) = (metrics.ascender, metrics.descender);
    let layout_box = if horizontal {
        Rect::new(0.0, -asc, advance.x, -desc)
    } else {
        Rect::new(desc, 0.0, asc, advance.y)
    };
    let layout_box = dominant_shift.transform_rect_bbox(shear.transform_rect_bbox(layout_box));
    cr.bounding_box = layout_box;
    if horizontal {
        cr.scaled_ascent = layout_box.y0;
        cr.scaled_descent = layout_box.y1;
    } else {
        cr.scaled_ascent = layout_box.x1;
        cr.scaled_descent = layout_box.x0;
    }

    let caret = caret_line(metrics, horizontal);
    let caret_affine = dominant_shift * shear;
    cr.cursor_info.caret = Line::new(caret_affine * caret.p0, caret_affine * caret.p1);
}

/// Grow the layout box to cover the whole cluster advance.
fn extend_layout_box(cr: &mut CharacterResult, horizontal: bool) {
    if horizontal {
        cr.bounding_box.x1 = cr.bounding_box.x0 + cr.advance.x;
    } else {
        cr.bounding_box.y1 = cr.bounding_box.y0 + cr.advance.y;
    }
}

fn caret_line(metrics: &FontMetrics, horizontal: bool) -> Line {
    let (rise, run) = metrics.caret_slope;
    let slope = if rise == 0.0 || run == 0.0 {
        0.0
    } else if horizontal {
        run / rise
    } else {
        rise / run
    };
    let (asc, desc) = (metrics.ascender, metrics.descender);
    let lh = asc - desc;
    let offset = if metrics.caret_offset != 0.0 {
        metrics.caret_offset
    } else {
        desc * slope
    };
    if horizontal {
        Line::new((offset, -desc), (offset + lh * slope, -asc))
    } else {
        Line::new((desc, -offset), (desc + lh, -(offset + lh * slope)))
    }
}

/// Placeholder box for a missing glyph.
fn tofu(metrics: &FontMetrics, horizontal: bool, advance: &mut Vec2) -> Glyph {
    let h = 0.6 * (metrics.ascender - metrics.descender + metrics.line_gap);
    let w = 0.75 * h;
    let stroke = h / 15.0;
    let outer = Rect::new(0.0, 0.0, w, h);
    let mut path = outer.to_path(0.1);
    let inner = reverse_path(&outer.inset(-stroke).to_path(0.1));
    path.extend(inner.elements().iter().copied());
    let offset = if horizontal {
        advance.x = advance.x.max(w + stroke);
        Vec2::new(0.0, -h)
    } else {
        Vec2::new(-w / 2.0, (advance.y - h) / 2.0)
    };
    path.apply_affine(Affine::translate(offset));
    Glyph::Outline { path }
}

/// Synthetic bold: outlines grow by half the strength on every side,
/// bitmaps are dilated.
fn embolden(
    glyph: &mut Glyph,
    advance: &mut Vec2,
    size: f64,
    horizontal: bool,
    config: &LayoutConfig,
) {
    let strength = size / 48.0;
    match glyph {
        Glyph::Bitmap { images, draw_rects } => {
            let px = ((strength * config.resolution / 72.0).floor() as u32).max(1);
            for (img, rect) in images.iter_mut().zip(draw_rects.iter_mut()) {
                dilate(img, rect, px, px - 1);
            }
        }
        Glyph::None => {}
        _ => glyph.map_paths(|p| embolden_path(p, strength, config.path_tolerance)),
    }
    if horizontal {
        if advance.x != 0.0 {
            advance.x += strength;
        }
    } else {
        advance.y += strength;
    }
}

fn embolden_path(path: &BezPath, strength: f64, tolerance: f64) -> BezPath {
    let polys = flatten_to_polygons(path, tolerance);
    let Some(outer) = polys
        .iter()
        .map(|p| signed_area(p))
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
    else {
        return path.clone();
    };
    let delta = strength / 2.0 * outer.signum();
    let mut out = BezPath::new();
    for poly in polys.iter().map(|p| offset_contour(p, delta)) {
        let mut points = poly.iter();
        let Some(first) = points.next() else {
            continue;
        };
        out.move_to(*first);
        for p in points {
            out.line_to(*p);
        }
        out.close_path();
    }
    out
}

/// Max-composite shifted copies of the image so ink grows right and up.
fn dilate(img: &mut GlyphImage, rect: &mut Rect, sx: u32, sy: u32) {
    let Some(src) = RgbaImage::from_raw(img.width, img.height, std::mem::take(&mut img.pixels))
    else {
        log::warn!("bitmap glyph has inconsistent pixel data, skipping emboldening");
        return;
    };
    let (w, h) = (img.width + sx, img.height + sy);
    let mut dst = RgbaImage::new(w, h);
    for dy in 0..=sy {
        for dx in 0..=sx {
            for (x, y, p) in src.enumerate_pixels() {
                let target = dst.get_pixel_mut(x + dx, y + sy - dy);
                let Rgba(d) = target;
                for c in 0..4 {
                    d[c] = d[c].max(p.0[c]);
                }
            }
        }
    }
    let scale_x = if img.width > 0 { rect.width() / f64::from(img.width) } else { 0.0 };
    let scale_y = if img.height > 0 { rect.height() / f64::from(img.height) } else { 0.0 };
    *rect = Rect::new(
        rect.x0,
        rect.y0 - f64::from(sy) * scale_y,
        rect.x1 + f64::from(sx) * scale_x,
        rect.y1,
    );
    img.width = w;
    img.height = h;
    img.pixels = dst.into_raw();
}

/// Append `other` to `glyph`. Outlines next to color layers become a
/// foreground layer.
fn merge_glyph(glyph: &mut Glyph, other: Glyph) {
    use crate::font::ColorLayer;
    let outline_layer = |path: BezPath| ColorLayer {
        path,
        color: crate::style::Color::BLACK,
        use_foreground: true,
    };
    match (std::mem::take(glyph), other) {
        (Glyph::None, g) | (g, Glyph::None) => *glyph = g,
        (Glyph::Outline { mut path }, Glyph::Outline { path: more }) => {
            path.extend(more.elements().iter().copied());
            *glyph = Glyph::Outline { path };
        }
        (
            Glyph::Bitmap {
                mut images,
                mut draw_rects,
            },
            Glyph::Bitmap {
                images: more_images,
                draw_rects: more_rects,
            },
        ) => {
            images.extend(more_images);
            draw_rects.extend(more_rects);
            *glyph = Glyph::Bitmap { images, draw_rects };
        }
        (Glyph::ColorLayers { mut layers }, Glyph::ColorLayers { layers: more }) => {
            layers.extend(more);
            *glyph = Glyph::ColorLayers { layers };
        }
        (Glyph::ColorLayers { mut layers }, Glyph::Outline { path }) => {
            layers.push(outline_layer(path));
            *glyph = Glyph::ColorLayers { layers };
        }
        (Glyph::Outline { path }, Glyph::ColorLayers { layers }) => {
            let mut merged = vec![outline_layer(path)];
            merged.extend(layers);
            *glyph = Glyph::ColorLayers { layers: merged };
        }
        (first, _) => {
            log::debug!("dropping glyph part of a different kind in a cluster");
            *glyph = first;
        }
    }
}

/// Characters without a cluster of their own follow the first character of
/// their cluster: they inherit its break behaviour and sit at its end.
/// Grapheme ends inside clusters are recorded for the cursor.
fn mark_middles(ctx: &ShapeContext<'_>, result: &mut [CharacterResult]) {
    let plain_len = ctx.collected.plain_text.chars().count();
    let mut first: Option<usize> = None;
    for i in 0..result.len() {
        if !result[i].addressable {
            continue;
        }
        let grapheme_break_before = i > 0 && ctx.graphemes[i - 1];
        if result[i].visual_index.is_some() {
            if let (Some(plain), Some(fc)) = (result[i].plain_index, first) {
                let fc = &mut result[fc];
                fc.cursor_info.grapheme_indices.push(plain);
                if !fc.cursor_info.offsets.is_empty() {
                    let end = fc.advance;
                    fc.cursor_info.offsets.push(end);
                }
            }
            first = Some(i);
            continue;
        }
        result[i].middle = true;
        result[i].hidden = true;
        let Some(fc) = first else {
            continue;
        };
        let (head, tail) = result.split_at_mut(i);
        let (fcr, cr) = (&mut head[fc], &mut tail[0]);
        if ctx.text[fc].is_whitespace() == ctx.text[i].is_whitespace() {
            if fcr.break_type != BreakType::HardBreak {
                fcr.break_type = cr.break_type;
            }
            if fcr.line_start == crate::text::breaks::LineEdgeBehaviour::NoChange {
                fcr.line_start = cr.line_start;
            }
            if fcr.line_end == crate::text::breaks::LineEdgeBehaviour::NoChange {
                fcr.line_end = cr.line_end;
            }
        }
        if grapheme_break_before {
            if let Some(plain) = cr.plain_index {
                fcr.cursor_info.grapheme_indices.push(plain);
            }
        }
        cr.css_position = fcr.css_position + fcr.advance;
    }
    if let Some(fc) = first {
        let fcr = &mut result[fc];
        if fcr.cursor_info.grapheme_indices.last() != Some(&plain_len) {
            fcr.cursor_info.grapheme_indices.push(plain_len);
        }
        if !fcr.cursor_info.offsets.is_empty() {
            let end = fcr.advance;
            fcr.cursor_info.offsets.push(end);
        }
    }
}

/// Append a zero-width character after a final forced break.
fn add_dummy(result: &mut Vec<CharacterResult>, horizontal: bool) -> Option<usize> {
    let hb = result
        .iter()
        .rposition(|c| c.addressable && c.visual_index.is_some())?;
    if result[hb].break_type != BreakType::HardBreak {
        return None;
    }
    let src = &result[hb];
    let mut bbox = src.bounding_box;
    if horizontal {
        bbox.x1 = bbox.x0;
    } else {
        bbox.y1 = bbox.y0;
    }
    let dummy = CharacterResult {
        visual_index: src.visual_index.map(|v| v + 1),
        scaled_ascent: src.scaled_ascent,
        scaled_descent: src.scaled_descent,
        scaled_half_leading: src.scaled_half_leading,
        bounding_box: bbox,
        metrics: src.metrics,
        font_size: src.font_size,
        horizontal,
        direction: src.direction,
        anchor: src.anchor,
        plain_index: src.cursor_info.grapheme_indices.last().copied(),
        cursor_info: super::CursorInfo {
            caret: src.cursor_info.caret,
            rtl: src.cursor_info.rtl,
            color: src.cursor_info.color,
            ..Default::default()
        },
        ..Default::default()
    };
    result.push(dummy);
    Some(result.len() - 1)
}
