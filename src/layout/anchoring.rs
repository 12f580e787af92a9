//! SVG 1.1 positioning for text without `inline-size` or shapes.
//!
//! Runs after line breaking, in this order: relative `dx`/`dy` shifts and
//! rotation, `textLength`, absolute `x`/`y`, then `text-anchor` per
//! anchored chunk.

use std::collections::BTreeMap;
use std::ops::Range;

use super::CharacterResult;
use crate::geometry::Vec2;
use crate::model::{NodeId, TextTree};
use crate::style::{Direction, LengthAdjust, TextAnchor};
use crate::text::transforms::CharTransformation;

fn inline_of(p: Vec2, horizontal: bool) -> f64 {
    if horizontal {
        p.x
    } else {
        p.y
    }
}

/// Accumulate `dx`/`dy` and apply `rotate`. An absolute position starts a
/// new anchored chunk; inside a ligature the chunk starts at the next
/// cluster instead.
pub(super) fn apply_relative_offsets(
    result: &mut [CharacterResult],
    resolved: &[CharTransformation],
) {
    let mut shift = Vec2::ZERO;
    let mut anchor_next = false;
    for (cr, transform) in result.iter_mut().zip(resolved) {
        if !cr.addressable {
            continue;
        }
        if transform.has_relative_offset() {
            shift += transform.relative_offset();
        }
        if let Some(rotate) = transform.rotate {
            cr.rotate = rotate.to_radians();
        }
        cr.final_position = cr.css_position + shift;
        if anchor_next {
            cr.anchored_chunk = true;
            anchor_next = false;
        }
        if transform.starts_new_chunk() {
            if cr.middle {
                anchor_next = true;
            } else {
                cr.anchored_chunk = true;
            }
        }
    }
}

/// Stretch or squeeze every node with `textLength` to its target length,
/// innermost nodes first.
pub(super) fn apply_text_length(
    tree: &TextTree,
    ranges: &[Range<usize>],
    result: &mut [CharacterResult],
    horizontal: bool,
) {
    text_length_node(tree, tree.root(), ranges, result, horizontal);
}

/// Returns whether the node itself carried a text length.
fn text_length_node(
    tree: &TextTree,
    id: NodeId,
    ranges: &[Range<usize>],
    result: &mut [CharacterResult],
    horizontal: bool,
) -> bool {
    let resolved_children = tree
        .children(id)
        .collect::<Vec<_>>()
        .into_iter()
        .filter(|child| text_length_node(tree, *child, ranges, result, horizontal))
        .count();

    let style = &tree.node(id).style;
    let Some(target) = style.text_length else {
        return false;
    };
    let range = ranges[id.index()].clone();

    let mut visual_to_logical: BTreeMap<usize, usize> = BTreeMap::new();
    let mut extent: Option<(f64, f64)> = None;
    let mut n = 0i64;
    for k in range.clone() {
        let cr = &result[k];
        if !cr.addressable {
            continue;
        }
        if let Some(v) = cr.visual_index {
            visual_to_logical.insert(v, k);
        }
        let pos = inline_of(cr.final_position.to_vec2(), horizontal);
        let adv = inline_of(cr.advance, horizontal);
        let (lo, hi) = (pos.min(pos + adv), pos.max(pos + adv));
        extent = Some(match extent {
            Some((a, b)) => (a.min(lo), b.max(hi)),
            None => (lo, hi),
        });
        if !cr.text_length_applied {
            n += 1;
        }
    }
    let Some(last_visual) = visual_to_logical.keys().next_back().copied() else {
        return true;
    };
    let (a, b) = extent.unwrap_or((0.0, 0.0));

    n += resolved_children as i64;
    let spacing_and_glyphs = style.length_adjust == LengthAdjust::SpacingAndGlyphs;
    if !spacing_and_glyphs {
        n -= 1;
    }
    let delta = target - (b - a);
    let per = if n > 0 { delta / n as f64 } else { 0.0 };
    let d = if horizontal {
        Vec2::new(per, 0.0)
    } else {
        Vec2::new(0.0, per)
    };
    log::debug!(
        "textLength {target} on node {}: natural {}, {} gaps",
        id.index(),
        b - a,
        n
    );

    let mut shift = Vec2::ZERO;
    let mut previous_applied = false;
    for (&visual, &k) in &visual_to_logical {
        let cr = &mut result[k];
        cr.final_position += shift;
        if spacing_and_glyphs {
            let factor = |d: f64, adv: f64| if d != 0.0 && adv != 0.0 { d / adv + 1.0 } else { 1.0 };
            cr.scale(factor(d.x, cr.advance.x), factor(d.y, cr.advance.y));
        }
        let last = !spacing_and_glyphs && visual == last_visual;
        if !(cr.text_length_applied && previous_applied) && !last {
            shift += d;
        }
        previous_applied = cr.text_length_applied;
        cr.text_length_applied = true;
    }

    // Following characters of the same anchored chunk move along, and so
    // do preceding ones that sit visually after this node.
    let mut after: BTreeMap<usize, usize> = BTreeMap::new();
    for k in range.end..result.len() {
        if result[k].anchored_chunk {
            break;
        }
        if let Some(v) = result[k].visual_index {
            after.insert(v, k);
        }
    }
    for k in (0..=range.start.min(result.len().saturating_sub(1))).rev() {
        if let Some(v) = result[k].visual_index {
            after.insert(v, k);
        }
        if result[k].anchored_chunk {
            break;
        }
    }
    for (_, k) in after.range(last_visual + 1..) {
        result[*k].final_position += shift;
    }
    true
}

/// Replace positions with explicit `x`/`y`, keeping any `dx`/`dy` on the
/// same character. Later characters move along.
pub(super) fn apply_absolute_positions(
    result: &mut [CharacterResult],
    resolved: &[CharTransformation],
) {
    let mut shift = Vec2::ZERO;
    for i in 0..result.len() {
        if !result[i].addressable {
            continue;
        }
        let transform = resolved.get(i).copied().unwrap_or_default();
        let fin = result[i].final_position;
        if let Some(x) = transform.x {
            shift.x = x + (transform.dx.unwrap_or(0.0) - fin.x);
        }
        if let Some(y) = transform.y {
            shift.y = y + (transform.dy.unwrap_or(0.0) - fin.y);
        }
        result[i].final_position += shift;
        if result[i].middle && i > 0 {
            result[i].final_position = result[i - 1].final_position;
        }
    }
}

/// Align every anchored chunk on its start position per `text-anchor`.
pub(super) fn apply_anchoring(result: &mut [CharacterResult], horizontal: bool) {
    let mut start = 0;
    while start < result.len() {
        let mut extent: Option<(f64, f64)> = None;
        let mut i = start;
        while i < result.len() {
            let cr = &result[i];
            if !cr.addressable {
                i += 1;
                continue;
            }
            if cr.anchored_chunk && i > start {
                break;
            }
            let pos = inline_of(cr.final_position.to_vec2(), horizontal);
            let adv = inline_of(cr.advance, horizontal);
            let (lo, hi) = (pos.min(pos + adv), pos.max(pos + adv));
            extent = Some(match extent {
                Some((a, b)) if !cr.anchored_chunk => (a.min(lo), b.max(hi)),
                _ => (lo, hi),
            });
            i += 1;
        }

        let first = &result[start];
        let rtl = first.direction == Direction::Rtl;
        let origin = inline_of(first.final_position.to_vec2(), horizontal);
        let (a, b) = extent.unwrap_or((origin, origin));
        let shift = origin
            - match (first.anchor, rtl) {
                (TextAnchor::Start, false) | (TextAnchor::End, true) => a,
                (TextAnchor::End, false) | (TextAnchor::Start, true) => b,
                (TextAnchor::Middle, _) => (a + b) * 0.5,
            };
        let shift = if horizontal {
            Vec2::new(shift, 0.0)
        } else {
            Vec2::new(0.0, shift)
        };
        for cr in &mut result[start..i] {
            cr.final_position += shift;
            cr.text_path_and_anchoring_offset += shift;
        }
        start = i.max(start + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::*;
    use crate::model::TextContent;
    use crate::style::Style;

    fn positioned(text: &str, style: Style) -> TextContent {
        TextContent::text(text, style)
    }

    #[test]
    fn test_dx_accumulates() {
        let content = TextContent {
            dx: vec![0.0, 5.0, 5.0],
            ..positioned("abc", sized(10.0))
        };
        let layout = run(&doc(content));
        let xs: Vec<f64> = layout.chars.iter().map(|c| c.final_position.x).collect();
        assert_eq!(xs, vec![0.0, 15.0, 30.0]);
    }

    #[test]
    fn test_rotate_is_radians() {
        let content = TextContent {
            rotate: vec![90.0],
            ..positioned("ab", sized(10.0))
        };
        let layout = run(&doc(content));
        assert!((layout.chars[0].rotate - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        // The last rotation carries over.
        assert!((layout.chars[1].rotate - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_text_length_spacing() {
        let style = Style {
            text_length: Some(36.0),
            ..sized(10.0)
        };
        let layout = run(&doc(positioned("abc", style)));
        let xs: Vec<f64> = layout.chars.iter().map(|c| c.final_position.x).collect();
        assert!((xs[1] - 13.0).abs() < 1e-9, "{xs:?}");
        assert!((xs[2] - 26.0).abs() < 1e-9);
        let end = xs[2] + layout.chars[2].advance.x;
        assert!((end - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_length_spacing_and_glyphs() {
        let style = Style {
            text_length: Some(60.0),
            length_adjust: Some(LengthAdjust::SpacingAndGlyphs),
            ..sized(10.0)
        };
        let layout = run(&doc(positioned("abc", style)));
        for (i, c) in layout.chars.iter().enumerate() {
            assert!((c.advance.x - 20.0).abs() < 1e-9);
            assert!((c.final_position.x - 20.0 * i as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_absolute_x_starts_new_chunk() {
        let content = TextContent {
            x: vec![0.0, 100.0],
            ..positioned("abc", sized(10.0))
        };
        let layout = run(&doc(content));
        assert!(layout.chars[1].anchored_chunk);
        assert_eq!(layout.chars[1].final_position.x, 100.0);
        assert_eq!(layout.chars[2].final_position.x, 110.0);
    }

    #[test]
    fn test_anchor_end_and_middle() {
        let end = Style {
            text_anchor: Some(TextAnchor::End),
            ..sized(10.0)
        };
        let layout = run(&doc(positioned("abcd", end)));
        assert_eq!(layout.chars[0].final_position.x, -40.0);

        let middle = Style {
            text_anchor: Some(TextAnchor::Middle),
            ..sized(10.0)
        };
        let layout = run(&doc(positioned("abcd", middle)));
        assert_eq!(layout.chars[0].final_position.x, -20.0);
    }
}
