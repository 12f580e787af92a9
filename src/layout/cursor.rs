//! Cursor positions.
//!
//! One position per grapheme end of every visible cluster, plus a synthetic
//! position before each anchored chunk and one for the trailing dummy
//! after a final line break.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{CharacterResult, LineBox};
use crate::geometry::{Line, Point, Rect, Vec2};
use crate::model::NodeId;
use crate::text::breaks::BreakType;
use crate::text::collect::CollectedText;

/// A place the text cursor can stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CursorPos {
    /// Character holding the caret.
    pub cluster: usize,
    /// Plain-text index the position stands for.
    pub index: usize,
    /// Index into the cluster's caret offsets.
    pub offset: usize,
    /// Start of an anchored chunk rather than the end of a grapheme.
    pub synthetic: bool,
    pub line: Option<usize>,
}

impl CursorPos {
    /// Caret origin in user space.
    pub fn position(&self, result: &[CharacterResult]) -> Option<Point> {
        let cr = result.get(self.cluster)?;
        let offset = cr
            .cursor_info
            .offsets
            .get(self.offset)
            .copied()
            .unwrap_or(Vec2::ZERO);
        Some(cr.final_transform() * (Point::ZERO + offset))
    }

    /// Caret line in user space.
    pub fn caret(&self, result: &[CharacterResult]) -> Option<Line> {
        let cr = result.get(self.cluster)?;
        let offset = cr
            .cursor_info
            .offsets
            .get(self.offset)
            .copied()
            .unwrap_or(Vec2::ZERO);
        let tf = cr.final_transform();
        let caret = cr.cursor_info.caret;
        Some(Line::new(tf * (caret.p0 + offset), tf * (caret.p1 + offset)))
    }

    pub fn rtl(&self, result: &[CharacterResult]) -> bool {
        result.get(self.cluster).is_some_and(|c| c.cursor_info.rtl)
    }
}

pub(super) struct CursorTable {
    pub positions: Vec<CursorPos>,
    pub logical_to_visual: BTreeMap<usize, usize>,
    /// Mapped layout box of every visible character, per leaf.
    pub char_rects: Vec<(NodeId, Rect)>,
}

/// Collect cursor positions and the per-leaf character boxes.
pub(super) fn build_cursor_table(
    collected: &CollectedText,
    result: &mut [CharacterResult],
    dummy: Option<usize>,
    lines: &[LineBox],
    ltr: bool,
) -> CursorTable {
    let mut line_of: Vec<Option<usize>> = vec![None; result.len()];
    for (n, line) in lines.iter().enumerate() {
        for i in line.indices() {
            if let Some(slot) = line_of.get_mut(i) {
                *slot = Some(n);
            }
        }
    }

    let mut positions: Vec<CursorPos> = Vec::new();
    let mut char_rects: Vec<(NodeId, Rect)> = Vec::new();
    for chunk in &collected.chunks {
        for i in chunk.range() {
            let cr = &mut result[i];
            if !cr.addressable || cr.middle {
                continue;
            }
            if let Some(plain) = cr.plain_index {
                let line = line_of[i];
                let mut offsets: Vec<Vec2> = Vec::new();
                let synthetic = cr.anchored_chunk;
                if synthetic {
                    let start = if cr.cursor_info.rtl {
                        cr.advance
                    } else {
                        Vec2::ZERO
                    };
                    cr.cursor_info.offsets.insert(0, start);
                    offsets.push(start);
                    positions.push(CursorPos {
                        cluster: i,
                        index: plain,
                        offset: 0,
                        synthetic: true,
                        line,
                    });
                }
                let graphemes = cr.cursor_info.grapheme_indices.len();
                for (k, &index) in cr.cursor_info.grapheme_indices.iter().enumerate() {
                    if cr.break_type == BreakType::HardBreak && k + 1 == graphemes {
                        continue;
                    }
                    positions.push(CursorPos {
                        cluster: i,
                        index,
                        offset: if synthetic { k + 1 } else { k },
                        synthetic: false,
                        line,
                    });
                    let step = cr.advance * ((k + 1) as f64 / graphemes as f64);
                    offsets.push(if cr.cursor_info.rtl {
                        cr.advance - step
                    } else {
                        step
                    });
                }
                if synthetic {
                    cr.cursor_info.grapheme_indices.insert(0, plain);
                }
                if cr.cursor_info.offsets.len() < offsets.len() {
                    cr.cursor_info.offsets = offsets;
                }
            }
            if !cr.hidden {
                let tf = cr.final_transform();
                char_rects.push((chunk.leaf, tf.transform_rect_bbox(cr.bounding_box)));
            }
        }
    }

    if let Some(d) = dummy.filter(|&d| d < result.len()) {
        let cr = &mut result[d];
        if cr.anchored_chunk {
            let index = cr.plain_index.unwrap_or_default();
            cr.plain_index = index.checked_sub(1);
            cr.cursor_info.offsets.insert(0, Vec2::ZERO);
            positions.push(CursorPos {
                cluster: d,
                index,
                offset: 0,
                synthetic: true,
                line: line_of[d],
            });
            if let Some(last) = collected.chunks.last() {
                let tf = cr.final_transform();
                char_rects.push((last.leaf, tf.transform_rect_bbox(cr.bounding_box)));
            }
        }
    }

    let logical_to_visual = logical_to_visual(&positions, result, lines, ltr);
    log::debug!("cursor: {} positions", positions.len());
    CursorTable {
        positions,
        logical_to_visual,
        char_rects,
    }
}

/// Order cursor positions by the visual order of their clusters, line by
/// line and chunk by chunk.
fn logical_to_visual(
    positions: &[CursorPos],
    result: &[CharacterResult],
    lines: &[LineBox],
    ltr: bool,
) -> BTreeMap<usize, usize> {
    let mut by_cluster: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (k, pos) in positions.iter().enumerate() {
        by_cluster.entry(pos.cluster).or_default().push(k);
    }

    let mut map = BTreeMap::new();
    for chunk in lines.iter().flat_map(|l| &l.chunks) {
        let mut clusters: Vec<usize> = chunk.chunk_indices.clone();
        clusters.sort_by_key(|&j| (result[j].visual_index, j));

        let mut visual: Vec<usize> = Vec::new();
        for j in clusters {
            let Some(relevant) = by_cluster.get(&j) else {
                continue;
            };
            let mut relevant = relevant.clone();
            relevant.sort_by_key(|&k| positions[k].offset);
            if result[j].cursor_info.rtl {
                relevant.reverse();
            }
            visual.extend(relevant);
        }
        if !ltr {
            visual.reverse();
        }
        for k in visual {
            let next = map.len();
            map.insert(k, next);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use crate::layout::test_support::*;
    use crate::model::TextContent;
    use crate::style::{SpaceCollapse, Style};

    #[test]
    fn test_one_position_per_grapheme_plus_start() {
        let layout = run(&doc(TextContent::text("abc", sized(10.0))));
        // Synthetic start, then one after each character.
        assert_eq!(layout.cursor_positions.len(), 4);
        assert!(layout.cursor_positions[0].synthetic);
        let indices: Vec<usize> = layout.cursor_positions.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_positions_walk_along_the_line() {
        let layout = run(&doc(TextContent::text("ab", sized(10.0))));
        let xs: Vec<f64> = layout
            .cursor_positions
            .iter()
            .filter_map(|p| p.position(&layout.chars))
            .map(|p| p.x)
            .collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn test_visual_order_is_total() {
        let layout = run(&doc(TextContent::text("ab cd", sized(10.0))));
        assert_eq!(
            layout.logical_to_visual_cursor.len(),
            layout.cursor_positions.len()
        );
        for (logical, visual) in &layout.logical_to_visual_cursor {
            assert_eq!(logical, visual);
        }
    }

    #[test]
    fn test_trailing_break_gets_a_position() {
        let style = Style {
            white_space: Some(SpaceCollapse::PreserveBreaks),
            ..sized(10.0)
        };
        let layout = run(&doc(TextContent::text("a\n", style)));
        let last = layout.cursor_positions.last().unwrap();
        assert!(last.synthetic);
        assert_eq!(last.index, 2);
        assert_eq!(last.line, Some(1));
    }

    #[test]
    fn test_visible_chars_get_rects() {
        let layout = run(&doc(TextContent::text("ab", sized(10.0))));
        assert_eq!(layout.nodes[0].char_rects.len(), 2);
    }
}
