//! Explicit per-character positioning (`x`, `y`, `dx`, `dy`, `rotate`).
//!
//! Each node's local lists are consumed in order over the addressable
//! characters of its subtree. Nested nodes override their ancestors field by
//! field, and characters past the end of every list keep the rotation of the
//! character before them.

use crate::geometry::{Point, Vec2};
use crate::model::TextTree;
use std::ops::Range;

/// Resolved explicit positioning for one character.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CharTransformation {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub dx: Option<f64>,
    pub dy: Option<f64>,
    /// Degrees.
    pub rotate: Option<f64>,
}

impl CharTransformation {
    /// Zip SVG attribute lists into per-character entries.
    pub fn from_lists(x: &[f64], y: &[f64], dx: &[f64], dy: &[f64], rotate: &[f64]) -> Vec<Self> {
        let len = [x.len(), y.len(), dx.len(), dy.len(), rotate.len()]
            .into_iter()
            .max()
            .unwrap_or(0);
        (0..len)
            .map(|i| CharTransformation {
                x: x.get(i).copied(),
                y: y.get(i).copied(),
                dx: dx.get(i).copied(),
                dy: dy.get(i).copied(),
                rotate: rotate.get(i).copied(),
            })
            .collect()
    }

    /// Explicit absolute positions start a new anchored chunk.
    pub fn starts_new_chunk(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    pub fn has_relative_offset(&self) -> bool {
        self.dx.is_some() || self.dy.is_some()
    }

    pub fn is_null(&self) -> bool {
        *self == CharTransformation::default()
    }

    /// Fill every unset field from the parent's value.
    pub fn merge_in_parent(&mut self, parent: &CharTransformation) {
        self.x = self.x.or(parent.x);
        self.y = self.y.or(parent.y);
        self.dx = self.dx.or(parent.dx);
        self.dy = self.dy.or(parent.dy);
        self.rotate = self.rotate.or(parent.rotate);
    }

    pub fn relative_offset(&self) -> Vec2 {
        Vec2::new(self.dx.unwrap_or(0.0), self.dy.unwrap_or(0.0))
    }

    /// The absolute position with unset axes taken from `current`.
    pub fn absolute_pos(&self, current: Point) -> Point {
        Point::new(self.x.unwrap_or(current.x), self.y.unwrap_or(current.y))
    }
}

/// Bidi embedding, override and isolate controls.
pub fn is_bidi_control(c: char) -> bool {
    matches!(c, '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}')
}

/// Characters that take part in positioning. Collapsed white space, soft
/// hyphens and (when not wrapping) bidi controls are skipped.
pub fn addressable_mask(text: &[char], collapsed: &[bool], wrapped: bool) -> Vec<bool> {
    text.iter()
        .zip(collapsed)
        .map(|(c, collapsed)| !(*collapsed || (is_bidi_control(*c) && !wrapped) || *c == '\u{AD}'))
        .collect()
}

/// Resolve the transform of every character.
///
/// `ranges` holds each node's character range, indexed by node id. The first
/// character is pinned to the origin unless it carries its own position.
pub fn resolve_transforms(
    tree: &TextTree,
    ranges: &[Range<usize>],
    addressable: &[bool],
    horizontal: bool,
) -> Vec<CharTransformation> {
    let len = addressable.len();
    let mut resolved = vec![CharTransformation::default(); len];
    if len == 0 {
        return resolved;
    }
    resolved[0].x = Some(0.0);
    resolved[0].y = Some(0.0);

    // Pre-order: ancestors write first, descendants override.
    for id in tree.descendants(tree.root()) {
        let node = tree.node(id);
        if node.text_path.is_some() {
            continue;
        }
        let local = &node.transforms;
        let mut i = 0;
        for k in ranges[id.index()].clone() {
            if !addressable[k] {
                continue;
            }
            if i < local.len() {
                let mut t = local[i];
                t.merge_in_parent(&resolved[k]);
                resolved[k] = t;
                i += 1;
            } else if k > 0 && resolved[k - 1].rotate.is_some() {
                resolved[k].rotate = resolved[k - 1].rotate;
            }
        }
    }

    // Text on a path ignores the block axis position, and the first
    // character starts the path at its inline origin.
    for id in tree.descendants(tree.root()) {
        if tree.node(id).text_path.is_none() {
            continue;
        }
        let mut first = true;
        for k in ranges[id.index()].clone() {
            if !addressable[k] {
                continue;
            }
            if first {
                if horizontal {
                    resolved[k].x = Some(0.0);
                } else {
                    resolved[k].y = Some(0.0);
                }
                first = false;
            }
            if horizontal {
                resolved[k].y = None;
            } else {
                resolved[k].x = None;
            }
        }
    }

    resolved
}
