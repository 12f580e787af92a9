//! Linearizes the content tree into one character buffer.
//!
//! Every leaf contributes one [`SubChunk`]. Nodes with a non-normal
//! `unicode-bidi` wrap their content in explicit bidi controls: openers go in
//! front of the node's first leaf, closers after its last leaf. The controls
//! don't exist in the plain text and map to `None`.

use crate::model::{NodeId, TextTree};
use crate::style::{Direction, ResolvedStyle, UnicodeBidi};
use std::ops::Range;

const LRE: char = '\u{202A}';
const RLE: char = '\u{202B}';
const PDF: char = '\u{202C}';
const LRO: char = '\u{202D}';
const RLO: char = '\u{202E}';
const LRI: char = '\u{2066}';
const RLI: char = '\u{2067}';
const FSI: char = '\u{2068}';
const PDI: char = '\u{2069}';

/// The text of one leaf after control insertion.
#[derive(Debug, Clone)]
pub struct SubChunk {
    pub leaf: NodeId,
    /// Start of this chunk in [`CollectedText::text`].
    pub start: usize,
    pub text: Vec<char>,
    pub original_text: String,
    /// Per character of `text`, its index in `original_text` (in chars).
    pub new_to_old: Vec<Option<usize>>,
    pub in_text_path: bool,
    /// First leaf of its text path; anchoring restarts here.
    pub first_text_in_path: bool,
}

impl SubChunk {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.text.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectedText {
    pub chunks: Vec<SubChunk>,
    pub text: Vec<char>,
    /// Character range of every node, indexed by node id.
    pub node_ranges: Vec<Range<usize>>,
    /// Subchunk owning each character.
    pub chunk_of: Vec<usize>,
    /// Concatenated leaf text without synthetic characters.
    pub plain_text: String,
    /// Per character, its index in `plain_text` (in chars).
    pub plain_index: Vec<Option<usize>>,
}

impl CollectedText {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn leaf_of(&self, index: usize) -> NodeId {
        self.chunks[self.chunk_of[index]].leaf
    }
}

/// Opening and closing controls for a node's `unicode-bidi`.
fn bidi_controls(style: &ResolvedStyle) -> (Vec<char>, Vec<char>) {
    let rtl = style.direction == Direction::Rtl;
    let (embed, isolate, over) = if rtl { (RLE, RLI, RLO) } else { (LRE, LRI, LRO) };
    match style.unicode_bidi {
        UnicodeBidi::Normal => (vec![], vec![]),
        UnicodeBidi::Embed => (vec![embed], vec![PDF]),
        UnicodeBidi::Isolate => (vec![isolate], vec![PDI]),
        UnicodeBidi::BidiOverride => (vec![over], vec![PDF]),
        UnicodeBidi::IsolateOverride => (vec![isolate, over], vec![PDF, PDI]),
        UnicodeBidi::Plaintext => (vec![FSI], vec![PDI]),
    }
}

pub fn collect_text(tree: &TextTree) -> CollectedText {
    let root = tree.root();
    let mut first_leaf: Vec<Option<NodeId>> = vec![None; tree.len()];
    let mut last_leaf: Vec<Option<NodeId>> = vec![None; tree.len()];
    for leaf in tree.leaves(root) {
        for n in std::iter::once(leaf).chain(tree.ancestors(leaf)) {
            first_leaf[n.index()].get_or_insert(leaf);
            last_leaf[n.index()] = Some(leaf);
        }
    }

    let mut out = CollectedText {
        node_ranges: vec![0..0; tree.len()],
        ..Default::default()
    };
    let mut plain_len = 0;

    for leaf in tree.leaves(root) {
        // Nearest first, root excluded; the root's direction is the
        // paragraph direction instead.
        let chain: Vec<NodeId> = std::iter::once(leaf)
            .chain(tree.ancestors(leaf))
            .filter(|n| *n != root)
            .collect();

        let mut text = Vec::new();
        let mut new_to_old = Vec::new();
        for n in chain.iter().rev() {
            if first_leaf[n.index()] == Some(leaf) {
                let (open, _) = bidi_controls(&tree.node(*n).style);
                new_to_old.extend(open.iter().map(|_| None));
                text.extend(open);
            }
        }
        let original_text = tree.node(leaf).text.clone().unwrap_or_default();
        for (i, c) in original_text.chars().enumerate() {
            text.push(c);
            new_to_old.push(Some(i));
        }
        for n in chain.iter() {
            if last_leaf[n.index()] == Some(leaf) {
                let (_, close) = bidi_controls(&tree.node(*n).style);
                new_to_old.extend(close.iter().map(|_| None));
                text.extend(close);
            }
        }

        let path_node = tree.text_path_of(leaf);
        let start = out.text.len();
        let chunk_index = out.chunks.len();
        for old in &new_to_old {
            out.plain_index.push(old.map(|o| plain_len + o));
            out.chunk_of.push(chunk_index);
        }
        plain_len += original_text.chars().count();
        out.plain_text.push_str(&original_text);
        out.text.extend(text.iter().copied());
        out.node_ranges[leaf.index()] = start..out.text.len();
        out.chunks.push(SubChunk {
            leaf,
            start,
            text,
            original_text,
            new_to_old,
            in_text_path: path_node.is_some(),
            first_text_in_path: path_node.is_some_and(|p| first_leaf[p.index()] == Some(leaf)),
        });
    }

    // Inner nodes span from their first leaf to their last.
    for id in tree.descendants(root) {
        if let (Some(first), Some(last)) = (first_leaf[id.index()], last_leaf[id.index()]) {
            let start = out.node_ranges[first.index()].start;
            let end = out.node_ranges[last.index()].end;
            out.node_ranges[id.index()] = start..end;
        }
    }

    debug_assert_eq!(out.text.len(), out.plain_index.len());
    out
}
