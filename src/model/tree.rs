//! Arena representation of the content tree.
//!
//! Layout walks the tree many times in different orders (leaf order for
//! text collection, pre-order for transforms and baselines, post-order for
//! text length). Nodes live in one `Vec` and link to each other by index, and
//! every traversal is a small iterator holding only a cursor, so any number
//! of traversals can run side by side.

use super::{PathMethod, PathOffset, PathSide, TextContent, TextDocument};
use crate::geometry::{parse_path_checked, BezPath};
use crate::style::{ResolvedStyle, Style};
use crate::text::transforms::CharTransformation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Path geometry a `textPath` node lays its content along.
#[derive(Debug, Clone)]
pub struct TextPath {
    pub path: BezPath,
    pub side: PathSide,
    pub start_offset: PathOffset,
    pub method: PathMethod,
}

#[derive(Debug, Clone)]
pub struct TextNode {
    pub text: Option<String>,
    pub style: ResolvedStyle,
    /// Local per-character positioning, consumed in order over the
    /// node's addressable characters.
    pub transforms: Vec<CharTransformation>,
    pub text_path: Option<TextPath>,
    pub id: Option<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl TextNode {
    pub fn new(style: ResolvedStyle) -> Self {
        Self {
            text: None,
            style,
            transforms: Vec::new(),
            text_path: None,
            id: None,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct TextTree {
    nodes: Vec<TextNode>,
}

impl TextTree {
    /// A tree holding only a root node.
    pub fn new(root: TextNode) -> Self {
        Self { nodes: vec![root] }
    }

    /// Flatten a document's content into an arena, resolving styles and
    /// text-path geometry on the way down.
    pub fn from_document(doc: &TextDocument) -> Self {
        let root_style = doc.root.style.resolve(None);
        let mut tree = TextTree::new(node_from_content(&doc.root, root_style, doc));

        // Explicit stack instead of recursion; children are pushed in
        // reverse so they are appended in document order.
        let mut stack: Vec<(NodeId, &TextContent)> = vec![(tree.root(), &doc.root)];
        while let Some((id, content)) = stack.pop() {
            let style = tree.node(id).style.clone();
            if content.text.is_some() && !content.children.is_empty() {
                // Leading text of a mixed node becomes an anonymous leaf.
                let text = content.text.clone();
                let leaf_style = Style::default().resolve(Some(&style));
                let mut leaf = TextNode::new(leaf_style);
                leaf.text = text;
                tree.node_mut(id).text = None;
                tree.append(id, leaf);
            }
            let mut pending = Vec::with_capacity(content.children.len());
            for child in &content.children {
                let child_style = child.style.resolve(Some(&style));
                let child_id = tree.append(id, node_from_content(child, child_style, doc));
                pending.push((child_id, child));
            }
            stack.extend(pending.into_iter().rev());
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TextNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut TextNode {
        &mut self.nodes[id.0]
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, mut node: TextNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.next_sibling = None;
        node.first_child = None;
        node.last_child = None;
        self.nodes.push(node);
        match self.nodes[parent.0].last_child {
            Some(last) => self.nodes[last.0].next_sibling = Some(id),
            None => self.nodes[parent.0].first_child = Some(id),
        }
        self.nodes[parent.0].last_child = Some(id);
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].first_child.is_none()
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.nodes[id.0].first_child,
        }
    }

    /// Pre-order walk of the subtree rooted at `id`, including `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            root: id,
            next: Some(id),
        }
    }

    /// Leaves of the subtree in depth-first order.
    pub fn leaves(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id).filter(move |n| self.is_leaf(*n))
    }

    /// Ancestors of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// Post-order walk of the subtree rooted at `id`, including `id`.
    pub fn post_order(&self, id: NodeId) -> PostOrder<'_> {
        PostOrder {
            tree: self,
            root: id,
            next: Some(self.leftmost_leaf(id)),
        }
    }

    fn leftmost_leaf(&self, mut id: NodeId) -> NodeId {
        while let Some(child) = self.nodes[id.0].first_child {
            id = child;
        }
        id
    }

    /// Nearest ancestor-or-self carrying a text path.
    pub fn text_path_of(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.nodes[n.0].text_path.is_some())
    }
}

fn node_from_content(content: &TextContent, style: ResolvedStyle, doc: &TextDocument) -> TextNode {
    let mut node = TextNode::new(style);
    node.text = content.text.clone();
    node.id = content.id.clone();
    node.transforms = CharTransformation::from_lists(
        &content.x,
        &content.y,
        &content.dx,
        &content.dy,
        &content.rotate,
    );
    if let Some(tp) = &content.text_path {
        let data = tp
            .href
            .as_ref()
            .and_then(|href| doc.paths.get(href.trim_start_matches('#')))
            .or(tp.path.as_ref());
        match data {
            Some(d) => match parse_path_checked(d) {
                Ok(path) => {
                    node.text_path = Some(TextPath {
                        path,
                        side: tp.side,
                        start_offset: tp.start_offset,
                        method: tp.method,
                    });
                }
                Err(e) => log::warn!("textPath laid out as a plain span: {e}"),
            },
            None => log::warn!(
                "textPath reference {:?} not found, laying out as a plain span",
                tp.href
            ),
        }
    }
    node
}

pub struct Children<'a> {
    tree: &'a TextTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.tree.nodes[cur.0].next_sibling;
        Some(cur)
    }
}

pub struct Descendants<'a> {
    tree: &'a TextTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        let nodes = &self.tree.nodes;
        self.next = match nodes[cur.0].first_child {
            Some(child) => Some(child),
            None => {
                let mut n = cur;
                loop {
                    if n == self.root {
                        break None;
                    }
                    if let Some(sib) = nodes[n.0].next_sibling {
                        break Some(sib);
                    }
                    match nodes[n.0].parent {
                        Some(p) => n = p,
                        None => break None,
                    }
                }
            }
        };
        Some(cur)
    }
}

pub struct Ancestors<'a> {
    tree: &'a TextTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.tree.nodes[cur.0].parent;
        Some(cur)
    }
}

pub struct PostOrder<'a> {
    tree: &'a TextTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for PostOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = if cur == self.root {
            None
        } else {
            match self.tree.nodes[cur.0].next_sibling {
                Some(sib) => Some(self.tree.leftmost_leaf(sib)),
                None => self.tree.nodes[cur.0].parent,
            }
        };
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;

    fn sample_doc() -> TextDocument {
        // root
        // ├── "a"
        // ├── span
        // │   ├── "b"
        // │   └── "c"
        // └── "d"
        TextDocument {
            root: TextContent::span(
                Style::default(),
                vec![
                    TextContent::text("a", Style::default()),
                    TextContent::span(
                        Style {
                            font_size: Some(30.0),
                            ..Default::default()
                        },
                        vec![
                            TextContent::text("b", Style::default()),
                            TextContent::text("c", Style::default()),
                        ],
                    ),
                    TextContent::text("d", Style::default()),
                ],
            ),
            ..Default::default()
        }
    }

    fn texts(tree: &TextTree, ids: impl Iterator<Item = NodeId>) -> String {
        ids.map(|id| tree.node(id).text.clone().unwrap_or_else(|| "_".into()))
            .collect()
    }

    #[test]
    fn test_leaves_in_document_order() {
        let tree = TextTree::from_document(&sample_doc());
        assert_eq!(texts(&tree, tree.leaves(tree.root())), "abcd");
    }

    #[test]
    fn test_pre_and_post_order() {
        let tree = TextTree::from_document(&sample_doc());
        assert_eq!(texts(&tree, tree.descendants(tree.root())), "_a_bcd");
        assert_eq!(texts(&tree, tree.post_order(tree.root())), "abc_d_");
    }

    #[test]
    fn test_subtree_traversal_stays_inside() {
        let tree = TextTree::from_document(&sample_doc());
        let span = tree.children(tree.root()).nth(1).unwrap();
        assert_eq!(texts(&tree, tree.descendants(span)), "_bc");
        assert_eq!(texts(&tree, tree.post_order(span)), "bc_");
        assert_eq!(tree.ancestors(span).count(), 1);
    }

    #[test]
    fn test_style_inherited_through_arena() {
        let tree = TextTree::from_document(&sample_doc());
        let leaves: Vec<_> = tree.leaves(tree.root()).collect();
        assert_eq!(tree.node(leaves[1]).style.font_size, 30.0);
        assert_eq!(tree.node(leaves[3]).style.font_size, 16.0);
    }

    #[test]
    fn test_mixed_node_text_becomes_first_leaf() {
        let doc = TextDocument {
            root: TextContent {
                text: Some("x".into()),
                children: vec![TextContent::text("y", Style::default())],
                ..Default::default()
            },
            ..Default::default()
        };
        let tree = TextTree::from_document(&doc);
        assert_eq!(texts(&tree, tree.leaves(tree.root())), "xy");
    }

    #[test]
    fn test_missing_text_path_is_plain_span() {
        let doc = TextDocument {
            root: TextContent {
                text_path: Some(super::super::TextPathRef {
                    href: Some("nope".into()),
                    ..Default::default()
                }),
                text: Some("x".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let tree = TextTree::from_document(&doc);
        assert!(tree.node(tree.root()).text_path.is_none());
    }
}
