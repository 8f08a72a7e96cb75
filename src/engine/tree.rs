use std::fmt;
use std::ops::Range;

use crate::engine::Language;

/// Node produced by a grammar before it is placed into a [`Tree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subtree {
    pub kind: &'static str,
    pub start_byte: usize,
    pub end_byte: usize,
    pub children: Vec<Subtree>,
}

impl Subtree {
    #[must_use]
    pub const fn new(
        kind: &'static str,
        start_byte: usize,
        end_byte: usize,
        children: Vec<Self>,
    ) -> Self {
        Self {
            kind,
            start_byte,
            end_byte,
            children,
        }
    }

    #[must_use]
    pub const fn leaf(kind: &'static str, start_byte: usize, end_byte: usize) -> Self {
        Self::new(kind, start_byte, end_byte, Vec::new())
    }
}

/// Zero-based row and byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Position of `byte` within `src`. Offsets past the end clamp to it.
    #[must_use]
    pub fn at_byte(src: &str, byte: usize) -> Self {
        let byte = byte.min(src.len());
        let before = &src.as_bytes()[..byte];
        let row = before.iter().filter(|&&b| b == b'\n').count();
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        Self::new(row, byte - line_start)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: &'static str,
    kind_id: u16,
    start_byte: usize,
    end_byte: usize,
    start_point: Point,
    end_point: Point,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Syntax tree for one source text.
#[derive(Clone)]
pub struct Tree {
    source: String,
    language: Language,
    nodes: Vec<NodeData>,
}

impl Tree {
    /// Flatten `root` into an arena; nodes are stored in pre-order.
    #[must_use]
    pub fn new(source: String, language: Language, root: Subtree) -> Self {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(
                source
                    .bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();
        let point = |byte: usize| {
            let row = line_starts.partition_point(|&s| s <= byte) - 1;
            Point::new(row, byte - line_starts[row])
        };

        let mut nodes = Vec::new();
        let mut stack = vec![(root, None)];
        while let Some((sub, parent)) = stack.pop() {
            let id = nodes.len();
            nodes.push(NodeData {
                kind: sub.kind,
                kind_id: language.id_for_node_kind(sub.kind).unwrap_or(u16::MAX),
                start_byte: sub.start_byte,
                end_byte: sub.end_byte,
                start_point: point(sub.start_byte),
                end_point: point(sub.end_byte),
                parent,
                children: Vec::with_capacity(sub.children.len()),
            });
            if let Some(p) = parent {
                let siblings: &mut Vec<usize> = &mut nodes[p].children;
                siblings.push(id);
            }
            // reversed so the first child is popped (and numbered) first
            for child in sub.children.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        Self {
            source,
            language,
            nodes,
        }
    }

    #[must_use]
    pub fn root_node(&self) -> Node<'_> {
        Node { tree: self, id: 0 }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{Tree {}}}", self.root_node().to_sexp())
    }
}

/// Borrowed view of one node of a [`Tree`].
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    id: usize,
}

impl<'tree> Node<'tree> {
    fn data(&self) -> &'tree NodeData {
        &self.tree.nodes[self.id]
    }

    fn at(&self, id: usize) -> Self {
        Node {
            tree: self.tree,
            id,
        }
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.data().kind
    }

    /// Index of this node's kind in the language's node-kind table.
    #[must_use]
    pub fn kind_id(&self) -> u16 {
        self.data().kind_id
    }

    #[must_use]
    pub fn start_byte(&self) -> usize {
        self.data().start_byte
    }

    #[must_use]
    pub fn end_byte(&self) -> usize {
        self.data().end_byte
    }

    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    #[must_use]
    pub fn start_position(&self) -> Point {
        self.data().start_point
    }

    #[must_use]
    pub fn end_position(&self) -> Point {
        self.data().end_point
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    #[must_use]
    pub fn child(&self, i: usize) -> Option<Self> {
        self.data().children.get(i).map(|&id| self.at(id))
    }

    pub fn children(self) -> impl ExactSizeIterator<Item = Node<'tree>> {
        let tree = self.tree;
        self.data().children.iter().map(move |&id| Node { tree, id })
    }

    /// First child of the given kind.
    #[must_use]
    pub fn child_of_kind(&self, kind: &str) -> Option<Self> {
        self.children().find(|c| c.kind() == kind)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.data().parent.map(|id| self.at(id))
    }

    #[must_use]
    pub fn next_sibling(&self) -> Option<Self> {
        let parent = self.parent()?;
        let siblings = &parent.data().children;
        let pos = siblings.iter().position(|&id| id == self.id)?;
        siblings.get(pos + 1).map(|&id| self.at(id))
    }

    /// Source text covered by this node.
    #[must_use]
    pub fn utf8_text(&self) -> &'tree str {
        &self.tree.source[self.byte_range()]
    }

    /// Smallest node that spans `start..end`.
    #[must_use]
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Self> {
        if start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut cur = *self;
        'descend: loop {
            for child in cur.children() {
                if child.start_byte() <= start && end <= child.end_byte() {
                    cur = child;
                    continue 'descend;
                }
            }
            return Some(cur);
        }
    }

    /// Render the subtree as an S-expression of node kinds.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(self.kind());
        for child in self.children() {
            out.push(' ');
            child.write_sexp(out);
        }
        out.push(')');
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} {} - {}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{LANGUAGE_VERSION, LanguageError, LanguageTable, ParseError};

    fn unused(_: &str) -> Result<Subtree, ParseError> {
        Err(ParseError::NoLanguage)
    }

    static TOY: LanguageTable = LanguageTable {
        name: "toy",
        abi_version: LANGUAGE_VERSION,
        node_kinds: &["list", "word"],
        parse: unused,
    };

    fn toy_tree() -> Tree {
        // "ab cd\nef"
        let root = Subtree::new(
            "list",
            0,
            8,
            vec![
                Subtree::leaf("word", 0, 2),
                Subtree::leaf("word", 3, 5),
                Subtree::leaf("word", 6, 8),
            ],
        );
        Tree::new("ab cd\nef".to_string(), Language::from_table(&TOY), root)
    }

    #[test]
    fn positions_are_zero_based() {
        let tree = toy_tree();
        let last = tree.root_node().child(2).unwrap();
        assert_eq!(last.start_position(), Point::new(1, 0));
        assert_eq!(last.end_position(), Point::new(1, 2));
        assert_eq!(last.utf8_text(), "ef");
        assert_eq!(Point::at_byte("ab cd\nef", 7), Point::new(1, 1));
    }

    #[test]
    fn navigation() {
        let tree = toy_tree();
        let root = tree.root_node();
        assert_eq!(root.child_count(), 3);
        let first = root.child(0).unwrap();
        assert_eq!(first.parent(), Some(root));
        assert_eq!(first.next_sibling().unwrap().utf8_text(), "cd");
        assert!(root.child(2).unwrap().next_sibling().is_none());
        assert_eq!(first.kind_id(), 1);
        assert_eq!(
            root.descendant_for_byte_range(3, 4).map(|n| n.utf8_text()),
            Some("cd")
        );
        assert_eq!(root.descendant_for_byte_range(1, 4), Some(root));
    }

    #[test]
    fn sexp_lists_kinds() {
        assert_eq!(
            toy_tree().root_node().to_sexp(),
            "(list (word) (word) (word))"
        );
    }

    #[test]
    fn language_error_messages() {
        assert_eq!(LanguageError::Null.to_string(), "language descriptor is null");
    }
}
