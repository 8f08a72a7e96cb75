// src/engine/ast.rs
use crate::engine::Node;

/// Return true if the byte offset is inside a string or character literal.
#[must_use]
pub fn in_literal(root: Node, byte: usize) -> bool {
    let mut cur = root.descendant_for_byte_range(byte, byte + 1);
    while let Some(n) = cur {
        match n.kind() {
            "string" | "char" => return true,
            _ => cur = n.parent(),
        }
    }
    false
}

/// Collect all descendants of `root` whose `kind()` matches `kind`, in source order.
pub fn descendants_of_kind<'a>(root: Node<'a>, kind: &str) -> impl Iterator<Item = Node<'a>> {
    let mut out = Vec::new();

    fn dfs<'a>(node: Node<'a>, kind: &str, out: &mut Vec<Node<'a>>) {
        if node.kind() == kind {
            out.push(node);
        }
        for child in node.children() {
            dfs(child, kind, out);
        }
    }

    dfs(root, kind, &mut out);
    out.into_iter()
}

/// Nearest proper ancestor of `node` with one of the given kinds.
#[must_use]
pub fn enclosing<'a>(node: Node<'a>, kinds: &[&str]) -> Option<Node<'a>> {
    let mut cur = node.parent();
    while let Some(n) = cur {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        cur = n.parent();
    }
    None
}
