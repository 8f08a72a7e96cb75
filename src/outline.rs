//! Definition outline of a KPL file.

use std::fmt;

use crate::engine::ast::enclosing;
use crate::engine::{Node, Tree};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    FunctionPrototype,
    Interface,
    Class,
    Behavior,
    Method,
    MethodPrototype,
}

impl SymbolKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::FunctionPrototype => "function prototype",
            Self::Interface => "interface",
            Self::Class => "class",
            Self::Behavior => "behavior",
            Self::Method => "method",
            Self::MethodPrototype => "method prototype",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Qualified with the owning class/interface/behavior for methods, e.g. `Stack.push`.
    pub name: String,
    /// 0-based row of the definition.
    pub row: usize,
}

const CONTAINERS: &[&str] = &["class_definition", "interface_definition", "behavior_definition"];

const PROTOTYPES: &[&str] = &[
    "parameters_definition",
    "identifiers_definition",
    "infix_definition",
    "prefix_definition",
];

/// List definitions in source order.
#[must_use]
pub fn outline(tree: &Tree) -> Vec<Symbol> {
    let mut out = Vec::new();
    walk(tree.root_node(), &mut out);
    out
}

fn walk(node: Node, out: &mut Vec<Symbol>) {
    let kind = match node.kind() {
        "function_definition" => Some(SymbolKind::Function),
        "function_prototype" => Some(SymbolKind::FunctionPrototype),
        "interface_definition" => Some(SymbolKind::Interface),
        "class_definition" => Some(SymbolKind::Class),
        "behavior_definition" => Some(SymbolKind::Behavior),
        "method_definition" => Some(SymbolKind::Method),
        k if PROTOTYPES.contains(&k)
            && node.parent().is_some_and(|p| p.kind() != "method_definition") =>
        {
            Some(SymbolKind::MethodPrototype)
        }
        _ => None,
    };

    if let Some(kind) = kind {
        let mut name = symbol_name(node);
        if matches!(kind, SymbolKind::Method | SymbolKind::MethodPrototype)
            && let Some(owner) = enclosing(node, CONTAINERS)
        {
            name = format!("{}.{name}", symbol_name(owner));
        }
        out.push(Symbol {
            kind,
            name,
            row: node.start_position().row,
        });
    }

    for child in node.children() {
        walk(child, out);
    }
}

/// Name of a definition node, as written in the source.
fn symbol_name(node: Node) -> String {
    match node.kind() {
        "method_definition" => node
            .children()
            .find(|c| PROTOTYPES.contains(&c.kind()))
            .map_or_else(String::new, symbol_name),
        // `at: (..) put: (..)` → `at:put:`
        "identifiers_definition" => node
            .children()
            .filter(|c| c.kind() == "identifier_definition")
            .filter_map(|c| c.child(0))
            .map(|id| format!("{}:", id.utf8_text()))
            .collect(),
        "infix_definition" | "prefix_definition" => node
            .child_of_kind("operator")
            .map_or_else(String::new, |op| op.utf8_text().to_string()),
        _ => node
            .child_of_kind("identifier")
            .map_or_else(String::new, |id| id.utf8_text().to_string()),
    }
}
