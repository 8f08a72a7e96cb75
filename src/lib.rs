#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![warn(clippy::nursery)]

pub mod check;
pub mod corpus;
pub mod engine;
pub mod grammar;
pub mod outline;

use anyhow::{Context, Result};

pub use check::{GrammarLoadError, verify_grammar_loads};
pub use engine::{Language, Node, Parser, Point, Tree};

/// Parser with the KPL grammar already loaded.
pub fn kpl_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar::language())
        .context("set_language failed")?;
    Ok(parser)
}

/// Parse KPL source into a tree.
pub fn parse_source(src: &str) -> Result<Tree> {
    let tree = kpl_parser()?.parse(src)?;
    Ok(tree)
}

// Convenience: the S-expression of `src`, as printed by `kpl_syntax parse`.
pub fn sexp(src: &str) -> Result<String> {
    Ok(parse_source(src)?.root_node().to_sexp())
}
