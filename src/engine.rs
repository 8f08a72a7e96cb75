pub mod ast;
pub mod document;
mod language;
mod tree;

use thiserror::Error;
use tracing::debug;

pub use document::{Document, TextEdit};
pub use language::{
    LANGUAGE_VERSION, Language, LanguageError, LanguageFn, LanguageTable,
    MIN_COMPATIBLE_LANGUAGE_VERSION, ParseFn,
};
pub use tree::{Node, Point, Subtree, Tree};

/// A grammar rejected the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{rendered}")]
pub struct SyntaxError {
    /// Byte offset where parsing failed.
    pub byte: usize,
    pub point: Point,
    /// Human readable names of the tokens or rules that would have been accepted.
    pub expected: Vec<String>,
    rendered: String,
}

impl SyntaxError {
    #[must_use]
    pub fn new(src: &str, byte: usize, expected: Vec<String>, rendered: String) -> Self {
        Self {
            byte,
            point: Point::at_byte(src, byte),
            expected,
            rendered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no language set on parser")]
    NoLanguage,
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// Brackets nest deeper than the grammar is willing to descend.
    #[error("brackets nested {depth} deep at {point}, the limit is {limit}")]
    TooDeep {
        depth: usize,
        limit: usize,
        point: Point,
    },
}

impl ParseError {
    /// Where in the source the parse gave up, if anywhere.
    #[must_use]
    pub const fn point(&self) -> Option<Point> {
        match self {
            Self::NoLanguage => None,
            Self::Syntax(err) => Some(err.point),
            Self::TooDeep { point, .. } => Some(*point),
        }
    }
}

/// Generic front end that drives whatever grammar it is given.
#[derive(Debug, Default)]
pub struct Parser {
    language: Option<Language>,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `language` for subsequent parses. On error the previous language is kept.
    pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
        language.validate()?;
        debug!(
            language = language.name(),
            abi = language.abi_version(),
            "language set"
        );
        self.language = Some(*language);
        Ok(())
    }

    #[must_use]
    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn parse(&self, src: impl Into<String>) -> Result<Tree, ParseError> {
        let language = self.language.ok_or(ParseError::NoLanguage)?;
        let src = src.into();
        let root = (language.parse_fn())(&src)?;
        let tree = Tree::new(src, language, root);
        debug!(
            language = language.name(),
            nodes = tree.node_count(),
            bytes = tree.source().len(),
            "parsed"
        );
        #[cfg(feature = "debug-tree")]
        eprintln!("{}", tree.root_node().to_sexp());
        Ok(tree)
    }
}
