//! Smoke check that a grammar can be loaded by the engine.

use thiserror::Error;
use tracing::debug;

use crate::engine::{Language, LanguageError, LanguageFn, Parser};
use crate::grammar;

/// The grammar could not be loaded. This is the only failure the check reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error loading {name} grammar")]
pub struct GrammarLoadError {
    pub name: String,
    #[source]
    pub source: LanguageError,
}

/// Check that the compiled-in KPL grammar loads.
pub fn verify_grammar_loads() -> Result<Language, GrammarLoadError> {
    verify_language(grammar::LANGUAGE, "kpl")
}

/// Resolve `raw`, hand it to a fresh [`Parser`] and report whether the engine accepted it.
pub fn verify_language(raw: LanguageFn, name: &str) -> Result<Language, GrammarLoadError> {
    let fail = |source| GrammarLoadError {
        name: name.to_string(),
        source,
    };
    let language = Language::new(raw).ok_or_else(|| fail(LanguageError::Null))?;
    let mut parser = Parser::new();
    parser.set_language(&language).map_err(fail)?;
    debug!(name, kinds = language.node_kind_count(), "grammar loaded");
    Ok(language)
}
