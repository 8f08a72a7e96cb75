use std::fmt;

use thiserror::Error;

use crate::engine::tree::Subtree;
use crate::engine::ParseError;

/// The ABI version written into every language table produced by this crate.
pub const LANGUAGE_VERSION: usize = 3;

/// The oldest table ABI the engine still knows how to drive.
pub const MIN_COMPATIBLE_LANGUAGE_VERSION: usize = 2;

/// Entry point a grammar exposes to the engine.
pub type ParseFn = fn(&str) -> Result<Subtree, ParseError>;

/// Static description of a compiled grammar.
///
/// Tables are owned by the grammar that defines them and live for the whole
/// program; the engine only ever borrows them.
pub struct LanguageTable {
    pub name: &'static str,
    pub abi_version: usize,
    pub node_kinds: &'static [&'static str],
    pub parse: ParseFn,
}

impl fmt::Debug for LanguageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageTable")
            .field("name", &self.name)
            .field("abi_version", &self.abi_version)
            .field("node_kinds", &self.node_kinds.len())
            .finish_non_exhaustive()
    }
}

/// Opaque language descriptor handed out by a grammar.
///
/// Calling the factory yields the grammar's table, or `None` when the
/// descriptor is null.
#[derive(Clone, Copy)]
pub struct LanguageFn(fn() -> Option<&'static LanguageTable>);

impl LanguageFn {
    #[must_use]
    pub const fn from_raw(f: fn() -> Option<&'static LanguageTable>) -> Self {
        Self(f)
    }

    #[must_use]
    pub fn into_raw(self) -> fn() -> Option<&'static LanguageTable> {
        self.0
    }
}

impl fmt::Debug for LanguageFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LanguageFn(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    #[error("language descriptor is null")]
    Null,
    #[error(
        "incompatible language version {version}, expected a version between {min} and {max}"
    )]
    Version {
        version: usize,
        min: usize,
        max: usize,
    },
    #[error("language `{0}` does not define any node kinds")]
    NoNodeKinds(&'static str),
}

/// Engine-level handle on a grammar.
#[derive(Clone, Copy)]
pub struct Language {
    table: &'static LanguageTable,
}

impl Language {
    /// Resolve a raw descriptor. Returns `None` for a null descriptor.
    #[must_use]
    pub fn new(raw: LanguageFn) -> Option<Self> {
        (raw.0)().map(Self::from_table)
    }

    #[must_use]
    pub const fn from_table(table: &'static LanguageTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.table.name
    }

    #[must_use]
    pub fn abi_version(&self) -> usize {
        self.table.abi_version
    }

    #[must_use]
    pub fn node_kind_count(&self) -> usize {
        self.table.node_kinds.len()
    }

    #[must_use]
    pub fn node_kind_for_id(&self, id: u16) -> Option<&'static str> {
        self.table.node_kinds.get(usize::from(id)).copied()
    }

    #[must_use]
    pub fn id_for_node_kind(&self, kind: &str) -> Option<u16> {
        self.table
            .node_kinds
            .iter()
            .position(|k| *k == kind)
            .and_then(|i| u16::try_from(i).ok())
    }

    pub(crate) fn validate(&self) -> Result<(), LanguageError> {
        let version = self.table.abi_version;
        if !(MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&version) {
            return Err(LanguageError::Version {
                version,
                min: MIN_COMPATIBLE_LANGUAGE_VERSION,
                max: LANGUAGE_VERSION,
            });
        }
        if self.table.node_kinds.is_empty() {
            return Err(LanguageError::NoNodeKinds(self.table.name));
        }
        Ok(())
    }

    pub(crate) fn parse_fn(&self) -> ParseFn {
        self.table.parse
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.table, other.table)
    }
}

impl Eq for Language {}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Language").field(&self.table.name).finish()
    }
}
