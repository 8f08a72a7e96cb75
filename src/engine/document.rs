use anyhow::{Context, Result, bail, ensure};
use ropey::Rope;
use std::fmt;
use tracing::debug;

use crate::engine::{Language, ParseError, Parser, Tree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub start_byte: usize,
    pub end_byte: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }
}

/// Editable source text together with its most recent syntax tree.
pub struct Document {
    rope: Rope,
    parser: Parser,
    tree: Tree,
    error: Option<ParseError>,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl Document {
    pub fn new(src: String, lang: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(&lang).context("set_language failed")?;
        let tree = parser.parse(src.as_str()).context("parse failed")?;
        Ok(Self {
            rope: Rope::from_str(&src),
            parser,
            tree,
            error: None,
        })
    }

    /// Last tree that parsed successfully.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Why the current text did not parse, if the last reparse failed.
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// True when the tree reflects the current text.
    pub fn is_current(&self) -> bool {
        self.error.is_none()
    }

    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn slice_bytes(&self, start: usize, end: usize) -> String {
        self.rope.byte_slice(start..end).to_string()
    }

    // ropey rounds a byte inside a character down to that character
    fn is_char_boundary(&self, byte: usize) -> Result<bool> {
        let ch = self.rope.try_byte_to_char(byte)?;
        Ok(self.rope.char_to_byte(ch) == byte)
    }

    /// Apply `edits` (byte ranges into the current text) and reparse.
    ///
    /// Edits must not overlap. If the edited text no longer parses, the text
    /// is kept, the error is recorded and the previous tree stays in place.
    pub fn apply_edits(&mut self, mut edits: Vec<TextEdit>) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }
        edits.sort_by_key(|e| e.start_byte);
        let len = self.rope.len_bytes();
        for pair in edits.windows(2) {
            ensure!(
                pair[0].end_byte <= pair[1].start_byte,
                "overlapping edits at bytes {}..{} and {}..{}",
                pair[0].start_byte,
                pair[0].end_byte,
                pair[1].start_byte,
                pair[1].end_byte
            );
        }
        for e in &edits {
            ensure!(
                e.start_byte <= e.end_byte && e.end_byte <= len,
                "edit {}..{} out of bounds for {len} bytes",
                e.start_byte,
                e.end_byte
            );
            for byte in [e.start_byte, e.end_byte] {
                ensure!(
                    self.is_char_boundary(byte)?,
                    "edit {}..{} splits the character at byte {byte}",
                    e.start_byte,
                    e.end_byte
                );
            }
        }

        let count = edits.len();
        for e in edits.into_iter().rev() {
            let start_char = self.rope.try_byte_to_char(e.start_byte)?;
            let end_char = self.rope.try_byte_to_char(e.end_byte)?;
            self.rope.remove(start_char..end_char);
            if !e.replacement.is_empty() {
                self.rope.insert(start_char, &e.replacement);
            }
        }

        match self.parser.parse(self.rope.to_string()) {
            Ok(tree) => {
                self.tree = tree;
                self.error = None;
            }
            Err(ParseError::NoLanguage) => bail!("reparse failed: no language set"),
            Err(err) => {
                debug!(edits = count, %err, "reparse failed, keeping last tree");
                self.error = Some(err);
            }
        }
        Ok(())
    }
}
