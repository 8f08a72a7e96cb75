//! Corpus tests in the tree-sitter layout.
//!
//! A corpus file holds any number of cases:
//!
//! ```text
//! ==================
//! Case name
//! :error
//! ==================
//!
//! source text
//!
//! ---
//!
//! (expected (s-expression))
//! ```
//!
//! The `:error` attribute line is optional and marks input that must not parse.

use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::engine::{ParseError, Parser};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusCase {
    pub name: String,
    pub source: String,
    pub expected: String,
    pub expect_error: bool,
    /// 1-based line of the case header.
    pub line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Mismatch { actual: String },
    UnexpectedError { message: String },
    UnexpectedSuccess { actual: String },
}

#[derive(Clone, Debug)]
pub struct Failure {
    pub file: PathBuf,
    pub case: CorpusCase,
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Default)]
pub struct CorpusReport {
    pub passed: usize,
    pub failures: Vec<Failure>,
}

impl CorpusReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.passed + self.failures.len()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

fn is_rule(line: &str, ch: char) -> bool {
    let t = line.trim_end();
    t.len() >= 3 && t.chars().all(|c| c == ch)
}

/// Split a corpus file into cases.
pub fn parse_corpus(text: &str) -> Result<Vec<CorpusCase>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut cases = Vec::new();
    let mut i = 0usize;

    // skip anything before the first header
    while i < lines.len() && !is_rule(lines[i], '=') {
        i += 1;
    }

    while i < lines.len() {
        let header_line = i + 1;
        i += 1;

        let mut name_lines = Vec::new();
        let mut expect_error = false;
        while i < lines.len() && !is_rule(lines[i], '=') {
            let l = lines[i].trim();
            if l == ":error" {
                expect_error = true;
            } else if let Some(attr) = l.strip_prefix(':') {
                bail!("line {}: unknown attribute `:{attr}`", i + 1);
            } else if !l.is_empty() {
                name_lines.push(l);
            }
            i += 1;
        }
        if i == lines.len() {
            bail!("line {header_line}: unterminated case header");
        }
        i += 1; // closing '=' rule

        let body_start = i;
        while i < lines.len() && !is_rule(lines[i], '-') {
            i += 1;
        }
        if i == lines.len() {
            bail!("line {header_line}: case has no `---` separator");
        }
        let source = lines[body_start..i].join("\n").trim().to_string();
        i += 1; // '-' rule

        let expected_start = i;
        while i < lines.len() && !is_rule(lines[i], '=') {
            i += 1;
        }
        let expected = normalize_sexp(&lines[expected_start..i].join("\n"));

        cases.push(CorpusCase {
            name: name_lines.join(" "),
            source,
            expected,
            expect_error,
            line: header_line,
        });
    }
    Ok(cases)
}

/// Collapse whitespace so S-expressions compare by structure.
#[must_use]
pub fn normalize_sexp(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() && !out.ends_with('(') && c != ')' {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

pub fn run_case(parser: &Parser, case: &CorpusCase) -> Outcome {
    match (parser.parse(case.source.as_str()), case.expect_error) {
        (Ok(tree), false) => {
            let actual = tree.root_node().to_sexp();
            if actual == case.expected {
                Outcome::Passed
            } else {
                Outcome::Mismatch { actual }
            }
        }
        (Ok(tree), true) => Outcome::UnexpectedSuccess {
            actual: tree.root_node().to_sexp(),
        },
        (Err(err @ ParseError::NoLanguage), _) | (Err(err), false) => Outcome::UnexpectedError {
            message: err.to_string(),
        },
        (Err(_), true) => Outcome::Passed,
    }
}

/// Run every case of one corpus file.
pub fn run_file(parser: &Parser, path: &Path, report: &mut CorpusReport) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading corpus file {}", path.display()))?;
    let cases = parse_corpus(&text).with_context(|| format!("in {}", path.display()))?;
    debug!(file = %path.display(), cases = cases.len(), "running corpus file");
    for case in cases {
        match run_case(parser, &case) {
            Outcome::Passed => report.passed += 1,
            outcome => {
                warn!(file = %path.display(), case = %case.name, "corpus case failed");
                report.failures.push(Failure {
                    file: path.to_path_buf(),
                    case,
                    outcome,
                });
            }
        }
    }
    Ok(())
}

/// Run every `*.txt` file below `dir`, in path order.
pub fn run_dir(parser: &Parser, dir: &Path) -> Result<CorpusReport> {
    let pattern = dir.join("**").join("*.txt");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("non UTF-8 corpus path {}", dir.display()))?;
    let mut files = glob(pattern)
        .context("bad corpus pattern")?
        .collect::<Result<Vec<_>, _>>()?;
    files.sort();
    if files.is_empty() {
        bail!("no corpus files found in {}", dir.display());
    }

    let mut report = CorpusReport::default();
    for file in &files {
        run_file(parser, file, &mut report)?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;

    const TWO_CASES: &str = "\
==========
Empty code file
==========

code Main endCode

---

(source_file
  (code_file
    (identifier)))

==========
Missing end
:error
==========

code Main

---
";

    fn parser() -> Parser {
        let mut p = Parser::new();
        p.set_language(&grammar::language()).unwrap();
        p
    }

    #[test]
    fn splits_cases() {
        let cases = parse_corpus(TWO_CASES).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].name, "Empty code file");
        assert_eq!(cases[0].source, "code Main endCode");
        assert_eq!(cases[0].expected, "(source_file (code_file (identifier)))");
        assert_eq!(cases[0].line, 1);
        assert!(!cases[0].expect_error);
        assert!(cases[1].expect_error);
        assert_eq!(cases[1].expected, "");
    }

    #[test]
    fn runs_cases() {
        let p = parser();
        for case in parse_corpus(TWO_CASES).unwrap() {
            assert_eq!(run_case(&p, &case), Outcome::Passed, "{}", case.name);
        }
    }

    #[test]
    fn reports_mismatch() {
        let mut case = parse_corpus(TWO_CASES).unwrap().remove(0);
        case.expected = "(source_file)".to_string();
        assert_eq!(
            run_case(&parser(), &case),
            Outcome::Mismatch {
                actual: "(source_file (code_file (identifier)))".to_string()
            }
        );
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(parse_corpus("=====\nno end\n").is_err());
        assert!(parse_corpus("=====\nname\n=====\ncode A endCode\n").is_err());
        assert!(parse_corpus("=====\nname\n:skip\n=====\nx\n---\n").is_err());
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_sexp("( a\n   ( b )\n)"), "(a (b))");
    }
}
