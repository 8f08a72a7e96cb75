//! KPL grammar.
//!
//! `kpl.pest` is compiled into [`KplParser`] at build time. The engine sees the
//! grammar only through [`LANGUAGE`] / [`language()`].

mod convert;

use pest::Parser as _;
use pest::error::{ErrorVariant, InputLocation};
use pest_derive::Parser;

use crate::engine::{
    LANGUAGE_VERSION, Language, LanguageFn, LanguageTable, ParseError, Point, Subtree, SyntaxError,
};

#[derive(Parser)]
#[grammar = "grammar/kpl.pest"]
pub struct KplParser;

/// Named node kinds a KPL tree can contain. Kind ids are indices into this table.
pub const NODE_KINDS: &[&str] = &[
    "source_file",
    "header_file",
    "code_file",
    "uses_statement",
    "package_id",
    "package_string",
    "renaming_statement",
    "rename_statement",
    "constant_definition",
    "error_definition",
    "variable_declarations",
    "variable_declaration",
    "declaration",
    "enumeration",
    "type_definition",
    "functions_prototypes",
    "functions_prototype",
    "external",
    "function_prototype",
    "function_definition",
    "interface_definition",
    "extends_definition",
    "messages_definition",
    "class_definition",
    "implements_definition",
    "superclass_definition",
    "fields_definition",
    "methods_definition",
    "behavior_definition",
    "method_definition",
    "infix_definition",
    "prefix_definition",
    "identifiers_definition",
    "identifier_definition",
    "parameters_definition",
    "return_definition",
    "parameter_list",
    "arg_list",
    "type_parameters",
    "type",
    "primitive_type",
    "pointer_type",
    "array_type",
    "dimension",
    "record_type",
    "named_type",
    "statement_list",
    "if_statement",
    "else_if_clause",
    "else_clause",
    "while_loop",
    "until_loop",
    "for_loop",
    "switch_statement",
    "case_clause",
    "default_clause",
    "try_statement",
    "catch_clause",
    "throw_statement",
    "free_statement",
    "return_statement",
    "break_statement",
    "continue_statement",
    "debug_statement",
    "variable_assignment",
    "l_value",
    "keyword_message",
    "binary_expression",
    "unary_expression",
    "method_call",
    "field_access",
    "as_pointer",
    "as_integer",
    "array_size",
    "is_instance_of",
    "is_kind_of",
    "array_access",
    "parenthesized_expression",
    "null",
    "true",
    "false",
    "self",
    "super",
    "nameless_function",
    "new_expression",
    "alloc_expression",
    "size_of_expression",
    "call_expression",
    "constructor",
    "class_record_init",
    "array_init",
    "repeated_element",
    "operator",
    "identifier",
    "integer",
    "double",
    "char",
    "string",
];

static KPL: LanguageTable = LanguageTable {
    name: "kpl",
    abi_version: LANGUAGE_VERSION,
    node_kinds: NODE_KINDS,
    parse: parse_source,
};

fn raw_language() -> Option<&'static LanguageTable> {
    Some(&KPL)
}

/// Raw descriptor of the KPL grammar.
pub const LANGUAGE: LanguageFn = LanguageFn::from_raw(raw_language);

#[must_use]
pub fn language() -> Language {
    Language::from_table(&KPL)
}

/// Deepest bracket nesting accepted. Checked before parsing, since far deeper
/// input makes the recursive descent fail at an unrelated position.
pub const MAX_NESTING: usize = 256;

fn parse_source(src: &str) -> Result<Subtree, ParseError> {
    if let Some((byte, depth)) = nesting_overflow(src) {
        return Err(ParseError::TooDeep {
            depth,
            limit: MAX_NESTING,
            point: Point::at_byte(src, byte),
        });
    }
    let mut pairs = KplParser::parse(Rule::source_file, src).map_err(|e| syntax_error(src, e))?;
    // a successful parse of `source_file` always yields exactly that pair
    match pairs.next() {
        Some(pair) => Ok(convert::Converter::new().node(pair)),
        None => Err(SyntaxError::new(
            src,
            0,
            vec![describe_rule(&Rule::source_file)],
            "empty parse".to_string(),
        )
        .into()),
    }
}

/// Offset and depth of the first bracket nested past [`MAX_NESTING`].
/// Brackets in comments and in string or char literals are not counted.
fn nesting_overflow(src: &str) -> Option<(usize, usize)> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Some((i, depth));
                }
            }
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = src[i..].find('\n').map_or(bytes.len(), |n| i + n);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = src[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 1);
            }
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote && bytes[i] != b'\n' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn syntax_error(src: &str, err: pest::error::Error<Rule>) -> SyntaxError {
    let byte = match err.location {
        InputLocation::Pos(p) => p,
        InputLocation::Span((start, _)) => start,
    };
    let expected = match &err.variant {
        ErrorVariant::ParsingError { positives, .. } => {
            let mut names: Vec<String> = positives.iter().map(describe_rule).collect();
            names.dedup();
            names
        }
        ErrorVariant::CustomError { .. } => Vec::new(),
    };
    let rendered = err.renamed_rules(describe_rule).to_string();
    SyntaxError::new(src, byte, expected, rendered)
}

/// Name of a rule as shown to users in syntax errors.
fn describe_rule(rule: &Rule) -> String {
    if let Some(symbol) = convert::operator_symbol(*rule) {
        return format!("`{symbol}`");
    }
    let name = format!("{rule:?}");
    if let Some(keyword) = name.strip_prefix("kw_") {
        return format!("`{keyword}`");
    }
    match rule {
        Rule::EOI => "end of input".to_string(),
        Rule::prefix_op => "prefix operator".to_string(),
        Rule::type_expr => "type".to_string(),
        Rule::method_call_suffix | Rule::field_suffix => "`.`".to_string(),
        Rule::index_suffix => "`[`".to_string(),
        Rule::null_lit | Rule::true_lit | Rule::false_lit | Rule::self_lit | Rule::super_lit => {
            name.trim_end_matches("_lit").to_string()
        }
        _ => name.trim_end_matches("_suffix").replace('_', " "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ParseError, Parser, Tree};

    fn parse(src: &str) -> Result<Tree, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&language()).unwrap();
        parser.parse(src)
    }

    fn sexp(src: &str) -> String {
        parse(src).unwrap().root_node().to_sexp()
    }

    /// S-expression of the first statement in the body of `function F ()`.
    fn stmt(body: &str) -> String {
        let src = format!("code T\nfunction F ()\n{body}\nendFunction\nendCode\n");
        let tree = parse(&src).unwrap();
        let func = tree.root_node().child(0).unwrap().child(1).unwrap();
        let list = func.child_of_kind("statement_list").unwrap();
        list.child(0).unwrap().to_sexp()
    }

    #[test]
    fn raw_descriptor_matches_language() {
        assert_eq!(Language::new(LANGUAGE), Some(language()));
        assert_eq!(language().name(), "kpl");
        assert_eq!(language().node_kind_count(), NODE_KINDS.len());
    }

    #[test]
    fn minimal_files() {
        assert_eq!(sexp("code Main endCode"), "(source_file (code_file (identifier)))");
        assert_eq!(
            sexp("header Main\n  uses System\nendHeader\n"),
            "(source_file (header_file (identifier) (uses_statement (package_id (identifier)))))"
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            sexp("-- leading\ncode Main /* block\n comment */ endCode -- trailing"),
            "(source_file (code_file (identifier)))"
        );
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        assert_eq!(
            stmt("ifx = endIfy"),
            "(variable_assignment (l_value (identifier)) (identifier))"
        );
        assert!(parse("code if endCode").is_err());
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            stmt("x = a + b * c"),
            "(variable_assignment (l_value (identifier)) \
             (binary_expression (identifier) (operator) \
             (binary_expression (identifier) (operator) (identifier))))"
        );
    }

    #[test]
    fn binary_operators_are_left_associative() {
        let src = "code T\nfunction F ()\nx = a - b - c\nendFunction\nendCode\n";
        let tree = parse(src).unwrap();
        let outer = crate::engine::ast::descendants_of_kind(tree.root_node(), "binary_expression")
            .next()
            .unwrap();
        assert_eq!(outer.child(0).unwrap().utf8_text(), "a - b");
        assert_eq!(outer.child(1).unwrap().utf8_text(), "-");
        assert_eq!(outer.child(2).unwrap().utf8_text(), "c");
    }

    #[test]
    fn comparison_is_looser_than_shift() {
        let src = "code T\nfunction F ()\nok = a << 1 <= b && c\nendFunction\nendCode\n";
        let tree = parse(src).unwrap();
        let top = crate::engine::ast::descendants_of_kind(tree.root_node(), "binary_expression")
            .next()
            .unwrap();
        assert_eq!(top.child(1).unwrap().utf8_text(), "&&");
        let cmp = top.child(0).unwrap();
        assert_eq!(cmp.child(1).unwrap().utf8_text(), "<=");
        assert_eq!(cmp.child(0).unwrap().utf8_text(), "a << 1");
    }

    #[test]
    fn prefix_and_postfix_operators() {
        assert_eq!(
            stmt("x = -p.next.value"),
            "(variable_assignment (l_value (identifier)) \
             (unary_expression (operator) \
             (field_access (field_access (identifier) (identifier)) (identifier))))"
        );
        assert_eq!(
            stmt("p = q asPtrTo int"),
            "(variable_assignment (l_value (identifier)) \
             (as_pointer (identifier) (type (primitive_type))))"
        );
        assert_eq!(
            stmt("n = arr arraySize"),
            "(variable_assignment (l_value (identifier)) (array_size (identifier)))"
        );
    }

    #[test]
    fn sends_and_calls() {
        assert_eq!(
            stmt("list.add (3, x)"),
            "(method_call (identifier) (identifier) (arg_list (integer) (identifier)))"
        );
        assert_eq!(
            stmt("table at: 1 put: x"),
            "(keyword_message (identifier) (identifier) (integer) (identifier) (identifier))"
        );
        assert_eq!(stmt("foo ()"), "(call_expression (identifier) (arg_list))");
    }

    #[test]
    fn literals() {
        assert_eq!(
            stmt("x = 0x1F + 2.5e3"),
            "(variable_assignment (l_value (identifier)) \
             (binary_expression (integer) (operator) (double)))"
        );
        assert_eq!(
            stmt("c = 'a'"),
            "(variable_assignment (l_value (identifier)) (char))"
        );
        assert_eq!(
            stmt(r#"s = "a \"quoted\" word""#),
            "(variable_assignment (l_value (identifier)) (string))"
        );
        assert_eq!(
            stmt("b = true || null == self"),
            "(variable_assignment (l_value (identifier)) \
             (binary_expression (true) (operator) (binary_expression (null) (operator) (self))))"
        );
    }

    #[test]
    fn constructors() {
        assert_eq!(
            stmt("p = new Person { name = n, age = 3 }"),
            "(variable_assignment (l_value (identifier)) \
             (new_expression (constructor (type (named_type (identifier))) \
             (class_record_init (identifier) (identifier) (identifier) (integer)))))"
        );
        assert_eq!(
            stmt("a = alloc array of int { 10 of 0, 1 }"),
            "(variable_assignment (l_value (identifier)) \
             (alloc_expression (constructor (type (array_type (type (primitive_type)))) \
             (array_init (repeated_element (integer) (integer)) (integer)))))"
        );
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = match parse("code Main\n  const = 3\nendCode\n") {
            Err(ParseError::Syntax(err)) => err,
            other => panic!("expected a syntax error, got {other:?}"),
        };
        assert_eq!(err.point.row, 1);
        assert_eq!(err.point.column, 8);
        assert!(err.expected.iter().any(|e| e == "identifier"), "{:?}", err.expected);
        assert!(err.to_string().contains("2:9"), "{err}");
    }

    #[test]
    fn array_dimensions_may_start_with_a_star() {
        assert_eq!(
            sexp("code T\n  var buf: array [*n, *] of int\nendCode\n"),
            "(source_file (code_file (identifier) (variable_declarations (variable_declaration \
             (declaration (identifier) (type (array_type \
             (dimension (unary_expression (operator) (identifier))) (dimension) \
             (type (primitive_type))))))))))"
        );
    }

    fn nested(depth: usize) -> String {
        format!("x = {}a{}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn moderate_nesting_parses() {
        let sexp = stmt(&nested(40));
        assert_eq!(sexp.matches("parenthesized_expression").count(), 40);
    }

    #[test]
    fn deep_nesting_is_reported_before_parsing() {
        let src = format!("code T\nfunction F ()\n{}\nendFunction\nendCode\n", nested(300));
        match parse(&src) {
            Err(ParseError::TooDeep { depth, limit, point }) => {
                assert_eq!(limit, MAX_NESTING);
                assert_eq!(depth, MAX_NESTING + 1);
                assert_eq!(point.row, 2);
                assert_eq!(point.column, 4 + MAX_NESTING);
            }
            other => panic!("expected a nesting error, got {other:?}"),
        }
    }

    #[test]
    fn brackets_in_literals_and_comments_do_not_nest() {
        let parens = "(".repeat(MAX_NESTING + 10);
        let src = format!(
            "code T\n  const S = \"{parens}\"\n  -- {parens}\n  /* {parens} */\nendCode\n"
        );
        assert!(parse(&src).is_ok());
        assert_eq!(
            nesting_overflow(&format!("'\\'' {parens}")),
            Some((5 + MAX_NESTING, MAX_NESTING + 1))
        );
    }

    #[test]
    fn every_emitted_kind_is_in_the_table() {
        let src = include_str!("../tests/samples/list.k");
        let tree = parse(src).unwrap();
        let mut stack = vec![tree.root_node()];
        while let Some(n) = stack.pop() {
            assert_ne!(n.kind_id(), u16::MAX, "unknown kind {}", n.kind());
            stack.extend(n.children());
        }
    }
}
