use std::sync::LazyLock;

use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use super::Rule;
use crate::engine::Subtree;

/// Operator table for `infix_chain`, loosest binding first.
static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::op_or, Assoc::Left))
        .op(Op::infix(Rule::op_and, Assoc::Left))
        .op(Op::infix(Rule::op_bit_or, Assoc::Left))
        .op(Op::infix(Rule::op_bit_xor, Assoc::Left))
        .op(Op::infix(Rule::op_bit_and, Assoc::Left))
        .op(Op::infix(Rule::op_eq, Assoc::Left) | Op::infix(Rule::op_ne, Assoc::Left))
        .op(
            Op::infix(Rule::op_lt, Assoc::Left)
                | Op::infix(Rule::op_le, Assoc::Left)
                | Op::infix(Rule::op_gt, Assoc::Left)
                | Op::infix(Rule::op_ge, Assoc::Left),
        )
        .op(
            Op::infix(Rule::op_shl, Assoc::Left)
                | Op::infix(Rule::op_shr, Assoc::Left)
                | Op::infix(Rule::op_shr_logical, Assoc::Left),
        )
        .op(Op::infix(Rule::op_add, Assoc::Left) | Op::infix(Rule::op_sub, Assoc::Left))
        .op(
            Op::infix(Rule::op_mul, Assoc::Left)
                | Op::infix(Rule::op_div, Assoc::Left)
                | Op::infix(Rule::op_rem, Assoc::Left),
        )
        .op(Op::prefix(Rule::prefix_op))
        .op(
            Op::postfix(Rule::method_call_suffix)
                | Op::postfix(Rule::field_suffix)
                | Op::postfix(Rule::as_pointer_suffix)
                | Op::postfix(Rule::as_integer_suffix)
                | Op::postfix(Rule::array_size_suffix)
                | Op::postfix(Rule::is_instance_of_suffix)
                | Op::postfix(Rule::is_kind_of_suffix)
                | Op::postfix(Rule::index_suffix),
        )
});

/// Source text of a binary operator rule.
pub(super) const fn operator_symbol(rule: Rule) -> Option<&'static str> {
    Some(match rule {
        Rule::op_or => "||",
        Rule::op_and => "&&",
        Rule::op_bit_or => "|",
        Rule::op_bit_xor => "^",
        Rule::op_bit_and => "&",
        Rule::op_eq => "==",
        Rule::op_ne => "!=",
        Rule::op_shl => "<<",
        Rule::op_le => "<=",
        Rule::op_lt => "<",
        Rule::op_shr_logical => ">>>",
        Rule::op_shr => ">>",
        Rule::op_ge => ">=",
        Rule::op_gt => ">",
        Rule::op_add => "+",
        Rule::op_sub => "-",
        Rule::op_mul => "*",
        Rule::op_div => "/",
        Rule::op_rem => "%",
        _ => return None,
    })
}

/// Node kind for rules that appear in the tree as themselves.
const fn node_kind(rule: Rule) -> Option<&'static str> {
    Some(match rule {
        Rule::source_file => "source_file",
        Rule::header_file => "header_file",
        Rule::code_file => "code_file",
        Rule::uses_statement => "uses_statement",
        Rule::package_id => "package_id",
        Rule::package_string => "package_string",
        Rule::renaming_statement => "renaming_statement",
        Rule::rename_statement => "rename_statement",
        Rule::constant_definition => "constant_definition",
        Rule::error_definition => "error_definition",
        Rule::variable_declarations => "variable_declarations",
        Rule::variable_declaration => "variable_declaration",
        Rule::declaration => "declaration",
        Rule::enumeration => "enumeration",
        Rule::type_definition => "type_definition",
        Rule::functions_prototypes => "functions_prototypes",
        Rule::functions_prototype => "functions_prototype",
        Rule::external => "external",
        Rule::function_prototype => "function_prototype",
        Rule::function_definition => "function_definition",
        Rule::interface_definition => "interface_definition",
        Rule::extends_definition => "extends_definition",
        Rule::messages_definition => "messages_definition",
        Rule::class_definition => "class_definition",
        Rule::implements_definition => "implements_definition",
        Rule::superclass_definition => "superclass_definition",
        Rule::fields_definition => "fields_definition",
        Rule::methods_definition => "methods_definition",
        Rule::behavior_definition => "behavior_definition",
        Rule::method_definition => "method_definition",
        Rule::infix_definition => "infix_definition",
        Rule::prefix_definition => "prefix_definition",
        Rule::identifiers_definition => "identifiers_definition",
        Rule::identifier_definition => "identifier_definition",
        Rule::parameters_definition => "parameters_definition",
        Rule::return_definition => "return_definition",
        Rule::parameter_list => "parameter_list",
        Rule::arg_list => "arg_list",
        Rule::type_parameters => "type_parameters",
        Rule::type_expr => "type",
        Rule::primitive_type => "primitive_type",
        Rule::pointer_type => "pointer_type",
        Rule::array_type => "array_type",
        Rule::dimension => "dimension",
        Rule::record_type => "record_type",
        Rule::named_type => "named_type",
        Rule::statement_list => "statement_list",
        Rule::if_statement => "if_statement",
        Rule::else_if_clause => "else_if_clause",
        Rule::else_clause => "else_clause",
        Rule::while_loop => "while_loop",
        Rule::until_loop => "until_loop",
        Rule::for_loop => "for_loop",
        Rule::switch_statement => "switch_statement",
        Rule::case_clause => "case_clause",
        Rule::default_clause => "default_clause",
        Rule::try_statement => "try_statement",
        Rule::catch_clause => "catch_clause",
        Rule::throw_statement => "throw_statement",
        Rule::free_statement => "free_statement",
        Rule::return_statement => "return_statement",
        Rule::break_statement => "break_statement",
        Rule::continue_statement => "continue_statement",
        Rule::debug_statement => "debug_statement",
        Rule::variable_assignment => "variable_assignment",
        Rule::l_value => "l_value",
        Rule::parenthesized_expression => "parenthesized_expression",
        Rule::null_lit => "null",
        Rule::true_lit => "true",
        Rule::false_lit => "false",
        Rule::self_lit => "self",
        Rule::super_lit => "super",
        Rule::nameless_function => "nameless_function",
        Rule::new_expression => "new_expression",
        Rule::alloc_expression => "alloc_expression",
        Rule::size_of_expression => "size_of_expression",
        Rule::call_expression => "call_expression",
        Rule::constructor => "constructor",
        Rule::class_record_init => "class_record_init",
        Rule::array_init => "array_init",
        Rule::repeated_element => "repeated_element",
        Rule::operator | Rule::prefix_op => "operator",
        Rule::identifier => "identifier",
        Rule::integer => "integer",
        Rule::double => "double",
        Rule::char => "char",
        Rule::string => "string",
        _ => return None,
    })
}

/// Node kind produced when a postfix operator is applied.
const fn postfix_kind(rule: Rule) -> &'static str {
    match rule {
        Rule::method_call_suffix => "method_call",
        Rule::field_suffix => "field_access",
        Rule::as_pointer_suffix => "as_pointer",
        Rule::as_integer_suffix => "as_integer",
        Rule::array_size_suffix => "array_size",
        Rule::is_instance_of_suffix => "is_instance_of",
        Rule::is_kind_of_suffix => "is_kind_of",
        Rule::index_suffix => "array_access",
        _ => unreachable!(),
    }
}

/// Turns pest pairs into engine subtrees.
///
/// Rules without a node kind are transparent: their children are spliced into
/// the parent, and tokens (keywords, `EOI`) disappear.
pub(super) struct Converter {
    pratt: &'static PrattParser<Rule>,
}

impl Converter {
    pub(super) fn new() -> Self {
        Self { pratt: &PRATT }
    }

    /// Convert a pair that maps to exactly one node.
    pub(super) fn node(&self, pair: Pair<'_, Rule>) -> Subtree {
        let mut out = Vec::with_capacity(1);
        self.push(pair, &mut out);
        debug_assert_eq!(out.len(), 1);
        match out.pop() {
            Some(node) => node,
            None => unreachable!(),
        }
    }

    fn push(&self, pair: Pair<'_, Rule>, out: &mut Vec<Subtree>) {
        match pair.as_rule() {
            Rule::expression => out.push(self.expression(pair)),
            Rule::infix_chain => out.push(self.infix_chain(pair.into_inner())),
            rule => {
                let span = pair.as_span();
                match node_kind(rule) {
                    Some(kind) => {
                        let children = self.children(pair.into_inner());
                        out.push(Subtree::new(kind, span.start(), span.end(), children));
                    }
                    None => {
                        for inner in pair.into_inner() {
                            self.push(inner, out);
                        }
                    }
                }
            }
        }
    }

    fn children(&self, pairs: Pairs<'_, Rule>) -> Vec<Subtree> {
        let mut out = Vec::new();
        for pair in pairs {
            self.push(pair, &mut out);
        }
        out
    }

    /// `recv sel: arg sel: arg ...` or a plain infix chain.
    fn expression(&self, pair: Pair<'_, Rule>) -> Subtree {
        let span = pair.as_span();
        let mut parts = self.children(pair.into_inner());
        if parts.len() == 1
            && let Some(only) = parts.pop()
        {
            return only;
        }
        Subtree::new("keyword_message", span.start(), span.end(), parts)
    }

    fn infix_chain(&self, pairs: Pairs<'_, Rule>) -> Subtree {
        self.pratt
            .map_primary(|p| self.node(p))
            .map_prefix(|op, rhs| {
                let span = op.as_span();
                let start = span.start();
                let end = rhs.end_byte;
                let op = Subtree::leaf("operator", span.start(), span.end());
                Subtree::new("unary_expression", start, end, vec![op, rhs])
            })
            .map_postfix(|lhs, op| {
                let kind = postfix_kind(op.as_rule());
                let start = lhs.start_byte;
                let end = op.as_span().end();
                let mut children = vec![lhs];
                children.extend(self.children(op.into_inner()));
                Subtree::new(kind, start, end, children)
            })
            .map_infix(|lhs, op, rhs| {
                let span = op.as_span();
                let start = lhs.start_byte;
                let end = rhs.end_byte;
                let op = Subtree::leaf("operator", span.start(), span.end());
                Subtree::new("binary_expression", start, end, vec![lhs, op, rhs])
            })
            .parse(pairs)
    }
}
