/// Recursive decomposition of Go statements into `StatementNode` trees.
use tree_sitter::Node as TsNode;

use crate::source::{block_statements, field_children, named_children, SourceFile};
use crate::types::{BranchKind, StatementKind, StatementNode};

/// Converts statement lists into structured statement trees.
pub struct StatementDecomposer;

impl StatementDecomposer {
    /// Decomposes an ordered statement list. The output has exactly one
    /// root per input statement.
    pub fn decompose(file: &SourceFile, statements: &[TsNode<'_>]) -> Vec<StatementNode> {
        statements
            .iter()
            .map(|stmt| Self::decompose_one(file, *stmt))
            .collect()
    }

    /// Decomposes the statements of a `block` (or any block-like node).
    pub fn decompose_block(file: &SourceFile, block: TsNode<'_>) -> Vec<StatementNode> {
        Self::decompose(file, &block_statements(block))
    }

    /// Decomposes a single statement.
    pub fn decompose_one(file: &SourceFile, node: TsNode<'_>) -> StatementNode {
        let kind = match node.kind() {
            "assignment_statement" | "short_var_declaration" => StatementKind::Assignment,
            "block" => StatementKind::Block,
            "break_statement" => StatementKind::Branch(BranchKind::Break),
            "continue_statement" => StatementKind::Branch(BranchKind::Continue),
            "goto_statement" => StatementKind::Branch(BranchKind::Goto),
            "fallthrough_statement" => StatementKind::Branch(BranchKind::Fallthrough),
            "var_declaration" | "const_declaration" | "type_declaration" => StatementKind::Declaration,
            "expression_statement" => StatementKind::Expression,
            "for_statement" => StatementKind::For,
            "if_statement" => StatementKind::If,
            "inc_statement" | "dec_statement" => StatementKind::IncDec,
            "return_statement" => StatementKind::Return,
            "expression_switch_statement" => StatementKind::Switch,
            "type_switch_statement" => StatementKind::TypeSwitch,
            "select_statement" => StatementKind::Select,
            "go_statement" => StatementKind::Go,
            "defer_statement" => StatementKind::Defer,
            "labeled_statement" => StatementKind::Labeled,
            "send_statement" => StatementKind::Send,
            "empty_statement" => StatementKind::Empty,
            other => StatementKind::Other(other.to_string()),
        };
        let mut out = StatementNode::new(kind, file.node_text(node).to_string(), file.position(node));

        match out.kind.clone() {
            StatementKind::Assignment => Self::fill_assignment(file, node, &mut out),
            StatementKind::Block => out.children = Self::decompose_block(file, node),
            StatementKind::Branch(_) => {
                out.label = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "label_name")
                    .map(|l| file.node_text(l).to_string());
            }
            StatementKind::Declaration => Self::fill_declaration(file, node, &mut out),
            StatementKind::Expression => {
                if let Some(expr) = named_children(node).into_iter().next() {
                    let expr = unparenthesize(expr);
                    if expr.kind() == "call_expression" {
                        out.kind = StatementKind::FunctionCall;
                    }
                    out.callee_names = collect_calls(file, expr);
                }
            }
            StatementKind::For => Self::fill_loop(file, node, &mut out),
            StatementKind::If => Self::fill_conditional(file, node, &mut out),
            StatementKind::IncDec => {
                if let Some(target) = named_children(node).into_iter().next() {
                    out.touched_variables.push(file.node_text(target).to_string());
                }
                let op = if node.kind() == "inc_statement" { "++" } else { "--" };
                out.operator = Some(op.to_string());
            }
            StatementKind::Return => {
                for list in named_children(node) {
                    let exprs = if list.kind() == "expression_list" {
                        named_children(list)
                    } else {
                        vec![list]
                    };
                    for expr in exprs {
                        out.values.push(file.node_text(expr).to_string());
                        out.callee_names.extend(collect_calls(file, expr));
                    }
                }
            }
            StatementKind::Switch | StatementKind::TypeSwitch | StatementKind::Select => {
                Self::fill_switch(file, node, &mut out)
            }
            StatementKind::Go | StatementKind::Defer => {
                out.callee_names = collect_calls(file, node);
            }
            StatementKind::Labeled => {
                out.label = node
                    .child_by_field_name("label")
                    .map(|l| file.node_text(l).to_string());
                for child in named_children(node) {
                    if child.kind() != "label_name" {
                        out.children.push(Self::decompose_one(file, child));
                    }
                }
            }
            StatementKind::Send => {
                if let Some(channel) = node.child_by_field_name("channel") {
                    out.touched_variables.push(file.node_text(channel).to_string());
                }
                if let Some(value) = node.child_by_field_name("value") {
                    out.values.push(file.node_text(value).to_string());
                }
                out.callee_names = collect_calls(file, node);
            }
            StatementKind::Empty | StatementKind::Other(_) => {}
            // Produced only as children of the statements handled above.
            StatementKind::FunctionCall
            | StatementKind::Range
            | StatementKind::Else
            | StatementKind::Case
            | StatementKind::DefaultCase => {}
        }
        out
    }

    fn fill_assignment(file: &SourceFile, node: TsNode<'_>, out: &mut StatementNode) {
        if let Some(left) = node.child_by_field_name("left") {
            out.touched_variables = expression_texts(file, left);
        }
        if let Some(right) = node.child_by_field_name("right") {
            out.values = expression_texts(file, right);
            out.callee_names = collect_calls(file, right);
        }
        out.operator = Some(match node.child_by_field_name("operator") {
            Some(op) => file.node_text(op).to_string(),
            None if node.kind() == "short_var_declaration" => ":=".to_string(),
            None => "=".to_string(),
        });
    }

    /// Local `var`/`const`/`type` declarations record their names.
    fn fill_declaration(file: &SourceFile, node: TsNode<'_>, out: &mut StatementNode) {
        let mut specs = Vec::new();
        collect_local_specs(node, &mut specs);
        for spec in specs {
            for name in field_children(spec, "name") {
                out.touched_variables.push(file.node_text(name).to_string());
            }
            if let Some(value) = spec.child_by_field_name("value") {
                out.values.extend(expression_texts(file, value));
                out.callee_names.extend(collect_calls(file, value));
            }
        }
    }

    /// `for` loops: three-clause, condition-only, infinite, and range.
    fn fill_loop(file: &SourceFile, node: TsNode<'_>, out: &mut StatementNode) {
        let body = node.child_by_field_name("body");
        let header = named_children(node)
            .into_iter()
            .find(|c| Some(*c) != body);

        if let Some(header) = header {
            match header.kind() {
                "for_clause" => {
                    if let Some(init) = header.child_by_field_name("initializer") {
                        out.touched_variables.extend(assigned_names(file, init));
                        out.callee_names.extend(collect_calls(file, init));
                    }
                    if let Some(cond) = header.child_by_field_name("condition") {
                        out.conditions.push(file.node_text(cond).to_string());
                        out.callee_names.extend(collect_calls(file, cond));
                    }
                    if let Some(update) = header.child_by_field_name("update") {
                        out.values.push(file.node_text(update).to_string());
                    }
                }
                "range_clause" => {
                    out.kind = StatementKind::Range;
                    if let Some(left) = header.child_by_field_name("left") {
                        out.touched_variables = expression_texts(file, left);
                    }
                    if let Some(right) = header.child_by_field_name("right") {
                        out.conditions
                            .push(format!("range {}", file.node_text(right)));
                        out.callee_names.extend(collect_calls(file, right));
                    }
                }
                _ => {
                    out.conditions.push(file.node_text(header).to_string());
                    out.callee_names.extend(collect_calls(file, header));
                }
            }
        }

        if let Some(body) = body {
            out.children = Self::decompose_block(file, body);
        }
    }

    /// `if` statements; the else branch becomes a trailing `Else` child.
    fn fill_conditional(file: &SourceFile, node: TsNode<'_>, out: &mut StatementNode) {
        if let Some(init) = node.child_by_field_name("initializer") {
            out.touched_variables.extend(assigned_names(file, init));
            out.callee_names.extend(collect_calls(file, init));
        }
        if let Some(cond) = node.child_by_field_name("condition") {
            out.conditions.push(file.node_text(cond).to_string());
            out.callee_names.extend(collect_calls(file, cond));
        }
        if let Some(then) = node.child_by_field_name("consequence") {
            out.children = Self::decompose_block(file, then);
        }
        if let Some(alt) = node.child_by_field_name("alternative") {
            let mut else_node =
                StatementNode::new(StatementKind::Else, file.node_text(alt).to_string(), file.position(alt));
            else_node.children = if alt.kind() == "block" {
                Self::decompose_block(file, alt)
            } else {
                vec![Self::decompose_one(file, alt)]
            };
            out.children.push(else_node);
        }
    }

    /// Expression switches, type switches and selects.
    fn fill_switch(file: &SourceFile, node: TsNode<'_>, out: &mut StatementNode) {
        if let Some(init) = node.child_by_field_name("initializer") {
            out.touched_variables.extend(assigned_names(file, init));
            out.callee_names.extend(collect_calls(file, init));
        }
        if let Some(alias) = node.child_by_field_name("alias") {
            out.touched_variables.extend(expression_texts(file, alias));
        }
        if let Some(value) = node.child_by_field_name("value") {
            out.conditions.push(file.node_text(value).to_string());
            out.callee_names.extend(collect_calls(file, value));
        }

        for clause in named_children(node) {
            let kind = match clause.kind() {
                "expression_case" | "type_case" | "communication_case" => StatementKind::Case,
                "default_case" => StatementKind::DefaultCase,
                _ => continue,
            };
            let mut case =
                StatementNode::new(kind, file.node_text(clause).to_string(), file.position(clause));

            // Case heads are not statements of the clause body.
            let mut heads = Vec::new();
            for field in ["value", "type", "communication"] {
                heads.extend(field_children(clause, field));
            }
            for head in &heads {
                if head.kind() == "expression_list" {
                    case.conditions.extend(expression_texts(file, *head));
                } else {
                    case.conditions.push(file.node_text(*head).to_string());
                }
                case.callee_names.extend(collect_calls(file, *head));
            }
            let body: Vec<TsNode<'_>> = block_statements(clause)
                .into_iter()
                .filter(|stmt| !heads.contains(stmt))
                .collect();
            case.children = Self::decompose(file, &body);
            out.children.push(case);
        }
    }
}

/// Callee of a call expression as written: `name`, `x.name`, or the
/// operand text for anything more complex. Function literals are `func`.
pub fn callee_text(file: &SourceFile, function: TsNode<'_>) -> String {
    match function.kind() {
        "func_literal" => "func".to_string(),
        "parenthesized_expression" => match named_children(function).into_iter().next() {
            Some(inner) => callee_text(file, inner),
            None => file.node_text(function).to_string(),
        },
        _ => file
            .node_text(function)
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
    }
}

/// Callee names of every call nested under `node`, outermost first.
/// Function literal bodies are not entered.
pub fn collect_calls(file: &SourceFile, node: TsNode<'_>) -> Vec<String> {
    let mut out = Vec::new();
    collect_calls_into(file, node, &mut out);
    out
}

fn collect_calls_into(file: &SourceFile, node: TsNode<'_>, out: &mut Vec<String>) {
    match node.kind() {
        "func_literal" => {}
        "call_expression" => {
            if let Some(function) = node.child_by_field_name("function") {
                out.push(callee_text(file, function));
                collect_calls_into(file, function, out);
            }
            if let Some(args) = node.child_by_field_name("arguments") {
                collect_calls_into(file, args, out);
            }
        }
        _ => {
            for child in named_children(node) {
                collect_calls_into(file, child, out);
            }
        }
    }
}

fn unparenthesize(node: TsNode<'_>) -> TsNode<'_> {
    if node.kind() == "parenthesized_expression" {
        if let Some(inner) = named_children(node).into_iter().next() {
            return unparenthesize(inner);
        }
    }
    node
}

/// Texts of the expressions in an expression_list (or of a lone expression).
fn expression_texts(file: &SourceFile, node: TsNode<'_>) -> Vec<String> {
    if node.kind() == "expression_list" {
        named_children(node)
            .into_iter()
            .map(|e| file.node_text(e).to_string())
            .collect()
    } else {
        vec![file.node_text(node).to_string()]
    }
}

/// Names introduced or assigned by an initializer simple statement.
fn assigned_names(file: &SourceFile, init: TsNode<'_>) -> Vec<String> {
    match init.kind() {
        "short_var_declaration" | "assignment_statement" => init
            .child_by_field_name("left")
            .map(|left| expression_texts(file, left))
            .unwrap_or_default(),
        "inc_statement" | "dec_statement" => named_children(init)
            .into_iter()
            .next()
            .map(|t| vec![file.node_text(t).to_string()])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn collect_local_specs<'a>(node: TsNode<'a>, out: &mut Vec<TsNode<'a>>) {
    for child in named_children(node) {
        match child.kind() {
            "const_spec" | "var_spec" | "type_spec" | "type_alias" => out.push(child),
            "var_spec_list" => collect_local_specs(child, out),
            _ => {}
        }
    }
}
