//! A cheap, non-mutating pre-check: does this subtree contain a lambda
//! expression anywhere?
//!
//! The conversion pass decides whether a function or loop body needs a
//! synthesized environment before it has finished walking that body (an
//! environment, once introduced, has to be declared at the very top of the
//! body, ahead of whatever statement first captures into it). Waiting until
//! the body is fully walked to know the exact captured-field set would mean
//! a second pass over the same statements. Instead, any scope that contains
//! a lambda anywhere in its subtree is conservatively given an environment;
//! most end up holding at least one capture or pass-through copy, and the
//! rare one that holds neither is simply an empty struct.

use std::collections::HashSet;

use crate::parser::ast::{Array, Block, Expression, Postfix, Statement};
use crate::typechecker::typed_ast::expression::lambda::{get_lambda_captures, lambda_capture_id};

pub fn block_contains_lambda<T>(block: &Block<T>) -> bool {
    block.statements.iter().any(statement_contains_lambda)
}

pub fn statement_contains_lambda<T>(statement: &Statement<T>) -> bool {
    match statement {
        Statement::Expression(expr) | Statement::YieldingExpression(expr) | Statement::Return(expr) => {
            expression_contains_lambda(expr)
        }
        Statement::Initialization(init) => expression_contains_lambda(&init.value),
        Statement::Constant(constant) => expression_contains_lambda(&constant.value),
        Statement::Assignment(assignment) => expression_contains_lambda(&assignment.rvalue),
        Statement::If(if_expr) => {
            expression_contains_lambda(&if_expr.condition)
                || block_contains_lambda(&if_expr.then_block)
                || block_contains_lambda(&if_expr.else_block)
        }
        Statement::WhileLoop(while_loop) => {
            expression_contains_lambda(&while_loop.condition) || block_contains_lambda(&while_loop.block)
        }
        Statement::Function(function) => block_contains_lambda(&function.body),
        Statement::Comment(_) | Statement::Declaration(_) | Statement::StructDeclaration(_) => false,
    }
}

pub fn expression_contains_lambda<T>(expr: &Expression<T>) -> bool {
    match expr {
        Expression::Lambda(_) => true,
        Expression::Id(_)
        | Expression::Num(_)
        | Expression::Bool(_)
        | Expression::Character(_)
        | Expression::AstString(_) => false,
        Expression::Function(function) => block_contains_lambda(&function.body),
        Expression::If(if_expr) => {
            expression_contains_lambda(&if_expr.condition)
                || block_contains_lambda(&if_expr.then_block)
                || block_contains_lambda(&if_expr.else_block)
        }
        Expression::Block(block) => block_contains_lambda(block),
        Expression::Parens(inner) => expression_contains_lambda(inner),
        Expression::Postfix(postfix) => match postfix {
            Postfix::Call { expr, args, .. } => {
                expression_contains_lambda(expr) || args.iter().any(expression_contains_lambda)
            }
            Postfix::Index { expr, index, .. } => {
                expression_contains_lambda(expr) || expression_contains_lambda(index)
            }
            Postfix::PropertyAccess { expr, .. } => expression_contains_lambda(expr),
        },
        Expression::Prefix(prefix) => match prefix {
            crate::parser::ast::Prefix::Negation { expr, .. } => expression_contains_lambda(expr),
            crate::parser::ast::Prefix::Minus { expr, .. } => expression_contains_lambda(expr),
        },
        Expression::Binary(binary) => {
            expression_contains_lambda(&binary.left) || expression_contains_lambda(&binary.right)
        }
        Expression::Array(array) => match array {
            Array::Literal { values, .. } => values.iter().any(expression_contains_lambda),
            Array::Default { initial_value, .. } => expression_contains_lambda(initial_value),
        },
        Expression::StructInitialisation(struct_init) => struct_init
            .fields
            .iter()
            .any(|field| expression_contains_lambda(&field.value)),
    }
}

/// Every name captured by a lambda anywhere in this subtree, found by the
/// same traversal as `block_contains_lambda` but collecting rather than
/// short-circuiting, and independent of which scope actually defines each
/// name. A definition's `captured` flag is decided from this set *before*
/// its own scope's statements are lowered, so a read earlier in program
/// order than the lambda that captures it is still rewritten correctly --
/// `propagate_capture`, which only runs once the capturing lambda is
/// reached, would be too late for that earlier read.
pub fn collect_capture_names<T>(block: &Block<T>) -> HashSet<String> {
    let mut names = HashSet::new();
    block_capture_names(block, &mut names);
    names
}

/// Same as `collect_capture_names`, but for a lambda body, which is a bare
/// `Expression` rather than a `Block` when it has no braces.
pub fn collect_capture_names_of_expression<T>(expr: &Expression<T>) -> HashSet<String> {
    let mut names = HashSet::new();
    expression_capture_names(expr, &mut names);
    names
}

fn block_capture_names<T>(block: &Block<T>, names: &mut HashSet<String>) {
    for statement in &block.statements {
        statement_capture_names(statement, names);
    }
}

fn statement_capture_names<T>(statement: &Statement<T>, names: &mut HashSet<String>) {
    match statement {
        Statement::Expression(expr) | Statement::YieldingExpression(expr) | Statement::Return(expr) => {
            expression_capture_names(expr, names)
        }
        Statement::Initialization(init) => expression_capture_names(&init.value, names),
        Statement::Constant(constant) => expression_capture_names(&constant.value, names),
        Statement::Assignment(assignment) => expression_capture_names(&assignment.rvalue, names),
        Statement::If(if_expr) => {
            expression_capture_names(&if_expr.condition, names);
            block_capture_names(&if_expr.then_block, names);
            block_capture_names(&if_expr.else_block, names);
        }
        Statement::WhileLoop(while_loop) => {
            expression_capture_names(&while_loop.condition, names);
            block_capture_names(&while_loop.block, names);
        }
        Statement::Function(function) => block_capture_names(&function.body, names),
        Statement::Comment(_) | Statement::Declaration(_) | Statement::StructDeclaration(_) => {}
    }
}

fn expression_capture_names<T>(expr: &Expression<T>, names: &mut HashSet<String>) {
    match expr {
        Expression::Lambda(lambda) => {
            if let Some(captures) = get_lambda_captures(&lambda_capture_id(&lambda.position)) {
                names.extend(captures.captures.into_iter().map(|(name, _)| name));
            }
            expression_capture_names(&lambda.expression, names);
        }
        Expression::Id(_)
        | Expression::Num(_)
        | Expression::Bool(_)
        | Expression::Character(_)
        | Expression::AstString(_) => {}
        Expression::Function(function) => block_capture_names(&function.body, names),
        Expression::If(if_expr) => {
            expression_capture_names(&if_expr.condition, names);
            block_capture_names(&if_expr.then_block, names);
            block_capture_names(&if_expr.else_block, names);
        }
        Expression::Block(block) => block_capture_names(block, names),
        Expression::Parens(inner) => expression_capture_names(inner, names),
        Expression::Postfix(postfix) => match postfix {
            Postfix::Call { expr, args, .. } => {
                expression_capture_names(expr, names);
                for arg in args {
                    expression_capture_names(arg, names);
                }
            }
            Postfix::Index { expr, index, .. } => {
                expression_capture_names(expr, names);
                expression_capture_names(index, names);
            }
            Postfix::PropertyAccess { expr, .. } => expression_capture_names(expr, names),
        },
        Expression::Prefix(prefix) => match prefix {
            crate::parser::ast::Prefix::Negation { expr, .. } => expression_capture_names(expr, names),
            crate::parser::ast::Prefix::Minus { expr, .. } => expression_capture_names(expr, names),
        },
        Expression::Binary(binary) => {
            expression_capture_names(&binary.left, names);
            expression_capture_names(&binary.right, names);
        }
        Expression::Array(array) => match array {
            Array::Literal { values, .. } => {
                for value in values {
                    expression_capture_names(value, names);
                }
            }
            Array::Default { initial_value, .. } => expression_capture_names(initial_value, names),
        },
        Expression::StructInitialisation(struct_init) => {
            for field in &struct_init.fields {
                expression_capture_names(&field.value, names);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_helpers::parse_statement;

    #[test]
    fn plain_let_has_no_lambda() {
        let stmt = parse_statement("let x = 1;").unwrap();
        assert!(!statement_contains_lambda(&stmt));
    }

    #[test]
    fn let_bound_lambda_is_found() {
        let stmt = parse_statement("let f = \\(x: i32) => x + 1;").unwrap();
        assert!(statement_contains_lambda(&stmt));
    }

    #[test]
    fn lambda_nested_inside_if_branch_is_found() {
        let stmt = parse_statement("if (true) { let f = \\(x: i32) => x; } else {}").unwrap();
        assert!(statement_contains_lambda(&stmt));
    }

    #[test]
    fn lambda_inside_call_argument_is_found() {
        let stmt = parse_statement("doSomething(\\(x: i32) => x);").unwrap();
        assert!(statement_contains_lambda(&stmt));
    }
}
