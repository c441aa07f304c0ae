
use parse::{is_ident, is_number, parse, rhs};
use transmat_parser::{BinOp, Expr, ParseError, UnOp};

fn rows(expr: Expr) -> Vec<Vec<Expr>> {
    match expr {
        Expr::Matrix(rows, _) | Expr::CellArray(rows, _) => rows,
        other => panic!("expected a literal, got {other:?}"),
    }
}

#[test]
fn rows_split_on_semicolons() {
    let rows = rows(rhs("m = [1 2; 3 4];"));
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.len() == 2));
    assert!(is_number(&rows[1][0], "3"));
}

#[test]
fn rows_split_on_newlines() {
    let rows = rows(rhs("m = [1, 2\n 3, 4];"));
    assert_eq!(rows.len(), 2);
}

#[test]
fn spaced_minus_is_subtraction() {
    let rows = rows(rhs("m = [1 - 2];"));
    assert_eq!(rows[0].len(), 1);
    assert!(matches!(rows[0][0], Expr::Binary(_, BinOp::Sub, _, _)));
}

#[test]
fn hugging_minus_starts_a_new_element() {
    let rows = rows(rhs("m = [1 -2];"));
    assert_eq!(rows[0].len(), 2);
    assert!(matches!(rows[0][1], Expr::Unary(UnOp::Minus, _, _)));
}

#[test]
fn unspaced_minus_is_subtraction() {
    let rows = rows(rhs("m = [a-b];"));
    assert_eq!(rows[0].len(), 1);
}

#[test]
fn spaced_paren_starts_a_new_element() {
    let rows = rows(rhs("m = [a (1)];"));
    assert_eq!(rows[0].len(), 2);
    assert!(is_ident(&rows[0][0], "a"));
    assert!(matches!(rows[0][1], Expr::Parens(..)));
}

#[test]
fn call_inside_matrix() {
    let rows = rows(rhs("m = [f(1) 2];"));
    assert_eq!(rows[0].len(), 2);
    assert!(matches!(rows[0][0], Expr::FuncCall(_)));
}

#[test]
fn whitespace_rules_do_not_apply_inside_parentheses() {
    let rows = rows(rhs("m = [f(1 -2)];"));
    match &rows[0][0] {
        Expr::FuncCall(call) => {
            assert_eq!(call.args.len(), 1);
            assert!(matches!(call.args[0], Expr::Binary(_, BinOp::Sub, _, _)));
        }
        other => panic!("unexpected element: {other:?}"),
    }
}

#[test]
fn empty_literals() {
    assert!(rows(rhs("m = [];")).is_empty());
    assert!(rows(rhs("c = {};")).is_empty());
}

#[test]
fn trailing_separators_are_dropped() {
    let rows = rows(rhs("m = [1 2;];"));
    assert_eq!(rows.len(), 1);
}

#[test]
fn cell_literal_with_nested_values() {
    match rhs("c = {1, 'two'; [3 4], {}};") {
        Expr::CellArray(rows, _) => {
            assert_eq!(rows.len(), 2);
            assert!(matches!(rows[0][1], Expr::String(ref s, _) if s == "two"));
            assert!(matches!(rows[1][0], Expr::Matrix(..)));
            assert!(matches!(rows[1][1], Expr::CellArray(..)));
        }
        other => panic!("unexpected expression: {other:?}"),
    }
}

#[test]
fn doubled_comma_is_rejected() {
    assert!(matches!(parse("m = [1,,2];"), Err(ParseError::Syntax(_))));
}

#[test]
fn unterminated_matrix_reaches_end_of_input() {
    match parse("m = [1 2") {
        Err(ParseError::Syntax(err)) => assert!(err.is_unexpected_eof()),
        other => panic!("expected syntax error, got {other:?}"),
    }
}
