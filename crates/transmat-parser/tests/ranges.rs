
use parse::{is_ident, is_number, rhs};
use transmat_parser::{BinOp, Expr};

#[test]
fn two_part_range() {
    match rhs("a = 1:10;") {
        Expr::Range {
            start, step, stop, ..
        } => {
            assert!(is_number(&start, "1"));
            assert!(step.is_none());
            assert!(is_number(&stop, "10"));
        }
        other => panic!("unexpected expression: {other:?}"),
    }
}

#[test]
fn chained_colons_form_one_stepped_range() {
    match rhs("a = 1:2:10;") {
        Expr::Range {
            start,
            step: Some(step),
            stop,
            pos,
        } => {
            assert!(is_number(&start, "1"));
            assert!(is_number(&step, "2"));
            assert!(is_number(&stop, "10"));
            // first colon
            assert_eq!(pos.offset, 5);
        }
        other => panic!("unexpected expression: {other:?}"),
    }
}

#[test]
fn parenthesized_range_is_not_extended() {
    match rhs("a = (1:2):3;") {
        Expr::Range {
            start, step, stop, ..
        } => {
            assert!(matches!(*start, Expr::Parens(ref inner, _) if matches!(**inner, Expr::Range { .. })));
            assert!(step.is_none());
            assert!(is_number(&stop, "3"));
        }
        other => panic!("unexpected expression: {other:?}"),
    }
}

#[test]
fn range_bounds_take_arithmetic() {
    match rhs("a = 0:n+1;") {
        Expr::Range { start, stop, .. } => {
            assert!(is_number(&start, "0"));
            assert!(matches!(*stop, Expr::Binary(ref l, BinOp::Add, _, _) if is_ident(l, "n")));
        }
        other => panic!("unexpected expression: {other:?}"),
    }
}

#[test]
fn range_as_subscript() {
    match rhs("b = x(2:end);") {
        Expr::FuncCall(call) => {
            assert_eq!(call.args.len(), 1);
            assert!(matches!(&call.args[0], Expr::Range { stop, .. } if matches!(**stop, Expr::End(_))));
        }
        other => panic!("unexpected expression: {other:?}"),
    }
}
