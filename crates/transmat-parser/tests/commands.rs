
use parse::{is_ident, parse, parse_strict};
use transmat_parser::{Expr, FuncCall, LValue, ParseError, Stmt};

fn call(src: &str) -> FuncCall {
    let program = parse(src).unwrap();
    match program.body.into_iter().next() {
        Some(Stmt::Call(call)) => call,
        other => panic!("expected call statement, got {other:?}"),
    }
}

fn string_args(call: &FuncCall) -> Vec<&str> {
    call.args
        .iter()
        .map(|arg| match arg {
            Expr::String(s, _) => s.as_str(),
            other => panic!("expected string argument, got {other:?}"),
        })
        .collect()
}

#[test]
fn words_become_string_arguments() {
    let c = call("hold on");
    assert!(is_ident(&c.callee, "hold"));
    assert_eq!(string_args(&c), vec!["on"]);
    assert!(c.ret.is_none());
}

#[test]
fn several_words() {
    let c = call("format long g;");
    assert_eq!(string_args(&c), vec!["long", "g"]);
}

#[test]
fn quoted_word_is_unquoted() {
    let c = call("disp 'hello world'");
    assert_eq!(string_args(&c), vec!["hello world"]);
}

#[test]
fn keyword_word() {
    let c = call("clear global");
    assert_eq!(string_args(&c), vec!["global"]);
}

#[test]
fn load_with_variable_names_assigns_them() {
    let c = call("load data x y");
    assert!(is_ident(&c.callee, "load"));
    assert_eq!(string_args(&c), vec!["data"]);
    let names: Vec<&str> = c
        .ret
        .as_ref()
        .unwrap()
        .iter()
        .map(|lv| match lv {
            LValue::Var(id) => id.name.as_str(),
            other => panic!("unexpected target: {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn load_file_name_with_extension_is_one_word() {
    let c = call("load data.mat x y");
    assert!(is_ident(&c.callee, "load"));
    assert_eq!(string_args(&c), vec!["data.mat"]);
    let ret = c.ret.as_ref().unwrap();
    assert_eq!(ret.len(), 2);
    assert!(matches!(&ret[0], LValue::Var(id) if id.name == "x"));
    assert!(matches!(&ret[1], LValue::Var(id) if id.name == "y"));
    match &c.args[0] {
        Expr::String(_, pos) => assert_eq!(pos.offset, 5),
        other => panic!("expected string argument, got {other:?}"),
    }
}

#[test]
fn adjacent_tokens_join_into_one_word() {
    let c = call("save results.mat a");
    assert_eq!(string_args(&c), vec!["results.mat", "a"]);
    assert!(c.ret.is_none());
}

#[test]
fn dotted_word_cannot_receive_a_loaded_variable() {
    assert!(matches!(
        parse("load data.mat s.x"),
        Err(ParseError::InvalidTarget { .. })
    ));
}

#[test]
fn field_access_is_not_a_command() {
    let program = parse("s.x").unwrap();
    assert!(matches!(&program.body[0], Stmt::ExprStmt(Expr::GetField(..), _)));
}

#[test]
fn load_with_only_a_file_is_a_plain_command() {
    let c = call("load data");
    assert_eq!(string_args(&c), vec!["data"]);
    assert!(c.ret.is_none());
}

#[test]
fn load_function_form_is_untouched() {
    let program = parse("load('f.mat');").unwrap();
    assert!(matches!(&program.body[0], Stmt::ExprStmt(Expr::FuncCall(c), _) if c.ret.is_none()));
}

#[test]
fn load_into_a_number_is_invalid() {
    assert!(matches!(
        parse("load data 3"),
        Err(ParseError::InvalidTarget { .. })
    ));
}

#[test]
fn operators_prevent_command_reading() {
    let program = parse("a - b").unwrap();
    assert!(matches!(&program.body[0], Stmt::ExprStmt(Expr::Binary(..), _)));
    let program = parse("x").unwrap();
    assert!(matches!(&program.body[0], Stmt::ExprStmt(e, _) if is_ident(e, "x")));
}

#[test]
fn command_inside_block() {
    let program = parse("if x\n  hold on\nend").unwrap();
    match &program.body[0] {
        Stmt::If(stmt) => assert!(matches!(stmt.then_body[0], Stmt::Call(_))),
        other => panic!("unexpected statement: {other:?}"),
    }
}

#[test]
fn strict_mode_has_no_command_syntax() {
    assert!(matches!(parse_strict("hold on"), Err(ParseError::Syntax(_))));
    assert!(parse_strict("hold('on');").is_ok());
}
