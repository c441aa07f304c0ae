use transmat_lexer::{tokenize, tokenize_detailed, TokenKind};

#[test]
fn identifiers_and_numbers() {
    let src = "x 123 4.56 .5 1e-3 2i";
    assert_eq!(
        tokenize(src),
        vec![
            TokenKind::Ident,
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::Number,
            TokenKind::Number,
        ]
    );
}

#[test]
fn switch_case_otherwise_try_catch_keywords() {
    let src = "switch case otherwise try catch end";
    assert_eq!(
        tokenize(src),
        vec![
            TokenKind::Switch,
            TokenKind::Case,
            TokenKind::Otherwise,
            TokenKind::Try,
            TokenKind::Catch,
            TokenKind::End,
        ]
    );
}

#[test]
fn octave_block_closers_lex_as_end() {
    let src = "endif endwhile endfor endfunction endswitch end_try_catch";
    assert!(tokenize(src).iter().all(|k| *k == TokenKind::End));
}

#[test]
fn keyword_prefix_is_still_an_identifier() {
    assert_eq!(tokenize("iffy ending"), vec![TokenKind::Ident, TokenKind::Ident]);
}

#[test]
fn semicolon_comma_and_newline_tokens() {
    let src = "a=1; b=2, c=3\nd";
    assert_eq!(
        tokenize(src),
        vec![
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Number,
            TokenKind::Semicolon,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Ident,
        ]
    );
}

#[test]
fn element_wise_operators_after_integer_literal() {
    assert_eq!(
        tokenize("1.*x"),
        vec![TokenKind::Number, TokenKind::DotStar, TokenKind::Ident]
    );
    let toks = tokenize_detailed("2.^n");
    assert_eq!(toks[0].text, "2");
    assert_eq!(toks[1].kind, TokenKind::DotCaret);
    assert_eq!(toks[1].text, ".^");
    assert_eq!(toks[1].offset, 1);
}

#[test]
fn comparison_spellings() {
    assert_eq!(
        tokenize("a ~= b != c == d"),
        vec![
            TokenKind::Ident,
            TokenKind::NotEqual,
            TokenKind::Ident,
            TokenKind::NotEqual,
            TokenKind::Ident,
            TokenKind::Equal,
            TokenKind::Ident,
        ]
    );
}

#[test]
fn comments_and_continuations_are_skipped() {
    let src = "x = 1 + ... continue here\n 2 % trailing\n# octave comment\ny";
    assert_eq!(
        tokenize(src),
        vec![
            TokenKind::Ident,
            TokenKind::Assign,
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::Number,
            TokenKind::Newline,
            TokenKind::Newline,
            TokenKind::Ident,
        ]
    );
}

#[test]
fn newlines_inside_parentheses_are_dropped() {
    assert_eq!(
        tokenize("f(1,\n2)"),
        vec![
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::Number,
            TokenKind::RParen,
        ]
    );
    // ...but they separate rows inside brackets
    assert!(tokenize("[1\n2]").contains(&TokenKind::Newline));
}

#[test]
fn unknown_character_becomes_error_token() {
    let toks = tokenize_detailed("a = $");
    assert_eq!(toks.last().map(|t| t.kind), Some(TokenKind::Error));
    assert_eq!(toks.last().map(|t| t.text.as_str()), Some("$"));
}
