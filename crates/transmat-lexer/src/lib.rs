use logos::Logos;
use serde::{Deserialize, Serialize};

#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[logos(skip r"[ \t\f\r]+")]
#[logos(skip r"[%#][^\n]*")]
#[logos(skip r"\.\.\.[^\n]*\n?")]
pub enum TokenKind {
    // Keywords
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("elseif")]
    ElseIf,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("otherwise")]
    Otherwise,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("global")]
    Global,
    // Octave block closers are interchangeable with `end` as statement terminators
    #[token("end")]
    #[token("endif")]
    #[token("endwhile")]
    #[token("endfor")]
    #[token("endfunction")]
    #[token("endswitch")]
    #[token("end_try_catch")]
    End,

    // Identifiers and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
    #[regex(r"[0-9]+\.?[0-9]*([eE][+-]?[0-9]+)?[ij]?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[ij]?")]
    Number,
    #[regex(r#""([^"\n]|"")*""#)]
    Str,
    // A lone apostrophe; resolved to `Str` or `Transpose` by `tokenize_detailed`
    #[token("'")]
    Quote,
    Transpose,
    #[token(".'")]
    DotTranspose,

    // Operators
    #[token(".*")]
    DotStar,
    #[token("./")]
    DotSlash,
    #[token(".\\")]
    DotBackslash,
    #[token(".^")]
    DotCaret,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("==")]
    Equal,
    #[token("~=")]
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("\\")]
    Backslash,
    #[token("^")]
    Caret,
    #[token("&")]
    And,
    #[token("|")]
    Or,
    #[token("~")]
    #[token("!")]
    Tilde,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("=")]
    Assign,
    #[token(".")]
    Dot,
    #[token("@")]
    At,

    // Separators and brackets
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("\n")]
    Newline,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    Error,
}

impl TokenKind {
    /// Tokens after which an apostrophe reads as a transpose rather than a string opener.
    pub fn ends_value(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Number
                | TokenKind::Str
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::Transpose
                | TokenKind::DotTranspose
        )
    }

    pub fn is_separator(self) -> bool {
        matches!(
            self,
            TokenKind::Semicolon | TokenKind::Comma | TokenKind::Newline
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based source line.
    pub line: usize,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, offset: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            offset,
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// True when `next` starts exactly where this token ends (no whitespace between).
    pub fn is_adjacent_to(&self, next: &Token) -> bool {
        self.end() == next.offset
    }
}

/// Maps byte offsets to 1-based line numbers.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(input: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(input.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }
}

pub fn tokenize(input: &str) -> Vec<TokenKind> {
    tokenize_detailed(input)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

pub fn tokenize_detailed(input: &str) -> Vec<Token> {
    let lines = LineIndex::new(input);
    let mut lex = TokenKind::lexer(input);
    let mut out: Vec<Token> = Vec::new();
    // Open brackets, innermost last
    let mut nesting: Vec<TokenKind> = Vec::new();

    let push = |out: &mut Vec<Token>, kind: TokenKind, start: usize, end: usize| {
        out.push(Token::new(
            kind,
            &input[start..end],
            lines.line_of(start),
            start,
        ));
    };

    while let Some(res) = lex.next() {
        let span = lex.span();
        let kind = match res {
            Ok(kind) => kind,
            Err(()) => {
                log::trace!("unrecognized input {:?} at offset {}", lex.slice(), span.start);
                push(&mut out, TokenKind::Error, span.start, span.end);
                continue;
            }
        };

        match kind {
            TokenKind::Quote => {
                if quote_is_transpose(&out, span.start, &nesting) {
                    push(&mut out, TokenKind::Transpose, span.start, span.end);
                } else if let Some(len) = scan_char_literal(lex.remainder()) {
                    lex.bump(len);
                    push(&mut out, TokenKind::Str, span.start, span.end + len);
                } else {
                    // Unterminated literal: the rest of the line is unusable
                    let rest = lex.remainder();
                    let len = rest.find('\n').unwrap_or(rest.len());
                    lex.bump(len);
                    log::trace!("unterminated string literal at offset {}", span.start);
                    push(&mut out, TokenKind::Error, span.start, span.end + len);
                }
            }
            TokenKind::Number if lex.slice().ends_with('.') => {
                // `1.*x`, `2.^n`, `a(1.')`: the dot belongs to the operator that follows
                let op = lex
                    .remainder()
                    .chars()
                    .next()
                    .and_then(dotted_operator);
                match op {
                    Some(op) => {
                        push(&mut out, TokenKind::Number, span.start, span.end - 1);
                        lex.bump(1);
                        push(&mut out, op, span.end - 1, span.end + 1);
                    }
                    None => push(&mut out, TokenKind::Number, span.start, span.end),
                }
            }
            // Newlines inside parentheses never terminate anything
            TokenKind::Newline if nesting.last() == Some(&TokenKind::LParen) => {}
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                nesting.push(kind);
                push(&mut out, kind, span.start, span.end);
            }
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                nesting.pop();
                push(&mut out, kind, span.start, span.end);
            }
            _ => push(&mut out, kind, span.start, span.end),
        }
    }
    out
}

fn dotted_operator(c: char) -> Option<TokenKind> {
    match c {
        '*' => Some(TokenKind::DotStar),
        '/' => Some(TokenKind::DotSlash),
        '\\' => Some(TokenKind::DotBackslash),
        '^' => Some(TokenKind::DotCaret),
        '\'' => Some(TokenKind::DotTranspose),
        _ => None,
    }
}

// An apostrophe directly after a value is a transpose. After whitespace it
// opens a string inside a matrix/cell literal (`[a 'x']`) and in command
// syntax (`disp 'hello'`); elsewhere it still transposes.
fn quote_is_transpose(out: &[Token], start: usize, nesting: &[TokenKind]) -> bool {
    let Some(prev) = out.last() else {
        return false;
    };
    if !prev.kind.ends_value() {
        return false;
    }
    if prev.end() == start {
        return true;
    }
    match nesting.last() {
        Some(TokenKind::LBracket | TokenKind::LBrace) => false,
        Some(_) => true,
        None => {
            let command_word = prev.kind == TokenKind::Ident
                && out.len().checked_sub(2).map_or(true, |i| {
                    out[i].kind.is_separator()
                });
            !command_word
        }
    }
}

// Length of a single-quoted literal body including its closing quote, with
// `''` standing for an embedded apostrophe.
fn scan_char_literal(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => return None,
            b'\'' if bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b'\'' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}
