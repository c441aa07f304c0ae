//! Expression parsing.
//!
//! A binding-power loop over the table in `precedence.rs`. Constructs that
//! read the same at the token level are told apart when their node is built:
//! `.` followed by a name or a parenthesised expression, chained colons,
//! `a(:)`, runs of transpose markers, and assignment targets.

use crate::ast::{Expr, Field, FuncCall, Ident, LValue, Position};
use crate::error::ParseError;
use crate::parser::{Nesting, Parser};
use crate::precedence::{infix_op, postfix_op, prefix_op, Assoc, InfixOp, PostfixOp, Tier};
use transmat_lexer::TokenKind;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_bp(0)
    }

    pub(crate) fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_prefix()?;
        while let Some(kind) = self.peek_kind() {
            if self.starts_new_element() {
                break;
            }
            if let Some((op, l_bp)) = postfix_op(kind) {
                if l_bp < min_bp {
                    break;
                }
                lhs = self.parse_postfix(lhs, op)?;
                continue;
            }
            if let Some((op, tier, assoc)) = infix_op(kind) {
                let (l_bp, r_bp) = tier.infix_bp(assoc);
                if l_bp < min_bp {
                    break;
                }
                let pos = self.peek().map(Position::from).unwrap_or_default();
                self.next();
                let rhs = self.parse_expr_bp(r_bp)?;
                lhs = match op {
                    InfixOp::Binary(op) => Expr::Binary(Box::new(lhs), op, Box::new(rhs), pos),
                    InfixOp::Colon => reduce_colon(lhs, rhs, pos),
                };
                continue;
            }
            break;
        }
        Ok(lhs)
    }

    /// Inside a matrix or cell literal, whitespace before `(`, `{`, or before
    /// a sign that hugs its operand begins a new element: `[a (1)]`, `[a -b]`.
    fn starts_new_element(&self) -> bool {
        if self.nesting.last() != Some(&Nesting::Matrix) {
            return false;
        }
        let (Some(prev), Some(current)) = (self.prev(), self.peek()) else {
            return false;
        };
        if prev.is_adjacent_to(current) {
            return false;
        }
        match current.kind {
            TokenKind::LParen | TokenKind::LBrace => true,
            TokenKind::Plus | TokenKind::Minus => self
                .peek_at(1)
                .is_some_and(|next| current.is_adjacent_to(next)),
            _ => false,
        }
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_expected("unexpected end of input", "expression"));
        };
        let pos = Position::from(&token);
        match token.kind {
            TokenKind::Ident => {
                self.next();
                Ok(Expr::Ident(self.ident(&token)))
            }
            TokenKind::Number => {
                self.next();
                Ok(Expr::Number(token.text, pos))
            }
            TokenKind::Str => {
                self.next();
                Ok(Expr::String(unquote(&token.text), pos))
            }
            TokenKind::End if token.text == "end" && !self.nesting.is_empty() => {
                self.next();
                Ok(Expr::End(pos))
            }
            TokenKind::Colon if self.bare_colon_allowed() => {
                self.next();
                Ok(Expr::Colon(pos))
            }
            TokenKind::Tilde if self.is_ignored_output() => {
                self.next();
                Ok(Expr::Ident(Ident::new("~", pos)))
            }
            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde => {
                let Some((op, bp)) = prefix_op(token.kind) else {
                    return Err(self.error("unexpected operator"));
                };
                self.next();
                let operand = self.parse_expr_bp(bp)?;
                Ok(Expr::Unary(op, Box::new(operand), pos))
            }
            TokenKind::At => {
                self.next();
                self.parse_handle(pos)
            }
            TokenKind::LParen => {
                self.next();
                let inner = self.nested(Nesting::Group, |p| p.parse_expr())?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Expr::Parens(Box::new(inner), pos))
            }
            TokenKind::LBracket => {
                self.next();
                let rows = self.parse_rows(TokenKind::RBracket)?;
                Ok(Expr::Matrix(rows, pos))
            }
            TokenKind::LBrace => {
                self.next();
                let rows = self.parse_rows(TokenKind::RBrace)?;
                Ok(Expr::CellArray(rows, pos))
            }
            TokenKind::End => Err(self.error("'end' is only valid inside a subscript")),
            TokenKind::Colon => Err(self.error("bare ':' is only valid as a subscript")),
            TokenKind::Error => Err(self.error("invalid character")),
            _ => Err(self.error_expected("unexpected token in expression", "expression")),
        }
    }

    /// `:` standing alone as a whole subscript: `a(:)`, `c{:, 1}`.
    fn bare_colon_allowed(&self) -> bool {
        self.nesting.last() == Some(&Nesting::Group)
            && matches!(
                self.peek_kind_at(1),
                Some(TokenKind::Comma | TokenKind::RParen | TokenKind::RBrace)
            )
    }

    /// `~` as a discarded output in a target list: `[~, b] = f(x)`.
    fn is_ignored_output(&self) -> bool {
        self.nesting.last() == Some(&Nesting::Matrix)
            && matches!(
                self.peek_kind_at(1),
                Some(TokenKind::Comma | TokenKind::RBracket)
            )
    }

    fn nested<T>(
        &mut self,
        nesting: Nesting,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.nesting.push(nesting);
        let result = f(self);
        self.nesting.pop();
        result
    }

    fn parse_handle(&mut self, pos: Position) -> Result<Expr, ParseError> {
        if self.peek_kind() == Some(TokenKind::LParen) {
            let params = self.parse_param_list()?;
            let (_, body_bp) = Tier::Handle.infix_bp(Assoc::NonAssoc);
            let body = self.parse_expr_bp(body_bp)?;
            return Ok(Expr::Lambda {
                params,
                body: Box::new(body),
                pos,
            });
        }
        if self.peek_kind() != Some(TokenKind::Ident) {
            return Err(self.error_expected(
                "expected function name or parameter list after '@'",
                "identifier or '('",
            ));
        }
        let token = self.expect(TokenKind::Ident, "identifier")?;
        let name = Ident::new(token.text.clone(), Position::from(&token));
        Ok(Expr::FuncHandle(name, pos))
    }

    /// Rows of a `[...]` or `{...}` literal. `;` and newlines end a row;
    /// empty rows are dropped.
    fn parse_rows(&mut self, close: TokenKind) -> Result<Vec<Vec<Expr>>, ParseError> {
        let closer = if close == TokenKind::RBracket { "']'" } else { "'}'" };
        self.nested(Nesting::Matrix, |p| {
            let mut rows = Vec::new();
            let mut row = Vec::new();
            let mut after_comma = false;
            loop {
                match p.peek_kind() {
                    None => return Err(p.error_expected("unterminated literal", closer)),
                    Some(kind) if kind == close => {
                        p.next();
                        break;
                    }
                    Some(TokenKind::Semicolon | TokenKind::Newline) => {
                        p.next();
                        after_comma = false;
                        if !row.is_empty() {
                            rows.push(std::mem::take(&mut row));
                        }
                    }
                    Some(TokenKind::Comma) => {
                        if row.is_empty() || after_comma {
                            return Err(p.error_expected("unexpected ','", "element"));
                        }
                        p.next();
                        after_comma = true;
                    }
                    Some(_) => {
                        row.push(p.parse_expr()?);
                        after_comma = false;
                    }
                }
            }
            if !row.is_empty() {
                rows.push(row);
            }
            Ok(rows)
        })
    }

    fn parse_postfix(&mut self, lhs: Expr, op: PostfixOp) -> Result<Expr, ParseError> {
        match op {
            PostfixOp::Call => {
                self.next();
                let args = self.parse_args(TokenKind::RParen, "')'")?;
                Ok(reduce_call(lhs, args))
            }
            PostfixOp::CellIndex => {
                self.next();
                let args = self.parse_args(TokenKind::RBrace, "'}'")?;
                let pos = lhs.pos();
                Ok(Expr::CellArrayRef(Box::new(lhs), args, pos))
            }
            PostfixOp::Field => {
                let Some(dot) = self.next() else {
                    return Err(self.error("expected '.'"));
                };
                let member = match self.peek_kind() {
                    Some(TokenKind::Ident) => {
                        let token = self.next();
                        token.map(|t| Expr::Ident(Ident::new(t.text.clone(), Position::from(&t))))
                    }
                    Some(TokenKind::LParen) => Some(self.parse_prefix()?),
                    _ => None,
                };
                match member {
                    Some(member) => reduce_dot(lhs, member, Position::from(&dot)),
                    None => Err(self.error_expected(
                        "expected field name after '.'",
                        "identifier or '('",
                    )),
                }
            }
            PostfixOp::Transpose => {
                let pos = self.peek().map(Position::from).unwrap_or_default();
                let mut marks = String::new();
                while let Some(token) = self.peek() {
                    if !matches!(token.kind, TokenKind::Transpose | TokenKind::DotTranspose) {
                        break;
                    }
                    marks.push_str(&token.text);
                    self.next();
                }
                Ok(Expr::Transpose(Box::new(lhs), marks, pos))
            }
        }
    }

    fn parse_args(&mut self, close: TokenKind, closer: &str) -> Result<Vec<Expr>, ParseError> {
        self.nested(Nesting::Group, |p| {
            let mut args = Vec::new();
            if p.consume(close) {
                return Ok(args);
            }
            loop {
                args.push(p.parse_expr()?);
                if p.consume(TokenKind::Comma) {
                    continue;
                }
                p.expect(close, closer)?;
                return Ok(args);
            }
        })
    }
}

/// `a:b` followed by `:c` becomes `a:b:c`, the old stop moving to the step.
/// A parenthesised range is a `Parens` node and is never extended.
fn reduce_colon(lhs: Expr, rhs: Expr, pos: Position) -> Expr {
    match lhs {
        Expr::Range {
            start,
            step: None,
            stop,
            pos,
        } => Expr::Range {
            start,
            step: Some(stop),
            stop: Box::new(rhs),
            pos,
        },
        other => Expr::Range {
            start: Box::new(other),
            step: None,
            stop: Box::new(rhs),
            pos,
        },
    }
}

/// `a(:)` is a flattening reference; every other `a(...)` stays a call
/// until later phases resolve calls against indexing.
fn reduce_call(callee: Expr, args: Vec<Expr>) -> Expr {
    let pos = callee.pos();
    if let [Expr::Colon(_)] = args.as_slice() {
        return Expr::ArrayRef(Box::new(callee), args, pos);
    }
    Expr::FuncCall(FuncCall {
        callee: Box::new(callee),
        args,
        ret: None,
        pos,
    })
}

fn reduce_dot(object: Expr, member: Expr, pos: Position) -> Result<Expr, ParseError> {
    let field = match member {
        Expr::Ident(name) => Field::Name(name),
        Expr::Parens(inner, _) => Field::Dynamic(inner),
        other => {
            return Err(ParseError::invalid_target(
                "field access requires a name or a parenthesized expression",
                other.pos(),
            ))
        }
    };
    Ok(Expr::GetField(Box::new(object), field, pos))
}

/// Strips the delimiters from a string token and collapses doubled delimiters.
pub(crate) fn unquote(text: &str) -> String {
    let Some(quote) = text.chars().next() else {
        return String::new();
    };
    let inner = text
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
        .unwrap_or(&text[quote.len_utf8()..]);
    let doubled: String = [quote, quote].iter().collect();
    inner.replace(&doubled, &quote.to_string())
}

impl TryFrom<Expr> for LValue {
    type Error = ParseError;

    fn try_from(expr: Expr) -> Result<Self, Self::Error> {
        match expr {
            Expr::Ident(ident) => Ok(LValue::Var(ident)),
            Expr::GetField(object, field, _) => Ok(LValue::Field(object, field)),
            Expr::CellArrayRef(object, args, _) => Ok(LValue::CellIndex(object, args)),
            Expr::ArrayRef(object, args, _) => Ok(LValue::Index(object, args)),
            Expr::FuncCall(FuncCall {
                callee,
                args,
                ret: None,
                ..
            }) => Ok(LValue::Index(callee, args)),
            other => Err(ParseError::invalid_target(
                "expression is not assignable",
                other.pos(),
            )),
        }
    }
}
