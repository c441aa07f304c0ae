use crate::ast::{
    Else, Expr, FuncCall, FuncDecl, Function, Ident, IfStmt, LValue, Param, Position, Program,
    Stmt,
};
use crate::backpatch::{self, CaseChain, FunctionScope, SwitchLowering};
use crate::error::{ParseError, SyntaxError};
use crate::ParserOptions;
use transmat_lexer::{Token, TokenKind};

/// What kind of bracket the expression parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Nesting {
    /// `[...]` or `{...}` literal: whitespace separates elements.
    Matrix,
    /// `(...)` group or subscript list.
    Group,
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    options: ParserOptions,
    pub(crate) nesting: Vec<Nesting>,
    scopes: Vec<FunctionScope>,
}

const SEPARATOR: &str = "',', ';' or newline";

fn is_block_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::End
            | TokenKind::Else
            | TokenKind::ElseIf
            | TokenKind::Case
            | TokenKind::Otherwise
            | TokenKind::Catch
            | TokenKind::Function
    )
}

fn can_start_statement(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident
            | TokenKind::Number
            | TokenKind::Str
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LBrace
            | TokenKind::At
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
            | TokenKind::If
            | TokenKind::For
            | TokenKind::While
            | TokenKind::Switch
            | TokenKind::Try
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Return
            | TokenKind::Global
    )
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>, options: ParserOptions) -> Self {
        Parser {
            tokens,
            pos: 0,
            options,
            nesting: Vec::new(),
            scopes: Vec::new(),
        }
    }

    pub(crate) fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                None => break,
                Some(TokenKind::Function) => {
                    let function = self.parse_function()?;
                    body.push(Stmt::Function(function));
                }
                Some(kind) if is_block_keyword(kind) => {
                    return Err(self.error("block keyword without a matching opening statement"));
                }
                Some(_) => self.parse_statement_into(&mut body)?,
            }
        }
        Ok(Program { body })
    }

    // ----- cursor -----

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    pub(crate) fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    pub(crate) fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.peek_at(offset).map(|t| t.kind)
    }

    /// The most recently consumed token.
    pub(crate) fn prev(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    pub(crate) fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error_expected(&format!("expected {expected}"), expected)),
        }
    }

    fn skip_separators(&mut self) {
        while self.peek_kind().is_some_and(TokenKind::is_separator) {
            self.pos += 1;
        }
    }

    fn at_separator(&self) -> bool {
        self.peek_kind().is_some_and(TokenKind::is_separator)
    }

    // ----- errors -----

    fn eof_position(&self) -> Position {
        self.tokens
            .last()
            .map(|t| Position {
                line: t.line,
                offset: t.end(),
            })
            .unwrap_or_default()
    }

    fn syntax_error(&self, message: &str, expected: Option<&str>) -> ParseError {
        let found = self.peek().cloned();
        let position = found
            .as_ref()
            .map(Position::from)
            .unwrap_or_else(|| self.eof_position());
        SyntaxError {
            message: message.to_string(),
            found,
            expected: expected.map(str::to_string),
            position,
        }
        .into()
    }

    pub(crate) fn error(&self, message: &str) -> ParseError {
        self.syntax_error(message, None)
    }

    pub(crate) fn error_expected(&self, message: &str, expected: &str) -> ParseError {
        self.syntax_error(message, Some(expected))
    }

    fn expect_end(&mut self, construct: &str) -> Result<Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::End => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error_expected(&format!("expected 'end' to close {construct}"), "'end'")),
        }
    }

    fn expect_separator(&self, after: &str) -> Result<(), ParseError> {
        if self.at_separator() {
            Ok(())
        } else {
            Err(self.error_expected(&format!("expected separator after {after}"), SEPARATOR))
        }
    }

    fn expect_terminator(&self) -> Result<(), ParseError> {
        match self.peek_kind() {
            None => Ok(()),
            Some(kind) if kind.is_separator() || is_block_keyword(kind) => Ok(()),
            Some(_) => Err(self.error_expected("expected end of statement", SEPARATOR)),
        }
    }

    // ----- identifiers -----

    /// Builds an identifier from a body token, counting `nargin` references
    /// against the innermost function.
    pub(crate) fn ident(&mut self, token: &Token) -> Ident {
        if token.text == "nargin" {
            if let Some(scope) = self.scopes.last_mut() {
                scope.nargin_refs += 1;
            }
        }
        Ident::new(token.text.clone(), Position::from(token))
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let token = self.expect(TokenKind::Ident, "identifier")?;
        Ok(self.ident(&token))
    }

    /// Header identifiers are not references and are never counted.
    fn expect_header_ident(&mut self) -> Result<Ident, ParseError> {
        let token = self.expect(TokenKind::Ident, "identifier")?;
        Ok(Ident::new(token.text.clone(), Position::from(&token)))
    }

    pub(crate) fn parse_param_list(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if self.consume(TokenKind::RParen) {
            return Ok(params);
        }
        loop {
            let param = match self.peek() {
                Some(t) if t.kind == TokenKind::Tilde => {
                    let pos = Position::from(t);
                    self.pos += 1;
                    Param {
                        name: "~".to_string(),
                        pos,
                    }
                }
                _ => Param::from(self.expect_header_ident()?),
            };
            params.push(param);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(params);
        }
    }

    // ----- blocks and statements -----

    fn parse_block(
        &mut self,
        is_terminator: impl Fn(TokenKind) -> bool,
    ) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        loop {
            self.skip_separators();
            match self.peek_kind() {
                None => return Ok(body),
                Some(kind) if is_terminator(kind) => return Ok(body),
                Some(TokenKind::Function) => {
                    return Err(self.error("function definitions are only allowed at top level"));
                }
                Some(kind) if is_block_keyword(kind) => {
                    return Err(self.error("unexpected block keyword"));
                }
                Some(_) => self.parse_statement_into(&mut body)?,
            }
        }
    }

    /// Parses one statement and appends what it lowers to. A `switch` without
    /// cases may contribute zero or several statements.
    fn parse_statement_into(&mut self, body: &mut Vec<Stmt>) -> Result<(), ParseError> {
        match self.peek_kind() {
            Some(TokenKind::If) => body.push(self.parse_if()?),
            Some(TokenKind::While) => body.push(self.parse_while()?),
            Some(TokenKind::For) => body.push(self.parse_for()?),
            Some(TokenKind::Switch) => self.parse_switch_into(body)?,
            Some(TokenKind::Try) => body.push(self.parse_try_catch()?),
            Some(TokenKind::Global) => body.push(self.parse_global()?),
            Some(TokenKind::Break) => {
                let kw = self.expect(TokenKind::Break, "'break'")?;
                body.push(Stmt::Break(Position::from(&kw)));
            }
            Some(TokenKind::Continue) => {
                let kw = self.expect(TokenKind::Continue, "'continue'")?;
                body.push(Stmt::Continue(Position::from(&kw)));
            }
            Some(TokenKind::Return) => {
                let kw = self.expect(TokenKind::Return, "'return'")?;
                let returns = self
                    .scopes
                    .last()
                    .map(|scope| scope.returns.clone())
                    .unwrap_or_default();
                body.push(Stmt::Return(returns, Position::from(&kw)));
            }
            _ => body.push(self.parse_simple_statement()?),
        }
        self.expect_terminator()
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        if self.options.command_syntax() && self.looks_like_command() {
            return self.parse_command();
        }
        let expr = self.parse_expr()?;
        match self.peek() {
            Some(token) if token.kind == TokenKind::Assign => {
                let pos = Position::from(token);
                self.pos += 1;
                let value = self.parse_expr()?;
                self.build_assignment(expr, value, pos)
            }
            _ => {
                let pos = expr.pos();
                Ok(Stmt::ExprStmt(expr, pos))
            }
        }
    }

    fn build_assignment(&mut self, target: Expr, value: Expr, pos: Position) -> Result<Stmt, ParseError> {
        match target {
            Expr::Matrix(rows, mpos) => {
                let call = multi_return(rows, mpos, value)?;
                Ok(Stmt::Call(call))
            }
            other => Ok(Stmt::Let {
                target: LValue::try_from(other)?,
                value,
                pos,
            }),
        }
    }

    /// Number of tokens in the command word starting `start` tokens ahead.
    /// A word is a run of tokens with no whitespace between them, so
    /// `data.mat` is a single word.
    fn command_word_len(&self, start: usize) -> usize {
        let Some(first) = self.peek_at(start) else {
            return 0;
        };
        if !starts_word(first.kind) {
            return 0;
        }
        let mut prev = first;
        let mut len = 1;
        while let Some(token) = self.peek_at(start + len) {
            let continues = starts_word(token.kind) || token.kind == TokenKind::Dot;
            if !continues || !prev.is_adjacent_to(token) {
                break;
            }
            prev = token;
            len += 1;
        }
        len
    }

    /// `name word word ...` up to the end of the statement, with no operator
    /// between the words and whitespace separating each of them.
    fn looks_like_command(&self) -> bool {
        let Some(first) = self.peek() else {
            return false;
        };
        if first.kind != TokenKind::Ident {
            return false;
        }
        let mut prev = first;
        let mut i = 1;
        loop {
            let len = self.command_word_len(i);
            if len == 0 {
                break;
            }
            let (Some(head), Some(last)) = (self.peek_at(i), self.peek_at(i + len - 1)) else {
                break;
            };
            if prev.is_adjacent_to(head) {
                return false;
            }
            prev = last;
            i += len;
        }
        if i == 1 {
            return false;
        }
        match self.peek_kind_at(i) {
            None => true,
            Some(kind) => kind.is_separator() || is_block_keyword(kind),
        }
    }

    fn parse_command(&mut self) -> Result<Stmt, ParseError> {
        let head = self.expect(TokenKind::Ident, "command name")?;
        let callee = self.ident(&head);
        let mut words: Vec<Vec<Token>> = Vec::new();
        loop {
            let len = self.command_word_len(0);
            if len == 0 {
                break;
            }
            words.push((0..len).filter_map(|_| self.next()).collect());
        }
        let pos = callee.pos;
        log::trace!("command syntax '{}' with {} words", callee.name, words.len());

        if callee.name == "load" && words.len() > 1 {
            let mut rest = words.into_iter();
            let args: Vec<Expr> = rest
                .next()
                .map(|word| command_word(&word, pos))
                .into_iter()
                .collect();
            let ret = rest
                .map(|word| match word.as_slice() {
                    [token] if token.kind == TokenKind::Ident => Ok(LValue::Var(self.ident(token))),
                    _ => Err(ParseError::invalid_target(
                        format!("'{}' cannot receive a loaded variable", word_text(&word)),
                        word.first().map_or(pos, Position::from),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Stmt::Call(FuncCall {
                callee: Box::new(Expr::Ident(callee)),
                args,
                ret: Some(ret),
                pos,
            }));
        }

        Ok(Stmt::Call(FuncCall {
            callee: Box::new(Expr::Ident(callee)),
            args: words.iter().map(|word| command_word(word, pos)).collect(),
            ret: None,
            pos,
        }))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.expect(TokenKind::If, "'if'")?;
        let cond = self.parse_expr()?;
        if !self.at_separator() {
            self.recover_if_condition()?;
        }
        let then_body =
            self.parse_block(|k| matches!(k, TokenKind::ElseIf | TokenKind::Else | TokenKind::End))?;
        let else_branch = self.parse_else()?;
        self.expect_end("'if'")?;
        Ok(Stmt::If(IfStmt {
            cond,
            then_body,
            else_branch,
            pos: Position::from(&kw),
        }))
    }

    /// Skips tokens that cannot follow an if-condition until something that
    /// can start a statement (or ends the block) comes up.
    fn recover_if_condition(&mut self) -> Result<(), ParseError> {
        if !self.options.recover_if_condition() {
            return Err(self.error_expected("expected separator after if condition", SEPARATOR));
        }
        if let Some(token) = self.peek() {
            log::warn!(
                "line {}: unexpected '{}' after if condition, resynchronizing",
                token.line,
                token.text
            );
        }
        while let Some(kind) = self.peek_kind() {
            if can_start_statement(kind) || kind.is_separator() || is_block_keyword(kind) {
                break;
            }
            self.pos += 1;
        }
        Ok(())
    }

    fn parse_else(&mut self) -> Result<Else, ParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::ElseIf => {
                let pos = Position::from(token);
                self.pos += 1;
                let cond = self.parse_expr()?;
                self.expect_separator("elseif condition")?;
                let then_body = self.parse_block(|k| {
                    matches!(k, TokenKind::ElseIf | TokenKind::Else | TokenKind::End)
                })?;
                let else_branch = self.parse_else()?;
                Ok(Else::If(Box::new(IfStmt {
                    cond,
                    then_body,
                    else_branch,
                    pos,
                })))
            }
            Some(token) if token.kind == TokenKind::Else => {
                self.pos += 1;
                Ok(Else::Block(self.parse_block(|k| k == TokenKind::End)?))
            }
            _ => Ok(Else::default()),
        }
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.expect(TokenKind::While, "'while'")?;
        let cond = self.parse_expr()?;
        self.expect_separator("while condition")?;
        let body = self.parse_block(|k| k == TokenKind::End)?;
        self.expect_end("'while'")?;
        Ok(Stmt::While {
            cond,
            body,
            pos: Position::from(&kw),
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.expect(TokenKind::For, "'for'")?;
        let parenthesized = self.peek_kind() == Some(TokenKind::LParen)
            && self.peek_kind_at(1) == Some(TokenKind::Ident)
            && self.peek_kind_at(2) == Some(TokenKind::Assign);
        if parenthesized {
            self.pos += 1;
        }
        let var = self.expect_ident()?;
        self.expect(TokenKind::Assign, "'='")?;
        let expr = self.parse_expr()?;
        if parenthesized {
            self.expect(TokenKind::RParen, "')'")?;
        }
        self.expect_separator("for header")?;
        let body = self.parse_block(|k| k == TokenKind::End)?;
        self.expect_end("'for'")?;
        Ok(Stmt::For {
            var,
            expr,
            body,
            pos: Position::from(&kw),
        })
    }

    fn parse_switch_into(&mut self, body: &mut Vec<Stmt>) -> Result<(), ParseError> {
        self.expect(TokenKind::Switch, "'switch'")?;
        let subject = self.parse_expr()?;
        self.expect_separator("switch subject")?;

        let mut cases = Vec::new();
        let mut otherwise = None;
        loop {
            self.skip_separators();
            match self.peek() {
                Some(token) if token.kind == TokenKind::Case => {
                    let pos = Position::from(token);
                    self.pos += 1;
                    let test = self.parse_expr()?;
                    self.expect_separator("case value")?;
                    let case_body = self.parse_block(|k| {
                        matches!(k, TokenKind::Case | TokenKind::Otherwise | TokenKind::End)
                    })?;
                    cases.push((test, case_body, pos));
                }
                Some(token) if token.kind == TokenKind::Otherwise => {
                    self.pos += 1;
                    otherwise = Some(self.parse_block(|k| k == TokenKind::End)?);
                }
                _ => break,
            }
        }
        self.expect_end("'switch'")?;

        let chain = CaseChain::from_clauses(cases, otherwise);
        match backpatch::fill_switch(subject, chain) {
            SwitchLowering::If(stmt) => body.push(Stmt::If(stmt)),
            SwitchLowering::Block(stmts) => body.extend(stmts),
        }
        Ok(())
    }

    fn parse_try_catch(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.expect(TokenKind::Try, "'try'")?;
        let try_body = self.parse_block(|k| matches!(k, TokenKind::Catch | TokenKind::End))?;
        let catch_body = if self.consume(TokenKind::Catch) {
            self.parse_block(|k| k == TokenKind::End)?
        } else {
            Vec::new()
        };
        self.expect_end("'try'")?;
        Ok(Stmt::TryCatch {
            try_body,
            catch_body,
            pos: Position::from(&kw),
        })
    }

    fn parse_global(&mut self) -> Result<Stmt, ParseError> {
        let kw = self.expect(TokenKind::Global, "'global'")?;
        let mut names = vec![self.expect_ident()?];
        while self.peek_kind() == Some(TokenKind::Ident) {
            names.push(self.expect_ident()?);
        }
        Ok(Stmt::Global(names, Position::from(&kw)))
    }

    // ----- functions -----

    fn parse_function(&mut self) -> Result<Function, ParseError> {
        let kw = self.expect(TokenKind::Function, "'function'")?;
        let returns = self.parse_function_returns()?;
        let name = self.expect_header_ident()?;
        let params = if self.peek_kind() == Some(TokenKind::LParen) {
            self.parse_param_list()?
        } else {
            Vec::new()
        };
        let head = FuncDecl {
            name,
            params,
            returns: returns.clone(),
            use_nargin: false,
            pos: Position::from(&kw),
        };
        log::debug!("parsing function '{}'", head.name.name);

        self.scopes.push(FunctionScope::new(returns));
        let body = self.parse_block(|k| matches!(k, TokenKind::End | TokenKind::Function));
        let scope = self.scopes.pop();
        match (body, scope) {
            (Ok(body), Some(scope)) => {
                // The closing `end` is optional; the next `function` or end of input also closes the body
                self.consume(TokenKind::End);
                Ok(backpatch::close_function(head, body, scope))
            }
            (Err(err), _) => Err(err),
            (Ok(_), None) => Err(self.error("function scope was closed twice")),
        }
    }

    fn parse_function_returns(&mut self) -> Result<Vec<Ident>, ParseError> {
        if self.consume(TokenKind::LBracket) {
            let mut returns = Vec::new();
            while !self.consume(TokenKind::RBracket) {
                if self.consume(TokenKind::Comma) {
                    continue;
                }
                returns.push(self.expect_header_ident()?);
            }
            self.expect(TokenKind::Assign, "'='")?;
            return Ok(returns);
        }
        if self.peek_kind() == Some(TokenKind::Ident)
            && self.peek_kind_at(1) == Some(TokenKind::Assign)
        {
            let ret = self.expect_header_ident()?;
            self.pos += 1;
            return Ok(vec![ret]);
        }
        Ok(Vec::new())
    }
}

/// Command words are passed as string literals, quotes removed.
fn starts_word(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident | TokenKind::Number | TokenKind::Str | TokenKind::Global
    )
}

/// The source text of a command word. A lone quoted string is unquoted.
fn word_text(word: &[Token]) -> String {
    match word {
        [token] if token.kind == TokenKind::Str => crate::expr::unquote(&token.text),
        _ => word.iter().map(|token| token.text.as_str()).collect(),
    }
}

fn command_word(word: &[Token], fallback: Position) -> Expr {
    let pos = word.first().map_or(fallback, Position::from);
    Expr::String(word_text(word), pos)
}

/// `[a, b] = rhs`: the targets become the `ret` list of a call.
fn multi_return(
    rows: Vec<Vec<Expr>>,
    pos: Position,
    value: Expr,
) -> Result<FuncCall, ParseError> {
    let mut rows = rows.into_iter();
    let row = match (rows.next(), rows.next()) {
        (Some(row), None) if !row.is_empty() => row,
        _ => {
            return Err(ParseError::invalid_target(
                "multiple assignment targets must form a single non-empty row",
                pos,
            ))
        }
    };
    let targets = row
        .into_iter()
        .map(LValue::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    match value {
        Expr::Ident(ident) => {
            let call_pos = ident.pos;
            Ok(FuncCall {
                callee: Box::new(Expr::Ident(ident)),
                args: Vec::new(),
                ret: Some(targets),
                pos: call_pos,
            })
        }
        Expr::FuncCall(call) if call.ret.is_none() => Ok(FuncCall {
            ret: Some(targets),
            ..call
        }),
        other => Err(ParseError::invalid_target(
            "multiple assignment requires a function call on the right-hand side",
            other.pos(),
        )),
    }
}
