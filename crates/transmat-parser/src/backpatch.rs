//! Deferred fixups for constructs whose final shape is only known once their
//! closing token has been read. Each routine receives exactly the sub-tree it
//! completes and runs once, before the result is attached to its parent.

use crate::ast::{BinOp, Else, Expr, FuncDecl, Function, Ident, IfStmt, Position, Stmt};

/// Per-function parsing context, pushed when a header is parsed and popped
/// when the body closes.
#[derive(Debug)]
pub(crate) struct FunctionScope {
    pub returns: Vec<Ident>,
    pub nargin_refs: usize,
}

impl FunctionScope {
    pub fn new(returns: Vec<Ident>) -> Self {
        FunctionScope {
            returns,
            nargin_refs: 0,
        }
    }
}

/// A `case` clause whose equality test still lacks its right operand.
#[derive(Debug)]
pub(crate) enum CaseChain {
    Case {
        test: Expr,
        body: Vec<Stmt>,
        pos: Position,
        rest: Box<CaseChain>,
    },
    Otherwise(Vec<Stmt>),
    Empty,
}

impl CaseChain {
    /// Builds the chain back to front so every case points at its successor.
    pub fn from_clauses(cases: Vec<(Expr, Vec<Stmt>, Position)>, otherwise: Option<Vec<Stmt>>) -> Self {
        let tail = match otherwise {
            Some(body) => CaseChain::Otherwise(body),
            None => CaseChain::Empty,
        };
        cases
            .into_iter()
            .rev()
            .fold(tail, |rest, (test, body, pos)| CaseChain::Case {
                test,
                body,
                pos,
                rest: Box::new(rest),
            })
    }
}

/// What a `switch` lowers to once its subject is known.
#[derive(Debug)]
pub(crate) enum SwitchLowering {
    If(IfStmt),
    /// No `case` clauses: only the `otherwise` statements (possibly none) remain.
    Block(Vec<Stmt>),
}

pub(crate) fn fill_switch(subject: Expr, chain: CaseChain) -> SwitchLowering {
    match chain {
        CaseChain::Empty => SwitchLowering::Block(Vec::new()),
        CaseChain::Otherwise(body) => SwitchLowering::Block(body),
        CaseChain::Case {
            test,
            body,
            pos,
            rest,
        } => {
            log::debug!("backpatching switch subject at line {}", pos.line);
            SwitchLowering::If(fill_case(&subject, test, body, pos, *rest))
        }
    }
}

fn fill_case(subject: &Expr, test: Expr, body: Vec<Stmt>, pos: Position, rest: CaseChain) -> IfStmt {
    let else_branch = match rest {
        CaseChain::Empty => Else::default(),
        CaseChain::Otherwise(block) => Else::Block(block),
        CaseChain::Case {
            test,
            body,
            pos,
            rest,
        } => Else::If(Box::new(fill_case(subject, test, body, pos, *rest))),
    };
    IfStmt {
        cond: Expr::Binary(Box::new(test), BinOp::Equal, Box::new(subject.clone()), pos),
        then_body: body,
        else_branch,
        pos,
    }
}

/// Completes a function once its body is parsed: records whether `nargin`
/// was referenced and makes sure the body ends with a `return`.
pub(crate) fn close_function(mut head: FuncDecl, mut body: Vec<Stmt>, scope: FunctionScope) -> Function {
    head.use_nargin = scope.nargin_refs > 0;
    if !matches!(body.last(), Some(Stmt::Return(..))) {
        body.push(Stmt::Return(scope.returns, head.pos));
    }
    log::debug!(
        "closed function '{}' ({} statements, use_nargin={})",
        head.name.name,
        body.len(),
        head.use_nargin
    );
    Function { head, body }
}
