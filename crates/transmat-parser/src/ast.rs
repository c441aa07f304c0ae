use serde::{Deserialize, Serialize};
use transmat_lexer::Token;

/// Source provenance of a node: the token that best identifies the construct.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub offset: usize,
}

impl From<&Token> for Position {
    fn from(token: &Token) -> Self {
        Position {
            line: token.line,
            offset: token.offset,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub pos: Position,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Position) -> Self {
        Ident {
            name: name.into(),
            pos,
        }
    }
}

/// A formal parameter of a function or lambda.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub pos: Position,
}

impl From<Ident> for Param {
    fn from(ident: Ident) -> Self {
        Param {
            name: ident.name,
            pos: ident.pos,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    LeftDiv,
    Pow,
    // Element-wise operations
    ElemMul,     // .*
    ElemDiv,     // ./
    ElemLeftDiv, // .\
    ElemPow,     // .^
    // Logical operations
    AndAnd, // && (short-circuit)
    OrOr,   // || (short-circuit)
    And,    // &
    Or,     // |
    // Comparison operations
    Equal,        // ==
    NotEqual,     // ~= and !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::LeftDiv => "\\",
            BinOp::Pow => "^",
            BinOp::ElemMul => ".*",
            BinOp::ElemDiv => "./",
            BinOp::ElemLeftDiv => ".\\",
            BinOp::ElemPow => ".^",
            BinOp::AndAnd => "&&",
            BinOp::OrOr => "||",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Equal => "==",
            BinOp::NotEqual => "~=",
            BinOp::Less => "<",
            BinOp::LessEqual => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEqual => ">=",
        }
    }
}

#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum UnOp {
    Plus,
    Minus,
    Not, // ~ and !
}

/// The member named by a field access: `s.name` or `s.(expr)`.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Field {
    Name(Ident),
    Dynamic(Box<Expr>),
}

/// A call (or not-yet-resolved index) expression.
///
/// `ret` is only populated for statement-level calls rewritten from a
/// multi-return assignment (`[a, b] = f(x)`) or `load` command sugar.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FuncCall {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
    pub ret: Option<Vec<LValue>>,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    Number(String, Position),
    String(String, Position),
    /// Bare `:` used as an all-elements subscript.
    Colon(Position),
    /// `start:stop` or `start:step:stop`.
    Range {
        start: Box<Expr>,
        step: Option<Box<Expr>>,
        stop: Box<Expr>,
        pos: Position,
    },
    /// `end` inside a subscript.
    End(Position),
    Unary(UnOp, Box<Expr>, Position),
    Binary(Box<Expr>, BinOp, Box<Expr>, Position),
    Matrix(Vec<Vec<Expr>>, Position),
    CellArray(Vec<Vec<Expr>>, Position),
    FuncCall(FuncCall),
    /// `a(:)`: flattening index, kept apart from ordinary calls.
    ArrayRef(Box<Expr>, Vec<Expr>, Position),
    CellArrayRef(Box<Expr>, Vec<Expr>, Position),
    GetField(Box<Expr>, Field, Position),
    /// Postfix transposes, with the exact run of `'` / `.'` markers as written.
    Transpose(Box<Expr>, String, Position),
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
        pos: Position,
    },
    FuncHandle(Ident, Position),
    Parens(Box<Expr>, Position),
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Ident(id) => id.pos,
            Expr::FuncCall(call) => call.pos,
            Expr::Number(_, pos)
            | Expr::String(_, pos)
            | Expr::Colon(pos)
            | Expr::Range { pos, .. }
            | Expr::End(pos)
            | Expr::Unary(_, _, pos)
            | Expr::Binary(_, _, _, pos)
            | Expr::Matrix(_, pos)
            | Expr::CellArray(_, pos)
            | Expr::ArrayRef(_, _, pos)
            | Expr::CellArrayRef(_, _, pos)
            | Expr::GetField(_, _, pos)
            | Expr::Transpose(_, _, pos)
            | Expr::Lambda { pos, .. }
            | Expr::FuncHandle(_, pos)
            | Expr::Parens(_, pos) => *pos,
        }
    }
}

/// Assignment targets. Any other expression shape on the left of `=` is rejected.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum LValue {
    Var(Ident),
    /// `s.f = v` / `s.(n) = v`
    Field(Box<Expr>, Field),
    CellIndex(Box<Expr>, Vec<Expr>),
    Index(Box<Expr>, Vec<Expr>),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Else {
    Block(Vec<Stmt>),
    If(Box<IfStmt>),
}

impl Default for Else {
    fn default() -> Self {
        Else::Block(Vec::new())
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub cond: Expr,
    pub then_body: Vec<Stmt>,
    pub else_branch: Else,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    pub returns: Vec<Ident>,
    /// Set when the body references `nargin`.
    pub use_nargin: bool,
    pub pos: Position,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Function {
    pub head: FuncDecl,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Stmt {
    Let {
        target: LValue,
        value: Expr,
        pos: Position,
    },
    ExprStmt(Expr, Position),
    Call(FuncCall),
    If(IfStmt),
    While {
        cond: Expr,
        body: Vec<Stmt>,
        pos: Position,
    },
    For {
        var: Ident,
        expr: Expr,
        body: Vec<Stmt>,
        pos: Position,
    },
    TryCatch {
        try_body: Vec<Stmt>,
        catch_body: Vec<Stmt>,
        pos: Position,
    },
    /// Carries the enclosing function's declared outputs.
    Return(Vec<Ident>, Position),
    Break(Position),
    Continue(Position),
    Global(Vec<Ident>, Position),
    Function(Function),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Stmt>,
}
