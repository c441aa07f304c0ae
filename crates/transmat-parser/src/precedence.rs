//! Operator precedence table.
//!
//! Tiers are listed from the loosest to the tightest binding. Binding powers
//! are derived from the tier and associativity so that the expression loop in
//! `expr.rs` only ever compares numbers.

use crate::ast::{BinOp, UnOp};
use transmat_lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Handle,
    Comma,
    Colon,
    ShortCircuit,
    Comparison,
    ElementWise,
    Additive,
    Multiplicative,
    Unary,
    Transpose,
    Power,
    Bracket,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    NonAssoc,
}

/// What an infix-position token does once it is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Binary(BinOp),
    Colon,
}

/// Postfix operators: subscripts, field access and transposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Call,
    CellIndex,
    Field,
    Transpose,
}

impl Tier {
    fn base(self) -> u8 {
        (self as u8 + 1) * 10
    }

    /// Minimum binding power at which an operator of this tier is still accepted.
    pub fn min_bp(self) -> u8 {
        self.base()
    }

    /// `(left, right)` binding powers for an infix operator of this tier.
    pub fn infix_bp(self, assoc: Assoc) -> (u8, u8) {
        let b = self.base();
        match assoc {
            Assoc::Left | Assoc::NonAssoc => (b, b + 1),
            Assoc::Right => (b, b),
        }
    }
}

pub fn infix_op(kind: TokenKind) -> Option<(InfixOp, Tier, Assoc)> {
    use InfixOp::Binary;
    let entry = match kind {
        TokenKind::Colon => (InfixOp::Colon, Tier::Colon, Assoc::Left),
        TokenKind::AndAnd => (Binary(BinOp::AndAnd), Tier::ShortCircuit, Assoc::Left),
        TokenKind::OrOr => (Binary(BinOp::OrOr), Tier::ShortCircuit, Assoc::Left),
        TokenKind::Equal => (Binary(BinOp::Equal), Tier::Comparison, Assoc::Left),
        TokenKind::NotEqual => (Binary(BinOp::NotEqual), Tier::Comparison, Assoc::Left),
        TokenKind::Less => (Binary(BinOp::Less), Tier::Comparison, Assoc::Left),
        TokenKind::LessEqual => (Binary(BinOp::LessEqual), Tier::Comparison, Assoc::Left),
        TokenKind::Greater => (Binary(BinOp::Greater), Tier::Comparison, Assoc::Left),
        TokenKind::GreaterEqual => (Binary(BinOp::GreaterEqual), Tier::Comparison, Assoc::Left),
        TokenKind::And => (Binary(BinOp::And), Tier::ElementWise, Assoc::Left),
        TokenKind::Or => (Binary(BinOp::Or), Tier::ElementWise, Assoc::Left),
        TokenKind::Plus => (Binary(BinOp::Add), Tier::Additive, Assoc::Left),
        TokenKind::Minus => (Binary(BinOp::Sub), Tier::Additive, Assoc::Left),
        TokenKind::Star => (Binary(BinOp::Mul), Tier::Multiplicative, Assoc::Left),
        TokenKind::Slash => (Binary(BinOp::Div), Tier::Multiplicative, Assoc::Left),
        TokenKind::Backslash => (Binary(BinOp::LeftDiv), Tier::Multiplicative, Assoc::Left),
        TokenKind::DotStar => (Binary(BinOp::ElemMul), Tier::Multiplicative, Assoc::Left),
        TokenKind::DotSlash => (Binary(BinOp::ElemDiv), Tier::Multiplicative, Assoc::Left),
        TokenKind::DotBackslash => {
            (Binary(BinOp::ElemLeftDiv), Tier::Multiplicative, Assoc::Left)
        }
        TokenKind::Caret => (Binary(BinOp::Pow), Tier::Power, Assoc::Right),
        TokenKind::DotCaret => (Binary(BinOp::ElemPow), Tier::Power, Assoc::Right),
        _ => return None,
    };
    Some(entry)
}

pub fn prefix_op(kind: TokenKind) -> Option<(UnOp, u8)> {
    let op = match kind {
        TokenKind::Minus => UnOp::Minus,
        TokenKind::Plus => UnOp::Plus,
        TokenKind::Tilde => UnOp::Not,
        _ => return None,
    };
    // Right-associative: the operand may itself start with a prefix operator
    Some((op, Tier::Unary.min_bp()))
}

pub fn postfix_op(kind: TokenKind) -> Option<(PostfixOp, u8)> {
    let entry = match kind {
        TokenKind::LParen => (PostfixOp::Call, Tier::Bracket.min_bp()),
        TokenKind::LBrace => (PostfixOp::CellIndex, Tier::Bracket.min_bp()),
        TokenKind::Dot => (PostfixOp::Field, Tier::Field.min_bp()),
        TokenKind::Transpose | TokenKind::DotTranspose => {
            (PostfixOp::Transpose, Tier::Transpose.min_bp())
        }
        _ => return None,
    };
    Some(entry)
}
