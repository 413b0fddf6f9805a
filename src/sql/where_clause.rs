//! Splits a filter expression into atomic `<column> <comparator> <value>` clauses and the
//! AND/OR connectives between them.

use super::ast::{Comparator, Connective, Filter, WhereClause};
use super::lexer::{Token, TokenKind};
use crate::error::{QueryError, Result};

/// Decomposes the tokens following `WHERE` (terminator excluded).
///
/// Clauses and connectives come out in textual order, so a successful result always has
/// one connective fewer than clauses.
pub fn decompose(tokens: &[Token]) -> Result<Filter> {
    if tokens.is_empty() {
        return Err(QueryError::Syntax("Empty WHERE clause".to_string()));
    }

    let mut where_clauses = Vec::new();
    let mut operators = Vec::new();
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        let connective = match token.kind {
            TokenKind::And => Connective::And,
            TokenKind::Or => Connective::Or,
            _ => continue,
        };
        where_clauses.push(clause_between(tokens, start, i)?);
        operators.push(connective);
        start = i + 1;
    }
    where_clauses.push(clause_between(tokens, start, tokens.len())?);

    Ok(Filter::new(where_clauses, operators))
}

/// Parses one atomic clause.
pub fn parse_clause(tokens: &[Token]) -> Result<WhereClause> {
    if let [column, op, value] = tokens {
        if let (TokenKind::Identifier(column), Some(comparator), Some(literal)) =
            (&column.kind, comparator(&op.kind), value.kind.text())
        {
            return Ok(WhereClause::new(column.clone(), comparator, literal));
        }
    }

    // `a=1 XOR b=2`: a bare word where a connective belongs.
    if let [_, op, _, word, ..] = tokens {
        if comparator(&op.kind).is_some() {
            if let TokenKind::Identifier(word) = &word.kind {
                return Err(QueryError::Operator(word.clone()));
            }
        }
    }

    Err(QueryError::Syntax(format!("Invalid condition: {}", render(tokens))))
}

pub fn comparator(kind: &TokenKind) -> Option<Comparator> {
    match kind {
        TokenKind::Eq => Some(Comparator::Eq),
        TokenKind::NotEq => Some(Comparator::NotEq),
        TokenKind::Gt => Some(Comparator::Gt),
        TokenKind::Lt => Some(Comparator::Lt),
        TokenKind::GtEq => Some(Comparator::GtEq),
        TokenKind::LtEq => Some(Comparator::LtEq),
        _ => None,
    }
}

fn clause_between(tokens: &[Token], start: usize, end: usize) -> Result<WhereClause> {
    if start == end {
        return Err(QueryError::Syntax(format!(
            "Missing condition around connective in WHERE clause: {}",
            render(tokens)
        )));
    }
    parse_clause(&tokens[start..end])
}

pub(crate) fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.kind.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
