//! Row predicates: atomic comparisons folded left-to-right by their connectives.
//!
//! There is no operator precedence. `a=1 AND b=2 OR c=3` is `((a=1) AND (b=2)) OR (c=3)`
//! and `a=1 OR b=2 AND c=3` is `((a=1) OR (b=2)) AND (c=3)`.

use std::cmp::Ordering;

use super::ast::{Comparator, Connective, Filter, WhereClause};
use crate::error::{QueryError, Result};
use crate::storage::table::{Header, Row};

/// Parses a cell or literal as a finite number. The whole trimmed text must be the number:
/// `12abc` is text, not 12.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl Comparator {
    /// Compares a stored cell against a literal. Both sides are compared numerically when
    /// both parse as numbers, otherwise as raw strings. A missing cell only satisfies `!=`.
    pub fn evaluate(&self, cell: Option<&str>, literal: &str) -> bool {
        let Some(cell) = cell else {
            return *self == Comparator::NotEq;
        };

        let ordering = match (parse_number(cell), parse_number(literal)) {
            (Some(x), Some(y)) => match x.partial_cmp(&y) {
                Some(ordering) => ordering,
                None => return false,
            },
            _ => cell.cmp(literal),
        };

        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::NotEq => ordering != Ordering::Equal,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::GtEq => ordering != Ordering::Less,
            Comparator::LtEq => ordering != Ordering::Greater,
        }
    }
}

/// Folds atomic results strictly left to right. An empty list accepts the row.
pub fn combine(atoms: &[bool], connectives: &[Connective]) -> Result<bool> {
    let Some((&first, rest)) = atoms.split_first() else {
        return Ok(true);
    };
    if connectives.len() != rest.len() {
        return Err(connective_mismatch(atoms.len(), connectives.len()));
    }

    Ok(rest
        .iter()
        .zip(connectives)
        .fold(first, |acc, (&atom, connective)| match connective {
            Connective::And => acc && atom,
            Connective::Or => acc || atom,
        }))
}

/// Ordering used by ORDER BY. Numbers compare numerically and sort before text, text
/// compares byte-wise, which keeps the order total for mixed columns.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// How unknown WHERE columns are treated when a filter is bound to a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCheck {
    /// Unknown columns fail with a field error (reads).
    Strict,
    /// Unknown columns evaluate as missing cells (updates and deletes).
    Lenient,
}

/// A filter whose columns have been resolved against a table header.
#[derive(Debug)]
pub struct BoundFilter<'f> {
    clauses: Vec<(Option<usize>, &'f WhereClause)>,
    operators: &'f [Connective],
}

impl Filter {
    pub fn bind(&self, header: &Header, check: FieldCheck) -> Result<BoundFilter<'_>> {
        let expected = self.where_clauses.len().saturating_sub(1);
        if self.operators.len() != expected {
            return Err(connective_mismatch(
                self.where_clauses.len(),
                self.operators.len(),
            ));
        }

        let clauses = self
            .where_clauses
            .iter()
            .map(|clause| match header.column_index(&clause.column) {
                Some(idx) => Ok((Some(idx), clause)),
                None if check == FieldCheck::Lenient => Ok((None, clause)),
                None => Err(QueryError::Field(format!(
                    "Invalid field in WHERE clause: {}",
                    clause.column
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BoundFilter {
            clauses,
            operators: &self.operators,
        })
    }
}

impl BoundFilter<'_> {
    pub fn matches(&self, row: &Row) -> Result<bool> {
        let atoms: Vec<bool> = self
            .clauses
            .iter()
            .map(|(idx, clause)| {
                let cell = idx.and_then(|i| row.get(i));
                clause.comparator.evaluate(cell, &clause.literal)
            })
            .collect();
        combine(&atoms, self.operators)
    }
}

fn connective_mismatch(clauses: usize, connectives: usize) -> QueryError {
    QueryError::Operator(format!(
        "{} clauses need {} connectives, found {}",
        clauses,
        clauses.saturating_sub(1),
        connectives
    ))
}
