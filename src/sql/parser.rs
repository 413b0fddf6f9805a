//! Statement classification.
//!
//! A statement is tried against each shape in a fixed order; the first shape that matches
//! the whole token stream decides the statement kind, and only then are names and fields
//! validated. Several shapes share a prefix with later ones (a plain SELECT is a prefix of
//! an ordered SELECT), so the order of [`SHAPES`] matters.

use tracing::trace;

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use super::where_clause::{comparator, decompose};
use crate::error::{QueryError, Result};
use crate::storage::database::validate_name;

type ShapeFn = fn(&mut Cursor<'_>) -> Option<Result<Statement>>;

/// Statement shapes in trial order.
const SHAPES: [(&str, ShapeFn); 11] = [
    ("show_tables", show_tables),
    ("use_database", use_database),
    ("drop_table", drop_table),
    ("select", select),
    ("select_order", select_order),
    ("select_where_order", select_where_order),
    ("select_where", select_where),
    ("update", update),
    ("create_table", create_table),
    ("insert", insert),
    ("delete", delete),
];

pub struct Parser {
    input: String,
    tokens: Vec<Token>,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self> {
        let tokens = Lexer::new(input).tokenize().map_err(QueryError::Syntax)?;
        Ok(Self {
            input: input.to_string(),
            tokens,
        })
    }

    pub fn parse(&self) -> Result<Statement> {
        for (name, shape) in SHAPES {
            let mut cursor = Cursor::new(&self.tokens);
            if let Some(result) = shape(&mut cursor) {
                trace!(shape = name, "matched statement shape");
                return result;
            }
        }
        Err(QueryError::Syntax(format!("Invalid query: {}", self.input.trim())))
    }
}

/// Parses one `;`-terminated statement.
pub fn parse_statement(input: &str) -> Result<Statement> {
    Parser::new(input)?.parse()
}

/// Structural matching over the token stream. Every method returns `None` when the
/// shape does not match, so recognisers can chain them with `?`.
struct Cursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.position).map(|t| &t.kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Option<()> {
        if self.check(&kind) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        self.expect(kind).is_some()
    }

    /// A name or value: bare word, number or quoted text.
    fn word(&mut self) -> Option<String> {
        let text = self.peek_kind()?.text()?.to_string();
        self.advance();
        Some(text)
    }

    fn comparator(&mut self) -> Option<Comparator> {
        let op = comparator(self.peek_kind()?)?;
        self.advance();
        Some(op)
    }

    /// `;` followed by the end of input.
    fn end(&mut self) -> Option<()> {
        self.expect(TokenKind::Semicolon)?;
        self.expect(TokenKind::Eof)
    }

    /// One or more items separated by commas.
    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> Option<T>) -> Option<Vec<T>> {
        let mut items = vec![item(self)?];
        while self.eat(TokenKind::Comma) {
            items.push(item(self)?);
        }
        Some(items)
    }

    /// `( item, ... )`
    fn parenthesized<T>(&mut self, item: impl FnMut(&mut Self) -> Option<T>) -> Option<Vec<T>> {
        self.expect(TokenKind::LParen)?;
        let items = self.list(item)?;
        self.expect(TokenKind::RParen)?;
        Some(items)
    }

    /// Selected columns: `*` or names.
    fn fields(&mut self) -> Option<Vec<String>> {
        self.list(|c| {
            if c.eat(TokenKind::Star) {
                Some("*".to_string())
            } else {
                c.word()
            }
        })
    }

    /// Tokens up to (not including) the first token matching `stop`.
    fn until(&mut self, stop: impl Fn(&TokenKind) -> bool) -> &'a [Token] {
        let start = self.position;
        while let Some(kind) = self.peek_kind() {
            if stop(kind) || *kind == TokenKind::Eof {
                break;
            }
            self.position += 1;
        }
        &self.tokens[start..self.position]
    }

    /// `ORDER BY [column] [ASC|DESC] ;` with the column left empty when absent.
    fn order_by(&mut self) -> Option<(String, bool)> {
        self.expect(TokenKind::Order)?;
        self.expect(TokenKind::By)?;
        let column = match self.peek_kind()? {
            TokenKind::Identifier(_) | TokenKind::String(_) => self.word()?,
            _ => String::new(),
        };
        let ascending = match self.peek_kind()? {
            TokenKind::Asc => {
                self.advance();
                true
            }
            TokenKind::Desc => {
                self.advance();
                false
            }
            _ => true,
        };
        self.end()?;
        Some((column, ascending))
    }
}

fn show_tables(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    c.expect(TokenKind::Show)?;
    c.expect(TokenKind::Tables)?;
    c.end()?;
    Some(Ok(Statement::ListTables))
}

fn use_database(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    if !c.eat(TokenKind::Create) {
        c.expect(TokenKind::Use)?;
    }
    c.expect(TokenKind::Database)?;
    let name = c.word()?;
    c.end()?;
    Some(validate_name(&name, "database").map(|_| Statement::CreateOrUseDatabase { name }))
}

fn drop_table(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    c.expect(TokenKind::Drop)?;
    c.expect(TokenKind::Table)?;
    let name = c.word()?;
    c.end()?;
    Some(validate_name(&name, "table").map(|_| Statement::DropTable { name }))
}

/// `SELECT fields FROM name` shared by the four select shapes.
fn select_head(c: &mut Cursor<'_>) -> Option<(Vec<String>, String)> {
    c.expect(TokenKind::Select)?;
    let fields = c.fields()?;
    c.expect(TokenKind::From)?;
    let name = c.word()?;
    Some((fields, name))
}

fn select(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    let (fields, name) = select_head(c)?;
    c.end()?;
    Some(validate_name(&name, "table").map(|_| Statement::Read {
        name,
        fields,
        filter: Filter::default(),
    }))
}

fn select_order(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    let (fields, name) = select_head(c)?;
    let (column, ascending) = c.order_by()?;
    Some(build_ordered(name, fields, Filter::default(), column, ascending))
}

fn select_where_order(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    let (fields, name) = select_head(c)?;
    c.expect(TokenKind::Where)?;
    let condition = c.until(|k| matches!(k, TokenKind::Order | TokenKind::Semicolon));
    let (column, ascending) = c.order_by()?;
    Some(
        decompose(condition)
            .and_then(|filter| build_ordered(name, fields, filter, column, ascending)),
    )
}

fn select_where(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    let (fields, name) = select_head(c)?;
    c.expect(TokenKind::Where)?;
    let condition = c.until(|k| *k == TokenKind::Semicolon);
    c.end()?;
    Some(
        validate_name(&name, "table")
            .and_then(|_| decompose(condition))
            .map(|filter| Statement::Read {
                name,
                fields,
                filter,
            }),
    )
}

fn build_ordered(
    name: String,
    fields: Vec<String>,
    filter: Filter,
    column: String,
    ascending: bool,
) -> Result<Statement> {
    validate_name(&name, "table")?;
    if column.is_empty() {
        return Err(QueryError::EmptyField(
            "Sorting column can't be empty".to_string(),
        ));
    }
    Ok(Statement::ReadOrdered {
        name,
        fields,
        filter,
        order: OrderBy { column, ascending },
    })
}

fn update(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    c.expect(TokenKind::Update)?;
    c.expect(TokenKind::Table)?;
    let name = c.word()?;
    c.expect(TokenKind::Set)?;
    let assignments = c.list(|c| {
        let column = c.word()?;
        let op = c.comparator()?;
        let value = c.word()?;
        Some((column, op, value))
    })?;
    c.expect(TokenKind::Where)?;
    let condition = c.until(|k| *k == TokenKind::Semicolon);
    c.end()?;

    Some(build_update(name, assignments, condition))
}

fn build_update(
    name: String,
    assignments: Vec<(String, Comparator, String)>,
    condition: &[Token],
) -> Result<Statement> {
    validate_name(&name, "table")?;
    let assignments = assignments
        .into_iter()
        .map(|(column, op, value)| {
            if op != Comparator::Eq {
                return Err(QueryError::Syntax(format!(
                    "Invalid assignment operator '{}' for {}",
                    op, column
                )));
            }
            Ok(Assignment::new(column, value))
        })
        .collect::<Result<Vec<_>>>()?;
    let filter = decompose(condition)?;
    Ok(Statement::Update {
        name,
        assignments,
        filter,
    })
}

fn create_table(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    c.expect(TokenKind::Create)?;
    c.expect(TokenKind::Table)?;
    let name = c.word()?;
    let fields = c.parenthesized(Cursor::word)?;
    c.end()?;

    Some(build_create(name, fields))
}

fn build_create(name: String, fields: Vec<String>) -> Result<Statement> {
    validate_name(&name, "table")?;
    for field in &fields {
        validate_name(field, "column")?;
    }
    Ok(Statement::CreateTable { name, fields })
}

fn insert(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    c.expect(TokenKind::Insert)?;
    c.expect(TokenKind::Into)?;
    let name = c.word()?;
    let fields = c.parenthesized(Cursor::word)?;
    c.expect(TokenKind::Values)?;
    let mut rows = vec![c.parenthesized(Cursor::word)?];
    while !c.check(&TokenKind::Semicolon) {
        c.eat(TokenKind::Comma);
        rows.push(c.parenthesized(Cursor::word)?);
    }
    c.end()?;

    Some(validate_name(&name, "table").map(|_| Statement::Insert { name, fields, rows }))
}

fn delete(c: &mut Cursor<'_>) -> Option<Result<Statement>> {
    c.expect(TokenKind::Delete)?;
    c.expect(TokenKind::From)?;
    let name = c.word()?;
    c.expect(TokenKind::Where)?;
    let condition = c.until(|k| *k == TokenKind::Semicolon);
    c.end()?;

    Some(
        validate_name(&name, "table")
            .and_then(|_| decompose(condition))
            .map(|filter| Statement::Delete { name, filter }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Statement> {
        parse_statement(input)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_show_tables() {
        assert_eq!(parse("SHOW TABLES;").unwrap(), Statement::ListTables);
        assert_eq!(parse("  show tables ;").unwrap(), Statement::ListTables);
    }

    #[test]
    fn test_create_and_use_database() {
        assert_eq!(
            parse("CREATE DATABASE shop;").unwrap(),
            Statement::CreateOrUseDatabase {
                name: "shop".to_string()
            }
        );
        assert_eq!(
            parse("use database shop;").unwrap(),
            Statement::CreateOrUseDatabase {
                name: "shop".to_string()
            }
        );
        assert!(matches!(
            parse("USE DATABASE 1shop;"),
            Err(QueryError::Name(_))
        ));
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            parse("DROP TABLE users;").unwrap(),
            Statement::DropTable {
                name: "users".to_string()
            }
        );
        assert!(matches!(parse("DROP TABLE _x;"), Err(QueryError::Name(_))));
    }

    #[test]
    fn test_select_all() {
        assert_eq!(
            parse("SELECT * FROM users;").unwrap(),
            Statement::Read {
                name: "users".to_string(),
                fields: strings(&["*"]),
                filter: Filter::default(),
            }
        );
    }

    #[test]
    fn test_select_fields_are_trimmed() {
        let stmt = parse("select  id ,  name from users;").unwrap();
        assert!(matches!(stmt, Statement::Read { ref fields, .. } if *fields == strings(&["id", "name"])));
    }

    #[test]
    fn test_select_invalid_table_name() {
        assert!(matches!(
            parse("SELECT * FROM 9users;"),
            Err(QueryError::Name(_))
        ));
    }

    #[test]
    fn test_select_where() {
        let stmt = parse("SELECT a FROM t WHERE a = 1 AND b = 'x' or c > 2;").unwrap();
        match stmt {
            Statement::Read { filter, .. } => {
                assert_eq!(filter.where_clauses.len(), 3);
                assert_eq!(filter.operators, vec![Connective::And, Connective::Or]);
                assert_eq!(filter.where_clauses[1].literal, "x");
            }
            other => panic!("expected Read, got {:?}", other),
        }
    }

    #[test]
    fn test_select_order_without_where() {
        let stmt = parse("SELECT * FROM t ORDER BY age DESC;").unwrap();
        assert_eq!(
            stmt,
            Statement::ReadOrdered {
                name: "t".to_string(),
                fields: strings(&["*"]),
                filter: Filter::default(),
                order: OrderBy {
                    column: "age".to_string(),
                    ascending: false,
                },
            }
        );
    }

    #[test]
    fn test_select_order_defaults_to_ascending() {
        let stmt = parse("SELECT * FROM t WHERE a > 1 ORDER BY name;").unwrap();
        match stmt {
            Statement::ReadOrdered { order, filter, .. } => {
                assert!(order.ascending);
                assert_eq!(order.column, "name");
                assert_eq!(filter.where_clauses.len(), 1);
            }
            other => panic!("expected ReadOrdered, got {:?}", other),
        }
    }

    #[test]
    fn test_select_order_empty_column() {
        assert!(matches!(
            parse("SELECT * FROM t ORDER BY;"),
            Err(QueryError::EmptyField(_))
        ));
        assert!(matches!(
            parse("SELECT * FROM t WHERE a=1 ORDER BY DESC;"),
            Err(QueryError::EmptyField(_))
        ));
    }

    #[test]
    fn test_update() {
        let stmt = parse("UPDATE TABLE t SET b = z, c='w' WHERE a = 2;").unwrap();
        assert_eq!(
            stmt,
            Statement::Update {
                name: "t".to_string(),
                assignments: vec![Assignment::new("b", "z"), Assignment::new("c", "w")],
                filter: Filter::new(vec![WhereClause::new("a", Comparator::Eq, "2")], vec![]),
            }
        );
    }

    #[test]
    fn test_update_rejects_non_equals_assignment() {
        assert!(matches!(
            parse("UPDATE TABLE t SET b > 1 WHERE a = 2;"),
            Err(QueryError::Syntax(ref m)) if m.contains("assignment")
        ));
    }

    #[test]
    fn test_create_table() {
        assert_eq!(
            parse("CREATE TABLE t (a, b);").unwrap(),
            Statement::CreateTable {
                name: "t".to_string(),
                fields: strings(&["a", "b"]),
            }
        );
        assert!(matches!(
            parse("CREATE TABLE t (a, 2b);"),
            Err(QueryError::Name(_))
        ));
    }

    #[test]
    fn test_insert_multiple_tuples() {
        let stmt = parse("INSERT INTO t (a, b) VALUES (1, 'x'), (2, \"y\") (3, z);").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert {
                name: "t".to_string(),
                fields: strings(&["a", "b"]),
                rows: vec![
                    strings(&["1", "x"]),
                    strings(&["2", "y"]),
                    strings(&["3", "z"]),
                ],
            }
        );
    }

    #[test]
    fn test_insert_keeps_ragged_tuples_for_the_store() {
        let stmt = parse("INSERT INTO t (a, b) VALUES (1);").unwrap();
        assert!(matches!(stmt, Statement::Insert { ref rows, .. } if rows[0].len() == 1));
    }

    #[test]
    fn test_delete() {
        let stmt = parse("DELETE FROM t WHERE a=1;").unwrap();
        assert_eq!(
            stmt,
            Statement::Delete {
                name: "t".to_string(),
                filter: Filter::new(vec![WhereClause::new("a", Comparator::Eq, "1")], vec![]),
            }
        );
    }

    #[test]
    fn test_unknown_connective_is_operator_error() {
        assert!(matches!(
            parse("DELETE FROM t WHERE a=1 XOR b=2;"),
            Err(QueryError::Operator(_))
        ));
    }

    #[test]
    fn test_invalid_queries() {
        for input in [
            "SELECT * FROM t",
            "SELECT * FROM t; SELECT * FROM u;",
            "DELETE FROM t;",
            "UPDATE t SET a=1 WHERE b=2;",
            "FETCH ALL;",
            "",
        ] {
            assert!(
                matches!(parse(input), Err(QueryError::Syntax(_))),
                "expected syntax error for {:?}",
                input
            );
        }
    }
}
