use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Show,
    Tables,
    Create,
    Use,
    Database,
    Drop,
    Table,
    Select,
    From,
    Where,
    And,
    Or,
    Order,
    By,
    Asc,
    Desc,
    Update,
    Set,
    Insert,
    Into,
    Values,
    Delete,

    // Literals
    Number(String),
    String(String),
    Identifier(String),

    // Comparators
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Punctuation
    Star,
    Comma,
    Semicolon,
    LParen,
    RParen,

    // Special
    Eof,
}

impl TokenKind {
    /// Text of a token that can stand for a name or a value.
    pub fn text(&self) -> Option<&str> {
        match self {
            TokenKind::Number(s) | TokenKind::String(s) | TokenKind::Identifier(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Show => "SHOW",
            TokenKind::Tables => "TABLES",
            TokenKind::Create => "CREATE",
            TokenKind::Use => "USE",
            TokenKind::Database => "DATABASE",
            TokenKind::Drop => "DROP",
            TokenKind::Table => "TABLE",
            TokenKind::Select => "SELECT",
            TokenKind::From => "FROM",
            TokenKind::Where => "WHERE",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Order => "ORDER",
            TokenKind::By => "BY",
            TokenKind::Asc => "ASC",
            TokenKind::Desc => "DESC",
            TokenKind::Update => "UPDATE",
            TokenKind::Set => "SET",
            TokenKind::Insert => "INSERT",
            TokenKind::Into => "INTO",
            TokenKind::Values => "VALUES",
            TokenKind::Delete => "DELETE",
            TokenKind::Number(n) => n.as_str(),
            TokenKind::String(s) => return write!(f, "'{}'", s),
            TokenKind::Identifier(s) => s.as_str(),
            TokenKind::Eq => "=",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Star => "*",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize) -> Self {
        Self { kind, position }
    }
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let position = self.position;

        match self.peek() {
            None => Ok(Token::new(TokenKind::Eof, position)),
            Some(c) => match c {
                ',' => {
                    self.advance();
                    Ok(Token::new(TokenKind::Comma, position))
                }
                ';' => {
                    self.advance();
                    Ok(Token::new(TokenKind::Semicolon, position))
                }
                '(' => {
                    self.advance();
                    Ok(Token::new(TokenKind::LParen, position))
                }
                ')' => {
                    self.advance();
                    Ok(Token::new(TokenKind::RParen, position))
                }
                '*' => {
                    self.advance();
                    Ok(Token::new(TokenKind::Star, position))
                }
                '-' => {
                    self.advance();
                    match self.peek() {
                        Some('-') => {
                            self.skip_line_comment();
                            self.next_token()
                        }
                        Some(d) if d.is_ascii_digit() => {
                            let mut word = String::from("-");
                            word.push_str(&self.read_word());
                            Ok(Token::new(classify_word(&word), position))
                        }
                        _ => Err(format!("Unexpected character '-' at position {}", position)),
                    }
                }
                '/' => {
                    self.advance();
                    if self.peek() == Some('*') {
                        self.skip_block_comment()?;
                        self.next_token()
                    } else {
                        Err(format!("Unexpected character '/' at position {}", position))
                    }
                }
                '=' => {
                    self.advance();
                    Ok(Token::new(TokenKind::Eq, position))
                }
                '<' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Ok(Token::new(TokenKind::LtEq, position))
                    } else if self.peek() == Some('>') {
                        self.advance();
                        Ok(Token::new(TokenKind::NotEq, position))
                    } else {
                        Ok(Token::new(TokenKind::Lt, position))
                    }
                }
                '>' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Ok(Token::new(TokenKind::GtEq, position))
                    } else {
                        Ok(Token::new(TokenKind::Gt, position))
                    }
                }
                '!' => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        Ok(Token::new(TokenKind::NotEq, position))
                    } else {
                        Err(format!("Unexpected character '!' at position {}", position))
                    }
                }
                '\'' | '"' => self.read_quoted(c),
                c if c.is_alphanumeric() || c == '_' => {
                    let word = self.read_word();
                    Ok(Token::new(classify_word(&word), position))
                }
                c => Err(format!("Unexpected character '{}' at position {}", c, position)),
            },
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), String> {
        self.advance(); // consume '*'
        loop {
            match self.advance() {
                None => return Err("Unterminated block comment".to_string()),
                Some('*') => {
                    if self.peek() == Some('/') {
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Reads a single- or double-quoted literal. The quotes are stripped; a doubled quote
    /// inside stands for one quote character.
    ///
    /// Quotes are not checked for balance: an opening quote that is never closed is dropped
    /// and the value runs up to the next separator, so `'x;` reads as `x`.
    fn read_quoted(&mut self, quote: char) -> Result<Token, String> {
        let position = self.position;
        self.advance(); // consume opening quote
        let checkpoint = (self.chars.clone(), self.position);
        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    (self.chars, self.position) = checkpoint;
                    return self.read_dangling(position);
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        value.push(quote);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
            }
        }

        Ok(Token::new(TokenKind::String(value), position))
    }

    /// Value following an unmatched quote. A quote with nothing after it is skipped.
    fn read_dangling(&mut self, position: usize) -> Result<Token, String> {
        let mut value = String::new();

        while let Some(c) = self.peek() {
            let separator = matches!(c, ',' | ';' | '(' | ')' | '=' | '<' | '>' | '!' | '\'' | '"');
            if separator || c.is_whitespace() {
                break;
            }
            value.push(c);
            self.advance();
        }

        if value.is_empty() {
            return self.next_token();
        }
        Ok(Token::new(TokenKind::String(value), position))
    }

    /// Reads a run of alphanumerics and underscores, plus a fractional part when the run is
    /// all digits and followed by `.<digit>`.
    fn read_word(&mut self) -> String {
        let mut word = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit()) && self.peek() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                word.push('.');
                self.advance();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        word.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        word
    }
}

/// Whether `word` is a reserved statement keyword, in any case.
pub fn is_keyword(word: &str) -> bool {
    !matches!(
        classify_word(word),
        TokenKind::Identifier(_) | TokenKind::Number(_)
    )
}

fn classify_word(word: &str) -> TokenKind {
    let digits = word.strip_prefix('-').unwrap_or(word);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return TokenKind::Number(word.to_string());
    }

    match word.to_uppercase().as_str() {
        "SHOW" => TokenKind::Show,
        "TABLES" => TokenKind::Tables,
        "CREATE" => TokenKind::Create,
        "USE" => TokenKind::Use,
        "DATABASE" => TokenKind::Database,
        "DROP" => TokenKind::Drop,
        "TABLE" => TokenKind::Table,
        "SELECT" => TokenKind::Select,
        "FROM" => TokenKind::From,
        "WHERE" => TokenKind::Where,
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "ORDER" => TokenKind::Order,
        "BY" => TokenKind::By,
        "ASC" => TokenKind::Asc,
        "DESC" => TokenKind::Desc,
        "UPDATE" => TokenKind::Update,
        "SET" => TokenKind::Set,
        "INSERT" => TokenKind::Insert,
        "INTO" => TokenKind::Into,
        "VALUES" => TokenKind::Values,
        "DELETE" => TokenKind::Delete,
        _ => TokenKind::Identifier(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_select() {
        let tokens = kinds("SELECT * FROM users;");

        assert_eq!(tokens[0], TokenKind::Select);
        assert_eq!(tokens[1], TokenKind::Star);
        assert_eq!(tokens[2], TokenKind::From);
        assert!(matches!(tokens[3], TokenKind::Identifier(ref s) if s == "users"));
        assert_eq!(tokens[4], TokenKind::Semicolon);
        assert_eq!(tokens[5], TokenKind::Eof);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("show Tables;"),
            vec![
                TokenKind::Show,
                TokenKind::Tables,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_quoted_values() {
        let tokens = kinds("'hello world' \"it\"\"s\" 'it''s'");

        assert_eq!(tokens[0], TokenKind::String("hello world".to_string()));
        assert_eq!(tokens[1], TokenKind::String("it\"s".to_string()));
        assert_eq!(tokens[2], TokenKind::String("it's".to_string()));
    }

    #[test]
    fn test_unmatched_quote_is_stripped() {
        assert_eq!(
            kinds("'abc;"),
            vec![
                TokenKind::String("abc".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("('2, y)"),
            vec![
                TokenKind::LParen,
                TokenKind::String("2".to_string()),
                TokenKind::Comma,
                TokenKind::Identifier("y".to_string()),
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("b = x';"),
            vec![
                TokenKind::Identifier("b".to_string()),
                TokenKind::Eq,
                TokenKind::Identifier("x".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_is_keyword() {
        assert!(is_keyword("select"));
        assert!(is_keyword("Values"));
        assert!(!is_keyword("users"));
        assert!(!is_keyword("42"));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 3.14 -7 1abc");

        assert_eq!(tokens[0], TokenKind::Number("42".to_string()));
        assert_eq!(tokens[1], TokenKind::Number("3.14".to_string()));
        assert_eq!(tokens[2], TokenKind::Number("-7".to_string()));
        assert_eq!(tokens[3], TokenKind::Identifier("1abc".to_string()));
    }

    #[test]
    fn test_comparators() {
        let tokens = kinds("= <> != < > <= >=");

        assert_eq!(tokens[0], TokenKind::Eq);
        assert_eq!(tokens[1], TokenKind::NotEq);
        assert_eq!(tokens[2], TokenKind::NotEq);
        assert_eq!(tokens[3], TokenKind::Lt);
        assert_eq!(tokens[4], TokenKind::Gt);
        assert_eq!(tokens[5], TokenKind::LtEq);
        assert_eq!(tokens[6], TokenKind::GtEq);
    }

    #[test]
    fn test_comparator_without_spaces() {
        let tokens = kinds("a>=10");
        assert_eq!(tokens[0], TokenKind::Identifier("a".to_string()));
        assert_eq!(tokens[1], TokenKind::GtEq);
        assert_eq!(tokens[2], TokenKind::Number("10".to_string()));
    }

    #[test]
    fn test_comments() {
        let tokens = kinds("SELECT -- pick all\n* /* block */ FROM t;");

        assert_eq!(tokens[0], TokenKind::Select);
        assert_eq!(tokens[1], TokenKind::Star);
        assert_eq!(tokens[2], TokenKind::From);
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("SELECT # FROM t;").tokenize().unwrap_err();
        assert!(err.contains('#'));
    }
}
