use crate::{
    executor::predicate::{Predicate, Projection},
    planner::{
        error::PlannerError,
        logical_plan::{CreateTablePlan, DeletePlan, InsertPlan, Literal, LogicalPlan, SelectPlan},
    },
    storage::schema::ColumnSchema,
};
use sqlparser::{
    dialect::GenericDialect,
    tokenizer::{Token, Tokenizer},
};

/// Recursive-descent parser for the four supported statements:
///
/// ```text
/// CREATE TABLE <name> (<col> INT | <col> VARCHAR(<n>), ...)
/// INSERT INTO <name> VALUES (<literal>, ...)
/// SELECT * | <col>, ... FROM <name> [WHERE <col> = <literal>]
/// DELETE FROM <name> [WHERE <col> = <literal>]
/// ```
///
/// Keywords are case-sensitive. Literals are unsigned integers, `'single'`
/// or `"double"` quoted strings. A trailing `;` is allowed.
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_sql(&self, sql: &str) -> Result<LogicalPlan, PlannerError> {
        let dialect = GenericDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()
            .map_err(|e| lexing_error(sql, e.to_string()))?;
        let mut stream = TokenStream::new(tokens);

        match stream.peek_keyword() {
            Some("CREATE") => parse_create_table(&mut stream)
                .map(LogicalPlan::CreateTable)
                .map_err(PlannerError::MalformedCreateTable),
            Some("INSERT") => parse_insert(&mut stream)
                .map(LogicalPlan::Insert)
                .map_err(PlannerError::MalformedInsert),
            Some("SELECT") => parse_select(&mut stream)
                .map(LogicalPlan::Select)
                .map_err(PlannerError::MalformedSelect),
            Some("DELETE") => parse_delete(&mut stream)
                .map(LogicalPlan::Delete)
                .map_err(PlannerError::MalformedDelete),
            _ => Err(PlannerError::UnknownStatement(sql.trim().to_string())),
        }
    }
}

/// A lexing failure is reported as a malformed statement of the kind its
/// leading keyword names
fn lexing_error(sql: &str, message: String) -> PlannerError {
    match sql.split_whitespace().next() {
        Some("CREATE") => PlannerError::MalformedCreateTable(message),
        Some("INSERT") => PlannerError::MalformedInsert(message),
        Some("SELECT") => PlannerError::MalformedSelect(message),
        Some("DELETE") => PlannerError::MalformedDelete(message),
        _ => PlannerError::UnknownStatement(sql.trim().to_string()),
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_create_table(stream: &mut TokenStream) -> Result<CreateTablePlan, String> {
    stream.expect_keyword("CREATE")?;
    stream.expect_keyword("TABLE")?;
    let table_name = stream.identifier("table name")?;
    stream.expect(&Token::LParen, "'('")?;

    let mut columns = Vec::new();
    loop {
        columns.push(parse_column_definition(stream)?);
        if !stream.consume(&Token::Comma) {
            break;
        }
    }
    stream.expect(&Token::RParen, "')'")?;
    stream.finish()?;

    Ok(CreateTablePlan {
        table_name,
        columns,
    })
}

fn parse_column_definition(stream: &mut TokenStream) -> Result<ColumnSchema, String> {
    let name = stream.identifier("column name")?;
    if stream.consume_keyword("INT") {
        return Ok(ColumnSchema::int(name));
    }
    if stream.consume_keyword("VARCHAR") {
        stream.expect(&Token::LParen, "'(' after VARCHAR")?;
        let length = match stream.next() {
            Some(Token::Number(n, _)) => n
                .parse::<usize>()
                .map_err(|_| format!("invalid VARCHAR length {}", n))?,
            other => return Err(unexpected("VARCHAR length", other.as_ref())),
        };
        if length == 0 {
            return Err(format!("VARCHAR length of column '{}' must be positive", name));
        }
        stream.expect(&Token::RParen, "')' after VARCHAR length")?;
        return Ok(ColumnSchema::varchar(name, length));
    }
    Err(unexpected("column type INT or VARCHAR", stream.peek()))
}

fn parse_insert(stream: &mut TokenStream) -> Result<InsertPlan, String> {
    stream.expect_keyword("INSERT")?;
    stream.expect_keyword("INTO")?;
    let table_name = stream.identifier("table name")?;
    stream.expect_keyword("VALUES")?;
    stream.expect(&Token::LParen, "'('")?;

    let mut values = Vec::new();
    loop {
        values.push(stream.literal()?);
        if !stream.consume(&Token::Comma) {
            break;
        }
    }
    stream.expect(&Token::RParen, "')'")?;
    stream.finish()?;

    Ok(InsertPlan { table_name, values })
}

fn parse_select(stream: &mut TokenStream) -> Result<SelectPlan, String> {
    stream.expect_keyword("SELECT")?;
    let projection = if stream.consume(&Token::Mul) {
        Projection::All
    } else {
        let mut names = Vec::new();
        loop {
            names.push(stream.identifier("column name")?);
            if !stream.consume(&Token::Comma) {
                break;
            }
        }
        Projection::Columns(names)
    };
    stream.expect_keyword("FROM")?;
    let table_name = stream.identifier("table name")?;
    let predicate = parse_where(stream)?;
    stream.finish()?;

    Ok(SelectPlan {
        table_name,
        projection,
        predicate,
    })
}

fn parse_delete(stream: &mut TokenStream) -> Result<DeletePlan, String> {
    stream.expect_keyword("DELETE")?;
    stream.expect_keyword("FROM")?;
    let table_name = stream.identifier("table name")?;
    let predicate = parse_where(stream)?;
    stream.finish()?;

    Ok(DeletePlan {
        table_name,
        predicate,
    })
}

/// Optional `WHERE <col> = <literal>`
fn parse_where(stream: &mut TokenStream) -> Result<Option<Predicate>, String> {
    if !stream.consume_keyword("WHERE") {
        return Ok(None);
    }
    let column_name = stream.identifier("column name in WHERE")?;
    stream.expect(&Token::Eq, "'=' (only equality is supported)")?;
    let value = stream.literal()?;
    Ok(Some(Predicate::eq(column_name, value)))
}

fn unexpected(expected: &str, found: Option<&Token>) -> String {
    match found {
        Some(token) => format!("expected {}, found '{}'", expected, token),
        None => format!("expected {}, found end of input", expected),
    }
}

/// Token cursor with whitespace already removed
struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|token| !matches!(token, Token::Whitespace(_) | Token::EOF))
            .collect();
        Self {
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// The next token as a bare (unquoted) word
    fn peek_keyword(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Word(word)) if word.quote_style.is_none() => Some(word.value.as_str()),
            _ => None,
        }
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword() == Some(keyword) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), String> {
        if self.consume_keyword(keyword) {
            Ok(())
        } else {
            Err(unexpected(keyword, self.peek()))
        }
    }

    fn consume(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), String> {
        if self.consume(expected) {
            Ok(())
        } else {
            Err(unexpected(what, self.peek()))
        }
    }

    fn identifier(&mut self, what: &str) -> Result<String, String> {
        match self.peek_keyword() {
            Some(name) => {
                let name = name.to_string();
                self.position += 1;
                Ok(name)
            }
            None => Err(unexpected(what, self.peek())),
        }
    }

    fn literal(&mut self) -> Result<Literal, String> {
        match self.next() {
            Some(Token::Number(n, _)) => Ok(Literal::Number(n)),
            Some(Token::SingleQuotedString(s)) => Ok(Literal::Text(s)),
            Some(Token::DoubleQuotedString(s)) => Ok(Literal::Text(s)),
            Some(Token::Word(word)) if word.quote_style == Some('"') => Ok(Literal::Text(word.value)),
            other => Err(unexpected("a number or quoted string", other.as_ref())),
        }
    }

    /// Accept an optional `;`, then require end of input
    fn finish(&mut self) -> Result<(), String> {
        self.consume(&Token::SemiColon);
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(format!("unexpected trailing '{}'", token)),
        }
    }
}
