//! Statement parser for mysqldump output.
//!
//! The token stream is split at semicolons into statements, each statement is
//! classified by its leading keywords, and table definitions are parsed into a
//! [`TableDef`]. Everything the translator does not need to understand stays
//! opaque as a [`Fragment`].

use super::lexer::{LexError, Lexer, Position, Token, TokenKind};
use crate::ast::{
    AlterAction, AlterStmt, CheckDef, CheckExpr, ColumnDef, DropObject, DropStmt, EnumDef,
    ForeignKey, Fragment, Generated, IndexDef, IndexKind, InsertMode, InsertStmt, KeyDef,
    KeyPart, SqlType, Statement, StatementKind, TableConstraint, TableDef, TableOption,
};
use crate::error::ConvertError;
use std::iter::Peekable;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseReason {
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("expected {expected}, found `{found}`")]
    Expected {
        expected: &'static str,
        found: String,
    },
    #[error("unexpected end of statement, expected {0}")]
    UnexpectedEnd(&'static str),
    #[error("column clause `{0}` is neither a type nor a constraint")]
    UnknownClause(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("statement {statement} at {position}: {reason}")]
pub struct ParseError {
    pub statement: usize,
    pub position: Position,
    pub reason: ParseReason,
}

/// Parse a whole dump into statements, in source order.
///
/// `DELIMITER` lines are client directives: they switch the terminator and
/// produce no statement of their own.
pub fn parse_sql(input: &str) -> Result<Vec<Statement>, ConvertError> {
    let mut statements = Vec::new();
    let mut pending: Vec<Token> = Vec::new();
    let mut delimiter = String::from(";");
    let mut tokens = Lexer::new(input).peekable();

    while let Some(token) = tokens.next() {
        let token = token?;
        if token.is_keyword("DELIMITER") && pending.iter().all(Token::is_comment) {
            if !pending.is_empty() {
                let index = statements.len() + 1;
                statements.push(build_statement(input, index, std::mem::take(&mut pending))?);
            }
            delimiter = read_delimiter(input, &token, &mut tokens, statements.len() + 1)?;
            trace!(%delimiter, "statement delimiter changed");
            continue;
        }

        pending.push(token);
        if let Some(len) = delimiter_suffix(input, &pending, &delimiter) {
            pending.truncate(pending.len() - len);
            if !pending.is_empty() {
                let index = statements.len() + 1;
                statements.push(build_statement(input, index, std::mem::take(&mut pending))?);
            }
        }
    }
    // Last statement may lack its terminator, or be trailing comments
    if !pending.is_empty() {
        let index = statements.len() + 1;
        statements.push(build_statement(input, index, pending)?);
    }

    debug!(statements = statements.len(), "parsed dump");
    Ok(statements)
}

/// The first word after `DELIMITER`. The rest of the directive line is skipped.
fn read_delimiter<I>(
    input: &str,
    directive: &Token,
    tokens: &mut Peekable<I>,
    statement: usize,
) -> Result<String, ParseError>
where
    I: Iterator<Item = Result<Token, LexError>>,
{
    let rest = &input[directive.span.end..];
    let line_end = directive.span.end + rest.find('\n').unwrap_or(rest.len());
    let Some(delimiter) = input[directive.span.end..line_end].split_whitespace().next() else {
        return Err(ParseError {
            statement,
            position: directive.position,
            reason: ParseReason::UnexpectedEnd("delimiter"),
        });
    };
    while tokens
        .next_if(|t| matches!(t, Ok(t) if t.span.start < line_end))
        .is_some()
    {}
    Ok(delimiter.to_string())
}

/// How many trailing tokens of `pending` spell `delimiter`, written without
/// gaps between them.
fn delimiter_suffix(input: &str, pending: &[Token], delimiter: &str) -> Option<usize> {
    let end = pending.last()?.span.end;
    let mut start = end;
    for (i, token) in pending.iter().rev().enumerate() {
        if token.span.end != start {
            return None;
        }
        start = token.span.start;
        let text = &input[start..end];
        if text == delimiter {
            return Some(i + 1);
        }
        if text.len() >= delimiter.len() {
            return None;
        }
    }
    None
}

fn build_statement(
    source: &str,
    index: usize,
    mut tokens: Vec<Token>,
) -> Result<Statement, ConvertError> {
    let split = tokens
        .iter()
        .position(|t| !t.is_comment())
        .unwrap_or(tokens.len());
    let body = tokens.split_off(split);
    let mut comments = tokens;
    let position = comments
        .first()
        .or(body.first())
        .map(|t| t.position)
        .unwrap_or_default();

    if body.is_empty() {
        if let Some(first) = comments.iter().position(Token::is_conditional_comment) {
            let wrapped = comments.split_off(first);
            return build_conditional(source, index, position, comments, &wrapped);
        }
    }

    let raw = Fragment::from_tokens(source, &body);
    let code: Vec<Token> = body.into_iter().filter(|t| !t.is_comment()).collect();
    let kind = Parser::new(source, index, code).parse_statement()?;
    trace!(index, kind = kind.name(), "parsed statement");

    Ok(Statement {
        index,
        position,
        comments,
        kind,
        raw,
    })
}

/// A statement written entirely inside `/*!NNNNN ... */` comments, the way
/// mysqldump wraps views, triggers and session settings. The comment bodies
/// are joined and parsed like any other statement.
fn build_conditional(
    source: &str,
    index: usize,
    position: Position,
    comments: Vec<Token>,
    wrapped: &[Token],
) -> Result<Statement, ConvertError> {
    let mut text = String::new();
    let mut body = Vec::new();
    for comment in wrapped.iter().filter(|t| t.is_conditional_comment()) {
        let (inner, origin) = conditional_body(source, comment);
        let inner = inner.trim_end();
        if !text.is_empty() && !inner.starts_with(char::is_whitespace) {
            text.push(' ');
        }
        let base = text.len();
        for token in Lexer::with_origin(inner, origin) {
            body.push(token?.shifted(base));
        }
        text.push_str(inner);
    }

    let raw = Fragment::from_tokens(&text, &body);
    let code: Vec<Token> = body.into_iter().filter(|t| !t.is_comment()).collect();
    let kind = Parser::new(&text, index, code).parse_statement()?;
    trace!(index, kind = kind.name(), "parsed conditional statement");

    Ok(Statement {
        index,
        position,
        comments,
        kind,
        raw,
    })
}

/// Text between `/*!40101` and `*/`, and where it starts in the dump.
fn conditional_body<'a>(source: &'a str, comment: &Token) -> (&'a str, Position) {
    let text = &source[comment.span.start..comment.span.end];
    let version = text[3..].bytes().take_while(u8::is_ascii_digit).count();
    let skip = 3 + version;
    let origin = Position {
        line: comment.position.line,
        column: comment.position.column + skip,
        offset: comment.position.offset + skip,
    };
    (&text[skip..text.len() - 2], origin)
}

struct Parser<'a> {
    source: &'a str,
    statement: usize,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, statement: usize, tokens: Vec<Token>) -> Self {
        Self {
            source,
            statement,
            tokens,
            pos: 0,
        }
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.current().cloned();
        self.advance();
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.current().is_some_and(|t| t.is_keyword(keyword))
    }

    fn at_punct(&self, c: char) -> bool {
        self.current().is_some_and(|t| t.is_punct(c))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a keyword sequence only if all of it is present.
    fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let matches = keywords
            .iter()
            .enumerate()
            .all(|(i, kw)| self.peek_at(i).is_some_and(|t| t.is_keyword(kw)));
        if matches {
            self.pos += keywords.len();
        }
        matches
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, reason: ParseReason) -> ParseError {
        let position = self
            .current()
            .or(self.tokens.last())
            .map(|t| t.position)
            .unwrap_or_default();
        ParseError {
            statement: self.statement,
            position,
            reason,
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.current() {
            Some(token) => self.error(ParseReason::Expected {
                expected,
                found: token.text.clone(),
            }),
            None => self.error(ParseReason::UnexpectedEnd(expected)),
        }
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), ParseError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn expect_punct(&mut self, c: char, expected: &'static str) -> Result<(), ParseError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_name(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.current() {
            Some(token) if token.is_name() => {
                let name = token.text.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_any(&mut self, expected: &'static str) -> Result<Token, ParseError> {
        self.next_token()
            .ok_or_else(|| self.error(ParseReason::UnexpectedEnd(expected)))
    }

    /// `name` or `schema.name`; only the last part is kept.
    fn parse_table_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_name("table name")?;
        while self.eat_punct('.') {
            name = self.expect_name("table name")?;
        }
        Ok(name)
    }

    fn fragment(&self, start: usize, end: usize) -> Fragment {
        Fragment::from_tokens(self.source, &self.tokens[start..end])
    }

    fn source_text(&self, start: usize, end: usize) -> String {
        if end <= start {
            return String::new();
        }
        let from = self.tokens[start].span.start;
        let to = self.tokens[end - 1].span.end;
        self.source[from..to].to_string()
    }

    fn check_balance(&self) -> Result<(), ParseError> {
        let mut open: Vec<&Token> = Vec::new();
        for token in &self.tokens {
            if token.is_punct('(') {
                open.push(token);
            } else if token.is_punct(')') && open.pop().is_none() {
                return Err(ParseError {
                    statement: self.statement,
                    position: token.position,
                    reason: ParseReason::UnbalancedParens,
                });
            }
        }
        match open.last() {
            Some(token) => Err(ParseError {
                statement: self.statement,
                position: token.position,
                reason: ParseReason::UnbalancedParens,
            }),
            None => Ok(()),
        }
    }

    /// Skip a parenthesized group starting at the current `(`.
    fn skip_group(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.next_token() {
            if token.is_punct('(') {
                depth += 1;
            } else if token.is_punct(')') {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Skip to the next `,` or `)` outside any nested parentheses.
    fn skip_to_element_end(&mut self) {
        while let Some(token) = self.current() {
            if token.is_punct(',') || token.is_punct(')') {
                break;
            }
            if token.is_punct('(') {
                self.skip_group();
            } else {
                self.advance();
            }
        }
    }

    /// `( ... )`, returning the inner text.
    fn parse_paren_fragment(&mut self) -> Result<Fragment, ParseError> {
        if !self.at_punct('(') {
            return Err(self.unexpected("`(`"));
        }
        let open = self.pos;
        self.skip_group();
        Ok(self.fragment(open + 1, self.pos - 1))
    }

    fn parse_name_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect_punct('(', "`(`")?;
        let mut names = Vec::new();
        loop {
            names.push(self.expect_name("column name")?);
            if !self.eat_punct(',') {
                break;
            }
        }
        self.expect_punct(')', "`)`")?;
        Ok(names)
    }

    fn parse_statement(&mut self) -> Result<StatementKind, ParseError> {
        let Some(first) = self.current() else {
            return Ok(StatementKind::Comment);
        };
        if first.kind != TokenKind::Word {
            return Ok(StatementKind::Unmapped);
        }
        let keyword = first.text.to_ascii_uppercase();
        let second = self.peek_at(1);
        let table_next = second.is_some_and(|t| t.is_keyword("TABLE"));
        let tables_next = table_next || second.is_some_and(|t| t.is_keyword("TABLES"));

        match keyword.as_str() {
            "CREATE" if table_next => {
                self.check_balance()?;
                self.parse_create_table()
            }
            "INSERT" | "REPLACE" => {
                self.check_balance()?;
                self.parse_insert()
            }
            "SET" => Ok(StatementKind::Set),
            "LOCK" | "UNLOCK" if tables_next => Ok(StatementKind::LockTables),
            "DROP" => self.parse_drop(),
            "ALTER" => self.parse_alter(),
            _ => Ok(StatementKind::Unmapped),
        }
    }

    fn parse_create_table(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // CREATE
        self.advance(); // TABLE
        let if_not_exists = self.eat_keywords(&["IF", "NOT", "EXISTS"]);
        let name = self.parse_table_name()?;

        // CREATE TABLE ... LIKE / CREATE TABLE ... SELECT
        if !self.at_punct('(') {
            return Ok(StatementKind::Unmapped);
        }
        self.advance();

        let mut table = TableDef {
            name,
            if_not_exists,
            ..Default::default()
        };

        if !self.eat_punct(')') {
            loop {
                self.parse_table_element(&mut table)?;
                if self.eat_punct(',') {
                    continue;
                }
                if self.eat_punct(')') {
                    break;
                }
                return Err(self.unexpected("`,` or `)`"));
            }
        }

        if !self.parse_table_options(&mut table)? {
            return Ok(StatementKind::Unmapped);
        }

        Ok(StatementKind::CreateTable(table))
    }

    fn at_constraint_keyword(&self) -> bool {
        [
            "PRIMARY", "UNIQUE", "FOREIGN", "CHECK", "KEY", "INDEX", "FULLTEXT", "SPATIAL",
        ]
        .iter()
        .any(|kw| self.at_keyword(kw))
    }

    /// `CONSTRAINT [name]` prefix: whether the keyword was present, and the name.
    fn parse_constraint_name(&mut self) -> (bool, Option<String>) {
        if !self.eat_keyword("CONSTRAINT") {
            return (false, None);
        }
        if !self.at_constraint_keyword() && self.current().is_some_and(Token::is_name) {
            let name = self.current().map(|t| t.text.clone());
            self.advance();
            return (true, name);
        }
        (true, None)
    }

    fn parse_table_element(&mut self, table: &mut TableDef) -> Result<(), ParseError> {
        let (has_constraint, name) = self.parse_constraint_name();

        if self.at_constraint_keyword() {
            let constraint = self.parse_constraint(name)?;
            table.add_constraint(constraint);
            return Ok(());
        }
        if has_constraint {
            return Err(self.unexpected("constraint definition"));
        }

        let (column, constraints) = self.parse_column()?;
        if column.sql_type.base == "enum" {
            table.enums.push(EnumDef {
                column: column.name.clone(),
                values: column.sql_type.params.clone(),
            });
        }
        table.columns.push(column);
        for constraint in constraints {
            table.add_constraint(constraint);
        }
        Ok(())
    }

    /// Optional index name before the key part list.
    fn parse_index_name(&mut self) -> Option<String> {
        match self.current() {
            Some(token) if token.is_name() && !token.is_keyword("USING") => {
                let name = token.text.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    fn skip_index_type(&mut self) {
        if self.eat_keyword("USING") {
            self.advance(); // BTREE / HASH
        }
    }

    fn parse_key_parts(&mut self) -> Result<Vec<KeyPart>, ParseError> {
        self.skip_index_type();
        self.expect_punct('(', "`(` before key columns")?;
        let mut parts = Vec::new();
        loop {
            let mut part = KeyPart::new(self.expect_name("key column")?);
            if self.eat_punct('(') {
                part.prefix_len = Some(self.expect_any("prefix length")?.text);
                self.expect_punct(')', "`)` after prefix length")?;
            }
            if self.eat_keyword("DESC") {
                part.descending = true;
            } else {
                self.eat_keyword("ASC");
            }
            parts.push(part);
            if !self.eat_punct(',') {
                break;
            }
        }
        self.expect_punct(')', "`)` after key columns")?;
        // Index options: USING BTREE, COMMENT '...', KEY_BLOCK_SIZE=8, ...
        self.skip_to_element_end();
        Ok(parts)
    }

    fn parse_constraint(&mut self, name: Option<String>) -> Result<TableConstraint, ParseError> {
        if self.eat_keyword("PRIMARY") {
            self.expect_keyword("KEY")?;
            let parts = self.parse_key_parts()?;
            return Ok(TableConstraint::PrimaryKey(KeyDef { name, parts }));
        }

        if self.eat_keyword("UNIQUE") {
            if !self.eat_keyword("KEY") {
                self.eat_keyword("INDEX");
            }
            let index_name = self.parse_index_name();
            let parts = self.parse_key_parts()?;
            return Ok(TableConstraint::Unique(KeyDef {
                name: name.or(index_name),
                parts,
            }));
        }

        if self.eat_keyword("FOREIGN") {
            self.expect_keyword("KEY")?;
            let index_name = self.parse_index_name();
            let columns = self.parse_name_list()?;
            let fk = self.parse_references(name.or(index_name), columns)?;
            return Ok(TableConstraint::ForeignKey(fk));
        }

        if self.eat_keyword("CHECK") {
            let expr = self.parse_paren_fragment()?;
            let enforced = self.parse_enforced();
            return Ok(TableConstraint::Check(CheckDef {
                name,
                expr: CheckExpr::Source(expr),
                enforced,
            }));
        }

        let kind = if self.eat_keyword("FULLTEXT") {
            IndexKind::Fulltext
        } else if self.eat_keyword("SPATIAL") {
            IndexKind::Spatial
        } else {
            IndexKind::Plain
        };
        if !self.eat_keyword("KEY") && !self.eat_keyword("INDEX") && kind == IndexKind::Plain {
            return Err(self.unexpected("constraint definition"));
        }
        let index_name = self.parse_index_name();
        let parts = self.parse_key_parts()?;
        Ok(TableConstraint::Index(IndexDef {
            name: name.or(index_name),
            kind,
            parts,
        }))
    }

    fn parse_enforced(&mut self) -> bool {
        if self.eat_keywords(&["NOT", "ENFORCED"]) {
            return false;
        }
        self.eat_keyword("ENFORCED");
        true
    }

    fn parse_references(
        &mut self,
        name: Option<String>,
        columns: Vec<String>,
    ) -> Result<ForeignKey, ParseError> {
        self.expect_keyword("REFERENCES")?;
        let ref_table = self.parse_table_name()?;
        let ref_columns = if self.at_punct('(') {
            self.parse_name_list()?
        } else {
            Vec::new()
        };

        if self.eat_keyword("MATCH") {
            self.advance(); // FULL / PARTIAL / SIMPLE
        }

        let mut fk = ForeignKey {
            name,
            columns,
            ref_table,
            ref_columns,
            on_delete: None,
            on_update: None,
        };
        loop {
            if self.eat_keywords(&["ON", "DELETE"]) {
                fk.on_delete = Some(self.parse_ref_action()?);
            } else if self.eat_keywords(&["ON", "UPDATE"]) {
                fk.on_update = Some(self.parse_ref_action()?);
            } else {
                break;
            }
        }
        Ok(fk)
    }

    fn parse_ref_action(&mut self) -> Result<String, ParseError> {
        const ACTIONS: &[&[&str]] = &[
            &["CASCADE"],
            &["RESTRICT"],
            &["SET", "NULL"],
            &["SET", "DEFAULT"],
            &["NO", "ACTION"],
        ];
        for action in ACTIONS {
            if self.eat_keywords(action) {
                return Ok(action.join(" "));
            }
        }
        Err(self.unexpected("referential action"))
    }

    fn parse_type(&mut self) -> Result<SqlType, ParseError> {
        let token = match self.current() {
            Some(token) if token.kind == TokenKind::Word => token,
            Some(token) => return Err(self.error(ParseReason::UnknownClause(token.text.clone()))),
            None => return Err(self.error(ParseReason::UnexpectedEnd("column type"))),
        };
        let mut base = token.text.to_ascii_lowercase();
        self.advance();

        if base == "national" {
            let next = self.expect_name("character type")?;
            base = format!("national {}", next.to_ascii_lowercase());
        }
        if base == "double" && self.eat_keyword("PRECISION") {
            base.push_str(" precision");
        }
        if (base == "char" || base == "character") && self.eat_keyword("VARYING") {
            base.push_str(" varying");
        }

        let mut params = Vec::new();
        if self.eat_punct('(') {
            loop {
                let param = self.expect_any("type argument")?;
                match param.kind {
                    TokenKind::Number | TokenKind::Str | TokenKind::DoubleQuoted => {
                        params.push(param.text)
                    }
                    _ => {
                        self.pos -= 1;
                        return Err(self.unexpected("type argument"));
                    }
                }
                if !self.eat_punct(',') {
                    break;
                }
            }
            self.expect_punct(')', "`)` after type arguments")?;
        }

        let mut unsigned = false;
        loop {
            if self.eat_keyword("UNSIGNED") {
                unsigned = true;
            } else if !(self.eat_keyword("SIGNED") || self.eat_keyword("ZEROFILL")) {
                break;
            }
        }

        Ok(SqlType {
            base,
            params,
            unsigned,
        })
    }

    /// A single default/on-update expression: a literal, a function call,
    /// a prefixed literal such as `b'0'` or a parenthesized expression.
    fn parse_expr(&mut self) -> Result<Fragment, ParseError> {
        let start = self.pos;
        if self.at_punct('(') {
            self.skip_group();
            return Ok(self.fragment(start, self.pos));
        }
        if self.at_punct('-') || self.at_punct('+') {
            self.advance();
        }

        let token = match self.current() {
            Some(token) if token.kind != TokenKind::Punct => token.clone(),
            _ => return Err(self.unexpected("expression")),
        };
        self.advance();

        if token.kind == TokenKind::Word {
            let prefixed = self.current().is_some_and(|next| {
                matches!(next.kind, TokenKind::Str | TokenKind::HexNumber)
                    && (token.text.starts_with('_') || next.span.start == token.span.end)
            });
            if prefixed {
                self.advance();
            } else if self.at_punct('(') {
                self.skip_group();
            }
        }
        Ok(self.fragment(start, self.pos))
    }

    fn parse_column(&mut self) -> Result<(ColumnDef, Vec<TableConstraint>), ParseError> {
        let name = self.expect_name("column name")?;
        let type_start = self.pos;
        let sql_type = self.parse_type()?;

        let mut column = ColumnDef {
            name,
            raw_type: self.source_text(type_start, self.pos),
            sql_type,
            nullable: true,
            ..Default::default()
        };
        let mut constraints = Vec::new();
        let mut constraint_name = None;

        while let Some(token) = self.current() {
            if token.is_punct(',') || token.is_punct(')') {
                break;
            }
            if token.kind != TokenKind::Word {
                return Err(self.error(ParseReason::UnknownClause(token.text.clone())));
            }
            let word = token.text.to_ascii_uppercase();
            self.advance();

            match word.as_str() {
                "NOT" => {
                    self.expect_keyword("NULL")?;
                    column.nullable = false;
                }
                "NULL" => column.nullable = true,
                "DEFAULT" => column.default = Some(self.parse_expr()?),
                "AUTO_INCREMENT" => column.auto_increment = true,
                "ON" => {
                    self.expect_keyword("UPDATE")?;
                    column.on_update = Some(self.parse_expr()?);
                }
                "PRIMARY" | "KEY" => {
                    if word == "PRIMARY" {
                        self.expect_keyword("KEY")?;
                    }
                    constraints.push(TableConstraint::PrimaryKey(KeyDef {
                        name: constraint_name.take(),
                        parts: vec![KeyPart::new(column.name.clone())],
                    }));
                }
                "UNIQUE" => {
                    if !self.eat_keyword("KEY") {
                        self.eat_keyword("INDEX");
                    }
                    constraints.push(TableConstraint::Unique(KeyDef {
                        name: constraint_name.take(),
                        parts: vec![KeyPart::new(column.name.clone())],
                    }));
                }
                "SERIAL" => {
                    // SERIAL DEFAULT VALUE: NOT NULL AUTO_INCREMENT UNIQUE
                    self.expect_keyword("DEFAULT")?;
                    self.expect_keyword("VALUE")?;
                    column.nullable = false;
                    column.auto_increment = true;
                    constraints.push(TableConstraint::Unique(KeyDef {
                        name: None,
                        parts: vec![KeyPart::new(column.name.clone())],
                    }));
                }
                "COMMENT" => {
                    let comment = self.expect_any("column comment")?;
                    column.comment = Some(comment.text);
                }
                "COLLATE" | "CHARSET" => {
                    self.expect_any("character set or collation")?;
                }
                "CHARACTER" => {
                    self.expect_keyword("SET")?;
                    self.expect_any("character set")?;
                }
                "GENERATED" | "AS" => {
                    if word == "GENERATED" {
                        self.expect_keyword("ALWAYS")?;
                        self.expect_keyword("AS")?;
                    }
                    let expr = self.parse_paren_fragment()?;
                    let stored = self.eat_keyword("STORED") || self.eat_keyword("PERSISTENT");
                    if !stored {
                        self.eat_keyword("VIRTUAL");
                    }
                    column.generated = Some(Generated { expr, stored });
                }
                "REFERENCES" => {
                    self.pos -= 1;
                    let fk =
                        self.parse_references(constraint_name.take(), vec![column.name.clone()])?;
                    constraints.push(TableConstraint::ForeignKey(fk));
                }
                "CHECK" => {
                    let expr = self.parse_paren_fragment()?;
                    let enforced = self.parse_enforced();
                    constraints.push(TableConstraint::Check(CheckDef {
                        name: constraint_name.take(),
                        expr: CheckExpr::Source(expr),
                        enforced,
                    }));
                }
                "CONSTRAINT" => {
                    if !self.at_keyword("CHECK") && !self.at_keyword("REFERENCES") {
                        constraint_name = Some(self.expect_name("constraint name")?);
                    }
                }
                "UNSIGNED" => column.sql_type.unsigned = true,
                "SIGNED" | "ZEROFILL" | "BINARY" | "VISIBLE" | "INVISIBLE" => {}
                "COLUMN_FORMAT" | "STORAGE" | "SRID" => {
                    self.expect_any("column attribute value")?;
                }
                _ => return Err(self.error_at_previous(ParseReason::UnknownClause(word))),
            }
        }

        Ok((column, constraints))
    }

    fn error_at_previous(&self, reason: ParseReason) -> ParseError {
        let position = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.position)
            .unwrap_or_default();
        ParseError {
            statement: self.statement,
            position,
            reason,
        }
    }

    /// Trailing `ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 ...`.
    ///
    /// Returns `false` for `CREATE TABLE ... SELECT`, which is left unmapped.
    fn parse_table_options(&mut self, table: &mut TableDef) -> Result<bool, ParseError> {
        while let Some(token) = self.current() {
            if token.is_punct(',') {
                self.advance();
                continue;
            }
            if token.kind != TokenKind::Word {
                return Err(self.unexpected("table option"));
            }
            let mut name = token.text.to_ascii_uppercase();

            if matches!(name.as_str(), "AS" | "SELECT" | "IGNORE" | "REPLACE") {
                return Ok(false);
            }
            if name == "PARTITION" {
                let value = self.source_text(self.pos, self.tokens.len());
                self.pos = self.tokens.len();
                table.options.push(TableOption { name, value });
                break;
            }
            self.advance();

            if name == "DEFAULT" {
                let next = self.expect_name("table option")?;
                name = format!("DEFAULT {}", next.to_ascii_uppercase());
            }
            if name.ends_with("CHARACTER") {
                self.expect_keyword("SET")?;
                name.push_str(" SET");
            }
            if name == "DATA" || name == "INDEX" {
                self.expect_keyword("DIRECTORY")?;
                name.push_str(" DIRECTORY");
            }
            self.eat_punct('=');

            let start = self.pos;
            if self.at_punct('(') {
                self.skip_group();
            } else {
                self.expect_any("table option value")?;
            }
            let value = self.source_text(start, self.pos);
            table.options.push(TableOption { name, value });
        }
        Ok(true)
    }

    fn parse_insert(&mut self) -> Result<StatementKind, ParseError> {
        let replace = self.at_keyword("REPLACE");
        self.advance();
        while self.eat_keyword("LOW_PRIORITY")
            || self.eat_keyword("DELAYED")
            || self.eat_keyword("HIGH_PRIORITY")
        {}
        let ignore = self.eat_keyword("IGNORE");
        let mode = match (replace, ignore) {
            (true, _) => InsertMode::Replace,
            (false, true) => InsertMode::Ignore,
            (false, false) => InsertMode::Insert,
        };
        self.eat_keyword("INTO");
        let table = self.parse_table_name()?;
        let columns = if self.at_punct('(') {
            self.parse_name_list()?
        } else {
            Vec::new()
        };

        // INSERT ... SELECT and INSERT ... SET stay opaque
        if !self.eat_keyword("VALUES") && !self.eat_keyword("VALUE") {
            return Ok(StatementKind::Unmapped);
        }

        let mut rows = Vec::new();
        loop {
            if !self.at_punct('(') {
                return Err(self.unexpected("value tuple"));
            }
            let start = self.pos;
            self.skip_group();
            rows.push(self.fragment(start, self.pos));
            if !self.eat_punct(',') {
                break;
            }
        }

        // Already-converted output reads back as an ignoring insert
        let mut mode = mode;
        if mode == InsertMode::Insert
            && self.eat_keywords(&["ON", "CONFLICT", "DO", "NOTHING"])
            && self.at_end()
        {
            mode = InsertMode::Ignore;
        }

        let on_duplicate = if self.at_keyword("ON") || self.at_keyword("AS") {
            let start = self.pos;
            self.pos = self.tokens.len();
            Some(self.fragment(start, self.pos))
        } else if self.at_end() {
            None
        } else {
            return Err(self.unexpected("end of insert"));
        };

        Ok(StatementKind::Insert(InsertStmt {
            mode,
            table,
            columns,
            rows,
            on_duplicate,
        }))
    }

    fn parse_drop(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // DROP
        self.eat_keyword("TEMPORARY");
        let object = if self.eat_keyword("TABLE") {
            DropObject::Table
        } else if self.eat_keyword("VIEW") {
            DropObject::View
        } else if self.eat_keyword("DATABASE") || self.eat_keyword("SCHEMA") {
            DropObject::Database
        } else {
            return Ok(StatementKind::Unmapped);
        };
        let if_exists = self.eat_keywords(&["IF", "EXISTS"]);

        let mut names = Vec::new();
        loop {
            names.push(self.parse_table_name()?);
            if !self.eat_punct(',') {
                break;
            }
        }

        let behavior = if self.at_keyword("CASCADE") || self.at_keyword("RESTRICT") {
            self.next_token().map(|t| t.text.to_ascii_uppercase())
        } else {
            None
        };
        if !self.at_end() {
            return Err(self.unexpected("end of drop statement"));
        }

        Ok(StatementKind::Drop(DropStmt {
            object,
            if_exists,
            names,
            behavior,
        }))
    }

    fn parse_alter(&mut self) -> Result<StatementKind, ParseError> {
        self.advance(); // ALTER
        self.eat_keyword("ONLINE");
        self.eat_keyword("IGNORE");
        if !self.eat_keyword("TABLE") {
            return Ok(StatementKind::Unmapped);
        }
        self.check_balance()?;
        let table = self.parse_table_name()?;

        let mut actions = Vec::new();
        while !self.at_end() {
            actions.push(self.parse_alter_action()?);
            if !self.eat_punct(',') {
                break;
            }
        }
        if !self.at_end() {
            return Err(self.unexpected("`,` between alter actions"));
        }

        Ok(StatementKind::Alter(AlterStmt {
            table,
            actions,
            sequences: Vec::new(),
            enum_types: Vec::new(),
        }))
    }

    fn parse_alter_action(&mut self) -> Result<AlterAction, ParseError> {
        if self.eat_keywords(&["DISABLE", "KEYS"]) {
            return Ok(AlterAction::DisableKeys);
        }
        if self.eat_keywords(&["ENABLE", "KEYS"]) {
            return Ok(AlterAction::EnableKeys);
        }

        let start = self.pos;
        if self.eat_keyword("ADD") {
            let (has_constraint, name) = self.parse_constraint_name();
            if self.at_constraint_keyword() {
                return Ok(AlterAction::AddConstraint(self.parse_constraint(name)?));
            }
            if has_constraint {
                return Err(self.unexpected("constraint definition"));
            }
            self.eat_keyword("COLUMN");
            if self.current().is_some_and(Token::is_name) {
                let (column, constraints) = self.parse_column()?;
                // FIRST / AFTER col placement has no destination equivalent
                if self.eat_keyword("FIRST") || self.eat_keyword("AFTER") {
                    return Err(self.error_at_previous(ParseReason::UnknownClause(
                        "column placement".to_string(),
                    )));
                }
                return Ok(AlterAction::AddColumn {
                    column,
                    constraints,
                });
            }
            self.pos = start;
        }

        self.skip_to_element_end();
        if self.pos == start {
            return Err(self.unexpected("alter action"));
        }
        Ok(AlterAction::Other(self.fragment(start, self.pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::LexError;

    fn parse(sql: &str) -> Vec<Statement> {
        parse_sql(sql).unwrap()
    }

    fn parse_table(sql: &str) -> TableDef {
        match parse(sql).remove(0).kind {
            StatementKind::CreateTable(table) => table,
            other => panic!("expected create table, got {:?}", other),
        }
    }

    fn parse_err(sql: &str) -> ParseError {
        match parse_sql(sql).unwrap_err() {
            ConvertError::Parse(err) => err,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_split_and_classify_dump() {
        let sql = r#"
-- MySQL dump 10.13
/*!40101 SET NAMES utf8 */;
DROP TABLE IF EXISTS `users`;
CREATE TABLE `users` (`id` int(11) NOT NULL);
LOCK TABLES `users` WRITE;
/*!40000 ALTER TABLE `users` DISABLE KEYS */;
INSERT INTO `users` VALUES (1),(2);
UNLOCK TABLES;
SET FOREIGN_KEY_CHECKS = 0;
CREATE VIEW v AS SELECT 1;
-- Dump completed
"#;
        let kinds: Vec<&str> = parse(sql).iter().map(|s| s.kind.name()).collect();
        assert_eq!(
            kinds,
            vec![
                "set",
                "drop",
                "create table",
                "lock tables",
                "alter",
                "insert",
                "lock tables",
                "set",
                "unmapped",
                "comment",
            ]
        );
    }

    #[test]
    fn test_leading_comments_are_split_off() {
        let statements = parse("--\n-- Table structure\n--\n\nDROP TABLE t;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].comments.len(), 3);
        assert_eq!(statements[0].raw.text, "DROP TABLE t");
        assert_eq!(statements[0].position.line, 1);
    }

    #[test]
    fn test_statement_indices_are_sequential() {
        let statements = parse("SET a=1;; SET b=2;\nSET c=3");
        let indices: Vec<usize> = statements.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_mysqldump_table() {
        let table = parse_table(
            r#"CREATE TABLE `orders` (
  `id` int(11) unsigned NOT NULL AUTO_INCREMENT,
  `user_id` int(11) NOT NULL,
  `status` enum('new','paid','void') NOT NULL DEFAULT 'new',
  `note` varchar(255) CHARACTER SET utf8 COLLATE utf8_bin DEFAULT NULL COMMENT 'free text',
  `created_at` datetime NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
  PRIMARY KEY (`id`),
  UNIQUE KEY `uniq_note` (`note`(20)),
  KEY `idx_user` (`user_id`,`created_at` DESC) USING BTREE,
  CONSTRAINT `fk_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`) ON DELETE CASCADE ON UPDATE NO ACTION
) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;"#,
        );

        assert_eq!(table.name, "orders");
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "user_id", "status", "note", "created_at"]);

        let id = &table.columns[0];
        assert_eq!(id.raw_type, "int(11) unsigned");
        assert_eq!(id.sql_type.base, "int");
        assert_eq!(id.sql_type.params, vec!["11"]);
        assert!(id.sql_type.unsigned);
        assert!(id.auto_increment);
        assert!(!id.nullable);

        let status = &table.columns[2];
        assert_eq!(status.sql_type.params, vec!["new", "paid", "void"]);
        assert_eq!(status.default.as_ref().unwrap().text, "'new'");
        assert_eq!(
            table.enums,
            vec![EnumDef {
                column: "status".into(),
                values: vec!["new".into(), "paid".into(), "void".into()],
            }]
        );

        let note = &table.columns[3];
        assert!(note.nullable);
        assert_eq!(note.comment.as_deref(), Some("free text"));
        assert_eq!(note.default.as_ref().unwrap().text, "NULL");

        let created = &table.columns[4];
        assert_eq!(created.default.as_ref().unwrap().text, "CURRENT_TIMESTAMP");
        assert_eq!(created.on_update.as_ref().unwrap().text, "CURRENT_TIMESTAMP");

        assert_eq!(table.primary_key.as_ref().unwrap().parts[0].column, "id");
        assert_eq!(table.unique_keys[0].name.as_deref(), Some("uniq_note"));
        assert_eq!(table.unique_keys[0].parts[0].prefix_len.as_deref(), Some("20"));
        assert_eq!(table.indexes[0].name.as_deref(), Some("idx_user"));
        assert!(table.indexes[0].parts[1].descending);

        let fk = &table.foreign_keys[0];
        assert_eq!(fk.name.as_deref(), Some("fk_user"));
        assert_eq!(fk.ref_table, "users");
        assert_eq!(fk.on_delete.as_deref(), Some("CASCADE"));
        assert_eq!(fk.on_update.as_deref(), Some("NO ACTION"));

        let options: Vec<(&str, &str)> = table
            .options
            .iter()
            .map(|o| (o.name.as_str(), o.value.as_str()))
            .collect();
        assert_eq!(
            options,
            vec![
                ("ENGINE", "InnoDB"),
                ("AUTO_INCREMENT", "42"),
                ("DEFAULT CHARSET", "utf8mb4"),
                ("COLLATE", "utf8mb4_unicode_ci"),
            ]
        );
    }

    #[test]
    fn test_parse_inline_constraints() {
        let table = parse_table(
            "CREATE TABLE t (id INT AUTO_INCREMENT PRIMARY KEY, \
             email VARCHAR(100) UNIQUE, \
             owner INT REFERENCES users(id) ON DELETE SET NULL, \
             qty INT CONSTRAINT qty_pos CHECK (qty > 0), \
             total DECIMAL(10,2) AS (qty * 2) STORED)",
        );
        assert_eq!(table.primary_key.unwrap().parts[0].column, "id");
        assert_eq!(table.unique_keys[0].parts[0].column, "email");
        assert_eq!(table.foreign_keys[0].columns, vec!["owner"]);
        assert_eq!(table.foreign_keys[0].on_delete.as_deref(), Some("SET NULL"));
        assert_eq!(table.checks[0].name.as_deref(), Some("qty_pos"));
        match &table.checks[0].expr {
            CheckExpr::Source(expr) => assert_eq!(expr.text, "qty > 0"),
            other => panic!("unexpected check {:?}", other),
        }
        let generated = table.columns[4].generated.as_ref().unwrap();
        assert_eq!(generated.expr.text, "qty * 2");
        assert!(generated.stored);
    }

    #[test]
    fn test_parse_prefixed_defaults() {
        let table = parse_table(
            "CREATE TABLE t (a bit(1) DEFAULT b'0', b varchar(5) DEFAULT _utf8mb4 'x', c int DEFAULT -1, d datetime(3) DEFAULT CURRENT_TIMESTAMP(3))",
        );
        let defaults: Vec<&str> = table
            .columns
            .iter()
            .map(|c| c.default.as_ref().unwrap().text.as_str())
            .collect();
        assert_eq!(defaults, vec!["b'0'", "_utf8mb4 'x'", "-1", "CURRENT_TIMESTAMP(3)"]);
    }

    #[test]
    fn test_parse_multiword_types() {
        let table = parse_table(
            "CREATE TABLE t (a double precision, b national varchar(10), c char varying(3))",
        );
        let bases: Vec<&str> = table.columns.iter().map(|c| c.sql_type.base.as_str()).collect();
        assert_eq!(bases, vec!["double precision", "national varchar", "char varying"]);
    }

    #[test]
    fn test_create_table_like_is_unmapped() {
        assert_eq!(parse("CREATE TABLE t2 LIKE t1;")[0].kind, StatementKind::Unmapped);
        assert_eq!(
            parse("CREATE TABLE t2 (id INT) SELECT id FROM t1;")[0].kind,
            StatementKind::Unmapped
        );
    }

    #[test]
    fn test_parse_insert_rows() {
        let statements = parse("INSERT INTO `t` VALUES (1,'a;b'),(2,'it\\'s'),(3,NULL);");
        let StatementKind::Insert(insert) = &statements[0].kind else {
            panic!("expected insert");
        };
        assert_eq!(insert.mode, InsertMode::Insert);
        assert_eq!(insert.table, "t");
        let rows: Vec<&str> = insert.rows.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(rows, vec!["(1,'a;b')", "(2,'it\\'s')", "(3,NULL)"]);
    }

    #[test]
    fn test_parse_insert_modes() {
        let statements = parse(
            "INSERT IGNORE INTO t (a, b) VALUES (1, 2); REPLACE INTO t VALUES (1); INSERT INTO t SELECT * FROM u;",
        );
        let StatementKind::Insert(ignore) = &statements[0].kind else {
            panic!("expected insert");
        };
        assert_eq!(ignore.mode, InsertMode::Ignore);
        assert_eq!(ignore.columns, vec!["a", "b"]);
        let StatementKind::Insert(replace) = &statements[1].kind else {
            panic!("expected insert");
        };
        assert_eq!(replace.mode, InsertMode::Replace);
        assert_eq!(statements[2].kind, StatementKind::Unmapped);
    }

    #[test]
    fn test_parse_drop() {
        let StatementKind::Drop(drop) = parse("DROP TABLE IF EXISTS `a`, b CASCADE;").remove(0).kind
        else {
            panic!("expected drop");
        };
        assert_eq!(drop.object, DropObject::Table);
        assert!(drop.if_exists);
        assert_eq!(drop.names, vec!["a", "b"]);
        assert_eq!(drop.behavior.as_deref(), Some("CASCADE"));

        assert_eq!(parse("DROP TRIGGER x;")[0].kind, StatementKind::Unmapped);
    }

    #[test]
    fn test_parse_alter() {
        let StatementKind::Alter(alter) = parse(
            "ALTER TABLE `t` ADD CONSTRAINT `fk` FOREIGN KEY (`a`) REFERENCES `u` (`id`), ADD COLUMN c int(11) DEFAULT NULL, RENAME TO t2;",
        )
        .remove(0)
        .kind
        else {
            panic!("expected alter");
        };
        assert_eq!(alter.table, "t");
        assert!(matches!(
            &alter.actions[0],
            AlterAction::AddConstraint(TableConstraint::ForeignKey(fk)) if fk.name.as_deref() == Some("fk")
        ));
        assert!(matches!(&alter.actions[1], AlterAction::AddColumn { column, .. } if column.name == "c"));
        assert!(matches!(&alter.actions[2], AlterAction::Other(f) if f.text == "RENAME TO t2"));

        let StatementKind::Alter(toggle) = parse("ALTER TABLE t DISABLE KEYS;").remove(0).kind else {
            panic!("expected alter");
        };
        assert!(toggle.is_key_toggle_only());
    }

    #[test]
    fn test_unbalanced_parens() {
        let err = parse_err("SET a=1;\nCREATE TABLE t (id INT, name VARCHAR(10);");
        assert_eq!(err.statement, 2);
        assert_eq!(err.reason, ParseReason::UnbalancedParens);
        assert_eq!(err.position.line, 2);
        assert_eq!(err.position.column, 16);
    }

    #[test]
    fn test_unknown_column_clause() {
        let err = parse_err("CREATE TABLE t (id INT FROBNICATE);");
        assert_eq!(err.statement, 1);
        assert_eq!(err.reason, ParseReason::UnknownClause("FROBNICATE".into()));
        assert_eq!(err.position.column, 24);

        let err = parse_err("CREATE TABLE t (id 'text');");
        assert_eq!(err.reason, ParseReason::UnknownClause("text".into()));
    }

    #[test]
    fn test_lex_error_propagates() {
        let err = parse_sql("INSERT INTO t VALUES ('oops);").unwrap_err();
        assert!(matches!(err, ConvertError::Lex(LexError::Unterminated { .. })));
    }

    #[test]
    fn test_statement_without_terminator() {
        let statements = parse("DROP TABLE a;\nDROP TABLE b");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].kind.name(), "drop");
    }

    #[test]
    fn test_conditional_view_is_unwrapped() {
        let sql = "/*!50001 DROP VIEW IF EXISTS `v`*/;\n\
                   /*!50001 CREATE ALGORITHM=UNDEFINED */\n\
                   /*!50013 DEFINER=`root`@`localhost` SQL SECURITY DEFINER */\n\
                   /*!50001 VIEW `v` AS select 1 AS `x` */;";
        let statements = parse(sql);
        assert_eq!(statements.len(), 2);
        match &statements[0].kind {
            StatementKind::Drop(drop) => {
                assert_eq!(drop.object, DropObject::View);
                assert_eq!(drop.names, vec!["v"]);
            }
            other => panic!("expected drop, got {:?}", other),
        }
        assert_eq!(statements[1].kind, StatementKind::Unmapped);
        assert_eq!(
            statements[1].raw.text,
            "CREATE ALGORITHM=UNDEFINED DEFINER=`root`@`localhost` SQL SECURITY DEFINER VIEW `v` AS select 1 AS `x`"
        );
        assert_eq!(statements[1].position.line, 2);
    }

    #[test]
    fn test_conditional_session_settings_are_classified() {
        let statements = parse(
            "/*!40101 SET NAMES utf8mb4 */;\n/*!40000 ALTER TABLE `t` ENABLE KEYS */;\n/*!*/;",
        );
        let kinds: Vec<&str> = statements.iter().map(|s| s.kind.name()).collect();
        assert_eq!(kinds, vec!["set", "alter", "comment"]);
        assert!(statements.iter().all(|s| s.kind.is_source_only() || s.raw.is_empty()));
    }

    #[test]
    fn test_conditional_positions_point_into_dump() {
        let err = parse_err("SET a = 1;\n/*!50001 CREATE TABLE t (a int */;");
        assert_eq!(err.statement, 2);
        assert_eq!(err.reason, ParseReason::UnbalancedParens);
        assert_eq!(err.position.line, 2);
        assert_eq!(err.position.column, 25);
    }

    #[test]
    fn test_delimiter_directive() {
        let sql = "CREATE TABLE t (a int);\n\
                   DELIMITER ;;\n\
                   /*!50003 CREATE*/ /*!50017 DEFINER=`root`@`%`*/ /*!50003 TRIGGER `trg` BEFORE INSERT ON `t` FOR EACH ROW BEGIN SET NEW.a = 1; END */;;\n\
                   DELIMITER ;\n\
                   SET a = 1;";
        let statements = parse(sql);
        let kinds: Vec<&str> = statements.iter().map(|s| s.kind.name()).collect();
        assert_eq!(kinds, vec!["create table", "unmapped", "set"]);
        assert!(statements[1].raw.text.starts_with("CREATE DEFINER=`root`@`%` TRIGGER `trg`"));
        assert!(statements[1].raw.text.ends_with("SET NEW.a = 1; END"));
        assert_eq!(statements[2].index, 3);
    }

    #[test]
    fn test_delimiter_splits_procedure_body() {
        let sql = "DELIMITER //\nCREATE PROCEDURE p() BEGIN SELECT 1; SELECT 2; END//\nDELIMITER ;\nSET a = 1;";
        let statements = parse(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].raw.text,
            "CREATE PROCEDURE p() BEGIN SELECT 1; SELECT 2; END"
        );
        assert_eq!(statements[1].kind, StatementKind::Set);
    }

    #[test]
    fn test_delimiter_without_value() {
        let err = parse_err("SET a = 1;\nDELIMITER\nSET b = 2;");
        assert_eq!(err.statement, 2);
        assert_eq!(err.reason, ParseReason::UnexpectedEnd("delimiter"));
    }
}
