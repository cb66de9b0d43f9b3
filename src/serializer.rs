//! Serializer for emitting CockroachDB SQL from mapped statements.

use crate::ast::{
    AlterAction, AlterStmt, CheckDef, CheckExpr, ColumnDef, DropObject, DropStmt, EnumType,
    ForeignKey, Fragment, InsertMode, InsertStmt, KeyPart, SequenceDef, Statement, StatementKind,
    TableConstraint, TableDef,
};
use crate::options::ConversionOptions;
use crate::sql::dialect::{hex_literal, quote_bytes, quote_ident, quote_string};
use crate::sql::{Token, TokenKind};

/// Serialize mapped statements to a CockroachDB dump, in order.
pub fn serialize(statements: &[Statement], options: &ConversionOptions) -> String {
    let mut output = String::new();
    for statement in statements {
        serialize_statement(&mut output, statement, options);
    }
    output
}

/// One output unit: leading comments, then the statement itself.
pub fn serialize_statement(output: &mut String, statement: &Statement, options: &ConversionOptions) {
    serialize_comments(output, &statement.comments);
    if statement.kind.is_source_only() {
        return;
    }

    match &statement.kind {
        StatementKind::CreateTable(table) => serialize_table(output, table, options),
        StatementKind::Insert(insert) => serialize_insert(output, insert),
        StatementKind::Drop(drop) => serialize_drop(output, drop),
        StatementKind::Alter(alter) => serialize_alter(output, alter),
        StatementKind::Unmapped => {
            output.push_str(&render_fragment(&statement.raw));
            output.push_str(";\n");
        }
        StatementKind::Set | StatementKind::LockTables | StatementKind::Comment => {}
    }
}

fn serialize_comments(output: &mut String, comments: &[Token]) {
    for comment in comments {
        // Conditional comments are executable MySQL
        if comment.is_conditional_comment() {
            continue;
        }
        output.push_str(&render_comment(comment));
        output.push('\n');
    }
}

fn render_comment(comment: &Token) -> String {
    match comment.text.strip_prefix('#') {
        Some(rest) if comment.kind == TokenKind::LineComment => {
            format!("-- {}", rest.trim_start())
        }
        _ => comment.text.clone(),
    }
}

fn serialize_enum_types(output: &mut String, types: &[EnumType]) {
    for enum_type in types {
        let values: Vec<String> = enum_type.values.iter().map(|v| quote_string(v)).collect();
        output.push_str("CREATE TYPE IF NOT EXISTS ");
        output.push_str(&quote_ident(&enum_type.name));
        output.push_str(" AS ENUM (");
        output.push_str(&values.join(", "));
        output.push_str(");\n");
    }
}

fn serialize_sequences(output: &mut String, sequences: &[SequenceDef]) {
    for sequence in sequences {
        output.push_str("CREATE SEQUENCE IF NOT EXISTS ");
        output.push_str(&quote_ident(&sequence.name));
        output.push_str(" START WITH ");
        output.push_str(&sequence.start.to_string());
        output.push_str(";\n");
    }
}

fn serialize_table(output: &mut String, table: &TableDef, options: &ConversionOptions) {
    serialize_enum_types(output, &table.enum_types);
    serialize_sequences(output, &table.sequences);

    output.push_str("CREATE TABLE ");
    if table.if_not_exists {
        output.push_str("IF NOT EXISTS ");
    }
    output.push_str(&quote_ident(&table.name));
    output.push_str(" (\n");

    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| column_definition(column, &table.columns))
        .collect();
    if let Some(pk) = &table.primary_key {
        lines.push(format!("PRIMARY KEY ({})", key_parts(&pk.parts)));
    }
    for key in &table.unique_keys {
        lines.push(format!(
            "{}UNIQUE ({})",
            constraint_prefix(key.name.as_deref()),
            key_parts(&key.parts)
        ));
    }
    for index in &table.indexes {
        lines.push(index_clause(index.name.as_deref(), &index.parts));
    }
    for fk in &table.foreign_keys {
        lines.push(foreign_key_clause(fk));
    }
    for check in &table.checks {
        lines.push(check_clause(check, &table.columns));
    }

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            output.push_str(",\n");
        }
        output.push_str("    ");
        output.push_str(line);
    }
    output.push_str("\n)");

    if options.annotate_dropped && !table.dropped_options.is_empty() {
        let dropped: Vec<String> = table
            .dropped_options
            .iter()
            .map(|o| format!("{}={}", o.name, o.value))
            .collect();
        output.push_str(" /* dropped: ");
        output.push_str(&dropped.join(" ").replace("*/", "* /"));
        output.push_str(" */");
    }
    output.push_str(";\n");
}

/// One column line. Expressions are rendered against `columns`, the columns
/// of the table it belongs to.
fn column_definition(column: &ColumnDef, columns: &[ColumnDef]) -> String {
    let mut out = quote_ident(&column.name);
    out.push(' ');
    out.push_str(column.mapped_type.as_deref().unwrap_or(&column.raw_type));

    if let Some(generated) = &column.generated {
        out.push_str(" AS (");
        out.push_str(&render_in_table(&generated.expr, columns));
        out.push_str(if generated.stored { ") STORED" } else { ") VIRTUAL" });
    }
    if !column.nullable {
        out.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        // A bare default is a literal; only expression defaults see columns
        let scope: &[ColumnDef] = if default.text.starts_with('(') { columns } else { &[] };
        out.push_str(" DEFAULT ");
        out.push_str(&render_in_table(default, scope));
    }
    if let Some(on_update) = &column.on_update {
        out.push_str(" ON UPDATE ");
        out.push_str(&render_in_table(on_update, columns));
    }
    out
}

fn constraint_prefix(name: Option<&str>) -> String {
    match name {
        Some(name) => format!("CONSTRAINT {} ", quote_ident(name)),
        None => String::new(),
    }
}

fn key_parts(parts: &[KeyPart]) -> String {
    parts
        .iter()
        .map(|part| {
            if part.descending {
                format!("{} DESC", quote_ident(&part.column))
            } else {
                quote_ident(&part.column)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn name_list(names: &[String]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}

fn index_clause(name: Option<&str>, parts: &[KeyPart]) -> String {
    match name {
        Some(name) => format!("INDEX {} ({})", quote_ident(name), key_parts(parts)),
        None => format!("INDEX ({})", key_parts(parts)),
    }
}

fn foreign_key_clause(fk: &ForeignKey) -> String {
    let mut out = constraint_prefix(fk.name.as_deref());
    out.push_str("FOREIGN KEY (");
    out.push_str(&name_list(&fk.columns));
    out.push_str(") REFERENCES ");
    out.push_str(&quote_ident(&fk.ref_table));
    if !fk.ref_columns.is_empty() {
        out.push_str(" (");
        out.push_str(&name_list(&fk.ref_columns));
        out.push(')');
    }
    if let Some(action) = &fk.on_delete {
        out.push_str(" ON DELETE ");
        out.push_str(action);
    }
    if let Some(action) = &fk.on_update {
        out.push_str(" ON UPDATE ");
        out.push_str(action);
    }
    out
}

fn check_clause(check: &CheckDef, columns: &[ColumnDef]) -> String {
    let expr = match &check.expr {
        CheckExpr::Source(fragment) => render_in_table(fragment, columns),
        CheckExpr::InList { column, values } => {
            let values: Vec<String> = values.iter().map(|v| quote_string(v)).collect();
            format!("{} IN ({})", quote_ident(column), values.join(", "))
        }
    };
    format!("{}CHECK ({})", constraint_prefix(check.name.as_deref()), expr)
}

fn constraint_clause(constraint: &TableConstraint, columns: &[ColumnDef]) -> String {
    match constraint {
        TableConstraint::PrimaryKey(key) => format!("PRIMARY KEY ({})", key_parts(&key.parts)),
        TableConstraint::Unique(key) => format!(
            "{}UNIQUE ({})",
            constraint_prefix(key.name.as_deref()),
            key_parts(&key.parts)
        ),
        TableConstraint::Index(index) => index_clause(index.name.as_deref(), &index.parts),
        TableConstraint::ForeignKey(fk) => foreign_key_clause(fk),
        TableConstraint::Check(check) => check_clause(check, columns),
    }
}

fn serialize_insert(output: &mut String, insert: &InsertStmt) {
    output.push_str(match insert.mode {
        InsertMode::Replace => "UPSERT INTO ",
        InsertMode::Insert | InsertMode::Ignore => "INSERT INTO ",
    });
    output.push_str(&quote_ident(&insert.table));
    if !insert.columns.is_empty() {
        output.push_str(" (");
        output.push_str(&name_list(&insert.columns));
        output.push(')');
    }
    output.push_str(" VALUES ");
    for (i, row) in insert.rows.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        output.push_str(&render_fragment(row));
    }
    if insert.mode == InsertMode::Ignore {
        output.push_str(" ON CONFLICT DO NOTHING");
    }
    output.push_str(";\n");
}

fn serialize_drop(output: &mut String, drop: &DropStmt) {
    output.push_str(match drop.object {
        DropObject::Table => "DROP TABLE ",
        DropObject::View => "DROP VIEW ",
        DropObject::Database => "DROP DATABASE ",
    });
    if drop.if_exists {
        output.push_str("IF EXISTS ");
    }
    output.push_str(&name_list(&drop.names));
    if let Some(behavior) = &drop.behavior {
        output.push(' ');
        output.push_str(behavior);
    }
    output.push_str(";\n");
}

fn serialize_alter(output: &mut String, alter: &AlterStmt) {
    if let [AlterAction::AddConstraint(TableConstraint::Index(index))] = alter.actions.as_slice() {
        output.push_str("CREATE INDEX ");
        if let Some(name) = &index.name {
            output.push_str(&quote_ident(name));
            output.push(' ');
        }
        output.push_str("ON ");
        output.push_str(&quote_ident(&alter.table));
        output.push_str(" (");
        output.push_str(&key_parts(&index.parts));
        output.push_str(");\n");
        return;
    }

    serialize_enum_types(output, &alter.enum_types);
    serialize_sequences(output, &alter.sequences);

    let mut actions = Vec::new();
    for action in &alter.actions {
        match action {
            AlterAction::AddColumn {
                column,
                constraints,
            } => {
                let scope = std::slice::from_ref(column);
                actions.push(format!("ADD COLUMN {}", column_definition(column, scope)));
                for constraint in constraints {
                    actions.push(format!("ADD {}", constraint_clause(constraint, scope)));
                }
            }
            AlterAction::AddConstraint(constraint) => {
                actions.push(format!("ADD {}", constraint_clause(constraint, &[])));
            }
            AlterAction::Other(fragment) => actions.push(render_fragment(fragment)),
            AlterAction::DisableKeys | AlterAction::EnableKeys => {}
        }
    }

    output.push_str("ALTER TABLE ");
    output.push_str(&quote_ident(&alter.table));
    output.push(' ');
    output.push_str(&actions.join(", "));
    output.push_str(";\n");
}

/// Charset introducers that may precede a string literal.
fn is_introducer(word: &str) -> bool {
    const CHARSETS: &[&str] = &[
        "_ascii", "_binary", "_latin1", "_ucs2", "_utf16", "_utf32", "_utf8", "_utf8mb3",
        "_utf8mb4",
    ];
    CHARSETS.iter().any(|c| word.eq_ignore_ascii_case(c))
}

/// A prefixed literal starting at `word`, rendered for the destination.
fn prefixed_literal(word: &Token, next: &Token) -> Option<String> {
    let prefix = word.text.to_ascii_lowercase();
    if is_introducer(&prefix) {
        return match next.kind {
            TokenKind::HexNumber => Some(hex_literal(&next.text)),
            TokenKind::Str | TokenKind::DoubleQuoted if prefix == "_binary" => {
                Some(quote_bytes(&next.text))
            }
            TokenKind::Str | TokenKind::DoubleQuoted => Some(quote_string(&next.text)),
            _ => None,
        };
    }

    // b'0101', x'ff', e'..', n'..' are written without a gap
    if next.kind != TokenKind::Str || next.span.start != word.span.end {
        return None;
    }
    match prefix.as_str() {
        "b" => Some(format!("B'{}'", next.text)),
        "x" => Some(format!("x'{}'", next.text)),
        "e" | "n" => Some(quote_string(&next.text)),
        _ => None,
    }
}

/// Re-render opaque SQL with destination quoting.
///
/// Whitespace between tokens is kept as written. Generated fragments carry
/// no tokens and come out unchanged.
pub fn render_fragment(fragment: &Fragment) -> String {
    render_in_table(fragment, &[])
}

/// [`render_fragment`] for an expression inside a table. A double-quoted
/// name of one of `columns` is a column reference there, the way destination
/// quoting writes it, rather than a string.
fn render_in_table(fragment: &Fragment, columns: &[ColumnDef]) -> String {
    if fragment.tokens.is_empty() {
        return fragment.text.clone();
    }

    let text = &fragment.text;
    let tokens = &fragment.tokens;
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        out.push_str(&text[copied..token.span.start]);
        copied = token.span.end;

        match token.kind {
            TokenKind::QuotedIdent => out.push_str(&quote_ident(&token.text)),
            TokenKind::DoubleQuoted => {
                match columns.iter().find(|c| c.name.eq_ignore_ascii_case(&token.text)) {
                    Some(column) => out.push_str(&quote_ident(&column.name)),
                    None => out.push_str(&quote_string(&token.text)),
                }
            }
            TokenKind::Str => out.push_str(&quote_string(&token.text)),
            TokenKind::HexNumber => out.push_str(&hex_literal(&token.text)),
            TokenKind::LineComment | TokenKind::BlockComment => {
                out.push_str(&render_comment(token))
            }
            TokenKind::Word => {
                if let Some(next) = tokens.get(i + 1) {
                    if let Some(literal) = prefixed_literal(token, next) {
                        out.push_str(&literal);
                        copied = next.span.end;
                        i += 2;
                        continue;
                    }
                }
                out.push_str(&token.text);
            }
            TokenKind::Number | TokenKind::Punct => out.push_str(&token.text),
        }
        i += 1;
    }

    out.push_str(&text[copied..]);
    out
}
