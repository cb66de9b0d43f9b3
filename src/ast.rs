//! Statement and schema model shared by the parser, mapper and serializer.

use crate::sql::{Position, Token};

/// Opaque SQL kept as source text together with the tokens inside it.
///
/// Token spans are relative to `text`. Generated fragments carry no tokens
/// and are emitted exactly as written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub text: String,
    pub tokens: Vec<Token>,
}

impl Fragment {
    /// Slice `source` from the first to the last token.
    pub fn from_tokens(source: &str, tokens: &[Token]) -> Self {
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            return Self::default();
        };
        let base = first.span.start;
        Self {
            text: source[base..last.span.end].to_string(),
            tokens: tokens.iter().map(|t| t.rebased(base)).collect(),
        }
    }

    /// Destination-dialect text produced by the mapper.
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tokens: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based position of the statement in the dump
    pub index: usize,
    pub position: Position,
    /// Comments preceding the statement body
    pub comments: Vec<Token>,
    pub kind: StatementKind,
    pub raw: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    CreateTable(TableDef),
    Insert(InsertStmt),
    Set,
    LockTables,
    Drop(DropStmt),
    Alter(AlterStmt),
    /// Nothing but comments
    Comment,
    Unmapped,
}

impl StatementKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTable(_) => "create table",
            Self::Insert(_) => "insert",
            Self::Set => "set",
            Self::LockTables => "lock tables",
            Self::Drop(_) => "drop",
            Self::Alter(_) => "alter",
            Self::Comment => "comment",
            Self::Unmapped => "unmapped",
        }
    }

    /// Statements that only mean something to the source server and are
    /// left out of the output.
    pub fn is_source_only(&self) -> bool {
        match self {
            Self::Set | Self::LockTables => true,
            Self::Alter(alter) => alter.is_key_toggle_only(),
            Self::CreateTable(_)
            | Self::Insert(_)
            | Self::Drop(_)
            | Self::Comment
            | Self::Unmapped => false,
        }
    }
}

/// Parsed column type, e.g. `int(11) unsigned` or `enum('a','b')`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlType {
    /// Lowercase base name; multi-word names are joined by one space
    pub base: String,
    /// Length/precision arguments, or the unescaped values of an enum/set
    pub params: Vec<String>,
    pub unsigned: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnDef {
    pub name: String,
    /// Type exactly as written in the source
    pub raw_type: String,
    pub sql_type: SqlType,
    /// Destination type, filled in by the mapper
    pub mapped_type: Option<String>,
    pub nullable: bool,
    pub default: Option<Fragment>,
    pub auto_increment: bool,
    pub on_update: Option<Fragment>,
    pub generated: Option<Generated>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub expr: Fragment,
    pub stored: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyPart {
    pub column: String,
    pub prefix_len: Option<String>,
    pub descending: bool,
}

impl KeyPart {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            prefix_len: None,
            descending: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyDef {
    pub name: Option<String>,
    pub parts: Vec<KeyPart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Plain,
    Fulltext,
    Spatial,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub name: Option<String>,
    pub kind: IndexKind,
    pub parts: Vec<KeyPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckExpr {
    Source(Fragment),
    /// `column IN (values...)`, generated from an enum
    InList { column: String, values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckDef {
    pub name: Option<String>,
    pub expr: CheckExpr,
    pub enforced: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey(KeyDef),
    Unique(KeyDef),
    Index(IndexDef),
    ForeignKey(ForeignKey),
    Check(CheckDef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub column: String,
    pub values: Vec<String>,
}

/// `ENGINE=InnoDB`, `DEFAULT CHARSET=utf8mb4`, ...
#[derive(Debug, Clone, PartialEq)]
pub struct TableOption {
    /// Uppercase option name, words joined by one space
    pub name: String,
    /// Value as written in the source
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDef {
    pub name: String,
    pub start: u64,
}

/// `CREATE TYPE name AS ENUM (...)` backing a native enum column.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableDef {
    pub name: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<KeyDef>,
    pub unique_keys: Vec<KeyDef>,
    pub indexes: Vec<IndexDef>,
    pub foreign_keys: Vec<ForeignKey>,
    pub checks: Vec<CheckDef>,
    pub enums: Vec<EnumDef>,
    pub options: Vec<TableOption>,
    /// Sequences backing former auto-increment columns (mapper output)
    pub sequences: Vec<SequenceDef>,
    /// Enum types for native enum columns (mapper output)
    pub enum_types: Vec<EnumType>,
    /// Source-only options removed by the mapper, kept for annotation
    pub dropped_options: Vec<TableOption>,
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Hoist a constraint into the table-level lists.
    pub fn add_constraint(&mut self, constraint: TableConstraint) {
        match constraint {
            TableConstraint::PrimaryKey(key) => match &mut self.primary_key {
                // Inline and trailing primary keys name the same key
                Some(existing) => {
                    for part in key.parts {
                        if !existing.parts.iter().any(|p| p.column == part.column) {
                            existing.parts.push(part);
                        }
                    }
                }
                None => self.primary_key = Some(key),
            },
            TableConstraint::Unique(key) => self.unique_keys.push(key),
            TableConstraint::Index(index) => self.indexes.push(index),
            TableConstraint::ForeignKey(fk) => self.foreign_keys.push(fk),
            TableConstraint::Check(check) => self.checks.push(check),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    Insert,
    /// `INSERT IGNORE`
    Ignore,
    /// `REPLACE INTO`
    Replace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub mode: InsertMode,
    pub table: String,
    pub columns: Vec<String>,
    /// Each `(...)` value tuple, parentheses included
    pub rows: Vec<Fragment>,
    pub on_duplicate: Option<Fragment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropObject {
    Table,
    View,
    Database,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropStmt {
    pub object: DropObject,
    pub if_exists: bool,
    pub names: Vec<String>,
    /// `CASCADE` or `RESTRICT`
    pub behavior: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn {
        column: ColumnDef,
        constraints: Vec<TableConstraint>,
    },
    AddConstraint(TableConstraint),
    DisableKeys,
    EnableKeys,
    Other(Fragment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterStmt {
    pub table: String,
    pub actions: Vec<AlterAction>,
    pub sequences: Vec<SequenceDef>,
    pub enum_types: Vec<EnumType>,
}

impl AlterStmt {
    pub fn is_key_toggle_only(&self) -> bool {
        !self.actions.is_empty()
            && self
                .actions
                .iter()
                .all(|a| matches!(a, AlterAction::DisableKeys | AlterAction::EnableKeys))
    }
}
