//! Rewrites parsed statements into the CockroachDB dialect.
//!
//! Mapping is driven by [`ConversionOptions`] and the fixed table in
//! [`crate::sql::types`]. Anything without a faithful translation is an
//! error; nothing is approximated silently.

use crate::ast::{
    AlterAction, AlterStmt, CheckDef, CheckExpr, ColumnDef, DropStmt, EnumType, Fragment,
    IndexKind, InsertStmt, KeyDef, KeyPart, SequenceDef, SqlType, Statement, StatementKind,
    TableConstraint, TableDef,
};
use crate::options::ConversionOptions;
use crate::sql::dialect::{MAX_IDENT_LEN, quote_ident, quote_string, truncate_ident};
use crate::sql::types::map_type;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("column `{table}`.`{column}` has unsupported type `{raw_type}`")]
    UnsupportedType {
        table: String,
        column: String,
        raw_type: String,
    },

    #[error(
        "enum column `{table}`.`{column}` has no destination type; enable enum-to-check or native enums"
    )]
    UnsupportedEnum { table: String, column: String },

    #[error("table `{table}` uses unsupported option {option}")]
    UnsupportedOption { table: String, option: String },

    #[error("table `{table}`: {detail}")]
    Unsupported { table: String, detail: String },

    #[error("identifier `{name}` is {len} bytes, over the 63 byte limit")]
    IdentifierTooLong { name: String, len: usize },

    #[error("statement starting with `{leading}` has no translation")]
    UnmappedStatement { leading: String },
}

impl MapError {
    fn unsupported(table: &str, detail: impl Into<String>) -> Self {
        MapError::Unsupported {
            table: table.to_string(),
            detail: detail.into(),
        }
    }
}

/// Source-only table options that are removed without loss.
const DROPPED_OPTIONS: &[&str] = &[
    "AVG_ROW_LENGTH",
    "CHARACTER SET",
    "CHARSET",
    "CHECKSUM",
    "COLLATE",
    "COMMENT",
    "COMPRESSION",
    "DATA DIRECTORY",
    "DEFAULT CHARACTER SET",
    "DEFAULT CHARSET",
    "DEFAULT COLLATE",
    "DELAY_KEY_WRITE",
    "ENCRYPTION",
    "ENGINE",
    "INDEX DIRECTORY",
    "INSERT_METHOD",
    "KEY_BLOCK_SIZE",
    "MAX_ROWS",
    "MIN_ROWS",
    "PACK_KEYS",
    "ROW_FORMAT",
    "TABLESPACE",
    "TYPE",
];

fn is_droppable_option(name: &str) -> bool {
    DROPPED_OPTIONS.contains(&name) || name.starts_with("STATS_")
}

/// Names already in use within one namespace, compared case-insensitively.
#[derive(Debug, Default)]
struct NameRegistry {
    taken: HashSet<String>,
}

impl NameRegistry {
    fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_lowercase());
    }

    /// Claim `base`, or `base_2`, `base_3`, ... when it is taken. Long names
    /// are truncated before the suffix so the result fits the identifier limit.
    fn claim(&mut self, base: &str) -> String {
        let first = truncate_ident(base, 0);
        if self.taken.insert(first.to_lowercase()) {
            return first.to_string();
        }
        let mut n = 2usize;
        loop {
            let suffix = format!("_{}", n);
            let candidate = format!("{}{}", truncate_ident(base, suffix.len()), suffix);
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// What mapping a single column adds to its table.
#[derive(Debug, Default)]
struct ColumnExtras {
    sequence: Option<SequenceDef>,
    enum_type: Option<EnumType>,
    check: Option<CheckDef>,
    unique: bool,
}

fn check_ident(name: &str) -> Result<(), MapError> {
    if name.len() > MAX_IDENT_LEN {
        return Err(MapError::IdentifierTooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }
    Ok(())
}

fn check_parts(parts: &mut [KeyPart]) -> Result<(), MapError> {
    for part in parts {
        check_ident(&part.column)?;
        part.prefix_len = None;
    }
    Ok(())
}

/// Maps statements one at a time for a single conversion run.
///
/// Relation names (tables, generated sequences and enum types) share one
/// registry that is seeded with every table and type in the dump before the
/// first statement is mapped.
pub struct Mapper {
    options: ConversionOptions,
    relations: NameRegistry,
    /// Lowercase names of types the dump itself creates
    declared_types: HashSet<String>,
    /// Constraint names per table, keyed by lowercase table name
    constraints: HashMap<String, NameRegistry>,
}

impl Mapper {
    pub fn new(options: ConversionOptions, statements: &[Statement]) -> Self {
        let mut relations = NameRegistry::default();
        let mut declared_types = HashSet::new();
        for statement in statements {
            match &statement.kind {
                StatementKind::CreateTable(table) => relations.reserve(&table.name),
                StatementKind::Unmapped => {
                    if let Some(name) = created_type(&statement.raw) {
                        relations.reserve(&name);
                        declared_types.insert(name);
                    }
                }
                _ => {}
            }
        }
        debug!(
            relations = relations.taken.len(),
            types = declared_types.len(),
            "seeded name registry"
        );
        Self {
            options,
            relations,
            declared_types,
            constraints: HashMap::new(),
        }
    }

    /// A column type naming a type created earlier in the dump.
    fn declared_type(&self, sql_type: &SqlType) -> Option<String> {
        (sql_type.params.is_empty() && self.declared_types.contains(&sql_type.base))
            .then(|| quote_ident(&sql_type.base))
    }

    pub fn map(&mut self, mut statement: Statement) -> Result<Statement, MapError> {
        statement.kind = match statement.kind {
            StatementKind::CreateTable(table) => StatementKind::CreateTable(self.map_table(table)?),
            StatementKind::Insert(insert) => StatementKind::Insert(map_insert(insert)?),
            StatementKind::Drop(drop) => StatementKind::Drop(map_drop(drop)?),
            StatementKind::Alter(alter) => StatementKind::Alter(self.map_alter(alter)?),
            StatementKind::Unmapped if self.options.strict => {
                return Err(MapError::UnmappedStatement {
                    leading: leading_words(&statement.raw),
                });
            }
            kind @ (StatementKind::Set
            | StatementKind::LockTables
            | StatementKind::Comment
            | StatementKind::Unmapped) => kind,
        };
        trace!(index = statement.index, kind = statement.kind.name(), "mapped statement");
        Ok(statement)
    }

    fn constraint_names(&mut self, table: &str) -> &mut NameRegistry {
        self.constraints.entry(table.to_lowercase()).or_default()
    }

    fn map_table(&mut self, mut table: TableDef) -> Result<TableDef, MapError> {
        check_ident(&table.name)?;

        let mut start = 1;
        for option in std::mem::take(&mut table.options) {
            if option.name == "AUTO_INCREMENT" {
                start = option
                    .value
                    .parse()
                    .map_err(|_| MapError::UnsupportedOption {
                        table: table.name.clone(),
                        option: format!("AUTO_INCREMENT={}", option.value),
                    })?;
            } else if is_droppable_option(&option.name) {
                table.dropped_options.push(option);
            } else {
                return Err(MapError::UnsupportedOption {
                    table: table.name.clone(),
                    option: option.name,
                });
            }
        }

        // Existing constraint names win over generated ones
        let mut names = NameRegistry::default();
        let declared = table
            .checks
            .iter()
            .map(|c| c.name.as_ref())
            .chain(table.unique_keys.iter().map(|k| k.name.as_ref()))
            .chain(table.indexes.iter().map(|i| i.name.as_ref()))
            .chain(table.foreign_keys.iter().map(|f| f.name.as_ref()))
            .flatten();
        for name in declared {
            check_ident(name)?;
            names.reserve(name);
        }

        let mut columns = std::mem::take(&mut table.columns);
        for column in &mut columns {
            let extras = self.map_column(&table.name, column, &mut names, start)?;
            if let Some(sequence) = extras.sequence {
                table.sequences.push(sequence);
            }
            if let Some(enum_type) = extras.enum_type {
                table.enum_types.push(enum_type);
            }
            if let Some(check) = extras.check {
                table.checks.push(check);
            }
            if extras.unique && !has_single_column_key(&table, &column.name) {
                table.unique_keys.push(KeyDef {
                    name: None,
                    parts: vec![KeyPart::new(column.name.clone())],
                });
            }
        }
        table.columns = columns;
        self.constraints.insert(table.name.to_lowercase(), names);

        if let Some(pk) = &mut table.primary_key {
            check_parts(&mut pk.parts)?;
        }
        for key in &mut table.unique_keys {
            check_parts(&mut key.parts)?;
        }
        for index in &mut table.indexes {
            map_index_kind(&table.name, &mut index.kind)?;
            check_parts(&mut index.parts)?;
        }
        for fk in &table.foreign_keys {
            check_ident(&fk.ref_table)?;
            for column in fk.columns.iter().chain(&fk.ref_columns) {
                check_ident(column)?;
            }
        }
        // MySQL parses but never evaluates NOT ENFORCED checks
        table.checks.retain(|c| c.enforced);

        debug!(
            table = %table.name,
            sequences = table.sequences.len(),
            dropped_options = table.dropped_options.len(),
            "mapped table"
        );
        Ok(table)
    }

    fn map_column(
        &mut self,
        table: &str,
        column: &mut ColumnDef,
        names: &mut NameRegistry,
        start: u64,
    ) -> Result<ColumnExtras, MapError> {
        check_ident(&column.name)?;
        let mut extras = ColumnExtras::default();

        if column.sql_type.base == "enum" {
            if self.options.enum_to_check {
                column.mapped_type = Some("STRING".to_string());
                let name = names.claim(&format!("{}_{}_check", table, column.name));
                extras.check = Some(CheckDef {
                    name: Some(name),
                    expr: CheckExpr::InList {
                        column: column.name.clone(),
                        values: column.sql_type.params.clone(),
                    },
                    enforced: true,
                });
            } else if self.options.native_enums {
                let name = self
                    .relations
                    .claim(&format!("{}_{}_enum", table, column.name).to_lowercase());
                column.mapped_type = Some(quote_ident(&name));
                trace!(table, column = %column.name, enum_type = %name, "enum to native type");
                extras.enum_type = Some(EnumType {
                    name,
                    values: column.sql_type.params.clone(),
                });
            } else {
                return Err(MapError::UnsupportedEnum {
                    table: table.to_string(),
                    column: column.name.clone(),
                });
            }
        } else {
            let mapped = map_type(&column.sql_type)
                .or_else(|| self.declared_type(&column.sql_type))
                .ok_or_else(|| MapError::UnsupportedType {
                    table: table.to_string(),
                    column: column.name.clone(),
                    raw_type: column.raw_type.clone(),
                })?;
            column.mapped_type = Some(mapped);
        }

        if column.sql_type.base == "serial" {
            column.auto_increment = true;
            column.nullable = false;
            extras.unique = true;
        }

        if column.auto_increment {
            if column.default.is_some() {
                return Err(MapError::unsupported(
                    table,
                    format!(
                        "auto-increment column `{}` also declares a default",
                        column.name
                    ),
                ));
            }
            let name = self
                .relations
                .claim(&format!("{}_{}_seq", table, column.name).to_lowercase());
            column.default = Some(Fragment::generated(format!(
                "nextval({})",
                quote_string(&quote_ident(&name))
            )));
            column.auto_increment = false;
            trace!(table, column = %column.name, sequence = %name, "auto-increment to sequence");
            extras.sequence = Some(SequenceDef { name, start });
        }

        Ok(extras)
    }

    fn map_alter(&mut self, mut alter: AlterStmt) -> Result<AlterStmt, MapError> {
        check_ident(&alter.table)?;
        if alter.is_key_toggle_only() {
            return Ok(alter);
        }

        let table = alter.table.clone();
        let mut actions = Vec::with_capacity(alter.actions.len());
        for action in std::mem::take(&mut alter.actions) {
            match action {
                AlterAction::DisableKeys | AlterAction::EnableKeys => {}
                AlterAction::AddColumn {
                    mut column,
                    constraints,
                } => {
                    let mut names = self.constraints.remove(&table.to_lowercase()).unwrap_or_default();
                    let extras = self.map_column(&table, &mut column, &mut names, 1);
                    self.constraints.insert(table.to_lowercase(), names);
                    let extras = extras?;

                    let mut constraints: Vec<TableConstraint> = constraints
                        .into_iter()
                        .map(|c| map_constraint(&table, c))
                        .collect::<Result<_, _>>()?;
                    if let Some(check) = extras.check {
                        constraints.push(TableConstraint::Check(check));
                    }
                    if extras.unique {
                        constraints.push(TableConstraint::Unique(KeyDef {
                            name: None,
                            parts: vec![KeyPart::new(column.name.clone())],
                        }));
                    }
                    alter.sequences.extend(extras.sequence);
                    alter.enum_types.extend(extras.enum_type);
                    actions.push(AlterAction::AddColumn {
                        column,
                        constraints,
                    });
                }
                AlterAction::AddConstraint(constraint) => {
                    if let TableConstraint::Check(CheckDef { name: Some(name), .. }) = &constraint
                    {
                        self.constraint_names(&table).reserve(name);
                    }
                    actions.push(AlterAction::AddConstraint(map_constraint(&table, constraint)?));
                }
                AlterAction::Other(fragment) => {
                    check_other_action(&table, &fragment)?;
                    actions.push(AlterAction::Other(fragment));
                }
            }
        }

        let adds_index = actions
            .iter()
            .any(|a| matches!(a, AlterAction::AddConstraint(TableConstraint::Index(_))));
        if adds_index && actions.len() > 1 {
            return Err(MapError::unsupported(
                &table,
                "an added index must be the only alteration in its statement",
            ));
        }

        alter.actions = actions;
        Ok(alter)
    }
}

fn has_single_column_key(table: &TableDef, column: &str) -> bool {
    let single = |parts: &[KeyPart]| parts.len() == 1 && parts[0].column.eq_ignore_ascii_case(column);
    table.primary_key.as_ref().is_some_and(|pk| single(&pk.parts))
        || table.unique_keys.iter().any(|k| single(&k.parts))
}

fn map_index_kind(table: &str, kind: &mut IndexKind) -> Result<(), MapError> {
    match kind {
        IndexKind::Plain => {}
        IndexKind::Fulltext => *kind = IndexKind::Plain,
        IndexKind::Spatial => {
            return Err(MapError::unsupported(table, "spatial indexes are not supported"));
        }
    }
    Ok(())
}

fn map_constraint(table: &str, mut constraint: TableConstraint) -> Result<TableConstraint, MapError> {
    match &mut constraint {
        TableConstraint::PrimaryKey(key) | TableConstraint::Unique(key) => {
            check_parts(&mut key.parts)?;
        }
        TableConstraint::Index(index) => {
            map_index_kind(table, &mut index.kind)?;
            check_parts(&mut index.parts)?;
        }
        TableConstraint::ForeignKey(fk) => {
            check_ident(&fk.ref_table)?;
        }
        TableConstraint::Check(check) => {
            if !check.enforced {
                return Err(MapError::unsupported(
                    table,
                    "NOT ENFORCED checks have no destination equivalent",
                ));
            }
        }
    }
    Ok(constraint)
}

/// Alter actions passed through as text must be spelled the same way in
/// both dialects.
fn check_other_action(table: &str, fragment: &Fragment) -> Result<(), MapError> {
    let words: Vec<String> = fragment
        .tokens
        .iter()
        .filter(|t| !t.is_comment())
        .take(2)
        .map(|t| t.text.to_ascii_uppercase())
        .collect();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    let supported = match words.as_slice() {
        ["DROP", "FOREIGN" | "PRIMARY" | "INDEX" | "KEY"] => false,
        ["ADD" | "DROP" | "RENAME" | "ALTER", ..] => true,
        _ => false,
    };
    if supported {
        Ok(())
    } else {
        Err(MapError::unsupported(
            table,
            format!("alter action `{}` is not supported", fragment.text),
        ))
    }
}

fn map_insert(insert: InsertStmt) -> Result<InsertStmt, MapError> {
    check_ident(&insert.table)?;
    for column in &insert.columns {
        check_ident(column)?;
    }
    if insert.on_duplicate.is_some() {
        return Err(MapError::unsupported(
            &insert.table,
            "ON DUPLICATE KEY UPDATE has no destination equivalent",
        ));
    }
    Ok(insert)
}

fn map_drop(drop: DropStmt) -> Result<DropStmt, MapError> {
    for name in &drop.names {
        check_ident(name)?;
    }
    Ok(drop)
}

/// Name of the type a `CREATE TYPE [IF NOT EXISTS] name ...` statement creates.
fn created_type(raw: &Fragment) -> Option<String> {
    let mut words = raw.tokens.iter().filter(|t| !t.is_comment());
    if !words.next()?.is_keyword("CREATE") || !words.next()?.is_keyword("TYPE") {
        return None;
    }
    let mut name = words.next()?;
    if name.is_keyword("IF") {
        words.next()?; // NOT
        words.next()?; // EXISTS
        name = words.next()?;
    }
    name.is_name().then(|| name.text.to_lowercase())
}

fn leading_words(raw: &Fragment) -> String {
    let words: Vec<&str> = raw
        .tokens
        .iter()
        .filter(|t| !t.is_comment())
        .take(3)
        .map(|t| t.text.as_str())
        .collect();
    words.join(" ")
}
