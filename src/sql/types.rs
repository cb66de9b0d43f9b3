//! MySQL to CockroachDB type mapping.
//!
//! The table is fixed and versioned: a dump converted with one version of the
//! table must convert the same way again, so entries change only together
//! with `TYPE_MAP_VERSION`.

use crate::ast::SqlType;

pub const TYPE_MAP_VERSION: u32 = 2;

/// Every source base type the table knows, enum included.
pub const MAPPED_TYPES: &[&str] = &[
    "bool",
    "boolean",
    "tinyint",
    "smallint",
    "mediumint",
    "int",
    "integer",
    "bigint",
    "serial",
    "float",
    "double",
    "double precision",
    "real",
    "decimal",
    "numeric",
    "dec",
    "fixed",
    "char",
    "character",
    "nchar",
    "national char",
    "national character",
    "varchar",
    "nvarchar",
    "national varchar",
    "char varying",
    "character varying",
    "tinytext",
    "text",
    "mediumtext",
    "longtext",
    "binary",
    "varbinary",
    "tinyblob",
    "blob",
    "mediumblob",
    "longblob",
    "bit",
    "date",
    "time",
    "datetime",
    "timestamp",
    "year",
    "json",
    "set",
    "enum",
    // Destination-native names map to themselves
    "string",
    "bytes",
    "int2",
    "int4",
    "int8",
    "float4",
    "float8",
    "jsonb",
    "uuid",
    "inet",
    "interval",
    "timestamptz",
    "varbit",
];

/// Map a source column type to its CockroachDB spelling.
///
/// Returns `None` for types the table does not know. Enums map to the plain
/// string type; whether that is acceptable is the mapper's decision.
pub fn map_type(sql_type: &SqlType) -> Option<String> {
    let params = &sql_type.params;
    let unsigned = sql_type.unsigned;

    let mapped = match sql_type.base.as_str() {
        // Integer types
        "bool" | "boolean" => "BOOL".to_string(),
        "tinyint" if params.first().is_some_and(|p| p == "1") => "BOOL".to_string(),
        "tinyint" => "INT2".to_string(),
        "smallint" if unsigned => "INT4".to_string(),
        "smallint" | "int2" => "INT2".to_string(),
        "int" | "integer" if unsigned => "INT8".to_string(),
        "mediumint" | "int" | "integer" | "int4" => "INT4".to_string(),
        // Unsigned bigint reaches 2^64 - 1, past the INT8 range
        "bigint" if unsigned => "DECIMAL(20)".to_string(),
        "bigint" | "serial" | "int8" => "INT8".to_string(),

        // Floating point
        "float" if float_is_double(params) => "FLOAT8".to_string(),
        "float" | "float4" => "FLOAT4".to_string(),
        "double" | "double precision" | "real" | "float8" => "FLOAT8".to_string(),
        "decimal" | "numeric" | "dec" | "fixed" => with_params("DECIMAL", params),

        // String types
        "char" | "character" | "nchar" | "national char" | "national character" => {
            with_params("CHAR", params)
        }
        "varchar" | "nvarchar" | "national varchar" | "char varying" | "character varying" => {
            with_params("VARCHAR", params)
        }
        "tinytext" | "text" | "mediumtext" | "longtext" | "string" => "STRING".to_string(),
        "enum" | "set" => "STRING".to_string(),

        // Binary
        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" | "bytes" => {
            "BYTES".to_string()
        }
        "bit" => with_params("BIT", params),
        "varbit" => with_params("VARBIT", params),

        // Date/time
        "date" => "DATE".to_string(),
        "time" => "TIME".to_string(),
        "datetime" | "timestamp" => "TIMESTAMP".to_string(),
        "timestamptz" => "TIMESTAMPTZ".to_string(),
        "interval" => "INTERVAL".to_string(),
        "year" => "INT2".to_string(),

        // JSON
        "json" | "jsonb" => "JSONB".to_string(),

        "uuid" => "UUID".to_string(),
        "inet" => "INET".to_string(),

        _ => return None,
    };
    Some(mapped)
}

/// `float(p)` with p above 24 is a double in MySQL.
fn float_is_double(params: &[String]) -> bool {
    params.len() == 1 && params[0].parse::<u32>().is_ok_and(|p| p > 24)
}

fn with_params(name: &str, params: &[String]) -> String {
    if params.is_empty() {
        name.to_string()
    } else {
        format!("{}({})", name, params.join(","))
    }
}
