use serde::Deserialize;

/// Switches for one conversion run. Everything is off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConversionOptions {
    /// Turn enum columns into strings guarded by a check constraint
    pub enum_to_check: bool,
    /// Give each enum column its own `CREATE TYPE ... AS ENUM` type
    pub native_enums: bool,
    /// Reject statements the translator does not understand
    pub strict: bool,
    /// Leave dropped table options behind as a comment
    pub annotate_dropped: bool,
}
