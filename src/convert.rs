//! Runs one conversion from start to finish.

use crate::error::ConvertError;
use crate::mapper::Mapper;
use crate::options::ConversionOptions;
use crate::serializer::serialize;
use crate::sql::parse_sql;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Convert a mysqldump into a CockroachDB dump.
///
/// The whole input is parsed before anything is mapped, and the first error
/// aborts the run without partial output.
pub fn convert(input: &[u8], options: &ConversionOptions) -> Result<Vec<u8>, ConvertError> {
    convert_with_cancel(input, options, &AtomicBool::new(false))
}

/// [`convert`], polling `cancel` once per statement.
pub fn convert_with_cancel(
    input: &[u8],
    options: &ConversionOptions,
    cancel: &AtomicBool,
) -> Result<Vec<u8>, ConvertError> {
    let source = std::str::from_utf8(input).map_err(|e| ConvertError::Encoding {
        offset: e.valid_up_to(),
    })?;

    let statements = parse_sql(source)?;
    let mut mapper = Mapper::new(*options, &statements);

    let mut mapped = Vec::with_capacity(statements.len());
    for statement in statements {
        if cancel.load(Ordering::Relaxed) {
            debug!(statement = statement.index, "conversion cancelled");
            return Err(ConvertError::Cancelled {
                statement: statement.index,
            });
        }
        let index = statement.index;
        let position = statement.position;
        let statement = mapper.map(statement).map_err(|source| ConvertError::Map {
            statement: index,
            position,
            source,
        })?;
        mapped.push(statement);
    }

    let output = serialize(&mapped, options);
    debug!(
        statements = mapped.len(),
        input_bytes = input.len(),
        output_bytes = output.len(),
        "conversion finished"
    );
    Ok(output.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_utf8_reports_offset() {
        let err = convert(b"SET a = 1;\xff", &ConversionOptions::default()).unwrap_err();
        assert_eq!(err, ConvertError::Encoding { offset: 10 });
    }

    #[test]
    fn test_cancel_before_first_statement() {
        let cancel = AtomicBool::new(true);
        let err = convert_with_cancel(b"SET a = 1;", &ConversionOptions::default(), &cancel)
            .unwrap_err();
        assert_eq!(err, ConvertError::Cancelled { statement: 1 });
    }

    #[test]
    fn test_map_error_carries_statement() {
        let err = convert(
            b"SET a = 1;\nCREATE TABLE t (c ENUM('x'));",
            &ConversionOptions::default(),
        )
        .unwrap_err();
        match err {
            ConvertError::Map {
                statement,
                position,
                ..
            } => {
                assert_eq!(statement, 2);
                assert_eq!(position.line, 2);
            }
            other => panic!("expected map error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(convert(b"", &ConversionOptions::default()).unwrap().is_empty());
    }
}
