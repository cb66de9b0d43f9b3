//! Convert mysqldump output into a dump CockroachDB can load.

pub mod ast;
mod convert;
mod error;
pub mod mapper;
mod options;
pub mod serializer;
pub mod sql;

use wasm_bindgen::prelude::*;

pub use convert::{convert, convert_with_cancel};
pub use error::ConvertError;
pub use mapper::MapError;
pub use options::ConversionOptions;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Convert a mysqldump to a CockroachDB dump
#[wasm_bindgen(js_name = "mysqlToCrdb")]
pub fn convert_dump(source: &str, enum_to_check: Option<bool>) -> Result<String, String> {
    let options = ConversionOptions {
        enum_to_check: enum_to_check.unwrap_or(false),
        ..Default::default()
    };
    let output = convert(source.as_bytes(), &options).map_err(|e| e.to_string())?;
    String::from_utf8(output).map_err(|e| e.to_string())
}
