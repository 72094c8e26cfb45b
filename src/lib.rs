pub mod ast;
pub mod config;
pub mod generate;
pub mod lexer;
pub mod parser;
pub mod rank;
pub mod registry;
pub mod render;
pub mod serializer;
pub mod transpiler;

use wasm_bindgen::prelude::*;

use config::Config;
use transpiler::TranspileOptions;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Transpile extended DDL to MySQL DDL
#[wasm_bindgen(js_name = "transpileSql")]
pub fn transpile_sql(
    source: &str,
    config: Option<String>,
    drop_tables: Option<bool>,
) -> Result<String, js_sys::Error> {
    let config = match config.as_deref() {
        Some(json) => Config::from_json(json)
            .map_err(|e| js_sys::Error::new(&format!("Invalid config: {e}")))?,
        None => Config::default(),
    };
    let options = TranspileOptions {
        drop_tables: drop_tables.unwrap_or(false),
        drop_cascade: false,
    };
    transpiler::transpile(source, &config, options).map_err(|e| js_sys::Error::new(&e.to_string()))
}
