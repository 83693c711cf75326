pub mod converter;
pub mod encoding;
pub mod inflector;
pub mod lexer;
pub mod parser;
pub mod rdm;
pub mod schema;
pub mod serializer;
pub mod translator;
pub mod types;

use wasm_bindgen::prelude::*;

use converter::convert_str;
use serializer::to_yaml;

pub use converter::{ConvertError, ConvertOptions, Converter, Output, Transform};
pub use translator::{Translation, Warning, translate};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Convert a canonical relational XML document to Doctrine schema YAML
#[wasm_bindgen(js_name = "rdmToYaml")]
pub fn convert_to_yaml(source: &str) -> Result<String, String> {
    let translation = convert_str(source).map_err(|e| e.to_string())?;
    to_yaml(&translation.schema).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_to_yaml() {
        let yaml = convert_to_yaml(
            r#"<database><table name="order_item">
                <column name="id" type="INTEGER" primaryKey="true" autoIncrement="true"/>
            </table></database>"#,
        )
        .unwrap();
        assert!(yaml.starts_with("OrderItem:\n"));
        assert!(yaml.contains("tableName: order_item"));
    }

    #[test]
    fn test_convert_to_yaml_error() {
        let err = convert_to_yaml("<database>").unwrap_err();
        assert!(err.contains("never closed"));
    }
}
