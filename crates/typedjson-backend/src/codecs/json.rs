//! The built-in `serde_json` codec module.

use serde_json::Value;

use super::types::{CodecFailure, CodecModule};

/// Name of the module and of the backend loaded by default.
pub const DEFAULT_BACKEND: &str = "serde_json";

const ERROR_KIND: &str = "Error";

/// Symbols: encoders `to_string` and `to_string_pretty`, decoder `from_str`,
/// error kind `Error`.
pub fn serde_json_module() -> CodecModule {
    CodecModule::new(DEFAULT_BACKEND)
        .with_encoder("to_string", to_string)
        .with_encoder("to_string_pretty", to_string_pretty)
        .with_decoder("from_str", from_str)
        .with_error_kind(ERROR_KIND)
}

pub(crate) fn to_string(value: &Value) -> Result<String, CodecFailure> {
    serde_json::to_string(value).map_err(|err| CodecFailure::new(ERROR_KIND, err))
}

fn to_string_pretty(value: &Value) -> Result<String, CodecFailure> {
    serde_json::to_string_pretty(value).map_err(|err| CodecFailure::new(ERROR_KIND, err))
}

pub(crate) fn from_str(text: &str) -> Result<Value, CodecFailure> {
    serde_json::from_str(text).map_err(|err| CodecFailure::new(ERROR_KIND, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_key_order() {
        let text = r#"{"z":1,"a":2,"m":[true,null]}"#;
        let value = from_str(text).unwrap();
        assert_eq!(to_string(&value).unwrap(), text);
    }

    #[test]
    fn pretty_encoder_is_exported() {
        let module = serde_json_module();
        let pretty = module.encoder("to_string_pretty").unwrap();
        assert_eq!(pretty(&json!({"a": 1})).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn decode_failure_has_error_kind() {
        let err = from_str("{").unwrap_err();
        assert_eq!(err.kind, "Error");
        assert!(!err.message.is_empty());
    }
}
