use datacast_api::config::CoercionOptions;
use datacast_api::error::ConversionError;
use datacast_api::value::Value;

use super::text_of;

const TRUTHY: &[&str] = &["y", "yes", "t", "true", "on", "1"];
const FALSY: &[&str] = &["n", "no", "f", "false", "off", "0"];

/// Boolean from the fixed text vocabulary, else generic truthiness.
pub fn boolean(raw: &Value, _options: &CoercionOptions) -> Result<Value, ConversionError> {
    if let Value::Bool(_) = raw {
        return Ok(raw.clone());
    }
    match text_of(raw) {
        Some(s) => {
            let word = s.trim().to_ascii_lowercase();
            if TRUTHY.contains(&word.as_str()) {
                Ok(Value::Bool(true))
            } else if FALSY.contains(&word.as_str()) {
                Ok(Value::Bool(false))
            } else {
                Err(ConversionError::invalid_primitive(format!(
                    "'{s}' is not a boolean word"
                )))
            }
        }
        None => Ok(Value::Bool(raw.is_truthy())),
    }
}
