use datacast_api::config::CoercionOptions;
use datacast_api::error::ConversionError;
use datacast_api::value::Value;

use super::text_of;

/// Generic structure: lists, mappings and records pass through, text is
/// decoded as a JSON document.
pub fn object(raw: &Value, _options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::List(_) | Value::Map(_) | Value::Record(_) => Ok(raw.clone()),
        _ => {
            let s = text_of(raw).ok_or_else(|| {
                ConversionError::invalid_object(format!(
                    "cannot convert {} to object",
                    raw.type_name()
                ))
            })?;
            serde_json::from_str::<serde_json::Value>(&s)
                .map(Value::from)
                .map_err(|e| ConversionError::invalid_object(format!("malformed JSON: {e}")))
        }
    }
}
