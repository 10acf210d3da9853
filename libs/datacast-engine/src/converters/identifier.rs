use datacast_api::config::CoercionOptions;
use datacast_api::descriptor::PrimitiveKind;
use datacast_api::error::ConversionError;
use datacast_api::value::Value;
use uuid::Uuid;

use super::{lenient, text_of};

/// UUID from a UUID, 16 raw bytes, or any textual UUID form.
pub fn identifier(raw: &Value, options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::Uuid(_) => Ok(raw.clone()),
        Value::Bytes(b) if b.len() == 16 => match Uuid::from_slice(b) {
            Ok(u) => Ok(Value::Uuid(u)),
            Err(e) => lenient(
                PrimitiveKind::Identifier,
                options,
                ConversionError::invalid_primitive(format!("invalid identifier bytes: {e}")),
            ),
        },
        _ => {
            let parsed = match text_of(raw) {
                Some(s) => Uuid::parse_str(s.trim())
                    .map(Value::Uuid)
                    .map_err(|e| ConversionError::invalid_primitive(format!("invalid identifier: {e}"))),
                None => Err(ConversionError::invalid_primitive(format!(
                    "cannot convert {} to identifier",
                    raw.type_name()
                ))),
            };
            parsed.or_else(|err| lenient(PrimitiveKind::Identifier, options, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    #[test]
    fn parses_text_and_braced_forms() {
        let expected = Value::Uuid(Uuid::parse_str(ID).unwrap());
        let strict = CoercionOptions::strict();
        assert_eq!(identifier(&Value::from(ID), &strict).unwrap(), expected);
        assert_eq!(identifier(&Value::from(format!(" {{{ID}}} ")), &strict).unwrap(), expected);
        assert_eq!(identifier(&Value::Bytes(ID.as_bytes().to_vec()), &strict).unwrap(), expected);
    }

    #[test]
    fn raw_bytes_are_read_directly() {
        let u = Uuid::parse_str(ID).unwrap();
        let v = identifier(&Value::Bytes(u.as_bytes().to_vec()), &CoercionOptions::strict());
        assert_eq!(v.unwrap(), Value::Uuid(u));
    }

    #[test]
    fn failure_policy_follows_strictness() {
        let raw = Value::from("not-a-uuid");
        assert!(identifier(&raw, &CoercionOptions::strict()).is_err());
        assert_eq!(identifier(&raw, &CoercionOptions::lenient()).unwrap(), Value::Null);
        assert_eq!(identifier(&Value::Int(3), &CoercionOptions::lenient()).unwrap(), Value::Null);
    }
}
