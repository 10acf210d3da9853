use datacast_api::config::CoercionOptions;
use datacast_api::error::ConversionError;
use datacast_api::value::{Value, format_duration};

/// Text from text, UTF-8 bytes or any scalar's canonical rendering.
pub fn text(raw: &Value, _options: &CoercionOptions) -> Result<Value, ConversionError> {
    let s = match raw {
        Value::Text(_) => return Ok(raw.clone()),
        Value::Bytes(b) => String::from_utf8(b.clone())
            .map_err(|e| ConversionError::invalid_primitive(format!("bytes are not UTF-8: {e}")))?,
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Uuid(u) => u.hyphenated().to_string(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        Value::Duration(d) => format_duration(d),
        Value::Null | Value::List(_) | Value::Map(_) | Value::Record(_) => {
            return Err(ConversionError::invalid_primitive(format!(
                "cannot convert {} to text",
                raw.type_name()
            )));
        }
    };
    Ok(Value::Text(s))
}

/// Raw bytes from bytes, text (UTF-8) or a list of octets.
pub fn bytes(raw: &Value, _options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::Bytes(_) => Ok(raw.clone()),
        Value::Text(s) => Ok(Value::Bytes(s.as_bytes().to_vec())),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_i64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| {
                        ConversionError::invalid_primitive(format!("{item} is not an octet"))
                            .with_index(i)
                    })
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(Value::Bytes),
        _ => Err(ConversionError::invalid_primitive(format!(
            "cannot convert {} to bytes",
            raw.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};

    use super::*;

    fn strict() -> CoercionOptions {
        CoercionOptions::strict()
    }

    #[test]
    fn scalars_render_canonically() {
        assert_eq!(text(&Value::Int(5), &strict()).unwrap(), Value::from("5"));
        assert_eq!(text(&Value::Bool(true), &strict()).unwrap(), Value::from("true"));
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(text(&Value::Date(d), &strict()).unwrap(), Value::from("2024-01-05"));
        assert_eq!(
            text(&Value::Duration(TimeDelta::seconds(-3723)), &strict()).unwrap(),
            Value::from("-01:02:03")
        );
    }

    #[test]
    fn text_rejects_structures_and_bad_utf8() {
        assert!(text(&Value::List(vec![]), &strict()).is_err());
        assert!(text(&Value::Null, &strict()).is_err());
        assert!(text(&Value::Bytes(vec![0xff, 0xfe]), &strict()).is_err());
    }

    #[test]
    fn bytes_from_text_and_octets() {
        assert_eq!(bytes(&Value::from("ab"), &strict()).unwrap(), Value::Bytes(b"ab".to_vec()));
        let octets = Value::List(vec![Value::Int(1), Value::Int(255)]);
        assert_eq!(bytes(&octets, &strict()).unwrap(), Value::Bytes(vec![1, 255]));
        let err = bytes(&Value::List(vec![Value::Int(1), Value::Int(256)]), &strict()).unwrap_err();
        assert_eq!(err.path_string(), "[1]");
    }
}
