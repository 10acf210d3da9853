use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use datacast_api::config::CoercionOptions;
use datacast_api::descriptor::PrimitiveKind;
use datacast_api::error::ConversionError;
use datacast_api::value::Value;

use super::{lenient, text_of};

/// Integral number. Fractional numbers and non-numeric text always raise.
pub fn integer(raw: &Value, _options: &CoercionOptions) -> Result<Value, ConversionError> {
    match raw {
        Value::Int(_) => Ok(raw.clone()),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(Value::Int(*f as i64))
            } else {
                Err(ConversionError::invalid_primitive(format!(
                    "{f} is not an integral number"
                )))
            }
        }
        Value::Decimal(d) => d
            .fract()
            .is_zero()
            .then(|| d.to_i64())
            .flatten()
            .map(Value::Int)
            .ok_or_else(|| {
                ConversionError::invalid_primitive(format!("{d} is not an integral number"))
            }),
        _ => match text_of(raw) {
            Some(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|e| {
                ConversionError::invalid_primitive(format!("invalid integer '{s}': {e}"))
            }),
            None => Err(ConversionError::invalid_primitive(format!(
                "cannot convert {} to integer",
                raw.type_name()
            ))),
        },
    }
}

/// Binary floating point.
pub fn float(raw: &Value, options: &CoercionOptions) -> Result<Value, ConversionError> {
    let converted = match raw {
        Value::Float(_) => return Ok(raw.clone()),
        Value::Int(i) => Ok(*i as f64),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Decimal(d) => d.to_f64().ok_or_else(|| {
            ConversionError::invalid_primitive(format!("{d} does not fit a float"))
        }),
        _ => match text_of(raw) {
            Some(s) => s.trim().parse::<f64>().map_err(|e| {
                ConversionError::invalid_primitive(format!("invalid float '{s}': {e}"))
            }),
            None => Err(ConversionError::invalid_primitive(format!(
                "cannot convert {} to float",
                raw.type_name()
            ))),
        },
    };
    match converted {
        Ok(f) => Ok(Value::Float(f)),
        Err(err) => lenient(PrimitiveKind::Float, options, err),
    }
}

/// Fixed-point decimal. Text may use plain or scientific notation.
pub fn decimal(raw: &Value, options: &CoercionOptions) -> Result<Value, ConversionError> {
    let converted = match raw {
        Value::Decimal(_) => return Ok(raw.clone()),
        Value::Int(i) => Ok(Decimal::from(*i)),
        Value::Bool(b) => Ok(Decimal::from(i64::from(*b))),
        Value::Float(f) => Decimal::try_from(*f).map_err(|e| {
            ConversionError::invalid_primitive(format!("{f} is not representable as decimal: {e}"))
        }),
        _ => match text_of(raw) {
            Some(s) => {
                let s = s.trim();
                Decimal::from_str(s)
                    .or_else(|_| Decimal::from_scientific(s))
                    .map_err(|e| {
                        ConversionError::invalid_primitive(format!("invalid decimal '{s}': {e}"))
                    })
            }
            None => Err(ConversionError::invalid_primitive(format!(
                "cannot convert {} to decimal",
                raw.type_name()
            ))),
        },
    };
    match converted {
        Ok(d) => Ok(Value::Decimal(d)),
        Err(err) => lenient(PrimitiveKind::Decimal, options, err),
    }
}
