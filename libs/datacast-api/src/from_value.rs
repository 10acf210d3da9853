use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::declare::Blob;
use crate::error::ConversionError;
use crate::value::Value;

/// Typed extraction from an already coerced [`Value`].
///
/// Runs after the engine has shaped the value, so a mismatch here means the
/// declaration and the Rust type disagree.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

fn mismatch(expected: &str, value: Value) -> ConversionError {
    let msg = format!("expected {expected}, got {}", value.type_name());
    ConversionError {
        value,
        ..ConversionError::invalid_primitive(msg)
    }
}

macro_rules! from_value_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| {
                            mismatch(concat!("integer in range of ", stringify!($ty)), Value::Int(i))
                        }),
                        other => Err(mismatch("int", other)),
                    }
                }
            }
        )*
    };
}

from_value_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

macro_rules! from_value_variant {
    ($ty:ty, $variant:ident, $expected:literal) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch($expected, other)),
                }
            }
        }
    };
}

from_value_variant!(bool, Bool, "bool");
from_value_variant!(String, Text, "text");
from_value_variant!(Uuid, Uuid, "uuid");
from_value_variant!(NaiveDate, Date, "date");
from_value_variant!(NaiveDateTime, DateTime, "datetime");
from_value_variant!(NaiveTime, Time, "time");
from_value_variant!(TimeDelta, Duration, "duration");
from_value_variant!(Decimal, Decimal, "decimal");

impl FromValue for Blob {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(b) => Ok(Blob(b)),
            other => Err(mismatch("bytes", other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value.to_json())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.with_index(i)))
                .collect(),
            other => Err(mismatch("list", other)),
        }
    }
}

impl<T: FromValue, S: BuildHasher + Default> FromValue for HashMap<String, T, S> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| match T::from_value(v) {
                    Ok(v) => Ok((k, v)),
                    Err(e) => Err(e.with_key(k)),
                })
                .collect(),
            other => Err(mismatch("map", other)),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| match T::from_value(v) {
                    Ok(v) => Ok((k, v)),
                    Err(e) => Err(e.with_key(k)),
                })
                .collect(),
            other => Err(mismatch("map", other)),
        }
    }
}
