//! Primitive converters, one per [`PrimitiveKind`].
//!
//! Every converter has the [`Encoder`](datacast_api::encoder::Encoder)
//! signature `fn(&Value, &CoercionOptions) -> Result<Value, ConversionError>`,
//! is pure, and passes through values that already have the target shape.
//! Text and bytes are parsed; bytes are decoded as UTF-8 first.
//!
//! Only Identifier, Float and Decimal honour the lenient policy: with
//! `strict = false` their failures become `Null`. Every other converter raises.
mod boolean;
mod identifier;
mod numeric;
mod object;
mod temporal;
mod text;

use std::borrow::Cow;

use datacast_api::config::CoercionOptions;
use datacast_api::descriptor::PrimitiveKind;
use datacast_api::error::ConversionError;
use datacast_api::value::Value;

pub use boolean::boolean;
pub use identifier::identifier;
pub use numeric::{decimal, float, integer};
pub use object::object;
pub use temporal::{date, datetime, duration, time};
pub use text::{bytes, text};

/// Converter function type shared by all built-in converters.
pub type ConvertFn = fn(&Value, &CoercionOptions) -> Result<Value, ConversionError>;

/// The built-in converter for `kind`.
pub fn builtin(kind: PrimitiveKind) -> ConvertFn {
    match kind {
        PrimitiveKind::Identifier => identifier,
        PrimitiveKind::Date => date,
        PrimitiveKind::DateTime => datetime,
        PrimitiveKind::Time => time,
        PrimitiveKind::Duration => duration,
        PrimitiveKind::Integer => integer,
        PrimitiveKind::Float => float,
        PrimitiveKind::Decimal => decimal,
        PrimitiveKind::Boolean => boolean,
        PrimitiveKind::Object => object,
        PrimitiveKind::Text => text,
        PrimitiveKind::Bytes => bytes,
    }
}

/// Textual form of text and byte values; `None` for anything else or for
/// bytes that are not valid UTF-8.
fn text_of(raw: &Value) -> Option<Cow<'_, str>> {
    match raw {
        Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bytes(b) => std::str::from_utf8(b).ok().map(Cow::Borrowed),
        _ => None,
    }
}

/// Apply the lenient policy to a failure of a lenient-capable converter.
fn lenient(
    kind: PrimitiveKind,
    options: &CoercionOptions,
    err: ConversionError,
) -> Result<Value, ConversionError> {
    if options.strict {
        Err(err)
    } else {
        tracing::debug!(kind = %kind, error = %err.message, "lenient coercion, yielding null");
        Ok(Value::Null)
    }
}
