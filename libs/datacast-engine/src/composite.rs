//! Composite construction.
//!
//! The input shape picks exactly one path up front:
//!
//! - a record of the same composite is returned unchanged;
//! - a mapping (or a record of another composite) is read by field key,
//!   alias first;
//! - a sequence is matched to the fields by position;
//! - a lone scalar fills a single-field composite.
//!
//! Absent fields fall back to their default provider, then to `Null` when the
//! field tolerates absence. Anything else is a construction error.

use datacast_api::descriptor::{CompositeSpec, FieldSpec};
use datacast_api::error::ConversionError;
use datacast_api::value::{Record, Value};

use crate::engine::Coercer;

pub(crate) fn construct(
    coercer: &Coercer<'_>,
    spec: &CompositeSpec,
    raw: &Value,
) -> Result<Value, ConversionError> {
    tracing::trace!(composite = spec.name(), input = raw.type_name(), "constructing composite");
    let fields = match raw {
        Value::Record(record) if record.name() == spec.name() => return Ok(raw.clone()),
        Value::Record(record) => by_key(coercer, spec, |key| record.get(key)),
        Value::Map(map) => by_key(coercer, spec, |key| map.get(key)),
        Value::List(items) => by_position(coercer, spec, items),
        Value::Null => Err(shape_error(spec, raw, format!("cannot build {} from null", spec.name()))),
        scalar => match spec.fields() {
            [only] => field_value(coercer, only, Some(scalar)).map(|v| vec![(only.name.clone(), v)]),
            fields => Err(shape_error(
                spec,
                raw,
                format!(
                    "cannot build {} ({} fields) from a single {}",
                    spec.name(),
                    fields.len(),
                    scalar.type_name()
                ),
            )),
        },
    };
    let fields = fields.map_err(|e| e.in_composite(spec.name()))?;
    Ok(Value::Record(Record::new(spec.name(), fields)))
}

fn by_key<'v>(
    coercer: &Coercer<'_>,
    spec: &CompositeSpec,
    lookup: impl Fn(&str) -> Option<&'v Value>,
) -> Result<Vec<(String, Value)>, ConversionError> {
    spec.fields()
        .iter()
        .map(|field| {
            let raw = field
                .alias
                .as_deref()
                .and_then(&lookup)
                .or_else(|| lookup(&field.name));
            field_value(coercer, field, raw).map(|v| (field.name.clone(), v))
        })
        .collect()
}

fn by_position(
    coercer: &Coercer<'_>,
    spec: &CompositeSpec,
    items: &[Value],
) -> Result<Vec<(String, Value)>, ConversionError> {
    if items.len() > spec.fields().len() {
        let raw = Value::List(items.to_vec());
        return Err(shape_error(
            spec,
            &raw,
            format!(
                "{} takes at most {} positional values, got {}",
                spec.name(),
                spec.fields().len(),
                items.len()
            ),
        ));
    }
    spec.fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            field_value(coercer, field, items.get(i)).map(|v| (field.name.clone(), v))
        })
        .collect()
}

/// Coerce one field from its raw value, its default, or absence.
fn field_value(
    coercer: &Coercer<'_>,
    field: &FieldSpec,
    raw: Option<&Value>,
) -> Result<Value, ConversionError> {
    let coerced = match (raw, &field.default) {
        (Some(raw), _) => coercer.coerce_field(field, raw),
        (None, Some(provider)) => coercer.coerce_field(field, &provider()),
        (None, None) if field.is_required() => Err(ConversionError::composite(format!(
            "missing required field '{}'",
            field.name
        ))
        .annotate(&field.descriptor, &Value::Null)),
        (None, None) => coercer.coerce_field(field, &Value::Null),
    };
    coerced.map_err(|e| e.with_field(field.name.as_str()))
}

/// Construction error carrying the composite as target and the whole input.
fn shape_error(spec: &CompositeSpec, raw: &Value, msg: String) -> ConversionError {
    let mut err = ConversionError::composite(msg);
    err.target = spec.name().to_string();
    err.value = raw.clone();
    err
}
