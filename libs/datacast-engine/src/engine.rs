use std::borrow::Cow;
use std::collections::BTreeMap;

use datacast_api::config::CoercionOptions;
use datacast_api::descriptor::{CompositeSpec, FieldSpec, TypeDescriptor};
use datacast_api::encoder::Encoder;
use datacast_api::error::ConversionError;
use datacast_api::value::Value;

use crate::composite;
use crate::registry::EncoderRegistry;

/// Where a value sits: the enclosing field and its override converter.
///
/// Carried through optional, union and container layers down to the
/// primitive leaves of one field, and reset at composite boundaries.
#[derive(Clone, Copy)]
struct Site<'a> {
    field: Option<&'a str>,
    encoder: Option<&'a dyn Encoder>,
}

/// Walks a [`TypeDescriptor`] against a raw [`Value`].
///
/// Holds no mutable state: one instance may be shared by any number of
/// threads.
#[derive(Debug, Clone)]
pub struct Coercer<'r> {
    registry: &'r EncoderRegistry,
    options: CoercionOptions,
}

impl Default for Coercer<'static> {
    fn default() -> Self {
        Self::with_registry(EncoderRegistry::global())
    }
}

impl Coercer<'static> {
    /// Coercer over the process-wide registry with strict options.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'r> Coercer<'r> {
    pub fn with_registry(registry: &'r EncoderRegistry) -> Self {
        Self {
            registry,
            options: CoercionOptions::default(),
        }
    }

    pub fn options(mut self, options: CoercionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &'r EncoderRegistry {
        self.registry
    }

    /// Coerce `raw` to the shape of `descriptor`.
    ///
    /// `encoder`, when given, replaces the registry lookup for every
    /// primitive reached before the next composite boundary.
    pub fn coerce(
        &self,
        descriptor: &TypeDescriptor,
        raw: &Value,
        encoder: Option<&dyn Encoder>,
    ) -> Result<Value, ConversionError> {
        self.coerce_at(
            descriptor,
            raw,
            Site {
                field: None,
                encoder,
            },
        )
    }

    /// Build one instance of `spec` from `raw`.
    pub fn construct(&self, spec: &CompositeSpec, raw: &Value) -> Result<Value, ConversionError> {
        composite::construct(self, spec, raw)
    }

    /// Coerce the value of one composite field.
    pub(crate) fn coerce_field(
        &self,
        field: &FieldSpec,
        raw: &Value,
    ) -> Result<Value, ConversionError> {
        self.coerce_at(
            &field.descriptor,
            raw,
            Site {
                field: Some(field.name.as_str()),
                encoder: field.encoder.as_deref(),
            },
        )
    }

    fn coerce_at(
        &self,
        descriptor: &TypeDescriptor,
        raw: &Value,
        site: Site<'_>,
    ) -> Result<Value, ConversionError> {
        match descriptor {
            TypeDescriptor::Optional(inner) => {
                if raw.is_null() {
                    Ok(Value::Null)
                } else {
                    self.coerce_at(inner, raw, site)
                }
            }
            TypeDescriptor::UnionOf(variants) => self.coerce_union(descriptor, variants, raw, site),
            TypeDescriptor::SequenceOf(element) => {
                let items: Cow<'_, [Value]> = match raw {
                    Value::List(items) => Cow::Borrowed(items.as_slice()),
                    single => Cow::Owned(vec![single.clone()]),
                };
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.coerce_at(element, item, site)
                            .map_err(|e| e.with_index(i))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }
            TypeDescriptor::MappingOf(value) => match raw {
                Value::Map(map) => map
                    .iter()
                    .map(|(key, item)| {
                        self.coerce_at(value, item, site)
                            .map(|coerced| (key.clone(), coerced))
                            .map_err(|e| e.with_key(key.as_str()))
                    })
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(Value::Map),
                other => Ok(other.clone()),
            },
            TypeDescriptor::Composite(spec) => composite::construct(self, spec, raw),
            TypeDescriptor::Deferred(deferred) => match deferred.get() {
                Some(spec) => composite::construct(self, spec, raw),
                None => Err(ConversionError::composite(format!(
                    "composite {} is still being resolved",
                    deferred.name()
                ))
                .annotate(descriptor, raw)),
            },
            TypeDescriptor::Primitive(kind) => {
                let encoder = match site.encoder {
                    Some(encoder) => encoder,
                    None => match self.registry.lookup(*kind, site.field) {
                        Some(encoder) => &**encoder,
                        None => {
                            return Err(ConversionError::missing_encoder(format!(
                                "no converter registered for {kind}"
                            ))
                            .annotate(descriptor, raw));
                        }
                    },
                };
                encoder
                    .encode(raw, &self.options)
                    .map_err(|e| e.annotate(descriptor, raw))
            }
            TypeDescriptor::Any => Ok(raw.clone()),
        }
    }

    /// First variant, in declared order, that accepts `raw` under strict rules.
    fn coerce_union(
        &self,
        descriptor: &TypeDescriptor,
        variants: &[TypeDescriptor],
        raw: &Value,
        site: Site<'_>,
    ) -> Result<Value, ConversionError> {
        let strict = Coercer {
            registry: self.registry,
            options: self.options.as_strict(),
        };
        let mut rejected = Vec::with_capacity(variants.len());
        for variant in variants {
            match strict.coerce_at(variant, raw, site) {
                Ok(value) => {
                    tracing::trace!(variant = %variant, "union variant accepted");
                    return Ok(value);
                }
                Err(err) if err.is_configuration() => return Err(err),
                Err(err) => {
                    tracing::trace!(variant = %variant, error = %err.message, "union variant rejected");
                    rejected.push(format!("{variant}: {}", err.message));
                }
            }
        }
        Err(ConversionError::invalid_primitive(format!(
            "no union variant accepted the value ({})",
            rejected.join("; ")
        ))
        .annotate(descriptor, raw))
    }
}

#[cfg(test)]
mod tests {
    use datacast_api::descriptor::PrimitiveKind;
    use datacast_api::error::ErrorKind;

    use super::*;

    fn prim(kind: PrimitiveKind) -> TypeDescriptor {
        TypeDescriptor::Primitive(kind)
    }

    #[test]
    fn optional_absence_skips_inner() {
        let coercer = Coercer::new();
        let d = TypeDescriptor::optional(prim(PrimitiveKind::Integer));
        assert_eq!(coercer.coerce(&d, &Value::Null, None).unwrap(), Value::Null);
        assert_eq!(coercer.coerce(&d, &Value::from("4"), None).unwrap(), Value::Int(4));
    }

    #[test]
    fn sequence_wraps_single_values() {
        let coercer = Coercer::new();
        let d = TypeDescriptor::sequence_of(prim(PrimitiveKind::Integer));
        assert_eq!(
            coercer.coerce(&d, &Value::from("7"), None).unwrap(),
            Value::List(vec![Value::Int(7)])
        );
        let err = coercer
            .coerce(&d, &Value::List(vec![Value::from("1"), Value::from("x")]), None)
            .unwrap_err();
        assert_eq!(err.path_string(), "[1]");
        assert_eq!(err.target, "Integer");
    }

    #[test]
    fn mapping_coerces_values_and_keeps_keys() {
        let coercer = Coercer::new();
        let d = TypeDescriptor::mapping_of(prim(PrimitiveKind::Boolean));
        let raw = Value::from(BTreeMap::from([("a".to_string(), "yes"), ("b".to_string(), "off")]));
        let expected = Value::from(BTreeMap::from([
            ("a".to_string(), true),
            ("b".to_string(), false),
        ]));
        assert_eq!(coercer.coerce(&d, &raw, None).unwrap(), expected);
        assert_eq!(coercer.coerce(&d, &Value::Int(3), None).unwrap(), Value::Int(3));
    }

    #[test]
    fn union_takes_first_accepting_variant() {
        let coercer = Coercer::new();
        let d = TypeDescriptor::UnionOf(vec![prim(PrimitiveKind::Integer), prim(PrimitiveKind::Text)]);
        assert_eq!(coercer.coerce(&d, &Value::from("12"), None).unwrap(), Value::Int(12));
        assert_eq!(coercer.coerce(&d, &Value::from("twelve"), None).unwrap(), Value::from("twelve"));
    }

    #[test]
    fn union_attempts_are_strict_even_when_lenient() {
        let coercer = Coercer::new().options(CoercionOptions::lenient());
        let d = TypeDescriptor::UnionOf(vec![prim(PrimitiveKind::Float), prim(PrimitiveKind::Text)]);
        assert_eq!(coercer.coerce(&d, &Value::from("abc"), None).unwrap(), Value::from("abc"));
    }

    #[test]
    fn union_failure_names_every_variant() {
        let coercer = Coercer::new();
        let d = TypeDescriptor::UnionOf(vec![prim(PrimitiveKind::Integer), prim(PrimitiveKind::Date)]);
        let err = coercer.coerce(&d, &Value::from("nope"), None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPrimitive);
        assert_eq!(err.target, "Union[Integer, Date]");
        assert!(err.message.contains("Integer:"));
        assert!(err.message.contains("Date:"));
    }

    #[test]
    fn missing_encoder_is_a_configuration_error() {
        let registry = EncoderRegistry::empty().build();
        let coercer = Coercer::with_registry(&registry);
        let d = TypeDescriptor::UnionOf(vec![prim(PrimitiveKind::Integer), prim(PrimitiveKind::Text)]);
        let err = coercer.coerce(&d, &Value::from("x"), None).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.target, "Integer");
    }

    #[test]
    fn override_encoder_replaces_lookup() {
        let coercer = Coercer::new();
        let cents = |raw: &Value, _: &CoercionOptions| -> Result<Value, ConversionError> {
            let units = raw.as_f64().ok_or_else(|| ConversionError::invalid_primitive("no amount"))?;
            Ok(Value::Int((units * 100.0).round() as i64))
        };
        let d = TypeDescriptor::sequence_of(prim(PrimitiveKind::Integer));
        let raw = Value::List(vec![Value::Float(1.25), Value::Int(2)]);
        assert_eq!(
            coercer.coerce(&d, &raw, Some(&cents)).unwrap(),
            Value::List(vec![Value::Int(125), Value::Int(200)])
        );
    }

    #[test]
    fn any_passes_through() {
        let raw = Value::List(vec![Value::from("x"), Value::Null]);
        assert_eq!(Coercer::new().coerce(&TypeDescriptor::Any, &raw, None).unwrap(), raw);
    }
}
