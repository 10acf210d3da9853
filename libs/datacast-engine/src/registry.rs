use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use datacast_api::descriptor::{CompositeSpec, PrimitiveKind, TypeDescriptor};
use datacast_api::encoder::Encoder;
use datacast_api::error::ConversionError;

use crate::converters;
use crate::error::EngineError;

static GLOBAL: OnceCell<EncoderRegistry> = OnceCell::new();

/// Mapping from primitive kind to its converter.
///
/// Immutable once built. The process-wide instance is created on first use
/// from the built-in converters, unless a custom one was installed earlier.
pub struct EncoderRegistry {
    encoders: HashMap<PrimitiveKind, Arc<dyn Encoder>>,
    /// Converters that apply to one field name only.
    field_encoders: HashMap<(PrimitiveKind, String), Arc<dyn Encoder>>,
}

impl std::fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.encoders.keys().collect();
        kinds.sort();
        let mut fields: Vec<_> = self.field_encoders.keys().collect();
        fields.sort();
        f.debug_struct("EncoderRegistry")
            .field("kinds", &kinds)
            .field("field_encoders", &fields)
            .finish()
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        let encoders = PrimitiveKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(converters::builtin(kind)) as Arc<dyn Encoder>))
            .collect();
        Self {
            encoders,
            field_encoders: HashMap::new(),
        }
    }
}

impl EncoderRegistry {
    /// Registry with the built-in converter for every kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded with the built-in converters.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            registry: Self::default(),
        }
    }

    /// Builder with no converters at all.
    pub fn empty() -> RegistryBuilder {
        RegistryBuilder {
            registry: Self {
                encoders: HashMap::new(),
                field_encoders: HashMap::new(),
            },
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static EncoderRegistry {
        GLOBAL.get_or_init(EncoderRegistry::default)
    }

    /// Converter for `kind`; a field-scoped entry wins when `field` matches.
    pub fn lookup(&self, kind: PrimitiveKind, field: Option<&str>) -> Option<&Arc<dyn Encoder>> {
        field
            .and_then(|name| self.field_encoders.get(&(kind, name.to_string())))
            .or_else(|| self.encoders.get(&kind))
    }

    pub fn contains(&self, kind: PrimitiveKind) -> bool {
        self.encoders.contains_key(&kind)
    }

    /// Walk `descriptor` and report the first primitive kind with no converter.
    ///
    /// Deferred composites are followed to their bound spec; each composite
    /// is walked once.
    pub fn check(&self, descriptor: &TypeDescriptor) -> Result<(), ConversionError> {
        self.check_in(descriptor, &mut HashSet::new())
    }

    fn check_in(
        &self,
        descriptor: &TypeDescriptor,
        visited: &mut HashSet<*const CompositeSpec>,
    ) -> Result<(), ConversionError> {
        match descriptor {
            TypeDescriptor::Primitive(kind) => {
                if self.contains(*kind) {
                    Ok(())
                } else {
                    Err(ConversionError::missing_encoder(format!(
                        "no converter registered for {kind}"
                    )))
                }
            }
            TypeDescriptor::Optional(inner)
            | TypeDescriptor::SequenceOf(inner)
            | TypeDescriptor::MappingOf(inner) => self.check_in(inner, visited),
            TypeDescriptor::UnionOf(variants) => {
                variants.iter().try_for_each(|v| self.check_in(v, visited))
            }
            TypeDescriptor::Composite(spec) => self.check_composite(spec, visited),
            TypeDescriptor::Deferred(deferred) => match deferred.get() {
                Some(spec) => self.check_composite(spec, visited),
                None => Ok(()),
            },
            TypeDescriptor::Any => Ok(()),
        }
    }

    fn check_composite(
        &self,
        spec: &Arc<CompositeSpec>,
        visited: &mut HashSet<*const CompositeSpec>,
    ) -> Result<(), ConversionError> {
        if !visited.insert(Arc::as_ptr(spec)) {
            return Ok(());
        }
        spec.fields().iter().try_for_each(|field| {
            if field.encoder.is_some() {
                return Ok(());
            }
            self.check_in(&field.descriptor, visited)
                .map_err(|e| e.with_field(field.name.as_str()).in_composite(spec.name()))
        })
    }
}

/// Assembles an [`EncoderRegistry`] before it is used.
pub struct RegistryBuilder {
    registry: EncoderRegistry,
}

impl RegistryBuilder {
    /// Register (or replace) the converter for `kind`.
    pub fn register(mut self, kind: PrimitiveKind, encoder: impl Encoder + 'static) -> Self {
        self.registry.encoders.insert(kind, Arc::new(encoder));
        self
    }

    /// Register a converter used for `kind` only when coercing field `field`.
    pub fn register_for_field(
        mut self,
        kind: PrimitiveKind,
        field: impl Into<String>,
        encoder: impl Encoder + 'static,
    ) -> Self {
        self.registry
            .field_encoders
            .insert((kind, field.into()), Arc::new(encoder));
        self
    }

    pub fn build(self) -> EncoderRegistry {
        self.registry
    }

    /// Publish as the process-wide registry.
    ///
    /// Fails once the global registry has been read or installed.
    pub fn install(self) -> Result<&'static EncoderRegistry, EngineError> {
        let registry = self.registry;
        let kinds = registry.encoders.len();
        let field_scoped = registry.field_encoders.len();
        GLOBAL.set(registry).map_err(|_| {
            EngineError::Registry("encoder registry is already in use".to_string())
        })?;
        tracing::info!(kinds, field_scoped, "installed custom encoder registry");
        Ok(EncoderRegistry::global())
    }
}
