use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use datacast_api::declare::{Declare, DeclaredType, FieldDecl, RecordDecl, TypeKey};
use datacast_api::descriptor::{
    CompositeSpec, DeferredComposite, FieldSpec, PrimitiveKind, TypeDescriptor,
};

/// Records whose fields are being resolved on the current call stack.
type Pending = HashMap<TypeKey, DeferredComposite>;

/// Turns declared types into [`TypeDescriptor`]s, memoized per type identity.
///
/// Resolution is infallible: anything unclassifiable becomes
/// `Primitive(Object)` or `Any`. The memo is shared across threads and
/// every key is inserted at most once.
#[derive(Debug, Default)]
pub struct Resolver {
    cache: DashMap<TypeKey, Arc<TypeDescriptor>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor for the Rust type `T`.
    pub fn resolve<T: Declare>(&self) -> Arc<TypeDescriptor> {
        let key = TypeKey::of::<T>();
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit.value());
        }
        // Computed outside the entry lock: resolving `T` may recurse into
        // other keys of the same shard.
        let descriptor = match T::declare() {
            DeclaredType::Record(record) => {
                return self.resolve_record(&record, &mut Pending::new());
            }
            declared => Arc::new(self.resolve_in(&declared, &mut Pending::new())),
        };
        let stored = Arc::clone(self.cache.entry(key).or_insert(descriptor).value());
        tracing::debug!(type_name = std::any::type_name::<T>(), descriptor = %stored, "resolved type");
        stored
    }

    /// Descriptor for an arbitrary declaration.
    pub fn resolve_declared(&self, declared: &DeclaredType) -> TypeDescriptor {
        self.resolve_in(declared, &mut Pending::new())
    }

    /// Number of memoized declarations.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn resolve_in(&self, declared: &DeclaredType, pending: &mut Pending) -> TypeDescriptor {
        match declared {
            DeclaredType::Any => TypeDescriptor::Any,
            DeclaredType::None => {
                tracing::debug!("bare absence type declared, resolving to Any");
                TypeDescriptor::Any
            }
            DeclaredType::Optional(inner) => {
                TypeDescriptor::optional(self.resolve_in(inner, pending))
            }
            DeclaredType::Union(variants) => self.resolve_union(variants, pending),
            DeclaredType::List(element) => {
                TypeDescriptor::sequence_of(self.resolve_in(element, pending))
            }
            DeclaredType::Map(_, value) => {
                TypeDescriptor::mapping_of(self.resolve_in(value, pending))
            }
            DeclaredType::Record(record) => {
                let resolved = self.resolve_record(record, pending);
                TypeDescriptor::clone(&resolved)
            }
            DeclaredType::Class(name) => TypeDescriptor::Primitive(classify(name)),
        }
    }

    /// Absence variants make the result optional; nested unions are flattened.
    fn resolve_union(&self, variants: &[DeclaredType], pending: &mut Pending) -> TypeDescriptor {
        let mut nullable = false;
        let mut members = Vec::new();
        for variant in variants {
            if let DeclaredType::None = variant {
                nullable = true;
                continue;
            }
            let resolved = match self.resolve_in(variant, pending) {
                TypeDescriptor::Optional(inner) => {
                    nullable = true;
                    *inner
                }
                other => other,
            };
            match resolved {
                TypeDescriptor::UnionOf(nested) => members.extend(nested),
                other => members.push(other),
            }
        }

        let resolved = match members.len() {
            0 => return TypeDescriptor::Any,
            1 => members.remove(0),
            _ => TypeDescriptor::UnionOf(members),
        };
        if nullable {
            TypeDescriptor::optional(resolved)
        } else {
            resolved
        }
    }

    fn resolve_record(&self, record: &RecordDecl, pending: &mut Pending) -> Arc<TypeDescriptor> {
        let key = record.key().clone();
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit.value());
        }
        if let Some(deferred) = pending.get(&key) {
            tracing::debug!(record = record.name(), "self-reference, deferring composite");
            return Arc::new(TypeDescriptor::Deferred(deferred.clone()));
        }

        let deferred = DeferredComposite::new(record.name());
        pending.insert(key.clone(), deferred.clone());
        let fields = record
            .fields()
            .into_iter()
            .map(|field| self.resolve_field(field, pending))
            .collect();
        pending.remove(&key);

        let spec = Arc::new(CompositeSpec::new(record.name(), fields));
        deferred.bind(&spec);
        let descriptor = Arc::new(TypeDescriptor::Composite(spec));
        let stored = Arc::clone(self.cache.entry(key).or_insert(descriptor).value());
        tracing::debug!(record = record.name(), fields = record_len(&stored), "resolved record");
        stored
    }

    fn resolve_field(&self, field: FieldDecl, pending: &mut Pending) -> FieldSpec {
        FieldSpec {
            descriptor: self.resolve_in(&field.ty, pending),
            name: field.name,
            alias: field.alias,
            default: field.default,
            encoder: field.encoder,
        }
    }
}

fn record_len(descriptor: &TypeDescriptor) -> usize {
    match descriptor {
        TypeDescriptor::Composite(spec) => spec.fields().len(),
        _ => 0,
    }
}

/// Primitive kind for a bare class name; unknown names become `Object`.
fn classify(name: &str) -> PrimitiveKind {
    match name.to_ascii_lowercase().as_str() {
        "uuid" => PrimitiveKind::Identifier,
        "date" | "naivedate" => PrimitiveKind::Date,
        "datetime" | "naivedatetime" => PrimitiveKind::DateTime,
        "time" | "naivetime" => PrimitiveKind::Time,
        "timedelta" | "duration" => PrimitiveKind::Duration,
        "int" | "integer" | "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32"
        | "u64" | "usize" => PrimitiveKind::Integer,
        "float" | "f32" | "f64" | "double" => PrimitiveKind::Float,
        "decimal" => PrimitiveKind::Decimal,
        "bool" | "boolean" => PrimitiveKind::Boolean,
        "str" | "string" | "text" => PrimitiveKind::Text,
        "bytes" | "bytearray" | "blob" => PrimitiveKind::Bytes,
        "dict" | "list" | "tuple" | "object" | "json" | "value" => PrimitiveKind::Object,
        _ => {
            tracing::debug!(class = name, "unknown class, resolving to Object");
            PrimitiveKind::Object
        }
    }
}
