use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::encoder::Encoder;
use crate::value::Value;

/// Fixed scalar categories, one converter each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Identifier,
    Date,
    DateTime,
    Time,
    Duration,
    Integer,
    Float,
    Decimal,
    Boolean,
    Object,
    Text,
    Bytes,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 12] = [
        PrimitiveKind::Identifier,
        PrimitiveKind::Date,
        PrimitiveKind::DateTime,
        PrimitiveKind::Time,
        PrimitiveKind::Duration,
        PrimitiveKind::Integer,
        PrimitiveKind::Float,
        PrimitiveKind::Decimal,
        PrimitiveKind::Boolean,
        PrimitiveKind::Object,
        PrimitiveKind::Text,
        PrimitiveKind::Bytes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Identifier => "Identifier",
            PrimitiveKind::Date => "Date",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::Time => "Time",
            PrimitiveKind::Duration => "Duration",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Object => "Object",
            PrimitiveKind::Text => "Text",
            PrimitiveKind::Bytes => "Bytes",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of a declared field, resolved once per declared type.
///
/// The engine walks this tree against a raw [`Value`]; it never looks at
/// live type information during coercion.
#[derive(Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// Absence is accepted without consulting the inner descriptor.
    Optional(Box<TypeDescriptor>),
    /// Exactly one of several shapes, tried in declared order.
    UnionOf(Vec<TypeDescriptor>),
    SequenceOf(Box<TypeDescriptor>),
    /// Mapping with text keys; only values are coerced.
    MappingOf(Box<TypeDescriptor>),
    Composite(Arc<CompositeSpec>),
    /// Back-reference to a composite still being resolved (self-referential records).
    Deferred(DeferredComposite),
    /// Unclassifiable declaration: values pass through untouched.
    Any,
}

impl TypeDescriptor {
    pub fn optional(inner: TypeDescriptor) -> Self {
        match inner {
            TypeDescriptor::Optional(_) => inner,
            other => TypeDescriptor::Optional(Box::new(other)),
        }
    }

    pub fn sequence_of(element: TypeDescriptor) -> Self {
        TypeDescriptor::SequenceOf(Box::new(element))
    }

    pub fn mapping_of(value: TypeDescriptor) -> Self {
        TypeDescriptor::MappingOf(Box::new(value))
    }

    pub fn composite(spec: CompositeSpec) -> Self {
        TypeDescriptor::Composite(Arc::new(spec))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, TypeDescriptor::Composite(_) | TypeDescriptor::Deferred(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional(_))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(kind) => write!(f, "{kind}"),
            TypeDescriptor::Optional(inner) => write!(f, "Optional[{inner}]"),
            TypeDescriptor::UnionOf(variants) => {
                write!(f, "Union[")?;
                for (i, v) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            TypeDescriptor::SequenceOf(element) => write!(f, "Sequence[{element}]"),
            TypeDescriptor::MappingOf(value) => write!(f, "Mapping[Text, {value}]"),
            TypeDescriptor::Composite(spec) => write!(f, "{}", spec.name()),
            TypeDescriptor::Deferred(deferred) => write!(f, "{}", deferred.name()),
            TypeDescriptor::Any => write!(f, "Any"),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Composite(spec) => fmt::Debug::fmt(spec, f),
            other => write!(f, "{other}"),
        }
    }
}

/// Zero-argument provider invoked when a field is absent from the raw input.
pub type DefaultProvider = Arc<dyn Fn() -> Value + Send + Sync>;

/// One field of a composite.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    /// Alternative input key, looked up before `name`.
    pub alias: Option<String>,
    pub descriptor: TypeDescriptor,
    pub default: Option<DefaultProvider>,
    pub encoder: Option<Arc<dyn Encoder>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            alias: None,
            descriptor,
            default: None,
            encoder: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_default<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(provider));
        self
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// A field is required when absence is neither tolerated by its
    /// descriptor nor covered by a default provider.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
            && !matches!(self.descriptor, TypeDescriptor::Optional(_) | TypeDescriptor::Any)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("descriptor", &self.descriptor)
            .field("default", &self.default.is_some())
            .field("encoder", &self.encoder.is_some())
            .finish()
    }
}

/// A record type with named, ordered fields.
#[derive(Debug, Clone)]
pub struct CompositeSpec {
    name: String,
    fields: Vec<FieldSpec>,
}

impl CompositeSpec {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Late-bound composite, filled once the enclosing resolution finishes.
///
/// A self-referential descriptor forms a reference cycle through this slot
/// and lives as long as the process, like the resolver cache itself.
#[derive(Clone)]
pub struct DeferredComposite {
    name: String,
    slot: Arc<OnceLock<Arc<CompositeSpec>>>,
}

impl DeferredComposite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot: Arc::new(OnceLock::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the finished composite. Later calls are ignored.
    pub fn bind(&self, spec: &Arc<CompositeSpec>) {
        let _ = self.slot.set(Arc::clone(spec));
    }

    /// `None` while unbound.
    pub fn get(&self) -> Option<&Arc<CompositeSpec>> {
        self.slot.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_never_nests() {
        let d = TypeDescriptor::optional(TypeDescriptor::optional(TypeDescriptor::Primitive(
            PrimitiveKind::Integer,
        )));
        assert_eq!(d.to_string(), "Optional[Integer]");
    }

    #[test]
    fn display_renders_nested_shapes() {
        let d = TypeDescriptor::mapping_of(TypeDescriptor::sequence_of(TypeDescriptor::UnionOf(
            vec![
                TypeDescriptor::Primitive(PrimitiveKind::Integer),
                TypeDescriptor::Primitive(PrimitiveKind::Text),
            ],
        )));
        assert_eq!(d.to_string(), "Mapping[Text, Sequence[Union[Integer, Text]]]");
    }

    #[test]
    fn deferred_binds_once() {
        let deferred = DeferredComposite::new("Node");
        assert!(deferred.get().is_none());
        let spec = Arc::new(CompositeSpec::new("Node", vec![]));
        deferred.bind(&spec);
        deferred.bind(&Arc::new(CompositeSpec::new("Other", vec![])));
        assert_eq!(deferred.get().unwrap().name(), "Node");
    }

    #[test]
    fn field_required_unless_optional_or_defaulted() {
        let int = TypeDescriptor::Primitive(PrimitiveKind::Integer);
        assert!(FieldSpec::new("a", int.clone()).is_required());
        assert!(!FieldSpec::new("a", TypeDescriptor::optional(int.clone())).is_required());
        assert!(!FieldSpec::new("a", int).with_default(|| Value::Int(0)).is_required());
    }
}
