use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::descriptor::DefaultProvider;
use crate::encoder::Encoder;
use crate::value::Value;

/// Declared field type, as exposed by the record declaration layer.
///
/// This is the reflection surface the resolver classifies into a
/// [`TypeDescriptor`](crate::descriptor::TypeDescriptor). Type names and
/// wrappers are arbitrary: the resolver decides what they mean.
///
/// Examples:
/// - `Class("int")`
/// - `Optional(Class("datetime"))`
/// - `Union([Class("int"), Class("str"), None])`
/// - `Map(Class("str"), List(Class("float")))`
#[derive(Clone)]
pub enum DeclaredType {
    /// No constraint at all.
    Any,
    /// The absence type, only meaningful inside `Union`.
    None,
    /// A bare class, looked up by name.
    Class(String),
    Optional(Box<DeclaredType>),
    Union(Vec<DeclaredType>),
    List(Box<DeclaredType>),
    /// Key and value types. Keys are never coerced.
    Map(Box<DeclaredType>, Box<DeclaredType>),
    Record(RecordDecl),
}

impl DeclaredType {
    pub fn class(name: impl Into<String>) -> Self {
        DeclaredType::Class(name.into())
    }

    pub fn optional(inner: DeclaredType) -> Self {
        DeclaredType::Optional(Box::new(inner))
    }

    pub fn list(element: DeclaredType) -> Self {
        DeclaredType::List(Box::new(element))
    }

    pub fn map(key: DeclaredType, value: DeclaredType) -> Self {
        DeclaredType::Map(Box::new(key), Box::new(value))
    }

    /// Declaration of a Rust type.
    pub fn of<T: Declare>() -> Self {
        T::declare()
    }
}

impl fmt::Debug for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::Any => write!(f, "Any"),
            DeclaredType::None => write!(f, "None"),
            DeclaredType::Class(name) => write!(f, "{name}"),
            DeclaredType::Optional(inner) => write!(f, "Optional[{inner:?}]"),
            DeclaredType::Union(variants) => f.debug_list().entries(variants).finish(),
            DeclaredType::List(element) => write!(f, "List[{element:?}]"),
            DeclaredType::Map(key, value) => write!(f, "Map[{key:?}, {value:?}]"),
            DeclaredType::Record(record) => write!(f, "{}", record.name()),
        }
    }
}

/// Identity used to memoize resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// A Rust type.
    Type(TypeId),
    /// A record declared at runtime, identified by name.
    Named(String),
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        TypeKey::Type(TypeId::of::<T>())
    }
}

/// A record-like declaration with named, ordered fields.
///
/// Fields are produced lazily so that a record may refer to itself.
#[derive(Clone)]
pub struct RecordDecl {
    name: String,
    key: TypeKey,
    fields: Arc<dyn Fn() -> Vec<FieldDecl> + Send + Sync>,
}

impl RecordDecl {
    /// Declaration of the Rust type `T`.
    pub fn of<T: 'static>(name: impl Into<String>, fields: fn() -> Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            key: TypeKey::of::<T>(),
            fields: Arc::new(fields),
        }
    }

    /// Runtime declaration identified by its name.
    pub fn named(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        let name = name.into();
        Self {
            key: TypeKey::Named(name.clone()),
            name,
            fields: Arc::new(move || fields.clone()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn fields(&self) -> Vec<FieldDecl> {
        (self.fields)()
    }
}

/// One declared record field.
#[derive(Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: DeclaredType,
    pub alias: Option<String>,
    pub default: Option<DefaultProvider>,
    pub encoder: Option<Arc<dyn Encoder>>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: DeclaredType) -> Self {
        Self {
            name: name.into(),
            ty,
            alias: None,
            default: None,
            encoder: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn default_with<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(provider));
        self
    }

    pub fn encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }
}

/// Types that can describe their own declared shape.
///
/// Implemented for scalars, containers and by `#[derive(Model)]`.
pub trait Declare: 'static {
    fn declare() -> DeclaredType;
}

/// Opaque binary payload (declares as `bytes` rather than a list of integers).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob(pub Vec<u8>);

macro_rules! declare_class {
    ($name:literal => $($ty:ty),*) => {
        $(
            impl Declare for $ty {
                fn declare() -> DeclaredType {
                    DeclaredType::class($name)
                }
            }
        )*
    };
}

declare_class!("int" => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
declare_class!("float" => f32, f64);
declare_class!("bool" => bool);
declare_class!("str" => String);
declare_class!("uuid" => Uuid);
declare_class!("date" => NaiveDate);
declare_class!("datetime" => NaiveDateTime);
declare_class!("time" => NaiveTime);
declare_class!("timedelta" => TimeDelta);
declare_class!("decimal" => Decimal);
declare_class!("object" => serde_json::Value);
declare_class!("bytes" => Blob);

impl Declare for Value {
    fn declare() -> DeclaredType {
        DeclaredType::Any
    }
}

impl<T: Declare> Declare for Option<T> {
    fn declare() -> DeclaredType {
        DeclaredType::optional(T::declare())
    }
}

impl<T: Declare> Declare for Vec<T> {
    fn declare() -> DeclaredType {
        DeclaredType::list(T::declare())
    }
}

impl<T: Declare> Declare for Box<T> {
    fn declare() -> DeclaredType {
        T::declare()
    }
}

impl<T: Declare, S: 'static> Declare for HashMap<String, T, S> {
    fn declare() -> DeclaredType {
        DeclaredType::map(String::declare(), T::declare())
    }
}

impl<T: Declare> Declare for BTreeMap<String, T> {
    fn declare() -> DeclaredType {
        DeclaredType::map(String::declare(), T::declare())
    }
}
