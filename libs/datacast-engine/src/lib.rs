//! Schema-directed coercion of loosely typed values.
//!
//! A declared type is resolved once into a [`TypeDescriptor`]; the
//! [`Coercer`] then walks that descriptor against raw [`Value`]s, converting
//! primitives through the [`EncoderRegistry`] and building composites as
//! [`Record`](datacast_api::value::Record)s.

mod composite;
pub mod config;
pub mod converters;
pub mod engine;
pub mod error;
pub mod registry;
pub mod resolver;

use std::sync::Arc;

use once_cell::sync::Lazy;

use datacast_api::config::CoercionOptions;
use datacast_api::declare::{Declare, DeclaredType};
use datacast_api::descriptor::{CompositeSpec, TypeDescriptor};
use datacast_api::encoder::Encoder;
use datacast_api::error::ConversionError;
use datacast_api::from_value::FromValue;
use datacast_api::value::Value;

pub use config::EngineConfig;
pub use engine::Coercer;
pub use error::EngineError;
pub use registry::{EncoderRegistry, RegistryBuilder};
pub use resolver::Resolver;

static RESOLVER: Lazy<Resolver> = Lazy::new(Resolver::new);

/// The process-wide resolver behind [`resolve`] and [`parse`].
pub fn resolver() -> &'static Resolver {
    &RESOLVER
}

/// Descriptor for the Rust type `T`, memoized for the life of the process.
pub fn resolve<T: Declare>() -> Arc<TypeDescriptor> {
    RESOLVER.resolve::<T>()
}

/// Descriptor for a declaration built at runtime.
pub fn resolve_declared(declared: &DeclaredType) -> TypeDescriptor {
    RESOLVER.resolve_declared(declared)
}

/// Coerce `raw` against `descriptor` with the global registry and strict options.
pub fn coerce(
    descriptor: &TypeDescriptor,
    raw: &Value,
    encoder: Option<&dyn Encoder>,
) -> Result<Value, ConversionError> {
    Coercer::new().coerce(descriptor, raw, encoder)
}

/// Build one instance of `spec` from `raw`.
pub fn construct(spec: &CompositeSpec, raw: &Value) -> Result<Value, ConversionError> {
    Coercer::new().construct(spec, raw)
}

/// Resolve `T`, coerce `raw` into its shape and extract it.
pub fn parse<T: Declare + FromValue>(raw: impl Into<Value>) -> Result<T, ConversionError> {
    parse_with(raw, CoercionOptions::default())
}

/// [`parse`] with explicit options.
pub fn parse_with<T: Declare + FromValue>(
    raw: impl Into<Value>,
    options: CoercionOptions,
) -> Result<T, ConversionError> {
    let descriptor = resolve::<T>();
    let value = Coercer::new().options(options).coerce(&descriptor, &raw.into(), None)?;
    T::from_value(value)
}
