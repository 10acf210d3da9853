use crate::config::CoercionOptions;
use crate::error::ConversionError;
use crate::value::Value;

/// Primitive value converter.
///
/// Solves one task: turn a raw value into the shape of one primitive kind.
/// Registered per kind in the engine's encoder registry, or attached to a
/// single field as an override.
///
/// Errors returned here are annotated by the engine with the target
/// descriptor and the original raw value, so implementations only need to
/// describe what went wrong.
pub trait Encoder: Send + Sync {
    fn encode(&self, raw: &Value, options: &CoercionOptions) -> Result<Value, ConversionError>;
}

impl<F> Encoder for F
where
    F: Fn(&Value, &CoercionOptions) -> Result<Value, ConversionError> + Send + Sync,
{
    fn encode(&self, raw: &Value, options: &CoercionOptions) -> Result<Value, ConversionError> {
        self(raw, options)
    }
}
