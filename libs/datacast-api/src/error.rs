use std::fmt;

use crate::descriptor::TypeDescriptor;
use crate::value::Value;

/// Error kind for conversion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidPrimitive,
    InvalidDateTime,
    InvalidTimedelta,
    InvalidObject,
    /// Configuration defect: a primitive kind has no registered converter.
    MissingEncoder,
    CompositeConstruction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidPrimitive => "invalid primitive",
            ErrorKind::InvalidDateTime => "invalid datetime",
            ErrorKind::InvalidTimedelta => "invalid timedelta",
            ErrorKind::InvalidObject => "invalid object",
            ErrorKind::MissingEncoder => "missing encoder",
            ErrorKind::CompositeConstruction => "composite construction error",
        };
        f.write_str(name)
    }
}

/// One step of the location of a failure inside the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Conversion error, returned by converters, the engine and composite construction.
///
/// Carries the target descriptor, the offending raw value and the path from
/// the top-level input to the failing value.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message} (target {target}, value {value}{})", render_location(.composite, .path))]
pub struct ConversionError {
    pub kind: ErrorKind,
    /// Rendered target descriptor, empty until annotated.
    pub target: String,
    pub value: Value,
    pub message: String,
    /// Innermost composite whose construction failed.
    pub composite: Option<String>,
    pub path: Vec<PathSegment>,
}

impl ConversionError {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            target: String::new(),
            value: Value::Null,
            message: msg.into(),
            composite: None,
            path: Vec::new(),
        }
    }

    pub fn invalid_primitive(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPrimitive, msg)
    }

    pub fn invalid_datetime(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDateTime, msg)
    }

    pub fn invalid_timedelta(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidTimedelta, msg)
    }

    pub fn invalid_object(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidObject, msg)
    }

    pub fn missing_encoder(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingEncoder, msg)
    }

    pub fn composite(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::CompositeConstruction, msg)
    }

    /// Attach target and raw value, keeping any annotation already present.
    pub fn annotate(mut self, target: &TypeDescriptor, value: &Value) -> Self {
        if self.target.is_empty() {
            self.target = target.to_string();
            self.value = value.clone();
        }
        self
    }

    /// Record the composite being built, keeping the innermost one.
    pub fn in_composite(mut self, name: &str) -> Self {
        if self.composite.is_none() {
            self.composite = Some(name.to_string());
        }
        self
    }

    /// Prepend a field name to the path.
    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.path.insert(0, PathSegment::Field(name.into()));
        self
    }

    /// Prepend a sequence index to the path.
    pub fn with_index(mut self, index: usize) -> Self {
        self.path.insert(0, PathSegment::Index(index));
        self
    }

    /// Prepend a mapping key to the path.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.path.insert(0, PathSegment::Key(key.into()));
        self
    }

    /// Configuration defects are distinguishable from data-shape failures.
    pub fn is_configuration(&self) -> bool {
        self.kind == ErrorKind::MissingEncoder
    }

    /// Dotted rendering of the path, e.g. `accounts[1].provider`.
    pub fn path_string(&self) -> String {
        path_to_string(&self.path)
    }
}

fn path_to_string(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
            PathSegment::Key(k) => out.push_str(&format!("[{k:?}]")),
        }
    }
    out
}

fn render_location(composite: &Option<String>, path: &[PathSegment]) -> String {
    let mut out = String::new();
    if let Some(name) = composite {
        out.push_str(&format!(", in {name}"));
    }
    if !path.is_empty() {
        out.push_str(&format!(", at {}", path_to_string(path)));
    }
    out
}
