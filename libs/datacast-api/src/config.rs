/// Per-call coercion policy.
///
/// The engine builds this from its TOML configuration, callers may also
/// construct it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionOptions {
    /// Strict: every unconvertible primitive raises.
    /// Lenient: Identifier, Float and Decimal failures yield `Null`.
    pub strict: bool,
    /// Extra `chrono` format strings tried by the flexible date/datetime stage.
    pub date_formats: Vec<String>,
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            strict: true,
            date_formats: Vec::new(),
        }
    }
}

impl CoercionOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_formats.push(format.into());
        self
    }

    /// Same options with strictness forced on (union attempts).
    pub fn as_strict(&self) -> Self {
        Self {
            strict: true,
            date_formats: self.date_formats.clone(),
        }
    }
}
