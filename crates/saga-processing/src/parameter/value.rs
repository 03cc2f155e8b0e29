//! Caller-supplied and validated parameter values.

use std::collections::BTreeMap;
use std::fmt;

use super::ParameterDescriptor;

/// A value supplied by a caller for one parameter key.
///
/// Text values are coerced during validation, so `"12"` is accepted for an
/// integer parameter and `"yes"` for a boolean one.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Free text, a path, or a value still to be coerced.
    Text(String),
    /// A whole number.
    Integer(i64),
    /// A floating-point number.
    Float(f64),
    /// A flag.
    Boolean(bool),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Caller-supplied values keyed by parameter key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterValues {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterValues {
    /// Creates an empty value set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a value set holding every declared default.
    #[must_use]
    pub fn with_defaults(parameters: &[ParameterDescriptor]) -> Self {
        let mut values = Self::new();
        values.fill_defaults(parameters);
        values
    }

    /// Adds declared defaults for keys the caller left unset.
    pub fn fill_defaults(&mut self, parameters: &[ParameterDescriptor]) {
        for parameter in parameters {
            if self.values.contains_key(parameter.key()) {
                continue;
            }
            if let Some(default) = parameter.default_value() {
                self.values.insert(parameter.key().to_owned(), default);
            }
        }
    }

    /// Sets a value, replacing any previous one for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value supplied for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.values.get(key)
    }

    /// Iterates over the supplied keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the number of supplied values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when nothing was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterValues
where
    K: Into<String>,
    V: Into<ParameterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

/// A value that passed validation, normalised for its parameter type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    /// Integer numeric value.
    Integer(i64),
    /// Floating-point numeric value.
    Float(f64),
    /// Flag value.
    Boolean(bool),
    /// Selected choice option.
    Choice {
        /// Ordinal index in the declared option list.
        index: usize,
        /// Token passed to the tool.
        token: String,
    },
    /// Free text.
    Text(String),
    /// File, folder, or layer path.
    Path(String),
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Choice { token, .. } => f.write_str(token),
            Self::Text(text) | Self::Path(text) => f.write_str(text),
        }
    }
}

/// Validated values keyed by parameter key.
///
/// Optional parameters the caller left unset are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedValues {
    values: BTreeMap<String, ResolvedValue>,
}

impl ResolvedValues {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: ResolvedValue) {
        self.values.insert(key.into(), value);
    }

    /// Returns the resolved value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.values.get(key)
    }

    /// Iterates over key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of resolved values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no value was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
