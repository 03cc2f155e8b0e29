//! Typed parameter model shared by the descriptor parser and command builder.
//!
//! A [`ParameterDescriptor`] pairs a stable key and a human-readable label
//! with a [`ParameterKind`] that carries exactly the fields its type needs.
//! The parser produces descriptors from parameter lines, validation checks
//! caller-supplied values against them, and the command builder renders the
//! normalised values.

mod validation;
mod value;

pub(crate) use self::validation::parse_flag;
pub use self::validation::{validate, validate_all};
pub use self::value::{ParameterValue, ParameterValues, ResolvedValue, ResolvedValues};

/// Default raster extension for [`ParameterKind::ImageOutput`].
pub const IMAGE_OUTPUT_EXTENSION: &str = "tif";

/// Numeric sub-type of a [`ParameterKind::Numeric`] parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NumericType {
    /// Whole numbers; rendered without a fractional part.
    #[default]
    Integer,
    /// Floating-point numbers.
    Float,
}

impl NumericType {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
        }
    }
}

/// Whether a file or layer parameter is read or produced by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The tool reads the referenced data.
    Input,
    /// The tool writes the referenced data.
    Output,
}

/// One selectable option of a [`ParameterKind::Choice`] parameter.
///
/// The token is what the tool receives on its command line; the label is
/// what a user sees. Description files write options either as
/// `[token] label` or as a bare label, in which case the ordinal index is
/// the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    token: String,
    label: String,
}

impl ChoiceOption {
    /// Creates an option with an explicit token.
    #[must_use]
    pub fn new(token: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            label: label.into(),
        }
    }

    /// Parses an option as written in a description file.
    ///
    /// # Example
    ///
    /// ```
    /// use saga_processing::parameter::ChoiceOption;
    ///
    /// let option = ChoiceOption::parse(2, "[1] Bilinear");
    /// assert_eq!(option.token(), "1");
    /// assert_eq!(option.label(), "Bilinear");
    ///
    /// let bare = ChoiceOption::parse(2, "Cubic");
    /// assert_eq!(bare.token(), "2");
    /// ```
    #[must_use]
    pub fn parse(index: usize, text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(rest) = trimmed.strip_prefix('[') {
            if let Some((token, label)) = rest.split_once(']') {
                let token = token.trim();
                if !token.is_empty() {
                    return Self::new(token, label.trim());
                }
            }
        }
        Self::new(index.to_string(), trimmed)
    }

    /// Returns the token passed to the tool.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Type-specific payload of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// A number, optionally bounded on either side.
    Numeric {
        /// Integer or floating-point.
        data_type: NumericType,
        /// Declared default.
        default: Option<f64>,
        /// Inclusive lower bound.
        minimum: Option<f64>,
        /// Inclusive upper bound.
        maximum: Option<f64>,
    },
    /// One option out of an ordered list.
    Choice {
        /// Declared options in file order.
        options: Vec<ChoiceOption>,
        /// Index of the default option.
        default: Option<usize>,
    },
    /// A flag.
    Boolean {
        /// Declared default.
        default: Option<bool>,
        /// Token rendered after the flag when the value is false. Without
        /// one, a false flag is left out of the command entirely.
        false_token: Option<String>,
    },
    /// Free text.
    StringValue {
        /// Declared default.
        default: Option<String>,
    },
    /// A file, folder, or layer reference.
    FileOrLayer {
        /// Whether the tool reads or writes the reference.
        role: Role,
        /// Declared default.
        default: Option<String>,
    },
    /// A raster image written by the tool.
    ImageOutput {
        /// Extensions the output may carry.
        extensions: Vec<String>,
        /// Extension appended when the caller supplies none.
        default_extension: String,
    },
}

impl ParameterKind {
    /// Returns the image output shorthand: GeoTIFF only.
    #[must_use]
    pub fn image_output() -> Self {
        Self::ImageOutput {
            extensions: vec![IMAGE_OUTPUT_EXTENSION.to_owned()],
            default_extension: IMAGE_OUTPUT_EXTENSION.to_owned(),
        }
    }

    /// Returns a short name for the variant, used in listings.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Numeric { .. } => "numeric",
            Self::Choice { .. } => "choice",
            Self::Boolean { .. } => "boolean",
            Self::StringValue { .. } => "string",
            Self::FileOrLayer {
                role: Role::Input, ..
            } => "input",
            Self::FileOrLayer {
                role: Role::Output, ..
            } => "output",
            Self::ImageOutput { .. } => "image-output",
        }
    }
}

/// Declaration of one typed parameter of an algorithm.
///
/// # Example
///
/// ```
/// use saga_processing::parameter::{NumericType, ParameterDescriptor, ParameterKind};
///
/// let parameter = ParameterDescriptor::new(
///     "NZONES",
///     "Number of Buffer Zones",
///     ParameterKind::Numeric {
///         data_type: NumericType::Integer,
///         default: Some(1.0),
///         minimum: Some(1.0),
///         maximum: None,
///     },
/// );
/// assert_eq!(parameter.key(), "NZONES");
/// assert!(!parameter.is_optional());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    key: String,
    label: String,
    optional: bool,
    kind: ParameterKind,
}

impl ParameterDescriptor {
    /// Creates a required parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            optional: false,
            kind,
        }
    }

    /// Marks the parameter optional (or required).
    #[must_use]
    pub const fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Returns the key used to match caller-supplied values.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` when the caller may leave the parameter unset.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the type-specific payload.
    #[must_use]
    pub const fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    /// Returns `true` for parameters naming data the tool writes.
    #[must_use]
    pub const fn is_output(&self) -> bool {
        matches!(
            self.kind,
            ParameterKind::FileOrLayer {
                role: Role::Output,
                ..
            } | ParameterKind::ImageOutput { .. }
        )
    }

    /// Returns the declared default as a caller-style value.
    #[must_use]
    pub fn default_value(&self) -> Option<ParameterValue> {
        match &self.kind {
            ParameterKind::Numeric {
                data_type: NumericType::Integer,
                default,
                ..
            } => default.and_then(integral).map(ParameterValue::Integer),
            ParameterKind::Numeric { default, .. } => default.map(ParameterValue::Float),
            ParameterKind::Choice { default, .. } => default
                .and_then(|index| i64::try_from(index).ok())
                .map(ParameterValue::Integer),
            ParameterKind::Boolean { default, .. } => default.map(ParameterValue::Boolean),
            ParameterKind::StringValue { default } | ParameterKind::FileOrLayer { default, .. } => {
                default.clone().map(ParameterValue::Text)
            }
            ParameterKind::ImageOutput { .. } => None,
        }
    }

    /// Checks the internal consistency of the declaration.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the key is blank, a numeric
    /// minimum exceeds its maximum, or a choice declares no options.
    pub fn check(&self) -> Result<(), String> {
        if self.key.trim().is_empty() {
            return Err(String::from("parameter key must not be empty"));
        }
        match &self.kind {
            ParameterKind::Numeric {
                minimum: Some(minimum),
                maximum: Some(maximum),
                ..
            } if minimum > maximum => Err(format!(
                "parameter '{}' declares minimum {minimum} above maximum {maximum}",
                self.key
            )),
            ParameterKind::Choice { options, .. } if options.is_empty() => Err(format!(
                "choice parameter '{}' declares no options",
                self.key
            )),
            _ => Ok(()),
        }
    }
}

/// Converts a float holding a whole number into an integer.
#[expect(
    clippy::cast_possible_truncation,
    reason = "value is integral and within the exactly representable range"
)]
pub(crate) fn integral(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    (value.is_finite() && value.fract() == 0.0 && value.abs() <= LIMIT).then(|| value as i64)
}

#[cfg(test)]
mod tests;
