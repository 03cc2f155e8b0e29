//! Validation of caller-supplied values against parameter declarations.

use std::path::Path;

use tracing::warn;

use super::{
    ChoiceOption, NumericType, ParameterDescriptor, ParameterKind, ParameterValue,
    ParameterValues, ResolvedValue, ResolvedValues, integral,
};
use crate::error::ValidationError;

const VALIDATION_TARGET: &str = "saga_processing::parameter";

/// Validates one value against its declaration.
///
/// Returns `Ok(None)` when an optional parameter has no value. Blank text
/// counts as no value, so `KEY=` on a command line leaves a parameter unset.
///
/// # Errors
///
/// Returns [`ValidationError`] when a required value is missing, a number is
/// out of bounds, a choice matches no option, or a value has the wrong shape.
///
/// # Example
///
/// ```
/// use saga_processing::parameter::{
///     NumericType, ParameterDescriptor, ParameterKind, ParameterValue, ResolvedValue, validate,
/// };
///
/// let parameter = ParameterDescriptor::new(
///     "R_PERCTL_MIN",
///     "Percentiles Range for RED max",
///     ParameterKind::Numeric {
///         data_type: NumericType::Integer,
///         default: Some(1.0),
///         minimum: Some(1.0),
///         maximum: Some(99.0),
///     },
/// );
/// let value = ParameterValue::Text("42".into());
/// assert_eq!(validate(&parameter, Some(&value)), Ok(Some(ResolvedValue::Integer(42))));
/// assert!(validate(&parameter, Some(&ParameterValue::Integer(120))).is_err());
/// ```
pub fn validate(
    parameter: &ParameterDescriptor,
    value: Option<&ParameterValue>,
) -> Result<Option<ResolvedValue>, ValidationError> {
    let Some(supplied) = value.filter(|candidate| !is_blank(candidate)) else {
        if parameter.is_optional() {
            return Ok(None);
        }
        return Err(ValidationError::Missing {
            key: parameter.key().to_owned(),
        });
    };

    let key = parameter.key();
    let resolved = match parameter.kind() {
        ParameterKind::Numeric {
            data_type,
            minimum,
            maximum,
            ..
        } => resolve_numeric(key, *data_type, *minimum, *maximum, supplied)?,
        ParameterKind::Choice { options, .. } => resolve_choice(key, options, supplied)?,
        ParameterKind::Boolean { .. } => ResolvedValue::Boolean(resolve_boolean(key, supplied)?),
        ParameterKind::StringValue { .. } => ResolvedValue::Text(supplied.to_string()),
        ParameterKind::FileOrLayer { .. } => ResolvedValue::Path(resolve_path(key, supplied)?),
        ParameterKind::ImageOutput {
            extensions,
            default_extension,
        } => {
            let path = resolve_path(key, supplied)?;
            ResolvedValue::Path(resolve_image_path(key, path, extensions, default_extension)?)
        }
    };
    Ok(Some(resolved))
}

/// Validates every declared parameter in declaration order.
///
/// Keys supplied by the caller that no parameter declares are ignored with a
/// warning. The first failure aborts validation.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate_all(
    parameters: &[ParameterDescriptor],
    values: &ParameterValues,
) -> Result<ResolvedValues, ValidationError> {
    for key in values.keys() {
        if !parameters.iter().any(|parameter| parameter.key() == key) {
            warn!(
                target: VALIDATION_TARGET,
                key,
                "ignoring value for undeclared parameter"
            );
        }
    }

    let mut resolved = ResolvedValues::new();
    for parameter in parameters {
        if let Some(value) = validate(parameter, values.get(parameter.key()))? {
            resolved.insert(parameter.key(), value);
        }
    }
    Ok(resolved)
}

fn is_blank(value: &ParameterValue) -> bool {
    matches!(value, ParameterValue::Text(text) if text.trim().is_empty())
}

fn invalid(key: &str, value: &ParameterValue, expected: &str) -> ValidationError {
    ValidationError::InvalidValue {
        key: key.to_owned(),
        value: value.to_string(),
        expected: expected.to_owned(),
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "bounds are compared in floating point like the declared limits"
)]
fn resolve_numeric(
    key: &str,
    data_type: NumericType,
    minimum: Option<f64>,
    maximum: Option<f64>,
    value: &ParameterValue,
) -> Result<ResolvedValue, ValidationError> {
    let (resolved, as_float) = match data_type {
        NumericType::Integer => {
            let number = integer_of(value).ok_or_else(|| invalid(key, value, "an integer"))?;
            (ResolvedValue::Integer(number), number as f64)
        }
        NumericType::Float => {
            let number = float_of(value).ok_or_else(|| invalid(key, value, "a number"))?;
            (ResolvedValue::Float(number), number)
        }
    };

    let below = minimum.is_some_and(|lower| as_float < lower);
    let above = maximum.is_some_and(|upper| as_float > upper);
    if below || above {
        return Err(ValidationError::OutOfRange {
            key: key.to_owned(),
            value: as_float,
            minimum,
            maximum,
        });
    }
    Ok(resolved)
}

fn integer_of(value: &ParameterValue) -> Option<i64> {
    match value {
        ParameterValue::Integer(number) => Some(*number),
        ParameterValue::Float(number) => integral(*number),
        ParameterValue::Text(text) => {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral))
        }
        ParameterValue::Boolean(_) => None,
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "integers supplied for float parameters are widened deliberately"
)]
fn float_of(value: &ParameterValue) -> Option<f64> {
    let number = match value {
        ParameterValue::Integer(number) => *number as f64,
        ParameterValue::Float(number) => *number,
        ParameterValue::Text(text) => text.trim().parse::<f64>().ok()?,
        ParameterValue::Boolean(_) => return None,
    };
    number.is_finite().then_some(number)
}

fn resolve_choice(
    key: &str,
    options: &[ChoiceOption],
    value: &ParameterValue,
) -> Result<ResolvedValue, ValidationError> {
    let index = match value {
        ParameterValue::Integer(_) | ParameterValue::Float(_) => {
            integer_of(value).and_then(|number| usize::try_from(number).ok())
        }
        // Text names an option by token, then by label; numeric text that
        // matches neither is read as an ordinal index.
        ParameterValue::Text(text) => {
            let trimmed = text.trim();
            options
                .iter()
                .position(|option| option.token() == trimmed)
                .or_else(|| options.iter().position(|option| option.label() == trimmed))
                .or_else(|| trimmed.parse::<usize>().ok())
        }
        ParameterValue::Boolean(_) => None,
    };

    index
        .and_then(|position| {
            options.get(position).map(|option| ResolvedValue::Choice {
                index: position,
                token: option.token().to_owned(),
            })
        })
        .ok_or_else(|| ValidationError::InvalidChoice {
            key: key.to_owned(),
            value: value.to_string(),
            count: options.len(),
        })
}

fn resolve_boolean(key: &str, value: &ParameterValue) -> Result<bool, ValidationError> {
    match value {
        ParameterValue::Boolean(flag) => Ok(*flag),
        ParameterValue::Integer(0) => Ok(false),
        ParameterValue::Integer(1) => Ok(true),
        ParameterValue::Text(text) => parse_flag(text).ok_or_else(|| invalid(key, value, "a boolean")),
        ParameterValue::Integer(_) | ParameterValue::Float(_) => {
            Err(invalid(key, value, "a boolean"))
        }
    }
}

/// Parses `true/false/yes/no/1/0` in any case.
pub(crate) fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn resolve_path(key: &str, value: &ParameterValue) -> Result<String, ValidationError> {
    match value {
        ParameterValue::Text(text) if !text.trim().is_empty() => Ok(text.trim().to_owned()),
        _ => Err(invalid(key, value, "a path")),
    }
}

fn resolve_image_path(
    key: &str,
    path: String,
    extensions: &[String],
    default_extension: &str,
) -> Result<String, ValidationError> {
    let Some(extension) = Path::new(&path).extension().and_then(|ext| ext.to_str()) else {
        return Ok(format!("{path}.{default_extension}"));
    };
    if extensions
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(extension))
    {
        return Ok(path);
    }
    Err(ValidationError::InvalidValue {
        key: key.to_owned(),
        value: path,
        expected: format!("a file with extension {}", extensions.join(" or ")),
    })
}
