//! Renders validated values into tool invocation strings.
//!
//! The builder is a pure transform: it never touches the filesystem or
//! spawns anything, so every rendering rule is unit-testable without the
//! external tool.

use std::path::{Path, PathBuf};

use crate::descriptor::{AlgorithmDescriptor, CommandTemplate, TemplatePart};
use crate::error::ProcessingError;
use crate::parameter::{ParameterDescriptor, ParameterKind, ResolvedValue, ResolvedValues};

/// Turns an [`AlgorithmDescriptor`] plus [`ResolvedValues`] into the
/// argument strings passed to `saga_cmd`, one per command template.
///
/// # Example
///
/// ```
/// use saga_processing::command::CommandBuilder;
/// use saga_processing::descriptor::parse;
/// use saga_processing::parameter::{ParameterValues, validate_all};
///
/// let descriptor = parse(
///     "Fill.txt",
///     "Fill Sinks|2\nta_preprocessor\nQgsProcessingParameterRasterLayer|DEM|DEM\n",
/// )?;
/// let values = ParameterValues::new().with("DEM", "/data/dem.sdat");
/// let resolved = validate_all(descriptor.parameters(), &values)?;
/// let commands = CommandBuilder::default().build(&descriptor, &resolved)?;
/// assert_eq!(commands, ["ta_preprocessor \"2\" -DEM \"/data/dem.sdat\""]);
/// # Ok::<(), saga_processing::ProcessingError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandBuilder {
    scratch_base: PathBuf,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("saga_scratch"))
    }
}

impl CommandBuilder {
    /// Creates a builder whose scratch parts extend `scratch_base`.
    #[must_use]
    pub fn new(scratch_base: impl Into<PathBuf>) -> Self {
        Self {
            scratch_base: scratch_base.into(),
        }
    }

    /// Returns the path prefix used for scratch parts.
    #[must_use]
    pub fn scratch_base(&self) -> &Path {
        &self.scratch_base
    }

    /// Renders every command template of `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::UnresolvedPlaceholder`] when a template
    /// names an undeclared parameter or a required parameter has no value.
    /// Neither happens for descriptors that passed validation.
    pub fn build(
        &self,
        descriptor: &AlgorithmDescriptor,
        values: &ResolvedValues,
    ) -> Result<Vec<String>, ProcessingError> {
        descriptor
            .commands()
            .iter()
            .map(|template| self.render(descriptor, template, values))
            .collect()
    }

    fn render(
        &self,
        descriptor: &AlgorithmDescriptor,
        template: &CommandTemplate,
        values: &ResolvedValues,
    ) -> Result<String, ProcessingError> {
        let mut rendered: Vec<String> = Vec::with_capacity(template.parts().len());
        for part in template.parts() {
            let fragment = match part {
                TemplatePart::Literal(text) => Some(text.clone()),
                TemplatePart::Placeholder { flag, key } => {
                    let unresolved = || ProcessingError::UnresolvedPlaceholder {
                        algorithm: descriptor.name().to_owned(),
                        key: key.clone(),
                    };
                    let parameter = descriptor.parameter(key).ok_or_else(unresolved)?;
                    match values.get(key) {
                        Some(value) => render_placeholder(flag, parameter, value),
                        None if parameter.is_optional() => None,
                        None => return Err(unresolved()),
                    }
                }
                TemplatePart::Scratch { flag, suffix } => Some(format!(
                    "-{flag} \"{}{suffix}\"",
                    self.scratch_base.display()
                )),
            };
            if let Some(text) = fragment.filter(|text| !text.is_empty()) {
                rendered.push(text);
            }
        }
        Ok(rendered.join(" "))
    }
}

/// Renders `-FLAG value`, or `None` when a false flag has nothing to say.
fn render_placeholder(
    flag: &str,
    parameter: &ParameterDescriptor,
    value: &ResolvedValue,
) -> Option<String> {
    if let ResolvedValue::Boolean(enabled) = value {
        if *enabled {
            return Some(format!("-{flag}"));
        }
        return match parameter.kind() {
            ParameterKind::Boolean {
                false_token: Some(token),
                ..
            } => Some(format!("-{flag} {token}")),
            _ => None,
        };
    }
    Some(format!("-{flag} {}", format_value(value)))
}

/// Formats a resolved value the way the tool expects it on the command line.
#[must_use]
pub fn format_value(value: &ResolvedValue) -> String {
    match value {
        ResolvedValue::Integer(number) => number.to_string(),
        ResolvedValue::Float(number) => number.to_string(),
        ResolvedValue::Boolean(flag) => flag.to_string(),
        ResolvedValue::Choice { token, .. } => token.clone(),
        ResolvedValue::Text(text) | ResolvedValue::Path(text) => format!("\"{text}\""),
    }
}

#[cfg(test)]
mod tests;
