//! Algorithm descriptors and the description-unit parser.
//!
//! A description unit is a small text file:
//!
//! ```text
//! Shapes Buffer|0
//! shapes_tools
//! QgsProcessingParameterFeatureSource|SHAPES|Shapes|-1|None|False
//! QgsProcessingParameterNumber|DIST|Buffer distance|QgsProcessingParameterNumber.Double|100.0|False|0.0|None
//! QgsProcessingParameterVectorDestination|BUFFER|Buffer
//! ```
//!
//! The first line names the algorithm (optionally followed by the tool's
//! command id), the second names the tool library. Every following line is a
//! parameter declaration, a directive, or a literal command fragment.

mod line;

use std::collections::HashSet;

use tracing::debug;

use crate::error::DescriptorError;
use crate::parameter::ParameterDescriptor;

pub use self::line::{create_parameter_from_line, is_parameter_line};

const DESCRIPTOR_TARGET: &str = "saga_processing::descriptor";

const HARDCODED_DIRECTIVE: &str = "Hardcoded|";
const ALLOW_UNMATCHING_DIRECTIVE: &str = "AllowUnmatching";

/// One fragment of a [`CommandTemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    /// Text emitted verbatim.
    Literal(String),
    /// `-<flag> <value>` for the parameter named by `key`.
    Placeholder {
        /// Flag text, without the leading dash.
        flag: String,
        /// Key of the parameter supplying the value.
        key: String,
    },
    /// `-<flag> "<scratch base><suffix>"` naming an intermediate file.
    Scratch {
        /// Flag text, without the leading dash.
        flag: String,
        /// Text appended to the scratch base path.
        suffix: String,
    },
}

impl TemplatePart {
    /// Shorthand for [`TemplatePart::Literal`].
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Shorthand for a placeholder whose flag equals its key.
    #[must_use]
    pub fn parameter(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::Placeholder {
            flag: key.clone(),
            key,
        }
    }

    /// Shorthand for [`TemplatePart::Placeholder`].
    #[must_use]
    pub fn placeholder(flag: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Placeholder {
            flag: flag.into(),
            key: key.into(),
        }
    }

    /// Shorthand for [`TemplatePart::Scratch`].
    #[must_use]
    pub fn scratch(flag: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::Scratch {
            flag: flag.into(),
            suffix: suffix.into(),
        }
    }
}

/// Ordered fragments rendering to a single tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandTemplate {
    parts: Vec<TemplatePart>,
}

impl CommandTemplate {
    /// Creates a template from its parts.
    #[must_use]
    pub const fn new(parts: Vec<TemplatePart>) -> Self {
        Self { parts }
    }

    /// Returns the parts in order.
    #[must_use]
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Iterates over the parameter keys referenced by placeholders.
    pub fn placeholder_keys(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            TemplatePart::Placeholder { key, .. } => Some(key.as_str()),
            TemplatePart::Literal(_) | TemplatePart::Scratch { .. } => None,
        })
    }

    fn push(&mut self, part: TemplatePart) {
        self.parts.push(part);
    }
}

/// Immutable description of one invokable algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmDescriptor {
    name: String,
    display_name: String,
    group: String,
    group_id: String,
    parameters: Vec<ParameterDescriptor>,
    commands: Vec<CommandTemplate>,
    allows_unmatching_extents: bool,
}

impl AlgorithmDescriptor {
    /// Assembles a descriptor in code.
    ///
    /// The internal name is derived from the display name.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Inconsistent`] when a parameter declaration
    /// is invalid, a key is declared twice, there are no commands, or a
    /// placeholder names an undeclared key.
    pub fn new(
        display_name: impl Into<String>,
        group: impl Into<String>,
        group_id: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
        commands: Vec<CommandTemplate>,
    ) -> Result<Self, DescriptorError> {
        let display_name = display_name.into();
        let inconsistent = |message: String| DescriptorError::Inconsistent {
            algorithm: display_name.clone(),
            message,
        };

        let mut seen = HashSet::new();
        for parameter in &parameters {
            parameter.check().map_err(inconsistent)?;
            if !seen.insert(parameter.key()) {
                return Err(inconsistent(format!(
                    "duplicate parameter key '{}'",
                    parameter.key()
                )));
            }
        }
        if commands.is_empty() {
            return Err(inconsistent(String::from("no commands declared")));
        }
        if let Some(key) = commands
            .iter()
            .flat_map(CommandTemplate::placeholder_keys)
            .find(|key| !seen.contains(key))
        {
            return Err(inconsistent(format!(
                "placeholder references undeclared parameter '{key}'"
            )));
        }

        Ok(Self {
            name: internal_name(&display_name),
            display_name,
            group: group.into(),
            group_id: group_id.into(),
            parameters,
            commands,
            allows_unmatching_extents: false,
        })
    }

    /// Sets whether inputs may have non-matching raster extents.
    #[must_use]
    pub const fn with_unmatching_extents(mut self, allowed: bool) -> Self {
        self.allows_unmatching_extents = allowed;
        self
    }

    /// Internal name: the display name lower-cased, alphanumerics only.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Human-readable group name.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Stable group identifier.
    #[must_use]
    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Looks up a parameter by key.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|parameter| parameter.key() == key)
    }

    /// Parameters naming data the tool writes.
    pub fn outputs(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|parameter| parameter.is_output())
    }

    /// Command templates, one per tool invocation.
    #[must_use]
    pub fn commands(&self) -> &[CommandTemplate] {
        &self.commands
    }

    /// Whether the unit carried the `AllowUnmatching` directive.
    #[must_use]
    pub const fn allows_unmatching_extents(&self) -> bool {
        self.allows_unmatching_extents
    }
}

/// Derives an internal algorithm name from a display name.
///
/// ```
/// use saga_processing::descriptor::internal_name;
///
/// assert_eq!(internal_name("Shapes Buffer (Attribute distance)"), "shapesbufferattributedistance");
/// ```
#[must_use]
pub fn internal_name(display_name: &str) -> String {
    display_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Turns a library id such as `shapes_grid` into `Shapes grid`.
fn humanize(library: &str) -> String {
    let spaced = library.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Parses one description unit.
///
/// `unit` names the unit in error messages, usually its file name.
///
/// # Errors
///
/// Returns [`DescriptorError::Malformed`] naming the offending line when the
/// identity lines are missing, a parameter line does not fit its type, or a
/// key is declared twice.
///
/// # Example
///
/// ```
/// use saga_processing::descriptor::parse;
///
/// let descriptor = parse(
///     "Buffer.txt",
///     "Shapes Buffer|0\nshapes_tools\nSagaImageOutput|RGB|Output RGB\n",
/// )?;
/// assert_eq!(descriptor.name(), "shapesbuffer");
/// assert_eq!(descriptor.group(), "Shapes tools");
/// assert_eq!(descriptor.parameters().len(), 1);
/// # Ok::<(), saga_processing::DescriptorError>(())
/// ```
pub fn parse(unit: &str, text: &str) -> Result<AlgorithmDescriptor, DescriptorError> {
    let mut lines = text.lines().map(|raw| raw.trim_start_matches('\u{feff}').trim());

    let identity = lines.next().unwrap_or_default();
    if identity.is_empty() {
        return Err(DescriptorError::malformed(unit, 1, "missing algorithm name"));
    }
    let (display_name, command_id) = match identity.split_once('|') {
        Some((name, id)) if !id.trim().is_empty() => (name.trim(), id.trim()),
        Some((name, _)) => (name.trim(), name.trim()),
        None => (identity, identity),
    };
    if display_name.is_empty() {
        return Err(DescriptorError::malformed(unit, 1, "missing algorithm name"));
    }

    let library = lines.next().unwrap_or_default();
    if library.is_empty() {
        return Err(DescriptorError::malformed(unit, 2, "missing library id"));
    }

    let mut template = CommandTemplate::new(vec![
        TemplatePart::literal(library),
        TemplatePart::literal(format!("\"{command_id}\"")),
    ]);
    let mut parameters: Vec<ParameterDescriptor> = Vec::new();
    let mut allows_unmatching_extents = false;

    for (offset, content) in lines.enumerate() {
        let line_number = offset + 3;
        if content.is_empty() {
            continue;
        }
        if let Some(fragment) = content.strip_prefix(HARDCODED_DIRECTIVE) {
            template.push(TemplatePart::literal(fragment.trim()));
        } else if content == ALLOW_UNMATCHING_DIRECTIVE {
            allows_unmatching_extents = true;
        } else if is_parameter_line(content) {
            let parameter = line::parse_parameter_line(content)
                .map_err(|message| DescriptorError::malformed(unit, line_number, message))?;
            if parameters.iter().any(|known| known.key() == parameter.key()) {
                return Err(DescriptorError::malformed(
                    unit,
                    line_number,
                    format!("duplicate parameter key '{}'", parameter.key()),
                ));
            }
            template.push(TemplatePart::parameter(parameter.key()));
            parameters.push(parameter);
        } else {
            template.push(TemplatePart::literal(content));
        }
    }

    debug!(
        target: DESCRIPTOR_TARGET,
        unit,
        algorithm = display_name,
        parameters = parameters.len(),
        "parsed description unit"
    );

    Ok(AlgorithmDescriptor {
        name: internal_name(display_name),
        display_name: display_name.to_owned(),
        group: humanize(library),
        group_id: library.to_owned(),
        parameters,
        commands: vec![template],
        allows_unmatching_extents,
    })
}
