//! Parameter-line grammar: `[*]<TypeToken>|<key>|<label>[|<fields>...]`.
//!
//! Dispatch happens on the leading type token. A recognised token makes the
//! line a parameter line, and a parameter line with the wrong field count is
//! an error. Any other line is left to the caller as a command fragment.

use crate::error::DescriptorError;
use crate::parameter::{
    ChoiceOption, NumericType, ParameterDescriptor, ParameterKind, Role, parse_flag,
};

/// Field text that marks an optional position as absent.
const NONE_FIELD: &str = "None";

/// Unit name used when a single line is parsed outside any description unit.
const INLINE_UNIT: &str = "<parameter line>";

/// Leading type tokens understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeToken {
    Number,
    Enum,
    Boolean,
    String,
    Field,
    RasterLayer,
    VectorLayer,
    FeatureSource,
    MultipleLayers,
    File,
    RasterDestination,
    VectorDestination,
    FileDestination,
    FolderDestination,
    SagaImageOutput,
}

/// Positions of the fields every type shares, plus its allowed field count.
struct Layout {
    min: usize,
    max: usize,
    default: Option<usize>,
    optional: Option<usize>,
}

impl Layout {
    const fn new(min: usize, max: usize, default: Option<usize>, optional: Option<usize>) -> Self {
        Self {
            min,
            max,
            default,
            optional,
        }
    }
}

impl TypeToken {
    fn parse(token: &str) -> Option<Self> {
        let parsed = match token {
            "QgsProcessingParameterNumber" => Self::Number,
            "QgsProcessingParameterEnum" => Self::Enum,
            "QgsProcessingParameterBoolean" => Self::Boolean,
            "QgsProcessingParameterString" => Self::String,
            "QgsProcessingParameterField" => Self::Field,
            "QgsProcessingParameterRasterLayer" => Self::RasterLayer,
            "QgsProcessingParameterVectorLayer" => Self::VectorLayer,
            "QgsProcessingParameterFeatureSource" => Self::FeatureSource,
            "QgsProcessingParameterMultipleLayers" => Self::MultipleLayers,
            "QgsProcessingParameterFile" => Self::File,
            "QgsProcessingParameterRasterDestination" => Self::RasterDestination,
            "QgsProcessingParameterVectorDestination" => Self::VectorDestination,
            "QgsProcessingParameterFileDestination" => Self::FileDestination,
            "QgsProcessingParameterFolderDestination" => Self::FolderDestination,
            "SagaImageOutput" => Self::SagaImageOutput,
            _ => return None,
        };
        Some(parsed)
    }

    const fn layout(self) -> Layout {
        match self {
            Self::Number => Layout::new(3, 8, Some(4), Some(5)),
            Self::Enum => Layout::new(4, 7, Some(5), Some(6)),
            Self::Boolean => Layout::new(3, 6, Some(3), Some(4)),
            Self::String => Layout::new(3, 6, Some(3), Some(5)),
            Self::Field => Layout::new(3, 8, Some(3), Some(7)),
            Self::RasterLayer => Layout::new(3, 5, Some(3), Some(4)),
            Self::VectorLayer | Self::FeatureSource | Self::MultipleLayers => {
                Layout::new(3, 6, Some(4), Some(5))
            }
            Self::File => Layout::new(3, 8, Some(5), Some(6)),
            Self::RasterDestination | Self::FolderDestination => {
                Layout::new(3, 6, Some(3), Some(4))
            }
            Self::VectorDestination | Self::FileDestination => {
                Layout::new(3, 7, Some(4), Some(5))
            }
            Self::SagaImageOutput => Layout::new(3, 3, None, None),
        }
    }

    const fn role(self) -> Role {
        match self {
            Self::RasterDestination
            | Self::VectorDestination
            | Self::FileDestination
            | Self::FolderDestination
            | Self::SagaImageOutput => Role::Output,
            _ => Role::Input,
        }
    }
}

/// Splits off the optional marker and returns the recognised type token.
fn leading_token(line: &str) -> (bool, Option<TypeToken>) {
    let trimmed = line.trim_start();
    let (optional, rest) = trimmed
        .strip_prefix('*')
        .map_or((false, trimmed), |rest| (true, rest));
    let token = rest.split('|').next().unwrap_or_default().trim();
    (optional, TypeToken::parse(token))
}

/// Returns `true` when the line starts with a recognised type token.
///
/// # Example
///
/// ```
/// use saga_processing::descriptor::is_parameter_line;
///
/// assert!(is_parameter_line("SagaImageOutput|RGB|Output RGB"));
/// assert!(is_parameter_line("*SagaImageOutput|RGB|Output RGB"));
/// assert!(!is_parameter_line("xxxxxxxxx"));
/// assert!(!is_parameter_line(""));
/// ```
#[must_use]
pub fn is_parameter_line(line: &str) -> bool {
    leading_token(line).1.is_some()
}

/// Parses one parameter line into a descriptor.
///
/// # Errors
///
/// Returns [`DescriptorError::Malformed`] when the line does not start with a
/// recognised type token or its fields do not fit the token's layout.
///
/// # Example
///
/// ```
/// use saga_processing::descriptor::create_parameter_from_line;
/// use saga_processing::parameter::{NumericType, ParameterKind};
///
/// let parameter = create_parameter_from_line(
///     "QgsProcessingParameterNumber|R_PERCTL_MIN|Percentiles Range for RED max|\
///      QgsProcessingParameterNumber.Integer|1|False|1|99",
/// )?;
/// assert_eq!(parameter.key(), "R_PERCTL_MIN");
/// assert!(matches!(
///     parameter.kind(),
///     ParameterKind::Numeric { data_type: NumericType::Integer, minimum: Some(_), .. }
/// ));
/// # Ok::<(), saga_processing::DescriptorError>(())
/// ```
pub fn create_parameter_from_line(line: &str) -> Result<ParameterDescriptor, DescriptorError> {
    parse_parameter_line(line).map_err(|message| DescriptorError::malformed(INLINE_UNIT, 1, message))
}

/// Parses a parameter line, describing any problem as plain text so the
/// caller can attach the unit name and line number.
pub(super) fn parse_parameter_line(line: &str) -> Result<ParameterDescriptor, String> {
    let (starred, recognised) = leading_token(line);
    let token = recognised
        .ok_or_else(|| String::from("line does not start with a known parameter type"))?;
    let body = line.trim().trim_start_matches('*');
    let fields = Fields::new(body.split('|').map(str::trim).collect());
    let layout = token.layout();

    if fields.len() < layout.min || fields.len() > layout.max {
        return Err(field_count_message(fields.first(), &layout, fields.len()));
    }

    let key = fields.required(1, "key")?;
    let label = fields.required(2, "label")?;
    let declared_optional = match layout.optional {
        Some(index) => fields.flag(index)?.unwrap_or(false),
        None => false,
    };
    let kind = build_kind(token, &fields, layout.default)?;

    let parameter =
        ParameterDescriptor::new(key, label, kind).with_optional(starred || declared_optional);
    parameter.check()?;
    Ok(parameter)
}

fn field_count_message(token: &str, layout: &Layout, found: usize) -> String {
    if layout.min == layout.max {
        format!("{token} expects {} fields, found {found}", layout.min)
    } else {
        format!(
            "{token} expects {} to {} fields, found {found}",
            layout.min, layout.max
        )
    }
}

fn build_kind(
    token: TypeToken,
    fields: &Fields<'_>,
    default_index: Option<usize>,
) -> Result<ParameterKind, String> {
    let text_default = || default_index.and_then(|index| fields.text(index)).map(str::to_owned);
    let kind = match token {
        TypeToken::Number => ParameterKind::Numeric {
            data_type: numeric_type(fields.text(3))?,
            default: fields.number(4)?,
            minimum: fields.number(6)?,
            maximum: fields.number(7)?,
        },
        TypeToken::Enum => choice_kind(fields)?,
        TypeToken::Boolean => ParameterKind::Boolean {
            default: fields.flag(3)?,
            false_token: fields.text(5).map(str::to_owned),
        },
        TypeToken::String | TypeToken::Field => ParameterKind::StringValue {
            default: text_default(),
        },
        TypeToken::SagaImageOutput => ParameterKind::image_output(),
        TypeToken::RasterLayer
        | TypeToken::VectorLayer
        | TypeToken::FeatureSource
        | TypeToken::MultipleLayers
        | TypeToken::File
        | TypeToken::RasterDestination
        | TypeToken::VectorDestination
        | TypeToken::FileDestination
        | TypeToken::FolderDestination => ParameterKind::FileOrLayer {
            role: token.role(),
            default: text_default(),
        },
    };
    Ok(kind)
}

fn numeric_type(field: Option<&str>) -> Result<NumericType, String> {
    match field {
        None => Ok(NumericType::Integer),
        Some(text) if text.ends_with("Integer") => Ok(NumericType::Integer),
        Some(text) if text.ends_with("Double") || text.ends_with("Float") => {
            Ok(NumericType::Float)
        }
        Some(text) => Err(format!("unknown numeric type '{text}'")),
    }
}

fn choice_kind(fields: &Fields<'_>) -> Result<ParameterKind, String> {
    let options: Vec<ChoiceOption> = fields
        .text(3)
        .map(|list| {
            list.split(';')
                .filter(|option| !option.trim().is_empty())
                .enumerate()
                .map(|(index, option)| ChoiceOption::parse(index, option))
                .collect()
        })
        .unwrap_or_default();
    if options.is_empty() {
        return Err(String::from("choice parameter declares no options"));
    }
    // Multiple selection is checked for validity only.
    fields.flag(4)?;
    let default = match fields.text(5) {
        None => None,
        Some(text) => {
            let index = text
                .parse::<usize>()
                .map_err(|_| format!("invalid default option index '{text}'"))?;
            if index >= options.len() {
                return Err(format!(
                    "default option index {index} exceeds {} options",
                    options.len()
                ));
            }
            Some(index)
        }
    };
    Ok(ParameterKind::Choice { options, default })
}

/// Trimmed pipe-separated fields of one parameter line.
struct Fields<'a> {
    values: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    const fn new(values: Vec<&'a str>) -> Self {
        Self { values }
    }

    const fn len(&self) -> usize {
        self.values.len()
    }

    fn first(&self) -> &'a str {
        self.values.first().copied().unwrap_or_default()
    }

    /// Returns the field, treating empty text and `None` as absent.
    fn text(&self, index: usize) -> Option<&'a str> {
        self.values
            .get(index)
            .copied()
            .filter(|value| !value.is_empty() && *value != NONE_FIELD)
    }

    fn required(&self, index: usize, name: &str) -> Result<&'a str, String> {
        self.text(index)
            .ok_or_else(|| format!("parameter {name} must not be empty"))
    }

    fn flag(&self, index: usize) -> Result<Option<bool>, String> {
        self.text(index)
            .map(|text| parse_flag(text).ok_or_else(|| format!("invalid boolean '{text}'")))
            .transpose()
    }

    fn number(&self, index: usize) -> Result<Option<f64>, String> {
        self.text(index)
            .map(|text| {
                text.parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .ok_or_else(|| format!("invalid number '{text}'"))
            })
            .transpose()
    }
}
