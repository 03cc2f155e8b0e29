//! Unit tests for the parameter model and value validation.

use rstest::{fixture, rstest};

use super::*;
use crate::error::ValidationError;

#[fixture]
fn percentile() -> ParameterDescriptor {
    ParameterDescriptor::new(
        "R_PERCTL_MIN",
        "Percentiles Range for RED max",
        ParameterKind::Numeric {
            data_type: NumericType::Integer,
            default: Some(1.0),
            minimum: Some(1.0),
            maximum: Some(99.0),
        },
    )
}

#[fixture]
fn method() -> ParameterDescriptor {
    ParameterDescriptor::new(
        "METHOD",
        "Method",
        ParameterKind::Choice {
            options: vec![
                ChoiceOption::parse(0, "Nearest Neighbour"),
                ChoiceOption::parse(1, "[b] Bilinear"),
            ],
            default: Some(0),
        },
    )
}

fn flag() -> ParameterDescriptor {
    ParameterDescriptor::new(
        "DISSOLVE",
        "Dissolve",
        ParameterKind::Boolean {
            default: Some(true),
            false_token: None,
        },
    )
}

fn image() -> ParameterDescriptor {
    ParameterDescriptor::new("RGB", "Output RGB", ParameterKind::image_output())
}

#[rstest]
#[case::integer(ParameterValue::Integer(42), 42)]
#[case::integral_float(ParameterValue::Float(7.0), 7)]
#[case::text(ParameterValue::Text(" 99 ".into()), 99)]
#[case::lower_bound(ParameterValue::Integer(1), 1)]
fn integer_parameter_accepts_whole_numbers(
    percentile: ParameterDescriptor,
    #[case] value: ParameterValue,
    #[case] expected: i64,
) {
    let resolved = validate(&percentile, Some(&value)).expect("value should validate");
    assert_eq!(resolved, Some(ResolvedValue::Integer(expected)));
}

#[rstest]
#[case::below(ParameterValue::Integer(0))]
#[case::above(ParameterValue::Text("120".into()))]
fn integer_parameter_rejects_out_of_range(
    percentile: ParameterDescriptor,
    #[case] value: ParameterValue,
) {
    let error = validate(&percentile, Some(&value)).expect_err("value should be rejected");
    assert!(matches!(error, ValidationError::OutOfRange { .. }), "{error}");
}

#[rstest]
#[case::fraction(ParameterValue::Float(1.5))]
#[case::word(ParameterValue::Text("many".into()))]
#[case::flag(ParameterValue::Boolean(true))]
fn integer_parameter_rejects_non_integers(
    percentile: ParameterDescriptor,
    #[case] value: ParameterValue,
) {
    let error = validate(&percentile, Some(&value)).expect_err("value should be rejected");
    assert!(matches!(error, ValidationError::InvalidValue { .. }), "{error}");
}

#[test]
fn float_parameter_widens_integers_and_rejects_nan() {
    let parameter = ParameterDescriptor::new(
        "DIST",
        "Distance",
        ParameterKind::Numeric {
            data_type: NumericType::Float,
            default: None,
            minimum: Some(0.0),
            maximum: None,
        },
    );
    assert_eq!(
        validate(&parameter, Some(&ParameterValue::Integer(3))),
        Ok(Some(ResolvedValue::Float(3.0)))
    );
    assert_eq!(
        validate(&parameter, Some(&ParameterValue::Text("2.5".into()))),
        Ok(Some(ResolvedValue::Float(2.5)))
    );
    assert!(validate(&parameter, Some(&ParameterValue::Text("NaN".into()))).is_err());
}

#[rstest]
fn missing_required_value_is_reported(percentile: ParameterDescriptor) {
    assert_eq!(
        validate(&percentile, None),
        Err(ValidationError::Missing {
            key: "R_PERCTL_MIN".into()
        })
    );
}

#[rstest]
fn blank_text_counts_as_missing(percentile: ParameterDescriptor) {
    let blank = ParameterValue::Text("   ".into());
    assert!(matches!(
        validate(&percentile, Some(&blank)),
        Err(ValidationError::Missing { .. })
    ));
    let optional = percentile.with_optional(true);
    assert_eq!(validate(&optional, Some(&blank)), Ok(None));
}

#[rstest]
#[case::index(ParameterValue::Integer(1), 1, "b")]
#[case::numeric_text(ParameterValue::Text("0".into()), 0, "0")]
#[case::label(ParameterValue::Text("Bilinear".into()), 1, "b")]
#[case::token(ParameterValue::Text("b".into()), 1, "b")]
fn choice_resolves_to_option_token(
    method: ParameterDescriptor,
    #[case] value: ParameterValue,
    #[case] index: usize,
    #[case] token: &str,
) {
    let resolved = validate(&method, Some(&value)).expect("choice should validate");
    assert_eq!(
        resolved,
        Some(ResolvedValue::Choice {
            index,
            token: token.to_owned()
        })
    );
}

fn numbered(options: &[&str]) -> ParameterDescriptor {
    ParameterDescriptor::new(
        "M",
        "Mode",
        ParameterKind::Choice {
            options: options
                .iter()
                .enumerate()
                .map(|(index, text)| ChoiceOption::parse(index, text))
                .collect(),
            default: None,
        },
    )
}

#[rstest]
#[case::sparse_token(&["[5] Five", "[7] Seven"], "7", 1, "7")]
#[case::sparse_label(&["[5] Five", "[7] Seven"], "Seven", 1, "7")]
#[case::sparse_index(&["[5] Five", "[7] Seven"], "0", 0, "5")]
#[case::token_beats_index(&["[1] A", "[0] B"], "0", 1, "0")]
#[case::token_beats_index_reversed(&["[1] A", "[0] B"], "1", 0, "1")]
fn numeric_tokens_match_before_indices(
    #[case] options: &[&str],
    #[case] text: &str,
    #[case] index: usize,
    #[case] token: &str,
) {
    let parameter = numbered(options);
    let resolved = validate(&parameter, Some(&ParameterValue::Text(text.into())))
        .expect("choice should validate");
    assert_eq!(
        resolved,
        Some(ResolvedValue::Choice {
            index,
            token: token.to_owned()
        })
    );
}

#[test]
fn integer_choice_values_stay_ordinal() {
    let parameter = numbered(&["[1] A", "[0] B"]);
    let resolved = validate(&parameter, Some(&ParameterValue::Integer(0))).expect("valid index");
    assert_eq!(
        resolved,
        Some(ResolvedValue::Choice {
            index: 0,
            token: String::from("1")
        })
    );
}

#[rstest]
#[case::index_past_end(ParameterValue::Integer(2))]
#[case::negative(ParameterValue::Integer(-1))]
#[case::unknown_label(ParameterValue::Text("Cubic".into()))]
fn choice_rejects_unknown_options(method: ParameterDescriptor, #[case] value: ParameterValue) {
    let error = validate(&method, Some(&value)).expect_err("choice should be rejected");
    assert!(
        matches!(error, ValidationError::InvalidChoice { count: 2, .. }),
        "{error}"
    );
}

#[rstest]
#[case::native(ParameterValue::Boolean(false), false)]
#[case::one(ParameterValue::Integer(1), true)]
#[case::yes(ParameterValue::Text("YES".into()), true)]
#[case::word_false(ParameterValue::Text("False".into()), false)]
fn boolean_accepts_common_spellings(#[case] value: ParameterValue, #[case] expected: bool) {
    assert_eq!(
        validate(&flag(), Some(&value)),
        Ok(Some(ResolvedValue::Boolean(expected)))
    );
}

#[test]
fn boolean_rejects_other_numbers() {
    assert!(validate(&flag(), Some(&ParameterValue::Integer(2))).is_err());
}

#[test]
fn string_value_accepts_any_shape() {
    let parameter = ParameterDescriptor::new(
        "FORMULA",
        "Formula",
        ParameterKind::StringValue { default: None },
    );
    assert_eq!(
        validate(&parameter, Some(&ParameterValue::Integer(5))),
        Ok(Some(ResolvedValue::Text("5".into())))
    );
}

#[test]
fn file_or_layer_requires_text() {
    let parameter = ParameterDescriptor::new(
        "SHAPES",
        "Shapes",
        ParameterKind::FileOrLayer {
            role: Role::Input,
            default: None,
        },
    );
    assert_eq!(
        validate(&parameter, Some(&ParameterValue::Text("/data/roads.shp".into()))),
        Ok(Some(ResolvedValue::Path("/data/roads.shp".into())))
    );
    assert!(validate(&parameter, Some(&ParameterValue::Integer(3))).is_err());
}

#[rstest]
#[case::no_extension("/out/rgb", "/out/rgb.tif")]
#[case::supported("/out/rgb.tif", "/out/rgb.tif")]
#[case::upper_case("/out/rgb.TIF", "/out/rgb.TIF")]
#[case::dotted_folder("/out.d/rgb", "/out.d/rgb.tif")]
fn image_output_normalises_extension(#[case] supplied: &str, #[case] expected: &str) {
    let value = ParameterValue::Text(supplied.into());
    assert_eq!(
        validate(&image(), Some(&value)),
        Ok(Some(ResolvedValue::Path(expected.into())))
    );
}

#[test]
fn image_output_rejects_unsupported_extension() {
    let value = ParameterValue::Text("/out/rgb.png".into());
    let error = validate(&image(), Some(&value)).expect_err("png should be rejected");
    assert!(error.to_string().contains("tif"), "{error}");
}

#[rstest]
fn validate_all_skips_unset_optionals_and_ignores_unknown_keys(
    percentile: ParameterDescriptor,
    method: ParameterDescriptor,
) {
    let parameters = vec![percentile, method.with_optional(true)];
    let values = ParameterValues::new()
        .with("R_PERCTL_MIN", 5_i64)
        .with("NOT_DECLARED", "x");

    let resolved = validate_all(&parameters, &values).expect("values should validate");

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved.get("R_PERCTL_MIN"), Some(&ResolvedValue::Integer(5)));
    assert!(resolved.get("METHOD").is_none());
    assert!(resolved.get("NOT_DECLARED").is_none());
}

#[rstest]
fn validate_all_stops_at_first_failure(
    percentile: ParameterDescriptor,
    method: ParameterDescriptor,
) {
    let parameters = vec![percentile, method];
    let values = ParameterValues::new().with("METHOD", "Cubic");
    let error = validate_all(&parameters, &values).expect_err("validation should fail");
    assert_eq!(error.key(), "R_PERCTL_MIN");
}

#[rstest]
fn with_defaults_fills_declared_defaults(
    percentile: ParameterDescriptor,
    method: ParameterDescriptor,
) {
    let parameters = vec![percentile, method, flag(), image()];
    let values = ParameterValues::with_defaults(&parameters);

    assert_eq!(values.get("R_PERCTL_MIN"), Some(&ParameterValue::Integer(1)));
    assert_eq!(values.get("METHOD"), Some(&ParameterValue::Integer(0)));
    assert_eq!(values.get("DISSOLVE"), Some(&ParameterValue::Boolean(true)));
    assert!(values.get("RGB").is_none());
}

#[rstest]
fn fill_defaults_keeps_caller_values(percentile: ParameterDescriptor) {
    let mut values = ParameterValues::new().with("R_PERCTL_MIN", 50_i64);
    values.fill_defaults(std::slice::from_ref(&percentile));
    assert_eq!(values.get("R_PERCTL_MIN"), Some(&ParameterValue::Integer(50)));
}

#[rstest]
#[case::bracketed(3, "[7] Seven", "7", "Seven")]
#[case::bare(3, "  Plain  ", "3", "Plain")]
#[case::empty_brackets(1, "[] Odd", "1", "[] Odd")]
fn choice_option_parsing(
    #[case] index: usize,
    #[case] text: &str,
    #[case] token: &str,
    #[case] label: &str,
) {
    let option = ChoiceOption::parse(index, text);
    assert_eq!(option.token(), token);
    assert_eq!(option.label(), label);
}

#[rstest]
fn check_rejects_inverted_bounds() {
    let parameter = ParameterDescriptor::new(
        "N",
        "N",
        ParameterKind::Numeric {
            data_type: NumericType::Float,
            default: None,
            minimum: Some(5.0),
            maximum: Some(1.0),
        },
    );
    assert!(parameter.check().is_err());
}

#[rstest]
fn check_rejects_empty_choice_and_blank_key() {
    let choice = ParameterDescriptor::new(
        "M",
        "M",
        ParameterKind::Choice {
            options: Vec::new(),
            default: None,
        },
    );
    assert!(choice.check().is_err());
    let blank = ParameterDescriptor::new(" ", "Blank", ParameterKind::StringValue { default: None });
    assert!(blank.check().is_err());
}

#[rstest]
fn output_roles_are_reported(method: ParameterDescriptor) {
    assert!(image().is_output());
    assert!(!method.is_output());
    assert_eq!(image().kind().type_name(), "image-output");
}
