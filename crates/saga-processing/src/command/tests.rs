//! Unit tests for command rendering.

use rstest::{fixture, rstest};

use super::*;
use crate::descriptor::parse;
use crate::parameter::{ParameterValues, validate_all};

const BUFFER_UNIT: &str = "\
Shapes Buffer|0
shapes_tools
QgsProcessingParameterFeatureSource|SHAPES|Shapes|-1|None|False
QgsProcessingParameterNumber|DIST|Buffer distance|QgsProcessingParameterNumber.Double|100.0|False|0.0|None
QgsProcessingParameterNumber|NZONES|Zones|QgsProcessingParameterNumber.Integer|1|True|1|None
QgsProcessingParameterEnum|DIST_TYPE|Distance|[0] fixed value;[1] attribute field|False|0|False
QgsProcessingParameterBoolean|DISSOLVE|Dissolve Buffers|True|False
QgsProcessingParameterBoolean|POLY_INNER|Inner Buffer|False|False|0
QgsProcessingParameterVectorDestination|BUFFER|Buffer
";

#[fixture]
fn descriptor() -> AlgorithmDescriptor {
    parse("Buffer.txt", BUFFER_UNIT).expect("unit should parse")
}

fn render(descriptor: &AlgorithmDescriptor, values: &ParameterValues) -> String {
    let resolved = validate_all(descriptor.parameters(), values).expect("values should validate");
    let commands = CommandBuilder::new("/tmp/scratch")
        .build(descriptor, &resolved)
        .expect("command should render");
    assert_eq!(commands.len(), 1);
    commands.into_iter().next().unwrap_or_default()
}

fn base_values() -> ParameterValues {
    ParameterValues::new()
        .with("SHAPES", "/data/roads.shp")
        .with("DIST", 25.5)
        .with("DIST_TYPE", "attribute field")
        .with("DISSOLVE", true)
        .with("POLY_INNER", true)
        .with("BUFFER", "/out/buffer.shp")
}

#[rstest]
fn renders_every_fragment_in_order(descriptor: AlgorithmDescriptor) {
    let command = render(&descriptor, &base_values());
    assert_eq!(
        command,
        "shapes_tools \"0\" -SHAPES \"/data/roads.shp\" -DIST 25.5 -DIST_TYPE 1 \
         -DISSOLVE -POLY_INNER -BUFFER \"/out/buffer.shp\""
    );
}

#[rstest]
fn optional_parameter_without_value_is_omitted(descriptor: AlgorithmDescriptor) {
    let command = render(&descriptor, &base_values());
    assert!(!command.contains("NZONES"), "{command}");
}

#[rstest]
fn optional_parameter_with_value_is_rendered(descriptor: AlgorithmDescriptor) {
    let command = render(&descriptor, &base_values().with("NZONES", 3_i64));
    assert!(command.contains("-NZONES 3"), "{command}");
}

#[rstest]
fn false_flag_without_token_is_omitted(descriptor: AlgorithmDescriptor) {
    let command = render(&descriptor, &base_values().with("DISSOLVE", false));
    assert!(!command.contains("DISSOLVE"), "{command}");
}

#[rstest]
fn false_flag_with_token_renders_token(descriptor: AlgorithmDescriptor) {
    let command = render(&descriptor, &base_values().with("POLY_INNER", "no"));
    assert!(command.contains("-POLY_INNER 0"), "{command}");
}

#[rstest]
fn required_parameters_appear_exactly_once(descriptor: AlgorithmDescriptor) {
    let command = render(&descriptor, &base_values());
    for key in ["SHAPES", "DIST ", "DIST_TYPE", "BUFFER"] {
        assert_eq!(command.matches(&format!("-{key}")).count(), 1, "{key} in {command}");
    }
}

#[rstest]
#[case::integer(ResolvedValue::Integer(-4), "-4")]
#[case::float(ResolvedValue::Float(100.0), "100")]
#[case::fraction(ResolvedValue::Float(0.1), "0.1")]
#[case::choice(ResolvedValue::Choice { index: 2, token: "b".into() }, "b")]
#[case::text(ResolvedValue::Text("a b".into()), "\"a b\"")]
#[case::path(ResolvedValue::Path("/x/y.tif".into()), "\"/x/y.tif\"")]
fn values_format_by_type(#[case] value: ResolvedValue, #[case] expected: &str) {
    assert_eq!(format_value(&value), expected);
}

#[rstest]
fn missing_required_value_is_unresolved(descriptor: AlgorithmDescriptor) {
    let error = CommandBuilder::default()
        .build(&descriptor, &ResolvedValues::new())
        .expect_err("render should fail");
    assert!(
        matches!(error, ProcessingError::UnresolvedPlaceholder { ref key, .. } if key == "SHAPES"),
        "{error}"
    );
}

#[test]
fn scratch_parts_extend_the_scratch_base() {
    let descriptor = AlgorithmDescriptor::new(
        "Scratch Test",
        "Tests",
        "tests",
        Vec::new(),
        vec![CommandTemplate::new(vec![
            TemplatePart::literal("io_gdal 1"),
            TemplatePart::scratch("GRIDS", "_1.sgrd"),
            TemplatePart::literal(""),
        ])],
    )
    .expect("descriptor should assemble");
    let commands = CommandBuilder::new("/tmp/job/rgb")
        .build(&descriptor, &ResolvedValues::new())
        .expect("command should render");
    assert_eq!(commands, ["io_gdal 1 -GRIDS \"/tmp/job/rgb_1.sgrd\""]);
}
