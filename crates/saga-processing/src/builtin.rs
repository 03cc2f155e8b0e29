//! Algorithms assembled in code rather than read from description units.

use crate::descriptor::{AlgorithmDescriptor, CommandTemplate, TemplatePart};
use crate::error::DescriptorError;
use crate::parameter::{ParameterDescriptor, ParameterKind, Role};

const SCRATCH_FLAG: &str = "GRIDS";

/// Returns every built-in algorithm.
///
/// # Errors
///
/// Returns [`DescriptorError::Inconsistent`] if a built-in declaration is
/// broken.
pub fn builtin_algorithms() -> Result<Vec<AlgorithmDescriptor>, DescriptorError> {
    Ok(vec![split_rgb_bands()?])
}

/// Splits a three-band raster into one GeoTIFF per band.
///
/// The input is imported into scratch grids, after which band 1, 2 and 3
/// are exported to `R`, `G` and `B`.
///
/// # Errors
///
/// Returns [`DescriptorError::Inconsistent`] if the declaration is broken.
pub fn split_rgb_bands() -> Result<AlgorithmDescriptor, DescriptorError> {
    let parameters = vec![
        layer("INPUT", "Input layer", Role::Input),
        layer("R", "Output R band layer", Role::Output),
        layer("G", "Output G band layer", Role::Output),
        layer("B", "Output B band layer", Role::Output),
    ];

    let mut commands = vec![CommandTemplate::new(vec![
        TemplatePart::literal("io_gdal 0"),
        TemplatePart::scratch(SCRATCH_FLAG, ""),
        TemplatePart::placeholder("FILES", "INPUT"),
    ])];
    commands.extend(["R", "G", "B"].iter().zip(1..).map(|(key, band)| {
        CommandTemplate::new(vec![
            TemplatePart::literal("io_gdal 1"),
            TemplatePart::scratch(SCRATCH_FLAG, format!("_{band}.sgrd")),
            TemplatePart::literal("-FORMAT 1 -TYPE 0"),
            TemplatePart::placeholder("FILE", *key),
        ])
    }));

    AlgorithmDescriptor::new(
        "Split RGB bands",
        "Raster tools",
        "rastertools",
        parameters,
        commands,
    )
}

fn layer(key: &str, label: &str, role: Role) -> ParameterDescriptor {
    ParameterDescriptor::new(key, label, ParameterKind::FileOrLayer { role, default: None })
}
