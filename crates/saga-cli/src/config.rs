//! Configuration loading helpers for the CLI.
//!
//! Configuration flags precede the subcommand. The split below hands those
//! flags to `ortho_config` and leaves the rest for `clap`, then maps the
//! loaded [`Config`] onto the provider's settings.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use saga_config::{Config, VersionPolicy as ConfiguredPolicy};
use saga_processing::script::Platform;
use saga_processing::{ProviderSettings, VersionPolicy};

use crate::errors::AppError;

/// Flags recognised by the configuration loader that take a value.
///
/// MAINTENANCE: keep in sync with the fields of `saga_config::Config`.
const VALUE_FLAGS: &[&str] = &[
    "--config-path",
    "--saga-folder",
    "--host-prefix",
    "--script-dir",
    "--version-policy",
    "--log-filter",
    "--log-format",
    "--log-commands",
    "--log-console",
];

/// Boolean flags recognised by the configuration loader.
const SWITCH_FLAGS: &[&str] = &["--import-export-optimization"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the configuration-only arguments.
    ///
    /// # Flag Ordering
    ///
    /// Configuration flags must appear before the subcommand. Anything after
    /// the first non-configuration token is parsed as a command argument.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

fn process_config_flag(argument: &OsStr) -> FlagAction {
    let argument_text = argument.to_string_lossy();
    if !argument_text.starts_with("--") {
        return FlagAction::Skip;
    }

    let (flag, has_inline_value) = match argument_text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (argument_text.as_ref(), false),
    };

    if VALUE_FLAGS.contains(&flag) {
        return FlagAction::Include {
            needs_value: !has_inline_value,
        };
    }
    if SWITCH_FLAGS.contains(&flag) {
        return FlagAction::Include { needs_value: false };
    }
    FlagAction::Skip
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Splits `args` into the configuration prefix and the command tail. Both
/// halves keep the program name as their first element.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut command_arguments = vec![program.clone()];

    while let Some(argument) = remaining.next() {
        match process_config_flag(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value {
                    if let Some(value) = remaining.next() {
                        config_arguments.push(value.clone());
                    }
                }
            }
            FlagAction::Skip => {
                command_arguments.push(argument.clone());
                command_arguments.extend(remaining.cloned());
                break;
            }
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

/// Maps the loaded configuration onto the provider's settings.
pub(crate) fn provider_settings(config: &Config) -> ProviderSettings {
    ProviderSettings {
        saga_folder: config.saga_folder_path(),
        log_commands: config.log_commands(),
        log_console: config.log_console(),
        import_export_optimization: config.import_export_optimization,
        host_prefix: config.host_prefix_path(),
        script_dir: config.script_dir_path(),
        version_policy: match config.version_policy {
            ConfiguredPolicy::Warn => VersionPolicy::Warn,
            ConfiguredPolicy::Abort => VersionPolicy::Abort,
        },
        platform: Platform::current(),
    }
}
