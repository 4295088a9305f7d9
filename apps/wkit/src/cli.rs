// SPDX-FileCopyrightText: © 2025 WireKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use wirekit_api::design::load_design_file;
use wirekit_api::pinout;
use wirekit_core::{Catalog, DeviceRegistry, PlugType, SelectorValue};

use crate::config;
use crate::export::{self, ExportFormat};
use crate::render;
use crate::rpc;
use crate::shell::Shell;

type LogInitFn = fn(
    &config::LogConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, Box<dyn std::error::Error>>;

/// Exit status of `wkit check` when the design has pin conflicts.
pub const EXIT_CONFLICTS: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Pin allocation and conflict checking for three-plug wiring designs",
    long_about = None
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "wkit.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the device palette with wiring legends
    Catalog {
        /// Only show one plug (inputs, communications, outputs)
        #[arg(long)]
        plug: Option<PlugType>,
    },
    /// Show the pin map of a device type
    Pinout {
        plug: PlugType,
        #[arg(value_name = "TYPE")]
        device_type: String,
        /// Channel, output, or input to highlight
        #[arg(long, short = 's')]
        select: Option<SelectorValue>,
    },
    /// Load a design and report pin conflicts (exit status 2 if any)
    Check { design: PathBuf },
    /// Convert a design to JSON, a CSV wiring schedule, or diagram JSON
    Export {
        design: PathBuf,
        #[arg(long, short = 'f', value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Interactive design shell (the default)
    Shell {
        /// Design file to open
        #[arg(long, short = 'd')]
        design: Option<PathBuf>,
    },
    /// Serve JSON-lines requests on stdin/stdout
    Rpc {
        /// Design file to preload
        #[arg(long, short = 'd')]
        design: Option<PathBuf>,
    },
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate a default config file and print it to stdout
    Default,
    /// Generate a JSON schema for the config and print it to stdout
    Schema,
}

/// Loads config and starts logging. Exits the process with status 1 on failure.
#[allow(clippy::disallowed_macros)]
fn load_config(
    config_path: &str,
    init_logging: LogInitFn,
) -> (config::Config, Option<tracing_appender::non_blocking::WorkerGuard>) {
    let config_result = match config::load(config_path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        },
    };

    let guard = match init_logging(&config_result.config.log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(1);
        },
    };

    if let Some(missing_file) = &config_result.file_missing {
        warn!(config_path = %missing_file, "Config file not found, using defaults");
    }

    (config_result.config, guard)
}

fn new_registry(config: &config::Config) -> DeviceRegistry {
    DeviceRegistry::new().with_default_wire_mode(config.design.default_wire_mode)
}

/// Opens `path` into a fresh registry. `None` (already reported) if it cannot be loaded.
#[allow(clippy::disallowed_macros)]
fn open_design(config: &config::Config, path: &Path) -> Option<DeviceRegistry> {
    let mut registry = new_registry(config);
    match load_design_file(&mut registry, path) {
        Ok(count) => {
            info!(path = %path.display(), devices = count, "Loaded design");
            Some(registry)
        },
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to load design");
            eprintln!("Failed to load {}: {e}", path.display());
            None
        },
    }
}

fn open_or_new(config: &config::Config, design: Option<&Path>) -> Option<DeviceRegistry> {
    design.map_or_else(|| Some(new_registry(config)), |path| open_design(config, path))
}

#[allow(clippy::disallowed_macros)]
fn handle_catalog_command(plug: Option<PlugType>) -> i32 {
    println!("{}", render::templates(&Catalog::builtin(), plug));
    0
}

#[allow(clippy::disallowed_macros)]
fn handle_pinout_command(plug: PlugType, device_type: &str, select: Option<SelectorValue>) -> i32 {
    match pinout::pinout(&Catalog::builtin(), plug, device_type, select) {
        Some(view) => {
            println!("{}", render::pinout(&view));
            0
        },
        None => {
            eprintln!("Plug '{plug}' does not offer device type '{device_type}'");
            1
        },
    }
}

/// Prints the device table and conflicts. Returns [`EXIT_CONFLICTS`] if there are any.
#[allow(clippy::disallowed_macros)]
fn handle_check_command(config: &config::Config, design: &Path) -> i32 {
    let Some(registry) = open_design(config, design) else {
        return 1;
    };
    println!("{}", render::devices(&registry));
    println!();
    println!("{}", render::conflicts(&registry));

    let conflicts = registry.list_conflicts().len();
    if conflicts > 0 {
        warn!(conflicts, "Design has pin conflicts");
        return EXIT_CONFLICTS;
    }
    0
}

#[allow(clippy::disallowed_macros)]
fn handle_export_command(
    config: &config::Config,
    design: &Path,
    format: ExportFormat,
    output: Option<&Path>,
) -> i32 {
    let Some(registry) = open_design(config, design) else {
        return 1;
    };
    let result = match output {
        Some(path) => export::write(&registry, format, &config.export, path),
        None => export::render(&registry, format, &config.export).map(|text| println!("{text}")),
    };
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Export failed: {e}");
            1
        },
    }
}

#[allow(clippy::disallowed_macros)]
fn handle_shell_command(config: &config::Config, design: Option<&Path>) -> i32 {
    let Some(registry) = open_or_new(config, design) else {
        return 1;
    };
    let shell = Shell::new(
        registry,
        config.export.clone(),
        PathBuf::from(&config.design.history_file),
        config.design.autosave_path.as_ref().map(PathBuf::from),
    );

    match shell.and_then(|mut shell| shell.run()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Shell error: {e}");
            1
        },
    }
}

fn handle_rpc_command(config: &config::Config, design: Option<&Path>) -> i32 {
    let Some(mut registry) = open_or_new(config, design) else {
        return 1;
    };
    let stdin = std::io::stdin();
    match rpc::serve(&mut registry, stdin.lock(), std::io::stdout().lock()) {
        Ok(count) => {
            info!(responses = count, "Request stream closed");
            0
        },
        Err(e) => {
            error!(error = %e, "Request stream failed");
            1
        },
    }
}

/// Handle the "config default" command - print default config to stdout
#[allow(clippy::disallowed_macros)]
fn handle_config_default_command() {
    match config::generate_default() {
        Ok(toml_string) => {
            println!("# Default wkit configuration file");
            println!("{toml_string}");
        },
        Err(e) => {
            eprintln!("Failed to generate default config: {e}");
            std::process::exit(1);
        },
    }
}

/// Handle the "config schema" command - print JSON schema to stdout
#[allow(clippy::disallowed_macros)]
fn handle_config_schema_command() {
    let schema = schema_for!(config::Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => {
            println!("{json}");
        },
        Err(e) => {
            eprintln!("Failed to generate config schema: {e}");
            std::process::exit(1);
        },
    }
}

/// Handle CLI commands and return the process exit status.
///
/// The log guard is dropped before returning, so buffered file logs are
/// flushed before the caller exits.
pub fn handle_command(cli: &Cli, init_logging: LogInitFn) -> i32 {
    let default_command = Commands::Shell { design: None };
    let command = cli.command.as_ref().unwrap_or(&default_command);

    match command {
        Commands::Config(ConfigCommands::Default) => {
            handle_config_default_command();
            return 0;
        },
        Commands::Config(ConfigCommands::Schema) => {
            handle_config_schema_command();
            return 0;
        },
        _ => {},
    }

    let (config, log_guard) = load_config(&cli.config, init_logging);

    let code = match command {
        Commands::Catalog { plug } => handle_catalog_command(*plug),
        Commands::Pinout { plug, device_type, select } => {
            handle_pinout_command(*plug, device_type, *select)
        },
        Commands::Check { design } => handle_check_command(&config, design),
        Commands::Export { design, format, output } => {
            handle_export_command(&config, design, *format, output.as_deref())
        },
        Commands::Shell { design } => handle_shell_command(&config, design.as_deref()),
        Commands::Rpc { design } => handle_rpc_command(&config, design.as_deref()),
        Commands::Config(_) => 0,
    };

    drop(log_guard);
    code
}
