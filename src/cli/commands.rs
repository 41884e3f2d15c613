//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::RunReport;
use crate::application::{InputFormat, IoResultExt, OutputFormat};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Build {
            input,
            output,
            format,
            input_format,
        }) => cmd_build(cli, input, output.as_deref(), *format, *input_format),
        Some(Commands::Tree { input }) => cmd_tree(cli, input),
        Some(Commands::Check { input }) => cmd_check(cli, input),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    }
}

fn local_dir(cli: &Cli) -> PathBuf {
    cli.dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

/// Load settings; on failure report and continue with defaults.
fn load_settings_or_default(cli: &Cli) -> Settings {
    match Settings::load(Some(&local_dir(cli))) {
        Ok(settings) => settings,
        Err(e) => {
            output::warning(&format!("{e}, using defaults"));
            Settings::default()
        }
    }
}

fn print_diagnostics(report: &RunReport) {
    for diagnostic in &report.diagnostics {
        output::warning(diagnostic);
    }
}

#[instrument(skip(cli))]
fn cmd_build(
    cli: &Cli,
    input: &Path,
    output_path: Option<&Path>,
    format: Option<OutputFormat>,
    input_format: Option<InputFormat>,
) -> CliResult<()> {
    let mut settings = load_settings_or_default(cli);
    if let Some(format) = format {
        settings.output_format = format;
    }
    if let Some(input_format) = input_format {
        settings.input.format = input_format;
    }
    let destination = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| settings.output_path.clone());
    debug!("build: {} -> {}", input.display(), destination.display());

    let container = ServiceContainer::new(settings);
    let report = container.hierarchy.run(input, &destination);

    print_diagnostics(&report);
    if report.output_written {
        output::action("Wrote", &destination.display());
    }
    let summary = format!(
        "{} of {} employees placed in hierarchy",
        report.nodes_built, report.records_read
    );
    if report.is_clean() {
        output::success(&summary);
    } else {
        output::failure(&summary);
    }
    // Best effort: a degraded run still exits cleanly.
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_tree(cli: &Cli, input: &Path) -> CliResult<()> {
    let container = ServiceContainer::new(load_settings_or_default(cli));
    let (tree, report) = container.hierarchy.inspect(input);
    print_diagnostics(&report);
    if !tree.is_empty() {
        output::info(&tree.to_tree_string());
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_check(cli: &Cli, input: &Path) -> CliResult<()> {
    let container = ServiceContainer::new(load_settings_or_default(cli));
    let (tree, report) = container.hierarchy.inspect(input);

    output::header(&input.display());
    output::detail(&format!("records:  {}", report.records_read));
    output::detail(&format!("placed:   {}", report.nodes_built));
    output::detail(&format!("depth:    {}", tree.depth()));
    if let Some(root) = tree.root_node() {
        output::detail(&format!("root:     {}", root.data));
    }
    for identity in &report.unattached {
        output::failure(&format!("not reachable from root: {identity}"));
    }
    for diagnostic in &report.diagnostics {
        output::failure(diagnostic);
    }

    if report.missing_root() {
        return Err(CliError::InvalidData(format!(
            "{}: no employee without a manager",
            input.display()
        )));
    }
    if report.is_clean() && report.unattached.is_empty() {
        output::success("hierarchy is consistent");
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(Some(&local_dir(cli)))?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let local = local_config_path(&local_dir(cli));
            match global_config_path() {
                Some(global) => print_location("global", &global),
                None => output::detail("global: (no config directory)"),
            }
            print_location("local", &local);
        }
        ConfigCommands::Init { global } => {
            let target = if *global {
                global_config_path()
                    .ok_or_else(|| CliError::Usage("no global config directory".into()))?
            } else {
                local_config_path(&local_dir(cli))
            };
            if target.exists() {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&target, Settings::template())
                .with_path_context("write config", &target)?;
            output::action("Created", &target.display());
        }
    }
    Ok(())
}

fn print_location(label: &str, path: &Path) {
    let state = if path.exists() { "" } else { " (not present)" };
    output::detail(&format!("{label}: {}{state}", path.display()));
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
