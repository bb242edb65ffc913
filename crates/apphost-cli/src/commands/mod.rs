//! CLI command definitions and dispatch.

pub mod check;
pub mod forecast;
pub mod init;
pub mod plan;
pub mod publish;

use std::path::Path;

use apphost_common::config::HostConfig;
use apphost_common::constants;
use apphost_compose::descriptor::CompositionDescriptor;
use clap::{Parser, Subcommand};

/// apphost — Describe, check, and plan distributed application starters.
#[derive(Parser, Debug)]
#[command(name = "apphost", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Python interpreter for scripts without a package environment.
    #[arg(long, global = true, env = "APPHOST_PYTHON", default_value = constants::DEFAULT_PYTHON)]
    pub python: String,

    /// First port handed to endpoints that read their port from the environment.
    #[arg(long, global = true, env = "APPHOST_PORT_START", default_value_t = constants::DEFAULT_DYNAMIC_PORT_START)]
    pub port_start: u16,
}

impl Cli {
    /// Host configuration with the global flags applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid.
    pub fn host_config(&self) -> anyhow::Result<HostConfig> {
        let config = HostConfig {
            python: self.python.clone(),
            dynamic_port_start: self.port_start,
            ..HostConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a manifest and report every validation problem.
    Check(check::CheckArgs),
    /// Display the start order and launch commands of a composition.
    Plan(plan::PlanArgs),
    /// Write the JSON publish manifest of a composition.
    Publish(publish::PublishArgs),
    /// Write a starter manifest from a built-in template.
    Init(init::InitArgs),
    /// Fetch the weather forecast from a running backend.
    Forecast(forecast::ForecastArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.host_config()?;
    tracing::debug!(?config, "host configuration");
    match cli.command {
        Command::Check(args) => check::execute(&args),
        Command::Plan(args) => plan::execute(&args, &config),
        Command::Publish(args) => publish::execute(&args),
        Command::Init(args) => init::execute(&args),
        Command::Forecast(args) => forecast::execute(&args),
    }
}

/// Loads a manifest, failing early with a hint when the file is missing.
fn load(path: &Path) -> anyhow::Result<CompositionDescriptor> {
    if !path.exists() {
        anyhow::bail!(
            "manifest not found: {}\n\
             Create one with `{} init` or pass a path.",
            path.display(),
            constants::BIN_NAME
        );
    }
    tracing::info!(path = %path.display(), "loading manifest");
    Ok(apphost_compose::manifest::load_manifest(path)?)
}
