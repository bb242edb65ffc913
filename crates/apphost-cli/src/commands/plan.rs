//! `apphost plan` — Display how each resource would be started.

use std::path::PathBuf;

use apphost_common::config::HostConfig;
use apphost_common::constants;
use apphost_common::types::ResourceName;
use apphost_compose::resolver::resolve_plan;
use clap::Args;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Path to the composition manifest.
    #[arg(default_value = constants::DEFAULT_MANIFEST_FILE)]
    pub file: PathBuf,

    /// Also print each resource's environment.
    #[arg(long)]
    pub env: bool,
}

/// Executes the `plan` command.
///
/// Loads the manifest, validates it, resolves ports and commands, and
/// prints one block per resource in start order.
///
/// # Errors
///
/// Returns an error if loading, validation, or port resolution fails.
pub fn execute(args: &PlanArgs, config: &HostConfig) -> anyhow::Result<()> {
    let descriptor = super::load(&args.file)?;
    let plan = resolve_plan(&descriptor, config)?;

    println!("Launch Plan for: {}", args.file.display());
    println!("{}", output::rule(35));
    println!();

    for spec in &plan {
        println!("  + {}", spec.name);
        if let Some(ref dir) = spec.working_dir {
            println!("      cwd: {}", dir.display());
        }
        for step in &spec.setup {
            println!("      setup: {step}");
        }
        match spec.command {
            Some(ref command) => println!("      run: {command}"),
            None => println!("      run: (no process)"),
        }
        for endpoint in &spec.endpoints {
            println!("      endpoint: {}", output::endpoint_line(endpoint));
        }
        if !spec.waits_for.is_empty() {
            let waits: Vec<&str> = spec.waits_for.iter().map(ResourceName::as_str).collect();
            println!("      waits for: {}", waits.join(", "));
        }
        if args.env {
            for (key, value) in &spec.env {
                println!("      env: {key}={value}");
            }
        }
    }

    println!();
    println!("  {} will be started.", output::count(plan.len(), "resource"));

    let references: Vec<_> = descriptor
        .edges()
        .iter()
        .filter(|e| e.mode.reference)
        .collect();
    if !references.is_empty() {
        println!();
        println!("  References:");
        for edge in references {
            println!("    {} -> {}", edge.consumer, edge.provider);
        }
    }

    Ok(())
}
