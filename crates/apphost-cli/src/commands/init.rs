//! `apphost init` — Write a starter manifest.

use std::path::PathBuf;

use anyhow::Context;
use apphost_common::constants;
use apphost_compose::templates::Template;
use clap::Args;

/// Arguments for the `init` command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Template to start from (python-app, python-script, starter).
    #[arg(long, default_value = "starter")]
    pub template: Template,

    /// Where to write the manifest.
    #[arg(short, long, default_value = constants::DEFAULT_MANIFEST_FILE)]
    pub output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

/// Executes the `init` command.
///
/// # Errors
///
/// Returns an error if the output exists (without `--force`) or cannot be written.
pub fn execute(args: &InitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            args.output.display()
        );
    }

    let descriptor = args.template.build()?;
    let yaml = apphost_compose::manifest::to_yaml(&descriptor)?;
    std::fs::write(&args.output, yaml)
        .with_context(|| format!("writing {}", args.output.display()))?;

    tracing::info!(template = %args.template, path = %args.output.display(), "manifest written");
    println!(
        "Created {} from template '{}' ({})",
        args.output.display(),
        args.template,
        crate::output::count(descriptor.len(), "resource")
    );
    Ok(())
}
