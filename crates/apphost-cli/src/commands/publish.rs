//! `apphost publish` — Write the publish manifest of a composition.

use std::path::PathBuf;

use anyhow::Context;
use apphost_common::constants;
use clap::Args;

/// Arguments for the `publish` command.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Path to the composition manifest.
    #[arg(default_value = constants::DEFAULT_MANIFEST_FILE)]
    pub file: PathBuf,

    /// Where to write the JSON manifest.
    #[arg(short, long, default_value = constants::DEFAULT_PUBLISH_FILE)]
    pub output: PathBuf,
}

/// Executes the `publish` command.
///
/// # Errors
///
/// Returns an error if the manifest is invalid or the output cannot be written.
pub fn execute(args: &PublishArgs) -> anyhow::Result<()> {
    let descriptor = super::load(&args.file)?;
    let json = descriptor.to_json()?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let published = descriptor
        .resources()
        .iter()
        .filter(|r| r.publish.is_some())
        .count();
    println!("Published {} -> {}", args.file.display(), args.output.display());
    println!(
        "Resources: {} ({} with a publish target)",
        descriptor.len(),
        published
    );
    Ok(())
}
