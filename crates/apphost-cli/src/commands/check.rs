//! `apphost check` — Validate a composition manifest.

use std::path::PathBuf;

use apphost_common::constants;
use apphost_common::types::ResourceName;
use clap::Args;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the composition manifest.
    #[arg(default_value = constants::DEFAULT_MANIFEST_FILE)]
    pub file: PathBuf,
}

/// Executes the `check` command.
///
/// All violations are reported together in the returned error.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or is invalid.
pub fn execute(args: &CheckArgs) -> anyhow::Result<()> {
    let descriptor = super::load(&args.file)?;
    let order: Vec<&str> = descriptor
        .start_order()
        .iter()
        .map(ResourceName::as_str)
        .collect();

    println!(
        "{}: ok, {} and {}",
        args.file.display(),
        crate::output::count(descriptor.len(), "resource"),
        crate::output::count(descriptor.edges().len(), "edge"),
    );
    println!("start order: {}", order.join(" -> "));
    Ok(())
}
