//! `apphost forecast` — Fetch and print the backend's forecast.

use apphost_common::constants;
use apphost_forecast::client::HttpForecastSource;
use apphost_forecast::view::ForecastView;
use clap::Args;

/// Arguments for the `forecast` command.
#[derive(Args, Debug)]
pub struct ForecastArgs {
    /// Base URL of the backend resource.
    #[arg(long, env = "APPHOST_BACKEND_URL", default_value = constants::DEFAULT_BACKEND_URL)]
    pub url: String,

    /// Print an HTML fragment instead of a text table.
    #[arg(long)]
    pub html: bool,
}

/// Executes the `forecast` command.
///
/// # Errors
///
/// Returns an error if the fetch fails; the message is the one the view shows.
pub fn execute(args: &ForecastArgs) -> anyhow::Result<()> {
    let source = HttpForecastSource::new(&args.url)?;
    let mut view = ForecastView::new();
    view.refresh(&source);

    if let Some(message) = view.error() {
        anyhow::bail!("{message} ({})", source.url());
    }
    if args.html {
        print!("{}", view.render_html());
    } else {
        print!("{}", view.render_text());
    }
    Ok(())
}
