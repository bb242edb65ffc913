//! Fetch-state view of the forecast.
//!
//! Mirrors the starter frontend component: a loading flag, a single error
//! message, or the rows of the last successful fetch. Nothing retries on
//! its own; callers refresh explicitly.

use std::fmt::Write as _;

use crate::client::ForecastSource;
use crate::model::Forecast;

/// Column headers shared by both renderings.
const HEADERS: [&str; 4] = ["Date", "Temp. (C)", "Temp. (F)", "Summary"];

/// Where the view is in its fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// A fetch is in flight (or none has completed yet).
    Loading,
    /// The last fetch succeeded.
    Loaded(Vec<Forecast>),
    /// The last fetch failed with this message.
    Failed(String),
}

/// Forecast table with its fetch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastView {
    state: ViewState,
}

impl ForecastView {
    /// Creates a view that has not fetched yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ViewState::Loading,
        }
    }

    /// Fetches from `source`, replacing the previous rows or error.
    ///
    /// The fetch blocks; the previous state stays in place until it returns.
    pub fn refresh(&mut self, source: &dyn ForecastSource) {
        self.state = match source.fetch() {
            Ok(forecasts) => ViewState::Loaded(forecasts),
            Err(e) => {
                tracing::warn!(error = %e, "forecast refresh failed");
                ViewState::Failed(e.to_string())
            }
        };
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    /// Returns `true` while no fetch has completed.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading)
    }

    /// Error message of the last fetch, if it failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Table cells, one row per forecast. Empty unless loaded.
    #[must_use]
    pub fn rows(&self) -> Vec<[String; 4]> {
        let ViewState::Loaded(forecasts) = &self.state else {
            return Vec::new();
        };
        forecasts
            .iter()
            .map(|f| {
                [
                    f.day().to_string(),
                    format!("{}°C", f.temperature_c),
                    format!("{}°F", f.temperature_f),
                    f.summary.clone(),
                ]
            })
            .collect()
    }

    /// Renders the component as an HTML fragment.
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut out = String::from("<section class=\"weather\">\n<h2>Weather Forecast</h2>\n");
        match &self.state {
            ViewState::Loading => out.push_str("<p class=\"loading\">Loading...</p>\n"),
            ViewState::Failed(message) => {
                let _ = writeln!(out, "<p class=\"error\">Error: {}</p>", escape(message));
            }
            ViewState::Loaded(_) => {
                out.push_str("<table>\n<thead><tr>");
                for header in HEADERS {
                    let _ = write!(out, "<th>{header}</th>");
                }
                out.push_str("</tr></thead>\n<tbody>\n");
                for row in self.rows() {
                    out.push_str("<tr>");
                    for cell in &row {
                        let _ = write!(out, "<td>{}</td>", escape(cell));
                    }
                    out.push_str("</tr>\n");
                }
                out.push_str("</tbody>\n</table>\n");
            }
        }
        out.push_str("</section>\n");
        out
    }

    /// Renders the component as a plain-text table for terminals.
    #[must_use]
    pub fn render_text(&self) -> String {
        match &self.state {
            ViewState::Loading => "Loading...\n".to_string(),
            ViewState::Failed(message) => format!("Error: {message}\n"),
            ViewState::Loaded(_) => {
                let rows = self.rows();
                let mut widths = HEADERS.map(|h| h.chars().count());
                for row in &rows {
                    for (width, cell) in widths.iter_mut().zip(row) {
                        *width = (*width).max(cell.chars().count());
                    }
                }
                let mut out = String::new();
                push_text_row(&mut out, &HEADERS, &widths);
                let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                push_text_row(&mut out, &rule, &widths);
                for row in &rows {
                    push_text_row(&mut out, row, &widths);
                }
                out
            }
        }
    }
}

impl Default for ForecastView {
    fn default() -> Self {
        Self::new()
    }
}

fn push_text_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize; 4]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref()))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
