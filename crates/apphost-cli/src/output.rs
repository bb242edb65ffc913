//! Formatted output helpers for CLI commands.

use apphost_compose::resolver::BoundEndpoint;

/// Horizontal rule of `width` box-drawing characters.
#[must_use]
pub fn rule(width: usize) -> String {
    "\u{2550}".repeat(width)
}

/// `n` followed by `noun`, pluralized with a trailing `s`.
#[must_use]
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// One-line summary of a bound endpoint.
#[must_use]
pub fn endpoint_line(endpoint: &BoundEndpoint) -> String {
    let scope = if endpoint.external { "external" } else { "internal" };
    format!("{} {} ({scope})", endpoint.name, endpoint.url)
}
