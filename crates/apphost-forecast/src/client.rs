//! Fetching forecasts from the backend resource.

use std::time::Duration;

use apphost_common::constants::FORECAST_PATH;
use thiserror::Error;

use crate::model::Forecast;

/// Why a fetch produced no forecasts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The backend answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    Status(u16),
    /// The request never got a response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The response body was not a forecast list.
    #[error("invalid forecast payload: {0}")]
    Decode(String),
}

/// Something that can produce the current forecast.
pub trait ForecastSource {
    /// Fetches the forecast list.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing why no forecasts were produced.
    fn fetch(&self) -> Result<Vec<Forecast>, FetchError>;
}

/// Fetches forecasts over HTTP from `<base>/api/weatherforecast`.
#[derive(Debug, Clone)]
pub struct HttpForecastSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpForecastSource {
    /// Request timeout applied to every fetch.
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a source for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be created.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: forecast_url(base_url),
        })
    }

    /// Full URL fetched by this source.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ForecastSource for HttpForecastSource {
    fn fetch(&self) -> Result<Vec<Forecast>, FetchError> {
        tracing::info!(url = %self.url, "fetching forecast");
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "forecast request failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        let forecasts: Vec<Forecast> = response
            .json()
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        tracing::debug!(count = forecasts.len(), "forecast received");
        Ok(forecasts)
    }
}

/// Joins a base URL and the forecast path.
#[must_use]
pub fn forecast_url(base_url: &str) -> String {
    format!("{}{FORECAST_PATH}", base_url.trim_end_matches('/'))
}
