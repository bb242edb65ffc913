//! # apphost-forecast
//!
//! The starter frontend's one round trip: fetch `GET /api/weatherforecast`
//! from the backend resource and render the result as a table.
//!
//! - [`Forecast`](model::Forecast): wire type of one forecast entry.
//! - [`ForecastSource`](client::ForecastSource): where forecasts come from;
//!   [`HttpForecastSource`](client::HttpForecastSource) talks to the backend.
//! - [`ForecastView`](view::ForecastView): loading / loaded / error state and
//!   its HTML and text renderings.

pub mod client;
pub mod model;
pub mod view;
