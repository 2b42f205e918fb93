//! Errors produced while resolving a temperature.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{provider}: request failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: request failed with status {status}: {body}")]
    Status {
        provider: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{provider}: unexpected response body: {source}")]
    Decode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider}: invalid base url '{base_url}': {source}")]
    InvalidUrl {
        provider: String,
        base_url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no weather providers configured")]
    NoProviders,

    #[error("no provider returned a temperature for '{city}' ({})", describe_failures(.failures))]
    NoData {
        city: String,
        failures: Vec<WeatherError>,
    },
}

fn describe_failures(failures: &[WeatherError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
