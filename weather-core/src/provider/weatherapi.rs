use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;

use crate::{Kelvin, WeatherError};

use super::{TemperatureProvider, build_url, fetch_json};

// Formerly api.apixu.com.
const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";
const CURRENT_PATH: &str = "/v1/current.json";

/// WeatherAPI.com current conditions. Reports Celsius, converted to Kelvin.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn request_url(&self, city: &str) -> Result<Url, WeatherError> {
        build_url(
            self.name(),
            &self.base_url,
            CURRENT_PATH,
            &[("key", self.api_key.as_str()), ("q", city)],
        )
    }
}

impl fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

#[async_trait]
impl TemperatureProvider for WeatherApiProvider {
    fn name(&self) -> &str {
        "weatherapi"
    }

    async fn temperature(&self, city: &str) -> Result<Kelvin, WeatherError> {
        let url = self.request_url(city)?;
        tracing::debug!(provider = self.name(), path = url.path(), "requesting current conditions");

        let parsed: WaResponse = fetch_json(&self.http, self.name(), url).await?;
        let kelvin = Kelvin::from_celsius(parsed.current.temp_c);

        tracing::info!(provider = self.name(), city, kelvin = kelvin.value(), "resolved temperature");
        Ok(kelvin)
    }
}
