use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;

use crate::{Kelvin, WeatherError};

use super::{TemperatureProvider, build_url, fetch_json};

const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";
const CURRENT_PATH: &str = "/data/2.5/weather";

/// OpenWeatherMap current-weather endpoint. Reports Kelvin natively.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
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
            &[("APPID", self.api_key.as_str()), ("q", city)],
        )
    }
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

#[async_trait]
impl TemperatureProvider for OpenWeatherProvider {
    fn name(&self) -> &str {
        "openweather"
    }

    async fn temperature(&self, city: &str) -> Result<Kelvin, WeatherError> {
        let url = self.request_url(city)?;
        let parsed: OwCurrentResponse = fetch_json(&self.http, self.name(), url).await?;

        // Default unit system is already Kelvin.
        let kelvin = Kelvin(parsed.main.temp);

        tracing::info!(provider = self.name(), city, kelvin = kelvin.value(), "resolved temperature");
        Ok(kelvin)
    }
}
