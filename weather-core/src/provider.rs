use crate::{
    Config, Kelvin, WeatherError,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    /// Known providers, in the order they are queried.
    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }

    /// Environment variable that overrides the configured API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::WeatherApi => "WEATHERAPI_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" | "openweathermap" => Ok(ProviderId::OpenWeather),
            // WeatherAPI.com is the renamed Apixu service.
            "weatherapi" | "apixu" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

/// Something that can report the current temperature of a city.
#[async_trait]
pub trait TemperatureProvider: Send + Sync + Debug {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Current temperature of `city`, in Kelvin.
    ///
    /// The city is forwarded exactly as given.
    async fn temperature(&self, city: &str) -> Result<Kelvin, WeatherError>;
}

/// Shared HTTP client honouring the configured request timeout.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    Ok(builder.build()?)
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    http: &Client,
) -> anyhow::Result<Box<dyn TemperatureProvider>> {
    let provider_config = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather-server configure {id}` or set {}.",
            id.api_key_env()
        )
    })?;

    let api_key = provider_config.api_key.clone();
    let base_url = provider_config.base_url.clone();

    let boxed: Box<dyn TemperatureProvider> = match id {
        ProviderId::OpenWeather => {
            let mut p = OpenWeatherProvider::new(api_key).with_client(http.clone());
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Box::new(p)
        }
        ProviderId::WeatherApi => {
            let mut p = WeatherApiProvider::new(api_key).with_client(http.clone());
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Box::new(p)
        }
    };

    Ok(boxed)
}

/// Every configured provider, in `ProviderId::all()` order.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Vec<Box<dyn TemperatureProvider>>> {
    let http = http_client(config)?;

    let providers = ProviderId::all()
        .iter()
        .filter(|id| config.is_provider_configured(**id))
        .map(|id| provider_from_config(*id, config, &http))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if providers.is_empty() {
        return Err(anyhow::anyhow!(
            "No weather providers configured.\n\
             Hint: run `weather-server configure <provider>` (e.g. `weather-server configure openweather`) \
             or set OPENWEATHER_API_KEY / WEATHERAPI_API_KEY."
        ));
    }

    Ok(providers)
}

/// Joins `base_url` and `path`, then appends form-encoded query parameters.
pub(crate) fn build_url(
    provider: &str,
    base_url: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Url, WeatherError> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);

    Url::parse_with_params(&raw, params).map_err(|source| WeatherError::InvalidUrl {
        provider: provider.to_string(),
        base_url: base_url.to_string(),
        source,
    })
}

/// Issues one GET and decodes the JSON body into `T`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &Client,
    provider: &str,
    url: Url,
) -> Result<T, WeatherError> {
    // The URL carries the API key in its query string.
    let transport = |source: reqwest::Error| WeatherError::Transport {
        provider: provider.to_string(),
        source: source.without_url(),
    };

    let res = http.get(url).send().await.map_err(transport)?;

    let status = res.status();
    let body = res.text().await.map_err(transport)?;

    if !status.is_success() {
        return Err(WeatherError::Status {
            provider: provider.to_string(),
            status,
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body)
        .map_err(|source| WeatherError::Decode { provider: provider.to_string(), source })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
