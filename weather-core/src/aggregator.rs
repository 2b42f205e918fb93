//! Combines several providers into one reading.

use async_trait::async_trait;

use crate::{
    Config, Kelvin, WeatherError,
    provider::{TemperatureProvider, providers_from_config},
};

/// An ordered, non-empty set of providers queried one after another.
///
/// The result is the mean of the readings that succeeded. Failed providers
/// are skipped; when none succeeds the call fails with
/// [`WeatherError::NoData`].
#[derive(Debug)]
pub struct MultiProvider {
    providers: Vec<Box<dyn TemperatureProvider>>,
}

impl MultiProvider {
    pub fn new(providers: Vec<Box<dyn TemperatureProvider>>) -> Result<Self, WeatherError> {
        if providers.is_empty() {
            return Err(WeatherError::NoProviders);
        }

        Ok(Self { providers })
    }

    /// Build from every provider that has an API key in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(providers_from_config(config)?)?)
    }

    pub fn providers(&self) -> impl Iterator<Item = &dyn TemperatureProvider> {
        self.providers.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always false; construction rejects an empty set.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl TemperatureProvider for MultiProvider {
    fn name(&self) -> &str {
        "multi"
    }

    async fn temperature(&self, city: &str) -> Result<Kelvin, WeatherError> {
        let mut readings = Vec::with_capacity(self.providers.len());
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.temperature(city).await {
                Ok(kelvin) => readings.push(kelvin),
                Err(err) => {
                    tracing::warn!(provider = provider.name(), city, error = %err, "provider failed");
                    failures.push(err);
                }
            }
        }

        match Kelvin::mean(&readings) {
            Some(mean) => {
                tracing::debug!(
                    city,
                    used = readings.len(),
                    failed = failures.len(),
                    kelvin = mean.value(),
                    "aggregated temperature"
                );
                Ok(mean)
            }
            None => Err(WeatherError::NoData { city: city.to_string(), failures }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Fixed(&'static str, f64);

    #[async_trait]
    impl TemperatureProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn temperature(&self, _city: &str) -> Result<Kelvin, WeatherError> {
            Ok(Kelvin(self.1))
        }
    }

    #[derive(Debug)]
    struct Failing(&'static str);

    #[async_trait]
    impl TemperatureProvider for Failing {
        fn name(&self) -> &str {
            self.0
        }

        async fn temperature(&self, _city: &str) -> Result<Kelvin, WeatherError> {
            let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
            Err(WeatherError::Decode { provider: self.0.to_string(), source })
        }
    }

    /// Records which city it was asked for, and when.
    #[derive(Debug)]
    struct Recording {
        name: &'static str,
        calls: Arc<Mutex<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl TemperatureProvider for Recording {
        fn name(&self) -> &str {
            self.name
        }

        async fn temperature(&self, city: &str) -> Result<Kelvin, WeatherError> {
            self.calls.lock().unwrap().push((self.name.to_string(), city.to_string()));
            Ok(Kelvin(280.0))
        }
    }

    #[tokio::test]
    async fn averages_two_providers() {
        let multi = MultiProvider::new(vec![
            Box::new(Fixed("a", 288.0)),
            Box::new(Fixed("b", 290.0)),
        ])
        .unwrap();

        assert_eq!(multi.temperature("London").await.unwrap(), Kelvin(289.0));
    }

    #[tokio::test]
    async fn skips_failed_provider() {
        let multi = MultiProvider::new(vec![
            Box::new(Failing("broken")),
            Box::new(Fixed("ok", 300.0)),
        ])
        .unwrap();

        assert_eq!(multi.temperature("Lima").await.unwrap(), Kelvin(300.0));
    }

    #[tokio::test]
    async fn single_failing_provider_is_no_data() {
        let multi = MultiProvider::new(vec![Box::new(Failing("broken"))]).unwrap();

        let err = multi.temperature("Oslo").await.unwrap_err();
        match err {
            WeatherError::NoData { city, failures } => {
                assert_eq!(city, "Oslo");
                assert_eq!(failures.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn all_failed_reports_each_provider() {
        let multi =
            MultiProvider::new(vec![Box::new(Failing("first")), Box::new(Failing("second"))])
                .unwrap();

        let msg = multi.temperature("Oslo").await.unwrap_err().to_string();
        assert!(msg.contains("first:"));
        assert!(msg.contains("second:"));
    }

    #[test]
    fn empty_set_is_rejected() {
        let err = MultiProvider::new(Vec::new()).unwrap_err();
        assert!(matches!(err, WeatherError::NoProviders));
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let multi = MultiProvider::new(vec![
            Box::new(Fixed("a", 271.3)),
            Box::new(Fixed("b", 299.9)),
        ])
        .unwrap();

        let first = multi.temperature("Quito").await.unwrap();
        for _ in 0..5 {
            assert_eq!(multi.temperature("Quito").await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn queries_in_order_with_untouched_city() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recording = |name| Recording { name, calls: calls.clone() };

        let multi =
            MultiProvider::new(vec![Box::new(recording("one")), Box::new(recording("two"))])
                .unwrap();

        multi.temperature("  new york ").await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            [
                ("one".to_string(), "  new york ".to_string()),
                ("two".to_string(), "  new york ".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn nested_aggregators_compose() {
        let inner = MultiProvider::new(vec![
            Box::new(Fixed("a", 280.0)),
            Box::new(Fixed("b", 290.0)),
        ])
        .unwrap();
        let outer = MultiProvider::new(vec![Box::new(inner), Box::new(Fixed("c", 295.0))]).unwrap();

        assert_eq!(outer.len(), 2);
        assert_eq!(outer.temperature("Rome").await.unwrap(), Kelvin(290.0));
    }
}
