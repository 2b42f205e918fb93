//! HTTP API
//!
//! `GET /` answers `Hola`; `GET /weather/{city}` reports the averaged
//! temperature of `city` as JSON.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Instant};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use weather_core::{TemperatureProvider, WeatherError, WeatherReport};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Shared state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn TemperatureProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn TemperatureProvider>) -> Self {
        Self { provider }
    }

    /// Resolve `city` and time how long it took.
    pub async fn report(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        let begin = Instant::now();
        let temp = self.provider.temperature(city).await?;
        Ok(WeatherReport::new(city, temp, begin.elapsed()))
    }
}

/// GET / - Greeting, also served for unknown paths
async fn hello() -> &'static str {
    "Hola"
}

/// GET /weather/{city} - Averaged temperature for a city
async fn weather(State(state): State<AppState>, Path(city): Path<String>) -> Response {
    respond(&state, &city).await
}

/// GET /weather/ - Same, with an empty city
async fn weather_without_city(State(state): State<AppState>) -> Response {
    respond(&state, "").await
}

async fn respond(state: &AppState, city: &str) -> Response {
    let report = match state.report(city).await {
        Ok(report) => report,
        Err(e) => return internal_error(e.to_string()),
    };

    match serde_json::to_string(&report) {
        Ok(mut body) => {
            body.push('\n');
            ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
        }
        Err(e) => internal_error(e.to_string()),
    }
}

fn internal_error(message: String) -> Response {
    tracing::error!(error = %message, "weather request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{message}\n")).into_response()
}

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/weather/", get(weather_without_city))
        .route("/weather/{*city}", get(weather))
        .fallback(hello)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `listen` and serve until `shutdown` resolves.
pub async fn run_http_server<F>(state: AppState, listen: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(listen).await?;
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
