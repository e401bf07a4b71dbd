//! Read-only HTTP front end.
//!
//! Serves the device info and the recorded samples as JSON. Every request goes
//! through the shared [`SafeClient`] on a blocking thread, so HTTP callers queue
//! up behind each other exactly like threads of a local program would.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use templog_lib::{
    protocol::{DeviceInfo, Sample},
    safe_client::SafeClient,
    transport::Transport,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address the server listens on.
    pub bind: SocketAddr,
    /// Station to read samples from, the one reported by the device if absent.
    pub station: Option<u8>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            station: None,
        }
    }
}

impl HttpConfig {
    pub const DEFAULT_CONFIG_FILE: &'static str = "templog_http.yml";

    /// Loads the configuration from `path`, or the defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                "No HTTP configuration at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path)
            .with_context(|| format!("Cannot open HTTP configuration {}", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("Cannot parse HTTP configuration {}", path.display()))
    }
}

#[derive(Debug)]
pub enum ApiError {
    /// The logger did not answer.
    NoResponse(String),
    /// The logger answered with something unusable.
    Device(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NoResponse(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            ApiError::Device(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<templog_lib::Error> for ApiError {
    fn from(err: templog_lib::Error) -> Self {
        if err.is_no_response() {
            ApiError::NoResponse(err.to_string())
        } else {
            ApiError::Device(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

pub struct AppState<T> {
    pub client: SafeClient<T>,
    pub station: Option<u8>,
}

impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            station: self.station,
        }
    }
}

pub fn create_router<T>(state: AppState<T>) -> Router
where
    T: Transport + Send + 'static,
{
    Router::new()
        .route("/device-info", get(device_info::<T>))
        .route("/samples", get(samples::<T>))
        .with_state(state)
}

async fn device_info<T>(State(state): State<AppState<T>>) -> Result<Json<DeviceInfo>, ApiError>
where
    T: Transport + Send + 'static,
{
    let client = state.client.clone();
    let info = tokio::task::spawn_blocking(move || client.read_device_info()).await??;
    Ok(Json(info))
}

async fn samples<T>(State(state): State<AppState<T>>) -> Result<Json<Vec<Sample>>, ApiError>
where
    T: Transport + Send + 'static,
{
    let client = state.client.clone();
    let station = state.station;
    let samples = tokio::task::spawn_blocking(move || {
        let station = match station {
            Some(station) => station,
            None => client.read_device_info()?.station_number,
        };
        client.fetch_samples(station)
    })
    .await??;
    debug!("Serving {} samples", samples.len());
    Ok(Json(samples))
}

/// Serves the API on `config.bind` until the process is stopped.
pub async fn serve<T>(client: SafeClient<T>, config: &HttpConfig) -> Result<()>
where
    T: Transport + Send + 'static,
{
    let app = create_router(AppState {
        client,
        station: config.station,
    });
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Cannot listen on {}", config.bind))?;
    info!("Serving HTTP on {}", config.bind);
    axum::serve(listener, app)
        .await
        .context("HTTP server stopped")
}
