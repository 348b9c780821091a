//! Client for the measurement API.

use crate::{ProbeError, Result};
use async_trait::async_trait;
use probe_types::{ErrorResponse, Measurement, MeasurementCreate, MeasurementCreateResponse};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, trace};

/// Default endpoint of the measurement API.
pub const DEFAULT_API_URL: &str = "https://api.globalping.io/v1";

/// Remote measurement service.
#[async_trait]
pub trait MeasurementClient: Send + Sync {
    /// Submit a new measurement.
    ///
    /// Failures are [`ProbeError::Api`] with `show_help` set for usage errors
    /// (rejected parameters) and cleared for everything the user cannot fix
    /// by changing the command.
    async fn create_measurement(
        &self,
        request: &MeasurementCreate,
    ) -> Result<MeasurementCreateResponse>;

    /// Fetch the current state of a measurement. A measurement without
    /// results yet has an empty result list.
    async fn get_measurement(&self, id: &str) -> Result<Measurement>;
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// `reqwest` implementation of [`MeasurementClient`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("probe-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl MeasurementClient for HttpClient {
    async fn create_measurement(
        &self,
        request: &MeasurementCreate,
    ) -> Result<MeasurementCreateResponse> {
        debug!(target: "probe::client", "Creating {} measurement for {}", request.kind, request.target);

        let response = self
            .request(reqwest::Method::POST, "/measurements")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(create_error(status, &body));
        }

        let created: MeasurementCreateResponse = response.json().await?;
        debug!(target: "probe::client", "Created measurement {} ({} probes)", created.id, created.probes_count);
        Ok(created)
    }

    async fn get_measurement(&self, id: &str) -> Result<Measurement> {
        let response = self
            .request(reqwest::Method::GET, &format!("/measurements/{}", id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(poll_error(status, &body));
        }

        let measurement: Measurement = response.json().await?;
        trace!(
            target: "probe::client",
            "Measurement {} is {:?} with {} results",
            id,
            measurement.status,
            measurement.results.len()
        );
        Ok(measurement)
    }
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|response| response.error.describe())
}

fn fatal(message: impl Into<String>) -> ProbeError {
    ProbeError::Api {
        message: message.into(),
        show_help: false,
    }
}

fn create_error(status: StatusCode, body: &str) -> ProbeError {
    match status {
        StatusCode::BAD_REQUEST => ProbeError::Api {
            message: format!(
                "invalid parameters: {}",
                error_message(body).unwrap_or_else(|| "request rejected".to_string())
            ),
            show_help: true,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => fatal(format!(
            "unauthorized: {}",
            error_message(body).unwrap_or_else(|| "check your API token".to_string())
        )),
        StatusCode::UNPROCESSABLE_ENTITY => {
            fatal("no suitable probes found - please choose a different location")
        }
        StatusCode::TOO_MANY_REQUESTS => fatal("rate limit exceeded - please try again later"),
        s if s.is_server_error() => fatal(format!(
            "internal server error ({}) - please try again later",
            s.as_u16()
        )),
        s => fatal(error_message(body).unwrap_or_else(|| format!("unexpected response status {}", s))),
    }
}

fn poll_error(status: StatusCode, body: &str) -> ProbeError {
    match status {
        StatusCode::NOT_FOUND => fatal("measurement not found"),
        StatusCode::TOO_MANY_REQUESTS => fatal("rate limit exceeded - please try again later"),
        s if s.is_server_error() => fatal(format!(
            "internal server error ({}) - please try again later",
            s.as_u16()
        )),
        s => fatal(error_message(body).unwrap_or_else(|| format!("unexpected response status {}", s))),
    }
}
