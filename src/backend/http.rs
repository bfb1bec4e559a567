use std::time::Duration;

use log::{debug, error, info};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};

use crate::errors::{AuthError, ConsoleError};

use super::{
    COUNT_PATH, DockBackend, LOGIN_PATH, START_PATH, STOP_PATH, UPDATE_TRUCK_PATH, YOUTUBE_PATH,
    classify_login_response, parse_count, parse_youtube_url,
};

const CONNECT_TIMEOUT_S: u64 = 10;
// tunnelled deployments serve an interstitial page unless this is set
const NGROK_SKIP_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

/// [`DockBackend`] over HTTP.
///
/// A missing base URL is a configuration error that every call reports
/// instead of panicking.
pub struct HttpBackend {
    http: Client,
    base_url: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: Option<String>, request_timeout: Duration) -> Result<Self, ConsoleError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_S))
            .build()
            .map_err(|e| ConsoleError::HttpClientError { source: e })?;
        Ok(Self::with_client(http, base_url))
    }

    /// Use an already configured client. The base URL is trimmed and a
    /// trailing `/` dropped; a blank URL counts as missing.
    pub fn with_client(http: Client, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        match &base_url {
            Some(url) => info!("Using dock backend at {}", url),
            None => error!("API base URL is not set, backend calls will fail until it is configured"),
        }

        Self { http, base_url }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    fn url(&self, path: &str) -> Result<String, ConsoleError> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}{}", base, path))
            .ok_or(ConsoleError::MissingApiBaseUrl)
    }

    fn authorized(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, bearer_header_value(token))
            .header(NGROK_SKIP_WARNING_HEADER, "true")
    }

    fn send(&self, path: &str, builder: RequestBuilder) -> Result<Response, ConsoleError> {
        builder.send().map_err(|e| ConsoleError::RequestFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Authenticated GET returning the body of a 2xx response.
    fn get_ok(&self, path: &str, token: &str) -> Result<String, ConsoleError> {
        let request = self.authorized(self.http.get(self.url(path)?), token);
        let response = self.send(path, request)?;
        let status = response.status();
        debug!("GET {} -> {}", path, status);
        if !status.is_success() {
            return Err(ConsoleError::UnexpectedStatus {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(|e| ConsoleError::RequestFailed {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// `Authorization` header value. Requests without a token still carry the
/// header, with an empty value.
pub(crate) fn bearer_header_value(token: &str) -> String {
    if token.is_empty() {
        String::new()
    } else {
        format!("Bearer {}", token)
    }
}

impl DockBackend for HttpBackend {
    fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let url = self.url(LOGIN_PATH).map_err(|_| AuthError::EndpointNotFound)?;
        let response = self
            .http
            .post(url)
            .header(NGROK_SKIP_WARNING_HEADER, "true")
            .form(&[("username", username), ("password", password)])
            .send()
            .map_err(|e| AuthError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| AuthError::NetworkError {
            message: e.to_string(),
        })?;
        classify_login_response(status, &body)
    }

    fn update_truck(&self, token: &str, truck_number: &str) -> Result<(), ConsoleError> {
        let request = self
            .authorized(self.http.put(self.url(UPDATE_TRUCK_PATH)?), token)
            .json(&json!({ "truck_number": truck_number }));
        let response = self.send(UPDATE_TRUCK_PATH, request)?;
        let status = response.status();
        debug!("PUT {} -> {}", UPDATE_TRUCK_PATH, status);
        if status.is_success() {
            Ok(())
        } else {
            Err(ConsoleError::UnexpectedStatus {
                path: UPDATE_TRUCK_PATH.to_string(),
                status: status.as_u16(),
            })
        }
    }

    fn start_recording(&self, token: &str) -> Result<Value, ConsoleError> {
        let body = self.get_ok(START_PATH, token)?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    fn stop_recording(&self, token: &str) -> Result<Value, ConsoleError> {
        let body = self.get_ok(STOP_PATH, token)?;
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    fn count(&self, token: &str) -> Result<u64, ConsoleError> {
        let body = self.get_ok(COUNT_PATH, token)?;
        parse_count(&body).ok_or_else(|| ConsoleError::RequestFailed {
            path: COUNT_PATH.to_string(),
            reason: format!("missing count in response: {}", body),
        })
    }

    fn youtube_url(&self, token: &str) -> Result<Option<String>, ConsoleError> {
        let body = self.get_ok(YOUTUBE_PATH, token)?;
        Ok(parse_youtube_url(&body))
    }
}
