// Error types for dockwatch

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum ConsoleError {
    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Session store errors
    #[snafu(display("Error accessing session file"))]
    SessionIOError { source: io::Error },
    #[snafu(display("Error serializing session"))]
    SessionSerializeError { source: serde_json::Error },

    // Backend client errors
    #[snafu(display("Could not build HTTP client"))]
    HttpClientError { source: reqwest::Error },
    #[snafu(display("API endpoint not configured"))]
    MissingApiBaseUrl,
    #[snafu(display("Request to {path} failed: {reason}"))]
    RequestFailed { path: String, reason: String },
    #[snafu(display("Unexpected response from {path}: HTTP {status}"))]
    UnexpectedStatus { path: String, status: u16 },
}

/// Login failures. The operator only ever sees whether the credentials were
/// wrong or something else failed; the detail is logged.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[snafu(display("Invalid username or password"))]
    InvalidCredentials,
    #[snafu(display("Login endpoint not found. Please check API URL."))]
    EndpointNotFound,
    #[snafu(display("Invalid response from server"))]
    MalformedResponse,
    #[snafu(display("Login failed: {message}"))]
    ServerError { message: String },
    #[snafu(display("Network error: {message}"))]
    NetworkError { message: String },
    #[snafu(display("Could not persist session: {reason}"))]
    SessionPersistence { reason: String },
}

impl AuthError {
    pub fn operator_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials.",
            _ => "Login failed. Please try again.",
        }
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum TruckError {
    #[snafu(display("Invalid truck number '{value}': expected exactly 4 digits"))]
    Validation { value: String },
    #[snafu(display("Truck update failed: {reason}"))]
    UpdateFailed { reason: String },
}

impl TruckError {
    pub fn operator_message(&self) -> &'static str {
        match self {
            TruckError::Validation { .. } => "Please enter the last 4 digits (e.g., 1234)",
            TruckError::UpdateFailed { .. } => "Failed to update truck on server.",
        }
    }
}

/// Failure of an operator action driven through the view controller.
#[derive(Debug, Snafu)]
pub enum ActionError {
    #[snafu(display("{source}"))]
    Auth { source: AuthError },
    #[snafu(display("{source}"))]
    Truck { source: TruckError },
    #[snafu(display("Session store error"))]
    Store { source: ConsoleError },
    #[snafu(display("Operation '{operation}' is not available in view {view}"))]
    InvalidTransition { operation: String, view: String },
}

impl ActionError {
    pub fn operator_message(&self) -> &'static str {
        match self {
            ActionError::Auth { source } => source.operator_message(),
            ActionError::Truck { source } => source.operator_message(),
            ActionError::Store { .. } => "Could not save the session. Please try again.",
            ActionError::InvalidTransition { .. } => "That action is not available right now.",
        }
    }
}
