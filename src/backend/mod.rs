pub mod http;

use serde_json::Value;

use crate::errors::{AuthError, ConsoleError};

pub use http::HttpBackend;

pub(crate) const LOGIN_PATH: &str = "/login";
pub(crate) const UPDATE_TRUCK_PATH: &str = "/update_truck";
pub(crate) const START_PATH: &str = "/start";
pub(crate) const STOP_PATH: &str = "/stop";
pub(crate) const COUNT_PATH: &str = "/count";
pub(crate) const YOUTUBE_PATH: &str = "/youtube";

/// The remote dock backend. Authentication, vision counting and video
/// ingestion all live behind this trait.
///
/// Each method performs a single request, there are no retries. Methods that
/// take a `token` authenticate with it as a bearer token; an empty token is
/// still sent.
pub trait DockBackend: Send + Sync {
    /// Exchange credentials for an access token
    fn login(&self, username: &str, password: &str) -> Result<String, AuthError>;

    /// Attach a truck number to the authenticated session
    fn update_truck(&self, token: &str, truck_number: &str) -> Result<(), ConsoleError>;

    /// Ask the backend to start recording and counting
    fn start_recording(&self, token: &str) -> Result<Value, ConsoleError>;

    /// Ask the backend to stop recording and counting
    fn stop_recording(&self, token: &str) -> Result<Value, ConsoleError>;

    /// Current computer vision unit count
    fn count(&self, token: &str) -> Result<u64, ConsoleError>;

    /// Link to the live camera feed, if the backend has one
    fn youtube_url(&self, token: &str) -> Result<Option<String>, ConsoleError>;
}

/// Map a `/login` response to a token or an [`AuthError`].
pub(crate) fn classify_login_response(status: u16, body: &str) -> Result<String, AuthError> {
    if (200..300).contains(&status) {
        let token = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| json.get("access_token").and_then(Value::as_str).map(String::from))
            .filter(|token| !token.is_empty());
        return token.ok_or(AuthError::MalformedResponse);
    }

    match status {
        401 => Err(AuthError::InvalidCredentials),
        404 => Err(AuthError::EndpointNotFound),
        _ => Err(AuthError::ServerError {
            message: login_error_message(body),
        }),
    }
}

/// Human readable message from an error body: `detail`, then `message`, then
/// the raw text.
fn login_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let field = ["detail", "message"]
            .iter()
            .filter_map(|key| json.get(*key))
            .find(|value| !value.is_null() && value.as_str() != Some(""));
        match field {
            Some(Value::String(message)) => return message.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }

    if body.trim().is_empty() {
        "Login failed".to_string()
    } else {
        body.to_string()
    }
}

/// Extract the `count` field from a `/count` body.
pub(crate) fn parse_count(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    let count = json.get("count")?;
    count
        .as_u64()
        .or_else(|| count.as_f64().filter(|c| *c >= 0.).map(|c| c as u64))
}

/// Extract the `youtube_url` field from a `/youtube` body.
pub(crate) fn parse_youtube_url(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("youtube_url")?
        .as_str()
        .filter(|url| !url.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_success_returns_token() {
        let token = classify_login_response(200, r#"{"access_token":"abc","token_type":"bearer"}"#);
        assert_eq!(token, Ok("abc".to_string()));
    }

    #[test]
    fn test_login_success_without_token_is_malformed() {
        assert_eq!(
            classify_login_response(200, r#"{"token_type":"bearer"}"#),
            Err(AuthError::MalformedResponse)
        );
        assert_eq!(
            classify_login_response(200, r#"{"access_token":""}"#),
            Err(AuthError::MalformedResponse)
        );
        assert_eq!(
            classify_login_response(200, "<html>tunnel page</html>"),
            Err(AuthError::MalformedResponse)
        );
    }

    #[test]
    fn test_login_status_mapping() {
        assert_eq!(classify_login_response(401, ""), Err(AuthError::InvalidCredentials));
        assert_eq!(classify_login_response(404, "Not Found"), Err(AuthError::EndpointNotFound));
    }

    #[test]
    fn test_login_server_error_message_fallbacks() {
        assert_eq!(
            classify_login_response(500, r#"{"detail":"database down"}"#),
            Err(AuthError::ServerError {
                message: "database down".to_string()
            })
        );
        assert_eq!(
            classify_login_response(503, r#"{"message":"maintenance"}"#),
            Err(AuthError::ServerError {
                message: "maintenance".to_string()
            })
        );
        assert_eq!(
            classify_login_response(502, "Bad Gateway"),
            Err(AuthError::ServerError {
                message: "Bad Gateway".to_string()
            })
        );
        assert_eq!(
            classify_login_response(500, ""),
            Err(AuthError::ServerError {
                message: "Login failed".to_string()
            })
        );
    }

    #[test]
    fn test_login_structured_detail_is_kept() {
        let result = classify_login_response(422, r#"{"detail":[{"msg":"field required"}]}"#);
        match result {
            Err(AuthError::ServerError { message }) => assert!(message.contains("field required")),
            other => panic!("Expected ServerError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(r#"{"count": 17}"#), Some(17));
        assert_eq!(parse_count(r#"{"count": 3.0}"#), Some(3));
        assert_eq!(parse_count(r#"{"count": -1}"#), None);
        assert_eq!(parse_count(r#"{"total": 4}"#), None);
        assert_eq!(parse_count("oops"), None);
    }

    #[test]
    fn test_parse_youtube_url() {
        assert_eq!(
            parse_youtube_url(r#"{"youtube_url":"https://youtu.be/xyz"}"#),
            Some("https://youtu.be/xyz".to_string())
        );
        assert_eq!(parse_youtube_url(r#"{"youtube_url":null}"#), None);
        assert_eq!(parse_youtube_url(r#"{"youtube_url":""}"#), None);
    }
}
