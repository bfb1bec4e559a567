// Scripted backend for exercising the console without a network

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::backend::{
    COUNT_PATH, DockBackend, LOGIN_PATH, START_PATH, STOP_PATH, UPDATE_TRUCK_PATH, YOUTUBE_PATH,
};
use crate::errors::{AuthError, ConsoleError};

pub const FAKE_TOKEN: &str = "fake-token";

#[derive(Default)]
struct FakeState {
    login_error: Option<AuthError>,
    update_status: Option<u16>,
    start_status: Option<u16>,
    stop_status: Option<u16>,
    count: Option<u64>,
    youtube_url: Option<String>,
    calls: HashMap<&'static str, usize>,
    tokens: Vec<String>,
}

/// In-memory [`DockBackend`] whose answers are scripted by the test.
///
/// Every endpoint succeeds by default, except `/count` which fails until a
/// count is set. `/youtube` has no link until told otherwise.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.state.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn record(&self, path: &'static str, token: Option<&str>) {
        self.with_state(|state| {
            *state.calls.entry(path).or_default() += 1;
            if let Some(token) = token {
                state.tokens.push(token.to_string());
            }
        });
    }

    fn status_result(path: &'static str, status: Option<u16>) -> Result<(), ConsoleError> {
        match status {
            None => Ok(()),
            Some(0) => Err(ConsoleError::RequestFailed {
                path: path.to_string(),
                reason: "connection refused".to_string(),
            }),
            Some(status) => Err(ConsoleError::UnexpectedStatus {
                path: path.to_string(),
                status,
            }),
        }
    }

    pub fn fail_login(&self, error: AuthError) {
        self.with_state(|state| state.login_error = Some(error));
    }

    /// Make `/update_truck` answer with `status`; 0 simulates a network failure.
    pub fn fail_update(&self, status: u16) {
        self.with_state(|state| state.update_status = Some(status));
    }

    pub fn fail_start(&self, status: u16) {
        self.with_state(|state| state.start_status = Some(status));
    }

    pub fn fail_stop(&self, status: u16) {
        self.with_state(|state| state.stop_status = Some(status));
    }

    pub fn set_count(&self, count: u64) {
        self.with_state(|state| state.count = Some(count));
    }

    pub fn fail_count(&self) {
        self.with_state(|state| state.count = None);
    }

    pub fn set_youtube_url(&self, url: &str) {
        self.with_state(|state| state.youtube_url = Some(url.to_string()));
    }

    /// Total number of requests issued
    pub fn calls(&self) -> usize {
        self.with_state(|state| state.calls.values().sum())
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.with_state(|state| state.calls.get(path).copied().unwrap_or(0))
    }

    /// Bearer tokens seen by authenticated endpoints, in call order
    pub fn tokens(&self) -> Vec<String> {
        self.with_state(|state| state.tokens.clone())
    }
}

impl DockBackend for FakeBackend {
    fn login(&self, _username: &str, _password: &str) -> Result<String, AuthError> {
        self.record(LOGIN_PATH, None);
        match self.with_state(|state| state.login_error.clone()) {
            Some(error) => Err(error),
            None => Ok(FAKE_TOKEN.to_string()),
        }
    }

    fn update_truck(&self, token: &str, _truck_number: &str) -> Result<(), ConsoleError> {
        self.record(UPDATE_TRUCK_PATH, Some(token));
        Self::status_result(UPDATE_TRUCK_PATH, self.with_state(|state| state.update_status))
    }

    fn start_recording(&self, token: &str) -> Result<Value, ConsoleError> {
        self.record(START_PATH, Some(token));
        Self::status_result(START_PATH, self.with_state(|state| state.start_status))?;
        Ok(json!({ "status": "started" }))
    }

    fn stop_recording(&self, token: &str) -> Result<Value, ConsoleError> {
        self.record(STOP_PATH, Some(token));
        Self::status_result(STOP_PATH, self.with_state(|state| state.stop_status))?;
        Ok(json!({ "status": "stopped" }))
    }

    fn count(&self, token: &str) -> Result<u64, ConsoleError> {
        self.record(COUNT_PATH, Some(token));
        self.with_state(|state| state.count)
            .ok_or(ConsoleError::UnexpectedStatus {
                path: COUNT_PATH.to_string(),
                status: 500,
            })
    }

    fn youtube_url(&self, token: &str) -> Result<Option<String>, ConsoleError> {
        self.record(YOUTUBE_PATH, Some(token));
        Ok(self.with_state(|state| state.youtube_url.clone()))
    }
}
