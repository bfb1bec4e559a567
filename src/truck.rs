use std::sync::Arc;

use log::{error, info, warn};

use crate::backend::DockBackend;
use crate::errors::{ConsoleError, TruckError};
use crate::session::{SessionPatch, SessionStore};

/// Truck numbers are the last 4 digits of the plate.
pub const TRUCK_NUMBER_LEN: usize = 4;

pub fn is_valid_truck_number(value: &str) -> bool {
    value.len() == TRUCK_NUMBER_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// Keep only digits and cap the input at [`TRUCK_NUMBER_LEN`] characters, the
/// way the entry field filters keystrokes.
pub fn sanitize_truck_input(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(TRUCK_NUMBER_LEN)
        .collect()
}

/// Associates the logged in session with the truck being unloaded.
pub struct TruckRegistry {
    backend: Arc<dyn DockBackend>,
    store: Arc<dyn SessionStore>,
}

impl TruckRegistry {
    pub fn new(backend: Arc<dyn DockBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self { backend, store }
    }

    /// Register the truck with the backend. Malformed numbers are rejected
    /// before any request; the number is persisted only once the backend
    /// acknowledged it.
    pub fn register_truck(&self, truck_number: &str) -> Result<(), TruckError> {
        if !is_valid_truck_number(truck_number) {
            warn!("Rejecting truck number '{}'", truck_number);
            return Err(TruckError::Validation {
                value: truck_number.to_string(),
            });
        }

        let session = self.store.load().map_err(update_failed)?;
        self.backend
            .update_truck(session.bearer_token(), truck_number)
            .map_err(|e| {
                error!("Update truck error: {}", e);
                update_failed(e)
            })?;

        self.store
            .save(SessionPatch::truck(truck_number))
            .map_err(update_failed)?;
        info!("Truck {} registered", truck_number);
        Ok(())
    }

    /// Stop tracking the current truck, keeping the operator logged in.
    pub fn forget_truck(&self) -> Result<(), ConsoleError> {
        self.store.save(SessionPatch::forget_truck())
    }
}

fn update_failed(e: ConsoleError) -> TruckError {
    TruckError::UpdateFailed {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, Session};
    use crate::test_support::FakeBackend;
    use proptest::prelude::*;

    fn logged_in_store() -> Arc<MemorySessionStore> {
        Arc::new(MemorySessionStore::with_session(Session {
            user: Some("op-7".to_string()),
            token: Some("tok".to_string()),
            truck_number: None,
        }))
    }

    #[test]
    fn test_sanitize_truck_input() {
        assert_eq!(sanitize_truck_input("12a4"), "124");
        assert_eq!(sanitize_truck_input("KA-01-9876"), "0198");
        assert_eq!(sanitize_truck_input(""), "");
    }

    #[test]
    fn test_register_persists_after_success() {
        let backend = Arc::new(FakeBackend::default());
        let store = logged_in_store();
        let registry = TruckRegistry::new(backend.clone(), store.clone());

        registry.register_truck("1234").unwrap();
        assert_eq!(store.load().unwrap().truck_number.as_deref(), Some("1234"));
        assert_eq!(backend.tokens(), vec!["tok".to_string()]);
    }

    #[test]
    fn test_rejected_update_is_not_persisted() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_update(500);
        let store = logged_in_store();
        let registry = TruckRegistry::new(backend.clone(), store.clone());

        assert!(matches!(
            registry.register_truck("1234"),
            Err(TruckError::UpdateFailed { .. })
        ));
        assert_eq!(store.load().unwrap().truck_number, None);
    }

    #[test]
    fn test_network_failure_is_update_error() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_update(0);
        let registry = TruckRegistry::new(backend, logged_in_store());
        assert!(matches!(
            registry.register_truck("0001"),
            Err(TruckError::UpdateFailed { .. })
        ));
    }

    #[test]
    fn test_forget_truck_keeps_user() {
        let backend = Arc::new(FakeBackend::default());
        let store = logged_in_store();
        let registry = TruckRegistry::new(backend, store.clone());
        registry.register_truck("1234").unwrap();

        registry.forget_truck().unwrap();
        let session = store.load().unwrap();
        assert_eq!(session.truck_number, None);
        assert_eq!(session.user.as_deref(), Some("op-7"));
    }

    #[test]
    fn test_known_inputs() {
        for (input, expect_request) in [
            ("1234", true),
            ("12a4", false),
            ("123", false),
            ("12345", false),
            (" 1234", false),
        ] {
            let backend = Arc::new(FakeBackend::default());
            let registry = TruckRegistry::new(backend.clone(), logged_in_store());
            let _ = registry.register_truck(input);
            assert_eq!(backend.calls() == 1, expect_request, "input {:?}", input);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_network_called_iff_four_digits(input in "\\PC{0,6}|[0-9]{3,5}") {
            let backend = Arc::new(FakeBackend::default());
            let registry = TruckRegistry::new(backend.clone(), logged_in_store());

            let result = registry.register_truck(&input);
            let four_digits = input.len() == 4 && input.chars().all(|c| c.is_ascii_digit());

            prop_assert_eq!(backend.calls_to("/update_truck") == 1, four_digits);
            prop_assert_eq!(backend.calls() <= 1, true);
            if !four_digits {
                let is_validation_error = matches!(result, Err(TruckError::Validation { .. }));
                prop_assert!(is_validation_error);
            }
        }
    }
}
