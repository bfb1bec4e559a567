// Integration tests for session recovery and view transitions

use std::sync::Arc;
use std::time::Duration;

use dockwatch::test_support::{FAKE_TOKEN, FakeBackend};
use dockwatch::{
    ActionError, FileSessionStore, Session, SessionPatch, SessionStore, TruckError,
    ViewController, ViewState,
};
use tempfile::TempDir;

const NO_POLLING: Duration = Duration::from_secs(3600);

fn controller(backend: &Arc<FakeBackend>, store: &Arc<FileSessionStore>) -> ViewController {
    ViewController::new(backend.clone(), store.clone(), NO_POLLING)
}

fn file_store(dir: &TempDir) -> Arc<FileSessionStore> {
    Arc::new(FileSessionStore::new(dir.path().to_path_buf()).unwrap())
}

#[test]
fn test_restart_routes_from_persisted_session() {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(FakeBackend::default());

    {
        let store = file_store(&temp_dir);
        let mut console = controller(&backend, &store);
        assert_eq!(console.initialize(), ViewState::LoginRequired);
        store.save(SessionPatch::login("op-7", "tok")).unwrap();
    }
    {
        // a new process sees only the user
        let store = file_store(&temp_dir);
        assert_eq!(
            controller(&backend, &store).initialize(),
            ViewState::TruckEntryRequired
        );
        store.save(SessionPatch::truck("1234")).unwrap();
    }
    {
        let store = file_store(&temp_dir);
        let mut console = controller(&backend, &store);
        assert_eq!(console.initialize(), ViewState::DashboardActive);
        assert_eq!(console.snapshot().truck_number.as_deref(), Some("1234"));
    }
}

#[test]
fn test_full_operator_flow() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let backend = Arc::new(FakeBackend::default());
    let mut console = controller(&backend, &store);
    console.initialize();

    console.login("op-7", "secret").unwrap();
    assert_eq!(console.view(), ViewState::TruckEntryRequired);
    let session = store.load().unwrap();
    assert_eq!(session.user.as_deref(), Some("op-7"));
    assert_eq!(session.token.as_deref(), Some(FAKE_TOKEN));
    assert_eq!(session.truck_number, None);

    console.submit_truck("1234").unwrap();
    assert_eq!(console.view(), ViewState::DashboardActive);
    assert_eq!(store.load().unwrap().truck_number.as_deref(), Some("1234"));

    console.new_entry().unwrap();
    assert_eq!(console.view(), ViewState::TruckEntryRequired);
    let session = store.load().unwrap();
    assert_eq!(session.truck_number, None);
    assert_eq!(session.user.as_deref(), Some("op-7"));

    console.submit_truck("5678").unwrap();
    console.logout().unwrap();
    assert_eq!(console.view(), ViewState::LoginRequired);
    assert_eq!(store.load().unwrap(), Session::default());

    // authenticated calls carried the token handed out at login
    assert!(backend.tokens().iter().all(|token| token == FAKE_TOKEN));
}

#[test]
fn test_logout_from_every_view() {
    for persisted in [
        SessionPatch::default(),
        SessionPatch::login("op-7", "tok"),
        SessionPatch {
            truck_number: dockwatch::session::FieldUpdate::Set("1234".to_string()),
            ..SessionPatch::login("op-7", "tok")
        },
    ] {
        let temp_dir = TempDir::new().unwrap();
        let store = file_store(&temp_dir);
        store.save(persisted).unwrap();
        let backend = Arc::new(FakeBackend::default());
        let mut console = controller(&backend, &store);
        console.initialize();

        console.logout().unwrap();
        assert_eq!(console.view(), ViewState::LoginRequired);
        assert!(store.load().unwrap().is_empty());
    }
}

#[test]
fn test_failed_truck_registration_stays_on_entry() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let backend = Arc::new(FakeBackend::default());
    let mut console = controller(&backend, &store);
    console.initialize();
    console.login("op-7", "secret").unwrap();

    backend.fail_update(500);
    let result = console.submit_truck("1234");
    assert!(matches!(
        result,
        Err(ActionError::Truck {
            source: TruckError::UpdateFailed { .. }
        })
    ));
    assert_eq!(console.view(), ViewState::TruckEntryRequired);
    assert_eq!(store.load().unwrap().truck_number, None);
    assert_eq!(
        console.last_error(),
        Some("Failed to update truck on server.")
    );

    let before = backend.calls_to("/update_truck");
    let result = console.submit_truck("12a4");
    assert!(matches!(
        result,
        Err(ActionError::Truck {
            source: TruckError::Validation { .. }
        })
    ));
    assert_eq!(backend.calls_to("/update_truck"), before);
}

#[test]
fn test_failed_login_allows_retry() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let backend = Arc::new(FakeBackend::default());
    backend.fail_login(dockwatch::AuthError::NetworkError {
        message: "connection reset".to_string(),
    });
    let mut console = controller(&backend, &store);
    console.initialize();

    assert!(console.login("op-7", "secret").is_err());
    assert_eq!(console.view(), ViewState::LoginRequired);
    assert!(store.load().unwrap().is_empty());
    assert_eq!(backend.calls_to("/login"), 1);
}

#[test]
fn test_offline_session_clear_needs_no_backend() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = file_store(&temp_dir);
        store.save(SessionPatch::login("op-7", "tok")).unwrap();
        store.save(SessionPatch::truck("1234")).unwrap();
    }

    // what `dockwatch logout` does: the store alone, nothing on the network
    let store = file_store(&temp_dir);
    store.clear().unwrap();
    assert!(!store.path().exists());

    let backend = Arc::new(FakeBackend::default());
    assert_eq!(
        controller(&backend, &file_store(&temp_dir)).initialize(),
        ViewState::LoginRequired
    );
    assert_eq!(backend.calls(), 0);
}
