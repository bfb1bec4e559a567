pub mod calls;
pub mod server_control;
pub mod worker;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::auth::AuthGateway;
use crate::backend::DockBackend;
use crate::errors::ActionError;
use crate::session::{Session, SessionStore};
use crate::stream::StreamDescriptor;
use crate::telemetry::{PollerHandle, TelemetrySnapshot, fetch_count_or_zero, start_polling};
use crate::truck::TruckRegistry;

use calls::CallResult;

pub use calls::{CallKind, CallOutcome, PendingCall};
pub use server_control::{ServerControl, ServerOperationStatus};
pub use worker::{Command, WorkerChannels, spawn_console_worker};

/// Top level screen presented to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    LoginRequired,
    TruckEntryRequired,
    DashboardActive,
}

impl ViewState {
    /// The view a session routes to. A user with a truck goes straight to the
    /// dashboard, a user alone to truck entry, nobody to the login form.
    pub fn from_session(session: &Session) -> Self {
        match (&session.user, &session.truck_number) {
            (Some(_), Some(_)) => ViewState::DashboardActive,
            (Some(_), None) => ViewState::TruckEntryRequired,
            (None, _) => ViewState::LoginRequired,
        }
    }
}

/// State of the live stream viewer on the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StreamView {
    #[default]
    Closed,
    Loading,
    Ready(StreamDescriptor),
    /// The backend had no link or could not be reached
    Unavailable,
}

/// Everything the rendering layer needs to draw the current view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleSnapshot {
    pub view: ViewState,
    pub user: Option<String>,
    pub truck_number: Option<String>,
    pub count: u64,
    pub server_status: ServerOperationStatus,
    pub stream: StreamView,
    pub error: Option<String>,
}

impl Default for ConsoleSnapshot {
    fn default() -> Self {
        Self {
            view: ViewState::Loading,
            user: None,
            truck_number: None,
            count: 0,
            server_status: ServerOperationStatus::Idle,
            stream: StreamView::Closed,
            error: None,
        }
    }
}

// Lives exactly as long as the dashboard view; dropping it stops the poller.
struct Dashboard {
    id: u64,
    truck_number: String,
    token: String,
    telemetry: TelemetrySnapshot,
    telemetry_rx: Receiver<TelemetrySnapshot>,
    server: ServerControl,
    stream: StreamView,
    _poller: PollerHandle,
}

/// The view state machine.
///
/// The view is always derived from the persisted session. The controller
/// never writes the session itself: login and logout go through
/// [`AuthGateway`], truck changes through [`TruckRegistry`].
pub struct ViewController {
    backend: Arc<dyn DockBackend>,
    store: Arc<dyn SessionStore>,
    auth: AuthGateway,
    trucks: TruckRegistry,
    poll_interval: Duration,
    view: ViewState,
    dashboard: Option<Dashboard>,
    dashboards_entered: u64,
    last_error: Option<String>,
}

impl ViewController {
    pub fn new(
        backend: Arc<dyn DockBackend>,
        store: Arc<dyn SessionStore>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            auth: AuthGateway::new(backend.clone(), store.clone()),
            trucks: TruckRegistry::new(backend.clone(), store.clone()),
            backend,
            store,
            poll_interval,
            view: ViewState::Loading,
            dashboard: None,
            dashboards_entered: 0,
            last_error: None,
        }
    }

    /// Leave `Loading` for whatever view the persisted session routes to.
    pub fn initialize(&mut self) -> ViewState {
        self.sync_view();
        info!("Console starting in {:?}", self.view);
        self.view
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn server_status(&self) -> Option<ServerOperationStatus> {
        self.dashboard.as_ref().map(|d| d.server.status())
    }

    pub fn telemetry(&self) -> Option<TelemetrySnapshot> {
        self.dashboard.as_ref().map(|d| d.telemetry)
    }

    pub fn stream(&self) -> Option<&StreamView> {
        self.dashboard.as_ref().map(|d| &d.stream)
    }

    fn load_session(&self) -> Session {
        self.store.load().unwrap_or_else(|e| {
            error!("Could not load session, treating it as empty: {}", e);
            Session::default()
        })
    }

    /// Re-derive the view from the session, entering or leaving the
    /// dashboard as needed.
    fn sync_view(&mut self) {
        let session = self.load_session();
        let view = ViewState::from_session(&session);

        if view == ViewState::DashboardActive {
            let truck_number = session.truck_number.clone().unwrap_or_default();
            let current = self.dashboard.as_ref().map(|d| d.truck_number.as_str());
            if current != Some(truck_number.as_str()) {
                self.enter_dashboard(truck_number, session.bearer_token().to_string());
            }
        } else if self.dashboard.take().is_some() {
            debug!("Left dashboard, count polling stopped");
        }

        if view != self.view {
            debug!("View {:?} -> {:?}", self.view, view);
        }
        self.view = view;
    }

    fn enter_dashboard(&mut self, truck_number: String, token: String) {
        // drop any previous dashboard first so its poller is gone
        self.dashboard = None;

        let (telemetry_tx, telemetry_rx) = mpsc::channel();
        let backend = self.backend.clone();
        let poll_token = token.clone();
        let poller = start_polling(
            self.poll_interval,
            move || fetch_count_or_zero(backend.as_ref(), &poll_token),
            telemetry_tx,
        );

        info!("Dashboard active for truck {}", truck_number);
        self.dashboards_entered += 1;
        self.dashboard = Some(Dashboard {
            id: self.dashboards_entered,
            truck_number,
            token,
            telemetry: TelemetrySnapshot::default(),
            telemetry_rx,
            server: ServerControl::default(),
            stream: StreamView::Closed,
            _poller: poller,
        });
    }

    fn require_view(&self, expected: ViewState, operation: &str) -> Result<(), ActionError> {
        if self.view == expected {
            Ok(())
        } else {
            warn!("Ignoring {} while in {:?}", operation, self.view);
            Err(ActionError::InvalidTransition {
                operation: operation.to_string(),
                view: format!("{:?}", self.view),
            })
        }
    }

    fn record_outcome(&mut self, outcome: Result<(), ActionError>) -> Result<(), ActionError> {
        self.last_error = outcome.as_ref().err().map(|e| e.operator_message().to_string());
        outcome
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), ActionError> {
        let outcome = self.require_view(ViewState::LoginRequired, "login").and_then(|_| {
            self.auth
                .login(username, password)
                .map(|_| ())
                .map_err(|source| ActionError::Auth { source })
        });
        self.sync_view();
        self.record_outcome(outcome)
    }

    pub fn submit_truck(&mut self, truck_number: &str) -> Result<(), ActionError> {
        let outcome = self
            .require_view(ViewState::TruckEntryRequired, "submit truck")
            .and_then(|_| {
                self.trucks
                    .register_truck(truck_number)
                    .map_err(|source| ActionError::Truck { source })
            });
        self.sync_view();
        self.record_outcome(outcome)
    }

    /// Back to truck entry for the next truck, keeping the operator logged in.
    pub fn new_entry(&mut self) -> Result<(), ActionError> {
        let outcome = self
            .require_view(ViewState::DashboardActive, "new entry")
            .and_then(|_| {
                self.trucks
                    .forget_truck()
                    .map_err(|source| ActionError::Store { source })
            });
        self.sync_view();
        self.record_outcome(outcome)
    }

    /// Available from every view.
    pub fn logout(&mut self) -> Result<(), ActionError> {
        let outcome = self
            .auth
            .logout()
            .map_err(|source| ActionError::Store { source });
        self.sync_view();
        self.record_outcome(outcome)
    }

    fn pending_call(&self, kind: CallKind) -> Option<PendingCall> {
        self.dashboard.as_ref().map(|dashboard| PendingCall {
            dashboard_id: dashboard.id,
            kind,
            token: dashboard.token.clone(),
            backend: self.backend.clone(),
        })
    }

    /// Settle the state a [`PendingCall`] left in flight. Outcomes from a
    /// dashboard that has since been left are dropped; returns whether the
    /// outcome was applied.
    pub fn complete_call(&mut self, outcome: CallOutcome) -> bool {
        let Some(dashboard) = self
            .dashboard
            .as_mut()
            .filter(|dashboard| dashboard.id == outcome.dashboard_id)
        else {
            debug!("Dropping {:?} for a dashboard that is gone", outcome.result);
            return false;
        };
        match outcome.result {
            CallResult::Started(succeeded) => dashboard.server.finish_start(succeeded),
            CallResult::Stopped(succeeded) => dashboard.server.finish_stop(succeeded),
            CallResult::Stream(view) => {
                if dashboard.stream == StreamView::Loading {
                    dashboard.stream = view;
                }
            }
        }
        true
    }

    // Issue a begun call on the calling thread.
    fn run_blocking(&mut self, call: Option<PendingCall>) -> bool {
        match call {
            Some(call) => {
                let outcome = call.run();
                self.complete_call(outcome);
                true
            }
            None => false,
        }
    }

    /// Optimistically mark the recording service as starting and hand back
    /// the `/start` call. `None` if there is no dashboard or another call is
    /// outstanding.
    pub fn begin_start_server(&mut self) -> Option<PendingCall> {
        let dashboard = self.dashboard.as_mut()?;
        if !dashboard.server.begin_start() {
            return None;
        }
        self.pending_call(CallKind::Start)
    }

    pub fn start_server(&mut self) -> bool {
        let call = self.begin_start_server();
        self.run_blocking(call)
    }

    pub fn begin_stop_server(&mut self) -> Option<PendingCall> {
        let dashboard = self.dashboard.as_mut()?;
        if !dashboard.server.begin_stop() {
            return None;
        }
        self.pending_call(CallKind::Stop)
    }

    pub fn stop_server(&mut self) -> bool {
        let call = self.begin_stop_server();
        self.run_blocking(call)
    }

    /// Stop the recording service if it is running and end the unloading.
    pub fn begin_terminate(&mut self) -> Option<PendingCall> {
        let call = self.begin_stop_server();
        info!("Terminate requested (stop issued: {})", call.is_some());
        call
    }

    pub fn terminate(&mut self) -> bool {
        let call = self.begin_terminate();
        self.run_blocking(call)
    }

    /// Put the viewer into [`StreamView::Loading`] and hand back the call
    /// fetching the camera link. Failures end in [`StreamView::Unavailable`].
    pub fn begin_open_stream(&mut self) -> Option<PendingCall> {
        let dashboard = self.dashboard.as_mut()?;
        dashboard.stream = StreamView::Loading;
        self.pending_call(CallKind::Stream)
    }

    pub fn open_stream(&mut self) -> bool {
        let call = self.begin_open_stream();
        self.run_blocking(call)
    }

    pub fn close_stream(&mut self) {
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.stream = StreamView::Closed;
        }
    }

    /// Apply count snapshots delivered by the poller since the last call.
    /// Returns true when the displayed count changed.
    pub fn pump_telemetry(&mut self) -> bool {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return false;
        };
        let previous = dashboard.telemetry;
        while let Ok(snapshot) = dashboard.telemetry_rx.try_recv() {
            dashboard.telemetry = snapshot;
        }
        dashboard.telemetry != previous
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        let session = self.load_session();
        ConsoleSnapshot {
            view: self.view,
            user: session.user,
            truck_number: session.truck_number,
            count: self.telemetry().map(|t| t.count).unwrap_or(0),
            server_status: self.server_status().unwrap_or_default(),
            stream: self.stream().cloned().unwrap_or_default(),
            error: self.last_error.clone(),
        }
    }
}
