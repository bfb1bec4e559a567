// Library interface for dockwatch
// This allows integration tests to access internal modules

pub mod auth;
pub mod backend;
pub mod config;
pub mod controller;
pub mod errors;
pub mod session;
pub mod stream;
pub mod telemetry;
#[doc(hidden)]
pub mod test_support;
pub mod truck;

// Re-export commonly used types
pub use auth::{AuthGateway, LoginSuccess};
pub use backend::{DockBackend, HttpBackend};
pub use config::{AppConfig, ConfigOrigin};
pub use controller::{ConsoleSnapshot, ServerOperationStatus, StreamView, ViewController, ViewState};
pub use errors::{ActionError, AuthError, ConsoleError, TruckError};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionPatch, SessionStore};
pub use stream::{StreamDescriptor, resolve};
pub use telemetry::TelemetrySnapshot;
pub use truck::TruckRegistry;
