// Dashboard backend calls, split from the controller so they can run elsewhere

use std::sync::Arc;

use log::{error, info, warn};

use crate::backend::DockBackend;
use crate::stream::StreamDescriptor;

use super::StreamView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Start,
    Stop,
    Stream,
}

impl CallKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Stream => "stream",
        }
    }
}

/// A backend call begun by the [`ViewController`](super::ViewController).
///
/// The controller state already reflects the call being in flight. Running
/// it blocks on the network; the result goes back through
/// [`ViewController::complete_call`](super::ViewController::complete_call).
pub struct PendingCall {
    pub(super) dashboard_id: u64,
    pub(super) kind: CallKind,
    pub(super) token: String,
    pub(super) backend: Arc<dyn DockBackend>,
}

/// Result of a [`PendingCall`], tagged with the dashboard that issued it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOutcome {
    pub(super) dashboard_id: u64,
    pub(super) result: CallResult,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum CallResult {
    Started(bool),
    Stopped(bool),
    Stream(StreamView),
}

impl PendingCall {
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    pub fn run(self) -> CallOutcome {
        let result = match self.kind {
            CallKind::Start => match self.backend.start_recording(&self.token) {
                Ok(status) => {
                    info!("Start API answered {}", status);
                    CallResult::Started(true)
                }
                Err(e) => {
                    error!("Failed to start: {}", e);
                    CallResult::Started(false)
                }
            },
            CallKind::Stop => match self.backend.stop_recording(&self.token) {
                Ok(status) => {
                    info!("Stop API answered {}", status);
                    CallResult::Stopped(true)
                }
                Err(e) => {
                    error!("Failed to stop: {}", e);
                    CallResult::Stopped(false)
                }
            },
            CallKind::Stream => match self.backend.youtube_url(&self.token) {
                Ok(Some(url)) => CallResult::Stream(StreamView::Ready(StreamDescriptor::from_raw(&url))),
                Ok(None) => {
                    warn!("Backend returned no stream link");
                    CallResult::Stream(StreamView::Unavailable)
                }
                Err(e) => {
                    error!("Failed to fetch video URL: {}", e);
                    CallResult::Stream(StreamView::Unavailable)
                }
            },
        };
        CallOutcome {
            dashboard_id: self.dashboard_id,
            result,
        }
    }

    /// The outcome to apply when the call could not be issued at all.
    pub fn failed(&self) -> CallOutcome {
        let result = match self.kind {
            CallKind::Start => CallResult::Started(false),
            CallKind::Stop => CallResult::Stopped(false),
            CallKind::Stream => CallResult::Stream(StreamView::Unavailable),
        };
        CallOutcome {
            dashboard_id: self.dashboard_id,
            result,
        }
    }
}
