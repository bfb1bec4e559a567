// Client side belief about the remote recording service

use log::debug;

/// What the console believes the recording service is doing. Transitions
/// into `Running` or `Idle` only happen once the triggering call returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ServerOperationStatus {
    #[default]
    Idle,
    Starting,
    Running,
    Stopping,
}

impl ServerOperationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Stopped",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        }
    }
}

/// Start/stop guard. At most one call is outstanding at a time: a start is
/// only accepted from `Idle` and a stop only from `Running`.
#[derive(Clone, Debug, Default)]
pub struct ServerControl {
    status: ServerOperationStatus,
}

impl ServerControl {
    pub fn status(&self) -> ServerOperationStatus {
        self.status
    }

    pub fn can_start(&self) -> bool {
        self.status == ServerOperationStatus::Idle
    }

    pub fn can_stop(&self) -> bool {
        self.status == ServerOperationStatus::Running
    }

    /// Enter `Starting`. Returns false when a start is not allowed right now.
    pub fn begin_start(&mut self) -> bool {
        if !self.can_start() {
            debug!("Ignoring start while {:?}", self.status);
            return false;
        }
        self.status = ServerOperationStatus::Starting;
        true
    }

    pub fn finish_start(&mut self, succeeded: bool) {
        if self.status != ServerOperationStatus::Starting {
            return;
        }
        self.status = if succeeded {
            ServerOperationStatus::Running
        } else {
            ServerOperationStatus::Idle
        };
    }

    /// Enter `Stopping`. Returns false when a stop is not allowed right now.
    pub fn begin_stop(&mut self) -> bool {
        if !self.can_stop() {
            debug!("Ignoring stop while {:?}", self.status);
            return false;
        }
        self.status = ServerOperationStatus::Stopping;
        true
    }

    pub fn finish_stop(&mut self, succeeded: bool) {
        if self.status != ServerOperationStatus::Stopping {
            return;
        }
        self.status = if succeeded {
            ServerOperationStatus::Idle
        } else {
            ServerOperationStatus::Running
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop_cycle() {
        let mut control = ServerControl::default();
        assert!(control.begin_start());
        assert_eq!(control.status(), ServerOperationStatus::Starting);
        control.finish_start(true);
        assert_eq!(control.status(), ServerOperationStatus::Running);

        assert!(control.begin_stop());
        assert_eq!(control.status(), ServerOperationStatus::Stopping);
        control.finish_stop(true);
        assert_eq!(control.status(), ServerOperationStatus::Idle);
    }

    #[test]
    fn test_failures_revert() {
        let mut control = ServerControl::default();
        control.begin_start();
        control.finish_start(false);
        assert_eq!(control.status(), ServerOperationStatus::Idle);

        control.begin_start();
        control.finish_start(true);
        control.begin_stop();
        control.finish_stop(false);
        assert_eq!(control.status(), ServerOperationStatus::Running);
    }

    #[test]
    fn test_outstanding_call_blocks_both_controls() {
        let mut control = ServerControl::default();
        assert!(!control.begin_stop());

        control.begin_start();
        assert!(!control.begin_start());
        assert!(!control.begin_stop());

        control.finish_start(true);
        control.begin_stop();
        assert!(!control.begin_start());
        assert!(!control.begin_stop());
    }

    #[test]
    fn test_stray_completion_is_ignored() {
        let mut control = ServerControl::default();
        control.finish_start(true);
        assert_eq!(control.status(), ServerOperationStatus::Idle);
        control.finish_stop(false);
        assert_eq!(control.status(), ServerOperationStatus::Idle);
    }
}
