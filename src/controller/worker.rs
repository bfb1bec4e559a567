// Runs the view controller off the UI thread

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error};

use super::{CallOutcome, ConsoleSnapshot, PendingCall, ViewController};

const WORKER_TICK_MS: u64 = 100;

/// Operator actions forwarded from the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    SubmitTruck { truck_number: String },
    NewEntry,
    Logout,
    StartServer,
    StopServer,
    Terminate,
    OpenStream,
    CloseStream,
}

/// Channel ends held by the UI.
pub struct WorkerChannels {
    pub commands: Sender<Command>,
    pub snapshots: Receiver<ConsoleSnapshot>,
    pub worker: JoinHandle<()>,
}

/// Move `controller` onto its own thread. Commands are handled one at a time
/// and a snapshot is published after every state change; `notify` is called
/// after each publish so the UI can repaint. Backend calls begun by a command
/// run on threads of their own, so a slow call never holds up the next
/// command. The worker exits when the command sender or the snapshot receiver
/// is dropped.
pub fn spawn_console_worker<N>(
    mut controller: ViewController,
    notify: N,
) -> Result<WorkerChannels, std::io::Error>
where
    N: Fn() + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel::<Command>();
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<ConsoleSnapshot>();

    let worker = thread::Builder::new()
        .name("console-worker".to_string())
        .spawn(move || {
            let (outcome_tx, outcome_rx) = mpsc::channel::<CallOutcome>();

            let publish = |controller: &ViewController| -> bool {
                let sent = snapshot_tx.send(controller.snapshot()).is_ok();
                notify();
                sent
            };
            let dispatch = |call: PendingCall| {
                let failed = call.failed();
                let call_tx = outcome_tx.clone();
                let spawned = thread::Builder::new()
                    .name(format!("{}-call", call.kind().label()))
                    .spawn(move || {
                        // the worker may be gone by the time the call answers
                        let _ = call_tx.send(call.run());
                    });
                if let Err(e) = spawned {
                    error!("Could not spawn backend call: {}", e);
                    let _ = outcome_tx.send(failed);
                }
            };

            controller.initialize();
            if !publish(&controller) {
                return;
            }

            loop {
                match command_rx.recv_timeout(Duration::from_millis(WORKER_TICK_MS)) {
                    Ok(command) => {
                        debug!("Handling {:?}", redacted(&command));
                        if !handle_command(&mut controller, command, &publish, &dispatch) {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                let mut changed = controller.pump_telemetry();
                while let Ok(outcome) = outcome_rx.try_recv() {
                    changed |= controller.complete_call(outcome);
                }
                if changed && !publish(&controller) {
                    break;
                }
            }
            debug!("Console worker exiting");
        })?;

    Ok(WorkerChannels {
        commands: command_tx,
        snapshots: snapshot_rx,
        worker,
    })
}

// Keeps passwords out of the log.
fn redacted(command: &Command) -> Command {
    match command {
        Command::Login { username, .. } => Command::Login {
            username: username.clone(),
            password: "***".to_string(),
        },
        other => other.clone(),
    }
}

/// Returns false once nobody is listening for snapshots anymore.
fn handle_command<P, D>(
    controller: &mut ViewController,
    command: Command,
    publish: &P,
    dispatch: &D,
) -> bool
where
    P: Fn(&ViewController) -> bool,
    D: Fn(PendingCall),
{
    // errors are already logged and surfaced through the snapshot
    let call = match command {
        Command::Login { username, password } => {
            let _ = controller.login(&username, &password);
            None
        }
        Command::SubmitTruck { truck_number } => {
            let _ = controller.submit_truck(&truck_number);
            None
        }
        Command::NewEntry => {
            let _ = controller.new_entry();
            None
        }
        Command::Logout => {
            if let Err(e) = controller.logout() {
                error!("Logout failed: {}", e);
            }
            None
        }
        Command::StartServer => controller.begin_start_server(),
        Command::StopServer => controller.begin_stop_server(),
        Command::Terminate => controller.begin_terminate(),
        Command::OpenStream => controller.begin_open_stream(),
        Command::CloseStream => {
            controller.close_stream();
            None
        }
    };
    if let Some(call) = call {
        dispatch(call);
    }
    publish(controller)
}
