//! Request-display lifecycle controller.
//!
//! Owns the single mutable `ViewState`, validates input, issues
//! classification requests, and emits a snapshot to the presentation layer
//! after every transition.

use crate::client::PredictClient;
use crate::model::{
    validate_message, ClassificationResult, ClassifyError, RunConfig, ViewState,
    ERROR_DISMISS_AFTER,
};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Commands emitted by UI layers to drive the controller.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    /// Submit the current input text for classification.
    Submit(String),
    /// Reset to the initial view.
    Clear,
    Quit,
}

/// Messages spawned tasks report back into the controller loop.
enum ControllerMsg {
    Outcome(Result<ClassificationResult, ClassifyError>),
    DismissError { generation: u64 },
}

/// The view state machine.
///
/// Every transition bumps a generation counter. Deferred actions (the error
/// auto-dismiss timer) capture the generation at schedule time and no-op if
/// the view has moved on by the time they fire.
#[derive(Default)]
pub struct ViewModel {
    state: ViewState,
    generation: u64,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn transition(&mut self, next: ViewState) {
        self.generation += 1;
        self.state = next;
    }

    /// Reset to the initial view. Idempotent; no network effect.
    pub fn clear(&mut self) {
        self.transition(ViewState::Initial);
    }

    /// Validate `text` and, if it passes, enter `Loading` and return the
    /// trimmed message to send. On validation failure the view enters
    /// `Error` and no network call must be made.
    pub fn submit(&mut self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        match validate_message(trimmed) {
            Err(e) => {
                self.transition(ViewState::Error {
                    message: e.user_message(),
                });
                None
            }
            Ok(()) => {
                self.transition(ViewState::Loading);
                Some(trimmed.to_string())
            }
        }
    }

    /// Apply a completed classification, success or failure.
    ///
    /// Overlapping submissions are not serialized: outcomes are applied in
    /// arrival order and the last one wins.
    pub fn apply_outcome(&mut self, outcome: Result<ClassificationResult, ClassifyError>) {
        match outcome {
            Ok(result) => self.transition(ViewState::Result(result)),
            Err(e) => self.transition(ViewState::Error {
                message: e.user_message(),
            }),
        }
    }

    /// Auto-dismiss an error shown at `generation`. Returns whether the view
    /// actually changed; a stale generation makes this a no-op.
    pub fn dismiss_error(&mut self, generation: u64) -> bool {
        if generation == self.generation && matches!(self.state, ViewState::Error { .. }) {
            self.transition(ViewState::Initial);
            true
        } else {
            false
        }
    }

    fn is_error(&self) -> bool {
        matches!(self.state, ViewState::Error { .. })
    }
}

/// Schedule the auto-dismiss for the error currently on screen.
fn schedule_dismiss(msg_tx: &UnboundedSender<ControllerMsg>, generation: u64) {
    let tx = msg_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ERROR_DISMISS_AFTER).await;
        let _ = tx.send(ControllerMsg::DismissError { generation });
    });
}

/// Run the controller loop: consume UI commands, drive classification
/// requests, and push a `ViewState` snapshot after every transition.
pub(crate) async fn run_controller(
    cfg: RunConfig,
    view_tx: UnboundedSender<ViewState>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let client = PredictClient::new(&cfg)?;
    let (msg_tx, mut msg_rx) = tokio::sync::mpsc::unbounded_channel::<ControllerMsg>();
    let mut vm = ViewModel::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(text)) => {
                        if let Some(message) = vm.submit(&text) {
                            // One request per submission. A second submit while
                            // this one is in flight is neither cancelled nor
                            // queued; both outcomes race and the later one wins.
                            let client = client.clone();
                            let tx = msg_tx.clone();
                            tokio::spawn(async move {
                                let outcome = client.classify(&message).await;
                                let _ = tx.send(ControllerMsg::Outcome(outcome));
                            });
                        } else {
                            schedule_dismiss(&msg_tx, vm.generation());
                        }
                        let _ = view_tx.send(vm.state().clone());
                    }
                    Some(UiCommand::Clear) => {
                        vm.clear();
                        let _ = view_tx.send(vm.state().clone());
                    }
                    Some(UiCommand::Quit) | None => {
                        debug!("controller shutting down");
                        break;
                    }
                }
            }
            Some(msg) = msg_rx.recv() => {
                match msg {
                    ControllerMsg::Outcome(outcome) => {
                        vm.apply_outcome(outcome);
                        if vm.is_error() {
                            schedule_dismiss(&msg_tx, vm.generation());
                        }
                        let _ = view_tx.send(vm.state().clone());
                    }
                    ControllerMsg::DismissError { generation } => {
                        if vm.dismiss_error(generation) {
                            let _ = view_tx.send(vm.state().clone());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
