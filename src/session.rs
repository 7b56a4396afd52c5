use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::aggregate::{SessionState, SessionStatus};
use crate::errors::{CONNECTION_CLOSED_MESSAGE, ReadError, VerifyError};
use crate::reader::EventReader;
use crate::source::{EventSource, VerifyRequest};
use crate::verdict::VerifyResult;

/// Single source of truth for one in-flight or completed verification.
///
/// Owns the reentrancy guard and the cancellation flag; the actual pipeline
/// (reader → fold → publish) runs on a spawned driver task that is the sole
/// writer of the session state. Observers read immutable snapshots.
///
/// One store drives at most one session at a time; [`SessionStore::start`]
/// while a session is loading is rejected with [`VerifyError::SessionBusy`].
pub struct SessionStore {
    source: Arc<dyn EventSource>,
    rx: watch::Receiver<SessionState>,
    cancel: Option<watch::Sender<bool>>,
}

impl SessionStore {
    /// Creates an idle store over the given transport.
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        let (tx, rx) = watch::channel(SessionState::idle());
        drop(tx);
        Self {
            source,
            rx,
            cancel: None,
        }
    }

    /// Returns a snapshot of the current session state.
    pub fn state(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Waits until the driver publishes a new snapshot.
    ///
    /// Returns `false` once no further updates can arrive (the driver task
    /// finished or the store is idle).
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Starts a verification session for the given request.
    ///
    /// Rejects blank content before any transport activity and rejects calls
    /// made while a prior session is still loading. On success the store
    /// resets to a fresh running state and the pipeline begins immediately.
    pub fn start(&mut self, request: VerifyRequest) -> Result<(), VerifyError> {
        if request.content.trim().is_empty() {
            return Err(VerifyError::InvalidInput(
                "content must not be blank".into(),
            ));
        }
        if self.rx.borrow().status == SessionStatus::Running {
            return Err(VerifyError::SessionBusy);
        }

        let session_id = uuid::Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(SessionState::running(session_id));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        // Dropping the previous cancel sender cancels any stray prior driver.
        self.cancel = Some(cancel_tx);
        self.rx = state_rx;

        debug!(session_id = %session_id, "starting verification session");
        tokio::spawn(drive_session(
            self.source.clone(),
            request,
            session_id,
            state_tx,
            cancel_rx,
        ));
        Ok(())
    }

    /// Cancels any in-flight session and returns to the initial idle state.
    ///
    /// Safe to call at any time; after it returns, nothing from the prior
    /// session can reach this store's observable state.
    pub fn reset(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }
        let (tx, rx) = watch::channel(SessionState::idle());
        drop(tx);
        self.rx = rx;
    }

    /// Drives the current session to its terminal outcome and returns the
    /// verdict, or the session's error as [`VerifyError::Failed`].
    pub async fn wait(&mut self) -> Result<VerifyResult, VerifyError> {
        loop {
            let outcome = {
                let state = self.rx.borrow();
                match state.status {
                    SessionStatus::Succeeded => Some(finished(&state)),
                    SessionStatus::Failed => Some(Err(VerifyError::Failed(
                        state
                            .error
                            .clone()
                            .unwrap_or_else(|| CONNECTION_CLOSED_MESSAGE.to_string()),
                    ))),
                    SessionStatus::Idle => Some(Err(VerifyError::Cancelled)),
                    SessionStatus::Running => None,
                }
            };
            if let Some(outcome) = outcome {
                return outcome;
            }
            if self.rx.changed().await.is_err() {
                // Driver gone without a terminal state; treat as cancelled.
                if self.rx.borrow().status == SessionStatus::Running {
                    return Err(VerifyError::Cancelled);
                }
            }
        }
    }
}

fn finished(state: &SessionState) -> Result<VerifyResult, VerifyError> {
    state
        .result
        .clone()
        .ok_or_else(|| VerifyError::Protocol("succeeded session is missing its result".into()))
}

/// One session's pipeline: pull events, fold them into the state, publish a
/// snapshot per event, and settle the terminal outcome.
///
/// Runs until a terminal event, a fatal source condition, stream exhaustion,
/// or cancellation. All mutation goes through `state_tx`; once this task
/// returns, the receiver side sees no further changes.
async fn drive_session(
    source: Arc<dyn EventSource>,
    request: VerifyRequest,
    session_id: uuid::Uuid,
    state_tx: watch::Sender<SessionState>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let handle = tokio::select! {
        _ = cancelled(&mut cancel_rx) => {
            debug!(session_id = %session_id, "session cancelled before the stream opened");
            return;
        }
        opened = source.open(&request) => match opened {
            Ok(handle) => handle,
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "failed to open verification stream");
                state_tx.send_modify(|state| state.fail(CONNECTION_CLOSED_MESSAGE));
                return;
            }
        }
    };

    let mut reader = EventReader::new(handle);
    loop {
        let next = tokio::select! {
            _ = cancelled(&mut cancel_rx) => {
                debug!(session_id = %session_id, "session cancelled mid-stream");
                return;
            }
            next = reader.next_event() => next,
        };
        match next {
            Some(Ok(event)) => {
                debug!(
                    session_id = %session_id,
                    event_type = ?event.event_type,
                    agent = ?event.agent,
                    "stream event"
                );
                state_tx.send_modify(|state| state.apply(event));
                if state_tx.borrow().status.is_terminal() {
                    debug!(session_id = %session_id, "session reached terminal state");
                    return;
                }
            }
            Some(Err(ReadError::Malformed { detail })) => {
                warn!(session_id = %session_id, detail = %detail, "dropping malformed event record");
            }
            Some(Err(ReadError::Source(err))) => {
                warn!(session_id = %session_id, error = %err, "verification stream failed");
                state_tx.send_modify(|state| state.fail(CONNECTION_CLOSED_MESSAGE));
                return;
            }
            None => {
                debug!(session_id = %session_id, "stream ended without a terminal event");
                state_tx.send_modify(|state| state.fail(CONNECTION_CLOSED_MESSAGE));
                return;
            }
        }
    }
}

/// Resolves when cancellation is requested or the store side is gone.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            return;
        }
    }
}
