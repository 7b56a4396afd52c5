use crate::errors::{MISSING_RESULT_MESSAGE, REMOTE_FAILURE_MESSAGE};
use crate::event::{AGENT_COUNT, AgentId, EventType, StreamEvent};
use crate::phase::Phase;
use crate::verdict::VerifyResult;

/// Lifecycle of one verification session.
///
/// `Succeeded` and `Failed` are terminal: once entered, no transition leaves
/// them. This makes the result/error mutual exclusion a structural property
/// instead of a convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No session has been started, or the store was reset.
    Idle,
    /// A session is in flight.
    Running,
    /// The session ended with a verdict.
    Succeeded,
    /// The session ended with an error outcome.
    Failed,
}

impl SessionStatus {
    /// Returns true for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Succeeded | SessionStatus::Failed)
    }
}

/// Per-agent progress derived from that agent's event sub-sequence.
///
/// Transitions only move forward: `Pending → Running → Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// No events for this agent yet.
    Pending,
    /// A `start` event has been seen.
    Running,
    /// A `result` event has been seen; floor, never regresses.
    Completed,
}

impl AgentStatus {
    /// Folds one observed event type into the status.
    fn observe(self, event_type: EventType) -> AgentStatus {
        match (self, event_type) {
            (AgentStatus::Completed, _) => AgentStatus::Completed,
            (_, EventType::Result) => AgentStatus::Completed,
            (AgentStatus::Pending, EventType::Start) => AgentStatus::Running,
            (status, _) => status,
        }
    }
}

/// The observable state of one verification session.
///
/// Mutated exclusively through [`SessionState::apply`] and
/// [`SessionState::fail`], driven by the session store's pipeline; observers
/// only ever see clones published after a whole event was folded in.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SessionState {
    /// Identifier of the session this state belongs to (nil when idle).
    pub session_id: uuid::Uuid,
    /// Explicit lifecycle state.
    pub status: SessionStatus,
    /// Coarse progress label for display.
    pub phase: Phase,
    /// Every event received, in arrival order. Append-only.
    pub events: Vec<StreamEvent>,
    /// Per-agent event sub-sequences, indexed by [`AgentId::index`].
    pub grouped: [Vec<StreamEvent>; AGENT_COUNT],
    /// Per-agent progress, indexed by [`AgentId::index`].
    pub agent_status: [AgentStatus; AGENT_COUNT],
    /// Final verdict; set at most once, mutually exclusive with `error`.
    pub result: Option<VerifyResult>,
    /// Final error message; set at most once, mutually exclusive with `result`.
    pub error: Option<String>,
    /// Clarification prompt raised by the intake stage, if any.
    pub clarification: Option<String>,
}

impl SessionState {
    /// The state of a store with no session: not loading, nothing recorded.
    pub fn idle() -> Self {
        Self {
            session_id: uuid::Uuid::nil(),
            status: SessionStatus::Idle,
            phase: Phase::Parsing,
            events: Vec::new(),
            grouped: [const { Vec::new() }; AGENT_COUNT],
            agent_status: [AgentStatus::Pending; AGENT_COUNT],
            result: None,
            error: None,
            clarification: None,
        }
    }

    /// A fresh in-flight session.
    pub fn running(session_id: uuid::Uuid) -> Self {
        Self {
            session_id,
            status: SessionStatus::Running,
            ..Self::idle()
        }
    }

    /// True from start until a terminal outcome.
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Status of one agent.
    pub fn agent_status(&self, agent: AgentId) -> AgentStatus {
        self.agent_status[agent.index()]
    }

    /// Events attributed to one agent, in arrival order.
    pub fn events_for(&self, agent: AgentId) -> &[StreamEvent] {
        &self.grouped[agent.index()]
    }

    /// Folds one event into the state.
    ///
    /// The flat log and the per-agent grouping/status always absorb the event,
    /// so they stay recomputable from the log alone. Phase, clarification, and
    /// the terminal outcome freeze once a terminal outcome is reached; the
    /// first terminal event wins and later ones are audit-only.
    pub fn apply(&mut self, event: StreamEvent) {
        if let Some(agent) = event.agent {
            let slot = agent.index();
            self.grouped[slot].push(event.clone());
            self.agent_status[slot] = self.agent_status[slot].observe(event.event_type);
        }
        if event.event_type == EventType::Complete {
            // The pipeline ran end to end; every stage is done even if its
            // own result event was never observed.
            self.agent_status = [AgentStatus::Completed; AGENT_COUNT];
        }

        if !self.status.is_terminal() {
            self.phase = self.phase.advance(&event);
            if event.needs_clarification == Some(true) {
                self.clarification = event
                    .clarification_prompt
                    .clone()
                    .or_else(|| event.content.clone());
            }
            match event.event_type {
                EventType::Complete => match event.result.clone() {
                    Some(result) => {
                        self.result = Some(result);
                        self.status = SessionStatus::Succeeded;
                    }
                    None => self.fail(MISSING_RESULT_MESSAGE),
                },
                EventType::Error => {
                    let message = event
                        .message
                        .clone()
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| REMOTE_FAILURE_MESSAGE.to_string());
                    self.error = Some(message);
                    self.status = SessionStatus::Failed;
                }
                _ => {}
            }
        }

        self.events.push(event);
    }

    /// Moves the session to its error outcome with the given message.
    ///
    /// Used by the driver for synthesized failures (transport loss, stream
    /// exhaustion without a terminal event). No-op once terminal.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.error = Some(message.into());
        self.phase = Phase::Error;
        self.status = SessionStatus::Failed;
    }

    /// Rebuilds grouping and agent status from the flat event log.
    ///
    /// The incremental path in [`SessionState::apply`] must agree with this at
    /// every checkpoint; the equivalence is what makes the grouped views
    /// recoverable from the log.
    pub fn recompute_grouping(&self) -> ([Vec<StreamEvent>; AGENT_COUNT], [AgentStatus; AGENT_COUNT]) {
        let mut grouped: [Vec<StreamEvent>; AGENT_COUNT] = [const { Vec::new() }; AGENT_COUNT];
        let mut status = [AgentStatus::Pending; AGENT_COUNT];
        for event in &self.events {
            if let Some(agent) = event.agent {
                let slot = agent.index();
                grouped[slot].push(event.clone());
                status[slot] = status[slot].observe(event.event_type);
            }
            if event.event_type == EventType::Complete {
                status = [AgentStatus::Completed; AGENT_COUNT];
            }
        }
        (grouped, status)
    }
}
