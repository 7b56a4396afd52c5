use std::fmt;

use crate::event::{AgentId, EventType, StreamEvent};

/// Coarse progress label derived from the most recent stage activity.
///
/// The mapping from stage to phase is fixed; updates are last-writer-wins,
/// except that terminal events override any stage mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// The intake stage is analyzing the submitted content.
    Parsing,
    /// The evidence-gathering stage is running.
    Searching,
    /// The adjudication stage is running.
    Verifying,
    /// The session finished with a verdict.
    Complete,
    /// The session finished with a failure.
    Error,
}

impl Phase {
    /// The phase a stage's activity maps to.
    pub const fn for_agent(agent: AgentId) -> Phase {
        match agent {
            AgentId::Parser => Phase::Parsing,
            AgentId::Search => Phase::Searching,
            AgentId::Verdict => Phase::Verifying,
        }
    }

    /// Applies one event to the current phase.
    ///
    /// Any event with a recognized agent moves the phase to that agent's
    /// mapping regardless of event type; `complete` and `error` force their
    /// respective terminal phases unconditionally. Events with no agent and no
    /// terminal type leave the phase untouched.
    pub fn advance(self, event: &StreamEvent) -> Phase {
        match event.event_type {
            EventType::Complete => Phase::Complete,
            EventType::Error => Phase::Error,
            _ => match event.agent {
                Some(agent) => Phase::for_agent(agent),
                None => self,
            },
        }
    }

    /// Returns true once the phase reflects a finished session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Complete | Phase::Error)
    }

    /// Returns the wire name of this phase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Parsing => "parsing",
            Phase::Searching => "searching",
            Phase::Verifying => "verifying",
            Phase::Complete => "complete",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: EventType, agent: Option<AgentId>) -> StreamEvent {
        StreamEvent {
            event_type,
            agent,
            step: None,
            content: None,
            data: None,
            result: None,
            message: None,
            needs_clarification: None,
            clarification_prompt: None,
        }
    }

    #[test]
    fn stage_table_is_fixed() {
        assert_eq!(Phase::for_agent(AgentId::Parser), Phase::Parsing);
        assert_eq!(Phase::for_agent(AgentId::Search), Phase::Searching);
        assert_eq!(Phase::for_agent(AgentId::Verdict), Phase::Verifying);
    }

    #[test]
    fn last_writer_wins_regardless_of_event_type() {
        let phase = Phase::Parsing
            .advance(&event(EventType::Start, Some(AgentId::Search)))
            .advance(&event(EventType::Reasoning, Some(AgentId::Search)))
            .advance(&event(EventType::Result, Some(AgentId::Parser)));
        assert_eq!(phase, Phase::Parsing);
    }

    #[test]
    fn agentless_events_leave_phase_untouched() {
        let phase = Phase::Searching.advance(&event(EventType::Reasoning, None));
        assert_eq!(phase, Phase::Searching);
    }

    #[test]
    fn terminal_events_override_stage_mapping() {
        let complete = Phase::Searching.advance(&event(EventType::Complete, Some(AgentId::Search)));
        assert_eq!(complete, Phase::Complete);
        let error = Phase::Verifying.advance(&event(EventType::Error, None));
        assert_eq!(error, Phase::Error);
        assert!(complete.is_terminal());
        assert!(error.is_terminal());
    }
}
