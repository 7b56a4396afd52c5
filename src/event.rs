use std::fmt;

use crate::verdict::VerifyResult;

/// Event kinds emitted over one verification stream.
///
/// `Complete` and `Error` are terminal; everything after them is audit-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A stage began working.
    Start,
    /// A narrated reasoning step within a stage.
    Reasoning,
    /// A stage finished and handed off its intermediate output.
    Result,
    /// Terminal success; carries the final [`VerifyResult`].
    Complete,
    /// Terminal failure reported by the remote process.
    Error,
}

/// The fixed set of remote stages that emit events.
///
/// The set is closed on purpose: per-agent state lives in fixed-size tables
/// indexed by [`AgentId::index`], which keeps the status invariants easy to
/// check. A record naming an unknown agent fails to parse and is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Intake stage: parses the submitted content and plans searches.
    Parser,
    /// Evidence-gathering stage.
    Search,
    /// Adjudication stage: produces the final verdict.
    Verdict,
}

/// Number of known agents; the length of every per-agent table.
pub const AGENT_COUNT: usize = 3;

impl AgentId {
    /// All agents in pipeline order.
    pub const ALL: [AgentId; AGENT_COUNT] = [AgentId::Parser, AgentId::Search, AgentId::Verdict];

    /// Stable index into per-agent tables.
    pub const fn index(self) -> usize {
        match self {
            AgentId::Parser => 0,
            AgentId::Search => 1,
            AgentId::Verdict => 2,
        }
    }

    /// Returns the wire name of this agent.
    pub const fn as_str(self) -> &'static str {
        match self {
            AgentId::Parser => "parser",
            AgentId::Search => "search",
            AgentId::Verdict => "verdict",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of the verification event stream, as delivered on the wire.
///
/// Arrival order is the only order; records carry no sequence numbers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StreamEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Originating stage, when the event belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
    /// Short label for the sub-operation within the stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    /// Human-readable narrative for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Stage-specific structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Final verdict; present exactly when `event_type` is `Complete`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<VerifyResult>,
    /// Failure description; meaningful only on `Error` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set by the intake stage when the content is too vague to verify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_clarification: Option<bool>,
    /// Prompt shown to the caller when clarification is requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clarification_prompt: Option<String>,
}

impl StreamEvent {
    /// Returns true for `Complete` and `Error` events.
    pub fn is_terminal(&self) -> bool {
        matches!(self.event_type, EventType::Complete | EventType::Error)
    }

    /// Checks the wire invariant: a `result` payload appears on `Complete`
    /// events and nowhere else.
    pub(crate) fn check_result_coupling(&self) -> Result<(), &'static str> {
        match (self.event_type, self.result.is_some()) {
            (EventType::Complete, false) => Err("complete event is missing its result payload"),
            (EventType::Complete, true) => Ok(()),
            (_, true) => Err("result payload on a non-complete event"),
            (_, false) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_reasoning_event_with_agent_and_step() {
        let json = r#"{
            "type": "reasoning",
            "agent": "parser",
            "step": "strategy",
            "content": "extracting core entities"
        }"#;
        let event: StreamEvent = serde_json::from_str(json).expect("parse");
        assert_eq!(event.event_type, EventType::Reasoning);
        assert_eq!(event.agent, Some(AgentId::Parser));
        assert_eq!(event.step.as_deref(), Some("strategy"));
        assert!(event.result.is_none());
        assert!(!event.is_terminal());
    }

    #[test]
    fn unknown_agent_fails_to_deserialize() {
        let json = r#"{"type":"start","agent":"mystery"}"#;
        assert!(serde_json::from_str::<StreamEvent>(json).is_err());
    }

    #[test]
    fn unknown_type_fails_to_deserialize() {
        let json = r#"{"type":"heartbeat"}"#;
        assert!(serde_json::from_str::<StreamEvent>(json).is_err());
    }

    #[test]
    fn serialization_omits_absent_optional_fields() {
        let event = StreamEvent {
            event_type: EventType::Start,
            agent: Some(AgentId::Search),
            step: None,
            content: None,
            data: None,
            result: None,
            message: None,
            needs_clarification: None,
            clarification_prompt: None,
        };
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value, serde_json::json!({"type": "start", "agent": "search"}));
    }

    #[test]
    fn result_coupling_rejects_result_on_reasoning_event() {
        let json = r#"{"type":"reasoning","agent":"verdict","result":{
            "verdict_id":"v1","conclusion":"true","confidence_score":0.5,
            "summary":"s","evidence_list":[],"reasoning_chain":[]}}"#;
        let event: StreamEvent = serde_json::from_str(json).expect("parse");
        assert!(event.check_result_coupling().is_err());
    }

    #[test]
    fn result_coupling_rejects_complete_without_result() {
        let json = r#"{"type":"complete"}"#;
        let event: StreamEvent = serde_json::from_str(json).expect("parse");
        assert!(event.check_result_coupling().is_err());
    }

    #[test]
    fn agent_indices_cover_the_table() {
        for (position, agent) in AgentId::ALL.iter().enumerate() {
            assert_eq!(agent.index(), position);
        }
    }
}
