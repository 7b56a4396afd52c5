//! Common imports for typical usage.
//!
//! Exports the session store, request/response types, and the transport
//! pieces most applications need, so call sites keep their import lists short.
pub use crate::{
    AgentId, AgentStatus, Conclusion, EventSource, EventType, Evidence, HttpEventSource,
    HttpSourceConfig, Phase, SessionState, SessionStatus, SessionStore, StreamEvent, VerifyError,
    VerifyRequest, VerifyResult,
};
