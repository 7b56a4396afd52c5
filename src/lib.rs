//! Streaming client for a multi-agent content verification pipeline.
//!
//! A caller submits a piece of content and the remote service streams back
//! progress events from its three stages (`parser`, `search`, `verdict`) until
//! a final verdict or an error arrives. This crate decodes that stream, groups
//! events by stage, tracks a coarse progress phase, and settles exactly one
//! terminal outcome per session.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use veristream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), VerifyError> {
//! let source = HttpEventSource::new(HttpSourceConfig::new("http://localhost:8000"))?;
//! let mut store = SessionStore::new(Arc::new(source));
//!
//! store.start(VerifyRequest::new("Company X announced bankruptcy today"))?;
//! while store.changed().await {
//!     let state = store.state();
//!     println!("{} ({} events)", state.phase, state.events.len());
//! }
//!
//! match store.wait().await {
//!     Ok(verdict) => println!("{:?}: {}", verdict.conclusion, verdict.summary),
//!     Err(err) => eprintln!("{err}"),
//! }
//! # Ok(())
//! # }
//! ```

/// Session state, per-agent grouping, and the event fold.
pub mod aggregate;
/// Public error types and canned outcome messages.
pub mod errors;
/// Typed stream events and the fixed agent set.
pub mod event;
/// HTTP/SSE transport for the verification service.
pub mod http;
/// Coarse progress phases derived from stage activity.
pub mod phase;
/// Common imports for typical usage.
pub mod prelude;
/// Record reassembly and the typed event reader.
pub mod reader;
/// Session store, reentrancy guard, and the stream driver.
pub mod session;
/// Transport seam: requests and the event source trait.
pub mod source;
/// Final verdict payload and nested analyses.
pub mod verdict;

pub use aggregate::{AgentStatus, SessionState, SessionStatus};
pub use errors::{
    CONNECTION_CLOSED_MESSAGE, REMOTE_FAILURE_MESSAGE, ReadError, SourceError, VerifyError,
};
pub use event::{AGENT_COUNT, AgentId, EventType, StreamEvent};
pub use http::{HttpEventSource, HttpSourceConfig};
pub use phase::Phase;
pub use reader::EventReader;
pub use session::SessionStore;
pub use source::{ByteStream, EventSource, SourceHandle, VerifyRequest};
pub use verdict::{
    Conclusion, Evidence, EvidenceType, SourceCredibility, SourceStance, VerifyResult,
};
