//! Confab — tool-confirmation orchestration core for agent chat clients.
//!
//! A chat client drives a conversational agent whose tool calls may need
//! human approval or client-side (capability) execution before the turn can
//! continue. Confab owns the part that is easy to get wrong: deciding,
//! deterministically and exactly once per distinct approval state, when the
//! accumulated tool state of the current round must be flushed back to the
//! agent, without duplicate or missing resubmissions on either transport
//! binding.
//!
//! # Quick Start
//!
//! ```no_run
//! use confab::prelude::*;
//!
//! let mut session = ChatSession::new(SessionConfig::default());
//! session.store_mut().push(ChatMessage::user("what's the weather?"));
//! // ... apply inbound frames as they arrive, then:
//! if let Some(action) = session.take_action() {
//!     // hand the action to a transport binding
//!     let _ = action;
//! }
//! ```

pub mod capability;
pub mod config;
pub mod deferred;
pub mod engine;
pub mod error;
pub mod policy;
pub mod prelude;
pub mod round;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;
