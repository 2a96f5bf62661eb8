//! Server session bookkeeping for calcrpc.
//!
//! This crate describes server sessions without running them:
//!
//! 1. **Configuration**: per-session timeouts ([`SessionConfig`])
//! 2. **Lifecycle**: the request-cycle state machine ([`SessionPhase`])
//! 3. **Registry**: which connections currently have a live session
//!    ([`SessionRegistry`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← runs one task per session, updates the registry
//!     ↕
//! Session layer (this crate)  ← config, phases, registry
//!     ↕
//! Transport (below)  ← provides ConnectionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionRegistry;
pub use session::{SessionConfig, SessionInfo, SessionPhase};
