//! Session state shared by every protected surface.
//!
//! A single [`SessionProvider`] is mounted at the root; it owns the only
//! session-change subscription. Protected routes hold a [`SessionGate`].

pub mod gate;
pub mod provider;

pub use gate::{GateView, Redirect, SessionGate};
pub use provider::{SessionContext, SessionProvider, SessionState};
