//! Generic CRUD management of one remote table.
//!
//! A [`ResourceSpec`] names the table, its ordering, its required fields and
//! its blank form; [`ResourceController`] does the rest.

pub mod confirm;
pub mod controller;
pub mod spec;

pub use confirm::{AssumeYes, Confirm};
pub(crate) use controller::SaveGuard;
pub use controller::{ControllerState, FetchOutcome, RemoveOutcome, ResourceController};
pub use spec::ResourceSpec;
