//! The pure channel kernel.
//!
//! Nothing in here awaits or touches an engine. Events go in through
//! [`coordinator::Coordinator::handle`], and [`scheduler::SideEffect`]s come
//! out for the driver to execute.

pub mod coordinator;
pub mod event;
pub mod scheduler;
pub mod speech;
pub mod state;
pub mod telemetry;
