//! Application core: pure dashboard logic, zero I/O.
//!
//! The [`service::Dashboard`] owns all session state.  The hosted store,
//! the wall clock and the presentation layer are reached only through
//! the **port traits** in [`ports`], so the whole core runs against mock
//! adapters in tests.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
