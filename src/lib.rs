//! Smart Pillbox dashboard core.
//!
//! Turns telemetry pushed through a hosted real-time store into
//! dashboard state (connection status, cup and sensor view, device
//! alerts, next dose) and writes configuration and device commands back.
//! All store, clock and presentation access goes through the port traits
//! in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod alert;
pub mod app;
pub mod config;
pub mod connection;
pub mod error;
pub mod refill;
pub mod runtime;
pub mod schedule;
pub mod telemetry;
