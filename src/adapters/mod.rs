//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements | Connects to                 |
//! |----------------|------------|-----------------------------|
//! | `memory_store` | StorePort  | In-process path/value map   |
//! | `clock`        | ClockPort  | Host wall clock / manual    |
//! | `log_sink`     | EventSink  | `log` output                |

pub mod clock;
pub mod log_sink;
pub mod memory_store;
