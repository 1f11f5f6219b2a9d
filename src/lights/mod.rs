//! Light control subsystem.
//!
//! # Data Flow
//! ```text
//! POST /lights/<op>
//!     → handlers.rs (parse body, build Command)
//!     → command.rs (range validation, before any device is touched)
//!     → executor.rs (sequential fan-out, one outcome per device)
//!     → handlers.rs (aggregate → 200 confirmation or 500)
//! ```

pub mod command;
pub mod executor;
pub mod handlers;

pub use command::{Command, InvalidParameter, NamedColor};
pub use executor::{AggregateCommandResult, DeviceCommandOutcome, FanOutExecutor};
