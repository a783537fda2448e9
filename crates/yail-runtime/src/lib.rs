//! YAIL runtime: the interpreter core, per-screen environments, event
//! dispatch and builtin primitives.

pub mod builtins;
mod config;
mod environment;
mod eval;
mod events;
pub mod global;
mod interpreter;
mod native;

pub use config::{ConfigError, RuntimeConfig};
pub use environment::{Binding, Environment, Procedure};
pub use events::{Dispatched, EventCallback, EventKey, EventRegistry, run_callbacks};
pub use global::GlobalError;
pub use interpreter::{GcStats, Interpreter, NO_BLOCK, Screen};
