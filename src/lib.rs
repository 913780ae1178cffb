//! Host side of a Lua-configured mail filter.
//!
//! A run starts one Lua engine, installs the host's capability modules
//! (`ifcore`, `ifsys`, `ifre`), seeds the `options` table, executes the fixed
//! bootstrap fragments and then the user's configuration, and optionally hands
//! the same engine to an interactive read-eval-print loop.

pub mod bindings;
pub mod bootstrap;
pub mod cli;
pub mod error;
pub mod interpreter;
pub mod options;
pub mod repl;
pub mod session;

pub use bootstrap::{BootstrapSequence, ConfigSource, Fragment};
pub use error::{ConfigError, EXIT_CONFIG, ScriptError};
pub use interpreter::Interpreter;
pub use session::{Session, Settings};
