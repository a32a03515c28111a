//! # telscript
//!
//! A scripted, synchronous Telnet client: open a connection, send command
//! text, and read the response byte-at-a-time until a configured prompt (or
//! error prompt) appears, transparently refusing any option negotiation the
//! remote attempts along the way.
//!
//! The crate is organized around [`session::TelnetSession`], which owns the
//! connection, the per-command buffer, and the full-session transcript.
//! [`script::Script`] layers unattended multi-step runs on top of the
//! session facade, and the `telscript` binary drives scripts from the
//! command line.

pub mod config;
pub mod errors;
pub mod script;
pub mod session;

pub use config::SessionConfig;
pub use errors::{TelnetError, TelnetResult};
pub use script::{Script, ScriptStep, StepReport};
pub use session::TelnetSession;
