//! # Telnet Command Library
//!
//! A small library describing the in-band command bytes of the Telnet
//! protocol (RFC 854) from the point of view of a scripting client that
//! never accepts options:
//! - `protocol`: command-introducer and control byte constants, the four
//!   negotiation commands, and the fixed refusal replies
//!
//! The scope is deliberately narrow. A scripted client only ever has to
//! recognize `IAC <command> <option>` sequences and answer each offer or
//! request with the matching refusal (`WONT`/`DONT`). Sub-negotiation and
//! option state tracking are out of scope here.

pub mod protocol;

pub use protocol::{CR, DC1, IAC, NUL, NegotiationCommand, refusal_reply};
