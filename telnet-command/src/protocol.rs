//! # Telnet Protocol Constants and Command Types
//!
//! The subset of RFC 854 a scripted client has to know about:
//!
//! ### IAC (Interpret As Command) - Byte 255
//! The IAC byte signals that the following byte(s) are a Telnet command
//! rather than data. During binary transfers the value 255 can legitimately
//! appear as payload, which is why clients expose a binary mode that treats
//! it as data instead of dispatching it.
//!
//! ### Negotiation Structure
//! Option negotiation follows the pattern `IAC <command> <option>` where
//! `<command>` is one of WILL, WONT, DO, DONT. A client that wants plain
//! NVT semantics answers every DO/DONT with WONT and every WILL/WONT with
//! DONT, declining whatever the remote proposes.

/// IAC - Interpret As Command (RFC 854, Section 4)
///
/// Introduces every in-band command sequence. A data byte of value 255 must
/// be escaped as IAC IAC, which this client treats as a protocol error in
/// text mode and as ordinary payload in binary mode.
pub const IAC: u8 = 255;

/// NUL control byte. Some servers pad line endings with it.
pub const NUL: u8 = 0;

/// Carriage return, the NVT end-of-line byte appended to outbound commands.
pub const CR: u8 = b'\r';

/// DC1 (XON) control byte, seen in flow-controlled streams.
pub const DC1: u8 = 17;

/// The four option-negotiation commands (RFC 854, Section 4)
///
/// Each follows IAC and is itself followed by a single option byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NegotiationCommand {
    /// WILL - sender wants to enable an option on its side
    /// Format: IAC WILL <option>
    Will = 251,

    /// WON'T - sender refuses or disables an option on its side
    /// Format: IAC WONT <option>
    Wont = 252,

    /// DO - sender asks the receiver to enable an option
    /// Format: IAC DO <option>
    Do = 253,

    /// DON'T - sender asks the receiver to disable an option
    /// Format: IAC DONT <option>
    Dont = 254,
}

impl NegotiationCommand {
    /// Convert a byte to a NegotiationCommand if it is one of the four
    /// negotiation commands.
    ///
    /// # Example
    /// ```
    /// use telnet_command::NegotiationCommand;
    ///
    /// assert_eq!(NegotiationCommand::from_byte(251), Some(NegotiationCommand::Will));
    /// assert_eq!(NegotiationCommand::from_byte(100), None);
    /// ```
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            251 => Some(NegotiationCommand::Will),
            252 => Some(NegotiationCommand::Wont),
            253 => Some(NegotiationCommand::Do),
            254 => Some(NegotiationCommand::Dont),
            _ => None,
        }
    }

    /// Convert the command to its byte representation
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// True for WILL/WONT, i.e. statements about the remote's own options.
    pub fn is_offer(self) -> bool {
        matches!(self, NegotiationCommand::Will | NegotiationCommand::Wont)
    }

    /// True for DO/DONT, i.e. requests about our options.
    pub fn is_request(self) -> bool {
        matches!(self, NegotiationCommand::Do | NegotiationCommand::Dont)
    }

    /// The command a refusing client answers with.
    ///
    /// Requests about our options (DO/DONT) are answered with WONT; offers
    /// about the remote's options (WILL/WONT) are answered with DONT.
    pub fn refusal(self) -> NegotiationCommand {
        match self {
            NegotiationCommand::Do | NegotiationCommand::Dont => NegotiationCommand::Wont,
            NegotiationCommand::Will | NegotiationCommand::Wont => NegotiationCommand::Dont,
        }
    }
}

/// Build the full 3-byte refusal reply for a received negotiation command.
///
/// # Example
/// ```
/// use telnet_command::{refusal_reply, NegotiationCommand, IAC};
///
/// // IAC DO 31 (NAWS) is refused with IAC WONT 31
/// assert_eq!(refusal_reply(NegotiationCommand::Do, 31), [IAC, 252, 31]);
/// ```
pub fn refusal_reply(command: NegotiationCommand, option: u8) -> [u8; 3] {
    [IAC, command.refusal().to_byte(), option]
}
