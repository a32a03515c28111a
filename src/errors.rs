use std::fmt;
use std::time::Duration;

/// Custom error types for the scripted telnet client
#[derive(Debug)]
pub enum TelnetError {
    /// Host resolution, transport connect, or close failed
    Connection(String),

    /// Operation attempted with no open connection
    NotConnected,

    /// The sought prompt was not observed within the configured timeout
    Timeout { prompt: String, after: Duration },

    /// The stream ended before a prompt or byte-count target was reached;
    /// carries whatever had accumulated in the per-command buffer
    UnexpectedEof { partial: Vec<u8> },

    /// The per-command buffer matched the configured error prompt
    Remote(String),

    /// Malformed or unrecognized in-band command sequence
    Protocol(String),

    /// Outbound send did not complete
    WriteFailed(std::io::Error),

    /// A step of the login sequence failed; wraps the underlying cause
    LoginFailed(Box<TelnetError>),

    /// Other I/O errors on the transport
    Io(std::io::Error),
}

impl fmt::Display for TelnetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelnetError::Connection(msg) => write!(f, "Connection error: {}", msg),
            TelnetError::NotConnected => write!(f, "No connection is open"),
            TelnetError::Timeout { prompt, after } => write!(
                f,
                "Timed out after {:.1}s waiting for prompt {:?}",
                after.as_secs_f64(),
                prompt
            ),
            TelnetError::UnexpectedEof { partial } => write!(
                f,
                "Stream ended unexpectedly ({} bytes buffered: {:?})",
                partial.len(),
                String::from_utf8_lossy(partial)
            ),
            TelnetError::Remote(msg) => write!(f, "Remote error: {}", msg),
            TelnetError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            TelnetError::WriteFailed(err) => write!(f, "Write failed: {}", err),
            TelnetError::LoginFailed(cause) => write!(f, "Login failed: {}", cause),
            TelnetError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for TelnetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelnetError::WriteFailed(err) => Some(err),
            TelnetError::Io(err) => Some(err),
            TelnetError::LoginFailed(cause) => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TelnetError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
                TelnetError::UnexpectedEof { partial: Vec::new() }
            }
            _ => TelnetError::Io(err),
        }
    }
}

impl From<crate::config::ConfigError> for TelnetError {
    fn from(err: crate::config::ConfigError) -> Self {
        TelnetError::Connection(err.to_string())
    }
}

/// Result type alias for telnet client operations
pub type TelnetResult<T> = Result<T, TelnetError>;
