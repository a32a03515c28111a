//! # TelnetSession - Scripted Telnet Client Engine
//!
//! The protocol engine for driving a command-line interface over Telnet
//! without a human operator: write a command, then read byte-at-a-time until
//! a configured prompt (or error prompt) appears, transparently refusing any
//! option negotiation the remote attempts in between.
//!
//! ## Buffer model
//!
//! The session keeps two buffers:
//! - the **per-command buffer**, reset at the start of every write and every
//!   read; prompt matching only ever runs against this buffer
//! - the **transcript**, an append-only record of every byte read from and
//!   written to the connection over the session's life
//!
//! ## Concurrency model
//!
//! One session, one thread, one connection, strictly sequential blocking
//! operations. The timeout is checked once per byte read, so a single
//! blocking read can overshoot the configured budget by at most its own
//! blocking duration (bounded by the socket read timeout set at connect).

use crate::config::SessionConfig;
use crate::errors::{TelnetError, TelnetResult};

use telnet_command::{CR, IAC, NegotiationCommand, refusal_reply};

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Transport abstraction so the engine composes over any ordered, reliable
/// byte stream: a TcpStream in production, a scripted stream in tests.
pub trait Transport: Read + Write + Send {}
impl<T: Read + Write + Send> Transport for T {}

/// One byte pulled from the connection.
enum Pulled {
    /// A data or command byte (already appended to the transcript)
    Data(u8),
    /// The remote closed the stream
    End,
    /// The socket-level read timeout elapsed with nothing to deliver;
    /// callers loop and re-check their own deadline
    Pending,
}

/// A scripted, synchronous Telnet client session
pub struct TelnetSession {
    config: SessionConfig,
    stream: Option<Box<dyn Transport>>,

    /// Output accumulated since the last write or explicit clear
    buffer: Vec<u8>,

    /// Every byte exchanged over the life of the session, never truncated
    transcript: Vec<u8>,
}

impl TelnetSession {
    /// Create a session from its configuration. Construction never connects;
    /// call [`connect`](Self::connect) separately.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            stream: None,
            buffer: Vec::new(),
            transcript: Vec::new(),
        }
    }

    /// Resolve the configured host and open the TCP connection.
    ///
    /// The socket read timeout is set to the session timeout so that no
    /// single byte read can block indefinitely. May be called again after
    /// [`disconnect`](Self::disconnect).
    pub fn connect(&mut self) -> TelnetResult<()> {
        if self.stream.is_some() {
            return Err(TelnetError::Connection(
                "a connection is already open".to_string(),
            ));
        }

        let address = format!(
            "{}:{}",
            self.config.connection.host, self.config.connection.port
        );
        let mut addrs = address
            .to_socket_addrs()
            .map_err(|e| TelnetError::Connection(format!("could not resolve {}: {}", address, e)))?;
        let addr = addrs.next().ok_or_else(|| {
            TelnetError::Connection(format!("{} resolved to no addresses", address))
        })?;

        let stream = TcpStream::connect_timeout(&addr, self.config.connection.timeout)
            .map_err(|e| TelnetError::Connection(format!("connect to {} failed: {}", addr, e)))?;
        stream
            .set_read_timeout(Some(self.config.connection.timeout))
            .map_err(|e| TelnetError::Connection(e.to_string()))?;

        self.stream = Some(Box::new(stream));
        Ok(())
    }

    /// Adopt an already-open transport (a pre-connected socket, a tunnel,
    /// or a scripted stream in tests) in place of [`connect`](Self::connect).
    pub fn attach<S: Read + Write + Send + 'static>(&mut self, stream: S) {
        self.stream = Some(Box::new(stream));
    }

    /// Close the connection if one is open. Idempotent.
    pub fn disconnect(&mut self) -> TelnetResult<()> {
        if let Some(mut stream) = self.stream.take() {
            stream
                .flush()
                .map_err(|e| TelnetError::Connection(format!("close failed: {}", e)))?;
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    // --- Session configuration, effective at the next read ---

    pub fn prompt(&self) -> &str {
        &self.config.prompts.prompt
    }

    pub fn set_prompt<S: Into<String>>(&mut self, prompt: S) {
        self.config.prompts.prompt = prompt.into();
    }

    pub fn error_prompt(&self) -> &str {
        &self.config.prompts.error_prompt
    }

    pub fn set_error_prompt<S: Into<String>>(&mut self, error_prompt: S) {
        self.config.prompts.error_prompt = error_prompt.into();
    }

    pub fn timeout(&self) -> Duration {
        self.config.connection.timeout
    }

    /// Change the session timeout. Takes full effect (including the socket
    /// read timeout) on the next [`connect`](Self::connect).
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.connection.timeout = timeout;
    }

    pub fn binary_mode(&self) -> bool {
        self.config.transfer.binary_mode
    }

    pub fn set_binary_mode(&mut self, binary_mode: bool) {
        self.config.transfer.binary_mode = binary_mode;
    }

    // --- Buffer model ---

    /// The per-command buffer as accumulated by the last read.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Reset the per-command buffer only; the transcript is untouched.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// The full-session transcript: every byte sent and received so far,
    /// in chronological order.
    pub fn transcript(&self) -> &[u8] {
        &self.transcript
    }

    // --- Write engine ---

    /// Send `text` over the connection, appending a carriage return when
    /// `append_newline` is set.
    ///
    /// The per-command buffer is cleared before anything is sent, so no
    /// reader can ever observe a partially written command in it. The
    /// outbound bytes are appended to the transcript at send time.
    pub fn write(&mut self, text: &str, append_newline: bool) -> TelnetResult<()> {
        if self.stream.is_none() {
            return Err(TelnetError::NotConnected);
        }

        self.buffer.clear();

        let mut outbound = text.as_bytes().to_vec();
        if append_newline {
            outbound.push(CR);
        }
        self.send_bytes(&outbound)
    }

    /// Transcript-then-send, shared by the write engine and the negotiator.
    fn send_bytes(&mut self, bytes: &[u8]) -> TelnetResult<()> {
        self.transcript.extend_from_slice(bytes);

        let stream = self.stream.as_mut().ok_or(TelnetError::NotConnected)?;
        stream.write_all(bytes).map_err(TelnetError::WriteFailed)?;
        stream.flush().map_err(TelnetError::WriteFailed)
    }

    // --- Byte source ---

    /// Pull one byte from the connection. Every byte successfully read is
    /// appended to the transcript before it is returned.
    fn next_byte(&mut self) -> TelnetResult<Pulled> {
        let stream = self.stream.as_mut().ok_or(TelnetError::NotConnected)?;

        let mut byte = [0u8; 1];
        match stream.read(&mut byte) {
            Ok(0) => Ok(Pulled::End),
            Ok(_) => {
                self.transcript.push(byte[0]);
                Ok(Pulled::Data(byte[0]))
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(Pulled::Pending)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Pull the byte following a command introducer, waiting out socket
    /// timeout ticks.
    fn next_command_byte(&mut self) -> TelnetResult<u8> {
        loop {
            match self.next_byte()? {
                Pulled::Data(byte) => return Ok(byte),
                Pulled::End => {
                    return Err(TelnetError::UnexpectedEof {
                        partial: self.buffer.clone(),
                    });
                }
                Pulled::Pending => continue,
            }
        }
    }

    // --- Option negotiator ---

    /// Handle a command-introducer byte that was just read.
    ///
    /// In binary mode the introducer is payload: it is mirrored into the
    /// per-command buffer (it is already in the transcript) and nothing
    /// further is consumed. In text mode exactly one command byte and one
    /// option byte are consumed and the fixed refusal is sent back; none of
    /// those bytes reach the per-command buffer.
    fn handle_command(&mut self) -> TelnetResult<()> {
        if self.config.transfer.binary_mode {
            self.buffer.push(IAC);
            return Ok(());
        }

        let command = self.next_command_byte()?;
        if command == IAC {
            return Err(TelnetError::Protocol(
                "unexpected doubled IAC in stream".to_string(),
            ));
        }
        let command = NegotiationCommand::from_byte(command).ok_or_else(|| {
            TelnetError::Protocol(format!("unknown command byte {} after IAC", command))
        })?;

        let option = self.next_command_byte()?;
        self.send_bytes(&refusal_reply(command, option))
    }

    // --- Read engine ---

    /// Read with the session's configured prompts. See
    /// [`read_until`](Self::read_until).
    pub fn read(&mut self) -> TelnetResult<Vec<u8>> {
        self.read_until(None, None)
    }

    /// Read until the prompt (or error prompt) appears as a suffix of the
    /// per-command buffer, bounded by the session timeout.
    ///
    /// `None` falls back to the corresponding configured prompt. On success
    /// the buffer content is returned with the trailing prompt bytes
    /// removed. The error prompt is checked before the prompt, so on a tie
    /// the error wins. Empty patterns never match; neither does a buffer
    /// still shorter than the pattern.
    pub fn read_until(
        &mut self,
        prompt: Option<&str>,
        error_prompt: Option<&str>,
    ) -> TelnetResult<Vec<u8>> {
        if self.stream.is_none() {
            return Err(TelnetError::NotConnected);
        }

        let prompt = prompt.unwrap_or(&self.config.prompts.prompt).to_string();
        let error_prompt = error_prompt
            .unwrap_or(&self.config.prompts.error_prompt)
            .to_string();
        let timeout = self.config.connection.timeout;
        let started = Instant::now();

        self.buffer.clear();

        loop {
            if started.elapsed() > timeout {
                return Err(TelnetError::Timeout {
                    prompt,
                    after: timeout,
                });
            }

            match self.next_byte()? {
                Pulled::Pending => continue,
                Pulled::End => {
                    return Err(TelnetError::UnexpectedEof {
                        partial: self.buffer.clone(),
                    });
                }
                Pulled::Data(IAC) => {
                    self.handle_command()?;
                    continue;
                }
                Pulled::Data(byte) => self.buffer.push(byte),
            }

            if tail_matches(&self.buffer, error_prompt.as_bytes()) {
                return Err(TelnetError::Remote(
                    "command returned error status".to_string(),
                ));
            }
            if tail_matches(&self.buffer, prompt.as_bytes()) {
                let end = self.buffer.len() - prompt.len();
                return Ok(self.buffer[..end].to_vec());
            }
        }
    }

    // --- Fixed-length reader ---

    /// Read exactly `count` data bytes, with no timeout: blocks until
    /// satisfied or the stream ends.
    ///
    /// In text mode, command-introducer bytes dispatch to the negotiator
    /// and the negotiated bytes do not count. In binary mode the introducer
    /// is ordinary data and counts like any other byte.
    pub fn read_bytes(&mut self, count: usize) -> TelnetResult<Vec<u8>> {
        if self.stream.is_none() {
            return Err(TelnetError::NotConnected);
        }

        self.buffer.clear();

        let mut remaining = count;
        while remaining > 0 {
            match self.next_byte()? {
                Pulled::Pending => continue,
                Pulled::End => {
                    return Err(TelnetError::UnexpectedEof {
                        partial: self.buffer.clone(),
                    });
                }
                Pulled::Data(IAC) if !self.config.transfer.binary_mode => {
                    self.handle_command()?;
                }
                Pulled::Data(byte) => {
                    self.buffer.push(byte);
                    remaining -= 1;
                }
            }
        }

        Ok(self.buffer.clone())
    }

    // --- Execution facade ---

    /// Send a command and return its output with the echoed prompt line
    /// removed and surrounding whitespace trimmed.
    ///
    /// In binary mode the write is blind and an empty string is returned;
    /// callers are expected to collect the response with
    /// [`read_bytes`](Self::read_bytes).
    pub fn execute(
        &mut self,
        command: &str,
        prompt: Option<&str>,
        error_prompt: Option<&str>,
    ) -> TelnetResult<String> {
        if self.config.transfer.binary_mode {
            self.write(command, true)?;
            return Ok(String::new());
        }

        self.write(command, true)?;
        let response = self.read_until(prompt, error_prompt)?;

        let text = String::from_utf8_lossy(&response);
        let body = match text.rfind('\n') {
            Some(pos) => &text[..pos],
            None => "",
        };
        Ok(body.trim().to_string())
    }

    /// Send a command without reading a response and without disturbing
    /// the per-command buffer as seen by the caller.
    pub fn execute_blind(&mut self, command: &str, append_newline: bool) -> TelnetResult<()> {
        let preserved = std::mem::take(&mut self.buffer);
        let outcome = self.write(command, append_newline);
        self.buffer = preserved;
        outcome
    }

    /// Drive the fixed `Login:` / `Password:` / `OK` exchange. Any failure
    /// along the way is re-signaled as `LoginFailed` wrapping the cause.
    pub fn login(&mut self, username: &str, password: &str) -> TelnetResult<()> {
        self.login_sequence(username, password)
            .map_err(|cause| TelnetError::LoginFailed(Box::new(cause)))
    }

    fn login_sequence(&mut self, username: &str, password: &str) -> TelnetResult<()> {
        self.read_until(Some("Login:"), None)?;
        self.write(username, true)?;
        self.read_until(Some("Password:"), None)?;
        self.write(password, true)?;
        self.read_until(Some("OK"), None)?;
        Ok(())
    }
}

/// Literal byte-wise suffix comparison over the last `pattern.len()` bytes.
/// Empty patterns and buffers shorter than the pattern never match.
fn tail_matches(buffer: &[u8], pattern: &[u8]) -> bool {
    !pattern.is_empty()
        && buffer.len() >= pattern.len()
        && &buffer[buffer.len() - pattern.len()..] == pattern
}
