//! JSON script files for unattended sessions
//!
//! A script is an ordered list of steps driven through the session facade:
//! log in, run commands, fire blind writes, wait for markers, or pull a
//! fixed number of raw bytes. Scripts are plain JSON so they can be kept
//! next to the device inventory they automate.
//!
//! ```json
//! {
//!   "name": "fetch interface counters",
//!   "steps": [
//!     { "action": "login", "username": "admin", "password": "secret" },
//!     { "action": "command", "command": "show counters" },
//!     { "action": "send", "text": "logout" }
//!   ]
//! }
//! ```

use crate::errors::TelnetResult;
use crate::session::TelnetSession;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::fs;

/// Errors raised while loading a script file
#[derive(Debug)]
pub enum ScriptError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Io(err) => write!(f, "Could not read script: {}", err),
            ScriptError::Parse(err) => write!(f, "Could not parse script: {}", err),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScriptError::Io(err) => Some(err),
            ScriptError::Parse(err) => Some(err),
        }
    }
}

/// An ordered sequence of session steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ScriptStep>,
}

/// One step of a scripted session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Drive the Login:/Password:/OK exchange
    Login { username: String, password: String },

    /// Execute a command and capture its output; prompts may be overridden
    /// per step
    Command {
        command: String,
        #[serde(default)]
        prompt: Option<String>,
        #[serde(default)]
        error_prompt: Option<String>,
    },

    /// Write without waiting for a response
    Send {
        text: String,
        #[serde(default = "default_newline")]
        newline: bool,
    },

    /// Wait until a marker appears and capture what preceded it
    Expect { prompt: String },

    /// Pull a fixed number of raw bytes (binary transfers)
    ReadBytes { count: usize },
}

fn default_newline() -> bool {
    true
}

/// The captured result of one executed step
#[derive(Debug, Clone)]
pub struct StepReport {
    pub label: String,
    pub output: String,
}

impl Script {
    pub fn load_from_file(path: &str) -> Result<Self, ScriptError> {
        let content = fs::read_to_string(path).map_err(ScriptError::Io)?;
        serde_json::from_str(&content).map_err(ScriptError::Parse)
    }

    /// Run every step in order against a connected session, stopping at the
    /// first failure. Step failures propagate unchanged so callers can
    /// inspect the error kind.
    pub fn run(&self, session: &mut TelnetSession) -> TelnetResult<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let report = match step {
                ScriptStep::Login { username, password } => {
                    session.login(username, password)?;
                    StepReport {
                        label: format!("login {}", username),
                        output: String::new(),
                    }
                }
                ScriptStep::Command {
                    command,
                    prompt,
                    error_prompt,
                } => {
                    let output =
                        session.execute(command, prompt.as_deref(), error_prompt.as_deref())?;
                    StepReport {
                        label: command.clone(),
                        output,
                    }
                }
                ScriptStep::Send { text, newline } => {
                    session.execute_blind(text, *newline)?;
                    StepReport {
                        label: format!("send {}", text),
                        output: String::new(),
                    }
                }
                ScriptStep::Expect { prompt } => {
                    let seen = session.read_until(Some(prompt), None)?;
                    StepReport {
                        label: format!("expect {}", prompt),
                        output: String::from_utf8_lossy(&seen).into_owned(),
                    }
                }
                ScriptStep::ReadBytes { count } => {
                    let bytes = session.read_bytes(*count)?;
                    StepReport {
                        label: format!("read {} bytes", count),
                        output: String::from_utf8_lossy(&bytes).into_owned(),
                    }
                }
            };
            reports.push(report);
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let json = r#"
{
  "name": "router check",
  "steps": [
    { "action": "login", "username": "admin", "password": "secret" },
    { "action": "command", "command": "show version", "prompt": "router>" },
    { "action": "send", "text": "exit" }
  ]
}
"#;
        let script: Script = serde_json::from_str(json).unwrap();
        assert_eq!(script.name.as_deref(), Some("router check"));
        assert_eq!(script.steps.len(), 3);

        assert!(matches!(
            &script.steps[1],
            ScriptStep::Command { command, prompt: Some(p), error_prompt: None }
                if command == "show version" && p == "router>"
        ));
    }

    #[test]
    fn test_send_defaults_to_newline() {
        let json = r#"{ "steps": [ { "action": "send", "text": "exit" } ] }"#;
        let script: Script = serde_json::from_str(json).unwrap();

        assert!(matches!(
            &script.steps[0],
            ScriptStep::Send { newline: true, .. }
        ));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let json = r#"{ "steps": [ { "action": "teleport", "where": "home" } ] }"#;
        assert!(serde_json::from_str::<Script>(json).is_err());
    }

    #[test]
    fn test_read_bytes_step() {
        let json = r#"{ "steps": [ { "action": "read_bytes", "count": 128 } ] }"#;
        let script: Script = serde_json::from_str(json).unwrap();

        assert!(matches!(&script.steps[0], ScriptStep::ReadBytes { count: 128 }));
    }
}
