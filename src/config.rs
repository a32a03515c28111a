use std::fmt;
use std::fs;
use std::time::Duration;

/// Errors raised while loading or parsing a session config file
#[derive(Debug)]
pub enum ConfigError {
    UnknownSection(String),
    UnknownKey(String),
    InvalidValue(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownSection(section) => write!(f, "Unknown section: [{}]", section),
            ConfigError::UnknownKey(key) => write!(f, "Unknown key: {}", key),
            ConfigError::InvalidValue(key, value) => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Session configuration for a scripted telnet connection
///
/// All fields may be changed between commands through the session's
/// setters; the read engine samples them at the start of each read.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub connection: ConnectionConfig,
    pub prompts: PromptConfig,
    pub transfer: TransferConfig,
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Tail string whose appearance means a command's output is complete
    pub prompt: String,
    /// Tail string whose appearance means the remote reported a failure
    pub error_prompt: String,
}

#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// When set, IAC is treated as payload and negotiation is disabled
    pub binary_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                host: "127.0.0.1".to_string(),
                port: 23,
                timeout: Duration::from_secs(10),
            },
            prompts: PromptConfig {
                prompt: "$".to_string(),
                error_prompt: "ERROR".to_string(),
            },
            transfer: TransferConfig { binary_mode: false },
        }
    }
}

impl SessionConfig {
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse_config(&content),
            Err(_) => {
                // Create default config file if it doesn't exist
                let default_config = Self::default();
                let config_content = default_config.to_config_file_format();
                if let Err(e) = fs::write(path, config_content) {
                    eprintln!("Warning: Could not create default config file: {}", e);
                }
                Ok(default_config)
            }
        }
    }

    fn parse_config(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for line in content.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Handle sections
            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].to_string();
                continue;
            }

            // Handle key-value pairs
            if let Some(eq_pos) = line.find('=') {
                let key = line[..eq_pos].trim();
                let value = line[eq_pos + 1..].trim().trim_matches('"');

                match current_section.as_str() {
                    "connection" => config.parse_connection_config(key, value)?,
                    "prompts" => config.parse_prompt_config(key, value)?,
                    "transfer" => config.parse_transfer_config(key, value)?,
                    _ => return Err(ConfigError::UnknownSection(current_section.clone())),
                }
            }
        }

        Ok(config)
    }

    fn parse_connection_config(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "host" => {
                self.connection.host = value.to_string();
            }
            "port" => {
                self.connection.port = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string(), value.to_string()))?;
            }
            "timeout_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string(), value.to_string()))?;
                self.connection.timeout = Duration::from_secs(secs);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    fn parse_prompt_config(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "prompt" => {
                self.prompts.prompt = value.to_string();
            }
            "error_prompt" => {
                self.prompts.error_prompt = value.to_string();
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    fn parse_transfer_config(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "binary_mode" => {
                self.transfer.binary_mode = value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string(), value.to_string()))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    fn to_config_file_format(&self) -> String {
        format!(
            r#"# telscript session configuration

[connection]
host = "{}"
port = {}
timeout_secs = {}

[prompts]
prompt = "{}"
error_prompt = "{}"

[transfer]
binary_mode = {}
"#,
            self.connection.host,
            self.connection.port,
            self.connection.timeout.as_secs(),
            self.prompts.prompt,
            self.prompts.error_prompt,
            self.transfer.binary_mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.connection.port, 23);
        assert_eq!(config.connection.timeout, Duration::from_secs(10));
        assert_eq!(config.prompts.prompt, "$");
        assert_eq!(config.prompts.error_prompt, "ERROR");
        assert!(!config.transfer.binary_mode);
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
# scripted router session
[connection]
host = "10.0.0.1"
port = 2323
timeout_secs = 30

[prompts]
prompt = "router>"
error_prompt = "% Invalid"

[transfer]
binary_mode = true
"#;
        let config = SessionConfig::parse_config(content).unwrap();
        assert_eq!(config.connection.host, "10.0.0.1");
        assert_eq!(config.connection.port, 2323);
        assert_eq!(config.connection.timeout, Duration::from_secs(30));
        assert_eq!(config.prompts.prompt, "router>");
        assert_eq!(config.prompts.error_prompt, "% Invalid");
        assert!(config.transfer.binary_mode);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let content = "[nonsense]\nkey = 1\n";
        assert!(matches!(
            SessionConfig::parse_config(content),
            Err(ConfigError::UnknownSection(_))
        ));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let content = "[connection]\nport = notaport\n";
        assert!(matches!(
            SessionConfig::parse_config(content),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }

    #[test]
    fn test_load_from_file_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let config = SessionConfig {
            connection: ConnectionConfig {
                host: "host.example".to_string(),
                port: 9923,
                timeout: Duration::from_secs(5),
            },
            prompts: PromptConfig {
                prompt: "#".to_string(),
                error_prompt: "FAIL".to_string(),
            },
            transfer: TransferConfig { binary_mode: false },
        };
        file.write_all(config.to_config_file_format().as_bytes())
            .unwrap();

        let loaded = SessionConfig::load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.connection.host, "host.example");
        assert_eq!(loaded.connection.port, 9923);
        assert_eq!(loaded.prompts.prompt, "#");
        assert_eq!(loaded.prompts.error_prompt, "FAIL");
    }
}
