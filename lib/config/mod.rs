use std::env;
use thiserror::Error;

use crate::dispatch::DEFAULT_SHELL;

pub const SHELL_ENV_VAR: &str = "XLOG_PROCESSOR_SHELL";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptyValue(&'static str),
}

pub struct Config {
    /// Shell used as `<shell> -c <command>`. Default: `sh`
    pub shell: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_shell_var(env::var(SHELL_ENV_VAR).ok())
    }

    fn from_shell_var(shell: Option<String>) -> Result<Self, ConfigError> {
        let shell = match shell {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::EmptyValue(SHELL_ENV_VAR))
            }
            Some(value) => value,
            None => DEFAULT_SHELL.to_string(),
        };
        Ok(Self { shell })
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, SHELL_ENV_VAR};

    #[test]
    fn shell_defaults_to_sh() {
        let config = Config::from_shell_var(None).expect("default config");
        assert_eq!(config.shell, "sh");
    }

    #[test]
    fn shell_override_is_used_verbatim() {
        let config = Config::from_shell_var(Some("/bin/bash".to_string())).expect("config");
        assert_eq!(config.shell, "/bin/bash");
    }

    #[test]
    fn blank_shell_is_rejected() {
        let err = Config::from_shell_var(Some("  ".to_string())).err();
        assert_eq!(err, Some(ConfigError::EmptyValue(SHELL_ENV_VAR)));
    }
}
