//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, TubeQaError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Building an index needs yt-dlp and the embedding key.
    Index,
    /// Asking may build an index and always calls the language model.
    Ask,
    /// Search may build an index but never calls the language model.
    Search,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Index | Operation::Search => {
            check_api_key(&settings.embedding.api_key_env)?;
            check_tool(&settings.captions.ytdlp_path)?;
        }
        Operation::Ask => {
            for env in settings.required_key_envs() {
                check_api_key(env)?;
            }
            check_tool(&settings.captions.ytdlp_path)?;
        }
    }
    Ok(())
}

/// Check that an API key variable is set and non-empty.
fn check_api_key(env: &str) -> Result<()> {
    match std::env::var(env) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(TubeQaError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            env, env
        ))),
        Err(_) => Err(TubeQaError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            env, env
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(TubeQaError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(TubeQaError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(TubeQaError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reported_by_name() {
        let mut settings = Settings::default();
        settings.embedding.api_key_env = "TUBEQA_TEST_UNSET_KEY".to_string();

        let err = check(Operation::Index, &settings).unwrap_err();
        assert!(err.to_string().contains("TUBEQA_TEST_UNSET_KEY not set"));
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("tubeqa-no-such-tool").unwrap_err();
        assert!(matches!(err, TubeQaError::ToolNotFound(_)));
    }
}
