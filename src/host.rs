use tokio::process::Command;
use tracing::debug;

use crate::error::{AutomationError, Result, ScriptResult, parse_error_code};

/// The operating-system side of every automation: the AppleScript
/// interpreter and the system-wide text selection.
pub trait ScriptHost {
    async fn run_script(&self, script: &str) -> Result<ScriptResult>;

    async fn selected_text(&self) -> Result<String>;
}

/// Runs scripts through `osascript` (or a configured replacement).
pub struct OsaHost {
    command: String,
}

impl OsaHost {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl ScriptHost for OsaHost {
    async fn run_script(&self, script: &str) -> Result<ScriptResult> {
        debug!(interpreter = %self.command, script, "running script");
        let out = Command::new(&self.command)
            .args(["-e", script])
            .kill_on_drop(true)
            .output()
            .await?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(AutomationError::Interpreter {
                code: parse_error_code(&stderr),
                message: if stderr.is_empty() {
                    format!("exited with {}", out.status)
                } else {
                    stderr
                },
            });
        }

        let stdout = String::from_utf8_lossy(&out.stdout);
        let result = ScriptResult::from_output(&stdout);
        debug!(result = ?result, "script finished");
        Ok(result)
    }

    #[cfg(target_os = "macos")]
    async fn selected_text(&self) -> Result<String> {
        // selection::get_text is blocking (accessibility API, clipboard fallback).
        tokio::task::spawn_blocking(selection::get_text)
            .await
            .map_err(|e| AutomationError::Interpreter {
                message: format!("selection task failed: {e}"),
                code: None,
            })
    }

    #[cfg(not(target_os = "macos"))]
    async fn selected_text(&self) -> Result<String> {
        Err(AutomationError::Unsupported("reading the system selection"))
    }
}
