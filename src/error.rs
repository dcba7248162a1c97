use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("failed to start script interpreter: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("script interpreter failed{}: {message}", code_suffix(.code))]
    Interpreter { message: String, code: Option<i32> },

    #[error("timed out waiting for {condition} after {attempts} checks")]
    Timeout {
        condition: &'static str,
        attempts: u32,
    },

    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

fn code_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, AutomationError>;

/// Decoded interpreter output. Failures live on the `Err` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptResult {
    Text(String),
    Bool(bool),
    /// The script ran but produced nothing, e.g. a guarded lookup that found no note.
    Absent,
}

impl ScriptResult {
    pub fn from_output(raw: &str) -> Self {
        match raw.trim() {
            "" | "missing value" => ScriptResult::Absent,
            "true" => ScriptResult::Bool(true),
            "false" => ScriptResult::Bool(false),
            other => ScriptResult::Text(other.to_string()),
        }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, ScriptResult::Bool(true))
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            ScriptResult::Text(s) => Some(s),
            ScriptResult::Bool(b) => Some(b.to_string()),
            ScriptResult::Absent => None,
        }
    }
}

/// Pulls the AppleScript error number out of osascript's stderr,
/// e.g. `execution error: Can’t get note. (-1728)`.
pub(crate) fn parse_error_code(stderr: &str) -> Option<i32> {
    let trimmed = stderr.trim_end();
    let inner = trimmed.strip_suffix(')')?;
    let start = inner.rfind('(')?;
    inner[start + 1..].parse().ok()
}
