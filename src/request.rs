use serde::{Deserialize, Serialize};

use crate::error::{AutomationError, Result};

/// Highest color index MarginNote accepts (16 swatches).
pub const MAX_COLOR_INDEX: u8 = 15;

/// One automation intent, as sent by the command-palette host.
///
/// JSON form: `{"intent": "openNotebook", "id": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AutomationRequest {
    OpenNotebook { id: String },
    RestartApp,
    ActivateApp,
    CreateChildNote(NewChildNote),
    IsAppRunning { name: String },
    GetSelectionLink,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChildNote {
    #[serde(alias = "parentNoteId")]
    pub parent_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt_text: String,
    #[serde(default)]
    pub comment_text: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, alias = "color")]
    pub color_index: u8,
}

impl NewChildNote {
    pub fn validate(&self) -> Result<()> {
        if self.parent_id.trim().is_empty() {
            return Err(AutomationError::InvalidRequest("parent note id is empty".into()));
        }
        if self.color_index > MAX_COLOR_INDEX {
            return Err(AutomationError::InvalidRequest(format!(
                "color index {} is out of range 0-{MAX_COLOR_INDEX}",
                self.color_index
            )));
        }
        Ok(())
    }
}

impl AutomationRequest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| AutomationError::InvalidRequest(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            AutomationRequest::OpenNotebook { id } if id.trim().is_empty() => {
                Err(AutomationError::InvalidRequest("notebook id is empty".into()))
            }
            AutomationRequest::IsAppRunning { name } if name.trim().is_empty() => {
                Err(AutomationError::InvalidRequest("app name is empty".into()))
            }
            AutomationRequest::CreateChildNote(note) => note.validate(),
            _ => Ok(()),
        }
    }

    pub fn intent(&self) -> &'static str {
        match self {
            AutomationRequest::OpenNotebook { .. } => "openNotebook",
            AutomationRequest::RestartApp => "restartApp",
            AutomationRequest::ActivateApp => "activateApp",
            AutomationRequest::CreateChildNote(_) => "createChildNote",
            AutomationRequest::IsAppRunning { .. } => "isAppRunning",
            AutomationRequest::GetSelectionLink => "getSelectionLink",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionLink {
    pub text: String,
    pub link: String,
}

/// What the binary prints for a completed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    Done,
    Running { running: bool },
    NoteCreated { note_id: Option<String> },
    Selection(SelectionLink),
}
