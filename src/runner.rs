use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{AutomationError, Result, ScriptResult};
use crate::host::ScriptHost;
use crate::request::{AutomationRequest, NewChildNote, Response, SelectionLink};
use crate::script::Script;
use crate::settings::Settings;
use crate::templates::{self, Browser, NotebookBranch};

// ---------------------------------------------------------------------------
// Process states watched by the bounded poll
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum AppState {
    Running,
    Frontmost,
}

impl AppState {
    fn describe(self, expected: bool) -> &'static str {
        match (self, expected) {
            (AppState::Running, true) => "app to start",
            (AppState::Running, false) => "app to quit",
            (AppState::Frontmost, true) => "app to become frontmost",
            (AppState::Frontmost, false) => "app to leave the foreground",
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptRunner
// ---------------------------------------------------------------------------

pub struct ScriptRunner<H> {
    host: H,
    settings: Arc<Settings>,
}

impl<H: ScriptHost> ScriptRunner<H> {
    pub fn new(host: H, settings: Arc<Settings>) -> Self {
        Self { host, settings }
    }

    #[cfg(test)]
    pub(crate) fn host(&self) -> &H {
        &self.host
    }

    async fn run(&self, script: Script) -> Result<ScriptResult> {
        self.host.run_script(&script.render()).await
    }

    pub async fn try_is_running(&self, app_name: &str) -> Result<bool> {
        Ok(self.run(templates::is_running(app_name)).await?.as_bool())
    }

    /// Unknown counts as not running.
    pub async fn is_running(&self, app_name: &str) -> bool {
        self.try_is_running(app_name).await.unwrap_or_else(|e| {
            warn!(app = app_name, error = %e, "is_running check failed, assuming not running");
            false
        })
    }

    pub async fn try_is_frontmost(&self, app_name: &str) -> Result<bool> {
        Ok(self.run(templates::is_frontmost(app_name)).await?.as_bool())
    }

    pub async fn is_frontmost(&self, app_name: &str) -> bool {
        self.try_is_frontmost(app_name).await.unwrap_or_else(|e| {
            warn!(app = app_name, error = %e, "frontmost check failed, assuming background");
            false
        })
    }

    async fn check(&self, state: AppState) -> Result<bool> {
        let name = &self.settings.app.name;
        match state {
            AppState::Running => self.try_is_running(name).await,
            AppState::Frontmost => self.try_is_frontmost(name).await,
        }
    }

    /// Poll `state` until it reports `expected`, at most `poll.max_attempts` times.
    /// No sleep follows the final attempt.
    async fn wait_for(&self, state: AppState, expected: bool) -> Result<()> {
        let poll = &self.settings.poll;
        for attempt in 1..=poll.max_attempts {
            if self.check(state).await? == expected {
                debug!(?state, expected, attempt, "poll satisfied");
                return Ok(());
            }
            if attempt < poll.max_attempts {
                tokio::time::sleep(poll.interval()).await;
            }
        }
        Err(AutomationError::Timeout {
            condition: state.describe(expected),
            attempts: poll.max_attempts,
        })
    }

    /// Activate (launching if needed) and dismiss the start-up dialog when configured.
    pub async fn activate_app(&self) -> Result<()> {
        let cfg = &self.settings;
        info!(app = %cfg.app.name, skip_alert = cfg.alert.skip_alert, "activating app");
        self.run(templates::launch(&cfg.app, &cfg.alert)).await?;
        Ok(())
    }

    pub async fn open_notebook(&self, id: &str) -> Result<NotebookBranch> {
        let cfg = &self.settings;
        let running = self.is_running(&cfg.app.name).await;
        let frontmost = running && self.is_frontmost(&cfg.app.name).await;
        let branch = NotebookBranch::select(running, frontmost);
        info!(notebook = id, ?branch, "opening notebook");

        self.run(templates::open_notebook(branch, &cfg.app, &cfg.alert, id))
            .await?;
        Ok(branch)
    }

    pub async fn restart_app(&self) -> Result<()> {
        let cfg = &self.settings;
        if !self.is_running(&cfg.app.name).await {
            info!(app = %cfg.app.name, "app not running, launching");
            return self.activate_app().await;
        }

        info!(app = %cfg.app.name, "restarting app");
        // Quit is only honoured reliably once the app is in front.
        self.run(templates::activate(&cfg.app)).await?;
        self.wait_for(AppState::Frontmost, true).await?;

        self.run(templates::quit(&cfg.app)).await?;
        self.wait_for(AppState::Running, false).await?;

        self.activate_app().await
    }

    /// Returns the id of the new note, or `None` when the parent does not exist.
    pub async fn create_child_note(&self, note: &NewChildNote) -> Result<Option<String>> {
        note.validate()?;
        info!(parent = %note.parent_id, color = note.color_index, "creating child note");
        let result = self
            .run(templates::create_child_note(&self.settings.app, note))
            .await?;
        if result == ScriptResult::Absent {
            info!(parent = %note.parent_id, "parent note not found");
        }
        Ok(result.into_text())
    }

    pub async fn try_selected_text_link(&self) -> Result<SelectionLink> {
        let text = self.host.selected_text().await?;
        let front = self
            .run(templates::frontmost_app())
            .await?
            .into_text()
            .unwrap_or_default();

        let link = match Browser::from_app_name(&front) {
            Some(browser) => self
                .run(templates::active_tab_url(browser))
                .await?
                .into_text()
                .unwrap_or_default(),
            None => String::new(),
        };
        debug!(front_app = %front, has_link = !link.is_empty(), "selection captured");
        Ok(SelectionLink { text, link })
    }

    /// Either half failing yields an all-empty result, never a partial one.
    pub async fn selected_text_link(&self) -> SelectionLink {
        self.try_selected_text_link().await.unwrap_or_else(|e| {
            warn!(error = %e, "could not read selection, returning empty result");
            SelectionLink::default()
        })
    }

    pub async fn dispatch(&self, request: &AutomationRequest) -> Result<Response> {
        request.validate()?;
        let response = match request {
            AutomationRequest::OpenNotebook { id } => {
                self.open_notebook(id).await?;
                Response::Done
            }
            AutomationRequest::RestartApp => {
                self.restart_app().await?;
                Response::Done
            }
            AutomationRequest::ActivateApp => {
                self.activate_app().await?;
                Response::Done
            }
            AutomationRequest::CreateChildNote(note) => Response::NoteCreated {
                note_id: self.create_child_note(note).await?,
            },
            AutomationRequest::IsAppRunning { name } => Response::Running {
                running: self.is_running(name).await,
            },
            AutomationRequest::GetSelectionLink => {
                Response::Selection(self.selected_text_link().await)
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
