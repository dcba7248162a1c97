use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{AutomationError, Result, ScriptResult};
use crate::host::ScriptHost;
use crate::request::{AutomationRequest, NewChildNote, Response, SelectionLink};
use crate::runner::ScriptRunner;
use crate::settings::Settings;
use crate::templates::{self, Browser, NotebookBranch};

// ---------------------------------------------------------------------------
// MockHost: records scripts, replays queued interpreter replies
// ---------------------------------------------------------------------------

enum Reply {
    Ok(ScriptResult),
    Fail(&'static str),
}

#[derive(Default)]
struct MockHost {
    replies: Mutex<VecDeque<Reply>>,
    scripts: Mutex<Vec<String>>,
    selection: Option<String>,
}

impl MockHost {
    fn with(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    fn selecting(mut self, text: &str) -> Self {
        self.selection = Some(text.into());
        self
    }

    fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl ScriptHost for MockHost {
    async fn run_script(&self, script: &str) -> Result<ScriptResult> {
        self.scripts.lock().unwrap().push(script.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Ok(result)) => Ok(result),
            Some(Reply::Fail(message)) => Err(AutomationError::Interpreter {
                message: message.into(),
                code: Some(-1728),
            }),
            None => Err(AutomationError::Interpreter {
                message: format!("unexpected script: {script}"),
                code: None,
            }),
        }
    }

    async fn selected_text(&self) -> Result<String> {
        self.selection
            .clone()
            .ok_or(AutomationError::Unsupported("reading the system selection"))
    }
}

fn yes() -> Reply {
    Reply::Ok(ScriptResult::Bool(true))
}

fn no() -> Reply {
    Reply::Ok(ScriptResult::Bool(false))
}

fn nothing() -> Reply {
    Reply::Ok(ScriptResult::Absent)
}

fn text(s: &str) -> Reply {
    Reply::Ok(ScriptResult::Text(s.into()))
}

fn settings(skip_alert: bool) -> Arc<Settings> {
    let mut s = Settings::default();
    s.alert.skip_alert = skip_alert;
    s.alert.waiting_time = 2.0;
    s.poll.interval_ms = 1;
    s.poll.max_attempts = 3;
    Arc::new(s)
}

fn runner(replies: Vec<Reply>) -> ScriptRunner<MockHost> {
    ScriptRunner::new(MockHost::with(replies), settings(false))
}

// ---------------------------------------------------------------------------
// is_running
// ---------------------------------------------------------------------------

#[tokio::test]
async fn is_running_reads_boolean_reply() {
    let r = runner(vec![yes()]);
    assert!(r.is_running("MarginNote 3").await);
    let scripts = r.host().scripts();
    assert_eq!(scripts, vec![templates::is_running("MarginNote 3").render()]);
}

#[tokio::test]
async fn is_running_is_false_when_interpreter_fails() {
    let r = runner(vec![Reply::Fail("System Events got an error")]);
    assert!(!r.is_running("MarginNote 3").await);
}

#[tokio::test]
async fn try_is_running_propagates_failure() {
    let r = runner(vec![Reply::Fail("denied")]);
    let err = r.try_is_running("MarginNote 3").await.unwrap_err();
    assert!(matches!(err, AutomationError::Interpreter { .. }));
}

#[tokio::test]
async fn is_running_escapes_app_name() {
    let r = runner(vec![no()]);
    assert!(!r.is_running("Bad\"Name").await);
    assert!(r.host().scripts()[0].contains("\"Bad\\\"Name\""));
}

// ---------------------------------------------------------------------------
// open_notebook
// ---------------------------------------------------------------------------

#[tokio::test]
async fn open_notebook_launches_when_not_running() {
    let r = ScriptRunner::new(MockHost::with(vec![no(), nothing()]), settings(true));
    let branch = r.open_notebook("NB").await.unwrap();
    assert_eq!(branch, NotebookBranch::Launch);

    let scripts = r.host().scripts();
    assert_eq!(scripts.len(), 2, "frontmost is not queried for a stopped app");
    let cfg = settings(true);
    assert_eq!(scripts[1], templates::launch(&cfg.app, &cfg.alert).render());
    assert!(scripts[1].contains("delay 2"));
    assert!(scripts[1].contains("key code 36"));
}

#[tokio::test]
async fn open_notebook_activates_background_app_then_opens() {
    let r = runner(vec![yes(), no(), nothing()]);
    let branch = r.open_notebook("NB").await.unwrap();
    assert_eq!(branch, NotebookBranch::ActivateThenOpen);

    let scripts = r.host().scripts();
    assert_eq!(
        scripts[2],
        "tell application \"MarginNote 3\" to activate\nopen location \"marginnote3app://notebook/NB\"\n"
    );
}

#[tokio::test]
async fn open_notebook_opens_directly_when_frontmost() {
    let r = runner(vec![yes(), yes(), nothing()]);
    let branch = r.open_notebook("NB").await.unwrap();
    assert_eq!(branch, NotebookBranch::Open);

    let scripts = r.host().scripts();
    assert_eq!(scripts[2], "open location \"marginnote3app://notebook/NB\"\n");
}

#[tokio::test]
async fn open_notebook_treats_failed_checks_as_not_running() {
    let r = runner(vec![Reply::Fail("no System Events"), nothing()]);
    let branch = r.open_notebook("NB").await.unwrap();
    assert_eq!(branch, NotebookBranch::Launch);
}

#[tokio::test]
async fn open_notebook_treats_failed_frontmost_check_as_background() {
    let r = runner(vec![yes(), Reply::Fail("System Events timed out"), nothing()]);
    let branch = r.open_notebook("NB").await.unwrap();
    assert_eq!(branch, NotebookBranch::ActivateThenOpen);

    let scripts = r.host().scripts();
    assert_eq!(scripts.len(), 3);
    assert!(scripts[1].contains("frontmost is true"));
    assert!(scripts[2].contains("tell application \"MarginNote 3\" to activate"));
    assert!(scripts[2].contains("open location \"marginnote3app://notebook/NB\""));
}

#[tokio::test]
async fn is_frontmost_is_false_when_interpreter_fails() {
    let r = runner(vec![Reply::Fail("denied")]);
    assert!(!r.is_frontmost("MarginNote 3").await);
}

// ---------------------------------------------------------------------------
// restart_app
// ---------------------------------------------------------------------------

#[tokio::test]
async fn restart_launches_when_not_running() {
    let r = runner(vec![no(), nothing()]);
    r.restart_app().await.unwrap();
    let scripts = r.host().scripts();
    assert_eq!(scripts.len(), 2);
    assert_eq!(scripts[1], "tell application \"MarginNote 3\" to activate\n");
}

#[tokio::test]
async fn restart_waits_for_front_then_quit_then_relaunches() {
    let r = runner(vec![
        yes(),     // running
        nothing(), // activate
        no(),      // not yet frontmost
        yes(),     // frontmost
        nothing(), // quit
        yes(),     // still running
        no(),      // gone
        nothing(), // launch
    ]);
    r.restart_app().await.unwrap();

    let scripts = r.host().scripts();
    assert_eq!(scripts.len(), 8);
    assert_eq!(scripts[1], "tell application \"MarginNote 3\" to activate\n");
    assert!(scripts[2].contains("frontmost is true"));
    assert_eq!(scripts[4], "tell application \"MarginNote 3\" to quit\n");
    assert!(scripts[6].contains("name of processes contains"));
    assert_eq!(scripts[7], "tell application \"MarginNote 3\" to activate\n");
}

#[tokio::test]
async fn restart_times_out_when_app_never_comes_to_front() {
    let r = runner(vec![yes(), nothing(), no(), no(), no()]);
    let err = r.restart_app().await.unwrap_err();
    match err {
        AutomationError::Timeout {
            condition,
            attempts,
        } => {
            assert_eq!(condition, "app to become frontmost");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    let scripts = r.host().scripts();
    assert_eq!(scripts.len(), 5);
    assert!(!scripts.iter().any(|s| s.contains("to quit")));
}

#[tokio::test]
async fn restart_times_out_when_app_never_quits() {
    let r = runner(vec![yes(), nothing(), yes(), nothing(), yes(), yes(), yes()]);
    let err = r.restart_app().await.unwrap_err();
    assert!(matches!(
        err,
        AutomationError::Timeout {
            condition: "app to quit",
            attempts: 3
        }
    ));
}

#[tokio::test]
async fn restart_does_not_sleep_after_final_attempt() {
    let mut s = Settings::default();
    s.poll.interval_ms = 5_000;
    s.poll.max_attempts = 1;
    let r = ScriptRunner::new(MockHost::with(vec![yes(), nothing(), no()]), Arc::new(s));

    let started = Instant::now();
    let err = r.restart_app().await.unwrap_err();
    assert!(matches!(err, AutomationError::Timeout { attempts: 1, .. }));
    assert!(started.elapsed() < Duration::from_secs(1), "slept {:?}", started.elapsed());
}

#[tokio::test]
async fn restart_propagates_state_check_failure() {
    let r = runner(vec![yes(), nothing(), Reply::Fail("lost System Events")]);
    let err = r.restart_app().await.unwrap_err();
    assert!(matches!(err, AutomationError::Interpreter { .. }));
}

// ---------------------------------------------------------------------------
// create_child_note
// ---------------------------------------------------------------------------

fn quoted_note() -> NewChildNote {
    NewChildNote {
        parent_id: "X".into(),
        title: "A \"quote\"".into(),
        excerpt_text: "".into(),
        comment_text: "ok".into(),
        tags: "".into(),
        link: "".into(),
        color_index: 2,
    }
}

#[tokio::test]
async fn create_child_note_end_to_end() {
    let r = runner(vec![text("NEW-ID")]);
    let id = r.create_child_note(&quoted_note()).await.unwrap();
    assert_eq!(id.as_deref(), Some("NEW-ID"));

    let scripts = r.host().scripts();
    assert_eq!(scripts.len(), 1);
    let script = &scripts[0];
    assert!(script.contains(r#"title of nn to "A \"quote\"""#));
    assert!(script.contains(r#"append text comment "ok" target note nn"#));
    assert_eq!(script.matches("append text comment").count(), 1);
    assert!(!script.contains("excerpt text"));
    assert!(script.contains("set color index of nn to 2"));
    assert!(script.contains(r#"(fetch note "X")"#));
}

#[tokio::test]
async fn create_child_note_missing_parent_is_none() {
    let r = runner(vec![nothing()]);
    let id = r.create_child_note(&quoted_note()).await.unwrap();
    assert_eq!(id, None);
}

#[tokio::test]
async fn create_child_note_rejects_bad_color_without_running_script() {
    let r = runner(vec![]);
    let note = NewChildNote {
        color_index: 20,
        ..quoted_note()
    };
    let err = r.create_child_note(&note).await.unwrap_err();
    assert!(matches!(err, AutomationError::InvalidRequest(_)));
    assert!(r.host().scripts().is_empty());
}

#[tokio::test]
async fn create_child_note_surfaces_interpreter_failure() {
    let r = runner(vec![Reply::Fail("MarginNote got an error")]);
    assert!(r.create_child_note(&quoted_note()).await.is_err());
}

// ---------------------------------------------------------------------------
// selected_text_link
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selection_from_browser_includes_tab_url() {
    let host = MockHost::with(vec![text("Safari"), text("https://example.com")]).selecting("hello");
    let r = ScriptRunner::new(host, settings(false));
    let got = r.selected_text_link().await;
    assert_eq!(
        got,
        SelectionLink {
            text: "hello".into(),
            link: "https://example.com".into()
        }
    );
    let scripts = r.host().scripts();
    assert_eq!(scripts[1], templates::active_tab_url(Browser::Safari).render());
}

#[tokio::test]
async fn selection_from_other_app_has_empty_link() {
    let host = MockHost::with(vec![text("Preview")]).selecting("hello");
    let r = ScriptRunner::new(host, settings(false));
    let got = r.selected_text_link().await;
    assert_eq!(got.text, "hello");
    assert_eq!(got.link, "");
    assert_eq!(r.host().scripts().len(), 1);
}

#[tokio::test]
async fn selection_failure_collapses_to_empty() {
    let r = runner(vec![]);
    assert_eq!(r.selected_text_link().await, SelectionLink::default());
    assert!(r.host().scripts().is_empty());
}

#[tokio::test]
async fn url_failure_collapses_to_empty() {
    let host = MockHost::with(vec![text("Google Chrome"), Reply::Fail("no window")]).selecting("hello");
    let r = ScriptRunner::new(host, settings(false));
    assert_eq!(r.selected_text_link().await, SelectionLink::default());
}

// ---------------------------------------------------------------------------
// dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatch_routes_each_intent() {
    let r = runner(vec![yes()]);
    let response = r
        .dispatch(&AutomationRequest::IsAppRunning {
            name: "Arc".into(),
        })
        .await
        .unwrap();
    assert_eq!(response, Response::Running { running: true });

    let r = runner(vec![nothing()]);
    let response = r.dispatch(&AutomationRequest::ActivateApp).await.unwrap();
    assert_eq!(response, Response::Done);

    let r = runner(vec![text("N2")]);
    let response = r
        .dispatch(&AutomationRequest::CreateChildNote(quoted_note()))
        .await
        .unwrap();
    assert_eq!(
        response,
        Response::NoteCreated {
            note_id: Some("N2".into())
        }
    );
}

#[tokio::test]
async fn dispatch_validates_before_running() {
    let r = runner(vec![]);
    let err = r
        .dispatch(&AutomationRequest::OpenNotebook { id: "  ".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, AutomationError::InvalidRequest(_)));
    assert!(r.host().scripts().is_empty());
}
