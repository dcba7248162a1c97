//! One function per automation intent, each rendering the AppleScript that
//! MarginNote, System Events or a browser understands.

use crate::request::NewChildNote;
use crate::script::{Expr, Script, Stmt};
use crate::settings::{AlertSettings, AppSettings};

const SYSTEM_EVENTS: &str = "System Events";
const FRONTMOST_NAME: &str = "name of first process whose frontmost is true";
/// Return key; dismisses the launch dialog.
const KEY_RETURN: i64 = 36;

// ---------------------------------------------------------------------------
// Process queries
// ---------------------------------------------------------------------------

pub fn is_running(app_name: &str) -> Script {
    Script::new().push(Stmt::tell_app(
        SYSTEM_EVENTS,
        vec![Stmt::Return(Expr::contains(
            Expr::Code("name of processes"),
            Expr::str(app_name),
        ))],
    ))
}

pub fn is_frontmost(app_name: &str) -> Script {
    Script::new().push(Stmt::tell_app(
        SYSTEM_EVENTS,
        vec![Stmt::Return(Expr::contains(
            Expr::Code("(name of first process whose frontmost is true)"),
            Expr::str(app_name),
        ))],
    ))
}

pub fn frontmost_app() -> Script {
    Script::new().push(Stmt::tell_app(
        SYSTEM_EVENTS,
        vec![Stmt::Return(Expr::Code(FRONTMOST_NAME))],
    ))
}

// ---------------------------------------------------------------------------
// App lifecycle
// ---------------------------------------------------------------------------

fn activate_stmt(app: &AppSettings) -> Stmt {
    Stmt::tell_app(app.name.as_str(), vec![Stmt::cmd("activate")])
}

fn open_notebook_stmt(app: &AppSettings, id: &str) -> Stmt {
    Stmt::cmd_arg("open location", Expr::Str(app.notebook_url(id)))
}

/// Activate (launching if needed) and optionally dismiss the start-up dialog.
pub fn launch(app: &AppSettings, alert: &AlertSettings) -> Script {
    let script = Script::new().push(activate_stmt(app));
    if !alert.skip_alert {
        return script;
    }
    script
        .push(Stmt::cmd_arg("delay", Expr::Num(alert.waiting_time)))
        .push(Stmt::tell_app(
            SYSTEM_EVENTS,
            vec![Stmt::tell_process(
                app.name.as_str(),
                vec![Stmt::cmd_arg("key code", Expr::Int(KEY_RETURN))],
            )],
        ))
}

pub fn activate(app: &AppSettings) -> Script {
    Script::new().push(activate_stmt(app))
}

pub fn quit(app: &AppSettings) -> Script {
    Script::new().push(Stmt::tell_app(app.name.as_str(), vec![Stmt::cmd("quit")]))
}

/// Which of the three open-notebook paths applies, from the app's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotebookBranch {
    /// Not running: launch only.
    Launch,
    /// Running in the background: activate, then open.
    ActivateThenOpen,
    /// Already frontmost: open directly.
    Open,
}

impl NotebookBranch {
    pub fn select(running: bool, frontmost: bool) -> Self {
        match (running, frontmost) {
            (false, _) => NotebookBranch::Launch,
            (true, false) => NotebookBranch::ActivateThenOpen,
            (true, true) => NotebookBranch::Open,
        }
    }
}

pub fn open_notebook(
    branch: NotebookBranch,
    app: &AppSettings,
    alert: &AlertSettings,
    id: &str,
) -> Script {
    match branch {
        NotebookBranch::Launch => launch(app, alert),
        NotebookBranch::ActivateThenOpen => Script::new()
            .push(activate_stmt(app))
            .push(open_notebook_stmt(app, id)),
        NotebookBranch::Open => Script::new().push(open_notebook_stmt(app, id)),
    }
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// Create a child of `note.parent_id` and return the new note's id.
///
/// Empty excerpt/comment/link/tags produce no statement at all: MarginNote
/// shows an empty annotation as a blank entry.
pub fn create_child_note(app: &AppSettings, note: &NewChildNote) -> Script {
    let mut body = vec![
        Stmt::set("nb", Expr::Code("notebook of n")),
        Stmt::set("nbid", Expr::Code("id of nb")),
        Stmt::set("nn", Expr::Code("new note in notebook nbid")),
        Stmt::cmd("add child notes {nn} target note n"),
        Stmt::set("color index of nn", Expr::Int(i64::from(note.color_index))),
        Stmt::set("title of nn", Expr::str(note.title.as_str())),
    ];
    if !note.excerpt_text.is_empty() {
        body.push(Stmt::set("excerpt text of nn", Expr::str(note.excerpt_text.as_str())));
    }
    for text in [&note.comment_text, &note.link, &note.tags] {
        if !text.is_empty() {
            body.push(Stmt::cmd_to(
                "append text comment",
                Expr::str(text.as_str()),
                "target note nn",
            ));
        }
    }
    body.push(Stmt::cmd("get id of nn"));

    Script::new().push(Stmt::tell_app(
        app.name.as_str(),
        vec![
            Stmt::set("n", Expr::call("fetch note", Expr::str(note.parent_id.as_str()))),
            Stmt::If {
                cond: Expr::Code("n is not missing value"),
                then: body,
            },
        ],
    ))
}

// ---------------------------------------------------------------------------
// Browsers
// ---------------------------------------------------------------------------

/// Browsers whose front tab URL can be read over AppleScript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Chrome,
    Edge,
    Arc,
    Safari,
}

impl Browser {
    pub fn from_app_name(name: &str) -> Option<Self> {
        match name {
            "Google Chrome" => Some(Browser::Chrome),
            "Microsoft Edge" => Some(Browser::Edge),
            "Arc" => Some(Browser::Arc),
            "Safari" => Some(Browser::Safari),
            _ => None,
        }
    }

    pub fn app_name(self) -> &'static str {
        match self {
            Browser::Chrome => "Google Chrome",
            Browser::Edge => "Microsoft Edge",
            Browser::Arc => "Arc",
            Browser::Safari => "Safari",
        }
    }

    fn url_query(self) -> &'static str {
        match self {
            Browser::Safari => "get the URL of the current tab of window 1",
            _ => "get the URL of the active tab of window 1",
        }
    }
}

pub fn active_tab_url(browser: Browser) -> Script {
    Script::new().push(Stmt::tell_app(browser.app_name(), vec![Stmt::cmd(browser.url_query())]))
}
