use crate::error::{AutomationError, Result};
use crate::request::{AutomationRequest, NewChildNote};

#[derive(Debug, PartialEq)]
pub enum Invocation {
    Help,
    Request(AutomationRequest),
    /// `run <json>`; `None` means read the JSON from stdin.
    Json(Option<String>),
}

pub fn print_help() {
    println!("mnctl — drive MarginNote through AppleScript\n");
    println!("USAGE:");
    println!("  mnctl open <notebook-id>     Open a notebook (launching MarginNote if needed)");
    println!("  mnctl activate               Bring MarginNote to the front");
    println!("  mnctl restart                Quit and relaunch MarginNote");
    println!("  mnctl running [app]          Is the app (default: MarginNote) running?");
    println!("  mnctl create-note --parent <id> [--title T] [--excerpt E] [--comment C]");
    println!("                    [--tags T] [--link L] [--color N]");
    println!("                               Create a child note, prints the new note id");
    println!("  mnctl selection              Selected text plus the front browser tab URL");
    println!("  mnctl run <json>|-           Run a JSON request ('-' reads stdin)");
    println!("  mnctl --help                 Show this help\n");
    println!("ENVIRONMENT:");
    println!("  MNCTL_CONFIG_DIR             Path to config directory (default: ./config)");
    println!("  MNCTL_ENV                    Config environment overlay (default: local)");
    println!("  MNCTL__*                     Override any config key via env var");
}

fn invalid(msg: impl Into<String>) -> AutomationError {
    AutomationError::InvalidRequest(msg.into())
}

fn one_arg<'a>(rest: &'a [String], what: &str) -> Result<&'a str> {
    match rest {
        [value] => Ok(value.as_str()),
        [] => Err(invalid(format!("missing {what}"))),
        _ => Err(invalid(format!("expected a single {what}"))),
    }
}

fn no_args(command: &str, rest: &[String]) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(invalid(format!("{command} takes no arguments")))
    }
}

fn parse_note(rest: &[String]) -> Result<NewChildNote> {
    let mut note = NewChildNote::default();
    let mut it = rest.iter();
    while let Some(flag) = it.next() {
        let value = it
            .next()
            .ok_or_else(|| invalid(format!("{flag} needs a value")))?
            .clone();
        match flag.as_str() {
            "--parent" => note.parent_id = value,
            "--title" => note.title = value,
            "--excerpt" => note.excerpt_text = value,
            "--comment" => note.comment_text = value,
            "--tags" => note.tags = value,
            "--link" => note.link = value,
            "--color" => {
                note.color_index = value
                    .parse()
                    .map_err(|_| invalid(format!("--color expects a number, got '{value}'")))?;
            }
            other => return Err(invalid(format!("unknown option '{other}'"))),
        }
    }
    note.validate()?;
    Ok(note)
}

fn is_help_flag(arg: &str) -> bool {
    arg == "--help" || arg == "-h"
}

/// `mnctl --help` or `mnctl <command> --help`. Later positions may be option
/// values (a note titled "-h") and are left to the command parser.
pub fn wants_help(args: &[String]) -> bool {
    match args {
        [] => true,
        [first, ..] if is_help_flag(first) => true,
        [_, second, ..] => is_help_flag(second),
        _ => false,
    }
}

/// `args` excludes the program name.
pub fn parse_args(args: &[String], default_app: &str) -> Result<Invocation> {
    if wants_help(args) {
        return Ok(Invocation::Help);
    }
    let Some((command, rest)) = args.split_first() else {
        return Ok(Invocation::Help);
    };

    let request = match command.as_str() {
        "open" => AutomationRequest::OpenNotebook {
            id: one_arg(rest, "notebook id")?.to_string(),
        },
        "activate" => {
            no_args(command, rest)?;
            AutomationRequest::ActivateApp
        }
        "restart" => {
            no_args(command, rest)?;
            AutomationRequest::RestartApp
        }
        "running" => AutomationRequest::IsAppRunning {
            name: match rest {
                [] => default_app.to_string(),
                _ => rest.join(" "),
            },
        },
        "create-note" => AutomationRequest::CreateChildNote(parse_note(rest)?),
        "selection" => {
            no_args(command, rest)?;
            AutomationRequest::GetSelectionLink
        }
        "run" => {
            let source = one_arg(rest, "JSON request")?;
            return Ok(Invocation::Json(
                (source != "-").then(|| source.to_string()),
            ));
        }
        other => return Err(invalid(format!("unknown command '{other}'"))),
    };
    request.validate()?;
    Ok(Invocation::Request(request))
}
