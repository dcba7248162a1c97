mod cli;
mod error;
mod host;
mod request;
mod runner;
mod script;
mod settings;
mod telemetry;
mod templates;

use std::sync::Arc;

use cli::{Invocation, parse_args, print_help, wants_help};
use host::OsaHost;
use request::AutomationRequest;
use runner::ScriptRunner;
use settings::{get_settings, init_settings};
use telemetry::init_telemetry;
use tokio::io::AsyncReadExt;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if wants_help(&args) {
        print_help();
        return Ok(());
    }

    // One request at a time; nothing here benefits from worker threads.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args))
}

async fn read_request(source: Option<String>) -> Result<AutomationRequest, Box<dyn std::error::Error>> {
    let text = match source {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let request = AutomationRequest::from_json(&text)?;
    request.validate()?;
    Ok(request)
}

async fn async_main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::Settings::load()?;
    init_telemetry(&settings.log.level);

    let errors = settings.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        return Err("invalid configuration".into());
    }

    init_settings(settings);
    let cfg = get_settings();

    let request = match parse_args(&args, &cfg.app.name)? {
        Invocation::Help => {
            print_help();
            return Ok(());
        }
        Invocation::Request(request) => request,
        Invocation::Json(source) => read_request(source).await?,
    };

    let runner = ScriptRunner::new(OsaHost::new(cfg.interpreter.command.as_str()), Arc::clone(cfg));
    let span = info_span!("request", id = %Uuid::new_v4(), intent = request.intent());

    let response = async {
        info!("request received");
        runner.dispatch(&request).await
    }
    .instrument(span)
    .await
    .inspect_err(|e| error!(error = %e, "request failed"))?;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
