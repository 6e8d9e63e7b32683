//! sky-client binary
//!
//! Drives the source sync layer against a running server:
//! - `probe`: wait for the server to answer
//! - `hydrate`: run the startup fetches
//! - `show`: fetch one source and print its snapshot
//! - `watch`: keep a source fresh from push frames read on stdin
//! - `request`: issue one raw operation

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use sky_client::logging::init_tracing;
use sky_client::{ClientConfig, PushMessage, RequestInitiator, Session};
use sky_protocol::{ActionType, ApiRequest, Verb};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

const PUSH_BUFFER: usize = 64;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "sky-client")]
#[command(about = "Source state synchronization client", version)]
struct Args {
    /// TOML config file
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Server base URL (overrides config and SKYPORTAL_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// API token (overrides config and SKYPORTAL_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wait until the server answers
    Probe,
    /// Run the startup fetches and print the report
    Hydrate,
    /// Fetch one source and print its snapshot
    Show { id: String },
    /// Load a source, then apply push frames read from stdin (one JSON object per line)
    Watch { id: String },
    /// Issue one raw operation and print its outcome
    Request {
        /// GET, POST, PUT or DELETE
        verb: String,
        /// API path, e.g. /api/sources/ZTF21aaa
        path: String,
        /// Base action name, e.g. skyportal/FETCH_LOADED_SOURCE
        action: String,
        /// JSON body
        #[arg(long)]
        data: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    }
    .apply_env_overrides()
    .apply_overrides(args.url.clone(), args.token.clone());
    if args.verbose {
        config.log.filter = "sky_client=debug,sky_state=trace,info".to_string();
    }
    init_tracing(&config.log)?;

    let session = Session::connect(config)?;
    info!(version = sky_client::VERSION, "starting sky-client");

    match args.command {
        Command::Probe => {
            let attempts = session.probe().await?;
            println!("reachable after {attempts} attempt(s)");
        }
        Command::Hydrate => {
            let report = session.hydrate().await;
            print_json(&report)?;
        }
        Command::Show { id } => {
            session.load_source(&id).await?;
            print_json(&*session.snapshot())?;
        }
        Command::Watch { id } => watch(&session, &id).await?,
        Command::Request {
            verb,
            path,
            action,
            data,
        } => {
            let verb: Verb = verb.parse()?;
            let action = ActionType::from_name(&action)?;
            let mut request = ApiRequest::new(verb, path, action);
            if let Some(data) = data {
                let payload: Value = serde_json::from_str(&data).context("parsing --data")?;
                request = request.with_payload(payload);
            }
            let outcome = session.dispatcher().issue(request).await;
            print_json(&outcome)?;
        }
    }
    Ok(())
}

async fn watch(session: &Session, id: &str) -> anyhow::Result<()> {
    session.load_source(id).await?;
    print_json(&*session.snapshot())?;

    let events = session.store().subscribe();
    let (stop_printer, stopped) = oneshot::channel::<()>();
    let printer = {
        let session = session.clone();
        tokio::spawn(async move {
            let stop = async {
                let _ = stopped.await;
            };
            session
                .follow_source(events, stop, |snapshot| {
                    if let Err(err) = print_json(snapshot) {
                        warn!(error = %err, "cannot print snapshot");
                    }
                })
                .await
        })
    };

    let (tx, rx) = mpsc::channel(PUSH_BUFFER);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match PushMessage::from_json(&line) {
                Ok(message) => {
                    if tx.send(message).await.is_err() {
                        break;
                    }
                }
                Err(err) => warn!(error = %err, "discarding malformed push frame"),
            }
        }
    });

    let routed = session.listen(rx).await;
    reader.await?;
    let _ = stop_printer.send(());
    let printed = printer.await?;
    info!(routed, printed, "push input closed");
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
