use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nav_core::{
    HistoryMode, HttpContentFetcher, JsonTreeDecoder, NavigationController, RenderScheduler,
};
use shared::location::Location;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info};
use url::Url;

mod config;
mod history;
mod painter;

use history::ShellHistory;
use painter::TerminalPainter;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the configured content server URL.
    #[arg(long)]
    server_url: Option<String>,
    /// Overrides the configured client-module base URL.
    #[arg(long)]
    module_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(v) = args.server_url {
        settings.server_url = v;
    }
    if let Some(v) = args.module_base {
        settings.module_base = Some(v);
    }

    let server_url = Url::parse(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let module_base = settings.resolved_module_base()?;
    info!(server = %server_url, modules = %module_base, "starting navigation shell");

    let history = Arc::new(ShellHistory::new(Location::root()));
    let controller = NavigationController::new(
        Arc::new(HttpContentFetcher::with_route(
            server_url,
            settings.content_route.clone(),
        )),
        Arc::new(JsonTreeDecoder),
        history.clone(),
        module_base,
    );

    let scheduler = RenderScheduler::new(controller.subscribe_state(), Arc::new(TerminalPainter));
    let render = scheduler.handle();
    tokio::spawn(scheduler.run());

    let (notify, changes) = mpsc::channel(16);
    controller.bind_external_changes(changes);
    controller.initial_load().await;

    println!("commands: go <location> | replace <location> | back | forward | state | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, argument) = match line.split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };
        debug!(command, argument, "dispatching shell command");
        match command {
            "" => {}
            "go" if !argument.is_empty() => {
                controller
                    .navigate(Location::new(argument), HistoryMode::default())
                    .await;
            }
            "replace" if !argument.is_empty() => {
                controller
                    .navigate(Location::new(argument), HistoryMode::Replace)
                    .await;
            }
            "back" => {
                if history.back() {
                    notify.send(()).await.context("external change listener gone")?;
                } else {
                    println!("history: already at the oldest entry");
                }
            }
            "forward" => {
                if history.forward() {
                    notify.send(()).await.context("external change listener gone")?;
                } else {
                    println!("history: already at the newest entry");
                }
            }
            "state" => {
                let state = controller.subscribe_state().borrow().clone();
                println!(
                    "current={} next={} pending={} entries={}",
                    state.current_location,
                    state.next_location,
                    state.is_pending || render.is_pending(),
                    history.entry_count(),
                );
            }
            "quit" | "exit" => break,
            _ => println!("unknown command: {line}"),
        }
    }

    controller.detach_external_changes();
    Ok(())
}
