use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use changi_core::{AskBackend, AskClient, Config};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "changi")]
#[command(about = "Terminal chat client for the Changi Airport assistant")]
struct Cli {
    /// Base URL of the Q&A backend (serves POST /ask)
    #[arg(long, env = "CHANGI_BASE_URL")]
    base_url: Option<String>,
    /// Ignore new questions while one is still being answered
    #[arg(long)]
    single_flight: bool,
    /// Give up on a request after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Where to write logs (default: <data dir>/changi-assistant/changi.log)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Persist the effective settings to the config file and exit
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// CLI flags (and their env fallbacks) win over the config file
    fn merge_into(&self, mut config: Config) -> Config {
        if let Some(url) = &self.base_url {
            config.base_url = Some(url.clone());
        }
        if self.single_flight {
            config.single_flight = Some(true);
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = Some(secs);
        }
        config
    }
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("changi-assistant")
        .join("changi.log")
}

fn init_logging(path: PathBuf) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "changi.log".into());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("could not create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.log_file.clone().unwrap_or_else(default_log_path))?;

    // A missing file means defaults; an unreadable one is an error
    let config = Config::load().context("could not read config file")?;
    let config = cli.merge_into(config);

    if cli.save_config {
        config.save()?;
        println!("Saved settings to {}", Config::get_config_path()?.display());
        return Ok(());
    }

    let client = match config.request_timeout() {
        Some(timeout) => AskClient::with_timeout(config.base_url(), timeout)?,
        None => AskClient::new(config.base_url()),
    };
    tracing::info!(base_url = %client.base_url(), policy = ?config.submit_policy(), "starting chat client");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, client, &config).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, client: AskClient, config: &Config) -> Result<()> {
    let mut events = EventHandler::new();

    // Probe once in the background; input is live immediately
    let probe = client.clone();
    let tx = events.sender();
    tokio::spawn(async move {
        let _ = tx.send(AppEvent::Health(probe.health().await));
    });

    let backend: Arc<dyn AskBackend> = Arc::new(client);
    let mut app = App::new(backend, config.submit_policy(), config.base_url(), events.sender());

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event)?,
            None => break,
        }
    }

    Ok(())
}
