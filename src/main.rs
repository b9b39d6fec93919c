use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use picture_viewer::config::Configuration;
use picture_viewer::events::{ControlCommand, UiEvent};
use picture_viewer::input::command_for_source;
use picture_viewer::resolver::LocalResolver;
use picture_viewer::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "picture-viewer",
    version,
    about = "Image queue and slideshow driven from the console"
)]
struct Args {
    /// Path to YAML config; built-in defaults when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the slide delay (e.g. `3s`)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    delay: Option<Duration>,
    /// Override the fade duration (e.g. `400ms`)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    animation: Option<Duration>,
    /// Start the slideshow once the initial sources are queued
    #[arg(long)]
    start: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
    /// Image files, directories or http(s) URLs to queue at startup
    #[arg(value_name = "SOURCE")]
    sources: Vec<String>,
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "picture_viewer=debug,info",
        _ => "picture_viewer=trace,debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .compact()
        .init();
}

fn load_configuration(args: &Args) -> Result<Configuration> {
    let mut cfg = match &args.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(delay) = args.delay {
        cfg.delay_time = delay;
    }
    if let Some(animation) = args.animation {
        cfg.animation_duration = animation;
    }
    cfg.validated().context("invalid configuration values")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let cfg = load_configuration(&args)?;
    tracing::debug!("configuration:\n{:#?}", cfg);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let result = runtime.block_on(run(cfg, args));
    // Console input blocks a runtime thread until the next line arrives.
    runtime.shutdown_timeout(Duration::from_millis(250));
    result
}

async fn run(cfg: Configuration, args: Args) -> Result<()> {
    let (command_tx, command_rx) = mpsc::channel::<ControlCommand>(32); // console -> controller
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(cfg.ui_channel_capacity); // controller -> console

    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // Controller
    tasks.spawn({
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        async move {
            tasks::controller::run(cfg, LocalResolver, command_rx, ui_tx, cancel)
                .await
                .context("controller task failed")
        }
    });

    // UI event log
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            tasks::console::log_ui_events(ui_rx, cancel)
                .await
                .context("ui log task failed")
        }
    });

    for source in &args.sources {
        command_tx
            .send(command_for_source(source))
            .await
            .context("controller stopped before startup finished")?;
    }
    if args.start {
        command_tx
            .send(ControlCommand::Start)
            .await
            .context("controller stopped before startup finished")?;
    }

    // Console input; without a terminal the show runs until ctrl-c.
    let _idle_commands = if io::stdin().is_terminal() {
        tasks.spawn({
            let cancel = cancel.clone();
            async move {
                tasks::console::read_commands(tokio::io::stdin(), command_tx, cancel)
                    .await
                    .context("console task failed")
            }
        });
        None
    } else {
        tracing::debug!("stdin is not a terminal; skipping console input");
        Some(command_tx)
    };

    // Any task ending (console closed, controller stopped) takes the rest down.
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
        cancel.cancel();
    }

    Ok(())
}
