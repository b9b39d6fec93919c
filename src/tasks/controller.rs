use std::future::pending;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Configuration;
use crate::error::Error;
use crate::events::{ControlCommand, RemovalCause, UiEvent};
use crate::fetch::{self, FetchLimits};
use crate::resolver::{ImageResolver, expand_sources};
use crate::slideshow::{Presenter, PresenterOptions, TICK_INTERVAL, UiSink};

type Viewer<R> = Presenter<R, Vec<UiEvent>>;
type FetchResult = (String, std::result::Result<PathBuf, Error>);

/// The single fade the presenter is waiting on.
struct ScheduledFade {
    epoch: u64,
    sleep: Pin<Box<Sleep>>,
}

/// Owns the slideshow and serializes everything that touches it.
///
/// Rules:
/// - User commands, timer ticks, fade completions and finished downloads are
///   handled one at a time on this task.
/// - The 1 s ticker only exists while the slideshow runs.
/// - Only the most recent fade is scheduled; completions of replaced fades
///   never arrive, and any that race past are dropped by epoch.
/// - Downloads run on their own tasks and re-enter here through a `JoinSet`.
/// - Stops on cancellation or when either channel closes.
pub async fn run<R>(
    cfg: Configuration,
    resolver: R,
    mut commands: Receiver<ControlCommand>,
    to_ui: Sender<UiEvent>,
    cancel: CancellationToken,
) -> Result<()>
where
    R: ImageResolver + Send,
{
    let client = Client::builder()
        .user_agent(concat!("picture-viewer/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")?;
    let mut presenter: Viewer<R> =
        Presenter::new(PresenterOptions::from(&cfg), resolver, Vec::new());
    let mut ticker: Option<Interval> = None;
    let mut fade: Option<ScheduledFade> = None;
    let mut fetches: JoinSet<FetchResult> = JoinSet::new();

    loop {
        reconcile(&mut presenter, &mut ticker, &mut fade);
        if !flush(&mut presenter, &to_ui).await {
            info!("ui channel closed; stopping controller");
            break;
        }

        select! {
            _ = cancel.cancelled() => break,

            maybe_cmd = commands.recv() => {
                let Some(cmd) = maybe_cmd else {
                    info!("command channel closed; stopping controller");
                    break;
                };
                debug!(?cmd, "command");
                handle_command(&mut presenter, cmd, &cfg, &client, &mut fetches);
            }

            _ = next_tick(&mut ticker) => presenter.tick(),

            epoch = fade_elapsed(&mut fade) => {
                fade = None;
                if let Err(err) = presenter.on_fade_complete(epoch) {
                    error!(error = %err, "fade completion rejected");
                }
            }

            Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                match joined {
                    Ok((_, Ok(path))) => {
                        presenter.add([path.to_string_lossy().into_owned()]);
                    }
                    Ok((address, Err(err))) => {
                        warn!(url = %address, error = %err, "download failed");
                        presenter.report_failure(err);
                    }
                    Err(err) => warn!("download task failed: {err}"),
                }
            }
        }
    }

    fetches.shutdown().await;
    Ok(())
}

fn handle_command<R: ImageResolver>(
    presenter: &mut Viewer<R>,
    cmd: ControlCommand,
    cfg: &Configuration,
    client: &Client,
    fetches: &mut JoinSet<FetchResult>,
) {
    let outcome = match cmd {
        ControlCommand::AddFiles(sources) => {
            let summary = presenter.add(expand_sources(sources));
            debug!(added = summary.added, failed = summary.failures.len(), "add finished");
            Ok(())
        }
        ControlCommand::AddUrl(address) => {
            match fetch::parse_remote_address(&address) {
                Ok(url) => {
                    info!(url = %url, "fetching remote image");
                    presenter
                        .ui_mut()
                        .notify(UiEvent::Status(format!("Downloading {url}")));
                    let client = client.clone();
                    let dir = cfg.download_dir();
                    let limits = FetchLimits::from(cfg);
                    fetches.spawn(async move {
                        let result = fetch::fetch_remote(&client, &url, &dir, limits).await;
                        (url.to_string(), result)
                    });
                }
                Err(err) => {
                    warn!(error = %err, "rejected image address");
                    presenter.report_failure(err);
                }
            }
            Ok(())
        }
        ControlCommand::Show(index) => presenter.request_show(index),
        ControlCommand::Next => {
            if !presenter.next() {
                debug!("no next image");
            }
            Ok(())
        }
        ControlCommand::Previous => {
            if !presenter.previous() {
                debug!("no previous image");
            }
            Ok(())
        }
        ControlCommand::Remove(index) => presenter.remove_at(index, RemovalCause::User),
        ControlCommand::Clear => {
            presenter.clear();
            Ok(())
        }
        ControlCommand::Start => {
            presenter.start();
            Ok(())
        }
        ControlCommand::Pause => {
            presenter.pause();
            Ok(())
        }
        ControlCommand::SetDelay(delay) => {
            presenter.set_delay(delay);
            Ok(())
        }
        ControlCommand::SetAnimationDuration(duration) => {
            presenter.set_animation_duration(duration);
            Ok(())
        }
        ControlCommand::SetFitToWindow(enabled) => {
            presenter.set_fit_to_window(enabled);
            Ok(())
        }
        ControlCommand::SetResizeWindowToImage(enabled) => {
            presenter.set_resize_window_to_image(enabled);
            Ok(())
        }
    };
    if let Err(err) = outcome {
        error!(error = %err, "command rejected");
    }
}

/// Mirrors presenter state onto the real timers: arms or drops the ticker
/// and schedules the latest fade.
fn reconcile<R: ImageResolver>(
    presenter: &mut Viewer<R>,
    ticker: &mut Option<Interval>,
    fade: &mut Option<ScheduledFade>,
) {
    match (presenter.timer().is_running(), ticker.is_some()) {
        (true, false) => {
            let mut interval = time::interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some(interval);
        }
        (false, true) => *ticker = None,
        _ => {}
    }

    if let Some(request) = presenter.take_fade_request() {
        debug!(epoch = request.epoch, phase = ?request.phase, "scheduling fade");
        *fade = Some(ScheduledFade {
            epoch: request.epoch,
            sleep: Box::pin(time::sleep(request.duration)),
        });
    }
}

/// Sends buffered UI events. Returns `false` once the UI is gone.
async fn flush<R: ImageResolver>(presenter: &mut Viewer<R>, to_ui: &Sender<UiEvent>) -> bool {
    let events = std::mem::take(presenter.ui_mut());
    for event in events {
        if to_ui.send(event).await.is_err() {
            return false;
        }
    }
    true
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn fade_elapsed(fade: &mut Option<ScheduledFade>) -> u64 {
    match fade {
        Some(scheduled) => {
            scheduled.sleep.as_mut().await;
            scheduled.epoch
        }
        None => pending().await,
    }
}
