//! Console front-end: stdin lines in, UI events out as log lines.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::events::{ControlCommand, LayoutRequest, Notice, UiEvent};
use crate::input::parse_console_command;

/// Reads commands line by line from `input`. `quit` or end of input cancels
/// the whole pipeline.
pub async fn read_commands<I>(
    input: I,
    commands: Sender<ControlCommand>,
    cancel: CancellationToken,
) -> Result<()>
where
    I: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    loop {
        select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    info!("console input closed; initiating shutdown");
                    cancel.cancel();
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line, "quit" | "exit" | "q") {
                    info!("quit requested");
                    cancel.cancel();
                    break;
                }
                match parse_console_command(line) {
                    Ok(cmd) => {
                        if commands.send(cmd).await.is_err() {
                            warn!("controller gone; dropping console input");
                            break;
                        }
                    }
                    Err(err) => warn!("{err}"),
                }
            }
        }
    }
    Ok(())
}

/// Stands in for a window: every UI event becomes a log line.
pub async fn log_ui_events(mut events: Receiver<UiEvent>, cancel: CancellationToken) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_ev = events.recv() => match maybe_ev {
                Some(ev) => log_event(&ev),
                None => break,
            },
        }
    }
    Ok(())
}

fn log_event(ev: &UiEvent) {
    match ev {
        UiEvent::CurrentChanged {
            index: Some(index),
            source: Some(source),
        } => info!(index, source = %source, "showing"),
        UiEvent::CurrentChanged { .. } => info!("nothing to show"),
        UiEvent::EntryAdded {
            index,
            source,
            width,
            height,
        } => info!(index, source = %source, "added {width}x{height}"),
        UiEvent::EntryRemoved { index, cause } => info!(index, ?cause, "removed"),
        UiEvent::Notice(Notice::Failure(err)) if err.is_user_facing() => {
            warn!("{}: {err}", err.title())
        }
        UiEvent::Notice(Notice::Failure(err)) => error!("{err}"),
        UiEvent::Notice(Notice::QueueFinished) => {
            info!("Slideshow finished: no more images to show")
        }
        UiEvent::Status(text) => info!(status = %text),
        UiEvent::Layout(LayoutRequest::ResizeWindowToImage { width, height }) => {
            debug!("resize window to {width}x{height}")
        }
        UiEvent::TimerStateChanged { running, progress } => {
            debug!(running, progress, "timer")
        }
        UiEvent::TransitionPhase { phase, opacity } => trace!(?phase, opacity, "transition"),
        other => debug!(event = ?other, "ui"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn forwards_parsed_lines_and_skips_bad_ones() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let input: &[u8] = b"add a.png\n\nbogus\nshow 1\n";

        read_commands(input, tx, cancel.clone()).await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(ControlCommand::AddFiles(vec!["a.png".into()]))
        );
        assert_eq!(rx.recv().await, Some(ControlCommand::Show(1)));
        assert_eq!(rx.recv().await, None);
        assert!(cancel.is_cancelled(), "end of input cancels");
    }

    #[tokio::test]
    async fn quit_stops_reading() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let input: &[u8] = b"next\nquit\nprev\n";

        read_commands(input, tx, cancel.clone()).await.unwrap();

        assert_eq!(rx.recv().await, Some(ControlCommand::Next));
        assert_eq!(rx.recv().await, None);
        assert!(cancel.is_cancelled());
    }
}
