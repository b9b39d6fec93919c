use std::time::Duration;

use tracing::{debug, info, warn};

use super::UiSink;
use super::queue::{Queue, QueueEntry};
use super::timer::SlideTimer;
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::events::{
    DEFAULT_WINDOW_SIZE, LayoutRequest, Notice, RemovalCause, TransitionPhase, UiEvent,
};
use crate::resolver::{ImageHandle, ImageResolver};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenterOptions {
    pub delay: Duration,
    pub animation_duration: Duration,
    pub fit_to_window: bool,
    pub resize_window_to_image: bool,
}

impl From<&Configuration> for PresenterOptions {
    fn from(cfg: &Configuration) -> Self {
        Self {
            delay: cfg.delay_time,
            animation_duration: cfg.animation_duration,
            fit_to_window: cfg.fit_to_window,
            resize_window_to_image: cfg.resize_window_to_image,
        }
    }
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self::from(&Configuration::default())
    }
}

/// A fade the driver has to time. Report completion with
/// [`Presenter::on_fade_complete`] passing the same `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeRequest {
    pub epoch: u64,
    pub phase: TransitionPhase,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddSummary {
    pub added: usize,
    pub failures: Vec<Error>,
}

#[derive(Debug)]
struct Transition {
    phase: TransitionPhase,
    pending: Option<usize>,
    epoch: u64,
}

/// Owns the queue, the transition state machine and the slideshow timer.
///
/// Transition protocol:
/// - `Idle`/`FadingIn` + show request: start fading out towards the target.
/// - `FadingOut` + show request: retarget only; the running fade-out is kept.
/// - fade-out done: resolve the target; on failure evict it through
///   [`Presenter::remove_at`], otherwise make it current and fade in.
/// - fade-in done: back to `Idle`.
pub struct Presenter<R, U> {
    queue: Queue,
    timer: SlideTimer,
    transition: Transition,
    animation_duration: Duration,
    fit_to_window: bool,
    resize_window_to_image: bool,
    resolver: R,
    ui: U,
    fade_request: Option<FadeRequest>,
}

impl<R: ImageResolver, U: UiSink> Presenter<R, U> {
    pub fn new(options: PresenterOptions, resolver: R, ui: U) -> Self {
        Self {
            queue: Queue::new(),
            timer: SlideTimer::new(options.delay),
            transition: Transition {
                phase: TransitionPhase::Idle,
                pending: None,
                epoch: 0,
            },
            animation_duration: options.animation_duration,
            fit_to_window: options.fit_to_window,
            resize_window_to_image: options.resize_window_to_image,
            resolver,
            ui,
            fade_request: None,
        }
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn cursor(&self) -> Option<usize> {
        self.queue.cursor()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.transition.phase
    }

    /// Target of the in-flight transition, if any.
    pub fn pending(&self) -> Option<usize> {
        self.transition.pending
    }

    pub fn timer(&self) -> &SlideTimer {
        &self.timer
    }

    pub fn animation_duration(&self) -> Duration {
        self.animation_duration
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    /// Hands the most recently started fade to the driver. Only the latest
    /// one matters; earlier ones are stale by epoch.
    pub fn take_fade_request(&mut self) -> Option<FadeRequest> {
        self.fade_request.take()
    }

    /// Resolves and appends `sources` in order. Failing sources are reported
    /// and skipped. The first image becomes current if nothing is shown.
    pub fn add<I, S>(&mut self, sources: I) -> AddSummary
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut summary = AddSummary::default();
        for source in sources {
            let source = source.into();
            match self.resolver.resolve(&source) {
                Ok(handle) => {
                    let index = self.queue.push(QueueEntry {
                        source: source.clone(),
                        width: handle.width,
                        height: handle.height,
                    });
                    info!(index, source = %source, "queued image");
                    self.ui.notify(UiEvent::EntryAdded {
                        index,
                        source,
                        width: handle.width,
                        height: handle.height,
                    });
                    summary.added += 1;
                }
                Err(err) => {
                    warn!(source = %source, error = %err, "skipping image");
                    self.report_failure(err.clone());
                    summary.failures.push(err);
                }
            }
        }

        if summary.added > 0 {
            self.ui.notify(UiEvent::QueueChanged {
                len: self.queue.len(),
            });
            if self.queue.cursor().is_none() {
                self.begin_show(0);
                self.ui.notify(UiEvent::UiEnabled(true));
            }
        }
        summary
    }

    /// Single removal path for user removals and load failures.
    pub fn remove_at(&mut self, index: usize, cause: RemovalCause) -> Result<()> {
        let entry = self.queue.remove(index)?;
        info!(index, source = %entry.source, ?cause, "removed image");
        self.ui.notify(UiEvent::EntryRemoved { index, cause });
        self.ui.notify(UiEvent::QueueChanged {
            len: self.queue.len(),
        });

        if self.queue.is_empty() {
            self.clear();
            return Ok(());
        }
        let target = self.queue.cursor().unwrap_or(0);
        self.begin_show(target);
        Ok(())
    }

    /// Empties the queue and returns to the placeholder. Safe to repeat.
    pub fn clear(&mut self) {
        if !self.queue.is_empty() {
            info!(len = self.queue.len(), "clearing queue");
        }
        self.queue.clear();
        self.cancel_transition();
        self.timer.stop();
        self.timer.reset();

        self.ui.notify(UiEvent::QueueChanged { len: 0 });
        self.ui.notify(UiEvent::UiEnabled(false));
        self.ui.notify(UiEvent::CurrentChanged {
            index: None,
            source: None,
        });
        self.emit_timer_state();
        self.ui.notify(UiEvent::Layout(LayoutRequest::Placeholder {
            restore_window: self.resize_window_to_image.then_some(DEFAULT_WINDOW_SIZE),
        }));
        self.ui.notify(UiEvent::Status("Ready".to_string()));
    }

    pub fn request_show(&mut self, index: usize) -> Result<()> {
        let len = self.queue.len();
        if index >= len {
            return Err(Error::OutOfRange { index, len });
        }
        self.begin_show(index);
        Ok(())
    }

    /// Returns `false` when there is nothing after the current image.
    pub fn next(&mut self) -> bool {
        match self.queue.cursor() {
            Some(c) if c + 1 < self.queue.len() => {
                self.begin_show(c + 1);
                true
            }
            _ => false,
        }
    }

    /// Returns `false` when there is nothing before the current image.
    pub fn previous(&mut self) -> bool {
        match self.queue.cursor() {
            Some(c) if c > 0 => {
                self.begin_show(c - 1);
                true
            }
            _ => false,
        }
    }

    pub fn on_fade_complete(&mut self, epoch: u64) -> Result<()> {
        if epoch != self.transition.epoch {
            debug!(
                epoch,
                current = self.transition.epoch,
                "ignoring stale fade completion"
            );
            return Ok(());
        }
        match self.transition.phase {
            TransitionPhase::Idle => Ok(()),
            TransitionPhase::FadingIn => {
                self.settle(1.0);
                Ok(())
            }
            TransitionPhase::FadingOut => self.finish_fade_out(),
        }
    }

    /// Starts the slideshow unless the last image is already showing.
    pub fn start(&mut self) -> bool {
        let len = self.queue.len();
        let has_next = len > 0 && self.queue.cursor().is_none_or(|c| c + 1 < len);
        if !has_next {
            info!(len, "slideshow finished; not starting");
            self.ui.notify(UiEvent::Notice(Notice::QueueFinished));
            return false;
        }
        self.timer.start();
        info!(delay = ?self.timer.delay(), "slideshow started");
        self.emit_timer_state();
        true
    }

    pub fn pause(&mut self) {
        if self.timer.is_running() {
            info!("slideshow paused");
        }
        self.timer.stop();
        self.emit_timer_state();
    }

    /// One timer tick. When the delay has elapsed the show advances, and it
    /// pauses itself if it just left the second-to-last image.
    pub fn tick(&mut self) {
        if !self.timer.is_running() {
            return;
        }
        let elapsed = self.timer.tick();
        self.emit_timer_state();
        if !elapsed {
            return;
        }

        let len = self.queue.len();
        let leaving_second_to_last = match self.queue.cursor() {
            Some(c) => c + 2 == len,
            None => len == 1,
        };
        self.next();
        if leaving_second_to_last {
            debug!("advanced onto the last image; stopping slideshow");
            self.pause();
        }
    }

    /// Zero delays are ignored; returns whether the delay was applied.
    pub fn set_delay(&mut self, delay: Duration) -> bool {
        if delay.is_zero() {
            warn!("ignoring zero slide delay");
            return false;
        }
        self.timer.set_delay(delay);
        info!(delay = ?delay, "slide delay changed");
        true
    }

    pub fn set_animation_duration(&mut self, duration: Duration) {
        self.animation_duration = duration;
        info!(duration = ?duration, "animation duration changed");
    }

    pub fn set_fit_to_window(&mut self, enabled: bool) {
        self.fit_to_window = enabled;
        if self.queue.cursor().is_some() && !self.resize_window_to_image {
            let layout = if enabled {
                LayoutRequest::FitToWindow
            } else {
                LayoutRequest::ActualSize
            };
            self.ui.notify(UiEvent::Layout(layout));
        }
    }

    pub fn set_resize_window_to_image(&mut self, enabled: bool) {
        self.resize_window_to_image = enabled;
        if !enabled {
            return;
        }
        if let Some(entry) = self.queue.current() {
            let layout = LayoutRequest::ResizeWindowToImage {
                width: entry.width,
                height: entry.height,
            };
            self.ui.notify(UiEvent::Layout(layout));
        }
    }

    /// Surfaces a failure that happened outside the presenter, e.g. a
    /// remote download.
    pub fn report_failure(&mut self, err: Error) {
        self.ui.notify(UiEvent::Notice(Notice::Failure(err)));
    }

    fn begin_show(&mut self, index: usize) {
        let previous = self.transition.pending.replace(index);
        match self.transition.phase {
            TransitionPhase::FadingOut => {
                debug!(index, ?previous, "retargeted running fade-out");
            }
            TransitionPhase::Idle | TransitionPhase::FadingIn => {
                self.enter_phase(TransitionPhase::FadingOut);
            }
        }
    }

    fn enter_phase(&mut self, phase: TransitionPhase) {
        self.transition.phase = phase;
        self.transition.epoch += 1;
        self.fade_request = Some(FadeRequest {
            epoch: self.transition.epoch,
            phase,
            duration: self.animation_duration,
        });
        self.ui.notify(UiEvent::TransitionPhase {
            phase,
            opacity: phase.start_opacity(),
        });
    }

    fn settle(&mut self, opacity: f32) {
        self.transition.phase = TransitionPhase::Idle;
        self.ui.notify(UiEvent::TransitionPhase {
            phase: TransitionPhase::Idle,
            opacity,
        });
    }

    fn cancel_transition(&mut self) {
        if self.transition.phase != TransitionPhase::Idle || self.transition.pending.is_some() {
            self.transition.epoch += 1;
            self.transition.pending = None;
            self.settle(1.0);
        }
        self.fade_request = None;
    }

    fn finish_fade_out(&mut self) -> Result<()> {
        let Some(target) = self.transition.pending.take() else {
            self.settle(1.0);
            return Ok(());
        };
        let Some(entry) = self.queue.get(target) else {
            self.settle(1.0);
            return Err(Error::OutOfRange {
                index: target,
                len: self.queue.len(),
            });
        };
        let source = entry.source.clone();

        match self.resolver.resolve(&source) {
            Ok(handle) => self.show(target, handle),
            Err(err) => {
                warn!(
                    index = target,
                    source = %source,
                    error = %err,
                    "dropping image that failed to load"
                );
                self.settle(0.0);
                self.remove_at(target, RemovalCause::LoadFailed)
            }
        }
    }

    fn show(&mut self, index: usize, handle: ImageHandle) -> Result<()> {
        if let Some(previous) = self.queue.cursor() {
            self.ui.notify(UiEvent::Highlight {
                index: previous,
                selected: false,
            });
        }
        self.queue.set_cursor(index)?;
        self.ui.notify(UiEvent::Highlight {
            index,
            selected: true,
        });
        self.ui.notify(UiEvent::CurrentChanged {
            index: Some(index),
            source: Some(handle.source.clone()),
        });
        self.ui.notify(UiEvent::Status(handle.source.clone()));
        if let Some(layout) = self.layout_for(&handle) {
            self.ui.notify(UiEvent::Layout(layout));
        }
        self.ui.notify(UiEvent::ScrollIntoView(index));
        info!(index, source = %handle.source, "showing image");
        self.enter_phase(TransitionPhase::FadingIn);
        Ok(())
    }

    fn layout_for(&self, handle: &ImageHandle) -> Option<LayoutRequest> {
        if self.resize_window_to_image {
            Some(LayoutRequest::ResizeWindowToImage {
                width: handle.width,
                height: handle.height,
            })
        } else if self.fit_to_window {
            Some(LayoutRequest::FitToWindow)
        } else {
            None
        }
    }

    fn emit_timer_state(&mut self) {
        self.ui.notify(UiEvent::TimerStateChanged {
            running: self.timer.is_running(),
            progress: self.timer.progress(),
        });
    }
}
