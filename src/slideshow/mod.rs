//! Slideshow core: the queue, the transition state machine and the
//! auto-advance timer. Everything here is synchronous; the controller task
//! drives it and turns fade requests into real timers.

pub mod presenter;
pub mod queue;
pub mod timer;

pub use presenter::{AddSummary, FadeRequest, Presenter, PresenterOptions};
pub use queue::{Queue, QueueEntry};
pub use timer::{SlideTimer, TICK_INTERVAL};

use crate::events::UiEvent;

/// Receiver of UI state-change notifications.
pub trait UiSink {
    fn notify(&mut self, event: UiEvent);
}

/// Buffers events; the controller drains it after every operation.
impl UiSink for Vec<UiEvent> {
    fn notify(&mut self, event: UiEvent) {
        self.push(event);
    }
}
