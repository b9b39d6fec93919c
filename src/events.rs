use std::time::Duration;

use crate::error::Error;

/// Requests fed to the controller task by the input surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    /// Resolve and append local sources (paths, `file://` URIs, directories).
    AddFiles(Vec<String>),
    /// Download a remote image, then append it.
    AddUrl(String),
    /// Jump to a queue index (thumbnail click).
    Show(usize),
    Next,
    Previous,
    /// Remove a queue index (thumbnail context menu).
    Remove(usize),
    Clear,
    /// Start the slideshow timer.
    Start,
    /// Pause the slideshow timer.
    Pause,
    SetDelay(Duration),
    SetAnimationDuration(Duration),
    SetFitToWindow(bool),
    SetResizeWindowToImage(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    FadingOut,
    FadingIn,
}

impl TransitionPhase {
    /// Opacity of the displayed image when this phase begins.
    pub fn start_opacity(self) -> f32 {
        match self {
            TransitionPhase::FadingIn => 0.0,
            TransitionPhase::Idle | TransitionPhase::FadingOut => 1.0,
        }
    }
}

/// Why an entry left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    User,
    LoadFailed,
}

/// Default window size restored when the queue is cleared in resize mode.
pub const DEFAULT_WINDOW_SIZE: (u32, u32) = (500, 350);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutRequest {
    /// Grow or shrink the window so the image shows at its natural size.
    ResizeWindowToImage { width: u32, height: u32 },
    /// Scale the image to the display area.
    FitToWindow,
    /// Show the image unscaled.
    ActualSize,
    /// Show the placeholder; `restore_window` carries the window size to go
    /// back to when resize mode is on.
    Placeholder { restore_window: Option<(u32, u32)> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Failure(Error),
    /// Start was requested with nothing left to show.
    QueueFinished,
}

/// State-change notifications for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    QueueChanged {
        len: usize,
    },
    EntryAdded {
        index: usize,
        source: String,
        width: u32,
        height: u32,
    },
    EntryRemoved {
        index: usize,
        cause: RemovalCause,
    },
    CurrentChanged {
        index: Option<usize>,
        source: Option<String>,
    },
    Highlight {
        index: usize,
        selected: bool,
    },
    TransitionPhase {
        phase: TransitionPhase,
        opacity: f32,
    },
    TimerStateChanged {
        running: bool,
        progress: f64,
    },
    UiEnabled(bool),
    Status(String),
    Layout(LayoutRequest),
    ScrollIntoView(usize),
    Notice(Notice),
}
