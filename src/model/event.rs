//! Typed native window notifications.
//!
//! One variant per classified native event, each carrying the affected window
//! handle. The classifier that maps raw OS notifications onto these lives
//! outside the core; the dispatcher matches this enum exhaustively so a new
//! variant cannot be silently dropped.

use serde::{Deserialize, Serialize};

use crate::sys::window_server::WindowHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum WmEvent {
    Destroy(WindowHandle),
    Hide(WindowHandle),
    Cloak(WindowHandle),
    Minimise(WindowHandle),
    Show(WindowHandle),
    Uncloak(WindowHandle),
    FocusChange(WindowHandle),
    MoveResizeStart(WindowHandle),
    MoveResizeEnd(WindowHandle),
    MouseCapture(WindowHandle),
    Moved(WindowHandle),
}

impl WmEvent {
    pub fn window(self) -> WindowHandle {
        match self {
            WmEvent::Destroy(window)
            | WmEvent::Hide(window)
            | WmEvent::Cloak(window)
            | WmEvent::Minimise(window)
            | WmEvent::Show(window)
            | WmEvent::Uncloak(window)
            | WmEvent::FocusChange(window)
            | WmEvent::MoveResizeStart(window)
            | WmEvent::MoveResizeEnd(window)
            | WmEvent::MouseCapture(window)
            | WmEvent::Moved(window) => window,
        }
    }
}
