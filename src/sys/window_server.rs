//! Facade over the native window system.
//!
//! Everything the manager knows about real windows and monitors flows through
//! this trait; the core never touches platform APIs directly. Implementations
//! are synchronous and run on the dispatcher thread, so a slow call stalls
//! message processing — an accepted trade-off for a strictly ordered model.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sys::geometry::{Point, Rect};

/// Stable identity of a native top-level window for its lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct WindowHandle(u64);

impl WindowHandle {
    pub fn new(raw: u64) -> Self { Self(raw) }

    pub fn get(self) -> u64 { self.0 }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "0x{:x}", self.0) }
}

/// Native handle of a physical monitor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct MonitorHandle(u64);

impl MonitorHandle {
    pub fn new(raw: u64) -> Self { Self(raw) }

    pub fn get(self) -> u64 { self.0 }
}

impl fmt::Display for MonitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "0x{:x}", self.0) }
}

/// One discovered monitor, in the order the native enumeration reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub handle: MonitorHandle,
    /// Full bounding rectangle of the monitor.
    pub frame: Rect,
    /// The frame minus taskbars and other reserved areas.
    pub work_area: Rect,
    pub name: String,
}

/// Per-window flags and title, queried as one unit so the eligibility filter
/// sees a consistent snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub title: String,
    pub is_visible: bool,
    pub is_valid: bool,
    pub is_minimized: bool,
    pub is_cloaked: bool,
    /// Set for windows the shell itself hides from the user (per the native
    /// titlebar state flags).
    pub is_system_invisible: bool,
}

#[derive(Debug, Error)]
pub enum WindowServerError {
    /// The target window no longer exists, or vanished between the decision
    /// and the call.
    #[error("window {0} is gone")]
    WindowGone(WindowHandle),
    #[error("window server backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, WindowServerError>;

/// Operations the manager needs from the OS. Queries take `&self`; anything
/// that pokes the desktop takes `&mut self`.
pub trait WindowServer {
    /// All current native top-level windows, unfiltered.
    fn list_windows(&self) -> Result<Vec<WindowHandle>>;

    /// All attached monitors with bounds, work area, and device name.
    fn list_monitors(&self) -> Result<Vec<MonitorInfo>>;

    fn window_info(&self, window: WindowHandle) -> Result<WindowInfo>;

    /// The monitor the window currently overlaps most.
    fn monitor_for_window(&self, window: WindowHandle) -> Result<MonitorHandle>;

    /// The window's rectangle. Backends prefer extended-frame bounds and
    /// fall back to the basic rect.
    fn window_frame(&self, window: WindowHandle) -> Result<Rect>;

    /// Moves the window by the offset between `from` and `to`, preserving
    /// size. A maximized window is restored first and re-maximized after,
    /// since moving it directly corrupts later restore behavior. A zero
    /// offset only re-asserts z-order without moving.
    fn relative_move(&mut self, window: WindowHandle, from: Point, to: Point) -> Result<()>;

    /// Raises the window and gives it input focus, including whatever benign
    /// input nudge the platform needs to satisfy focus-stealing prevention.
    fn raise_and_focus(&mut self, window: WindowHandle) -> Result<()>;

    fn minimize(&mut self, window: WindowHandle) -> Result<()>;

    fn toggle_maximize(&mut self, window: WindowHandle) -> Result<()>;

    fn set_cursor_pos(&mut self, pos: Point) -> Result<()>;

    /// Gives focus to the desktop itself, dropping it from any window.
    fn focus_desktop(&mut self) -> Result<()>;
}
