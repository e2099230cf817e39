//! User intents, produced by the hotkey layer one per recognized chord.

use serde::{Deserialize, Serialize};

use crate::model::ring::CycleDirection;
use crate::model::state::ScreenId;
use crate::sys::virtual_desktop::VirtualDesktopId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum WmCommand {
    /// Switch the active virtual desktop and rebuild state from scratch;
    /// windows are not tracked across desktops.
    FocusVirtualDesktop(VirtualDesktopId),
    /// Move the focused window to another desktop. It drops out of the model
    /// on the next desktop switch's enumeration.
    SendToVirtualDesktop(VirtualDesktopId),
    /// Log the current state for diagnostics.
    StateDump,
    CycleFocusedWindow(CycleDirection),
    /// Minimise the focused window.
    Minimise,
    /// Maximise the focused window, or restore it if already maximised.
    ToggleMaximise,
    /// Move the focused window to the given screen and follow it with focus.
    MoveToScreen(ScreenId),
    /// Move the focused window to the given screen but keep focus here.
    SendToScreen(ScreenId),
    FocusScreen(ScreenId),
    /// Discard and rebuild the whole state from a fresh enumeration.
    RecreateState,
    /// Reserved; not handled at this layer.
    TogglePinWindow,
    Noop,
}
