//! An in-memory desktop implementing both facades.
//!
//! Backs the replay driver and the tests: monitors and windows live in plain
//! vectors, facade mutations are applied to them directly, and the raise and
//! move calls are logged so assertions can observe side effects. The whole
//! simulation is serializable so a replay script can seed it.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::sys::geometry::{Point, Rect};
use crate::sys::virtual_desktop::{VirtualDesktopError, VirtualDesktopId, VirtualDesktops};
use crate::sys::window_server::{
    MonitorHandle, MonitorInfo, WindowHandle, WindowInfo, WindowServer, WindowServerError,
};

fn default_true() -> bool { true }

fn default_desktop() -> VirtualDesktopId { VirtualDesktopId::new(1) }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimWindow {
    pub handle: WindowHandle,
    pub title: String,
    pub monitor: MonitorHandle,
    #[serde(default)]
    pub frame: Rect,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub cloaked: bool,
    #[serde(default)]
    pub system_invisible: bool,
    #[serde(default)]
    pub maximized: bool,
    #[serde(default = "default_desktop")]
    pub desktop: VirtualDesktopId,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Simulation {
    pub monitors: Vec<MonitorInfo>,
    pub windows: Vec<SimWindow>,
    pub desktops: Vec<VirtualDesktopId>,
    pub active_desktop: VirtualDesktopId,
    pub cursor: Point,
    /// The window holding input focus, or none when the desktop has it.
    pub focused: Option<WindowHandle>,
    /// Every raise-and-focus call, in order.
    #[serde(skip)]
    pub raised: Vec<WindowHandle>,
    /// Every relative move that actually offset a window.
    #[serde(skip)]
    pub moved: Vec<WindowHandle>,
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation {
            monitors: Vec::new(),
            windows: Vec::new(),
            desktops: vec![default_desktop()],
            active_desktop: default_desktop(),
            cursor: Point::default(),
            focused: None,
            raised: Vec::new(),
            moved: Vec::new(),
        }
    }
}

pub type SimShared = Rc<RefCell<Simulation>>;

impl Simulation {
    pub fn new() -> Self { Self::default() }

    /// Wraps the simulation for sharing between the two facade handles (and
    /// a test's own probe).
    pub fn share(self) -> SimShared { Rc::new(RefCell::new(self)) }

    pub fn add_monitor(&mut self, frame: Rect, work_area: Rect, name: &str) -> MonitorHandle {
        let handle = MonitorHandle::new(self.monitors.len() as u64 + 1);
        self.monitors.push(MonitorInfo {
            handle,
            frame,
            work_area,
            name: name.to_string(),
        });
        handle
    }

    /// Opens a visible window on the active desktop, placed inside the
    /// monitor's frame.
    pub fn open_window(&mut self, title: &str, monitor: MonitorHandle) -> WindowHandle {
        let handle = WindowHandle::new(
            self.windows.iter().map(|w| w.handle.get()).max().unwrap_or(0) + 1,
        );
        let frame = self
            .monitors
            .iter()
            .find(|m| m.handle == monitor)
            .map(|m| Rect::new(m.frame.left + 50, m.frame.top + 50, m.frame.left + 950, m.frame.top + 750))
            .unwrap_or_default();
        self.windows.push(SimWindow {
            handle,
            title: title.to_string(),
            monitor,
            frame,
            visible: true,
            minimized: false,
            cloaked: false,
            system_invisible: false,
            maximized: false,
            desktop: self.active_desktop,
        });
        handle
    }

    pub fn window_mut(&mut self, handle: WindowHandle) -> Option<&mut SimWindow> {
        self.windows.iter_mut().find(|w| w.handle == handle)
    }

    /// Makes the window disappear, so any further facade call on it fails
    /// with `WindowGone` and it drops out of future enumerations.
    pub fn vanish(&mut self, handle: WindowHandle) {
        self.windows.retain(|w| w.handle != handle);
        if self.focused == Some(handle) {
            self.focused = None;
        }
    }

    pub fn window(&self, handle: WindowHandle) -> Result<&SimWindow, WindowServerError> {
        self.windows
            .iter()
            .find(|w| w.handle == handle)
            .ok_or(WindowServerError::WindowGone(handle))
    }

    fn window_checked_mut(
        &mut self,
        handle: WindowHandle,
    ) -> Result<&mut SimWindow, WindowServerError> {
        self.windows
            .iter_mut()
            .find(|w| w.handle == handle)
            .ok_or(WindowServerError::WindowGone(handle))
    }
}

/// Window-system half of the simulation.
#[derive(Clone)]
pub struct SimWindowServer {
    shared: SimShared,
}

impl SimWindowServer {
    pub fn new(shared: SimShared) -> Self { Self { shared } }
}

impl WindowServer for SimWindowServer {
    fn list_windows(&self) -> Result<Vec<WindowHandle>, WindowServerError> {
        let sim = self.shared.borrow();
        // Like the native enumeration, only the active desktop is visible.
        Ok(sim
            .windows
            .iter()
            .filter(|w| w.desktop == sim.active_desktop)
            .map(|w| w.handle)
            .collect())
    }

    fn list_monitors(&self) -> Result<Vec<MonitorInfo>, WindowServerError> {
        Ok(self.shared.borrow().monitors.clone())
    }

    fn window_info(&self, window: WindowHandle) -> Result<WindowInfo, WindowServerError> {
        let sim = self.shared.borrow();
        let w = sim.window(window)?;
        Ok(WindowInfo {
            title: w.title.clone(),
            is_visible: w.visible,
            is_valid: true,
            is_minimized: w.minimized,
            is_cloaked: w.cloaked,
            is_system_invisible: w.system_invisible,
        })
    }

    fn monitor_for_window(&self, window: WindowHandle) -> Result<MonitorHandle, WindowServerError> {
        Ok(self.shared.borrow().window(window)?.monitor)
    }

    fn window_frame(&self, window: WindowHandle) -> Result<Rect, WindowServerError> {
        Ok(self.shared.borrow().window(window)?.frame)
    }

    fn relative_move(
        &mut self,
        window: WindowHandle,
        from: Point,
        to: Point,
    ) -> Result<(), WindowServerError> {
        let mut sim = self.shared.borrow_mut();
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let w = sim.window_checked_mut(window)?;
        if dx == 0 && dy == 0 {
            // No offset: only re-assert z-order.
            trace!(window = %window, "relative move with zero offset");
            return Ok(());
        }
        // The restore/re-maximize dance real backends need around a move is
        // invisible here; the end state is just a translated frame.
        w.frame = w.frame.translate(dx, dy);
        let center = w.frame.center();
        // Nearest-monitor resolution follows the window.
        let monitor = sim
            .monitors
            .iter()
            .find(|m| {
                center.x >= m.frame.left
                    && center.x < m.frame.right
                    && center.y >= m.frame.top
                    && center.y < m.frame.bottom
            })
            .map(|m| m.handle);
        if let Some(monitor) = monitor
            && let Ok(w) = sim.window_checked_mut(window)
        {
            w.monitor = monitor;
        }
        sim.moved.push(window);
        Ok(())
    }

    fn raise_and_focus(&mut self, window: WindowHandle) -> Result<(), WindowServerError> {
        let mut sim = self.shared.borrow_mut();
        sim.window(window)?;
        sim.focused = Some(window);
        sim.raised.push(window);
        Ok(())
    }

    fn minimize(&mut self, window: WindowHandle) -> Result<(), WindowServerError> {
        let mut sim = self.shared.borrow_mut();
        sim.window_checked_mut(window)?.minimized = true;
        Ok(())
    }

    fn toggle_maximize(&mut self, window: WindowHandle) -> Result<(), WindowServerError> {
        let mut sim = self.shared.borrow_mut();
        let w = sim.window_checked_mut(window)?;
        w.maximized = !w.maximized;
        Ok(())
    }

    fn set_cursor_pos(&mut self, pos: Point) -> Result<(), WindowServerError> {
        self.shared.borrow_mut().cursor = pos;
        Ok(())
    }

    fn focus_desktop(&mut self) -> Result<(), WindowServerError> {
        self.shared.borrow_mut().focused = None;
        Ok(())
    }
}

/// Virtual-desktop half of the simulation.
#[derive(Clone)]
pub struct SimVirtualDesktops {
    shared: SimShared,
}

impl SimVirtualDesktops {
    pub fn new(shared: SimShared) -> Self { Self { shared } }
}

impl VirtualDesktops for SimVirtualDesktops {
    fn desktops(&self) -> Result<Vec<VirtualDesktopId>, VirtualDesktopError> {
        Ok(self.shared.borrow().desktops.clone())
    }

    fn switch_to(&mut self, desktop: VirtualDesktopId) -> Result<(), VirtualDesktopError> {
        let mut sim = self.shared.borrow_mut();
        if !sim.desktops.contains(&desktop) {
            return Err(VirtualDesktopError::UnknownDesktop(desktop));
        }
        sim.active_desktop = desktop;
        sim.focused = None;
        Ok(())
    }

    fn send_window_to(
        &mut self,
        window: WindowHandle,
        desktop: VirtualDesktopId,
    ) -> Result<(), VirtualDesktopError> {
        let mut sim = self.shared.borrow_mut();
        if !sim.desktops.contains(&desktop) {
            return Err(VirtualDesktopError::UnknownDesktop(desktop));
        }
        match sim.window_mut(window) {
            Some(w) => {
                w.desktop = desktop;
                Ok(())
            }
            None => Err(VirtualDesktopError::Backend(format!("window {window} is gone"))),
        }
    }

    fn create_desktop(&mut self) -> Result<VirtualDesktopId, VirtualDesktopError> {
        let mut sim = self.shared.borrow_mut();
        let next =
            VirtualDesktopId::new(sim.desktops.iter().map(|d| d.get()).max().unwrap_or(0) + 1);
        sim.desktops.push(next);
        Ok(next)
    }
}
