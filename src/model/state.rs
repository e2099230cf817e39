//! The authoritative model of managed windows and screens.
//!
//! `WmState` indexes every managed window by handle and every screen by both
//! logical id and native monitor handle. It is built in one pass from a fresh
//! native enumeration and is never patched incrementally: whenever the model
//! and the OS disagree in a way the normal event flow cannot absorb, the
//! whole state is rebuilt. Lookup misses are reported and swallowed; the only
//! fatal condition is discovering more monitors than configured screen ids.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::common::collections::{BTreeMap, HashMap};
use crate::common::config::Config;
use crate::model::ring::WindowRing;
use crate::sys::geometry::{Point, Rect};
use crate::sys::window_server::{
    MonitorHandle, MonitorInfo, WindowHandle, WindowInfo, WindowServer, WindowServerError,
};

/// Logical screen identifier, assigned from the configured priority-ordered
/// list so the same monitor gets the same id across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(String);

impl ScreenId {
    pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ScreenId {
    fn from(id: &str) -> Self { Self::new(id) }
}

/// One managed native window. Identity is the handle; the record is never
/// duplicated across screens.
#[derive(Debug, Clone)]
pub struct Window {
    pub handle: WindowHandle,
    /// Id of the screen this window was last assigned to. A cache, not a
    /// source of truth: consumers must tolerate staleness and fall back to
    /// scanning every screen.
    pub screen: ScreenId,
    /// Origin of the screen the window was last placed on, used as the
    /// reference point when relocating it across screens.
    pub origin: Point,
}

/// One physical monitor together with its ordered window collection.
#[derive(Debug)]
pub struct Screen {
    pub handle: MonitorHandle,
    pub frame: Rect,
    pub work_area: Rect,
    pub name: String,
    pub id: ScreenId,
    pub windows: WindowRing,
}

impl Screen {
    fn from_monitor(info: MonitorInfo, id: ScreenId) -> Self {
        Screen {
            handle: info.handle,
            frame: info.frame,
            work_area: info.work_area,
            name: info.name,
            id,
            windows: WindowRing::new(),
        }
    }
}

/// How to identify the screen that should take focus. Resolving by monitor
/// handle is used when the screen is only known from a native notification.
#[derive(Debug, Clone)]
pub enum ScreenSelector {
    ById(ScreenId),
    ByMonitor(MonitorHandle),
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("discovered {monitors} monitors but only {ids} screen ids are configured")]
    NotEnoughScreenIds { monitors: usize, ids: usize },
    #[error("no monitors discovered")]
    NoMonitors,
    #[error(transparent)]
    WindowServer(#[from] WindowServerError),
}

#[derive(Debug)]
pub struct WmState {
    windows: HashMap<WindowHandle, Window>,
    screens: BTreeMap<ScreenId, Screen>,
    /// Secondary index into `screens`, keyed by native monitor handle.
    screens_by_monitor: HashMap<MonitorHandle, ScreenId>,
    focused_screen_id: ScreenId,
}

impl WmState {
    /// Builds the whole state from a fresh enumeration of monitors and
    /// top-level windows. This is both startup and the sole recovery path.
    pub fn new(config: &Config, server: &impl WindowServer) -> Result<WmState, StateError> {
        let monitors = server.list_monitors()?;
        if monitors.is_empty() {
            return Err(StateError::NoMonitors);
        }
        if monitors.len() > config.screen_ids.len() {
            return Err(StateError::NotEnoughScreenIds {
                monitors: monitors.len(),
                ids: config.screen_ids.len(),
            });
        }

        let mut screens = BTreeMap::new();
        let mut screens_by_monitor = HashMap::default();
        for (info, id) in monitors.into_iter().zip(&config.screen_ids) {
            screens_by_monitor.insert(info.handle, id.clone());
            screens.insert(id.clone(), Screen::from_monitor(info, id.clone()));
        }

        let focused_screen_id = if screens.contains_key(&config.initial_focused_screen) {
            config.initial_focused_screen.clone()
        } else {
            // Fewer monitors than configured ids; fall back to the first
            // assigned one.
            let first = screens.keys().next().cloned().ok_or(StateError::NoMonitors)?;
            warn!(
                configured = %config.initial_focused_screen,
                fallback = %first,
                "initial focused screen not present, falling back",
            );
            first
        };

        let mut state = WmState {
            windows: HashMap::default(),
            screens,
            screens_by_monitor,
            focused_screen_id,
        };
        for handle in server.list_windows()? {
            state.register(handle, config, server);
        }
        debug!(
            windows = state.windows.len(),
            screens = state.screens.len(),
            focused = %state.focused_screen_id,
            "state built",
        );
        Ok(state)
    }

    pub fn is_registered(&self, window: WindowHandle) -> bool {
        self.windows.contains_key(&window)
    }

    pub fn window(&self, window: WindowHandle) -> Option<&Window> { self.windows.get(&window) }

    pub fn window_count(&self) -> usize { self.windows.len() }

    pub fn screen(&self, id: &ScreenId) -> Option<&Screen> { self.screens.get(id) }

    pub fn screens(&self) -> impl Iterator<Item = &Screen> { self.screens.values() }

    pub fn focused_screen_id(&self) -> &ScreenId { &self.focused_screen_id }

    pub fn focused_screen(&self) -> &Screen { &self.screens[&self.focused_screen_id] }

    pub fn focused_screen_mut(&mut self) -> &mut Screen {
        self.screens
            .get_mut(&self.focused_screen_id)
            .expect("focused screen id always resolves to a known screen")
    }

    /// Registers a window if it passes the eligibility filter. Ineligible
    /// windows are skipped silently; an already-known handle is reported and
    /// left alone.
    pub fn register(&mut self, window: WindowHandle, config: &Config, server: &impl WindowServer) {
        if self.windows.contains_key(&window) {
            warn!(window = %window, "window is already registered, ignoring");
            return;
        }
        let Ok(info) = server.window_info(window) else {
            trace!(window = %window, "window info unavailable, skipping");
            return;
        };
        if !is_eligible(&info, config) {
            trace!(window = %window, title = %info.title, "window is not eligible, skipping");
            return;
        }
        let Ok(monitor) = server.monitor_for_window(window) else {
            trace!(window = %window, "cannot resolve monitor, skipping");
            return;
        };
        let Some(screen_id) = self.screens_by_monitor.get(&monitor).cloned() else {
            error!(window = %window, monitor = %monitor, "no screen for monitor");
            return;
        };
        self.attach(window, screen_id);
    }

    /// Registers a window unconditionally, bypassing the eligibility filter.
    /// Used when context already proves the window valid, e.g. the user just
    /// finished dragging it. A known handle is first detached from wherever
    /// it was, then re-attached under the screen of its *current* monitor,
    /// which also becomes the focused screen.
    pub fn force_register(&mut self, window: WindowHandle, server: &impl WindowServer) {
        if let Some(old) = self.windows.remove(&window) {
            self.remove_from_screens(window, Some(&old.screen));
        }
        let Ok(monitor) = server.monitor_for_window(window) else {
            error!(window = %window, "cannot resolve monitor for forced registration");
            return;
        };
        let Some(screen_id) = self.screens_by_monitor.get(&monitor).cloned() else {
            error!(window = %window, monitor = %monitor, "no screen for monitor");
            return;
        };
        self.attach(window, screen_id.clone());
        self.focused_screen_id = screen_id;
    }

    /// Removes a window from the model and returns the window its screen's
    /// cursor landed on, so the caller can redirect focus. Unknown handles
    /// are reported and leave the state untouched.
    pub fn unregister(&mut self, window: WindowHandle) -> Option<WindowHandle> {
        let Some(record) = self.windows.remove(&window) else {
            error!(window = %window, "cannot unregister an unknown window");
            return None;
        };
        let screen_id = self.remove_from_screens(window, Some(&record.screen))?;
        self.screens.get(&screen_id).and_then(|screen| screen.windows.current())
    }

    /// Stores the focused screen. Returns false (after reporting) if the
    /// selector does not resolve.
    pub fn set_focused_screen(&mut self, selector: ScreenSelector) -> bool {
        let id = match selector {
            ScreenSelector::ById(id) => {
                if !self.screens.contains_key(&id) {
                    error!(screen = %id, "unknown screen id");
                    return false;
                }
                id
            }
            ScreenSelector::ByMonitor(monitor) => match self.screens_by_monitor.get(&monitor) {
                Some(id) => id.clone(),
                None => {
                    error!(monitor = %monitor, "no screen for monitor");
                    return false;
                }
            },
        };
        self.focused_screen_id = id;
        true
    }

    /// Moves a screen's cursor onto `window`, trying the window's cached
    /// screen first and falling back to scanning every screen if the cache
    /// is stale. Best-effort: an overall miss is only reported.
    pub fn set_focused_window(&mut self, window: WindowHandle) {
        let cached = self.windows.get(&window).map(|record| record.screen.clone());
        if let Some(id) = &cached
            && let Some(screen) = self.screens.get_mut(id)
            && screen.windows.focus(window, true).is_ok()
        {
            return;
        }
        if cached.is_some() {
            warn!(window = %window, "cached screen is stale, scanning all screens");
        }
        for (id, screen) in self.screens.iter_mut() {
            if screen.windows.focus(window, true).is_ok() {
                if let Some(record) = self.windows.get_mut(&window) {
                    record.screen = id.clone();
                }
                return;
            }
        }
        error!(window = %window, "window is not in any screen's collection");
    }

    /// Moves `window` from whichever screen holds it into `target`'s
    /// collection and refreshes its cached screen and origin. Returns false
    /// (after reporting) if either side cannot be resolved.
    pub fn transfer(&mut self, window: WindowHandle, target: &ScreenId) -> bool {
        if !self.screens.contains_key(target) {
            error!(window = %window, screen = %target, "unknown target screen");
            return false;
        }
        let cached = self.windows.get(&window).map(|record| record.screen.clone());
        if self.remove_from_screens(window, cached.as_ref()).is_none() {
            return false;
        }
        let Some(screen) = self.screens.get_mut(target) else {
            return false;
        };
        screen.windows.add(window);
        let origin = screen.frame.origin();
        if let Some(record) = self.windows.get_mut(&window) {
            record.screen = target.clone();
            record.origin = origin;
        }
        true
    }

    /// A serializable snapshot of the whole model, for `StateDump`.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            focused_screen: self.focused_screen_id.clone(),
            window_count: self.windows.len(),
            screens: self
                .screens
                .values()
                .map(|screen| ScreenSnapshot {
                    id: screen.id.clone(),
                    name: screen.name.clone(),
                    monitor: screen.handle,
                    frame: screen.frame,
                    work_area: screen.work_area,
                    focused: screen.windows.current(),
                    windows: screen.windows.elements(),
                })
                .collect(),
        }
    }

    fn attach(&mut self, window: WindowHandle, screen_id: ScreenId) {
        let Some(screen) = self.screens.get_mut(&screen_id) else {
            error!(window = %window, screen = %screen_id, "cannot attach to unknown screen");
            return;
        };
        screen.windows.add(window);
        let origin = screen.frame.origin();
        self.windows.insert(window, Window { handle: window, screen: screen_id, origin });
    }

    /// Removes `window` from the collection holding it, preferring the cached
    /// screen and scanning everything when the cache lies. Returns the screen
    /// it was actually removed from.
    fn remove_from_screens(
        &mut self,
        window: WindowHandle,
        cached: Option<&ScreenId>,
    ) -> Option<ScreenId> {
        if let Some(id) = cached
            && let Some(screen) = self.screens.get_mut(id)
            && screen.windows.remove(window).is_ok()
        {
            return Some(id.clone());
        }
        for (id, screen) in self.screens.iter_mut() {
            if screen.windows.remove(window).is_ok() {
                return Some(id.clone());
            }
        }
        error!(window = %window, "window is absent from every screen's collection");
        None
    }
}

fn is_eligible(info: &WindowInfo, config: &Config) -> bool {
    info.is_visible
        && info.is_valid
        && !info.is_minimized
        && !info.is_cloaked
        && !info.is_system_invisible
        && !info.title.is_empty()
        && !config.ignored_window_titles.contains(&info.title)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub focused_screen: ScreenId,
    pub window_count: usize,
    pub screens: Vec<ScreenSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub id: ScreenId,
    pub name: String,
    pub monitor: MonitorHandle,
    pub frame: Rect,
    pub work_area: Rect,
    pub focused: Option<WindowHandle>,
    pub windows: Vec<WindowHandle>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::geometry::Rect;
    use crate::sys::simulated::{SimWindowServer, Simulation};

    fn two_screen_config() -> Config {
        Config {
            screen_ids: vec!["LEFT".into(), "RIGHT".into()],
            initial_focused_screen: "RIGHT".into(),
            ..Config::default()
        }
    }

    fn two_monitor_sim() -> (Simulation, MonitorHandle, MonitorHandle) {
        let mut sim = Simulation::new();
        let left = sim.add_monitor(Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040), "L");
        let right =
            sim.add_monitor(Rect::new(1920, 0, 3840, 1080), Rect::new(1920, 0, 3840, 1040), "R");
        (sim, left, right)
    }

    #[test]
    fn construction_assigns_configured_ids_in_priority_order() {
        let (sim, left_monitor, right_monitor) = two_monitor_sim();
        let server = SimWindowServer::new(sim.share());
        let state = WmState::new(&two_screen_config(), &server).unwrap();

        let left = state.screen(&"LEFT".into()).unwrap();
        let right = state.screen(&"RIGHT".into()).unwrap();
        assert_eq!(left.handle, left_monitor);
        assert_eq!(right.handle, right_monitor);
        assert_eq!(state.focused_screen_id(), &ScreenId::new("RIGHT"));
    }

    #[test]
    fn more_monitors_than_screen_ids_is_fatal() {
        let (mut sim, _, _) = two_monitor_sim();
        sim.add_monitor(Rect::new(3840, 0, 5760, 1080), Rect::new(3840, 0, 5760, 1040), "X");
        let server = SimWindowServer::new(sim.share());
        let err = WmState::new(&two_screen_config(), &server).unwrap_err();
        assert!(matches!(err, StateError::NotEnoughScreenIds { monitors: 3, ids: 2 }));
    }

    #[test]
    fn missing_initial_screen_falls_back_to_the_first_assigned_one() {
        let mut sim = Simulation::new();
        sim.add_monitor(Rect::new(0, 0, 1920, 1080), Rect::new(0, 0, 1920, 1040), "only");
        let server = SimWindowServer::new(sim.share());
        let state = WmState::new(&two_screen_config(), &server).unwrap();
        assert_eq!(state.focused_screen_id(), &ScreenId::new("LEFT"));
    }

    #[test]
    fn register_rejects_empty_titles_even_when_otherwise_eligible() {
        let (mut sim, left, _) = two_monitor_sim();
        let window = sim.open_window("", left);
        let shared = sim.share();
        let server = SimWindowServer::new(shared);
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();

        state.register(window, &two_screen_config(), &server);
        assert!(!state.is_registered(window));
        assert_eq!(state.window_count(), 0);
    }

    #[test]
    fn register_rejects_ignored_titles() {
        let (mut sim, left, _) = two_monitor_sim();
        let window = sim.open_window("Task Switching", left);
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();

        state.register(window, &two_screen_config(), &server);
        assert!(!state.is_registered(window));
    }

    #[test]
    fn register_rejects_minimized_windows() {
        let (mut sim, left, _) = two_monitor_sim();
        let window = sim.open_window("editor", left);
        sim.window_mut(window).unwrap().minimized = true;
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();
        assert!(!state.is_registered(window));
    }

    #[test]
    fn register_leaves_the_focused_screen_alone() {
        let (mut sim, left, right) = two_monitor_sim();
        sim.open_window("a", left);
        sim.open_window("b", right);
        let server = SimWindowServer::new(sim.share());
        let state = WmState::new(&two_screen_config(), &server).unwrap();
        // Both windows registered on construction, focus untouched.
        assert_eq!(state.window_count(), 2);
        assert_eq!(state.focused_screen_id(), &ScreenId::new("RIGHT"));
    }

    #[test]
    fn register_is_a_noop_for_a_known_handle() {
        let (mut sim, left, _) = two_monitor_sim();
        let window = sim.open_window("editor", left);
        let server = SimWindowServer::new(sim.share());
        let config = two_screen_config();
        let mut state = WmState::new(&config, &server).unwrap();
        assert!(state.is_registered(window));

        state.register(window, &config, &server);
        assert_eq!(state.window_count(), 1);
        assert_eq!(state.screen(&"LEFT".into()).unwrap().windows.len(), 1);
    }

    #[test]
    fn force_register_moves_a_known_window_to_its_current_monitor() {
        let (mut sim, left, right) = two_monitor_sim();
        let window = sim.open_window("editor", left);
        let shared = sim.share();
        let server = SimWindowServer::new(shared.clone());
        let config = two_screen_config();
        let mut state = WmState::new(&config, &server).unwrap();
        assert!(state.screen(&"LEFT".into()).unwrap().windows.contains(window));

        // The user dragged the window onto the right monitor.
        shared.borrow_mut().window_mut(window).unwrap().monitor = right;
        state.force_register(window, &server);

        assert!(!state.screen(&"LEFT".into()).unwrap().windows.contains(window));
        assert!(state.screen(&"RIGHT".into()).unwrap().windows.contains(window));
        assert_eq!(state.window_count(), 1);
        assert_eq!(state.focused_screen_id(), &ScreenId::new("RIGHT"));
        assert_eq!(state.window(window).unwrap().screen, ScreenId::new("RIGHT"));
    }

    #[test]
    fn unregister_unknown_returns_none_without_mutation() {
        let (sim, _, _) = two_monitor_sim();
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();
        assert_eq!(state.unregister(WindowHandle::new(999)), None);
        assert_eq!(state.window_count(), 0);
    }

    #[test]
    fn unregister_returns_the_screens_new_focus_candidate() {
        let (mut sim, left, _) = two_monitor_sim();
        let a = sim.open_window("a", left);
        let b = sim.open_window("b", left);
        let c = sim.open_window("c", left);
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();
        // Registration order a, b, c yields [c, b, a] with c focused.
        assert_eq!(state.screen(&"LEFT".into()).unwrap().windows.elements(), vec![c, b, a]);

        let candidate = state.unregister(b);
        assert_eq!(candidate, Some(a));
        assert_eq!(state.screen(&"LEFT".into()).unwrap().windows.elements(), vec![c, a]);
        assert!(!state.is_registered(b));
    }

    #[test]
    fn set_focused_window_survives_a_stale_screen_cache() {
        let (mut sim, left, _) = two_monitor_sim();
        let window = sim.open_window("editor", left);
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();

        // Corrupt the cache to point at a screen that does not hold the
        // window; the fallback scan must still find and re-cache it.
        state.windows.get_mut(&window).unwrap().screen = ScreenId::new("RIGHT");
        state.set_focused_window(window);
        assert_eq!(state.screen(&"LEFT".into()).unwrap().windows.current(), Some(window));
        assert_eq!(state.window(window).unwrap().screen, ScreenId::new("LEFT"));
    }

    #[test]
    fn set_focused_window_never_panics_for_an_unknown_window() {
        let (sim, _, _) = two_monitor_sim();
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();
        state.set_focused_window(WindowHandle::new(777));
        assert_eq!(state.window_count(), 0);
    }

    #[test]
    fn set_focused_screen_by_monitor_resolves_the_dual_index() {
        let (sim, left, _) = two_monitor_sim();
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();
        assert!(state.set_focused_screen(ScreenSelector::ByMonitor(left)));
        assert_eq!(state.focused_screen_id(), &ScreenId::new("LEFT"));
        assert!(!state.set_focused_screen(ScreenSelector::ByMonitor(MonitorHandle::new(99))));
        assert_eq!(state.focused_screen_id(), &ScreenId::new("LEFT"));
    }

    #[test]
    fn transfer_moves_a_window_between_collections_and_refreshes_the_cache() {
        let (mut sim, left, _) = two_monitor_sim();
        let window = sim.open_window("editor", left);
        let server = SimWindowServer::new(sim.share());
        let mut state = WmState::new(&two_screen_config(), &server).unwrap();

        assert!(state.transfer(window, &"RIGHT".into()));
        assert!(!state.screen(&"LEFT".into()).unwrap().windows.contains(window));
        assert_eq!(state.screen(&"RIGHT".into()).unwrap().windows.current(), Some(window));
        let record = state.window(window).unwrap();
        assert_eq!(record.screen, ScreenId::new("RIGHT"));
        assert_eq!(record.origin, Point::new(1920, 0));
    }
}
