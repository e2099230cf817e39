//! The controller is the single consumer of the event/command channel.
//!
//! It pops one message at a time, applies it to `WmState`, and issues facade
//! side effects, so all state mutation happens on this one thread and the
//! channel is the only concurrency primitive. Lookup misses and misuse are
//! reported and swallowed; a failing facade call triggers a full state
//! rebuild instead of a local patch, because the OS is the only reliable
//! source of truth and a rescan is cheap. Only rebuild itself can fail
//! fatally, when monitors outnumber the configured screen ids.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use crate::actor;
use crate::common::config::Config;
use crate::model::state::{ScreenSelector, StateError};
use crate::model::{ScreenId, StateSnapshot, WmCommand, WmEvent, WmState};
use crate::sys::virtual_desktop::{self, VirtualDesktops};
use crate::sys::window_server::{WindowHandle, WindowServer, WindowServerError};

pub type Sender = actor::Sender<Message>;
pub type Receiver = actor::Receiver<Message>;

/// One unit of work for the dispatcher: either a classified native
/// notification or a recognized user command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Event(WmEvent),
    Command(WmCommand),
}

/// Whether focus follows a window that was just moved to another screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusAfterMove {
    Follow,
    Stay,
}

pub struct WmController<S, V> {
    config: Config,
    state: WmState,
    server: S,
    desktops: V,
}

impl<S: WindowServer, V: VirtualDesktops> WmController<S, V> {
    pub fn new(config: Config, server: S, mut desktops: V) -> Result<Self, StateError> {
        if let Err(err) =
            virtual_desktop::ensure_desktops(&mut desktops, config.virtual_desktop_ids.len())
        {
            warn!(%err, "could not ensure the configured virtual desktop count");
        }
        let state = WmState::new(&config, &server)?;
        Ok(Self { config, state, server, desktops })
    }

    pub fn state(&self) -> &WmState { &self.state }

    /// Runs the dispatch loop until the shutdown flag is raised or every
    /// producer has hung up. Each receive timeout is the cancellation point.
    pub fn run(&mut self, messages: &Receiver, shutdown: &AtomicBool) -> Result<(), StateError> {
        info!("starting dispatch loop");
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        while !shutdown.load(Ordering::Relaxed) {
            match messages.recv_timeout(poll) {
                Ok(message) => self.handle_message(message)?,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("dispatch loop stopped");
        Ok(())
    }

    pub fn handle_message(&mut self, message: Message) -> Result<(), StateError> {
        match message {
            Message::Event(event) => self.handle_event(event),
            Message::Command(command) => self.handle_command(command),
        }
    }

    fn handle_event(&mut self, event: WmEvent) -> Result<(), StateError> {
        trace!(%event, window = %event.window(), "handling event");
        match event {
            WmEvent::FocusChange(window) => {
                self.focus_screen_of(window);
                self.state.set_focused_window(window);
            }
            WmEvent::Show(window) => {
                self.focus_screen_of(window);
                self.state.register(window, &self.config, &self.server);
            }
            WmEvent::MoveResizeEnd(window) => {
                // The user just finished interacting with it, so its state is
                // known-good; bypass the eligibility filter.
                self.state.force_register(window, &self.server);
            }
            WmEvent::Destroy(window) => {
                if let Some(next) = self.state.unregister(window) {
                    self.composite_focus(next)?;
                }
            }
            WmEvent::Minimise(window) | WmEvent::Hide(window) => {
                self.state.unregister(window);
            }
            WmEvent::Uncloak(window) => {
                self.state.register(window, &self.config, &self.server);
            }
            WmEvent::Moved(window) => {
                if self.state.is_registered(window) {
                    self.state.force_register(window, &self.server);
                }
            }
            // Observed but no state change at this layer.
            WmEvent::Cloak(_) | WmEvent::MoveResizeStart(_) | WmEvent::MouseCapture(_) => {}
        }
        Ok(())
    }

    fn handle_command(&mut self, command: WmCommand) -> Result<(), StateError> {
        debug!(%command, "handling command");
        match command {
            WmCommand::FocusVirtualDesktop(desktop) => {
                if let Err(err) = self.desktops.switch_to(desktop) {
                    error!(%err, desktop = %desktop, "virtual desktop switch failed");
                    return Ok(());
                }
                // Windows are not tracked across desktops; start over from a
                // fresh enumeration.
                self.recreate_state()?;
                if let Some(current) = self.state.focused_screen().windows.current() {
                    self.composite_focus(current)?;
                }
            }
            WmCommand::SendToVirtualDesktop(desktop) => {
                let Some(current) = self.state.focused_screen().windows.current() else {
                    debug!("no focused window to send");
                    return Ok(());
                };
                // The window drops out of the model on the next desktop
                // switch's enumeration; no local change now.
                if let Err(err) = self.desktops.send_window_to(current, desktop) {
                    error!(%err, window = %current, desktop = %desktop, "send to desktop failed");
                }
            }
            WmCommand::StateDump => match serde_json::to_string_pretty(&self.state.snapshot()) {
                Ok(dump) => info!(state = %dump, "state dump"),
                Err(err) => error!(%err, "failed to serialize state"),
            },
            WmCommand::CycleFocusedWindow(direction) => {
                self.state.focused_screen_mut().windows.cycle(direction);
                if let Some(current) = self.state.focused_screen().windows.current() {
                    self.composite_focus(current)?;
                }
            }
            WmCommand::Minimise => {
                if let Some(current) = self.state.focused_screen().windows.current() {
                    let result = self.server.minimize(current);
                    self.check_external("minimise", result)?;
                }
            }
            WmCommand::ToggleMaximise => {
                if let Some(current) = self.state.focused_screen().windows.current() {
                    let result = self.server.toggle_maximize(current);
                    self.check_external("toggle maximise", result)?;
                }
            }
            WmCommand::MoveToScreen(target) => {
                self.relocate_focused(&target, FocusAfterMove::Follow)?;
            }
            WmCommand::SendToScreen(target) => {
                self.relocate_focused(&target, FocusAfterMove::Stay)?;
            }
            WmCommand::FocusScreen(target) => {
                if !self.state.set_focused_screen(ScreenSelector::ById(target)) {
                    return Ok(());
                }
                match self.state.focused_screen().windows.current() {
                    Some(current) => self.composite_focus(current)?,
                    None => self.focus_bare_screen()?,
                }
            }
            WmCommand::RecreateState => self.recreate_state()?,
            WmCommand::TogglePinWindow => {
                trace!("window pinning is not handled at this layer");
            }
            WmCommand::Noop => {}
        }
        Ok(())
    }

    /// Moves the focused window to `target`, both in the model and on the
    /// actual desktop. No-op when the target is the focused screen already
    /// or nothing is focused.
    fn relocate_focused(
        &mut self,
        target: &ScreenId,
        after: FocusAfterMove,
    ) -> Result<(), StateError> {
        if target == self.state.focused_screen_id() {
            trace!(screen = %target, "source and target screen are the same");
            return Ok(());
        }
        let Some(window) = self.state.focused_screen().windows.current() else {
            debug!("no focused window to move");
            return Ok(());
        };
        let from = self
            .state
            .window(window)
            .map(|record| record.origin)
            .unwrap_or(self.config.default_origin);
        let Some(to) = self.state.screen(target).map(|screen| screen.frame.origin()) else {
            error!(screen = %target, "unknown target screen");
            return Ok(());
        };
        if !self.state.transfer(window, target) {
            return Ok(());
        }
        let result = self.server.relative_move(window, from, to);
        if !self.check_external("window relocation", result)? {
            return Ok(());
        }
        match after {
            FocusAfterMove::Follow => self.composite_focus(window)?,
            FocusAfterMove::Stay => self.focus_bare_screen()?,
        }
        Ok(())
    }

    /// The composite focus action: raise and focus, then optionally center
    /// the cursor over the window. Treated as one unit; any failure inside it
    /// means the model and the OS have diverged, so rebuild.
    fn composite_focus(&mut self, window: WindowHandle) -> Result<(), StateError> {
        let result = self.try_composite_focus(window);
        if let Err(err) = result {
            error!(window = %window, %err, "composite focus failed, rebuilding state");
            self.recreate_state()?;
        }
        Ok(())
    }

    fn try_composite_focus(&mut self, window: WindowHandle) -> Result<(), WindowServerError> {
        self.server.raise_and_focus(window)?;
        if self.config.mouse_follows_focus {
            let frame = self.server.window_frame(window)?;
            self.server.set_cursor_pos(frame.center())?;
        }
        Ok(())
    }

    /// Focus treatment for a screen with no current window: park the cursor
    /// in the middle of its work area and hand focus to the desktop.
    fn focus_bare_screen(&mut self) -> Result<(), StateError> {
        let center = self.state.focused_screen().work_area.center();
        let result =
            self.server.set_cursor_pos(center).and_then(|()| self.server.focus_desktop());
        self.check_external("desktop focus", result)?;
        Ok(())
    }

    fn recreate_state(&mut self) -> Result<(), StateError> {
        info!("rebuilding state from a fresh enumeration");
        self.state = WmState::new(&self.config, &self.server)?;
        Ok(())
    }

    /// Absorbs a facade failure by rebuilding. Returns whether the call
    /// succeeded so the caller can stop a composite action midway.
    fn check_external(
        &mut self,
        what: &str,
        result: Result<(), WindowServerError>,
    ) -> Result<bool, StateError> {
        match result {
            Ok(()) => Ok(true),
            Err(err) => {
                error!(%err, "{what} failed, rebuilding state");
                self.recreate_state()?;
                Ok(false)
            }
        }
    }

    fn focus_screen_of(&mut self, window: WindowHandle) {
        if let Ok(monitor) = self.server.monitor_for_window(window) {
            self.state.set_focused_screen(ScreenSelector::ByMonitor(monitor));
        }
    }

    pub fn snapshot(&self) -> StateSnapshot { self.state.snapshot() }
}
