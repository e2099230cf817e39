//! Facade over the native virtual desktop service.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::sys::window_server::WindowHandle;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct VirtualDesktopId(u32);

impl VirtualDesktopId {
    pub fn new(raw: u32) -> Self { Self(raw) }

    pub fn get(self) -> u32 { self.0 }
}

impl fmt::Display for VirtualDesktopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Error)]
pub enum VirtualDesktopError {
    #[error("virtual desktop {0} does not exist")]
    UnknownDesktop(VirtualDesktopId),
    #[error("virtual desktop backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, VirtualDesktopError>;

pub trait VirtualDesktops {
    fn desktops(&self) -> Result<Vec<VirtualDesktopId>>;

    fn switch_to(&mut self, desktop: VirtualDesktopId) -> Result<()>;

    fn send_window_to(&mut self, window: WindowHandle, desktop: VirtualDesktopId) -> Result<()>;

    fn create_desktop(&mut self) -> Result<VirtualDesktopId>;
}

/// Creates desktops until at least `wanted` exist. Run once at startup so
/// every configured desktop id has something to switch to.
pub fn ensure_desktops(desktops: &mut impl VirtualDesktops, wanted: usize) -> Result<()> {
    let mut have = desktops.desktops()?.len();
    while have < wanted {
        let created = desktops.create_desktop()?;
        info!(desktop = %created, "created virtual desktop");
        have += 1;
    }
    Ok(())
}
