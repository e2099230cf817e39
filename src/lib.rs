//! mado: the decision core of a reactive multi-monitor window manager.
//!
//! Native hooks classify window notifications into events, hotkeys map to
//! commands, and both flow as messages through one channel into a single
//! dispatcher thread ([`actor::wm_controller`]). The dispatcher applies each
//! message to the authoritative model ([`model::state::WmState`]) and drives
//! the desktop through narrow platform facades ([`sys::window_server`],
//! [`sys::virtual_desktop`]). When the model and the desktop diverge, the
//! state is rebuilt wholesale from a fresh enumeration rather than patched.

pub mod actor;
pub mod common;
pub mod model;
pub mod sys;
